// Copyright 2023 Divy Srivastava <dj.srivastava23@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io::{Read, Write};

/// The transport abstraction a [`crate::Link`] drives.
///
/// A positive `Ok(n)` from [`WenIo::read`] means `n` bytes were read; `Ok(0)`
/// means a clean EOF; `Err` surfaces as [`crate::WenResult::Io`]. The same
/// shape applies to [`WenIo::write`], except `Ok(0)`/short writes are not an
/// error — `poll` retries the remainder on a later call.
///
/// Implementations must not block longer than the caller can tolerate;
/// the link engine itself never times out a callback.
pub trait WenIo {
  fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize>;
}

impl<T: Read + Write> WenIo for T {
  fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
    Read::read(self, buf)
  }

  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    Write::write(self, buf)
  }
}
