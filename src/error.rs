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

use thiserror::Error;

/// Categorical result code produced by the core and by codecs.
///
/// This is the hot-path error representation: a plain `Copy` enum, carried
/// both in [`crate::Event::Error`] and as the `Err` variant of synchronous
/// calls like [`crate::Link::send`]. It never allocates and never wraps a
/// backtrace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WenResult {
  /// The operation completed successfully.
  Ok,
  /// A read or write callback failed.
  Io,
  /// The codec reported a wire-protocol violation.
  Protocol,
  /// A fixed-capacity buffer (TX, arena, event queue) would have been
  /// exceeded.
  Overflow,
  /// The call is not valid for the link's current state.
  State,
  /// The codec does not implement the requested operation.
  Unsupported,
  /// The link is already closed.
  Closed,
}

impl WenResult {
  /// Returns `true` for [`WenResult::Ok`].
  pub fn is_ok(self) -> bool {
    matches!(self, WenResult::Ok)
  }
}

impl std::fmt::Display for WenResult {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      WenResult::Ok => "ok",
      WenResult::Io => "io error",
      WenResult::Protocol => "protocol error",
      WenResult::Overflow => "capacity exceeded",
      WenResult::State => "invalid state for operation",
      WenResult::Unsupported => "unsupported operation",
      WenResult::Closed => "link closed",
    };
    f.write_str(s)
  }
}

/// Public error type surfaced by the fallible parts of the API that sit
/// above the hot `poll` loop (construction, handshake glue).
///
/// [`crate::Link::poll`] itself never returns this type — protocol and I/O
/// failures during polling are reported as [`crate::Event::Error`] carrying
/// a [`WenResult`], per the core's "never abort, always report" design.
#[derive(Error, Debug)]
pub enum WenError {
  /// A synchronous call failed with the given categorical result.
  #[error("{0}")]
  Result(WenResult),
  /// The I/O backend returned an error.
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
  /// The HTTP upgrade request was malformed or incomplete.
  #[error("invalid upgrade request: {0}")]
  InvalidUpgrade(String),
  /// A text message's payload was not valid UTF-8.
  #[error("invalid UTF-8 in text message")]
  InvalidUtf8,
}

impl From<WenResult> for WenError {
  fn from(r: WenResult) -> Self {
    WenError::Result(r)
  }
}
