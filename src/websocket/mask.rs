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

//! XOR masking as required by [RFC 6455 §5.3](https://www.rfc-editor.org/rfc/rfc6455#section-5.3).

/// XORs `data` in place against the repeating 4-byte `mask`, starting at
/// mask offset 0. Client-to-server frames must be masked this way;
/// applying the same mask a second time recovers the original bytes.
pub fn unmask(data: &mut [u8], mask: [u8; 4]) {
  for (i, byte) in data.iter_mut().enumerate() {
    *byte ^= mask[i & 3];
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn masking_is_its_own_inverse() {
    let mask = [0x12, 0x34, 0x56, 0x78];
    let original = b"hello, wen!".to_vec();
    let mut buf = original.clone();
    unmask(&mut buf, mask);
    assert_ne!(buf, original);
    unmask(&mut buf, mask);
    assert_eq!(buf, original);
  }

  #[test]
  fn zero_mask_is_a_no_op() {
    let mut buf = b"unchanged".to_vec();
    let original = buf.clone();
    unmask(&mut buf, [0, 0, 0, 0]);
    assert_eq!(buf, original);
  }
}
