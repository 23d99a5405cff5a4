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

//! The RFC 6455 §1.3 opening handshake: computing `Sec-WebSocket-Accept`
//! from a client's `Sec-WebSocket-Key`, and generating that key in the
//! first place for client-side connects.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::RngCore;
use sha1::{Digest, Sha1};

/// The GUID concatenated onto a `Sec-WebSocket-Key` before hashing,
/// fixed by RFC 6455 §1.3.
pub const GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// The maximum number of bytes of a handshake request or response this
/// module will ever inspect or produce in one pass. Guards against an
/// unbounded preview buffer when a peer never sends a terminating
/// `\r\n\r\n`.
pub const MAX_HANDSHAKE_PREVIEW: usize = 2048;

/// Computes the `Sec-WebSocket-Accept` value for a given client-sent
/// `Sec-WebSocket-Key`.
pub fn accept_key(client_key: &[u8]) -> String {
  let mut hasher = Sha1::new();
  hasher.update(client_key);
  hasher.update(GUID.as_bytes());
  BASE64.encode(hasher.finalize())
}

/// Generates a fresh, random, base64-encoded 16-byte `Sec-WebSocket-Key`
/// for a client-side handshake request.
pub fn generate_key() -> String {
  let mut key = [0u8; 16];
  rand::thread_rng().fill_bytes(&mut key);
  BASE64.encode(key)
}
