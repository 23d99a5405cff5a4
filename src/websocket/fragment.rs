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

//! Reassembles fragmented (CONT-opcode) WebSocket messages into single,
//! owned buffers.
//!
//! [`crate::Link::poll`] hands back one raw, still-masked
//! [`crate::Event::Slice`] per wire frame — it has no concept of a
//! logical "message" spanning several fragments, by design (see the
//! core's Non-goals). [`FragmentCollector`] is the convenience layer
//! above it that tracks `fin`/opcode across frames and does the
//! unmasking, the same shape other RFC 6455 crates in this ecosystem
//! give their own `FragmentCollector` over raw frame reads.

use crate::codec::Codec;
use crate::error::WenError;
use crate::event::{Event, FrameMeta};
use crate::io::WenIo;
use crate::link::Link;
use crate::websocket::mask;
use crate::websocket::frame::OpCode;

/// A fully reassembled WebSocket message: one or more wire frames
/// concatenated and unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedMessage {
  pub opcode: OpCode,
  pub payload: Vec<u8>,
}

/// Wraps a [`Link`] running [`crate::websocket::WebSocketCodec`] and
/// yields whole messages instead of per-frame slices.
pub struct FragmentCollector<'l, IO, C> {
  link: &'l mut Link<'static, IO, C>,
  pending_meta: Option<FrameMeta>,
  partial_opcode: Option<OpCode>,
  buf: Vec<u8>,
}

impl<'l, IO: WenIo, C: Codec> FragmentCollector<'l, IO, C> {
  pub fn new(link: &'l mut Link<'static, IO, C>) -> Self {
    FragmentCollector {
      link,
      pending_meta: None,
      partial_opcode: None,
      buf: Vec::new(),
    }
  }

  /// Polls the underlying link until a fully-reassembled message is
  /// available, the link closes, or it stalls waiting for more I/O.
  ///
  /// Returns `Ok(None)` both on a clean close and when the link has
  /// nothing new to report yet (the caller should poll again later, the
  /// same way it would drive [`Link::poll`] directly).
  pub fn next_message(&mut self) -> Result<Option<OwnedMessage>, WenError> {
    loop {
      match self.link.poll() {
        None => return Ok(None),
        Some(Event::Error(e)) => return Err(e.into()),
        Some(Event::Close(_)) => return Ok(None),
        Some(Event::Open) | Some(Event::Ping) | Some(Event::Pong) => continue,
        Some(Event::Frame(meta)) => {
          self.pending_meta = Some(meta);
          continue;
        }
        Some(Event::Slice(slice)) => {
          let meta = self.pending_meta.take().ok_or_else(|| {
            WenError::InvalidUpgrade("slice with no preceding frame metadata".to_string())
          })?;

          let (mut payload, mask_bytes) = {
            let data = self.link.slice_data(&slice);
            let len_byte = data[1] & 0x7F;
            let ext = match len_byte {
              126 => 2,
              127 => 8,
              _ => 0,
            };
            let mask_len = if meta.masked { 4 } else { 0 };
            let hdr = 2 + ext;
            let mask_start = hdr;
            let payload_start = hdr + mask_len;
            let payload_end = payload_start + meta.length as usize;
            let payload = data[payload_start..payload_end].to_vec();
            let mask_bytes: Option<[u8; 4]> = meta.masked.then(|| {
              data[mask_start..mask_start + 4].try_into().expect("mask is always 4 bytes")
            });
            (payload, mask_bytes)
          };
          if let Some(mask_bytes) = mask_bytes {
            mask::unmask(&mut payload, mask_bytes);
          }
          self.link.release(slice);

          let opcode = OpCode::try_from(meta.opcode).map_err(|_| {
            WenError::InvalidUpgrade(format!("unsupported opcode {}", meta.opcode))
          })?;

          if opcode == OpCode::Continuation {
            if self.partial_opcode.is_none() {
              return Err(WenError::InvalidUpgrade(
                "continuation frame with no message in progress".to_string(),
              ));
            }
            self.buf.extend_from_slice(&payload);
          } else if opcode.is_control() {
            // Control frames may interleave with a fragmented message
            // and are delivered whole, immediately.
            return Ok(Some(OwnedMessage { opcode, payload }));
          } else {
            self.partial_opcode = Some(opcode);
            self.buf.clear();
            self.buf.extend_from_slice(&payload);
          }

          if meta.fin {
            let opcode = self.partial_opcode.take().unwrap_or(opcode);
            let payload = std::mem::take(&mut self.buf);
            if opcode == OpCode::Text && !is_valid_utf8(&payload) {
              return Err(WenError::InvalidUtf8);
            }
            return Ok(Some(OwnedMessage { opcode, payload }));
          }
        }
      }
    }
  }
}

#[cfg(feature = "simd")]
fn is_valid_utf8(bytes: &[u8]) -> bool {
  simdutf8::basic::from_utf8(bytes).is_ok()
}

#[cfg(not(feature = "simd"))]
fn is_valid_utf8(bytes: &[u8]) -> bool {
  std::str::from_utf8(bytes).is_ok()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::LinkConfig;
  use crate::websocket::WebSocketCodec;
  use std::cell::RefCell;
  use std::collections::VecDeque;
  use std::rc::Rc;

  #[derive(Default, Clone)]
  struct FakeIo {
    to_read: Rc<RefCell<VecDeque<u8>>>,
  }

  impl FakeIo {
    fn feed(&self, bytes: &[u8]) {
      self.to_read.borrow_mut().extend(bytes.iter().copied());
    }
  }

  impl WenIo for FakeIo {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
      let mut q = self.to_read.borrow_mut();
      if q.is_empty() {
        return Ok(0);
      }
      let mut n = 0;
      while n < buf.len() {
        match q.pop_front() {
          Some(b) => {
            buf[n] = b;
            n += 1;
          }
          None => break,
        }
      }
      Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
      Ok(buf.len())
    }
  }

  const UPGRADE_REQUEST: &[u8] = b"GET / HTTP/1.1\r\n\
    Host: x\r\n\
    Upgrade: websocket\r\n\
    Connection: Upgrade\r\n\
    Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
    Sec-WebSocket-Version: 13\r\n\r\n";

  #[test]
  fn reassembles_a_single_unfragmented_text_frame() {
    let io = FakeIo::default();
    io.feed(UPGRADE_REQUEST);

    let mut link = Link::init(io.clone(), LinkConfig::default()).unwrap();
    link.attach_codec(WebSocketCodec::server());
    assert!(matches!(link.poll(), Some(Event::Open)));

    // Fed only once the handshake has consumed the request: feeding it
    // earlier would let an unrelated read observe an empty scripted
    // queue and mistake that for remote EOF.
    // FIN, TEXT, masked, zero-mask, payload "hello".
    io.feed(&[0x81, 0x85, 0x00, 0x00, 0x00, 0x00, b'h', b'e', b'l', b'l', b'o']);

    let mut collector = FragmentCollector::new(&mut link);
    let msg = loop {
      if let Some(m) = collector.next_message().unwrap() {
        break m;
      }
    };

    assert_eq!(msg.opcode, OpCode::Text);
    assert_eq!(msg.payload, b"hello");
  }

  #[test]
  fn rejects_text_frame_with_invalid_utf8() {
    let io = FakeIo::default();
    io.feed(UPGRADE_REQUEST);

    let mut link = Link::init(io.clone(), LinkConfig::default()).unwrap();
    link.attach_codec(WebSocketCodec::server());
    assert!(matches!(link.poll(), Some(Event::Open)));

    // FIN, TEXT, masked, zero-mask, payload 0xFF 0xFF (invalid UTF-8).
    io.feed(&[0x81, 0x82, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF]);

    let mut collector = FragmentCollector::new(&mut link);
    let err = loop {
      match collector.next_message() {
        Ok(Some(_)) => panic!("expected an InvalidUtf8 error"),
        Ok(None) => continue,
        Err(e) => break e,
      }
    };

    assert!(matches!(err, WenError::InvalidUtf8));
  }
}
