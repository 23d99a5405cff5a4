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

//! The reference wire codec: RFC 6455 WebSocket framing over a hijacked
//! HTTP/1.1 `Upgrade` handshake.
//!
//! [`WebSocketCodec`] implements [`crate::Codec`] and can be attached to
//! any [`crate::Link`]. It exposes frames to the application exactly as
//! decoded — one [`crate::Event::Frame`] plus one [`crate::Event::Slice`]
//! per wire frame, masked payload and all; see [`FragmentCollector`] for
//! a layer that reassembles fragmented messages and strips masking for
//! you.

mod close;
mod fragment;
mod frame;
mod handshake;
mod mask;

pub use close::CloseCode;
pub use fragment::{FragmentCollector, OwnedMessage};
pub use frame::{OpCode, UnknownOpCode};
pub use handshake::{accept_key, generate_key, GUID};
pub use mask::unmask;

use crate::codec::{Codec, DecodeSink, HandshakeOutcome, HandshakeStatus};
use crate::error::WenResult;
use crate::event::FrameMeta;
use std::io::Write as _;

/// The number of header slots reserved for [`httparse`] while parsing a
/// handshake request or response.
const MAX_HEADERS: usize = 32;

/// Which side of the handshake a [`WebSocketCodec`] plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  /// Waits for and responds to an incoming `GET` upgrade request.
  Server,
  /// Sends the initial upgrade request and validates the `101` response.
  Client,
}

/// The exemplar wire codec: RFC 6455 WebSocket framing.
///
/// Construct with [`WebSocketCodec::server`] or [`WebSocketCodec::client`]
/// and attach to a [`crate::Link`] via [`crate::Link::attach_codec`].
pub struct WebSocketCodec {
  role: Role,
  host: String,
  path: String,
  request_sent: bool,
  client_key: Option<String>,
}

impl WebSocketCodec {
  /// A codec that waits for a client's upgrade request.
  pub fn server() -> Self {
    WebSocketCodec {
      role: Role::Server,
      host: String::new(),
      path: String::new(),
      request_sent: false,
      client_key: None,
    }
  }

  /// A codec that initiates the upgrade request on the first poll.
  pub fn client() -> Self {
    WebSocketCodec {
      role: Role::Client,
      host: "localhost".to_string(),
      path: "/".to_string(),
      request_sent: false,
      client_key: Some(handshake::generate_key()),
    }
  }

  /// Overrides the `Host` header sent by a client-role codec. No effect
  /// on a server-role codec.
  pub fn set_host(&mut self, host: impl Into<String>) -> &mut Self {
    self.host = host.into();
    self
  }

  /// Overrides the request path sent by a client-role codec.
  pub fn set_path(&mut self, path: impl Into<String>) -> &mut Self {
    self.path = path.into();
    self
  }

  /// Which side of the handshake this codec plays.
  pub fn role(&self) -> Role {
    self.role
  }
}

impl Codec for WebSocketCodec {
  fn handshake(&mut self, input: &[u8], out: &mut [u8]) -> HandshakeOutcome {
    match self.role {
      Role::Server => server_handshake(input, out),
      Role::Client => self.client_handshake(input, out),
    }
  }

  fn decode(
    &mut self,
    data: &[u8],
    sink: &mut DecodeSink<'_>,
    frame_len: &mut u64,
  ) -> WenResult {
    if data.len() < 2 {
      return WenResult::Ok;
    }

    let fin = data[0] & 0x80 != 0;
    let opcode = data[0] & 0x0F;
    let masked = data[1] & 0x80 != 0;
    let mut plen = u64::from(data[1] & 0x7F);
    let mut hdr = 2usize;

    // Client-to-server frames are always masked, server-to-client never
    // are; a codec only ever decodes what its peer sends.
    let expect_masked = self.role == Role::Server;
    if masked != expect_masked {
      return WenResult::Protocol;
    }

    if plen == 126 {
      if data.len() < hdr + 2 {
        return WenResult::Ok;
      }
      plen = u64::from(u16::from_be_bytes([data[hdr], data[hdr + 1]]));
      hdr += 2;
    } else if plen == 127 {
      if data.len() < hdr + 8 {
        return WenResult::Ok;
      }
      let mut buf = [0u8; 8];
      buf.copy_from_slice(&data[hdr..hdr + 8]);
      plen = u64::from_be_bytes(buf);
      hdr += 8;
    }

    let mask_len: u64 = if masked { 4 } else { 0 };
    let total = hdr as u64 + mask_len + plen;
    if (data.len() as u64) < total {
      return WenResult::Ok;
    }

    let is_control = opcode & 0x08 != 0;
    if is_control && (!fin || plen > 125) {
      return WenResult::Protocol;
    }

    let meta = FrameMeta { fin, masked, opcode, length: plen };
    if !sink.push_frame(meta) {
      return WenResult::Overflow;
    }

    match opcode {
      0x9 => {
        if !sink.push_ping() {
          return WenResult::Overflow;
        }
      }
      0xA => {
        if !sink.push_pong() {
          return WenResult::Overflow;
        }
      }
      _ => {}
    }

    *frame_len = total;
    WenResult::Ok
  }

  fn encode(
    &mut self,
    opcode: u8,
    payload: &[u8],
    out: &mut [u8],
  ) -> Result<usize, WenResult> {
    let is_control = opcode & 0x08 != 0;
    if is_control && payload.len() > 125 {
      return Err(WenResult::Protocol);
    }

    let masked = self.role == Role::Client;
    let len = payload.len();
    let mut hdr = 2usize;
    let len_byte: u8 = if len <= 125 {
      len as u8
    } else if len <= 0xFFFF {
      hdr += 2;
      126
    } else {
      hdr += 8;
      127
    };

    let mask_len = if masked { 4 } else { 0 };
    let total = hdr + mask_len + len;
    if out.len() < total {
      return Err(WenResult::Overflow);
    }

    out[0] = 0x80 | (opcode & 0x0F);
    out[1] = (if masked { 0x80 } else { 0 }) | len_byte;

    let mut off = 2;
    if len_byte == 126 {
      out[off..off + 2].copy_from_slice(&(len as u16).to_be_bytes());
      off += 2;
    } else if len_byte == 127 {
      out[off..off + 8].copy_from_slice(&(len as u64).to_be_bytes());
      off += 8;
    }

    if masked {
      let mut mask_bytes = [0u8; 4];
      rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut mask_bytes);
      out[off..off + 4].copy_from_slice(&mask_bytes);
      off += 4;
      out[off..off + len].copy_from_slice(payload);
      mask::unmask(&mut out[off..off + len], mask_bytes);
    } else {
      out[off..off + len].copy_from_slice(payload);
    }
    off += len;

    Ok(off)
  }
}

impl WebSocketCodec {
  fn client_handshake(&mut self, input: &[u8], out: &mut [u8]) -> HandshakeOutcome {
    if !self.request_sent {
      let key = self
        .client_key
        .clone()
        .expect("a client-role codec always carries a generated key");
      let mut cursor = std::io::Cursor::new(&mut *out);
      let wrote = write!(
        cursor,
        "GET {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {key}\r\n\
         Sec-WebSocket-Version: 13\r\n\r\n",
        path = self.path,
        host = self.host,
        key = key,
      );
      return match wrote {
        Ok(()) => {
          self.request_sent = true;
          HandshakeOutcome {
            status: HandshakeStatus::Incomplete,
            consumed: 0,
            out_len: cursor.position() as usize,
          }
        }
        Err(_) => HandshakeOutcome { status: HandshakeStatus::Failed, consumed: 0, out_len: 0 },
      };
    }

    if input.len() >= handshake::MAX_HANDSHAKE_PREVIEW {
      return HandshakeOutcome { status: HandshakeStatus::Failed, consumed: input.len(), out_len: 0 };
    }

    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut response = httparse::Response::new(&mut headers);
    match response.parse(input) {
      Ok(httparse::Status::Partial) => {
        HandshakeOutcome { status: HandshakeStatus::Incomplete, consumed: 0, out_len: 0 }
      }
      Err(_) => HandshakeOutcome { status: HandshakeStatus::Failed, consumed: input.len(), out_len: 0 },
      Ok(httparse::Status::Complete(_)) => {
        if response.code != Some(101) {
          return HandshakeOutcome { status: HandshakeStatus::Failed, consumed: input.len(), out_len: 0 };
        }

        let accept = match find_header(response.headers, "sec-websocket-accept") {
          Some(v) => v,
          None => return HandshakeOutcome { status: HandshakeStatus::Failed, consumed: input.len(), out_len: 0 },
        };

        let key = self.client_key.as_deref().unwrap_or_default();
        let expected = handshake::accept_key(key.as_bytes());
        if accept != expected.as_bytes() {
          return HandshakeOutcome { status: HandshakeStatus::Failed, consumed: input.len(), out_len: 0 };
        }

        HandshakeOutcome { status: HandshakeStatus::Complete, consumed: input.len(), out_len: 0 }
      }
    }
  }
}

fn server_handshake(input: &[u8], out: &mut [u8]) -> HandshakeOutcome {
  if input.len() >= handshake::MAX_HANDSHAKE_PREVIEW {
    return HandshakeOutcome { status: HandshakeStatus::Failed, consumed: input.len(), out_len: 0 };
  }

  let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
  let mut request = httparse::Request::new(&mut headers);
  match request.parse(input) {
    Ok(httparse::Status::Partial) => {
      return HandshakeOutcome { status: HandshakeStatus::Incomplete, consumed: 0, out_len: 0 };
    }
    Err(_) => {
      return HandshakeOutcome { status: HandshakeStatus::Failed, consumed: input.len(), out_len: 0 };
    }
    Ok(httparse::Status::Complete(_)) => {}
  }

  if request.method != Some("GET")
    || !header_contains_ci(request.headers, "upgrade", "websocket")
    || !header_contains_ci(request.headers, "connection", "upgrade")
    || !header_eq_ci(request.headers, "sec-websocket-version", "13")
  {
    return HandshakeOutcome { status: HandshakeStatus::Failed, consumed: input.len(), out_len: 0 };
  }

  let key = match find_header(request.headers, "sec-websocket-key")
    .and_then(|v| std::str::from_utf8(v).ok())
  {
    Some(k) => k.trim(),
    None => return HandshakeOutcome { status: HandshakeStatus::Failed, consumed: input.len(), out_len: 0 },
  };

  let accept = handshake::accept_key(key.as_bytes());

  let mut cursor = std::io::Cursor::new(&mut *out);
  let wrote = write!(
    cursor,
    "HTTP/1.1 101 Switching Protocols\r\n\
     Upgrade: websocket\r\n\
     Connection: Upgrade\r\n\
     Sec-WebSocket-Accept: {accept}\r\n\r\n",
  );

  match wrote {
    Ok(()) => HandshakeOutcome {
      status: HandshakeStatus::Complete,
      consumed: input.len(),
      out_len: cursor.position() as usize,
    },
    Err(_) => HandshakeOutcome { status: HandshakeStatus::Failed, consumed: input.len(), out_len: 0 },
  }
}

fn find_header<'h>(headers: &'h [httparse::Header<'h>], name: &str) -> Option<&'h [u8]> {
  headers.iter().find(|h| h.name.eq_ignore_ascii_case(name)).map(|h| h.value)
}

fn header_contains_ci(headers: &[httparse::Header<'_>], name: &str, needle: &str) -> bool {
  find_header(headers, name)
    .and_then(|v| std::str::from_utf8(v).ok())
    .map(|v| v.to_ascii_lowercase().contains(&needle.to_ascii_lowercase()))
    .unwrap_or(false)
}

fn header_eq_ci(headers: &[httparse::Header<'_>], name: &str, expect: &str) -> bool {
  find_header(headers, name)
    .and_then(|v| std::str::from_utf8(v).ok())
    .map(|v| v.trim().eq_ignore_ascii_case(expect))
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::event::EventQueue;

  fn sink(queue: &mut EventQueue) -> DecodeSink<'_> {
    DecodeSink { queue }
  }

  #[test]
  fn server_handshake_completes_on_valid_upgrade_request() {
    let req = b"GET /chat HTTP/1.1\r\n\
      Host: example.com\r\n\
      Upgrade: websocket\r\n\
      Connection: Upgrade\r\n\
      Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
      Sec-WebSocket-Version: 13\r\n\r\n";
    let mut out = [0u8; 256];
    let outcome = server_handshake(req, &mut out);
    assert_eq!(outcome.status, HandshakeStatus::Complete);
    assert_eq!(outcome.consumed, req.len());
    let response = std::str::from_utf8(&out[..outcome.out_len]).unwrap();
    assert!(response.contains("101 Switching Protocols"));
    assert!(response.contains("s3pPLMBiTxaQ9kYGzzhZRbK+xOo="));
  }

  #[test]
  fn server_handshake_waits_for_more_bytes() {
    let req = b"GET /chat HTTP/1.1\r\nHost: example.com\r\n";
    let mut out = [0u8; 256];
    let outcome = server_handshake(req, &mut out);
    assert_eq!(outcome.status, HandshakeStatus::Incomplete);
  }

  #[test]
  fn server_handshake_rejects_wrong_version() {
    let req = b"GET / HTTP/1.1\r\n\
      Host: x\r\n\
      Upgrade: websocket\r\n\
      Connection: Upgrade\r\n\
      Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
      Sec-WebSocket-Version: 8\r\n\r\n";
    let mut out = [0u8; 256];
    let outcome = server_handshake(req, &mut out);
    assert_eq!(outcome.status, HandshakeStatus::Failed);
  }

  #[test]
  fn decode_requires_masked_frames_from_a_client() {
    let mut codec = WebSocketCodec::server();
    let mut queue = EventQueue::new(8);
    let mut frame_len = 0u64;
    // FIN=1, TEXT, unmasked, len=5.
    let data = [0x81, 0x05, b'h', b'e', b'l', b'l', b'o'];
    let mut s = sink(&mut queue);
    assert_eq!(codec.decode(&data, &mut s, &mut frame_len), WenResult::Protocol);
  }

  #[test]
  fn decode_produces_frame_for_masked_client_text() {
    let mut codec = WebSocketCodec::server();
    let mut queue = EventQueue::new(8);
    let mut frame_len = 0u64;
    // FIN=1, TEXT, masked, zero mask, payload "hello".
    let data = [0x81, 0x85, 0x00, 0x00, 0x00, 0x00, b'h', b'e', b'l', b'l', b'o'];
    let mut s = sink(&mut queue);
    assert_eq!(codec.decode(&data, &mut s, &mut frame_len), WenResult::Ok);
    assert_eq!(frame_len, data.len() as u64);
    match queue.pop() {
      Some(crate::event::QueuedEvent::Frame(meta)) => {
        assert!(meta.fin);
        assert!(meta.masked);
        assert_eq!(meta.opcode, 0x1);
        assert_eq!(meta.length, 5);
      }
      other => panic!("expected a Frame event, got {other:?}"),
    }
  }

  #[test]
  fn encode_rejects_oversized_control_frames() {
    let mut codec = WebSocketCodec::server();
    let mut out = [0u8; 256];
    let payload = [0u8; 126];
    assert_eq!(codec.encode(0x8, &payload, &mut out), Err(WenResult::Protocol));
  }

  #[test]
  fn client_encode_masks_and_server_decode_unmasks_round_trip() {
    let mut client = WebSocketCodec::client();
    let mut out = [0u8; 256];
    let n = client.encode(0x1, b"hello", &mut out).unwrap();

    let mut server = WebSocketCodec::server();
    let mut queue = EventQueue::new(8);
    let mut frame_len = 0u64;
    let mut s = sink(&mut queue);
    assert_eq!(server.decode(&out[..n], &mut s, &mut frame_len), WenResult::Ok);

    // Payload starts after the 2-byte header + 4-byte mask for this
    // short a message.
    let mask: [u8; 4] = out[2..6].try_into().unwrap();
    let mut payload = out[6..n].to_vec();
    mask::unmask(&mut payload, mask);
    assert_eq!(payload, b"hello");
  }
}
