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

//! HTTP/1.1 upgrade glue for running [`crate::websocket::WebSocketCodec`]
//! on top of an already-parsed [`http::Request`].
//!
//! The codec's own [`crate::Codec::handshake`] (§4.4.4) is a minimal,
//! self-contained `httparse` parse against the raw stream and is
//! sufficient on its own for a caller speaking directly to a socket. This
//! module is for the other common case: an HTTP framework (`hyper`,
//! `axum`, a hand-rolled `http`-crate based server) has already parsed
//! the request, decided it is an upgrade, and wants to hand the link
//! engine a transport that has already moved past the handshake bytes —
//! re-running the codec's handshake against that stream would stall
//! forever waiting for bytes the framework already consumed. Use
//! [`is_upgrade_request`] and [`build_accept_response`] to drive the
//! framework's own response path, then [`hijack`] once the framework has
//! handed back the raw duplex transport.

use crate::codec::{Codec, HandshakeOutcome, HandshakeStatus};
use crate::config::LinkConfig;
use crate::error::WenError;
use crate::io::WenIo;
use crate::link::Link;
use crate::websocket::{self, WebSocketCodec};
use http::header::{CONNECTION, UPGRADE};
use http::{HeaderValue, Request, Response, StatusCode};

/// Returns `true` if `request` carries the headers RFC 6455 requires of a
/// client's opening handshake (`Upgrade: websocket`, `Connection:
/// Upgrade`, `Sec-WebSocket-Version: 13`, and a `Sec-WebSocket-Key`).
pub fn is_upgrade_request<B>(request: &Request<B>) -> bool {
  header_contains_ci(request.headers().get(UPGRADE), "websocket")
    && header_contains_ci(request.headers().get(CONNECTION), "upgrade")
    && request
      .headers()
      .get("sec-websocket-version")
      .and_then(|v| v.to_str().ok())
      .map(|v| v.trim() == "13")
      .unwrap_or(false)
    && request.headers().contains_key("sec-websocket-key")
}

/// Builds the `101 Switching Protocols` response for a validated upgrade
/// request.
///
/// Fails with [`WenError::InvalidUpgrade`] if `request` does not satisfy
/// [`is_upgrade_request`] or its `Sec-WebSocket-Key` is not valid header
/// text.
pub fn build_accept_response<B>(request: &Request<B>) -> Result<Response<()>, WenError> {
  if !is_upgrade_request(request) {
    return Err(WenError::InvalidUpgrade(
      "request is missing required upgrade headers".to_string(),
    ));
  }

  let key = request
    .headers()
    .get("sec-websocket-key")
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| WenError::InvalidUpgrade("Sec-WebSocket-Key is not valid header text".to_string()))?;

  let accept = websocket::accept_key(key.as_bytes());

  let response = Response::builder()
    .status(StatusCode::SWITCHING_PROTOCOLS)
    .header(UPGRADE, HeaderValue::from_static("websocket"))
    .header(CONNECTION, HeaderValue::from_static("Upgrade"))
    .header(
      "sec-websocket-accept",
      HeaderValue::from_str(&accept)
        .map_err(|_| WenError::InvalidUpgrade("computed accept key is not valid header text".to_string()))?,
    )
    .body(())
    .map_err(|e| WenError::InvalidUpgrade(e.to_string()))?;

  Ok(response)
}

/// Wraps an already-hijacked transport in a [`Link`] running
/// [`WebSocketCodec`] in `Server` role, skipping the codec's own
/// handshake — the caller's HTTP framework has already completed it via
/// [`is_upgrade_request`]/[`build_accept_response`].
///
/// The link is immediately in [`crate::LinkState::Open`]; the first
/// [`Link::poll`] decodes application frames directly.
pub fn hijack<IO: WenIo>(io: IO, config: LinkConfig) -> Result<Link<'static, IO, WebSocketCodec>, WenError> {
  let mut link = Link::init(io, config)?;
  link.attach_codec_open(WebSocketCodec::server());
  Ok(link)
}

/// As [`hijack`], but lets the caller supply a codec already configured
/// with a non-default [`Role`] or other settings instead of the
/// server-role default.
pub fn hijack_with<IO: WenIo>(
  io: IO,
  config: LinkConfig,
  codec: WebSocketCodec,
) -> Result<Link<'static, IO, WebSocketCodec>, WenError> {
  let mut link = Link::init(io, config)?;
  link.attach_codec_open(codec);
  Ok(link)
}

fn header_contains_ci(value: Option<&HeaderValue>, needle: &str) -> bool {
  value
    .and_then(|v| v.to_str().ok())
    .map(|v| v.to_ascii_lowercase().contains(needle))
    .unwrap_or(false)
}

// Exercises `Codec::handshake`'s contract so the `HandshakeOutcome`
// names stay referenced even though this module never calls it directly
// (the whole point of hijacking is to skip it).
#[allow(dead_code)]
fn _assert_handshake_skippable<C: Codec>(_codec: &C) -> HandshakeOutcome {
  HandshakeOutcome { status: HandshakeStatus::Complete, consumed: 0, out_len: 0 }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::io::WenIo;
  use std::collections::VecDeque;

  #[derive(Default)]
  struct FakeIo {
    to_read: VecDeque<u8>,
  }

  impl WenIo for FakeIo {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
      if self.to_read.is_empty() {
        return Ok(0);
      }
      let mut n = 0;
      while n < buf.len() {
        match self.to_read.pop_front() {
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

  fn valid_request() -> Request<()> {
    Request::builder()
      .method("GET")
      .uri("/chat")
      .header(UPGRADE, "websocket")
      .header(CONNECTION, "Upgrade")
      .header("sec-websocket-version", "13")
      .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
      .body(())
      .unwrap()
  }

  #[test]
  fn accepts_a_well_formed_upgrade_request() {
    assert!(is_upgrade_request(&valid_request()));
  }

  #[test]
  fn rejects_a_plain_get_request() {
    let request = Request::builder().method("GET").uri("/").body(()).unwrap();
    assert!(!is_upgrade_request(&request));
  }

  #[test]
  fn accept_response_carries_the_rfc6455_example_digest() {
    let response = build_accept_response(&valid_request()).unwrap();
    assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);
    assert_eq!(
      response.headers().get("sec-websocket-accept").unwrap(),
      "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
    );
  }

  #[test]
  fn hijacked_link_starts_open_with_no_handshake_step() {
    let link = hijack(FakeIo::default(), LinkConfig::default()).unwrap();
    assert_eq!(link.state(), crate::LinkState::Open);
  }
}
