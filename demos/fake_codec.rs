//! Demonstrates the link engine against a minimal custom `Codec`,
//! independent of the `websocket` feature: a raw byte-stream echo
//! server where "decode" is just "slice whatever arrived" (the
//! `Codec::decode`/`encode` default behavior) and the handshake
//! completes immediately.
//!
//! Run with `cargo run --example fake_codec`, then `nc 127.0.0.1 9002`
//! and type lines; they echo back unchanged.

use std::net::{TcpListener, TcpStream};

use wen::{Codec, HandshakeOutcome, HandshakeStatus, Link, LinkConfig, WenResult};

/// A codec with no handshake and no framing: every byte the transport
/// delivers is immediately eligible to be sliced, and `send` is a
/// straight copy.
#[derive(Default)]
struct RawEchoCodec;

impl Codec for RawEchoCodec {
  fn handshake(&mut self, _input: &[u8], _out: &mut [u8]) -> HandshakeOutcome {
    HandshakeOutcome { status: HandshakeStatus::Complete, consumed: 0, out_len: 0 }
  }

  fn encode(&mut self, _opcode: u8, payload: &[u8], out: &mut [u8]) -> Result<usize, WenResult> {
    if out.len() < payload.len() {
      return Err(WenResult::Overflow);
    }
    out[..payload.len()].copy_from_slice(payload);
    Ok(payload.len())
  }
}

fn handle(stream: TcpStream) -> anyhow::Result<()> {
  let mut link = Link::init(stream, LinkConfig::default())?;
  link.attach_codec(RawEchoCodec);

  loop {
    match link.poll() {
      Some(wen::Event::Slice(slice)) => {
        let bytes = link.slice_data(&slice).to_vec();
        link.release(slice);
        link.send(0, &bytes).map_err(wen::WenError::from)?;
      }
      Some(wen::Event::Close(_)) | None if link.state() == wen::LinkState::Closed => break,
      Some(wen::Event::Error(e)) => return Err(wen::WenError::from(e).into()),
      _ => {}
    }
  }

  Ok(())
}

fn main() -> anyhow::Result<()> {
  let listener = TcpListener::bind("127.0.0.1:9002")?;
  println!("listening on tcp://127.0.0.1:9002");

  for stream in listener.incoming() {
    let stream = stream?;
    if let Err(e) = handle(stream) {
      eprintln!("connection error: {e}");
    }
  }

  Ok(())
}
