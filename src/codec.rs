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

use crate::error::WenResult;
use crate::event::QueuedEvent;

/// Status returned by [`Codec::handshake`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStatus {
  /// More input bytes are required before the handshake can complete.
  Incomplete,
  /// The handshake finished successfully.
  Complete,
  /// The handshake is invalid and cannot succeed.
  Failed,
}

/// The outcome of one [`Codec::handshake`] invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeOutcome {
  pub status: HandshakeStatus,
  /// How many bytes of the input were consumed. Must be `<= input.len()`.
  pub consumed: usize,
  /// How many bytes of `out` were written.
  pub out_len: usize,
}

/// A sink codecs push protocol-level events onto during [`Codec::decode`].
///
/// This stands in for the direct access to the owning link's event queue
/// that the reference C codec has via a stashed back-pointer — Rust's
/// aliasing rules make that pattern unavailable, so the queue is threaded
/// through explicitly instead (see the crate's `REDESIGN FLAGS`).
pub struct DecodeSink<'a> {
  pub(crate) queue: &'a mut crate::event::EventQueue,
}

impl DecodeSink<'_> {
  /// Pushes a [`crate::FrameMeta`] event. Returns `false` if the queue is
  /// full (the caller should surface this how it sees fit; the core
  /// itself treats a full queue as an overflow only for its own
  /// system-generated slice/close events).
  pub fn push_frame(&mut self, frame: crate::FrameMeta) -> bool {
    self.queue.push(QueuedEvent::Frame(frame))
  }

  /// Pushes a PING event.
  pub fn push_ping(&mut self) -> bool {
    self.queue.push(QueuedEvent::Ping)
  }

  /// Pushes a PONG event.
  pub fn push_pong(&mut self) -> bool {
    self.queue.push(QueuedEvent::Pong)
  }
}

/// Interface implemented by wire-level protocols.
///
/// A codec is a triple of pure operations plus whatever state it needs to
/// carry between calls (the C reference's `void *codec_state` collapses
/// into `self` here). [`crate::Link`] owns exactly one codec value once
/// [`crate::Link::attach_codec`] is called.
pub trait Codec {
  /// Performs one step of the protocol-specific handshake.
  ///
  /// May be invoked repeatedly with accumulating input as more bytes
  /// arrive. Must report `consumed <= input.len()`. Output is written
  /// into `out`, which the link places at its TX buffer's head.
  fn handshake(&mut self, input: &[u8], out: &mut [u8]) -> HandshakeOutcome;

  /// Inspects the current RX window without consuming it.
  ///
  /// May enqueue [`crate::FrameMeta`]/PING/PONG events through `sink` and
  /// must report the number of bytes the in-progress frame needs via
  /// `frame_len` (`0` means "no frame currently tracked, wait for more
  /// data"). Returning anything other than [`WenResult::Ok`] surfaces as
  /// an [`crate::Event::Error`] and does not advance the link past this
  /// poll.
  ///
  /// The default implementation does nothing and reports
  /// [`WenResult::Ok`], matching a codec that has no framing concept of
  /// its own (the link will slice raw bytes directly).
  fn decode(
    &mut self,
    data: &[u8],
    sink: &mut DecodeSink<'_>,
    frame_len: &mut u64,
  ) -> WenResult {
    let _ = (data, sink, frame_len);
    WenResult::Ok
  }

  /// Encodes an outgoing message or control frame into `out`.
  ///
  /// Fails with [`WenResult::Overflow`] when `out` is too small for the
  /// encoded frame, or [`WenResult::Protocol`] when the request violates
  /// the wire protocol (e.g. an over-sized control frame).
  ///
  /// The default implementation reports [`WenResult::Unsupported`],
  /// matching a codec that is receive-only.
  fn encode(
    &mut self,
    opcode: u8,
    payload: &[u8],
    out: &mut [u8],
  ) -> Result<usize, WenResult> {
    let _ = (opcode, payload, out);
    Err(WenResult::Unsupported)
  }
}
