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

use crate::arena::Arena;
use crate::codec::{Codec, DecodeSink, HandshakeStatus};
use crate::config::LinkConfig;
use crate::error::{WenError, WenResult};
use crate::event::{Event, EventQueue, QueuedEvent, Slice, SliceFlags};
use crate::io::WenIo;

/// Current state of a [`Link`].
///
/// States only move forward: `Init -> Handshake -> Open -> Closing ->
/// Closed`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LinkState {
  Init,
  Handshake,
  Open,
  Closing,
  Closed,
}

/// A single wire connection: state, buffers, codec, and arena.
///
/// `Link` owns everything it touches and is confined to a single thread —
/// see the crate's top-level documentation for the concurrency model.
/// Generic over the I/O backend `IO` (anything implementing
/// [`WenIo`]) and the attached codec `C`.
pub struct Link<'a, IO, C> {
  state: LinkState,
  io: IO,
  config: LinkConfig,

  rx: Vec<u8>,
  rx_len: usize,

  tx: Vec<u8>,
  tx_len: usize,

  /// Bytes of the current frame not yet surfaced as slices. `0` means no
  /// frame is currently tracked.
  frame_len: u64,

  codec: Option<C>,

  evq: EventQueue,
  arena: Arena<'a>,

  slice_outstanding: bool,
  close_queued: bool,
  /// Numeric code carried by the next [`Event::Close`]. Set by
  /// [`Link::close`]; stays `0` (no status) when closing was driven by
  /// remote EOF instead of a local call.
  close_code: u16,
}

impl<IO: WenIo, C: Codec> Link<'static, IO, C> {
  /// Initializes a link with the given I/O backend and an owned arena
  /// sized `config.rx_capacity() + config.tx_capacity()`.
  pub fn init(io: IO, config: LinkConfig) -> Result<Self, WenError> {
    let arena = Arena::init(config.rx() + config.tx())?;
    Ok(Link {
      state: LinkState::Init,
      io,
      rx: vec![0u8; config.rx()],
      rx_len: 0,
      tx: vec![0u8; config.tx()],
      tx_len: 0,
      frame_len: 0,
      codec: None,
      evq: EventQueue::new(config.evq_cap()),
      arena,
      slice_outstanding: false,
      close_queued: false,
      close_code: 0,
      config,
    })
  }
}

impl<'a, IO: WenIo, C: Codec> Link<'a, IO, C> {
  /// Initializes a link bound to a caller-provided backing buffer for its
  /// arena (`WEN_NO_MALLOC` mode in the reference implementation). The
  /// buffer must outlive the link.
  pub fn init_with_arena_buffer(
    io: IO,
    config: LinkConfig,
    arena_buf: &'a mut [u8],
  ) -> Self {
    Link {
      state: LinkState::Init,
      io,
      rx: vec![0u8; config.rx()],
      rx_len: 0,
      tx: vec![0u8; config.tx()],
      tx_len: 0,
      frame_len: 0,
      codec: None,
      evq: EventQueue::new(config.evq_cap()),
      arena: Arena::bind(arena_buf),
      slice_outstanding: false,
      close_queued: false,
      close_code: 0,
      config,
    }
  }

  /// Attaches a codec and transitions the link from `Init` to
  /// `Handshake`.
  pub fn attach_codec(&mut self, codec: C) {
    self.codec = Some(codec);
    self.state = LinkState::Handshake;
  }

  /// Attaches a codec and transitions straight to `Open`, skipping
  /// [`Codec::handshake`] entirely.
  ///
  /// For callers whose HTTP framework already completed the upgrade
  /// handshake out-of-band (see the `upgrade` feature) before handing the
  /// hijacked transport to the link; re-running the codec's own
  /// handshake against a stream that has already moved past it would
  /// otherwise stall waiting for bytes that were consumed by the framework.
  pub fn attach_codec_open(&mut self, codec: C) {
    self.codec = Some(codec);
    self.state = LinkState::Open;
  }

  /// Current link state.
  pub fn state(&self) -> LinkState {
    self.state
  }

  /// Polls for the next available event.
  ///
  /// Performs, in order, on every call: drain a queued event; flush
  /// pending TX; read available RX; drive the handshake or decode/slice
  /// step. Returns at the first step that produces an event.
  pub fn poll(&mut self) -> Option<Event> {
    // Step 1: queued events win over fresh I/O.
    if let Some(qev) = self.evq.pop() {
      if let QueuedEvent::Close(_) = &qev {
        if self.state != LinkState::Closed {
          self.state = LinkState::Closed;
          self.close_queued = false;
          self.arena.release();
        }
      }
      return Some(self.materialize(qev));
    }

    if self.state == LinkState::Closed {
      return None;
    }

    if self.codec.is_none() {
      return Some(Event::Error(WenResult::Unsupported));
    }

    // Step 4: flush TX before any new RX.
    if self.tx_len > 0 {
      return self.flush_tx();
    }

    // Step 4.5: give the handshake a chance to speak before anything has
    // been read. Most codecs (the server-role WebSocket handshake) have
    // nothing to say until their peer's bytes arrive, in which case this
    // is a harmless no-op (consumes nothing, writes nothing) and control
    // falls through to the read below exactly as before. A codec whose
    // handshake must send first (the client-role WebSocket handshake)
    // instead stages its opening bytes into TX here; since TX is flushed
    // before RX on the next poll, the request reaches the wire before
    // the link ever attempts to read the response. Without this, such a
    // codec would never be driven: the read at step 5 would run first and
    // either block forever on a live socket, or read EOF against a fake
    // transport that has nothing queued yet.
    if self.state == LinkState::Handshake && self.rx_len == 0 && self.tx_len == 0 {
      if let Some(ev) = self.do_handshake() {
        return Some(ev);
      }
      if self.tx_len > 0 {
        return None;
      }
    }

    // Step 5: read into RX.
    if self.rx_len < self.rx.len() {
      match self.io.read(&mut self.rx[self.rx_len..]) {
        Err(_) => return Some(Event::Error(WenResult::Io)),
        Ok(0) => {
          if self.state < LinkState::Closing {
            self.state = LinkState::Closing;
          }
          if !self.close_queued && !self.slice_outstanding {
            if let Some(ev) = self.try_enqueue_close() {
              return Some(ev);
            }
          }
          return None;
        }
        Ok(n) => self.rx_len += n,
      }
    }

    // Step 6: handshake.
    if self.state == LinkState::Handshake {
      return self.do_handshake();
    }

    // Step 7: decode and slice.
    self.do_decode_and_slice()
  }

  /// Releases a slice previously returned by [`Link::poll`], rolling the
  /// arena back to the snapshot it was allocated at.
  ///
  /// # Panics
  ///
  /// Panics if no slice is currently outstanding.
  pub fn release(&mut self, slice: Slice) {
    assert!(self.slice_outstanding, "Link::release called with no outstanding slice");
    self.arena.reset(slice.snapshot);
    self.slice_outstanding = false;
  }

  /// Borrows the bytes behind a slice handle returned by [`Link::poll`].
  ///
  /// Valid until [`Link::release`] is called with the same handle. Kept
  /// as a separate, immutably-borrowing accessor (rather than embedding
  /// `&[u8]` directly in [`Event::Slice`]) so that `poll`/`release`
  /// calls, which need `&mut self`, never have to coexist with a live
  /// borrow from an earlier `poll` — see [`Slice`]'s documentation.
  pub fn slice_data(&self, slice: &Slice) -> &[u8] {
    self.arena.bytes(slice.offset, slice.len())
  }

  /// Stages an outgoing message for the attached codec to encode. Does
  /// not synchronously write; the bytes are flushed on a later
  /// [`Link::poll`].
  ///
  /// Fails with [`WenResult::State`] if no codec is attached or TX is
  /// already full (flush with [`Link::poll`] first), or whatever
  /// [`WenResult`] the codec's `encode` itself reports (e.g.
  /// [`WenResult::Overflow`] if the encoded frame wouldn't fit even into
  /// an empty TX buffer, or [`WenResult::Unsupported`] if the codec has
  /// no `encode`).
  pub fn send(&mut self, opcode: u8, data: &[u8]) -> Result<(), WenResult> {
    let codec = self.codec.as_mut().ok_or(WenResult::State)?;
    if self.tx_len >= self.tx.len() {
      return Err(WenResult::State);
    }
    let out_len = codec.encode(opcode, data, &mut self.tx[self.tx_len..])?;
    self.tx_len += out_len;
    Ok(())
  }

  /// Initiates a clean protocol-level close, producing a close frame
  /// (via the codec's `encode`) staged in TX; flushing is left to
  /// subsequent polls.
  ///
  /// A no-op returning `Ok` if the link is already closed. Fails with
  /// [`WenResult::State`] if TX is non-empty.
  pub fn close(&mut self, code: u16, opcode: u8) -> Result<(), WenResult> {
    if self.state >= LinkState::Closed {
      return Ok(());
    }
    if self.tx_len != 0 {
      return Err(WenResult::State);
    }

    self.state = LinkState::Closing;
    self.close_code = code;
    if let Some(codec) = self.codec.as_mut() {
      let payload = code.to_be_bytes();
      if let Ok(out_len) = codec.encode(opcode, &payload, &mut self.tx[..]) {
        self.tx_len = out_len;
      }
    }

    Ok(())
  }

  fn materialize(&self, qev: QueuedEvent) -> Event {
    match qev {
      QueuedEvent::Open => Event::Open,
      QueuedEvent::Slice(s) => Event::Slice(s),
      QueuedEvent::Frame(f) => Event::Frame(f),
      QueuedEvent::Ping => Event::Ping,
      QueuedEvent::Pong => Event::Pong,
      QueuedEvent::Close(code) => Event::Close(code),
      QueuedEvent::Error(e) => Event::Error(e),
    }
  }

  fn try_enqueue_close(&mut self) -> Option<Event> {
    if self.evq.push(QueuedEvent::Close(self.close_code)) {
      self.close_queued = true;
      None
    } else {
      Some(Event::Error(WenResult::Overflow))
    }
  }

  fn flush_tx(&mut self) -> Option<Event> {
    match self.io.write(&self.tx[..self.tx_len]) {
      Err(_) => Some(Event::Error(WenResult::Io)),
      Ok(n) => {
        if n < self.tx_len {
          self.tx.copy_within(n..self.tx_len, 0);
          self.tx_len -= n;
        } else {
          self.tx_len = 0;
        }

        if self.tx_len == 0
          && !self.close_queued
          && self.state >= LinkState::Closing
          && !self.slice_outstanding
        {
          if let Some(ev) = self.try_enqueue_close() {
            return Some(ev);
          }
        }
        None
      }
    }
  }

  fn do_handshake(&mut self) -> Option<Event> {
    let outcome = {
      let codec = self.codec.as_mut().unwrap();
      codec.handshake(&self.rx[..self.rx_len], &mut self.tx[..])
    };

    if outcome.out_len > 0 {
      self.tx_len = outcome.out_len;
    }

    self.rx.copy_within(outcome.consumed..self.rx_len, 0);
    self.rx_len -= outcome.consumed;

    match outcome.status {
      HandshakeStatus::Complete => {
        self.state = LinkState::Open;
        Some(Event::Open)
      }
      HandshakeStatus::Failed => Some(Event::Error(WenResult::Protocol)),
      HandshakeStatus::Incomplete => None,
    }
  }

  fn do_decode_and_slice(&mut self) -> Option<Event> {
    let max_slice = self.config.slice_cap();

    // The codec inspects the *whole* buffered RX window, not a
    // max_slice-capped prefix of it — a frame header can claim a total
    // length far larger than one slice, and the codec needs to see
    // enough of the stream to know that before the link starts
    // capping what it hands out.
    if self.frame_len == 0 {
      if let Some(codec) = self.codec.as_mut() {
        let mut sink = DecodeSink { queue: &mut self.evq };
        let r = codec.decode(&self.rx[..self.rx_len], &mut sink, &mut self.frame_len);
        if r != WenResult::Ok {
          return Some(Event::Error(r));
        }
      }
    }

    let slice_len = if self.frame_len > 0 {
      (self.frame_len as usize).min(max_slice).min(self.rx_len)
    } else {
      self.rx_len.min(max_slice)
    };
    if slice_len == 0 {
      return None;
    }

    assert!(!self.slice_outstanding, "poll: previous slice not released");

    let snap = self.arena.snapshot();
    let dst = match self.arena.alloc(slice_len) {
      Some(d) => d,
      None => return Some(Event::Error(WenResult::Overflow)),
    };
    dst.copy_from_slice(&self.rx[..slice_len]);

    let qev = QueuedEvent::Slice(Slice::new(snap, slice_len, SliceFlags::BEGIN | SliceFlags::END, snap));
    if !self.evq.push(qev) {
      self.arena.reset(snap);
      return Some(Event::Error(WenResult::Overflow));
    }

    self.rx.copy_within(slice_len..self.rx_len, 0);
    self.rx_len -= slice_len;
    self.slice_outstanding = true;

    if self.frame_len > 0 {
      self.frame_len -= slice_len as u64;
    }

    None
  }
}
