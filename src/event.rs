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

use crate::arena::ArenaSnapshot;
use crate::error::WenResult;
use bitflags::bitflags;

bitflags! {
    /// Indicates where a [`Slice`] lies within a message stream.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SliceFlags: u8 {
        /// The slice starts a new message.
        const BEGIN = 1 << 0;
        /// The slice continues a message begun by an earlier slice.
        const CONT  = 1 << 1;
        /// The slice ends the current message.
        const END   = 1 << 2;
    }
}

/// A handle to a byte range inside a [`crate::Link`]'s arena, returned by
/// [`crate::Link::poll`] inside [`Event::Slice`].
///
/// `Slice` deliberately does not borrow from the link: a lending
/// `fn poll(&mut self) -> Option<Event<'_>>` would tie the returned
/// bytes to the exclusive borrow used by that one `poll` call, making it
/// impossible to later call `Link::release` (which itself needs `&mut
/// Link`) without the borrow checker seeing two overlapping mutable
/// borrows — see the crate's `REDESIGN FLAGS`. Instead, `Slice` is a
/// plain `Copy` handle; fetch its bytes on demand with
/// [`crate::Link::slice_data`], and pass the handle itself to
/// [`crate::Link::release`] when done. The underlying memory stays valid
/// until release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
  pub(crate) offset: usize,
  len: usize,
  flags: SliceFlags,
  pub(crate) snapshot: ArenaSnapshot,
}

impl Slice {
  pub(crate) fn new(offset: usize, len: usize, flags: SliceFlags, snapshot: ArenaSnapshot) -> Self {
    Slice { offset, len, flags, snapshot }
  }

  /// The slice's length in bytes.
  pub fn len(&self) -> usize {
    self.len
  }

  /// Whether the slice is empty.
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Where this slice lies within a message stream.
  pub fn flags(&self) -> SliceFlags {
    self.flags
  }
}

/// Metadata for a decoded wire frame, exposed for protocol inspection and
/// debugging. Only codecs that choose to expose framing detail (WebSocket
/// does) emit [`Event::Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMeta {
  pub fin: bool,
  pub masked: bool,
  pub opcode: u8,
  pub length: u64,
}

/// An event returned by [`crate::Link::poll`].
#[derive(Debug, Clone, Copy)]
pub enum Event {
  /// The handshake completed; the link is now open for application data.
  Open,
  /// A handle to received bytes. Fetch the bytes with
  /// [`crate::Link::slice_data`]; release with [`crate::Link::release`]
  /// before another slice can be produced.
  Slice(Slice),
  /// A decoded wire frame's metadata, emitted alongside (before) the
  /// [`Event::Slice`] carrying its raw bytes.
  Frame(FrameMeta),
  /// A control ping was decoded.
  Ping,
  /// A control pong was decoded.
  Pong,
  /// The link has finished closing; no further events will follow.
  Close(u16),
  /// An I/O or protocol failure. The core never aborts on these; the
  /// caller decides how to react.
  Error(WenResult),
}

/// An event queued internally until it is drained by [`crate::Link::poll`].
///
/// This is the same shape as [`Event`] — both are plain owned data, no
/// borrow from the arena — kept as a distinct type because `Open`'s close
/// bookkeeping in `poll` needs to inspect a queued `Close` before handing
/// it back, and because the two types are conceptually different stages
/// (internal vs. delivered) even though they look alike today.
#[derive(Debug, Clone, Copy)]
pub(crate) enum QueuedEvent {
  Open,
  Slice(Slice),
  Frame(FrameMeta),
  Ping,
  Pong,
  Close(u16),
  Error(WenResult),
}

/// A fixed-capacity ring buffer of [`QueuedEvent`]s.
///
/// One slot is always reserved to disambiguate empty from full, so a
/// queue built with capacity `n` holds at most `n - 1` events.
pub(crate) struct EventQueue {
  buf: Vec<QueuedEvent>,
  head: usize,
  tail: usize,
}

impl EventQueue {
  pub fn new(capacity: usize) -> Self {
    assert!(capacity >= 2, "event queue capacity must be at least 2");
    let mut buf = Vec::with_capacity(capacity);
    buf.resize_with(capacity, || QueuedEvent::Open);
    EventQueue { buf, head: 0, tail: 0 }
  }

  fn cap(&self) -> usize {
    self.buf.len()
  }

  pub fn is_empty(&self) -> bool {
    self.head == self.tail
  }

  /// Pushes an event. Returns `false` without mutating the queue if it is
  /// full.
  pub fn push(&mut self, ev: QueuedEvent) -> bool {
    let next = (self.tail + 1) % self.cap();
    if next == self.head {
      return false;
    }
    self.buf[self.tail] = ev;
    self.tail = next;
    true
  }

  /// Pops the next event, in FIFO order. Returns `None` when empty.
  pub fn pop(&mut self) -> Option<QueuedEvent> {
    if self.is_empty() {
      return None;
    }
    let ev = self.buf[self.head].clone();
    self.head = (self.head + 1) % self.cap();
    Some(ev)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fifo_order_is_preserved() {
    let mut q = EventQueue::new(16);
    for _ in 0..15 {
      assert!(q.push(QueuedEvent::Open));
    }
    // capacity - 1 = 15 slots usable; the 16th push must fail.
    assert!(!q.push(QueuedEvent::Ping));

    for _ in 0..15 {
      assert!(matches!(q.pop(), Some(QueuedEvent::Open)));
    }
    assert!(q.pop().is_none());
  }

  #[test]
  fn push_after_drain_reuses_slots() {
    let mut q = EventQueue::new(4);
    assert!(q.push(QueuedEvent::Open));
    assert!(q.push(QueuedEvent::Ping));
    assert!(q.push(QueuedEvent::Pong));
    assert!(!q.push(QueuedEvent::Open));

    assert!(matches!(q.pop(), Some(QueuedEvent::Open)));
    assert!(q.push(QueuedEvent::Close(0)));

    assert!(matches!(q.pop(), Some(QueuedEvent::Ping)));
    assert!(matches!(q.pop(), Some(QueuedEvent::Pong)));
    assert!(matches!(q.pop(), Some(QueuedEvent::Close(0))));
    assert!(q.is_empty());
  }
}
