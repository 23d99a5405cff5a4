//! Shared fake transport for integration tests, grounded on the
//! original C reference's `tests/test_fake_ws.c` harness: a scripted
//! queue of bytes to read, and a log of everything written, both shared
//! via `Rc<RefCell<_>>` so a test can keep feeding bytes in or
//! inspecting what was written after handing the `FakeIo` itself to a
//! `Link`, which takes ownership of its transport.
//!
//! Bytes should be fed just before the poll loop that is meant to
//! consume them, the same way the reference harness calls `fake_feed`
//! right before `wen_poll` — feeding everything up front can let an
//! unrelated later read observe an empty queue and misread it as EOF.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use wen::WenIo;

#[derive(Default, Clone)]
pub struct WrittenLog(Rc<RefCell<Vec<u8>>>);

impl WrittenLog {
  pub fn as_vec(&self) -> Vec<u8> {
    self.0.borrow().clone()
  }
}

#[derive(Default, Clone)]
pub struct ReadQueue(Rc<RefCell<VecDeque<u8>>>);

impl ReadQueue {
  pub fn feed(&self, bytes: &[u8]) {
    self.0.borrow_mut().extend(bytes.iter().copied());
  }
}

pub struct FakeIo {
  to_read: ReadQueue,
  written: WrittenLog,
}

impl FakeIo {
  /// A fake transport plus handles onto its read queue and write log, so
  /// the caller can keep feeding bytes and inspect what was written
  /// after moving `FakeIo` into a `Link`.
  pub fn new() -> (Self, ReadQueue, WrittenLog) {
    let to_read = ReadQueue::default();
    let written = WrittenLog::default();
    let io = FakeIo { to_read: to_read.clone(), written: written.clone() };
    (io, to_read, written)
  }
}

impl WenIo for FakeIo {
  fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut q = self.to_read.0.borrow_mut();
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
    self.written.0.borrow_mut().extend_from_slice(buf);
    Ok(buf.len())
  }
}
