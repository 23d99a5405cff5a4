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

/// Compile-time-macro configuration in the reference implementation
/// (`WEN_RX_BUFFER`, `WEN_TX_BUFFER`, `WEN_MAX_SLICE`,
/// `WEN_EVENT_QUEUE_CAP`) becomes a plain runtime value here, set once at
/// [`crate::Link::init`] and immutable for the life of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
  rx_capacity: usize,
  tx_capacity: usize,
  max_slice: usize,
  event_queue_cap: usize,
}

impl LinkConfig {
  /// Minimum allowed RX/TX buffer capacity, matching the reference
  /// implementation's static assertions.
  pub const MIN_BUFFER: usize = 1024;
  /// Minimum allowed event queue capacity.
  pub const MIN_EVENT_QUEUE_CAP: usize = 8;

  /// Sets the RX ring capacity. Must be `>= `[`LinkConfig::MIN_BUFFER`]
  /// and large enough for the largest frame header plus slice the
  /// attached codec expects.
  pub fn rx_capacity(mut self, n: usize) -> Self {
    assert!(n >= Self::MIN_BUFFER, "rx_capacity below the minimum of {}", Self::MIN_BUFFER);
    self.rx_capacity = n;
    self
  }

  /// Sets the TX ring capacity.
  pub fn tx_capacity(mut self, n: usize) -> Self {
    assert!(n >= Self::MIN_BUFFER, "tx_capacity below the minimum of {}", Self::MIN_BUFFER);
    self.tx_capacity = n;
    self
  }

  /// Sets the maximum size of a slice handed to the user in one event.
  pub fn max_slice(mut self, n: usize) -> Self {
    self.max_slice = n;
    self
  }

  /// Sets the event queue's capacity. One slot is always reserved
  /// internally to disambiguate empty from full, so `n - 1` events may be
  /// queued at once.
  pub fn event_queue_cap(mut self, n: usize) -> Self {
    assert!(
      n >= Self::MIN_EVENT_QUEUE_CAP,
      "event_queue_cap below the minimum of {}",
      Self::MIN_EVENT_QUEUE_CAP
    );
    self.event_queue_cap = n;
    self
  }

  pub(crate) fn rx(&self) -> usize {
    self.rx_capacity
  }

  pub(crate) fn tx(&self) -> usize {
    self.tx_capacity
  }

  pub(crate) fn slice_cap(&self) -> usize {
    self.max_slice
  }

  pub(crate) fn evq_cap(&self) -> usize {
    self.event_queue_cap
  }
}

impl Default for LinkConfig {
  fn default() -> Self {
    LinkConfig {
      rx_capacity: 8192,
      tx_capacity: 8192,
      max_slice: 4096,
      event_queue_cap: 16,
    }
  }
}
