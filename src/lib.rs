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

//! _wen_ is a deterministic, single-threaded networking core for one
//! connection at a time: a bump-allocated arena, a fixed-capacity event
//! queue, and a link engine that drives a pluggable wire [`Codec`] over
//! any synchronous [`WenIo`] transport.
//!
//! The core itself knows nothing about any particular wire protocol — it
//! manages buffers, the handshake/open/closing/closed state machine, and
//! slice lifetimes. The included [`websocket`] module is the reference
//! codec: RFC 6455 framing over a hijacked HTTP/1.1 Upgrade.
//!
//! # Example
//!
//! ```no_run
//! use wen::{Link, LinkConfig, Event};
//! use wen::websocket::WebSocketCodec;
//! use std::net::TcpStream;
//!
//! fn handle(socket: TcpStream) -> anyhow::Result<()> {
//!   let mut link = Link::init(socket, LinkConfig::default())?;
//!   link.attach_codec(WebSocketCodec::server());
//!
//!   loop {
//!     match link.poll() {
//!       Some(Event::Slice(slice)) => {
//!         println!("{} bytes", slice.len());
//!         link.release(slice);
//!       }
//!       Some(Event::Close(_)) => break,
//!       Some(Event::Error(e)) => return Err(e.into()),
//!       _ => {}
//!     }
//!   }
//!   Ok(())
//! }
//! ```
//!
//! ## Fragmentation
//!
//! By default `poll` hands the application raw slices as they're sliced
//! off the wire, each tagged with [`SliceFlags`] marking its position
//! within a message. For whole messages assembled across fragments, use
//! [`websocket::FragmentCollector`].
//!
//! ## HTTP Upgrades
//!
//! Enable the `upgrade` feature to hijack a synchronous HTTP/1.1
//! connection mid-request and hand the now-raw stream to a [`Link`]. See
//! the [`upgrade`] module.

mod arena;
mod codec;
mod config;
mod error;
mod event;
mod io;
mod link;

#[cfg(feature = "upgrade")]
pub mod upgrade;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use arena::{Arena, ArenaSnapshot};
pub use codec::{Codec, DecodeSink, HandshakeOutcome, HandshakeStatus};
pub use config::LinkConfig;
pub use error::{WenError, WenResult};
pub use event::{Event, FrameMeta, Slice, SliceFlags};
pub use io::WenIo;
pub use link::{Link, LinkState};
