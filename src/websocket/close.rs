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

//! Status codes for [`OpCode::Close`](crate::websocket::OpCode::Close) frames,
//! per [RFC 6455 §7.4](https://www.rfc-editor.org/rfc/rfc6455#section-7.4).

use std::fmt;

/// A WebSocket close status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
  Normal,
  GoingAway,
  ProtocolError,
  UnsupportedData,
  NoStatus,
  Abnormal,
  InvalidPayload,
  PolicyViolation,
  MessageTooBig,
  MandatoryExtension,
  InternalError,
  TlsHandshake,
  /// Any code outside the defined ranges, or one reserved for private
  /// use (3000-4999), carried through unmodified.
  Other(u16),
}

impl CloseCode {
  /// Whether this code is one a peer may legally send on the wire.
  /// `NoStatus`, `Abnormal`, and `TlsHandshake` are reserved for local use
  /// only (RFC 6455 §7.4.1) and must never appear in an actual close
  /// frame payload.
  pub fn is_sendable(self) -> bool {
    !matches!(self, CloseCode::NoStatus | CloseCode::Abnormal | CloseCode::TlsHandshake)
  }
}

impl From<u16> for CloseCode {
  fn from(code: u16) -> Self {
    match code {
      1000 => CloseCode::Normal,
      1001 => CloseCode::GoingAway,
      1002 => CloseCode::ProtocolError,
      1003 => CloseCode::UnsupportedData,
      1005 => CloseCode::NoStatus,
      1006 => CloseCode::Abnormal,
      1007 => CloseCode::InvalidPayload,
      1008 => CloseCode::PolicyViolation,
      1009 => CloseCode::MessageTooBig,
      1010 => CloseCode::MandatoryExtension,
      1011 => CloseCode::InternalError,
      1015 => CloseCode::TlsHandshake,
      other => CloseCode::Other(other),
    }
  }
}

impl From<CloseCode> for u16 {
  fn from(code: CloseCode) -> Self {
    match code {
      CloseCode::Normal => 1000,
      CloseCode::GoingAway => 1001,
      CloseCode::ProtocolError => 1002,
      CloseCode::UnsupportedData => 1003,
      CloseCode::NoStatus => 1005,
      CloseCode::Abnormal => 1006,
      CloseCode::InvalidPayload => 1007,
      CloseCode::PolicyViolation => 1008,
      CloseCode::MessageTooBig => 1009,
      CloseCode::MandatoryExtension => 1010,
      CloseCode::InternalError => 1011,
      CloseCode::TlsHandshake => 1015,
      CloseCode::Other(n) => n,
    }
  }
}

impl fmt::Display for CloseCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", u16::from(*self))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_known_codes() {
    for code in [
      CloseCode::Normal,
      CloseCode::GoingAway,
      CloseCode::ProtocolError,
      CloseCode::UnsupportedData,
      CloseCode::InvalidPayload,
      CloseCode::PolicyViolation,
      CloseCode::MessageTooBig,
      CloseCode::MandatoryExtension,
      CloseCode::InternalError,
      CloseCode::TlsHandshake,
    ] {
      let n: u16 = code.into();
      assert_eq!(CloseCode::from(n), code);
    }
  }

  #[test]
  fn unknown_codes_round_trip_as_other() {
    assert_eq!(CloseCode::from(4000), CloseCode::Other(4000));
    assert_eq!(u16::from(CloseCode::Other(4000)), 4000);
  }

  #[test]
  fn reserved_local_codes_are_not_sendable() {
    assert!(!CloseCode::NoStatus.is_sendable());
    assert!(!CloseCode::Abnormal.is_sendable());
    assert!(!CloseCode::TlsHandshake.is_sendable());
    assert!(CloseCode::Normal.is_sendable());
  }
}
