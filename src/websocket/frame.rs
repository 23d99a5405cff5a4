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

//! Opcodes defined by [RFC 6455 §11.8](https://www.rfc-editor.org/rfc/rfc6455#section-11.8).

/// A WebSocket frame opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
  Continuation,
  Text,
  Binary,
  Close,
  Ping,
  Pong,
}

impl OpCode {
  /// Whether this opcode starts or continues a data message, as opposed
  /// to a control frame.
  pub fn is_data(self) -> bool {
    matches!(self, OpCode::Continuation | OpCode::Text | OpCode::Binary)
  }

  /// Whether this opcode is a control frame (close/ping/pong). Control
  /// frames may not be fragmented and carry at most 125 bytes of payload.
  pub fn is_control(self) -> bool {
    !self.is_data()
  }
}

impl From<OpCode> for u8 {
  fn from(value: OpCode) -> Self {
    match value {
      OpCode::Continuation => 0x0,
      OpCode::Text => 0x1,
      OpCode::Binary => 0x2,
      OpCode::Close => 0x8,
      OpCode::Ping => 0x9,
      OpCode::Pong => 0xA,
    }
  }
}

/// A reserved or otherwise unrecognized opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownOpCode(pub u8);

impl TryFrom<u8> for OpCode {
  type Error = UnknownOpCode;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0x0 => Ok(OpCode::Continuation),
      0x1 => Ok(OpCode::Text),
      0x2 => Ok(OpCode::Binary),
      0x8 => Ok(OpCode::Close),
      0x9 => Ok(OpCode::Ping),
      0xA => Ok(OpCode::Pong),
      other => Err(UnknownOpCode(other)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_known_opcodes() {
    for op in [OpCode::Continuation, OpCode::Text, OpCode::Binary, OpCode::Close, OpCode::Ping, OpCode::Pong] {
      let byte: u8 = op.into();
      assert_eq!(OpCode::try_from(byte), Ok(op));
    }
  }

  #[test]
  fn control_vs_data_classification() {
    assert!(OpCode::Close.is_control());
    assert!(OpCode::Ping.is_control());
    assert!(OpCode::Pong.is_control());
    assert!(OpCode::Text.is_data());
    assert!(OpCode::Binary.is_data());
    assert!(OpCode::Continuation.is_data());
  }

  #[test]
  fn rejects_reserved_opcodes() {
    assert_eq!(OpCode::try_from(0x3), Err(UnknownOpCode(0x3)));
    assert_eq!(OpCode::try_from(0xB), Err(UnknownOpCode(0xB)));
  }
}
