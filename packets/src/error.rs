// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Errors raised while building or parsing frames.

use thiserror::Error;

/// Errors raised by the frame codecs.
///
/// Configuration errors are raised before any byte is emitted. Parsing of
/// Ethernet and LLC/SNAP buffers reports malformed input through the `ok`
/// flag of the unpack records instead; this type only surfaces for those
/// when a caller asks for a validated frame.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("user priority {0} out of range (must be < 8)")]
    InvalidPriority(u8),
    #[error("VLAN id {0:#x} out of range (must be < 4096)")]
    InvalidVlanId(u16),
    #[error("payload length {0} out of range (must be in (1, 1500])")]
    InvalidPayloadLength(usize),
    #[error("type/subtype {0:#04x} carries bits outside of the type and subtype fields")]
    InvalidTypeSubtype(u8),
    #[error("unknown frame type/subtype {0:#04x}")]
    UnknownFrameType(u8),
    #[error("addressing not supported for frame type {0:#04x}")]
    UnsupportedAddressing(u8),
    #[error("receiver and transmitter addresses are required when to-DS and from-DS are set")]
    MissingWdsAddresses,
    #[error("invalid {kind} queue index {index}")]
    InvalidQueue { kind: &'static str, index: u8 },
    #[error("{what} truncated: {len} bytes, expected at least {min}")]
    Truncated { what: &'static str, len: usize, min: usize },
    #[error("{what} malformed: {reason}")]
    Malformed { what: &'static str, reason: String },
    #[error("frame body of {0} bytes does not fit the 16-bit length field")]
    BodyTooLong(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
