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

use mactest_packets::Error as PacketError;
use thiserror::Error;

/// Failures of the agent operations.
///
/// Every variant halts the running test: they report a bug of the device or
/// of the agent, never a transient condition.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Invalid frame configuration, raised before anything is sent.
    #[error("frame error: {0}")]
    Packet(#[from] PacketError),
    /// Failure of the channel to the device.
    #[error("transport error: {0:#}")]
    Transport(#[from] anyhow::Error),
    #[error("configuration error: {0}")]
    Config(String),
    /// A field of a frame differs from the frame it was derived from.
    #[error("{context}: {field} not correct (sent={expected}, rcvd={actual})")]
    Mismatch { context: String, field: &'static str, expected: String, actual: String },
    /// A frame could not be decapsulated.
    #[error("{context}: {what} malformed:\n{dump}")]
    Malformed { context: String, what: &'static str, dump: String },
    #[error("fragment chain broken: {0}")]
    FragmentChain(String),
    #[error("TX calculated HW MPDU length ({theoretical}) different from SW MPDU length ({reported})")]
    LengthMismatch { theoretical: usize, reported: u16 },
    #[error("TX policy pattern is wrong {0:#010X} != 0xBADCAB1E")]
    PolicyPattern(u32),
}

pub type AgentResult<T> = Result<T, AgentError>;

impl AgentError {
    pub(crate) fn mismatch(
        context: &str,
        field: &'static str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> AgentError {
        AgentError::Mismatch {
            context: context.to_string(),
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = AgentError::mismatch("RX", "ETHERTYPE", "0800", "86DD");
        assert_eq!(err.to_string(), "RX: ETHERTYPE not correct (sent=0800, rcvd=86DD)");
        assert_eq!(
            AgentError::PolicyPattern(0x12345678).to_string(),
            "TX policy pattern is wrong 0x12345678 != 0xBADCAB1E"
        );
        let err: AgentError = PacketError::InvalidPriority(9).into();
        assert!(matches!(err, AgentError::Packet(PacketError::InvalidPriority(9))));
        let err: AgentError = anyhow::anyhow!("socket closed").into();
        assert_eq!(err.to_string(), "transport error: socket closed");
    }
}
