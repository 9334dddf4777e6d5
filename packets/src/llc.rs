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

//! LLC/SNAP encapsulation of ethertype framed payloads.
//!
//! An untagged frame is `AA AA 03 00 00 00 || ethertype || payload`. A
//! tagged frame carries the 802.1Q ethertype and TCI after the first header,
//! then a second LLC/SNAP header before the real ethertype. All fields are
//! big-endian.

use bytes::BufMut;

use crate::error::Result;
use crate::ethernet::{Tci, ETHERTYPE_DOT1Q, ETHERTYPE_IPV4, ETHERTYPE_NONE};

pub const LLC_DSAP: u8 = 0xAA;
pub const LLC_SSAP: u8 = 0xAA;
pub const LLC_CTRL: u8 = 0x03;
pub const SNAP_OUI: [u8; 3] = [0x00, 0x00, 0x00];

pub const LLC_SNAP_HEADER: [u8; 6] =
    [LLC_DSAP, LLC_SSAP, LLC_CTRL, SNAP_OUI[0], SNAP_OUI[1], SNAP_OUI[2]];

/// Header length of an untagged frame.
pub const HDR_LEN: usize = 8;
/// Header length of a tagged frame.
pub const DOT1Q_HDR_LEN: usize = 18;

/// Options of an LLC/SNAP encapsulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LlcSnapConfig {
    /// Ethertype of the payload, IPv4 unless specified.
    pub ethertype: u16,
    /// Build an 802.1Q encapsulated frame when set.
    pub dot1q: Option<Tci>,
}

impl Default for LlcSnapConfig {
    fn default() -> Self {
        Self { ethertype: ETHERTYPE_IPV4, dot1q: None }
    }
}

/// Encapsulates `payload` in an LLC/SNAP frame.
///
/// The TCI is validated again so that a hand built [`Tci`] cannot emit an
/// out of range priority or VLAN id.
pub fn build(payload: &[u8], config: &LlcSnapConfig) -> Result<Vec<u8>> {
    let mut frame = Vec::with_capacity(DOT1Q_HDR_LEN + payload.len());
    frame.put_slice(&LLC_SNAP_HEADER);
    if let Some(tci) = config.dot1q {
        let tci = Tci::new(tci.priority, tci.cfi, tci.vlan_id)?;
        frame.put_u16(ETHERTYPE_DOT1Q);
        frame.put_u16(tci.pack());
        frame.put_slice(&LLC_SNAP_HEADER);
    }
    frame.put_u16(config.ethertype);
    frame.put_slice(payload);
    Ok(frame)
}

/// Result of [`unpack`].
///
/// When `ok` is false the other fields hold their defaults: no tag,
/// [`ETHERTYPE_NONE`], and the whole input as payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LlcSnapUnpack<'a> {
    pub ok: bool,
    pub dot1q: Option<Tci>,
    pub ethertype: u16,
    pub payload: &'a [u8],
}

impl<'a> LlcSnapUnpack<'a> {
    fn malformed(frame: &'a [u8]) -> Self {
        LlcSnapUnpack { ok: false, dot1q: None, ethertype: ETHERTYPE_NONE, payload: frame }
    }
}

/// Decapsulates an LLC/SNAP frame. Never fails, see [`LlcSnapUnpack`].
pub fn unpack(frame: &[u8]) -> LlcSnapUnpack<'_> {
    if frame.len() < HDR_LEN || frame[0..6] != LLC_SNAP_HEADER {
        return LlcSnapUnpack::malformed(frame);
    }
    let ethertype = u16::from_be_bytes([frame[6], frame[7]]);
    if ethertype != ETHERTYPE_DOT1Q {
        return LlcSnapUnpack { ok: true, dot1q: None, ethertype, payload: &frame[HDR_LEN..] };
    }
    if frame.len() < DOT1Q_HDR_LEN || frame[10..16] != LLC_SNAP_HEADER {
        return LlcSnapUnpack::malformed(frame);
    }
    LlcSnapUnpack {
        ok: true,
        dot1q: Some(Tci::unpack(u16::from_be_bytes([frame[8], frame[9]]))),
        ethertype: u16::from_be_bytes([frame[16], frame[17]]),
        payload: &frame[DOT1Q_HDR_LEN..],
    }
}
