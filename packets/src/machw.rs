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

//! Layouts shared by the MAC HW receive and transmit records.

use std::fmt;

use zerocopy::byteorder::little_endian::{U16, U32};
use zerocopy_derive::{AsBytes, FromBytes, FromZeroes, Unaligned};

use crate::error::{Error, Result};
use crate::ieee80211::FrameControl;
use crate::mac_address::MacAddress;

/// Marker stored in the reserved half-words of the records.
pub const RESERVED_MARKER: u16 = 0xDEAD;
/// Value stored in the placeholder fields the model does not interpret.
pub const PLACEHOLDER: u16 = 0x500;

/// The MAC header as laid out by the MAC HW.
///
/// Every optional field of the 802.11 header has a slot, whether or not the
/// frame control makes it present on air.
///
/// # Header format
/// ```text
///  0 | reserved  | frame control |
///  4 | duration  | addr1 ...
///  ...           | addr2 ...
///  ...           | addr3 ...
/// 24 | seq ctrl  | addr4 ...
/// 32 | qos ctrl  | carried fc    |
/// 36 | HTC                       |
/// 40 | IV                        |
/// 44 | extended IV               |
/// ```
#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Unaligned, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MacHwHeader {
    pub reserved: U16,
    pub frame_control: U16,
    pub duration_id: U16,
    pub addr1: [u8; 6],
    pub addr2: [u8; 6],
    pub addr3: [u8; 6],
    pub seq_ctrl: U16,
    pub addr4: [u8; 6],
    pub qos_ctrl: U16,
    pub carried_fc: U16,
    pub htc: U32,
    pub iv: U32,
    pub extended_iv: U32,
}

impl MacHwHeader {
    pub const LEN: usize = 48;

    pub fn frame_control(&self) -> FrameControl {
        FrameControl::unpack(self.frame_control.get())
    }

    pub fn addr1(&self) -> MacAddress {
        MacAddress::from(self.addr1)
    }

    pub fn addr2(&self) -> MacAddress {
        MacAddress::from(self.addr2)
    }

    pub fn addr3(&self) -> MacAddress {
        MacAddress::from(self.addr3)
    }

    pub fn addr4(&self) -> MacAddress {
        MacAddress::from(self.addr4)
    }
}

/// Bit 5 of the IV word: an extended IV follows.
pub const IV_EXTENDED: u32 = 0x20;

/// Unpacks the subfields of the IV word, only the extended IV flag for now.
pub fn iv_extended(iv: u32) -> bool {
    iv & IV_EXTENDED != 0
}

/// Padding needed to align `length` on a word boundary.
pub(crate) fn word_padding(length: usize) -> usize {
    (4 - (length % 4)) % 4
}

/// MAC HW transmit queues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MacHwQueue {
    Beacon = 0,
    Background = 1,
    BestEffort = 2,
    Video = 3,
    Voice = 4,
}

impl MacHwQueue {
    /// Queue used for each 802.1D user priority.
    pub const BY_PRIORITY: [MacHwQueue; 8] = [
        MacHwQueue::BestEffort,
        MacHwQueue::Background,
        MacHwQueue::Background,
        MacHwQueue::BestEffort,
        MacHwQueue::Video,
        MacHwQueue::Video,
        MacHwQueue::Voice,
        MacHwQueue::Voice,
    ];

    pub fn for_priority(priority: u8) -> Result<MacHwQueue> {
        Self::BY_PRIORITY.get(priority as usize).copied().ok_or(Error::InvalidPriority(priority))
    }

    pub fn name(&self) -> &'static str {
        match self {
            MacHwQueue::Beacon => "Q_BCN",
            MacHwQueue::Background => "Q_BK",
            MacHwQueue::BestEffort => "Q_BE",
            MacHwQueue::Video => "Q_VI",
            MacHwQueue::Voice => "Q_VO",
        }
    }
}

impl TryFrom<u8> for MacHwQueue {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self> {
        match index {
            0 => Ok(MacHwQueue::Beacon),
            1 => Ok(MacHwQueue::Background),
            2 => Ok(MacHwQueue::BestEffort),
            3 => Ok(MacHwQueue::Video),
            4 => Ok(MacHwQueue::Voice),
            _ => Err(Error::InvalidQueue { kind: "MAC HW", index }),
        }
    }
}

impl fmt::Display for MacHwQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Air queues on which the frames transmitted by the MAC are captured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AirQueue {
    /// QoS data of the given TID, 0 to 7.
    DataTid(u8),
    DataNonQos,
    Mgmt,
    Ctrl,
}

impl AirQueue {
    pub fn index(&self) -> u8 {
        match self {
            AirQueue::DataTid(tid) => *tid,
            AirQueue::DataNonQos => 8,
            AirQueue::Mgmt => 9,
            AirQueue::Ctrl => 10,
        }
    }

    pub fn name(&self) -> &'static str {
        const TID_NAMES: [&str; 8] = [
            "DATA_TID0",
            "DATA_TID1",
            "DATA_TID2",
            "DATA_TID3",
            "DATA_TID4",
            "DATA_TID5",
            "DATA_TID6",
            "DATA_TID7",
        ];
        match self {
            AirQueue::DataTid(tid) => TID_NAMES.get(*tid as usize).copied().unwrap_or("DATA_TID?"),
            AirQueue::DataNonQos => "DATA_NQOS",
            AirQueue::Mgmt => "MGMT",
            AirQueue::Ctrl => "CTRL",
        }
    }
}

impl TryFrom<u8> for AirQueue {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self> {
        match index {
            0..=7 => Ok(AirQueue::DataTid(index)),
            8 => Ok(AirQueue::DataNonQos),
            9 => Ok(AirQueue::Mgmt),
            10 => Ok(AirQueue::Ctrl),
            _ => Err(Error::InvalidQueue { kind: "air", index }),
        }
    }
}

impl fmt::Display for AirQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Channels the MAC can be tuned to.
pub const CHANNELS: [u8; 38] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 36, 40, 44, 48, 52, 56, 60, 64, 100, 104, 108,
    112, 116, 120, 124, 128, 132, 136, 140, 149, 153, 157, 161, 165,
];
