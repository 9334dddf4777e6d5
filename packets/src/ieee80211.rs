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

//! IEEE 802.11 frame control and sequence control fields.

use std::fmt;

use crate::error::{Error, Result};

// Constants for the frame control field.
// Reference: external/wpa_supplicant_8/src/common/ieee802_11_defs.h
pub const FC_PROTOCOL_VERSION: u16 = 0x0003;
pub const FC_TYPE: u16 = 0x000C;
pub const FC_SUBTYPE: u16 = 0x00F0;
pub const FC_TO_DS: u16 = 0x0100;
pub const FC_FROM_DS: u16 = 0x0200;
pub const FC_MORE_FRAG: u16 = 0x0400;
pub const FC_RETRY: u16 = 0x0800;
pub const FC_PWR_MGT: u16 = 0x1000;
pub const FC_MORE_DATA: u16 = 0x2000;
pub const FC_PROTECTED: u16 = 0x4000;
pub const FC_ORDER: u16 = 0x8000;

const TYPE_SUBTYPE_MASK: u8 = (FC_TYPE | FC_SUBTYPE) as u8;

/// Frame type, as the value of bits 2-3 in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    Mgmt = 0x00,
    Ctrl = 0x04,
    Data = 0x08,
    Reserved = 0x0C,
}

impl FrameType {
    fn from_type_subtype(value: u8) -> FrameType {
        match value & (FC_TYPE as u8) {
            0x00 => FrameType::Mgmt,
            0x04 => FrameType::Ctrl,
            0x08 => FrameType::Data,
            _ => FrameType::Reserved,
        }
    }
}

/// Type and subtype of a frame packed as the low byte of the frame
/// control field, protocol version bits cleared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TypeSubtype(u8);

impl TypeSubtype {
    pub const ASSOCIATION_REQ: TypeSubtype = TypeSubtype(0x00);
    pub const ASSOCIATION_RESP: TypeSubtype = TypeSubtype(0x10);
    pub const REASSOCIATION_REQ: TypeSubtype = TypeSubtype(0x20);
    pub const REASSOCIATION_RESP: TypeSubtype = TypeSubtype(0x30);
    pub const PROBE_REQ: TypeSubtype = TypeSubtype(0x40);
    pub const PROBE_RESP: TypeSubtype = TypeSubtype(0x50);
    pub const BEACON: TypeSubtype = TypeSubtype(0x80);
    pub const ATIM: TypeSubtype = TypeSubtype(0x90);
    pub const DISASSOCIATION: TypeSubtype = TypeSubtype(0xA0);
    pub const AUTHENTICATION: TypeSubtype = TypeSubtype(0xB0);
    pub const DEAUTHENTICATION: TypeSubtype = TypeSubtype(0xC0);
    pub const ACTION: TypeSubtype = TypeSubtype(0xD0);
    pub const ACTION_NO_ACK: TypeSubtype = TypeSubtype(0xE0);
    pub const CONTROL_WRAPPER: TypeSubtype = TypeSubtype(0x74);
    pub const BLOCK_ACK_REQ: TypeSubtype = TypeSubtype(0x84);
    pub const BLOCK_ACK: TypeSubtype = TypeSubtype(0x94);
    pub const PS_POLL: TypeSubtype = TypeSubtype(0xA4);
    pub const RTS: TypeSubtype = TypeSubtype(0xB4);
    pub const CTS: TypeSubtype = TypeSubtype(0xC4);
    pub const ACK: TypeSubtype = TypeSubtype(0xD4);
    pub const CF_END: TypeSubtype = TypeSubtype(0xE4);
    pub const CF_END_CF_ACK: TypeSubtype = TypeSubtype(0xF4);
    pub const DATA: TypeSubtype = TypeSubtype(0x08);
    pub const DATA_CF_ACK: TypeSubtype = TypeSubtype(0x18);
    pub const DATA_CF_POLL: TypeSubtype = TypeSubtype(0x28);
    pub const DATA_CF_ACK_CF_POLL: TypeSubtype = TypeSubtype(0x38);
    pub const NULL: TypeSubtype = TypeSubtype(0x48);
    pub const CF_ACK: TypeSubtype = TypeSubtype(0x58);
    pub const CF_POLL: TypeSubtype = TypeSubtype(0x68);
    pub const CF_ACK_CF_POLL: TypeSubtype = TypeSubtype(0x78);
    pub const QOS_DATA: TypeSubtype = TypeSubtype(0x88);
    pub const QOS_DATA_CF_ACK: TypeSubtype = TypeSubtype(0x98);
    pub const QOS_DATA_CF_POLL: TypeSubtype = TypeSubtype(0xA8);
    pub const QOS_DATA_CF_ACK_CF_POLL: TypeSubtype = TypeSubtype(0xB8);
    pub const QOS_NULL: TypeSubtype = TypeSubtype(0xC8);
    pub const QOS_CF_POLL: TypeSubtype = TypeSubtype(0xE8);
    pub const QOS_CF_ACK_CF_POLL: TypeSubtype = TypeSubtype(0xF8);

    /// Accepts any value that only uses the type and subtype bits.
    pub fn new(value: u8) -> Result<TypeSubtype> {
        if value & !TYPE_SUBTYPE_MASK != 0 {
            return Err(Error::InvalidTypeSubtype(value));
        }
        Ok(TypeSubtype(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn frame_type(&self) -> FrameType {
        FrameType::from_type_subtype(self.0)
    }

    /// Subtype in place, bits 4-7.
    pub fn subtype(&self) -> u8 {
        self.0 & (FC_SUBTYPE as u8)
    }

    /// Diagnostic name of a defined type/subtype pair.
    pub fn name(&self) -> Result<&'static str> {
        FRAME_NAMES
            .iter()
            .find(|(type_subtype, _)| type_subtype == self)
            .map(|(_, name)| *name)
            .ok_or(Error::UnknownFrameType(self.0))
    }

    pub fn is_qos_data(&self) -> bool {
        matches!(
            *self,
            TypeSubtype::QOS_DATA
                | TypeSubtype::QOS_DATA_CF_ACK
                | TypeSubtype::QOS_DATA_CF_POLL
                | TypeSubtype::QOS_DATA_CF_ACK_CF_POLL
        )
    }
}

/// Every type/subtype pair with a name, in frame control order.
pub const FRAME_NAMES: [(TypeSubtype, &str); 37] = [
    (TypeSubtype::ASSOCIATION_REQ, "ASSOCIATION_REQUEST"),
    (TypeSubtype::ASSOCIATION_RESP, "ASSOCIATION_RESPONSE"),
    (TypeSubtype::REASSOCIATION_REQ, "REASSOCIATION_REQUEST"),
    (TypeSubtype::REASSOCIATION_RESP, "REASSOCIATION_RESPONSE"),
    (TypeSubtype::PROBE_REQ, "PROBE_REQUEST"),
    (TypeSubtype::PROBE_RESP, "PROBE_RESPONSE"),
    (TypeSubtype::BEACON, "BEACON"),
    (TypeSubtype::ATIM, "ATIM"),
    (TypeSubtype::DISASSOCIATION, "DISASSOCIATION"),
    (TypeSubtype::AUTHENTICATION, "AUTHENTICATION"),
    (TypeSubtype::DEAUTHENTICATION, "DEAUTHENTICATION"),
    (TypeSubtype::ACTION, "ACTION"),
    (TypeSubtype::ACTION_NO_ACK, "ACTIONNOACK"),
    (TypeSubtype::CONTROL_WRAPPER, "CONTROLWRAPPER"),
    (TypeSubtype::BLOCK_ACK_REQ, "BLOCKACK_REQUEST"),
    (TypeSubtype::BLOCK_ACK, "BLOCKACK"),
    (TypeSubtype::PS_POLL, "PS_POLL"),
    (TypeSubtype::RTS, "RTS"),
    (TypeSubtype::CTS, "CTS"),
    (TypeSubtype::ACK, "ACK"),
    (TypeSubtype::CF_END, "CFEND"),
    (TypeSubtype::CF_END_CF_ACK, "CFENDCFACK"),
    (TypeSubtype::DATA, "DATA"),
    (TypeSubtype::DATA_CF_ACK, "DATACFACK"),
    (TypeSubtype::DATA_CF_POLL, "DATACFPOLL"),
    (TypeSubtype::DATA_CF_ACK_CF_POLL, "DATACFACKCFPOLL"),
    (TypeSubtype::NULL, "NULL"),
    (TypeSubtype::CF_ACK, "CFACK"),
    (TypeSubtype::CF_POLL, "CFPOLL"),
    (TypeSubtype::CF_ACK_CF_POLL, "CFACKCFPOLL"),
    (TypeSubtype::QOS_DATA, "QOSDATA"),
    (TypeSubtype::QOS_DATA_CF_ACK, "QOSDATACFACK"),
    (TypeSubtype::QOS_DATA_CF_POLL, "QOSDATACFPOLL"),
    (TypeSubtype::QOS_DATA_CF_ACK_CF_POLL, "QOSDATACFACKCFPOLL"),
    (TypeSubtype::QOS_NULL, "QOSNULL"),
    (TypeSubtype::QOS_CF_POLL, "QOSCFPOLL"),
    (TypeSubtype::QOS_CF_ACK_CF_POLL, "QOSCFACKCFPOLL"),
];

/// Unpacked 16-bit frame control field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameControl {
    pub type_subtype: TypeSubtype,
    pub to_ds: bool,
    pub from_ds: bool,
    pub more_frag: bool,
    pub retry: bool,
    pub power_mgmt: bool,
    pub more_data: bool,
    pub protected: bool,
    pub order: bool,
}

impl FrameControl {
    /// Plain frame of the given type, all flags cleared.
    pub fn new(type_subtype: TypeSubtype) -> FrameControl {
        FrameControl { type_subtype, ..Default::default() }
    }

    pub fn pack(&self) -> u16 {
        let mut fc = self.type_subtype.value() as u16;
        for (set, flag) in [
            (self.to_ds, FC_TO_DS),
            (self.from_ds, FC_FROM_DS),
            (self.more_frag, FC_MORE_FRAG),
            (self.retry, FC_RETRY),
            (self.power_mgmt, FC_PWR_MGT),
            (self.more_data, FC_MORE_DATA),
            (self.protected, FC_PROTECTED),
            (self.order, FC_ORDER),
        ] {
            if set {
                fc |= flag;
            }
        }
        fc
    }

    /// Inverse of [`FrameControl::pack`]. The protocol version bits are
    /// dropped.
    pub fn unpack(fc: u16) -> FrameControl {
        FrameControl {
            type_subtype: TypeSubtype((fc as u8) & TYPE_SUBTYPE_MASK),
            to_ds: fc & FC_TO_DS != 0,
            from_ds: fc & FC_FROM_DS != 0,
            more_frag: fc & FC_MORE_FRAG != 0,
            retry: fc & FC_RETRY != 0,
            power_mgmt: fc & FC_PWR_MGT != 0,
            more_data: fc & FC_MORE_DATA != 0,
            protected: fc & FC_PROTECTED != 0,
            order: fc & FC_ORDER != 0,
        }
    }

    pub fn frame_type(&self) -> FrameType {
        self.type_subtype.frame_type()
    }

    pub fn subtype(&self) -> u8 {
        self.type_subtype.subtype()
    }

    /// Frame has addr4 field
    pub fn has_a4(&self) -> bool {
        self.to_ds && self.from_ds
    }

    /// Length of the MAC header fields the MAC HW emits on air for this
    /// frame control, without the frame body.
    pub fn hdr_length(&self, extended_iv: bool) -> usize {
        let frame_type = self.frame_type();
        let data_or_mgmt = matches!(frame_type, FrameType::Data | FrameType::Mgmt);
        // frame control + duration/id + addr1
        let mut length = 10;
        if data_or_mgmt
            || matches!(
                self.type_subtype,
                TypeSubtype::RTS
                    | TypeSubtype::PS_POLL
                    | TypeSubtype::CF_END
                    | TypeSubtype::BLOCK_ACK
                    | TypeSubtype::BLOCK_ACK_REQ
            )
        {
            length += 6;
        }
        if data_or_mgmt {
            length += 6;
        }
        if frame_type == FrameType::Data {
            length += 2;
        }
        if self.has_a4() {
            length += 6;
        }
        if self.type_subtype.is_qos_data() {
            length += 2;
        }
        let control_wrapper = self.type_subtype == TypeSubtype::CONTROL_WRAPPER;
        // carried frame control
        if control_wrapper {
            length += 2;
        }
        // HTC
        if control_wrapper || self.order {
            length += 4;
        }
        if self.protected {
            length += 4;
            if extended_iv {
                length += 4;
            }
        }
        length
    }

    /// One line description such as `DATA(sc=0x500,FDS,MF)`.
    pub fn summary(&self, prefix: &str) -> Result<String> {
        let mut info = format!("{}({}", self.type_subtype.name()?, prefix);
        for (set, tag) in [
            (self.to_ds, ",TDS"),
            (self.from_ds, ",FDS"),
            (self.more_frag, ",MF"),
            (self.retry, ",R"),
            (self.power_mgmt, ",PM"),
            (self.more_data, ",MD"),
            (self.protected, ",PF"),
            (self.order, ",O"),
        ] {
            if set {
                info.push_str(tag);
            }
        }
        info.push(')');
        Ok(info)
    }
}

pub const SCTL_SEQ_NUM: u16 = 0xFFF0;
pub const SCTL_FRAG_NUM: u16 = 0x000F;

/// Sequence control field: sequence number in bits 15-4, fragment number in
/// bits 3-0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SequenceControl(pub u16);

impl SequenceControl {
    pub const MAX_FRAGMENTS: usize = 16;

    pub fn new(sequence_number: u16, fragment_number: u8) -> SequenceControl {
        SequenceControl(
            ((sequence_number << 4) & SCTL_SEQ_NUM) | (fragment_number as u16 & SCTL_FRAG_NUM),
        )
    }

    pub fn sequence_number(&self) -> u16 {
        self.0 >> 4
    }

    pub fn fragment_number(&self) -> u8 {
        (self.0 & SCTL_FRAG_NUM) as u8
    }

    /// Next MSDU: sequence number incremented, fragment number reset.
    pub fn next_sequence(&self) -> SequenceControl {
        SequenceControl(self.0.wrapping_add(1 << 4) & SCTL_SEQ_NUM)
    }

    /// Next fragment of the same MSDU.
    pub fn next_fragment(&self) -> SequenceControl {
        SequenceControl(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SequenceControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_flag_combinations(type_subtype: TypeSubtype) -> impl Iterator<Item = FrameControl> {
        (0u16..256).map(move |bits| FrameControl {
            type_subtype,
            to_ds: bits & 0x01 != 0,
            from_ds: bits & 0x02 != 0,
            more_frag: bits & 0x04 != 0,
            retry: bits & 0x08 != 0,
            power_mgmt: bits & 0x10 != 0,
            more_data: bits & 0x20 != 0,
            protected: bits & 0x40 != 0,
            order: bits & 0x80 != 0,
        })
    }

    #[test]
    fn test_pack_unpack_every_frame_and_flag() {
        for (type_subtype, _) in FRAME_NAMES {
            for fc in all_flag_combinations(type_subtype) {
                let packed = fc.pack();
                assert_eq!(packed & 0xFF, type_subtype.value() as u16);
                assert_eq!(FrameControl::unpack(packed), fc);
            }
        }
    }

    #[test]
    fn test_pack_bit_layout() {
        let fc = FrameControl {
            to_ds: true,
            power_mgmt: true,
            order: true,
            ..FrameControl::new(TypeSubtype::QOS_DATA)
        };
        assert_eq!(fc.pack(), 0x8000 | 0x1000 | 0x0100 | 0x88);
        let fc = FrameControl { from_ds: true, ..FrameControl::new(TypeSubtype::DATA) };
        assert_eq!(fc.pack().to_le_bytes(), [0x08, 0x02]);
    }

    #[test]
    fn test_unpack_fields() {
        // QoS data from the AP, retry
        let fc = FrameControl::unpack(0x0a88);
        assert_eq!(fc.frame_type(), FrameType::Data);
        assert_eq!(fc.subtype(), 0x80);
        assert_eq!(fc.type_subtype, TypeSubtype::QOS_DATA);
        assert!(fc.from_ds && fc.retry);
        assert!(!fc.to_ds && !fc.more_frag && !fc.protected);
        // protocol version bits are ignored
        assert_eq!(FrameControl::unpack(0x0083).type_subtype, TypeSubtype::BEACON);
    }

    #[test]
    fn test_type_subtype_validation() {
        assert_eq!(TypeSubtype::new(0xB0), Ok(TypeSubtype::AUTHENTICATION));
        assert_eq!(TypeSubtype::new(0x81), Err(Error::InvalidTypeSubtype(0x81)));
        assert_eq!(TypeSubtype::new(0x64).unwrap().name(), Err(Error::UnknownFrameType(0x64)));
        assert_eq!(TypeSubtype::new(0x0C).unwrap().frame_type(), FrameType::Reserved);
        assert_eq!(TypeSubtype::CTS.name(), Ok("CTS"));
    }

    #[test]
    fn test_summary() {
        let fc = FrameControl {
            from_ds: true,
            more_frag: true,
            power_mgmt: true,
            ..FrameControl::new(TypeSubtype::DATA)
        };
        assert_eq!(fc.summary("sc=0x500").unwrap(), "DATA(sc=0x500,FDS,MF,PM)");
        let fc = FrameControl { to_ds: true, order: true, ..FrameControl::new(TypeSubtype::RTS) };
        assert_eq!(fc.summary("ch=5").unwrap(), "RTS(ch=5,TDS,O)");
        assert!(FrameControl::new(TypeSubtype(0x0C)).summary("").is_err());
    }

    #[test]
    fn test_hdr_length() {
        let fc = FrameControl { to_ds: true, ..FrameControl::new(TypeSubtype::QOS_DATA) };
        assert_eq!(fc.hdr_length(false), 26);
        let wds = FrameControl { from_ds: true, ..fc };
        assert_eq!(wds.hdr_length(false), 32);
        assert_eq!(FrameControl::new(TypeSubtype::BEACON).hdr_length(false), 22);
        assert_eq!(FrameControl::new(TypeSubtype::ACK).hdr_length(false), 10);
        assert_eq!(FrameControl::new(TypeSubtype::RTS).hdr_length(false), 16);
        assert_eq!(FrameControl::new(TypeSubtype::CONTROL_WRAPPER).hdr_length(false), 16);
        let protected = FrameControl { protected: true, ..FrameControl::new(TypeSubtype::DATA) };
        assert_eq!(protected.hdr_length(false), 28);
        assert_eq!(protected.hdr_length(true), 32);
    }

    #[test]
    fn test_sequence_control() {
        let sctl = SequenceControl::new(0x123, 4);
        assert_eq!(sctl, SequenceControl(0x1234));
        assert_eq!(sctl.sequence_number(), 0x123);
        assert_eq!(sctl.fragment_number(), 4);
        assert_eq!(sctl.next_fragment(), SequenceControl(0x1235));
        assert_eq!(sctl.next_sequence(), SequenceControl(0x1240));
        // sequence number wraps at 12 bits
        assert_eq!(SequenceControl(0xFFF3).next_sequence(), SequenceControl(0));
        assert_eq!(format!("{}", SequenceControl(0x500)), "0x500");
    }
}
