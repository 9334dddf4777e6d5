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

//! MPDUs received from the air, in the MAC HW receive record format.
//!
//! A record is the [`MacHwHeader`] followed by the frame body padded to a
//! word boundary and an [`RxTrailer`] holding the integrity placeholders,
//! the body length, the timestamp and the reception status.

use bytes::{BufMut, Bytes, BytesMut};
use zerocopy::byteorder::little_endian::{U16, U32};
use zerocopy::{AsBytes, FromBytes};
use zerocopy_derive::{AsBytes, FromBytes, FromZeroes, Unaligned};

use crate::error::{Error, Result};
use crate::ieee80211::{FrameControl, FrameType, SequenceControl, TypeSubtype};
use crate::mac_address::MacAddress;
use crate::machw::{word_padding, MacHwHeader, PLACEHOLDER, RESERVED_MARKER};

/// Sequence control used when the caller does not provide one.
pub const DEFAULT_SEQUENCE_CONTROL: SequenceControl = SequenceControl(0x500);
/// Reception status with the successful reception bit set.
pub const RX_STATUS_SUCCESS: u32 = 0x2000;

/// Fields appended after the padded frame body.
#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Unaligned, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RxTrailer {
    pub icv: U32,
    pub mic1: U32,
    pub mic2: U32,
    pub fcs: U32,
    pub body_length: U16,
    pub reserved: U16,
    pub tsf_lo: U32,
    pub tsf_hi: U32,
    pub rx_vector: [U32; 5],
    pub status: U32,
}

impl RxTrailer {
    pub const LEN: usize = 52;

    fn new(body_length: u16) -> RxTrailer {
        let placeholder = U32::new(PLACEHOLDER as u32);
        RxTrailer {
            icv: placeholder,
            mic1: placeholder,
            mic2: placeholder,
            fcs: placeholder,
            body_length: U16::new(body_length),
            reserved: U16::new(RESERVED_MARKER),
            tsf_lo: placeholder,
            tsf_hi: placeholder,
            rx_vector: [placeholder; 5],
            status: U32::new(RX_STATUS_SUCCESS),
        }
    }
}

/// Receiver and transmitter addresses of a frame relayed between two
/// distribution systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WdsAddresses {
    pub receiver: MacAddress,
    pub transmitter: MacAddress,
}

/// Options of [`RxMpdu::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RxMpduConfig {
    pub destination: MacAddress,
    pub source: MacAddress,
    /// Defaults to a data frame with from-DS set.
    pub frame_control: FrameControl,
    /// Defaults to [`DEFAULT_SEQUENCE_CONTROL`].
    pub sequence_control: SequenceControl,
    /// Required when both to-DS and from-DS are set.
    pub wds: Option<WdsAddresses>,
}

impl RxMpduConfig {
    pub fn new(destination: MacAddress, source: MacAddress) -> RxMpduConfig {
        RxMpduConfig {
            destination,
            source,
            frame_control: FrameControl {
                from_ds: true,
                ..FrameControl::new(TypeSubtype::DATA)
            },
            sequence_control: DEFAULT_SEQUENCE_CONTROL,
            wds: None,
        }
    }
}

/// The supported assignments of logical addresses to address fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Addressing {
    /// Data frame, to-DS and from-DS clear.
    DataIbss { destination: MacAddress, source: MacAddress, bssid: MacAddress },
    /// Data frame sent by the access point.
    DataFromDs { destination: MacAddress, bssid: MacAddress, source: MacAddress },
    /// Data frame sent to the access point.
    DataToDs { bssid: MacAddress, source: MacAddress, destination: MacAddress },
    /// Data frame between two distribution systems.
    DataWds {
        receiver: MacAddress,
        transmitter: MacAddress,
        destination: MacAddress,
        source: MacAddress,
    },
    Management { destination: MacAddress, source: MacAddress, bssid: MacAddress },
}

impl Addressing {
    /// Selects the assignment for a frame control.
    pub fn new(
        frame_control: &FrameControl,
        destination: MacAddress,
        source: MacAddress,
        bssid: MacAddress,
        wds: Option<WdsAddresses>,
    ) -> Result<Addressing> {
        match (frame_control.frame_type(), frame_control.to_ds, frame_control.from_ds) {
            (FrameType::Data, false, false) => {
                Ok(Addressing::DataIbss { destination, source, bssid })
            }
            (FrameType::Data, false, true) => {
                Ok(Addressing::DataFromDs { destination, bssid, source })
            }
            (FrameType::Data, true, false) => {
                Ok(Addressing::DataToDs { bssid, source, destination })
            }
            (FrameType::Data, true, true) => {
                let wds = wds.ok_or(Error::MissingWdsAddresses)?;
                Ok(Addressing::DataWds {
                    receiver: wds.receiver,
                    transmitter: wds.transmitter,
                    destination,
                    source,
                })
            }
            (FrameType::Mgmt, _, _) => Ok(Addressing::Management { destination, source, bssid }),
            _ => Err(Error::UnsupportedAddressing(frame_control.type_subtype.value())),
        }
    }

    /// Recovers the logical addresses from the address fields of a header.
    pub fn from_fields(
        frame_control: &FrameControl,
        addr1: MacAddress,
        addr2: MacAddress,
        addr3: MacAddress,
        addr4: MacAddress,
    ) -> Result<Addressing> {
        match (frame_control.frame_type(), frame_control.to_ds, frame_control.from_ds) {
            (FrameType::Data, false, false) => {
                Ok(Addressing::DataIbss { destination: addr1, source: addr2, bssid: addr3 })
            }
            (FrameType::Data, false, true) => {
                Ok(Addressing::DataFromDs { destination: addr1, bssid: addr2, source: addr3 })
            }
            (FrameType::Data, true, false) => {
                Ok(Addressing::DataToDs { bssid: addr1, source: addr2, destination: addr3 })
            }
            (FrameType::Data, true, true) => Ok(Addressing::DataWds {
                receiver: addr1,
                transmitter: addr2,
                destination: addr3,
                source: addr4,
            }),
            (FrameType::Mgmt, _, _) => {
                Ok(Addressing::Management { destination: addr1, source: addr2, bssid: addr3 })
            }
            _ => Err(Error::UnsupportedAddressing(frame_control.type_subtype.value())),
        }
    }

    /// Address fields 1 to 4 in header order. Address 4 is zero unless the
    /// frame is relayed between distribution systems.
    pub fn fields(&self) -> [MacAddress; 4] {
        match *self {
            Addressing::DataIbss { destination, source, bssid }
            | Addressing::Management { destination, source, bssid } => {
                [destination, source, bssid, MacAddress::ZERO]
            }
            Addressing::DataFromDs { destination, bssid, source } => {
                [destination, bssid, source, MacAddress::ZERO]
            }
            Addressing::DataToDs { bssid, source, destination } => {
                [bssid, source, destination, MacAddress::ZERO]
            }
            Addressing::DataWds { receiver, transmitter, destination, source } => {
                [receiver, transmitter, destination, source]
            }
        }
    }

    pub fn destination(&self) -> MacAddress {
        match *self {
            Addressing::DataIbss { destination, .. }
            | Addressing::DataFromDs { destination, .. }
            | Addressing::DataToDs { destination, .. }
            | Addressing::DataWds { destination, .. }
            | Addressing::Management { destination, .. } => destination,
        }
    }

    pub fn source(&self) -> MacAddress {
        match *self {
            Addressing::DataIbss { source, .. }
            | Addressing::DataFromDs { source, .. }
            | Addressing::DataToDs { source, .. }
            | Addressing::DataWds { source, .. }
            | Addressing::Management { source, .. } => source,
        }
    }

    pub fn bssid(&self) -> Option<MacAddress> {
        match *self {
            Addressing::DataIbss { bssid, .. }
            | Addressing::DataFromDs { bssid, .. }
            | Addressing::DataToDs { bssid, .. }
            | Addressing::Management { bssid, .. } => Some(bssid),
            Addressing::DataWds { .. } => None,
        }
    }
}

/// An MPDU as the MAC HW stores it after reception from the air.
///
/// The record is serialized once at construction. [`RxMpdu::add_retry`] is
/// the only mutation and re-serializes the whole record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RxMpdu {
    frame_control: FrameControl,
    sequence_control: SequenceControl,
    addressing: Addressing,
    body: Bytes,
    record: Bytes,
    info: String,
}

impl RxMpdu {
    pub fn new(body: &[u8], bssid: MacAddress, config: &RxMpduConfig) -> Result<RxMpdu> {
        let frame_control = config.frame_control;
        // Unknown type/subtype pairs are rejected before the addressing rule.
        frame_control.type_subtype.name()?;
        if body.len() > u16::MAX as usize {
            return Err(Error::BodyTooLong(body.len()));
        }
        let addressing = Addressing::new(
            &frame_control,
            config.destination,
            config.source,
            bssid,
            config.wds,
        )?;
        let mut mpdu = RxMpdu {
            frame_control,
            sequence_control: config.sequence_control,
            addressing,
            body: Bytes::copy_from_slice(body),
            record: Bytes::new(),
            info: String::new(),
        };
        mpdu.build()?;
        Ok(mpdu)
    }

    /// Sets the retry flag and rebuilds the record.
    pub fn add_retry(&mut self) -> Result<()> {
        self.frame_control.retry = true;
        self.build()
    }

    fn build(&mut self) -> Result<()> {
        let [addr1, addr2, addr3, addr4] = self.addressing.fields();
        let placeholder = U16::new(PLACEHOLDER);
        let placeholder_word = U32::new(PLACEHOLDER as u32);
        let header = MacHwHeader {
            reserved: U16::new(RESERVED_MARKER),
            frame_control: U16::new(self.frame_control.pack()),
            duration_id: placeholder,
            addr1: addr1.into(),
            addr2: addr2.into(),
            addr3: addr3.into(),
            seq_ctrl: U16::new(self.sequence_control.0),
            addr4: addr4.into(),
            qos_ctrl: placeholder,
            carried_fc: placeholder,
            htc: placeholder_word,
            iv: placeholder_word,
            extended_iv: placeholder_word,
        };
        // Length checked at construction.
        let trailer = RxTrailer::new(self.body.len() as u16);

        let padding = word_padding(self.body.len());
        let mut record =
            BytesMut::with_capacity(MacHwHeader::LEN + self.body.len() + padding + RxTrailer::LEN);
        record.put_slice(header.as_bytes());
        record.put_slice(&self.body);
        record.put_bytes(0, padding);
        record.put_slice(trailer.as_bytes());
        self.record = record.freeze();
        self.info = self.frame_control.summary(&format!("sc={}", self.sequence_control))?;
        Ok(())
    }

    pub fn frame_control(&self) -> &FrameControl {
        &self.frame_control
    }

    pub fn sequence_control(&self) -> SequenceControl {
        self.sequence_control
    }

    pub fn addressing(&self) -> &Addressing {
        &self.addressing
    }

    pub fn addr1(&self) -> MacAddress {
        self.addressing.fields()[0]
    }

    pub fn addr2(&self) -> MacAddress {
        self.addressing.fields()[1]
    }

    pub fn addr3(&self) -> MacAddress {
        self.addressing.fields()[2]
    }

    pub fn addr4(&self) -> MacAddress {
        self.addressing.fields()[3]
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The serialized MAC HW record.
    pub fn as_bytes(&self) -> &Bytes {
        &self.record
    }

    pub fn len(&self) -> usize {
        self.record.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// One line description, e.g. `DATA(sc=0x500,FDS)`.
    pub fn info(&self) -> &str {
        &self.info
    }
}

/// A receive record split back into its parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RxRecord {
    pub header: MacHwHeader,
    pub body: Bytes,
    pub trailer: RxTrailer,
}

impl RxRecord {
    pub fn decode(record: &[u8]) -> Result<RxRecord> {
        let min = MacHwHeader::LEN + RxTrailer::LEN;
        if record.len() < min {
            return Err(Error::Truncated { what: "MAC HW rx record", len: record.len(), min });
        }
        let header = MacHwHeader::read_from_prefix(record).ok_or(Error::Truncated {
            what: "MAC HW header",
            len: record.len(),
            min: MacHwHeader::LEN,
        })?;
        let trailer = RxTrailer::read_from(&record[record.len() - RxTrailer::LEN..]).ok_or(
            Error::Truncated { what: "MAC HW rx trailer", len: record.len(), min },
        )?;
        let body_length = trailer.body_length.get() as usize;
        let expected = min + body_length + word_padding(body_length);
        if record.len() != expected {
            return Err(Error::Malformed {
                what: "MAC HW rx record",
                reason: format!(
                    "{} bytes for a body of {} bytes, expected {}",
                    record.len(),
                    body_length,
                    expected
                ),
            });
        }
        let body = Bytes::copy_from_slice(
            &record[MacHwHeader::LEN..MacHwHeader::LEN + body_length],
        );
        Ok(RxRecord { header, body, trailer })
    }

    pub fn frame_control(&self) -> FrameControl {
        self.header.frame_control()
    }

    pub fn sequence_control(&self) -> SequenceControl {
        SequenceControl(self.header.seq_ctrl.get())
    }

    pub fn addressing(&self) -> Result<Addressing> {
        Addressing::from_fields(
            &self.frame_control(),
            self.header.addr1(),
            self.header.addr2(),
            self.header.addr3(),
            self.header.addr4(),
        )
    }
}
