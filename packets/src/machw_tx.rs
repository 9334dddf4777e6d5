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

//! MPDUs transmitted by the MAC, in the MAC HW transmit record format.
//!
//! # Record format
//! ```text
//!  0 | queue | channel | frame length  |
//!  4 | policy table (7 words)          |
//! 32 | MAC HW header (48 bytes)        |
//! 80 | frame body, FCS included        |
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use zerocopy::byteorder::little_endian::{U16, U32};
use zerocopy::{AsBytes, FromBytes, FromZeroes};
use zerocopy_derive::{AsBytes, FromBytes, FromZeroes, Unaligned};

use crate::error::{Error, Result};
use crate::ieee80211::{FrameControl, SequenceControl};
use crate::mac_address::MacAddress;
use crate::machw::{iv_extended, AirQueue, MacHwHeader, MacHwQueue, IV_EXTENDED, RESERVED_MARKER};

/// Tag the MAC stores in the first word of every policy table.
pub const POLICY_PATTERN: u32 = 0xBADCAB1E;
/// Bytes of FCS the MAC appends to the frame body.
pub const FCS_LEN: usize = 4;

const fn bits(word: u32, mask: u32, shift: u32) -> u32 {
    (word & mask) >> shift
}

/// Transmit parameters the software attached to the frame.
#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Unaligned, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolicyTable {
    pub pattern: U32,
    pub phy_control1: U32,
    pub phy_control2: U32,
    pub mac_control1: U32,
    pub mac_control2: U32,
    pub rate_control: U32,
    pub reserved: U32,
}

impl PolicyTable {
    pub const LEN: usize = 28;

    pub fn from_words(words: [u32; 7]) -> PolicyTable {
        PolicyTable {
            pattern: U32::new(words[0]),
            phy_control1: U32::new(words[1]),
            phy_control2: U32::new(words[2]),
            mac_control1: U32::new(words[3]),
            mac_control2: U32::new(words[4]),
            rate_control: U32::new(words[5]),
            reserved: U32::new(words[6]),
        }
    }

    pub fn words(&self) -> [u32; 7] {
        [
            self.pattern.get(),
            self.phy_control1.get(),
            self.phy_control2.get(),
            self.mac_control1.get(),
            self.mac_control2.get(),
            self.rate_control.get(),
            self.reserved.get(),
        ]
    }

    pub fn pattern(&self) -> u32 {
        self.pattern.get()
    }

    pub fn protection(&self) -> u8 {
        bits(self.phy_control1.get(), 0x30000, 16) as u8
    }

    pub fn n_tx(&self) -> u8 {
        bits(self.phy_control1.get(), 0xC000, 14) as u8
    }

    pub fn short_gi(&self) -> bool {
        self.phy_control1.get() & 0x2000 != 0
    }

    pub fn power_level(&self) -> u8 {
        bits(self.phy_control1.get(), 0xE00, 9) as u8
    }

    pub fn stbc(&self) -> u8 {
        bits(self.phy_control1.get(), 0x180, 7) as u8
    }

    pub fn ldpc(&self) -> bool {
        self.phy_control1.get() & 0x40 != 0
    }

    pub fn extension_spatial_streams(&self) -> u8 {
        bits(self.phy_control1.get(), 0x30, 4) as u8
    }

    pub fn beamformed(&self) -> bool {
        self.phy_control1.get() & 0x8 != 0
    }

    pub fn csi_precision(&self) -> bool {
        self.phy_control1.get() & 0x4 != 0
    }

    pub fn cfb_type(&self) -> u8 {
        bits(self.phy_control1.get(), 0x3, 0) as u8
    }

    pub fn cfb_size(&self) -> u8 {
        bits(self.phy_control2.get(), 0xFF0000, 16) as u8
    }

    pub fn smm_index(&self) -> u8 {
        bits(self.phy_control2.get(), 0xFF00, 8) as u8
    }

    pub fn antenna_set(&self) -> u8 {
        bits(self.phy_control2.get(), 0xFF, 0) as u8
    }

    /// Key storage RAM index of the receiver address.
    pub fn key_index_ra(&self) -> u16 {
        bits(self.mac_control1.get(), 0x3FF000, 12) as u16
    }

    pub fn key_index(&self) -> u16 {
        bits(self.mac_control1.get(), 0xFFF, 0) as u16
    }

    pub fn rts_threshold(&self) -> u16 {
        bits(self.mac_control2.get(), 0xFFF0000, 16) as u16
    }

    pub fn short_retry_limit(&self) -> u8 {
        bits(self.mac_control2.get(), 0xFF00, 8) as u8
    }

    pub fn long_retry_limit(&self) -> u8 {
        bits(self.mac_control2.get(), 0xFF, 0) as u8
    }

    pub fn mcs_index1(&self) -> u8 {
        bits(self.rate_control.get(), 0xFF0000, 16) as u8
    }

    pub fn mcs_index2(&self) -> u8 {
        bits(self.rate_control.get(), 0xFF00, 8) as u8
    }

    pub fn mcs_index3(&self) -> u8 {
        bits(self.rate_control.get(), 0xFF, 0) as u8
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        let mut policy = PolicyTable::new_zeroed();
        policy.pattern = U32::new(POLICY_PATTERN);
        policy
    }
}

/// Prefix of a transmit record.
#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Unaligned, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxDescriptor {
    pub queue: u8,
    pub channel: u8,
    pub frame_length: U16,
    pub policy: PolicyTable,
}

impl TxDescriptor {
    pub const LEN: usize = 32;
}

/// Offset of the frame body in a transmit record.
pub const BODY_OFFSET: usize = TxDescriptor::LEN + MacHwHeader::LEN;

/// Length of the frame on air computed from the MAC header fields the frame
/// control makes present, plus the body.
pub fn theoretical_length(
    frame_control: &FrameControl,
    extended_iv: bool,
    body_len: usize,
) -> usize {
    frame_control.hdr_length(extended_iv) + body_len
}

/// An MPDU captured on an air queue after transmission by the MAC.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxMpdu {
    air_queue: AirQueue,
    queue: MacHwQueue,
    descriptor: TxDescriptor,
    header: MacHwHeader,
    frame_control: FrameControl,
    body: Bytes,
    record: Bytes,
    theoretical_length: usize,
    info: String,
}

impl TxMpdu {
    pub fn parse(air_queue: AirQueue, packet: Bytes) -> Result<TxMpdu> {
        let descriptor = TxDescriptor::read_from_prefix(&packet[..]).ok_or(Error::Truncated {
            what: "MAC HW tx record",
            len: packet.len(),
            min: BODY_OFFSET,
        })?;
        let header = packet.get(TxDescriptor::LEN..).and_then(MacHwHeader::read_from_prefix).ok_or(
            Error::Truncated { what: "MAC HW tx record", len: packet.len(), min: BODY_OFFSET },
        )?;
        let queue = MacHwQueue::try_from(descriptor.queue)?;
        let frame_control = header.frame_control();
        let body = packet.slice(BODY_OFFSET..);
        let theoretical_length =
            theoretical_length(&frame_control, iv_extended(header.iv.get()), body.len());
        let info = frame_control.summary(&format!("ch={}", descriptor.channel))?;
        Ok(TxMpdu {
            air_queue,
            queue,
            descriptor,
            header,
            frame_control,
            body,
            record: packet,
            theoretical_length,
            info,
        })
    }

    pub fn air_queue(&self) -> AirQueue {
        self.air_queue
    }

    pub fn queue(&self) -> MacHwQueue {
        self.queue
    }

    pub fn channel(&self) -> u8 {
        self.descriptor.channel
    }

    /// Frame length the software handed to the MAC.
    pub fn frame_length(&self) -> u16 {
        self.descriptor.frame_length.get()
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.descriptor.policy
    }

    pub fn header(&self) -> &MacHwHeader {
        &self.header
    }

    pub fn frame_control(&self) -> &FrameControl {
        &self.frame_control
    }

    pub fn sequence_control(&self) -> SequenceControl {
        SequenceControl(self.header.seq_ctrl.get())
    }

    pub fn iv(&self) -> u32 {
        self.header.iv.get()
    }

    pub fn extended_iv(&self) -> bool {
        iv_extended(self.iv())
    }

    pub fn addr1(&self) -> MacAddress {
        self.header.addr1()
    }

    pub fn addr2(&self) -> MacAddress {
        self.header.addr2()
    }

    pub fn addr3(&self) -> MacAddress {
        self.header.addr3()
    }

    /// Frame body, including the trailing FCS.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The MAC HW formatted frame, header and body, without the descriptor.
    pub fn machw_format(&self) -> &[u8] {
        &self.record[TxDescriptor::LEN..]
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.record
    }

    pub fn theoretical_length(&self) -> usize {
        self.theoretical_length
    }

    /// Whether the computed length matches the one reported by the software.
    pub fn length_matches(&self) -> bool {
        self.theoretical_length == self.frame_length() as usize
    }

    /// One line description, e.g. `QOSDATA(ch=6,TDS)`.
    pub fn info(&self) -> &str {
        &self.info
    }
}

/// Assembles transmit records the way the MAC reports them.
#[derive(Clone, Debug)]
pub struct TxRecordBuilder {
    queue: MacHwQueue,
    channel: u8,
    frame_length: Option<u16>,
    policy: PolicyTable,
    frame_control: FrameControl,
    addresses: [MacAddress; 3],
    sequence_control: SequenceControl,
    iv: u32,
    body: Vec<u8>,
}

impl TxRecordBuilder {
    pub fn new(frame_control: FrameControl) -> TxRecordBuilder {
        TxRecordBuilder {
            queue: MacHwQueue::BestEffort,
            channel: 1,
            frame_length: None,
            policy: PolicyTable::default(),
            frame_control,
            addresses: [MacAddress::ZERO; 3],
            sequence_control: SequenceControl::default(),
            iv: 0,
            body: Vec::new(),
        }
    }

    pub fn queue(&mut self, queue: MacHwQueue) -> &mut Self {
        self.queue = queue;
        self
    }

    pub fn channel(&mut self, channel: u8) -> &mut Self {
        self.channel = channel;
        self
    }

    /// Overrides the frame length, which otherwise is the theoretical length.
    pub fn frame_length(&mut self, frame_length: u16) -> &mut Self {
        self.frame_length = Some(frame_length);
        self
    }

    pub fn policy(&mut self, policy: PolicyTable) -> &mut Self {
        self.policy = policy;
        self
    }

    pub fn addresses(
        &mut self,
        addr1: MacAddress,
        addr2: MacAddress,
        addr3: MacAddress,
    ) -> &mut Self {
        self.addresses = [addr1, addr2, addr3];
        self
    }

    pub fn sequence_control(&mut self, sequence_control: SequenceControl) -> &mut Self {
        self.sequence_control = sequence_control;
        self
    }

    pub fn iv(&mut self, iv: u32) -> &mut Self {
        self.iv = iv;
        self
    }

    pub fn extended_iv(&mut self, extended_iv: bool) -> &mut Self {
        if extended_iv {
            self.iv |= IV_EXTENDED;
        } else {
            self.iv &= !IV_EXTENDED;
        }
        self
    }

    /// Frame body, FCS included.
    pub fn body(&mut self, body: &[u8]) -> &mut Self {
        self.body = body.to_vec();
        self
    }

    pub fn build(&self) -> Result<Bytes> {
        let frame_length = match self.frame_length {
            Some(frame_length) => frame_length,
            None => {
                let length =
                    theoretical_length(&self.frame_control, iv_extended(self.iv), self.body.len());
                u16::try_from(length).map_err(|_| Error::BodyTooLong(self.body.len()))?
            }
        };
        let descriptor = TxDescriptor {
            queue: self.queue as u8,
            channel: self.channel,
            frame_length: U16::new(frame_length),
            policy: self.policy,
        };
        let [addr1, addr2, addr3] = self.addresses;
        let mut header = MacHwHeader::new_zeroed();
        header.reserved = U16::new(RESERVED_MARKER);
        header.frame_control = U16::new(self.frame_control.pack());
        header.addr1 = addr1.into();
        header.addr2 = addr2.into();
        header.addr3 = addr3.into();
        header.seq_ctrl = U16::new(self.sequence_control.0);
        header.iv = U32::new(self.iv);

        let mut record = BytesMut::with_capacity(BODY_OFFSET + self.body.len());
        record.put_slice(descriptor.as_bytes());
        record.put_slice(header.as_bytes());
        record.put_slice(&self.body);
        Ok(record.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ieee80211::TypeSubtype;

    const AP: MacAddress = MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
    const SA: MacAddress = MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    const DA: MacAddress = MacAddress::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);

    fn qos_to_ds() -> FrameControl {
        FrameControl { to_ds: true, ..FrameControl::new(TypeSubtype::QOS_DATA) }
    }

    #[test]
    fn test_layout_sizes() {
        assert_eq!(std::mem::size_of::<PolicyTable>(), PolicyTable::LEN);
        assert_eq!(std::mem::size_of::<TxDescriptor>(), TxDescriptor::LEN);
        assert_eq!(BODY_OFFSET, 80);
    }

    #[test]
    fn test_theoretical_length_qos_to_ds() {
        assert_eq!(theoretical_length(&qos_to_ds(), false, 100), 126);
        let protected = FrameControl { protected: true, ..qos_to_ds() };
        assert_eq!(theoretical_length(&protected, false, 100), 130);
        assert_eq!(theoretical_length(&protected, true, 100), 134);
    }

    #[test]
    fn test_parse_record() {
        let body = [0x5au8; 100];
        let packet = TxRecordBuilder::new(qos_to_ds())
            .queue(MacHwQueue::Video)
            .channel(6)
            .addresses(AP, SA, DA)
            .sequence_control(SequenceControl::new(7, 0))
            .body(&body)
            .build()
            .unwrap();
        assert_eq!(packet.len(), 180);
        assert_eq!(&packet[0..4], &[3, 6, 126, 0]);
        assert_eq!(&packet[4..8], &POLICY_PATTERN.to_le_bytes());

        let mpdu = TxMpdu::parse(AirQueue::DataTid(4), packet).unwrap();
        assert_eq!(mpdu.air_queue(), AirQueue::DataTid(4));
        assert_eq!(mpdu.queue(), MacHwQueue::Video);
        assert_eq!(mpdu.channel(), 6);
        assert_eq!(mpdu.frame_length(), 126);
        assert_eq!(mpdu.theoretical_length(), 126);
        assert!(mpdu.length_matches());
        assert_eq!(mpdu.policy().pattern(), POLICY_PATTERN);
        assert_eq!(*mpdu.frame_control(), qos_to_ds());
        assert_eq!(mpdu.sequence_control(), SequenceControl::new(7, 0));
        assert_eq!((mpdu.addr1(), mpdu.addr2(), mpdu.addr3()), (AP, SA, DA));
        assert_eq!(mpdu.body(), &body[..]);
        assert_eq!(mpdu.machw_format().len(), 148);
        assert!(!mpdu.extended_iv());
        assert_eq!(mpdu.info(), "QOSDATA(ch=6,TDS)");
    }

    #[test]
    fn test_length_mismatch_is_reported() {
        let fc = FrameControl { protected: true, ..qos_to_ds() };
        let packet = TxRecordBuilder::new(fc)
            .extended_iv(true)
            .frame_length(130)
            .body(&[0u8; 100])
            .build()
            .unwrap();
        let mpdu = TxMpdu::parse(AirQueue::DataTid(0), packet).unwrap();
        assert!(mpdu.extended_iv());
        assert_eq!(mpdu.theoretical_length(), 134);
        assert!(!mpdu.length_matches());
        assert_eq!(mpdu.info(), "QOSDATA(ch=1,TDS,PF)");
    }

    #[test]
    fn test_parse_errors() {
        let packet = Bytes::from_static(&[0u8; 79]);
        assert!(matches!(
            TxMpdu::parse(AirQueue::Mgmt, packet),
            Err(Error::Truncated { min: 80, .. })
        ));

        let mut record = TxRecordBuilder::new(FrameControl::new(TypeSubtype::BEACON))
            .build()
            .unwrap()
            .to_vec();
        record[0] = 7;
        assert_eq!(
            TxMpdu::parse(AirQueue::Mgmt, Bytes::from(record)),
            Err(Error::InvalidQueue { kind: "MAC HW", index: 7 })
        );
    }

    #[test]
    fn test_policy_fields() {
        let policy = PolicyTable::from_words([
            POLICY_PATTERN,
            0x0002_0000 | 0x8000 | 0x2000 | (5 << 9) | 0x100 | 0x40 | 0x20 | 0x8 | 0x4 | 0x2,
            0x0011_2233,
            (0x155 << 12) | 0xABC,
            (0x7FF << 16) | (4 << 8) | 7,
            0x0007_0502,
            0,
        ]);
        assert_eq!(policy.pattern(), 0xBADCAB1E);
        assert_eq!(policy.protection(), 2);
        assert_eq!(policy.n_tx(), 2);
        assert!(policy.short_gi());
        assert_eq!(policy.power_level(), 5);
        assert_eq!(policy.stbc(), 2);
        assert!(policy.ldpc());
        assert_eq!(policy.extension_spatial_streams(), 2);
        assert!(policy.beamformed());
        assert!(policy.csi_precision());
        assert_eq!(policy.cfb_type(), 2);
        assert_eq!(policy.cfb_size(), 0x11);
        assert_eq!(policy.smm_index(), 0x22);
        assert_eq!(policy.antenna_set(), 0x33);
        assert_eq!(policy.key_index_ra(), 0x155);
        assert_eq!(policy.key_index(), 0xABC);
        assert_eq!(policy.rts_threshold(), 0x7FF);
        assert_eq!(policy.short_retry_limit(), 4);
        assert_eq!(policy.long_retry_limit(), 7);
        assert_eq!((policy.mcs_index1(), policy.mcs_index2(), policy.mcs_index3()), (7, 5, 2));
        assert_eq!(PolicyTable::from_words(policy.words()), policy);
    }
}
