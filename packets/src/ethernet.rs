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

//! Ethernet II framing with optional 802.1Q tagging.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::mac_address::MacAddress;
use crate::payload;

// RFC 704, Appendix B.2
// https://www.iana.org/assignments/ieee-802-numbers/ieee-802-numbers.xhtml
pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_ARP: u16 = 0x0806;
pub const ETHERTYPE_RARP: u16 = 0x8035;
pub const ETHERTYPE_APPLETALK: u16 = 0x809B;
pub const ETHERTYPE_DOT1Q: u16 = 0x8100;
pub const ETHERTYPE_IPX: u16 = 0x8137;
pub const ETHERTYPE_EAPOL: u16 = 0x888E;
pub const ETHERTYPE_IPV6: u16 = 0x86DD;

/// Ethertype reported by decoders when none could be read.
pub const ETHERTYPE_NONE: u16 = 0xFFFF;

/// Payload length bounds of a generated MSDU, `(MIN_LENGTH, MAX_LENGTH]`.
pub const MIN_LENGTH: usize = 1;
pub const MAX_LENGTH: usize = 1500;

pub const HDR_LEN: usize = 14;
pub const DOT1Q_HDR_LEN: usize = 18;

const TCI_PRIORITY_SHIFT: u16 = 13;
const TCI_CFI: u16 = 0x1000;
const TCI_VLAN_ID: u16 = 0x0FFF;
const MAX_VLAN_ID: u16 = 4095;

/// 802.1Q tag control information.
///
/// Packed as priority in bits 15-13, CFI in bit 12 and the VLAN id in
/// bits 11-0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tci {
    pub priority: u8,
    pub cfi: bool,
    pub vlan_id: u16,
}

impl Tci {
    pub fn new(priority: u8, cfi: bool, vlan_id: u16) -> Result<Tci> {
        check_priority(priority)?;
        if vlan_id > MAX_VLAN_ID {
            return Err(Error::InvalidVlanId(vlan_id));
        }
        Ok(Tci { priority, cfi, vlan_id })
    }

    pub fn pack(&self) -> u16 {
        let mut tci = (self.priority as u16) << TCI_PRIORITY_SHIFT;
        if self.cfi {
            tci |= TCI_CFI;
        }
        tci | (self.vlan_id & TCI_VLAN_ID)
    }

    pub fn unpack(tci: u16) -> Tci {
        Tci {
            priority: (tci >> TCI_PRIORITY_SHIFT) as u8,
            cfi: (tci & TCI_CFI) != 0,
            vlan_id: tci & TCI_VLAN_ID,
        }
    }
}

pub(crate) fn check_priority(priority: u8) -> Result<()> {
    if priority >= 8 {
        return Err(Error::InvalidPriority(priority));
    }
    Ok(())
}

/// VLAN part of an 802.1Q tag, the priority comes from the MSDU itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VlanTag {
    pub cfi: bool,
    pub vlan_id: u16,
}

/// Options of an outbound MSDU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxMsduConfig {
    /// Ethernet type field, IPv4 unless specified.
    pub ethertype: u16,
    /// Insert an 802.1Q tag when set.
    pub dot1q: Option<VlanTag>,
}

impl Default for TxMsduConfig {
    fn default() -> Self {
        Self { ethertype: ETHERTYPE_IPV4, dot1q: None }
    }
}

/// An Ethernet frame built for transmission from the host.
#[derive(Clone, Debug)]
pub struct TxMsdu {
    destination: MacAddress,
    source: MacAddress,
    priority: u8,
    dot1q: Option<Tci>,
    ethertype: u16,
    payload: Vec<u8>,
    msdu: Bytes,
}

impl TxMsdu {
    /// Builds an MSDU carrying a random payload of `length` bytes.
    pub fn new(
        destination: MacAddress,
        source: MacAddress,
        length: usize,
        priority: u8,
        config: &TxMsduConfig,
    ) -> Result<TxMsdu> {
        check_length(length)?;
        Self::with_payload(destination, source, priority, payload::build(length), config)
    }

    /// Builds an MSDU around a caller supplied payload.
    pub fn with_payload(
        destination: MacAddress,
        source: MacAddress,
        priority: u8,
        payload: Vec<u8>,
        config: &TxMsduConfig,
    ) -> Result<TxMsdu> {
        check_priority(priority)?;
        check_length(payload.len())?;
        let dot1q = config
            .dot1q
            .map(|tag| Tci::new(priority, tag.cfi, tag.vlan_id))
            .transpose()?;
        let msdu = encode(destination, source, dot1q, config.ethertype, &payload);
        Ok(TxMsdu {
            destination,
            source,
            priority,
            dot1q,
            ethertype: config.ethertype,
            payload,
            msdu,
        })
    }

    pub fn destination(&self) -> MacAddress {
        self.destination
    }

    pub fn source(&self) -> MacAddress {
        self.source
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn dot1q(&self) -> Option<Tci> {
        self.dot1q
    }

    pub fn vlan_id(&self) -> u16 {
        self.dot1q.map_or(0, |tci| tci.vlan_id)
    }

    pub fn ethertype(&self) -> u16 {
        self.ethertype
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Complete frame: header followed by the payload.
    pub fn as_bytes(&self) -> &Bytes {
        &self.msdu
    }

    pub fn len(&self) -> usize {
        self.msdu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.msdu.is_empty()
    }
}

fn check_length(length: usize) -> Result<()> {
    if length <= MIN_LENGTH || length > MAX_LENGTH {
        return Err(Error::InvalidPayloadLength(length));
    }
    Ok(())
}

/// Serializes `dst || src || [0x8100 || TCI] || ethertype || payload`.
pub fn encode(
    destination: MacAddress,
    source: MacAddress,
    dot1q: Option<Tci>,
    ethertype: u16,
    payload: &[u8],
) -> Bytes {
    let mut msdu = BytesMut::with_capacity(DOT1Q_HDR_LEN + payload.len());
    msdu.put_slice(destination.as_bytes());
    msdu.put_slice(source.as_bytes());
    if let Some(tci) = dot1q {
        msdu.put_u16(ETHERTYPE_DOT1Q);
        msdu.put_u16(tci.pack());
    }
    msdu.put_u16(ethertype);
    msdu.put_slice(payload);
    msdu.freeze()
}

/// Result of [`unpack`].
///
/// When `ok` is false every other field holds its default: zero
/// addresses, no tag, [`ETHERTYPE_NONE`], and the whole input as payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EthernetUnpack<'a> {
    pub ok: bool,
    pub destination: MacAddress,
    pub source: MacAddress,
    pub dot1q: Option<Tci>,
    pub ethertype: u16,
    pub payload: &'a [u8],
}

impl<'a> EthernetUnpack<'a> {
    fn malformed(msdu: &'a [u8]) -> Self {
        EthernetUnpack {
            ok: false,
            destination: MacAddress::ZERO,
            source: MacAddress::ZERO,
            dot1q: None,
            ethertype: ETHERTYPE_NONE,
            payload: msdu,
        }
    }
}

/// Splits an Ethernet MSDU into its fields. Never fails, see
/// [`EthernetUnpack`].
pub fn unpack(msdu: &[u8]) -> EthernetUnpack<'_> {
    if msdu.len() < HDR_LEN {
        return EthernetUnpack::malformed(msdu);
    }
    let destination = MacAddress::new([msdu[0], msdu[1], msdu[2], msdu[3], msdu[4], msdu[5]]);
    let source = MacAddress::new([msdu[6], msdu[7], msdu[8], msdu[9], msdu[10], msdu[11]]);
    let ethertype = u16::from_be_bytes([msdu[12], msdu[13]]);
    if ethertype != ETHERTYPE_DOT1Q {
        return EthernetUnpack {
            ok: true,
            destination,
            source,
            dot1q: None,
            ethertype,
            payload: &msdu[HDR_LEN..],
        };
    }
    if msdu.len() < DOT1Q_HDR_LEN {
        return EthernetUnpack::malformed(msdu);
    }
    EthernetUnpack {
        ok: true,
        destination,
        source,
        dot1q: Some(Tci::unpack(u16::from_be_bytes([msdu[14], msdu[15]]))),
        ethertype: u16::from_be_bytes([msdu[16], msdu[17]]),
        payload: &msdu[DOT1Q_HDR_LEN..],
    }
}

/// An Ethernet frame as popped from the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RxMsdu {
    pub destination: MacAddress,
    pub source: MacAddress,
    pub dot1q: Option<Tci>,
    pub ethertype: u16,
    pub payload: Vec<u8>,
    msdu: Bytes,
}

impl RxMsdu {
    pub fn new(msdu: &[u8]) -> Result<RxMsdu> {
        let unpacked = unpack(msdu);
        if !unpacked.ok {
            let min = if msdu.len() < HDR_LEN { HDR_LEN } else { DOT1Q_HDR_LEN };
            return Err(Error::Truncated { what: "ethernet msdu", len: msdu.len(), min });
        }
        Ok(RxMsdu {
            destination: unpacked.destination,
            source: unpacked.source,
            dot1q: unpacked.dot1q,
            ethertype: unpacked.ethertype,
            payload: unpacked.payload.to_vec(),
            msdu: Bytes::copy_from_slice(msdu),
        })
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.msdu
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mac_address::parse_mac_address;

    fn dst() -> MacAddress {
        parse_mac_address("00:11:22:33:44:55").unwrap()
    }

    fn src() -> MacAddress {
        parse_mac_address("aa:bb:cc:dd:ee:ff").unwrap()
    }

    #[test]
    fn test_untagged_round_trip() {
        let msdu = TxMsdu::new(dst(), src(), 64, 1, &TxMsduConfig::default()).unwrap();
        assert_eq!(msdu.len(), HDR_LEN + 64);
        let unpacked = unpack(msdu.as_bytes());
        assert!(unpacked.ok);
        assert_eq!(unpacked.destination, dst());
        assert_eq!(unpacked.source, src());
        assert_eq!(unpacked.dot1q, None);
        assert_eq!(unpacked.ethertype, ETHERTYPE_IPV4);
        assert_eq!(unpacked.payload, msdu.payload());
    }

    #[test]
    fn test_tagged_round_trip() {
        let config = TxMsduConfig {
            ethertype: ETHERTYPE_ARP,
            dot1q: Some(VlanTag { cfi: true, vlan_id: 0x123 }),
        };
        let msdu = TxMsdu::new(dst(), src(), 100, 5, &config).unwrap();
        let bytes = msdu.as_bytes();
        assert_eq!(&bytes[12..14], &[0x81, 0x00]);
        // priority 5, cfi, vlan 0x123
        assert_eq!(&bytes[14..16], &[0xb1, 0x23]);
        assert_eq!(&bytes[16..18], &[0x08, 0x06]);

        let rx = RxMsdu::new(bytes).unwrap();
        assert_eq!(rx.dot1q, Some(Tci { priority: 5, cfi: true, vlan_id: 0x123 }));
        assert_eq!(rx.ethertype, ETHERTYPE_ARP);
        assert_eq!(rx.payload, msdu.payload());
        assert_eq!(msdu.vlan_id(), 0x123);
    }

    #[test]
    fn test_round_trip_all_priorities_and_tags() {
        for priority in 0..8u8 {
            for dot1q in [
                None,
                Some(VlanTag { cfi: false, vlan_id: 0 }),
                Some(VlanTag { cfi: true, vlan_id: 4095 }),
            ] {
                let config = TxMsduConfig { ethertype: ETHERTYPE_IPV6, dot1q };
                let msdu = TxMsdu::new(dst(), src(), 2, priority, &config).unwrap();
                let rx = RxMsdu::new(msdu.as_bytes()).unwrap();
                assert_eq!(rx.destination, msdu.destination());
                assert_eq!(rx.source, msdu.source());
                assert_eq!(rx.dot1q, msdu.dot1q());
                assert_eq!(rx.ethertype, msdu.ethertype());
                assert_eq!(rx.payload, msdu.payload());
            }
        }
    }

    #[test]
    fn test_tci_pack_unpack() {
        let tci = Tci::new(7, true, 0xfff).unwrap();
        assert_eq!(tci.pack(), 0xffff);
        assert_eq!(Tci::unpack(0xffff), tci);
        assert_eq!(Tci::new(3, false, 0x100).unwrap().pack(), 0x6100);
    }

    #[test]
    fn test_invalid_configuration() {
        let config = TxMsduConfig::default();
        assert_eq!(
            TxMsdu::new(dst(), src(), 64, 8, &config).unwrap_err(),
            Error::InvalidPriority(8)
        );
        assert_eq!(
            TxMsdu::new(dst(), src(), 1, 0, &config).unwrap_err(),
            Error::InvalidPayloadLength(1)
        );
        assert_eq!(
            TxMsdu::new(dst(), src(), 1501, 0, &config).unwrap_err(),
            Error::InvalidPayloadLength(1501)
        );
        let tagged = TxMsduConfig { dot1q: Some(VlanTag { cfi: false, vlan_id: 4096 }), ..config };
        assert_eq!(
            TxMsdu::new(dst(), src(), 64, 0, &tagged).unwrap_err(),
            Error::InvalidVlanId(4096)
        );
    }

    #[test]
    fn test_unpack_short_packet() {
        let packet: [u8; 10] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99];
        let unpacked = unpack(&packet);
        assert!(!unpacked.ok);
        assert_eq!(unpacked.ethertype, ETHERTYPE_NONE);
        assert_eq!(unpacked.payload, &packet[..]);
        assert!(RxMsdu::new(&packet).is_err());
    }

    #[test]
    fn test_unpack_short_dot1q_packet() {
        let packet: [u8; 16] = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // Destination MAC
            0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, // Source MAC
            0x81, 0x00, // 802.1Q
            0x20, 0x01, // TCI, second ethertype missing
        ];
        let unpacked = unpack(&packet);
        assert!(!unpacked.ok);
        assert_eq!(unpacked.destination, MacAddress::ZERO);
        assert_eq!(unpacked.dot1q, None);
        assert_eq!(
            RxMsdu::new(&packet).unwrap_err(),
            Error::Truncated { what: "ethernet msdu", len: 16, min: DOT1Q_HDR_LEN }
        );
    }

    #[test]
    fn test_unpack_valid_packet() {
        let packet: [u8; 20] = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // Destination MAC
            0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, // Source MAC
            0x08, 0x00, // EtherType (IPv4)
            0xCC, 0xDD, 0xEE, 0xFF, 0x00, 0x11, // Data
        ];
        let unpacked = unpack(&packet);
        assert!(unpacked.ok);
        assert_eq!(unpacked.destination.to_vec(), [0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(unpacked.source.to_vec(), [0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB]);
        assert_eq!(unpacked.ethertype, ETHERTYPE_IPV4);
        assert_eq!(unpacked.payload, &[0xCC, 0xDD, 0xEE, 0xFF, 0x00, 0x11]);
    }
}
