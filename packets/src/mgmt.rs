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

//! Management frame bodies sent by the access point, and information
//! element lookup in the bodies sent by the stations.

use anyhow::{anyhow, bail};
use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::ieee80211::TypeSubtype;

pub const CAPABILITY_ESS: u16 = 0x0001;
pub const CAPABILITY_IBSS: u16 = 0x0002;
pub const CAPABILITY_CF_POLLABLE: u16 = 0x0004;
pub const CAPABILITY_CF_POLL_REQUEST: u16 = 0x0008;
pub const CAPABILITY_PRIVACY: u16 = 0x0010;
pub const CAPABILITY_SHORT_PREAMBLE: u16 = 0x0020;
pub const CAPABILITY_QOS: u16 = 0x0200;

/// Information element identifiers.
pub mod ie {
    pub const SSID: u8 = 0;
    pub const SUPPORTED_RATES: u8 = 1;
    pub const FH_PARAMETER_SET: u8 = 2;
    pub const DS_PARAMETER_SET: u8 = 3;
    pub const CF_PARAMETER_SET: u8 = 4;
    pub const TIM: u8 = 5;
    pub const IBSS_PARAMETER_SET: u8 = 6;
    pub const COUNTRY: u8 = 7;
    pub const HOPPING_PARAMETERS: u8 = 8;
    pub const HOPPING_TABLE: u8 = 9;
    pub const REQUEST: u8 = 10;
    pub const BSS_LOAD: u8 = 11;
    pub const EDCA_PARAMETER_SET: u8 = 12;
    pub const TSPEC: u8 = 13;
    pub const TCLAS: u8 = 14;
    pub const SCHEDULE: u8 = 15;
    pub const CHALLENGE_TEXT: u8 = 16;
    pub const POWER_CONSTRAINT: u8 = 32;
    pub const POWER_CAPABILITY: u8 = 33;
    pub const TPC_REQUEST: u8 = 34;
    pub const TPC_REPORT: u8 = 35;
    pub const SUPPORTED_CHANNELS: u8 = 36;
    pub const CHANNEL_SWITCH: u8 = 37;
    pub const MEASUREMENT_REQUEST: u8 = 38;
    pub const MEASUREMENT_REPORT: u8 = 39;
    pub const QUIET: u8 = 40;
    pub const IBSS_DFS: u8 = 41;
    pub const ERP_INFORMATION: u8 = 42;
    pub const TS_DELAY: u8 = 43;
    pub const TCLAS_PROCESSING: u8 = 44;
    pub const HT_CAPABILITIES: u8 = 45;
    pub const QOS_CAPABILITY: u8 = 46;
    pub const RSN: u8 = 48;
    pub const EXTENDED_SUPPORTED_RATES: u8 = 50;
    pub const HT_OPERATION: u8 = 61;
    pub const SECONDARY_CHANNEL_OFFSET: u8 = 62;
    pub const BSS_COEXISTENCE_20_40: u8 = 72;
    pub const INTOLERANT_CHANNEL_REPORT_20_40: u8 = 73;
    pub const OVERLAPPING_BSS_SCAN_PARAMETERS: u8 = 74;
    pub const EXTENDED_CAPABILITIES: u8 = 127;
    pub const VENDOR_SPECIFIC: u8 = 221;
}

pub const SSID_MAX_LEN: usize = 34;

const COUNTRY: [u8; 6] = [b'U', b'S', b' ', 0, 0, 0];

fn put_ie(body: &mut BytesMut, id: u8, content: &[u8]) {
    body.put_u8(id);
    body.put_u8(content.len() as u8);
    body.put_slice(content);
}

fn check_ssid(ssid: &[u8]) -> Result<()> {
    if ssid.is_empty() || ssid.len() > SSID_MAX_LEN {
        return Err(Error::Malformed {
            what: "SSID",
            reason: format!("{} bytes, expected 1 to {}", ssid.len(), SSID_MAX_LEN),
        });
    }
    Ok(())
}

fn announcement(interval: u16, capability: u16, ssid: &[u8], rate: u8) -> Result<Bytes> {
    check_ssid(ssid)?;
    let mut body = BytesMut::with_capacity(12 + 2 + ssid.len() + 3 + 8);
    // timestamp, filled by the MAC
    body.put_u64_le(0);
    body.put_u16_le(interval);
    body.put_u16_le(capability);
    put_ie(&mut body, ie::SSID, ssid);
    put_ie(&mut body, ie::SUPPORTED_RATES, &[rate]);
    put_ie(&mut body, ie::COUNTRY, &COUNTRY);
    Ok(body.freeze())
}

/// Beacon body advertising an ESS, plus QoS when `qos` is set.
pub fn beacon(interval: u16, ssid: &[u8], qos: bool) -> Result<Bytes> {
    let mut capability = CAPABILITY_ESS;
    if qos {
        capability |= CAPABILITY_QOS;
    }
    // 6 Mbps basic rate
    announcement(interval, capability, ssid, 0x8C)
}

pub fn probe_response(interval: u16, ssid: &[u8]) -> Result<Bytes> {
    // 11 Mbps basic rate
    announcement(interval, 0, ssid, 0x96)
}

/// Successful open system authentication, second message.
pub fn authenticate() -> Bytes {
    let mut body = BytesMut::with_capacity(6);
    body.put_u16_le(0);
    body.put_u16_le(2);
    body.put_u16_le(0);
    body.freeze()
}

/// Deauthentication with the unspecified reason.
pub fn deauthenticate() -> Bytes {
    Bytes::from_static(&[0x01, 0x00])
}

/// Disassociation with the unspecified reason.
pub fn disassociation() -> Bytes {
    Bytes::from_static(&[0x01, 0x00])
}

pub fn association_response() -> Bytes {
    let mut body = BytesMut::with_capacity(9);
    body.put_u16_le(CAPABILITY_ESS);
    // status: success
    body.put_u16_le(0);
    body.put_u16_le(0x0123);
    put_ie(&mut body, ie::SUPPORTED_RATES, &[0x96]);
    body.freeze()
}

/// Returns the content of the information element `id` of a management
/// frame body, or `None` when the body does not carry it.
pub fn find_ie(type_subtype: TypeSubtype, body: &[u8], id: u8) -> anyhow::Result<Option<&[u8]>> {
    let mut start = match type_subtype {
        // timestamp, interval and capability
        TypeSubtype::BEACON => 12,
        TypeSubtype::PROBE_REQ => 0,
        // algorithm, sequence and status
        TypeSubtype::AUTHENTICATION => 6,
        // capability and listen interval
        TypeSubtype::ASSOCIATION_REQ => 4,
        _ => bail!("no information elements in {:#04x} frames", type_subtype.value()),
    };
    if start >= body.len() {
        bail!("frame body of {} bytes too short for information elements", body.len());
    }
    while start < body.len() {
        let header = body
            .get(start..start + 2)
            .ok_or_else(|| anyhow!("truncated information element at offset {start}"))?;
        let (ie_id, ie_len) = (header[0], header[1] as usize);
        let content = body
            .get(start + 2..start + 2 + ie_len)
            .ok_or_else(|| anyhow!("information element {ie_id} overruns the frame body"))?;
        if ie_id == id {
            return Ok(Some(content));
        }
        start += 2 + ie_len;
    }
    Ok(None)
}

/// SSID carried by a beacon or probe request body.
pub fn ssid(type_subtype: TypeSubtype, body: &[u8]) -> anyhow::Result<String> {
    let ssid = find_ie(type_subtype, body, ie::SSID)?.ok_or_else(|| anyhow!("SSID not found."))?;
    Ok(String::from_utf8(ssid.to_vec())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beacon_body() {
        let body = beacon(100, b"louis", true).unwrap();
        let expected: &[u8] = &[
            0, 0, 0, 0, 0, 0, 0, 0, 100, 0, 0x01, 0x02, 0, 5, b'l', b'o', b'u', b'i', b's', 1,
            1, 0x8C, 7, 6, b'U', b'S', b' ', 0, 0, 0,
        ];
        assert_eq!(&body[..], expected);
        assert_eq!(&beacon(100, b"louis", false).unwrap()[10..12], &[0x01, 0x00]);
        assert_eq!(ssid(TypeSubtype::BEACON, &body).unwrap(), "louis");
        assert_eq!(find_ie(TypeSubtype::BEACON, &body, ie::COUNTRY).unwrap(), Some(&COUNTRY[..]));
        assert_eq!(find_ie(TypeSubtype::BEACON, &body, ie::RSN).unwrap(), None);
    }

    #[test]
    fn test_ssid_bounds() {
        assert!(beacon(100, b"", true).is_err());
        assert!(probe_response(100, &[b'a'; 35]).is_err());
        let body = probe_response(100, &[b'a'; 34]).unwrap();
        assert_eq!(&body[10..12], &[0, 0]);
        assert_eq!(body[14 + 34 + 2], 0x96);
    }

    #[test]
    fn test_fixed_bodies() {
        assert_eq!(&authenticate()[..], &[0, 0, 2, 0, 0, 0]);
        assert_eq!(&deauthenticate()[..], &[1, 0]);
        assert_eq!(&disassociation()[..], &[1, 0]);
        assert_eq!(&association_response()[..], &[0x01, 0x00, 0, 0, 0x23, 0x01, 1, 1, 0x96]);
    }

    #[test]
    fn test_find_ie_in_station_frames() {
        let probe_request = [0u8, 4, b'l', b'o', b'u', b'i', 1, 2, 0x82, 0x84];
        assert_eq!(ssid(TypeSubtype::PROBE_REQ, &probe_request).unwrap(), "loui");
        assert_eq!(
            find_ie(TypeSubtype::PROBE_REQ, &probe_request, ie::SUPPORTED_RATES).unwrap(),
            Some(&[0x82, 0x84][..])
        );

        let association_request = [0x01, 0x00, 0x0a, 0x00, 0, 1, b'x'];
        assert_eq!(
            find_ie(TypeSubtype::ASSOCIATION_REQ, &association_request, ie::SSID).unwrap(),
            Some(&b"x"[..])
        );

        let truncated = [0u8, 8, b'a'];
        assert!(find_ie(TypeSubtype::PROBE_REQ, &truncated, ie::RSN).is_err());
        assert!(find_ie(TypeSubtype::AUTHENTICATION, &[0u8; 6], ie::CHALLENGE_TEXT).is_err());
        assert!(find_ie(TypeSubtype::DATA, &probe_request, ie::SSID).is_err());
    }
}
