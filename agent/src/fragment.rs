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

//! Fragmentation of an MSDU body into MPDUs injected in the air receive
//! path.

use log::{debug, info};
use mactest_common::util::hex_dump;
use mactest_packets::ieee80211::SequenceControl;
use mactest_packets::machw_rx::{RxMpdu, RxMpduConfig};

use crate::config::get_dump_frames;
use crate::error::{AgentError, AgentResult};
use crate::station::Station;
use crate::transport::Transport;

/// Number of MPDUs needed to carry `body_len` bytes. An empty body still
/// takes one MPDU.
pub fn fragment_count(body_len: usize, fragment_size: usize) -> usize {
    if body_len == 0 {
        1
    } else {
        body_len.div_ceil(fragment_size)
    }
}

/// Slices `body` in fragments of at most `fragment_size` bytes.
///
/// All the MPDUs share one sequence number: the next one of `station`, or
/// `sequence_override` which leaves the station counter untouched. Only the
/// fragment number advances between fragments and only the last one clears
/// more-fragments. An override of a fragmented MSDU must carry fragment
/// number 0. Nothing is built when the request is invalid.
pub fn build_fragments(
    station: &mut Station,
    body: &[u8],
    fragment_size: usize,
    template: &RxMpduConfig,
    sequence_override: Option<SequenceControl>,
) -> AgentResult<Vec<RxMpdu>> {
    if fragment_size == 0 {
        return Err(AgentError::Config("fragment size must be at least 1 byte".to_string()));
    }
    let count = fragment_count(body.len(), fragment_size);
    if count > SequenceControl::MAX_FRAGMENTS {
        return Err(AgentError::Config(format!(
            "{} bytes in fragments of {} need {} fragments, at most {} are numbered",
            body.len(),
            fragment_size,
            count,
            SequenceControl::MAX_FRAGMENTS
        )));
    }

    if let Some(sequence_control) = sequence_override {
        if count > 1 && sequence_control.fragment_number() != 0 {
            return Err(AgentError::Config(format!(
                "sequence control {sequence_control} of a {count} fragment MSDU must start at \
                 fragment 0"
            )));
        }
    }

    let mut sequence_control =
        sequence_override.unwrap_or_else(|| station.sequence_control().next_sequence());
    let bssid = station.mac_address();
    let mut mpdus = Vec::with_capacity(count);
    let chunks: Vec<&[u8]> =
        if body.is_empty() { vec![body] } else { body.chunks(fragment_size).collect() };
    for (index, chunk) in chunks.iter().enumerate() {
        if index > 0 {
            sequence_control = sequence_control.next_fragment();
        }
        let mut config = template.clone();
        config.frame_control.more_frag = index + 1 < count;
        config.sequence_control = sequence_control;
        mpdus.push(RxMpdu::new(chunk, bssid, &config)?);
    }

    if sequence_override.is_none() {
        station.set_sequence_control(sequence_control);
    }
    Ok(mpdus)
}

/// Builds the fragments of `body` and injects them in order.
pub fn transmit(
    transport: &mut dyn Transport,
    station: &mut Station,
    body: &[u8],
    fragment_size: usize,
    template: &RxMpduConfig,
    sequence_override: Option<SequenceControl>,
) -> AgentResult<Vec<RxMpdu>> {
    let mpdus = build_fragments(station, body, fragment_size, template, sequence_override)?;
    for mpdu in &mpdus {
        info!("air <- {}", mpdu.info());
        if get_dump_frames() {
            debug!("MAC HW format =\n{}", hex_dump::dump(mpdu.as_bytes()));
        }
        transport.air_receive_data(mpdu)?;
    }
    Ok(mpdus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocked::MockedTransport;
    use mactest_packets::MacAddress;

    const AP: MacAddress = MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0xa0]);
    const HOST: MacAddress = MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);

    fn template() -> RxMpduConfig {
        RxMpduConfig::new(HOST, AP)
    }

    #[test]
    fn test_fragment_count() {
        assert_eq!(fragment_count(0, 100), 1);
        assert_eq!(fragment_count(100, 100), 1);
        assert_eq!(fragment_count(101, 100), 2);
        assert_eq!(fragment_count(1500, 500), 3);
    }

    #[test]
    fn test_fragments_share_sequence_number() {
        let body: Vec<u8> = (0..1234u32).map(|i| i as u8).collect();
        let mut station = Station::new(AP);
        let mpdus = build_fragments(&mut station, &body, 300, &template(), None).unwrap();
        assert_eq!(mpdus.len(), 5);
        for (index, mpdu) in mpdus.iter().enumerate() {
            assert_eq!(mpdu.sequence_control().sequence_number(), 1);
            assert_eq!(mpdu.sequence_control().fragment_number() as usize, index);
            assert_eq!(mpdu.frame_control().more_frag, index < 4);
        }
        let joined: Vec<u8> = mpdus.iter().flat_map(|mpdu| mpdu.body().to_vec()).collect();
        assert_eq!(joined, body);
        assert_eq!(station.sequence_control(), SequenceControl::new(1, 4));

        let mpdus = build_fragments(&mut station, &body[..10], 300, &template(), None).unwrap();
        assert_eq!(mpdus[0].sequence_control(), SequenceControl::new(2, 0));
        assert!(!mpdus[0].frame_control().more_frag);
    }

    #[test]
    fn test_sequence_override_leaves_station_untouched() {
        let mut station = Station::new(AP);
        let mpdus = build_fragments(
            &mut station,
            &[0u8; 20],
            10,
            &template(),
            Some(SequenceControl::new(0x300, 0)),
        )
        .unwrap();
        assert_eq!(mpdus[0].sequence_control(), SequenceControl::new(0x300, 0));
        assert_eq!(mpdus[1].sequence_control(), SequenceControl::new(0x300, 1));
        assert_eq!(station.sequence_control(), SequenceControl(0));
    }

    #[test]
    fn test_sequence_override_starts_at_fragment_zero() {
        let mut station = Station::new(AP);
        let override_ = Some(SequenceControl::new(0x300, 2));
        assert!(matches!(
            build_fragments(&mut station, &[0u8; 20], 10, &template(), override_),
            Err(AgentError::Config(_))
        ));
        // A single MPDU keeps the override as given.
        let mpdus = build_fragments(&mut station, &[0u8; 10], 10, &template(), override_).unwrap();
        assert_eq!(mpdus[0].sequence_control(), SequenceControl::new(0x300, 2));
        assert_eq!(station.sequence_control(), SequenceControl(0));
    }

    #[test]
    fn test_empty_body_single_mpdu() {
        let mut station = Station::new(AP);
        let mpdus = build_fragments(&mut station, &[], 500, &template(), None).unwrap();
        assert_eq!(mpdus.len(), 1);
        assert!(mpdus[0].body().is_empty());
    }

    #[test]
    fn test_invalid_requests() {
        let mut station = Station::new(AP);
        assert!(matches!(
            build_fragments(&mut station, &[0u8; 10], 0, &template(), None),
            Err(AgentError::Config(_))
        ));
        assert!(matches!(
            build_fragments(&mut station, &[0u8; 17], 1, &template(), None),
            Err(AgentError::Config(_))
        ));
        assert!(build_fragments(&mut station, &[0u8; 16], 1, &template(), None).is_ok());

        let mut config = template();
        config.frame_control.to_ds = true;
        let mut station = Station::new(AP);
        assert!(matches!(
            build_fragments(&mut station, &[0u8; 10], 5, &config, None),
            Err(AgentError::Packet(_))
        ));
        assert_eq!(station.sequence_control(), SequenceControl(0));
    }

    #[test]
    fn test_transmit_delivers_in_order() {
        let mut transport = MockedTransport::new();
        let mut station = Station::new(AP);
        let mpdus =
            transmit(&mut transport, &mut station, &[7u8; 25], 10, &template(), None).unwrap();
        assert_eq!(mpdus.len(), 3);
        let sent: Vec<_> = mpdus.iter().map(|mpdu| mpdu.as_bytes().clone()).collect();
        assert_eq!(transport.air_received, sent);
    }
}
