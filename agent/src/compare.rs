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

//! Checks that the frames on both sides of the MAC carry the same MSDU.

use log::{debug, warn};
use mactest_common::util::hex_dump::{convert_hex, dump};
use mactest_packets::ethernet::{RxMsdu, TxMsdu};
use mactest_packets::llc;
use mactest_packets::machw_rx::RxMpdu;
use mactest_packets::machw_tx::{TxMpdu, FCS_LEN, POLICY_PATTERN};
use mactest_packets::MacAddress;

use crate::config::get_dump_frames;
use crate::error::{AgentError, AgentResult};

/// Logs `err` and returns it.
pub(crate) fn fail<T>(err: AgentError) -> AgentResult<T> {
    warn!("{err}");
    Err(err)
}

fn check_address(
    context: &str,
    field: &'static str,
    expected: MacAddress,
    actual: MacAddress,
) -> AgentResult<()> {
    if expected != actual {
        return fail(AgentError::mismatch(
            context,
            field,
            convert_hex(expected.as_bytes()),
            convert_hex(actual.as_bytes()),
        ));
    }
    Ok(())
}

fn check_payload(context: &str, expected: &[u8], actual: &[u8]) -> AgentResult<()> {
    if expected != actual {
        return fail(AgentError::mismatch(
            context,
            "PAYLOAD",
            format!("\n{}", dump(expected)),
            format!("\n{}", dump(actual)),
        ));
    }
    Ok(())
}

/// Checks that `mpdus` are the fragments of one MSDU: one address triple,
/// one sequence number, fragment numbers counting from 0 and more-fragments
/// set on all but the last.
pub fn check_fragment_chain(mpdus: &[RxMpdu]) -> AgentResult<()> {
    let Some(first) = mpdus.first() else {
        return fail(AgentError::FragmentChain("no MPDU".to_string()));
    };
    let addresses = (first.addr1(), first.addr2(), first.addr3());
    let sequence_number = first.sequence_control().sequence_number();
    for (index, mpdu) in mpdus.iter().enumerate() {
        if (mpdu.addr1(), mpdu.addr2(), mpdu.addr3()) != addresses {
            return fail(AgentError::FragmentChain(format!(
                "fragment {index} addressed {} {} {}, first fragment {} {} {}",
                mpdu.addr1(),
                mpdu.addr2(),
                mpdu.addr3(),
                addresses.0,
                addresses.1,
                addresses.2
            )));
        }
        let sequence_control = mpdu.sequence_control();
        if sequence_control.sequence_number() != sequence_number {
            return fail(AgentError::FragmentChain(format!(
                "fragment {index} has sequence number {}, expected {sequence_number}",
                sequence_control.sequence_number()
            )));
        }
        if sequence_control.fragment_number() as usize != index {
            return fail(AgentError::FragmentChain(format!(
                "fragment {index} has fragment number {}",
                sequence_control.fragment_number()
            )));
        }
        let last = index + 1 == mpdus.len();
        if mpdu.frame_control().more_frag == last {
            return fail(AgentError::FragmentChain(format!(
                "more fragments flag of fragment {index} of {} is {}",
                mpdus.len(),
                mpdu.frame_control().more_frag
            )));
        }
    }
    Ok(())
}

/// Downlink check: the MSDU the host received carries the defragmented
/// `mpdus` injected from the air.
pub fn rx_mpdus_to_msdu(mpdus: &[RxMpdu], msdu: &RxMsdu, context: &str) -> AgentResult<()> {
    check_fragment_chain(mpdus)?;
    let body: Vec<u8> = mpdus.iter().flat_map(|mpdu| mpdu.body().iter().copied()).collect();
    let unpacked = llc::unpack(&body);
    if !unpacked.ok {
        return fail(AgentError::Malformed {
            context: context.to_string(),
            what: "LLC/SNAP",
            dump: dump(&body),
        });
    }
    if get_dump_frames() {
        debug!(
            "{context}: unpacked frame = {} <- {}, type = {:04X}, data =\n{}",
            msdu.destination,
            msdu.source,
            msdu.ethertype,
            dump(&msdu.payload)
        );
    }

    // Only the first fragment when the chain check passed.
    let addressing = mpdus[0].addressing();
    check_address(context, "DA", addressing.destination(), msdu.destination)?;
    check_address(context, "SA", addressing.source(), msdu.source)?;
    if unpacked.ethertype != msdu.ethertype {
        return fail(AgentError::mismatch(
            context,
            "ETHERTYPE",
            format!("{:04X}", unpacked.ethertype),
            format!("{:04X}", msdu.ethertype),
        ));
    }
    check_payload(context, unpacked.payload, &msdu.payload)
}

/// Uplink check: the MPDU captured on the air carries the MSDU pushed in
/// the host, through the access point `ap`.
pub fn tx_mpdu_to_msdu(
    mpdu: &TxMpdu,
    msdu: &TxMsdu,
    ap: MacAddress,
    context: &str,
) -> AgentResult<()> {
    let pattern = mpdu.policy().pattern();
    if pattern != POLICY_PATTERN {
        return fail(AgentError::PolicyPattern(pattern));
    }
    if !mpdu.length_matches() {
        return fail(AgentError::LengthMismatch {
            theoretical: mpdu.theoretical_length(),
            reported: mpdu.frame_length(),
        });
    }
    check_address(context, "ADDR1", ap, mpdu.addr1())?;
    check_address(context, "ADDR2", msdu.source(), mpdu.addr2())?;
    check_address(context, "ADDR3", msdu.destination(), mpdu.addr3())?;

    let unpacked = llc::unpack(mpdu.body());
    if !unpacked.ok {
        return fail(AgentError::Malformed {
            context: context.to_string(),
            what: "LLC/SNAP",
            dump: dump(mpdu.body()),
        });
    }
    if unpacked.dot1q.is_some() != msdu.dot1q().is_some() {
        return fail(AgentError::mismatch(
            context,
            "802.1Q",
            msdu.dot1q().is_some(),
            unpacked.dot1q.is_some(),
        ));
    }
    if unpacked.ethertype != msdu.ethertype() {
        return fail(AgentError::mismatch(
            context,
            "ETHERTYPE",
            format!("{:04X}", msdu.ethertype()),
            format!("{:04X}", unpacked.ethertype),
        ));
    }
    // The MAC appends the FCS even though it is not computed.
    let payload = &unpacked.payload[..unpacked.payload.len().saturating_sub(FCS_LEN)];
    check_payload(context, msdu.payload(), payload)
}
