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

use log::{debug, info};
use mactest_common::util::hex_dump;
use mactest_packets::ethernet::TxMsdu;
use mactest_packets::ieee80211::{FrameControl, SequenceControl, TypeSubtype};
use mactest_packets::llc::{self, LlcSnapConfig};
use mactest_packets::machw::{AirQueue, CHANNELS};
use mactest_packets::machw_rx::{RxMpdu, RxMpduConfig, WdsAddresses};
use mactest_packets::machw_tx::TxMpdu;
use mactest_packets::mgmt::{self, SSID_MAX_LEN};
use mactest_packets::{payload, MacAddress};

use crate::compare;
use crate::config::get_dump_frames;
use crate::error::{AgentError, AgentResult};
use crate::fragment;
use crate::station::Station;
use crate::transport::Transport;

/// Beaconing parameters of an [`AccessPoint`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessPointConfig {
    pub channel: u8,
    /// Beacon period in ms.
    pub beacon_period: u16,
    pub ssid: String,
    /// Advertise QoS support.
    pub qos: bool,
}

impl Default for AccessPointConfig {
    fn default() -> Self {
        Self { channel: 1, beacon_period: 100, ssid: "louis".to_string(), qos: true }
    }
}

impl AccessPointConfig {
    fn validate(&self) -> AgentResult<()> {
        if !CHANNELS.contains(&self.channel) {
            return Err(AgentError::Config(format!("invalid channel {}", self.channel)));
        }
        if self.ssid.is_empty() || self.ssid.len() > SSID_MAX_LEN {
            return Err(AgentError::Config(format!(
                "SSID of {} bytes, expected 1 to {SSID_MAX_LEN}",
                self.ssid.len()
            )));
        }
        Ok(())
    }
}

/// An MSDU the access point sends to the MAC.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsduRequest {
    /// Defaults to the access point address.
    pub destination: Option<MacAddress>,
    /// Defaults to the access point address.
    pub source: Option<MacAddress>,
    /// Frame body. When unset, a random payload of `length` bytes
    /// encapsulated with `llc`.
    pub body: Option<Vec<u8>>,
    pub length: usize,
    pub fragment_size: usize,
    pub llc: LlcSnapConfig,
    /// Data frame with from-DS set unless specified.
    pub frame_control: FrameControl,
    /// Sequence control of the first fragment. The access point counter
    /// is neither used nor advanced when set. Its fragment number must be 0
    /// when the body takes more than one fragment.
    pub sequence_control: Option<SequenceControl>,
    pub wds: Option<WdsAddresses>,
}

impl Default for MsduRequest {
    fn default() -> Self {
        Self {
            destination: None,
            source: None,
            body: None,
            length: 1000,
            fragment_size: 4096,
            llc: LlcSnapConfig::default(),
            frame_control: FrameControl { from_ds: true, ..FrameControl::new(TypeSubtype::DATA) },
            sequence_control: None,
            wds: None,
        }
    }
}

/// The access point of the test bench, seen by the MAC on the air.
#[derive(Debug)]
pub struct AccessPoint {
    station: Station,
    config: AccessPointConfig,
    started: bool,
}

impl AccessPoint {
    pub fn new(mac_address: MacAddress, config: AccessPointConfig) -> AgentResult<AccessPoint> {
        config.validate()?;
        Ok(AccessPoint { station: Station::new(mac_address), config, started: false })
    }

    pub fn mac_address(&self) -> MacAddress {
        self.station.mac_address()
    }

    pub fn station(&self) -> &Station {
        &self.station
    }

    pub fn station_mut(&mut self) -> &mut Station {
        &mut self.station
    }

    pub fn config(&self) -> &AccessPointConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Sends an MSDU in the air from the access point, fragmented as
    /// requested. Returns the MPDUs in the order they were injected.
    pub fn tx_msdu(
        &mut self,
        transport: &mut dyn Transport,
        request: &MsduRequest,
    ) -> AgentResult<Vec<RxMpdu>> {
        let mac_address = self.mac_address();
        let body = match &request.body {
            Some(body) => body.clone(),
            None => llc::build(&payload::build(request.length), &request.llc)?,
        };
        let template = RxMpduConfig {
            destination: request.destination.unwrap_or(mac_address),
            source: request.source.unwrap_or(mac_address),
            frame_control: request.frame_control,
            sequence_control: SequenceControl::default(),
            wds: request.wds,
        };
        fragment::transmit(
            transport,
            &mut self.station,
            &body,
            request.fragment_size,
            &template,
            request.sequence_control,
        )
    }

    /// Waits for an MPDU the MAC sends on `queue` to the access point.
    pub fn rx_mpdu(&self, transport: &mut dyn Transport, queue: AirQueue) -> AgentResult<TxMpdu> {
        let mpdu = TxMpdu::parse(queue, transport.air_send_data(queue)?)?;
        info!("air -> {} on {}", mpdu.info(), mpdu.queue());
        if get_dump_frames() {
            debug!("TX MAC HW format =\n{}", hex_dump::dump(mpdu.machw_format()));
        }
        if mpdu.channel() != self.config.channel {
            return compare::fail(AgentError::mismatch(
                "TX",
                "CHANNEL",
                self.config.channel,
                mpdu.channel(),
            ));
        }
        let addr1 = mpdu.addr1();
        if addr1 != self.mac_address() && !addr1.is_broadcast() {
            let err = AgentError::mismatch("TX", "ADDR1", self.mac_address(), addr1);
            return compare::fail(err);
        }
        Ok(mpdu)
    }

    /// Waits for the MPDU carrying `msdu`, pushed in the host, and for its
    /// transmit confirmation.
    pub fn rx_msdu(
        &self,
        transport: &mut dyn Transport,
        msdu: &TxMsdu,
        context: &str,
    ) -> AgentResult<TxMpdu> {
        let mpdu = self.rx_mpdu(transport, AirQueue::DataTid(msdu.priority()))?;
        compare::tx_mpdu_to_msdu(&mpdu, msdu, self.mac_address(), context)?;
        let confirmed = transport.host_send_data_cfm(msdu.priority())?;
        if confirmed != msdu.as_bytes() {
            return compare::fail(AgentError::mismatch(
                context,
                "TX CONFIRMATION",
                format!("\n{}", hex_dump::dump(msdu.as_bytes())),
                format!("\n{}", hex_dump::dump(&confirmed)),
            ));
        }
        Ok(mpdu)
    }

    /// Starts the beacon transmission. Returns the beacon MPDU.
    pub fn start(&mut self, transport: &mut dyn Transport) -> AgentResult<RxMpdu> {
        let body = mgmt::beacon(
            self.config.beacon_period,
            self.config.ssid.as_bytes(),
            self.config.qos,
        )?;
        let mut config = RxMpduConfig::new(MacAddress::BROADCAST, self.mac_address());
        config.frame_control = FrameControl::new(TypeSubtype::BEACON);
        config.sequence_control = SequenceControl(0);
        let beacon = RxMpdu::new(&body, self.mac_address(), &config)?;
        transport.ap_start(
            self.mac_address(),
            self.config.channel,
            self.config.beacon_period,
            &beacon,
        )?;
        info!(
            "access point {} beaconing \"{}\" on channel {}",
            self.mac_address(),
            self.config.ssid,
            self.config.channel
        );
        self.started = true;
        Ok(beacon)
    }

    pub fn stop(&mut self, transport: &mut dyn Transport) -> AgentResult<()> {
        if !self.started {
            return Err(AgentError::Config(format!(
                "access point {} is not started",
                self.mac_address()
            )));
        }
        transport.ap_stop(self.mac_address())?;
        self.started = false;
        Ok(())
    }
}
