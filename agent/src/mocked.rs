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

//! A [`Transport`] recording every frame handed to the device and replaying
//! the captures queued by the test.

use std::collections::VecDeque;

use anyhow::anyhow;
use bytes::Bytes;
use log::info;
use mactest_packets::ethernet::TxMsdu;
use mactest_packets::machw::AirQueue;
use mactest_packets::machw_rx::RxMpdu;
use mactest_packets::MacAddress;

use crate::transport::Transport;

/// Beaconing request received by [`MockedTransport::ap_start`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeaconStart {
    pub bssid: MacAddress,
    pub channel: u8,
    pub period: u16,
    pub beacon: Bytes,
}

#[derive(Default)]
pub struct MockedTransport {
    /// Records injected in the air receive path.
    pub air_received: Vec<Bytes>,
    /// MSDUs pushed in the host.
    pub host_sent: Vec<Bytes>,
    pub beacons: Vec<BeaconStart>,
    pub stopped: Vec<MacAddress>,
    air_captures: VecDeque<(AirQueue, Bytes)>,
    host_deliveries: VecDeque<Bytes>,
    confirmations: VecDeque<Bytes>,
}

impl MockedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a transmit record returned by the next `air_send_data(queue)`.
    pub fn push_air_capture(&mut self, queue: AirQueue, record: Bytes) {
        self.air_captures.push_back((queue, record));
    }

    /// Queues an MSDU returned by the next `host_receive_data`.
    pub fn push_host_delivery(&mut self, msdu: Bytes) {
        self.host_deliveries.push_back(msdu);
    }

    /// Queues the MSDU returned by the next `host_send_data_cfm`. Without a
    /// queued confirmation the last pushed MSDU is echoed.
    pub fn push_confirmation(&mut self, msdu: Bytes) {
        self.confirmations.push_back(msdu);
    }
}

impl Transport for MockedTransport {
    fn air_receive_data(&mut self, mpdu: &RxMpdu) -> anyhow::Result<()> {
        info!("air_receive_data({})", mpdu.info());
        self.air_received.push(mpdu.as_bytes().clone());
        Ok(())
    }

    fn air_send_data(&mut self, queue: AirQueue) -> anyhow::Result<Bytes> {
        info!("air_send_data({queue})");
        let index = self
            .air_captures
            .iter()
            .position(|(captured, _)| *captured == queue)
            .ok_or_else(|| anyhow!("no MPDU captured on {queue}"))?;
        self.air_captures
            .remove(index)
            .map(|(_, record)| record)
            .ok_or_else(|| anyhow!("no MPDU captured on {queue}"))
    }

    fn host_send_data(&mut self, msdu: &TxMsdu) -> anyhow::Result<()> {
        info!("host_send_data({} bytes, priority {})", msdu.len(), msdu.priority());
        self.host_sent.push(msdu.as_bytes().clone());
        Ok(())
    }

    fn host_send_data_cfm(&mut self, priority: u8) -> anyhow::Result<Bytes> {
        info!("host_send_data_cfm({priority})");
        self.confirmations
            .pop_front()
            .or_else(|| self.host_sent.last().cloned())
            .ok_or_else(|| anyhow!("no MSDU to confirm"))
    }

    fn host_receive_data(&mut self) -> anyhow::Result<Bytes> {
        info!("host_receive_data");
        self.host_deliveries.pop_front().ok_or_else(|| anyhow!("no MSDU delivered to the host"))
    }

    fn ap_start(
        &mut self,
        bssid: MacAddress,
        channel: u8,
        period: u16,
        beacon: &RxMpdu,
    ) -> anyhow::Result<()> {
        info!("ap_start({bssid}, channel {channel}, period {period})");
        let beacon = beacon.as_bytes().clone();
        self.beacons.push(BeaconStart { bssid, channel, period, beacon });
        Ok(())
    }

    fn ap_stop(&mut self, bssid: MacAddress) -> anyhow::Result<()> {
        info!("ap_stop({bssid})");
        self.stopped.push(bssid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_air_captures_per_queue() {
        let mut transport = MockedTransport::new();
        transport.push_air_capture(AirQueue::Mgmt, Bytes::from_static(b"mgmt"));
        transport.push_air_capture(AirQueue::DataTid(0), Bytes::from_static(b"data"));
        assert_eq!(transport.air_send_data(AirQueue::DataTid(0)).unwrap(), "data");
        assert!(transport.air_send_data(AirQueue::DataTid(0)).is_err());
        assert_eq!(transport.air_send_data(AirQueue::Mgmt).unwrap(), "mgmt");
    }

    #[test]
    fn test_host_queues() {
        let mut transport = MockedTransport::new();
        assert!(transport.host_receive_data().is_err());
        assert!(transport.host_send_data_cfm(0).is_err());
        transport.push_host_delivery(Bytes::from_static(b"msdu"));
        transport.push_confirmation(Bytes::from_static(b"cfm"));
        assert_eq!(transport.host_receive_data().unwrap(), "msdu");
        assert_eq!(transport.host_send_data_cfm(0).unwrap(), "cfm");
    }
}
