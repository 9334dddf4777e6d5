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

use bytes::Bytes;
use mactest_packets::ethernet::TxMsdu;
use mactest_packets::machw::AirQueue;
use mactest_packets::machw_rx::RxMpdu;
use mactest_packets::MacAddress;

/// Transport is a trait that provides the interface between the agent roles
/// and the device under test. Implementations own the control channel; the
/// roles only hand over and receive one frame at a time.
///
/// Blocking calls wait for the device to answer, the codecs never do.
pub trait Transport {
    /// Injects an MPDU in the MAC HW receive path, as if received from the
    /// air.
    fn air_receive_data(&mut self, mpdu: &RxMpdu) -> anyhow::Result<()>;

    /// Waits for the next MPDU the MAC transmits on `queue` and returns the
    /// raw MAC HW transmit record.
    fn air_send_data(&mut self, queue: AirQueue) -> anyhow::Result<Bytes>;

    /// Pushes an MSDU in the host transmit path.
    fn host_send_data(&mut self, msdu: &TxMsdu) -> anyhow::Result<()>;

    /// Waits for the transmit confirmation of the MSDU pushed with
    /// `priority` and returns the MSDU the host got back.
    fn host_send_data_cfm(&mut self, priority: u8) -> anyhow::Result<Bytes>;

    /// Waits for an MSDU delivered to the host.
    fn host_receive_data(&mut self) -> anyhow::Result<Bytes>;

    /// Starts beaconing `beacon` every `period` ms on `channel`.
    fn ap_start(
        &mut self,
        bssid: MacAddress,
        channel: u8,
        period: u16,
        beacon: &RxMpdu,
    ) -> anyhow::Result<()>;

    fn ap_stop(&mut self, bssid: MacAddress) -> anyhow::Result<()>;
}
