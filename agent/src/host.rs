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
use mactest_packets::ethernet::{RxMsdu, TxMsdu, TxMsduConfig};
use mactest_packets::machw_rx::RxMpdu;
use mactest_packets::MacAddress;

use crate::compare;
use crate::config::get_dump_frames;
use crate::error::AgentResult;
use crate::transport::Transport;

/// The host side of the MAC under test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Host {
    mac_address: MacAddress,
}

impl Host {
    pub fn new(mac_address: MacAddress) -> Host {
        Host { mac_address }
    }

    pub fn mac_address(&self) -> MacAddress {
        self.mac_address
    }

    /// Pushes an MSDU with a random payload of `length` bytes from the host.
    /// The destination defaults to the host itself.
    pub fn tx_msdu(
        &self,
        transport: &mut dyn Transport,
        destination: Option<MacAddress>,
        length: usize,
        priority: u8,
        config: &TxMsduConfig,
    ) -> AgentResult<TxMsdu> {
        let destination = destination.unwrap_or(self.mac_address);
        let msdu = TxMsdu::new(destination, self.mac_address, length, priority, config)?;
        info!("host <- MSDU {} -> {}, {} bytes", msdu.source(), destination, msdu.len());
        if get_dump_frames() {
            debug!("MSDU =\n{}", hex_dump::dump(msdu.as_bytes()));
        }
        transport.host_send_data(&msdu)?;
        Ok(msdu)
    }

    /// Pops the MSDU delivered to the host and checks it against the
    /// `mpdus` injected from the air.
    pub fn rx_msdu(
        &self,
        transport: &mut dyn Transport,
        mpdus: &[RxMpdu],
        context: &str,
    ) -> AgentResult<RxMsdu> {
        let msdu = RxMsdu::new(&transport.host_receive_data()?)?;
        let length = msdu.as_bytes().len();
        info!("host -> MSDU {} -> {}, {} bytes", msdu.source, msdu.destination, length);
        compare::rx_mpdus_to_msdu(mpdus, &msdu, context)?;
        Ok(msdu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::mocked::MockedTransport;
    use bytes::Bytes;
    use mactest_packets::ethernet::{self, unpack, ETHERTYPE_IPV4};
    use mactest_packets::llc::{self, LlcSnapConfig};
    use mactest_packets::machw_rx::RxMpduConfig;

    const AP: MacAddress = MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0xa0]);
    const HOST: MacAddress = MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);

    #[test]
    fn test_tx_msdu_pushes_to_host() {
        let mut transport = MockedTransport::new();
        let host = Host::new(HOST);
        let msdu =
            host.tx_msdu(&mut transport, Some(AP), 64, 2, &TxMsduConfig::default()).unwrap();
        assert_eq!(transport.host_sent, vec![msdu.as_bytes().clone()]);
        let unpacked = unpack(&transport.host_sent[0]);
        assert!(unpacked.ok);
        assert_eq!((unpacked.destination, unpacked.source), (AP, HOST));
        assert_eq!(unpacked.payload.len(), 64);

        let msdu = host.tx_msdu(&mut transport, None, 10, 0, &TxMsduConfig::default()).unwrap();
        assert_eq!(msdu.destination(), HOST);
        assert!(matches!(
            host.tx_msdu(&mut transport, None, 10, 8, &TxMsduConfig::default()),
            Err(AgentError::Packet(_))
        ));
        assert_eq!(transport.host_sent.len(), 2);
    }

    #[test]
    fn test_rx_msdu_compares_with_mpdus() {
        let mut transport = MockedTransport::new();
        let host = Host::new(HOST);
        let payload = [0x42u8; 32];
        let body = llc::build(&payload, &LlcSnapConfig::default()).unwrap();
        let mpdu = RxMpdu::new(&body, AP, &RxMpduConfig::new(HOST, AP)).unwrap();

        transport.push_host_delivery(ethernet::encode(HOST, AP, None, ETHERTYPE_IPV4, &payload));
        let msdu = host.rx_msdu(&mut transport, &[mpdu.clone()], "RX").unwrap();
        assert_eq!(msdu.payload, payload);

        transport.push_host_delivery(Bytes::from_static(&[0u8; 6]));
        assert!(matches!(
            host.rx_msdu(&mut transport, &[mpdu], "RX"),
            Err(AgentError::Packet(_))
        ));
    }
}
