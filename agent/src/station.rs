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

use mactest_packets::ieee80211::SequenceControl;
use mactest_packets::MacAddress;

/// A station of the test bench: its address and the sequence control of
/// the last MPDU it sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Station {
    mac_address: MacAddress,
    sequence_control: SequenceControl,
}

impl Station {
    pub fn new(mac_address: MacAddress) -> Station {
        Station { mac_address, sequence_control: SequenceControl::default() }
    }

    pub fn mac_address(&self) -> MacAddress {
        self.mac_address
    }

    pub fn sequence_control(&self) -> SequenceControl {
        self.sequence_control
    }

    pub(crate) fn set_sequence_control(&mut self, sequence_control: SequenceControl) {
        self.sequence_control = sequence_control;
    }

    /// Restarts the sequence numbering, e.g. after an interrupted
    /// fragmentation.
    pub fn reset_sequence(&mut self) {
        self.sequence_control = SequenceControl::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_sequence() {
        let mut station = Station::new(MacAddress::new([2, 0, 0, 0, 0, 1]));
        assert_eq!(station.sequence_control(), SequenceControl(0));
        station.set_sequence_control(SequenceControl::new(42, 3));
        station.reset_sequence();
        assert_eq!(station.sequence_control(), SequenceControl(0));
    }
}
