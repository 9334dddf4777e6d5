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

//! Frame codecs for validating a Wi-Fi MAC against its hardware interface.
//!
//! The modules are layered from the host side down to the air side:
//!
//! * [`ethernet`] - Ethernet II MSDUs with an optional 802.1Q tag.
//! * [`llc`] - LLC/SNAP encapsulation of an ethertype and payload.
//! * [`ieee80211`] - frame control and sequence control fields.
//! * [`mgmt`] - management frame bodies and information elements.
//! * [`machw`] - MAC HW header layout, queues and channels.
//! * [`machw_rx`] - MAC HW records for frames received from the air.
//! * [`machw_tx`] - MAC HW records for frames the MAC transmitted.
//!
//! All multi-byte fields of the MAC HW records are little-endian, while the
//! Ethernet and LLC/SNAP fields are big-endian.

pub mod error;
pub mod ethernet;
pub mod ieee80211;
pub mod llc;
pub mod mac_address;
pub mod machw;
pub mod machw_rx;
pub mod machw_tx;
pub mod mgmt;
pub mod payload;

pub use error::{Error, Result};
pub use mac_address::MacAddress;
