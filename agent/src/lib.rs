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

//! Test agent roles exchanging frames with a Wi-Fi MAC under test.
//!
//! An [`access_point::AccessPoint`] pushes MPDUs into the MAC as if received
//! from the air and checks what the MAC transmits, a [`host::Host`] pushes
//! and pops MSDUs on the host interface. Both talk to the device through a
//! [`transport::Transport`].

pub mod access_point;
pub mod compare;
pub mod config;
pub mod error;
pub mod fragment;
pub mod host;
pub mod mocked;
pub mod station;
pub mod transport;

pub use error::{AgentError, AgentResult};
