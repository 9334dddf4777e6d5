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

/// Runtime switches of the agent
use std::sync::{Once, RwLock};

static SET_DUMP_FRAMES_CALLED: Once = Once::new();

static CONFIG: RwLock<Config> = RwLock::new(Config::new());

struct Config {
    pub dump_frames: Option<bool>,
}

impl Config {
    pub const fn new() -> Self {
        Self { dump_frames: None }
    }
}

/// Get the flag of dump_frames, hex dumps of every frame in the debug logs
pub fn get_dump_frames() -> bool {
    CONFIG.read().map(|config| config.dump_frames.unwrap_or(false)).unwrap_or(false)
}

/// Set the flag of dump_frames
pub fn set_dump_frames(flag: bool) {
    SET_DUMP_FRAMES_CALLED.call_once(|| {
        if let Ok(mut config) = CONFIG.write() {
            config.dump_frames = Some(flag);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_frames() {
        // Check if default dump_frames boolean is false
        assert!(!get_dump_frames());

        // Check if set_dump_frames changes the flag to true
        set_dump_frames(true);
        assert!(get_dump_frames());

        // Check if set_dump_frames can only be called once
        set_dump_frames(false);
        assert!(get_dump_frames());
    }
}
