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

//! A logger for the mactest agent and its tests.
//!
//! Uses the env_logger crate that allows control of logging through
//! the RUST_LOG environment variable.

use std::{ffi::OsStr, io::Write, path::Path};

use chrono::Utc;
use env_logger::{Builder, Env};
use log::{Level, Record};

/// Initiating the environment for logging with given prefix
///
/// Lines look like `mactest I 01-01 00:01:40.200 station.rs:42 - message`.
pub fn init(prefix: &'static str) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(move |buf, record| {
        writeln!(
            buf,
            "{} {} {} {}:{} - {}",
            prefix,
            level_to_string(record.level()),
            log_current_time(),
            format_file(record),
            record.line().unwrap_or(0),
            record.args()
        )
    });
    builder.init();
}

/// Initiating the environment for logging in Rust tests
///
/// Can be called from every test, only the first call installs the logger.
pub fn init_for_test() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.is_test(true).format(move |buf, record| {
        writeln!(
            buf,
            "{} {} \t| mactest-test: {}",
            level_to_string(record.level()),
            log_current_time(),
            record.args()
        )
    });
    let _ = builder.try_init();
}

/// Timestamp of the current time for logs, `MM-DD HH:MM:SS.mmm` in UTC.
pub fn log_current_time() -> String {
    Utc::now().format("%m-%d %H:%M:%S%.3f").to_string()
}

fn format_file<'a>(record: &'a Record<'a>) -> &'a str {
    record
        .file()
        .and_then(|filepath| Path::new(filepath).file_name())
        .and_then(OsStr::to_str)
        .unwrap_or("N/A")
}

fn level_to_string(level: Level) -> &'static str {
    match level {
        Level::Error => "E",
        Level::Warn => "W",
        Level::Info => "I",
        Level::Debug => "D",
        Level::Trace => "T",
    }
}
