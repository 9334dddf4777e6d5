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

//! Hex renderings of byte buffers for diagnostics.

const ROW_LEN: usize = 16;
// 16 bytes as "XX " minus the trailing space
const ROW_WIDTH: usize = ROW_LEN * 3 - 1;

/// Upper-case hex bytes separated by spaces, e.g. `00 1A FF`.
pub fn convert_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02X}")).collect::<Vec<_>>().join(" ")
}

/// Multi-line dump, 16 bytes per row, each prefixed by its offset.
///
/// ```text
/// 00000000 | 00 01 02 03 04 05 06 07 08 09 0A 0B 0C 0D 0E 0F
/// 00000010 | 10 11
/// ```
pub fn dump(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(bytes.len().div_ceil(ROW_LEN) * (ROW_WIDTH + 12));
    for (row, chunk) in bytes.chunks(ROW_LEN).enumerate() {
        // The offset keeps the low 7 hex digits of the row index.
        result.push_str(&format!(
            "{:07X}0 | {:<width$}\n",
            row & 0x0FFF_FFFF,
            convert_hex(chunk),
            width = ROW_WIDTH
        ));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_hex() {
        assert_eq!(convert_hex(&[]), "");
        assert_eq!(convert_hex(&[0x00, 0x1a, 0xff]), "00 1A FF");
    }

    #[test]
    fn test_dump_rows() {
        let bytes: Vec<u8> = (0..18).collect();
        let dump = dump(&bytes);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "00000000 | 00 01 02 03 04 05 06 07 08 09 0A 0B 0C 0D 0E 0F");
        assert_eq!(lines[1], format!("00000010 | {:<47}", "10 11"));
        assert!(dump.ends_with('\n'));
    }

    #[test]
    fn test_dump_every_row() {
        let bytes = [0xA5u8; 16 * 40 + 1];
        let dump = dump(&bytes);
        assert_eq!(dump.lines().count(), 41);
        assert!(dump.contains("00000270 | A5 A5"));
        assert!(dump.ends_with(&format!("00000280 | {:<47}\n", "A5")));
    }

    #[test]
    fn test_dump_empty() {
        assert_eq!(dump(&[]), "");
    }
}
