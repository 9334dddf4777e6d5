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

//! Random frame payloads.

use rand::Rng;

/// Builds a random payload of `length` bytes.
pub fn build(length: usize) -> Vec<u8> {
    build_with(&mut rand::thread_rng(), length)
}

/// Builds a random payload of `length` bytes drawn from `rng`.
pub fn build_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> Vec<u8> {
    let mut payload = vec![0u8; length];
    rng.fill(&mut payload[..]);
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_build_length() {
        assert_eq!(build(0).len(), 0);
        assert_eq!(build(1500).len(), 1500);
    }

    #[test]
    fn test_build_with_seed_is_reproducible() {
        let a = build_with(&mut StdRng::seed_from_u64(7), 64);
        let b = build_with(&mut StdRng::seed_from_u64(7), 64);
        assert_eq!(a, b);
        assert_ne!(a, build_with(&mut StdRng::seed_from_u64(8), 64));
    }
}
