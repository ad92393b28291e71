// Copyright Tern Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Hash primitives shared by both raw-value hash families.
//!
//! Multi-column keys are folded by chaining: the hash of column `n` seeds
//! the hash of column `n + 1`. Both families here are seeded so they
//! compose that way, and both route NULLs and empty strings through
//! [`hash_null`] and [`hash_empty`] so that a NULL column, an empty-string
//! column, and a false boolean column can never collide with one another
//! or with the unmodified seed.

/// Mixed with the seed for a SQL NULL.
const NULL_MIX: u32 = 0x5808_1667;

/// Mixed with the seed for a zero-length string, which contributes no
/// payload bytes of its own.
const EMPTY_MIX: u32 = 0x7dca_7eee;

const FNV64_PRIME: u64 = 0x0000_0100_0000_01b3;

/// The general-purpose engine hash of `data`, seeded with `seed`.
pub fn hash_bytes(data: &[u8], seed: u32) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(seed);
    hasher.update(data);
    hasher.finalize()
}

/// The FNV-variant hash of `data`, seeded with `seed`.
///
/// Runs a 64-bit FNV-1a over the bytes, then folds the state to 32 bits by
/// xoring the halves. The fold is what keeps low-order bits well mixed when
/// hashes are bucketed by modulus.
pub fn fnv_bytes(data: &[u8], seed: u32) -> u32 {
    let mut hash = (u64::from(seed) << 32) | u64::from(seed);
    for &byte in data {
        hash = (hash ^ u64::from(byte)).wrapping_mul(FNV64_PRIME);
    }
    ((hash >> 32) ^ (hash & 0xffff_ffff)) as u32
}

/// Mixes a value into a seed. Distinct values always produce distinct
/// results for the same seed.
pub fn hash_combine(value: u32, seed: u32) -> u32 {
    seed ^ value
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

/// The hash of a SQL NULL, for either family.
pub fn hash_null(seed: u32) -> u32 {
    hash_combine(NULL_MIX, seed)
}

/// The hash of a zero-length string, for either family.
pub fn hash_empty(seed: u32) -> u32 {
    hash_combine(EMPTY_MIX, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(hash_bytes(b"tern", 42), hash_bytes(b"tern", 42));
        assert_eq!(fnv_bytes(b"tern", 42), fnv_bytes(b"tern", 42));
    }

    #[test]
    fn seed_sensitive() {
        assert_ne!(hash_bytes(b"tern", 1), hash_bytes(b"tern", 2));
        assert_ne!(fnv_bytes(b"tern", 1), fnv_bytes(b"tern", 2));
    }

    #[test]
    fn null_and_empty_never_fix_the_seed() {
        for seed in [0u32, 1, 12345, 0xffff_ffff, 0x9e37_79b9] {
            assert_ne!(hash_null(seed), seed);
            assert_ne!(hash_empty(seed), seed);
            assert_ne!(hash_null(seed), hash_empty(seed));
        }
    }

    #[test]
    fn combine_distinguishes_values() {
        for seed in [0u32, 7, 12345] {
            assert_ne!(hash_combine(1, seed), hash_combine(2, seed));
        }
    }
}
