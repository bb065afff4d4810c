//! # World Seed
//!
//! All procedural generation derives from one 64-bit seed.
//!
//! ## Determinism Guarantee
//!
//! Every derived value is a pure function of the seed and its inputs,
//! using wrapping integer arithmetic only. Results are identical on every
//! platform, in every call order, on every thread.

use serde::{Deserialize, Serialize};

/// The 64-bit world seed supplied by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Creates a seed from a signed host value (bit-preserving).
    #[inline]
    #[must_use]
    pub const fn from_i64(seed: i64) -> Self {
        Self(seed as u64)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Seed of an independent stream (terrain, climate axis, caves, ...).
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }

    /// Hashes a world column for a given purpose.
    ///
    /// Full avalanche (splitmix64 finaliser), so neighbouring columns
    /// produce unrelated values.
    #[inline]
    #[must_use]
    pub const fn hash_column(self, purpose: u64, x: i64, z: i64) -> u64 {
        let mut h = self.0 ^ purpose.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        h = mix64(h ^ (x as u64).wrapping_mul(0xbf58_476d_1ce4_e5b9));
        h = mix64(h ^ (z as u64).wrapping_mul(0x94d0_49bb_1331_11eb));
        h
    }

    /// Column hash mapped to `[0, 1)`.
    #[inline]
    #[must_use]
    pub fn unit_column(self, purpose: u64, x: i64, z: i64) -> f64 {
        unit_from_hash(self.hash_column(purpose, x, z))
    }
}

/// splitmix64 finaliser.
#[inline]
const fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Maps a hash to `[0, 1)` using its top 53 bits.
#[inline]
#[must_use]
pub fn unit_from_hash(hash: u64) -> f64 {
    (hash >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}
