//! One shard's membership filter: a binary fuse filter over `u64` keys
//! derived from password hashes, built with the `xorf` crate rather than a
//! hand-derived fuse-graph construction (see DESIGN.md for why).
//!
//! Grounded on `include/filter.hpp`'s `hibp::filter` (construct from a sorted
//! pwned-hash file, query by digest, estimate false-positive rate).

use rand::{RngCore, SeedableRng};
use xorf::{BinaryFuse8, Filter as _};

use crate::error::{HibpError, HibpResult};

#[derive(serde::Serialize, serde::Deserialize)]
pub struct ShardFilter {
    inner: BinaryFuse8,
}

impl ShardFilter {
    /// Builds a filter over `keys`. `xorf` requires at least a handful of
    /// keys to find a peelable hypergraph; an empty or too-small shard is
    /// represented by `None` instead of a filter.
    pub fn build(prefix: u32, keys: &[u64]) -> HibpResult<Option<Self>> {
        if keys.is_empty() {
            return Ok(None);
        }
        BinaryFuse8::try_from(keys)
            .map(|inner| Some(Self { inner }))
            .map_err(|e| HibpError::FilterBuild {
                prefix,
                reason: e.to_string(),
            })
    }

    pub fn contains(&self, key: u64) -> bool {
        self.inner.contains(&key)
    }

    pub fn to_bytes(&self) -> HibpResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> HibpResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Queries `sample_size` keys known not to be in `keys` and reports the
/// fraction the filter nonetheless reports present: an empirical estimate
/// of the false-positive rate, since binary fuse filters give no closed-form
/// guarantee beyond "close to 2^-bits_per_fingerprint".
pub fn estimate_fpr(filter: &ShardFilter, keys: &[u64], sample_size: usize) -> f64 {
    if sample_size == 0 {
        return 0.0;
    }
    let present: std::collections::HashSet<u64> = keys.iter().copied().collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xF17E_F17E_F17E_F17E);
    let mut false_positives = 0usize;
    let mut tried = 0usize;
    while tried < sample_size {
        let candidate = rng.next_u64();
        if present.contains(&candidate) {
            continue;
        }
        if filter.contains(candidate) {
            false_positives += 1;
        }
        tried += 1;
    }
    false_positives as f64 / sample_size as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_query_round_trip() {
        let keys: Vec<u64> = (0..2000u64).map(|i| i * 7919).collect();
        let filter = ShardFilter::build(0, &keys).unwrap().unwrap();
        for k in &keys {
            assert!(filter.contains(*k));
        }
    }

    #[test]
    fn serialize_round_trip() {
        let keys: Vec<u64> = (0..2000u64).map(|i| i * 104729).collect();
        let filter = ShardFilter::build(0, &keys).unwrap().unwrap();
        let bytes = filter.to_bytes().unwrap();
        let loaded = ShardFilter::from_bytes(&bytes).unwrap();
        for k in &keys {
            assert!(loaded.contains(*k));
        }
    }

    #[test]
    fn empty_shard_has_no_filter() {
        assert!(ShardFilter::build(0, &[]).unwrap().is_none());
    }

    #[test]
    fn false_positive_rate_is_small() {
        let keys: Vec<u64> = (0..5000u64).map(|i| i * 2_654_435_761).collect();
        let filter = ShardFilter::build(0, &keys).unwrap().unwrap();
        let fpr = estimate_fpr(&filter, &keys, 20_000);
        assert!(fpr < 0.01, "fpr {fpr} too high for an 8-bit fingerprint");
    }
}
