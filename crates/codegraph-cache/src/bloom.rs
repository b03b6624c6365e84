use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Fixed-parameter bloom filter backing the cache's negative-lookup fast
/// path: 4 hash functions, capacity equal to the cache's `max_size`, tuned
/// for roughly 1% false positives at load factor 1. Double-hashing derives
/// all `k` probe positions from two independent 64-bit hashes of the key,
/// the same technique used by symbol-bloom-filter implementations elsewhere
/// in the corpus, scaled down to this cache's fixed (non-resizing) contract:
/// the cache clears and rebuilds the filter wholesale rather than growing it.
#[derive(Debug)]
pub struct NameBloomFilter {
    bits: Vec<bool>,
    hash_count: u32,
}

const HASH_COUNT: u32 = 4;

impl NameBloomFilter {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let bits_len = optimal_bits(capacity, 0.01).max(8);
        Self {
            bits: vec![false; bits_len],
            hash_count: HASH_COUNT,
        }
    }

    pub fn insert(&mut self, key: &str) {
        for idx in self.positions(key) {
            self.bits[idx] = true;
        }
    }

    /// No false negatives: if this returns `false`, the key is definitely
    /// absent from whatever set was inserted.
    pub fn might_contain(&self, key: &str) -> bool {
        self.positions(key).all(|idx| self.bits[idx])
    }

    pub fn clear(&mut self) {
        self.bits.iter_mut().for_each(|b| *b = false);
    }

    fn positions(&self, key: &str) -> impl Iterator<Item = usize> + '_ {
        let h1 = hash_with_seed(key, 0x9e3779b97f4a7c15);
        let h2 = hash_with_seed(key, 0xc2b2ae3d27d4eb4f);
        let len = self.bits.len() as u64;
        (0..self.hash_count).map(move |i| {
            let combined = h1.wrapping_add((i as u64).wrapping_mul(h2));
            (combined % len) as usize
        })
    }
}

fn hash_with_seed(key: &str, seed: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    key.hash(&mut hasher);
    hasher.finish()
}

/// Standard bloom-filter sizing formula: m = -n*ln(p) / (ln 2)^2.
fn optimal_bits(expected_items: usize, false_positive_rate: f64) -> usize {
    let n = expected_items as f64;
    let m = -(n * false_positive_rate.ln()) / (std::f64::consts::LN_2.powi(2));
    m.ceil() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_keys_are_always_found() {
        let mut filter = NameBloomFilter::new(100);
        filter.insert("alpha");
        filter.insert("beta");
        assert!(filter.might_contain("alpha"));
        assert!(filter.might_contain("beta"));
    }

    #[test]
    fn absent_key_is_usually_reported_absent() {
        let mut filter = NameBloomFilter::new(100);
        filter.insert("alpha");
        filter.insert("beta");
        filter.insert("gamma");
        assert!(!filter.might_contain("totally-unrelated-name-zzz"));
    }

    #[test]
    fn clear_resets_all_bits() {
        let mut filter = NameBloomFilter::new(10);
        filter.insert("alpha");
        filter.clear();
        assert!(!filter.might_contain("alpha"));
    }
}
