//! String-seeded deterministic random number generator
//!
//! A seed string is folded into a 32-bit state with an xmur3-style hash over
//! its UTF-16 code units, and that state drives a mulberry32 generator. Both
//! steps use wrapping 32-bit integer arithmetic only, so the output stream is
//! bit-identical on every platform.
//!
//! The generator is instance-scoped: every dungeon owns its own `SeededRng`
//! and nothing is shared between instances.

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// 2^32 as a float, used to map a raw 32-bit draw into [0, 1).
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Hash a seed string into the 32-bit generator state.
///
/// Order-sensitive: "ab" and "ba" hash differently.
pub fn hash_seed(seed: &str) -> u32 {
    let units: Vec<u16> = seed.encode_utf16().collect();
    let mut h: u32 = 1_779_033_703 ^ units.len() as u32;
    for unit in units {
        h = (h ^ u32::from(unit)).wrapping_mul(3_432_918_353);
        h = h.rotate_left(13);
    }
    h = (h ^ (h >> 16)).wrapping_mul(2_246_822_507);
    h = (h ^ (h >> 13)).wrapping_mul(3_266_489_909);
    h ^ (h >> 16)
}

/// Mulberry32 generator seeded from a string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededRng {
    /// Original seed string
    seed: String,
    /// Current 32-bit state
    state: u32,
    /// Number of raw 32-bit draws made so far
    draws: u64,
}

impl SeededRng {
    /// Create a generator from a seed string.
    pub fn new(seed: &str) -> Self {
        Self {
            seed: seed.to_owned(),
            state: hash_seed(seed),
            draws: 0,
        }
    }

    /// The seed this generator was created from
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Total number of raw draws consumed
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Next raw 32-bit output (one mulberry32 round)
    #[inline]
    pub fn next_raw(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        self.draws += 1;
        t ^ (t >> 14)
    }

    /// Uniform float in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_raw()) / TWO_POW_32
    }

    /// Uniform integer in `[min, max]`, inclusive on both ends.
    ///
    /// Returns `min` without drawing when `max <= min`.
    pub fn int_in_range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (i64::from(max) - i64::from(min) + 1) as f64;
        let offset = (self.next_f64() * span).floor() as i64;
        (i64::from(min) + offset) as i32
    }

    /// Uniform float in `[min, max)`.
    ///
    /// Returns `min` without drawing when `max <= min`.
    pub fn float_in_range(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + self.next_f64() * (max - min)
    }

    /// Returns true with probability `p`
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Choose a uniformly random element from a slice
    pub fn pick_one<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = (self.next_f64() * items.len() as f64).floor() as usize;
        items.get(idx.min(items.len() - 1))
    }

    /// Choose an element with probability proportional to its weight.
    ///
    /// Entries with non-positive weight are never picked. Returns `None` when
    /// no entry has positive weight.
    pub fn pick_weighted<'a, T>(&mut self, items: &'a [(T, f64)]) -> Option<&'a T> {
        let total: f64 = items.iter().map(|(_, w)| w.max(0.0)).sum();
        if total <= 0.0 {
            return None;
        }
        let mut roll = self.next_f64() * total;
        let mut last = None;
        for (item, weight) in items {
            if *weight <= 0.0 {
                continue;
            }
            if roll < *weight {
                return Some(item);
            }
            roll -= weight;
            last = Some(item);
        }
        // Float rounding can leave a sliver past the final bucket
        last
    }
}

impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        self.next_raw()
    }

    fn next_u64(&mut self) -> u64 {
        let lo = u64::from(self.next_raw());
        let hi = u64::from(self.next_raw());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_raw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reproducibility() {
        let mut a = SeededRng::new("dungeon-001");
        let mut b = SeededRng::new("dungeon-001");
        for _ in 0..1000 {
            assert_eq!(a.next_raw(), b.next_raw());
        }
        assert_eq!(a.draws(), 1000);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SeededRng::new("dungeon-001");
        let mut b = SeededRng::new("dungeon-002");
        let va: Vec<u32> = (0..8).map(|_| a.next_raw()).collect();
        let vb: Vec<u32> = (0..8).map(|_| b.next_raw()).collect();
        assert_ne!(va, vb);
    }

    #[test]
    fn test_hash_is_order_sensitive() {
        assert_ne!(hash_seed("ab"), hash_seed("ba"));
        assert_ne!(hash_seed(""), hash_seed("a"));
        assert_eq!(hash_seed("seed"), hash_seed("seed"));
    }

    #[test]
    fn test_hash_uses_utf16_units() {
        assert_eq!(hash_seed("caf\u{e9}"), hash_seed("café"));
        // Astral characters contribute two code units
        assert_ne!(hash_seed("\u{1F600}"), hash_seed("\u{1F601}"));
    }

    #[test]
    fn test_next_f64_in_unit_range() {
        let mut rng = SeededRng::new("unit");
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn test_int_in_range_inclusive() {
        let mut rng = SeededRng::new("ints");
        let mut saw_min = false;
        let mut saw_max = false;
        for _ in 0..10_000 {
            let v = rng.int_in_range(3, 7);
            assert!((3..=7).contains(&v));
            saw_min |= v == 3;
            saw_max |= v == 7;
        }
        assert!(saw_min && saw_max, "both bounds should be reachable");
    }

    #[test]
    fn test_degenerate_ranges_do_not_draw() {
        let mut rng = SeededRng::new("degenerate");
        assert_eq!(rng.int_in_range(5, 5), 5);
        assert_eq!(rng.int_in_range(9, 2), 9);
        assert_eq!(rng.float_in_range(1.5, 1.5), 1.5);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_float_in_range_bounds() {
        let mut rng = SeededRng::new("floats");
        for _ in 0..10_000 {
            let v = rng.float_in_range(-2.0, 3.0);
            assert!((-2.0..3.0).contains(&v));
        }
    }

    #[test]
    fn test_pick_one() {
        let mut rng = SeededRng::new("pick");
        let empty: [u8; 0] = [];
        assert!(rng.pick_one(&empty).is_none());
        let items = ["a", "b", "c"];
        for _ in 0..100 {
            assert!(items.contains(rng.pick_one(&items).unwrap()));
        }
    }

    #[test]
    fn test_pick_weighted_skips_zero_weights() {
        let mut rng = SeededRng::new("weights");
        let items = [("never", 0.0), ("always", 2.0), ("negative", -1.0)];
        for _ in 0..200 {
            assert_eq!(rng.pick_weighted(&items), Some(&"always"));
        }
        let none: [(&str, f64); 1] = [("x", 0.0)];
        assert!(rng.pick_weighted(&none).is_none());
    }

    #[test]
    fn test_chance_extremes() {
        let mut rng = SeededRng::new("chance");
        for _ in 0..100 {
            assert!(!rng.chance(0.0));
            assert!(rng.chance(1.0));
        }
    }

    #[test]
    fn test_rand_interop() {
        use rand::Rng;
        let mut rng = SeededRng::new("interop");
        for _ in 0..1000 {
            let v: u32 = rng.gen_range(10..20);
            assert!((10..20).contains(&v));
        }
        let mut buf = [0u8; 7];
        rng.fill_bytes(&mut buf);
    }

    #[test]
    fn test_serialization_resumes_stream() {
        let mut rng = SeededRng::new("snapshot");
        for _ in 0..50 {
            rng.next_raw();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: SeededRng = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.seed(), "snapshot");
        for _ in 0..50 {
            assert_eq!(rng.next_raw(), restored.next_raw());
        }
    }
}
