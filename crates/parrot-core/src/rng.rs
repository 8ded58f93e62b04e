//! Randomness strategies.
//!
//! Reply styling draws from a generator seeded by the channel id so a channel
//! always gets the same sequence. Everything else (delays, denial picks) goes
//! through [`RandomSource`] so tests can script the values.

use rand::Rng;

/// Source of uniform samples in `[0, 1)`.
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize {
        let index = (self.next_f64() * len as f64) as usize;
        index.min(len.saturating_sub(1))
    }

    /// Uniform float in `[low, high)`.
    fn range_f64(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_f64() * (high - low)
    }

    /// Uniform integer in `[low, high]`.
    fn range_inclusive(&mut self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        let span = (high - low) as f64 + 1.0;
        low + ((self.next_f64() * span) as u64).min(high - low)
    }
}

/// Mulberry32: small, fast, deterministic 32-bit generator.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }
}

impl RandomSource for Mulberry32 {
    fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }
}

/// Base-31 rolling hash over UTF-16 code units, wrapping at 32 bits.
pub fn channel_seed(channel_id: &str) -> u32 {
    channel_id
        .encode_utf16()
        .fold(0u32, |seed, unit| seed.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

/// Generator for a channel. An empty id falls back to `"default"`.
pub fn seeded(channel_id: &str) -> Mulberry32 {
    let key = if channel_id.is_empty() {
        "default"
    } else {
        channel_id
    };
    Mulberry32::new(channel_seed(key))
}

/// Thread-local OS-seeded generator for wall-clock randomness.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&mut self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Replays a fixed list of samples, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_seed_rolling_hash() {
        // "ab" = 97 * 31 + 98
        assert_eq!(channel_seed("ab"), 97 * 31 + 98);
        assert_eq!(channel_seed(""), 0);
    }

    #[test]
    fn test_channel_seed_wraps_on_long_ids() {
        let seed = channel_seed("123456789012345678901234567890");
        let expected = "123456789012345678901234567890"
            .bytes()
            .fold(0u64, |acc, b| (acc * 31 + u64::from(b)) % (1u64 << 32));
        assert_eq!(u64::from(seed), expected);
    }

    #[test]
    fn test_mulberry32_reference_sequence() {
        let mut rng = Mulberry32::new(0);
        assert_eq!(rng.next_u32(), 1_144_304_738);
        assert_eq!(rng.next_u32(), 1_416_247);
    }

    #[test]
    fn test_seeded_is_reproducible_per_channel() {
        let first: Vec<f64> = {
            let mut rng = seeded("1186012345678901234");
            (0..8).map(|_| rng.next_f64()).collect()
        };
        let second: Vec<f64> = {
            let mut rng = seeded("1186012345678901234");
            (0..8).map(|_| rng.next_f64()).collect()
        };
        assert_eq!(first, second);
    }

    #[test]
    fn test_seeded_differs_across_channels() {
        let mut a = seeded("channel-a");
        let mut b = seeded("channel-b");
        let a: Vec<u32> = (0..4).map(|_| a.next_u32()).collect();
        let b: Vec<u32> = (0..4).map(|_| b.next_u32()).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_seeded_empty_uses_default_key() {
        let mut empty = seeded("");
        let mut default = seeded("default");
        assert_eq!(empty.next_u32(), default.next_u32());
    }

    #[test]
    fn test_samples_are_in_unit_interval() {
        let mut rng = seeded("bounds");
        for _ in 0..1000 {
            let value = rng.next_f64();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_pick_index_never_out_of_bounds() {
        let mut rng = ScriptedRandom::new(vec![0.0, 0.5, 0.999_999]);
        assert_eq!(rng.pick_index(5), 0);
        assert_eq!(rng.pick_index(5), 2);
        assert_eq!(rng.pick_index(5), 4);
    }

    #[test]
    fn test_range_inclusive_covers_both_ends() {
        let mut rng = ScriptedRandom::new(vec![0.0, 0.999_999]);
        assert_eq!(rng.range_inclusive(1000, 5000), 1000);
        assert_eq!(rng.range_inclusive(1000, 5000), 5000);
    }

    #[test]
    fn test_range_inclusive_full_width_does_not_overflow() {
        let mut rng = ScriptedRandom::new(vec![0.0, 0.999_999]);
        assert_eq!(rng.range_inclusive(0, u64::MAX), 0);
        assert!(rng.range_inclusive(0, u64::MAX) > u64::MAX / 2);
    }

    #[test]
    fn test_scripted_random_cycles() {
        let mut rng = ScriptedRandom::new(vec![0.1, 0.2]);
        assert_eq!(rng.next_f64(), 0.1);
        assert_eq!(rng.next_f64(), 0.2);
        assert_eq!(rng.next_f64(), 0.1);
    }
}
