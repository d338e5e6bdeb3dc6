//! Seeded RNG used for every random draw in the simulation: service-time and
//! branch-factor sampling. A per-simulation instance, never a process-wide
//! global — see spec.md §9's last Design Note.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct DeterministicRng {
    rng: ChaCha8Rng,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        DeterministicRng {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    pub fn gen_range(&mut self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        min + (self.next_u64() % (max - min))
    }

    pub fn gen_bool(&mut self, probability: f64) -> bool {
        let val = self.next_u64() as f64 / u64::MAX as f64;
        val < probability
    }

    /// Uniform choice with replacement, matching `np.random.choice` over the
    /// sample arrays in `examples/original_source/othello.py`.
    pub fn choice<'a, T>(&mut self, samples: &'a [T]) -> &'a T {
        debug_assert!(!samples.is_empty(), "choice from an empty distribution");
        let idx = self.gen_range(0, samples.len() as u64) as usize;
        &samples[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = DeterministicRng::new(7);
        let mut b = DeterministicRng::new(7);
        let seq_a: Vec<u64> = (0..10).map(|_| a.next_u64()).collect();
        let seq_b: Vec<u64> = (0..10).map(|_| b.next_u64()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn choice_stays_in_bounds() {
        let mut rng = DeterministicRng::new(1);
        let samples = vec![10, 20, 30];
        for _ in 0..50 {
            let v = *rng.choice(&samples);
            assert!(samples.contains(&v));
        }
    }
}
