//! WASM-compatible random number generator for guess sampling.
//!
//! Uses the `rand` crate with `SmallRng` (xoshiro256++) which is fast and
//! works with WASM. Entropy is sourced from `getrandom` (browser crypto API).

use rand::rngs::SmallRng;
use rand::seq::{index, IndexedRandom, SliceRandom};
use rand::SeedableRng;

/// A seedable RNG wrapper used by every sampled search.
///
/// Can be seeded for deterministic replay, or created from system entropy.
pub struct GuessRng {
    inner: SmallRng,
}

impl GuessRng {
    /// Create from system entropy (browser crypto.getRandomValues or OS).
    pub fn new() -> Self {
        Self {
            inner: SmallRng::from_os_rng(),
        }
    }

    /// Create with a specific seed for deterministic behavior.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    /// Seeded when `seed` is given, otherwise from entropy.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::from_seed(s),
            None => Self::new(),
        }
    }

    /// `amount` distinct elements of `items`, in random order.
    /// Returns fewer when `items` is shorter than `amount`.
    pub fn sample<T: Clone>(&mut self, items: &[T], amount: usize) -> Vec<T> {
        self.sample_indices(items.len(), amount)
            .into_iter()
            .map(|i| items[i].clone())
            .collect()
    }

    /// `amount` distinct indices below `len` (fewer if `len < amount`).
    pub fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        index::sample(&mut self.inner, len, amount.min(len)).into_vec()
    }

    /// A uniformly chosen element, or `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.inner)
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}

impl Default for GuessRng {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_draws() {
        let items: Vec<usize> = (0..40).collect();
        let mut a = GuessRng::from_seed(42);
        let mut b = GuessRng::from_optional_seed(Some(42));
        for _ in 0..50 {
            assert_eq!(a.sample(&items, 5), b.sample(&items, 5));
        }
        let mut left = items.clone();
        let mut right = items.clone();
        a.shuffle(&mut left);
        b.shuffle(&mut right);
        assert_eq!(left, right);
    }

    #[test]
    fn test_sample_indices_in_bounds() {
        let mut rng = GuessRng::from_seed(123);
        for _ in 0..200 {
            let picked = rng.sample_indices(10, 4);
            assert_eq!(picked.len(), 4);
            assert!(picked.iter().all(|&i| i < 10));
        }
        assert!(rng.sample_indices(0, 3).is_empty());
    }

    #[test]
    fn test_sample_is_distinct_subset() {
        let mut rng = GuessRng::from_seed(7);
        let items: Vec<usize> = (0..20).collect();
        for _ in 0..50 {
            let mut s = rng.sample(&items, 6);
            assert_eq!(s.len(), 6);
            s.sort_unstable();
            s.dedup();
            assert_eq!(s.len(), 6);
            assert!(s.iter().all(|&v| v < 20));
        }
        assert_eq!(rng.sample(&items[..3], 10).len(), 3);
    }

    #[test]
    fn test_shuffle_keeps_elements() {
        let mut rng = GuessRng::from_seed(9);
        let mut v = vec![1, 2, 3, 4, 5];
        rng.shuffle(&mut v);
        v.sort_unstable();
        assert_eq!(v, vec![1, 2, 3, 4, 5]);
        assert!(rng.choose::<u8>(&[]).is_none());
    }
}
