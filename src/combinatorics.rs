//! Counting and enumeration of weapon combinations and permutations.
//!
//! Everything here is stateless. Enumeration is iterative: `Combinations`
//! is an odometer over sorted index tuples and `Orderings` a lexicographic
//! successor over index arrays, so neither recurses and both can be
//! restarted by constructing a fresh iterator.

use crate::types::{Combination, Permutation, Weapon};

/// `n! / ((n - c)! * c!)`, or 0 when `c == 0` or `n < c`.
/// Saturates at `u64::MAX`.
pub fn count_combinations(n: usize, c: usize) -> u64 {
    if c == 0 || n < c {
        return 0;
    }
    // C(n, c) == C(n, n - c); the shorter product cannot overflow earlier.
    let k = c.min(n - c);
    let mut ans: u128 = 1;
    for i in 0..k {
        // ans == C(n, i) here, so the division is exact.
        ans = match ans.checked_mul((n - i) as u128) {
            Some(v) => v / (i + 1) as u128,
            None => return u64::MAX,
        };
        if ans > u64::MAX as u128 {
            return u64::MAX;
        }
    }
    ans as u64
}

/// `n! / (n - c)!`, or 0 when `c == 0` or `n < c`. Saturates at `u64::MAX`.
pub fn count_permutations(n: usize, c: usize) -> u64 {
    if c == 0 || n < c {
        return 0;
    }
    ((n - c + 1)..=n).fold(1u64, |acc, v| acc.saturating_mul(v as u64))
}

/// Odometer over the `c`-sized subsets of `{0..n-1}`, in increasing
/// lexicographic order.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    exhausted: bool,
}

impl Combinations {
    pub fn new(n: usize, c: usize) -> Self {
        Self {
            n,
            indices: (0..c).collect(),
            exhausted: c == 0 || n < c,
        }
    }

    /// Step to the next subset. Index `i` may climb to `n - c + i`; the
    /// rightmost index still below its ceiling is bumped and everything to
    /// its right is reset to consecutive values.
    fn advance(&mut self) {
        let c = self.indices.len();
        let ceiling = self.n - c;
        let Some(i) = (0..c).rev().find(|&i| self.indices[i] < ceiling + i) else {
            self.exhausted = true;
            return;
        };
        self.indices[i] += 1;
        for j in (i + 1)..c {
            self.indices[j] = self.indices[j - 1] + 1;
        }
    }
}

impl Iterator for Combinations {
    type Item = Combination;

    fn next(&mut self) -> Option<Combination> {
        if self.exhausted {
            return None;
        }
        let current = self.indices.clone();
        self.advance();
        Some(current)
    }
}

/// Every `c`-sized subset of `{0..n-1}`.
pub fn generate_combinations(n: usize, c: usize) -> Vec<Combination> {
    Combinations::new(n, c).collect()
}

/// Every `c`-sized combination holding all of `include` plus
/// `c - include.len()` weapons picked from `remainder`.
///
/// `remainder` must be disjoint from `include`. Each result is sorted.
pub fn combinations_containing(
    include: &[Weapon],
    remainder: &[Weapon],
    c: usize,
) -> Vec<Combination> {
    if include.len() > c {
        return Vec::new();
    }
    let free = c - include.len();
    if free == 0 {
        let mut only = include.to_vec();
        only.sort_unstable();
        return vec![only];
    }

    Combinations::new(remainder.len(), free)
        .map(|picked| {
            let mut combo: Combination = include
                .iter()
                .copied()
                .chain(picked.iter().map(|&i| remainder[i]))
                .collect();
            combo.sort_unstable();
            combo
        })
        .collect()
}

/// Lexicographic successor over the orderings of a fixed set of weapons.
/// Yields `items.len()!` permutations when the items are distinct.
#[derive(Debug, Clone)]
pub struct Orderings {
    items: Vec<Weapon>,
    indices: Vec<usize>,
    exhausted: bool,
}

impl Orderings {
    pub fn new(items: &[Weapon]) -> Self {
        Self {
            items: items.to_vec(),
            indices: (0..items.len()).collect(),
            exhausted: items.is_empty(),
        }
    }

    fn advance(&mut self) {
        let idx = &mut self.indices;
        let Some(i) = (0..idx.len().saturating_sub(1)).rev().find(|&i| idx[i] < idx[i + 1]) else {
            self.exhausted = true;
            return;
        };
        // A larger element exists to the right of i by construction.
        let j = (i + 1..idx.len()).rev().find(|&j| idx[j] > idx[i]).unwrap_or(i + 1);
        idx.swap(i, j);
        idx[i + 1..].reverse();
    }
}

impl Iterator for Orderings {
    type Item = Permutation;

    fn next(&mut self) -> Option<Permutation> {
        if self.exhausted {
            return None;
        }
        let current = self.indices.iter().map(|&i| self.items[i]).collect();
        self.advance();
        Some(current)
    }
}

/// All orderings of one combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermutationGroup {
    pub combination: Combination,
    pub permutations: Vec<Permutation>,
}

impl PermutationGroup {
    pub fn new(combination: Combination) -> Self {
        let permutations = Orderings::new(&combination).collect();
        Self {
            combination,
            permutations,
        }
    }

    pub fn len(&self) -> usize {
        self.permutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permutations.is_empty()
    }
}

/// One group per input combination of size `c`, each holding its `c!`
/// orderings. Groups are never merged: downstream filters use the group's
/// combination to score all of its members at once.
pub fn generate_grouped_permutations(
    combinations: &[Combination],
    c: usize,
) -> Vec<PermutationGroup> {
    combinations
        .iter()
        .filter(|combo| combo.len() == c)
        .map(|combo| PermutationGroup::new(combo.clone()))
        .collect()
}
