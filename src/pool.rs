//! The set of secrets still consistent with every reply seen so far.

use crate::combinatorics::PermutationGroup;
use crate::events::PoolKind;
use crate::types::{positions_correct, weapons_correct, Combination, Permutation, Response, Weapon};

/// One submitted guess and the reply it got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub guess: Permutation,
    pub response: Response,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidatePool {
    /// Too large to enumerate; weapon deduction stands in for it.
    Unmaterialized,
    /// Feasible weapon sets; positions not yet tracked.
    Combinations(Vec<Combination>),
    /// Feasible orderings, grouped by their weapon set.
    Permutations(Vec<PermutationGroup>),
}

impl CandidatePool {
    /// Number of tracked candidates, or `None` when nothing is materialized.
    pub fn size(&self) -> Option<u64> {
        match self {
            CandidatePool::Unmaterialized => None,
            CandidatePool::Combinations(combos) => Some(combos.len() as u64),
            CandidatePool::Permutations(groups) => {
                Some(groups.iter().map(|g| g.len() as u64).sum())
            }
        }
    }

    pub fn kind(&self) -> Option<PoolKind> {
        match self {
            CandidatePool::Unmaterialized => None,
            CandidatePool::Combinations(_) => Some(PoolKind::Combinations),
            CandidatePool::Permutations(_) => Some(PoolKind::Permutations),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == Some(0)
    }

    /// Drop every candidate that would not have produced `response` to
    /// `guess`. Combination pools only see the weapons-correct count.
    pub fn filter(&mut self, guess: &[Weapon], response: Response) {
        match self {
            CandidatePool::Unmaterialized => {}
            CandidatePool::Combinations(combos) => {
                combos.retain(|combo| weapons_correct(guess, combo) == response.weapons_correct);
            }
            CandidatePool::Permutations(groups) => {
                // The weapons-correct count is shared by a whole group.
                groups.retain_mut(|group| {
                    if weapons_correct(guess, &group.combination) != response.weapons_correct {
                        return false;
                    }
                    group
                        .permutations
                        .retain(|perm| positions_correct(guess, perm) == response.positions_correct);
                    !group.permutations.is_empty()
                });
            }
        }
    }

    /// Whether `secret` is still a candidate. A combination pool matches on
    /// weapon set alone.
    pub fn contains(&self, secret: &[Weapon]) -> bool {
        match self {
            CandidatePool::Unmaterialized => false,
            CandidatePool::Combinations(combos) => {
                let mut key = secret.to_vec();
                key.sort_unstable();
                combos.contains(&key)
            }
            CandidatePool::Permutations(groups) => groups
                .iter()
                .any(|g| g.permutations.iter().any(|p| p.as_slice() == secret)),
        }
    }
}

/// Where replaying history into a fresh pool stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refilter {
    Done,
    /// Budget ran out; `history[next_index..]` has not been applied yet.
    Paused { next_index: usize },
}
