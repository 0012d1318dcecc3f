//! Worst-case (minimax) guess scoring.
//!
//! A guess splits the candidates into buckets by the reply each candidate
//! would give. Its score is the size of the largest bucket; lower is better.
//! Ties keep the first guess found.

use crate::clock::Deadline;
use crate::combinatorics::PermutationGroup;
use crate::types::{positions_correct, weapons_correct, Combination, Response, Weapon};

/// Reusable bucket counter, sized for every reply of an `n`-weapon guess.
pub struct Buckets {
    counts: Vec<usize>,
    num_opponents: usize,
}

impl Buckets {
    pub fn new(num_opponents: usize) -> Self {
        Self {
            counts: vec![0; (num_opponents + 1) * (num_opponents + 1)],
            num_opponents,
        }
    }

    /// Largest bucket when `candidates` are split by weapons-correct only.
    pub fn combination_worst_case(&mut self, guess: &[Weapon], candidates: &[Combination]) -> usize {
        self.counts.fill(0);
        for combo in candidates {
            self.counts[weapons_correct(guess, combo)] += 1;
        }
        self.max()
    }

    /// Largest bucket when the grouped permutations are split by the full
    /// `(weapons_correct, positions_correct)` reply.
    pub fn permutation_worst_case(&mut self, guess: &[Weapon], groups: &[PermutationGroup]) -> usize {
        self.counts.fill(0);
        for group in groups {
            let weapons = weapons_correct(guess, &group.combination);
            for perm in &group.permutations {
                let reply = Response::new(weapons, positions_correct(guess, perm));
                self.counts[reply.bucket(self.num_opponents)] += 1;
            }
        }
        self.max()
    }

    fn max(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scored<T> {
    pub guess: T,
    pub worst_case: usize,
}

/// Outcome of one guess search.
#[derive(Debug, Clone)]
pub struct Search<T> {
    pub best: Option<Scored<T>>,
    pub scored: usize,
    /// The deadline cut the search short.
    pub truncated: bool,
}

impl<T> Search<T> {
    fn new() -> Self {
        Self {
            best: None,
            scored: 0,
            truncated: false,
        }
    }

    /// Keep `guess` if it strictly beats the best so far. Returns true when
    /// nothing better is possible.
    fn offer(&mut self, guess: T, worst_case: usize) -> bool {
        self.scored += 1;
        let better = match &self.best {
            Some(best) => worst_case < best.worst_case,
            None => true,
        };
        if better {
            self.best = Some(Scored { guess, worst_case });
        }
        worst_case <= 1
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Search<U> {
        Search {
            best: self.best.map(|s| Scored {
                guess: f(s.guess),
                worst_case: s.worst_case,
            }),
            scored: self.scored,
            truncated: self.truncated,
        }
    }
}

/// Score every candidate in order until the deadline.
pub fn select_exhaustive<T, I, F>(candidates: I, deadline: &Deadline, mut score: F) -> Search<T>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> usize,
{
    let mut search = Search::new();
    for candidate in candidates {
        if deadline.expired() {
            search.truncated = true;
            break;
        }
        let worst_case = score(&candidate);
        if search.offer(candidate, worst_case) {
            break;
        }
    }
    search
}

/// Score up to `limit` randomly drawn candidates until the deadline.
/// `draw` returning `None` ends the search.
pub fn select_sampled<T, D, F>(mut draw: D, limit: usize, deadline: &Deadline, mut score: F) -> Search<T>
where
    D: FnMut() -> Option<T>,
    F: FnMut(&T) -> usize,
{
    let mut search = Search::new();
    while search.scored < limit {
        if deadline.expired() {
            search.truncated = true;
            break;
        }
        let Some(candidate) = draw() else { break };
        let worst_case = score(&candidate);
        if search.offer(candidate, worst_case) {
            break;
        }
    }
    search
}
