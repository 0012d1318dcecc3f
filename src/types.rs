//! Core data types for the code breaker.
//!
//! Weapons are plain indices in `[0, num_weapons)`. Combinations are stored
//! sorted so equal sets compare equal; permutations keep guess order.

use serde::Serialize;

use crate::error::EngineError;

/// Identifier of a single weapon.
pub type Weapon = usize;

/// Unordered selection of weapons, kept sorted ascending.
pub type Combination = Vec<Weapon>;

/// Ordered selection of distinct weapons: a full candidate secret.
pub type Permutation = Vec<Weapon>;

/// Reply to a guess: `(weapons_correct, positions_correct)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Response {
    pub weapons_correct: usize,
    pub positions_correct: usize,
}

impl Response {
    pub fn new(weapons_correct: usize, positions_correct: usize) -> Self {
        Self {
            weapons_correct,
            positions_correct,
        }
    }

    /// The reply `secret` would give to `guess`.
    pub fn score(guess: &[Weapon], secret: &[Weapon]) -> Self {
        Self {
            weapons_correct: weapons_correct(guess, secret),
            positions_correct: positions_correct(guess, secret),
        }
    }

    /// True when every weapon is present and in place.
    #[inline(always)]
    pub fn is_win(&self, num_opponents: usize) -> bool {
        self.weapons_correct == num_opponents && self.positions_correct == num_opponents
    }

    /// Flat bucket index for a `(num_opponents + 1)^2` counter table.
    #[inline(always)]
    pub fn bucket(&self, num_opponents: usize) -> usize {
        self.weapons_correct * (num_opponents + 1) + self.positions_correct
    }
}

/// Number of weapons shared by `a` and `b`, ignoring position.
///
/// Selections are short, so a quadratic scan beats hashing.
#[inline(always)]
pub fn weapons_correct(a: &[Weapon], b: &[Weapon]) -> usize {
    a.iter().filter(|w| b.contains(w)).count()
}

/// Number of indices where `a` and `b` hold the same weapon.
#[inline(always)]
pub fn positions_correct(a: &[Weapon], b: &[Weapon]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x == y).count()
}

/// What the engine knows about one weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponStatus {
    Correct,
    Incorrect,
    Unknown,
}

/// Check that `guess` is `num_opponents` distinct ids below `num_weapons`.
pub fn validate_guess(
    guess: &[Weapon],
    num_weapons: usize,
    num_opponents: usize,
) -> Result<(), EngineError> {
    if guess.len() != num_opponents {
        return Err(EngineError::invalid(format!(
            "expected {} weapons, got {}",
            num_opponents,
            guess.len()
        )));
    }
    let mut seen = vec![false; num_weapons];
    for &w in guess {
        if w >= num_weapons {
            return Err(EngineError::invalid(format!(
                "weapon {} out of range 0..{}",
                w, num_weapons
            )));
        }
        if seen[w] {
            return Err(EngineError::invalid(format!("weapon {} repeated", w)));
        }
        seen[w] = true;
    }
    Ok(())
}

/// Check the `(num_weapons, num_opponents)` pair accepted by every entry point.
pub fn validate_dimensions(num_weapons: usize, num_opponents: usize) -> Result<(), EngineError> {
    if num_weapons == 0 {
        return Err(EngineError::invalid("num_weapons must be positive"));
    }
    if num_opponents == 0 || num_opponents > num_weapons {
        return Err(EngineError::invalid(format!(
            "num_opponents must be in 1..={}, got {}",
            num_weapons, num_opponents
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_counts_both_axes() {
        let secret = vec![0, 3, 5];
        assert_eq!(Response::score(&[0, 1, 2], &secret), Response::new(1, 1));
        assert_eq!(Response::score(&[5, 0, 3], &secret), Response::new(3, 0));
        assert_eq!(Response::score(&[0, 3, 5], &secret), Response::new(3, 3));
        assert_eq!(Response::score(&[1, 2, 4], &secret), Response::new(0, 0));
    }

    #[test]
    fn test_is_win() {
        assert!(Response::new(4, 4).is_win(4));
        assert!(!Response::new(4, 3).is_win(4));
        assert!(!Response::new(3, 3).is_win(4));
    }

    #[test]
    fn test_bucket_indices_are_distinct() {
        let c = 4;
        let mut seen = std::collections::HashSet::new();
        for w in 0..=c {
            for p in 0..=w {
                assert!(seen.insert(Response::new(w, p).bucket(c)));
            }
        }
        assert!(seen.iter().all(|&b| b < (c + 1) * (c + 1)));
    }

    #[test]
    fn test_validate_guess_rejects_malformed() {
        assert!(validate_guess(&[0, 1, 2], 5, 3).is_ok());
        assert!(matches!(validate_guess(&[0, 1], 5, 3), Err(EngineError::InvalidInput(_))));
        assert!(matches!(validate_guess(&[0, 1, 1], 5, 3), Err(EngineError::InvalidInput(_))));
        assert!(matches!(validate_guess(&[0, 1, 5], 5, 3), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_dimensions() {
        assert!(validate_dimensions(5, 5).is_ok());
        assert!(validate_dimensions(0, 0).is_err());
        assert!(validate_dimensions(5, 0).is_err());
        assert!(validate_dimensions(3, 4).is_err());
    }
}
