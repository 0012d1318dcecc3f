//! Per-weapon deduction from weapons-correct feedback alone.
//!
//! Tracks which weapons are certainly in or out of the secret without ever
//! enumerating combinations, so it works when `C(num_weapons, num_opponents)`
//! is far too large to materialize. Two rules drive it:
//!
//! - a reduced guess with count 0 is all incorrect; one whose count equals
//!   its size is all correct;
//! - for two guesses, the weapons only in the first and the weapons only in
//!   the second differ in correct count by exactly the difference of the
//!   replies. When that difference is as large as one side, both sides are
//!   decided.

use std::collections::BTreeSet;

use crate::error::EngineError;
use crate::types::{validate_guess, Weapon, WeaponStatus};

/// A past guess reduced to its undecided weapons, with the number of them
/// that are correct.
#[derive(Debug, Clone)]
struct Observation {
    weapons: BTreeSet<Weapon>,
    correct: usize,
}

/// Relation between two observations: `correct(only_new) - correct(only_old)
/// == delta`.
#[derive(Debug, Clone)]
struct PendingRelation {
    only_old: BTreeSet<Weapon>,
    only_new: BTreeSet<Weapon>,
    delta: i64,
}

/// Incremental knowledge base over the weapon universe.
pub struct WeaponDeduction {
    num_weapons: usize,
    num_opponents: usize,
    status: Vec<WeaponStatus>,
    correct: BTreeSet<Weapon>,
    unknown: BTreeSet<Weapon>,
    observations: Vec<Observation>,
    relations: Vec<PendingRelation>,
}

impl WeaponDeduction {
    pub fn new(num_weapons: usize, num_opponents: usize) -> Self {
        Self {
            num_weapons,
            num_opponents,
            status: vec![WeaponStatus::Unknown; num_weapons],
            correct: BTreeSet::new(),
            unknown: (0..num_weapons).collect(),
            observations: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Fold in one guess and its weapons-correct count.
    ///
    /// Returns `Ok(true)` once every correct weapon is identified. Rejects a
    /// malformed guess or a count above its length without touching state.
    pub fn learn(&mut self, guess: &[Weapon], correct_count: usize) -> Result<bool, EngineError> {
        validate_guess(guess, self.num_weapons, self.num_opponents)?;
        if correct_count > guess.len() {
            return Err(EngineError::invalid(format!(
                "{} correct out of a {}-weapon guess",
                correct_count,
                guess.len()
            )));
        }

        let mut weapons: BTreeSet<Weapon> = guess.iter().copied().collect();
        let known_correct = self.strip_known(&mut weapons);
        // Contradictory feedback would underflow; treat it as nothing learned.
        let Some(correct) = correct_count.checked_sub(known_correct) else {
            return Ok(self.finish());
        };

        if correct == 0 {
            self.mark_incorrect(&weapons);
        } else if correct == weapons.len() {
            self.mark_correct(&weapons);
        } else {
            let new = Observation { weapons, correct };
            for old in &self.observations {
                self.relations.push(PendingRelation {
                    only_old: old.weapons.difference(&new.weapons).copied().collect(),
                    only_new: new.weapons.difference(&old.weapons).copied().collect(),
                    delta: new.correct as i64 - old.correct as i64,
                });
            }
            self.observations.push(new);
        }

        self.propagate();
        Ok(self.finish())
    }

    /// Re-apply knowledge to every relation and observation until a full
    /// pass decides no further weapon. Terminates because each productive
    /// pass shrinks `unknown`.
    fn propagate(&mut self) {
        loop {
            let before = self.unknown.len();

            let relations = std::mem::take(&mut self.relations);
            for relation in relations {
                if let Some(kept) = self.resolve_relation(relation) {
                    self.relations.push(kept);
                }
            }

            let observations = std::mem::take(&mut self.observations);
            for observation in observations {
                if let Some(kept) = self.resolve_observation(observation) {
                    self.observations.push(kept);
                }
            }

            if self.unknown.len() == before {
                break;
            }
        }
    }

    /// Returns the relation if it still carries undecided weapons.
    fn resolve_relation(&mut self, mut rel: PendingRelation) -> Option<PendingRelation> {
        rel.delta += self.strip_known(&mut rel.only_old) as i64;
        rel.delta -= self.strip_known(&mut rel.only_new) as i64;

        if rel.only_old.is_empty() && rel.only_new.is_empty() {
            return None;
        }
        if rel.only_old.len() as i64 == -rel.delta {
            self.mark_correct(&rel.only_old);
            self.mark_incorrect(&rel.only_new);
            return None;
        }
        if rel.only_new.len() as i64 == rel.delta {
            self.mark_correct(&rel.only_new);
            self.mark_incorrect(&rel.only_old);
            return None;
        }
        Some(rel)
    }

    fn resolve_observation(&mut self, mut obs: Observation) -> Option<Observation> {
        let known_correct = self.strip_known(&mut obs.weapons);
        obs.correct = obs.correct.saturating_sub(known_correct);

        if obs.correct == 0 {
            self.mark_incorrect(&obs.weapons);
            return None;
        }
        if obs.correct == obs.weapons.len() {
            self.mark_correct(&obs.weapons);
            return None;
        }
        Some(obs)
    }

    /// Drop decided weapons from `weapons`; returns how many were correct.
    fn strip_known(&self, weapons: &mut BTreeSet<Weapon>) -> usize {
        let mut known_correct = 0;
        weapons.retain(|&w| match self.status[w] {
            WeaponStatus::Correct => {
                known_correct += 1;
                false
            }
            WeaponStatus::Incorrect => false,
            WeaponStatus::Unknown => true,
        });
        known_correct
    }

    fn mark_correct(&mut self, weapons: &BTreeSet<Weapon>) {
        for &w in weapons {
            if self.status[w] == WeaponStatus::Unknown {
                self.status[w] = WeaponStatus::Correct;
                self.unknown.remove(&w);
                self.correct.insert(w);
            }
        }
    }

    fn mark_incorrect(&mut self, weapons: &BTreeSet<Weapon>) {
        for &w in weapons {
            if self.status[w] == WeaponStatus::Unknown {
                self.status[w] = WeaponStatus::Incorrect;
                self.unknown.remove(&w);
            }
        }
    }

    /// Apply the counting shortcuts and report completeness.
    ///
    /// When the undecided weapons are exactly as many as the missing correct
    /// ones, they are all correct; when nothing is missing, they are all
    /// incorrect. Both take an owned snapshot of `unknown`, since marking
    /// drains it.
    fn finish(&mut self) -> bool {
        let missing = self.num_opponents.saturating_sub(self.correct.len());
        if missing > 0 && self.unknown.len() == missing {
            let rest = self.unknown.clone();
            self.mark_correct(&rest);
        } else if missing == 0 && !self.unknown.is_empty() {
            let rest = self.unknown.clone();
            self.mark_incorrect(&rest);
        }
        if self.is_complete() {
            self.observations.clear();
            self.relations.clear();
        }
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.correct.len() == self.num_opponents
    }

    pub fn correct_weapons(&self) -> Vec<Weapon> {
        self.correct.iter().copied().collect()
    }

    pub fn unknown_weapons(&self) -> Vec<Weapon> {
        self.unknown.iter().copied().collect()
    }

    pub fn incorrect_weapons(&self) -> Vec<Weapon> {
        (0..self.num_weapons)
            .filter(|&w| self.status[w] == WeaponStatus::Incorrect)
            .collect()
    }

    pub fn status(&self, weapon: Weapon) -> Option<WeaponStatus> {
        self.status.get(weapon).copied()
    }

    /// Correct weapons still missing from `correct_weapons()`.
    pub fn missing(&self) -> usize {
        self.num_opponents.saturating_sub(self.correct.len())
    }

    pub fn reset(&mut self) {
        self.status = vec![WeaponStatus::Unknown; self.num_weapons];
        self.correct.clear();
        self.unknown = (0..self.num_weapons).collect();
        self.observations.clear();
        self.relations.clear();
    }
}
