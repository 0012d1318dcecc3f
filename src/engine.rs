//! Adaptive guess strategy: a six-tier state machine.
//!
//! The tier is chosen from the size of the remaining search space and only
//! ever moves up during a round:
//!
//! | Tier | Pool | Guess selection |
//! |---|---|---|
//! | 0 | not materialized, weapon deduction | sampled minimax over random weapon sets |
//! | 1 | combinations | minimax on a random pool subset |
//! | 2 | combinations (small) | exact minimax |
//! | 3 | one combination, too many orderings | unsupported |
//! | 4 | grouped permutations | minimax on a random pool subset |
//! | 5 | grouped permutations (small) | exact minimax |
//!
//! Each `update()` runs inside two wall-clock budgets measured from its
//! start: re-filtering a freshly materialized pool against the full history
//! may use `update_timeout_ms`, and guess search gets what is left up to
//! `guess_timeout_ms`. A re-filter that runs out of time is resumed at the
//! next update, before the newest reply is applied.

use std::collections::BTreeSet;

use crate::clock::{Deadline, Stopwatch};
use crate::combinatorics::{
    combinations_containing, count_combinations, count_permutations, generate_combinations,
    generate_grouped_permutations, PermutationGroup,
};
use crate::config::SolverConfig;
use crate::deduction::WeaponDeduction;
use crate::error::EngineError;
use crate::events::{EventKind, SolverEvent};
use crate::minimax::{select_exhaustive, select_sampled, Buckets, Search};
use crate::pool::{CandidatePool, Feedback, Refilter};
use crate::rng::GuessRng;
use crate::types::{validate_dimensions, Combination, Permutation, Response, Weapon};

const UNSUPPORTED_POSITIONS: &str =
    "every weapon is known but its orderings are too many to enumerate; no position solver exists";

/// Active solving strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    WeaponDeduction = 0,
    ApproximateCombinations = 1,
    OptimalCombinations = 2,
    PositionSolver = 3,
    ApproximatePermutations = 4,
    OptimalPermutations = 5,
}

impl Tier {
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Code breaker for one secret at a time. Construct once per
/// `(num_weapons, num_opponents)` and call `reset()` between rounds.
pub struct GuessEngine {
    num_weapons: usize,
    num_opponents: usize,
    num_combinations: u64,
    /// `num_opponents!`, the group size of every permutation group.
    orderings_per_combination: u64,
    config: SolverConfig,
    rng: GuessRng,
    tier: Tier,
    pool: CandidatePool,
    deduction: WeaponDeduction,
    history: Vec<Feedback>,
    next_guess: Permutation,
    refilter: Refilter,
    clock: Stopwatch,
    events: Vec<SolverEvent>,
}

impl GuessEngine {
    pub fn new(num_weapons: usize, num_opponents: usize) -> Result<Self, EngineError> {
        Self::with_config(num_weapons, num_opponents, SolverConfig::default())
    }

    /// Fails with `InvalidInput` for bad dimensions or config, and with
    /// `Unsupported` when the very first tier would be the position solver.
    pub fn with_config(
        num_weapons: usize,
        num_opponents: usize,
        config: SolverConfig,
    ) -> Result<Self, EngineError> {
        validate_dimensions(num_weapons, num_opponents)?;
        config.validate()?;

        let mut engine = Self {
            num_weapons,
            num_opponents,
            num_combinations: count_combinations(num_weapons, num_opponents),
            orderings_per_combination: count_permutations(num_opponents, num_opponents),
            rng: GuessRng::from_optional_seed(config.seed),
            config,
            tier: Tier::WeaponDeduction,
            pool: CandidatePool::Unmaterialized,
            deduction: WeaponDeduction::new(num_weapons, num_opponents),
            history: Vec::new(),
            next_guess: (0..num_opponents).collect(),
            refilter: Refilter::Done,
            clock: Stopwatch::start(),
            events: Vec::new(),
        };
        engine.initialize()?;
        Ok(engine)
    }

    /// Fresh round state. The first guess is always `[0, 1, .., n-1]`.
    fn initialize(&mut self) -> Result<(), EngineError> {
        self.clock = Stopwatch::start();
        self.rng = GuessRng::from_optional_seed(self.config.seed);
        self.tier = Tier::WeaponDeduction;
        self.pool = CandidatePool::Unmaterialized;
        self.deduction.reset();
        self.history.clear();
        self.next_guess = (0..self.num_opponents).collect();
        self.refilter = Refilter::Done;
        self.events.clear();

        if self.num_combinations < self.config.approximate_cutoff {
            let combos = generate_combinations(self.num_weapons, self.num_opponents);
            self.install_combinations(combos);
        }
        self.escalate()?;
        Ok(())
    }

    /// Start a new round with the same dimensions and config.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        self.initialize()
    }

    /// The guess to submit next.
    pub fn next_guess(&self) -> Result<Permutation, EngineError> {
        if self.tier == Tier::PositionSolver {
            return Err(EngineError::Unsupported(UNSUPPORTED_POSITIONS));
        }
        Ok(self.next_guess.clone())
    }

    /// Feed the reply to the last guess from `next_guess()` and compute the
    /// following one.
    ///
    /// Replies must arrive in order, one per submitted guess. Out-of-range
    /// counts are rejected before any state changes.
    pub fn update(&mut self, weapons_correct: usize, positions_correct: usize) -> Result<(), EngineError> {
        if self.tier == Tier::PositionSolver {
            return Err(EngineError::Unsupported(UNSUPPORTED_POSITIONS));
        }
        if weapons_correct > self.num_opponents {
            return Err(EngineError::invalid(format!(
                "weapons correct {} exceeds {} opponents",
                weapons_correct, self.num_opponents
            )));
        }
        if positions_correct > weapons_correct {
            return Err(EngineError::invalid(format!(
                "positions correct {} exceeds weapons correct {}",
                positions_correct, weapons_correct
            )));
        }

        self.clock = Stopwatch::start();
        let update_deadline = self.clock.deadline(self.config.update_timeout_ms);
        let guess_deadline = self.clock.deadline(self.config.guess_timeout_ms);

        let guess = self.next_guess.clone();
        let response = Response::new(weapons_correct, positions_correct);
        self.history.push(Feedback {
            guess: guess.clone(),
            response,
        });

        // Older replies still owed to the pool go first; the newest reply is
        // applied after them even if they do not all fit in the budget.
        if let Refilter::Paused { next_index } = self.refilter {
            self.record(EventKind::RefilterResumed {
                from_index: next_index,
            });
            let newest = self.history.len() - 1;
            self.refilter = self.replay(next_index, newest, &update_deadline)?;
        }

        self.apply(&guess, response, &update_deadline)?;
        self.next_guess = self.choose_guess(&guess_deadline);
        Ok(())
    }

    /// Apply one reply to the active knowledge and escalate if possible.
    fn apply(&mut self, guess: &[Weapon], response: Response, deadline: &Deadline) -> Result<(), EngineError> {
        let materialized = match self.pool {
            CandidatePool::Unmaterialized => self.learn_weapons(guess, response)?,
            _ => {
                self.pool.filter(guess, response);
                false
            }
        };
        let rematerialized = self.escalate()?;

        if materialized || rematerialized {
            // A new pool knows nothing yet: bring it up to date with every
            // reply of the round.
            let end = self.history.len();
            self.refilter = self.replay(0, end, deadline)?;
        }
        if self.pool.is_empty() {
            self.record(EventKind::PoolExhausted);
        }
        Ok(())
    }

    /// Tier 0 update. Materializes the combination pool once deduction has
    /// narrowed it below the cutoff; returns whether it did.
    fn learn_weapons(&mut self, guess: &[Weapon], response: Response) -> Result<bool, EngineError> {
        self.deduction.learn(guess, response.weapons_correct)?;

        let correct = self.deduction.correct_weapons();
        let unknown = self.deduction.unknown_weapons();
        let remaining = count_combinations(unknown.len(), self.deduction.missing());
        if remaining >= self.config.approximate_cutoff {
            return Ok(false);
        }

        let combos = combinations_containing(&correct, &unknown, self.num_opponents);
        self.install_combinations(combos);
        Ok(true)
    }

    fn install_combinations(&mut self, combos: Vec<Combination>) {
        self.pool = CandidatePool::Combinations(combos);
        self.record_materialized();
    }

    fn record_materialized(&mut self) {
        if let (Some(kind), Some(size)) = (self.pool.kind(), self.pool.size()) {
            self.record(EventKind::PoolMaterialized { kind, size });
        }
    }

    /// Filter `history[from..end]` into the pool, escalating afterwards. If
    /// escalation swaps the combination pool for permutations, the new pool
    /// is replayed from the start.
    fn replay(&mut self, from: usize, end: usize, deadline: &Deadline) -> Result<Refilter, EngineError> {
        let mut index = from;
        loop {
            while index < end {
                if deadline.expired() {
                    self.record(EventKind::RefilterPaused { next_index: index });
                    return Ok(Refilter::Paused { next_index: index });
                }
                let feedback = &self.history[index];
                self.pool.filter(&feedback.guess, feedback.response);
                index += 1;
            }
            if !self.escalate()? {
                return Ok(Refilter::Done);
            }
            index = 0;
        }
    }

    /// Convert a small enough combination pool into grouped permutations and
    /// raise the tier to match the pool. Returns whether the pool was
    /// replaced. Entering the position-solver tier is a hard failure.
    fn escalate(&mut self) -> Result<bool, EngineError> {
        let mut rematerialized = false;
        if let CandidatePool::Combinations(combos) = &self.pool {
            let orderings = (combos.len() as u64).saturating_mul(self.orderings_per_combination);
            if orderings < self.config.approximate_cutoff {
                let groups = generate_grouped_permutations(combos, self.num_opponents);
                self.pool = CandidatePool::Permutations(groups);
                self.record_materialized();
                rematerialized = true;
            }
        }

        let target = self.tier_for_pool();
        if target > self.tier {
            self.record(EventKind::TierEscalated {
                from: self.tier.index(),
                to: target.index(),
            });
            self.tier = target;
        }
        if self.tier == Tier::PositionSolver {
            self.record(EventKind::Unsupported);
            return Err(EngineError::Unsupported(UNSUPPORTED_POSITIONS));
        }
        Ok(rematerialized)
    }

    fn tier_for_pool(&self) -> Tier {
        let optimal = self.config.optimal_cutoff;
        match &self.pool {
            CandidatePool::Unmaterialized => Tier::WeaponDeduction,
            CandidatePool::Combinations(combos) if combos.len() == 1 => Tier::PositionSolver,
            CandidatePool::Combinations(combos) if (combos.len() as u64) < optimal => {
                Tier::OptimalCombinations
            }
            CandidatePool::Combinations(_) => Tier::ApproximateCombinations,
            CandidatePool::Permutations(_) => {
                if self.pool.size().unwrap_or(0) < optimal {
                    Tier::OptimalPermutations
                } else {
                    Tier::ApproximatePermutations
                }
            }
        }
    }

    // ─── Guess selection ────────────────────────────────────────────────────

    fn choose_guess(&mut self, deadline: &Deadline) -> Permutation {
        let search = match self.tier {
            Tier::WeaponDeduction => self.weapon_guess(deadline),
            Tier::ApproximateCombinations => self.combination_approx_guess(deadline),
            Tier::OptimalCombinations => self.combination_exact_guess(deadline),
            Tier::ApproximatePermutations => self.permutation_approx_guess(deadline),
            Tier::OptimalPermutations => self.permutation_exact_guess(deadline),
            Tier::PositionSolver => Search {
                best: None,
                scored: 0,
                truncated: false,
            },
        };

        let exact = matches!(self.tier, Tier::OptimalCombinations | Tier::OptimalPermutations);
        if exact && search.truncated {
            self.record(EventKind::GuessSearchTruncated {
                scored: search.scored,
            });
        }

        match search.best {
            Some(best) => {
                let mut guess = best.guess;
                // Combination tiers carry no position information.
                if self.tier < Tier::PositionSolver {
                    self.rng.shuffle(&mut guess);
                }
                guess
            }
            None => {
                self.record(EventKind::RandomFallback);
                self.random_guess()
            }
        }
    }

    /// Tier 0: spend a quarter of the remaining time drawing random weapon
    /// sets consistent with the deduction, then score random guesses against
    /// that sample. Known-correct weapons are always included.
    fn weapon_guess(&mut self, deadline: &Deadline) -> Search<Permutation> {
        let correct = self.deduction.correct_weapons();
        let unknown = self.deduction.unknown_weapons();
        let missing = self.deduction.missing();
        if missing == 0 || unknown.len() < missing {
            return Search {
                best: None,
                scored: 0,
                truncated: false,
            };
        }

        let sampling_deadline = self.clock.split(*deadline, 0.25);
        let mut sample: BTreeSet<Combination> = BTreeSet::new();
        loop {
            let before = sample.len();
            for _ in 0..self.config.weapon_sample_batch {
                let mut combo = self.rng.sample(&unknown, missing);
                combo.sort_unstable();
                sample.insert(combo);
            }
            let saturated = sample.len() == before;
            if saturated || sample.len() >= self.config.weapon_sample_limit || sampling_deadline.expired() {
                break;
            }
        }
        let sample: Vec<Combination> = sample.into_iter().collect();

        let rng = &mut self.rng;
        let mut buckets = Buckets::new(self.num_opponents);
        let search = select_sampled(
            || Some(rng.sample(&unknown, missing)),
            self.config.sampled_guess_limit,
            deadline,
            |guess| buckets.combination_worst_case(guess, &sample),
        );
        search.map(|partial| partial.into_iter().chain(correct.iter().copied()).collect())
    }

    /// Tier 1: random guesses from the pool scored against a random subset.
    fn combination_approx_guess(&mut self, deadline: &Deadline) -> Search<Permutation> {
        let CandidatePool::Combinations(combos) = &self.pool else {
            return self.empty_search();
        };
        let rng = &mut self.rng;
        let subset = rng.sample(combos, self.config.combination_sample_size);
        let mut buckets = Buckets::new(self.num_opponents);
        select_sampled(
            || rng.choose(combos).cloned(),
            self.config.sampled_guess_limit,
            deadline,
            |guess| buckets.combination_worst_case(guess, &subset),
        )
    }

    /// Tier 2: every pool member scored against the whole pool.
    fn combination_exact_guess(&mut self, deadline: &Deadline) -> Search<Permutation> {
        let CandidatePool::Combinations(combos) = &self.pool else {
            return self.empty_search();
        };
        let mut buckets = Buckets::new(self.num_opponents);
        select_exhaustive(combos.iter(), deadline, |guess| {
            buckets.combination_worst_case(guess, combos)
        })
        .map(|guess| guess.clone())
    }

    /// Tier 4: random pool members scored against a sample of groups, each
    /// thinned to a share of the permutation sample.
    fn permutation_approx_guess(&mut self, deadline: &Deadline) -> Search<Permutation> {
        let CandidatePool::Permutations(groups) = &self.pool else {
            return self.empty_search();
        };
        if groups.is_empty() {
            return self.empty_search();
        }
        let rng = &mut self.rng;
        let group_count = self.config.permutation_group_sample.min(groups.len());
        let per_group =
            ((self.config.permutation_sample_size as f64 / group_count as f64).round() as usize).max(1);
        let subset: Vec<PermutationGroup> = rng
            .sample_indices(groups.len(), group_count)
            .into_iter()
            .map(|i| PermutationGroup {
                combination: groups[i].combination.clone(),
                permutations: rng.sample(&groups[i].permutations, per_group),
            })
            .collect();

        let mut buckets = Buckets::new(self.num_opponents);
        select_sampled(
            || {
                rng.choose(groups)
                    .and_then(|group| rng.choose(&group.permutations))
                    .cloned()
            },
            self.config.sampled_guess_limit,
            deadline,
            |guess| buckets.permutation_worst_case(guess, &subset),
        )
    }

    /// Tier 5: every remaining permutation scored against all of them.
    fn permutation_exact_guess(&mut self, deadline: &Deadline) -> Search<Permutation> {
        let CandidatePool::Permutations(groups) = &self.pool else {
            return self.empty_search();
        };
        let mut buckets = Buckets::new(self.num_opponents);
        let candidates = groups.iter().flat_map(|group| group.permutations.iter());
        select_exhaustive(candidates, deadline, |guess| {
            buckets.permutation_worst_case(guess, groups)
        })
        .map(|guess| guess.clone())
    }

    fn empty_search(&self) -> Search<Permutation> {
        Search {
            best: None,
            scored: 0,
            truncated: false,
        }
    }

    /// Last resort: a random pool member if one exists, otherwise a random
    /// guess holding every weapon already known to be correct.
    fn random_guess(&mut self) -> Permutation {
        let from_pool = match &self.pool {
            CandidatePool::Unmaterialized => None,
            CandidatePool::Combinations(combos) => self.rng.choose(combos).cloned(),
            CandidatePool::Permutations(groups) => {
                let rng = &mut self.rng;
                rng.choose(groups)
                    .and_then(|group| rng.choose(&group.permutations))
                    .cloned()
            }
        };
        let mut guess = match from_pool {
            Some(guess) => guess,
            None => {
                let mut guess = self.deduction.correct_weapons();
                guess.truncate(self.num_opponents);
                let unknown = self.deduction.unknown_weapons();
                let missing = self.num_opponents - guess.len();
                if unknown.len() >= missing {
                    guess.extend(self.rng.sample(&unknown, missing));
                } else {
                    guess.extend(unknown);
                    let others: Vec<Weapon> =
                        (0..self.num_weapons).filter(|w| !guess.contains(w)).collect();
                    let short = self.num_opponents - guess.len();
                    guess.extend(self.rng.sample(&others, short));
                }
                guess
            }
        };
        if !matches!(self.pool, CandidatePool::Permutations(_)) {
            self.rng.shuffle(&mut guess);
        }
        guess
    }

    fn record(&mut self, kind: EventKind) {
        self.events.push(SolverEvent {
            update_index: self.history.len(),
            tier: self.tier.index(),
            elapsed_ms: self.clock.elapsed_ms(),
            kind,
        });
    }

    // ─── Introspection ──────────────────────────────────────────────────────

    pub fn num_weapons(&self) -> usize {
        self.num_weapons
    }

    pub fn num_opponents(&self) -> usize {
        self.num_opponents
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn pool(&self) -> &CandidatePool {
        &self.pool
    }

    /// Size of the materialized pool (combinations or total permutations).
    pub fn pool_size(&self) -> Option<u64> {
        self.pool.size()
    }

    pub fn history(&self) -> &[Feedback] {
        &self.history
    }

    /// Tier-0 deduction state. Only fed while the pool is unmaterialized.
    pub fn weapon_knowledge(&self) -> &WeaponDeduction {
        &self.deduction
    }

    /// Whether a re-filter is waiting to resume at the next update.
    pub fn refilter_pending(&self) -> bool {
        matches!(self.refilter, Refilter::Paused { .. })
    }

    pub fn events(&self) -> &[SolverEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SolverEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::random_secret;
    use crate::types::{validate_guess, weapons_correct};

    fn fast_engine(num_weapons: usize, num_opponents: usize) -> GuessEngine {
        GuessEngine::with_config(num_weapons, num_opponents, SolverConfig::fast(11)).unwrap()
    }

    /// Lower materialization cutoff so the weapon tier hands over early.
    fn small_cutoff(seed: u64) -> SolverConfig {
        SolverConfig {
            approximate_cutoff: 100_000,
            ..SolverConfig::fast(seed)
        }
    }

    #[test]
    fn test_first_guess_is_identity() {
        let engine = fast_engine(10, 4);
        assert_eq!(engine.next_guess().unwrap(), vec![0, 1, 2, 3]);
        assert!(engine.history().is_empty());
    }

    #[test]
    fn test_initial_tiers() {
        // 5 * 4 = 20 permutations: exact permutation search immediately.
        assert_eq!(fast_engine(5, 2).tier(), Tier::OptimalPermutations);
        // C(30,5) = 142506 combos, 17M permutations.
        assert_eq!(fast_engine(30, 5).tier(), Tier::ApproximateCombinations);
        // C(25,4) = 12650 combos but 303600 permutations.
        assert_eq!(fast_engine(25, 4).tier(), Tier::ApproximatePermutations);
        // C(60,6) = 50M combos.
        assert_eq!(fast_engine(60, 6).tier(), Tier::WeaponDeduction);
    }

    #[test]
    fn test_position_solver_is_unsupported() {
        // 11 weapons, 11 opponents: one combination, 11! > 4M orderings.
        let err = GuessEngine::with_config(11, 11, SolverConfig::fast(1)).err();
        assert!(matches!(err, Some(EngineError::Unsupported(_))));
    }

    #[test]
    fn test_position_solver_reached_by_update() {
        // 12 weapons, 11 opponents: 12 combinations, so the pool starts as
        // combinations. The reply [0..11) -> 11 correct pins the set.
        let mut engine = fast_engine(12, 11);
        assert_eq!(engine.tier(), Tier::OptimalCombinations);
        let err = engine.update(11, 0);
        assert!(matches!(err, Err(EngineError::Unsupported(_))));
        assert_eq!(engine.tier(), Tier::PositionSolver);
        assert!(matches!(engine.next_guess(), Err(EngineError::Unsupported(_))));
        assert!(matches!(engine.update(0, 0), Err(EngineError::Unsupported(_))));
        assert!(engine
            .events()
            .iter()
            .any(|e| e.kind == EventKind::Unsupported));

        engine.reset().unwrap();
        assert_eq!(engine.tier(), Tier::OptimalCombinations);
        assert_eq!(engine.next_guess().unwrap(), (0..11).collect::<Vec<_>>());
    }

    #[test]
    fn test_invalid_dimensions_and_config() {
        assert!(matches!(GuessEngine::new(0, 0), Err(EngineError::InvalidInput(_))));
        assert!(matches!(GuessEngine::new(3, 4), Err(EngineError::InvalidInput(_))));
        let bad = SolverConfig {
            update_timeout_ms: 500,
            guess_timeout_ms: 100,
            ..SolverConfig::default()
        };
        assert!(matches!(
            GuessEngine::with_config(10, 3, bad),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invalid_update_leaves_state() {
        let mut engine = fast_engine(6, 3);
        let pool_before = engine.pool_size();
        assert!(matches!(engine.update(4, 0), Err(EngineError::InvalidInput(_))));
        assert!(matches!(engine.update(1, 2), Err(EngineError::InvalidInput(_))));
        assert!(engine.history().is_empty());
        assert_eq!(engine.pool_size(), pool_before);
        assert_eq!(engine.next_guess().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_guesses_are_valid_and_pool_shrinks() {
        let secret = vec![4, 1, 6, 3];
        let mut engine = fast_engine(8, 4);
        let mut last = engine.pool_size().unwrap();
        for _ in 0..12 {
            let guess = engine.next_guess().unwrap();
            validate_guess(&guess, 8, 4).unwrap();
            let reply = Response::score(&guess, &secret);
            if reply.is_win(4) {
                break;
            }
            engine.update(reply.weapons_correct, reply.positions_correct).unwrap();
            let size = engine.pool_size().unwrap();
            assert!(size <= last);
            assert!(engine.pool().contains(&secret));
            last = size;
        }
    }

    #[test]
    fn test_winning_reply_leaves_only_secret() {
        let mut engine = fast_engine(7, 3);
        let secret = engine.next_guess().unwrap();
        engine.update(3, 3).unwrap();
        assert_eq!(engine.pool_size(), Some(1));
        assert!(engine.pool().contains(&secret));
        assert_eq!(engine.next_guess().unwrap(), secret);
    }

    #[test]
    fn test_combination_tier_escalates_to_permutations() {
        // C(30,5) combinations start in tier 1; a few replies must push the
        // pool under the permutation cutoff and replay the whole history.
        let secret = vec![7, 21, 2, 14, 29];
        let mut engine = fast_engine(30, 5);
        assert_eq!(engine.tier(), Tier::ApproximateCombinations);

        let mut tiers = vec![engine.tier()];
        for _ in 0..15 {
            let guess = engine.next_guess().unwrap();
            let reply = Response::score(&guess, &secret);
            if reply.is_win(5) {
                break;
            }
            engine.update(reply.weapons_correct, reply.positions_correct).unwrap();
            tiers.push(engine.tier());
            if !engine.refilter_pending() {
                assert!(engine.pool().contains(&secret));
            }
        }
        assert!(tiers.windows(2).all(|w| w[0] <= w[1]));
        assert!(engine.tier() >= Tier::ApproximatePermutations);
        assert!(engine
            .events()
            .iter()
            .any(|e| matches!(e.kind, EventKind::TierEscalated { .. })));
    }

    #[test]
    fn test_weapon_tier_materializes_after_deduction() {
        let secret = vec![3, 17, 40, 52, 8, 61];
        let mut engine = GuessEngine::with_config(64, 6, small_cutoff(4)).unwrap();
        assert_eq!(engine.tier(), Tier::WeaponDeduction);
        assert_eq!(engine.pool_size(), None);

        for _ in 0..60 {
            let guess = engine.next_guess().unwrap();
            validate_guess(&guess, 64, 6).unwrap();
            let reply = Response::score(&guess, &secret);
            if reply.is_win(6) {
                return;
            }
            engine.update(reply.weapons_correct, reply.positions_correct).unwrap();
            let known = engine.weapon_knowledge();
            for w in known.correct_weapons() {
                assert!(secret.contains(&w));
            }
            if engine.tier() > Tier::WeaponDeduction {
                break;
            }
        }
        assert!(engine.tier() > Tier::WeaponDeduction);
        assert!(engine.pool_size().is_some());
    }

    /// Every pool member gives the recorded reply to every past guess.
    fn pool_matches_history(engine: &GuessEngine) -> bool {
        let history = engine.history();
        match engine.pool() {
            CandidatePool::Unmaterialized => false,
            CandidatePool::Combinations(combos) => combos.iter().all(|combo| {
                history
                    .iter()
                    .all(|f| weapons_correct(&f.guess, combo) == f.response.weapons_correct)
            }),
            CandidatePool::Permutations(groups) => groups
                .iter()
                .flat_map(|group| group.permutations.iter())
                .all(|perm| history.iter().all(|f| Response::score(&f.guess, perm) == f.response)),
        }
    }

    #[test]
    fn test_paused_refilter_completes_on_later_updates() {
        // A few milliseconds cannot cover a multi-million pool against the
        // whole history, so materialization pauses and later updates finish it.
        let config = SolverConfig {
            update_timeout_ms: 3,
            guess_timeout_ms: 60,
            approximate_cutoff: 3_000_000,
            ..SolverConfig::fast(5)
        };
        let mut engine = GuessEngine::with_config(64, 6, config).unwrap();
        let mut rng = GuessRng::from_seed(31);
        let mut paused_seen = false;
        let mut completed = false;

        for _ in 0..4 {
            engine.reset().unwrap();
            let secret = random_secret(64, 6, &mut rng).unwrap();
            let mut was_pending = false;
            for _ in 0..80 {
                let guess = engine.next_guess().unwrap();
                let reply = Response::score(&guess, &secret);
                if reply.is_win(6) {
                    break;
                }
                engine.update(reply.weapons_correct, reply.positions_correct).unwrap();

                let pending = engine.refilter_pending();
                if pending {
                    paused_seen = true;
                } else if was_pending {
                    assert!(pool_matches_history(&engine));
                    assert!(engine.pool().contains(&secret));
                    assert!(engine
                        .events()
                        .iter()
                        .any(|e| matches!(e.kind, EventKind::RefilterResumed { .. })));
                    completed = true;
                    break;
                }
                was_pending = pending;
            }
            if completed {
                break;
            }
        }
        assert!(paused_seen, "re-filter never paused");
        assert!(completed, "paused re-filter never completed");
    }

    #[test]
    fn test_timeout_fallback_keeps_known_correct_weapons() {
        let mut engine = fast_engine(80, 6);
        assert_eq!(engine.tier(), Tier::WeaponDeduction);
        // One of 0..6 is correct and none of 1..7 is, which pins weapon 0.
        engine.deduction.learn(&[0, 1, 2, 3, 4, 5], 1).unwrap();
        engine.deduction.learn(&[1, 2, 3, 4, 5, 6], 0).unwrap();
        let correct = engine.weapon_knowledge().correct_weapons();
        assert_eq!(correct, vec![0]);

        for _ in 0..20 {
            let expired = Stopwatch::start().deadline(0);
            let guess = engine.choose_guess(&expired);
            validate_guess(&guess, 80, 6).unwrap();
            assert!(correct.iter().all(|w| guess.contains(w)));
        }
        let fallbacks = engine
            .events()
            .iter()
            .filter(|e| e.kind == EventKind::RandomFallback)
            .count();
        assert_eq!(fallbacks, 20);
    }

    #[test]
    fn test_reset_matches_fresh_engine() {
        let secret = vec![2, 9, 5];
        let mut played = fast_engine(10, 3);
        for _ in 0..3 {
            let guess = played.next_guess().unwrap();
            let reply = Response::score(&guess, &secret);
            if reply.is_win(3) {
                break;
            }
            played.update(reply.weapons_correct, reply.positions_correct).unwrap();
        }
        played.reset().unwrap();
        let fresh = fast_engine(10, 3);

        assert_eq!(played.tier(), fresh.tier());
        assert_eq!(played.next_guess().unwrap(), fresh.next_guess().unwrap());
        assert_eq!(played.pool_size(), fresh.pool_size());
        assert!(played.history().is_empty());
    }

    #[test]
    fn test_inconsistent_replies_fall_back_to_random() {
        let mut engine = fast_engine(5, 2);
        // [0,1] cannot both be right and both be wrong.
        engine.update(2, 2).unwrap();
        engine.update(0, 0).unwrap();
        assert_eq!(engine.pool_size(), Some(0));
        let guess = engine.next_guess().unwrap();
        validate_guess(&guess, 5, 2).unwrap();
        let kinds: Vec<_> = engine.drain_events().into_iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&EventKind::PoolExhausted));
        assert!(kinds.contains(&EventKind::RandomFallback));
        assert!(engine.events().is_empty());
    }
}
