//! Tunables for the strategy engine.
//!
//! Passed explicitly to the engine. The WASM binding deserializes it from a
//! plain JS object, so every field is optional and camelCase on that side.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolverConfig {
    /// Budget for re-filtering history after a pool is (re)materialized.
    pub update_timeout_ms: u64,
    /// Total budget per update; what re-filtering leaves goes to guess search.
    pub guess_timeout_ms: u64,
    /// Pools smaller than this are materialized.
    pub approximate_cutoff: u64,
    /// Pools smaller than this get exact minimax.
    pub optimal_cutoff: u64,
    /// Pool subset scored against in the sampled combination tier.
    pub combination_sample_size: usize,
    /// Permutation groups sampled in the sampled permutation tier.
    pub permutation_group_sample: usize,
    /// Permutations spread across the sampled groups.
    pub permutation_sample_size: usize,
    /// Combinations drawn per batch while building the weapon-tier sample.
    pub weapon_sample_batch: usize,
    /// Cap on distinct combinations in the weapon-tier sample.
    pub weapon_sample_limit: usize,
    /// Cap on candidate guesses scored by any sampled tier.
    pub sampled_guess_limit: usize,
    /// Fixed RNG seed. Re-applied by `reset()`.
    pub seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            update_timeout_ms: 4_000,
            guess_timeout_ms: 9_000,
            approximate_cutoff: 4_000_000,
            optimal_cutoff: 2_000,
            combination_sample_size: 3_000,
            permutation_group_sample: 50,
            permutation_sample_size: 2_500,
            weapon_sample_batch: 25,
            weapon_sample_limit: 20_000,
            sampled_guess_limit: 20_000,
            seed: None,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        // A paused re-filter only advances with a positive budget.
        if self.update_timeout_ms == 0 {
            return Err(EngineError::invalid("update timeout must be positive"));
        }
        if self.update_timeout_ms >= self.guess_timeout_ms {
            return Err(EngineError::invalid(format!(
                "update timeout ({} ms) must be below guess timeout ({} ms)",
                self.update_timeout_ms, self.guess_timeout_ms
            )));
        }
        if self.optimal_cutoff == 0 || self.optimal_cutoff >= self.approximate_cutoff {
            return Err(EngineError::invalid(format!(
                "cutoffs must satisfy 0 < optimal ({}) < approximate ({})",
                self.optimal_cutoff, self.approximate_cutoff
            )));
        }
        let samples = [
            ("combinationSampleSize", self.combination_sample_size),
            ("permutationGroupSample", self.permutation_group_sample),
            ("permutationSampleSize", self.permutation_sample_size),
            ("weaponSampleBatch", self.weapon_sample_batch),
            ("weaponSampleLimit", self.weapon_sample_limit),
            ("sampledGuessLimit", self.sampled_guess_limit),
        ];
        if let Some((name, _)) = samples.iter().find(|(_, v)| *v == 0) {
            return Err(EngineError::invalid(format!("{} must be positive", name)));
        }
        Ok(())
    }

    /// Short budgets and a fixed seed, for tests and local simulation.
    pub fn fast(seed: u64) -> Self {
        Self {
            update_timeout_ms: 200,
            guess_timeout_ms: 400,
            sampled_guess_limit: 300,
            weapon_sample_limit: 500,
            seed: Some(seed),
            ..Self::default()
        }
    }
}
