//! Structured event log for the strategy engine.
//!
//! Soft conditions (re-filtering cut short, guess search truncated, random
//! fallback) are never returned as errors; they are recorded here so a
//! caller can inspect or forward them.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    TierEscalated { from: u8, to: u8 },
    PoolMaterialized { kind: PoolKind, size: u64 },
    RefilterPaused { next_index: usize },
    RefilterResumed { from_index: usize },
    GuessSearchTruncated { scored: usize },
    RandomFallback,
    PoolExhausted,
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Combinations,
    Permutations,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolverEvent {
    /// Number of responses received this round when the event fired.
    pub update_index: usize,
    /// Active tier, 0 to 5.
    pub tier: u8,
    /// Milliseconds into the current update (or construction/reset).
    pub elapsed_ms: f64,
    #[serde(flatten)]
    pub kind: EventKind,
}
