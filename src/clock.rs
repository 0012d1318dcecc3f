//! Wall-clock budgets that work both natively and under WASM.
//!
//! `std::time::Instant` panics on `wasm32-unknown-unknown`, so the browser
//! build reads `Date.now()` through `js_sys` instead.

/// Milliseconds since an arbitrary, fixed origin.
#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    ORIGIN.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Start time of one `update()` cycle. Every budget is measured from here.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started_ms: f64,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self { started_ms: now_ms() }
    }

    pub fn elapsed_ms(&self) -> f64 {
        now_ms() - self.started_ms
    }

    /// A deadline `budget_ms` after the stopwatch was started.
    pub fn deadline(&self, budget_ms: u64) -> Deadline {
        Deadline {
            at_ms: self.started_ms + budget_ms as f64,
        }
    }

    /// Point reached after spending `fraction` of what remains until `end`.
    pub fn split(&self, end: Deadline, fraction: f64) -> Deadline {
        let now = now_ms();
        let remaining = (end.at_ms - now).max(0.0);
        Deadline {
            at_ms: now + remaining * fraction,
        }
    }
}

/// Cooperative cut-off, polled between loop iterations.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at_ms: f64,
}

impl Deadline {
    #[inline]
    pub fn expired(&self) -> bool {
        now_ms() >= self.at_ms
    }
}
