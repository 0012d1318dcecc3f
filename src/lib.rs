//! Code breaker for the generalized Mastermind "Gladiator" game.
//!
//! A secret is `num_opponents` distinct weapons out of `num_weapons`, in
//! order. Each guess is answered with how many weapons are right and how many
//! of those sit in the right slot. [`engine::GuessEngine`] proposes guesses,
//! switching between six strategies as the search space shrinks.
//!
//! The same crate builds natively and for WASM; the browser binding exposes a
//! `GladiatorEngine` class. Weapons cross the boundary as `Uint32Array`.

pub mod clock;
pub mod combinatorics;
pub mod config;
pub mod deduction;
pub mod engine;
pub mod error;
pub mod events;
pub mod minimax;
pub mod pool;
pub mod rng;
pub mod simulate;
pub mod types;

pub use config::SolverConfig;
pub use engine::{GuessEngine, Tier};
pub use error::EngineError;
pub use types::{Response, Weapon};

// ─── WASM Exports (only compiled for wasm32 target) ─────────────────────────

#[cfg(target_arch = "wasm32")]
mod wasm_exports {
    use wasm_bindgen::prelude::*;

    use crate::config::SolverConfig;
    use crate::engine::GuessEngine;
    use crate::types::{Response, Weapon};

    fn to_weapons(ids: &[u32]) -> Vec<Weapon> {
        ids.iter().map(|&w| w as Weapon).collect()
    }

    /// One engine per `(numWeapons, numOpponents)`; call `reset()` between
    /// rounds.
    #[wasm_bindgen(js_name = "GladiatorEngine")]
    pub struct WasmGladiatorEngine {
        inner: GuessEngine,
    }

    #[wasm_bindgen(js_class = "GladiatorEngine")]
    impl WasmGladiatorEngine {
        /// `config` is an optional plain object of camelCase `SolverConfig`
        /// fields; missing fields take their defaults.
        #[wasm_bindgen(constructor)]
        pub fn new(num_weapons: usize, num_opponents: usize, config: JsValue) -> Result<WasmGladiatorEngine, JsError> {
            let config: SolverConfig = if config.is_undefined() || config.is_null() {
                SolverConfig::default()
            } else {
                serde_wasm_bindgen::from_value(config)?
            };
            let inner = GuessEngine::with_config(num_weapons, num_opponents, config)?;
            Ok(Self { inner })
        }

        #[wasm_bindgen(js_name = "nextGuess")]
        pub fn next_guess(&self) -> Result<Vec<u32>, JsError> {
            let guess = self.inner.next_guess()?;
            Ok(guess.into_iter().map(|w| w as u32).collect())
        }

        pub fn update(&mut self, weapons_correct: usize, positions_correct: usize) -> Result<(), JsError> {
            self.inner.update(weapons_correct, positions_correct)?;
            Ok(())
        }

        pub fn reset(&mut self) -> Result<(), JsError> {
            self.inner.reset()?;
            Ok(())
        }

        pub fn tier(&self) -> u8 {
            self.inner.tier().index()
        }

        /// Remaining candidates, or `undefined` while weapons are still
        /// being deduced.
        #[wasm_bindgen(js_name = "poolSize")]
        pub fn pool_size(&self) -> Option<f64> {
            self.inner.pool_size().map(|size| size as f64)
        }

        /// Drain the event log as an array of plain objects.
        #[wasm_bindgen(js_name = "getEvents")]
        pub fn get_events(&mut self) -> Result<JsValue, JsError> {
            let events = self.inner.drain_events();
            Ok(serde_wasm_bindgen::to_value(&events)?)
        }
    }

    /// Score a guess against a secret.
    /// Returns JS object `{ weaponsCorrect, positionsCorrect }`.
    #[wasm_bindgen(js_name = "scoreGuess")]
    pub fn wasm_score_guess(guess: &[u32], secret: &[u32]) -> Result<JsValue, JsError> {
        let reply = Response::score(&to_weapons(guess), &to_weapons(secret));
        let obj = js_sys::Object::new();
        js_sys::Reflect::set(&obj, &"weaponsCorrect".into(), &(reply.weapons_correct as u32).into())
            .map_err(|_| JsError::new("failed to build reply object"))?;
        js_sys::Reflect::set(&obj, &"positionsCorrect".into(), &(reply.positions_correct as u32).into())
            .map_err(|_| JsError::new("failed to build reply object"))?;
        Ok(obj.into())
    }

    /// Ping function to verify WASM is loaded.
    #[wasm_bindgen(js_name = "ping")]
    pub fn wasm_ping() -> String {
        "WASM gladiator solver ready".to_string()
    }
}
