//! Local game driver: a secret-holding oracle and the round/game loops.
//!
//! Stands in for the remote challenge server so the engine can be played
//! end to end without a transport. `play_game()` is the multi-round level
//! loop: one engine, `reset()` between secrets.

use crate::engine::GuessEngine;
use crate::error::EngineError;
use crate::rng::GuessRng;
use crate::types::{validate_dimensions, validate_guess, Permutation, Response, Weapon};

/// A uniformly random secret: `num_opponents` distinct weapons in random order.
pub fn random_secret(
    num_weapons: usize,
    num_opponents: usize,
    rng: &mut GuessRng,
) -> Result<Permutation, EngineError> {
    validate_dimensions(num_weapons, num_opponents)?;
    let weapons: Vec<Weapon> = (0..num_weapons).collect();
    Ok(rng.sample(&weapons, num_opponents))
}

/// Score `guess` against `secret` the way the server does.
///
/// Both sides must be distinct weapons below `num_weapons` and of equal length.
pub fn respond(secret: &[Weapon], guess: &[Weapon], num_weapons: usize) -> Result<Response, EngineError> {
    validate_guess(secret, num_weapons, secret.len())?;
    validate_guess(guess, num_weapons, secret.len())?;
    Ok(Response::score(guess, secret))
}

/// Result of one played round.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RoundOutcome {
    /// True if the secret was guessed within the cap.
    pub solved: bool,
    /// Guesses submitted, including the winning one.
    pub guesses: u32,
    /// Tier active when the round ended.
    pub final_tier: u8,
    /// Every guess with its reply, in order.
    pub transcript: Vec<(Permutation, Response)>,
}

/// Play one round against `secret` from the engine's current state.
///
/// Stops on a win or after `max_guesses`. `Unsupported` from the engine ends
/// the round with that error.
pub fn play_round(
    engine: &mut GuessEngine,
    secret: &[Weapon],
    max_guesses: u32,
) -> Result<RoundOutcome, EngineError> {
    let num_weapons = engine.num_weapons();
    let num_opponents = engine.num_opponents();
    validate_guess(secret, num_weapons, num_opponents)?;

    let mut transcript = Vec::new();
    let mut guesses: u32 = 0;

    while guesses < max_guesses {
        let guess = engine.next_guess()?;
        let reply = respond(secret, &guess, num_weapons)?;
        guesses += 1;
        transcript.push((guess, reply));

        if reply.is_win(num_opponents) {
            return Ok(RoundOutcome {
                solved: true,
                guesses,
                final_tier: engine.tier().index(),
                transcript,
            });
        }
        engine.update(reply.weapons_correct, reply.positions_correct)?;
    }

    Ok(RoundOutcome {
        solved: false,
        guesses,
        final_tier: engine.tier().index(),
        transcript,
    })
}

/// Play every secret in turn with the same engine, resetting between rounds.
///
/// Stops at the first round that fails to solve, like a level the server
/// would not let the player pass.
pub fn play_game(
    engine: &mut GuessEngine,
    secrets: &[Permutation],
    max_guesses: u32,
) -> Result<Vec<RoundOutcome>, EngineError> {
    let mut outcomes = Vec::with_capacity(secrets.len());
    for (round, secret) in secrets.iter().enumerate() {
        if round > 0 {
            engine.reset()?;
        }
        let outcome = play_round(engine, secret, max_guesses)?;
        let solved = outcome.solved;
        outcomes.push(outcome);
        if !solved {
            break;
        }
    }
    Ok(outcomes)
}
