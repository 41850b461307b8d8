//! A deterministic hex-grid tactical battle simulation engine.
//!
//! `Battle::new` builds a battle from two armies of unit specs and a seed;
//! `step()` advances one unit's turn at a time, `undo()` reverts the last
//! step, and `winner()`/`last_action()`/`units()` expose read-only views for
//! a host to drive animation or AI around.

pub mod config;
pub mod error_handling;
pub mod events;
pub mod execution;
pub mod hex;
pub mod model;
pub mod pathfind;
pub mod resolution;
pub mod resolvers;
pub mod rng;
pub mod targeting;

pub use config::BattleOptions;
pub use error_handling::{BattleError, GuardViolation};
pub use events::LastAction;
pub use model::{Ability, Battle, Effect, Player, TargetKind, Trigger, Unit, UnitId, UnitSpec, Winner};

impl Battle {
    /// Advance the battle by one unit-turn (§4.7). Returns `false` once the
    /// battle has a `winner`.
    pub fn step(&mut self) -> bool {
        execution::engine::step(self)
    }
}
