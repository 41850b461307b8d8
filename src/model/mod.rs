pub mod ability;
pub mod battle;
pub mod unit;

pub use ability::{Ability, AbilityInstance, Effect, TargetKind, Trigger};
pub use battle::{Battle, Winner};
pub use unit::{Player, Unit, UnitId, UnitSpec};
