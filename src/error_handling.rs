//! Diagnostics split along the three error categories in the design: caller
//! errors (rejected synchronously at construction), runtime guard violations
//! (logged and converted into a draw rather than a panic), and tolerated
//! empty results (not errors at all, handled inline where they occur).
//!
//! Mirrors the teacher's `error_handling.rs`: a hand-rolled enum with a
//! manual `Display` impl rather than a derive macro, plus a small in-battle
//! log so a host without a `log` subscriber can still inspect what happened.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors that can occur while building a `Battle` from unit specs.
/// Construction fails atomically: no partially-built `Battle` is returned.
///
/// Unknown `trigger`/`effect`/`target` strings never reach this type: they
/// fail `serde` deserialization of `Ability` itself (§7), before a caller
/// ever has a typed `UnitSpec` to hand to `Battle::new`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum BattleError {
    InvalidCount { name: String, count: i64 },
    PositionOutOfBounds { name: String, col: i32, row: i32 },
    PositionOccupied { name: String, col: i32, row: i32 },
    TooManyUnits { requested: usize, max: usize },
    EmptyArmy(u8),
}

impl fmt::Display for BattleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleError::InvalidCount { name, count } => {
                write!(f, "unit spec '{name}' has invalid count {count}")
            }
            BattleError::PositionOutOfBounds { name, col, row } => {
                write!(f, "unit spec '{name}' position ({col},{row}) is out of bounds")
            }
            BattleError::PositionOccupied { name, col, row } => {
                write!(f, "unit spec '{name}' position ({col},{row}) is already occupied")
            }
            BattleError::TooManyUnits { requested, max } => {
                write!(f, "requested {requested} units but the board only fits {max}")
            }
            BattleError::EmptyArmy(player) => write!(f, "player {player} has no units"),
        }
    }
}

impl std::error::Error for BattleError {}

/// A single diagnostic entry appended to `Battle::log` when a runtime guard
/// violation is detected mid-battle. These are engine bugs, not caller
/// errors: the battle is marked a draw rather than panicking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuardViolation {
    pub round: u32,
    pub message: String,
}

impl GuardViolation {
    pub fn new(round: u32, message: impl Into<String>) -> Self {
        GuardViolation {
            round,
            message: message.into(),
        }
    }
}

/// Record a guard violation: log it through the `log` facade and return the
/// entry so the caller can push it onto `Battle::log`.
pub fn report_guard_violation(round: u32, message: impl Into<String>) -> GuardViolation {
    let entry = GuardViolation::new(round, message.into());
    log::error!("battle guard violation at round {}: {}", entry.round, entry.message);
    entry
}

/// Record that the event queue was truncated at the chain-depth cap rather
/// than allowed to recurse unbounded (§4.5).
pub fn report_event_chain_truncated(round: u32, depth: usize) -> GuardViolation {
    let entry = GuardViolation::new(
        round,
        format!("event queue drain truncated at depth {depth}"),
    );
    log::warn!("{}", entry.message);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_offending_name() {
        let err = BattleError::InvalidCount {
            name: "archer".to_string(),
            count: 0,
        };
        assert!(err.to_string().contains("archer"));
    }

    #[test]
    fn guard_violation_carries_round() {
        let v = report_guard_violation(3, "duplicate hex occupancy");
        assert_eq!(v.round, 3);
        assert!(v.message.contains("duplicate"));
    }
}
