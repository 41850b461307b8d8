//! Battle-wide tuning knobs, following the teacher's `Default`-impl idiom in
//! `config.rs` (explicit `impl Default` rather than `#[derive(Default)]`
//! wherever a field needs a non-zero default).

use serde::{Deserialize, Serialize};

/// Options passed to `Battle::new` (§6.1). Everything here is fixed at
/// construction time; nothing in `BattleOptions` is mutated mid-battle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattleOptions {
    /// Apply queued events between each ability firing within a trigger
    /// rather than deferring them to turn end (§4.3 step 3).
    pub apply_events_immediately: bool,
    /// Maximum recursion depth for event-queue draining before the drain is
    /// truncated and logged rather than allowed to recurse unbounded (§4.5).
    pub max_event_chain_depth: usize,
    /// Consecutive identical round snapshots required to call a stalemate
    /// (§4.9).
    pub stalemate_rounds: u32,
}

impl Default for BattleOptions {
    fn default() -> Self {
        BattleOptions {
            apply_events_immediately: true,
            max_event_chain_depth: 64,
            stalemate_rounds: 3,
        }
    }
}
