//! The FIFO event queue (§4.5) and the `last_action` record (§6.3).
//!
//! Grounded on the teacher's `events.rs`: a flat, serializable enum of
//! everything observable that happened, plus small helper accessors. Unlike
//! the teacher's 25-variant `Event`, ours only needs the five effect kinds
//! that go through the queue — `heal`, `fortify`, `sunder`, `strike`,
//! `splash` — because movement, attacks, and the rest of `last_action` are
//! recorded directly by the turn scheduler rather than queued.

use serde::{Deserialize, Serialize};

use crate::hex::Hex;
use crate::model::unit::UnitId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueuedEvent {
    Heal {
        target_id: UnitId,
        source_id: UnitId,
        amount: i32,
    },
    Fortify {
        target_id: UnitId,
        source_id: UnitId,
        amount: i32,
    },
    Sunder {
        target_id: UnitId,
        source_id: UnitId,
        amount: i32,
        source_pos: Hex,
    },
    Strike {
        target_id: UnitId,
        source_id: UnitId,
        amount: i32,
        source_pos: Hex,
    },
    Splash {
        target_id: UnitId,
        source_id: UnitId,
        amount: i32,
        source_pos: Hex,
        /// Position of the primary target this splash radiated from, for
        /// `last_action.splash_events` bookkeeping.
        origin_pos: Hex,
    },
}

/// One `{target_pos, amount}`-shaped entry in a `last_action` effect list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectRecord {
    pub target_pos: Hex,
    pub amount: i32,
}

/// `{target_pos, source_pos}` entry recorded for an undying save (§6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndyingSave {
    pub target_pos: Hex,
    pub source_pos: Hex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Attack,
    Move,
    MoveAttack,
    Skip,
}

/// Structured record of the most recent `step()` (§6.3). Cleared at the
/// start of every `step()` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastAction {
    pub action_type: Option<ActionType>,
    pub attacker_pos: Option<Hex>,
    pub target_pos: Option<Hex>,
    pub from: Option<Hex>,
    pub to: Option<Hex>,
    pub ranged: Option<bool>,
    pub killed: Option<bool>,

    pub heal_events: Vec<EffectRecord>,
    pub fortify_events: Vec<EffectRecord>,
    pub sunder_events: Vec<EffectRecord>,
    pub splash_events: Vec<EffectRecord>,
    pub strike_events: Vec<EffectRecord>,

    pub ramp_pos: Option<Hex>,
    pub push_from: Option<Hex>,
    pub push_to: Option<Hex>,

    pub undying_saves: Vec<UndyingSave>,
    pub vengeance_positions: Vec<Hex>,
}

impl LastAction {
    pub fn clear(&mut self) {
        *self = LastAction::default();
    }
}
