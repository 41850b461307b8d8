//! Unit records: base stats, temporary flags, and the ability list. Mirrors
//! the shape of the teacher's `Creature`/`Combattant` split (stat template
//! vs. live mutable state) but collapsed into one struct, since this engine
//! has no "encounter re-run against a fresh template" use case — a `Unit`
//! *is* the live combatant.

use serde::{Deserialize, Serialize};

use super::ability::{Ability, AbilityInstance};
use crate::hex::Hex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    P1,
    P2,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::P1 => Player::P2,
            Player::P2 => Player::P1,
        }
    }
}

/// Caller-supplied template for one or more units (§6.1). Expanded into
/// `count` identical `Unit`s at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub max_hp: i32,
    #[serde(default)]
    pub hp: Option<i32>,
    pub damage: i32,
    pub range: i32,
    #[serde(default)]
    pub armor: Option<i32>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub abilities: Vec<Ability>,
    #[serde(default)]
    pub count: Option<i32>,
    #[serde(default)]
    pub position: Option<(i32, i32)>,
}

/// A live combatant on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub display_name: String,
    pub player: Player,
    pub summoner_id: Option<UnitId>,
    pub alive: bool,

    pub max_hp: i32,
    pub hp: i32,
    pub damage: i32,
    pub attack_range: i32,
    pub armor: i32,
    pub speed: f64,

    pub abilities: Vec<AbilityInstance>,

    pub has_acted: bool,
    pub ready_triggered: bool,

    pub frozen_turns: i32,
    pub silenced: bool,
    pub block_used: i32,
    pub ramp_accumulated: i32,
    /// Set by a fired `shadowstep` ability; consumed by the movement phase
    /// of the same turn (§4.7 step 5a).
    pub shadowstep_ready: bool,

    pub pos: Option<Hex>,
}

impl Unit {
    pub fn is_ally_of(&self, other: &Unit) -> bool {
        self.player == other.player
    }

    pub fn is_enemy_of(&self, other: &Unit) -> bool {
        self.player != other.player
    }

    /// §4.2 `take_damage`.
    pub fn take_damage(&mut self, amount: i32) {
        self.hp -= amount;
        if self.hp <= 0 {
            self.hp = self.hp.min(0);
            self.alive = false;
        }
    }

    /// §4.2 `heal`.
    pub fn heal(&mut self, amount: i32) {
        if !self.alive || self.hp >= self.max_hp {
            return;
        }
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// §4.2 `fortify`.
    pub fn fortify(&mut self, amount: i32) {
        self.max_hp += amount;
        self.hp += amount;
    }

    /// §4.2 `sunder`.
    pub fn sunder(&mut self, amount: i32) {
        self.armor -= amount;
    }

    /// §4.2 `ramp`.
    pub fn ramp(&mut self, amount: i32) {
        self.damage += amount;
        self.ramp_accumulated += amount;
    }

    pub fn has_ability_with_effect(&self, effect: super::ability::Effect) -> bool {
        self.abilities.iter().any(|a| a.ability.effect == effect)
    }
}
