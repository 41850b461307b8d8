//! Ability records: the `(trigger, effect, target)` triple plus tuning
//! knobs. Deserializes straight from the JSON an overworld meta-game or a
//! CLI scenario file would hand the engine; unknown trigger/effect/target
//! strings fail deserialization rather than being silently dropped (§7),
//! matching the teacher's closed, `#[serde(tag = "type")]`-style action enum
//! in `model/action.rs`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Passive,
    #[serde(rename = "turnstart")]
    TurnStart,
    #[serde(rename = "onhit")]
    OnHit,
    #[serde(rename = "onkill")]
    OnKill,
    Wounded,
    #[serde(rename = "endturn")]
    EndTurn,
    Lament,
    Harvest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Heal,
    Fortify,
    Strike,
    Splash,
    Sunder,
    Ramp,
    Push,
    Retreat,
    Freeze,
    Summon,
    Shadowstep,
    Silence,
    Ready,
    Block,
    Execute,
    Armor,
    Boost,
    Undying,
    LamentAura,
}

impl Effect {
    /// Effects whose primary resolution is immediate state mutation rather
    /// than an enqueued event (§4.4).
    pub fn is_immediate(self) -> bool {
        matches!(
            self,
            Effect::Ramp
                | Effect::Push
                | Effect::Retreat
                | Effect::Freeze
                | Effect::Summon
                | Effect::Shadowstep
                | Effect::Silence
                | Effect::Ready
        )
    }

    /// Passive effects are queried by pipelines, never fired through §4.3.
    pub fn is_passive(self) -> bool {
        matches!(
            self,
            Effect::Block
                | Effect::Execute
                | Effect::Armor
                | Effect::Boost
                | Effect::Undying
                | Effect::LamentAura
        )
    }

    /// Whether this effect damages its targets (used to pick the "valid
    /// target" polarity in §4.3c: enemies for damaging effects, allies for
    /// supportive ones).
    pub fn targets_enemies(self) -> bool {
        matches!(
            self,
            Effect::Strike | Effect::Splash | Effect::Sunder | Effect::Freeze | Effect::Silence | Effect::Push
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    #[serde(rename = "self")]
    Itself,
    Target,
    Random,
    Area,
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub trigger: Trigger,
    pub effect: Effect,
    pub target: TargetKind,
    pub value: i32,
    #[serde(default)]
    pub range: Option<i32>,
    #[serde(default = "default_charge")]
    pub charge: i32,
    #[serde(default)]
    pub aura: Option<i32>,
    /// Only consulted when `effect == Summon` (§4.4).
    #[serde(default)]
    pub summon_ready: bool,
}

fn default_charge() -> i32 {
    1
}

impl Ability {
    /// `value` clamped to `>= 0` as required by dispatch step 2b.
    pub fn resolved_value(&self) -> i32 {
        self.value.max(0)
    }
}

/// An ability bound to a unit, carrying the per-instance charge counter
/// (§3.1, "per-instance `_charge_counter` starting at 0").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityInstance {
    pub ability: Ability,
    #[serde(default)]
    pub charge_counter: i32,
}

impl AbilityInstance {
    pub fn new(ability: Ability) -> Self {
        AbilityInstance {
            ability,
            charge_counter: 0,
        }
    }

    /// Advance the charge counter for a firing attempt. Returns `true` if
    /// the ability should fire this time (and resets the counter), `false`
    /// if it should be skipped.
    pub fn tick_charge(&mut self) -> bool {
        self.charge_counter += 1;
        if self.charge_counter < self.ability.charge.max(1) {
            false
        } else {
            self.charge_counter = 0;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_trigger() {
        let json = r#"{"trigger":"onfire","effect":"strike","target":"target","value":1}"#;
        let result: Result<Ability, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn self_target_round_trips() {
        let json = r#"{"trigger":"passive","effect":"block","target":"self","value":1}"#;
        let ability: Ability = serde_json::from_str(json).unwrap();
        assert_eq!(ability.target, TargetKind::Itself);
        assert_eq!(ability.charge, 1);
    }

    #[test]
    fn charge_counter_fires_on_nth_trigger() {
        let mut inst = AbilityInstance::new(Ability {
            trigger: Trigger::OnHit,
            effect: Effect::Ramp,
            target: TargetKind::Itself,
            value: 1,
            range: None,
            charge: 3,
            aura: None,
            summon_ready: false,
        });
        assert!(!inst.tick_charge());
        assert!(!inst.tick_charge());
        assert!(inst.tick_charge());
        assert_eq!(inst.charge_counter, 0);
    }

    #[test]
    fn negative_value_clamps_to_zero() {
        let ability = Ability {
            trigger: Trigger::OnHit,
            effect: Effect::Heal,
            target: TargetKind::Itself,
            value: -5,
            range: None,
            charge: 1,
            aura: None,
            summon_ready: false,
        };
        assert_eq!(ability.resolved_value(), 0);
    }
}
