//! Target resolution for ability dispatch (§4.3c).

use crate::model::ability::{Ability, Effect, TargetKind};
use crate::model::unit::{Unit, UnitId};
use crate::rng::BattleRng;

/// Context carried alongside a trigger fire: which unit is firing, and (for
/// `onhit`/`onkill`) the unit the triggering action was about.
#[derive(Debug, Clone, Copy)]
pub struct TriggerContext {
    pub source_id: UnitId,
    pub target_id: Option<UnitId>,
}

impl TriggerContext {
    pub fn new(source_id: UnitId) -> Self {
        TriggerContext {
            source_id,
            target_id: None,
        }
    }

    pub fn with_target(source_id: UnitId, target_id: UnitId) -> Self {
        TriggerContext {
            source_id,
            target_id: Some(target_id),
        }
    }
}

fn is_valid(effect: Effect, source: &Unit, candidate: &Unit) -> bool {
    if !candidate.alive {
        return false;
    }
    let polarity_ok = if effect.targets_enemies() {
        source.is_enemy_of(candidate)
    } else {
        source.is_ally_of(candidate) || candidate.id == source.id
    };
    if !polarity_ok {
        return false;
    }
    if effect == Effect::Heal && candidate.hp >= candidate.max_hp {
        return false;
    }
    true
}

/// Resolve the set of targets for one ability firing (§4.3c). Order of
/// `area`/`global` results is by ascending unit ID, so downstream iteration
/// (e.g. event enqueue order) is deterministic.
pub fn resolve_targets(
    units: &[Unit],
    ctx: &TriggerContext,
    ability: &Ability,
    rng: &mut BattleRng,
) -> Vec<UnitId> {
    let Some(source) = units.iter().find(|u| u.id == ctx.source_id) else {
        return Vec::new();
    };

    match ability.target {
        TargetKind::Itself => vec![source.id],
        TargetKind::Target => match ctx.target_id {
            // Forwarded as-is, not liveness-checked here: `splash` needs to
            // resolve against the unit a lethal strike just killed, and
            // dead-target drops for heal/fortify/sunder are instead applied
            // at event-application time (§4.4/§4.5), not at selection time.
            Some(id) if units.iter().any(|u| u.id == id) => vec![id],
            _ => Vec::new(),
        },
        TargetKind::Random => {
            let Some(source_pos) = source.pos else {
                return Vec::new();
            };
            let range = ability.range.unwrap_or(1);
            let candidates: Vec<UnitId> = units
                .iter()
                .filter(|u| {
                    u.id != source.id
                        && is_valid(ability.effect, source, u)
                        && u.pos.is_some_and(|p| source_pos.distance(p) <= range)
                })
                .map(|u| u.id)
                .collect();
            match rng.choice(&candidates) {
                Some(&id) => vec![id],
                None => Vec::new(),
            }
        }
        TargetKind::Area => {
            let Some(source_pos) = source.pos else {
                return Vec::new();
            };
            let range = ability.range.unwrap_or(1);
            let mut found: Vec<UnitId> = units
                .iter()
                .filter(|u| {
                    u.id != source.id
                        && is_valid(ability.effect, source, u)
                        && u.pos.is_some_and(|p| source_pos.distance(p) <= range)
                })
                .map(|u| u.id)
                .collect();
            found.sort();
            found
        }
        TargetKind::Global => {
            let mut found: Vec<UnitId> = units
                .iter()
                .filter(|u| u.id != source.id && is_valid(ability.effect, source, u))
                .map(|u| u.id)
                .collect();
            found.sort();
            found
        }
    }
}
