//! The damage pipeline (§4.6): block, armor (self + ally aura), undying
//! rescue, HP application, wounded/execute triggers, and the death handler
//! (§4.8).

use crate::execution::engine::fire_trigger;
use crate::model::ability::{Effect, Trigger};
use crate::model::battle::Battle;
use crate::model::unit::UnitId;
use crate::targeting::TriggerContext;

/// A unit's effective attack damage: base `damage` plus every alive,
/// un-silenced ally's `boost` value (no range restriction, §4.6).
pub fn effective_damage(battle: &Battle, unit_id: UnitId) -> i32 {
    let Some(unit) = battle.state.unit(unit_id) else {
        return 0;
    };
    let boost: i32 = battle
        .state
        .units
        .iter()
        .filter(|u| u.alive && !u.silenced && u.is_ally_of(unit))
        .flat_map(|u| u.abilities.iter())
        .filter(|a| a.ability.trigger == Trigger::Passive && a.ability.effect == Effect::Boost)
        .map(|a| a.ability.resolved_value())
        .sum();
    unit.damage + boost
}

fn block_value(battle: &Battle, target_id: UnitId) -> Option<i32> {
    let target = battle.state.unit(target_id)?;
    if target.silenced {
        return None;
    }
    target
        .abilities
        .iter()
        .find(|a| a.ability.trigger == Trigger::Passive && a.ability.effect == Effect::Block)
        .map(|a| a.ability.resolved_value())
}

fn effective_armor(battle: &Battle, target_id: UnitId) -> i32 {
    let Some(target) = battle.state.unit(target_id) else {
        return 0;
    };
    let Some(target_pos) = target.pos else {
        return target.armor;
    };
    let self_armor: i32 = target
        .abilities
        .iter()
        .filter(|a| {
            !target.silenced && a.ability.trigger == Trigger::Passive && a.ability.effect == Effect::Armor
        })
        .map(|a| a.ability.resolved_value())
        .sum();
    let aura_armor: i32 = battle
        .state
        .units
        .iter()
        .filter(|u| u.alive && !u.silenced && u.id != target_id && u.is_ally_of(target))
        .filter_map(|u| u.pos.map(|p| (u, p)))
        .flat_map(|(u, pos)| {
            u.abilities
                .iter()
                .filter(move |a| {
                    a.ability.trigger == Trigger::Passive
                        && a.ability.effect == Effect::Armor
                        && a.ability.aura.is_some_and(|r| r >= pos.distance(target_pos))
                })
                .map(move |a| a.ability.resolved_value())
        })
        .sum();
    target.armor + self_armor + aura_armor
}

/// Find an ally whose `undying` passive can absorb the killing blow (§4.6
/// step 4). Ties broken by unit ID ascending.
fn find_undying_rescuer(battle: &Battle, target_id: UnitId) -> Option<(UnitId, i32)> {
    let target = battle.state.unit(target_id)?;
    let target_pos = target.pos?;
    let target_damage = target.damage;

    let mut candidates: Vec<(UnitId, i32)> = battle
        .state
        .units
        .iter()
        .filter(|u| u.alive && !u.silenced && u.id != target_id && u.is_ally_of(target))
        .filter_map(|u| u.pos.map(|p| (u, p)))
        .flat_map(|(u, pos)| {
            u.abilities.iter().filter_map(move |a| {
                if a.ability.trigger == Trigger::Passive
                    && a.ability.effect == Effect::Undying
                    && a.ability.aura.is_some_and(|r| r >= pos.distance(target_pos))
                    && a.ability.resolved_value() <= target_damage
                {
                    Some((u.id, a.ability.resolved_value()))
                } else {
                    None
                }
            })
        })
        .collect();
    candidates.sort_by_key(|(id, _)| *id);
    candidates.into_iter().next()
}

/// Find an enemy whose `execute` passive threshold is met (§4.6 step 5).
/// Ties broken by unit ID ascending; first match wins.
fn find_executioner(battle: &Battle, target_id: UnitId) -> Option<UnitId> {
    let target = battle.state.unit(target_id)?;
    let target_pos = target.pos?;
    let target_hp = target.hp;

    let mut candidates: Vec<UnitId> = battle
        .state
        .units
        .iter()
        .filter(|u| u.alive && !u.silenced && u.is_enemy_of(target))
        .filter_map(|u| u.pos.map(|p| (u, p)))
        .flat_map(|(u, pos)| {
            u.abilities.iter().filter_map(move |a| {
                if a.ability.trigger == Trigger::Passive
                    && a.ability.effect == Effect::Execute
                    && a.ability.aura.is_some_and(|r| r >= pos.distance(target_pos))
                    && target_hp <= a.ability.resolved_value()
                {
                    Some(u.id)
                } else {
                    None
                }
            })
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

/// `apply_damage` (§4.6). Returns the actual damage dealt.
pub fn apply_damage(battle: &mut Battle, target_id: UnitId, amount: i32, source_id: UnitId) -> i32 {
    if battle.state.unit(target_id).map_or(true, |u| !u.alive) {
        return 0;
    }

    if let Some(block) = block_value(battle, target_id) {
        let target = battle.state.unit_mut(target_id).expect("checked above");
        if target.block_used < block {
            target.block_used += 1;
            return 0;
        }
    }

    let eff_armor = effective_armor(battle, target_id);
    let base_amount = amount.max(0);
    let actual = (base_amount - eff_armor).max(0);
    if actual == 0 {
        return 0;
    }

    let target_hp = battle.state.unit(target_id).expect("checked above").hp;
    let target_damage = battle.state.unit(target_id).expect("checked above").damage;
    if target_hp - actual <= 0 && target_damage > 0 {
        if let Some((_rescuer_id, value)) = find_undying_rescuer(battle, target_id) {
            let target = battle.state.unit_mut(target_id).expect("checked above");
            target.damage = (target.damage - value).max(0);
            let pos = target.pos;
            if let (Some(source_pos), Some(target_pos)) =
                (battle.state.unit(source_id).and_then(|u| u.pos), pos)
            {
                battle
                    .state
                    .last_action
                    .undying_saves
                    .push(crate::events::UndyingSave {
                        target_pos,
                        source_pos,
                    });
            }
            return 0;
        }
    }

    {
        let target = battle.state.unit_mut(target_id).expect("checked above");
        target.take_damage(actual);
    }

    let target_hp_after = battle.state.unit(target_id).expect("checked above").hp;
    if target_hp_after > 0 {
        fire_trigger(battle, target_id, Trigger::Wounded, TriggerContext::new(target_id));
        if let Some(executioner) = find_executioner(battle, target_id) {
            let target = battle.state.unit_mut(target_id).expect("checked above");
            let remaining_hp = target.hp;
            target.take_damage(remaining_hp);
            battle.state.last_action.killed = Some(true);
            handle_death(battle, target_id, executioner);
            return actual;
        }
    } else {
        battle.state.last_action.killed = Some(true);
        handle_death(battle, target_id, source_id);
    }

    actual
}

/// Death handling (§4.8). Iterates other units in ascending ID order so
/// chained deaths stay deterministic.
pub fn handle_death(battle: &mut Battle, dead_id: UnitId, source_id: UnitId) {
    if battle.state.unit(source_id).is_some_and(|u| u.alive) {
        fire_trigger(
            battle,
            source_id,
            Trigger::OnKill,
            TriggerContext::with_target(source_id, dead_id),
        );
    }

    let Some(dead_pos) = battle.state.unit(dead_id).and_then(|u| u.pos) else {
        return;
    };
    let dead_player = match battle.state.unit(dead_id) {
        Some(u) => u.player,
        None => return,
    };

    let mut other_ids: Vec<UnitId> = battle
        .state
        .units
        .iter()
        .filter(|u| u.alive && u.id != dead_id)
        .map(|u| u.id)
        .collect();
    other_ids.sort();

    for vid in other_ids {
        let Some(v) = battle.state.unit(vid) else { continue };
        if !v.alive {
            continue;
        }
        let Some(v_pos) = v.pos else { continue };
        let is_ally = v.player == dead_player;
        let dist = v_pos.distance(dead_pos);

        if is_ally {
            let lament_range = v
                .abilities
                .iter()
                .filter(|a| a.ability.trigger == Trigger::Lament)
                .filter_map(|a| a.ability.range)
                .max();
            if let Some(range) = lament_range {
                if dist <= range {
                    fire_trigger(battle, vid, Trigger::Lament, TriggerContext::with_target(vid, dead_id));
                }
            }
        } else {
            let harvest_range = v
                .abilities
                .iter()
                .filter(|a| a.ability.trigger == Trigger::Harvest)
                .filter_map(|a| a.ability.range)
                .max();
            if let Some(range) = harvest_range {
                if dist <= range {
                    fire_trigger(battle, vid, Trigger::Harvest, TriggerContext::with_target(vid, dead_id));
                }
            }
        }

        if is_ally {
            let Some(v) = battle.state.unit(vid) else { continue };
            let aura_abilities: Vec<(i32, i32)> = v
                .abilities
                .iter()
                .filter(|a| a.ability.trigger == Trigger::Passive && a.ability.effect == Effect::LamentAura)
                .filter_map(|a| a.ability.aura.map(|r| (r, a.ability.resolved_value())))
                .filter(|(r, _)| *r >= dist)
                .collect();
            if aura_abilities.is_empty() {
                continue;
            }
            let mut ally_ids: Vec<UnitId> = battle
                .state
                .units
                .iter()
                .filter(|u| u.alive && u.player == dead_player)
                .filter_map(|u| u.pos.map(|p| (u.id, p)))
                .collect::<Vec<_>>()
                .into_iter()
                .filter_map(|(id, pos)| {
                    let within_any = aura_abilities.iter().any(|(r, _)| *r >= v_pos.distance(pos));
                    within_any.then_some(id)
                })
                .collect();
            ally_ids.sort();
            for (range, value) in aura_abilities {
                for &ally_id in &ally_ids {
                    let Some(ally_pos) = battle.state.unit(ally_id).and_then(|u| u.pos) else { continue };
                    if v_pos.distance(ally_pos) > range {
                        continue;
                    }
                    if let Some(ally) = battle.state.unit_mut(ally_id) {
                        ally.ramp(value);
                        battle.state.last_action.vengeance_positions.push(ally_pos);
                    }
                }
            }
        }
    }
}
