//! Effect handlers (§4.4): the second half of ability dispatch, invoked
//! once `execution::engine::fire_trigger` has resolved an ability's
//! targets. Damaging/supportive effects enqueue events; the rest mutate
//! state immediately.

use crate::events::QueuedEvent;
use crate::hex::push_direction;
use crate::model::ability::{Ability, Effect};
use crate::model::battle::Battle;
use crate::model::unit::{Player, Unit, UnitId};
use crate::targeting::TriggerContext;

const BLADE_HP: i32 = 1;
const BLADE_DAMAGE: i32 = 2;
const BLADE_RANGE: i32 = 1;

/// Apply one fired ability against its resolved targets.
pub fn apply_effect(
    battle: &mut Battle,
    source_id: UnitId,
    ctx: &TriggerContext,
    ability: &Ability,
    targets: &[UnitId],
) {
    let value = ability.resolved_value();
    match ability.effect {
        Effect::Heal => {
            for &target_id in targets {
                battle.state.event_queue.push_back(QueuedEvent::Heal {
                    target_id,
                    source_id,
                    amount: value,
                });
            }
        }
        Effect::Fortify => {
            for &target_id in targets {
                battle.state.event_queue.push_back(QueuedEvent::Fortify {
                    target_id,
                    source_id,
                    amount: value,
                });
            }
        }
        Effect::Strike => {
            let Some(source_pos) = battle.state.unit(source_id).and_then(|u| u.pos) else {
                return;
            };
            for &target_id in targets {
                battle.state.event_queue.push_back(QueuedEvent::Strike {
                    target_id,
                    source_id,
                    amount: value,
                    source_pos,
                });
            }
        }
        Effect::Splash => {
            let Some(source_pos) = battle.state.unit(source_id).and_then(|u| u.pos) else {
                return;
            };
            for &primary_id in targets {
                let Some(primary_pos) = battle.state.unit(primary_id).and_then(|u| u.pos) else {
                    continue;
                };
                let primary_player = battle.state.unit(primary_id).map(|u| u.player);
                let Some(primary_player) = primary_player else { continue };
                let source_player = battle.state.unit(source_id).map(|u| u.player);
                let enemy_player = source_player.map(Player::opponent).unwrap_or(primary_player);
                let mut splashed: Vec<UnitId> = battle
                    .state
                    .units
                    .iter()
                    .filter(|u| {
                        u.alive
                            && u.id != primary_id
                            && u.player == enemy_player
                            && u.pos.is_some_and(|p| p.distance(primary_pos) == 1)
                    })
                    .map(|u| u.id)
                    .collect();
                splashed.sort();
                for target_id in splashed {
                    battle.state.event_queue.push_back(QueuedEvent::Splash {
                        target_id,
                        source_id,
                        amount: value,
                        source_pos,
                        origin_pos: primary_pos,
                    });
                }
            }
        }
        Effect::Sunder => {
            let Some(source_pos) = battle.state.unit(source_id).and_then(|u| u.pos) else {
                return;
            };
            for &target_id in targets {
                battle.state.event_queue.push_back(QueuedEvent::Sunder {
                    target_id,
                    source_id,
                    amount: value,
                    source_pos,
                });
            }
        }
        Effect::Ramp => {
            if let Some(unit) = battle.state.unit_mut(source_id) {
                unit.ramp(value);
                let pos = unit.pos;
                battle.state.last_action.ramp_pos = pos;
            }
        }
        Effect::Push => {
            for &target_id in targets {
                push_unit(battle, source_id, target_id, value);
            }
        }
        Effect::Retreat => {
            retreat_unit(battle, source_id, ctx.target_id);
        }
        Effect::Freeze => {
            for &target_id in targets {
                if let Some(unit) = battle.state.unit_mut(target_id) {
                    unit.frozen_turns = unit.frozen_turns.max(value);
                }
            }
        }
        Effect::Summon => {
            summon_units(battle, source_id, value, ability.summon_ready);
        }
        Effect::Shadowstep => {
            if let Some(unit) = battle.state.unit_mut(source_id) {
                unit.shadowstep_ready = true;
            }
        }
        Effect::Silence => {
            for &target_id in targets {
                if let Some(unit) = battle.state.unit_mut(target_id) {
                    unit.silenced = true;
                }
            }
        }
        Effect::Ready => {
            if let Some(unit) = battle.state.unit_mut(source_id) {
                unit.ready_triggered = true;
            }
        }
        Effect::Block
        | Effect::Execute
        | Effect::Armor
        | Effect::Boost
        | Effect::Undying
        | Effect::LamentAura => {
            // Passive; never fired through dispatch (§4.3).
        }
    }
}

fn push_unit(battle: &mut Battle, source_id: UnitId, target_id: UnitId, amount: i32) {
    let Some(pusher_pos) = battle.state.unit(source_id).and_then(|u| u.pos) else {
        return;
    };
    let Some(mut current) = battle.state.unit(target_id).and_then(|u| u.pos) else {
        return;
    };
    let direction = push_direction(pusher_pos, current);
    let (cols, rows) = (battle.cols, battle.rows);
    let from = current;
    let mut moved = 0;
    for _ in 0..amount {
        let candidate = crate::hex::Hex::new(current.col + direction, current.row);
        if !candidate.in_bounds(cols, rows) || battle.state.occupant_at(candidate).is_some() {
            break;
        }
        current = candidate;
        moved += 1;
    }
    if moved > 0 {
        if let Some(unit) = battle.state.unit_mut(target_id) {
            unit.pos = Some(current);
        }
        battle.state.last_action.push_from = Some(from);
        battle.state.last_action.push_to = Some(current);
    }
}

fn retreat_unit(battle: &mut Battle, source_id: UnitId, away_from: Option<UnitId>) {
    let Some(away_from_pos) = away_from.and_then(|id| battle.state.unit(id).and_then(|u| u.pos)) else {
        return;
    };
    let Some(source_pos) = battle.state.unit(source_id).and_then(|u| u.pos) else {
        return;
    };
    let (cols, rows) = (battle.cols, battle.rows);
    let current_dist = source_pos.distance(away_from_pos);
    let candidate = source_pos
        .neighbors(cols, rows)
        .into_iter()
        .find(|&n| n.distance(away_from_pos) > current_dist && battle.state.occupant_at(n).is_none());
    if let Some(dest) = candidate {
        if let Some(unit) = battle.state.unit_mut(source_id) {
            unit.pos = Some(dest);
        }
    }
}

fn summon_units(battle: &mut Battle, source_id: UnitId, count: i32, summon_ready: bool) {
    let Some((source_pos, player)) = battle
        .state
        .unit(source_id)
        .and_then(|u| u.pos.map(|p| (p, u.player)))
    else {
        return;
    };
    let (cols, rows) = (battle.cols, battle.rows);
    let empty_neighbors: Vec<_> = source_pos
        .neighbors(cols, rows)
        .into_iter()
        .filter(|&n| battle.state.occupant_at(n).is_none())
        .take(count.max(0) as usize)
        .collect();

    for pos in empty_neighbors {
        let id = battle.alloc_unit_id();
        let blade = Unit {
            id,
            name: "blade".to_string(),
            display_name: "Blade".to_string(),
            player,
            summoner_id: Some(source_id),
            alive: true,
            max_hp: BLADE_HP,
            hp: BLADE_HP,
            damage: BLADE_DAMAGE,
            attack_range: BLADE_RANGE,
            armor: 0,
            speed: 1.0,
            abilities: Vec::new(),
            has_acted: false,
            ready_triggered: false,
            frozen_turns: 0,
            silenced: false,
            block_used: 0,
            ramp_accumulated: 0,
            shadowstep_ready: false,
            pos: Some(pos),
        };
        battle.state.units.push(blade);
        if summon_ready {
            // §9: insert after `current_index`, not after the summoning
            // unit's own slot — those differ when `summon` fires from a
            // unit other than the current actor (e.g. a `lament` reacting
            // to a death mid-turn).
            let insert_at = (battle.state.current_index + 1).min(battle.state.turn_order.len());
            battle.state.turn_order.insert(insert_at, id);
        }
    }
}
