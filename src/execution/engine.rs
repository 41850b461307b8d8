//! Ability dispatch (§4.3), the event queue drain (§4.5), and the turn
//! scheduler (§4.7, §4.9) — the three moving parts `Battle::step` drives.

use crate::error_handling::report_event_chain_truncated;
use crate::events::{ActionType, EffectRecord};
use crate::hex::Hex;
use crate::model::ability::{Ability, Trigger};
use crate::model::battle::{Battle, Winner};
use crate::model::unit::{Player, UnitId};
use crate::pathfind::shortest_path;
use crate::resolution::{apply_damage, effective_damage};
use crate::resolvers::effect::apply_effect;
use crate::targeting::{resolve_targets, TriggerContext};

/// Fire every ability of `unit_id` whose trigger matches `trigger`, in
/// declaration order, draining the event queue between firings when
/// `apply_events_immediately` is set (§4.3).
pub fn fire_trigger(battle: &mut Battle, unit_id: UnitId, trigger: Trigger, ctx: TriggerContext) {
    let Some(unit) = battle.state.unit(unit_id) else {
        return;
    };
    if !unit.alive || unit.silenced {
        return;
    }
    let ability_count = unit.abilities.len();

    for i in 0..ability_count {
        let Some(unit) = battle.state.unit(unit_id) else {
            return;
        };
        if !unit.alive || i >= unit.abilities.len() {
            return;
        }
        if unit.abilities[i].ability.trigger != trigger {
            continue;
        }
        let ability: Ability = unit.abilities[i].ability.clone();

        let should_fire = battle
            .state
            .unit_mut(unit_id)
            .map(|u| u.abilities[i].tick_charge())
            .unwrap_or(false);
        if !should_fire {
            continue;
        }

        let targets = {
            let state = &mut battle.state;
            resolve_targets(&state.units, &ctx, &ability, &mut state.rng)
        };
        apply_effect(battle, unit_id, &ctx, &ability, &targets);

        if battle.options.apply_events_immediately {
            drain_event_queue(battle);
        }
    }
}

/// Drain the FIFO event queue (§4.5), capped at `max_event_chain_depth`.
pub fn drain_event_queue(battle: &mut Battle) {
    let max_depth = battle.options.max_event_chain_depth;
    let mut depth = 0usize;
    while let Some(event) = battle.state.event_queue.pop_front() {
        depth += 1;
        if depth > max_depth {
            let entry = report_event_chain_truncated(battle.state.round, depth);
            battle.state.log.push(entry);
            battle.state.event_queue.clear();
            break;
        }
        apply_queued_event(battle, event);
    }
}

fn apply_queued_event(battle: &mut Battle, event: crate::events::QueuedEvent) {
    use crate::events::QueuedEvent::*;
    match event {
        Heal { target_id, amount, .. } => {
            let Some(unit) = battle.state.unit_mut(target_id) else { return };
            if !unit.alive {
                return;
            }
            unit.heal(amount);
            if let Some(pos) = unit.pos {
                battle.state.last_action.heal_events.push(EffectRecord { target_pos: pos, amount });
            }
        }
        Fortify { target_id, amount, .. } => {
            let Some(unit) = battle.state.unit_mut(target_id) else { return };
            if !unit.alive {
                return;
            }
            unit.fortify(amount);
            if let Some(pos) = unit.pos {
                battle.state.last_action.fortify_events.push(EffectRecord { target_pos: pos, amount });
            }
        }
        Sunder { target_id, amount, .. } => {
            let Some(unit) = battle.state.unit_mut(target_id) else { return };
            if !unit.alive {
                return;
            }
            unit.sunder(amount);
            if let Some(pos) = unit.pos {
                battle.state.last_action.sunder_events.push(EffectRecord { target_pos: pos, amount });
            }
        }
        Strike { target_id, source_id, amount, .. } => {
            if battle.state.unit(target_id).map_or(true, |u| !u.alive) {
                return;
            }
            let pos = battle.state.unit(target_id).and_then(|u| u.pos);
            apply_damage(battle, target_id, amount, source_id);
            if let Some(pos) = pos {
                battle.state.last_action.strike_events.push(EffectRecord { target_pos: pos, amount });
            }
        }
        Splash { target_id, source_id, amount, .. } => {
            if battle.state.unit(target_id).map_or(true, |u| !u.alive) {
                return;
            }
            let pos = battle.state.unit(target_id).and_then(|u| u.pos);
            apply_damage(battle, target_id, amount, source_id);
            if let Some(pos) = pos {
                battle.state.last_action.splash_events.push(EffectRecord { target_pos: pos, amount });
            }
        }
    }
}

fn alive_enemies(battle: &Battle, unit_id: UnitId) -> Vec<UnitId> {
    let Some(unit) = battle.state.unit(unit_id) else {
        return Vec::new();
    };
    battle
        .state
        .units
        .iter()
        .filter(|u| u.alive && u.is_enemy_of(unit))
        .map(|u| u.id)
        .collect()
}

fn enemies_in_range(battle: &Battle, unit_id: UnitId) -> Vec<UnitId> {
    let Some(unit) = battle.state.unit(unit_id) else {
        return Vec::new();
    };
    let Some(pos) = unit.pos else {
        return Vec::new();
    };
    battle
        .state
        .units
        .iter()
        .filter(|u| u.alive && u.is_enemy_of(unit) && u.pos.is_some_and(|p| pos.distance(p) <= unit.attack_range))
        .map(|u| u.id)
        .collect()
}

/// Closest living enemy by BFS path length, ties broken by lowest ID.
fn closest_enemy(battle: &Battle, unit_id: UnitId) -> Option<(UnitId, i32, Hex)> {
    let unit = battle.state.unit(unit_id)?;
    let pos = unit.pos?;
    let (cols, rows) = (battle.cols, battle.rows);
    let mut best: Option<(UnitId, i32, Hex)> = None;
    let mut enemies = alive_enemies(battle, unit_id);
    enemies.sort();
    for enemy_id in enemies {
        let Some(enemy_pos) = battle.state.unit(enemy_id).and_then(|u| u.pos) else {
            continue;
        };
        let is_occupied = |h: Hex| h != pos && h != enemy_pos && battle.state.occupant_at(h).is_some();
        if let Some((len, step)) = shortest_path(pos, enemy_pos, cols, rows, is_occupied) {
            let better = match &best {
                None => true,
                Some((_, best_len, _)) => len < *best_len,
            };
            if better {
                best = Some((enemy_id, len, step));
            }
        }
    }
    best
}

/// Furthest living enemy by straight hex distance, ties broken by lowest ID
/// (§4.3, shadowstep).
fn furthest_enemy(battle: &Battle, unit_id: UnitId) -> Option<UnitId> {
    let unit = battle.state.unit(unit_id)?;
    let pos = unit.pos?;
    let mut enemies = alive_enemies(battle, unit_id);
    enemies.sort();
    enemies
        .into_iter()
        .filter_map(|id| battle.state.unit(id).and_then(|u| u.pos).map(|p| (id, pos.distance(p))))
        .max_by_key(|(_, d)| *d)
        .map(|(id, _)| id)
}

fn unoccupied_neighbor(battle: &Battle, around: Hex) -> Option<Hex> {
    around
        .neighbors(battle.cols, battle.rows)
        .into_iter()
        .find(|&h| battle.state.occupant_at(h).is_none())
}

/// Perform an in-range attack for `unit_id` against `target_id` (§4.7b).
fn perform_attack(battle: &mut Battle, unit_id: UnitId, target_id: UnitId) {
    let attacker_pos = battle.state.unit(unit_id).and_then(|u| u.pos);
    let target_pos = battle.state.unit(target_id).and_then(|u| u.pos);
    let ranged = battle.state.unit(unit_id).map(|u| u.attack_range > 1);
    let damage = effective_damage(battle, unit_id);

    apply_damage(battle, target_id, damage, unit_id);

    battle.state.last_action.attacker_pos = attacker_pos;
    battle.state.last_action.target_pos = target_pos;
    battle.state.last_action.ranged = ranged;
    if battle.state.last_action.killed.is_none() {
        battle.state.last_action.killed = Some(false);
    }

    fire_trigger(battle, unit_id, Trigger::OnHit, TriggerContext::with_target(unit_id, target_id));
}

/// One unit's full turn (§4.7 step 5). Returns once the unit has acted.
fn run_unit_turn(battle: &mut Battle, unit_id: UnitId) {
    fire_trigger(battle, unit_id, Trigger::TurnStart, TriggerContext::new(unit_id));

    if battle.state.unit(unit_id).map_or(true, |u| !u.alive) {
        return;
    }

    let in_range = enemies_in_range(battle, unit_id);
    if !in_range.is_empty() {
        let target_id = {
            let state = &mut battle.state;
            state.rng.choice(&in_range).copied()
        };
        if let Some(target_id) = target_id {
            battle.state.last_action.action_type = Some(ActionType::Attack);
            perform_attack(battle, unit_id, target_id);
        }
    } else {
        let from = battle.state.unit(unit_id).and_then(|u| u.pos);
        let mut moved = false;

        let shadowstep_ready = battle.state.unit(unit_id).is_some_and(|u| u.shadowstep_ready);
        if shadowstep_ready {
            if let Some(enemy_id) = furthest_enemy(battle, unit_id) {
                if let Some(enemy_pos) = battle.state.unit(enemy_id).and_then(|u| u.pos) {
                    if let Some(dest) = unoccupied_neighbor(battle, enemy_pos) {
                        if let Some(unit) = battle.state.unit_mut(unit_id) {
                            unit.pos = Some(dest);
                            unit.shadowstep_ready = false;
                        }
                        moved = true;
                    }
                }
            }
        } else if let Some((_, _, step)) = closest_enemy(battle, unit_id) {
            if let Some(unit) = battle.state.unit_mut(unit_id) {
                unit.pos = Some(step);
            }
            moved = true;

            let speed = battle.state.unit(unit_id).map(|u| u.speed).unwrap_or(1.0);
            if speed > 1.0 {
                let roll = battle.state.rng.uniform();
                if roll < speed - 1.0 {
                    if let Some((_, _, step2)) = closest_enemy(battle, unit_id) {
                        if let Some(unit) = battle.state.unit_mut(unit_id) {
                            unit.pos = Some(step2);
                        }
                    }
                }
            }
        }

        let to = battle.state.unit(unit_id).and_then(|u| u.pos);
        battle.state.last_action.from = from;
        battle.state.last_action.to = to;

        let in_range_after = enemies_in_range(battle, unit_id);
        if !in_range_after.is_empty() {
            let target_id = {
                let state = &mut battle.state;
                state.rng.choice(&in_range_after).copied()
            };
            if let Some(target_id) = target_id {
                battle.state.last_action.action_type = Some(ActionType::MoveAttack);
                perform_attack(battle, unit_id, target_id);
            }
        } else if moved {
            battle.state.last_action.action_type = Some(ActionType::Move);
        } else {
            battle.state.last_action.action_type = Some(ActionType::Skip);
        }
    }

    if battle.state.unit(unit_id).is_some_and(|u| u.alive) {
        fire_trigger(battle, unit_id, Trigger::EndTurn, TriggerContext::new(unit_id));
    }

    // §4.3 step 3: when events aren't applied immediately after each ability
    // firing, they're deferred until turn end — drain them here, once, so
    // `apply_events_immediately = false` doesn't leak them forever.
    if !battle.options.apply_events_immediately {
        drain_event_queue(battle);
    }
}

fn check_hex_occupancy_invariant(battle: &mut Battle) {
    let mut seen: Vec<Hex> = Vec::new();
    for unit in battle.state.units.iter().filter(|u| u.alive) {
        if let Some(pos) = unit.pos {
            if seen.contains(&pos) {
                battle.abort_with_guard_violation(format!("duplicate occupancy at {pos:?}"));
                return;
            }
            seen.push(pos);
        }
    }
}

/// `Battle::step` (§4.7).
pub fn step(battle: &mut Battle) -> bool {
    battle.push_history();
    battle.state.last_action.clear();

    if battle.state.winner.is_some() {
        return false;
    }

    let p1_alive = battle.state.units.iter().any(|u| u.alive && u.player == Player::P1);
    let p2_alive = battle.state.units.iter().any(|u| u.alive && u.player == Player::P2);
    if !p1_alive || !p2_alive {
        battle.state.winner = Some(match (p1_alive, p2_alive) {
            (false, false) => Winner::Draw,
            (false, true) => Winner::Player2,
            (true, false) => Winner::Player1,
            (true, true) => unreachable!(),
        });
        return false;
    }

    loop {
        if battle.state.current_index >= battle.state.turn_order.len() {
            if requeue_readied_units(battle) {
                continue;
            }
            new_round(battle);
            if battle.state.winner.is_some() {
                return false;
            }
            continue;
        }
        let id = battle.state.turn_order[battle.state.current_index];
        let Some(unit) = battle.state.unit(id) else {
            battle.state.current_index += 1;
            continue;
        };
        if !unit.alive {
            battle.state.current_index += 1;
            continue;
        }
        if unit.frozen_turns > 0 {
            let id = unit.id;
            if let Some(u) = battle.state.unit_mut(id) {
                u.frozen_turns -= 1;
                u.has_acted = true;
            }
            battle.state.current_index += 1;
            continue;
        }
        break;
    }

    let unit_id = battle.state.turn_order[battle.state.current_index];
    run_unit_turn(battle, unit_id);

    check_hex_occupancy_invariant(battle);
    if battle.state.winner.is_some() {
        return false;
    }

    let ready = battle.state.unit(unit_id).is_some_and(|u| u.ready_triggered);
    if ready {
        if let Some(u) = battle.state.unit_mut(unit_id) {
            u.ready_triggered = false;
        }
    } else if let Some(u) = battle.state.unit_mut(unit_id) {
        u.has_acted = true;
    }

    battle.state.current_index += 1;
    true
}

/// Ready re-entry (§9 open question: "after current index in this round's
/// order"). By the time `current_index` reaches the end of `turn_order`,
/// every unit in it has had a turn this round; any alive unit still showing
/// `has_acted == false` got there via the `ready` effect clearing the flag
/// instead of setting it (§4.7 step 6). Append those units, lowest ID first,
/// for another pass before the round ends. Returns `true` if any were
/// requeued.
fn requeue_readied_units(battle: &mut Battle) -> bool {
    let mut readied: Vec<UnitId> = battle
        .state
        .units
        .iter()
        .filter(|u| u.alive && !u.has_acted)
        .map(|u| u.id)
        .collect();
    readied.sort();
    if readied.is_empty() {
        return false;
    }
    battle.state.turn_order.extend(readied);
    true
}

/// New-round transition (§4.9).
fn new_round(battle: &mut Battle) {
    battle.state.round += 1;

    if battle
        .state
        .record_round_snapshot_and_check_stalemate(battle.options.stalemate_rounds)
    {
        return;
    }

    let mut order: Vec<UnitId> = battle.state.units.iter().filter(|u| u.alive).map(|u| u.id).collect();
    battle.state.rng.shuffle(&mut order);
    battle.state.turn_order = order;

    for unit in battle.state.units.iter_mut().filter(|u| u.alive) {
        unit.has_acted = false;
        unit.block_used = 0;
    }
    battle.state.current_index = 0;
}
