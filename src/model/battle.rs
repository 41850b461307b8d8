//! The `Battle` facade (§6): construction from unit specs, the public
//! read-only views, and the snapshot/undo/stalemate machinery that the
//! turn scheduler in `execution::engine` drives through `step()`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::BattleOptions;
use crate::error_handling::{report_guard_violation, BattleError, GuardViolation};
use crate::events::LastAction;
use crate::events::QueuedEvent;
use crate::hex::Hex;
use crate::rng::BattleRng;

use super::ability::AbilityInstance;
use super::unit::{Player, Unit, UnitId, UnitSpec};

pub const BOARD_COLS: i32 = 17;
/// Front-to-back column order for each player (§6.1): P1 front is column 5
/// going down to 0; P2 front is column 11 going up to 16.
const P1_COLUMNS: [i32; 6] = [5, 4, 3, 2, 1, 0];
const P2_COLUMNS: [i32; 6] = [11, 12, 13, 14, 15, 16];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    Player1,
    Player2,
    Draw,
}

/// Compact per-unit tuple compared round-over-round to detect a stalemate
/// (§4.9, glossary "stalemate snapshot").
#[derive(Debug, Clone, PartialEq, Eq)]
struct StalemateEntry {
    id: UnitId,
    hp: i32,
    pos: Option<Hex>,
    armor: i32,
    damage: i32,
}

/// Everything that must round-trip through undo, bundled so that a snapshot
/// is a single `clone()` (design notes §9, "Undo").
#[derive(Debug, Clone)]
pub(crate) struct BattleState {
    pub units: Vec<Unit>,
    pub turn_order: Vec<UnitId>,
    pub current_index: usize,
    pub round: u32,
    pub winner: Option<Winner>,
    pub log: Vec<GuardViolation>,
    pub rng: BattleRng,
    stalemate_snapshots: VecDeque<Vec<StalemateEntry>>,
    pub stalemate_count: u32,
    pub last_action: LastAction,
    pub event_queue: VecDeque<QueuedEvent>,
    next_unit_id: u32,
}

impl BattleState {
    fn alloc_id(&mut self) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        id
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    pub fn alive_units_of(&self, player: Player) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |u| u.alive && u.player == player)
    }

    pub fn occupant_at(&self, pos: Hex) -> Option<&Unit> {
        self.units.iter().find(|u| u.alive && u.pos == Some(pos))
    }

    fn stalemate_snapshot(&self) -> Vec<StalemateEntry> {
        let mut entries: Vec<StalemateEntry> = self
            .units
            .iter()
            .filter(|u| u.alive)
            .map(|u| StalemateEntry {
                id: u.id,
                hp: u.hp,
                pos: u.pos,
                armor: u.armor,
                damage: u.damage,
            })
            .collect();
        entries.sort_by_key(|e| e.id);
        entries
    }

    /// §4.9 step 2: compare this round's snapshot to the previous one and
    /// update the stalemate counter. Returns `true` if the battle is now a
    /// draw by stalemate.
    pub fn record_round_snapshot_and_check_stalemate(&mut self, cap: u32) -> bool {
        let snap = self.stalemate_snapshot();
        let repeats_last = self.stalemate_snapshots.back() == Some(&snap);
        if repeats_last {
            self.stalemate_count += 1;
        } else {
            self.stalemate_count = 0;
        }
        self.stalemate_snapshots.push_back(snap);
        while self.stalemate_snapshots.len() > 3 {
            self.stalemate_snapshots.pop_front();
        }
        if self.stalemate_count >= cap {
            self.winner = Some(Winner::Draw);
            true
        } else {
            false
        }
    }
}

pub struct Battle {
    pub(crate) state: BattleState,
    pub(crate) history: Vec<BattleState>,
    pub(crate) options: BattleOptions,
    pub(crate) cols: i32,
    pub(crate) rows: i32,
}

impl Battle {
    pub fn new(
        p1_specs: &[UnitSpec],
        p2_specs: &[UnitSpec],
        rng_seed: u64,
        options: BattleOptions,
    ) -> Result<Battle, BattleError> {
        let mut state = BattleState {
            units: Vec::new(),
            turn_order: Vec::new(),
            current_index: 0,
            round: 0,
            winner: None,
            log: Vec::new(),
            rng: BattleRng::seeded(rng_seed),
            stalemate_snapshots: VecDeque::new(),
            stalemate_count: 0,
            last_action: LastAction::default(),
            event_queue: VecDeque::new(),
            next_unit_id: 0,
        };

        if p1_specs.is_empty() {
            return Err(BattleError::EmptyArmy(1));
        }
        if p2_specs.is_empty() {
            return Err(BattleError::EmptyArmy(2));
        }

        let rows = board_rows(p1_specs, p2_specs)?;
        let mut p1_units = expand_specs(&mut state, p1_specs, Player::P1, rows)?;
        let mut p2_units = expand_specs(&mut state, p2_specs, Player::P2, rows)?;

        place_units(&mut p1_units, &P1_COLUMNS, rows, &mut state.rng)?;
        place_units(&mut p2_units, &P2_COLUMNS, rows, &mut state.rng)?;

        state.units = p1_units;
        state.units.extend(p2_units);
        check_no_collisions(&state.units)?;

        Ok(Battle {
            state,
            history: Vec::new(),
            options,
            cols: BOARD_COLS,
            rows,
        })
    }

    pub fn winner(&self) -> Option<Winner> {
        self.state.winner
    }

    pub fn last_action(&self) -> &LastAction {
        &self.state.last_action
    }

    pub fn units(&self) -> &[Unit] {
        &self.state.units
    }

    pub fn round(&self) -> u32 {
        self.state.round
    }

    pub fn turn_order(&self) -> &[UnitId] {
        &self.state.turn_order
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn log(&self) -> &[GuardViolation] {
        &self.state.log
    }

    pub fn board_dims(&self) -> (i32, i32) {
        (self.cols, self.rows)
    }

    /// Push a diagnostic onto `Battle::log` and mark the battle a draw
    /// (§7, "runtime guard violations").
    pub(crate) fn abort_with_guard_violation(&mut self, message: impl Into<String>) {
        let entry = report_guard_violation(self.state.round, message);
        self.state.log.push(entry);
        self.state.winner = Some(Winner::Draw);
    }

    /// §6.2 `undo`: restore the previous snapshot including RNG state.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(prev) => {
                self.state = prev;
                true
            }
            None => false,
        }
    }

    pub(crate) fn push_history(&mut self) {
        self.history.push(self.state.clone());
    }

    pub(crate) fn alloc_unit_id(&mut self) -> UnitId {
        self.state.alloc_id()
    }
}

fn board_rows(p1: &[UnitSpec], p2: &[UnitSpec]) -> Result<i32, BattleError> {
    let count = |specs: &[UnitSpec]| -> i32 { specs.iter().map(|s| s.count.unwrap_or(1).max(0)).sum() };
    let largest = count(p1).max(count(p2));
    // 6 columns per side; fit `largest` units into that many columns.
    let needed = ((largest as f64) / 6.0).ceil() as i32;
    Ok(needed.clamp(5, 15))
}

fn expand_specs(
    state: &mut BattleState,
    specs: &[UnitSpec],
    player: Player,
    rows: i32,
) -> Result<Vec<Unit>, BattleError> {
    let mut units = Vec::new();
    for spec in specs {
        let count = spec.count.unwrap_or(1);
        if count < 1 {
            return Err(BattleError::InvalidCount {
                name: spec.name.clone(),
                count: count as i64,
            });
        }
        for _ in 0..count {
            let id = state.alloc_id();
            let abilities = spec
                .abilities
                .iter()
                .cloned()
                .map(AbilityInstance::new)
                .collect();
            let pos = match spec.position {
                Some((col, row)) => {
                    let hex = Hex::new(col, row);
                    if !hex.in_bounds(BOARD_COLS, rows) {
                        return Err(BattleError::PositionOutOfBounds {
                            name: spec.name.clone(),
                            col,
                            row,
                        });
                    }
                    Some(hex)
                }
                None => None,
            };
            units.push(Unit {
                id,
                name: spec.name.clone(),
                display_name: spec.display_name.clone().unwrap_or_else(|| spec.name.clone()),
                player,
                summoner_id: None,
                alive: true,
                max_hp: spec.max_hp,
                hp: spec.hp.unwrap_or(spec.max_hp),
                damage: spec.damage,
                attack_range: spec.range.max(1),
                armor: spec.armor.unwrap_or(0),
                speed: spec.speed.unwrap_or(1.0),
                abilities,
                has_acted: false,
                ready_triggered: false,
                frozen_turns: 0,
                silenced: false,
                block_used: 0,
                ramp_accumulated: 0,
                shadowstep_ready: false,
                pos,
            });
        }
    }
    Ok(units)
}

/// Rows nearest the column's vertical center, in center-out order.
fn center_out_rows(rows: i32) -> Vec<i32> {
    let center = rows / 2;
    let mut result = vec![center];
    let mut offset = 1;
    while result.len() < rows as usize {
        if center - offset >= 0 {
            result.push(center - offset);
        }
        if center + offset < rows {
            result.push(center + offset);
        }
        offset += 1;
    }
    result
}

/// Range-tier deployment (§6.1): units without an explicit position are
/// sorted by range ascending and assigned to columns front-to-back,
/// advancing to the next column on a range-tier change or when the current
/// column is full. Within a column, rows are packed from the center
/// outward, then shuffled.
fn place_units(
    units: &mut [Unit],
    columns: &[i32; 6],
    rows: i32,
    rng: &mut BattleRng,
) -> Result<(), BattleError> {
    let mut order: Vec<usize> = units
        .iter()
        .enumerate()
        .filter(|(_, u)| u.pos.is_none())
        .map(|(i, _)| i)
        .collect();
    order.sort_by_key(|&i| units[i].attack_range);

    let mut col_idx: usize = 0;
    let mut col_rows: Vec<i32> = Vec::new();
    let mut slot_in_col: usize = 0;
    let mut last_range: Option<i32> = None;

    for &i in &order {
        let range = units[i].attack_range;
        let tier_changed = last_range.is_some_and(|r| r != range);
        let column_full = !col_rows.is_empty() && slot_in_col >= col_rows.len();
        let need_new_column = col_rows.is_empty() || tier_changed || column_full;

        if need_new_column {
            if !col_rows.is_empty() {
                col_idx += 1;
            }
            if col_idx >= columns.len() {
                return Err(BattleError::TooManyUnits {
                    requested: order.len(),
                    max: columns.len() * rows as usize,
                });
            }
            col_rows = center_out_rows(rows);
            rng.shuffle(&mut col_rows);
            slot_in_col = 0;
        }

        units[i].pos = Some(Hex::new(columns[col_idx], col_rows[slot_in_col]));
        slot_in_col += 1;
        last_range = Some(range);
    }
    Ok(())
}

fn check_no_collisions(units: &[Unit]) -> Result<(), BattleError> {
    let mut seen: Vec<Hex> = Vec::with_capacity(units.len());
    for u in units {
        if let Some(pos) = u.pos {
            if seen.contains(&pos) {
                return Err(BattleError::PositionOccupied {
                    name: u.name.clone(),
                    col: pos.col,
                    row: pos.row,
                });
            }
            seen.push(pos);
        }
    }
    Ok(())
}
