use std::collections::HashMap;

use hexbattle::{Ability, BattleOptions, Effect, TargetKind, Trigger, UnitId, UnitSpec};
use hexbattle::model::Battle;
use proptest::prelude::*;

fn passive_ability(effect: Effect, value: i32) -> Ability {
    Ability {
        trigger: Trigger::Passive,
        effect,
        target: TargetKind::Itself,
        value,
        range: None,
        charge: 1,
        aura: None,
        summon_ready: false,
    }
}

fn onhit_self_ramp(value: i32) -> Ability {
    Ability {
        trigger: Trigger::OnHit,
        effect: Effect::Ramp,
        target: TargetKind::Itself,
        value,
        range: None,
        charge: 1,
        aura: None,
        summon_ready: false,
    }
}

/// Occasionally equips a unit with `block`, `armor`, and/or a self-`ramp`
/// triggered `onhit`, so `block_used_within_bounds` and the ramp-tracking
/// invariant below actually get exercised instead of vacuously passing on
/// armies with no abilities at all.
fn ability_loadout_strategy() -> impl Strategy<Value = Vec<Ability>> {
    (
        prop::option::of(1..3i32),
        prop::option::of(1..3i32),
        prop::option::of(1..4i32),
    )
        .prop_map(|(block, armor, ramp)| {
            let mut abilities = Vec::new();
            if let Some(value) = block {
                abilities.push(passive_ability(Effect::Block, value));
            }
            if let Some(value) = armor {
                abilities.push(passive_ability(Effect::Armor, value));
            }
            if let Some(value) = ramp {
                abilities.push(onhit_self_ramp(value));
            }
            abilities
        })
}

fn unit_spec_strategy(name: &'static str) -> impl Strategy<Value = UnitSpec> {
    (1..20i32, 1..6i32, 1..4i32, 1..4i32, ability_loadout_strategy()).prop_map(
        move |(max_hp, damage, range, count, abilities)| UnitSpec {
            name: name.to_string(),
            display_name: None,
            max_hp,
            hp: None,
            damage,
            range,
            armor: None,
            speed: None,
            abilities,
            count: Some(count),
            position: None,
        },
    )
}

fn army_strategy() -> impl Strategy<Value = Vec<UnitSpec>> {
    prop::collection::vec(unit_spec_strategy("grunt"), 1..4)
}

fn run_to_termination(battle: &mut Battle, step_cap: u32) -> u32 {
    let mut steps = 0;
    while battle.winner().is_none() && steps < step_cap {
        assert!(at_most_one_unit_per_hex(battle));
        assert!(hp_within_bounds(battle));
        assert!(block_used_within_bounds(battle));
        battle.step();
        steps += 1;
    }
    steps
}

fn at_most_one_unit_per_hex(battle: &Battle) -> bool {
    let mut positions: Vec<_> = battle.units().iter().filter(|u| u.alive).filter_map(|u| u.pos).collect();
    positions.sort();
    let before = positions.len();
    positions.dedup();
    positions.len() == before
}

fn hp_within_bounds(battle: &Battle) -> bool {
    battle
        .units()
        .iter()
        .filter(|u| u.alive)
        .all(|u| u.hp >= 0 && u.hp <= u.max_hp)
}

/// `block_used` must never exceed the unit's own `block` ability value (0
/// for units without one), and armies from `army_strategy` actually include
/// `block`-equipped units often enough to exercise the non-zero case.
fn block_used_within_bounds(battle: &Battle) -> bool {
    battle.units().iter().all(|u| {
        let block_value = u
            .abilities
            .iter()
            .find(|a| a.ability.trigger == Trigger::Passive && a.ability.effect == Effect::Block)
            .map(|a| a.ability.resolved_value())
            .unwrap_or(0);
        u.block_used <= block_value
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn invariants_hold_across_random_battles(
        p1 in army_strategy(),
        p2 in army_strategy(),
        seed: u64,
    ) {
        let mut battle = Battle::new(&p1, &p2, seed, BattleOptions::default()).unwrap();
        run_to_termination(&mut battle, 50 * 60);
        prop_assert!(battle.winner().is_some(), "battle failed to terminate within the step bound");
    }

    #[test]
    fn determinism_same_seed_same_outcome(p1 in army_strategy(), p2 in army_strategy(), seed: u64) {
        let mut a = Battle::new(&p1, &p2, seed, BattleOptions::default()).unwrap();
        let mut b = Battle::new(&p1, &p2, seed, BattleOptions::default()).unwrap();

        for _ in 0..200 {
            let ra = a.step();
            let rb = b.step();
            prop_assert_eq!(ra, rb);
            prop_assert_eq!(a.winner(), b.winner());
            prop_assert_eq!(
                a.units().iter().map(|u| u.pos).collect::<Vec<_>>(),
                b.units().iter().map(|u| u.pos).collect::<Vec<_>>()
            );
            if !ra {
                break;
            }
        }
    }

    #[test]
    fn undo_is_left_inverse(p1 in army_strategy(), p2 in army_strategy(), seed: u64) {
        let mut battle = Battle::new(&p1, &p2, seed, BattleOptions::default()).unwrap();
        let before: Vec<_> = battle.units().iter().map(|u| (u.id, u.hp, u.pos, u.has_acted)).collect();
        battle.step();
        let undone = battle.undo();
        prop_assert!(undone);
        let after: Vec<_> = battle.units().iter().map(|u| (u.id, u.hp, u.pos, u.has_acted)).collect();
        prop_assert_eq!(before, after);
    }

    /// §8: "`damage` increase after a ramp/lament_aura increment equals the
    /// net `_ramp_accumulated` delta." Tracked against a per-unit baseline
    /// (`damage - ramp_accumulated` at first observation) rather than only
    /// the unit test in `model/unit.rs`, across whole random battles whose
    /// armies include `onhit` self-ramp abilities.
    #[test]
    fn ramp_matches_ramp_accumulated_delta(p1 in army_strategy(), p2 in army_strategy(), seed: u64) {
        let mut battle = Battle::new(&p1, &p2, seed, BattleOptions::default()).unwrap();
        let mut baseline: HashMap<UnitId, i32> = HashMap::new();

        let mut steps = 0;
        while battle.winner().is_none() && steps < 50 * 60 {
            for u in battle.units() {
                let base = *baseline.entry(u.id).or_insert(u.damage - u.ramp_accumulated);
                prop_assert_eq!(u.damage - base, u.ramp_accumulated);
            }
            battle.step();
            steps += 1;
        }
    }
}
