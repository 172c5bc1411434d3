pub mod progression;

use std::ops::{Deref, RangeInclusive};

use bracket_color::prelude::{DARK_RED, RED};
use bracket_random::prelude::RandomNumberGenerator;
use specs::{
    prelude::{Entity, Join, WorldExt},
    storage::{MaskedStorage, Storage},
};
use tracing::debug;

use crate::ecs::{
    World,
    components::{
        BehaviorPolicy, BlocksTile, CombatProfile, Corpse, EffectiveStats, EquipSlot,
        EquipmentProfile, Inventory, ItemProfile, StatBonus,
    },
    resources::{GameState, Severity},
};

pub const CORPSE_GLYPH: char = '%';

/// `floor((score - 10) / 2)`.
pub fn strength_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// Closed damage range for `attacker` hitting `target`. Armor is a flat
/// subtraction, so the range can be empty.
pub fn damage_range(attacker: &EffectiveStats, target: &EffectiveStats) -> RangeInclusive<i32> {
    let modifier = strength_modifier(attacker.abilities.strength);
    let base = attacker.damage - target.armor_class;
    (1 + modifier)..=(base + modifier)
}

/// An empty range is a guaranteed miss and draws nothing.
pub fn roll_damage(rng: &mut RandomNumberGenerator, range: RangeInclusive<i32>) -> i32 {
    if range.is_empty() {
        return 0;
    }
    rng.range(*range.start(), *range.end() + 1)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttackOutcome {
    Hit(i32),
    Miss,
}

/// Resolve one melee attack. `None` if either side cannot fight.
pub fn attack(world: &World, attacker: Entity, target: Entity) -> Option<AttackOutcome> {
    let attacker_stats = world.effective_stats(attacker)?;
    let target_stats = world.effective_stats(target)?;
    let range = damage_range(&attacker_stats, &target_stats);
    let amount = roll_damage(&mut world.rng(), range.clone());

    let attacker_name = world.name(attacker);
    let target_name = world.name(target);
    let player = world.player();
    let mut text = match (attacker == player, target == player, amount > 0) {
        (true, _, true) => format!("You hit the {target_name}."),
        (true, _, false) => format!("You miss the {target_name}"),
        (_, true, true) => format!("{attacker_name} hits you!"),
        (_, true, false) => format!("{attacker_name} misses you!"),
        (_, _, true) => format!("The {attacker_name} hits the {target_name}."),
        (_, _, false) => format!("The {attacker_name} misses the {target_name}."),
    };
    if world.tuning().options.verbose_messages {
        text.push_str(&format!(
            " ({}..={} rolled {amount})",
            range.start(),
            range.end()
        ));
    }
    let severity = if target == player && amount > 0 {
        Severity::Warning
    } else {
        Severity::Combat
    };
    world.message(text, severity);

    if let Some(cue) = world.combat_profile(attacker).and_then(|p| p.attack_cue) {
        world.play(cue);
    }
    if amount <= 0 {
        return Some(AttackOutcome::Miss);
    }
    if let Some(cue) = world.combat_profile(target).and_then(|p| p.hit_cue) {
        world.play(cue);
    }
    take_damage(world, target, amount);
    Some(AttackOutcome::Hit(amount))
}

/// Subtract `amount` hit points and run the death transition at zero.
pub fn take_damage(world: &World, target: Entity, amount: i32) {
    if amount <= 0 {
        return;
    }
    if target == world.player() && world.game_state() == GameState::Dead {
        return;
    }
    let dead = world
        .with_profile_mut(target, |profile| {
            profile.hp -= amount;
            profile.is_dead()
        })
        .unwrap_or(false);
    if dead {
        die(world, target);
    }
}

fn die(world: &World, victim: Entity) {
    let name = world.name(victim);
    let ecs = world.ecs();
    if victim == world.player() {
        world.with_profile_mut(victim, |profile| profile.hp = 0);
        world.set_game_state(GameState::Dead);
        world.message("You died!", Severity::Danger);
        world.set_name(victim, format!("Corpse of {name}"));
        world.set_look(victim, CORPSE_GLYPH, DARK_RED, 0);
        ecs.write_storage::<BlocksTile>().remove(victim);
        let _ = ecs.write_storage::<Corpse>().insert(victim, Corpse);
        debug!("player died");
        return;
    }

    let Some(profile) = ecs.write_storage::<CombatProfile>().remove(victim) else {
        return;
    };
    ecs.write_storage::<BehaviorPolicy>().remove(victim);
    ecs.write_storage::<BlocksTile>().remove(victim);
    let _ = ecs.write_storage::<Corpse>().insert(victim, Corpse);
    world.set_name(victim, format!("{name} Corpse"));
    world.set_look(victim, CORPSE_GLYPH, RED, 0);
    if let Some(point) = world.position(victim) {
        world.mark_blood(point);
    }
    if let Some(cue) = profile.death_cue {
        world.play(cue);
    }

    world.message(format!("The {name} is dead!"), Severity::Good);
    if profile.xp > 0 {
        world.with_profile_mut(world.player(), |player| player.xp += profile.xp);
        world.message(
            format!("You gain {} experience points.", profile.xp),
            Severity::Good,
        );
    }
    debug!(victim = %name, xp = profile.xp, "monster died");
}

/// Restore hit points up to the effective maximum. Returns what was healed.
pub fn heal(world: &World, target: Entity, amount: i32) -> i32 {
    let Some(max_hp) = world.effective_stats(target).map(|stats| stats.max_hp) else {
        return 0;
    };
    world
        .with_profile_mut(target, |profile| {
            let before = profile.hp;
            profile.hp = (before + amount.max(0)).min(max_hp).max(before);
            profile.hp - before
        })
        .unwrap_or(0)
}

/// Sum of the bonuses of everything `holder` has equipped.
pub fn equipped_bonus<I, E>(
    holder: Entity,
    inventories: &Storage<'_, Inventory, I>,
    equipment: &Storage<'_, EquipmentProfile, E>,
) -> StatBonus
where
    I: Deref<Target = MaskedStorage<Inventory>>,
    E: Deref<Target = MaskedStorage<EquipmentProfile>>,
{
    let mut total = StatBonus::default();
    if let Some(inventory) = inventories.get(holder) {
        for gear in inventory.items.iter().filter_map(|item| equipment.get(*item)) {
            if gear.equipped {
                total += gear.bonus;
            }
        }
    }
    total
}

/// The item `holder` has equipped in `slot`, if any.
pub fn equipped_in_slot(world: &World, holder: Entity, slot: EquipSlot) -> Option<Entity> {
    let ecs = world.ecs();
    let entities = ecs.entities();
    let items = ecs.read_storage::<ItemProfile>();
    let equipment = ecs.read_storage::<EquipmentProfile>();
    (&entities, &items, &equipment)
        .join()
        .find(|(_, item, gear)| item.owner == Some(holder) && gear.equipped && gear.slot == slot)
        .map(|(entity, _, _)| entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::AbilityScores;

    fn stats(strength: i32, damage: i32, armor_class: i32) -> EffectiveStats {
        EffectiveStats {
            abilities: AbilityScores {
                strength,
                ..AbilityScores::default()
            },
            armor_class,
            damage,
            speed: 30,
            max_hp: 10,
            to_hit: 0,
        }
    }

    #[test]
    fn strength_modifier_rounds_down() {
        assert_eq!(strength_modifier(10), 0);
        assert_eq!(strength_modifier(12), 1);
        assert_eq!(strength_modifier(8), -1);
        assert_eq!(strength_modifier(9), -1);
        assert_eq!(strength_modifier(20), 5);
    }

    #[test]
    fn armor_can_swallow_the_whole_range() {
        let range = damage_range(&stats(10, 5, 0), &stats(10, 0, 5));
        assert!(range.is_empty());
        let mut rng = RandomNumberGenerator::seeded(5);
        for _ in 0..20 {
            assert_eq!(roll_damage(&mut rng, range.clone()), 0);
        }
    }

    #[test]
    fn rolls_stay_inside_the_range() {
        let range = damage_range(&stats(14, 10, 3), &stats(10, 0, 3));
        assert_eq!(range, 3..=9);
        let mut rng = RandomNumberGenerator::seeded(9);
        for _ in 0..200 {
            assert!(range.contains(&roll_damage(&mut rng, range.clone())));
        }
    }
}
