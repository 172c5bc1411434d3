//! Carrying, equipping and using items.
//!
//! Anything that can fail for lack of a target or resource reports
//! [`ItemUse::Cancelled`] and leaves the item untouched, so the caller does
//! not spend a turn on it.

use std::collections::VecDeque;

use bracket_geometry::prelude::{DistanceAlg, Point};
use specs::prelude::{Entity, WorldExt};
use tracing::debug;

use crate::{
    combat::{equipped_in_slot, heal, take_damage},
    ecs::{
        World,
        components::{BehaviorPolicy, EquipmentProfile, Inventory, ItemEffect, ItemProfile},
        resources::{AudioCue, Severity},
        spawner,
    },
    flow::{FlowField, NEIGHBORS},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TargetEvent {
    Click(Point),
    Cancel,
}

/// Where targeted effects get their clicks from.
pub trait Targeting {
    /// `None` once no more events will come, which cancels like `Cancel`.
    fn next_event(&mut self) -> Option<TargetEvent>;
}

impl Targeting for VecDeque<TargetEvent> {
    fn next_event(&mut self) -> Option<TargetEvent> {
        self.pop_front()
    }
}

/// Cancels every request.
pub struct NoTargeting;

impl Targeting for NoTargeting {
    fn next_event(&mut self) -> Option<TargetEvent> {
        None
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ItemUse {
    Used,
    Cancelled,
}

fn distance(a: Point, b: Point) -> f32 {
    DistanceAlg::Pythagoras.distance2d(a, b)
}

/// First visible click within `range` of the player.
pub fn target_tile(
    world: &World,
    targeting: &mut dyn Targeting,
    range: Option<i32>,
) -> Option<Point> {
    let origin = world.player_point();
    loop {
        match targeting.next_event()? {
            TargetEvent::Cancel => return None,
            TargetEvent::Click(point) => {
                let in_range = range.map_or(true, |r| distance(origin, point) <= r as f32);
                if world.is_visible(point) && in_range {
                    return Some(point);
                }
            }
        }
    }
}

/// First click that lands on a monster within `range`.
pub fn target_monster(world: &World, targeting: &mut dyn Targeting, range: i32) -> Option<Entity> {
    loop {
        let point = target_tile(world, targeting, Some(range))?;
        if let Some(monster) = world
            .fighter_at(point)
            .filter(|entity| *entity != world.player() && world.has_behavior(*entity))
        {
            return Some(monster);
        }
    }
}

/// Nearest visible monster closer than `range + 1`.
pub fn closest_monster(world: &World, range: i32) -> Option<Entity> {
    let origin = world.player_point();
    let mut closest = None;
    let mut best = (range + 1) as f32;
    for (monster, point) in world.monsters() {
        if !world.is_visible(point) {
            continue;
        }
        let dist = distance(origin, point);
        if dist < best {
            best = dist;
            closest = Some(monster);
        }
    }
    closest
}

fn set_item<F: FnOnce(&mut ItemProfile)>(world: &World, item: Entity, f: F) {
    if let Some(profile) = world.ecs().write_storage::<ItemProfile>().get_mut(item) {
        f(profile);
    }
}

fn with_inventory<R>(world: &World, f: impl FnOnce(&mut Inventory) -> R) -> Option<R> {
    world
        .ecs()
        .write_storage::<Inventory>()
        .get_mut(world.player())
        .map(f)
}

fn is_gold(world: &World, item: Entity) -> bool {
    world
        .item(item)
        .is_some_and(|profile| profile.effect == ItemEffect::ThrowGold)
}

/// Equip `item` on its holder, first clearing whatever shares the slot.
pub fn equip(world: &World, item: Entity) {
    let (Some(gear), Some(profile)) = (world.equipment(item), world.item(item)) else {
        return;
    };
    let Some(holder) = profile.owner else {
        return;
    };
    if let Some(old) = equipped_in_slot(world, holder, gear.slot) {
        if old == item {
            return;
        }
        dequip(world, old);
    }
    if let Some(gear) = world.ecs().write_storage::<EquipmentProfile>().get_mut(item) {
        gear.equipped = true;
    }
    world.message(
        format!("Equipped {} on {}.", world.name(item), gear.slot),
        Severity::Good,
    );
}

pub fn dequip(world: &World, item: Entity) {
    let Some(gear) = world.equipment(item).filter(|gear| gear.equipped) else {
        return;
    };
    if let Some(gear) = world.ecs().write_storage::<EquipmentProfile>().get_mut(item) {
        gear.equipped = false;
    }
    world.message(
        format!("Dequipped {} from {}.", world.name(item), gear.slot),
        Severity::Info,
    );
    if let Some(holder) = world.item(item).and_then(|profile| profile.owner) {
        if let Some(max_hp) = world.effective_stats(holder).map(|stats| stats.max_hp) {
            world.with_profile_mut(holder, |profile| profile.hp = profile.hp.min(max_hp));
        }
    }
}

/// Pick up the first loose item under the player. Returns whether anything
/// was taken.
pub fn pick_up(world: &mut World) -> bool {
    let here = world.player_point();
    let item = world
        .entities_at(here)
        .into_iter()
        .find(|entity| world.item(*entity).is_some_and(|item| item.owner.is_none()));
    match item {
        Some(item) => pick_up_item(world, item),
        None => false,
    }
}

pub fn pick_up_item(world: &mut World, item: Entity) -> bool {
    let Some(profile) = world.item(item) else {
        return false;
    };
    let name = world.name(item);
    let player = world.player();
    let inventory = world.inventory();
    let gold = profile.effect == ItemEffect::ThrowGold;

    let stack = profile
        .stacks
        .then(|| {
            inventory
                .iter()
                .copied()
                .find(|held| world.name(*held) == name)
        })
        .flatten();
    if let Some(stack) = stack {
        set_item(world, stack, |held| held.count += profile.count);
        let _ = world.ecs_mut().delete_entity(item);
    } else {
        if inventory.len() >= world.tuning().items.inventory_capacity {
            world.message(
                format!("Your inventory is full, cannot pick up {name}."),
                Severity::Danger,
            );
            return false;
        }
        set_item(world, item, |held| held.owner = Some(player));
        world.remove_position(item);
        with_inventory(world, |held| held.items.push(item));
    }

    if let Some(cue) = profile.pickup_cue {
        world.play(cue);
    }
    world.message(
        format!("You picked up {name}! (x{})", profile.count),
        Severity::Good,
    );
    if stack.is_none() {
        if let Some(gear) = world.equipment(item) {
            if equipped_in_slot(world, player, gear.slot).is_none() {
                equip(world, item);
            }
        }
    }
    if gold {
        world.reseed_gold_field();
    }
    debug!(item = %name, stacked = stack.is_some(), "picked up");
    true
}

/// Put a carried item down on the player's tile.
pub fn drop_item(world: &mut World, item: Entity) {
    let Some(profile) = world.item(item) else {
        return;
    };
    dequip(world, item);
    let here = world.player_point();
    set_item(world, item, |held| held.owner = None);
    world.set_position(item, here);
    with_inventory(world, |held| held.items.retain(|e| *e != item));
    world.message(format!("You dropped a {}.", world.name(item)), Severity::Warning);
    if let Some(cue) = profile.pickup_cue {
        world.play(cue);
    }
    if profile.effect == ItemEffect::ThrowGold {
        world.reseed_gold_field();
    }
}

/// Spend one charge of a used item, removing it when none are left.
fn consume(world: &mut World, item: Entity) {
    let Some(profile) = world.item(item) else {
        return;
    };
    if profile.stacks && profile.count > 1 {
        set_item(world, item, |held| held.count -= 1);
        return;
    }
    with_inventory(world, |held| held.items.retain(|e| *e != item));
    let _ = world.ecs_mut().delete_entity(item);
}

/// Use a carried item. Equipment toggles between worn and carried.
pub fn use_item(world: &mut World, item: Entity, targeting: &mut dyn Targeting) -> ItemUse {
    let Some(profile) = world.item(item) else {
        return ItemUse::Cancelled;
    };
    if let Some(gear) = world.equipment(item) {
        if gear.equipped {
            dequip(world, item);
        } else {
            equip(world, item);
        }
        return ItemUse::Used;
    }

    let outcome = match profile.effect {
        ItemEffect::Inert => {
            world.message(
                format!("The {} cannot be used.", world.name(item)),
                Severity::Info,
            );
            ItemUse::Cancelled
        }
        ItemEffect::Heal => cast_heal(world),
        ItemEffect::Lightning => cast_lightning(world),
        ItemEffect::Fireball => cast_fireball(world, targeting),
        ItemEffect::Confuse => cast_confuse(world, targeting),
        ItemEffect::MagicMap => cast_magic_map(world),
        ItemEffect::Oil => use_oil(world),
        ItemEffect::ThrowGold => return throw_gold(world, item),
    };
    if outcome == ItemUse::Used {
        if let Some(cue) = profile.use_cue {
            world.play(cue);
        }
        consume(world, item);
    }
    debug!(effect = ?profile.effect, ?outcome, "item used");
    outcome
}

fn cast_heal(world: &World) -> ItemUse {
    let player = world.player();
    let full = match (world.combat_profile(player), world.effective_stats(player)) {
        (Some(profile), Some(stats)) => profile.hp >= stats.max_hp,
        _ => true,
    };
    if full {
        world.message("You are already at full health.", Severity::Danger);
        return ItemUse::Cancelled;
    }
    world.message("Your wounds start to feel better!", Severity::Good);
    heal(world, player, world.tuning().items.heal_amount);
    ItemUse::Used
}

fn cast_lightning(world: &World) -> ItemUse {
    let (range, damage) = {
        let tuning = world.tuning();
        (tuning.items.lightning_range, tuning.items.lightning_damage)
    };
    let Some(monster) = closest_monster(world, range) else {
        world.message("No enemy is close enough to strike.", Severity::Danger);
        return ItemUse::Cancelled;
    };
    world.message(
        format!(
            "A lighting bolt strikes the {} with a loud thunder! The damage is {damage} hit points.",
            world.name(monster)
        ),
        Severity::Combat,
    );
    take_damage(world, monster, damage);
    ItemUse::Used
}

fn cast_fireball(world: &World, targeting: &mut dyn Targeting) -> ItemUse {
    let (radius, damage) = {
        let tuning = world.tuning();
        (tuning.items.fireball_radius, tuning.items.fireball_damage)
    };
    world.message(
        "Left-click a target tile for the fireball, or right-click to cancel.",
        Severity::Info,
    );
    let Some(target) = target_tile(world, targeting, None) else {
        return ItemUse::Cancelled;
    };
    world.message(
        format!("The fireball explodes, burning everything within {radius} tiles!"),
        Severity::Warning,
    );
    let mut victims: Vec<(Entity, Point)> = world.monsters();
    victims.insert(0, (world.player(), world.player_point()));
    for (victim, point) in victims {
        if distance(point, target) > radius as f32 || world.combat_profile(victim).is_none() {
            continue;
        }
        world.message(
            format!("The {} gets burned for {damage} hit points.", world.name(victim)),
            Severity::Warning,
        );
        take_damage(world, victim, damage);
    }
    ItemUse::Used
}

fn cast_confuse(world: &World, targeting: &mut dyn Targeting) -> ItemUse {
    let (range, turns) = {
        let tuning = world.tuning();
        (tuning.items.confuse_range, tuning.items.confuse_turns)
    };
    world.message(
        "Left-click an enemy to confuse it, or right-click to cancel.",
        Severity::Info,
    );
    let Some(monster) = target_monster(world, targeting, range) else {
        return ItemUse::Cancelled;
    };
    let previous = world.behavior(monster).unwrap_or(BehaviorPolicy::Basic);
    world.set_behavior(
        monster,
        BehaviorPolicy::Confused {
            previous: Box::new(previous),
            turns_remaining: turns,
        },
    );
    world.message(
        format!(
            "The eyes of the {} look vacant, as he starts to stumble around!",
            world.name(monster)
        ),
        Severity::Good,
    );
    ItemUse::Used
}

/// Reveal every cell the player could walk to within the mapping range,
/// plus the walls around them.
fn cast_magic_map(world: &World) -> ItemUse {
    world.play(AudioCue::MagicMapUse);
    let range = world.tuning().items.magic_map_range;
    let origin = world.player_point();
    let mut grid = world.grid_mut();
    let mut field = FlowField::new(grid.width(), grid.height(), range);
    field.add_goal(origin, 0);
    field.recalculate_full(&grid, range, false);

    let mut revealed = 0;
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let point = Point::new(x, y);
            if field.value(point).is_some_and(|v| v < range) {
                grid.set_explored(point);
                for offset in NEIGHBORS {
                    grid.set_explored(point + offset);
                }
                revealed += 1;
            }
        }
    }
    debug!(revealed, "magic mapping");
    ItemUse::Used
}

fn use_oil(world: &World) -> ItemUse {
    let amount = world.tuning().light.oil_flask;
    world.with_light_mut(|light| light.refill(amount));
    world.message("You refill your lamp.", Severity::Good);
    ItemUse::Used
}

/// Toss some of the carried gold onto a neighbouring tile.
fn throw_gold(world: &mut World, purse: Entity) -> ItemUse {
    let Some(profile) = world.item(purse) else {
        return ItemUse::Cancelled;
    };
    if profile.count <= 0 {
        return ItemUse::Cancelled;
    }
    let (thrown, offset) = {
        let mut rng = world.rng();
        let thrown = rng.range(1, profile.count + 1);
        let offset = NEIGHBORS[rng.range(0, NEIGHBORS.len() as i32) as usize];
        (thrown, offset)
    };
    if thrown >= profile.count {
        with_inventory(world, |held| held.items.retain(|e| *e != purse));
        let _ = world.ecs_mut().delete_entity(purse);
    } else {
        set_item(world, purse, |held| held.count -= thrown);
    }
    world.message(
        format!("You throw {thrown} gold up in the air and watch as it falls to the ground."),
        Severity::Info,
    );

    let here = world.player_point();
    let mut landing = here + offset;
    if world.grid().is_blocked(landing) {
        landing = here;
    }
    let pile = world.entities_at(landing).into_iter().find(|entity| {
        world
            .item(*entity)
            .is_some_and(|item| item.owner.is_none() && item.effect == ItemEffect::ThrowGold)
    });
    match pile {
        Some(pile) => set_item(world, pile, |item| item.count += thrown),
        None => {
            spawner::spawn_gold(world.ecs_mut(), landing, thrown);
        }
    }
    if let Some(cue) = profile.use_cue {
        world.play(cue);
    }
    world.reseed_gold_field();
    debug!(thrown, x = landing.x, y = landing.y, "gold thrown");
    ItemUse::Used
}

/// The gold pile the player carries, if any.
pub fn purse(world: &World) -> Option<Entity> {
    world
        .inventory()
        .into_iter()
        .find(|item| is_gold(world, *item))
}
