use bracket_geometry::prelude::Point;
use tracing::debug;

use crate::{
    combat::{attack, heal, take_damage},
    ecs::{
        World,
        resources::{AudioCue, Severity},
    },
    map::LevelSource,
};

const STUBBED_TOE: i32 = 3;

/// Attack whatever fights on the target tile, open a closed door, or step.
/// Every variant burns lamp oil.
pub fn move_or_attack(world: &World, delta: Point) {
    let (decay, auto_open) = {
        let tuning = world.tuning();
        (tuning.light.oil_decay, tuning.options.auto_open_door)
    };
    world.with_light_mut(|light| light.burn(decay));

    let player = world.player();
    let dest = world.player_point() + delta;
    if let Some(target) = world.fighter_at(dest).filter(|e| *e != player) {
        attack(world, player, target);
        return;
    }
    let closed_door = world
        .grid()
        .cell(dest)
        .is_some_and(|cell| cell.is_closed_door());
    if closed_door {
        if auto_open && world.grid_mut().open_door(dest) {
            world.play(AudioCue::DoorOpen);
            debug!(x = dest.x, y = dest.y, "door opened");
        }
        return;
    }
    // A failed step leaves the player where the field already points.
    if world.move_by(player, delta) {
        world.reseed_player_field();
    }
}

/// Returns whether the attempt took the turn.
pub fn close_door(world: &World, delta: Point) -> bool {
    let target = world.player_point() + delta;
    let open = world
        .grid()
        .cell(target)
        .is_some_and(|cell| cell.is_open_door());
    if !open {
        world.message("No door in that direction to close.", Severity::Info);
        return false;
    }
    if !world.entities_at(target).is_empty() {
        world.message("Something is blocking the door.", Severity::Info);
        return false;
    }
    world.grid_mut().close_door(target);
    let slam = world.tuning().flow.door_slam_intensity;
    world.emit_sound(target, slam);
    world.play(AudioCue::DoorClose);
    world.message("You swing the door shut.", Severity::Info);
    true
}

/// Kick the first thing in `delta`'s direction. Loose actors slide one tile
/// if the tile beyond is free; corpses smear blood where they land.
pub fn kick(world: &World, delta: Point) -> bool {
    let player = world.player();
    let target = world.player_point() + delta;
    if world.grid().is_door(target) {
        world.message("You kick the door, but it does not budge.", Severity::Combat);
        return true;
    }
    let Some(thing) = world
        .entities_at(target)
        .into_iter()
        .find(|entity| *entity != player)
    else {
        world.message("Nothing in that direction to kick.", Severity::Info);
        return false;
    };

    let name = world.name(thing);
    if Some(thing) == world.stairs() {
        world.message(
            "You kick the stairs and manage to mess up your toe pretty badly.",
            Severity::Combat,
        );
        take_damage(world, player, STUBBED_TOE);
        return true;
    }

    let beyond = target + delta;
    let stuck = {
        let grid = world.grid();
        grid.is_blocked(beyond) || (grid.blocks_sight(beyond) && !grid.is_door(beyond))
    };
    if stuck {
        world.message(
            format!("You kick the {name}, but it does not budge."),
            Severity::Combat,
        );
    } else if world.combat_profile(thing).is_some() {
        world.message(format!("The {name} dodges your kick."), Severity::Combat);
    } else {
        if world.is_corpse(thing) {
            world.mark_blood(beyond);
        }
        world.set_position(thing, beyond);
        world.message(format!("You kick the {name}."), Severity::Combat);
        if world.item(thing).is_some() {
            world.reseed_gold_field();
        }
    }
    true
}

/// Take the stairs under the player. Returns whether a new level was entered.
pub fn descend(world: &mut World, levels: &mut dyn LevelSource) -> bool {
    let here = world.player_point();
    let on_stairs = world
        .stairs()
        .and_then(|stairs| world.position(stairs))
        .is_some_and(|stairs| stairs == here);
    if !on_stairs {
        world.message("There are no stairs here.", Severity::Info);
        return false;
    }

    let player = world.player();
    world.play(AudioCue::Stairs);
    world.message(
        "You take a moment to rest, and recover your strength.",
        Severity::Good,
    );
    if let Some(max_hp) = world.effective_stats(player).map(|stats| stats.max_hp) {
        heal(world, player, max_hp / 2);
    }
    world.clear_blood();
    let depth = world.depth() + 1;
    world.set_depth(depth);
    world.message(
        "You descend deeper into the heart of the dungeon...",
        Severity::Danger,
    );

    world.clear_level();
    let plan = levels.next_level(depth, &mut world.rng());
    world.install_level(plan);
    debug!(depth, "descended");
    true
}
