//! Monster decisions.
//!
//! Every activation reads the world, draws from the shared random stream in
//! a fixed order and resolves completely before returning.

use bracket_geometry::prelude::{DistanceAlg, Point};
use specs::prelude::Entity;
use tracing::trace;

use crate::{
    combat::{attack, strength_modifier},
    ecs::{
        World,
        components::BehaviorPolicy,
        resources::{AudioCue, GameState, Severity},
    },
    flow::NEIGHBORS,
};

/// One decision for `actor`, dispatched on its current policy.
pub fn take_turn(world: &World, actor: Entity) {
    match world.behavior(actor) {
        Some(BehaviorPolicy::Basic) => basic_turn(world, actor),
        Some(BehaviorPolicy::Confused {
            previous,
            turns_remaining,
        }) => confused_turn(world, actor, *previous, turns_remaining),
        None => {}
    }
}

fn basic_turn(world: &World, actor: Entity) {
    let Some(from) = world.position(actor) else {
        return;
    };
    let roll = world.rng().range(1, 6);
    let distance = DistanceAlg::Pythagoras.distance2d(from, world.player_point());
    if distance >= 2.0 {
        seek(world, actor);
    } else if world.game_state() == GameState::Playing {
        if roll > 4 {
            seek(world, actor);
        } else {
            attack(world, actor, world.player());
        }
    }
}

fn confused_turn(world: &World, actor: Entity, previous: BehaviorPolicy, turns_remaining: i32) {
    if turns_remaining > 0 {
        let (dx, dy) = {
            let mut rng = world.rng();
            (rng.range(-1, 2), rng.range(-1, 2))
        };
        world.move_by(actor, Point::new(dx, dy));
        world.set_behavior(
            actor,
            BehaviorPolicy::Confused {
                previous: Box::new(previous),
                turns_remaining: turns_remaining - 1,
            },
        );
    } else {
        world.set_behavior(actor, previous);
        world.message(
            format!("The {} is no longer confused!", world.name(actor)),
            Severity::Info,
        );
    }
}

fn random_neighbor(world: &World) -> Point {
    NEIGHBORS[world.rng().range(0, NEIGHBORS.len() as i32) as usize]
}

/// Step down the player field, with a one-in-three random stagger.
pub fn seek(world: &World, actor: Entity) {
    let Some(from) = world.position(actor) else {
        return;
    };
    let stagger = world.rng().range(1, 4) == 1;
    let mut delta = if stagger {
        random_neighbor(world)
    } else {
        let best = world.fields().player.best_neighbor_offsets(from);
        if best.is_empty() {
            random_neighbor(world)
        } else {
            best[world.rng().range(0, best.len() as i32) as usize]
        }
    };

    let mut dest = from + delta;
    if world.is_blocked(dest) && !world.grid().is_door(dest) {
        delta = random_neighbor(world);
        dest = from + delta;
    }
    let closed_door = world
        .grid()
        .cell(dest)
        .is_some_and(|cell| cell.is_closed_door());
    if closed_door {
        force_door(world, actor, dest);
    }
    if !world.grid().blocks_sight(dest) {
        world.move_by(actor, delta);
    }
    trace!(?actor, dx = delta.x, dy = delta.y, stagger, "seek");
}

/// Strength check against a closed door. Either way the noise carries.
pub fn force_door(world: &World, actor: Entity, door: Point) -> bool {
    let strength = world
        .effective_stats(actor)
        .map_or(10, |stats| stats.abilities.strength);
    let roll = world.rng().range(1, 21) + strength_modifier(strength);
    let (threshold, crash, shake) = {
        let tuning = world.tuning();
        (
            tuning.flow.door_break_threshold,
            tuning.flow.door_crash_intensity,
            tuning.flow.door_shake_intensity,
        )
    };
    let visible = world.is_visible(door);
    if roll >= threshold {
        world.grid_mut().open_door(door);
        world.emit_sound(door, crash);
        world.play(AudioCue::DoorBreak);
        if visible {
            world.message("The door crashes open!", Severity::Warning);
        }
        trace!(?actor, roll, "door forced");
        true
    } else {
        world.emit_sound(door, shake);
        world.play(AudioCue::DoorShake);
        if visible {
            world.message("The door shakes from the other side.", Severity::Warning);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Tuning, ecs::resources::AudioQueue, map::Grid};
    use specs::prelude::WorldExt;

    fn world(ascii: &str) -> World {
        let level = Grid::parse(ascii, &crate::data::marker_glyphs()).unwrap();
        World::from_level(level, Tuning::default()).unwrap()
    }

    #[test]
    fn confusion_wears_off() {
        let world = world(
            "
            #######
            #@...g#
            #######
            ",
        );
        let (monster, _) = world.monsters()[0];
        world.set_behavior(
            monster,
            BehaviorPolicy::Confused {
                previous: Box::new(BehaviorPolicy::Basic),
                turns_remaining: 2,
            },
        );
        take_turn(&world, monster);
        take_turn(&world, monster);
        assert!(matches!(
            world.behavior(monster),
            Some(BehaviorPolicy::Confused {
                turns_remaining: 0,
                ..
            })
        ));
        take_turn(&world, monster);
        assert_eq!(world.behavior(monster), Some(BehaviorPolicy::Basic));
        assert!(world.log().contains("Gerblin is no longer confused"));
    }

    #[test]
    fn seeking_never_enters_walls() {
        let world = world(
            "
            ##########
            #@.......#
            #........#
            #.......g#
            ##########
            ",
        );
        let (monster, _) = world.monsters()[0];
        for _ in 0..30 {
            seek(&world, monster);
            let point = world.position(monster).unwrap();
            assert!(!world.grid().is_blocked(point));
            assert_ne!(point, world.player_point());
        }
    }

    #[test]
    fn forcing_a_door_is_heard() {
        let world = world(
            "
            #########
            #@..+.g.#
            #########
            ",
        );
        let (monster, _) = world.monsters()[0];
        let door = Point::new(4, 1);
        let opened = force_door(&world, monster, door);
        assert_eq!(world.grid().cell(door).unwrap().is_open_door(), opened);
        let sound = world.fields().sound.value(door).unwrap();
        assert!(sound < world.tuning().flow.sound_ceiling);
        let cues = world.ecs().read_resource::<AudioQueue>();
        let expected = if opened {
            AudioCue::DoorBreak
        } else {
            AudioCue::DoorShake
        };
        assert_eq!(cues.pending().last(), Some(&expected));
    }

    #[test]
    fn door_strength_check_has_a_threshold() {
        let world = world(
            "
            #########
            #@..+.g.#
            #########
            ",
        );
        let (monster, _) = world.monsters()[0];
        let door = Point::new(4, 1);

        // d20 plus a +20 modifier always reaches 18.
        world.with_profile_mut(monster, |p| p.abilities.strength = 50);
        for _ in 0..20 {
            assert!(force_door(&world, monster, door));
            assert!(world.grid_mut().close_door(door));
        }

        // With -20 it never does, and the door stays shut.
        world.with_profile_mut(monster, |p| p.abilities.strength = -30);
        for _ in 0..20 {
            assert!(!force_door(&world, monster, door));
            assert!(world.grid().cell(door).unwrap().is_closed_door());
        }
        assert!(world.log().contains("The door shakes from the other side."));
    }

    #[test]
    fn seeking_sometimes_staggers_off_the_best_step() {
        let world = world(
            "
            ##########
            #@.......#
            #........#
            #.......g#
            ##########
            ",
        );
        let (monster, start) = world.monsters()[0];
        let best = [Point::new(7, 2), Point::new(7, 3)];
        let sideways = Point::new(8, 2);
        let mut staggered = false;
        for _ in 0..200 {
            world.set_position(monster, start);
            seek(&world, monster);
            let point = world.position(monster).unwrap();
            assert!(best.contains(&point) || point == sideways || point == start);
            staggered |= point == sideways;
        }
        assert!(staggered);
    }

    #[test]
    fn blocked_seekers_stay_put() {
        let world = world(
            "
            ########
            #@...gg#
            ########
            ",
        );
        let rear = world.fighter_at(Point::new(6, 1)).unwrap();
        let front = world.fighter_at(Point::new(5, 1)).unwrap();
        for _ in 0..30 {
            seek(&world, rear);
            assert_eq!(world.position(rear), Some(Point::new(6, 1)));
            assert_eq!(world.position(front), Some(Point::new(5, 1)));
        }
    }
}
