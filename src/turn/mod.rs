//! Player intents and the initiative scheduler.
//!
//! A player action that takes time ends the turn: the boundary systems run
//! (lamp, visibility, sound decay, initiative), then every monster whose
//! counter has reached the player's effective speed acts, once per quantum.

pub mod player;

use bracket_geometry::prelude::Point;
use tracing::debug;

use crate::{
    ai,
    combat::progression::{StatChoice, check_level_up, choose_stat},
    ecs::{World, resources::GameState},
    items::{self, ItemUse, Targeting},
    map::LevelSource,
};

/// A decoded player decision.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Move(Point),
    Wait,
    PickUp,
    UseItem(usize),
    DropItem(usize),
    CloseDoor(Point),
    Kick(Point),
    DescendStairs,
    ChooseStat(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Time passed and monsters got `activations` decisions.
    Spent { activations: u32 },
    /// Resolved without taking any time.
    Free,
    /// Not accepted in the current state.
    Ignored,
}

/// Carry out `intent` for the player.
///
/// Nothing is accepted once the player is dead. While a stat choice is
/// pending only [`Intent::ChooseStat`] is.
pub fn perform(
    world: &mut World,
    intent: Intent,
    targeting: &mut dyn Targeting,
    levels: &mut dyn LevelSource,
) -> TurnOutcome {
    if world.game_state() == GameState::Dead {
        return TurnOutcome::Ignored;
    }
    let choosing = world.progression().pending_choices > 0;
    if choosing != matches!(intent, Intent::ChooseStat(_)) {
        return TurnOutcome::Ignored;
    }

    let spent = match intent {
        Intent::Move(delta) => {
            player::move_or_attack(world, delta);
            true
        }
        Intent::Wait => true,
        Intent::PickUp => items::pick_up(world),
        Intent::UseItem(slot) => match world.inventory().get(slot).copied() {
            Some(item) => items::use_item(world, item, targeting) == ItemUse::Used,
            None => false,
        },
        Intent::DropItem(slot) => match world.inventory().get(slot).copied() {
            Some(item) => {
                items::drop_item(world, item);
                true
            }
            None => false,
        },
        Intent::CloseDoor(delta) => player::close_door(world, delta),
        Intent::Kick(delta) => player::kick(world, delta),
        Intent::DescendStairs => {
            player::descend(world, levels);
            false
        }
        Intent::ChooseStat(index) => {
            if let Some(choice) = StatChoice::from_index(index) {
                choose_stat(world, choice);
            }
            false
        }
    };

    if spent {
        end_player_turn(world)
    } else {
        TurnOutcome::Free
    }
}

/// Everything that happens after the player has spent an action.
pub fn end_player_turn(world: &mut World) -> TurnOutcome {
    world.run_boundary();
    let activations = run_scheduler(world);
    world.refresh_view();
    check_level_up(world);
    world.advance_turn();
    TurnOutcome::Spent { activations }
}

/// Let every scheduled actor act while its counter covers the player's
/// effective speed. Stops as soon as the player dies.
pub fn run_scheduler(world: &World) -> u32 {
    let quantum = world
        .effective_stats(world.player())
        .map_or(1, |stats| stats.speed)
        .max(1);
    let mut activations = 0;
    for actor in world.scheduled_actors() {
        loop {
            if world.game_state() == GameState::Dead || !world.has_behavior(actor) {
                break;
            }
            let ready = world
                .with_profile_mut(actor, |profile| {
                    if profile.counter >= quantum {
                        profile.counter -= quantum;
                        true
                    } else {
                        false
                    }
                })
                .unwrap_or(false);
            if !ready {
                break;
            }
            ai::take_turn(world, actor);
            activations += 1;
        }
    }
    debug!(activations, quantum, turn = world.turn(), "scheduler ran");
    activations
}
