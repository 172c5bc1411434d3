//! Saving and restoring a running game.
//!
//! Entities are written in join order and referred to by their position in
//! that list. Flow fields are not stored; they are rebuilt on restore.

use std::collections::HashMap;

use bracket_geometry::prelude::Point;
use serde::{Deserialize, Serialize};
use specs::prelude::{Builder, Entity, Join, WorldExt};
use tracing::debug;

use crate::{
    config::Tuning,
    error::{Result, SimError},
    map::Grid,
};

use super::{
    World,
    components::{
        BehaviorPolicy, BlocksTile, CombatProfile, Corpse, EquipmentProfile, Inventory,
        ItemEffect, ItemProfile, Light, Name, PlayerTag, Position, Progression, Renderable,
    },
    resources::{AudioCue, DungeonDepth, GameState, LogEntry, MessageLog},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Index of the holding actor.
    pub owner: Option<usize>,
    pub stacks: bool,
    pub count: i32,
    pub effect: ItemEffect,
    pub pickup_cue: Option<AudioCue>,
    pub use_cue: Option<AudioCue>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorRecord {
    pub position: Option<(i32, i32)>,
    pub renderable: Option<Renderable>,
    pub name: Option<String>,
    pub blocks: bool,
    pub corpse: bool,
    pub combat: Option<CombatProfile>,
    pub behavior: Option<BehaviorPolicy>,
    pub item: Option<ItemRecord>,
    pub equipment: Option<EquipmentProfile>,
    pub progression: Option<Progression>,
    pub light: Option<Light>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub grid: Grid,
    pub actors: Vec<ActorRecord>,
    pub player: usize,
    pub stairs: Option<usize>,
    /// The player's inventory, in menu order.
    pub inventory: Vec<usize>,
    pub messages: Vec<LogEntry>,
    pub game_state: GameState,
    pub depth: u32,
    pub turn: u64,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

fn bad(what: impl Into<String>) -> SimError {
    SimError::BadSnapshot(what.into())
}

impl World {
    pub fn snapshot(&self) -> Snapshot {
        let ecs = &self.ecs;
        let entities = ecs.entities();
        let order: Vec<Entity> = (&entities).join().collect();
        let index: HashMap<Entity, usize> =
            order.iter().enumerate().map(|(i, e)| (*e, i)).collect();

        let positions = ecs.read_storage::<Position>();
        let renderables = ecs.read_storage::<Renderable>();
        let names = ecs.read_storage::<Name>();
        let blockers = ecs.read_storage::<BlocksTile>();
        let corpses = ecs.read_storage::<Corpse>();
        let profiles = ecs.read_storage::<CombatProfile>();
        let policies = ecs.read_storage::<BehaviorPolicy>();
        let items = ecs.read_storage::<ItemProfile>();
        let equipment = ecs.read_storage::<EquipmentProfile>();
        let progressions = ecs.read_storage::<Progression>();
        let lights = ecs.read_storage::<Light>();

        let actors = order
            .iter()
            .map(|&entity| ActorRecord {
                position: positions.get(entity).map(|p| (p.point.x, p.point.y)),
                renderable: renderables.get(entity).cloned(),
                name: names.get(entity).map(|n| n.name.clone()),
                blocks: blockers.contains(entity),
                corpse: corpses.contains(entity),
                combat: profiles.get(entity).cloned(),
                behavior: policies.get(entity).cloned(),
                item: items.get(entity).map(|item| ItemRecord {
                    owner: item.owner.and_then(|owner| index.get(&owner).copied()),
                    stacks: item.stacks,
                    count: item.count,
                    effect: item.effect,
                    pickup_cue: item.pickup_cue,
                    use_cue: item.use_cue,
                }),
                equipment: equipment.get(entity).cloned(),
                progression: progressions.get(entity).cloned(),
                light: lights.get(entity).cloned(),
            })
            .collect();

        Snapshot {
            grid: (*self.grid()).clone(),
            actors,
            player: index.get(&self.player).copied().unwrap_or(0),
            stairs: self.stairs.and_then(|stairs| index.get(&stairs).copied()),
            inventory: self
                .inventory()
                .iter()
                .filter_map(|item| index.get(item).copied())
                .collect(),
            messages: self.log().entries().cloned().collect(),
            game_state: self.game_state(),
            depth: self.depth(),
            turn: self.turn,
        }
    }

    /// Rebuild a world from `snapshot`. The random stream restarts from the
    /// tuning seed.
    pub fn restore(snapshot: Snapshot, tuning: Tuning) -> Result<World> {
        let count = snapshot.actors.len();
        if snapshot.player >= count {
            return Err(bad(format!("player index {} of {count}", snapshot.player)));
        }
        if let Some(stairs) = snapshot.stairs.filter(|s| *s >= count) {
            return Err(bad(format!("stairs index {stairs} of {count}")));
        }
        if let Some(item) = snapshot.inventory.iter().find(|i| **i >= count) {
            return Err(bad(format!("inventory index {item} of {count}")));
        }
        for (i, actor) in snapshot.actors.iter().enumerate() {
            if let Some(owner) = actor.item.as_ref().and_then(|item| item.owner) {
                if owner >= count {
                    return Err(bad(format!("actor {i} is held by missing actor {owner}")));
                }
            }
        }

        let Snapshot {
            grid,
            actors,
            player,
            stairs,
            inventory,
            messages,
            game_state,
            depth,
            turn,
        } = snapshot;

        let mut ecs = World::fresh_ecs(tuning, grid.width(), grid.height());
        let entities: Vec<Entity> = actors.iter().map(|_| ecs.create_entity().build()).collect();
        for (record, &entity) in actors.into_iter().zip(&entities) {
            insert(
                &ecs,
                entity,
                record.position.map(|(x, y)| Position {
                    point: Point::new(x, y),
                }),
            );
            insert(&ecs, entity, record.renderable);
            insert(&ecs, entity, record.name.map(|name| Name { name }));
            insert(&ecs, entity, record.blocks.then_some(BlocksTile));
            insert(&ecs, entity, record.corpse.then_some(Corpse));
            insert(&ecs, entity, record.combat);
            insert(&ecs, entity, record.behavior);
            insert(
                &ecs,
                entity,
                record.item.map(|item| ItemProfile {
                    owner: item.owner.map(|owner| entities[owner]),
                    stacks: item.stacks,
                    count: item.count,
                    effect: item.effect,
                    pickup_cue: item.pickup_cue,
                    use_cue: item.use_cue,
                }),
            );
            insert(&ecs, entity, record.equipment);
            insert(&ecs, entity, record.progression);
            insert(&ecs, entity, record.light);
        }

        let player = entities[player];
        insert(&ecs, player, Some(PlayerTag));
        insert(
            &ecs,
            player,
            Some(Inventory {
                items: inventory.iter().map(|i| entities[*i]).collect(),
            }),
        );
        ecs.write_resource::<MessageLog>().restore(messages);
        *ecs.write_resource::<GameState>() = game_state;
        *ecs.write_resource::<DungeonDepth>() = DungeonDepth(depth);
        ecs.insert(grid);

        let stairs = stairs.map(|i| entities[i]);
        let mut world = World::assemble(ecs, player, stairs, turn);
        world.recalculate_fields();
        world.refresh_view();
        debug!(actors = entities.len(), depth, turn, "world restored");
        Ok(world)
    }
}

fn insert<T: specs::Component>(ecs: &specs::World, entity: Entity, component: Option<T>) {
    if let Some(component) = component {
        let _ = ecs.write_storage::<T>().insert(entity, component);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        let level = Grid::parse(
            "
            #########
            #@.g..+>#
            #..$....#
            #########
            ",
            &crate::data::marker_glyphs(),
        )
        .unwrap();
        World::from_level(level, Tuning::default()).unwrap()
    }

    #[test]
    fn snapshot_survives_json() {
        let world = world();
        world.with_profile_mut(world.player(), |p| p.hp = 42);
        let snapshot = world.snapshot();
        let text = snapshot.to_json().unwrap();
        let restored = World::restore(Snapshot::from_json(&text).unwrap(), Tuning::default()).unwrap();

        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.combat_profile(restored.player()).unwrap().hp, 42);
        assert_eq!(restored.position(restored.stairs().unwrap()), Some(Point::new(7, 1)));
        let names: Vec<_> = restored.inventory().into_iter().map(|e| restored.name(e)).collect();
        assert_eq!(names, ["Dagger", "Scroll of Magic Mapping"]);
        assert_eq!(
            restored.item(restored.inventory()[0]).unwrap().owner,
            Some(restored.player())
        );
        assert_eq!(restored.fields().player.value(Point::new(1, 1)), Some(0));
    }

    #[test]
    fn dangling_indices_are_rejected() {
        let mut snapshot = world().snapshot();
        snapshot.inventory.push(99);
        assert!(matches!(
            World::restore(snapshot, Tuning::default()),
            Err(SimError::BadSnapshot(_))
        ));
    }
}
