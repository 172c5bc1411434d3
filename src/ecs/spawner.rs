use bracket_color::prelude::WHITE;
use bracket_geometry::prelude::{Point, Rect};
use bracket_random::prelude::RandomNumberGenerator;
use specs::prelude::{Builder, Entity, World as SpecsWorld, WorldExt};
use strum::IntoEnumIterator;
use tracing::{debug, warn};

use crate::{
    config::Tuning,
    data::{
        MAX_ITEMS, MAX_MONSTERS, from_dungeon_level,
        items::ItemKind,
        monsters::{self, MonsterKind},
        random_choice_index,
    },
    map::Marker,
};

use super::{
    World,
    components::{
        BehaviorPolicy, BlocksTile, EquipmentProfile, Inventory, ItemProfile, Light, Name,
        PlayerTag, Position, Progression, Renderable,
    },
};

pub const STAIRS_NAME: &str = "Stairs";

const ITEM_ORDER: i32 = 1;
const MONSTER_ORDER: i32 = 2;
const PLAYER_ORDER: i32 = 3;

/// The player, carrying a dagger in hand and a scroll of magic mapping.
pub fn spawn_player(ecs: &mut SpecsWorld, start: Point) -> Entity {
    let max_oil = ecs.read_resource::<Tuning>().light.max_oil;
    let player = ecs
        .create_entity()
        .with(Position { point: start })
        .with(Renderable {
            glyph: monsters::PLAYER_GLYPH,
            color: monsters::PLAYER_COLOR,
            order: PLAYER_ORDER,
        })
        .with(Name {
            name: monsters::PLAYER_NAME.to_string(),
        })
        .with(monsters::player_profile())
        .with(Progression::default())
        .with(Light {
            oil: max_oil,
            max_oil,
        })
        .with(Inventory::default())
        .with(BlocksTile)
        .with(PlayerTag)
        .build();
    give(ecs, player, ItemKind::Dagger, true);
    give(ecs, player, ItemKind::MagicMapping, false);
    player
}

/// Create an item either lying at `point` or carried by `owner`.
pub fn build_item(
    ecs: &mut SpecsWorld,
    kind: ItemKind,
    point: Option<Point>,
    owner: Option<Entity>,
) -> Entity {
    let template = kind.template();
    let mut builder = ecs
        .create_entity()
        .with(Renderable {
            glyph: template.glyph,
            color: template.color,
            order: ITEM_ORDER,
        })
        .with(Name {
            name: template.name.to_string(),
        })
        .with(ItemProfile {
            owner,
            stacks: template.stacks,
            count: template.count,
            effect: template.effect,
            pickup_cue: template.pickup_cue,
            use_cue: template.use_cue,
        });
    if let Some(point) = point {
        builder = builder.with(Position { point });
    }
    if let Some((slot, bonus)) = template.equipment {
        builder = builder.with(EquipmentProfile {
            bonus,
            slot,
            equipped: false,
        });
    }
    builder.build()
}

/// Put a fresh item straight into `holder`'s inventory.
pub fn give(ecs: &mut SpecsWorld, holder: Entity, kind: ItemKind, equipped: bool) -> Entity {
    let item = build_item(ecs, kind, None, Some(holder));
    if equipped {
        if let Some(gear) = ecs.write_storage::<EquipmentProfile>().get_mut(item) {
            gear.equipped = true;
        }
    }
    if let Some(inventory) = ecs.write_storage::<Inventory>().get_mut(holder) {
        inventory.items.push(item);
    }
    item
}

pub fn spawn_monster(ecs: &mut SpecsWorld, kind: MonsterKind, point: Point) -> Entity {
    let template = kind.template();
    ecs.create_entity()
        .with(Position { point })
        .with(Renderable {
            glyph: template.glyph,
            color: template.color,
            order: MONSTER_ORDER,
        })
        .with(Name {
            name: template.name.to_string(),
        })
        .with(template.profile())
        .with(BehaviorPolicy::Basic)
        .with(BlocksTile)
        .build()
}

pub fn spawn_stairs(ecs: &mut SpecsWorld, point: Point) -> Entity {
    ecs.create_entity()
        .with(Position { point })
        .with(Renderable {
            glyph: '>',
            color: WHITE,
            order: 0,
        })
        .with(Name {
            name: STAIRS_NAME.to_string(),
        })
        .build()
}

pub fn spawn_gold(ecs: &mut SpecsWorld, point: Point, count: i32) -> Entity {
    let pile = build_item(ecs, ItemKind::Gold, Some(point), None);
    if let Some(item) = ecs.write_storage::<ItemProfile>().get_mut(pile) {
        item.count = count;
    }
    pile
}

pub fn spawn_marker(world: &mut World, marker: Marker) {
    let ecs = world.ecs_mut();
    if let Some(kind) = MonsterKind::from_marker(marker.glyph) {
        spawn_monster(ecs, kind, marker.point);
    } else if let Some(kind) = ItemKind::from_marker(marker.glyph) {
        build_item(ecs, kind, Some(marker.point), None);
    } else {
        warn!(glyph = %marker.glyph, x = marker.point.x, y = marker.point.y, "unplaceable marker");
    }
}

fn room_point(rng: &mut RandomNumberGenerator, room: Rect) -> Point {
    Point::new(rng.range(room.x1 + 1, room.x2), rng.range(room.y1 + 1, room.y2))
}

/// Scatter depth-weighted monsters and items over the inside of `room`.
/// Picks landing on a blocked tile are dropped.
pub fn populate_room(world: &mut World, room: Rect, depth: u32) {
    if room.x2 - room.x1 < 2 || room.y2 - room.y1 < 2 {
        return;
    }

    let monster_kinds: Vec<MonsterKind> = MonsterKind::iter().collect();
    let monster_chances: Vec<i32> = monster_kinds
        .iter()
        .map(|kind| from_dungeon_level(kind.chances(), depth))
        .collect();
    let item_kinds: Vec<ItemKind> = ItemKind::iter().collect();
    let item_chances: Vec<i32> = item_kinds
        .iter()
        .map(|kind| from_dungeon_level(kind.chances(), depth))
        .collect();

    let mut monsters = Vec::new();
    let mut items = Vec::new();
    {
        let mut rng = world.rng();
        let count = rng.range(0, from_dungeon_level(MAX_MONSTERS, depth) + 1);
        for _ in 0..count {
            let point = room_point(&mut rng, room);
            if let Some(idx) = random_choice_index(&mut rng, &monster_chances) {
                monsters.push((monster_kinds[idx], point));
            }
        }
        let count = rng.range(0, from_dungeon_level(MAX_ITEMS, depth) + 1);
        for _ in 0..count {
            let point = room_point(&mut rng, room);
            if let Some(idx) = random_choice_index(&mut rng, &item_chances) {
                items.push((item_kinds[idx], point));
            }
        }
    }

    let mut placed = 0;
    for (kind, point) in monsters {
        if world.is_blocked(point) {
            continue;
        }
        spawn_monster(world.ecs_mut(), kind, point);
        placed += 1;
    }
    for (kind, point) in items {
        if world.is_blocked(point) {
            continue;
        }
        build_item(world.ecs_mut(), kind, Some(point), None);
        placed += 1;
    }
    debug!(x = room.x1, y = room.y1, depth, placed, "populated room");
}
