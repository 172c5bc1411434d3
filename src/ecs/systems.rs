use bracket_geometry::prelude::Point;
use bracket_pathfinding::prelude::{Algorithm2D, BaseMap, field_of_view};
use specs::prelude::*;
use tracing::trace;

use crate::{combat::equipped_bonus, config::Tuning, map::Grid};

use super::{
    components::{BehaviorPolicy, CombatProfile, EquipmentProfile, Inventory, Light, PlayerTag, Position},
    resources::{FlowFields, TorchRadius, VisibleTiles},
};

/// Turns lamp oil into a light radius.
#[derive(Default)]
pub struct LampSystem;

impl<'a> System<'a> for LampSystem {
    type SystemData = (
        ReadStorage<'a, Light>,
        ReadStorage<'a, PlayerTag>,
        ReadExpect<'a, Tuning>,
        WriteExpect<'a, TorchRadius>,
    );

    fn run(&mut self, (lights, players, tuning, mut torch): Self::SystemData) {
        for (light, _) in (&lights, &players).join() {
            torch.0 = light.torch_radius(&tuning.light);
        }
    }
}

/// Recomputes what the player sees and marks it explored.
#[derive(Default)]
pub struct VisibilitySystem;

impl<'a> System<'a> for VisibilitySystem {
    type SystemData = (
        ReadStorage<'a, Position>,
        ReadStorage<'a, PlayerTag>,
        ReadExpect<'a, TorchRadius>,
        WriteExpect<'a, Grid>,
        WriteExpect<'a, VisibleTiles>,
    );

    fn run(&mut self, (positions, players, torch, mut grid, mut visible): Self::SystemData) {
        visible.clear();
        for (pos, _) in (&positions, &players).join() {
            let seen = field_of_view(pos.point, torch.0, &*grid);
            for point in seen {
                if !grid.in_bounds(point) {
                    continue;
                }
                visible.reveal(point);
                grid.set_explored(point);
            }
        }
        trace!(visible = visible.count(), radius = torch.0, "recomputed visibility");
    }
}

#[derive(Default)]
pub struct SoundDecaySystem;

impl<'a> System<'a> for SoundDecaySystem {
    type SystemData = (WriteExpect<'a, FlowFields>, ReadExpect<'a, Tuning>);

    fn run(&mut self, (mut fields, tuning): Self::SystemData) {
        fields
            .sound
            .decay(tuning.flow.sound_decay, tuning.flow.sound_ceiling);
    }
}

/// Adds each scheduled actor's effective speed to its initiative counter.
#[derive(Default)]
pub struct InitiativeSystem;

impl<'a> System<'a> for InitiativeSystem {
    type SystemData = (
        Entities<'a>,
        WriteStorage<'a, CombatProfile>,
        ReadStorage<'a, BehaviorPolicy>,
        ReadStorage<'a, Inventory>,
        ReadStorage<'a, EquipmentProfile>,
    );

    fn run(
        &mut self,
        (entities, mut profiles, policies, inventories, equipment): Self::SystemData,
    ) {
        for (entity, profile, _) in (&entities, &mut profiles, &policies).join() {
            let bonus = equipped_bonus(entity, &inventories, &equipment);
            let speed = (profile.base_speed + bonus.speed).max(0);
            profile.counter = profile.counter.saturating_add(speed);
        }
    }
}

impl BaseMap for Grid {
    fn is_opaque(&self, idx: usize) -> bool {
        let point = self.index_to_point2d(idx);
        self.blocks_sight(point)
    }
}

impl Algorithm2D for Grid {
    fn dimensions(&self) -> Point {
        Point::new(self.width(), self.height())
    }

    fn in_bounds(&self, point: Point) -> bool {
        Grid::in_bounds(self, point)
    }
}
