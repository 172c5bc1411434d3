pub mod components;
pub mod resources;
pub mod snapshot;
pub mod spawner;
pub mod systems;

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;
use specs::prelude::{
    Dispatcher, DispatcherBuilder, Entity, Join, RunNow, World as SpecsWorld, WorldExt,
};
use specs::shred::{Fetch, FetchMut};
use tracing::{debug, trace};

use crate::{
    combat::equipped_bonus,
    config::Tuning,
    error::Result,
    flow::BloodMap,
    map::{Grid, LevelPlan, ParsedLevel},
};

use self::{
    components::{
        BehaviorPolicy, BlocksTile, CombatProfile, Corpse, EffectiveStats, EquipmentProfile,
        Inventory, ItemEffect, ItemProfile, Light, Name, PlayerTag, Position, Progression,
        Renderable,
    },
    resources::{
        AudioCue, AudioQueue, Blood, DungeonDepth, FlowFields, GameState, MessageLog, Severity,
        TorchRadius, VisibleTiles,
    },
    systems::{InitiativeSystem, LampSystem, SoundDecaySystem, VisibilitySystem},
};

/// Everything the simulation knows about the current game.
///
/// Terrain, flow fields, narration and the random stream are specs
/// resources; actors are specs entities. The turn-boundary dispatcher runs
/// the lamp, visibility, sound decay and initiative systems in that order.
pub struct World {
    ecs: SpecsWorld,
    boundary: Dispatcher<'static, 'static>,
    player: Entity,
    stairs: Option<Entity>,
    turn: u64,
}

impl World {
    pub fn new(plan: LevelPlan, tuning: Tuning) -> Self {
        let mut ecs = Self::fresh_ecs(tuning, plan.grid.width(), plan.grid.height());
        let player = spawner::spawn_player(&mut ecs, plan.start);
        let mut world = Self::assemble(ecs, player, None, 0);
        world.message(
            "Welcome stranger! Prepare to perish in the Tombs of the Ancient Kings.",
            Severity::Danger,
        );
        world.install_level(plan);
        world
    }

    pub fn from_level(level: ParsedLevel, tuning: Tuning) -> Result<Self> {
        Ok(Self::new(level.into_plan()?, tuning))
    }

    fn fresh_ecs(tuning: Tuning, width: i32, height: i32) -> SpecsWorld {
        let mut ecs = SpecsWorld::new();
        Self::register_components(&mut ecs);
        ecs.insert(RandomNumberGenerator::seeded(tuning.seed));
        ecs.insert(MessageLog::new(tuning.log.capacity));
        ecs.insert(AudioQueue::default());
        ecs.insert(GameState::Playing);
        ecs.insert(DungeonDepth(1));
        ecs.insert(TorchRadius(tuning.light.max_torch_radius));
        ecs.insert(FlowFields::new(width, height, &tuning.flow));
        ecs.insert(Blood(BloodMap::new(width, height)));
        ecs.insert(VisibleTiles::new(width, height));
        ecs.insert(Grid::new(width, height));
        ecs.insert(tuning);
        ecs
    }

    fn assemble(ecs: SpecsWorld, player: Entity, stairs: Option<Entity>, turn: u64) -> Self {
        let boundary = DispatcherBuilder::new()
            .with(LampSystem, "lamp", &[])
            .with(VisibilitySystem, "visibility", &["lamp"])
            .with(SoundDecaySystem, "sound_decay", &["visibility"])
            .with(InitiativeSystem, "initiative", &["sound_decay"])
            .build();
        Self {
            ecs,
            boundary,
            player,
            stairs,
            turn,
        }
    }

    fn register_components(world: &mut SpecsWorld) {
        world.register::<Position>();
        world.register::<Renderable>();
        world.register::<Name>();
        world.register::<BlocksTile>();
        world.register::<PlayerTag>();
        world.register::<Corpse>();
        world.register::<CombatProfile>();
        world.register::<BehaviorPolicy>();
        world.register::<ItemProfile>();
        world.register::<EquipmentProfile>();
        world.register::<Inventory>();
        world.register::<Progression>();
        world.register::<Light>();
    }

    pub fn ecs(&self) -> &SpecsWorld {
        &self.ecs
    }

    pub fn ecs_mut(&mut self) -> &mut SpecsWorld {
        &mut self.ecs
    }

    pub fn player(&self) -> Entity {
        self.player
    }

    pub fn stairs(&self) -> Option<Entity> {
        self.stairs
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub(crate) fn advance_turn(&mut self) {
        self.turn = self.turn.wrapping_add(1);
    }

    pub fn tuning(&self) -> Fetch<'_, Tuning> {
        self.ecs.read_resource::<Tuning>()
    }

    pub fn grid(&self) -> Fetch<'_, Grid> {
        self.ecs.read_resource::<Grid>()
    }

    pub fn grid_mut(&self) -> FetchMut<'_, Grid> {
        self.ecs.write_resource::<Grid>()
    }

    pub fn fields(&self) -> Fetch<'_, FlowFields> {
        self.ecs.read_resource::<FlowFields>()
    }

    pub fn blood(&self) -> Fetch<'_, Blood> {
        self.ecs.read_resource::<Blood>()
    }

    pub fn mark_blood(&self, point: Point) {
        self.ecs.write_resource::<Blood>().0.mark(point);
    }

    pub(crate) fn clear_blood(&self) {
        self.ecs.write_resource::<Blood>().0.clear();
    }

    pub fn rng(&self) -> FetchMut<'_, RandomNumberGenerator> {
        self.ecs.write_resource::<RandomNumberGenerator>()
    }

    pub fn log(&self) -> Fetch<'_, MessageLog> {
        self.ecs.read_resource::<MessageLog>()
    }

    pub fn message<S: Into<String>>(&self, text: S, severity: Severity) {
        self.ecs.write_resource::<MessageLog>().push(text, severity);
    }

    pub fn play(&self, cue: AudioCue) {
        self.ecs.write_resource::<AudioQueue>().push(cue);
    }

    pub fn drain_audio(&mut self) -> Vec<AudioCue> {
        self.ecs.write_resource::<AudioQueue>().drain()
    }

    pub fn game_state(&self) -> GameState {
        *self.ecs.read_resource::<GameState>()
    }

    pub(crate) fn set_game_state(&self, state: GameState) {
        *self.ecs.write_resource::<GameState>() = state;
    }

    pub fn depth(&self) -> u32 {
        self.ecs.read_resource::<DungeonDepth>().0
    }

    pub(crate) fn set_depth(&self, depth: u32) {
        self.ecs.write_resource::<DungeonDepth>().0 = depth;
    }

    pub fn torch_radius(&self) -> i32 {
        self.ecs.read_resource::<TorchRadius>().0
    }

    pub fn is_visible(&self, point: Point) -> bool {
        self.ecs.read_resource::<VisibleTiles>().is_visible(point)
    }

    pub fn position(&self, entity: Entity) -> Option<Point> {
        self.ecs
            .read_storage::<Position>()
            .get(entity)
            .map(|pos| pos.point)
    }

    pub fn player_point(&self) -> Point {
        self.position(self.player).unwrap_or(Point::new(0, 0))
    }

    pub fn set_position(&self, entity: Entity, point: Point) {
        let mut positions = self.ecs.write_storage::<Position>();
        if let Some(pos) = positions.get_mut(entity) {
            pos.point = point;
        } else {
            let _ = positions.insert(entity, Position { point });
        }
    }

    pub(crate) fn remove_position(&self, entity: Entity) {
        self.ecs.write_storage::<Position>().remove(entity);
    }

    pub fn name(&self, entity: Entity) -> String {
        self.ecs
            .read_storage::<Name>()
            .get(entity)
            .map(|n| n.name.clone())
            .unwrap_or_else(|| "something".to_string())
    }

    pub(crate) fn set_name(&self, entity: Entity, name: String) {
        let _ = self.ecs.write_storage::<Name>().insert(entity, Name { name });
    }

    pub fn renderable(&self, entity: Entity) -> Option<Renderable> {
        self.ecs.read_storage::<Renderable>().get(entity).cloned()
    }

    pub(crate) fn set_look(&self, entity: Entity, glyph: char, color: (u8, u8, u8), order: i32) {
        let _ = self.ecs.write_storage::<Renderable>().insert(
            entity,
            Renderable {
                glyph,
                color,
                order,
            },
        );
    }

    pub fn combat_profile(&self, entity: Entity) -> Option<CombatProfile> {
        self.ecs.read_storage::<CombatProfile>().get(entity).cloned()
    }

    /// Run `f` against the fighter profile of `entity`, if it has one.
    pub fn with_profile_mut<R>(
        &self,
        entity: Entity,
        f: impl FnOnce(&mut CombatProfile) -> R,
    ) -> Option<R> {
        self.ecs
            .write_storage::<CombatProfile>()
            .get_mut(entity)
            .map(f)
    }

    pub fn effective_stats(&self, entity: Entity) -> Option<EffectiveStats> {
        let profiles = self.ecs.read_storage::<CombatProfile>();
        let inventories = self.ecs.read_storage::<Inventory>();
        let equipment = self.ecs.read_storage::<EquipmentProfile>();
        profiles
            .get(entity)
            .map(|profile| profile.effective(&equipped_bonus(entity, &inventories, &equipment)))
    }

    pub fn behavior(&self, entity: Entity) -> Option<BehaviorPolicy> {
        self.ecs.read_storage::<BehaviorPolicy>().get(entity).cloned()
    }

    pub(crate) fn set_behavior(&self, entity: Entity, policy: BehaviorPolicy) {
        let _ = self.ecs.write_storage::<BehaviorPolicy>().insert(entity, policy);
    }

    pub fn has_behavior(&self, entity: Entity) -> bool {
        self.ecs.read_storage::<BehaviorPolicy>().contains(entity)
    }

    pub fn blocks(&self, entity: Entity) -> bool {
        self.ecs.read_storage::<BlocksTile>().contains(entity)
    }

    pub fn is_corpse(&self, entity: Entity) -> bool {
        self.ecs.read_storage::<Corpse>().contains(entity)
    }

    pub fn progression(&self) -> Progression {
        self.ecs
            .read_storage::<Progression>()
            .get(self.player)
            .cloned()
            .unwrap_or_default()
    }

    pub fn light(&self) -> Option<Light> {
        self.ecs.read_storage::<Light>().get(self.player).cloned()
    }

    pub(crate) fn with_light_mut(&self, f: impl FnOnce(&mut Light)) {
        if let Some(light) = self.ecs.write_storage::<Light>().get_mut(self.player) {
            f(light);
        }
    }

    pub fn inventory(&self) -> Vec<Entity> {
        self.ecs
            .read_storage::<Inventory>()
            .get(self.player)
            .map(|inv| inv.items.clone())
            .unwrap_or_default()
    }

    pub fn item(&self, entity: Entity) -> Option<ItemProfile> {
        self.ecs.read_storage::<ItemProfile>().get(entity).cloned()
    }

    pub fn equipment(&self, entity: Entity) -> Option<EquipmentProfile> {
        self.ecs.read_storage::<EquipmentProfile>().get(entity).cloned()
    }

    /// Every entity standing on `point`, in creation order.
    pub fn entities_at(&self, point: Point) -> Vec<Entity> {
        let entities = self.ecs.entities();
        let positions = self.ecs.read_storage::<Position>();
        (&entities, &positions)
            .join()
            .filter(|(_, pos)| pos.point == point)
            .map(|(entity, _)| entity)
            .collect()
    }

    pub fn blocker_at(&self, point: Point) -> Option<Entity> {
        let entities = self.ecs.entities();
        let positions = self.ecs.read_storage::<Position>();
        let blockers = self.ecs.read_storage::<BlocksTile>();
        (&entities, &positions, &blockers)
            .join()
            .find(|(_, pos, _)| pos.point == point)
            .map(|(entity, _, _)| entity)
    }

    pub fn fighter_at(&self, point: Point) -> Option<Entity> {
        let entities = self.ecs.entities();
        let positions = self.ecs.read_storage::<Position>();
        let profiles = self.ecs.read_storage::<CombatProfile>();
        (&entities, &positions, &profiles)
            .join()
            .find(|(_, pos, _)| pos.point == point)
            .map(|(entity, _, _)| entity)
    }

    /// Terrain or a blocking actor stands in the way.
    pub fn is_blocked(&self, point: Point) -> bool {
        self.grid().is_blocked(point) || self.blocker_at(point).is_some()
    }

    /// Fighters other than the player, with their positions.
    pub fn monsters(&self) -> Vec<(Entity, Point)> {
        let entities = self.ecs.entities();
        let positions = self.ecs.read_storage::<Position>();
        let profiles = self.ecs.read_storage::<CombatProfile>();
        (&entities, &positions, &profiles)
            .join()
            .filter(|(entity, _, _)| *entity != self.player)
            .map(|(entity, pos, _)| (entity, pos.point))
            .collect()
    }

    /// Actors the scheduler activates, in creation order.
    pub fn scheduled_actors(&self) -> Vec<Entity> {
        let entities = self.ecs.entities();
        let profiles = self.ecs.read_storage::<CombatProfile>();
        let policies = self.ecs.read_storage::<BehaviorPolicy>();
        (&entities, &profiles, &policies)
            .join()
            .map(|(entity, _, _)| entity)
            .collect()
    }

    /// Step `entity` by `delta` unless the destination is blocked.
    pub fn move_by(&self, entity: Entity, delta: Point) -> bool {
        let Some(from) = self.position(entity) else {
            return false;
        };
        let to = from + delta;
        if self.is_blocked(to) {
            return false;
        }
        self.set_position(entity, to);
        trace!(?entity, x = to.x, y = to.y, "moved");
        true
    }

    /// Reset the player field around the player's new position.
    pub fn reseed_player_field(&self) {
        let target = self.player_point();
        let radius = self.tuning().flow.player_radius;
        let grid = self.grid();
        let mut fields = self.ecs.write_resource::<FlowFields>();
        let field = &mut fields.player;
        field.clear_goals();
        field.add_goal(target, 0);
        field.reset(radius);
        let stats = field.recalculate_local(&grid, target, radius, false);
        trace!(passes = stats.passes, changes = stats.changes, "reseeded player field");
    }

    /// Goals at every gold pile lying on the floor.
    pub fn reseed_gold_field(&self) {
        let default = self.tuning().flow.default_distance;
        let piles: Vec<Point> = {
            let positions = self.ecs.read_storage::<Position>();
            let items = self.ecs.read_storage::<ItemProfile>();
            (&positions, &items)
                .join()
                .filter(|(_, item)| item.effect == ItemEffect::ThrowGold && item.owner.is_none())
                .map(|(pos, _)| pos.point)
                .collect()
        };
        let grid = self.grid();
        let mut fields = self.ecs.write_resource::<FlowFields>();
        fields.gold.clear_goals();
        for pile in &piles {
            fields.gold.add_goal(*pile, 0);
        }
        let stats = fields.gold.recalculate_full(&grid, default, false);
        debug!(piles = piles.len(), passes = stats.passes, "reseeded gold field");
    }

    /// Broadcast a noise through the sound field. Louder sounds start lower
    /// and so spread further before fading into the ceiling.
    pub fn emit_sound(&self, source: Point, intensity: i32) {
        let ceiling = self.tuning().flow.sound_ceiling;
        let grid = self.grid();
        let mut fields = self.ecs.write_resource::<FlowFields>();
        let sound = &mut fields.sound;
        sound.clear_goals();
        sound.add_goal(source, (ceiling - intensity).max(0));
        sound.reset(ceiling);
        let stats = sound.recalculate_local(&grid, source, ceiling, true);
        debug!(x = source.x, y = source.y, intensity, changes = stats.changes, "sound emitted");
    }

    fn recalculate_fields(&self) {
        let (default, ceiling) = {
            let tuning = self.tuning();
            (tuning.flow.default_distance, tuning.flow.sound_ceiling)
        };
        let target = self.player_point();
        {
            let grid = self.grid();
            let mut fields = self.ecs.write_resource::<FlowFields>();
            fields.player.clear_goals();
            fields.player.add_goal(target, 0);
            let stats = fields.player.recalculate_full(&grid, default, false);
            debug!(passes = stats.passes, changes = stats.changes, "built player field");
            fields.sound.clear_goals();
            fields.sound.reset(ceiling);
        }
        self.reseed_gold_field();
    }

    /// Recompute the torch radius and the visible set right now.
    pub fn refresh_view(&mut self) {
        LampSystem.run_now(&self.ecs);
        VisibilitySystem.run_now(&self.ecs);
    }

    /// Run the turn-boundary systems.
    pub(crate) fn run_boundary(&mut self) {
        self.boundary.dispatch(&self.ecs);
        self.ecs.maintain();
    }

    /// Replace terrain, fields and level actors with `plan`. The player
    /// and whatever it carries survive.
    pub(crate) fn install_level(&mut self, plan: LevelPlan) {
        let LevelPlan {
            grid,
            start,
            stairs,
            markers,
            rooms,
        } = plan;
        let (width, height) = (grid.width(), grid.height());
        let flow = self.tuning().flow.clone();
        self.ecs.insert(FlowFields::new(width, height, &flow));
        self.ecs.insert(Blood(BloodMap::new(width, height)));
        self.ecs.insert(VisibleTiles::new(width, height));
        self.ecs.insert(grid);

        self.set_position(self.player, start);
        self.stairs = stairs.map(|point| spawner::spawn_stairs(&mut self.ecs, point));
        for marker in markers {
            spawner::spawn_marker(self, marker);
        }
        let depth = self.depth();
        for room in rooms {
            spawner::populate_room(self, room, depth);
        }
        self.recalculate_fields();
        self.refresh_view();
        debug!(depth, width, height, "level installed");
    }

    /// Delete every actor except the player and its belongings.
    pub(crate) fn clear_level(&mut self) {
        let doomed: Vec<Entity> = {
            let entities = self.ecs.entities();
            let items = self.ecs.read_storage::<ItemProfile>();
            (&entities)
                .join()
                .filter(|entity| *entity != self.player)
                .filter(|entity| {
                    items
                        .get(*entity)
                        .map_or(true, |item| item.owner != Some(self.player))
                })
                .collect()
        };
        for entity in doomed {
            let _ = self.ecs.delete_entity(entity);
        }
        self.stairs = None;
        self.ecs.maintain();
    }
}
