use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;

use tombsim::{
    Tuning, World,
    combat::{
        AttackOutcome, attack, damage_range, progression::check_level_up, roll_damage,
        strength_modifier, take_damage,
    },
    data::{items::ItemKind, marker_glyphs, monsters::MonsterKind},
    ecs::{
        components::BehaviorPolicy,
        resources::GameState,
        snapshot::Snapshot,
        spawner::{give, spawn_monster},
    },
    items::{NoTargeting, equip},
    map::{Grid, RepeatingLevels},
    turn::{Intent, TurnOutcome, perform},
};

const ARENA: &str = "
    ##############
    #@...........#
    #............#
    #............#
    #...........>#
    ##############
";

fn arena() -> (World, RepeatingLevels) {
    let plan = Grid::parse(ARENA, &marker_glyphs())
        .unwrap()
        .into_plan()
        .unwrap();
    let levels = RepeatingLevels::new(vec![plan.clone()]).unwrap();
    (World::new(plan, Tuning::default()), levels)
}

fn monster_at(world: &mut World, point: Point) -> specs::Entity {
    spawn_monster(world.ecs_mut(), MonsterKind::Gerblin, point)
}

#[test]
fn strength_modifier_table() {
    assert_eq!(strength_modifier(10), 0);
    assert_eq!(strength_modifier(12), 1);
    assert_eq!(strength_modifier(8), -1);
    assert_eq!(strength_modifier(20), 5);
    assert_eq!(strength_modifier(9), -1);
}

#[test]
fn equipping_into_an_occupied_slot_swaps() {
    let (mut world, _) = arena();
    let player = world.player();
    let dagger = world.inventory()[0];
    let base = world.combat_profile(player).unwrap();
    let sword = give(world.ecs_mut(), player, ItemKind::Sword, false);

    equip(&world, sword);

    assert!(!world.equipment(dagger).unwrap().equipped);
    assert!(world.equipment(sword).unwrap().equipped);
    let stats = world.effective_stats(player).unwrap();
    let (_, bonus) = ItemKind::Sword.template().equipment.unwrap();
    assert_eq!(
        stats.abilities.strength,
        base.abilities.strength + bonus.abilities.strength
    );
    assert_eq!(stats.damage, base.base_damage + bonus.damage);
    assert_eq!(stats.to_hit, bonus.to_hit);
    assert!(world.log().contains("Equipped Sword on right hand."));
}

#[test]
fn killing_a_monster_strips_it_and_pays_out() {
    let (mut world, _) = arena();
    let monster = monster_at(&mut world, Point::new(6, 2));
    world.with_profile_mut(monster, |p| p.hp = 5);
    let bounty = world.combat_profile(monster).unwrap().xp;
    let before = world.combat_profile(world.player()).unwrap().xp;

    take_damage(&world, monster, 5);

    assert!(world.combat_profile(monster).is_none());
    assert!(world.behavior(monster).is_none());
    assert!(!world.blocks(monster));
    assert!(world.is_corpse(monster));
    assert!(world.blood().0.is_marked(Point::new(6, 2)));
    assert_eq!(world.name(monster), "Gerblin Corpse");
    assert_eq!(
        world.combat_profile(world.player()).unwrap().xp,
        before + bounty
    );
}

#[test]
fn player_death_freezes_the_game() {
    let (mut world, mut levels) = arena();
    let player = world.player();
    take_damage(&world, player, 1_000);

    assert_eq!(world.game_state(), GameState::Dead);
    assert_eq!(world.combat_profile(player).unwrap().hp, 0);
    assert!(!world.blocks(player));
    assert!(world.log().contains("You died!"));
    let outcome = perform(&mut world, Intent::Wait, &mut NoTargeting, &mut levels);
    assert_eq!(outcome, TurnOutcome::Ignored);
    assert_eq!(world.turn(), 0);
}

#[test]
fn level_up_carries_experience_over() {
    let (mut world, mut levels) = arena();
    world.with_profile_mut(world.player(), |p| p.xp = 500);

    assert_eq!(check_level_up(&world), 1);

    let progression = world.progression();
    assert_eq!(progression.level, 2);
    assert_eq!(progression.pending_choices, 1);
    assert_eq!(world.combat_profile(world.player()).unwrap().xp, 150);

    // The choice has to be made before anything else.
    let outcome = perform(&mut world, Intent::Wait, &mut NoTargeting, &mut levels);
    assert_eq!(outcome, TurnOutcome::Ignored);
    let max_hp = world.effective_stats(world.player()).unwrap().max_hp;
    let outcome = perform(&mut world, Intent::ChooseStat(0), &mut NoTargeting, &mut levels);
    assert_eq!(outcome, TurnOutcome::Free);
    assert_eq!(world.progression().pending_choices, 0);
    assert_eq!(
        world.effective_stats(world.player()).unwrap().max_hp,
        max_hp + world.tuning().progression.constitution_hp
    );
}

#[test]
fn faster_monsters_act_more_often() {
    let (mut world, mut levels) = arena();
    let player = world.player();
    let monster = monster_at(&mut world, Point::new(12, 4));
    world.with_profile_mut(monster, |p| p.base_speed = 6);
    let gear_speed = world.effective_stats(player).unwrap().speed
        - world.combat_profile(player).unwrap().base_speed;
    world.with_profile_mut(player, |p| p.base_speed = 3 - gear_speed);

    let outcome = perform(&mut world, Intent::Wait, &mut NoTargeting, &mut levels);

    assert_eq!(outcome, TurnOutcome::Spent { activations: 2 });
    assert_eq!(world.combat_profile(monster).unwrap().counter, 0);
}

#[test]
fn armor_can_soak_every_blow() {
    let (mut world, _) = arena();
    let brute = monster_at(&mut world, Point::new(6, 2));
    let wall = monster_at(&mut world, Point::new(7, 2));
    world.with_profile_mut(brute, |p| {
        p.base_damage = 5;
        p.abilities.strength = 10;
    });
    world.with_profile_mut(wall, |p| p.base_armor_class = 5);

    let range = damage_range(
        &world.effective_stats(brute).unwrap(),
        &world.effective_stats(wall).unwrap(),
    );
    assert_eq!(range, 1..=0);
    let mut rng = RandomNumberGenerator::seeded(7);
    assert_eq!(roll_damage(&mut rng, range), 0);

    let hp = world.combat_profile(wall).unwrap().hp;
    assert_eq!(attack(&world, brute, wall), Some(AttackOutcome::Miss));
    assert_eq!(world.combat_profile(wall).unwrap().hp, hp);
    assert!(world.log().contains("misses the Gerblin"));
}

#[test]
fn a_saved_game_resumes_where_it_stopped() {
    let (mut world, mut levels) = arena();
    monster_at(&mut world, Point::new(10, 3));
    world.with_profile_mut(world.player(), |p| p.hp = 61);
    for intent in [
        Intent::Move(Point::new(1, 0)),
        Intent::Move(Point::new(1, 1)),
        Intent::Wait,
    ] {
        perform(&mut world, intent, &mut NoTargeting, &mut levels);
    }

    let snapshot = world.snapshot();
    let json = snapshot.to_json().unwrap();
    let restored = World::restore(Snapshot::from_json(&json).unwrap(), Tuning::default()).unwrap();

    assert_eq!(restored.snapshot(), snapshot);
    assert_eq!(restored.player_point(), world.player_point());
    assert_eq!(restored.turn(), 3);
    assert_eq!(restored.light(), world.light());
    assert_eq!(restored.monsters().len(), world.monsters().len());
    assert!(matches!(
        restored.behavior(restored.monsters()[0].0),
        Some(BehaviorPolicy::Basic)
    ));
}
