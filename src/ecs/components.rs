use std::ops::AddAssign;

use bracket_geometry::prelude::Point;
use serde::{Deserialize, Serialize};
use specs::prelude::{Component, Entity, NullStorage, VecStorage};
use strum::Display;

use crate::config::LightTuning;

use super::resources::AudioCue;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub point: Point,
}

impl Component for Position {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Renderable {
    pub glyph: char,
    pub color: (u8, u8, u8),
    /// Lower orders are drawn first.
    pub order: i32,
}

impl Component for Renderable {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Name {
    pub name: String,
}

impl Component for Name {
    type Storage = VecStorage<Self>;
}

/// Occupies its tile for movement.
#[derive(Default)]
pub struct BlocksTile;

impl Component for BlocksTile {
    type Storage = NullStorage<Self>;
}

#[derive(Default)]
pub struct PlayerTag;

impl Component for PlayerTag {
    type Storage = NullStorage<Self>;
}

#[derive(Default)]
pub struct Corpse;

impl Component for Corpse {
    type Storage = NullStorage<Self>;
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
    pub luck: i32,
}

/// Flat modifiers granted by one piece of equipment.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBonus {
    pub abilities: AbilityScores,
    pub damage: i32,
    pub speed: i32,
    pub to_hit: i32,
    pub armor_class: i32,
    pub max_hp: i32,
}

impl AddAssign for AbilityScores {
    fn add_assign(&mut self, rhs: Self) {
        self.strength += rhs.strength;
        self.dexterity += rhs.dexterity;
        self.constitution += rhs.constitution;
        self.intelligence += rhs.intelligence;
        self.wisdom += rhs.wisdom;
        self.charisma += rhs.charisma;
        self.luck += rhs.luck;
    }
}

impl AddAssign for StatBonus {
    fn add_assign(&mut self, rhs: Self) {
        self.abilities += rhs.abilities;
        self.damage += rhs.damage;
        self.speed += rhs.speed;
        self.to_hit += rhs.to_hit;
        self.armor_class += rhs.armor_class;
        self.max_hp += rhs.max_hp;
    }
}

/// Base values of a fighter. Effective values are derived on demand from
/// these plus the bonuses of whatever its holder has equipped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatProfile {
    pub abilities: AbilityScores,
    pub base_armor_class: i32,
    pub base_damage: i32,
    /// Tenths of a tile per turn, the player walks at 30.
    pub base_speed: i32,
    pub base_max_hp: i32,
    pub hp: i32,
    /// Experience banked by the player, or awarded for killing a monster.
    pub xp: i32,
    /// Initiative accumulator.
    pub counter: i32,
    pub attack_cue: Option<AudioCue>,
    pub hit_cue: Option<AudioCue>,
    pub death_cue: Option<AudioCue>,
}

impl CombatProfile {
    pub fn effective(&self, bonus: &StatBonus) -> EffectiveStats {
        let mut abilities = self.abilities;
        abilities += bonus.abilities;
        EffectiveStats {
            abilities,
            armor_class: self.base_armor_class + bonus.armor_class,
            damage: self.base_damage + bonus.damage,
            speed: self.base_speed + bonus.speed,
            max_hp: self.base_max_hp + bonus.max_hp,
            to_hit: bonus.to_hit,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }
}

impl Component for CombatProfile {
    type Storage = VecStorage<Self>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EffectiveStats {
    pub abilities: AbilityScores,
    pub armor_class: i32,
    pub damage: i32,
    pub speed: i32,
    pub max_hp: i32,
    pub to_hit: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorPolicy {
    Basic,
    Confused {
        previous: Box<BehaviorPolicy>,
        turns_remaining: i32,
    },
}

impl Component for BehaviorPolicy {
    type Storage = VecStorage<Self>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemEffect {
    /// Equipment and other things that do nothing on their own.
    Inert,
    Heal,
    Lightning,
    Fireball,
    Confuse,
    MagicMap,
    Oil,
    ThrowGold,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemProfile {
    /// The actor carrying this item, if any.
    pub owner: Option<Entity>,
    pub stacks: bool,
    pub count: i32,
    pub effect: ItemEffect,
    pub pickup_cue: Option<AudioCue>,
    pub use_cue: Option<AudioCue>,
}

impl Component for ItemProfile {
    type Storage = VecStorage<Self>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum EquipSlot {
    #[strum(serialize = "right hand")]
    RightHand,
    #[strum(serialize = "left hand")]
    LeftHand,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentProfile {
    pub bonus: StatBonus,
    pub slot: EquipSlot,
    pub equipped: bool,
}

impl Component for EquipmentProfile {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    pub items: Vec<Entity>,
}

impl Component for Inventory {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub level: i32,
    /// Stat choices earned on even levels and not yet made.
    pub pending_choices: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level: 1,
            pending_choices: 0,
        }
    }
}

impl Component for Progression {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub oil: f32,
    pub max_oil: f32,
}

impl Light {
    pub fn torch_radius(&self, tuning: &LightTuning) -> i32 {
        ((self.oil / 10.0) as i32).clamp(tuning.min_torch_radius, tuning.max_torch_radius)
    }

    pub fn burn(&mut self, amount: f32) {
        self.oil = (self.oil - amount).max(0.0);
    }

    pub fn refill(&mut self, amount: f32) {
        self.oil = (self.oil + amount).min(self.max_oil);
    }
}

impl Component for Light {
    type Storage = VecStorage<Self>;
}
