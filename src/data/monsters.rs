use bracket_color::prelude::{DARK_ORANGE, GREEN, RED, WHITE};
use strum::EnumIter;

use crate::ecs::{
    components::{AbilityScores, CombatProfile},
    resources::AudioCue,
};

use super::DepthTable;

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter)]
pub enum MonsterKind {
    Gerblin,
    GnollPackLord,
    GnollFang,
}

#[derive(Clone, Debug)]
pub struct MonsterTemplate {
    pub name: &'static str,
    pub glyph: char,
    pub color: (u8, u8, u8),
    pub abilities: AbilityScores,
    pub armor_class: i32,
    pub damage: i32,
    pub speed: i32,
    pub hp: i32,
    pub xp: i32,
    pub attack_cue: AudioCue,
    pub hit_cue: AudioCue,
}

const GERBLIN_CHANCE: DepthTable = &[(80, 1)];
const PACK_LORD_CHANCE: DepthTable = &[(15, 3), (30, 5), (60, 7)];
const FANG_CHANCE: DepthTable = &[(1, 1), (5, 3), (10, 5)];

impl MonsterKind {
    pub fn template(self) -> MonsterTemplate {
        match self {
            MonsterKind::Gerblin => MonsterTemplate {
                name: "Gerblin",
                glyph: 'g',
                color: GREEN,
                abilities: scores(8, 14, 10, 10, 8, 8, 1),
                armor_class: 7,
                damage: 15,
                speed: 30,
                hp: 7,
                xp: 50,
                attack_cue: AudioCue::GnollAttack,
                hit_cue: AudioCue::GnollHit,
            },
            MonsterKind::GnollPackLord => MonsterTemplate {
                name: "Gnoll Pack Lord",
                glyph: 'g',
                color: DARK_ORANGE,
                abilities: scores(16, 14, 13, 8, 11, 9, 1),
                armor_class: 7,
                damage: 15,
                speed: 28,
                hp: 49,
                xp: 450,
                attack_cue: AudioCue::GnollAttack,
                hit_cue: AudioCue::GnollHit,
            },
            MonsterKind::GnollFang => MonsterTemplate {
                name: "Gnoll Fang of Yeenoghu",
                glyph: 'g',
                color: RED,
                abilities: scores(17, 15, 15, 10, 11, 13, 1),
                armor_class: 6,
                damage: 20,
                speed: 25,
                hp: 65,
                xp: 1100,
                attack_cue: AudioCue::TrollAttack,
                hit_cue: AudioCue::TrollHit,
            },
        }
    }

    /// Glyph standing for this monster in an ASCII level.
    pub fn marker(self) -> char {
        match self {
            MonsterKind::Gerblin => 'g',
            MonsterKind::GnollPackLord => 'G',
            MonsterKind::GnollFang => 'Y',
        }
    }

    pub fn from_marker(glyph: char) -> Option<Self> {
        match glyph {
            'g' => Some(MonsterKind::Gerblin),
            'G' => Some(MonsterKind::GnollPackLord),
            'Y' => Some(MonsterKind::GnollFang),
            _ => None,
        }
    }

    pub fn chances(self) -> DepthTable {
        match self {
            MonsterKind::Gerblin => GERBLIN_CHANCE,
            MonsterKind::GnollPackLord => PACK_LORD_CHANCE,
            MonsterKind::GnollFang => FANG_CHANCE,
        }
    }
}

impl MonsterTemplate {
    pub fn profile(&self) -> CombatProfile {
        CombatProfile {
            abilities: self.abilities,
            base_armor_class: self.armor_class,
            base_damage: self.damage,
            base_speed: self.speed,
            base_max_hp: self.hp,
            hp: self.hp,
            xp: self.xp,
            counter: 0,
            attack_cue: Some(self.attack_cue),
            hit_cue: Some(self.hit_cue),
            death_cue: Some(AudioCue::MonsterDeath),
        }
    }
}

pub const PLAYER_NAME: &str = "Heroman";
pub const PLAYER_GLYPH: char = '@';
pub const PLAYER_COLOR: (u8, u8, u8) = WHITE;

pub fn player_profile() -> CombatProfile {
    CombatProfile {
        abilities: scores(10, 14, 10, 10, 10, 10, 10),
        base_armor_class: 10,
        base_damage: 2,
        base_speed: 30,
        base_max_hp: 100,
        hp: 100,
        xp: 0,
        counter: 0,
        attack_cue: Some(AudioCue::PlayerAttack),
        hit_cue: Some(AudioCue::PlayerHit),
        death_cue: None,
    }
}

const fn scores(
    strength: i32,
    dexterity: i32,
    constitution: i32,
    intelligence: i32,
    wisdom: i32,
    charisma: i32,
    luck: i32,
) -> AbilityScores {
    AbilityScores {
        strength,
        dexterity,
        constitution,
        intelligence,
        wisdom,
        charisma,
        luck,
    }
}
