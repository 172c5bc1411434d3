use bracket_color::prelude::{DARK_ORANGE, GOLD, LIGHT_YELLOW, SKY_BLUE, VIOLET};
use strum::EnumIter;

use crate::ecs::{
    components::{AbilityScores, EquipSlot, ItemEffect, StatBonus},
    resources::AudioCue,
};

use super::DepthTable;

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter)]
pub enum ItemKind {
    Gold,
    OilFlask,
    HealingPotion,
    MagicMapping,
    Lightning,
    Fireball,
    Confusion,
    Sword,
    Shield,
    Dagger,
}

#[derive(Clone, Debug)]
pub struct ItemTemplate {
    pub name: &'static str,
    pub glyph: char,
    pub color: (u8, u8, u8),
    pub stacks: bool,
    pub count: i32,
    pub effect: ItemEffect,
    pub pickup_cue: Option<AudioCue>,
    pub use_cue: Option<AudioCue>,
    pub equipment: Option<(EquipSlot, StatBonus)>,
}

pub const GOLD_NAME: &str = "Gold";

impl ItemKind {
    pub fn template(self) -> ItemTemplate {
        match self {
            ItemKind::Gold => ItemTemplate {
                name: GOLD_NAME,
                glyph: '$',
                color: GOLD,
                stacks: true,
                count: 10,
                effect: ItemEffect::ThrowGold,
                pickup_cue: Some(AudioCue::GoldPickup),
                use_cue: Some(AudioCue::GoldPickup),
                equipment: None,
            },
            ItemKind::OilFlask => consumable(
                "Oil Flask",
                '!',
                LIGHT_YELLOW,
                ItemEffect::Oil,
                AudioCue::PotionPickup,
                None,
            ),
            ItemKind::HealingPotion => consumable(
                "Healing Potion",
                '!',
                VIOLET,
                ItemEffect::Heal,
                AudioCue::PotionPickup,
                Some(AudioCue::PotionUse),
            ),
            ItemKind::MagicMapping => ItemTemplate {
                stacks: true,
                ..consumable(
                    "Scroll of Magic Mapping",
                    '#',
                    LIGHT_YELLOW,
                    ItemEffect::MagicMap,
                    AudioCue::ScrollPickup,
                    None,
                )
            },
            ItemKind::Lightning => consumable(
                "Scroll of Lightning Bolt",
                '#',
                LIGHT_YELLOW,
                ItemEffect::Lightning,
                AudioCue::ScrollPickup,
                Some(AudioCue::LightningHit),
            ),
            ItemKind::Fireball => consumable(
                "Scroll of Fireball",
                '#',
                LIGHT_YELLOW,
                ItemEffect::Fireball,
                AudioCue::ScrollPickup,
                Some(AudioCue::FireballHit),
            ),
            ItemKind::Confusion => consumable(
                "Scroll of Confusion",
                '#',
                LIGHT_YELLOW,
                ItemEffect::Confuse,
                AudioCue::ScrollPickup,
                Some(AudioCue::ConfuseHit),
            ),
            ItemKind::Sword => gear(
                "Sword",
                '/',
                SKY_BLUE,
                EquipSlot::RightHand,
                StatBonus {
                    abilities: AbilityScores {
                        strength: 3,
                        ..AbilityScores::default()
                    },
                    ..StatBonus::default()
                },
            ),
            ItemKind::Shield => gear(
                "Shield",
                '[',
                DARK_ORANGE,
                EquipSlot::LeftHand,
                StatBonus {
                    armor_class: 1,
                    ..StatBonus::default()
                },
            ),
            ItemKind::Dagger => gear(
                "Dagger",
                '-',
                SKY_BLUE,
                EquipSlot::RightHand,
                StatBonus {
                    abilities: AbilityScores {
                        strength: 2,
                        ..AbilityScores::default()
                    },
                    damage: 8,
                    to_hit: 5,
                    ..StatBonus::default()
                },
            ),
        }
    }

    pub fn marker(self) -> char {
        match self {
            ItemKind::Gold => '$',
            ItemKind::OilFlask => 'o',
            ItemKind::HealingPotion => '!',
            ItemKind::MagicMapping => 'm',
            ItemKind::Lightning => 'l',
            ItemKind::Fireball => 'f',
            ItemKind::Confusion => 'c',
            ItemKind::Sword => '/',
            ItemKind::Shield => '[',
            ItemKind::Dagger => '-',
        }
    }

    pub fn from_marker(glyph: char) -> Option<Self> {
        use strum::IntoEnumIterator;
        ItemKind::iter().find(|kind| kind.marker() == glyph)
    }

    /// Room population weights. The dagger only ever comes with the player.
    pub fn chances(self) -> DepthTable {
        match self {
            ItemKind::Gold => &[(5, 1)],
            ItemKind::OilFlask => &[(35, 1)],
            ItemKind::HealingPotion => &[(20, 1)],
            ItemKind::MagicMapping => &[(2, 1)],
            ItemKind::Lightning => &[(25, 3)],
            ItemKind::Fireball => &[(25, 4)],
            ItemKind::Confusion => &[(10, 2)],
            ItemKind::Sword => &[(5, 4)],
            ItemKind::Shield => &[(15, 6)],
            ItemKind::Dagger => &[],
        }
    }
}

fn consumable(
    name: &'static str,
    glyph: char,
    color: (u8, u8, u8),
    effect: ItemEffect,
    pickup_cue: AudioCue,
    use_cue: Option<AudioCue>,
) -> ItemTemplate {
    ItemTemplate {
        name,
        glyph,
        color,
        stacks: false,
        count: 1,
        effect,
        pickup_cue: Some(pickup_cue),
        use_cue,
        equipment: None,
    }
}

fn gear(
    name: &'static str,
    glyph: char,
    color: (u8, u8, u8),
    slot: EquipSlot,
    bonus: StatBonus,
) -> ItemTemplate {
    ItemTemplate {
        name,
        glyph,
        color,
        stacks: false,
        count: 1,
        effect: ItemEffect::Inert,
        pickup_cue: None,
        use_cue: None,
        equipment: Some((slot, bonus)),
    }
}
