//! Tuning parameters.
//!
//! Every constant the simulation consults lives here so a TOML file can
//! override it without recompiling. Missing sections and fields fall back to
//! the defaults below.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub seed: u64,
    pub flow: FlowTuning,
    pub progression: ProgressionTuning,
    pub items: ItemTuning,
    pub light: LightTuning,
    pub log: LogTuning,
    pub options: Options,
}

impl Tuning {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| SimError::Tuning {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Flow field and door parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowTuning {
    /// Sentinel distance of the player and gold fields.
    pub default_distance: i32,
    /// Half-width of the window recomputed when the player moves.
    pub player_radius: i32,
    /// Quietest value of the sound field, also its local radius.
    pub sound_ceiling: i32,
    pub sound_decay: i32,
    pub door_break_threshold: i32,
    pub door_crash_intensity: i32,
    pub door_shake_intensity: i32,
    pub door_slam_intensity: i32,
}

impl Default for FlowTuning {
    fn default() -> Self {
        Self {
            default_distance: 9,
            player_radius: 9,
            sound_ceiling: 15,
            sound_decay: 1,
            door_break_threshold: 18,
            door_crash_intensity: 15,
            door_shake_intensity: 5,
            door_slam_intensity: 15,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionTuning {
    pub level_up_base: i32,
    pub level_up_factor: i32,
    pub constitution_hp: i32,
}

impl Default for ProgressionTuning {
    fn default() -> Self {
        Self {
            level_up_base: 200,
            level_up_factor: 150,
            constitution_hp: 20,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemTuning {
    pub heal_amount: i32,
    pub lightning_damage: i32,
    pub lightning_range: i32,
    pub confuse_range: i32,
    pub confuse_turns: i32,
    pub fireball_radius: i32,
    pub fireball_damage: i32,
    pub magic_map_range: i32,
    pub inventory_capacity: usize,
}

impl Default for ItemTuning {
    fn default() -> Self {
        Self {
            heal_amount: 40,
            lightning_damage: 40,
            lightning_range: 5,
            confuse_range: 8,
            confuse_turns: 10,
            fireball_radius: 3,
            fireball_damage: 25,
            magic_map_range: 18,
            inventory_capacity: 26,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LightTuning {
    pub max_oil: f32,
    pub oil_flask: f32,
    pub oil_decay: f32,
    pub min_torch_radius: i32,
    pub max_torch_radius: i32,
}

impl Default for LightTuning {
    fn default() -> Self {
        Self {
            max_oil: 100.0,
            oil_flask: 60.0,
            oil_decay: 0.2,
            min_torch_radius: 2,
            max_torch_radius: 10,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LogTuning {
    pub capacity: usize,
}

impl Default for LogTuning {
    fn default() -> Self {
        Self { capacity: 6 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Bumping into a closed door opens it instead of doing nothing.
    pub auto_open_door: bool,
    /// Append damage rolls to combat narration.
    pub verbose_messages: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            auto_open_door: true,
            verbose_messages: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tuning = Tuning::parse(
            r#"
            seed = 7

            [progression]
            level_up_base = 100
            "#,
        )
        .unwrap();
        assert_eq!(tuning.seed, 7);
        assert_eq!(tuning.progression.level_up_base, 100);
        assert_eq!(tuning.progression.level_up_factor, 150);
        assert_eq!(tuning.flow.door_break_threshold, 18);
        assert_eq!(tuning.items.inventory_capacity, 26);
    }

    #[test]
    fn malformed_file_is_rejected() {
        assert!(Tuning::parse("[flow]\ndefault_distance = \"far\"").is_err());
    }
}
