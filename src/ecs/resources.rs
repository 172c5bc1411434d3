use std::collections::VecDeque;

use bracket_geometry::prelude::Point;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

use crate::{
    config::FlowTuning,
    flow::{BloodMap, FlowField},
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    #[default]
    Playing,
    Dead,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DungeonDepth(pub u32);

impl Default for DungeonDepth {
    fn default() -> Self {
        Self(1)
    }
}

/// Current light radius of the player's lamp.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TorchRadius(pub i32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Combat,
    Good,
    Warning,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub text: String,
    pub severity: Severity,
}

/// Narration shown to the player. Holds a fixed number of lines and drops
/// the oldest first.
#[derive(Clone, Debug)]
pub struct MessageLog {
    capacity: usize,
    entries: VecDeque<LogEntry>,
    pushed: u64,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(6)
    }
}

impl MessageLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            pushed: 0,
        }
    }

    pub fn push<S: Into<String>>(&mut self, text: S, severity: Severity) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            text: text.into(),
            severity,
        });
        self.pushed += 1;
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    /// Number of lines ever pushed, evicted ones included.
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Lines pushed after the `pushed()` mark `since` that are still held.
    pub fn since(&self, since: u64) -> impl Iterator<Item = &LogEntry> {
        let fresh = self.pushed.saturating_sub(since).min(self.entries.len() as u64) as usize;
        self.entries.iter().skip(self.entries.len() - fresh)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.text.contains(needle))
    }

    pub(crate) fn restore(&mut self, entries: Vec<LogEntry>) {
        self.entries.clear();
        for entry in entries {
            self.push(entry.text, entry.severity);
        }
    }
}

/// Named sound triggers for the audio player.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    PlayerAttack,
    GnollAttack,
    TrollAttack,
    PlayerHit,
    GnollHit,
    TrollHit,
    MonsterDeath,
    LevelUp,
    DoorOpen,
    DoorClose,
    DoorShake,
    DoorBreak,
    Stairs,
    GoldPickup,
    PotionPickup,
    ScrollPickup,
    PotionUse,
    MagicMapUse,
    ConfuseHit,
    FireballHit,
    LightningHit,
}

impl AudioCue {
    pub fn id(self) -> &'static str {
        self.into()
    }
}

#[derive(Clone, Debug, Default)]
pub struct AudioQueue {
    cues: Vec<AudioCue>,
}

impl AudioQueue {
    pub fn push(&mut self, cue: AudioCue) {
        self.cues.push(cue);
    }

    pub fn drain(&mut self) -> Vec<AudioCue> {
        std::mem::take(&mut self.cues)
    }

    pub fn pending(&self) -> &[AudioCue] {
        &self.cues
    }
}

/// The distance maps of the current level.
#[derive(Clone, Debug)]
pub struct FlowFields {
    pub player: FlowField,
    pub gold: FlowField,
    pub sound: FlowField,
}

impl FlowFields {
    pub fn new(width: i32, height: i32, tuning: &FlowTuning) -> Self {
        Self {
            player: FlowField::new(width, height, tuning.default_distance),
            gold: FlowField::new(width, height, tuning.default_distance),
            sound: FlowField::new(width, height, tuning.sound_ceiling),
        }
    }
}

/// Blood left on the current level.
#[derive(Clone, Debug)]
pub struct Blood(pub BloodMap);

/// Cells the player can currently see.
#[derive(Clone, Debug, Default)]
pub struct VisibleTiles {
    width: i32,
    height: i32,
    visible: Vec<bool>,
}

impl VisibleTiles {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            visible: vec![false; (width.max(0) * height.max(0)) as usize],
        }
    }

    fn idx(&self, point: Point) -> Option<usize> {
        if point.x >= 0 && point.x < self.width && point.y >= 0 && point.y < self.height {
            Some((point.y * self.width + point.x) as usize)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.visible.iter_mut().for_each(|v| *v = false);
    }

    pub fn reveal(&mut self, point: Point) {
        if let Some(idx) = self.idx(point) {
            self.visible[idx] = true;
        }
    }

    pub fn is_visible(&self, point: Point) -> bool {
        self.idx(point).map_or(false, |idx| self.visible[idx])
    }

    pub fn count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }
}
