use specs::prelude::WorldExt;
use tracing::debug;

use crate::{
    config::ProgressionTuning,
    ecs::{
        World,
        components::Progression,
        resources::{AudioCue, Severity},
    },
};

/// Permanent increases offered on even levels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatChoice {
    Constitution,
    Strength,
    ArmorClass,
}

impl StatChoice {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(StatChoice::Constitution),
            1 => Some(StatChoice::Strength),
            2 => Some(StatChoice::ArmorClass),
            _ => None,
        }
    }
}

pub fn required_xp(level: i32, tuning: &ProgressionTuning) -> i32 {
    tuning.level_up_base + level * tuning.level_up_factor
}

/// Spend banked experience on as many levels as it covers, carrying the
/// remainder over. Returns the number of levels gained.
pub fn advance(progression: &mut Progression, xp: &mut i32, tuning: &ProgressionTuning) -> u32 {
    let mut gained = 0;
    loop {
        let threshold = required_xp(progression.level, tuning);
        if threshold <= 0 || *xp < threshold {
            break;
        }
        *xp -= threshold;
        progression.level += 1;
        if progression.level % 2 == 0 {
            progression.pending_choices += 1;
        }
        gained += 1;
    }
    gained
}

/// Level the player up from its banked experience.
pub fn check_level_up(world: &World) -> u32 {
    let player = world.player();
    let tuning = world.tuning().progression.clone();
    let (gained, level) = {
        let mut progressions = world.ecs().write_storage::<Progression>();
        let Some(progression) = progressions.get_mut(player) else {
            return 0;
        };
        let gained = world
            .with_profile_mut(player, |profile| advance(progression, &mut profile.xp, &tuning))
            .unwrap_or(0);
        (gained, progression.level)
    };
    if gained == 0 {
        return 0;
    }
    for reached in (level - gained as i32 + 1)..=level {
        world.message(
            format!("Your battle skills grow stronger! You reached level {reached}!"),
            Severity::Good,
        );
        world.play(AudioCue::LevelUp);
    }
    debug!(level, gained, "player levelled up");
    gained
}

/// Apply one pending stat choice. Returns false when none was pending.
pub fn choose_stat(world: &World, choice: StatChoice) -> bool {
    let player = world.player();
    {
        let mut progressions = world.ecs().write_storage::<Progression>();
        match progressions.get_mut(player) {
            Some(progression) if progression.pending_choices > 0 => {
                progression.pending_choices -= 1;
            }
            _ => return false,
        }
    }
    let bonus = world.tuning().progression.constitution_hp;
    world.with_profile_mut(player, |profile| match choice {
        StatChoice::Constitution => {
            profile.base_max_hp += bonus;
            profile.hp += bonus;
        }
        StatChoice::Strength => profile.abilities.strength += 1,
        StatChoice::ArmorClass => profile.base_armor_class += 1,
    });
    debug!(?choice, "stat choice applied");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experience_carries_over() {
        let tuning = ProgressionTuning::default();
        let mut progression = Progression::default();
        let mut xp = 500;
        assert_eq!(advance(&mut progression, &mut xp, &tuning), 1);
        assert_eq!(progression.level, 2);
        assert_eq!(xp, 150);
        assert_eq!(progression.pending_choices, 1);
    }

    #[test]
    fn one_kill_can_grant_several_levels() {
        let tuning = ProgressionTuning::default();
        let mut progression = Progression::default();
        // 350 for level 2, 500 for level 3, 650 for level 4.
        let mut xp = 1600;
        assert_eq!(advance(&mut progression, &mut xp, &tuning), 3);
        assert_eq!(progression.level, 4);
        assert_eq!(xp, 100);
        assert_eq!(progression.pending_choices, 2);
    }

    #[test]
    fn degenerate_threshold_does_not_spin() {
        let tuning = ProgressionTuning {
            level_up_base: 0,
            level_up_factor: 0,
            ..ProgressionTuning::default()
        };
        let mut progression = Progression::default();
        let mut xp = 10;
        assert_eq!(advance(&mut progression, &mut xp, &tuning), 0);
    }

    #[test]
    fn choices_map_from_menu_indices() {
        assert_eq!(StatChoice::from_index(0), Some(StatChoice::Constitution));
        assert_eq!(StatChoice::from_index(2), Some(StatChoice::ArmorClass));
        assert_eq!(StatChoice::from_index(3), None);
    }
}
