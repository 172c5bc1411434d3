pub mod items;
pub mod monsters;

use bracket_geometry::prelude::Rect;
use bracket_random::prelude::RandomNumberGenerator;
use strum::IntoEnumIterator;

use crate::{
    error::Result,
    map::{Grid, LevelPlan},
};

use self::{items::ItemKind, monsters::MonsterKind};

/// `(value, from_depth)` steps, ascending by depth.
pub type DepthTable = &'static [(i32, u32)];

pub const MAX_MONSTERS: DepthTable = &[(2, 1), (3, 4), (5, 6)];
pub const MAX_ITEMS: DepthTable = &[(1, 1), (2, 4)];

/// Value of the last step whose depth has been reached, 0 before the first.
pub fn from_dungeon_level(table: DepthTable, depth: u32) -> i32 {
    table
        .iter()
        .rev()
        .find(|(_, from)| depth >= *from)
        .map_or(0, |(value, _)| *value)
}

/// Weighted pick. Non-positive weights never win; `None` when nothing can.
pub fn random_choice_index(rng: &mut RandomNumberGenerator, chances: &[i32]) -> Option<usize> {
    let total: i32 = chances.iter().filter(|c| **c > 0).sum();
    if total <= 0 {
        return None;
    }
    let dice = rng.range(1, total + 1);
    let mut running = 0;
    for (idx, &weight) in chances.iter().enumerate() {
        if weight <= 0 {
            continue;
        }
        running += weight;
        if dice <= running {
            return Some(idx);
        }
    }
    None
}

/// Every glyph an ASCII level may use for something other than terrain.
pub fn marker_glyphs() -> String {
    let mut glyphs = String::from("@>");
    glyphs.extend(MonsterKind::iter().map(MonsterKind::marker));
    glyphs.extend(ItemKind::iter().map(ItemKind::marker));
    glyphs
}

pub const DEMO_LEVEL: &str = "
##############################
#@.....#...........#.........#
#......#...........#....g....#
#......+.....g.....'.........#
#......#...........#.....>...#
#..$...#...!.......#.........#
####.#########.#########.#####
#....#.......#.............m.#
#.o..+.......#...G.....c.....#
#....#.......+...............#
##############################
";

/// The built-in level, with its rooms open for random population.
pub fn demo_plan() -> Result<LevelPlan> {
    let mut plan = Grid::parse(DEMO_LEVEL, &marker_glyphs())?.into_plan()?;
    plan.rooms = vec![
        Rect::with_exact(0, 0, 7, 6),
        Rect::with_exact(7, 0, 19, 6),
        Rect::with_exact(19, 0, 29, 6),
        Rect::with_exact(0, 6, 5, 10),
        Rect::with_exact(5, 6, 13, 10),
        Rect::with_exact(13, 6, 29, 10),
    ];
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_tables_step_up() {
        assert_eq!(from_dungeon_level(MAX_MONSTERS, 1), 2);
        assert_eq!(from_dungeon_level(MAX_MONSTERS, 5), 3);
        assert_eq!(from_dungeon_level(MAX_MONSTERS, 9), 5);
        assert_eq!(from_dungeon_level(ItemKind::Fireball.chances(), 3), 0);
        assert_eq!(from_dungeon_level(ItemKind::Fireball.chances(), 4), 25);
        assert_eq!(from_dungeon_level(ItemKind::Dagger.chances(), 10), 0);
    }

    #[test]
    fn weighted_choice_skips_empty_weights() {
        let mut rng = RandomNumberGenerator::seeded(11);
        for _ in 0..50 {
            assert_eq!(random_choice_index(&mut rng, &[0, 7, 0]), Some(1));
        }
        assert_eq!(random_choice_index(&mut rng, &[0, 0]), None);
        assert_eq!(random_choice_index(&mut rng, &[]), None);
    }

    #[test]
    fn markers_are_distinct() {
        let glyphs = marker_glyphs();
        let mut sorted: Vec<char> = glyphs.chars().collect();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), glyphs.chars().count());
        assert!(!glyphs.contains(['#', '.', '+', '\'']));
    }

    #[test]
    fn demo_level_parses() {
        let plan = demo_plan().unwrap();
        assert_eq!(plan.grid.width(), 30);
        assert_eq!(plan.grid.height(), 11);
        assert!(plan.stairs.is_some());
        assert!(plan.grid.cell(bracket_geometry::prelude::Point::new(7, 3)).unwrap().is_closed_door());
    }
}
