//! Plain-text frames for the headless binary.

use bracket_geometry::prelude::Point;
use specs::prelude::{Join, WorldExt};

use crate::{
    ecs::{
        World,
        components::{Position, Renderable},
    },
    map::Cell,
};

fn terrain_glyph(cell: &Cell) -> char {
    if cell.is_closed_door() {
        '+'
    } else if cell.is_open_door() {
        '\''
    } else if cell.is_wall() {
        '#'
    } else {
        '.'
    }
}

/// One string per map row. Unexplored cells are blank, remembered cells show
/// terrain only and visible cells show the topmost actor.
pub fn draw_map(world: &World) -> Vec<String> {
    let grid = world.grid();
    let mut rows: Vec<Vec<char>> = (0..grid.height())
        .map(|y| {
            (0..grid.width())
                .map(|x| match grid.cell(Point::new(x, y)) {
                    Some(cell) if cell.explored => terrain_glyph(cell),
                    _ => ' ',
                })
                .collect()
        })
        .collect();

    let ecs = world.ecs();
    let positions = ecs.read_storage::<Position>();
    let renderables = ecs.read_storage::<Renderable>();
    let mut actors: Vec<(Point, &Renderable)> = (&positions, &renderables)
        .join()
        .map(|(pos, renderable)| (pos.point, renderable))
        .filter(|(point, _)| world.is_visible(*point))
        .collect();
    actors.sort_by_key(|(_, renderable)| renderable.order);
    for (point, renderable) in actors {
        if grid.in_bounds(point) {
            rows[point.y as usize][point.x as usize] = renderable.glyph;
        }
    }

    rows.into_iter().map(|row| row.into_iter().collect()).collect()
}

pub fn draw_status(world: &World) -> String {
    let player = world.player();
    let hp = world.combat_profile(player).map_or(0, |profile| profile.hp);
    let max_hp = world.effective_stats(player).map_or(0, |stats| stats.max_hp);
    let oil = world.light().map_or(0.0, |light| light.oil);
    format!(
        "Depth {} | Turn {} | Level {} | HP {hp}/{max_hp} | Oil {oil:.0}",
        world.depth(),
        world.turn(),
        world.progression().level,
    )
}

pub fn draw_log(world: &World, rows: usize) -> Vec<String> {
    let log = world.log();
    let skip = log.len().saturating_sub(rows);
    log.entries()
        .skip(skip)
        .map(|entry| format!("[{:?}] {}", entry.severity, entry.text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Tuning, map::Grid};

    #[test]
    fn frame_shows_actors_over_terrain() {
        let level = Grid::parse(
            "
            #######
            #@.g.>#
            #######
            ",
            &crate::data::marker_glyphs(),
        )
        .unwrap();
        let world = World::from_level(level, Tuning::default()).unwrap();
        let map = draw_map(&world);
        assert_eq!(map.len(), 3);
        assert_eq!(map[1], "#@.g.>#");
        assert!(draw_status(&world).starts_with("Depth 1 | Turn 0 | Level 1 | HP 100/100"));
        assert_eq!(draw_log(&world, 1).len(), 1);
    }
}
