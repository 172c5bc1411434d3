//! Goal-propagation distance maps.
//!
//! A flow field stores, for every cell, the number of steps to the nearest
//! seeded goal, capped by a default sentinel. Monsters walk downhill on the
//! player field; the sound field is the same structure with closed doors
//! acting as walls.

use std::fmt;

use bracket_geometry::prelude::Point;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use crate::map::Grid;

/// Offsets to the eight neighbouring cells.
pub const NEIGHBORS: [Point; 8] = [
    Point { x: -1, y: -1 },
    Point { x: 0, y: -1 },
    Point { x: 1, y: -1 },
    Point { x: -1, y: 0 },
    Point { x: 1, y: 0 },
    Point { x: -1, y: 1 },
    Point { x: 0, y: 1 },
    Point { x: 1, y: 1 },
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub x: i32,
    pub y: i32,
    pub score: i32,
}

/// Work done by one relaxation run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Relaxation {
    pub passes: usize,
    pub changes: usize,
}

/// Inclusive cell window a relaxation is confined to.
#[derive(Copy, Clone, Debug)]
struct Window {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

impl Window {
    fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowField {
    width: i32,
    height: i32,
    tiles: Vec<i32>,
    goals: Vec<Goal>,
}

impl FlowField {
    pub fn new(width: i32, height: i32, default: i32) -> Self {
        let size = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            tiles: vec![default; size],
            goals: Vec::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn add_goal(&mut self, point: Point, score: i32) {
        self.goals.push(Goal {
            x: point.x,
            y: point.y,
            score,
        });
    }

    pub fn clear_goals(&mut self) {
        self.goals.clear();
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0 && point.x < self.width && point.y >= 0 && point.y < self.height
    }

    fn idx(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    pub fn value(&self, point: Point) -> Option<i32> {
        if self.in_bounds(point) {
            Some(self.tiles[self.idx(point.x, point.y)])
        } else {
            None
        }
    }

    pub fn tiles(&self) -> &[i32] {
        &self.tiles
    }

    /// Set every cell to `default`, then stamp the goals on top.
    pub fn reset(&mut self, default: i32) {
        self.tiles.iter_mut().for_each(|t| *t = default);
        self.seed_goals(None);
    }

    fn seed_goals(&mut self, window: Option<Window>) {
        for i in 0..self.goals.len() {
            let Goal { x, y, score } = self.goals[i];
            if !self.in_bounds(Point::new(x, y)) {
                continue;
            }
            if window.map_or(true, |w| w.contains(x, y)) {
                let idx = self.idx(x, y);
                self.tiles[idx] = score;
            }
        }
    }

    /// Rebuild the whole field from the current goals.
    pub fn recalculate_full(&mut self, grid: &Grid, default: i32, door_stop: bool) -> Relaxation {
        self.reset(default);
        self.relax(grid, door_stop)
    }

    /// Rebuild a `2 * radius` square window around `target`.
    ///
    /// Window cells are reset to `radius` and relaxed against window
    /// neighbours only. Everything outside keeps its previous value.
    pub fn recalculate_local(
        &mut self,
        grid: &Grid,
        target: Point,
        radius: i32,
        door_stop: bool,
    ) -> Relaxation {
        let radius = radius.max(0);
        let window = Window {
            x0: (target.x - radius).max(0),
            y0: (target.y - radius).max(0),
            x1: (target.x + radius - 1).min(self.width - 1),
            y1: (target.y + radius - 1).min(self.height - 1),
        };
        if window.x0 > window.x1 || window.y0 > window.y1 {
            return Relaxation::default();
        }
        for y in window.y0..=window.y1 {
            for x in window.x0..=window.x1 {
                let idx = self.idx(x, y);
                self.tiles[idx] = radius;
            }
        }
        self.seed_goals(Some(window));
        self.relax_window(grid, window, door_stop)
    }

    /// Run the relaxation rule over the whole field until a full pass changes
    /// nothing.
    pub fn relax(&mut self, grid: &Grid, door_stop: bool) -> Relaxation {
        if self.width <= 0 || self.height <= 0 {
            return Relaxation::default();
        }
        let window = Window {
            x0: 0,
            y0: 0,
            x1: self.width - 1,
            y1: self.height - 1,
        };
        self.relax_window(grid, window, door_stop)
    }

    fn relax_window(&mut self, grid: &Grid, window: Window, door_stop: bool) -> Relaxation {
        let mut stats = Relaxation::default();
        // Every change strictly lowers a cell that is bounded below by the
        // smallest goal score, so this always terminates.
        loop {
            stats.passes += 1;
            let mut changed = false;
            for y in window.y0..=window.y1 {
                for x in window.x0..=window.x1 {
                    if !relaxes(grid, Point::new(x, y), door_stop) {
                        continue;
                    }
                    let Some(lowest) = self.lowest_neighbor_in(x, y, window) else {
                        continue;
                    };
                    let candidate = lowest.saturating_add(1);
                    let idx = self.idx(x, y);
                    if self.tiles[idx] > candidate {
                        self.tiles[idx] = candidate;
                        stats.changes += 1;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        trace!(passes = stats.passes, changes = stats.changes, "relaxed flow field");
        stats
    }

    fn lowest_neighbor_in(&self, x: i32, y: i32, window: Window) -> Option<i32> {
        NEIGHBORS
            .iter()
            .map(|d| (x + d.x, y + d.y))
            .filter(|&(nx, ny)| window.contains(nx, ny))
            .map(|(nx, ny)| self.tiles[self.idx(nx, ny)])
            .min()
    }

    /// Lowest value among the in-bounds neighbours of `point`.
    pub fn lowest_neighbor(&self, point: Point) -> Option<i32> {
        NEIGHBORS
            .iter()
            .filter_map(|&d| self.value(point + d))
            .min()
    }

    /// Every neighbour offset whose cell holds the lowest neighbouring
    /// value. Ties are all returned; picking one is up to the caller.
    pub fn best_neighbor_offsets(&self, point: Point) -> SmallVec<[Point; 8]> {
        let Some(best) = self.lowest_neighbor(point) else {
            return SmallVec::new();
        };
        NEIGHBORS
            .iter()
            .copied()
            .filter(|&d| self.value(point + d) == Some(best))
            .collect()
    }

    /// Fade the field back towards `ceiling` by `rate` per call.
    pub fn decay(&mut self, rate: i32, ceiling: i32) {
        for tile in self.tiles.iter_mut() {
            if *tile < ceiling {
                *tile = (*tile + rate).min(ceiling);
            }
        }
    }
}

/// Whether relaxation may lower the cell at `point`. Rock never does,
/// closed doors only when they are not acting as stops.
fn relaxes(grid: &Grid, point: Point, door_stop: bool) -> bool {
    match grid.cell(point) {
        Some(cell) if cell.is_wall() => false,
        Some(cell) if cell.is_closed_door() => !door_stop,
        Some(_) => true,
        None => false,
    }
}

impl fmt::Display for FlowField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let v = self.tiles[self.idx(x, y)];
                let c = char::from_digit(v.clamp(0, 35) as u32, 36).unwrap_or('?');
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Splatter marks left where things died or corpses were dragged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodMap {
    width: i32,
    height: i32,
    marks: Vec<bool>,
}

impl BloodMap {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            marks: vec![false; (width.max(0) * height.max(0)) as usize],
        }
    }

    fn idx(&self, point: Point) -> Option<usize> {
        if point.x >= 0 && point.x < self.width && point.y >= 0 && point.y < self.height {
            Some((point.y * self.width + point.x) as usize)
        } else {
            None
        }
    }

    pub fn mark(&mut self, point: Point) {
        if let Some(idx) = self.idx(point) {
            self.marks[idx] = true;
        }
    }

    pub fn is_marked(&self, point: Point) -> bool {
        self.idx(point).map_or(false, |idx| self.marks[idx])
    }

    pub fn clear(&mut self) {
        self.marks.iter_mut().for_each(|m| *m = false);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::map::{Cell, Grid};

    fn grid(ascii: &str) -> Grid {
        Grid::parse(ascii, "").unwrap().grid
    }

    const ROOMS: &str = "
        ##########
        #....#...#
        #....+...#
        #....#...#
        ##########
    ";

    #[test]
    fn distances_count_steps_from_goal() {
        let grid = grid(ROOMS);
        let mut field = FlowField::new(grid.width(), grid.height(), 20);
        field.add_goal(Point::new(1, 1), 0);
        field.recalculate_full(&grid, 20, false);
        assert_eq!(field.value(Point::new(1, 1)), Some(0));
        assert_eq!(field.value(Point::new(2, 2)), Some(1));
        assert_eq!(field.value(Point::new(4, 3)), Some(3));
        // Through the door.
        assert_eq!(field.value(Point::new(5, 2)), Some(4));
        assert_eq!(field.value(Point::new(8, 1)), Some(7));
        // Rock keeps the sentinel.
        assert_eq!(field.value(Point::new(0, 0)), Some(20));
    }

    #[test]
    fn door_stop_seals_closed_doors() {
        let grid = grid(ROOMS);
        let mut field = FlowField::new(grid.width(), grid.height(), 20);
        field.add_goal(Point::new(1, 1), 0);
        field.recalculate_full(&grid, 20, true);
        assert_eq!(field.value(Point::new(5, 2)), Some(20));
        assert_eq!(field.value(Point::new(7, 2)), Some(20));
    }

    #[test]
    fn local_recalculation_leaves_outside_alone() {
        let grid = grid(ROOMS);
        let mut field = FlowField::new(grid.width(), grid.height(), 7);
        field.add_goal(Point::new(2, 2), 0);
        field.recalculate_local(&grid, Point::new(2, 2), 2, false);
        // Window covers x, y in 0..=3.
        assert_eq!(field.value(Point::new(2, 2)), Some(0));
        assert_eq!(field.value(Point::new(3, 3)), Some(1));
        assert_eq!(field.value(Point::new(1, 1)), Some(1));
        assert_eq!(field.value(Point::new(3, 1)), Some(1));
        assert_eq!(field.value(Point::new(4, 2)), Some(7));
        assert_eq!(field.value(Point::new(8, 3)), Some(7));
    }

    #[test]
    fn best_offsets_return_all_ties() {
        let grid = grid(ROOMS);
        let mut field = FlowField::new(grid.width(), grid.height(), 20);
        field.add_goal(Point::new(2, 1), 0);
        field.add_goal(Point::new(2, 3), 0);
        field.recalculate_full(&grid, 20, false);
        let offsets = field.best_neighbor_offsets(Point::new(2, 2));
        assert_eq!(offsets.as_slice(), &[Point::new(0, -1), Point::new(0, 1)]);
    }

    #[test]
    fn decay_fades_towards_ceiling() {
        let grid = grid(ROOMS);
        let mut field = FlowField::new(grid.width(), grid.height(), 15);
        field.add_goal(Point::new(1, 1), 0);
        field.recalculate_full(&grid, 15, true);
        field.decay(1, 15);
        assert_eq!(field.value(Point::new(1, 1)), Some(1));
        assert_eq!(field.value(Point::new(0, 0)), Some(15));
        field.decay(20, 15);
        assert!(field.tiles().iter().all(|&t| t == 15));
    }

    #[test]
    fn display_renders_rows() {
        let mut field = FlowField::new(3, 1, 11);
        field.add_goal(Point::new(0, 0), 0);
        field.recalculate_full(&Grid::parse("...", "").unwrap().grid, 11, false);
        assert_eq!(field.to_string(), "012\n");
    }

    fn arb_grid() -> impl Strategy<Value = (Grid, Point)> {
        (3_i32..12, 3_i32..12).prop_flat_map(|(w, h)| {
            (
                proptest::collection::vec(0_u8..4, (w * h) as usize),
                0..w,
                0..h,
            )
                .prop_map(move |(cells, gx, gy)| {
                    let mut grid = Grid::new(w, h);
                    for (i, c) in cells.iter().enumerate() {
                        let point = Point::new(i as i32 % w, i as i32 / w);
                        let cell = match c {
                            0 => Cell::wall(),
                            1 => Cell::closed_door(),
                            _ => Cell::floor(),
                        };
                        grid.set_cell(point, cell);
                    }
                    let goal = Point::new(gx, gy);
                    grid.set_cell(goal, Cell::floor());
                    (grid, goal)
                })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn full_recalculation_is_idempotent((grid, goal) in arb_grid(), door_stop in any::<bool>()) {
            let mut field = FlowField::new(grid.width(), grid.height(), 30);
            field.add_goal(goal, 0);
            field.recalculate_full(&grid, 30, door_stop);
            let first = field.tiles().to_vec();
            field.recalculate_full(&grid, 30, door_stop);
            prop_assert_eq!(&first, &field.tiles().to_vec());
            prop_assert_eq!(field.relax(&grid, door_stop).changes, 0);
        }

        #[test]
        fn walls_keep_the_sentinel((grid, goal) in arb_grid()) {
            let mut field = FlowField::new(grid.width(), grid.height(), 30);
            field.add_goal(goal, 0);
            field.recalculate_full(&grid, 30, false);
            for y in 0..grid.height() {
                for x in 0..grid.width() {
                    let p = Point::new(x, y);
                    if grid.cell(p).unwrap().is_wall() {
                        prop_assert_eq!(field.value(p), Some(30));
                    }
                }
            }
        }

        #[test]
        fn best_offsets_stay_in_bounds_and_minimal((grid, goal) in arb_grid(), x in 0_i32..12, y in 0_i32..12) {
            let mut field = FlowField::new(grid.width(), grid.height(), 30);
            field.add_goal(goal, 0);
            field.recalculate_full(&grid, 30, false);
            let p = Point::new(x % grid.width(), y % grid.height());
            let best = field.lowest_neighbor(p).unwrap();
            let offsets = field.best_neighbor_offsets(p);
            prop_assert!(!offsets.is_empty());
            for d in offsets {
                prop_assert!(grid.in_bounds(p + d));
                prop_assert_eq!(field.value(p + d), Some(best));
            }
        }
    }

    #[test]
    fn sealed_pocket_keeps_the_sentinel() {
        let grid = grid(
            "
            #######
            #..#..#
            #..#..#
            #######
            ",
        );
        let mut field = FlowField::new(grid.width(), grid.height(), 30);
        field.add_goal(Point::new(1, 1), 0);
        let stats = field.recalculate_full(&grid, 30, false);
        assert!(stats.passes >= 1);
        assert_eq!(field.value(Point::new(4, 1)), Some(30));
        assert_eq!(field.value(Point::new(5, 2)), Some(30));
    }
}
