use bracket_geometry::prelude::{Point, Rect};
use bracket_random::prelude::RandomNumberGenerator;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{Result, SimError};

pub const DEFAULT_MAP_WIDTH: i32 = 80;
pub const DEFAULT_MAP_HEIGHT: i32 = 43;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub blocked: bool,
    pub blocks_sight: bool,
    pub is_door: bool,
    pub explored: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Cell::wall()
    }
}

impl Cell {
    /// Sight blocking follows `blocked` unless given explicitly.
    pub fn new(blocked: bool, blocks_sight: Option<bool>, is_door: bool) -> Self {
        Self {
            blocked,
            blocks_sight: blocks_sight.unwrap_or(blocked),
            is_door,
            explored: false,
        }
    }

    pub fn wall() -> Self {
        Self::new(true, None, false)
    }

    pub fn floor() -> Self {
        Self::new(false, None, false)
    }

    pub fn closed_door() -> Self {
        Self::new(true, None, true)
    }

    pub fn open_door() -> Self {
        Self::new(false, None, true)
    }

    /// Solid rock: stops every flow field.
    pub fn is_wall(&self) -> bool {
        self.blocks_sight && !self.is_door
    }

    pub fn is_closed_door(&self) -> bool {
        self.is_door && self.blocks_sight
    }

    pub fn is_open_door(&self) -> bool {
        self.is_door && !self.blocks_sight
    }
}

/// What a level map places on top of the terrain.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Marker {
    pub glyph: char,
    pub point: Point,
}

#[derive(Clone, Debug)]
pub struct ParsedLevel {
    pub grid: Grid,
    pub markers: Vec<Marker>,
}

impl ParsedLevel {
    pub fn player_start(&self) -> Option<Point> {
        self.markers
            .iter()
            .find(|m| m.glyph == PLAYER_GLYPH)
            .map(|m| m.point)
    }

    /// Split out the player start and the stairs. `@` is required.
    pub fn into_plan(self) -> Result<LevelPlan> {
        let start = self.player_start().ok_or(SimError::NoPlayerStart)?;
        let stairs = self
            .markers
            .iter()
            .find(|m| m.glyph == STAIRS_GLYPH)
            .map(|m| m.point);
        let markers = self
            .markers
            .into_iter()
            .filter(|m| m.glyph != PLAYER_GLYPH && m.glyph != STAIRS_GLYPH)
            .collect();
        Ok(LevelPlan {
            grid: self.grid,
            start,
            stairs,
            markers,
            rooms: Vec::new(),
        })
    }
}

pub const PLAYER_GLYPH: char = '@';
pub const STAIRS_GLYPH: char = '>';

/// A level ready to be installed: terrain, where things go, and the rooms
/// that may be populated at random.
#[derive(Clone, Debug)]
pub struct LevelPlan {
    pub grid: Grid,
    pub start: Point,
    pub stairs: Option<Point>,
    pub markers: Vec<Marker>,
    pub rooms: Vec<Rect>,
}

/// Supplies the next level whenever the player descends.
pub trait LevelSource {
    fn next_level(&mut self, depth: u32, rng: &mut RandomNumberGenerator) -> LevelPlan;
}

/// Hands out a fixed list of levels, starting over after the last one.
pub struct RepeatingLevels {
    plans: Vec<LevelPlan>,
    cursor: usize,
}

impl RepeatingLevels {
    pub fn new(plans: Vec<LevelPlan>) -> Result<Self> {
        if plans.is_empty() {
            return Err(SimError::EmptyLevel);
        }
        Ok(Self { plans, cursor: 0 })
    }
}

impl LevelSource for RepeatingLevels {
    fn next_level(&mut self, depth: u32, _rng: &mut RandomNumberGenerator) -> LevelPlan {
        let plan = self.plans[self.cursor % self.plans.len()].clone();
        self.cursor = (self.cursor + 1) % self.plans.len();
        debug!(depth, cursor = self.cursor, "next level");
        plan
    }
}

/// Random rooms joined by L-shaped tunnels, with doors tried on the
/// chokepoints afterwards. The player starts in the first room and the
/// stairs sit in the centre of the last one.
#[derive(Clone, Debug)]
pub struct CarvedLevels {
    pub width: i32,
    pub height: i32,
    pub max_rooms: usize,
    pub room_min: i32,
    pub room_max: i32,
    pub door_chance: i32,
    /// Door placement attempts per level.
    pub door_budget: usize,
}

impl Default for CarvedLevels {
    fn default() -> Self {
        Self {
            width: DEFAULT_MAP_WIDTH,
            height: DEFAULT_MAP_HEIGHT,
            max_rooms: 30,
            room_min: 6,
            room_max: 10,
            door_chance: 50,
            door_budget: 100,
        }
    }
}

impl CarvedLevels {
    pub fn carve(&self, rng: &mut RandomNumberGenerator) -> LevelPlan {
        let mut grid = Grid::new(self.width, self.height);
        let mut rooms: Vec<Rect> = Vec::new();
        for _ in 0..self.max_rooms {
            let w = rng.range(self.room_min, self.room_max + 1);
            let h = rng.range(self.room_min, self.room_max + 1);
            let x = rng.range(0, (self.width - w - 1).max(1));
            let y = rng.range(0, (self.height - h - 1).max(1));
            let room = Rect::with_size(x, y, w, h);
            if rooms.iter().any(|other| room.intersect(other)) {
                continue;
            }
            grid.carve_room(room);
            if let Some(prev) = rooms.last() {
                let (from, to) = (prev.center(), room.center());
                if rng.range(0, 2) == 1 {
                    grid.carve_h_tunnel(from.x, to.x, from.y);
                    grid.carve_v_tunnel(from.y, to.y, to.x);
                } else {
                    grid.carve_v_tunnel(from.y, to.y, from.x);
                    grid.carve_h_tunnel(from.x, to.x, to.y);
                }
            }
            rooms.push(room);
        }

        let candidates: Vec<Point> = (0..self.door_budget)
            .map(|_| Point::new(rng.range(1, self.width - 1), rng.range(1, self.height - 1)))
            .collect();
        grid.place_doors(rng, &candidates, self.door_chance, self.door_budget);

        let start = rooms.first().map_or(Point::new(1, 1), Rect::center);
        let stairs = rooms.last().map(Rect::center);
        debug!(rooms = rooms.len(), "carved level");
        LevelPlan {
            grid,
            start,
            stairs,
            markers: Vec::new(),
            rooms,
        }
    }
}

impl LevelSource for CarvedLevels {
    fn next_level(&mut self, depth: u32, rng: &mut RandomNumberGenerator) -> LevelPlan {
        trace!(depth, "carving next level");
        self.carve(rng)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// A grid of solid rock.
    pub fn new(width: i32, height: i32) -> Self {
        let size = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            cells: vec![Cell::wall(); size],
        }
    }

    /// Parse an ASCII level.
    ///
    /// `#` is rock, `.` is floor, `+` a closed door and `'` an open door.
    /// Any glyph listed in `marker_glyphs` stands on a floor cell and is
    /// reported back as a marker. Whitespace-only lines are skipped and
    /// trailing whitespace is ignored.
    pub fn parse(ascii: &str, marker_glyphs: &str) -> Result<ParsedLevel> {
        let rows: Vec<&str> = ascii
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .collect();
        let indent = rows
            .iter()
            .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
            .min()
            .ok_or(SimError::EmptyLevel)?;

        let rows: Vec<Vec<char>> = rows
            .iter()
            .map(|line| line.chars().skip(indent).collect())
            .collect();
        let width = rows[0].len();
        if width == 0 {
            return Err(SimError::EmptyLevel);
        }

        let mut grid = Grid::new(width as i32, rows.len() as i32);
        let mut markers = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(SimError::RaggedLevel {
                    row: y,
                    found: row.len(),
                    expected: width,
                });
            }
            for (x, &glyph) in row.iter().enumerate() {
                let point = Point::new(x as i32, y as i32);
                let cell = match glyph {
                    '#' => Cell::wall(),
                    '.' => Cell::floor(),
                    '+' => Cell::closed_door(),
                    '\'' => Cell::open_door(),
                    c if marker_glyphs.contains(c) => {
                        markers.push(Marker { glyph: c, point });
                        Cell::floor()
                    }
                    c => {
                        return Err(SimError::UnknownGlyph {
                            glyph: c,
                            x: point.x,
                            y: point.y,
                        });
                    }
                };
                grid.set_cell(point, cell);
            }
        }

        Ok(ParsedLevel { grid, markers })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub(crate) fn idx(&self, point: Point) -> Option<usize> {
        if self.in_bounds(point) {
            Some((point.y * self.width + point.x) as usize)
        } else {
            None
        }
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0 && point.x < self.width && point.y >= 0 && point.y < self.height
    }

    pub fn set_cell(&mut self, point: Point, cell: Cell) {
        if let Some(idx) = self.idx(point) {
            self.cells[idx] = cell;
        }
    }

    pub fn cell(&self, point: Point) -> Option<&Cell> {
        self.idx(point).map(|idx| &self.cells[idx])
    }

    pub fn cell_mut(&mut self, point: Point) -> Option<&mut Cell> {
        self.idx(point).map(|idx| &mut self.cells[idx])
    }

    /// Terrain-only movement check. Out of bounds counts as blocked.
    pub fn is_blocked(&self, point: Point) -> bool {
        self.cell(point).map_or(true, |cell| cell.blocked)
    }

    pub fn blocks_sight(&self, point: Point) -> bool {
        self.cell(point).map_or(true, |cell| cell.blocks_sight)
    }

    pub fn is_door(&self, point: Point) -> bool {
        self.cell(point).map_or(false, |cell| cell.is_door)
    }

    pub fn set_explored(&mut self, point: Point) {
        if let Some(cell) = self.cell_mut(point) {
            cell.explored = true;
        }
    }

    /// Returns whether a closed door was opened.
    pub fn open_door(&mut self, point: Point) -> bool {
        match self.cell_mut(point) {
            Some(cell) if cell.is_closed_door() => {
                cell.blocked = false;
                cell.blocks_sight = false;
                true
            }
            _ => false,
        }
    }

    /// Returns whether an open door was closed. Occupancy is the caller's
    /// business, the grid knows nothing about actors.
    pub fn close_door(&mut self, point: Point) -> bool {
        match self.cell_mut(point) {
            Some(cell) if cell.is_open_door() => {
                cell.blocked = true;
                cell.blocks_sight = true;
                true
            }
            _ => false,
        }
    }

    pub fn carve_room(&mut self, room: Rect) {
        for y in (room.y1 + 1)..room.y2 {
            for x in (room.x1 + 1)..room.x2 {
                self.set_cell(Point::new(x, y), Cell::floor());
            }
        }
    }

    pub fn carve_h_tunnel(&mut self, x1: i32, x2: i32, y: i32) {
        for x in x1.min(x2)..=x1.max(x2) {
            self.set_cell(Point::new(x, y), Cell::floor());
        }
    }

    pub fn carve_v_tunnel(&mut self, y1: i32, y2: i32, x: i32) {
        for y in y1.min(y2)..=y1.max(y2) {
            self.set_cell(Point::new(x, y), Cell::floor());
        }
    }

    /// A floor cell squeezed between rock on both sides along one axis.
    fn is_hallway(&self, point: Point) -> bool {
        if self.blocks_sight(point) {
            return false;
        }
        let (x, y) = (point.x, point.y);
        (self.blocks_sight(Point::new(x - 1, y)) && self.blocks_sight(Point::new(x + 1, y)))
            || (self.blocks_sight(Point::new(x, y - 1)) && self.blocks_sight(Point::new(x, y + 1)))
    }

    fn door_nearby(&self, point: Point) -> bool {
        (-2..2).any(|dy| (-2..2).any(|dx| self.is_door(Point::new(point.x + dx, point.y + dy))))
    }

    /// Try to put closed doors on hallway chokepoints.
    ///
    /// Candidates are visited in order, each one costing one attempt from
    /// `budget`. Once the budget runs out the doors placed so far stay.
    /// Returns the number of doors created.
    pub fn place_doors(
        &mut self,
        rng: &mut RandomNumberGenerator,
        candidates: &[Point],
        chance_percent: i32,
        budget: usize,
    ) -> usize {
        let mut placed = 0;
        for (attempt, &point) in candidates.iter().enumerate() {
            if attempt >= budget {
                warn!(budget, placed, "door placement budget exhausted");
                break;
            }
            if rng.range(1, 101) > chance_percent {
                continue;
            }
            if point.x <= 0
                || point.y <= 0
                || point.x >= self.width - 1
                || point.y >= self.height - 1
            {
                continue;
            }
            if self.is_hallway(point) && !self.door_nearby(point) {
                self.set_cell(point, Cell::closed_door());
                placed += 1;
            }
        }
        debug!(placed, "placed doors");
        placed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowField;

    const CORRIDOR: &str = "
        #######
        #.....#
        ###.###
        #..@..#
        #######
    ";

    #[test]
    fn blocked_cells_block_sight_by_default() {
        assert!(Cell::new(true, None, false).blocks_sight);
        assert!(!Cell::new(true, Some(false), false).blocks_sight);
        assert!(!Cell::new(false, None, false).blocks_sight);
    }

    #[test]
    fn parse_reads_terrain_and_markers() {
        let level = Grid::parse(CORRIDOR, "@").unwrap();
        assert_eq!(level.grid.width(), 7);
        assert_eq!(level.grid.height(), 5);
        assert_eq!(level.player_start(), Some(Point::new(3, 3)));
        assert!(!level.grid.is_blocked(Point::new(3, 3)));
        assert!(level.grid.is_blocked(Point::new(0, 0)));
        assert!(level.grid.is_blocked(Point::new(-1, 2)));
    }

    #[test]
    fn parse_rejects_bad_maps() {
        assert!(matches!(Grid::parse("   \n  ", ""), Err(SimError::EmptyLevel)));
        assert!(matches!(
            Grid::parse("###\n##", ""),
            Err(SimError::RaggedLevel { row: 1, .. })
        ));
        assert!(matches!(
            Grid::parse("#?#", ""),
            Err(SimError::UnknownGlyph { glyph: '?', .. })
        ));
    }

    #[test]
    fn plans_split_out_start_and_stairs() {
        let plan = Grid::parse("#@.g>#", "@g>").unwrap().into_plan().unwrap();
        assert_eq!(plan.start, Point::new(1, 0));
        assert_eq!(plan.stairs, Some(Point::new(4, 0)));
        assert_eq!(
            plan.markers,
            vec![Marker {
                glyph: 'g',
                point: Point::new(3, 0)
            }]
        );
        assert!(matches!(
            Grid::parse("#..#", "@").unwrap().into_plan(),
            Err(SimError::NoPlayerStart)
        ));
    }

    #[test]
    fn repeating_levels_cycle() {
        let first = Grid::parse("#@.#", "@").unwrap().into_plan().unwrap();
        let second = Grid::parse("#.@#", "@").unwrap().into_plan().unwrap();
        let mut levels = RepeatingLevels::new(vec![first, second]).unwrap();
        let mut rng = RandomNumberGenerator::seeded(1);
        let starts: Vec<i32> = (2..6).map(|d| levels.next_level(d, &mut rng).start.x).collect();
        assert_eq!(starts, [1, 2, 1, 2]);
        assert!(RepeatingLevels::new(Vec::new()).is_err());
    }

    #[test]
    fn doors_toggle_between_states() {
        let mut grid = Grid::parse("#+#", "").unwrap().grid;
        let door = Point::new(1, 0);
        assert!(grid.cell(door).unwrap().is_closed_door());
        assert!(!grid.close_door(door));
        assert!(grid.open_door(door));
        assert!(!grid.is_blocked(door));
        assert!(!grid.blocks_sight(door));
        assert!(grid.close_door(door));
        assert!(grid.is_blocked(door));
    }

    #[test]
    fn doors_only_go_into_hallways() {
        let mut grid = Grid::parse(CORRIDOR, "@").unwrap().grid;
        let mut rng = RandomNumberGenerator::seeded(3);
        // (2, 1) is a hallway too, but sits next to the first door.
        let candidates = [Point::new(3, 2), Point::new(2, 1), Point::new(3, 3)];
        let placed = grid.place_doors(&mut rng, &candidates, 100, 10);
        assert_eq!(placed, 1);
        assert!(grid.cell(Point::new(3, 2)).unwrap().is_closed_door());
        assert!(!grid.is_door(Point::new(2, 1)));
    }

    #[test]
    fn door_budget_caps_attempts() {
        let mut grid = Grid::parse(CORRIDOR, "@").unwrap().grid;
        let mut rng = RandomNumberGenerator::seeded(3);
        let candidates = [Point::new(3, 1), Point::new(3, 2)];
        assert_eq!(grid.place_doors(&mut rng, &candidates, 100, 1), 0);
        assert!(!grid.is_door(Point::new(3, 2)));
    }

    #[test]
    fn carved_levels_connect_start_to_stairs() {
        let carver = CarvedLevels::default();
        for seed in [1, 7, 42] {
            let mut rng = RandomNumberGenerator::seeded(seed);
            let plan = carver.carve(&mut rng);
            assert!(!plan.rooms.is_empty());
            assert!(!plan.grid.is_blocked(plan.start));
            let stairs = plan.stairs.unwrap();
            assert!(!plan.grid.is_blocked(stairs));
            for (i, room) in plan.rooms.iter().enumerate() {
                assert!(room.x2 < plan.grid.width() && room.y2 < plan.grid.height());
                assert!(plan.rooms[..i].iter().all(|other| !room.intersect(other)));
            }

            let unreachable = 10_000;
            let mut field = FlowField::new(plan.grid.width(), plan.grid.height(), unreachable);
            field.add_goal(plan.start, 0);
            field.recalculate_full(&plan.grid, unreachable, false);
            assert!(field.value(stairs).unwrap() < unreachable);
        }
    }

    #[test]
    fn carved_doors_respect_the_budget() {
        let carver = CarvedLevels {
            door_chance: 100,
            door_budget: 3,
            ..CarvedLevels::default()
        };
        let mut rng = RandomNumberGenerator::seeded(5);
        let plan = carver.carve(&mut rng);
        let mut doors = 0;
        for y in 0..plan.grid.height() {
            for x in 0..plan.grid.width() {
                if plan.grid.is_door(Point::new(x, y)) {
                    doors += 1;
                }
            }
        }
        assert!(doors <= 3);
    }
}
