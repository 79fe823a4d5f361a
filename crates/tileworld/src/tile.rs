use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer cell coordinate on a map grid. `y` grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Shifts by `(dx, dy)`. Offsets come from authored content, so the sum
    /// wraps at the `i32` bounds instead of overflowing.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.wrapping_add(dx),
            y: self.y.wrapping_add(dy),
        }
    }

    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    /// Center of this tile in continuous coordinates.
    pub fn center_px(self, tile_width: f32, tile_height: f32) -> Vec2 {
        Vec2 {
            x: (self.x as f32 + 0.5) * tile_width,
            y: (self.y as f32 + 0.5) * tile_height,
        }
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    /// Tile containing this point, truncating toward zero like the body-to-tile conversion.
    pub fn to_tile(self, tile_width: f32, tile_height: f32) -> TilePos {
        TilePos {
            x: (self.x / tile_width) as i32,
            y: (self.y / tile_height) as i32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
    Up,
    UpRight,
}

const DIRECTION_COUNT: usize = 8;

impl Direction {
    pub const ALL: [Direction; DIRECTION_COUNT] = [
        Direction::Right,
        Direction::DownRight,
        Direction::Down,
        Direction::DownLeft,
        Direction::Left,
        Direction::UpLeft,
        Direction::Up,
        Direction::UpRight,
    ];

    pub const CARDINALS: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Down,
        Direction::Up,
    ];

    const fn index(self) -> usize {
        match self {
            Direction::Right => 0,
            Direction::DownRight => 1,
            Direction::Down => 2,
            Direction::DownLeft => 3,
            Direction::Left => 4,
            Direction::UpLeft => 5,
            Direction::Up => 6,
            Direction::UpRight => 7,
        }
    }

    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + DIRECTION_COUNT / 2) % DIRECTION_COUNT]
    }

    pub fn is_diagonal(self) -> bool {
        self.index() % 2 == 1
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Right => (1, 0),
            Direction::DownRight => (1, 1),
            Direction::Down => (0, 1),
            Direction::DownLeft => (-1, 1),
            Direction::Left => (-1, 0),
            Direction::UpLeft => (-1, -1),
            Direction::Up => (0, -1),
            Direction::UpRight => (1, -1),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Right => "right",
            Direction::DownRight => "down_right",
            Direction::Down => "down",
            Direction::DownLeft => "down_left",
            Direction::Left => "left",
            Direction::UpLeft => "up_left",
            Direction::Up => "up",
            Direction::UpRight => "up_right",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|direction| direction.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Set of movement directions an event accepts.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DirectionSet(u8);

impl DirectionSet {
    pub const EMPTY: DirectionSet = DirectionSet(0);
    pub const ALL: DirectionSet = DirectionSet(u8::MAX);

    pub fn single(direction: Direction) -> Self {
        Self(1 << direction.index())
    }

    pub fn insert(&mut self, direction: Direction) {
        self.0 |= 1 << direction.index();
    }

    pub fn contains(self, direction: Direction) -> bool {
        self.0 & (1 << direction.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_all(self) -> bool {
        self == Self::ALL
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// First member in `Direction::ALL` order.
    pub fn first(self) -> Option<Direction> {
        self.iter().next()
    }

    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL
            .into_iter()
            .filter(move |direction| self.contains(*direction))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = DirectionSet::EMPTY;
        for direction in iter {
            set.insert(direction);
        }
        set
    }
}

impl fmt::Debug for DirectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_round_trips_for_every_direction() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            let (dx, dy) = direction.delta();
            let (ox, oy) = direction.opposite().delta();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
    }

    #[test]
    fn up_moves_toward_smaller_y() {
        let pos = TilePos::new(3, 3);
        assert_eq!(pos.step(Direction::Up), TilePos::new(3, 2));
        assert_eq!(pos.step(Direction::Down), TilePos::new(3, 4));
        assert_eq!(pos.step(Direction::Left), TilePos::new(2, 3));
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!(Direction::from_label("UP_LEFT"), Some(Direction::UpLeft));
        assert_eq!(Direction::from_label(" right "), Some(Direction::Right));
        assert_eq!(Direction::from_label("sideways"), None);
    }

    #[test]
    fn direction_set_membership_and_iteration_order() {
        let set: DirectionSet = [Direction::Up, Direction::Right].into_iter().collect();
        assert!(set.contains(Direction::Up));
        assert!(!set.contains(Direction::Down));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Direction::Right, Direction::Up]);
        assert!(DirectionSet::ALL.is_all());
        assert_eq!(DirectionSet::ALL.len(), 8);
    }

    #[test]
    fn offsets_near_the_bounds_wrap() {
        let edge = TilePos::new(i32::MAX, i32::MIN);
        assert_eq!(edge.offset(1, -1), TilePos::new(i32::MIN, i32::MAX));
        assert_eq!(edge.step(Direction::Right).x, i32::MIN);
        assert_eq!(TilePos::new(3, 4).offset(-2, 2), TilePos::new(1, 6));
    }

    #[test]
    fn tile_center_is_half_tile_offset() {
        let center = TilePos::new(2, 5).center_px(16.0, 16.0);
        assert_eq!(center, Vec2 { x: 40.0, y: 88.0 });
        assert_eq!(center.to_tile(16.0, 16.0), TilePos::new(2, 5));
    }

    #[test]
    fn directions_deserialize_from_snake_case_labels() {
        let parsed: Vec<Direction> =
            serde_json::from_str(r#"["up", "down_right"]"#).expect("parse");
        assert_eq!(parsed, vec![Direction::Up, Direction::DownRight]);
    }
}
