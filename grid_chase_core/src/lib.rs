use serde::{Deserialize, Serialize};

pub mod board;
pub mod level;
pub mod map;
pub mod motion;
pub mod rules;
pub mod session;
pub mod signal;
pub mod timer;

/// Side length of the square playing field.
pub const GRID_SIZE: usize = 10;

/// Represents a 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Shifts the position by a signed offset.
    ///
    /// Returns `None` if either coordinate would drop below zero. The upper
    /// bound is checked by the grid the position is used against.
    pub fn offset(self, dx: isize, dy: isize) -> Option<Position> {
        Some(Position {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}

/// One of the four orthogonal player moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns the `(dx, dy)` step for this direction. Row 0 is the top row.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Identifies one of the (at most two) players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSlot {
    One,
    Two,
}

impl PlayerSlot {
    pub fn index(self) -> usize {
        match self {
            PlayerSlot::One => 0,
            PlayerSlot::Two => 1,
        }
    }

    /// The cell value that marks this player on the grid.
    pub fn cell(self) -> Cell {
        match self {
            PlayerSlot::One => Cell::Player1,
            PlayerSlot::Two => Cell::Player2,
        }
    }
}

/// Number of players taking part in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Single,
    /// Two players on one keyboard racing for the same goal.
    Versus,
}

impl Mode {
    pub fn players(self) -> &'static [PlayerSlot] {
        match self {
            Mode::Single => &[PlayerSlot::One],
            Mode::Versus => &[PlayerSlot::One, PlayerSlot::Two],
        }
    }
}

/// What a single grid cell shows. A cell holds exactly one of these at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Player1,
    Player2,
    Goal,
    Obstacle,
    Collectible,
    Trap,
}

impl Cell {
    /// Single-character glyph used by text frontends.
    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Player1 => 'P',
            Cell::Player2 => '2',
            Cell::Goal => 'G',
            Cell::Obstacle => 'X',
            Cell::Collectible => 'C',
            Cell::Trap => 'T',
        }
    }
}
