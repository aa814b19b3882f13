//! OpusCheckers - Type definitions and constants
//!
//! This module provides the core type definitions and constants for
//! representing cells, sides and board coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Board edge length
pub const BOARD_SIZE: i8 = 8;

/// File and rank names for algebraic notation. Ranks are indexed by row,
/// so row 0 (side B's back rank) is rank 8.
pub const FILE_NAMES: &[u8; 8] = b"abcdefgh";
pub const RANK_NAMES: &[u8; 8] = b"87654321";

/// The two sides. Side A starts on rows 5-7 and promotes on row 0,
/// side B starts on rows 0-2 and promotes on row 7.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Row delta of a man's forward step
    #[inline]
    pub fn forward(self) -> i8 {
        match self {
            Side::A => -1,
            Side::B => 1,
        }
    }

    /// Row on which this side's men are crowned
    #[inline]
    pub fn promotion_row(self) -> i8 {
        match self {
            Side::A => 0,
            Side::B => BOARD_SIZE - 1,
        }
    }

    /// Parse "a" / "b" (case-insensitive)
    pub fn parse(name: &str) -> Option<Side> {
        match name {
            "a" | "A" => Some(Side::A),
            "b" | "B" => Some(Side::B),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "a"),
            Side::B => write!(f, "b"),
        }
    }
}

/// Cell codes. Odd codes belong to side A, even non-zero codes to side B,
/// and a king's code is its man's code plus two.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cell {
    #[default]
    Empty = 0,
    ManA = 1,
    ManB = 2,
    KingA = 3,
    KingB = 4,
}

impl Cell {
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Cell> {
        match code {
            0 => Some(Cell::Empty),
            1 => Some(Cell::ManA),
            2 => Some(Cell::ManB),
            3 => Some(Cell::KingA),
            4 => Some(Cell::KingB),
            _ => None,
        }
    }

    pub fn man(side: Side) -> Cell {
        match side {
            Side::A => Cell::ManA,
            Side::B => Cell::ManB,
        }
    }

    pub fn king(side: Side) -> Cell {
        match side {
            Side::A => Cell::KingA,
            Side::B => Cell::KingB,
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    /// Owner of the piece, derived from code parity
    #[inline]
    pub fn side(self) -> Option<Side> {
        match self.code() {
            0 => None,
            code if code % 2 == 1 => Some(Side::A),
            _ => Some(Side::B),
        }
    }

    #[inline]
    pub fn is_king(self) -> bool {
        self.code() > 2
    }

    #[inline]
    pub fn is_man(self) -> bool {
        matches!(self, Cell::ManA | Cell::ManB)
    }

    #[inline]
    pub fn belongs_to(self, side: Side) -> bool {
        self.side() == Some(side)
    }

    /// King of the same side; kings and empty cells are returned unchanged
    pub fn promoted(self) -> Cell {
        match self {
            Cell::ManA => Cell::KingA,
            Cell::ManB => Cell::KingB,
            other => other,
        }
    }

    /// Layout character
    pub fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::ManA => 'a',
            Cell::ManB => 'b',
            Cell::KingA => 'A',
            Cell::KingB => 'B',
        }
    }

    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            '.' => Some(Cell::Empty),
            'a' => Some(Cell::ManA),
            'b' => Some(Cell::ManB),
            'A' => Some(Cell::KingA),
            'B' => Some(Cell::KingB),
            _ => None,
        }
    }
}

/// A board coordinate. `x` is the row, `y` the column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    pub x: i8,
    pub y: i8,
}

impl Square {
    pub const fn new(x: i8, y: i8) -> Self {
        Square { x, y }
    }

    #[inline]
    pub fn on_board(self) -> bool {
        (0..BOARD_SIZE).contains(&self.x) && (0..BOARD_SIZE).contains(&self.y)
    }

    #[inline]
    pub fn offset(self, dx: i8, dy: i8) -> Square {
        Square::new(self.x + dx, self.y + dy)
    }

    /// Playable squares
    #[inline]
    pub fn is_dark(self) -> bool {
        (self.x + self.y) % 2 == 1
    }

    /// Algebraic name (e.g. "c3")
    pub fn name(self) -> String {
        format!(
            "{}{}",
            FILE_NAMES[self.y as usize] as char,
            RANK_NAMES[self.x as usize] as char
        )
    }

    /// Parse algebraic notation
    pub fn parse(name: &str) -> Option<Square> {
        let bytes = name.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let y = FILE_NAMES.iter().position(|&f| f == bytes[0].to_ascii_lowercase())?;
        let x = RANK_NAMES.iter().position(|&r| r == bytes[1])?;
        Some(Square::new(x as i8, y as i8))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.on_board() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "({},{})", self.x, self.y)
        }
    }
}
