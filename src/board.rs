//! OpusCheckers - Board Representation Module
//!
//! This module provides the board snapshot and the move type. A snapshot is a
//! plain 8x8 array that is copied by value, so every hypothetical line in the
//! search owns its own board.

use crate::error::EngineError;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Starting position layout, top row (x = 0) first
pub const STARTING_LAYOUT: &str =
    ".b.b.b.b/b.b.b.b./.b.b.b.b/......../......../a.a.a.a./.a.a.a.a/a.a.a.a.";

/// Represents a single step of a turn. Equality only looks at the origin and
/// destination; the captured square follows from them.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    /// Square of the captured piece, `None` for a quiet move
    pub captured: Option<Square>,
}

impl Move {
    pub fn quiet(from: Square, to: Square) -> Self {
        Move { from, to, captured: None }
    }

    pub fn capture(from: Square, to: Square, captured: Square) -> Self {
        Move { from, to, captured: Some(captured) }
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// Move notation ("c3-d4", "c3xe5")
    pub fn notation(&self) -> String {
        let sep = if self.is_capture() { 'x' } else { '-' };
        format!("{}{}{}", self.from, sep, self.to)
    }

    /// Parse "c3-d4" / "c3xe5" into origin and destination
    pub fn parse_squares(text: &str) -> Result<(Square, Square), EngineError> {
        let invalid = || EngineError::InvalidNotation(text.to_string());
        let (from, to) = text
            .split_once(|c: char| c == '-' || c == 'x' || c == ':')
            .ok_or_else(invalid)?;
        let from = Square::parse(from).ok_or_else(invalid)?;
        let to = Square::parse(to).ok_or_else(invalid)?;
        Ok((from, to))
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to
    }
}

impl Eq for Move {}

impl Hash for Move {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.from.hash(state);
        self.to.hash(state);
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.notation())
    }
}

/// Checkers board snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    /// Cells indexed `[x][y]`
    cells: [[Cell; 8]; 8],
}

impl Board {
    /// Create a new board with the starting position
    pub fn new() -> Self {
        let mut board = Board::empty();
        for x in 0..BOARD_SIZE {
            for y in 0..BOARD_SIZE {
                let sq = Square::new(x, y);
                if !sq.is_dark() {
                    continue;
                }
                if x < 3 {
                    board.set(sq, Cell::ManB);
                } else if x > 4 {
                    board.set(sq, Cell::ManA);
                }
            }
        }
        board
    }

    pub fn empty() -> Self {
        Board { cells: [[Cell::Empty; 8]; 8] }
    }

    /// Create a board from a layout string: 8 rows separated by '/',
    /// '.' empty, 'a'/'b' men, 'A'/'B' kings
    pub fn from_layout(layout: &str) -> Result<Self, EngineError> {
        let rows: Vec<&str> = layout.trim().split('/').collect();
        if rows.len() != BOARD_SIZE as usize {
            return Err(EngineError::InvalidLayout(format!(
                "expected 8 rows, found {}",
                rows.len()
            )));
        }

        let mut board = Board::empty();
        for (x, row) in rows.iter().enumerate() {
            let cells: Vec<char> = row.chars().collect();
            if cells.len() != BOARD_SIZE as usize {
                return Err(EngineError::InvalidLayout(format!(
                    "row {} has {} cells",
                    x,
                    cells.len()
                )));
            }
            for (y, &c) in cells.iter().enumerate() {
                let cell = Cell::from_char(c).ok_or_else(|| {
                    EngineError::InvalidLayout(format!("unknown cell '{}' in row {}", c, x))
                })?;
                board.cells[x][y] = cell;
            }
        }

        Ok(board)
    }

    /// Generate the layout string of this board
    pub fn to_layout(&self) -> String {
        self.cells
            .iter()
            .map(|row| row.iter().map(|c| c.to_char()).collect::<String>())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Cell at an on-board square
    #[inline]
    pub fn get(&self, sq: Square) -> Cell {
        self.cells[sq.x as usize][sq.y as usize]
    }

    #[inline]
    pub fn set(&mut self, sq: Square, cell: Cell) {
        self.cells[sq.x as usize][sq.y as usize] = cell;
    }

    /// Cell at a square, `None` when off the board
    pub fn cell_at(&self, sq: Square) -> Option<Cell> {
        if sq.on_board() {
            Some(self.get(sq))
        } else {
            None
        }
    }

    /// Squares occupied by `side`, scanned row by row
    pub fn pieces(&self, side: Side) -> impl Iterator<Item = Square> + '_ {
        (0..BOARD_SIZE)
            .flat_map(|x| (0..BOARD_SIZE).map(move |y| Square::new(x, y)))
            .filter(move |&sq| self.get(sq).belongs_to(side))
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().flatten().filter(|&&c| c == cell).count()
    }

    /// Return the position after `mv`: the captured piece is removed and a man
    /// reaching its promotion row is crowned.
    pub fn apply(&self, mv: &Move) -> Board {
        let mut next = *self;
        if let Some(captured) = mv.captured {
            next.set(captured, Cell::Empty);
        }

        let mut piece = next.get(mv.from);
        if let Some(side) = piece.side() {
            if piece.is_man() && mv.to.x == side.promotion_row() {
                piece = piece.promoted();
            }
        }

        next.set(mv.to, piece);
        next.set(mv.from, Cell::Empty);
        next
    }

    /// Display the board as a string
    pub fn display(&self) -> String {
        let mut lines = Vec::new();
        lines.push("  +---+---+---+---+---+---+---+---+".to_string());

        for x in 0..BOARD_SIZE {
            let mut row = format!("{} |", RANK_NAMES[x as usize] as char);
            for y in 0..BOARD_SIZE {
                match self.get(Square::new(x, y)) {
                    Cell::Empty => row.push_str("   |"),
                    cell => row.push_str(&format!(" {} |", cell.to_char())),
                }
            }
            lines.push(row);
            lines.push("  +---+---+---+---+---+---+---+---+".to_string());
        }
        lines.push("    a   b   c   d   e   f   g   h".to_string());

        lines.join("\n")
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
