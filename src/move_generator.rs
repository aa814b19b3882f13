//! OpusCheckers - Move Generator Module
//!
//! This module generates legal checkers moves for a single piece or for a
//! whole side, enforcing the mandatory-capture rule. Generation is a pure
//! function of the board; only the side-level ordering used by the search
//! is shuffled, through a seeded `MoveGenerator`.

use crate::board::{Board, Move};
use crate::line::Line;
use crate::types::*;
use rand::prelude::*;

/// Diagonal directions, in scan order
const DIAGONALS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// Result of a move query: the legal moves and whether they are captures
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MoveSet {
    pub moves: Vec<Move>,
    /// Set when a capture is available; `moves` then holds only captures
    pub captures: bool,
}

impl MoveSet {
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.moves.iter()
    }

    pub fn contains(&self, mv: &Move) -> bool {
        self.moves.contains(mv)
    }

    /// Look up the legal move between two squares
    pub fn find(&self, from: Square, to: Square) -> Option<Move> {
        self.moves.iter().copied().find(|m| m.from == from && m.to == to)
    }

    /// Destinations reachable from `from`
    pub fn targets_from(&self, from: Square) -> Vec<Square> {
        self.moves.iter().filter(|m| m.from == from).map(|m| m.to).collect()
    }
}

/// Generate the moves of the piece on `from`. Captures take precedence: if
/// the piece can capture, its quiet moves are not returned.
pub fn piece_moves(board: &Board, from: Square) -> MoveSet {
    let cell = match board.cell_at(from) {
        Some(cell) => cell,
        None => return MoveSet::default(),
    };
    let side = match cell.side() {
        Some(side) => side,
        None => return MoveSet::default(),
    };

    let mut moves = Vec::new();
    if cell.is_king() {
        generate_king_captures(board, from, side, &mut moves);
    } else {
        generate_man_captures(board, from, side, &mut moves);
    }
    if !moves.is_empty() {
        return MoveSet { moves, captures: true };
    }

    if cell.is_king() {
        generate_king_quiet(board, from, &mut moves);
    } else {
        generate_man_quiet(board, from, side, &mut moves);
    }
    MoveSet { moves, captures: false }
}

/// Generate all legal moves of `side`. Once any piece can capture, quiet
/// moves are discarded and only pieces with captures contribute.
pub fn side_moves(board: &Board, side: Side) -> MoveSet {
    let mut moves = Vec::new();
    let mut captures = false;

    for sq in board.pieces(side) {
        let set = piece_moves(board, sq);
        if set.captures && !captures {
            captures = true;
            moves.clear();
        }
        if set.captures || !captures {
            moves.extend(set.moves);
        }
    }

    MoveSet { moves, captures }
}

/// Enumerate every complete turn of `side` with the position it leads to.
/// Capture chains are followed until the moving piece has no capture left.
pub fn legal_turns(board: &Board, side: Side) -> Vec<(Line, Board)> {
    let set = side_moves(board, side);
    let mut turns = Vec::with_capacity(set.len());
    for mv in set.moves {
        let next = board.apply(&mv);
        if set.captures {
            extend_chain(Line::single(mv), next, mv.to, &mut turns);
        } else {
            turns.push((Line::single(mv), next));
        }
    }
    turns
}

fn extend_chain(line: Line, board: Board, piece: Square, turns: &mut Vec<(Line, Board)>) {
    let set = piece_moves(&board, piece);
    if !set.captures {
        turns.push((line, board));
        return;
    }
    for mv in set.moves {
        let mut next_line = line.clone();
        next_line.push(mv);
        extend_chain(next_line, board.apply(&mv), mv.to, turns);
    }
}

/// A man jumps an adjacent enemy piece in any diagonal direction
fn generate_man_captures(board: &Board, from: Square, side: Side, moves: &mut Vec<Move>) {
    for &(dx, dy) in &DIAGONALS {
        let over = from.offset(dx, dy);
        let to = from.offset(2 * dx, 2 * dy);
        if !to.on_board() || !board.get(to).is_empty() {
            continue;
        }
        let victim = board.get(over);
        if victim.is_empty() || victim.belongs_to(side) {
            continue;
        }
        moves.push(Move::capture(from, to, over));
    }
}

/// A king slides to the first piece on a diagonal; if it is an enemy, every
/// empty square behind it up to the next piece is a landing square.
fn generate_king_captures(board: &Board, from: Square, side: Side, moves: &mut Vec<Move>) {
    for &(dx, dy) in &DIAGONALS {
        let mut captured: Option<Square> = None;
        let mut sq = from.offset(dx, dy);

        while sq.on_board() {
            let cell = board.get(sq);
            if !cell.is_empty() {
                // own piece, or a second piece behind the victim
                if cell.belongs_to(side) || captured.is_some() {
                    break;
                }
                captured = Some(sq);
            } else if let Some(victim) = captured {
                moves.push(Move::capture(from, sq, victim));
            }
            sq = sq.offset(dx, dy);
        }
    }
}

fn generate_man_quiet(board: &Board, from: Square, side: Side, moves: &mut Vec<Move>) {
    for dy in [-1, 1] {
        let to = from.offset(side.forward(), dy);
        if to.on_board() && board.get(to).is_empty() {
            moves.push(Move::quiet(from, to));
        }
    }
}

fn generate_king_quiet(board: &Board, from: Square, moves: &mut Vec<Move>) {
    for &(dx, dy) in &DIAGONALS {
        let mut sq = from.offset(dx, dy);
        while sq.on_board() && board.get(sq).is_empty() {
            moves.push(Move::quiet(from, sq));
            sq = sq.offset(dx, dy);
        }
    }
}

/// Side-level move generator whose output order is shuffled by a seeded RNG.
/// The order decides which of several equally scored moves the search keeps.
pub struct MoveGenerator {
    rng: StdRng,
}

impl MoveGenerator {
    pub fn new(seed: u64) -> Self {
        MoveGenerator { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Legal moves of `side` in shuffled order
    pub fn generate(&mut self, board: &Board, side: Side) -> MoveSet {
        let mut set = side_moves(board, side);
        set.moves.shuffle(&mut self.rng);
        set
    }
}
