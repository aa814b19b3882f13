//! OpusCheckers - Turn lines
//!
//! A `Line` is everything one side commits to in a single turn: one move, or
//! an uninterrupted chain of captures by the same piece. Search frames build
//! lines bottom-up, each frame prepending the move it chose to the line its
//! best continuation returned.

use crate::board::Move;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Line {
    moves: Vec<Move>,
}

impl Line {
    pub fn new() -> Self {
        Line { moves: Vec::new() }
    }

    pub fn single(mv: Move) -> Self {
        Line { moves: vec![mv] }
    }

    /// Put `mv` in front of this line
    pub fn prepend(mut self, mv: Move) -> Self {
        self.moves.insert(0, mv);
        self
    }

    pub fn push(&mut self, mv: Move) {
        self.moves.push(mv);
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn into_moves(self) -> Vec<Move> {
        self.moves
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn first(&self) -> Option<&Move> {
        self.moves.first()
    }

    pub fn last(&self) -> Option<&Move> {
        self.moves.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.moves.iter()
    }

    /// True for a multi-capture turn
    pub fn is_chain(&self) -> bool {
        self.moves.len() > 1
    }

    /// Space separated move notation, "none" for an empty line
    pub fn notation(&self) -> String {
        if self.moves.is_empty() {
            return "none".to_string();
        }
        self.moves
            .iter()
            .map(|m| m.notation())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<'a> IntoIterator for &'a Line {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}

impl From<Vec<Move>> for Line {
    fn from(moves: Vec<Move>) -> Self {
        Line { moves }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.notation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    #[test]
    fn test_prepend_builds_chain_in_order() {
        let first = Move::capture(Square::new(5, 0), Square::new(3, 2), Square::new(4, 1));
        let second = Move::capture(Square::new(3, 2), Square::new(1, 4), Square::new(2, 3));

        let line = Line::single(second).prepend(first);
        assert_eq!(line.moves(), &[first, second]);
        assert!(line.is_chain());
        assert_eq!(line.notation(), "a3xc5 c5xe7");
    }

    #[test]
    fn test_empty_line_notation() {
        assert_eq!(Line::new().notation(), "none");
        assert!(Line::new().is_empty());
    }
}
