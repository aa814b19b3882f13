//! OpusCheckers - Position Evaluation Module
//!
//! This module scores a position from one side's point of view as the ratio
//! of its weighted material to the opponent's. Optionally each man earns a
//! small bonus for every row it has advanced toward promotion.
//!
//! Scores are relative, not additive: 1.0 means material parity, larger is
//! better for the perspective side.

use crate::board::Board;
use crate::config::ScoringMode;
use crate::types::*;

// ============================================================================
// SCORE CONSTANTS
// ============================================================================

/// Score of a position whose opponent has no pieces left
pub const WIN_SCORE: f64 = 1e9;

/// Score of a position where the perspective side has no pieces left
pub const LOSS_SCORE: f64 = 0.0;

/// Bonus per row a man has advanced, in potential scoring
const POTENTIAL_PER_ROW: f64 = 0.05;

/// King weights relative to a man
const KING_WEIGHT: f64 = 4.0;
const KING_WEIGHT_POTENTIAL: f64 = 5.0;

impl ScoringMode {
    pub fn king_weight(self) -> f64 {
        match self {
            ScoringMode::MaterialOnly => KING_WEIGHT,
            ScoringMode::MaterialPlusPotential => KING_WEIGHT_POTENTIAL,
        }
    }

    pub fn counts_potential(self) -> bool {
        self == ScoringMode::MaterialPlusPotential
    }
}

// ============================================================================
// MATERIAL
// ============================================================================

/// Material of one side
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Material {
    pub men: u32,
    pub kings: u32,
    /// Advancement bonus of the men, zero in material-only scoring
    pub potential: f64,
}

impl Material {
    pub fn is_empty(&self) -> bool {
        self.men + self.kings == 0
    }

    pub fn weighted(&self, king_weight: f64) -> f64 {
        self.men as f64 + self.potential + self.kings as f64 * king_weight
    }
}

/// Rows a man of `side` standing on row `x` has advanced from its back rank
#[inline]
fn rows_advanced(side: Side, x: i8) -> f64 {
    match side {
        Side::A => (BOARD_SIZE - 1 - x) as f64,
        Side::B => x as f64,
    }
}

/// Count material for both sides, returned as (side A, side B)
pub fn count_material(board: &Board, mode: ScoringMode) -> (Material, Material) {
    let mut a = Material::default();
    let mut b = Material::default();

    for x in 0..BOARD_SIZE {
        for y in 0..BOARD_SIZE {
            let cell = board.get(Square::new(x, y));
            let side = match cell.side() {
                Some(side) => side,
                None => continue,
            };
            let material = match side {
                Side::A => &mut a,
                Side::B => &mut b,
            };

            if cell.is_king() {
                material.kings += 1;
            } else {
                material.men += 1;
                if mode.counts_potential() {
                    material.potential += POTENTIAL_PER_ROW * rows_advanced(side, x);
                }
            }
        }
    }

    (a, b)
}

// ============================================================================
// MAIN EVALUATION FUNCTION
// ============================================================================

/// Evaluate the position from `perspective`'s point of view
pub fn evaluate(board: &Board, perspective: Side, mode: ScoringMode) -> f64 {
    let (a, b) = count_material(board, mode);
    let (own, opponent) = match perspective {
        Side::A => (a, b),
        Side::B => (b, a),
    };

    if opponent.is_empty() {
        return WIN_SCORE;
    }
    if own.is_empty() {
        return LOSS_SCORE;
    }

    let king_weight = mode.king_weight();
    own.weighted(king_weight) / opponent.weighted(king_weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::STARTING_LAYOUT;

    fn board(layout: &str) -> Board {
        Board::from_layout(layout).unwrap()
    }

    #[test]
    fn test_starting_position_is_balanced() {
        let start = board(STARTING_LAYOUT);
        for mode in [ScoringMode::MaterialOnly, ScoringMode::MaterialPlusPotential] {
            assert!((evaluate(&start, Side::A, mode) - 1.0).abs() < 1e-9);
            assert!((evaluate(&start, Side::B, mode) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_won_and_lost_sentinels() {
        let only_a = board("......../......../......../......../...a..../......../......../........");
        assert_eq!(evaluate(&only_a, Side::A, ScoringMode::MaterialOnly), WIN_SCORE);
        assert_eq!(evaluate(&only_a, Side::B, ScoringMode::MaterialOnly), LOSS_SCORE);
    }

    #[test]
    fn test_kings_are_weighted() {
        // one king of A against two men of B
        let pos = board(".b.b..../......../......../......../......../......../......../A.......");
        assert!((evaluate(&pos, Side::A, ScoringMode::MaterialOnly) - 2.0).abs() < 1e-9);
        assert!((evaluate(&pos, Side::B, ScoringMode::MaterialOnly) - 0.5).abs() < 1e-9);

        // potential scoring weighs the king 5; B's men on row 0 earn no bonus
        assert!((evaluate(&pos, Side::A, ScoringMode::MaterialPlusPotential) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_swapping_perspective_inverts_ratio() {
        let pos = board("......../..b.b.../......../...a..../......../.B....../......../a.a.....");
        for mode in [ScoringMode::MaterialOnly, ScoringMode::MaterialPlusPotential] {
            let a = evaluate(&pos, Side::A, mode);
            let b = evaluate(&pos, Side::B, mode);
            assert!((a * b - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_advanced_men_score_higher_with_potential() {
        let back = board("......../......../......../......../......../......../......b./.a......");
        let front = board("......../.a....../......../......../......../......../......b./........");
        let mode = ScoringMode::MaterialPlusPotential;
        assert!(evaluate(&front, Side::A, mode) > evaluate(&back, Side::A, mode));
        assert_eq!(
            evaluate(&front, Side::A, ScoringMode::MaterialOnly),
            evaluate(&back, Side::A, ScoringMode::MaterialOnly)
        );
    }
}
