//! OpusCheckers - Search Engine Module
//!
//! This module chooses the best complete turn for a side using:
//! - Depth-bounded minimax with alpha-beta pruning
//! - Capture-chain extension (chain captures do not consume a ply)
//! - Pseudo alpha across the candidate turns: the best score found so far
//!   is passed to every later candidate as its lower bound
//!
//! Scores come from the evaluator and are always taken from the point of
//! view of the side whose turn is being chosen. Even plies (that side's
//! opponent to move) are minimizing layers, odd plies maximizing layers.
//!
//! A single recursive function serves the three phases of a search, selected
//! by `Mode`. Every frame returns its own best line, so the chosen turn is
//! assembled on the way back up the recursion.

use crate::board::{Board, Move};
use crate::config::SearchConfig;
use crate::evaluation::{evaluate, LOSS_SCORE, WIN_SCORE};
use crate::line::Line;
use crate::move_generator::{piece_moves, MoveGenerator, MoveSet};
use crate::types::{Side, Square};
use log::debug;

/// Lower end of the score range, below every evaluation
pub const SCORE_FLOOR: f64 = -1.0;

/// Upper end of the score range, above every evaluation
pub const SCORE_CEILING: f64 = WIN_SCORE + 1.0;

/// Longest capture chain followed before the turn is handed over
pub const MAX_CHAIN_LINKS: u8 = 12;

/// A capture chain in progress
#[derive(Clone, Copy, Debug, PartialEq)]
struct Continuation {
    piece: Square,
    links: u8,
}

impl Continuation {
    fn start(piece: Square) -> Self {
        Continuation { piece, links: 1 }
    }

    fn extend(self, piece: Square) -> Self {
        Continuation { piece, links: self.links + 1 }
    }

    fn exhausted(&self) -> bool {
        self.links >= MAX_CHAIN_LINKS
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Mode {
    /// First move of the turn being chosen
    Turn,
    /// Further captures of the turn being chosen
    Chain(Continuation),
    /// Minimax below the chosen turn
    Search { ply: u32, chain: Option<Continuation> },
}

impl Mode {
    fn chain(self) -> Option<Continuation> {
        match self {
            Mode::Turn => None,
            Mode::Chain(c) => Some(c),
            Mode::Search { chain, .. } => chain,
        }
    }

    /// Mode once the side to move has finished its turn
    fn next_turn(self) -> Mode {
        match self {
            Mode::Turn | Mode::Chain(_) => Mode::Search { ply: 0, chain: None },
            Mode::Search { ply, .. } => Mode::Search { ply: ply + 1, chain: None },
        }
    }

    /// Mode after `mv`. A capture keeps the same side on the move and
    /// continues the chain with the capturing piece.
    fn after(self, mv: &Move, capture: bool) -> Mode {
        if !capture {
            return self.next_turn();
        }
        let link = match self.chain() {
            Some(c) => c.extend(mv.to),
            None => Continuation::start(mv.to),
        };
        match self {
            Mode::Turn | Mode::Chain(_) => Mode::Chain(link),
            Mode::Search { ply, .. } => Mode::Search { ply, chain: Some(link) },
        }
    }

    /// Score when the side to move has no legal move
    fn no_move_score(self) -> f64 {
        match self {
            Mode::Turn | Mode::Chain(_) => LOSS_SCORE,
            Mode::Search { ply, .. } if ply % 2 == 1 => LOSS_SCORE,
            Mode::Search { .. } => WIN_SCORE,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Window {
    alpha: f64,
    beta: f64,
}

impl Window {
    fn above(alpha: f64) -> Self {
        Window { alpha, beta: SCORE_CEILING }
    }
}

struct Outcome {
    score: f64,
    line: Line,
}

impl Outcome {
    fn scored(score: f64) -> Self {
        Outcome { score, line: Line::new() }
    }
}

// ============================================================================
// SEARCH ENGINE
// ============================================================================

pub struct SearchEngine {
    config: SearchConfig,
    generator: MoveGenerator,
    pub nodes_searched: u64,
    last_line: Option<Line>,
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        SearchEngine {
            config,
            generator: MoveGenerator::new(config.seed.seed()),
            nodes_searched: 0,
            last_line: None,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SearchConfig) {
        self.config = config;
        self.generator.reseed(config.seed.seed());
    }

    /// Line returned by the latest search; `None` before the first search,
    /// an empty line when the side had no legal move
    pub fn last_line(&self) -> Option<&Line> {
        self.last_line.as_ref()
    }

    /// Find the best complete turn for `side`. The line is empty when the
    /// side has no legal move.
    pub fn find_best_turn(&mut self, board: &Board, side: Side) -> Line {
        if self.config.seed.is_fixed() {
            self.generator.reseed(self.config.seed.seed());
        }
        self.nodes_searched = 0;

        let outcome = self.explore(board, side, Mode::Turn, Window::above(SCORE_FLOOR));

        debug!(
            "side {} depth {} nodes {} score {:.4} line {}",
            side, self.config.max_depth, self.nodes_searched, outcome.score, outcome.line
        );

        self.last_line = Some(outcome.line.clone());
        outcome.line
    }

    fn explore(&mut self, board: &Board, side: Side, mode: Mode, window: Window) -> Outcome {
        self.nodes_searched += 1;

        if let Mode::Search { ply, .. } = mode {
            if ply >= self.config.max_depth {
                return Outcome::scored(self.evaluate_leaf(board, side, ply));
            }
        }

        let chain = mode.chain();
        let moves = match chain {
            Some(c) if !c.exhausted() => piece_moves(board, c.piece),
            Some(_) => MoveSet::default(),
            None => self.generator.generate(board, side),
        };

        // the chain is over: opponent's turn
        if chain.is_some() && !moves.captures {
            let score = self.explore(board, side.opponent(), mode.next_turn(), window).score;
            return Outcome::scored(score);
        }

        if moves.is_empty() {
            return Outcome::scored(mode.no_move_score());
        }

        match mode {
            Mode::Turn | Mode::Chain(_) => self.choose_turn(board, side, mode, moves),
            Mode::Search { ply, .. } => {
                Outcome::scored(self.minimax(board, side, mode, ply, moves, window))
            }
        }
    }

    /// Pick the best move of the turn being chosen. Each candidate is
    /// searched with the best score so far as its lower bound.
    fn choose_turn(&mut self, board: &Board, side: Side, mode: Mode, moves: MoveSet) -> Outcome {
        let mut best = Outcome::scored(SCORE_FLOOR);

        for mv in &moves.moves {
            let next = board.apply(mv);
            let child_mode = mode.after(mv, moves.captures);
            let mover = if moves.captures { side } else { side.opponent() };

            let child = self.explore(&next, mover, child_mode, Window::above(best.score));
            if best.line.is_empty() || child.score > best.score {
                best.score = child.score;
                best.line = child.line.prepend(*mv);
            }
        }

        best
    }

    fn minimax(
        &mut self,
        board: &Board,
        side: Side,
        mode: Mode,
        ply: u32,
        moves: MoveSet,
        mut window: Window,
    ) -> f64 {
        let maximizing = ply % 2 == 1;
        let mut best_min = SCORE_CEILING;
        let mut best_max = SCORE_FLOOR;

        for mv in &moves.moves {
            let next = board.apply(mv);
            let child_mode = mode.after(mv, moves.captures);
            let mover = if moves.captures { side } else { side.opponent() };

            let value = self.explore(&next, mover, child_mode, window).score;

            best_min = best_min.min(value);
            best_max = best_max.max(value);

            if maximizing {
                window.alpha = window.alpha.max(value);
            } else {
                window.beta = window.beta.min(value);
            }

            // cut-offs return a bound nudged past the window
            if self.config.pruning.is_enabled() && window.alpha >= window.beta {
                return if maximizing { best_max + 1.0 } else { best_min - 1.0 };
            }
        }

        if maximizing {
            best_max
        } else {
            best_min
        }
    }

    /// Static score at the depth limit, seen by the side whose turn is
    /// being chosen: the side to move on odd plies, its opponent on even ones
    fn evaluate_leaf(&self, board: &Board, side: Side, ply: u32) -> f64 {
        let perspective = if ply % 2 == 0 { side.opponent() } else { side };
        evaluate(board, perspective, self.config.scoring)
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        SearchEngine::new(SearchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::STARTING_LAYOUT;
    use crate::config::{PruningMode, ScoringMode, SeedPolicy};
    use crate::move_generator::{legal_turns, side_moves};
    use crate::types::Cell;

    fn engine(depth: u32, pruning: PruningMode) -> SearchEngine {
        let config = SearchConfig::new(depth)
            .unwrap()
            .with_pruning(pruning)
            .with_seed(SeedPolicy::Fixed);
        SearchEngine::new(config)
    }

    fn board(layout: &str) -> Board {
        Board::from_layout(layout).unwrap()
    }

    fn captured(line: &Line) -> Vec<Option<Square>> {
        line.iter().map(|m| m.captured).collect()
    }

    #[test]
    fn test_opening_turn_is_a_quiet_move() {
        let start = board(STARTING_LAYOUT);
        let mut engine = engine(4, PruningMode::Enabled);
        let line = engine.find_best_turn(&start, Side::A);

        assert_eq!(line.len(), 1);
        let mv = line.moves()[0];
        assert!(!mv.is_capture());
        assert_eq!(start.get(mv.from), Cell::ManA);
        assert_eq!(start.get(mv.to), Cell::Empty);
        assert!(side_moves(&start, Side::A).contains(&mv));
    }

    #[test]
    fn test_only_capture_is_chosen_at_depth_one() {
        // A can only take b at d4; B keeps a spare man far away
        let pos = board("b......./......../......../....b.../...a..../......../......../........");
        let mut engine = engine(1, PruningMode::Enabled);
        let line = engine.find_best_turn(&pos, Side::A);

        assert_eq!(line.len(), 1);
        let mv = line.moves()[0];
        assert_eq!(mv.from, Square::new(4, 3));
        assert_eq!(mv.to, Square::new(2, 5));
        assert_eq!(mv.captured, Some(Square::new(3, 4)));
    }

    #[test]
    fn test_capture_chain_is_returned_whole() {
        let pos = board(".......b/......../...b..../......../.b....../a......./......../........");
        let mut engine = engine(2, PruningMode::Enabled);
        let line = engine.find_best_turn(&pos, Side::A);

        assert_eq!(line.notation(), "a3xc5 c5xe7");
        assert_eq!(captured(&line), vec![Some(Square::new(4, 1)), Some(Square::new(2, 3))]);
        assert!(legal_turns(&pos, Side::A).iter().any(|(turn, _)| *turn == line));
    }

    #[test]
    fn test_best_turn_is_one_of_the_legal_turns() {
        // the man on a3 and the king on f2 both have captures
        let pos = board(
            "b......./......../......../......../.b....../a...b.../.....A../........",
        );
        let mut engine = engine(1, PruningMode::Enabled);
        let line = engine.find_best_turn(&pos, Side::A);
        let turns = legal_turns(&pos, Side::A);
        assert!(turns.iter().any(|(turn, _)| *turn == line));
    }

    #[test]
    fn test_no_legal_move_gives_empty_line() {
        // side A's only man is blocked by B's man on b8
        let pos = board(".b....../a......./......../......../......../......../......../........");
        let mut engine = engine(3, PruningMode::Enabled);
        assert!(engine.last_line().is_none());

        let line = engine.find_best_turn(&pos, Side::A);
        assert!(line.is_empty());
        assert_eq!(engine.last_line(), Some(&Line::new()));
    }

    #[test]
    fn test_fixed_seed_searches_are_identical() {
        let start = board(STARTING_LAYOUT);
        let mut first = engine(4, PruningMode::Enabled);
        let mut second = engine(4, PruningMode::Enabled);

        let a = first.find_best_turn(&start, Side::B);
        let b = second.find_best_turn(&start, Side::B);
        let again = first.find_best_turn(&start, Side::B);

        assert_eq!(a.notation(), b.notation());
        assert_eq!(captured(&a), captured(&b));
        assert_eq!(a.notation(), again.notation());
    }

    #[test]
    fn test_pruning_does_not_change_the_chosen_line() {
        let positions = [
            STARTING_LAYOUT,
            ".b.b.b.b/b.b.b.b./...b.b.b/..b...../...a..../a...a.a./.a.a.a.a/a.a.a.a.",
            "......../..b.b.../......../..a...b./......../..A...../.b....../a.......",
        ];
        for layout in positions {
            let pos = board(layout);
            for side in [Side::A, Side::B] {
                for depth in 1..=4 {
                    let pruned = engine(depth, PruningMode::Enabled).find_best_turn(&pos, side);
                    let full = engine(depth, PruningMode::Disabled).find_best_turn(&pos, side);
                    assert_eq!(pruned.notation(), full.notation(), "{} {} {}", layout, side, depth);
                }
            }
        }
    }

    #[test]
    fn test_pruning_visits_fewer_nodes() {
        let start = board(STARTING_LAYOUT);
        let mut pruned = engine(5, PruningMode::Enabled);
        let mut full = engine(5, PruningMode::Disabled);
        pruned.find_best_turn(&start, Side::A);
        full.find_best_turn(&start, Side::A);
        assert!(pruned.nodes_searched < full.nodes_searched);
    }

    #[test]
    fn test_forced_capture_under_both_scoring_modes() {
        // capturing is forced; both scoring modes must respect it
        let pos = board("b......./......../......../..b...../.a....../......../......../........");
        for scoring in [ScoringMode::MaterialOnly, ScoringMode::MaterialPlusPotential] {
            let config = SearchConfig::new(3)
                .unwrap()
                .with_scoring(scoring)
                .with_seed(SeedPolicy::Fixed);
            let line = SearchEngine::new(config).find_best_turn(&pos, Side::A);
            assert!(line.first().map_or(false, |m| m.is_capture()));
        }
    }

    #[test]
    fn test_avoids_hanging_a_man() {
        // d4-c5 walks into the man on b6; d4-e5 is safe
        let pos = board("......../......../.b....../......../...a..../......../......../b.......");
        for depth in 1..=4 {
            for pruning in [PruningMode::Enabled, PruningMode::Disabled] {
                let line = engine(depth, pruning).find_best_turn(&pos, Side::A);
                assert_eq!(line.notation(), "d4-e5", "depth {}", depth);
            }
        }
    }

    #[test]
    fn test_prefers_the_longer_capture_chain() {
        // a3 can take two men, e3 only one
        let pos = board(".......b/......../...b..../......../.b...b../a...a.../...a..../........");
        let turns = legal_turns(&pos, Side::A);
        assert_eq!(turns.len(), 2);

        let line = engine(1, PruningMode::Enabled).find_best_turn(&pos, Side::A);
        assert_eq!(line.notation(), "a3xc5 c5xe7");
    }

    #[test]
    fn test_opponent_reply_chain_is_scored_whole() {
        // b6 must jump c5 and then e3
        let pos = board(".......b/......../.b....../..a...../......../....a.../......../a.......");
        let turns = legal_turns(&pos, Side::B);
        assert_eq!(turns.len(), 1);
        let (reply, after) = &turns[0];
        assert_eq!(reply.notation(), "b6xd4 d4xf2");

        let mut engine = engine(1, PruningMode::Enabled);
        let mode = Mode::Search { ply: 0, chain: None };
        let outcome = engine.explore(&pos, Side::B, mode, Window::above(SCORE_FLOOR));

        let expected = evaluate(after, Side::A, ScoringMode::MaterialPlusPotential);
        assert!((outcome.score - expected).abs() < 1e-9);
        assert!(outcome.score < 1.0);
    }

    #[test]
    fn test_chain_continues_as_king_after_promotion() {
        // b6xd8 crowns the man, which then flies over f6
        let pos = board("......../..b...../.a...b../......../......../b......./......../........");
        let line = engine(1, PruningMode::Enabled).find_best_turn(&pos, Side::A);

        assert_eq!(line.len(), 2);
        let moves = line.moves();
        assert_eq!(moves[0].notation(), "b6xd8");
        assert_eq!(moves[1].from, Square::new(0, 3));
        assert_eq!(moves[1].captured, Some(Square::new(2, 5)));
    }

    #[test]
    fn test_exhausted_chain_hands_over_the_turn() {
        // a3 could still jump b4, but the chain has reached its cap
        let pos = board(".......b/......../......../......../.b....../a......./......../..a.....");
        let piece = Square::new(5, 0);
        let capped = Continuation { piece, links: MAX_CHAIN_LINKS };
        assert!(capped.exhausted());
        assert!(!Continuation::start(piece).exhausted());

        let mut engine = engine(1, PruningMode::Enabled);
        let window = Window::above(SCORE_FLOOR);
        let stopped = engine
            .explore(&pos, Side::A, Mode::Search { ply: 0, chain: Some(capped) }, window)
            .score;
        let fresh = Mode::Search { ply: 0, chain: Some(Continuation::start(piece)) };
        let continued = engine.explore(&pos, Side::A, fresh, window).score;

        // B to move on the unchanged board, scored for B
        let expected = evaluate(&pos, Side::B, ScoringMode::MaterialPlusPotential);
        assert!((stopped - expected).abs() < 1e-9);
        assert!(continued < stopped);
    }

    #[test]
    fn test_mode_transitions() {
        let mv = Move::capture(Square::new(5, 0), Square::new(3, 2), Square::new(4, 1));
        assert_eq!(
            Mode::Turn.after(&mv, true),
            Mode::Chain(Continuation { piece: Square::new(3, 2), links: 1 })
        );
        assert_eq!(Mode::Turn.after(&mv, false), Mode::Search { ply: 0, chain: None });
        assert_eq!(
            Mode::Search { ply: 2, chain: None }.after(&mv, true),
            Mode::Search { ply: 2, chain: Some(Continuation::start(Square::new(3, 2))) }
        );
        assert_eq!(
            Mode::Search { ply: 2, chain: Some(Continuation::start(Square::new(5, 0))) }.next_turn(),
            Mode::Search { ply: 3, chain: None }
        );
        assert_eq!(Mode::Search { ply: 1, chain: None }.no_move_score(), LOSS_SCORE);
        assert_eq!(Mode::Search { ply: 0, chain: None }.no_move_score(), WIN_SCORE);
    }
}
