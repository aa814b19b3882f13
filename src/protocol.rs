//! OpusCheckers - Text Protocol Module
//!
//! This module implements a line-oriented command protocol in the spirit of
//! UCI, so the engine can be driven by a GUI or a script over stdin/stdout.
//!
//! Commands:
//!   hello                                   identify, list options, "ok"
//!   isready                                 "readyok"
//!   setoption name <name> value <value>
//!   newgame
//!   position startpos|<layout> [side a|b] [moves <move>...]
//!   play <move>                             apply a move to the current position
//!   moves [square]                          legal moves of the side, optionally of one piece
//!   piecemoves <square>                     moves of one piece, ignoring the other pieces
//!   go [depth <n>]                          "bestline <moves>" or "bestline none"
//!   d                                       display the board
//!   perft <n>                               count complete turns
//!   quit

use std::io::{self, BufRead, Stdout, Write};

use log::{info, warn};

use crate::board::{Board, Move};
use crate::config::{PruningMode, ScoringMode, SearchConfig, SeedPolicy};
use crate::error::EngineError;
use crate::move_generator::{legal_turns, piece_moves, side_moves, MoveSet};
use crate::search::SearchEngine;
use crate::types::*;

// Engine identification
const ENGINE_NAME: &str = "OpusCheckers";
const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Deepest search accepted from the protocol
const MAX_PROTOCOL_DEPTH: i32 = 16;

/// Value domain of a protocol option
#[derive(Clone, Debug, PartialEq)]
pub enum OptionKind {
    Spin { min: i32, max: i32 },
    Check,
    Combo(Vec<&'static str>),
}

/// Protocol option representation
#[derive(Clone, Debug)]
pub struct EngineOption {
    pub name: &'static str,
    pub kind: OptionKind,
    pub default: String,
    pub value: String,
}

impl EngineOption {
    pub fn spin(name: &'static str, default: i32, min: i32, max: i32) -> Self {
        EngineOption::with_kind(name, OptionKind::Spin { min, max }, default.to_string())
    }

    pub fn check(name: &'static str, default: bool) -> Self {
        EngineOption::with_kind(name, OptionKind::Check, default.to_string())
    }

    pub fn combo(name: &'static str, default: &str, choices: &[&'static str]) -> Self {
        EngineOption::with_kind(name, OptionKind::Combo(choices.to_vec()), default.to_string())
    }

    fn with_kind(name: &'static str, kind: OptionKind, default: String) -> Self {
        EngineOption { name, kind, value: default.clone(), default }
    }

    pub fn to_protocol_string(&self) -> String {
        match &self.kind {
            OptionKind::Spin { min, max } => format!(
                "option name {} type spin default {} min {} max {}",
                self.name, self.default, min, max
            ),
            OptionKind::Check => {
                format!("option name {} type check default {}", self.name, self.default)
            }
            OptionKind::Combo(choices) => {
                let vars: String = choices.iter().map(|c| format!(" var {}", c)).collect();
                format!("option name {} type combo default {}{}", self.name, self.default, vars)
            }
        }
    }

    /// Store `value` if it lies in the option's domain
    pub fn set_value(&mut self, value: &str) -> Result<(), EngineError> {
        let accepted = match &self.kind {
            OptionKind::Spin { min, max } => value
                .parse::<i32>()
                .ok()
                .filter(|v| (*min..=*max).contains(v))
                .map(|v| v.to_string()),
            OptionKind::Check => match value.to_lowercase().as_str() {
                "true" | "false" => Some(value.to_lowercase()),
                _ => None,
            },
            OptionKind::Combo(choices) => {
                choices.iter().find(|c| **c == value).map(|c| c.to_string())
            }
        };

        match accepted {
            Some(v) => {
                self.value = v;
                Ok(())
            }
            None => Err(EngineError::InvalidOption {
                key: self.name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn get_int(&self) -> i32 {
        self.value.parse().unwrap_or(0)
    }

    pub fn get_bool(&self) -> bool {
        self.value == "true"
    }
}

// ============================================================================
// GAME STATE
// ============================================================================

/// Position of the session, including a capture chain in progress
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GameState {
    pub board: Board,
    pub side_to_move: Side,
    /// Piece that must continue capturing before the turn passes
    pub chain_piece: Option<Square>,
}

impl GameState {
    pub fn new(board: Board, side_to_move: Side) -> Self {
        GameState { board, side_to_move, chain_piece: None }
    }

    /// Legal moves at this point of the turn: the capturing piece's captures
    /// mid-chain, otherwise every legal move of the side to move
    pub fn current_moves(&self) -> MoveSet {
        match self.chain_piece {
            Some(piece) => piece_moves(&self.board, piece),
            None => side_moves(&self.board, self.side_to_move),
        }
    }

    /// Apply a confirmed move. After a capture the same side keeps moving
    /// while the capturing piece can capture again.
    pub fn play(&mut self, notation: &str) -> Result<Move, EngineError> {
        let (from, to) = Move::parse_squares(notation)?;
        let mv = self
            .current_moves()
            .find(from, to)
            .ok_or_else(|| EngineError::IllegalMove(notation.to_string()))?;

        self.board = self.board.apply(&mv);
        if mv.is_capture() && piece_moves(&self.board, mv.to).captures {
            self.chain_piece = Some(mv.to);
        } else {
            self.chain_piece = None;
            self.side_to_move = self.side_to_move.opponent();
        }
        Ok(mv)
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new(Board::new(), Side::A)
    }
}

fn format_moves(label: &str, set: &MoveSet) -> String {
    let list: Vec<String> = set.iter().map(|m| m.notation()).collect();
    format!(
        "{} {} captures {}",
        label,
        if list.is_empty() { "none".to_string() } else { list.join(" ") },
        set.captures
    )
}

// ============================================================================
// PROTOCOL
// ============================================================================

/// Protocol handler
pub struct Protocol<W: Write> {
    state: GameState,
    search_engine: SearchEngine,
    running: bool,
    debug_mode: bool,
    options: Vec<EngineOption>,
    out: W,
}

impl Protocol<Stdout> {
    pub fn new(config: SearchConfig) -> Self {
        Protocol::with_output(config, io::stdout())
    }
}

impl<W: Write> Protocol<W> {
    pub fn with_output(config: SearchConfig, out: W) -> Self {
        let mut protocol = Protocol {
            state: GameState::default(),
            search_engine: SearchEngine::new(config),
            running: true,
            debug_mode: false,
            options: Vec::new(),
            out,
        };

        protocol.init_options(&config);
        protocol
    }

    fn init_options(&mut self, config: &SearchConfig) {
        let scoring = match config.scoring {
            ScoringMode::MaterialOnly => "Number",
            ScoringMode::MaterialPlusPotential => "NumberAndPotential",
        };
        self.options = vec![
            EngineOption::spin("Depth", config.max_depth as i32, 1, MAX_PROTOCOL_DEPTH),
            EngineOption::combo("Scoring", scoring, &["Number", "NumberAndPotential"]),
            EngineOption::check("Pruning", config.pruning.is_enabled()),
            EngineOption::check("NoRandom", config.seed.is_fixed()),
        ];
    }

    /// Rebuild the search configuration from the option values
    fn apply_options(&mut self) -> Result<(), EngineError> {
        let mut config = *self.search_engine.config();
        for opt in &self.options {
            match opt.name {
                "Depth" => {
                    let depth = opt.get_int();
                    let depth = u32::try_from(depth)
                        .map_err(|_| EngineError::InvalidDepth(i64::from(depth)))?;
                    config = config.with_max_depth(depth)?;
                }
                "Scoring" => {
                    config.scoring = if opt.value == "Number" {
                        ScoringMode::MaterialOnly
                    } else {
                        ScoringMode::MaterialPlusPotential
                    };
                }
                "Pruning" => {
                    config.pruning = if opt.get_bool() {
                        PruningMode::Enabled
                    } else {
                        PruningMode::Disabled
                    };
                }
                "NoRandom" => {
                    config.seed = if opt.get_bool() {
                        SeedPolicy::Fixed
                    } else {
                        SeedPolicy::TimeDerived
                    };
                }
                _ => {}
            }
        }
        if config != *self.search_engine.config() {
            info!("search configuration changed to {:?}", config);
            self.search_engine.set_config(config);
        }
        Ok(())
    }

    pub fn run(&mut self) {
        let stdin = io::stdin();

        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        self.process_command(line);
                    }
                    if !self.running {
                        break;
                    }
                }
                Err(e) => {
                    warn!("failed to read command: {}", e);
                    break;
                }
            }
        }
    }

    pub fn process_command(&mut self, line: &str) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            return;
        };

        let result = match command {
            "hello" => self.cmd_hello(),
            "isready" => self.cmd_isready(),
            "setoption" => self.cmd_setoption(args),
            "newgame" => self.cmd_newgame(),
            "position" => self.cmd_position(args),
            "play" => self.cmd_play(args),
            "moves" => self.cmd_moves(args),
            "piecemoves" => self.cmd_piece_moves(args),
            "go" => self.cmd_go(args),
            "quit" => self.cmd_quit(),
            "debug" => self.cmd_debug(args),
            "d" => self.cmd_display(),
            "perft" => self.cmd_perft(args),
            _ => Err(EngineError::InvalidOption {
                key: "command".to_string(),
                value: command.to_string(),
            }),
        };

        if let Err(e) = result {
            warn!("{}: {}", line, e);
            if self.debug_mode {
                self.send(&format!("info string error: {}", e));
            }
        }
    }

    fn send(&mut self, message: &str) {
        writeln!(self.out, "{}", message).ok();
        self.out.flush().ok();
    }

    fn cmd_hello(&mut self) -> Result<(), EngineError> {
        self.send(&format!("id name {} {}", ENGINE_NAME, ENGINE_VERSION));

        let lines: Vec<String> = self.options.iter().map(|o| o.to_protocol_string()).collect();
        for line in lines {
            self.send(&line);
        }

        self.send("ok");
        Ok(())
    }

    fn cmd_isready(&mut self) -> Result<(), EngineError> {
        self.send("readyok");
        Ok(())
    }

    /// setoption name <name> value <value>
    fn cmd_setoption(&mut self, args: &[&str]) -> Result<(), EngineError> {
        let malformed = || EngineError::InvalidOption {
            key: "setoption".to_string(),
            value: args.join(" "),
        };
        let split = args.iter().position(|a| *a == "value").ok_or_else(malformed)?;
        if args.first() != Some(&"name") || split < 2 {
            return Err(malformed());
        }
        let name = args[1..split].join(" ");
        let value = args[split + 1..].join(" ");

        let opt = self
            .options
            .iter_mut()
            .find(|o| o.name == name)
            .ok_or_else(|| EngineError::InvalidOption { key: name.clone(), value: value.clone() })?;
        opt.set_value(&value)?;
        if self.debug_mode {
            let msg = format!("info string Option {} set to {}", opt.name, opt.value);
            self.send(&msg);
        }

        self.apply_options()
    }

    fn cmd_newgame(&mut self) -> Result<(), EngineError> {
        self.state = GameState::default();
        Ok(())
    }

    /// The new position is built and replayed aside; the session only
    /// changes when every token was accepted.
    fn cmd_position(&mut self, args: &[&str]) -> Result<(), EngineError> {
        let (&layout, rest) = args.split_first().ok_or_else(|| {
            EngineError::InvalidLayout("position needs startpos or a layout".to_string())
        })?;

        let board = if layout == "startpos" {
            Board::new()
        } else {
            Board::from_layout(layout)?
        };
        let mut state = GameState::new(board, Side::A);

        let mut i = 0;
        while i < rest.len() {
            match rest[i] {
                "side" if i + 1 < rest.len() => {
                    state.side_to_move = Side::parse(rest[i + 1])
                        .ok_or_else(|| EngineError::InvalidNotation(rest[i + 1].to_string()))?;
                    i += 2;
                }
                "moves" => {
                    for notation in &rest[i + 1..] {
                        state.play(notation)?;
                    }
                    break;
                }
                other => return Err(EngineError::InvalidNotation(other.to_string())),
            }
        }

        self.state = state;
        Ok(())
    }

    fn cmd_play(&mut self, args: &[&str]) -> Result<(), EngineError> {
        let mut state = self.state;
        for notation in args {
            state.play(notation)?;
        }
        self.state = state;
        Ok(())
    }

    /// Moves the side to move may play now, optionally restricted to the
    /// piece on one square. A piece that is free to move reports none while
    /// another piece has a forced capture.
    fn cmd_moves(&mut self, args: &[&str]) -> Result<(), EngineError> {
        let mut set = self.state.current_moves();
        if let Some(name) = args.first() {
            let sq = Square::parse(name)
                .ok_or_else(|| EngineError::InvalidNotation(name.to_string()))?;
            set.moves.retain(|m| m.from == sq);
        }

        let reply = format_moves("moves", &set);
        self.send(&reply);
        Ok(())
    }

    /// Moves of the piece on one square, ignoring captures of other pieces
    fn cmd_piece_moves(&mut self, args: &[&str]) -> Result<(), EngineError> {
        let name = args
            .first()
            .ok_or_else(|| EngineError::InvalidNotation("piecemoves needs a square".to_string()))?;
        let sq = Square::parse(name).ok_or_else(|| EngineError::InvalidNotation(name.to_string()))?;

        let reply = format_moves("piecemoves", &piece_moves(&self.state.board, sq));
        self.send(&reply);
        Ok(())
    }

    /// go [depth <n>]. The depth applies to this search only.
    fn cmd_go(&mut self, args: &[&str]) -> Result<(), EngineError> {
        if self.state.chain_piece.is_some() {
            return Err(EngineError::IllegalMove(
                "capture chain in progress; play the remaining captures first".to_string(),
            ));
        }

        let mut depth = None;
        let mut i = 0;
        while i < args.len() {
            match args[i] {
                "depth" if i + 1 < args.len() => {
                    let n = args[i + 1].parse::<i32>().map_err(|_| EngineError::InvalidOption {
                        key: "depth".to_string(),
                        value: args[i + 1].to_string(),
                    })?;
                    let n = n.min(MAX_PROTOCOL_DEPTH);
                    let n = u32::try_from(n).map_err(|_| EngineError::InvalidDepth(i64::from(n)))?;
                    depth = Some(n);
                    i += 2;
                }
                _ => {
                    i += 1;
                }
            }
        }

        let saved = *self.search_engine.config();
        if let Some(depth) = depth {
            self.search_engine.set_config(saved.with_max_depth(depth)?);
        }
        let line = self.search_engine.find_best_turn(&self.state.board, self.state.side_to_move);
        if depth.is_some() {
            self.search_engine.set_config(saved);
        }

        if self.debug_mode {
            let msg = format!("info string nodes {}", self.search_engine.nodes_searched);
            self.send(&msg);
        }
        self.send(&format!("bestline {}", line));
        Ok(())
    }

    fn cmd_quit(&mut self) -> Result<(), EngineError> {
        self.running = false;
        Ok(())
    }

    fn cmd_debug(&mut self, args: &[&str]) -> Result<(), EngineError> {
        if let Some(&mode) = args.first() {
            self.debug_mode = mode == "on";
        }
        Ok(())
    }

    fn cmd_display(&mut self) -> Result<(), EngineError> {
        let state = self.state;
        self.send(&state.board.display());
        self.send(&format!("Layout: {}", state.board.to_layout()));
        self.send(&format!("Side to move: {}", state.side_to_move));

        let set = state.current_moves();
        self.send(&format!("Legal moves: {}", set.len()));
        let moves_str: Vec<String> = set.iter().map(|m| m.notation()).collect();
        self.send(&format!("Moves: {}", moves_str.join(" ")));
        Ok(())
    }

    fn cmd_perft(&mut self, args: &[&str]) -> Result<(), EngineError> {
        let depth = args.first().and_then(|s| s.parse::<usize>().ok()).unwrap_or(1);

        let nodes = perft(&self.state.board, self.state.side_to_move, depth);
        self.send(&format!("Nodes: {}", nodes));
        Ok(())
    }
}

/// Number of complete-turn sequences of length `depth`
pub fn perft(board: &Board, side: Side, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let turns = legal_turns(board, side);
    if depth == 1 {
        return turns.len() as u64;
    }

    turns
        .iter()
        .map(|(_, next)| perft(next, side.opponent(), depth - 1))
        .sum()
}

impl Default for Protocol<Stdout> {
    fn default() -> Self {
        Protocol::new(SearchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol() -> Protocol<Vec<u8>> {
        let config = SearchConfig::new(3).unwrap().with_seed(SeedPolicy::Fixed);
        Protocol::with_output(config, Vec::new())
    }

    fn output(protocol: &Protocol<Vec<u8>>) -> String {
        String::from_utf8(protocol.out.clone()).unwrap()
    }

    #[test]
    fn test_hello_lists_options() {
        let mut p = protocol();
        p.process_command("hello");
        let out = output(&p);
        assert!(out.starts_with("id name OpusCheckers"));
        assert!(out.contains("option name Depth type spin default 3 min 1 max 16"));
        assert!(out.contains("option name Scoring type combo default NumberAndPotential"));
        assert!(out.trim_end().ends_with("ok"));
    }

    #[test]
    fn test_go_from_start_returns_a_quiet_move() {
        let mut p = protocol();
        p.process_command("position startpos");
        p.process_command("go");
        let out = output(&p);
        let line = out.lines().last().unwrap();
        assert!(line.starts_with("bestline "));
        let mv = line.trim_start_matches("bestline ");
        assert_eq!(mv.len(), 5);
        assert!(mv.contains('-'));
    }

    #[test]
    fn test_position_with_moves_tracks_side_and_chain() {
        let mut p = protocol();
        p.process_command(
            "position .......b/......../...b..../......../.b....../a......./......../........ moves a3xc5",
        );
        assert_eq!(p.state.chain_piece, Some(Square::new(3, 2)));
        assert_eq!(p.state.side_to_move, Side::A);

        p.process_command("moves");
        assert!(output(&p).contains("moves c5xe7 captures true"));

        p.process_command("play c5xe7");
        assert_eq!(p.state.chain_piece, None);
        assert_eq!(p.state.side_to_move, Side::B);
    }

    #[test]
    fn test_illegal_move_is_rejected() {
        let mut state = GameState::default();
        assert!(state.play("c3-d4").is_ok());
        assert_eq!(state.side_to_move, Side::B);
        assert!(matches!(state.play("c3-d4"), Err(EngineError::IllegalMove(_))));
        assert!(matches!(state.play("zz"), Err(EngineError::InvalidNotation(_))));
    }

    #[test]
    fn test_rejected_position_keeps_the_session() {
        let mut p = protocol();
        p.process_command("position startpos side b");
        let before = p.state;
        assert_eq!(before.side_to_move, Side::B);

        // the first move is legal, the second token is not a move
        p.process_command("position startpos moves c3-d4 zz");
        assert_eq!(p.state, before);

        p.process_command("position startpos moves c3-c4");
        assert_eq!(p.state, before);

        p.process_command("position ......../bad side a");
        assert_eq!(p.state, before);

        p.process_command("position startpos side c");
        assert_eq!(p.state, before);
    }

    #[test]
    fn test_rejected_play_keeps_the_session() {
        let mut p = protocol();
        p.process_command("play c3-d4 c3-b4");
        assert_eq!(p.state, GameState::default());

        p.process_command("play c3-d4 f6-e5");
        assert_eq!(p.state.side_to_move, Side::A);
        assert_ne!(p.state.board, Board::new());
    }

    #[test]
    fn test_moves_for_one_piece() {
        let mut p = protocol();
        p.process_command("moves c3");
        assert!(output(&p).contains("moves c3-b4 c3-d4 captures false"));
    }

    #[test]
    fn test_piece_moves_ignore_captures_elsewhere() {
        let mut p = protocol();
        p.process_command(
            "position .......b/......../......../......../.b....../a.....a./......../........",
        );

        // a3 must capture, so g3 may not move this turn
        p.process_command("moves g3");
        assert!(output(&p).contains("moves none captures true"));

        p.process_command("piecemoves g3");
        assert!(output(&p).contains("piecemoves g3-f4 g3-h4 captures false"));

        p.process_command("piecemoves a3");
        assert!(output(&p).contains("piecemoves a3xc5 captures true"));
    }

    #[test]
    fn test_go_depth_applies_to_one_search() {
        let mut p = protocol();
        p.process_command("go depth 1");
        assert!(output(&p).contains("bestline "));
        assert_eq!(p.search_engine.config().max_depth, 3);
        assert_eq!(p.options[0].value, "3");

        p.process_command("go depth 0");
        assert_eq!(p.search_engine.config().max_depth, 3);
    }

    #[test]
    fn test_setoption_updates_search_config() {
        let mut p = protocol();
        p.process_command("setoption name Depth value 5");
        p.process_command("setoption name Pruning value false");
        p.process_command("setoption name Scoring value Number");
        let config = *p.search_engine.config();
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.pruning, PruningMode::Disabled);
        assert_eq!(config.scoring, ScoringMode::MaterialOnly);

        p.process_command("setoption name Depth value 0");
        assert_eq!(p.search_engine.config().max_depth, 5);
        p.process_command("setoption name Pruning value maybe");
        assert_eq!(p.search_engine.config().pruning, PruningMode::Disabled);
        p.process_command("setoption name Depth");
        assert_eq!(p.search_engine.config().max_depth, 5);
    }

    #[test]
    fn test_option_domains() {
        let mut depth = EngineOption::spin("Depth", 4, 1, MAX_PROTOCOL_DEPTH);
        assert!(depth.set_value("12").is_ok());
        assert_eq!(depth.get_int(), 12);
        assert!(depth.set_value("17").is_err());
        assert_eq!(depth.get_int(), 12);

        let mut scoring = EngineOption::combo("Scoring", "Number", &["Number", "NumberAndPotential"]);
        assert!(scoring.set_value("NumberAndPotential").is_ok());
        assert!(scoring.set_value("Fancy").is_err());
        assert_eq!(scoring.value, "NumberAndPotential");
        assert_eq!(
            scoring.to_protocol_string(),
            "option name Scoring type combo default Number var Number var NumberAndPotential"
        );

        let mut pruning = EngineOption::check("Pruning", true);
        assert!(pruning.set_value("FALSE").is_ok());
        assert!(!pruning.get_bool());
    }

    #[test]
    fn test_go_reports_none_without_moves() {
        let mut p = protocol();
        p.process_command("position .b....../a......./......../......../......../......../......../........ side a");
        p.process_command("go depth 2");
        assert!(output(&p).contains("bestline none"));
    }

    #[test]
    fn test_perft_from_start() {
        let board = Board::new();
        assert_eq!(perft(&board, Side::A, 1), 7);
        assert_eq!(perft(&board, Side::A, 2), 49);
    }

    #[test]
    fn test_quit_stops_the_loop() {
        let mut p = protocol();
        p.process_command("quit");
        assert!(!p.running);
    }
}
