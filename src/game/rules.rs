//! Position authority adapter over the rules engine
//!
//! Wraps `shakmaty` behind the handful of queries the session controller
//! needs: legal moves from a square, move application, terminal-state
//! detection, and FEN/UCI conversion. Everything here is pure and
//! synchronous; positions are treated as immutable snapshots (applying a
//! move yields a new position, the input is untouched).

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, EnPassantMode, File, Move, Position, Role, Square};
use thiserror::Error;

/// Errors from the rules adapter
#[derive(Debug, Error)]
pub enum RulesError {
    /// The move is not legal in the given position
    #[error("illegal move {uci}")]
    IllegalMove { uci: String },

    /// A FEN string failed schema validation or describes an unreachable setup
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    /// A move in coordinate notation could not be parsed or matched
    #[error("invalid move notation: {0}")]
    InvalidUci(String),
}

/// Result of terminal-state detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    Checkmate,
    Stalemate,
    /// Automatic draw (insufficient material)
    Draw,
    Ongoing,
}

/// A move that has been validated against a position, recorded with
/// everything the history and the wire protocol need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub from: Square,
    pub to: Square,
    pub role: Role,
    pub promotion: Option<Role>,
    pub capture: Option<Role>,
    /// SAN with check/mate suffix, e.g. `exd5`, `e8=Q+`, `Qh7#`
    pub san: String,
}

impl PlayedMove {
    /// Coordinate notation (`e2e4`, `e7e8q`)
    pub fn uci(&self) -> String {
        match self.promotion {
            Some(role) => format!("{}{}{}", self.from, self.to, role.char()),
            None => format!("{}{}", self.from, self.to),
        }
    }
}

/// The standard starting position
pub fn starting_position() -> Chess {
    Chess::default()
}

/// Visible endpoints of a move: origin square and destination square
///
/// Castling is normalized to the king's origin and the king's destination
/// (g/c file), which is how both the UI and the wire protocol address it.
pub fn move_endpoints(m: &Move) -> (Square, Square) {
    match m {
        Move::Normal { from, to, .. } => (*from, *to),
        Move::EnPassant { from, to } => (*from, *to),
        Move::Castle { king, rook } => {
            let to = if rook.file() == File::H {
                Square::from_coords(File::G, rook.rank())
            } else {
                Square::from_coords(File::C, rook.rank())
            };
            (*king, to)
        }
        Move::Put { to, .. } => (*to, *to),
    }
}

/// All legal moves whose origin is `square`
///
/// Empty when the square is empty, holds an opponent piece, or the piece
/// has no legal moves.
pub fn legal_moves_from(pos: &Chess, square: Square) -> Vec<Move> {
    pos.legal_moves()
        .into_iter()
        .filter(|m| move_endpoints(m).0 == square)
        .collect()
}

/// Legal moves matching an origin/destination pair
///
/// More than one entry means the pair is a promotion (one move per
/// promotion piece).
pub fn candidate_moves(pos: &Chess, from: Square, to: Square) -> Vec<Move> {
    pos.legal_moves()
        .into_iter()
        .filter(|m| move_endpoints(m) == (from, to))
        .collect()
}

/// Apply a move, producing a new position
///
/// The input position is not mutated. Fails if the move is not legal for
/// that position.
pub fn apply(pos: &Chess, m: Move) -> Result<Chess, RulesError> {
    let uci = to_uci(&m);
    pos.clone()
        .play(m)
        .map_err(|_| RulesError::IllegalMove { uci })
}

/// Terminal-state query
pub fn terminal_state(pos: &Chess) -> TerminalState {
    if pos.is_checkmate() {
        TerminalState::Checkmate
    } else if pos.is_stalemate() {
        TerminalState::Stalemate
    } else if pos.is_insufficient_material() {
        TerminalState::Draw
    } else {
        TerminalState::Ongoing
    }
}

/// Whether the side to move is in check
pub fn is_in_check(pos: &Chess) -> bool {
    pos.is_check()
}

/// Record a legal move against the position it was generated from
pub fn describe(pos: &Chess, m: &Move) -> PlayedMove {
    let (from, to) = move_endpoints(m);
    PlayedMove {
        from,
        to,
        role: m.role(),
        promotion: m.promotion(),
        capture: m.capture(),
        san: san_string(pos, m.clone()),
    }
}

/// SAN with check/mate suffix for a legal move
pub fn san_string(pos: &Chess, m: Move) -> String {
    SanPlus::from_move(pos.clone(), m).to_string()
}

/// Coordinate notation for a move (`e2e4`, `e7e8q`)
pub fn to_uci(m: &Move) -> String {
    let (from, to) = move_endpoints(m);
    match m.promotion() {
        Some(role) => format!("{}{}{}", from, to, role.char()),
        None => format!("{}{}", from, to),
    }
}

/// Resolve coordinate notation against a position
///
/// The returned move is one of the position's legal moves; promotion moves
/// must carry their promotion suffix explicitly.
pub fn parse_uci(pos: &Chess, uci: &str) -> Result<Move, RulesError> {
    if uci.len() < 4 || uci.len() > 5 {
        return Err(RulesError::InvalidUci(uci.to_string()));
    }
    let from = Square::from_ascii(uci[0..2].as_bytes())
        .map_err(|_| RulesError::InvalidUci(uci.to_string()))?;
    let to = Square::from_ascii(uci[2..4].as_bytes())
        .map_err(|_| RulesError::InvalidUci(uci.to_string()))?;
    let promotion = match uci.as_bytes().get(4) {
        Some(&c) => Some(
            Role::from_char(c as char).ok_or_else(|| RulesError::InvalidUci(uci.to_string()))?,
        ),
        None => None,
    };

    candidate_moves(pos, from, to)
        .into_iter()
        .find(|m| m.promotion() == promotion)
        .ok_or(RulesError::IllegalMove {
            uci: uci.to_string(),
        })
}

/// Parse a FEN string into a position
///
/// Schema-validates the string and rejects setups the rules engine deems
/// unreachable; remote-supplied FENs pass through here before adoption.
pub fn parse_fen(fen: &str) -> Result<Chess, RulesError> {
    let parsed: Fen = fen
        .parse()
        .map_err(|e| RulesError::InvalidFen(format!("{e}")))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| RulesError::InvalidFen(e.to_string()))
}

/// Serialize a position as FEN
pub fn to_fen(pos: &Chess) -> String {
    Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string()
}

/// Replay a coordinate-notation move list from the starting position
///
/// Used to validate remote snapshots: a `game_state` message claims a FEN
/// and the moves that led to it, and the claim holds only if this replay
/// arrives at that FEN.
pub fn replay_uci(moves: &[String]) -> Result<(Chess, Vec<PlayedMove>), RulesError> {
    let mut pos = starting_position();
    let mut played = Vec::with_capacity(moves.len());
    for uci in moves {
        let m = parse_uci(&pos, uci)?;
        played.push(describe(&pos, &m));
        pos = apply(&pos, m)?;
    }
    Ok((pos, played))
}
