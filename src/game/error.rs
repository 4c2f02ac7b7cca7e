//! Error types for game module
//!
//! Provides custom error types for move validation and session state
//! management. Every rejection here is synchronous and leaves session
//! state untouched.

use shakmaty::Square;

/// Errors that can occur in game logic
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// A move was attempted out of turn
    #[error("not your turn")]
    NotYourTurn,

    /// A move was attempted with the opponent's piece
    #[error("cannot move the opponent's piece")]
    WrongPieceColor,

    /// The destination is not legal for the selected piece
    #[error("illegal destination for the selected piece")]
    IllegalDestination,

    /// No piece stands on the addressed square
    #[error("no piece on {square}")]
    EmptySquare { square: Square },

    /// The session is not accepting moves
    #[error("session is not active (status: {status})")]
    NotActive { status: &'static str },

    /// A promotion choice arrived with no promotion pending
    #[error("no promotion is pending")]
    NoPendingPromotion,

    /// The chosen promotion piece is not a legal option
    #[error("cannot promote to {role:?}")]
    InvalidPromotion { role: shakmaty::Role },

    /// Draw bookkeeping violation
    #[error("no draw offer to answer")]
    NoDrawOffer,

    /// A draw offer is already outstanding
    #[error("a draw offer is already pending")]
    DrawAlreadyPending,
}

/// Result type alias for game operations
pub type GameResult<T> = Result<T, GameError>;
