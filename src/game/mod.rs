//! Game module - the session state machine and its supporting pieces
//!
//! Implements the client side of a chess game: a local position that
//! mirrors the remote authority, the controller that reconciles the two,
//! and the pure helpers that derive UI-facing state from the position.
//!
//! # Module Organization
//!
//! - `rules` - Position authority adapter over the rules engine (legal
//!   moves, move application, terminal detection, FEN/UCI conversion)
//! - `derived` - Captured pieces, check highlight, material advantage
//! - `history` - Append-only move history with SAN records
//! - `session` - The game session controller state machine
//! - `input` - Click/drag input resolution into candidate moves
//! - `ai` - Engine opponent (HTTP requests to the platform's engine endpoint)
//! - `error` - Typed game errors
//!
//! The controller never talks to the network directly: it hands outbound
//! messages to a [`session::MoveSink`], which is a live transport for online
//! play, an [`ai::AiOpponent`] for vs-AI play, and a no-op for replay.

pub mod ai;
pub mod derived;
pub mod error;
pub mod history;
pub mod input;
pub mod rules;
pub mod session;

pub use error::{GameError, GameResult};
pub use session::{EndReason, GameSession, SessionStatus};
