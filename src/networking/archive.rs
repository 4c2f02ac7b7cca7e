//! Recording finished games
//!
//! Thin client for the platform's archival endpoint. A finished game is
//! posted once with its movetext and result; failures are surfaced to the
//! caller, which logs them and moves on. Losing an archive write never
//! affects the session that produced it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shakmaty::Color;
use std::time::Duration;
use thiserror::Error;

/// Errors from the archival endpoint
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("archive returned HTTP {0}")]
    Status(u16),
}

/// Record of a finished game, as the endpoint expects it
#[derive(Debug, Clone, Serialize)]
pub struct FinishedGame {
    pub game_id: String,
    pub white_player: String,
    pub black_player: String,
    /// Numbered movetext, e.g. `1. e4 e5 2. Nf3`
    pub moves: String,
    /// `1-0`, `0-1` or `1/2-1/2`
    pub result: String,
    /// Why the game ended (checkmate, resignation, ...)
    pub reason: String,
    pub ended_at: DateTime<Utc>,
}

/// Conventional result tag for a winner
pub fn result_tag(winner: Option<Color>) -> &'static str {
    match winner {
        Some(Color::White) => "1-0",
        Some(Color::Black) => "0-1",
        None => "1/2-1/2",
    }
}

/// HTTP client for the archival endpoint
pub struct ArchiveClient {
    http: reqwest::Client,
    base_url: String,
}

impl ArchiveClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ArchiveError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Post one finished game
    pub async fn record_game(&self, game: &FinishedGame) -> Result<(), ArchiveError> {
        let url = format!("{}/games", self.base_url);
        let response = self.http.post(&url).json(game).send().await?;
        if !response.status().is_success() {
            return Err(ArchiveError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
