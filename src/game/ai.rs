//! Engine opponent for vs-AI sessions
//!
//! The platform delegates move generation to an external engine behind an
//! HTTP endpoint: the client posts the move transcript and a difficulty
//! label, the endpoint answers with `{"jugada_stockfish": "<uci>"}`.
//!
//! [`AiOpponent`] is the [`MoveSink`] for vs-AI sessions. A local move
//! dispatched into it triggers an engine request in a background task; the
//! reply comes back to the session as an ordinary remote-move event, so
//! the controller treats human and engine opponents identically.
//!
//! Every request carries the session tag current at spawn time. Replies
//! whose tag went stale (the player started a new game) are discarded
//! instead of being applied to a session they no longer belong to.

use crate::game::session::MoveSink;
use crate::networking::client::TransportEvent;
use crate::networking::protocol::{ClientMessage, ServerMessage, WireColor, WireGameStatus};
use serde::Deserialize;
use shakmaty::Color;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Hard timeout on a single engine reply request
pub const AI_REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// Engine difficulty, sent to the endpoint as a label
///
/// The endpoint maps the label to engine search limits; the client only
/// names the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AiDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl AiDifficulty {
    /// The label the endpoint expects
    pub fn label(self) -> &'static str {
        match self {
            AiDifficulty::Easy => "easy",
            AiDifficulty::Medium => "medium",
            AiDifficulty::Hard => "hard",
        }
    }
}

impl FromStr for AiDifficulty {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(AiDifficulty::Easy),
            "medium" => Ok(AiDifficulty::Medium),
            "hard" => Ok(AiDifficulty::Hard),
            other => Err(AiError::UnknownDifficulty(other.to_string())),
        }
    }
}

/// Errors from the engine endpoint
#[derive(Debug, Error)]
pub enum AiError {
    /// Request failed (includes the 10 s timeout)
    #[error("engine request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("engine returned HTTP {0}")]
    Status(u16),

    /// Endpoint answered without a move
    #[error("engine returned no move")]
    NoMove,

    /// Unrecognized difficulty label
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

#[derive(Debug, Deserialize)]
struct EngineReply {
    jugada_stockfish: Option<String>,
}

/// HTTP client for the engine endpoint
pub struct AiClient {
    http: reqwest::Client,
    endpoint: String,
    difficulty: AiDifficulty,
}

impl AiClient {
    pub fn new(
        endpoint: impl Into<String>,
        difficulty: AiDifficulty,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            difficulty,
        })
    }

    /// Ask the engine for its reply to the given transcript
    ///
    /// `moves` is the full game so far in coordinate notation. Returns the
    /// engine's move in the same notation.
    pub async fn request_reply(&self, moves: &[String]) -> Result<String, AiError> {
        let body = serde_json::json!({
            "moves": moves,
            "difficulty": self.difficulty.label(),
        });
        let response = self.http.post(&self.endpoint).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(AiError::Status(response.status().as_u16()));
        }
        let reply: EngineReply = response.json().await?;
        reply
            .jugada_stockfish
            .filter(|uci| !uci.is_empty())
            .ok_or(AiError::NoMove)
    }
}

/// Move sink that plays the other side through the engine endpoint
///
/// Clones share the transcript and session tag, so a handle kept by the
/// application can retry or retire requests for the sink the session owns.
#[derive(Clone)]
pub struct AiOpponent {
    client: Arc<AiClient>,
    ai_color: Color,
    events: UnboundedSender<TransportEvent>,
    session_tag: Arc<AtomicU64>,
    transcript: Arc<Mutex<Vec<String>>>,
}

impl AiOpponent {
    pub fn new(
        client: AiClient,
        ai_color: Color,
        events: UnboundedSender<TransportEvent>,
    ) -> Self {
        Self {
            client: Arc::new(client),
            ai_color,
            events,
            session_tag: Arc::new(AtomicU64::new(0)),
            transcript: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Abandon any in-flight request and start a fresh transcript
    ///
    /// Call when the player leaves the game view or starts a new game; a
    /// late reply tagged with the old session is discarded on arrival.
    pub fn retire(&self) {
        self.session_tag.fetch_add(1, Ordering::SeqCst);
        self.transcript.lock().unwrap().clear();
        debug!("[AI] session retired, pending replies will be discarded");
    }

    /// Re-issue the engine request for the current transcript
    ///
    /// The explicit retry action for a timed-out or failed request.
    pub fn nudge(&self) {
        let transcript = self.transcript.lock().unwrap().clone();
        self.spawn_request(transcript);
    }

    fn spawn_request(&self, transcript: Vec<String>) {
        let tag = self.session_tag.load(Ordering::SeqCst);
        let client = self.client.clone();
        let events = self.events.clone();
        let session_tag = self.session_tag.clone();
        let shared_transcript = self.transcript.clone();
        let ai_color = self.ai_color;

        info!("[AI] requesting engine reply (ply {})", transcript.len());
        tokio::spawn(async move {
            let result = client.request_reply(&transcript).await;
            if session_tag.load(Ordering::SeqCst) != tag {
                debug!("[AI] stale engine reply discarded");
                return;
            }
            match result {
                Ok(uci) if uci.len() >= 4 => {
                    info!("[AI] engine plays {uci}");
                    shared_transcript.lock().unwrap().push(uci.clone());
                    let promotion = if uci.len() > 4 {
                        Some(uci[4..].to_string())
                    } else {
                        None
                    };
                    let event = TransportEvent::Message(ServerMessage::Move {
                        from: uci[0..2].to_string(),
                        to: uci[2..4].to_string(),
                        promotion,
                        san: None,
                        current_turn: WireColor::from(ai_color.other()),
                    });
                    let _ = events.send(event);
                }
                Ok(uci) => {
                    warn!("[AI] unusable engine reply {uci:?}");
                    let _ = events.send(TransportEvent::Message(ServerMessage::Error {
                        message: format!("engine returned an unusable move: {uci}"),
                    }));
                }
                Err(e) => {
                    warn!("[AI] engine request failed: {e}");
                    let _ = events.send(TransportEvent::Message(ServerMessage::Error {
                        message: format!("engine unavailable: {e}"),
                    }));
                }
            }
        });
    }
}

impl MoveSink for AiOpponent {
    fn dispatch(&mut self, msg: ClientMessage) -> bool {
        match msg {
            ClientMessage::Move {
                from,
                to,
                promotion,
                game_status,
                ..
            } => {
                let uci = format!("{from}{to}{}", promotion.unwrap_or_default());
                let transcript = {
                    let mut transcript = self.transcript.lock().unwrap();
                    transcript.push(uci);
                    transcript.clone()
                };
                // No reply needed once the game is decided
                if game_status == WireGameStatus::Active {
                    self.spawn_request(transcript);
                }
                true
            }
            ClientMessage::DrawOffer { .. } => {
                // The engine endpoint has no draw protocol
                let _ = self
                    .events
                    .send(TransportEvent::Message(ServerMessage::DrawDeclined));
                true
            }
            _ => true,
        }
    }
}
