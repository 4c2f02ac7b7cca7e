//! Game session controller
//!
//! The state machine at the heart of the client. One session mirrors one
//! game: it owns the authoritative-so-far position, the move history, and
//! the promotion/draw sub-states, and reconciles local optimistic moves
//! against remote confirmation and remote-originated moves.
//!
//! The controller is synchronous: every transition runs to completion
//! before the next input or network event is processed. It never touches
//! the network itself; outbound traffic goes through a [`MoveSink`], which
//! is a live transport for online play, an engine opponent for vs-AI play,
//! and a no-op for replay. Inbound traffic arrives through
//! [`GameSession::handle_event`].
//!
//! Reconciliation rules:
//! - A locally applied move is optimistic. A failed send surfaces a
//!   transient error but is NOT rolled back; the server's next snapshot
//!   wins unconditionally.
//! - A remote move is re-validated against the local position; a move
//!   arriving out of turn is ignored (the local position is the
//!   tie-breaker absent a server snapshot).
//! - A `game_state` snapshot always overrides local state. Its FEN is
//!   schema-validated first, and its move list must replay to the claimed
//!   FEN for the history to be adopted with it.

use crate::game::derived::{self, CapturedPieces};
use crate::game::error::{GameError, GameResult};
use crate::game::history::MoveHistory;
use crate::game::input::{self, InputOutcome, Selection};
use crate::game::rules::{self, TerminalState};
use crate::networking::client::TransportEvent;
use crate::networking::protocol::{
    ClientMessage, ServerMessage, WireEndReason, WireGameStatus,
};
use shakmaty::{Chess, Color, Move, Position, Role, Square};
use tracing::{debug, info, warn};

/// Where outbound session messages go
///
/// `dispatch` returning `false` is a recoverable delivery failure: the
/// session surfaces a transient error and the user may retry the action.
pub trait MoveSink: Send {
    fn dispatch(&mut self, msg: ClientMessage) -> bool;
}

/// Sink for replay/analysis sessions: accepts everything, sends nothing
pub struct NullSink;

impl MoveSink for NullSink {
    fn dispatch(&mut self, _msg: ClientMessage) -> bool {
        true
    }
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Waiting for the initial snapshot / side assignment
    Connecting,
    /// Game in progress
    Active,
    /// A local move needs a promotion choice before it can be finalized
    AwaitingPromotion,
    /// Terminal; only a brand-new session leaves this state
    Ended,
}

impl SessionStatus {
    fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Connecting => "connecting",
            SessionStatus::Active => "active",
            SessionStatus::AwaitingPromotion => "awaiting-promotion-choice",
            SessionStatus::Ended => "ended",
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Checkmate,
    Stalemate,
    DrawAgreed,
    Resignation,
    OpponentDisconnected,
    Timeout,
}

impl EndReason {
    pub fn as_str(self) -> &'static str {
        match self {
            EndReason::Checkmate => "checkmate",
            EndReason::Stalemate => "stalemate",
            EndReason::DrawAgreed => "draw-agreed",
            EndReason::Resignation => "resignation",
            EndReason::OpponentDisconnected => "opponent-disconnected",
            EndReason::Timeout => "timeout",
        }
    }
}

/// Which party's draw offer is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOfferFrom {
    Local,
    Opponent,
}

/// A local move suspended on a promotion choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPromotion {
    pub from: Square,
    pub to: Square,
}

/// One game, as seen from this client
pub struct GameSession {
    game_id: Option<String>,
    position: Chess,
    history: MoveHistory,
    local_color: Color,
    status: SessionStatus,
    pending_promotion: Option<PendingPromotion>,
    pending_draw: Option<DrawOfferFrom>,
    end_reason: Option<EndReason>,
    winner: Option<Color>,
    white_player: String,
    black_player: String,
    selection: Selection,
    transient_error: Option<String>,
    sink: Box<dyn MoveSink>,
}

impl GameSession {
    /// Session for online play: waits for the server's `game_start`
    pub fn connecting(sink: Box<dyn MoveSink>) -> Self {
        Self {
            game_id: None,
            position: rules::starting_position(),
            history: MoveHistory::default(),
            local_color: Color::White,
            status: SessionStatus::Connecting,
            pending_promotion: None,
            pending_draw: None,
            end_reason: None,
            winner: None,
            white_player: "white".to_string(),
            black_player: "black".to_string(),
            selection: Selection::default(),
            transient_error: None,
            sink,
        }
    }

    /// Session that starts immediately from the standard opening
    ///
    /// Used for vs-AI and replay sessions, where there is no server-side
    /// matchmaking step.
    pub fn start_local(local_color: Color, sink: Box<dyn MoveSink>) -> Self {
        let mut session = Self::connecting(sink);
        session.game_id = Some(uuid::Uuid::new_v4().to_string());
        session.local_color = local_color;
        session.status = SessionStatus::Active;
        session
    }

    // --- accessors ---

    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn fen(&self) -> String {
        rules::to_fen(&self.position)
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn local_color(&self) -> Color {
        self.local_color
    }

    /// Side to move; derived from the position
    pub fn turn_owner(&self) -> Color {
        self.position.turn()
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Winner of a decided game; `None` while active or after a draw
    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    pub fn white_player(&self) -> &str {
        &self.white_player
    }

    pub fn black_player(&self) -> &str {
        &self.black_player
    }

    /// Override the display names (vs-AI sessions have no `game_start`)
    pub fn set_players(&mut self, white: impl Into<String>, black: impl Into<String>) {
        self.white_player = white.into();
        self.black_player = black.into();
    }

    pub fn pending_promotion(&self) -> Option<PendingPromotion> {
        self.pending_promotion
    }

    pub fn pending_draw(&self) -> Option<DrawOfferFrom> {
        self.pending_draw
    }

    /// Captured pieces, recomputed from the position
    pub fn captured(&self) -> CapturedPieces {
        derived::captured_pieces(&self.position)
    }

    /// King square to highlight if the side to move is in check
    pub fn check_highlight(&self) -> Option<Square> {
        derived::check_highlight(&self.position)
    }

    /// Take the latest transient (recoverable) error, if any
    pub fn take_transient_error(&mut self) -> Option<String> {
        self.transient_error.take()
    }

    fn ensure_active(&self) -> GameResult<()> {
        if self.status != SessionStatus::Active {
            return Err(GameError::NotActive {
                status: self.status.as_str(),
            });
        }
        Ok(())
    }

    // --- local input ---

    /// Resolve a click/tap on a square
    pub fn square_input(&mut self, square: Square) -> GameResult<InputOutcome> {
        self.ensure_active()?;
        let outcome =
            input::handle_square_input(&self.position, self.local_color, &mut self.selection, square)?;
        self.finish_input(outcome)
    }

    /// Resolve a drag-and-drop
    pub fn drop_input(&mut self, from: Square, to: Square) -> GameResult<InputOutcome> {
        self.ensure_active()?;
        self.selection.clear();
        let outcome = input::handle_drop(&self.position, self.local_color, from, to)?;
        self.finish_input(outcome)
    }

    fn finish_input(&mut self, outcome: InputOutcome) -> GameResult<InputOutcome> {
        match outcome {
            InputOutcome::Candidate(m) => {
                self.submit_local_move(m.clone())?;
                Ok(InputOutcome::Candidate(m))
            }
            InputOutcome::PromotionNeeded { from, to } => {
                self.pending_promotion = Some(PendingPromotion { from, to });
                self.status = SessionStatus::AwaitingPromotion;
                debug!("[SESSION] promotion choice pending for {from}{to}");
                Ok(InputOutcome::PromotionNeeded { from, to })
            }
            other => Ok(other),
        }
    }

    /// Complete a pending promotion with the chosen piece
    pub fn choose_promotion(&mut self, role: Role) -> GameResult<()> {
        if self.status != SessionStatus::AwaitingPromotion {
            return Err(GameError::NoPendingPromotion);
        }
        let pending = self
            .pending_promotion
            .ok_or(GameError::NoPendingPromotion)?;

        let candidate = rules::candidate_moves(&self.position, pending.from, pending.to)
            .into_iter()
            .find(|m| m.promotion() == Some(role))
            .ok_or(GameError::InvalidPromotion { role })?;

        self.pending_promotion = None;
        self.status = SessionStatus::Active;
        self.submit_local_move(candidate)
    }

    /// Apply a validated local move optimistically and send it out
    fn submit_local_move(&mut self, m: Move) -> GameResult<()> {
        self.ensure_active()?;
        if self.position.turn() != self.local_color {
            return Err(GameError::NotYourTurn);
        }

        let played = rules::describe(&self.position, &m);
        let next = rules::apply(&self.position, m).map_err(|_| GameError::IllegalDestination)?;
        self.position = next;
        self.history.record(played.clone(), self.local_color);
        self.pending_draw = None;

        let terminal = rules::terminal_state(&self.position);
        let game_status = match terminal {
            TerminalState::Checkmate => WireGameStatus::Checkmate,
            TerminalState::Stalemate => WireGameStatus::Stalemate,
            TerminalState::Draw => WireGameStatus::Draw,
            TerminalState::Ongoing => WireGameStatus::Active,
        };

        let msg = ClientMessage::Move {
            game_id: self.game_id.clone().unwrap_or_default(),
            from: played.from.to_string(),
            to: played.to.to_string(),
            promotion: played.promotion.map(|r| r.char().to_string()),
            san: played.san.clone(),
            fen: self.fen(),
            game_status,
        };
        if !self.sink.dispatch(msg) {
            // Deliberate consistency gap: the optimistic apply stands and
            // the server's next snapshot wins if it disagrees.
            warn!("[SESSION] move {} not delivered", played.san);
            self.transient_error = Some("move could not be sent; check your connection".into());
        }

        info!("[SESSION] local move {}", played.san);
        match terminal {
            TerminalState::Checkmate => {
                self.winner = Some(self.local_color);
                self.end(EndReason::Checkmate);
            }
            TerminalState::Stalemate => self.end(EndReason::Stalemate),
            TerminalState::Draw => self.end(EndReason::DrawAgreed),
            TerminalState::Ongoing => {}
        }
        Ok(())
    }

    // --- draw / resign / matchmaking ---

    /// Offer the opponent a draw
    pub fn offer_draw(&mut self) -> GameResult<()> {
        self.ensure_active()?;
        if self.pending_draw.is_some() {
            return Err(GameError::DrawAlreadyPending);
        }
        let msg = ClientMessage::DrawOffer {
            game_id: self.game_id.clone().unwrap_or_default(),
        };
        if self.sink.dispatch(msg) {
            self.pending_draw = Some(DrawOfferFrom::Local);
            info!("[SESSION] draw offered");
        } else {
            self.transient_error = Some("draw offer could not be sent".into());
        }
        Ok(())
    }

    /// Accept the opponent's outstanding draw offer
    ///
    /// Accepting is authoritative for this side, so the session ends
    /// immediately; the offering side instead waits for the server's
    /// `game_end` confirmation.
    pub fn accept_draw(&mut self) -> GameResult<()> {
        self.ensure_active()?;
        if self.pending_draw != Some(DrawOfferFrom::Opponent) {
            return Err(GameError::NoDrawOffer);
        }
        let msg = ClientMessage::AcceptDraw {
            game_id: self.game_id.clone().unwrap_or_default(),
        };
        if !self.sink.dispatch(msg) {
            self.transient_error = Some("draw acceptance could not be sent".into());
        }
        self.end(EndReason::DrawAgreed);
        Ok(())
    }

    /// Decline the opponent's outstanding draw offer
    pub fn decline_draw(&mut self) -> GameResult<()> {
        self.ensure_active()?;
        if self.pending_draw != Some(DrawOfferFrom::Opponent) {
            return Err(GameError::NoDrawOffer);
        }
        let msg = ClientMessage::DeclineDraw {
            game_id: self.game_id.clone().unwrap_or_default(),
        };
        if !self.sink.dispatch(msg) {
            self.transient_error = Some("draw response could not be sent".into());
        }
        self.pending_draw = None;
        Ok(())
    }

    /// Resign the game; confirmed locally, effective immediately
    pub fn resign(&mut self) -> GameResult<()> {
        if self.status != SessionStatus::Active && self.status != SessionStatus::AwaitingPromotion {
            return Err(GameError::NotActive {
                status: self.status.as_str(),
            });
        }
        let msg = ClientMessage::Resign {
            game_id: self.game_id.clone().unwrap_or_default(),
        };
        if !self.sink.dispatch(msg) {
            self.transient_error = Some("resignation could not be sent".into());
        }
        self.winner = Some(self.local_color.other());
        self.end(EndReason::Resignation);
        Ok(())
    }

    /// Best-effort notice that the player is abandoning the view
    ///
    /// Ungraceful exits cannot be made transactional; the server treats a
    /// dropped opponent on its own timer regardless.
    pub fn leave(&mut self) {
        if self.status == SessionStatus::Active || self.status == SessionStatus::AwaitingPromotion
        {
            let msg = ClientMessage::Resign {
                game_id: self.game_id.clone().unwrap_or_default(),
            };
            let _ = self.sink.dispatch(msg);
            debug!("[SESSION] leave notice sent");
        }
    }

    /// Enter the matchmaking queue (connecting sessions only)
    pub fn find_match(&mut self, elo: u32) -> bool {
        if self.status != SessionStatus::Connecting {
            return false;
        }
        self.sink.dispatch(ClientMessage::FindMatch { elo })
    }

    /// Leave the matchmaking queue
    pub fn cancel_match(&mut self) -> bool {
        if self.status != SessionStatus::Connecting {
            return false;
        }
        self.sink.dispatch(ClientMessage::CancelMatch)
    }

    // --- remote events ---

    /// Feed one transport event through the state machine
    ///
    /// Protocol violations are logged and dropped; they never corrupt the
    /// position or the history.
    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Up => {
                if self.status != SessionStatus::Ended {
                    if let Some(game_id) = self.game_id.clone() {
                        info!("[SESSION] link up, requesting resync");
                        let msg = ClientMessage::JoinGame { game_id };
                        if !self.sink.dispatch(msg) {
                            warn!("[SESSION] resync request not delivered");
                        }
                    }
                }
            }
            TransportEvent::Down => {
                self.transient_error = Some("connection lost; reconnecting".into());
            }
            TransportEvent::AuthRejected => {
                self.transient_error = Some("authentication rejected; please sign in again".into());
            }
            TransportEvent::Message(msg) => self.handle_server_message(msg),
        }
    }

    fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::GameStart {
                game_id,
                white_player,
                black_player,
                your_color,
            } => self.on_game_start(game_id, white_player, black_player, your_color.into()),
            ServerMessage::Move {
                from,
                to,
                promotion,
                san,
                current_turn,
            } => self.on_remote_move(&from, &to, promotion.as_deref(), san, current_turn.into()),
            ServerMessage::GameState { fen, moves } => self.adopt_snapshot(&fen, &moves),
            ServerMessage::GameEnd {
                reason,
                winner,
                resigned_by,
            } => self.on_game_end(reason, winner.map(Color::from), resigned_by.map(Color::from)),
            ServerMessage::DrawOffer { from: _ } => self.on_remote_draw_offer(),
            ServerMessage::DrawDeclined => {
                if self.pending_draw == Some(DrawOfferFrom::Local) {
                    self.pending_draw = None;
                    self.transient_error = Some("draw offer declined".into());
                } else {
                    warn!("[SESSION] draw_declined with no local offer pending");
                }
            }
            ServerMessage::OpponentDisconnected => {
                // The server's ruling (forfeit or abort) arrives as game_end
                self.transient_error = Some("opponent disconnected".into());
            }
            ServerMessage::Error { message } => {
                warn!("[SESSION] server error: {message}");
                self.transient_error = Some(message);
            }
        }
    }

    fn on_game_start(
        &mut self,
        game_id: String,
        white_player: String,
        black_player: String,
        your_color: Color,
    ) {
        if self.status != SessionStatus::Connecting {
            warn!("[SESSION] game_start ignored in status {}", self.status.as_str());
            return;
        }
        info!(
            "[SESSION] game {game_id} starting: {white_player} vs {black_player}, playing {:?}",
            your_color
        );
        self.game_id = Some(game_id);
        self.local_color = your_color;
        self.white_player = white_player;
        self.black_player = black_player;
        self.position = rules::starting_position();
        self.history.clear();
        self.status = SessionStatus::Active;
    }

    fn on_remote_move(
        &mut self,
        from: &str,
        to: &str,
        promotion: Option<&str>,
        san: Option<String>,
        current_turn: Color,
    ) {
        if self.status != SessionStatus::Active {
            warn!(
                "[SESSION] remote move ignored in status {}",
                self.status.as_str()
            );
            return;
        }
        let opponent = self.local_color.other();
        if self.position.turn() != opponent {
            // Strictly sequential: the local position is the tie-breaker
            warn!("[SESSION] out-of-order remote move {from}{to} ignored");
            return;
        }

        let uci = format!("{from}{to}{}", promotion.unwrap_or(""));
        let m = match rules::parse_uci(&self.position, &uci) {
            Ok(m) => m,
            Err(e) => {
                warn!("[SESSION] dropping invalid remote move {uci}: {e}");
                return;
            }
        };

        let played = rules::describe(&self.position, &m);
        if let Some(remote_san) = san {
            if remote_san != played.san {
                debug!(
                    "[SESSION] remote SAN {remote_san} differs from derived {}",
                    played.san
                );
            }
        }
        // Re-derived legality: apply cannot fail for a parse_uci result
        match rules::apply(&self.position, m) {
            Ok(next) => self.position = next,
            Err(e) => {
                warn!("[SESSION] dropping remote move {uci}: {e}");
                return;
            }
        }
        self.history.record(played.clone(), opponent);
        self.pending_draw = None;
        self.selection.clear();
        info!("[SESSION] remote move {}", played.san);

        if self.position.turn() != current_turn {
            warn!("[SESSION] server turn claim disagrees with local position");
        }

        match rules::terminal_state(&self.position) {
            TerminalState::Checkmate => {
                self.winner = Some(opponent);
                self.end(EndReason::Checkmate);
            }
            TerminalState::Stalemate => self.end(EndReason::Stalemate),
            TerminalState::Draw => self.end(EndReason::DrawAgreed),
            TerminalState::Ongoing => {}
        }
    }

    /// Adopt an authoritative server snapshot, last-writer-wins
    fn adopt_snapshot(&mut self, fen: &str, moves: &[String]) {
        if self.status == SessionStatus::Ended {
            debug!("[SESSION] snapshot ignored after game end");
            return;
        }
        let claimed = match rules::parse_fen(fen) {
            Ok(pos) => pos,
            Err(e) => {
                warn!("[SESSION] dropping snapshot with invalid FEN: {e}");
                return;
            }
        };

        let mut adopted_history = false;
        if !moves.is_empty() {
            match rules::replay_uci(moves) {
                Ok((replayed, played)) if rules::to_fen(&replayed) == rules::to_fen(&claimed) => {
                    self.position = replayed;
                    self.history.reset_from(played, Color::White);
                    adopted_history = true;
                }
                Ok(_) => {
                    warn!("[SESSION] snapshot move list does not reproduce claimed FEN");
                }
                Err(e) => {
                    warn!("[SESSION] snapshot move list invalid: {e}");
                }
            }
        }
        if !adopted_history {
            self.position = claimed;
            self.history.clear();
        }

        self.selection.clear();
        self.pending_promotion = None;
        self.pending_draw = None;
        if self.status != SessionStatus::Ended {
            self.status = SessionStatus::Active;
        }
        info!(
            "[SESSION] adopted server snapshot ({} ply{})",
            self.history.len(),
            if adopted_history { "" } else { ", history reset" }
        );
    }

    fn on_game_end(
        &mut self,
        reason: WireEndReason,
        winner: Option<Color>,
        resigned_by: Option<Color>,
    ) {
        if self.status == SessionStatus::Ended {
            return;
        }
        let reason = match reason {
            WireEndReason::Checkmate => EndReason::Checkmate,
            WireEndReason::Resignation => EndReason::Resignation,
            WireEndReason::Draw | WireEndReason::MutualAgreement => EndReason::DrawAgreed,
            WireEndReason::OpponentDisconnected => EndReason::OpponentDisconnected,
            WireEndReason::Timeout => EndReason::Timeout,
        };
        self.winner = winner.or_else(|| resigned_by.map(Color::other));
        self.end(reason);
    }

    fn on_remote_draw_offer(&mut self) {
        if self.status != SessionStatus::Active {
            warn!("[SESSION] draw offer ignored in status {}", self.status.as_str());
            return;
        }
        if self.pending_draw == Some(DrawOfferFrom::Local) {
            warn!("[SESSION] crossing draw offers; keeping the local one pending");
            return;
        }
        info!("[SESSION] opponent offers a draw");
        self.pending_draw = Some(DrawOfferFrom::Opponent);
    }

    fn end(&mut self, reason: EndReason) {
        self.status = SessionStatus::Ended;
        self.end_reason = Some(reason);
        self.pending_promotion = None;
        self.pending_draw = None;
        self.selection.clear();
        info!("[SESSION] game over: {reason:?}");
    }
}
