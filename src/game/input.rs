//! Move input resolution
//!
//! Translates raw board input (square clicked, piece dropped) into
//! candidate moves validated against the current position and turn
//! ownership. Two flows converge on the same candidate shape:
//!
//! - Two-phase click-to-move: first input selects one of the player's own
//!   pieces and produces a highlight set; the second input either resolves
//!   to a move, reselects another own piece, or clears the selection.
//! - Single-phase drag-and-drop: the drop applies the identical
//!   ownership/turn/legality checks; a rejection tells the rendering layer
//!   to revert the piece visually.
//!
//! Rejections are typed and never touch selection or session state beyond
//! clearing the selection where the flow says so.

use crate::game::error::GameError;
use crate::game::rules;
use shakmaty::{Chess, Color, Move, Position, Square};

/// Visual class of a highlighted destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    /// Quiet move destination
    Quiet,
    /// Capture destination, rendered distinctly
    Capture,
}

/// One highlighted destination square
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub square: Square,
    pub kind: HighlightKind,
}

/// Current click-to-move selection state
#[derive(Debug, Default)]
pub struct Selection {
    selected: Option<Square>,
    possible: Vec<Move>,
}

impl Selection {
    pub fn is_selected(&self) -> bool {
        self.selected.is_some()
    }

    pub fn selected_square(&self) -> Option<Square> {
        self.selected
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.possible.clear();
    }

    fn select(&mut self, square: Square, possible: Vec<Move>) -> Vec<Highlight> {
        let highlights = highlights_for(&possible);
        self.selected = Some(square);
        self.possible = possible;
        highlights
    }

    /// Moves from the selected square landing on `to`
    fn matches_for(&self, to: Square) -> Vec<Move> {
        self.possible
            .iter()
            .filter(|m| rules::move_endpoints(m).1 == to)
            .cloned()
            .collect()
    }
}

/// What an input event resolved to
#[derive(Debug)]
pub enum InputOutcome {
    /// A piece was selected (or reselected); destinations to highlight
    Selected {
        square: Square,
        highlights: Vec<Highlight>,
    },
    /// The selection was cleared; nothing else happened
    Cleared,
    /// Input on an empty or irrelevant square with nothing selected
    Ignored,
    /// A concrete candidate move, ready for the session to submit
    Candidate(Move),
    /// The origin/destination pair needs a promotion choice first
    PromotionNeeded { from: Square, to: Square },
}

fn highlights_for(moves: &[Move]) -> Vec<Highlight> {
    moves
        .iter()
        .map(|m| Highlight {
            square: rules::move_endpoints(m).1,
            kind: if m.capture().is_some() {
                HighlightKind::Capture
            } else {
                HighlightKind::Quiet
            },
        })
        .collect()
}

/// Resolve a click/tap on a square
///
/// `local_color` is the color this client plays; moves are only offered
/// during that player's turn.
pub fn handle_square_input(
    pos: &Chess,
    local_color: Color,
    selection: &mut Selection,
    square: Square,
) -> Result<InputOutcome, GameError> {
    if let Some(selected) = selection.selected_square() {
        // Second input: resolve, reselect, or clear
        if square == selected {
            selection.clear();
            return Ok(InputOutcome::Cleared);
        }

        let matches = selection.matches_for(square);
        if !matches.is_empty() {
            let from = selected;
            selection.clear();
            if matches.iter().any(|m| m.promotion().is_some()) {
                return Ok(InputOutcome::PromotionNeeded { from, to: square });
            }
            return Ok(InputOutcome::Candidate(matches[0].clone()));
        }

        // Landing on another of our own pieces reselects instead of failing
        if let Some(piece) = pos.board().piece_at(square) {
            if piece.color == local_color {
                let possible = rules::legal_moves_from(pos, square);
                if possible.is_empty() {
                    selection.clear();
                    return Ok(InputOutcome::Cleared);
                }
                let highlights = selection.select(square, possible);
                return Ok(InputOutcome::Selected { square, highlights });
            }
        }

        selection.clear();
        return Ok(InputOutcome::Cleared);
    }

    // First input: only the local player's pieces, only on their turn
    let Some(piece) = pos.board().piece_at(square) else {
        return Ok(InputOutcome::Ignored);
    };
    if piece.color != local_color {
        return Err(GameError::WrongPieceColor);
    }
    if pos.turn() != local_color {
        return Err(GameError::NotYourTurn);
    }

    let possible = rules::legal_moves_from(pos, square);
    if possible.is_empty() {
        return Ok(InputOutcome::Ignored);
    }
    let highlights = selection.select(square, possible);
    Ok(InputOutcome::Selected { square, highlights })
}

/// Resolve a drag-and-drop from one square to another
///
/// Bypasses the two-phase flow but applies the same checks. An `Err`
/// means the drop was rejected and the piece should visually revert.
pub fn handle_drop(
    pos: &Chess,
    local_color: Color,
    from: Square,
    to: Square,
) -> Result<InputOutcome, GameError> {
    let Some(piece) = pos.board().piece_at(from) else {
        return Err(GameError::EmptySquare { square: from });
    };
    if piece.color != local_color {
        return Err(GameError::WrongPieceColor);
    }
    if pos.turn() != local_color {
        return Err(GameError::NotYourTurn);
    }

    let matches = rules::candidate_moves(pos, from, to);
    if matches.is_empty() {
        return Err(GameError::IllegalDestination);
    }
    if matches.iter().any(|m| m.promotion().is_some()) {
        return Ok(InputOutcome::PromotionNeeded { from, to });
    }
    Ok(InputOutcome::Candidate(matches[0].clone()))
}
