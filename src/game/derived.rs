//! Derived state: captured pieces and check highlight
//!
//! Pure functions of a position. Captured pieces are reconstructed by
//! diffing the standard initial piece counts against what is on the board,
//! so they can never drift from the position the way an incrementally
//! maintained list can. Kings are excluded from the diff: they are never
//! capturable, so an initial-count entry for them would be dead weight.
//!
//! Material values follow the standard scale (pawn 1, knight/bishop 3,
//! rook 5, queen 9, king 0).

use shakmaty::{Chess, Color, Position, Role, Square};

/// Roles a side can lose, paired with their initial counts
const INITIAL_COUNTS: [(Role, u8); 5] = [
    (Role::Pawn, 8),
    (Role::Knight, 2),
    (Role::Bishop, 2),
    (Role::Rook, 2),
    (Role::Queen, 1),
];

/// Captured pieces for both sides, reconstructed from a position
///
/// `by_white` holds the black pieces white has captured, `by_black` the
/// white pieces black has captured. A promoted piece can push a side's
/// count above its initial value; the saturating diff treats that as
/// "nothing of this type captured", which matches how the board reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedPieces {
    pub by_white: Vec<Role>,
    pub by_black: Vec<Role>,
}

impl CapturedPieces {
    pub fn is_empty(&self) -> bool {
        self.by_white.is_empty() && self.by_black.is_empty()
    }

    /// How many pieces of `role` the given side has captured
    pub fn count(&self, capturer: Color, role: Role) -> usize {
        let set = match capturer {
            Color::White => &self.by_white,
            Color::Black => &self.by_black,
        };
        set.iter().filter(|&&r| r == role).count()
    }

    /// Material advantage in pawn units, positive when white is ahead
    pub fn material_advantage(&self) -> i32 {
        let white: i32 = self.by_white.iter().map(|&r| piece_value(r)).sum();
        let black: i32 = self.by_black.iter().map(|&r| piece_value(r)).sum();
        white - black
    }
}

/// Standard piece value in pawn units
///
/// King has value 0 as it cannot be captured.
fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => 1,
        Role::Knight => 3,
        Role::Bishop => 3,
        Role::Rook => 5,
        Role::Queen => 9,
        Role::King => 0,
    }
}

fn board_count(pos: &Chess, color: Color, role: Role) -> u8 {
    pos.board()
        .pieces()
        .filter(|(_, piece)| piece.color == color && piece.role == role)
        .count() as u8
}

/// Reconstruct both sides' captured pieces from the position
///
/// A shortfall in a side's piece count means that many pieces of that type
/// were captured by the opponent.
pub fn captured_pieces(pos: &Chess) -> CapturedPieces {
    let mut captured = CapturedPieces::default();
    for &(role, initial) in &INITIAL_COUNTS {
        let missing_black = initial.saturating_sub(board_count(pos, Color::Black, role));
        for _ in 0..missing_black {
            captured.by_white.push(role);
        }
        let missing_white = initial.saturating_sub(board_count(pos, Color::White, role));
        for _ in 0..missing_white {
            captured.by_black.push(role);
        }
    }
    captured
}

/// Square to highlight when the side to move is in check
///
/// Checkmate gets the terminal rendering path instead of a highlight, so
/// it returns nothing here.
pub fn check_highlight(pos: &Chess) -> Option<Square> {
    if pos.is_check() && !pos.is_checkmate() {
        pos.board().king_of(pos.turn())
    } else {
        None
    }
}
