//! Move history tracking
//!
//! Maintains the complete chronological record of all moves made during a
//! session. Append-only: insertion order is chronological order, and the
//! list is never reordered or truncated except on a full reset (new
//! session or adoption of a remote snapshot).
//!
//! The history powers the move list UI, movetext export for game archival,
//! and the coordinate-notation transcript sent with engine requests.

use crate::game::rules::PlayedMove;
use shakmaty::Color;

/// One half-move as it entered the record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub mv: PlayedMove,
    /// Which player produced the move
    pub by: Color,
}

/// Complete move history for the current session
///
/// Index 0 = white's first move, index 1 = black's response, and so on.
#[derive(Debug, Default)]
pub struct MoveHistory {
    entries: Vec<HistoryEntry>,
}

impl MoveHistory {
    /// Append a move to the record
    ///
    /// Called after a move is validated and applied, never before.
    pub fn record(&mut self, mv: PlayedMove, by: Color) {
        self.entries.push(HistoryEntry { mv, by });
    }

    /// The most recent move, if any
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Number of half-moves (ply) made
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a move by ply index
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryEntry> {
        self.entries.iter()
    }

    /// Clear the record (new session or snapshot adoption)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replace the record wholesale with a replayed snapshot history
    ///
    /// The first entry is attributed to the given color, alternating from
    /// there; snapshots always replay from the starting position so this
    /// is white.
    pub fn reset_from(&mut self, moves: Vec<PlayedMove>, first: Color) {
        self.entries = moves
            .into_iter()
            .enumerate()
            .map(|(i, mv)| HistoryEntry {
                mv,
                by: if i % 2 == 0 { first } else { first.other() },
            })
            .collect();
    }

    /// Coordinate-notation transcript, one entry per ply
    pub fn uci_moves(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.mv.uci()).collect()
    }

    /// Numbered movetext, e.g. `1. e4 e5 2. Nf3`
    ///
    /// Suitable for the archival endpoint and for display in the move list.
    pub fn movetext(&self) -> String {
        let mut out = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if i % 2 == 0 {
                if i > 0 {
                    out.push(' ');
                }
                out.push_str(&format!("{}. ", i / 2 + 1));
            } else {
                out.push(' ');
            }
            out.push_str(&entry.mv.san);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::{Role, Square};

    fn played(from: &str, to: &str, role: Role, san: &str) -> PlayedMove {
        PlayedMove {
            from: Square::from_ascii(from.as_bytes()).unwrap(),
            to: Square::from_ascii(to.as_bytes()).unwrap(),
            role,
            promotion: None,
            capture: None,
            san: san.to_string(),
        }
    }

    #[test]
    fn test_history_starts_empty() {
        let history = MoveHistory::default();
        assert!(history.is_empty());
        assert_eq!(history.len(), 0);
        assert!(history.last().is_none());
    }

    #[test]
    fn test_record_appends_in_order() {
        let mut history = MoveHistory::default();
        history.record(played("e2", "e4", Role::Pawn, "e4"), Color::White);
        history.record(played("e7", "e5", Role::Pawn, "e5"), Color::Black);
        history.record(played("g1", "f3", Role::Knight, "Nf3"), Color::White);

        assert_eq!(history.len(), 3);
        assert_eq!(history.get(0).unwrap().mv.san, "e4");
        assert_eq!(history.get(1).unwrap().by, Color::Black);
        assert_eq!(history.last().unwrap().mv.san, "Nf3");
        assert!(history.get(3).is_none());
    }

    #[test]
    fn test_clear_removes_all_moves() {
        let mut history = MoveHistory::default();
        history.record(played("e2", "e4", Role::Pawn, "e4"), Color::White);
        history.clear();
        assert!(history.is_empty());
        assert!(history.last().is_none());
    }

    #[test]
    fn test_reset_from_alternates_colors() {
        let mut history = MoveHistory::default();
        history.record(played("a2", "a3", Role::Pawn, "a3"), Color::White);

        history.reset_from(
            vec![
                played("e2", "e4", Role::Pawn, "e4"),
                played("e7", "e5", Role::Pawn, "e5"),
                played("g1", "f3", Role::Knight, "Nf3"),
            ],
            Color::White,
        );

        assert_eq!(history.len(), 3);
        assert_eq!(history.get(0).unwrap().by, Color::White);
        assert_eq!(history.get(1).unwrap().by, Color::Black);
        assert_eq!(history.get(2).unwrap().by, Color::White);
    }

    #[test]
    fn test_movetext_numbering() {
        let mut history = MoveHistory::default();
        history.record(played("e2", "e4", Role::Pawn, "e4"), Color::White);
        history.record(played("e7", "e5", Role::Pawn, "e5"), Color::Black);
        history.record(played("g1", "f3", Role::Knight, "Nf3"), Color::White);

        assert_eq!(history.movetext(), "1. e4 e5 2. Nf3");
    }

    #[test]
    fn test_uci_transcript() {
        let mut history = MoveHistory::default();
        history.record(played("e2", "e4", Role::Pawn, "e4"), Color::White);
        let mut promo = played("e7", "e8", Role::Pawn, "e8=Q");
        promo.promotion = Some(Role::Queen);
        history.record(promo, Color::White);

        assert_eq!(history.uci_moves(), vec!["e2e4", "e7e8q"]);
    }
}
