//! Wire protocol for the game server connection
//!
//! JSON objects discriminated by a `type` field in snake_case, mirroring
//! what the backend speaks. Squares travel as coordinate strings (`"e2"`),
//! promotions as a single lowercase piece letter (`"q"`), and snapshot
//! move lists as coordinate notation from the starting position.

use serde::{Deserialize, Serialize};
use shakmaty::Color;

/// Player color on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireColor {
    White,
    Black,
}

impl From<Color> for WireColor {
    fn from(c: Color) -> Self {
        match c {
            Color::White => Self::White,
            Color::Black => Self::Black,
        }
    }
}

impl From<WireColor> for Color {
    fn from(c: WireColor) -> Self {
        match c {
            WireColor::White => Self::White,
            WireColor::Black => Self::Black,
        }
    }
}

/// Game status reported alongside an outbound move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireGameStatus {
    Active,
    Checkmate,
    Stalemate,
    Draw,
}

/// Reason attached to a `game_end` message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireEndReason {
    Checkmate,
    Resignation,
    Draw,
    MutualAgreement,
    OpponentDisconnected,
    Timeout,
}

/// Client → Server messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinGame {
        game_id: String,
    },
    Move {
        game_id: String,
        from: String,
        to: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        promotion: Option<String>,
        san: String,
        fen: String,
        game_status: WireGameStatus,
    },
    Resign {
        game_id: String,
    },
    DrawOffer {
        game_id: String,
    },
    AcceptDraw {
        game_id: String,
    },
    DeclineDraw {
        game_id: String,
    },
    FindMatch {
        elo: u32,
    },
    CancelMatch,
}

/// Server → Client messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    GameStart {
        game_id: String,
        white_player: String,
        black_player: String,
        your_color: WireColor,
    },
    Move {
        from: String,
        to: String,
        #[serde(default)]
        promotion: Option<String>,
        #[serde(default)]
        san: Option<String>,
        current_turn: WireColor,
    },
    /// Authoritative full-state snapshot; always overrides local state
    GameState {
        fen: String,
        /// Coordinate-notation moves from the starting position
        #[serde(default)]
        moves: Vec<String>,
    },
    GameEnd {
        reason: WireEndReason,
        #[serde(default)]
        winner: Option<WireColor>,
        #[serde(default)]
        resigned_by: Option<WireColor>,
    },
    DrawOffer {
        from: WireColor,
    },
    DrawDeclined,
    OpponentDisconnected,
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_game_serialization() {
        let msg = ClientMessage::JoinGame {
            game_id: "g-42".to_string(),
        };
        let json = serde_json::to_string(&msg).expect("Should serialize");
        assert_eq!(json, r#"{"type":"join_game","game_id":"g-42"}"#);

        let decoded: ClientMessage = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_move_serialization_omits_absent_promotion() {
        let msg = ClientMessage::Move {
            game_id: "g-1".to_string(),
            from: "e2".to_string(),
            to: "e4".to_string(),
            promotion: None,
            san: "e4".to_string(),
            fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".to_string(),
            game_status: WireGameStatus::Active,
        };
        let json = serde_json::to_string(&msg).expect("Should serialize");
        assert!(!json.contains("promotion"));
        assert!(json.contains(r#""game_status":"active""#));

        let decoded: ClientMessage = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_move_with_promotion() {
        let msg = ClientMessage::Move {
            game_id: "g-1".to_string(),
            from: "e7".to_string(),
            to: "e8".to_string(),
            promotion: Some("q".to_string()),
            san: "e8=Q+".to_string(),
            fen: "4Q3/8/8/8/8/8/8/k3K3 b - - 0 1".to_string(),
            game_status: WireGameStatus::Active,
        };
        let json = serde_json::to_string(&msg).expect("Should serialize");
        assert!(json.contains(r#""promotion":"q""#));
    }

    #[test]
    fn test_find_and_cancel_match() {
        let find = serde_json::to_string(&ClientMessage::FindMatch { elo: 1350 }).unwrap();
        assert_eq!(find, r#"{"type":"find_match","elo":1350}"#);

        let cancel = serde_json::to_string(&ClientMessage::CancelMatch).unwrap();
        assert_eq!(cancel, r#"{"type":"cancel_match"}"#);
    }

    #[test]
    fn test_game_start_deserialization() {
        let json = r#"{"type":"game_start","game_id":"g-7","white_player":"ana","black_player":"luis","your_color":"black"}"#;
        let msg: ServerMessage = serde_json::from_str(json).expect("Should deserialize");
        match msg {
            ServerMessage::GameStart {
                game_id,
                your_color,
                ..
            } => {
                assert_eq!(game_id, "g-7");
                assert_eq!(your_color, WireColor::Black);
            }
            _ => panic!("Wrong message type after deserialization"),
        }
    }

    #[test]
    fn test_server_move_without_optional_fields() {
        let json = r#"{"type":"move","from":"e7","to":"e5","current_turn":"white"}"#;
        let msg: ServerMessage = serde_json::from_str(json).expect("Should deserialize");
        match msg {
            ServerMessage::Move {
                from,
                to,
                promotion,
                san,
                current_turn,
            } => {
                assert_eq!(from, "e7");
                assert_eq!(to, "e5");
                assert!(promotion.is_none());
                assert!(san.is_none());
                assert_eq!(current_turn, WireColor::White);
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_game_state_snapshot() {
        let json = r#"{"type":"game_state","fen":"rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1","moves":["e2e4"]}"#;
        let msg: ServerMessage = serde_json::from_str(json).expect("Should deserialize");
        match msg {
            ServerMessage::GameState { fen, moves } => {
                assert!(fen.starts_with("rnbqkbnr"));
                assert_eq!(moves, vec!["e2e4"]);
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_game_end_reasons() {
        let json = r#"{"type":"game_end","reason":"mutual_agreement"}"#;
        let msg: ServerMessage = serde_json::from_str(json).expect("Should deserialize");
        assert_eq!(
            msg,
            ServerMessage::GameEnd {
                reason: WireEndReason::MutualAgreement,
                winner: None,
                resigned_by: None,
            }
        );

        let json = r#"{"type":"game_end","reason":"resignation","winner":"white","resigned_by":"black"}"#;
        let msg: ServerMessage = serde_json::from_str(json).expect("Should deserialize");
        match msg {
            ServerMessage::GameEnd {
                reason, resigned_by, ..
            } => {
                assert_eq!(reason, WireEndReason::Resignation);
                assert_eq!(resigned_by, Some(WireColor::Black));
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_unknown_message_type_is_an_error() {
        let json = r#"{"type":"telemetry","payload":1}"#;
        let result: Result<ServerMessage, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_wire_color_round_trip() {
        let white: WireColor = Color::White.into();
        let json = serde_json::to_string(&white).unwrap();
        assert_eq!(json, r#""white""#);
        let back: WireColor = serde_json::from_str(&json).unwrap();
        assert_eq!(Color::from(back), Color::White);
    }
}
