//! Networking Tests
//!
//! Tests for wire-protocol serialization, transport channel semantics that
//! hold without a live server, and the engine opponent's failure paths.

use aulachess::game::ai::{AiClient, AiDifficulty, AiOpponent};
use aulachess::game::session::MoveSink;
use aulachess::networking::client::{
    LinkState, Transport, TransportError, TransportEvent, AUTH_REJECTED_CLOSE,
};
use aulachess::networking::protocol::{
    ClientMessage, ServerMessage, WireColor, WireGameStatus,
};
use shakmaty::Color;
use std::time::Duration;

// ============================================================================
// Protocol
// ============================================================================

#[test]
fn test_outbound_messages_use_type_discriminant() {
    let cases = [
        (
            serde_json::to_value(ClientMessage::JoinGame {
                game_id: "g".into(),
            })
            .unwrap(),
            "join_game",
        ),
        (
            serde_json::to_value(ClientMessage::Resign {
                game_id: "g".into(),
            })
            .unwrap(),
            "resign",
        ),
        (
            serde_json::to_value(ClientMessage::DrawOffer {
                game_id: "g".into(),
            })
            .unwrap(),
            "draw_offer",
        ),
        (
            serde_json::to_value(ClientMessage::AcceptDraw {
                game_id: "g".into(),
            })
            .unwrap(),
            "accept_draw",
        ),
        (
            serde_json::to_value(ClientMessage::DeclineDraw {
                game_id: "g".into(),
            })
            .unwrap(),
            "decline_draw",
        ),
        (
            serde_json::to_value(ClientMessage::FindMatch { elo: 1500 }).unwrap(),
            "find_match",
        ),
        (
            serde_json::to_value(ClientMessage::CancelMatch).unwrap(),
            "cancel_match",
        ),
    ];
    for (value, expected) in cases {
        assert_eq!(value["type"], expected);
    }
}

#[test]
fn test_inbound_round_trips() {
    let messages = [
        ServerMessage::GameStart {
            game_id: "g-1".into(),
            white_player: "ana".into(),
            black_player: "luis".into(),
            your_color: WireColor::White,
        },
        ServerMessage::Move {
            from: "g8".into(),
            to: "f6".into(),
            promotion: None,
            san: Some("Nf6".into()),
            current_turn: WireColor::White,
        },
        ServerMessage::GameState {
            fen: "8/8/8/8/8/8/8/K6k w - - 0 1".into(),
            moves: vec!["e2e4".into(), "e7e5".into()],
        },
        ServerMessage::DrawDeclined,
        ServerMessage::OpponentDisconnected,
        ServerMessage::Error {
            message: "room full".into(),
        },
    ];
    for msg in messages {
        let json = serde_json::to_string(&msg).expect("Should serialize");
        let decoded: ServerMessage = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(decoded, msg);
    }
}

#[test]
fn test_full_move_message_shape() {
    let msg = ClientMessage::Move {
        game_id: "g-2".into(),
        from: "e7".into(),
        to: "e8".into(),
        promotion: Some("q".into()),
        san: "e8=Q#".into(),
        fen: "4Q3/8/8/8/8/8/5K2/7k b - - 0 9".into(),
        game_status: WireGameStatus::Checkmate,
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], "move");
    assert_eq!(value["from"], "e7");
    assert_eq!(value["to"], "e8");
    assert_eq!(value["promotion"], "q");
    assert_eq!(value["game_status"], "checkmate");
    assert!(value["fen"].as_str().unwrap().contains("4Q3"));
}

// ============================================================================
// Transport Channel
// ============================================================================

#[test]
fn test_auth_rejected_close_code_is_private_range() {
    // 4000-4999 is the private-use range; 4401 mirrors HTTP 401
    assert_eq!(AUTH_REJECTED_CLOSE, 4401);
}

#[test]
fn test_send_is_false_not_a_panic_when_disconnected() {
    let transport = Transport::default();
    assert_eq!(transport.state(), LinkState::Disconnected);
    assert!(!transport.send(&ClientMessage::FindMatch { elo: 1000 }));
}

#[test]
fn test_second_subscriber_detaches_first() {
    let transport = Transport::default();
    let mut first = transport.subscribe();
    let _second = transport.subscribe();

    match first.try_recv() {
        Err(tokio::sync::mpsc::error::TryRecvError::Disconnected) => {}
        other => panic!("stale subscriber must be cut off, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_endpoint_is_rejected_synchronously() {
    let transport = Transport::default();
    let result = transport.connect("not a uri at all", "tok");
    assert!(matches!(result, Err(TransportError::InvalidEndpoint(_))));
    assert_eq!(transport.state(), LinkState::Disconnected);
}

#[tokio::test]
async fn test_intentional_close_suppresses_retry() {
    let transport = Transport::new(Duration::from_millis(20));
    transport.connect("ws://127.0.0.1:1/ws", "tok").unwrap();
    transport.close();

    assert_eq!(transport.state(), LinkState::Closed);
    // Give any stale retry loop time to run; the state must not flip back
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.state(), LinkState::Closed);
    assert!(!transport.send(&ClientMessage::CancelMatch));
}

#[tokio::test]
async fn test_reconnect_with_same_target_is_noop() {
    let transport = Transport::new(Duration::from_millis(50));
    transport.connect("ws://127.0.0.1:1/ws", "tok").unwrap();
    // Identical endpoint+credential while connecting: accepted silently
    transport.connect("ws://127.0.0.1:1/ws", "tok").unwrap();
    // Different credential tears down and reconnects
    transport.connect("ws://127.0.0.1:1/ws", "tok2").unwrap();
    transport.close();
}

// ============================================================================
// Engine Opponent
// ============================================================================

#[tokio::test]
async fn test_engine_failure_surfaces_as_transient_error_event() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    // Nothing listens on port 1; the request fails fast
    let client = AiClient::new(
        "http://127.0.0.1:1/ai/move",
        AiDifficulty::Medium,
        Duration::from_secs(2),
    )
    .unwrap();
    let mut sink = AiOpponent::new(client, Color::Black, tx);

    sink.dispatch(ClientMessage::Move {
        game_id: "g".into(),
        from: "e2".into(),
        to: "e4".into(),
        promotion: None,
        san: "e4".into(),
        fen: "fen".into(),
        game_status: WireGameStatus::Active,
    });

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event must arrive")
        .expect("channel open");
    match event {
        TransportEvent::Message(ServerMessage::Error { message }) => {
            assert!(message.contains("engine"), "got: {message}");
        }
        other => panic!("expected transient error event, got {other:?}"),
    }
}

#[tokio::test]
async fn test_retired_opponent_drops_late_replies() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let client = AiClient::new(
        "http://127.0.0.1:1/ai/move",
        AiDifficulty::Medium,
        Duration::from_secs(2),
    )
    .unwrap();
    let mut sink = AiOpponent::new(client, Color::Black, tx);

    sink.dispatch(ClientMessage::Move {
        game_id: "g".into(),
        from: "e2".into(),
        to: "e4".into(),
        promotion: None,
        san: "e4".into(),
        fen: "fen".into(),
        game_status: WireGameStatus::Active,
    });
    // Player starts a new game before the reply lands
    sink.retire();

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(rx.try_recv().is_err(), "stale reply must be discarded");
}

#[tokio::test]
async fn test_draw_offer_to_engine_is_declined() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let client = AiClient::new(
        "http://127.0.0.1:1/ai/move",
        AiDifficulty::Medium,
        Duration::from_secs(2),
    )
    .unwrap();
    let mut sink = AiOpponent::new(client, Color::Black, tx);

    sink.dispatch(ClientMessage::DrawOffer { game_id: "g".into() });
    match rx.recv().await {
        Some(TransportEvent::Message(ServerMessage::DrawDeclined)) => {}
        other => panic!("engine declines draws, got {other:?}"),
    }
}
