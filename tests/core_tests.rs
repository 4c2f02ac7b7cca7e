//! Integration tests for configuration and the pure game helpers
//!
//! Exercises the public API the way embedding code does: config loading
//! with layered overrides, the rules adapter's replay/FEN agreement, and
//! derived captured-piece state over whole games.

use aulachess::core::ClientConfig;
use aulachess::game::derived;
use aulachess::game::rules;
use shakmaty::{Color, Position, Role};
use std::time::Duration;

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_defaults_are_usable_offline() {
    let config = ClientConfig::default();
    assert!(config.ws_url.starts_with("ws://"));
    assert!(config.api_url.starts_with("http://"));
    assert_eq!(config.reconnect_delay(), Duration::from_secs(3));
    assert_eq!(config.ai_timeout(), Duration::from_secs(10));
}

#[test]
fn test_config_file_round_trip() {
    let config = ClientConfig {
        ws_url: "wss://play.example.org/ws".to_string(),
        difficulty: "hard".to_string(),
        ..ClientConfig::default()
    };

    let path = std::env::temp_dir().join("aulachess-config-test.json");
    std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

    let loaded = ClientConfig::load(&path).unwrap();
    assert_eq!(loaded.ws_url, "wss://play.example.org/ws");
    assert_eq!(loaded.difficulty, "hard");
    assert_eq!(loaded.ai_timeout_secs, 10);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    let path = std::env::temp_dir().join("aulachess-no-such-config.json");
    std::fs::remove_file(&path).ok();
    let config = ClientConfig::load_or_default(&path);
    assert_eq!(config.reconnect_delay_secs, 3);
}

// ============================================================================
// Rules Adapter: replay / FEN agreement
// ============================================================================

#[test]
fn test_replaying_moves_equals_bulk_fen_load() {
    //! For a sequence of legal moves, replaying them one `apply` at a time
    //! must land on the same position as loading the final FEN directly.
    let games: [&[&str]; 3] = [
        &["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6"],
        &["d2d4", "d7d5", "c2c4", "d5c4", "e2e3", "b7b5"],
        &["e2e4", "c7c5", "g1f3", "d7d6", "d2d4", "c5d4", "f3d4"],
    ];

    for game in games {
        let moves: Vec<String> = game.iter().map(|s| s.to_string()).collect();
        let (replayed, played) = rules::replay_uci(&moves).unwrap();
        assert_eq!(played.len(), moves.len());

        let fen = rules::to_fen(&replayed);
        let bulk = rules::parse_fen(&fen).unwrap();
        assert_eq!(rules::to_fen(&bulk), fen);
        assert_eq!(bulk.turn(), replayed.turn());
        assert_eq!(
            bulk.legal_moves().len(),
            replayed.legal_moves().len(),
            "same position must offer the same moves"
        );
    }
}

#[test]
fn test_replay_rejects_illegal_continuation() {
    let moves: Vec<String> = ["e2e4", "e2e4"].iter().map(|s| s.to_string()).collect();
    assert!(rules::replay_uci(&moves).is_err());
}

// ============================================================================
// Derived State over whole games
// ============================================================================

#[test]
fn test_captures_accumulate_through_a_game() {
    // White wins two pawns (d5, c6), black recaptures one (c6)
    let line = [
        "e2e4", "d7d5", "e4d5", "g8f6", "c2c4", "c7c6", "d5c6", "b8c6",
    ];
    let moves: Vec<String> = line.iter().map(|s| s.to_string()).collect();
    let (pos, _) = rules::replay_uci(&moves).unwrap();

    let captured = derived::captured_pieces(&pos);
    assert_eq!(captured.count(Color::White, Role::Pawn), 2);
    assert_eq!(captured.count(Color::Black, Role::Pawn), 1);
    assert_eq!(captured.material_advantage(), 1);
}

#[test]
fn test_captured_sets_empty_for_fresh_games() {
    let captured = derived::captured_pieces(&rules::starting_position());
    assert!(captured.is_empty());
    assert_eq!(captured.material_advantage(), 0);
    assert_eq!(derived::check_highlight(&rules::starting_position()), None);
}

#[test]
fn test_check_highlight_follows_the_king() {
    // A rook check against a lone king on e8
    let pos = rules::parse_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
    let m = rules::parse_uci(&pos, "a1a8").unwrap();
    let checked = rules::apply(&pos, m).unwrap();

    let highlight = derived::check_highlight(&checked);
    assert!(highlight.is_some());
    assert_eq!(highlight.unwrap().to_string(), "e8");
}
