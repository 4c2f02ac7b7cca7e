//! Terminal driver for the game-play client
//!
//! Plays a session from stdin: moves in coordinate notation (`e2e4`,
//! `e7e8q`) plus `draw`, `accept`, `decline`, `resign`, `retry`,
//! `history` and `quit`.

use anyhow::{Context, Result};
use aulachess::core::ClientConfig;
use aulachess::game::ai::{AiClient, AiDifficulty, AiOpponent};
use aulachess::game::input::InputOutcome;
use aulachess::game::session::{GameSession, SessionStatus};
use aulachess::networking::archive::{result_tag, ArchiveClient, FinishedGame};
use aulachess::networking::client::{Transport, TransportEvent, TransportSink};
use chrono::Utc;
use clap::{Parser, Subcommand};
use shakmaty::{Color, Role, Square};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aulachess", about = "Terminal client for the aulachess platform")]
struct Args {
    /// Path to a JSON config file
    #[arg(long, default_value = "client.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play against the platform's engine
    Ai {
        /// Engine strength: easy, medium or hard
        #[arg(long, default_value = "medium")]
        difficulty: String,
        /// Play black instead of white
        #[arg(long)]
        black: bool,
    },
    /// Queue for an online match
    Online {
        /// Rating used for pairing
        #[arg(long, default_value_t = 1200)]
        elo: u32,
        /// Session credential from the platform login
        #[arg(long)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    dotenv::dotenv().ok();

    let args = Args::parse();
    let config = ClientConfig::load_or_default(&args.config);

    match args.command {
        Command::Ai { difficulty, black } => run_ai(config, &difficulty, black).await,
        Command::Online { elo, token } => run_online(config, elo, &token).await,
    }
}

async fn run_ai(config: ClientConfig, difficulty: &str, play_black: bool) -> Result<()> {
    let difficulty: AiDifficulty = difficulty.parse().context("unknown difficulty")?;
    let local_color = if play_black { Color::Black } else { Color::White };

    let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
    let client = AiClient::new(config.ai_url.clone(), difficulty, config.ai_timeout())?;
    let opponent = AiOpponent::new(client, local_color.other(), events_tx);
    let handle = opponent.clone();

    let mut session = GameSession::start_local(local_color, Box::new(opponent));
    match local_color {
        Color::White => session.set_players("you", "engine"),
        Color::Black => session.set_players("engine", "you"),
    }
    println!(
        "Playing {} against the engine ({})",
        if play_black { "black" } else { "white" },
        difficulty.label()
    );

    game_loop(&mut session, &mut events_rx, Some(&handle), None).await?;
    handle.retire();
    record_finished_game(&config, &session).await;
    Ok(())
}

async fn run_online(config: ClientConfig, elo: u32, token: &str) -> Result<()> {
    let transport = Transport::new(config.reconnect_delay());
    let mut events_rx = transport.subscribe();
    transport.connect(&config.ws_url, token)?;

    let mut session = GameSession::connecting(Box::new(TransportSink::new(transport.clone())));
    println!("Connecting to {}...", config.ws_url);

    game_loop(&mut session, &mut events_rx, None, Some(elo)).await?;
    session.leave();
    transport.close();
    record_finished_game(&config, &session).await;
    Ok(())
}

async fn game_loop(
    session: &mut GameSession,
    events: &mut UnboundedReceiver<TransportEvent>,
    ai: Option<&AiOpponent>,
    queue_elo: Option<u32>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if matches!(event, TransportEvent::Up) {
                    if let Some(elo) = queue_elo {
                        if session.status() == SessionStatus::Connecting {
                            if session.find_match(elo) {
                                println!("Queued for a match (elo {elo})");
                            }
                        }
                    }
                }
                session.handle_event(event);
                print_update(session);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = line.trim();
                if command.is_empty() {
                    continue;
                }
                match command {
                    "quit" => break,
                    "resign" => report(session.resign()),
                    "draw" => report(session.offer_draw()),
                    "accept" => report(session.accept_draw()),
                    "decline" => report(session.decline_draw()),
                    "retry" => {
                        if let Some(ai) = ai {
                            ai.nudge();
                        } else {
                            println!("! retry is only for engine games");
                        }
                    }
                    "history" => println!("{}", session.history().movetext()),
                    mv => enter_move(session, mv),
                }
                print_update(session);
            }
        }
        if session.status() == SessionStatus::Ended {
            break;
        }
    }

    if let Some(reason) = session.end_reason() {
        println!(
            "Game over: {} ({})",
            reason.as_str(),
            result_tag(session.winner())
        );
    }
    Ok(())
}

fn enter_move(session: &mut GameSession, input: &str) {
    if input.len() < 4 || input.len() > 5 {
        println!("! enter moves like e2e4 or e7e8q");
        return;
    }
    let (Ok(from), Ok(to)) = (
        Square::from_ascii(input[0..2].as_bytes()),
        Square::from_ascii(input[2..4].as_bytes()),
    ) else {
        println!("! enter moves like e2e4 or e7e8q");
        return;
    };

    match session.drop_input(from, to) {
        Ok(InputOutcome::PromotionNeeded { .. }) => {
            let choice = input
                .as_bytes()
                .get(4)
                .and_then(|&c| Role::from_char(c as char));
            match choice {
                Some(role) => report(session.choose_promotion(role)),
                None => println!("promotion required: append q, r, b or n (e.g. {input}q)"),
            }
        }
        Ok(_) => {}
        Err(e) => println!("! {e}"),
    }
}

fn report<E: std::fmt::Display>(result: Result<(), E>) {
    if let Err(e) = result {
        println!("! {e}");
    }
}

fn print_update(session: &mut GameSession) {
    if let Some(error) = session.take_transient_error() {
        println!("! {error}");
    }
    if let Some(entry) = session.history().last() {
        let ply = session.history().len();
        let advantage = session.captured().material_advantage();
        let mover = match entry.by {
            Color::White => "white",
            Color::Black => "black",
        };
        let check = session
            .check_highlight()
            .map(|sq| format!(" (check on {sq})"))
            .unwrap_or_default();
        println!("[{ply}] {mover} {}  material {advantage:+}{check}", entry.mv.san);
    }
    if session.status() == SessionStatus::Active {
        let to_move = match session.turn_owner() {
            Color::White => "white",
            Color::Black => "black",
        };
        if session.turn_owner() == session.local_color() {
            println!("your move ({to_move})");
        }
    }
}

async fn record_finished_game(config: &ClientConfig, session: &GameSession) {
    let Some(reason) = session.end_reason() else {
        return;
    };
    let archive = match ArchiveClient::new(config.api_url.clone()) {
        Ok(archive) => archive,
        Err(e) => {
            warn!("[ARCHIVE] client unavailable: {e}");
            return;
        }
    };
    let record = FinishedGame {
        game_id: session.game_id().unwrap_or("unknown").to_string(),
        white_player: session.white_player().to_string(),
        black_player: session.black_player().to_string(),
        moves: session.history().movetext(),
        result: result_tag(session.winner()).to_string(),
        reason: reason.as_str().to_string(),
        ended_at: Utc::now(),
    };
    if let Err(e) = archive.record_game(&record).await {
        warn!("[ARCHIVE] failed to record game: {e}");
    }
}
