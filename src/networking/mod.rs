//! Networking module - wire protocol and transport
//!
//! - `protocol` - the JSON messages exchanged with the game server
//! - `client` - the WebSocket transport channel (connect/reconnect/send,
//!   typed inbound events, single-subscriber delivery)
//! - `archive` - HTTP client for recording finished games

pub mod archive;
pub mod client;
pub mod protocol;

pub use client::{Transport, TransportEvent};
pub use protocol::{ClientMessage, ServerMessage};
