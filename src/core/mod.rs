//! Core module - configuration and shared infrastructure
//!
//! Holds the pieces every other module leans on: the client configuration
//! (server endpoints, engine endpoint, timeouts) and the core error type.
//! Configuration is environment-driven with serde-backed file loading, so a
//! deployment can ship a `client.json` or override individual values through
//! `AULACHESS_*` variables.

pub mod config;
pub mod error;

pub use config::ClientConfig;
pub use error::{CoreError, CoreResult};
