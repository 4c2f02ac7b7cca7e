pub mod core;
pub mod game;
pub mod networking;

pub use game::session::GameSession;
