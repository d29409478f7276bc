//! Quest scripting layer for the game server.
//!
//! The host engine owns players, parties and inventories; this crate owns
//! quest definitions, quest state transitions and drop arbitration, and
//! talks to the host through [`quest::QuestHost`].

pub mod config;
pub mod error;
pub mod quest;
pub mod session;

pub use config::ServerConfig;
pub use error::QuestError;
pub use quest::QuestRegistry;
pub use session::PlayerSessions;
