//! Mastermind Client - A session-managed terminal client for the Mastermind game
//!
//! This library provides the client-side session core: the JWT login,
//! verify and refresh lifecycle, the per-game timer with pause and resume
//! reconciliation, and the game actions built on top of them.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::ApiClient;
pub use config::Config;
pub use error::ClientError;
pub use services::{GameController, GameTimerController, SessionManager};
pub use state::{IdentityStore, SessionState};
pub use utils::signals::shutdown_signal;
