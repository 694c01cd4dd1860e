//! State management module
//!
//! This module contains the client-side state: Stored Identity, the session
//! flags, the game timer display and the game board.

pub mod game_state;
pub mod identity;
pub mod session_state;
pub mod timer_state;

// Re-export main types
pub use game_state::{GameBoard, GameStatus};
pub use identity::{IdentityKey, IdentityStore};
pub use session_state::{Access, AuthPhase, SessionState};
pub use timer_state::{convert_seconds, GameTimerState};
