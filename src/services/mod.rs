//! Client services module
//!
//! This module contains the controllers that talk to the backend: the session
//! manager, the game timer controller and the game actions.

pub mod auth;
pub mod game;
pub mod timer;

// Re-export main types
pub use auth::SessionManager;
pub use game::GameController;
pub use timer::GameTimerController;

use crate::{
    error::{ClientError, Result},
    state::{IdentityKey, IdentityStore},
};

/// The stored access token, required by every `game/*` call
pub(crate) fn access_token(store: &IdentityStore) -> Result<String> {
    store
        .get(IdentityKey::AccessToken)
        .ok_or_else(|| ClientError::AuthRejected("no access token stored".to_string()))
}
