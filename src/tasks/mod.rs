//! Background tasks module
//!
//! This module contains the recurring loops that run alongside the client:
//! the proactive token refresh and the per-second game timer.

pub mod game_timer;
pub mod token_refresh;

use std::future::Future;
use tokio::task::JoinHandle;

// Re-export main functions
pub use game_timer::{game_timer_task, resume_on_session_change_task};
pub use token_refresh::token_refresh_task;

/// A spawned task that is aborted when its owner drops it.
///
/// Views hold one of these per recurring loop so that tearing the view down
/// also revokes the loop.
#[derive(Debug)]
pub struct ScopedTask(JoinHandle<()>);

impl ScopedTask {
    /// Spawn `future` onto the current runtime
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self(tokio::spawn(future))
    }

    /// Whether the task has stopped on its own
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl Drop for ScopedTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}
