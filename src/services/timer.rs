//! Game timer controller: start-time sync, pause markers and resume
//! reconciliation

use std::sync::Arc;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    api::ApiClient,
    error::Result,
    state::{GameTimerState, IdentityKey, IdentityStore},
};
use super::access_token;

/// Tracks elapsed time of the active game against the backend's start time.
///
/// Backend failures are logged and returned but never clear local state; the
/// next reconciliation retries them.
#[derive(Debug)]
pub struct GameTimerController {
    api: ApiClient,
    store: Arc<IdentityStore>,
    timer_tx: watch::Sender<GameTimerState>,
}

impl GameTimerController {
    pub fn new(api: ApiClient, store: Arc<IdentityStore>) -> Self {
        let (timer_tx, _) = watch::channel(GameTimerState::new());
        Self { api, store, timer_tx }
    }

    /// Watch the timer display
    pub fn subscribe(&self) -> watch::Receiver<GameTimerState> {
        self.timer_tx.subscribe()
    }

    /// Current timer display
    pub fn state(&self) -> GameTimerState {
        self.timer_tx.borrow().clone()
    }

    /// Replace the start time the tick loop measures from
    pub fn set_start_time(&self, start_time: Option<DateTime<Utc>>) {
        self.timer_tx.send_if_modified(|state| {
            if state.start_time == start_time {
                return false;
            }
            state.start_time = start_time;
            true
        });
    }

    /// Fetch the authoritative start time of the current game.
    ///
    /// On failure the previous start time is kept.
    pub async fn fetch_start_time(&self) -> Result<()> {
        let fetched = match access_token(&self.store) {
            Ok(token) => self.api.start_time(&token).await,
            Err(e) => Err(e),
        };

        match fetched {
            Ok(start_time) => {
                debug!("Game started at {}", start_time);
                self.set_start_time(Some(start_time));
                Ok(())
            }
            Err(e) => {
                warn!("Unable to fetch start time: {}", e);
                Err(e)
            }
        }
    }

    /// Recompute the elapsed time against `now`
    pub fn tick(&self, now: DateTime<Utc>) {
        self.timer_tx.send_if_modified(|state| {
            let before = state.elapsed_time.clone();
            state.tick_at(now) && state.elapsed_time != before
        });
    }

    /// Stamp the pause marker.
    ///
    /// Only writes the local store, so it is safe to call while the process
    /// is shutting down.
    pub fn handle_pause(&self) {
        let now = Utc::now();
        self.store.set_pause_time(now);
        info!("Game paused at {}", now.to_rfc3339());
    }

    /// Settle a pending pause with the backend, then re-sync the start time.
    ///
    /// The marker is cleared only once the backend confirms the resume. The
    /// start time is fetched whether or not a pause was pending.
    pub async fn reconcile_resume(&self) -> Result<()> {
        if self.store.contains(IdentityKey::PauseTime) {
            let resumed = match access_token(&self.store) {
                Ok(token) => self.api.resume_game(&token).await,
                Err(e) => Err(e),
            };
            match resumed {
                Ok(()) => {
                    self.store.remove(IdentityKey::PauseTime);
                    info!("Game resumed, pause marker cleared");
                }
                Err(e) => warn!("Unable to resume game: {}", e),
            }
        }

        self.fetch_start_time().await
    }
}
