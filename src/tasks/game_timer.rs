//! Game timer background tasks

use std::{sync::Arc, time::Duration};
use chrono::Utc;
use tokio::{
    sync::watch,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{
    services::GameTimerController,
    state::{GameStatus, SessionState},
};

/// Background task that recomputes the elapsed time once per second.
///
/// Ticks only while a start time is known and the game is not won or lost.
/// A change of either rebuilds the ticker from scratch; each tick measures
/// against the stored start time, so nothing drifts across restarts. Ends
/// when either channel's sender goes away.
pub async fn game_timer_task(timer: Arc<GameTimerController>, mut status_rx: watch::Receiver<GameStatus>) {
    info!("Starting game timer task");

    let mut timer_rx = timer.subscribe();

    loop {
        let start_time = timer_rx.borrow_and_update().start_time;
        let status = *status_rx.borrow_and_update();

        if start_time.is_none() || status.is_terminal() {
            debug!("Game timer idle: start_time={:?}, status={:?}", start_time, status);
            tokio::select! {
                changed = status_rx.changed() => if changed.is_err() { break },
                changed = timer_rx.changed() => if changed.is_err() { break },
            }
            continue;
        }

        debug!("Game timer running from {:?}", start_time);
        let mut ticker = interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    timer.tick(Utc::now());
                }

                changed = status_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if status_rx.borrow().is_terminal() {
                        info!("Game finished, stopping game timer");
                        break;
                    }
                }

                changed = timer_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    // Our own ticks only change the display, not the start
                    if timer_rx.borrow_and_update().start_time != start_time {
                        debug!("Start time changed, restarting game timer");
                        break;
                    }
                }
            }
        }
    }

    debug!("Game timer task finished");
}

/// Background task that re-runs resume reconciliation whenever the session
/// state is republished while authenticated: after a login or a token refresh.
pub async fn resume_on_session_change_task(
    timer: Arc<GameTimerController>,
    mut session_rx: watch::Receiver<SessionState>,
) {
    while session_rx.changed().await.is_ok() {
        let authenticated = session_rx.borrow_and_update().is_authenticated;
        if authenticated {
            debug!("Session changed, reconciling game timer");
            if let Err(e) = timer.reconcile_resume().await {
                debug!("Resume reconciliation left the timer as it was: {}", e);
            }
        }
    }
}
