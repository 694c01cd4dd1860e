//! Proactive token refresh background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::{services::SessionManager, state::IdentityKey};

/// Default cadence of the proactive refresh, well inside a refresh token's
/// lifetime
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Background task that refreshes the access token every `period` so a long
/// idle session keeps a live refresh token.
///
/// Skips a cycle when nobody is signed in. The first refresh happens one
/// period after start.
pub async fn token_refresh_task(session: Arc<SessionManager>, period: Duration) {
    info!("Starting token refresh task, period={}s", period.as_secs());

    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        if !session.store().contains(IdentityKey::RefreshToken) {
            debug!("No refresh token stored, skipping proactive refresh");
            continue;
        }

        match session.refresh_token().await {
            Some(_) => info!("Proactive token refresh succeeded"),
            None => info!("Proactive token refresh failed, session ended"),
        }
    }
}
