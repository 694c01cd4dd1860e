//! Session manager: credential exchange, token lifecycle and the
//! authentication state derived from them

use std::sync::Arc;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    api::{ApiClient, Credentials, TokenPair},
    error::{ClientError, Result},
    state::{AuthPhase, IdentityKey, IdentityStore, SessionState},
    utils::jwt,
};

/// Message shown when a sign-in is refused, whatever the cause
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid username or password";

/// Owns the token lifecycle and publishes [`SessionState`].
///
/// The state is the single process-wide authentication state; consumers read
/// it through [`SessionManager::subscribe`] and never write it.
#[derive(Debug)]
pub struct SessionManager {
    api: ApiClient,
    store: Arc<IdentityStore>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Create a manager in the `Unchecked` phase
    pub fn new(api: ApiClient, store: Arc<IdentityStore>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::new());
        Self { api, store, state_tx }
    }

    /// Watch the authentication state
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Current authentication state
    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    /// The identity store this manager writes
    pub fn store(&self) -> &Arc<IdentityStore> {
        &self.store
    }

    /// Create a new account.
    ///
    /// A refused registration comes back as [`ClientError::Validation`] with
    /// the first field message; anything else is a generic failure.
    pub async fn register(&self, credentials: &Credentials) -> Result<()> {
        match self.api.register(credentials).await {
            Ok(()) => {
                info!("Registered player {}", credentials.username);
                Ok(())
            }
            Err(e) => {
                warn!("Error trying to register {}: {}", credentials.username, e);
                Err(e)
            }
        }
    }

    /// Exchange credentials for a fresh token pair.
    ///
    /// `None` means the credentials were not accepted; callers must not retry.
    pub async fn get_token(&self, credentials: &Credentials) -> Option<TokenPair> {
        match self.api.create_token(credentials).await {
            Ok(tokens) => Some(tokens),
            Err(e) => {
                warn!("Error getting token for {}: {}", credentials.username, e);
                None
            }
        }
    }

    /// Store the identity and token pair and mark the session authenticated.
    ///
    /// A pause marker left by a different player is dropped first.
    pub fn login(&self, player_name: &str, access_token: &str, refresh_token: &str) {
        let previous = self.store.get(IdentityKey::PreviousPlayer);
        if previous.as_deref() != Some(player_name) {
            debug!("Player changed from {:?}, dropping pause marker", previous);
            self.store.remove(IdentityKey::PauseTime);
        }

        self.store.set(IdentityKey::Player, player_name);
        self.store.set(IdentityKey::AccessToken, access_token);
        self.store.set(IdentityKey::RefreshToken, refresh_token);

        self.state_tx.send_modify(|state| {
            state.loading = false;
            state.set_authenticated(true);
        });
        info!("Logged in as {}", player_name);
    }

    /// Clear the identity and mark the session unauthenticated.
    ///
    /// The player is remembered as `PreviousPlayer` and a pause marker is
    /// stamped, so a logout reconciles like any other disconnect. The stored
    /// player is used when `player_name` is not given.
    pub fn logout(&self, player_name: Option<&str>) {
        let player = player_name
            .map(str::to_string)
            .or_else(|| self.store.get(IdentityKey::Player));
        if let Some(player) = &player {
            self.store.set(IdentityKey::PreviousPlayer, player.as_str());
        }
        self.store.set_pause_time(Utc::now());

        self.store.remove(IdentityKey::Player);
        self.store.remove(IdentityKey::AccessToken);
        self.store.remove(IdentityKey::RefreshToken);

        self.state_tx.send_modify(|state| state.set_authenticated(false));
        info!("Logged out {}", player.as_deref().unwrap_or("unknown player"));
    }

    /// Ask the backend whether `token` is still accepted.
    ///
    /// Any failure counts as invalid.
    pub async fn is_token_valid(&self, token: &str) -> bool {
        match self.api.verify_token(token).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Unable to verify token: {}", e);
                false
            }
        }
    }

    /// Local expiry check. Missing and undecodable tokens count as expired.
    pub fn is_token_expired(&self, token: Option<&str>) -> bool {
        match token.map(jwt::is_expired) {
            Some(Ok(expired)) => expired,
            Some(Err(e)) => {
                debug!("Treating undecodable token as expired: {}", e);
                true
            }
            None => true,
        }
    }

    /// Trade the stored refresh token for a new access token.
    ///
    /// Logs the player out when no usable refresh token is stored or the
    /// backend refuses it.
    pub async fn refresh_token(&self) -> Option<String> {
        let refresh = self.store.get(IdentityKey::RefreshToken);
        let Some(refresh) = refresh.filter(|token| !self.is_token_expired(Some(token.as_str()))) else {
            info!("No usable refresh token, logging out");
            self.logout(None);
            return None;
        };

        match self.api.refresh_token(&refresh).await {
            Ok(access) => {
                self.store.set(IdentityKey::AccessToken, access.as_str());
                self.state_tx.send_modify(|state| state.set_authenticated(true));
                debug!("Access token refreshed");
                Some(access)
            }
            Err(e) => {
                error!("Error refreshing token: {}", e);
                self.logout(None);
                None
            }
        }
    }

    /// Derive the authentication state from the stored tokens.
    ///
    /// Runs at most once per process. Whatever happens, `loading` is false
    /// and `has_checked` is true when it returns.
    pub async fn fetch_authenticated_player(&self) {
        let mut first = false;
        self.state_tx.send_if_modified(|state| match state.phase {
            AuthPhase::Unchecked => {
                state.begin_check();
                first = true;
                true
            }
            AuthPhase::Authenticated | AuthPhase::Unauthenticated if !state.has_checked => {
                // Settled by an explicit login before the check got to run
                state.has_checked = true;
                state.loading = false;
                true
            }
            _ => false,
        });
        if !first {
            debug!("Authentication already checked");
            return;
        }

        let authenticated = match self.reconcile().await {
            Ok(authenticated) => authenticated,
            Err(e) => {
                error!("Error fetching authenticated player: {}", e);
                false
            }
        };

        self.state_tx.send_modify(|state| state.finish_check(authenticated));
        info!("Authentication check finished: authenticated={}", authenticated);
    }

    async fn reconcile(&self) -> Result<bool> {
        let Some(access) = self.store.get(IdentityKey::AccessToken) else {
            return Ok(false);
        };

        if jwt::is_expired(&access)? {
            info!("Access token expired, refreshing");
        } else if self.is_token_valid(&access).await {
            return Ok(true);
        } else {
            info!("Access token rejected by backend, refreshing");
        }

        Ok(self.refresh_token().await.is_some())
    }

    /// Sign in with credentials and store the resulting session
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<()> {
        let tokens = self
            .get_token(credentials)
            .await
            .ok_or_else(|| ClientError::AuthRejected(INVALID_LOGIN_MESSAGE.to_string()))?;
        self.login(&credentials.username, &tokens.access, &tokens.refresh);
        Ok(())
    }

    /// Register a new account and sign straight in with it
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<()> {
        self.register(credentials).await?;
        self.sign_in(credentials).await
    }
}
