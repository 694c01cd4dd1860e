//! Session state structure and management

use serde::{Deserialize, Serialize};

/// Authentication phase of the client.
///
/// `Unchecked` moves to `Checking` exactly once per process. After the check
/// the two terminal phases may switch between each other through login,
/// logout or a failed refresh, but never go back to `Checking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthPhase {
    Unchecked,
    Checking,
    Authenticated,
    Unauthenticated,
}

/// What a route guard should do with the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The first check has not finished yet, show a loading view
    Pending,
    Granted,
    /// Send the player to the login page
    Denied,
}

/// Process-wide authentication state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub is_authenticated: bool,
    /// True only until the first authentication check completes
    pub loading: bool,
    /// Latch ensuring the initial check runs once
    pub has_checked: bool,
    pub phase: AuthPhase,
}

impl SessionState {
    /// Create the state a freshly started client is in
    pub fn new() -> Self {
        Self {
            is_authenticated: false,
            loading: true,
            has_checked: false,
            phase: AuthPhase::Unchecked,
        }
    }

    /// Record the outcome of login, logout or a refresh
    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.is_authenticated = authenticated;
        if self.phase != AuthPhase::Checking {
            self.phase = Self::settled_phase(authenticated);
        }
    }

    /// Mark the start of the one-time check
    pub fn begin_check(&mut self) {
        self.phase = AuthPhase::Checking;
    }

    /// Close the one-time check with its outcome
    pub fn finish_check(&mut self, authenticated: bool) {
        self.is_authenticated = authenticated;
        self.loading = false;
        self.has_checked = true;
        self.phase = Self::settled_phase(authenticated);
    }

    /// Decide what a protected route should render
    pub fn access(&self) -> Access {
        if self.loading {
            Access::Pending
        } else if self.is_authenticated {
            Access::Granted
        } else {
            Access::Denied
        }
    }

    fn settled_phase(authenticated: bool) -> AuthPhase {
        if authenticated {
            AuthPhase::Authenticated
        } else {
            AuthPhase::Unauthenticated
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_loading_and_unchecked() {
        let state = SessionState::new();
        assert!(state.loading);
        assert!(!state.is_authenticated);
        assert_eq!(state.phase, AuthPhase::Unchecked);
        assert_eq!(state.access(), Access::Pending);
    }

    #[test]
    fn refresh_outcome_during_check_keeps_checking_phase() {
        let mut state = SessionState::new();
        state.begin_check();
        state.set_authenticated(false);
        assert_eq!(state.phase, AuthPhase::Checking);

        state.finish_check(true);
        assert_eq!(state.phase, AuthPhase::Authenticated);
        assert_eq!(state.access(), Access::Granted);
    }

    #[test]
    fn settled_phases_switch_on_login_and_logout() {
        let mut state = SessionState::new();
        state.finish_check(false);
        assert_eq!(state.access(), Access::Denied);

        state.set_authenticated(true);
        assert_eq!(state.phase, AuthPhase::Authenticated);
        state.set_authenticated(false);
        assert_eq!(state.phase, AuthPhase::Unauthenticated);
    }
}
