//! Backend request and response structures

use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Username and password, sent to the backend and never stored
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Access and refresh token issued by `/auth/jwt/create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Body of a successful `/auth/jwt/refresh/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshedToken {
    pub access: String,
}

/// Field-level messages from a refused registration.
///
/// Only the first message of a field is ever shown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationErrors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Vec<String>>,
}

impl RegistrationErrors {
    /// The message to surface: the username field wins over the password field
    pub fn first_message(&self) -> Option<(&'static str, &str)> {
        fn first<'a>(
            field: &'static str,
            messages: &'a Option<Vec<String>>,
        ) -> Option<(&'static str, &'a str)> {
            messages
                .as_ref()
                .and_then(|m| m.first())
                .map(|m| (field, m.as_str()))
        }
        first("username", &self.username).or_else(|| first("password", &self.password))
    }
}

/// One evaluated guess of the current game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
    pub guess: String,
    pub correct_numbers: u8,
    pub correct_positions: u8,
}

/// Player statistics at the current difficulty. Times are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub wins: u32,
    #[serde(default)]
    pub fastest_time: Option<f64>,
    #[serde(default)]
    pub current_game_time: Option<f64>,
}

/// Body of `game/starttime/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartTime {
    pub start_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_errors_prefer_username() {
        let errors: RegistrationErrors = serde_json::from_str(
            r#"{"username":["A user with that username already exists.","x"],"password":["too short"]}"#,
        )
        .unwrap();
        assert_eq!(
            errors.first_message(),
            Some(("username", "A user with that username already exists."))
        );

        let errors: RegistrationErrors =
            serde_json::from_str(r#"{"password":["This password is too common."]}"#).unwrap();
        assert_eq!(errors.first_message(), Some(("password", "This password is too common.")));

        assert_eq!(RegistrationErrors::default().first_message(), None);
    }

    #[test]
    fn leaderboard_tolerates_missing_times() {
        let board: Leaderboard = serde_json::from_str(r#"{"wins":3,"fastest_time":null}"#).unwrap();
        assert_eq!(board.wins, 3);
        assert_eq!(board.fastest_time, None);
        assert_eq!(board.current_game_time, None);
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("alice", "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
