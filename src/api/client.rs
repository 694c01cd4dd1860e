//! Typed HTTP client for the Mastermind backend

use std::time::Duration;
use chrono::{DateTime, Utc};
use reqwest::{header::AUTHORIZATION, Response, StatusCode, Url};
use serde_json::json;
use tracing::debug;

use crate::error::{ClientError, Result};
use super::responses::{
    Credentials, Leaderboard, RefreshedToken, RegistrationErrors, RoundData, StartTime, TokenPair,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the `/auth/*` and `game/*` endpoints.
///
/// Cheap to clone; clones share one connection pool and one cookie jar.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        // A trailing slash keeps any path prefix when joining endpoint paths
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base = Url::parse(&normalized)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { base, http })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))
    }

    fn bearer(token: &str) -> String {
        format!("JWT {}", token)
    }

    /// POST `/auth/users/`
    pub async fn register(&self, credentials: &Credentials) -> Result<()> {
        let response = self
            .http
            .post(self.url("/auth/users/")?)
            .json(credentials)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            StatusCode::BAD_REQUEST => {
                let errors: RegistrationErrors = response.json().await.unwrap_or_default();
                match errors.first_message() {
                    Some((field, message)) => Err(ClientError::Validation {
                        field: field.to_string(),
                        message: message.to_string(),
                    }),
                    None => Err(ClientError::UnexpectedStatus(StatusCode::BAD_REQUEST.as_u16())),
                }
            }
            status => Err(ClientError::UnexpectedStatus(status.as_u16())),
        }
    }

    /// POST `/auth/jwt/create`
    pub async fn create_token(&self, credentials: &Credentials) -> Result<TokenPair> {
        let response = self
            .http
            .post(self.url("/auth/jwt/create")?)
            .json(credentials)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::AuthRejected(format!(
                "token request refused with status {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    /// POST `/auth/jwt/verify`.
    ///
    /// A success body that carries a `code` field is a rejection.
    pub async fn verify_token(&self, token: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("/auth/jwt/verify")?)
            .json(&json!({ "token": token }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::AuthRejected(format!("verify returned {}", status)));
        }

        let body: serde_json::Value = response.json().await.unwrap_or_else(|_| json!({}));
        if let Some(code) = body.get("code") {
            return Err(ClientError::AuthRejected(format!("verify returned code {}", code)));
        }
        Ok(())
    }

    /// POST `/auth/jwt/refresh/`, returning the new access token
    pub async fn refresh_token(&self, refresh: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url("/auth/jwt/refresh/")?)
            .json(&json!({ "refresh": refresh }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::AuthRejected(format!(
                "refresh refused with status {}",
                response.status()
            )));
        }
        let refreshed: RefreshedToken = response.json().await?;
        Ok(refreshed.access)
    }

    /// POST `game/newgame/`
    pub async fn new_game(&self, access: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("game/newgame/")?)
            .header(AUTHORIZATION, Self::bearer(access))
            .json(&json!({}))
            .send()
            .await?;
        expect_status(response, StatusCode::CREATED).await.map(drop)
    }

    /// PATCH `game/difficulty/`
    pub async fn set_difficulty(&self, access: &str, difficulty: u8) -> Result<()> {
        let response = self
            .http
            .patch(self.url("game/difficulty/")?)
            .header(AUTHORIZATION, Self::bearer(access))
            .json(&json!({ "difficulty": difficulty }))
            .send()
            .await?;
        expect_status(response, StatusCode::OK).await.map(drop)
    }

    /// GET `game/difficulty/`
    pub async fn difficulty(&self, access: &str) -> Result<u8> {
        let response = self
            .http
            .get(self.url("game/difficulty/")?)
            .header(AUTHORIZATION, Self::bearer(access))
            .send()
            .await?;
        Ok(expect_status(response, StatusCode::OK).await?.json().await?)
    }

    /// GET `game/gamerounds/`, oldest round first.
    ///
    /// 404 means the player has no active game.
    pub async fn game_rounds(&self, access: &str) -> Result<Vec<RoundData>> {
        let response = self
            .http
            .get(self.url("game/gamerounds/")?)
            .header(AUTHORIZATION, Self::bearer(access))
            .send()
            .await?;
        Ok(expect_status(response, StatusCode::OK).await?.json().await?)
    }

    /// POST `game/gamerounds/`
    pub async fn submit_guess(&self, access: &str, guess: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("game/gamerounds/")?)
            .header(AUTHORIZATION, Self::bearer(access))
            .json(&json!({ "guess": guess }))
            .send()
            .await?;
        expect_status(response, StatusCode::CREATED).await.map(drop)
    }

    /// GET `game/leaderboard/`
    pub async fn leaderboard(&self, access: &str) -> Result<Leaderboard> {
        let response = self
            .http
            .get(self.url("game/leaderboard/")?)
            .header(AUTHORIZATION, Self::bearer(access))
            .send()
            .await?;
        Ok(expect_status(response, StatusCode::OK).await?.json().await?)
    }

    /// GET `game/starttime/`
    pub async fn start_time(&self, access: &str) -> Result<DateTime<Utc>> {
        let response = self
            .http
            .get(self.url("game/starttime/")?)
            .header(AUTHORIZATION, Self::bearer(access))
            .send()
            .await?;
        let body: StartTime = expect_status(response, StatusCode::OK).await?.json().await?;
        Ok(body.start_time)
    }

    /// PATCH `game/resumegame/`
    pub async fn resume_game(&self, access: &str) -> Result<()> {
        let response = self
            .http
            .patch(self.url("game/resumegame/")?)
            .header(AUTHORIZATION, Self::bearer(access))
            .send()
            .await?;
        expect_status(response, StatusCode::OK).await.map(drop)
    }
}

/// Pass `response` through when it has the `expected` status
async fn expect_status(response: Response, expected: StatusCode) -> Result<Response> {
    let status = response.status();
    debug!("{} {} -> {}", response.url().path(), expected, status);

    match status {
        s if s == expected => Ok(response),
        StatusCode::NOT_FOUND => Err(ClientError::NotFound),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(ClientError::AuthRejected(format!("backend returned {}", status)))
        }
        s => Err(ClientError::UnexpectedStatus(s.as_u16())),
    }
}
