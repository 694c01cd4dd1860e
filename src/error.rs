//! Client error types

/// Errors surfaced by the backend client and the controllers built on it.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Registration was refused with a field-level message (HTTP 400).
    /// The message is shown to the player verbatim.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Bad credentials, or a token the backend will not accept.
    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    /// Transport-level failure talking to the backend.
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// The player has no active game.
    #[error("no active game")]
    NotFound,

    /// The backend answered with a status the caller did not expect.
    #[error("unexpected response status {0}")]
    UnexpectedStatus(u16),

    /// A token whose claims could not be decoded.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The configured backend address is not a usable base URL.
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),

    /// Stored Identity could not be read or written.
    #[error("identity store: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
