//! Token claim decoding
//!
//! Reads the payload segment of a JWT without checking its signature. The
//! result is advisory only: it lets the client skip a round-trip for a token
//! that has obviously expired. Whether a token is actually accepted is decided
//! by the backend's verify and refresh endpoints.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{ClientError, Result};

/// The subset of registered claims the client looks at.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Expiry as seconds since the Unix epoch.
    pub exp: i64,
}

/// Decode the claims segment of `token`.
pub fn decode_claims(token: &str) -> Result<Claims> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| ClientError::MalformedToken("missing payload segment".to_string()))?;

    // Some issuers keep the padding, the URL-safe engine does not accept it
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ClientError::MalformedToken(format!("payload is not base64url: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::MalformedToken(format!("payload is not a claims object: {}", e)))
}

/// Whether `token` has expired at `now`.
///
/// A token is expired once `exp * 1000 <= now` in milliseconds.
pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> Result<bool> {
    let claims = decode_claims(token)?;
    Ok(claims.exp.saturating_mul(1000) <= now.timestamp_millis())
}

/// Whether `token` has expired right now.
pub fn is_expired(token: &str) -> Result<bool> {
    is_expired_at(token, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token_with(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn decodes_exp_claim() {
        let token = token_with(r#"{"exp":1700000000,"user_id":3}"#);
        assert_eq!(decode_claims(&token).unwrap().exp, 1_700_000_000);
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let token = token_with(r#"{"exp":1700000000}"#);
        let at_exp = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let just_before = Utc.timestamp_millis_opt(1_699_999_999_999).unwrap();

        assert!(is_expired_at(&token, at_exp).unwrap());
        assert!(!is_expired_at(&token, just_before).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(decode_claims("not-a-token"), Err(ClientError::MalformedToken(_))));
        assert!(matches!(decode_claims("a.%%%.c"), Err(ClientError::MalformedToken(_))));
        let no_exp = token_with(r#"{"user_id":3}"#);
        assert!(decode_claims(&no_exp).is_err());
    }
}
