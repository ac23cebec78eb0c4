//! Signed session assertions.
//!
//! A session token is an HS256 JWT carrying the user's email plus issue and
//! expiry timestamps. Nothing is stored server side; possession of a token
//! that verifies under the configured secret is the session.

use chrono::{DateTime, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Lifetime of an issued session token, in seconds
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub email: String,
    /// Issued at, seconds since the Unix epoch
    pub iat: i64,
    /// Expires at, seconds since the Unix epoch
    pub exp: i64,
    /// Unique token id, keeps tokens issued in the same second distinct
    pub jti: String,
}

impl SessionClaims {
    fn new(email: &str, issued_at: DateTime<Utc>) -> Self {
        let iat = issued_at.timestamp();
        Self {
            email: email.to_string(),
            iat,
            exp: iat + SESSION_TTL_SECS,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("signing secret is empty")]
    EmptySecret,
    #[error("failed to sign session token")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("session token signature is invalid")]
    InvalidSignature,
    #[error("session token has expired")]
    Expired,
    #[error("session token is malformed")]
    Malformed(#[source] jsonwebtoken::errors::Error),
}

pub fn issue_token(email: &str, secret: &[u8]) -> Result<String, TokenError> {
    issue_token_at(email, secret, Utc::now())
}

/// Issue a token as if the current time were `issued_at`
pub fn issue_token_at(
    email: &str,
    secret: &[u8],
    issued_at: DateTime<Utc>,
) -> Result<String, TokenError> {
    issue_session_at(email, secret, issued_at).map(|(token, _)| token)
}

/// Issue a token and hand back the claims it carries
pub fn issue_session(email: &str, secret: &[u8]) -> Result<(String, SessionClaims), TokenError> {
    issue_session_at(email, secret, Utc::now())
}

fn issue_session_at(
    email: &str,
    secret: &[u8],
    issued_at: DateTime<Utc>,
) -> Result<(String, SessionClaims), TokenError> {
    if secret.is_empty() {
        return Err(TokenError::EmptySecret);
    }

    let claims = SessionClaims::new(email, issued_at);

    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(TokenError::Signing)?;

    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &[u8]) -> Result<SessionClaims, TokenError> {
    verify_token_at(token, secret, Utc::now())
}

/// Verify the signature, then require `exp` to be later than `now`
pub fn verify_token_at(
    token: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<SessionClaims, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::EmptySecret);
    }

    // Expiry is checked below against the caller's clock
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "iat"]);

    let claims = jsonwebtoken::decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret),
        &validation,
    )
    .map_err(|err| match err.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::Malformed(err),
    })?
    .claims;

    if claims.is_expired_at(now) {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}
