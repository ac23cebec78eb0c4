use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use color_eyre::eyre::{eyre, WrapErr};
use time::OffsetDateTime;
use tracing::info;

use crate::{
    cookies::{Cookie, CookieJar, SameSite},
    errors::{ServerError, WithStatus},
    jwt::{self, SessionClaims},
    state::AppState,
};

/// Cookie name for the signed session token
pub const SESSION_COOKIE_NAME: &str = "auth_token";

/// The caller of a protected route, proven by a valid session cookie
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
    pub claims: SessionClaims,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                ServerError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    eyre!("Failed to read request cookies"),
                )
            })?;

        let Some(token) = get_session_token(&cookies) else {
            info!("No session cookie found");
            return Err(ServerError::new(
                StatusCode::UNAUTHORIZED,
                eyre!("Not authenticated"),
            ));
        };

        let claims = jwt::verify_token(&token, state.config.session.jwt_secret.as_bytes())
            .wrap_err("Invalid session")
            .with_status(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser {
            email: claims.email.clone(),
            claims,
        })
    }
}

/// Get the session token from the cookie
pub fn get_session_token(cookies: &CookieJar) -> Option<String> {
    cookies
        .get(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Creates the session cookie for a freshly issued token, expiring with it
pub fn create_session_cookie(
    token: String,
    expires_at: OffsetDateTime,
    secure: bool,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_expires(expires_at);
    cookie
}

/// Issue a session token for `email` and set it as the session cookie
pub fn start_session(
    state: &AppState,
    cookies: &CookieJar,
    email: &str,
) -> color_eyre::Result<SessionClaims> {
    let (token, claims) = jwt::issue_session(email, state.config.session.jwt_secret.as_bytes())?;
    let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp)
        .wrap_err("Token expiry out of range")?;

    cookies.add(create_session_cookie(
        token,
        expires_at,
        state.config.session.cookie_secure,
    ));

    Ok(claims)
}

/// Ask the browser to drop the session cookie
pub fn end_session(cookies: &CookieJar) {
    let mut removal = Cookie::from(SESSION_COOKIE_NAME);
    removal.set_path("/");
    cookies.remove(removal);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let expires_at = OffsetDateTime::from_unix_timestamp(1_900_000_000).unwrap();
        let cookie = create_session_cookie("header.payload.sig".to_string(), expires_at, false);

        assert_eq!(cookie.name(), "auth_token");
        assert_eq!(cookie.value(), "header.payload.sig");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.expires_datetime(), Some(expires_at));
    }

    #[test]
    fn test_session_cookie_secure_when_configured() {
        let expires_at = OffsetDateTime::now_utc();
        let cookie = create_session_cookie("t".to_string(), expires_at, true);

        assert_eq!(cookie.secure(), Some(true));
    }
}
