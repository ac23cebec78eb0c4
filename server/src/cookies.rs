use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse as _, Response},
};
use reqwest::StatusCode;
use time::Duration;
use tracing::error;

pub use tower_cookies::cookie::SameSite;
pub use tower_cookies::Cookie;

use crate::state::AppState;

/// Cookie holding the anti-forgery value between login and callback
pub const OAUTH_STATE_COOKIE_NAME: &str = "oauth_state";

/// How long a login attempt may take before its state cookie lapses
pub const OAUTH_STATE_TTL_MINUTES: i64 = 10;

const OAUTH_STATE_COOKIE_PATH: &str = "/auth";

pub struct CookieJar {
    cookies: tower_cookies::Cookies,
    state: AppState,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for CookieJar {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = match tower_cookies::Cookies::from_request_parts(parts, state).await {
            Ok(cookies) => cookies,
            Err(_) => {
                error!("Failed to extract cookies from request");
                return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            }
        };

        Ok(CookieJar {
            cookies,
            state: state.clone(),
        })
    }
}

impl CookieJar {
    /// Add a plain cookie
    pub fn add(&self, cookie: Cookie<'static>) {
        self.cookies.add(cookie);
    }

    /// Get a plain cookie by name
    pub fn get(&self, name: &str) -> Option<Cookie<'static>> {
        self.cookies.get(name).map(Cookie::into_owned)
    }

    /// Removes the plain `cookie` from the browser
    pub fn remove(&self, cookie: Cookie<'static>) {
        self.cookies.remove(cookie);
    }

    /// Remember the anti-forgery value for this browser, encrypted
    pub fn set_oauth_state(&self, value: String) {
        let secure = self.state.config.session.cookie_secure;
        self.cookies
            .private(&self.state.cookie_key)
            .add(oauth_state_cookie(value, secure));
    }

    /// Read and forget the anti-forgery value; each one is good for a single callback
    pub fn take_oauth_state(&self) -> Option<String> {
        let private = self.cookies.private(&self.state.cookie_key);
        let value = private
            .get(OAUTH_STATE_COOKIE_NAME)
            .map(|cookie| cookie.value().to_string());

        let mut removal = Cookie::from(OAUTH_STATE_COOKIE_NAME);
        removal.set_path(OAUTH_STATE_COOKIE_PATH);
        private.remove(removal);

        value
    }
}

/// Builds the short-lived cookie carrying the anti-forgery value
pub fn oauth_state_cookie(value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(OAUTH_STATE_COOKIE_NAME, value);
    cookie.set_path(OAUTH_STATE_COOKIE_PATH);
    cookie.set_http_only(true);
    // Lax so the cookie rides along on the provider's top-level redirect back
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_max_age(Duration::minutes(OAUTH_STATE_TTL_MINUTES));
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oauth_state_cookie_attributes() {
        let cookie = oauth_state_cookie("abc".to_string(), true);

        assert_eq!(cookie.name(), OAUTH_STATE_COOKIE_NAME);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/auth"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(Duration::minutes(10)));
    }

    #[test]
    fn test_oauth_state_cookie_can_be_relaxed_for_local_development() {
        let cookie = oauth_state_cookie("abc".to_string(), false);

        assert_eq!(cookie.secure(), Some(false));
    }
}
