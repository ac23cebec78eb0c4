use reqwest::StatusCode;
use serde::Serialize;

use crate::state::GoogleOAuthConfig;

use super::token::{ProviderToken, UserProfile};

/// Scopes requested at login; only the email is used
pub const SCOPES: &str = "email profile";

/// Longest provider error body carried into an error message
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("token request could not be completed")]
    ExchangeTransport(#[source] reqwest::Error),
    #[error("token endpoint responded with {status}: {body}")]
    ExchangeRejected { status: StatusCode, body: String },
    #[error("token endpoint response was malformed")]
    ExchangeMalformed(#[source] reqwest::Error),
    #[error("userinfo request could not be completed")]
    ProfileTransport(#[source] reqwest::Error),
    #[error("userinfo endpoint responded with {status}")]
    ProfileRejected { status: StatusCode },
    #[error("userinfo response was not valid JSON")]
    ProfileDecode(#[source] serde_json::Error),
}

impl ProviderError {
    /// True when the userinfo body arrived but could not be decoded
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::ProfileDecode(_))
    }
}

#[derive(Serialize)]
struct AuthUrlParams<'a> {
    client_id: &'a str,
    redirect_uri: &'a str,
    response_type: &'static str,
    scope: &'static str,
    access_type: &'static str,
    state: &'a str,
}

#[derive(Serialize)]
struct TokenRequestParams<'a> {
    grant_type: &'static str,
    code: &'a str,
    redirect_uri: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

/// Talks to the identity provider on behalf of the login flow.
///
/// Authorization codes are single use, so nothing here retries.
pub struct GoogleClient {
    config: GoogleOAuthConfig,
    http: reqwest::Client,
}

impl GoogleClient {
    pub fn new(config: GoogleOAuthConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Provider authorization endpoint for a login attempt carrying `state`
    pub fn authorization_url(&self, state: &str) -> String {
        let params = AuthUrlParams {
            client_id: &self.config.client_id,
            redirect_uri: &self.config.redirect_url,
            response_type: "code",
            scope: SCOPES,
            access_type: "offline",
            state,
        };

        // Only &str fields, which always serialize
        let query = serde_urlencoded::to_string(&params).unwrap_or_default();
        let separator = if self.config.auth_url.contains('?') { '&' } else { '?' };

        format!("{}{}{}", self.config.auth_url, separator, query)
    }

    /// Exchange an authorization code for an access token
    #[tracing::instrument(skip_all, fields(token_url = %self.config.token_url))]
    pub async fn exchange_code(&self, code: &str) -> Result<ProviderToken, ProviderError> {
        let params = TokenRequestParams {
            grant_type: "authorization_code",
            code,
            redirect_uri: &self.config.redirect_url,
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
        };

        let response = self
            .http
            .post(&self.config.token_url)
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await
            .map_err(ProviderError::ExchangeTransport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            tracing::error!(%status, "Token request failed");

            return Err(ProviderError::ExchangeRejected {
                status,
                body: truncate(body),
            });
        }

        let token = response
            .json::<ProviderToken>()
            .await
            .map_err(ProviderError::ExchangeMalformed)?;

        tracing::debug!(?token, "Exchanged authorization code");
        Ok(token)
    }

    /// Fetch the authenticated user's profile with the token as bearer credential
    #[tracing::instrument(skip_all, fields(userinfo_url = %self.config.userinfo_url))]
    pub async fn fetch_profile(&self, token: &ProviderToken) -> Result<UserProfile, ProviderError> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(&token.access_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(ProviderError::ProfileTransport)?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(%status, "Userinfo request failed");
            return Err(ProviderError::ProfileRejected { status });
        }

        let body = response
            .bytes()
            .await
            .map_err(ProviderError::ProfileTransport)?;

        serde_json::from_slice::<UserProfile>(&body).map_err(ProviderError::ProfileDecode)
    }
}

fn truncate(mut body: String) -> String {
    if let Some((idx, _)) = body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        body.truncate(idx);
        body.push_str("...");
    }
    body
}
