//! Fake Google OAuth2 endpoints and a fake Stripe setup-intent endpoint.
//!
//! Behaviour is keyed on well-known authorization codes so tests can drive
//! every branch of the login callback:
//!
//! * [`VALID_CODE`] exchanges to a token whose profile carries [`FIXTURE_EMAIL`]
//! * [`NO_EMAIL_CODE`] exchanges to a token whose profile has no `email`
//! * [`GARBLED_PROFILE_CODE`] exchanges to a token whose profile is not JSON
//! * [`ARRAY_PROFILE_CODE`] exchanges to a token whose profile is a JSON array
//! * [`REVOKED_TOKEN_CODE`] exchanges to a token the userinfo endpoint refuses
//! * [`HANGING_CODE`] makes the token endpoint stall for [`HANG_DURATION`]
//! * anything else is rejected with `invalid_grant`

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

pub const VALID_CODE: &str = "fixture-valid-code";
pub const NO_EMAIL_CODE: &str = "fixture-no-email-code";
pub const GARBLED_PROFILE_CODE: &str = "fixture-garbled-profile-code";
pub const ARRAY_PROFILE_CODE: &str = "fixture-array-profile-code";
pub const REVOKED_TOKEN_CODE: &str = "fixture-revoked-token-code";
pub const HANGING_CODE: &str = "fixture-hanging-code";

/// How long the token endpoint stalls for [`HANGING_CODE`]
pub const HANG_DURATION: Duration = Duration::from_secs(30);

pub const FIXTURE_EMAIL: &str = "user@example.com";
pub const SETUP_INTENT_CLIENT_SECRET: &str = "seti_fixture_secret_4242";

const TOKEN_WITH_EMAIL: &str = "fixture-token-with-email";
const TOKEN_WITHOUT_EMAIL: &str = "fixture-token-without-email";
const TOKEN_GARBLED_PROFILE: &str = "fixture-token-garbled-profile";
const TOKEN_ARRAY_PROFILE: &str = "fixture-token-array-profile";
const TOKEN_REVOKED: &str = "fixture-token-revoked";

pub const AUTHORIZE_PATH: &str = "/o/oauth2/auth";
pub const TOKEN_PATH: &str = "/token";
pub const USERINFO_PATH: &str = "/oauth2/v2/userinfo";
pub const SETUP_INTENTS_PATH: &str = "/v1/setup_intents";

/// Shared fixture state. Counts the back-channel calls it receives so tests
/// can assert that a request never reached the provider.
#[derive(Clone, Default)]
pub struct ProviderFixture {
    hits: Arc<AtomicUsize>,
}

impl ProviderFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of token, userinfo and setup-intent requests served so far
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }
}

/// Absolute endpoint URLs for a fixture served at `base`
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub stripe_api_base: String,
}

impl Endpoints {
    pub fn for_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: format!("{base}{AUTHORIZE_PATH}"),
            token_url: format!("{base}{TOKEN_PATH}"),
            userinfo_url: format!("{base}{USERINFO_PATH}"),
            stripe_api_base: base.to_string(),
        }
    }
}

pub fn router(fixture: ProviderFixture) -> Router {
    Router::new()
        .route(AUTHORIZE_PATH, get(authorize))
        .route(TOKEN_PATH, post(token))
        .route(USERINFO_PATH, get(userinfo))
        .route(SETUP_INTENTS_PATH, post(create_setup_intent))
        .with_state(fixture)
}

#[derive(Debug, Deserialize)]
struct AuthorizeParams {
    redirect_uri: String,
    state: Option<String>,
}

#[derive(Serialize)]
struct OAuthRedirectParams<'a> {
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
}

/// Skips the consent screen and sends the browser straight back with a code
async fn authorize(Query(params): Query<AuthorizeParams>) -> Response {
    let query = match serde_urlencoded::to_string(OAuthRedirectParams {
        code: VALID_CODE,
        state: params.state.as_deref(),
    }) {
        Ok(query) => query,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };

    let separator = if params.redirect_uri.contains('?') { '&' } else { '?' };
    let location = format!("{}{}{}", params.redirect_uri, separator, query);
    info!("Authorize fixture redirecting to {}", location);

    Redirect::temporary(&location).into_response()
}

#[derive(Debug, Deserialize)]
struct TokenParams {
    grant_type: String,
    code: String,
    client_id: Option<String>,
    client_secret: Option<String>,
}

async fn token(State(fixture): State<ProviderFixture>, Form(params): Form<TokenParams>) -> Response {
    fixture.record_hit();

    if params.grant_type != "authorization_code" {
        return oauth_error(StatusCode::BAD_REQUEST, "unsupported_grant_type");
    }

    let has_credentials = params.client_id.is_some_and(|id| !id.is_empty())
        && params.client_secret.is_some_and(|secret| !secret.is_empty());
    if !has_credentials {
        return oauth_error(StatusCode::UNAUTHORIZED, "invalid_client");
    }

    let access_token = match params.code.as_str() {
        VALID_CODE => TOKEN_WITH_EMAIL,
        NO_EMAIL_CODE => TOKEN_WITHOUT_EMAIL,
        GARBLED_PROFILE_CODE => TOKEN_GARBLED_PROFILE,
        ARRAY_PROFILE_CODE => TOKEN_ARRAY_PROFILE,
        REVOKED_TOKEN_CODE => TOKEN_REVOKED,
        HANGING_CODE => {
            tokio::time::sleep(HANG_DURATION).await;
            return oauth_error(StatusCode::GATEWAY_TIMEOUT, "temporarily_unavailable");
        }
        _ => return oauth_error(StatusCode::BAD_REQUEST, "invalid_grant"),
    };

    Json(json!({
        "access_token": access_token,
        "expires_in": 3599,
        "scope": "https://www.googleapis.com/auth/userinfo.email https://www.googleapis.com/auth/userinfo.profile openid",
        "token_type": "Bearer"
    }))
    .into_response()
}

async fn userinfo(State(fixture): State<ProviderFixture>, headers: HeaderMap) -> Response {
    fixture.record_hit();

    match bearer_token(&headers) {
        Some(TOKEN_WITH_EMAIL) => Json(json!({
            "id": "108312345678901234567",
            "email": FIXTURE_EMAIL,
            "verified_email": true,
            "name": "Fixture User",
            "given_name": "Fixture",
            "family_name": "User",
            "picture": "https://example.com/avatar.png"
        }))
        .into_response(),
        Some(TOKEN_WITHOUT_EMAIL) => Json(json!({
            "id": "108398765432109876543",
            "name": "No Email User"
        }))
        .into_response(),
        Some(TOKEN_GARBLED_PROFILE) => (
            [(header::CONTENT_TYPE, "text/html")],
            "<html><body>definitely not json</body></html>",
        )
            .into_response(),
        Some(TOKEN_ARRAY_PROFILE) => Json(json!([FIXTURE_EMAIL])).into_response(),
        // TOKEN_REVOKED and anything unknown
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": {
                    "code": 401,
                    "message": "Request is missing required authentication credential.",
                    "status": "UNAUTHENTICATED"
                }
            })),
        )
            .into_response(),
    }
}

async fn create_setup_intent(
    State(fixture): State<ProviderFixture>,
    headers: HeaderMap,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    fixture.record_hit();

    if !bearer_token(&headers).is_some_and(|key| key.starts_with("sk_")) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": {
                    "message": "Invalid API Key provided",
                    "type": "invalid_request_error"
                }
            })),
        )
            .into_response();
    }

    if params.get("automatic_payment_methods[enabled]").map(String::as_str) != Some("true") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {
                    "message": "Missing automatic_payment_methods[enabled]",
                    "type": "invalid_request_error"
                }
            })),
        )
            .into_response();
    }

    Json(json!({
        "id": "seti_fixture",
        "object": "setup_intent",
        "client_secret": SETUP_INTENT_CLIENT_SECRET,
        "status": "requires_payment_method",
        "automatic_payment_methods": { "enabled": true }
    }))
    .into_response()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn oauth_error(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(json!({
            "error": error,
            "error_description": "Rejected by provider fixture"
        })),
    )
        .into_response()
}
