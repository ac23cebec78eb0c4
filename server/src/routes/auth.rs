use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    auth::{self, AuthUser},
    cookies::CookieJar,
    errors::{ServerError, ServerResult},
    oauth::{generate_state, state_matches},
    state::AppState,
};

#[derive(Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Start the Google OAuth flow
pub async fn login(State(state): State<AppState>, cookies: CookieJar) -> impl IntoResponse {
    let oauth_state = generate_state();
    let url = state.google.authorization_url(&oauth_state);
    cookies.set_oauth_state(oauth_state);

    info!("Redirecting to identity provider");
    Redirect::temporary(&url)
}

/// Handle the OAuth callback: code exchange, profile lookup, session cookie
pub async fn callback(
    State(state): State<AppState>,
    cookies: CookieJar,
    Query(params): Query<CallbackParams>,
) -> ServerResult<Response> {
    info!(
        has_code = params.code.is_some(),
        has_state = params.state.is_some(),
        error = ?params.error,
        "Callback received"
    );

    // The user declined or the provider refused; nothing to exchange
    if let Some(error) = params.error {
        let description = params
            .error_description
            .unwrap_or_else(|| "No error description provided".to_string());
        return Err(ServerError::bad_request(format!(
            "Authorization failed: {} - {}",
            error, description
        )));
    }

    let Some(code) = params.code.filter(|code| !code.is_empty()) else {
        return Err(ServerError::bad_request("Code not found"));
    };

    let expected_state = cookies.take_oauth_state();
    let state_ok = match (expected_state.as_deref(), params.state.as_deref()) {
        (Some(expected), Some(received)) => state_matches(expected, received),
        _ => false,
    };
    if !state_ok {
        warn!(
            has_state_cookie = expected_state.is_some(),
            "OAuth state missing or mismatched"
        );
        return Err(ServerError::bad_request("Invalid OAuth state"));
    }

    let token = state
        .google
        .exchange_code(&code)
        .await
        .wrap_err("Failed to exchange token")?;

    let profile = state.google.fetch_profile(&token).await.map_err(|err| {
        let context = if err.is_decode() {
            "Failed to decode user info"
        } else {
            "Failed to get user info"
        };
        Report::new(err).wrap_err(context)
    })?;

    let email = profile
        .email()
        .ok_or_else(|| eyre!("Email not found in user info"))?;

    let claims =
        auth::start_session(&state, &cookies, email).wrap_err("Failed to generate token")?;

    debug!(email = %claims.email, "Session issued");
    info!("Authentication successful");
    Ok(Redirect::temporary(&state.config.session.post_login_redirect_url).into_response())
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub email: String,
    pub expires_at: i64,
}

/// The signed-in user, as proven by the session cookie
pub async fn me(AuthUser { email, claims }: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        email,
        expires_at: claims.exp,
    })
}

/// Logout route - clears the session cookie
pub async fn logout(cookies: CookieJar) -> StatusCode {
    auth::end_session(&cookies);

    info!("User logged out successfully");
    StatusCode::NO_CONTENT
}
