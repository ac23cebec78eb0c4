use std::time::Duration;

use axum::{
    http::{header, HeaderName, Method},
    routing::{get, post},
};
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub mod auth;
pub mod payment;

/// Build the application router with all routes
pub fn routes(app_state: AppState) -> axum::Router {
    let cors = cors_layer(&app_state);

    axum::Router::new()
        // Google OAuth routes
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        // Session routes
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        // Payment routes
        .route("/api/create-setup-intent", post(payment::create_setup_intent))
        .layer(CookieManagerLayer::new())
        .layer(cors)
        // Add trace layer for debugging
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(app_state)
}

/// The browser frontend is served from a different origin and sends cookies
fn cors_layer(app_state: &AppState) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(app_state.config.cors_allowed_origin.clone())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([header::LINK])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300))
}
