use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use color_eyre::eyre::{eyre, WrapErr};
use tower_cookies::Key;

use crate::{oauth::GoogleClient, payment::StripeClient};

const DEFAULT_GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const DEFAULT_POST_LOGIN_REDIRECT_URL: &str = "http://localhost:5173/payment?status=success";
const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PORT: u16 = 8080;

/// Client registration and endpoints for the Google identity provider
#[derive(Clone, Debug)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

/// How issued session tokens are signed and handed to the browser
#[derive(Clone)]
pub struct SessionConfig {
    pub jwt_secret: String,
    pub cookie_secure: bool,
    pub post_login_redirect_url: String,
}

#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub api_base: String,
}

#[derive(Clone)]
pub struct Config {
    pub google: GoogleOAuthConfig,
    pub session: SessionConfig,
    pub stripe: StripeConfig,
    pub http_timeout: Duration,
    pub port: u16,
    pub cors_allowed_origin: HeaderValue,
    /// Base64 encoded master key for encrypted cookies
    pub cookie_key: Option<String>,
}

impl Config {
    pub fn from_env() -> color_eyre::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    ///
    /// Blank values are treated the same as unset ones.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> color_eyre::Result<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name: &str| {
            get(name).ok_or_else(|| eyre!("{} environment variable not set", name))
        };

        let redirect_url = require("REDIRECT_URL")?;

        let google = GoogleOAuthConfig {
            client_id: require("GOOGLE_CLIENT_ID")?,
            client_secret: require("GOOGLE_CLIENT_SECRET")?,
            auth_url: get("GOOGLE_AUTH_URL").unwrap_or_else(|| DEFAULT_GOOGLE_AUTH_URL.to_string()),
            token_url: get("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_GOOGLE_TOKEN_URL.to_string()),
            userinfo_url: get("GOOGLE_USERINFO_URL")
                .unwrap_or_else(|| DEFAULT_GOOGLE_USERINFO_URL.to_string()),
            redirect_url,
        };

        // Secure cookies unless the callback itself is served over plain http
        let cookie_secure = match get("COOKIE_SECURE") {
            Some(value) => parse_bool(&value)
                .ok_or_else(|| eyre!("COOKIE_SECURE must be true or false, got {:?}", value))?,
            None => google.redirect_url.starts_with("https://"),
        };

        let session = SessionConfig {
            jwt_secret: require("JWT_SECRET")?,
            cookie_secure,
            post_login_redirect_url: get("POST_LOGIN_REDIRECT_URL")
                .unwrap_or_else(|| DEFAULT_POST_LOGIN_REDIRECT_URL.to_string()),
        };

        let stripe = StripeConfig {
            secret_key: get("STRIPE_SECRET_KEY"),
            api_base: get("STRIPE_API_BASE")
                .unwrap_or_else(|| DEFAULT_STRIPE_API_BASE.to_string()),
        };

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(
                value
                    .parse()
                    .wrap_err_with(|| format!("Invalid HTTP_TIMEOUT_SECS: {}", value))?,
            ),
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let port = match get("PORT") {
            Some(value) => value
                .parse()
                .wrap_err_with(|| format!("Invalid PORT: {}", value))?,
            None => DEFAULT_PORT,
        };

        let origin = get("CORS_ALLOWED_ORIGIN")
            .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGIN.to_string());
        let cors_allowed_origin = HeaderValue::from_str(&origin)
            .wrap_err_with(|| format!("Invalid CORS_ALLOWED_ORIGIN: {}", origin))?;

        Ok(Self {
            google,
            session,
            stripe,
            http_timeout,
            port,
            cors_allowed_origin,
            cookie_key: get("COOKIE_KEY"),
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cookie_key: Key,
    pub google: Arc<GoogleClient>,
    pub stripe: Arc<StripeClient>,
}

impl AppState {
    pub fn new(config: Config) -> color_eyre::Result<Self> {
        let http = reqwest::ClientBuilder::new()
            .timeout(config.http_timeout)
            .use_rustls_tls()
            .build()
            .wrap_err("Failed to build HTTP client")?;

        let cookie_key = cookie_key_from_config(config.cookie_key.as_deref())?;

        let google = GoogleClient::new(config.google.clone(), http.clone());
        let stripe = StripeClient::new(config.stripe.clone(), http);

        Ok(Self {
            config: Arc::new(config),
            cookie_key,
            google: Arc::new(google),
            stripe: Arc::new(stripe),
        })
    }
}

fn cookie_key_from_config(encoded: Option<&str>) -> color_eyre::Result<Key> {
    use base64::{engine::general_purpose::STANDARD, Engine};

    let Some(encoded) = encoded else {
        tracing::warn!("COOKIE_KEY not set, generating a key for this process only");
        return Ok(Key::generate());
    };

    let bytes = STANDARD
        .decode(encoded.trim())
        .wrap_err("Failed to decode base64-encoded COOKIE_KEY")?;

    Key::try_from(bytes.as_slice()).map_err(|e| eyre!("COOKIE_KEY is unusable: {}", e))
}
