//! Stripe setup intents.
//!
//! The only payment operation this service performs: ask Stripe for a setup
//! intent so the frontend can collect a payment method for later use.

use reqwest::StatusCode;
use serde::Deserialize;

use crate::state::StripeConfig;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("payments are not configured")]
    NotConfigured,
    #[error("setup intent request could not be completed")]
    Transport(#[source] reqwest::Error),
    #[error("Stripe responded with {status}: {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("setup intent response was malformed")]
    Malformed(#[source] reqwest::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetupIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

pub struct StripeClient {
    config: StripeConfig,
    http: reqwest::Client,
}

impl StripeClient {
    pub fn new(config: StripeConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Create a setup intent with automatic payment methods enabled
    #[tracing::instrument(skip_all)]
    pub async fn create_setup_intent(&self) -> Result<SetupIntent, PaymentError> {
        let secret_key = self
            .config
            .secret_key
            .as_deref()
            .ok_or(PaymentError::NotConfigured)?;

        let url = format!(
            "{}/v1/setup_intents",
            self.config.api_base.trim_end_matches('/')
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(secret_key)
            .form(&[("automatic_payment_methods[enabled]", "true")])
            .send()
            .await
            .map_err(PaymentError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<StripeErrorBody>().await {
                Ok(body) => body
                    .error
                    .message
                    .unwrap_or_else(|| "no error message".to_string()),
                Err(_) => "unreadable error response".to_string(),
            };
            tracing::error!(%status, %message, "Setup intent request failed");

            return Err(PaymentError::Rejected { status, message });
        }

        let intent = response
            .json::<SetupIntent>()
            .await
            .map_err(PaymentError::Malformed)?;

        tracing::info!(setup_intent = %intent.id, "Created setup intent");
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixtures::provider::{self, Endpoints, ProviderFixture};

    async fn fixture_base() -> String {
        let addr = fixtures::spawn(provider::router(ProviderFixture::new()))
            .await
            .unwrap();
        Endpoints::for_base(&format!("http://{addr}")).stripe_api_base
    }

    fn client(secret_key: Option<&str>, api_base: String) -> StripeClient {
        StripeClient::new(
            StripeConfig {
                secret_key: secret_key.map(str::to_string),
                api_base,
            },
            reqwest::Client::new(),
        )
    }

    #[tokio::test]
    async fn test_creates_setup_intent() {
        let client = client(Some("sk_test_fixture"), fixture_base().await);

        let intent = client.create_setup_intent().await.unwrap();

        assert_eq!(intent.client_secret, provider::SETUP_INTENT_CLIENT_SECRET);
    }

    #[tokio::test]
    async fn test_rejected_key_surfaces_stripe_message() {
        let client = client(Some("pk_not_a_secret_key"), fixture_base().await);

        let err = client.create_setup_intent().await.unwrap_err();

        match err {
            PaymentError::Rejected { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "Invalid API Key provided");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let client = client(None, "http://127.0.0.1:1".to_string());

        let err = client.create_setup_intent().await.unwrap_err();

        assert!(matches!(err, PaymentError::NotConfigured), "{err:?}");
    }
}
