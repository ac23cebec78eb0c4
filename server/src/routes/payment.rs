use axum::{extract::State, Json};
use color_eyre::eyre::WrapErr;
use serde::Serialize;

use crate::{errors::ServerResult, state::AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupIntentResponse {
    pub client_secret: String,
}

/// Create a Stripe setup intent and hand its client secret to the frontend
pub async fn create_setup_intent(
    State(state): State<AppState>,
) -> ServerResult<Json<SetupIntentResponse>> {
    let intent = state
        .stripe
        .create_setup_intent()
        .await
        .wrap_err("Failed to create setup intent")?;

    Ok(Json(SetupIntentResponse {
        client_secret: intent.client_secret,
    }))
}
