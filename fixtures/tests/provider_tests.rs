use fixtures::provider::{self, Endpoints, ProviderFixture};
use serde_json::Value;

async fn start_provider() -> (ProviderFixture, Endpoints) {
    let fixture = ProviderFixture::new();
    let addr = fixtures::spawn(provider::router(fixture.clone()))
        .await
        .expect("Failed to start provider fixture");

    (fixture, Endpoints::for_base(&format!("http://{addr}")))
}

async fn exchange(endpoints: &Endpoints, code: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(&endpoints.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", "client-id"),
            ("client_secret", "client-secret"),
            ("redirect_uri", "http://localhost:8080/auth/callback"),
        ])
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_authorize_redirects_back_with_code_and_state() {
    let (_fixture, endpoints) = start_provider().await;

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let response = client
        .get(&endpoints.auth_url)
        .query(&[
            ("redirect_uri", "http://localhost:8080/auth/callback"),
            ("state", "abc123"),
            ("client_id", "client-id"),
            ("response_type", "code"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()["location"].to_str().unwrap();
    assert_eq!(
        location,
        format!(
            "http://localhost:8080/auth/callback?code={}&state=abc123",
            provider::VALID_CODE
        )
    );
}

#[tokio::test]
async fn test_valid_code_yields_profile_with_email() {
    let (fixture, endpoints) = start_provider().await;

    let response = exchange(&endpoints, provider::VALID_CODE).await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let token: Value = response.json().await.unwrap();
    let access_token = token["access_token"].as_str().unwrap();

    let profile: Value = reqwest::Client::new()
        .get(&endpoints.userinfo_url)
        .bearer_auth(access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(profile["email"], provider::FIXTURE_EMAIL);
    assert_eq!(fixture.hits(), 2);
}

#[tokio::test]
async fn test_unknown_code_is_rejected() {
    let (_fixture, endpoints) = start_provider().await;

    let response = exchange(&endpoints, "made-up-code").await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["error"], "invalid_grant");
}

#[tokio::test]
async fn test_userinfo_requires_known_bearer() {
    let (_fixture, endpoints) = start_provider().await;

    let response = reqwest::Client::new()
        .get(&endpoints.userinfo_url)
        .bearer_auth("not-a-fixture-token")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_setup_intent_returns_client_secret() {
    let (_fixture, endpoints) = start_provider().await;

    let response = reqwest::Client::new()
        .post(format!("{}/v1/setup_intents", endpoints.stripe_api_base))
        .bearer_auth("sk_test_fixture")
        .form(&[("automatic_payment_methods[enabled]", "true")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["client_secret"], provider::SETUP_INTENT_CLIENT_SECRET);
}

#[tokio::test]
async fn test_setup_intent_rejects_bad_key() {
    let (_fixture, endpoints) = start_provider().await;

    let response = reqwest::Client::new()
        .post(format!("{}/v1/setup_intents", endpoints.stripe_api_base))
        .bearer_auth("pk_wrong_kind_of_key")
        .form(&[("automatic_payment_methods[enabled]", "true")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revoked_token_is_refused_by_userinfo() {
    let (fixture, endpoints) = start_provider().await;

    let token: Value = exchange(&endpoints, provider::REVOKED_TOKEN_CODE)
        .await
        .json()
        .await
        .unwrap();

    let response = reqwest::Client::new()
        .get(&endpoints.userinfo_url)
        .bearer_auth(token["access_token"].as_str().unwrap())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert_eq!(fixture.hits(), 2);
}
