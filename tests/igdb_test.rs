//! IGDB provider against a mock API, including the 401 re-auth dance.

mod common;

use std::sync::Arc;

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use loreforge::auth::{TokenStore, TwitchAuthenticator};
use loreforge::catalog::providers::IgdbProvider;
use loreforge::catalog::CatalogProvider;
use loreforge_common::{CoverRef, Error, FieldValue};

fn celeste_json() -> serde_json::Value {
    serde_json::json!([{
        "id": 26226,
        "name": "Celeste",
        "summary": "A platformer about climbing a mountain.",
        "first_release_date": 1516838400,
        "platforms": [{"name": "PC"}, {"name": "Nintendo Switch"}],
        "genres": [{"name": "Platform"}, {"name": "Indie"}],
        "cover": {"image_id": "co3byy"}
    }])
}

/// Mount a token endpoint handing out sequentially numbered tokens.
async fn mount_token_endpoint(server: &MockServer, expected_calls: u64) {
    for n in 0..expected_calls {
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": format!("tok-{n}"),
                "expires_in": 3600,
            })))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
}

fn provider_for(server: &MockServer, dir: &std::path::Path) -> IgdbProvider {
    let authenticator = TwitchAuthenticator::new("client-id".into(), "secret".into())
        .with_token_url(format!("{}/oauth2/token", server.uri()));
    let tokens = Arc::new(TokenStore::new(Box::new(authenticator), dir));
    IgdbProvider::new("client-id".into(), tokens).with_base_url(server.uri())
}

#[tokio::test]
async fn search_sends_apicalypse_query_and_maps_records() {
    common::init_tracing();
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/games"))
        .and(header("Client-ID", "client-id"))
        .and(header("Authorization", "Bearer tok-0"))
        .and(body_string_contains("search \"Celeste\""))
        .and(body_string_contains("limit 5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(celeste_json()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let provider = provider_for(&server, dir.path());

    let results = provider.search("Celeste", 5).await.unwrap();
    assert_eq!(results.len(), 1);
    let record = &results[0];
    assert_eq!(record.title, "Celeste");
    assert_eq!(record.external_id, "26226");
    assert_eq!(record.cover, Some(CoverRef::ImageId("co3byy".into())));
    assert_eq!(
        record.fields.get("release_date"),
        Some(&FieldValue::Text("2018-01-25".into()))
    );
}

#[tokio::test]
async fn rejected_token_is_invalidated_and_retried_once() {
    common::init_tracing();
    let server = MockServer::start().await;
    // Two token grants: the original and the post-invalidation refresh.
    mount_token_endpoint(&server, 2).await;

    // First games call is rejected, the retry with the fresh token succeeds.
    Mock::given(method("POST"))
        .and(path("/games"))
        .and(header("Authorization", "Bearer tok-0"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/games"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(celeste_json()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let provider = provider_for(&server, dir.path());

    let results = provider.search("Celeste", 5).await.unwrap();
    assert_eq!(results[0].title, "Celeste");
}

#[tokio::test]
async fn second_rejection_is_auth_unavailable() {
    common::init_tracing();
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 2).await;

    Mock::given(method("POST"))
        .and(path("/games"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let provider = provider_for(&server, dir.path());

    let err = provider.search("Celeste", 5).await.unwrap_err();
    assert!(matches!(err, Error::AuthUnavailable(_)));
}

#[tokio::test]
async fn server_error_is_provider_unavailable() {
    common::init_tracing();
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/games"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let provider = provider_for(&server, dir.path());

    let err = provider.search("Celeste", 5).await.unwrap_err();
    assert!(matches!(
        err,
        Error::ProviderUnavailable {
            provider: "igdb",
            ..
        }
    ));
}

#[tokio::test]
async fn fetch_by_id_queries_by_where_clause() {
    common::init_tracing();
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/games"))
        .and(body_string_contains("where id = 26226"))
        .respond_with(ResponseTemplate::new(200).set_body_json(celeste_json()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let provider = provider_for(&server, dir.path());

    let record = provider.fetch_by_id("26226").await.unwrap();
    assert_eq!(record.title, "Celeste");
}
