//! Integration tests for `ClientSecretCredential` against a mocked Azure AD
//! token endpoint, and for wiring it into `IntuneClient`.

use std::sync::Arc;

use intune_profiles::auth::{ClientSecretCredential, TokenCredential};
use intune_profiles::client::IntuneClient;
use intune_profiles::error::{AuthError, IntuneError};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

fn credential(server: &MockServer) -> ClientSecretCredential {
    ClientSecretCredential::with_authority_host(
        "tenant-1",
        "client-1",
        SecretString::from("s3cret".to_owned()),
        &server.uri(),
    )
}

#[tokio::test]
async fn token_request_posts_client_credentials_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-1"))
        .and(body_string_contains("client_secret=s3cret"))
        .and(body_string_contains(
            "scope=https%3A%2F%2Fgraph.microsoft.com%2F.default",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "ext_expires_in": 3599,
            "access_token": "graph-token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = credential(&server).get_token(&[GRAPH_SCOPE]).await.unwrap();
    assert_eq!(token.token, "graph-token");
    assert!(token.expires_on.is_some());
}

#[tokio::test]
async fn token_is_cached_per_scope() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "expires_in": 3599,
            "access_token": "cached-token"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let cred = credential(&server);
    let first = cred.get_token(&[GRAPH_SCOPE]).await.unwrap();
    let second = cred.get_token(&[GRAPH_SCOPE]).await.unwrap();
    assert_eq!(first.token, second.token);

    // A different scope set misses the cache.
    cred.get_token(&["https://management.azure.com/.default"])
        .await
        .unwrap();
}

#[tokio::test]
async fn rejected_token_request_keeps_aadsts_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided."
        })))
        .mount(&server)
        .await;

    let err = credential(&server)
        .get_token(&[GRAPH_SCOPE])
        .await
        .unwrap_err();
    let auth = err
        .downcast_ref::<AuthError>()
        .expect("credential error should be an AuthError");
    match auth {
        AuthError::Rejected { status, body } => {
            assert_eq!(status.as_u16(), 401);
            assert!(body.contains("AADSTS7000215"));
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn client_uses_client_secret_token_and_surfaces_auth_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("AADSTS90002: Tenant not found"))
        .mount(&server)
        .await;

    let client = IntuneClient::with_endpoint(Arc::new(credential(&server)), &server.uri());
    let err = client.delete_profile("123").await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "token request failed (400 Bad Request): AADSTS90002: Tenant not found"
    );
    assert!(matches!(err, IntuneError::Credential(_)));
}

#[tokio::test]
async fn client_sends_acquired_token_to_graph() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "expires_in": 3599,
            "access_token": "aad-token"
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/deviceManagement/deviceConfigurations/abc"))
        .and(header("Authorization", "Bearer aad-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = IntuneClient::with_endpoint(Arc::new(credential(&server)), &server.uri());
    client.delete_profile("abc").await.unwrap();
}
