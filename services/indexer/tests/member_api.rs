//! Member service client tests against a mock HTTP server.

use projview_indexer::members::{LookupError, MemberApiClient, MemberApiConfig, MemberLookup};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer, auth: bool) -> MemberApiConfig {
    MemberApiConfig {
        base_url: format!("{}/members", server.uri()),
        auth_url: auth.then(|| format!("{}/oauth/token", server.uri())),
        client_id: "indexer".to_string(),
        client_secret: "secret".to_string(),
        audience: "https://members.example.com".to_string(),
    }
}

#[tokio::test]
async fn test_member_details_queries_by_user_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/members/_search"))
        .and(query_param("query", "userId:9 OR userId:10"))
        .and(query_param(
            "fields",
            "userId,handle,firstName,lastName,email",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"userId": 9, "handle": "niner", "firstName": "Nine", "lastName": "Er", "email": "9@x.com"},
            {"userId": 10, "handle": "tenner"},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = MemberApiClient::new(config(&server, false)).unwrap();
    let profiles = client.member_details(&[9, 10]).await.unwrap();

    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0].handle.as_deref(), Some("niner"));
    assert_eq!(profiles[1].user_id, 10);
    assert!(profiles[1].email.is_none());
}

#[tokio::test]
async fn test_member_details_skips_request_for_empty_id_list() {
    let server = MockServer::start().await;
    // no mock mounted: any request would fail the test

    let client = MemberApiClient::new(config(&server, false)).unwrap();
    let profiles = client.member_details(&[]).await.unwrap();
    assert!(profiles.is_empty());
}

#[tokio::test]
async fn test_token_is_exchanged_once_and_reused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "expires_in": 3600,
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/members/_search"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = MemberApiClient::new(config(&server, true)).unwrap();
    client.member_details(&[1]).await.unwrap();
    client.member_details(&[2]).await.unwrap();
}

#[tokio::test]
async fn test_failed_exchange_surfaces_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
        .mount(&server)
        .await;

    let client = MemberApiClient::new(config(&server, true)).unwrap();
    let err = client.member_details(&[1]).await.unwrap_err();
    assert!(matches!(err, LookupError::Auth(_)));
}

#[tokio::test]
async fn test_unexpected_status_surfaces_lookup_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/members/_search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = MemberApiClient::new(config(&server, false)).unwrap();
    let err = client.member_details(&[1]).await.unwrap_err();
    assert!(matches!(
        err,
        LookupError::UnexpectedStatus { status: 500, .. }
    ));
}
