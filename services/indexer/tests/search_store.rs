//! Search-backend document store tests against a mock HTTP server.

use projview_indexer::store::{Collection, DocumentStore, SearchStore, StoreConfig, StoreError};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> StoreConfig {
    StoreConfig {
        base_url: server.uri(),
        ..StoreConfig::default()
    }
}

#[tokio::test]
async fn test_get_unwraps_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/_doc/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_index": "projects",
            "_id": "5",
            "found": true,
            "_source": {"id": 5, "name": "p"},
        })))
        .mount(&server)
        .await;

    let store = SearchStore::new(config(&server)).unwrap();
    let doc = store.get(Collection::Projects, "5").await.unwrap();
    assert_eq!(doc, json!({"id": 5, "name": "p"}));
}

#[tokio::test]
async fn test_get_maps_404_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/timelines/_doc/9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = SearchStore::new(config(&server)).unwrap();
    let err = store.get(Collection::Timelines, "9").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_create_uses_create_endpoint_and_maps_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/projects/_create/5"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let store = SearchStore::new(config(&server)).unwrap();
    let err = store
        .create(Collection::Projects, "5", &json!({"id": 5}))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));
}

#[tokio::test]
async fn test_update_wraps_partial_in_doc_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/metadata/_update/1"))
        .and(body_json(json!({"doc": {"forms": []}})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = SearchStore::new(config(&server)).unwrap();
    store
        .update(Collection::Metadata, "1", &json!({"forms": []}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_maps_404_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/customerPayments/_doc/3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = SearchStore::new(config(&server)).unwrap();
    let err = store.delete(Collection::Payments, "3").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_unexpected_status_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/_doc/5"))
        .respond_with(ResponseTemplate::new(500).set_body_string("shard trouble"))
        .mount(&server)
        .await;

    let store = SearchStore::new(config(&server)).unwrap();
    let err = store.get(Collection::Projects, "5").await.unwrap_err();
    match err {
        StoreError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "shard trouble");
        }
        other => panic!("unexpected error: {other}"),
    }
}
