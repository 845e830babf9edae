//! API client tests against a mock catalog server.

use ceremony_catalog_sdk::{Metadata, Observation};
use ceremony_testgen::client::TestGenApiClient;
use ceremony_testgen::meta::ContextConfig;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_client(base_url: &str) -> TestGenApiClient {
    TestGenApiClient::with_options(
        base_url,
        Duration::from_secs(5),
        3,
        Duration::from_millis(10),
    )
    .unwrap()
}

fn observation(field_path: &str) -> Observation {
    Observation {
        metadata: Metadata::new(),
        field_path: field_path.to_string(),
        count: 1,
        has_null: false,
        has_empty: false,
    }
}

#[tokio::test]
async fn health_check_reflects_server_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/actuator/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(fast_client(&server.uri()).health_check().await);
    assert!(!fast_client("http://127.0.0.1:1").health_check().await);
}

#[tokio::test]
async fn context_exists_and_get_context() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalog/contexts/deposits"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"contextId": "deposits", "active": true})),
        )
        .mount(&server)
        .await;

    let client = fast_client(&server.uri());
    assert!(client.context_exists("deposits").await);
    assert!(!client.context_exists("loans").await);

    let context = client.get_context("deposits").await.unwrap();
    assert_eq!(context["contextId"], "deposits");
    assert!(client.get_context("loans").await.is_none());
}

#[tokio::test]
async fn create_context_treats_conflict_as_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/catalog/contexts"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let config = ContextConfig {
        context_id: "deposits".to_string(),
        ..ContextConfig::default()
    };
    assert!(fast_client(&server.uri()).create_context(&config).await.unwrap());

    // The posted body carries metadata keys and the active flag.
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["contextId"], "deposits");
    assert_eq!(body["displayName"], "deposits");
    assert_eq!(body["active"], true);
    assert!(body["requiredMetadata"].is_array());
}

#[tokio::test]
async fn create_context_failure_raises() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/catalog/contexts"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&server)
        .await;

    let config = ContextConfig {
        context_id: "deposits".to_string(),
        ..ContextConfig::default()
    };
    let err = fast_client(&server.uri())
        .create_context(&config)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("400"));
}

#[tokio::test]
async fn ensure_context_skips_creation_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalog/contexts/deposits"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = ContextConfig {
        context_id: "deposits".to_string(),
        ..ContextConfig::default()
    };
    assert!(fast_client(&server.uri())
        .ensure_context_exists(&config)
        .await
        .unwrap());

    // No POST happened.
    assert!(server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .all(|r| r.method.as_str() == "GET"));
}

#[tokio::test]
async fn delete_context_tolerates_absent_contexts() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/catalog/contexts/old"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = fast_client(&server.uri());
    assert!(client.delete_context("old").await.unwrap());
    // Unmatched routes 404, which still counts as deleted.
    assert!(client.delete_context("never-existed").await.unwrap());
}

#[tokio::test]
async fn submission_retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/catalog/contexts/c/observations"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/catalog/contexts/c/observations"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let result = fast_client(&server.uri())
        .submit_observations("c", &[observation("/R/A")])
        .await;

    assert!(result.success);
    assert_eq!(result.observation_count, 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn submission_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .mount(&server)
        .await;

    let result = fast_client(&server.uri())
        .submit_observations("c", &[observation("/R/A")])
        .await;

    assert!(!result.success);
    assert!(result.error_message.unwrap().contains("Server error: 500"));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn submission_never_retries_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_string("unprocessable"))
        .mount(&server)
        .await;

    let result = fast_client(&server.uri())
        .submit_observations("c", &[observation("/R/A")])
        .await;

    assert!(!result.success);
    assert!(result
        .error_message
        .unwrap()
        .contains("Client error: 422 - unprocessable"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_submission_is_a_trivial_success() {
    let server = MockServer::start().await;
    let result = fast_client(&server.uri()).submit_observations("c", &[]).await;
    assert!(result.success);
    assert_eq!(result.observation_count, 0);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn submit_xml_extracts_and_posts_observations() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/catalog/contexts/c/observations"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let metadata: Metadata = [("k".to_string(), "v".to_string())].into_iter().collect();
    let xml = r#"<Root xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
        <Child>value</Child>
        <Gone xsi:nil="true"/>
    </Root>"#;
    let result = fast_client(&server.uri())
        .submit_xml_observations("c", xml, &metadata)
        .await;

    assert!(result.success);
    assert_eq!(result.observation_count, 2);

    let requests = server.received_requests().await.unwrap();
    let body: Vec<Observation> = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body.len(), 2);
    let nil_record = body.iter().find(|o| o.field_path == "/Root/Gone").unwrap();
    assert!(nil_record.has_null);
    assert!(body.iter().all(|o| o.metadata == metadata));
}

#[tokio::test]
async fn submit_xml_with_no_observations_fails() {
    let server = MockServer::start().await;
    let result = fast_client(&server.uri())
        .submit_xml_observations("c", "not xml", &Metadata::new())
        .await;

    assert!(!result.success);
    assert_eq!(
        result.error_message.as_deref(),
        Some("No observations extracted from XML")
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}
