//! Get and create calls against a mock registry

use base64::{engine::general_purpose::STANDARD, Engine as _};
use regsync_core::domain::{ResourceName, Style};
use regsync_core::ports::{IRegistryClient, RegistryError, ResourceBody};
use wiremock::{
    matchers::{body_partial_json, header, method, path, query_param},
    Mock, ResponseTemplate,
};

use crate::common;

fn name(s: &str) -> ResourceName {
    s.parse().unwrap()
}

// ============================================================================
// Get
// ============================================================================

#[tokio::test]
async fn test_get_existing_resource() {
    let (server, provider) = common::setup_registry_mock().await;
    common::mount_existing(&server, "projects/p/apis/payments").await;

    let resource = provider
        .get_resource(&name("projects/p/apis/payments"))
        .await
        .expect("get failed");

    assert_eq!(resource.name.as_str(), "projects/p/apis/payments");
    assert!(resource.create_time.is_some());
}

#[tokio::test]
async fn test_get_sends_bearer_token() {
    let (server, provider) = common::setup_registry_mock().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/p/apis/a"))
        .and(header("authorization", format!("Bearer {}", common::TEST_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "projects/p/apis/a"
        })))
        .expect(1)
        .mount(&server)
        .await;

    provider
        .get_resource(&name("projects/p/apis/a"))
        .await
        .expect("get failed");
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let (server, provider) = common::setup_registry_mock().await;
    common::mount_missing(&server, "projects/p/apis/missing").await;

    let err = provider
        .get_resource(&name("projects/p/apis/missing"))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err:?}");
}

#[tokio::test]
async fn test_get_server_error_is_other() {
    let (server, provider) = common::setup_registry_mock().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/p/apis/a"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(common::error_body(503, "UNAVAILABLE", "try later")),
        )
        .mount(&server)
        .await;

    let err = provider
        .get_resource(&name("projects/p/apis/a"))
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::Other("HTTP 503: try later".to_string()));
}

#[tokio::test]
async fn test_get_unparseable_body_is_other() {
    let (server, provider) = common::setup_registry_mock().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/p/apis/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = provider
        .get_resource(&name("projects/p/apis/a"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Other(_)));
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_api_posts_display_name() {
    let (server, provider) = common::setup_registry_mock().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/p/apis"))
        .and(query_param("api_id", "payments"))
        .and(body_partial_json(serde_json::json!({ "displayName": "payments" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "projects/p/apis/payments",
            "displayName": "payments"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = provider
        .create_resource(
            &name("projects/p"),
            "payments",
            ResourceBody::Api {
                display_name: "payments".to_string(),
            },
        )
        .await
        .expect("create failed");
    assert_eq!(created.display_name.as_deref(), Some("payments"));
}

#[tokio::test]
async fn test_create_spec_sends_base64_contents() {
    let (server, provider) = common::setup_registry_mock().await;
    common::mount_create(
        &server,
        "projects/p/apis/a/versions/v1",
        "specs",
        "spec_id",
        "openapi.yaml",
        1,
    )
    .await;

    let contents = vec![0x1f, 0x8b, 0x08, 0x00, 0xff];
    provider
        .create_resource(
            &name("projects/p/apis/a/versions/v1"),
            "openapi.yaml",
            ResourceBody::Spec {
                filename: "openapi.yaml".to_string(),
                style: Style::OpenApiV3,
                contents: contents.clone(),
            },
        )
        .await
        .expect("create failed");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(body["filename"], "openapi.yaml");
    assert_eq!(body["style"], "openapi/v3+gzip");
    let sent = STANDARD.decode(body["contents"].as_str().unwrap()).unwrap();
    assert_eq!(sent, contents);
}

#[tokio::test]
async fn test_create_conflict_is_already_exists() {
    let (server, provider) = common::setup_registry_mock().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/p/apis"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(common::error_body(409, "ALREADY_EXISTS", "api exists")),
        )
        .mount(&server)
        .await;

    let err = provider
        .create_resource(
            &name("projects/p"),
            "a",
            ResourceBody::Api {
                display_name: "a".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::AlreadyExists("api exists".to_string()));
}

#[tokio::test]
async fn test_create_permission_denied_is_other() {
    let (server, provider) = common::setup_registry_mock().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/p/apis"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = provider
        .create_resource(
            &name("projects/p"),
            "a",
            ResourceBody::Api {
                display_name: "a".to_string(),
            },
        )
        .await
        .unwrap_err();
    match err {
        RegistryError::Other(message) => assert!(message.starts_with("Unauthorized")),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_registry_is_other() {
    // Nothing listens on port 9 in the test environment.
    let client = regsync_registry::RegistryClient::with_base_url("http://127.0.0.1:9");
    let provider = regsync_registry::RegistryProvider::new(client);

    let err = provider
        .get_resource(&name("projects/p/apis/a"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Other(_)));
}
