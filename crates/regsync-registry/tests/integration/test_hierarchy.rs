//! Hierarchy ensure over HTTP
//!
//! Drives the core ensure use case through the HTTP provider to check the
//! exact request sequence the registry sees.

use std::sync::Arc;

use regsync_core::domain::{ResourceAddress, Style};
use regsync_core::ports::{IRegistryClient, ResourceBody};
use regsync_core::usecases::{BoxError, GateOutcome, HierarchyEnsurer};
use wiremock::{
    matchers::{method, path},
    Mock, ResponseTemplate,
};

use crate::common;

fn address() -> ResourceAddress {
    ResourceAddress::from_relative_path("p", std::path::Path::new("payments/v1/openapi.yaml"))
        .unwrap()
}

async fn spec_body() -> Result<ResourceBody, BoxError> {
    Ok(ResourceBody::Spec {
        filename: "openapi.yaml".to_string(),
        style: Style::OpenApiV3,
        contents: vec![1, 2, 3, 4],
    })
}

async fn unused_body() -> Result<ResourceBody, BoxError> {
    panic!("contents must not be built for an existing spec")
}

#[tokio::test]
async fn test_missing_hierarchy_is_created_top_down() {
    let (server, provider) = common::setup_registry_mock().await;
    common::mount_missing(&server, "projects/p/apis/payments").await;
    common::mount_missing(&server, "projects/p/apis/payments/versions/v1").await;
    common::mount_missing(&server, "projects/p/apis/payments/versions/v1/specs/openapi.yaml").await;
    common::mount_create(&server, "projects/p", "apis", "api_id", "payments", 1).await;
    common::mount_create(
        &server,
        "projects/p/apis/payments",
        "versions",
        "version_id",
        "v1",
        1,
    )
    .await;
    common::mount_create(
        &server,
        "projects/p/apis/payments/versions/v1",
        "specs",
        "spec_id",
        "openapi.yaml",
        1,
    )
    .await;

    let ensurer = HierarchyEnsurer::new(Arc::new(provider) as Arc<dyn IRegistryClient>);
    let outcome = ensurer
        .ensure_hierarchy(&address(), spec_body)
        .await
        .expect("ensure failed");
    assert_eq!(outcome.created_count(), 3);

    let sequence: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| format!("{} {}", r.method.as_str(), r.url.path()))
        .collect();
    assert_eq!(
        sequence,
        vec![
            "GET /v1/projects/p/apis/payments",
            "POST /v1/projects/p/apis",
            "GET /v1/projects/p/apis/payments/versions/v1",
            "POST /v1/projects/p/apis/payments/versions",
            "GET /v1/projects/p/apis/payments/versions/v1/specs/openapi.yaml",
            "POST /v1/projects/p/apis/payments/versions/v1/specs",
        ]
    );
}

#[tokio::test]
async fn test_existing_hierarchy_issues_only_gets() {
    let (server, provider) = common::setup_registry_mock().await;
    common::mount_existing(&server, "projects/p/apis/payments").await;
    common::mount_existing(&server, "projects/p/apis/payments/versions/v1").await;
    common::mount_existing(&server, "projects/p/apis/payments/versions/v1/specs/openapi.yaml")
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let ensurer = HierarchyEnsurer::new(Arc::new(provider) as Arc<dyn IRegistryClient>);
    let outcome = ensurer
        .ensure_hierarchy(&address(), unused_body)
        .await
        .expect("ensure failed");
    assert_eq!(outcome.spec, GateOutcome::Found);
    assert_eq!(outcome.created_count(), 0);
}

#[tokio::test]
async fn test_failed_api_get_stops_the_chain() {
    let (server, provider) = common::setup_registry_mock().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/p/apis/payments"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(common::error_body(500, "INTERNAL", "database down")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ensurer = HierarchyEnsurer::new(Arc::new(provider) as Arc<dyn IRegistryClient>);
    let err = ensurer
        .ensure_hierarchy(&address(), unused_body)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("projects/p/apis/payments"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_spec_create_conflict_is_a_lost_race() {
    let (server, provider) = common::setup_registry_mock().await;
    common::mount_missing(&server, "projects/p/apis/a/versions/v1/specs/openapi.yaml").await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/p/apis/a/versions/v1/specs"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(common::error_body(409, "ALREADY_EXISTS", "spec exists")),
        )
        .mount(&server)
        .await;

    let ensurer = HierarchyEnsurer::new(Arc::new(provider) as Arc<dyn IRegistryClient>);
    let version = "projects/p/apis/a/versions/v1".parse().unwrap();
    let outcome = ensurer
        .ensure_spec(&version, "openapi.yaml", spec_body)
        .await
        .expect("ensure failed");
    assert_eq!(outcome, GateOutcome::Raced);
}
