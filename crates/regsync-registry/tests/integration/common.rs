//! Shared test helpers for registry integration tests
//!
//! Each helper mounts mock endpoints on a wiremock server. Resource paths
//! follow the registry layout: `/v1/projects/{p}/apis/{a}/...`.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use regsync_registry::{RegistryClient, RegistryProvider};

pub const TEST_TOKEN: &str = "test-token";

/// Starts a mock server and returns a provider pointing at it.
pub async fn setup_registry_mock() -> (MockServer, RegistryProvider) {
    let server = MockServer::start().await;
    let client = RegistryClient::new(server.uri(), Some(TEST_TOKEN.to_string()));
    (server, RegistryProvider::new(client))
}

/// JSON error body in the registry's wrapped format
pub fn error_body(code: u16, status: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "error": { "code": code, "message": message, "status": status }
    })
}

/// Mounts `GET /v1/{name}` returning the named resource.
pub async fn mount_existing(server: &MockServer, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": name,
            "createTime": "2024-03-01T10:00:00Z"
        })))
        .mount(server)
        .await;
}

/// Mounts `GET /v1/{name}` returning 404.
pub async fn mount_missing(server: &MockServer, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/{name}")))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(error_body(404, "NOT_FOUND", name)),
        )
        .mount(server)
        .await;
}

/// Mounts `POST /v1/{parent}/{collection}?{id_field}={id}` echoing the
/// created name, expecting exactly `times` calls.
pub async fn mount_create(
    server: &MockServer,
    parent: &str,
    collection: &str,
    id_field: &str,
    id: &str,
    times: u64,
) {
    Mock::given(method("POST"))
        .and(path(format!("/v1/{parent}/{collection}")))
        .and(query_param(id_field, id))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": format!("{parent}/{collection}/{id}")
        })))
        .expect(times)
        .mount(server)
        .await;
}
