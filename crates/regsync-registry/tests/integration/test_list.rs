//! Paged listing against a mock registry

use regsync_core::domain::{ResourceLevel, ResourceName};
use regsync_core::ports::IRegistryClient;
use regsync_core::usecases::ListQuery;
use wiremock::{
    matchers::{method, path, query_param, query_param_is_missing},
    Mock, ResponseTemplate,
};

use crate::common;

#[tokio::test]
async fn test_list_follows_page_tokens() {
    let (server, provider) = common::setup_registry_mock().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/p/apis"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "apis": [
                { "name": "projects/p/apis/a", "displayName": "a" },
                { "name": "projects/p/apis/b", "displayName": "b" }
            ],
            "nextPageToken": "page2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/p/apis"))
        .and(query_param("pageToken", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "apis": [{ "name": "projects/p/apis/c" }],
            "nextPageToken": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let parent: ResourceName = "projects/p".parse().unwrap();
    let apis = provider
        .list_resources(&parent, ResourceLevel::Api, None)
        .await
        .expect("list failed");

    let names: Vec<&str> = apis.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["projects/p/apis/a", "projects/p/apis/b", "projects/p/apis/c"]
    );
}

#[tokio::test]
async fn test_list_empty_collection() {
    let (server, provider) = common::setup_registry_mock().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/p/apis/a/versions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let parent: ResourceName = "projects/p/apis/a".parse().unwrap();
    let versions = provider
        .list_resources(&parent, ResourceLevel::Version, None)
        .await
        .expect("list failed");
    assert!(versions.is_empty());
}

#[tokio::test]
async fn test_list_query_sends_id_filter_and_wildcard_parent() {
    let (server, provider) = common::setup_registry_mock().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/p/apis/-/versions"))
        .and(query_param("filter", "version_id == 'v1'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "versions": [
                { "name": "projects/p/apis/a/versions/v1" },
                { "name": "projects/p/apis/b/versions/v1" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = ListQuery::parse("projects/p/apis/-/versions/v1", None).unwrap();
    let versions = query.execute(&provider).await.expect("list failed");
    assert_eq!(versions.len(), 2);
}

#[tokio::test]
async fn test_list_repeated_page_token_is_an_error() {
    let (server, provider) = common::setup_registry_mock().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/p/apis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "apis": [],
            "nextPageToken": "same"
        })))
        .mount(&server)
        .await;

    let parent: ResourceName = "projects/p".parse().unwrap();
    assert!(provider
        .list_resources(&parent, ResourceLevel::Api, None)
        .await
        .is_err());
}
