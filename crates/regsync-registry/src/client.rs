//! Registry REST client
//!
//! Provides a typed HTTP client for the registry's REST/JSON surface.
//! Handles the bearer header, URL construction, JSON (de)serialization and
//! classification of error responses.
//!
//! ## Endpoints
//!
//! ```text
//! GET  {base}/v1/{name}                                  get
//! POST {base}/v1/{parent}/{collection}?{level}_id={id}   create
//! GET  {base}/v1/{parent}/{collection}?filter=&pageToken= list (paged)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use regsync_registry::client::RegistryClient;
//!
//! # async fn example() -> Result<(), regsync_registry::RegistryHttpError> {
//! let client = RegistryClient::new("http://localhost:8080", None);
//! let api = client.get(&"projects/demo/apis/payments".parse().unwrap()).await?;
//! println!("{}", api.name);
//! # Ok(())
//! # }
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use regsync_core::config::RegistryConfig;
use regsync_core::domain::{ResourceLevel, ResourceName};
use regsync_core::ports::ResourceBody;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::RegistryHttpError;

/// Path prefix of the registry's REST surface
const API_VERSION: &str = "v1";

// ============================================================================
// Registry wire types
// ============================================================================

/// A resource as serialized by the registry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDto {
    /// Full resource name
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
}

/// Request body of a create call
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
    /// Base64 encoded spec contents
    #[serde(skip_serializing_if = "Option::is_none")]
    contents: Option<String>,
}

impl<'a> From<&'a ResourceBody> for CreateRequest<'a> {
    fn from(body: &'a ResourceBody) -> Self {
        match body {
            ResourceBody::Api { display_name } | ResourceBody::Version { display_name } => Self {
                display_name: Some(display_name),
                filename: None,
                style: None,
                contents: None,
            },
            ResourceBody::Spec {
                filename,
                style,
                contents,
            } => Self {
                display_name: None,
                filename: Some(filename),
                style: Some(style.as_str()),
                contents: Some(STANDARD.encode(contents)),
            },
        }
    }
}

/// One page of a list response
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub resources: Vec<ResourceDto>,
    /// Token for the next page; `None` on the last page
    pub next_page_token: Option<String>,
}

// ============================================================================
// RegistryClient
// ============================================================================

/// HTTP client for registry calls
///
/// Wraps `reqwest::Client` with base URL construction and an optional
/// bearer token. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL, without a trailing slash
    base_url: String,
    /// Bearer token attached to every request, when set
    token: Option<String>,
}

impl RegistryClient {
    /// Creates a client for the registry at `address`
    pub fn new(address: impl Into<String>, token: Option<String>) -> Self {
        let base_url = address.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Creates a client without credentials (useful for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::new(base_url, None)
    }

    /// Creates a client from the `registry` config section
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.address.clone(), config.token.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the URL for `path` below the API prefix.
    ///
    /// Each `/`-separated segment is percent-encoded on its own, so ids
    /// holding `?`, `#` or `%` stay inside the path.
    fn url(&self, path: &str) -> Result<Url, RegistryHttpError> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(API_VERSION)
            .extend(path.split('/'));
        Ok(url)
    }

    /// Creates a request builder with the bearer header when configured
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends `request` and classifies any non-success status
    async fn execute(&self, request: RequestBuilder) -> Result<Response, RegistryHttpError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %body, "Registry returned error status");
        Err(RegistryHttpError::from_response(status, &body))
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, RegistryHttpError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| RegistryHttpError::InvalidResponse(e.to_string()))
    }

    /// Fetches a single resource by name
    #[instrument(skip(self), fields(name = %name))]
    pub async fn get(&self, name: &ResourceName) -> Result<ResourceDto, RegistryHttpError> {
        let url = self.url(name.as_str())?;
        let response = self.execute(self.request(Method::GET, url)).await?;
        Self::parse(response).await
    }

    /// Creates `parent/{collection}/{id}` from `body`
    #[instrument(skip(self, body), fields(parent = %parent, level = %body.level()))]
    pub async fn create(
        &self,
        parent: &ResourceName,
        id: &str,
        body: &ResourceBody,
    ) -> Result<ResourceDto, RegistryHttpError> {
        let level = body.level();
        let mut url = self.url(&format!("{}/{}", parent, level.collection()))?;
        url.query_pairs_mut().append_pair(level.id_field(), id);

        debug!(id, size = ?body.payload_size(), "Creating resource");
        let request = self
            .request(Method::POST, url)
            .json(&CreateRequest::from(body));
        let response = self.execute(request).await?;
        Self::parse(response).await
    }

    /// Fetches one page of `parent/{collection}`
    pub async fn list_page(
        &self,
        parent: &ResourceName,
        level: ResourceLevel,
        filter: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<ListPage, RegistryHttpError> {
        let mut url = self.url(&format!("{}/{}", parent, level.collection()))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(filter) = filter.filter(|f| !f.is_empty()) {
                query.append_pair("filter", filter);
            }
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }

        let response = self.execute(self.request(Method::GET, url)).await?;
        let mut page: serde_json::Value = Self::parse(response).await?;

        let resources = match page.get_mut(level.collection()).map(serde_json::Value::take) {
            Some(items) => serde_json::from_value(items)
                .map_err(|e| RegistryHttpError::InvalidResponse(e.to_string()))?,
            None => Vec::new(),
        };
        let next_page_token = page
            .get("nextPageToken")
            .and_then(serde_json::Value::as_str)
            .filter(|t| !t.is_empty())
            .map(String::from);

        Ok(ListPage {
            resources,
            next_page_token,
        })
    }

    /// Lists every resource of `parent/{collection}`, following page tokens
    #[instrument(skip(self), fields(parent = %parent, level = %level))]
    pub async fn list_all(
        &self,
        parent: &ResourceName,
        level: ResourceLevel,
        filter: Option<&str>,
    ) -> Result<Vec<ResourceDto>, RegistryHttpError> {
        let mut resources = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_page(parent, level, filter, page_token.as_deref())
                .await?;
            debug!(count = page.resources.len(), "Received list page");
            resources.extend(page.resources);

            match page.next_page_token {
                Some(token) if Some(&token) != page_token.as_ref() => page_token = Some(token),
                Some(_) => {
                    return Err(RegistryHttpError::InvalidResponse(
                        "list returned the same page token twice".to_string(),
                    ))
                }
                None => break,
            }
        }

        Ok(resources)
    }
}

// ============================================================================
// Unit tests
// ============================================================================
