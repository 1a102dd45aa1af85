//! RegistryProvider - IRegistryClient implementation over HTTP
//!
//! Wraps the [`RegistryClient`] to fulfil the
//! [`IRegistryClient`] port contract: wire DTOs become domain
//! [`Resource`]s and HTTP failures are folded into the closed
//! [`RegistryError`] enum the use cases inspect.

use std::str::FromStr;

use regsync_core::config::RegistryConfig;
use regsync_core::domain::{ResourceLevel, ResourceName, Style};
use regsync_core::ports::{IRegistryClient, RegistryError, Resource, ResourceBody};
use tracing::warn;

use crate::client::{RegistryClient, ResourceDto};

/// Registry port adapter backed by the REST client
#[derive(Debug, Clone)]
pub struct RegistryProvider {
    client: RegistryClient,
}

impl RegistryProvider {
    pub fn new(client: RegistryClient) -> Self {
        Self { client }
    }

    /// Builds the provider from the `registry` config section
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(RegistryClient::from_config(config))
    }

    pub fn client(&self) -> &RegistryClient {
        &self.client
    }
}

/// Converts a wire resource into the port type
///
/// An unknown style token is dropped rather than failing the call; the name
/// must parse.
fn dto_to_resource(dto: ResourceDto) -> Result<Resource, RegistryError> {
    let name = ResourceName::from_str(&dto.name).map_err(|e| {
        RegistryError::Other(format!("registry returned an invalid name: {e}"))
    })?;

    let style = dto.style.as_deref().and_then(|token| match Style::from_str(token) {
        Ok(style) => Some(style),
        Err(_) => {
            warn!(name = %name, style = token, "Ignoring unknown style");
            None
        }
    });

    Ok(Resource {
        name,
        display_name: dto.display_name,
        filename: dto.filename,
        style,
        size_bytes: dto.size_bytes,
        create_time: dto.create_time,
    })
}

#[async_trait::async_trait]
impl IRegistryClient for RegistryProvider {
    async fn get_resource(&self, name: &ResourceName) -> Result<Resource, RegistryError> {
        let dto = self.client.get(name).await?;
        dto_to_resource(dto)
    }

    async fn create_resource(
        &self,
        parent: &ResourceName,
        id: &str,
        body: ResourceBody,
    ) -> Result<Resource, RegistryError> {
        let dto = self.client.create(parent, id, &body).await?;
        dto_to_resource(dto)
    }

    async fn list_resources(
        &self,
        parent: &ResourceName,
        level: ResourceLevel,
        filter: Option<&str>,
    ) -> Result<Vec<Resource>, RegistryError> {
        self.client
            .list_all(parent, level, filter)
            .await?
            .into_iter()
            .map(dto_to_resource)
            .collect()
    }
}
