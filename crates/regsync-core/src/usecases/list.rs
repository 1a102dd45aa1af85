//! Listing use case
//!
//! Turns a name pattern such as `projects/p/apis/-/versions/v1` into a
//! listing of one collection plus a filter. The deepest collection named is
//! the one listed. When the pattern ends with an id other than `-`, that id
//! becomes an equality filter on the collection's id field; `-` in parent
//! positions is passed through as the registry's wildcard.

use tracing::debug;

use crate::domain::{DomainError, ResourceLevel, ResourceName};
use crate::ports::{IRegistryClient, RegistryError, Resource};

/// Wildcard id accepted by the registry in list parents
pub const WILDCARD: &str = "-";

/// A resolved listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub parent: ResourceName,
    pub level: ResourceLevel,
    pub filter: Option<String>,
}

impl ListQuery {
    /// Parses `pattern`, combining a trailing id with `extra_filter` using `&&`.
    ///
    /// `projects/p` alone lists the project's APIs.
    pub fn parse(pattern: &str, extra_filter: Option<&str>) -> Result<Self, DomainError> {
        let parts: Vec<&str> = pattern.trim_end_matches('/').split('/').collect();
        if parts.len() < 2 || parts[0] != "projects" {
            return Err(DomainError::InvalidName(format!(
                "list pattern must start with projects/<id>: {pattern}"
            )));
        }

        let mut parent = ResourceName::project(parts[1])?;
        let mut level = ResourceLevel::Api;
        let mut id: Option<&str> = None;

        let rest = &parts[2..];
        for (index, pair) in rest.chunks(2).enumerate() {
            let expected = ResourceLevel::ALL.get(index).ok_or_else(|| {
                DomainError::InvalidName(format!("too many segments in {pattern}"))
            })?;
            if pair[0] != expected.collection() {
                return Err(DomainError::InvalidName(format!(
                    "expected '{}' in {pattern}",
                    expected.collection()
                )));
            }
            level = *expected;
            id = pair.get(1).copied();

            let is_last = (index + 1) * 2 >= rest.len();
            if !is_last {
                let segment = id.ok_or_else(|| DomainError::InvalidName(pattern.to_string()))?;
                parent = parent.child(level, segment)?;
                id = None;
            }
        }

        let mut clauses = Vec::new();
        if let Some(filter) = extra_filter.filter(|f| !f.is_empty()) {
            clauses.push(filter.to_string());
        }
        if let Some(id) = id.filter(|id| *id != WILDCARD) {
            clauses.push(format!("{} == '{}'", level.id_field(), id));
        }
        let filter = if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" && "))
        };

        Ok(Self {
            parent,
            level,
            filter,
        })
    }

    /// Runs the listing against `client`
    pub async fn execute(&self, client: &dyn IRegistryClient) -> Result<Vec<Resource>, RegistryError> {
        debug!(
            parent = %self.parent,
            level = %self.level,
            filter = ?self.filter,
            "Listing resources"
        );
        client
            .list_resources(&self.parent, self.level, self.filter.as_deref())
            .await
    }
}
