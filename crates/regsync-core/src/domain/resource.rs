//! Registry resource levels and names
//!
//! The registry addresses every artifact through the chain
//! `projects/{p}/apis/{a}/versions/{v}/specs/{s}`. [`ResourceLevel`] names
//! the three levels below a project and [`ResourceName`] is a validated,
//! typed form of such a path.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// One level of the API → Version → Spec hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceLevel {
    Api,
    Version,
    Spec,
}

impl ResourceLevel {
    /// Parent-to-child order
    pub const ALL: [ResourceLevel; 3] =
        [ResourceLevel::Api, ResourceLevel::Version, ResourceLevel::Spec];

    /// Collection segment used in resource names (`apis`, `versions`, `specs`)
    pub const fn collection(&self) -> &'static str {
        match self {
            ResourceLevel::Api => "apis",
            ResourceLevel::Version => "versions",
            ResourceLevel::Spec => "specs",
        }
    }

    /// Name of the id parameter on create requests and list filters
    pub const fn id_field(&self) -> &'static str {
        match self {
            ResourceLevel::Api => "api_id",
            ResourceLevel::Version => "version_id",
            ResourceLevel::Spec => "spec_id",
        }
    }

    /// Number of `collection/id` pairs below the project for this level
    const fn depth(&self) -> usize {
        match self {
            ResourceLevel::Api => 1,
            ResourceLevel::Version => 2,
            ResourceLevel::Spec => 3,
        }
    }

    fn from_depth(depth: usize) -> Option<Self> {
        match depth {
            1 => Some(ResourceLevel::Api),
            2 => Some(ResourceLevel::Version),
            3 => Some(ResourceLevel::Spec),
            _ => None,
        }
    }

    /// Looks a level up by its collection segment
    pub fn from_collection(collection: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|level| level.collection() == collection)
            .copied()
    }
}

impl Display for ResourceLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ResourceLevel::Api => write!(f, "api"),
            ResourceLevel::Version => write!(f, "version"),
            ResourceLevel::Spec => write!(f, "spec"),
        }
    }
}

/// Checks that `id` is usable as a single name segment
pub(crate) fn validate_id(id: &str) -> Result<(), DomainError> {
    if id.is_empty() {
        return Err(DomainError::InvalidName("empty id".to_string()));
    }
    if id.contains('/') {
        return Err(DomainError::InvalidName(format!(
            "id must not contain '/': {id}"
        )));
    }
    Ok(())
}

/// A validated registry resource name
///
/// Always starts with `projects/{id}` and continues with zero to three
/// `collection/id` pairs in hierarchy order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName(String);

impl ResourceName {
    /// Name of a project
    pub fn project(id: &str) -> Result<Self, DomainError> {
        validate_id(id)?;
        Ok(Self(format!("projects/{id}")))
    }

    /// Name of the child `id` at `level` under this resource.
    ///
    /// `level` must be exactly one below this name's own level.
    pub fn child(&self, level: ResourceLevel, id: &str) -> Result<Self, DomainError> {
        validate_id(id)?;
        if level.depth() != self.depth() + 1 {
            return Err(DomainError::InvalidName(format!(
                "{} cannot be created under {}",
                level, self.0
            )));
        }
        Ok(Self(format!("{}/{}/{}", self.0, level.collection(), id)))
    }

    /// The level of this resource, `None` for a project
    pub fn level(&self) -> Option<ResourceLevel> {
        ResourceLevel::from_depth(self.depth())
    }

    /// The parent resource, `None` for a project
    pub fn parent(&self) -> Option<Self> {
        if self.depth() == 0 {
            return None;
        }
        let mut parts: Vec<&str> = self.0.split('/').collect();
        parts.truncate(parts.len() - 2);
        Some(Self(parts.join("/")))
    }

    /// The trailing id segment
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// The project id
    pub fn project_id(&self) -> &str {
        self.0.split('/').nth(1).unwrap_or_default()
    }

    /// Returns the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn depth(&self) -> usize {
        self.0.split('/').count() / 2 - 1
    }
}

impl Display for ResourceName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() < 2 || parts.len() % 2 != 0 || parts.len() > 8 {
            return Err(DomainError::InvalidName(s.to_string()));
        }
        if parts[0] != "projects" {
            return Err(DomainError::InvalidName(format!(
                "name must start with projects/: {s}"
            )));
        }
        for (index, pair) in parts.chunks(2).enumerate().skip(1) {
            let expected = ResourceLevel::ALL[index - 1].collection();
            if pair[0] != expected {
                return Err(DomainError::InvalidName(format!(
                    "expected '{expected}' segment in {s}"
                )));
            }
        }
        for id in parts.iter().skip(1).step_by(2) {
            validate_id(id)?;
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for ResourceName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceName> for String {
    fn from(name: ResourceName) -> Self {
        name.0
    }
}
