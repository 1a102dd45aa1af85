//! Path-derived resource addresses
//!
//! A spec file at `a/b/c/{version}/{spec}` below a traversal root maps onto
//! `projects/{p}/apis/a-b-c/versions/{version}/specs/{spec}`. Nested
//! directories collapse into one flat API id so the id stays unique across
//! the whole tree.

use std::path::{Component, Path};

use super::errors::DomainError;
use super::resource::{ResourceLevel, ResourceName};
use super::style::Style;

/// Separator used when collapsing directory segments into an API id
const API_ID_SEPARATOR: &str = "-";

/// Target of a single spec file in the registry hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceAddress {
    api: ResourceName,
    /// Directory path the API id was collapsed from
    api_path: String,
    version: ResourceName,
    spec: ResourceName,
    style: Style,
}

impl ResourceAddress {
    /// Derives an address from `path`, which must lie below `root`.
    pub fn from_path(project: &str, root: &Path, path: &Path) -> Result<Self, DomainError> {
        let relative = path.strip_prefix(root).map_err(|_| {
            DomainError::MalformedPath(format!(
                "{} is not below {}",
                path.display(),
                root.display()
            ))
        })?;
        Self::from_relative_path(project, relative)
    }

    /// Derives an address from a path already relative to the traversal root.
    ///
    /// The last segment is the spec id (its suffix picks the style), the
    /// second-to-last the version id, and every preceding segment is joined
    /// with `-` into the API id.
    pub fn from_relative_path(project: &str, relative: &Path) -> Result<Self, DomainError> {
        let segments = path_segments(relative)?;

        if segments.len() < 2 {
            return Err(DomainError::MalformedPath(format!(
                "{}: expected at least <version>/<spec>",
                relative.display()
            )));
        }
        let (ancestors, tail) = segments.split_at(segments.len() - 2);
        if ancestors.is_empty() {
            return Err(DomainError::MalformedPath(format!(
                "{}: no directory left to name the API",
                relative.display()
            )));
        }

        let api_id = ancestors.join(API_ID_SEPARATOR);
        let api_path = ancestors.join("/");
        let version_id = tail[0];
        let spec_id = tail[1];

        let style = Style::infer_from_filename(spec_id).ok_or_else(|| {
            DomainError::MalformedPath(format!(
                "{}: not a recognized spec file name",
                relative.display()
            ))
        })?;

        let api = ResourceName::project(project)?.child(ResourceLevel::Api, &api_id)?;
        let version = api.child(ResourceLevel::Version, version_id)?;
        let spec = version.child(ResourceLevel::Spec, spec_id)?;

        Ok(Self {
            api,
            api_path,
            version,
            spec,
            style,
        })
    }

    pub fn project_id(&self) -> &str {
        self.api.project_id()
    }

    pub fn api_id(&self) -> &str {
        self.api.id()
    }

    /// Human-readable API name: the directory path below the root,
    /// e.g. `payments/v1/billing`
    pub fn api_display_name(&self) -> &str {
        &self.api_path
    }

    pub fn version_id(&self) -> &str {
        self.version.id()
    }

    pub fn spec_id(&self) -> &str {
        self.spec.id()
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn api_name(&self) -> &ResourceName {
        &self.api
    }

    pub fn version_name(&self) -> &ResourceName {
        &self.version
    }

    pub fn spec_name(&self) -> &ResourceName {
        &self.spec
    }
}

/// Splits a relative path into UTF-8 segments, rejecting `..` and absolute
/// components.
fn path_segments(path: &Path) -> Result<Vec<&str>, DomainError> {
    let mut segments = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| {
                    DomainError::MalformedPath(format!("{}: not valid UTF-8", path.display()))
                })?;
                segments.push(part);
            }
            Component::CurDir => {}
            _ => {
                return Err(DomainError::MalformedPath(format!(
                    "{}: must be a relative path without '..'",
                    path.display()
                )))
            }
        }
    }
    Ok(segments)
}
