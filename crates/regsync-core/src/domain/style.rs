//! Spec styles
//!
//! A [`Style`] tags how a spec's bytes are formatted and encoded. The style
//! decides both the encoding pipeline (gzip for single files, zip for
//! directories) and which kind of filesystem entry it may be paired with.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// The kind of filesystem entry a spec is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A single regular file, uploaded gzip-compressed
    File,
    /// A directory tree, uploaded as a zip archive
    Directory,
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::File => write!(f, "file"),
            SourceKind::Directory => write!(f, "directory"),
        }
    }
}

/// Recognized spec styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Style {
    /// Swagger 2.0, gzip-compressed
    OpenApiV2,
    /// OpenAPI 3.x, gzip-compressed
    OpenApiV3,
    /// Google API Discovery document, gzip-compressed
    Discovery,
    /// A tree of `.proto` files, zip-archived
    ProtoZip,
}

impl Style {
    /// All recognized styles, in token order
    pub const ALL: [Style; 4] = [
        Style::OpenApiV2,
        Style::OpenApiV3,
        Style::Discovery,
        Style::ProtoZip,
    ];

    /// Returns the wire token for this style
    pub const fn as_str(&self) -> &'static str {
        match self {
            Style::OpenApiV2 => "openapi/v2+gzip",
            Style::OpenApiV3 => "openapi/v3+gzip",
            Style::Discovery => "discovery+gzip",
            Style::ProtoZip => "proto+zip",
        }
    }

    /// The only source kind this style can be uploaded from
    pub const fn source_kind(&self) -> SourceKind {
        match self {
            Style::ProtoZip => SourceKind::Directory,
            _ => SourceKind::File,
        }
    }

    /// Checks that this style may be paired with `kind`.
    ///
    /// Called before any filesystem read so a mismatched pairing never
    /// touches the source.
    pub fn validate_for(&self, kind: SourceKind) -> Result<(), DomainError> {
        if self.source_kind() == kind {
            Ok(())
        } else {
            Err(DomainError::UnsupportedStyle {
                style: self.as_str().to_string(),
                source_kind: kind.to_string(),
            })
        }
    }

    /// Infers a file style from a spec file name.
    ///
    /// - `swagger.yaml`, `swagger.json` (and `*.swagger.*`) → openapi/v2
    /// - `openapi.yaml`, `openapi.json` (and `*openapi.*`) → openapi/v3
    /// - `discovery.json` (and `*.discovery.json`) → discovery
    ///
    /// Returns `None` for names that are not recognized spec files.
    pub fn infer_from_filename(name: &str) -> Option<Style> {
        const SUFFIXES: &[(&str, Style)] = &[
            ("swagger.yaml", Style::OpenApiV2),
            ("swagger.json", Style::OpenApiV2),
            ("openapi.yaml", Style::OpenApiV3),
            ("openapi.json", Style::OpenApiV3),
            ("discovery.json", Style::Discovery),
        ];

        SUFFIXES
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix))
            .map(|(_, style)| *style)
    }
}

impl Display for Style {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Style::ALL
            .iter()
            .find(|style| style.as_str() == s)
            .copied()
            .ok_or_else(|| DomainError::UnsupportedStyle {
                style: s.to_string(),
                source_kind: "token".to_string(),
            })
    }
}

impl TryFrom<String> for Style {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Style> for String {
    fn from(style: Style) -> Self {
        style.as_str().to_string()
    }
}
