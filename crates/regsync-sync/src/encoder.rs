//! Content encoding for spec uploads
//!
//! Single-file specs are gzip-compressed at the best compression level;
//! directory specs (protobuf trees) are assembled into one zip archive.
//! Both transforms are pure and synchronous: callers run them on a blocking
//! thread. A failed archive is dropped whole, never uploaded partially.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use flate2::{write::GzEncoder, Compression};
use regsync_core::domain::{DomainError, SourceKind, Style};
use regsync_core::ports::ResourceBody;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// Spec id and file name used for directory uploads
pub const ARCHIVE_FILENAME: &str = "protos.zip";

/// Errors raised while compressing or archiving
#[derive(Debug, Error)]
pub enum EncodingError {
    /// A source file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The gzip stream could not be written
    #[error("failed to compress: {0}")]
    Compress(#[source] std::io::Error),

    /// The zip archive could not be assembled
    #[error("failed to archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// A directory entry could not be listed
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// An archive member did not lie below the archive prefix
    #[error("{path} is not below {prefix}")]
    StripPrefix { path: PathBuf, prefix: PathBuf },

    /// The style cannot be used with this kind of source
    #[error(transparent)]
    Style(#[from] DomainError),
}

/// Encoded spec contents ready to be attached to a create request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    pub filename: String,
    pub style: Style,
    pub contents: Vec<u8>,
}

impl EncodedPayload {
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Moves the payload into a spec create body
    pub fn into_body(self) -> ResourceBody {
        ResourceBody::Spec {
            filename: self.filename,
            style: self.style,
            contents: self.contents,
        }
    }
}

/// Gzip-compresses `bytes` at the best compression level.
///
/// The gzip header carries no timestamp, so identical input yields identical
/// output for a given library version.
pub fn compress_bytes(bytes: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::best());
    encoder.write_all(bytes).map_err(EncodingError::Compress)?;
    encoder.finish().map_err(EncodingError::Compress)
}

/// Builds a zip archive of every regular file below `dir`.
///
/// Entry names are the file paths with `prefix` stripped, using `/` as the
/// separator. Entries are added in sorted order so the archive layout does
/// not depend on directory iteration order.
pub fn archive_path(dir: &Path, prefix: &Path) -> Result<Vec<u8>, EncodingError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let archive_err = |source| EncodingError::Archive {
        path: dir.to_path_buf(),
        source,
    };

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| EncodingError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let name = entry_name(path, prefix)?;
        let contents = std::fs::read(path).map_err(|source| EncodingError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(entry = %name, size = contents.len(), "Adding archive entry");
        writer.start_file(name, options).map_err(archive_err)?;
        writer
            .write_all(&contents)
            .map_err(|source| archive_err(source.into()))?;
    }

    let cursor = writer.finish().map_err(archive_err)?;
    Ok(cursor.into_inner())
}

fn entry_name(path: &Path, prefix: &Path) -> Result<String, EncodingError> {
    let relative = path
        .strip_prefix(prefix)
        .map_err(|_| EncodingError::StripPrefix {
            path: path.to_path_buf(),
            prefix: prefix.to_path_buf(),
        })?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

/// Reads and gzip-compresses a single spec file.
pub fn encode_file(path: &Path, style: Style) -> Result<EncodedPayload, EncodingError> {
    style.validate_for(SourceKind::File)?;
    let bytes = std::fs::read(path).map_err(|source| EncodingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let contents = compress_bytes(&bytes)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    debug!(
        path = %path.display(),
        raw = bytes.len(),
        compressed = contents.len(),
        "Compressed spec"
    );
    Ok(EncodedPayload {
        filename,
        style,
        contents,
    })
}

/// Archives a directory spec; entry names are relative to `dir`.
pub fn encode_directory(dir: &Path, style: Style) -> Result<EncodedPayload, EncodingError> {
    style.validate_for(SourceKind::Directory)?;
    let contents = archive_path(dir, dir)?;
    Ok(EncodedPayload {
        filename: ARCHIVE_FILENAME.to_string(),
        style,
        contents,
    })
}

/// Encodes `path` with the pipeline that matches `kind`.
pub fn encode(path: &Path, kind: SourceKind, style: Style) -> Result<EncodedPayload, EncodingError> {
    match kind {
        SourceKind::File => encode_file(path, style),
        SourceKind::Directory => encode_directory(path, style),
    }
}
