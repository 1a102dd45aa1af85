//! Candidate discovery
//!
//! The [`Walker`] turns either a directory tree or a list of glob patterns
//! into [`SyncTask`]s. Traversal is synchronous and single-threaded; each
//! task is handed to a dispatch callback as soon as it is found, so uploads
//! never hold up discovery.
//!
//! Entries that cannot become a task (bad path layout, style that does not
//! fit the entry type, unreadable directory) are rejected on the spot,
//! before any file contents are read, and reported back in [`WalkStats`].

use std::path::{Path, PathBuf};

use regsync_core::domain::{
    DomainError, ResourceAddress, ResourceLevel, ResourceName, SourceKind, Style,
};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::encoder::ARCHIVE_FILENAME;
use crate::task::{SyncTarget, SyncTask};
use crate::SyncError;

/// What to traverse
#[derive(Debug, Clone)]
pub enum Walker {
    /// Recursively walk `root`, picking files by recognized spec suffix and
    /// deriving their full API/Version/Spec address
    Tree { root: PathBuf, project: String },
    /// Expand each pattern; directories become `proto+zip` uploads and
    /// regular files single-file uploads, all under `version`
    Globs {
        patterns: Vec<String>,
        version: ResourceName,
        style: Style,
    },
}

/// Summary of one traversal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Tasks handed to the dispatch callback
    pub dispatched: usize,
    /// Entries rejected during discovery, one message each
    pub rejected: Vec<String>,
}

impl Walker {
    /// Glob mode under `version`, which must name a Version resource
    pub fn globs(patterns: Vec<String>, version: &str, style: Style) -> Result<Self, SyncError> {
        let version: ResourceName = version.parse()?;
        if version.level() != Some(ResourceLevel::Version) {
            return Err(DomainError::InvalidName(format!(
                "{version} is not a version name"
            ))
            .into());
        }
        Ok(Walker::Globs {
            patterns,
            version,
            style,
        })
    }

    /// Walks the sources and calls `dispatch` once per task.
    ///
    /// `dispatch` returns `false` when no more tasks can be accepted; the
    /// walk then stops early. Only tasks for which `dispatch` returned `true`
    /// are counted as dispatched.
    pub fn walk<F>(&self, mut dispatch: F) -> WalkStats
    where
        F: FnMut(SyncTask) -> bool,
    {
        let mut stats = WalkStats::default();
        let mut emit = |task: SyncTask, stats: &mut WalkStats| -> bool {
            debug!(path = %task.path.display(), style = %task.style, "Dispatching");
            if dispatch(task) {
                stats.dispatched += 1;
                true
            } else {
                false
            }
        };

        match self {
            Walker::Tree { root, project } => {
                walk_tree(root, project, &mut stats, &mut emit);
            }
            Walker::Globs {
                patterns,
                version,
                style,
            } => {
                expand_globs(patterns, version, *style, &mut stats, &mut emit);
            }
        }

        stats
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

fn walk_tree<F>(root: &Path, project: &str, stats: &mut WalkStats, emit: &mut F)
where
    F: FnMut(SyncTask, &mut WalkStats) -> bool,
{
    let entries = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                stats.rejected.push(e.to_string());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if Style::infer_from_filename(name).is_none() {
            continue;
        }

        let path = entry.path();
        match ResourceAddress::from_path(project, root, path) {
            Ok(address) => {
                let task = SyncTask {
                    path: path.to_path_buf(),
                    kind: SourceKind::File,
                    style: address.style(),
                    target: SyncTarget::Hierarchy(address),
                };
                if !emit(task, stats) {
                    return;
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping spec file");
                stats.rejected.push(format!("{}: {e}", path.display()));
            }
        }
    }
}

fn expand_globs<F>(
    patterns: &[String],
    version: &ResourceName,
    style: Style,
    stats: &mut WalkStats,
    emit: &mut F,
) where
    F: FnMut(SyncTask, &mut WalkStats) -> bool,
{
    for pattern in patterns {
        let paths = match glob::glob(pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Invalid pattern");
                stats.rejected.push(format!("{pattern}: {e}"));
                continue;
            }
        };

        let mut matched = false;
        for path in paths {
            matched = true;
            let path = match path {
                Ok(path) => path,
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "Unreadable match");
                    stats.rejected.push(e.to_string());
                    continue;
                }
            };

            let kind = match std::fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => SourceKind::Directory,
                Ok(meta) if meta.is_file() => SourceKind::File,
                Ok(_) => continue,
                Err(e) => {
                    stats.rejected.push(format!("{}: {e}", path.display()));
                    continue;
                }
            };

            if let Err(e) = style.validate_for(kind) {
                warn!(path = %path.display(), error = %e, "Style does not fit entry");
                stats.rejected.push(format!("{}: {e}", path.display()));
                continue;
            }

            let spec_id = match kind {
                SourceKind::Directory => ARCHIVE_FILENAME.to_string(),
                SourceKind::File => match path.file_name() {
                    Some(name) => name.to_string_lossy().into_owned(),
                    None => continue,
                },
            };

            let task = SyncTask {
                path,
                kind,
                style,
                target: SyncTarget::Version {
                    version: version.clone(),
                    spec_id,
                },
            };
            if !emit(task, stats) {
                return;
            }
        }

        if !matched {
            warn!(pattern = %pattern, "Pattern matched nothing");
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"spec").unwrap();
    }

    fn collect(walker: &Walker) -> (Vec<SyncTask>, WalkStats) {
        let mut tasks = Vec::new();
        let stats = walker.walk(|task| {
            tasks.push(task);
            true
        });
        (tasks, stats)
    }

    fn version() -> ResourceName {
        "projects/p/apis/a/versions/v1".parse().unwrap()
    }

    #[test]
    fn test_tree_picks_recognized_suffixes() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "payments/v1/billing/2021-01-01/swagger.yaml");
        touch(dir.path(), "books/v1/discovery.json");
        touch(dir.path(), "books/v1/README.md");
        touch(dir.path(), ".git/x/v1/openapi.yaml");

        let walker = Walker::Tree {
            root: dir.path().to_path_buf(),
            project: "p".to_string(),
        };
        let (tasks, stats) = collect(&walker);

        assert_eq!(stats.dispatched, 2);
        assert!(stats.rejected.is_empty());
        let names: Vec<String> = tasks.iter().map(SyncTask::spec_name).collect();
        assert_eq!(
            names,
            vec![
                "projects/p/apis/books/versions/v1/specs/discovery.json",
                "projects/p/apis/payments-v1-billing/versions/2021-01-01/specs/swagger.yaml",
            ]
        );
        assert_eq!(tasks[1].style, Style::OpenApiV2);
    }

    #[test]
    fn test_tree_rejects_shallow_spec_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "openapi.yaml");
        touch(dir.path(), "v1/openapi.yaml");

        let walker = Walker::Tree {
            root: dir.path().to_path_buf(),
            project: "p".to_string(),
        };
        let (tasks, stats) = collect(&walker);
        assert!(tasks.is_empty());
        assert_eq!(stats.rejected.len(), 2);
    }

    #[test]
    fn test_tree_stops_when_dispatch_refuses() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/v1/openapi.yaml");
        touch(dir.path(), "b/v1/openapi.yaml");

        let walker = Walker::Tree {
            root: dir.path().to_path_buf(),
            project: "p".to_string(),
        };
        let stats = walker.walk(|_| false);
        assert_eq!(stats.dispatched, 0);
    }

    #[test]
    fn test_globs_dispatch_by_entry_type() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "protos/a.proto");
        touch(dir.path(), "openapi.yaml");

        let walker = Walker::Globs {
            patterns: vec![format!("{}/protos", dir.path().display())],
            version: version(),
            style: Style::ProtoZip,
        };
        let (tasks, _) = collect(&walker);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].kind, SourceKind::Directory);
        assert_eq!(
            tasks[0].spec_name(),
            "projects/p/apis/a/versions/v1/specs/protos.zip"
        );

        let walker = Walker::Globs {
            patterns: vec![format!("{}/*.yaml", dir.path().display())],
            version: version(),
            style: Style::OpenApiV3,
        };
        let (tasks, _) = collect(&walker);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].kind, SourceKind::File);
        assert_eq!(
            tasks[0].spec_name(),
            "projects/p/apis/a/versions/v1/specs/openapi.yaml"
        );
    }

    #[test]
    fn test_globs_reject_directory_with_gzip_style() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "protos/a.proto");

        let walker = Walker::Globs {
            patterns: vec![format!("{}/protos", dir.path().display())],
            version: version(),
            style: Style::OpenApiV3,
        };
        let (tasks, stats) = collect(&walker);
        assert!(tasks.is_empty());
        assert_eq!(stats.rejected.len(), 1);
        assert!(stats.rejected[0].contains("Unsupported style openapi/v3+gzip for directory"));
    }

    #[test]
    fn test_globs_constructor_requires_version_name() {
        let walker = Walker::globs(vec![], "projects/p/apis/a/versions/v1", Style::ProtoZip);
        assert!(walker.is_ok());

        for bad in ["projects/p/apis/a", "v1", "projects/p/apis/a/versions/v1/specs/s"] {
            assert!(
                Walker::globs(vec![], bad, Style::ProtoZip).is_err(),
                "{bad} should fail"
            );
        }
    }

    #[test]
    fn test_globs_invalid_and_unmatched_patterns() {
        let walker = Walker::Globs {
            patterns: vec!["[".to_string(), "/nonexistent/*.yaml".to_string()],
            version: version(),
            style: Style::OpenApiV3,
        };
        let (tasks, stats) = collect(&walker);
        assert!(tasks.is_empty());
        assert_eq!(stats.rejected.len(), 1);
    }
}
