//! Upload command - Push spec files into the registry
//!
//! Provides the `regsync upload` CLI commands:
//! - `upload spec <PATH|GLOB>... --version <name> --style <token>` uploads
//!   files (gzip) or proto directories (zip) into an existing version
//! - `upload tree <ROOT>` walks a directory tree laid out as
//!   `<api path>/<version>/<spec file>` and creates every missing API,
//!   version and spec
//!
//! Both are idempotent: re-running over unchanged sources creates nothing.
//! Ctrl-C stops discovery and marks pending uploads as cancelled.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context as _, Result};
use clap::Subcommand;
use regsync_core::domain::Style;
use regsync_sync::{SyncReport, Synchronizer, Walker};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Context, Registry};
use crate::output::{format_duration, get_formatter, plural, OutputFormatter};

/// Upload subcommands
#[derive(Debug, Subcommand)]
pub enum UploadCommand {
    /// Upload spec files or directories into an existing version
    Spec {
        /// Files, directories or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,
        /// Target version, e.g. projects/p/apis/a/versions/v1
        #[arg(long)]
        version: String,
        /// openapi/v2+gzip, openapi/v3+gzip, discovery+gzip or proto+zip
        #[arg(long)]
        style: String,
    },
    /// Upload every recognized spec file below a directory
    Tree {
        /// Root of the spec tree
        root: PathBuf,
        /// Project to upload into (defaults to registry.project)
        #[arg(long)]
        project: Option<String>,
    },
}

impl UploadCommand {
    /// Execute the upload command
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let (walker, config) = match self {
            UploadCommand::Spec {
                paths,
                version,
                style,
            } => {
                let style = Style::from_str(style).context("Invalid --style")?;
                let walker =
                    Walker::globs(paths.clone(), version, style).context("Invalid --version")?;
                (walker, ctx.load_config()?)
            }
            UploadCommand::Tree { root, project } => {
                let config = ctx.load_config()?;
                if !root.is_dir() {
                    anyhow::bail!("{} is not a directory", root.display());
                }
                let walker = Walker::Tree {
                    root: root.clone(),
                    project: project
                        .clone()
                        .unwrap_or_else(|| config.registry.project.clone()),
                };
                (walker, config)
            }
        };

        let registry = ctx.registry(&config);
        prepare_dry_run(&registry, &walker);
        let cancel = CancellationToken::new();
        let synchronizer =
            Synchronizer::from_config(registry.client(), &config.upload).with_cancellation(cancel.clone());

        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling pending uploads");
                cancel.cancel();
            }
        });

        info!(
            registry = %config.registry.address,
            workers = synchronizer.workers(),
            dry_run = ctx.dry_run,
            "Uploading"
        );
        let report = synchronizer.run(walker).await;
        interrupt.abort();
        let report = report.context("Upload aborted")?;

        let would_create = match &registry {
            Registry::DryRun(memory) => Some(memory.created_names()),
            Registry::Remote(_) => None,
        };

        let formatter = get_formatter(ctx.format);
        if ctx.format.is_json() {
            formatter.print_json(&report_json(&report, would_create.as_deref()));
        } else {
            print_report(formatter.as_ref(), &report, would_create.as_deref());
        }

        if report.has_failures() {
            anyhow::bail!(
                "Upload finished with {} failed and {} rejected",
                report.failed,
                report.rejected
            );
        }
        Ok(())
    }
}

/// In glob mode the target version must already exist; a dry run starts
/// from an empty registry, so it assumes the version and its API are there
fn prepare_dry_run(registry: &Registry, walker: &Walker) {
    if let (Registry::DryRun(memory), Walker::Globs { version, .. }) = (registry, walker) {
        debug!(version = %version, "Dry run: assuming target version exists");
        memory.seed_with_ancestors(version);
    }
}

fn report_json(report: &SyncReport, would_create: Option<&[String]>) -> serde_json::Value {
    let mut json = serde_json::json!({
        "dispatched": report.dispatched,
        "created": report.created,
        "resources_created": report.resources_created,
        "unchanged": report.unchanged,
        "failed": report.failed,
        "cancelled": report.cancelled,
        "rejected": report.rejected,
        "errors": report.errors,
        "duration_ms": report.duration_ms,
    });
    if let Some(names) = would_create {
        json["would_create"] = serde_json::json!(names);
    }
    json
}

fn print_report(formatter: &dyn OutputFormatter, report: &SyncReport, would_create: Option<&[String]>) {
    let duration = format_duration(report.duration_ms);

    if report.dispatched == 0 && report.rejected == 0 {
        formatter.warn("No spec files found");
        return;
    }
    if report.resources_created == 0 && !report.has_failures() && report.cancelled == 0 {
        formatter.success(&format!(
            "Already up to date ({} checked in {duration})",
            plural(report.unchanged, "spec")
        ));
        return;
    }

    formatter.success(&format!(
        "Processed {} in {duration}",
        plural(report.dispatched, "spec")
    ));
    if report.created > 0 {
        formatter.info(&format!(
            "Created:   {} ({} new)",
            plural(report.resources_created as usize, "resource"),
            plural(report.created, "spec")
        ));
    }
    if report.unchanged > 0 {
        formatter.info(&format!("Unchanged: {}", plural(report.unchanged, "spec")));
    }
    if report.cancelled > 0 {
        formatter.warn(&format!("{} cancelled", plural(report.cancelled, "upload")));
    }

    if let Some(names) = would_create {
        formatter.info("");
        formatter.info("Would create:");
        for name in names {
            formatter.info(&format!("  {name}"));
        }
    }

    if !report.errors.is_empty() {
        formatter.error(&format!("{} occurred:", plural(report.errors.len(), "error")));
        for error in &report.errors {
            formatter.info(&format!("  {error}"));
        }
    }
}
