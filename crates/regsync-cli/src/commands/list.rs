//! List command - Show registry resources matching a name pattern
//!
//! `regsync list projects/p/apis/-/versions` lists every version of every
//! API in project `p`. A trailing id other than `-` narrows the listing
//! with an id filter; `--filter` adds a raw registry filter expression.

use anyhow::{Context as _, Result};
use clap::Args;
use regsync_core::ports::Resource;
use regsync_core::usecases::ListQuery;
use tracing::info;

use super::Context;
use crate::output::{get_formatter, plural};

/// List command arguments
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Resource name pattern, e.g. projects/p/apis/-/versions
    pub pattern: String,

    /// Additional filter expression
    #[arg(long)]
    pub filter: Option<String>,
}

impl ListCommand {
    /// Execute the list command
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let config = ctx.load_config()?;
        let query = ListQuery::parse(&self.pattern, self.filter.as_deref())
            .context("Invalid name pattern")?;

        info!(pattern = %self.pattern, "Listing");
        let registry = ctx.registry(&config).client();
        let resources = query
            .execute(registry.as_ref())
            .await
            .with_context(|| format!("Failed to list {}", self.pattern))?;

        let formatter = get_formatter(ctx.format);
        if ctx.format.is_json() {
            let json = serde_json::to_value(&resources)
                .context("Failed to serialize resources to JSON")?;
            formatter.print_json(&json);
            return Ok(());
        }

        for resource in &resources {
            formatter.item(&describe(resource));
        }
        formatter.info(&plural(resources.len(), &query.level.to_string()));
        Ok(())
    }
}

/// One line per resource: the name, plus style and size for specs
fn describe(resource: &Resource) -> String {
    match (&resource.style, resource.size_bytes) {
        (Some(style), Some(size)) => format!("{}  {style}  {size} bytes", resource.name),
        (Some(style), None) => format!("{}  {style}", resource.name),
        _ => resource.name.to_string(),
    }
}
