//! Config command - View and manage regsync configuration
//!
//! Provides the `regsync config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON, token redacted)
//! 2. Prints the configuration file path
//! 3. Sets individual configuration values via dot-notation keys
//! 4. Validates the configuration file and reports errors

use anyhow::{Context as _, Result};
use clap::Subcommand;
use regsync_core::config::Config;
use tracing::info;

use super::Context;
use crate::output::{get_formatter, plural};

const REDACTED: &str = "********";

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "upload.workers")
        key: String,
        /// New value
        value: String,
    },
    /// Validate the configuration file
    Validate,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(ctx),
            ConfigCommand::Path => execute_path(ctx),
            ConfigCommand::Set { key, value } => execute_set(ctx, key, value),
            ConfigCommand::Validate => execute_validate(ctx),
        }
    }
}

fn execute_show(ctx: &Context) -> Result<()> {
    let formatter = get_formatter(ctx.format);
    let config_path = ctx.config_path();
    let mut config = ctx.load_config()?;
    if config.registry.token.is_some() {
        config.registry.token = Some(REDACTED.to_string());
    }

    info!(config_path = %config_path.display(), "Showing configuration");

    if ctx.format.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
    } else {
        formatter.success(&format!("Configuration ({})", config_path.display()));
        formatter.info("");
        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            formatter.info(line);
        }
    }
    Ok(())
}

fn execute_path(ctx: &Context) -> Result<()> {
    let formatter = get_formatter(ctx.format);
    let config_path = ctx.config_path();
    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({
            "config_path": config_path.display().to_string(),
            "exists": config_path.exists(),
        }));
    } else {
        formatter.item(&config_path.display().to_string());
    }
    Ok(())
}

fn execute_set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let formatter = get_formatter(ctx.format);
    let config_path = ctx.config_path();
    let mut config = Config::load_or_default(&config_path);

    info!(key = %key, "Setting configuration value");
    apply_config_value(&mut config, key, value)?;

    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::bail!("Invalid value for '{key}': {}", messages.join("; "));
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
    }
    let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
    std::fs::write(&config_path, yaml).context("Failed to write configuration file")?;

    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({
            "success": true,
            "key": key,
            "config_path": config_path.display().to_string(),
        }));
    } else {
        formatter.success(&format!("Set {key}"));
        formatter.info(&format!("Saved to {}", config_path.display()));
    }
    Ok(())
}

fn execute_validate(ctx: &Context) -> Result<()> {
    let formatter = get_formatter(ctx.format);
    let config_path = ctx.config_path();

    if !config_path.exists() {
        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "errors": [],
                "defaults": true,
            }));
        } else {
            formatter.info(&format!(
                "Configuration file not found at {}",
                config_path.display()
            ));
            formatter.info("Using default configuration.");
        }
        return Ok(());
    }

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;
    let errors = config.validate();

    if ctx.format.is_json() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": messages,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&format!("File: {}", config_path.display()));
    } else {
        formatter.error(&format!("Configuration has {}:", plural(errors.len(), "error")));
        formatter.info(&format!("File: {}", config_path.display()));
        for error in &errors {
            formatter.info(&format!("  {} - {}", error.field, error.message));
        }
    }

    if !errors.is_empty() {
        anyhow::bail!("Configuration is invalid");
    }
    Ok(())
}

/// Applies a dot-notation `key = value` to `config`
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parse_usize = |value: &str| -> Result<usize> {
        value
            .parse()
            .with_context(|| format!("'{value}' is not a non-negative integer"))
    };

    match key {
        "registry.address" => config.registry.address = value.to_string(),
        "registry.token" => {
            config.registry.token = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        }
        "registry.project" => config.registry.project = value.to_string(),
        "upload.workers" => config.upload.workers = parse_usize(value)?,
        "upload.queue_depth" => config.upload.queue_depth = parse_usize(value)?,
        "logging.level" => config.logging.level = value.to_string(),
        _ => anyhow::bail!("Unknown configuration key: '{key}'"),
    }
    Ok(())
}
