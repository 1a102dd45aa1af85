//! CLI subcommands
//!
//! Every command receives a [`Context`] carrying the global flags.

pub mod config;
pub mod list;
pub mod upload;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use regsync_core::config::Config;
use regsync_core::ports::IRegistryClient;
use regsync_registry::{InMemoryRegistry, RegistryProvider};
use tracing::{debug, info};

use crate::output::OutputFormat;

/// Global flags shared by all commands
#[derive(Debug, Clone)]
pub struct Context {
    pub format: OutputFormat,
    /// Explicit `--config` path; the platform default otherwise
    pub config_path: Option<PathBuf>,
    /// `--workers` override of `upload.workers`
    pub workers: Option<usize>,
    pub dry_run: bool,
}

impl Context {
    pub fn config_path(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(Config::default_path)
    }

    /// Loads the configuration with environment and flag overrides.
    ///
    /// An explicit `--config` file must exist and parse; the default file
    /// may be absent. The result is always validated.
    pub fn load_config(&self) -> Result<Config> {
        let path = self.config_path();
        let mut config = match &self.config_path {
            Some(explicit) => Config::load(explicit)
                .with_context(|| format!("Failed to load configuration from {}", explicit.display()))?,
            None => Config::load_or_default(&path),
        };
        debug!(config_path = %path.display(), "Loaded configuration");

        config.apply_env_overrides();
        if let Some(workers) = self.workers {
            config.upload.workers = workers;
        }

        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            anyhow::bail!("Invalid configuration: {}", messages.join("; "));
        }
        Ok(config)
    }

    /// The registry to talk to: HTTP, or an empty in-memory one for
    /// `--dry-run`
    pub fn registry(&self, config: &Config) -> Registry {
        if self.dry_run {
            info!("Dry run: using an in-memory registry");
            Registry::DryRun(Arc::new(InMemoryRegistry::new()))
        } else {
            Registry::Remote(Arc::new(RegistryProvider::from_config(&config.registry)))
        }
    }
}

/// Registry handle chosen from the global flags
pub enum Registry {
    Remote(Arc<RegistryProvider>),
    DryRun(Arc<InMemoryRegistry>),
}

impl Registry {
    pub fn client(&self) -> Arc<dyn IRegistryClient> {
        match self {
            Registry::Remote(provider) => provider.clone(),
            Registry::DryRun(memory) => memory.clone(),
        }
    }
}
