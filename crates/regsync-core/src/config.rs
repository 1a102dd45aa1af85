//! Configuration module for regsync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable that overrides `registry.token`.
pub const TOKEN_ENV_VAR: &str = "REGSYNC_TOKEN";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for regsync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub registry: RegistryConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

/// Remote registry connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base URL of the registry's HTTP/JSON endpoint (without the `/v1` suffix).
    pub address: String,
    /// Bearer token attached to every request. `None` for unauthenticated
    /// local registries.
    pub token: Option<String>,
    /// Project that tree uploads are created under.
    pub project: String,
}

/// Upload worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Number of concurrent upload workers.
    pub workers: usize,
    /// Capacity of the queue between the walker and the workers.
    pub queue_depth: usize,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/regsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("regsync")
            .join("config.yaml")
    }

    /// Replaces the registry token with the value of [`TOKEN_ENV_VAR`] when
    /// that variable is set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            if !token.is_empty() {
                self.registry.token = Some(token);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            address: "http://localhost:8080".to_string(),
            token: None,
            project: "default".to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            queue_depth: 64,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"upload.workers"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound for `upload.workers`.
const MAX_WORKERS: usize = 256;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- registry ---
        if !(self.registry.address.starts_with("http://")
            || self.registry.address.starts_with("https://"))
        {
            errors.push(ValidationError {
                field: "registry.address".into(),
                message: format!(
                    "must be an http:// or https:// URL, got '{}'",
                    self.registry.address
                ),
            });
        }
        if self.registry.project.is_empty() || self.registry.project.contains('/') {
            errors.push(ValidationError {
                field: "registry.project".into(),
                message: "must be a non-empty id without '/'".into(),
            });
        }

        // --- upload ---
        if self.upload.workers == 0 || self.upload.workers > MAX_WORKERS {
            errors.push(ValidationError {
                field: "upload.workers".into(),
                message: format!("must be in range 1..={MAX_WORKERS}"),
            });
        }
        if self.upload.queue_depth == 0 {
            errors.push(ValidationError {
                field: "upload.queue_depth".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use regsync_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .registry_address("https://registry.example.com")
///     .registry_project("payments")
///     .upload_workers(16)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- registry ---

    pub fn registry_address(mut self, address: impl Into<String>) -> Self {
        self.config.registry.address = address.into();
        self
    }

    pub fn registry_token(mut self, token: impl Into<String>) -> Self {
        self.config.registry.token = Some(token.into());
        self
    }

    pub fn registry_project(mut self, project: impl Into<String>) -> Self {
        self.config.registry.project = project.into();
        self
    }

    // --- upload ---

    pub fn upload_workers(mut self, n: usize) -> Self {
        self.config.upload.workers = n;
        self
    }

    pub fn upload_queue_depth(mut self, n: usize) -> Self {
        self.config.upload.queue_depth = n;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert_eq!(cfg.registry.address, "http://localhost:8080");
        assert!(cfg.registry.token.is_none());
        assert_eq!(cfg.registry.project, "default");
        assert_eq!(cfg.upload.workers, 8);
        assert_eq!(cfg.upload.queue_depth, 64);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    #[test]
    fn default_path_ends_with_config_yaml() {
        let path = Config::default_path();
        assert!(path.ends_with("regsync/config.yaml"));
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
registry:
  address: https://registry.example.com
  token: secret
  project: atlas
upload:
  workers: 4
  queue_depth: 16
logging:
  level: debug
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.registry.address, "https://registry.example.com");
        assert_eq!(cfg.registry.token.as_deref(), Some("secret"));
        assert_eq!(cfg.registry.project, "atlas");
        assert_eq!(cfg.upload.workers, 4);
        assert_eq!(cfg.upload.queue_depth, 16);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn load_partial_yaml_fills_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"registry:\n  project: atlas\n").unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.registry.project, "atlas");
        assert_eq!(cfg.registry.address, "http://localhost:8080");
        assert_eq!(cfg.upload.workers, 8);
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(cfg.upload.workers, 8);
    }

    #[test]
    fn load_returns_error_on_invalid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"not: [valid: yaml: {{{").unwrap();
        tmp.flush().unwrap();

        assert!(Config::load(tmp.path()).is_err());
    }

    // -- Validation --

    #[test]
    fn validate_catches_bad_address() {
        let mut cfg = Config::default();
        cfg.registry.address = "localhost:8080".into();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "registry.address"));
    }

    #[test]
    fn validate_catches_bad_project() {
        let mut cfg = Config::default();
        cfg.registry.project = "a/b".into();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "registry.project"));
    }

    #[test]
    fn validate_catches_worker_bounds() {
        let mut cfg = Config::default();
        cfg.upload.workers = 0;
        assert!(cfg.validate().iter().any(|e| e.field == "upload.workers"));

        cfg.upload.workers = MAX_WORKERS + 1;
        assert!(cfg.validate().iter().any(|e| e.field == "upload.workers"));
    }

    #[test]
    fn validate_catches_invalid_log_level() {
        let mut cfg = Config::default();
        cfg.logging.level = "verbose".into();
        let errors = cfg.validate();
        let err = errors
            .iter()
            .find(|e| e.field == "logging.level")
            .expect("logging.level error");
        assert!(err.message.contains("verbose"));
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            field: "upload.workers".into(),
            message: "must be greater than 0".into(),
        };
        assert_eq!(err.to_string(), "upload.workers: must be greater than 0");
    }

    // -- Builder --

    #[test]
    fn builder_overrides_fields() {
        let cfg = ConfigBuilder::new()
            .registry_address("https://registry.example.com")
            .registry_token("t0ken")
            .registry_project("atlas")
            .upload_workers(3)
            .upload_queue_depth(9)
            .logging_level("warn")
            .build();
        assert_eq!(cfg.registry.address, "https://registry.example.com");
        assert_eq!(cfg.registry.token.as_deref(), Some("t0ken"));
        assert_eq!(cfg.registry.project, "atlas");
        assert_eq!(cfg.upload.workers, 3);
        assert_eq!(cfg.upload.queue_depth, 9);
        assert_eq!(cfg.logging.level, "warn");
    }

    #[test]
    fn build_validated_rejects_invalid() {
        let result = ConfigBuilder::new().upload_workers(0).build_validated();
        let errors = result.expect_err("zero workers must be rejected");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "upload.workers");
    }

    #[test]
    fn config_round_trips_through_yaml() {
        let cfg = ConfigBuilder::new().registry_project("atlas").build();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.registry.project, "atlas");
        assert_eq!(parsed.upload.workers, cfg.upload.workers);
    }
}
