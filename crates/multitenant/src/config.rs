//! Tenant isolation configuration.
//!
//! Supports programmatic construction and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TENANCY_LOG_LEVEL` | info | Log level |
//! | `TENANCY_UNSCOPED_READ_SAMPLE_EVERY` | 1 | Report every n-th unscoped interactive read (0 = never) |
//! | `TENANCY_DEFAULT_TENANT_COLUMN` | tenant_id | Foreign key used by `Tenancy::bind` |
//!
//! # Example
//!
//! ```rust
//! use helios_multitenant::IsolationConfig;
//!
//! // Create from environment
//! let config = IsolationConfig::from_env();
//!
//! // Or create programmatically
//! let config = IsolationConfig {
//!     unscoped_read_sample_every: 100,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use clap::Parser;

/// Tenant isolation settings.
#[derive(Debug, Clone, Parser)]
#[command(name = "tenancy")]
#[command(about = "Tenant isolation settings")]
pub struct IsolationConfig {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "TENANCY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Report one out of every n unscoped interactive reads. 1 reports all, 0 none.
    #[arg(long, env = "TENANCY_UNSCOPED_READ_SAMPLE_EVERY", default_value = "1")]
    pub unscoped_read_sample_every: u32,

    /// Tenant foreign key column used when a binding names none.
    #[arg(long, env = "TENANCY_DEFAULT_TENANT_COLUMN", default_value = "tenant_id")]
    pub default_tenant_column: String,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            unscoped_read_sample_every: 1,
            default_tenant_column: "tenant_id".to_string(),
        }
    }
}

impl IsolationConfig {
    /// Creates a configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self::try_parse_from(["tenancy"]).unwrap_or_default()
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
        if !LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            errors.push(format!("Unknown log level '{}'", self.log_level));
        }

        if self.default_tenant_column.trim().is_empty() {
            errors.push("Default tenant column cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// Debug logging, and every unscoped read is reported.
    pub fn for_testing() -> Self {
        Self {
            log_level: "debug".to_string(),
            unscoped_read_sample_every: 1,
            default_tenant_column: "tenant_id".to_string(),
        }
    }
}
