//! Configuration for the CRM core.
//!
//! [`CrmConfig`] uses the builder pattern; every setting has a default so
//! `CrmConfig::default()` is usable as-is.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CrmError, Result};

/// Configuration shared by the import pipeline, dashboard and local storage.
///
/// # Example
///
/// ```rust,ignore
/// use crm_core::CrmConfig;
///
/// let config = CrmConfig::builder()
///     .data_dir("./crm-data")
///     .preview_rows(10)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmConfig {
    /// Directory holding the record snapshot and local key/value files.
    /// Default: "crm-data"
    pub data_dir: PathBuf,

    /// Number of mapped rows shown by the import preview.
    /// Default: 5
    pub preview_rows: usize,

    /// `source` value given to imported contacts that do not map one.
    /// Default: "Import"
    pub import_source: String,

    /// File name prefix for contact exports (`<prefix>_<date>.csv`).
    /// Default: "contacts"
    pub export_prefix: String,

    /// How far ahead the dashboard looks for follow-ups, in days.
    /// Default: 7
    pub follow_up_window_days: i64,

    /// Maximum entries in each dashboard list (recent activity, follow-ups, overdue tasks).
    /// Default: 5
    pub dashboard_list_limit: usize,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("crm-data"),
            preview_rows: 5,
            import_source: "Import".to_string(),
            export_prefix: "contacts".to_string(),
            follow_up_window_days: 7,
            dashboard_list_limit: 5,
        }
    }
}

impl CrmConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CrmConfigBuilder {
        CrmConfigBuilder::default()
    }

    /// Load a configuration from a JSON file.
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: CrmConfig = serde_json::from_str(&text)?;
        config
            .validate()
            .map_err(|e| CrmError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Path of the record snapshot file inside the data directory.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("records.json")
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.preview_rows == 0 {
            return Err(ConfigValidationError::InvalidCount {
                field: "preview_rows".to_string(),
                value: self.preview_rows,
            });
        }

        if self.dashboard_list_limit == 0 {
            return Err(ConfigValidationError::InvalidCount {
                field: "dashboard_list_limit".to_string(),
                value: self.dashboard_list_limit,
            });
        }

        if self.follow_up_window_days <= 0 {
            return Err(ConfigValidationError::InvalidWindow(
                self.follow_up_window_days,
            ));
        }

        if self.export_prefix.trim().is_empty() {
            return Err(ConfigValidationError::EmptyValue(
                "export_prefix".to_string(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid value for '{field}': {value} (must be at least 1)")]
    InvalidCount { field: String, value: usize },

    #[error("Invalid follow-up window: {0} days (must be at least 1)")]
    InvalidWindow(i64),

    #[error("'{0}' cannot be empty")]
    EmptyValue(String),
}

/// Builder for [`CrmConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CrmConfigBuilder {
    data_dir: Option<PathBuf>,
    preview_rows: Option<usize>,
    import_source: Option<String>,
    export_prefix: Option<String>,
    follow_up_window_days: Option<i64>,
    dashboard_list_limit: Option<usize>,
}

impl CrmConfigBuilder {
    /// Set the data directory.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Set how many rows the import preview shows.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Set the default `source` for imported contacts.
    pub fn import_source(mut self, source: impl Into<String>) -> Self {
        self.import_source = Some(source.into());
        self
    }

    /// Set the export file name prefix.
    pub fn export_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.export_prefix = Some(prefix.into());
        self
    }

    /// Set the follow-up look-ahead window in days.
    pub fn follow_up_window_days(mut self, days: i64) -> Self {
        self.follow_up_window_days = Some(days);
        self
    }

    /// Set the maximum length of dashboard lists.
    pub fn dashboard_list_limit(mut self, limit: usize) -> Self {
        self.dashboard_list_limit = Some(limit);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CrmConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<CrmConfig, ConfigValidationError> {
        let defaults = CrmConfig::default();
        let config = CrmConfig {
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            preview_rows: self.preview_rows.unwrap_or(defaults.preview_rows),
            import_source: self.import_source.unwrap_or(defaults.import_source),
            export_prefix: self.export_prefix.unwrap_or(defaults.export_prefix),
            follow_up_window_days: self
                .follow_up_window_days
                .unwrap_or(defaults.follow_up_window_days),
            dashboard_list_limit: self
                .dashboard_list_limit
                .unwrap_or(defaults.dashboard_list_limit),
        };

        config.validate()?;
        Ok(config)
    }
}
