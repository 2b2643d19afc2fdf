/*!
 * Configuration support for the summary engine
 *
 * Provides runtime options for eligibility floors, list sizes, the
 * newly-flagged rotation and loader behavior.
 */

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::{ExportFormat, Result, WrappedError};

/// Engine and loader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrappedConfig {
    /// Census eligibility floor for extremes and facility movers
    #[serde(default = "default_min_census")]
    pub min_census: f64,

    /// Entries in each lowest/highest list
    #[serde(default = "default_extremes_count")]
    pub extremes_count: usize,

    /// Entries in each riser/decliner leaderboard
    #[serde(default = "default_movers_count")]
    pub movers_count: usize,

    /// Entries in the newly-SFF list
    #[serde(default = "default_newly_flagged_limit")]
    pub newly_flagged_limit: usize,

    /// Tenure at or below which a feed SFF counts as new
    #[serde(default = "default_sff_new_tenure_months")]
    pub sff_new_tenure_months: u32,

    /// Seed for a reproducible rotation of the newly-SFF list (None = sort by id)
    #[serde(default)]
    pub highlight_seed: Option<u64>,

    /// Whether the loader skips unparsable rows
    #[serde(default = "default_skip_invalid_records")]
    pub skip_invalid_records: bool,

    /// Whether to show a spinner while loading files
    #[serde(default)]
    pub enable_progress_bar: bool,

    /// Threads for batch computation (None = use all available)
    #[serde(default)]
    pub parallel_threads: Option<usize>,

    /// Default export format
    #[serde(default)]
    pub default_export_format: ExportFormat,
}

impl Default for WrappedConfig {
    fn default() -> Self {
        Self {
            min_census: default_min_census(),
            extremes_count: default_extremes_count(),
            movers_count: default_movers_count(),
            newly_flagged_limit: default_newly_flagged_limit(),
            sff_new_tenure_months: default_sff_new_tenure_months(),
            highlight_seed: None,
            skip_invalid_records: default_skip_invalid_records(),
            enable_progress_bar: false,
            parallel_threads: None,
            default_export_format: ExportFormat::Json,
        }
    }
}

// Default value functions for serde
fn default_min_census() -> f64 {
    constants::DEFAULT_MIN_CENSUS
}

fn default_extremes_count() -> usize {
    constants::DEFAULT_EXTREMES_COUNT
}

fn default_movers_count() -> usize {
    constants::DEFAULT_MOVERS_COUNT
}

fn default_newly_flagged_limit() -> usize {
    constants::DEFAULT_NEWLY_FLAGGED_LIMIT
}

fn default_sff_new_tenure_months() -> u32 {
    constants::DEFAULT_SFF_NEW_TENURE_MONTHS
}

fn default_skip_invalid_records() -> bool {
    true
}

impl WrappedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash of the options that change summary content
    ///
    /// Loader and output options are left out.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.min_census.to_bits().hash(&mut hasher);
        self.extremes_count.hash(&mut hasher);
        self.movers_count.hash(&mut hasher);
        self.newly_flagged_limit.hash(&mut hasher);
        self.sff_new_tenure_months.hash(&mut hasher);
        self.highlight_seed.hash(&mut hasher);
        hasher.finish()
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - `PBJ_MIN_CENSUS`: number
    /// - `PBJ_EXTREMES_COUNT`, `PBJ_MOVERS_COUNT`, `PBJ_NEWLY_FLAGGED_LIMIT`: number
    /// - `PBJ_SFF_NEW_TENURE_MONTHS`: number
    /// - `PBJ_HIGHLIGHT_SEED`: number or "none"
    /// - `PBJ_SKIP_INVALID`: "true" or "false"
    /// - `PBJ_PROGRESS_BAR`: "true" or "false"
    /// - `PBJ_PARALLEL_THREADS`: number or "auto"
    /// - `PBJ_EXPORT_FORMAT`: "json", "json_lines" or "csv"
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_parse("PBJ_MIN_CENSUS") {
            config.min_census = val;
        }
        if let Some(val) = env_parse("PBJ_EXTREMES_COUNT") {
            config.extremes_count = val;
        }
        if let Some(val) = env_parse("PBJ_MOVERS_COUNT") {
            config.movers_count = val;
        }
        if let Some(val) = env_parse("PBJ_NEWLY_FLAGGED_LIMIT") {
            config.newly_flagged_limit = val;
        }
        if let Some(val) = env_parse("PBJ_SFF_NEW_TENURE_MONTHS") {
            config.sff_new_tenure_months = val;
        }
        if let Ok(val) = std::env::var("PBJ_HIGHLIGHT_SEED") {
            config.highlight_seed = match val.to_lowercase().as_str() {
                "" | "none" => None,
                num => num.parse().ok(),
            };
        }
        if let Ok(val) = std::env::var("PBJ_SKIP_INVALID") {
            config.skip_invalid_records = val.to_lowercase() == "true";
        }
        if let Ok(val) = std::env::var("PBJ_PROGRESS_BAR") {
            config.enable_progress_bar = val.to_lowercase() == "true";
        }
        if let Ok(val) = std::env::var("PBJ_PARALLEL_THREADS") {
            config.parallel_threads = match val.to_lowercase().as_str() {
                "auto" | "0" => None,
                num => num.parse().ok(),
            };
        }
        if let Ok(val) = std::env::var("PBJ_EXPORT_FORMAT") {
            config.default_export_format = match val.to_lowercase().as_str() {
                "json_lines" | "jsonl" => ExportFormat::JsonLines,
                "csv" => ExportFormat::Csv,
                _ => ExportFormat::Json,
            };
        }

        config
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&contents).map_err(|e| WrappedError::Configuration {
            message: format!("Failed to parse config file: {}", e),
            suggestion: Some("Check that the file is valid TOML format".to_string()),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| WrappedError::Configuration {
            message: format!("Failed to serialize config: {}", e),
            suggestion: None,
        })?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/pbj-wrapped/config.toml` on Unix-like systems
    /// or `%APPDATA%\pbj-wrapped\config.toml` on Windows
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "pbj-wrapped")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the default location, environment, or defaults
    ///
    /// Priority order:
    /// 1. Default config file (if exists and valid)
    /// 2. Environment variables
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(config_path) = Self::default_config_path() {
            if config_path.exists() {
                match Self::from_file(&config_path) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!(path = %config_path.display(), error = %e, "ignoring config file"),
                }
            }
        }

        Self::from_env()
    }

    /// Reject settings the engine cannot honor
    pub fn validate(&self) -> Result<()> {
        if !self.min_census.is_finite() || self.min_census < 0.0 {
            return Err(WrappedError::Configuration {
                message: format!("min_census must be a non-negative number, got {}", self.min_census),
                suggestion: Some("Use 0 to disable the census floor".to_string()),
            });
        }
        for (name, value) in [
            ("extremes_count", self.extremes_count),
            ("movers_count", self.movers_count),
            ("newly_flagged_limit", self.newly_flagged_limit),
        ] {
            if value == 0 {
                return Err(WrappedError::Configuration {
                    message: format!("{} must be at least 1", name),
                    suggestion: None,
                });
            }
        }
        if self.parallel_threads == Some(0) {
            return Err(WrappedError::Configuration {
                message: "parallel_threads must be at least 1".to_string(),
                suggestion: Some("Omit parallel_threads to use all available cores".to_string()),
            });
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|val| val.trim().parse().ok())
}

lazy_static::lazy_static! {
    static ref GLOBAL_CONFIG: RwLock<Option<WrappedConfig>> = RwLock::new(None);
}

/// Set the global configuration
pub fn set_global_config(config: WrappedConfig) {
    let mut guard = GLOBAL_CONFIG.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = Some(config);
}

/// Get the global configuration (or the loaded default if not set)
pub fn global_config() -> WrappedConfig {
    let guard = GLOBAL_CONFIG.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.as_ref().cloned().unwrap_or_else(WrappedConfig::load)
}

/// Clear the global configuration
pub fn clear_global_config() {
    let mut guard = GLOBAL_CONFIG.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = None;
}

/// Builder for customizing configuration
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: WrappedConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_census(mut self, floor: f64) -> Self {
        self.config.min_census = floor;
        self
    }

    pub fn extremes_count(mut self, count: usize) -> Self {
        self.config.extremes_count = count;
        self
    }

    pub fn movers_count(mut self, count: usize) -> Self {
        self.config.movers_count = count;
        self
    }

    pub fn newly_flagged_limit(mut self, limit: usize) -> Self {
        self.config.newly_flagged_limit = limit;
        self
    }

    pub fn sff_new_tenure_months(mut self, months: u32) -> Self {
        self.config.sff_new_tenure_months = months;
        self
    }

    pub fn highlight_seed(mut self, seed: Option<u64>) -> Self {
        self.config.highlight_seed = seed;
        self
    }

    pub fn skip_invalid_records(mut self, skip: bool) -> Self {
        self.config.skip_invalid_records = skip;
        self
    }

    pub fn progress_bar(mut self, enabled: bool) -> Self {
        self.config.enable_progress_bar = enabled;
        self
    }

    pub fn parallel_threads(mut self, threads: Option<usize>) -> Self {
        self.config.parallel_threads = threads;
        self
    }

    pub fn export_format(mut self, format: ExportFormat) -> Self {
        self.config.default_export_format = format;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<WrappedConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
