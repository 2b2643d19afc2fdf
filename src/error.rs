/*!
 * Error handling for PBJ wrapped-summary operations
 *
 * Provides detailed error types with context, suggestions, and recovery guidance.
 * Conditions the engine tolerates (duplicate identifiers, misaligned rows,
 * incomplete joins, missing optional datasets) are reported as diagnostics
 * through [`crate::observe`] instead of failing.
 */

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use serde::{Serialize, Deserialize};

/// Library result type
pub type Result<T> = std::result::Result<T, WrappedError>;

/// Error types with context and suggestions
#[derive(Error, Debug)]
pub enum WrappedError {
    /// File I/O errors with context
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
        context: ErrorContext,
    },

    /// CSV parsing errors with location information
    #[error("CSV parsing error at line {line:?}: {message}")]
    CsvParse {
        message: String,
        line: Option<usize>,
        context: ErrorContext,
    },

    /// Data validation errors with detailed information
    #[error("Data validation error: {message}")]
    DataValidation {
        message: String,
        field: Option<String>,
        value: Option<String>,
        context: ErrorContext,
    },

    /// File not found with suggestions
    #[error("File not found: {path}")]
    FileNotFound {
        path: PathBuf,
        suggestion: String,
    },

    /// Quarter tag outside the `YYYYQ[1-4]` shape
    #[error("Invalid quarter tag '{value}'")]
    InvalidQuarterTag {
        value: String,
        suggestion: String,
    },

    /// Facility identifier that cannot be canonicalized
    #[error("Invalid facility identifier '{value}': {reason}")]
    InvalidFacilityId {
        value: String,
        reason: String,
    },

    /// Scope identifier that maps to no state, region, or the nation
    #[error("No scope matches identifier '{input}'")]
    UnresolvedIdentifier {
        input: String,
    },

    /// The resolved scope has no current-quarter entity row
    #[error("No data for {scope} in quarter {quarter}")]
    NoCurrentData {
        scope: String,
        quarter: String,
    },

    /// Two quarters that cannot form a comparison pair
    #[error("Quarter mismatch: {message}")]
    QuarterMismatch {
        message: String,
    },

    /// Schema mismatch with details
    #[error("Schema mismatch: {message}")]
    SchemaMismatch {
        message: String,
        missing_columns: Vec<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        suggestion: Option<String>,
    },

    /// Export errors
    #[error("Export error: {message}")]
    Export {
        message: String,
        format: ExportFormat,
        suggestion: Option<String>,
    },

    /// Generic errors with custom message
    #[error("{message}")]
    Custom {
        message: String,
        suggestion: Option<String>,
    },
}

/// Error context providing additional information
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    pub file_path: Option<PathBuf>,
    pub line_number: Option<usize>,
    pub column_name: Option<String>,
    pub facility_id: Option<String>,
}

/// Export format for summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Json,
    JsonLines,
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "JSON"),
            ExportFormat::JsonLines => write!(f, "JSON Lines"),
            ExportFormat::Csv => write!(f, "CSV"),
        }
    }
}

impl WrappedError {
    /// Create a file not found error with helpful suggestion
    pub fn file_not_found_with_suggestion(path: PathBuf) -> Self {
        let name = path.to_string_lossy().to_lowercase();
        let suggestion = if name.contains("facility") {
            format!(
                "Check if the facility file exists at '{}'. Facility files follow the pattern \
                'facility_YYYYQN.csv' and come from the CMS PBJ Daily Nurse Staffing release.",
                path.display()
            )
        } else if name.contains("provider") {
            format!(
                "Check if the provider file exists at '{}'. Provider files follow the pattern \
                'provider_info_YYYYQN.csv' and come from the CMS Nursing Home Provider Information release.",
                path.display()
            )
        } else {
            format!(
                "Check if the file exists at '{}'. Make sure the path is correct and you have read permissions.",
                path.display()
            )
        };

        Self::FileNotFound { path, suggestion }
    }

    /// Create an invalid quarter tag error
    pub fn invalid_quarter(value: &str) -> Self {
        Self::InvalidQuarterTag {
            value: value.to_string(),
            suggestion: "Quarter tags look like '2025Q2': a four-digit year, 'Q', and 1-4".to_string(),
        }
    }

    /// Create an invalid facility identifier error with a reason
    pub fn invalid_facility_id(value: &str) -> Self {
        let reason = if value.trim().is_empty() {
            "identifier cannot be empty".to_string()
        } else if value.chars().any(|c| !c.is_ascii_alphanumeric() && !"-_ .".contains(c)) {
            "identifier contains unexpected characters".to_string()
        } else {
            format!(
                "identifier must be at most {} characters after removing separators",
                crate::constants::FACILITY_ID_WIDTH
            )
        };

        Self::InvalidFacilityId {
            value: value.to_string(),
            reason,
        }
    }

    /// Create a schema mismatch error listing missing columns
    pub fn missing_columns(file_kind: &str, missing: Vec<String>) -> Self {
        Self::SchemaMismatch {
            message: format!("{} file is missing columns: {}", file_kind, missing.join(", ")),
            missing_columns: missing,
        }
    }

    /// Whether this error means "not found" to a caller rendering a scope
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnresolvedIdentifier { .. } | Self::NoCurrentData { .. })
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::FileNotFound { suggestion, .. } => {
                format!("{}\n\nSuggestion: {}", self, suggestion)
            }
            Self::InvalidQuarterTag { suggestion, .. } => {
                format!("{}\n\nSuggestion: {}", self, suggestion)
            }
            Self::UnresolvedIdentifier { .. } => {
                format!(
                    "{}\n\nSuggestion: use 'usa', a state name or postal code (e.g. 'new-york', 'NY'), \
                    or a region such as 'region-2'",
                    self
                )
            }
            Self::SchemaMismatch { missing_columns, .. } => {
                format!("{}\n\nMissing: {}", self, missing_columns.join(", "))
            }
            Self::Configuration { suggestion: Some(sug), .. }
            | Self::Export { suggestion: Some(sug), .. }
            | Self::Custom { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            _ => self.to_string(),
        }
    }
}

// Convenience conversions
impl From<std::io::Error> for WrappedError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
            context: ErrorContext::default(),
        }
    }
}

impl From<csv::Error> for WrappedError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|pos| pos.line() as usize);

        Self::CsvParse {
            message: err.to_string(),
            line,
            context: ErrorContext::default(),
        }
    }
}

impl From<serde_json::Error> for WrappedError {
    fn from(err: serde_json::Error) -> Self {
        WrappedError::Export {
            message: err.to_string(),
            format: ExportFormat::Json,
            suggestion: Some("Check if the data is serializable to JSON.".to_string()),
        }
    }
}
