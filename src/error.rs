//! Unified error hierarchy for CycleFem
//!
//! The prediction, risk and statistics engines are total and never fail;
//! errors come from the record layer, import/export and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all CycleFem operations
#[derive(Debug, Error)]
pub enum CycleFemError {
    /// Record management errors
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// Import/export errors
    #[error("Import/Export error: {0}")]
    ImportExport(#[from] ImportExportError),

    /// Caller input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Errors raised while mutating a user's cycle or activity records
#[derive(Debug, Error)]
pub enum RecordError {
    /// No record with this id
    #[error("Record not found: {kind}.{id}")]
    NotFound { kind: RecordKind, id: String },

    /// End date before start date
    #[error("Invalid date range: end {end} is before start {start}")]
    InvalidRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Invalid field value
    #[error("Invalid field value in {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Cycle,
    Activity,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Cycle => write!(f, "cycle"),
            RecordKind::Activity => write!(f, "activity"),
        }
    }
}

/// Import and export errors
#[derive(Debug, Error)]
pub enum ImportExportError {
    /// Unsupported format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Format-specific parsing error
    #[error("Parse error in {format} at line {line}: {reason}")]
    ParseError {
        format: String,
        line: usize,
        reason: String,
    },

    /// Missing required data
    #[error("Missing required data: {field}")]
    MissingData { field: String },

    /// Export failed
    #[error("Export failed to {path}: {reason}")]
    ExportFailed { path: PathBuf, reason: String },
}

impl From<csv::Error> for ImportExportError {
    fn from(err: csv::Error) -> Self {
        let line = err
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or_default();
        ImportExportError::ParseError {
            format: "csv".to_string(),
            line,
            reason: err.to_string(),
        }
    }
}

/// Result type alias for CycleFem operations
pub type Result<T> = std::result::Result<T, CycleFemError>;

impl CycleFemError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CycleFemError::Record(_) => ErrorSeverity::Warning,
            CycleFemError::Validation(_) => ErrorSeverity::Warning,
            CycleFemError::ImportExport(ImportExportError::ParseError { .. }) => {
                ErrorSeverity::Warning
            }
            CycleFemError::Configuration(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            CycleFemError::Record(RecordError::NotFound { kind, id }) => {
                format!("No {} with id {} exists", kind, id)
            }
            CycleFemError::Record(RecordError::InvalidRange { start, end }) => {
                format!(
                    "A period cannot end ({}) before it starts ({})",
                    end.format("%Y-%m-%d"),
                    start.format("%Y-%m-%d")
                )
            }
            CycleFemError::ImportExport(ImportExportError::UnsupportedFormat { format }) => {
                format!("Files of type '{}' are not supported. Use csv or json.", format)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical error requiring immediate attention
    Critical,
    /// Error that prevents the operation
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
