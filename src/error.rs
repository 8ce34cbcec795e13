//! Unified error hierarchy for LazzFit
//!
//! The statistics engine itself never fails: degenerate input produces
//! explicit "unavailable" values instead of errors. These types cover the
//! boundaries around it: loading tracks and run histories from files,
//! validating training-plan requests, and configuration.

use thiserror::Error;

/// Top-level error type for LazzFit operations
#[derive(Debug, Error)]
pub enum LazzFitError {
    /// Track or run history import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Training plan errors
    #[error("Training plan error: {0}")]
    Plan(#[from] PlanError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while loading samples or run records from files
#[derive(Debug, Error)]
pub enum ImportError {
    /// No importer handles this file
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    Parse { format: String, reason: String },

    /// A required column is absent from a CSV header
    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    /// A field could not be interpreted
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// The file contained nothing usable
    #[error("No data found in {source_name}")]
    Empty { source_name: String },

    /// IO error while reading the file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building training plans
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// Day of week outside 1..=7
    #[error("Invalid day of week: {0} (expected 1-7)")]
    InvalidDay(u8),

    /// A plan needs at least one training day
    #[error("At least one training day must be selected")]
    NoTrainingDays,

    /// A plan needs at least one week
    #[error("Invalid plan duration: {0} weeks")]
    InvalidDuration(u32),

    #[error("Unknown athlete level: {0}")]
    UnknownLevel(String),

    #[error("Unknown intensity: {0}")]
    UnknownIntensity(String),
}

/// Result type alias for LazzFit operations
pub type Result<T> = std::result::Result<T, LazzFitError>;

impl LazzFitError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LazzFitError::Import(ImportError::Empty { .. }) => ErrorSeverity::Warning,
            LazzFitError::Plan(_) => ErrorSeverity::Warning,
            LazzFitError::Import(_) => ErrorSeverity::Error,
            LazzFitError::Configuration(_) => ErrorSeverity::Error,
            LazzFitError::Io(_) => ErrorSeverity::Error,
            LazzFitError::Serialization(_) => ErrorSeverity::Critical,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            LazzFitError::Import(ImportError::UnsupportedFormat { format }) => {
                format!("Files of type '{}' cannot be imported. Use GPX, CSV or JSON.", format)
            }
            LazzFitError::Import(ImportError::MissingColumn { column }) => {
                format!("The CSV file is missing the '{}' column.", column)
            }
            LazzFitError::Import(ImportError::Empty { source_name }) => {
                format!("{} does not contain any runs or track points.", source_name)
            }
            LazzFitError::Plan(PlanError::NoTrainingDays) => {
                "Please select at least one training day.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = LazzFitError::Import(ImportError::Empty {
            source_name: "run.gpx".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);

        let err = LazzFitError::Import(ImportError::MissingColumn {
            column: "latitude".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_plan_error_conversion() {
        let err: LazzFitError = PlanError::InvalidDay(9).into();
        assert!(err.to_string().contains("Invalid day of week: 9"));
    }

    #[test]
    fn test_user_messages() {
        let err = LazzFitError::Import(ImportError::UnsupportedFormat {
            format: "fit".to_string(),
        });
        assert!(err.user_message().contains("cannot be imported"));

        let err = LazzFitError::Plan(PlanError::NoTrainingDays);
        assert!(err.user_message().contains("training day"));
    }
}
