//! Error types for the Evalboard pipeline.
//!
//! The hierarchy mirrors the stages a dataset goes through:
//!
//! - [`LoadError`] - the source file could not be read or parsed at all
//! - [`ProcessingError`] - rows were read but their shape cannot be normalized
//! - [`ExportError`] - the visible rows could not be serialized back to CSV
//! - [`PipelineError`] - load + processing, returned by the pipeline entry points
//! - [`ConfigError`] - invalid environment configuration
//! - [`ServerError`] - HTTP layer
//!
//! Aggregation, filtering, sorting and grouping never fail: degenerate input
//! yields placeholder values instead of errors.
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while retrieving or parsing the source CSV.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode the file content.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// Malformed CSV record.
    #[error("Invalid CSV at line {line}: {message}")]
    Csv { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl LoadError {
    /// Message shown to the end user, independent of the underlying cause.
    pub fn user_message(&self) -> &'static str {
        "Failed to load CSV file. Check file path."
    }
}

// =============================================================================
// Processing Errors
// =============================================================================

/// Errors while reconciling parsed rows into evaluations.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// A row is not a column → value mapping.
    #[error("Row {row} is not a record (found {found})")]
    NotARecord { row: usize, found: &'static str },
}

impl ProcessingError {
    /// Message shown to the end user, independent of the underlying cause.
    pub fn user_message(&self) -> &'static str {
        "Error processing dataset structure."
    }
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while serializing rows to CSV.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing visible to export.
    #[error("No rows to export")]
    NoRows,

    /// CSV writer failure.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// Writer buffer could not be recovered.
    #[error("Export buffer error: {0}")]
    Buffer(String),

    /// Output is not valid UTF-8.
    #[error("Export encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// Returned by [`crate::transform::pipeline::load_csv`] and friends. The two
/// variants stay distinct so callers can surface different messages.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source could not be loaded.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Rows could not be normalized.
    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),
}

impl PipelineError {
    /// User-visible message for the failure category.
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::Load(e) => e.user_message(),
            PipelineError::Processing(e) => e.user_message(),
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Invalid server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for processing operations.
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // LoadError -> PipelineError
        let load_err = LoadError::EmptyFile;
        let pipeline_err: PipelineError = load_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // ProcessingError -> PipelineError -> ServerError
        let processing_err = ProcessingError::NotARecord { row: 3, found: "array" };
        let pipeline_err: PipelineError = processing_err.into();
        let server_err: ServerError = pipeline_err.into();
        assert!(server_err.to_string().contains("Row 3"));
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let load: PipelineError = LoadError::NoHeaders.into();
        let processing: PipelineError =
            ProcessingError::NotARecord { row: 0, found: "string" }.into();

        assert_eq!(load.user_message(), "Failed to load CSV file. Check file path.");
        assert_eq!(processing.user_message(), "Error processing dataset structure.");
    }

    #[test]
    fn test_csv_error_format() {
        let err = LoadError::Csv { line: 5, message: "unterminated quote".into() };
        let msg = err.to_string();
        assert!(msg.contains("line 5"));
        assert!(msg.contains("unterminated quote"));
    }
}
