//! Error types for the enrolment cleaning pipeline.
//!
//! Only environment-level problems are errors here. Malformed cell values
//! never surface as errors: the cleaners turn them into missing values and
//! the quality report counts them.
//!
//! - [`LoadError`] - Reading spreadsheets and CSV files
//! - [`OutputError`] - Writing the cleaned table, report and summaries
//! - [`AggregateError`] - Summarising a cleaned table
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while reading a source file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The workbook could not be opened or a sheet could not be read.
    #[error("Cannot read workbook '{path}': {message}")]
    Workbook { path: PathBuf, message: String },

    /// Invalid CSV content.
    #[error("Invalid CSV in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to decode file content.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// File extension is not a supported spreadsheet format.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(PathBuf),
}

// =============================================================================
// Output Errors
// =============================================================================

/// Errors while writing output files.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Filesystem error.
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization error.
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),
}

// =============================================================================
// Aggregation Errors
// =============================================================================

/// Errors from the summary step.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// None of the age columns exist, so there is nothing to sum.
    #[error("Age columns not found. Expected at least one of: {expected}")]
    NoAgeColumns { expected: String },

    /// A grouping column is missing from the cleaned table.
    #[error("Missing column in cleaned table: {0}")]
    MissingColumn(String),

    /// Failed to read the cleaned table.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid CSV content.
    #[error("Invalid cleaned table: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to write summaries.
    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run_clean`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Nothing to clean: the input directory holds no matching files.
    #[error("No input files found in {}", dir.display())]
    NoInput { dir: PathBuf },

    /// Input directory does not exist.
    #[error("Input directory does not exist: {}", .0.display())]
    MissingInputDir(PathBuf),

    /// Source loading error.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Output error.
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// Summary step error.
    #[error("Aggregate error: {0}")]
    Aggregate(#[from] AggregateError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for output operations.
pub type OutputResult<T> = Result<T, OutputError>;

/// Result type for aggregation.
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // LoadError -> PipelineError
        let load_err = LoadError::Encoding("bad bytes".into());
        let pipeline_err: PipelineError = load_err.into();
        assert!(pipeline_err.to_string().contains("bad bytes"));

        // AggregateError -> PipelineError
        let agg_err = AggregateError::MissingColumn("state".into());
        let pipeline_err: PipelineError = agg_err.into();
        assert!(pipeline_err.to_string().contains("state"));
    }

    #[test]
    fn test_no_input_names_directory() {
        let err = PipelineError::NoInput { dir: PathBuf::from("/data/raw") };
        let msg = err.to_string();
        assert!(msg.contains("No input files"));
        assert!(msg.contains("/data/raw"));
    }

    #[test]
    fn test_no_age_columns_format() {
        let err = AggregateError::NoAgeColumns {
            expected: "age_0_5, age_5_17, age_18_greater".into(),
        };
        assert!(err.to_string().contains("age_5_17"));
    }
}
