//! # Enrolclean - Enrolment spreadsheet cleaning and aggregation
//!
//! Enrolclean consolidates enrolment spreadsheets exported by different
//! offices (varying headers, date styles, number formats, duplicated rows)
//! into one canonical table, reports what the cleaning changed, and writes
//! group-by-sum summaries over the result.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Workbooks / │────▶│   Parser    │────▶│  Transform  │────▶│ Cleaned CSV │
//! │  CSV files  │     │ (per sheet) │     │ (clean+dedup│     │  + report   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    │
//!                                                             ┌──────▼──────┐
//!                                                             │  Aggregate  │
//!                                                             │ (summaries) │
//!                                                             └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use enrolclean::{run_clean, PipelineConfig};
//!
//! fn main() {
//!     let config = PipelineConfig::default().with_input_dir("raw");
//!     let result = run_clean(&config).unwrap();
//!     println!("Kept {} rows", result.reconciled.report.rows_final());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cells, raw tables and canonical records
//! - [`config`] - Run configuration
//! - [`parser`] - Source discovery and loading
//! - [`transform`] - Normalization, cleaners, reconciliation, pipeline
//! - [`report`] - Data-quality report
//! - [`output`] - CSV writers
//! - [`aggregate`] - Summaries over the cleaned table
//! - [`logs`] - Logging helpers

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Loading
pub mod parser;

// Cleaning
pub mod report;
pub mod transform;

// Writing
pub mod output;

// Summaries
pub mod aggregate;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AggregateError, AggregateResult, LoadError, LoadResult, OutputError, OutputResult,
    PipelineError, PipelineResult,
};

// =============================================================================
// Re-exports - Models & config
// =============================================================================

pub use config::{AggregateConfig, PipelineConfig};
pub use models::{CanonicalField, CanonicalRecord, Cell, Provenance, RawTable};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{find_input_files, load_source, read_csv_file, read_workbook, SourceKind};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    clean_count, clean_date, clean_pincode, clean_text, normalize_name, normalize_table,
    reconcile, unify, AliasTable, Reconciled,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{clean_tables, load_tables, run_all, run_clean, CleanResult};

// =============================================================================
// Re-exports - Report & aggregation
// =============================================================================

pub use aggregate::{run_aggregate, summarize, EnrolmentFrame, Summaries, SummaryTable};
pub use report::QualityReport;
