//! Run configuration.
//!
//! Every path the pipeline touches comes from here; nothing is hardcoded in
//! the cleaning code. Values start from [`Default`], can be overridden from
//! the environment (a `.env` file is honoured by the CLI), and finally from
//! command-line flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Input directory override.
pub const ENV_INPUT_DIR: &str = "ENROLCLEAN_INPUT_DIR";
/// Output directory override.
pub const ENV_OUTPUT_DIR: &str = "ENROLCLEAN_OUTPUT_DIR";
/// Provenance toggle (`0`/`false`/`no` disables).
pub const ENV_PROVENANCE: &str = "ENROLCLEAN_PROVENANCE";
/// Summary directory override.
pub const ENV_SUMMARY_DIR: &str = "ENROLCLEAN_SUMMARY_DIR";

/// Workbook extensions scanned by default.
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "xlsm"];

/// Options for the cleaning pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory scanned recursively for source files
    pub input_dir: PathBuf,

    /// Directory receiving the cleaned table and the report
    pub output_dir: PathBuf,

    /// File name of the cleaned table
    pub cleaned_file: String,

    /// File name of the quality report
    pub report_file: String,

    /// Accepted file extensions, without the dot
    pub extensions: Vec<String>,

    /// Write `source_file` / `source_sheet` columns
    pub include_provenance: bool,

    /// Text written for missing values in the cleaned table
    pub missing_marker: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let input_dir = PathBuf::from(".");
        Self {
            output_dir: input_dir.join("cleaned"),
            input_dir,
            cleaned_file: "enrolment_cleaned.csv".to_string(),
            report_file: "data_quality_report.csv".to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_provenance: true,
            missing_marker: String::new(),
        }
    }
}

impl PipelineConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = env_path(ENV_INPUT_DIR) {
            config.output_dir = dir.join("cleaned");
            config.input_dir = dir;
        }
        if let Some(dir) = env_path(ENV_OUTPUT_DIR) {
            config.output_dir = dir;
        }
        if let Ok(value) = std::env::var(ENV_PROVENANCE) {
            config.include_provenance = parse_flag(&value).unwrap_or(config.include_provenance);
        }
        config
    }

    /// Point the pipeline at `dir`, keeping the output next to it.
    pub fn with_input_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.input_dir = dir.as_ref().to_path_buf();
        self.output_dir = self.input_dir.join("cleaned");
        self
    }

    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Also pick up `.csv` sources.
    pub fn with_csv(mut self) -> Self {
        if !self.extensions.iter().any(|e| e.eq_ignore_ascii_case("csv")) {
            self.extensions.push("csv".to_string());
        }
        self
    }

    pub fn cleaned_path(&self) -> PathBuf {
        self.output_dir.join(&self.cleaned_file)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file)
    }
}

/// Options for the summary step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// Cleaned table to summarise
    pub cleaned_path: PathBuf,

    /// Directory receiving the summary files
    pub summary_dir: PathBuf,

    /// Rows shown per highlight table in the log
    pub highlight_rows: usize,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            cleaned_path: PipelineConfig::default().cleaned_path(),
            summary_dir: PathBuf::from("summaries"),
            highlight_rows: 10,
        }
    }
}

impl AggregateConfig {
    /// Summarise the output of a cleaning run.
    pub fn for_pipeline(pipeline: &PipelineConfig) -> Self {
        let mut config = Self::from_env();
        config.cleaned_path = pipeline.cleaned_path();
        config
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = env_path(ENV_SUMMARY_DIR) {
            config.summary_dir = dir;
        }
        config
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
