//! High-level cleaning pipeline.
//!
//! Combines discovery, loading, header normalization, reconciliation and
//! output into one call.
//!
//! # Example
//!
//! ```rust,ignore
//! use enrolclean::{run_clean, PipelineConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::default().with_input_dir("raw");
//!     let result = run_clean(&config)?;
//!     println!("Kept {} rows", result.reconciled.report.rows_final());
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use crate::aggregate::{run_aggregate, Summaries};
use crate::config::{AggregateConfig, PipelineConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::models::RawTable;
use crate::output::{cleaned_csv, report_csv, write_files};
use crate::parser::{find_input_files, load_source};

use super::reconciler::{reconcile, unify, Reconciled};
use super::schema::{normalize_table, AliasTable};

/// Result of a cleaning run
#[derive(Debug, Clone)]
pub struct CleanResult {
    /// Deduplicated records and the quality report
    pub reconciled: Reconciled,

    /// Where the cleaned table was written
    pub cleaned_path: PathBuf,

    /// Where the quality report was written
    pub report_path: PathBuf,
}

/// Discover and load every source table under the input directory.
///
/// The output directory is skipped so earlier results are never read back.
/// Any unreadable file aborts the run.
pub fn load_tables(config: &PipelineConfig) -> PipelineResult<Vec<RawTable>> {
    if !config.input_dir.is_dir() {
        return Err(PipelineError::MissingInputDir(config.input_dir.clone()));
    }

    log_info(format!("Scanning {} for input files...", config.input_dir.display()));
    let root = config
        .input_dir
        .canonicalize()
        .unwrap_or_else(|_| config.input_dir.clone());
    let exclude = config.output_dir.canonicalize().ok();

    let files = find_input_files(&root, &config.extensions, exclude.as_deref());
    if files.is_empty() {
        return Err(PipelineError::NoInput { dir: config.input_dir.clone() });
    }
    log_success(format!("Found {} input files", files.len()));

    let mut tables = Vec::new();
    for file in &files {
        let loaded = load_source(file)?;
        if loaded.is_empty() {
            log_warning(format!("No data in {}", file.display()));
        }
        for table in &loaded {
            log_info_indent(format!("{}: {} rows", table.provenance, table.len()), 1);
        }
        tables.extend(loaded);
    }

    if tables.is_empty() {
        return Err(PipelineError::NoInput { dir: config.input_dir.clone() });
    }
    Ok(tables)
}

/// Normalize headers, union the tables and reconcile them. Pure.
pub fn clean_tables(tables: Vec<RawTable>, aliases: &AliasTable, include_provenance: bool) -> Reconciled {
    let normalized = tables
        .into_iter()
        .map(|table| normalize_table(table, aliases))
        .collect();
    reconcile(unify(normalized), include_provenance)
}

/// Run the cleaning pipeline and write the cleaned table and report.
///
/// Both files are serialized before either is written.
pub fn run_clean(config: &PipelineConfig) -> PipelineResult<CleanResult> {
    let tables = load_tables(config)?;
    let row_count: usize = tables.iter().map(RawTable::len).sum();
    log_info(format!("Cleaning {} rows from {} tables...", row_count, tables.len()));

    let reconciled = clean_tables(tables, &AliasTable::default(), config.include_provenance);
    log_success(format!(
        "{} rows kept, {} duplicates removed",
        reconciled.report.rows_final(),
        reconciled.report.duplicates_removed()
    ));

    let cleaned_path = config.cleaned_path();
    let report_path = config.report_path();
    let files = vec![
        (
            cleaned_path.clone(),
            cleaned_csv(&reconciled.records, config.include_provenance, &config.missing_marker)?,
        ),
        (report_path.clone(), report_csv(&reconciled.report)?),
    ];
    write_files(&files)?;

    log_success(format!("Cleaned table saved to: {}", cleaned_path.display()));
    log_success(format!("Quality report saved to: {}", report_path.display()));

    Ok(CleanResult { reconciled, cleaned_path, report_path })
}

/// Clean, then summarise the freshly written table.
pub fn run_all(
    config: &PipelineConfig,
    aggregate: &AggregateConfig,
) -> PipelineResult<(CleanResult, Summaries)> {
    let cleaned = run_clean(config)?;
    let aggregate = AggregateConfig {
        cleaned_path: cleaned.cleaned_path.clone(),
        ..aggregate.clone()
    };
    let summaries = run_aggregate(&aggregate)?;
    Ok((cleaned, summaries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, Provenance};
    use std::fs;

    fn csv_config(dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig::default().with_input_dir(dir).with_csv()
    }

    #[test]
    fn test_clean_tables_aliases_and_dedup() {
        let mut a = RawTable::new(
            Provenance::new("a.csv", None),
            vec!["State Name".into(), "Pin".into()],
        );
        a.push_row(vec![Cell::from_text(" delhi "), Cell::from_text("110-001")]);
        let mut b = RawTable::new(
            Provenance::new("b.csv", None),
            vec!["state".into(), "pincode".into()],
        );
        b.push_row(vec![Cell::from_text("Delhi"), Cell::Number(110001.0)]);

        let out = clean_tables(vec![a, b], &AliasTable::default(), true);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].pincode.as_deref(), Some("110001"));
        assert_eq!(out.report.get("sources_loaded"), Some(2));
    }

    #[test]
    fn test_missing_input_dir() {
        let config = PipelineConfig::default().with_input_dir("/definitely/not/here");
        assert!(matches!(run_clean(&config), Err(PipelineError::MissingInputDir(_))));
    }

    #[test]
    fn test_no_input_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let config = csv_config(dir.path());
        assert!(matches!(run_clean(&config), Err(PipelineError::NoInput { .. })));
        assert!(!config.cleaned_path().exists());
    }

    #[test]
    fn test_run_clean_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("jan.csv"), "State,Age 0-5\ndelhi,10\nDelhi,10\n").unwrap();

        let config = csv_config(dir.path());
        let result = run_clean(&config).unwrap();

        assert_eq!(result.reconciled.report.duplicates_removed(), 1);
        assert!(result.cleaned_path.exists());
        assert!(result.report_path.exists());
    }

    #[test]
    fn test_output_dir_not_rescanned() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("jan.csv"), "State,Age 0-5\ndelhi,10\nkerala,4\n").unwrap();

        let config = csv_config(dir.path());
        run_clean(&config).unwrap();
        let second = run_clean(&config).unwrap();

        assert_eq!(second.reconciled.report.get("rows_input"), Some(2));
        assert_eq!(second.reconciled.report.get("sources_loaded"), Some(1));
    }

    #[test]
    fn test_run_all() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("jan.csv"),
            "State,District,Age 0-5,Age 5-17\ndelhi,new delhi,10,20\nDelhi,New Delhi,5,0\n",
        )
        .unwrap();

        let config = csv_config(dir.path());
        let aggregate = AggregateConfig {
            summary_dir: dir.path().join("summaries"),
            ..AggregateConfig::default()
        };
        let (_, summaries) = run_all(&config, &aggregate).unwrap();

        assert_eq!(summaries.by_state.value(&["Delhi"], "total_enrolments"), Some(35.0));
        assert!(dir.path().join("summaries/overall_totals.csv").exists());
    }
}
