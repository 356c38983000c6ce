//! CSV writers for the cleaned table, the quality report and summaries.
//!
//! Everything is serialized into memory first and written afterwards, so a
//! serialization failure leaves no half-written output behind. Writing itself
//! is all-or-nothing across the files of one call.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{OutputError, OutputResult};
use crate::models::{CanonicalField, CanonicalRecord};
use crate::report::QualityReport;

/// Provenance column names, appended after the canonical fields.
pub const PROVENANCE_COLUMNS: [&str; 2] = ["source_file", "source_sheet"];

/// Serialize the cleaned table.
pub fn cleaned_csv(
    records: &[CanonicalRecord],
    include_provenance: bool,
    missing_marker: &str,
) -> OutputResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = CanonicalField::ALL.iter().map(|f| f.name()).collect();
    if include_provenance {
        header.extend(PROVENANCE_COLUMNS);
    }
    writer.write_record(&header)?;

    for record in records {
        let mut row: Vec<String> = CanonicalField::ALL
            .iter()
            .map(|f| record.render(*f, missing_marker))
            .collect();

        if include_provenance {
            let (file, sheet) = match &record.provenance {
                Some(p) => (p.file.display().to_string(), p.sheet.clone().unwrap_or_default()),
                None => (String::new(), String::new()),
            };
            row.push(file);
            row.push(sheet);
        }
        writer.write_record(&row)?;
    }

    finish(writer)
}

/// Serialize the quality report as `metric,value`.
pub fn report_csv(report: &QualityReport) -> OutputResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["metric", "value"])?;
    for metric in report.iter() {
        let value = metric.value.to_string();
        writer.write_record([metric.metric.as_str(), value.as_str()])?;
    }
    finish(writer)
}

/// Serialize an arbitrary header + rows table.
pub fn table_csv(header: &[String], rows: &[Vec<String>]) -> OutputResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> OutputResult<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| OutputError::Csv(csv::Error::from(e.into_error())))
}

/// Write already-serialized files, creating parent directories as needed.
///
/// Every payload goes to a temporary sibling first. Files are moved into
/// place only once all temporaries are written; if a move fails, the files
/// already placed by this call are removed again.
pub fn write_files(files: &[(PathBuf, Vec<u8>)]) -> OutputResult<()> {
    let mut staged = Vec::with_capacity(files.len());
    for (path, bytes) in files {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|source| io_err(parent, source))?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|source| io_err(parent, source))?;
        temp.write_all(bytes).map_err(|source| io_err(path, source))?;
        staged.push((path, temp));
    }

    let mut placed: Vec<&Path> = Vec::with_capacity(staged.len());
    for (path, temp) in staged {
        if let Err(e) = temp.persist(path) {
            for done in &placed {
                let _ = fs::remove_file(done);
            }
            return Err(io_err(path, e.error));
        }
        placed.push(path);
    }
    Ok(())
}

fn io_err(path: &Path, source: std::io::Error) -> OutputError {
    OutputError::Io { path: path.to_path_buf(), source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;
    use chrono::NaiveDate;

    fn sample() -> CanonicalRecord {
        CanonicalRecord {
            date: NaiveDate::from_ymd_opt(2021, 6, 5),
            state: Some("Delhi".into()),
            district: Some("New Delhi".into()),
            pincode: Some("110001".into()),
            age_0_5: Some(1200.0),
            age_5_17: None,
            age_18_greater: Some(800.0),
            provenance: Some(Provenance::new("in/jan.xlsx", Some("Sheet1".into()))),
        }
    }

    #[test]
    fn test_cleaned_csv_layout() {
        let bytes = cleaned_csv(&[sample()], true, "").unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("date,state,district,pincode,age_0_5,age_5_17,age_18_greater,source_file,source_sheet")
        );
        assert_eq!(lines.next(), Some("2021-06-05,Delhi,New Delhi,110001,1200,,800,in/jan.xlsx,Sheet1"));
    }

    #[test]
    fn test_cleaned_csv_without_provenance() {
        let bytes = cleaned_csv(&[sample()], false, "missing").unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("date,state,district,pincode,age_0_5,age_5_17,age_18_greater\n"));
        assert!(text.contains(",1200,missing,800\n"));
    }

    #[test]
    fn test_report_csv() {
        let report = QualityReport::from_counts(5, 4);
        let text = String::from_utf8(report_csv(&report).unwrap()).unwrap();
        assert_eq!(text, "metric,value\nrows_final,4\nduplicates_removed,1\n");
    }

    #[test]
    fn test_write_files_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        write_files(&[(path.clone(), b"a,b\n".to_vec())]).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "a,b\n");
    }

    #[test]
    fn test_write_files_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("enrolment_cleaned.csv");
        let second = dir.path().join("data_quality_report.csv");
        // a directory in the way makes the second move fail
        fs::create_dir_all(&second).unwrap();

        let err = write_files(&[(first.clone(), b"x\n".to_vec()), (second.clone(), b"y\n".to_vec())])
            .unwrap_err();

        assert!(matches!(err, OutputError::Io { ref path, .. } if *path == second));
        assert!(!first.exists());
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path() != second)
            .collect();
        assert!(leftovers.is_empty(), "temporary files left behind: {:?}", leftovers);
    }
}
