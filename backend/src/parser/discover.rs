//! Recursive discovery of source files under the input directory.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// How a source file is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Multi-sheet workbook read through calamine.
    Workbook,
    /// Single-table delimited text.
    Csv,
}

impl SourceKind {
    /// Classify a path by its (case-insensitive) extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Workbook),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Find every file under `root` whose extension is in `extensions`.
///
/// Extensions compare case-insensitively and without the leading dot.
/// Office lock files (`~$name.xlsx`) and anything below `exclude` are
/// skipped. Results are sorted so runs are reproducible.
pub fn find_input_files(root: &Path, extensions: &[String], exclude: Option<&Path>) -> Vec<PathBuf> {
    let wanted: Vec<String> = extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
        .collect();

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| match exclude {
            Some(excluded) => entry.path() != excluded,
            None => true,
        })
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| !is_lock_file(path))
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| wanted.contains(&e.to_ascii_lowercase()))
                .unwrap_or(false)
        })
        .collect();

    files.sort();
    files
}

fn is_lock_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("~$"))
        .unwrap_or(false)
}
