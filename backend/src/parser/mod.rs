//! Source table loading with encoding and delimiter auto-detection.
//!
//! Turns spreadsheet sheets and CSV files into [`RawTable`]s. Column names
//! are left exactly as found; normalization happens in
//! [`crate::transform::schema`].

pub mod discover;
pub mod workbook;

use std::path::Path;

use crate::error::{LoadError, LoadResult};
use crate::models::{Cell, Provenance, RawTable};

pub use discover::{find_input_files, SourceKind};
pub use workbook::read_workbook;

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> LoadResult<String> {
    let text = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => {
            let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
            String::from_utf8_lossy(bytes).into_owned()
        }
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => {
                let (text, _, had_errors) = enc.decode(bytes);
                if had_errors {
                    return Err(LoadError::Encoding(format!("invalid {} byte sequence", other)));
                }
                text.into_owned()
            }
            None => String::from_utf8_lossy(bytes).into_owned(),
        },
    };
    Ok(text)
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text into a raw table with an explicit delimiter.
///
/// Every field is read as text; blank fields become [`Cell::Missing`].
/// A file with only a header yields an empty table, and an empty file yields
/// a table with no columns.
pub fn parse_csv_str(content: &str, delimiter: char, provenance: Provenance) -> LoadResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let csv_err = |source| LoadError::Csv { path: provenance.file.clone(), source };

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut table = RawTable::new(provenance.clone(), headers);

    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        // blank and delimiter-only lines carry no data
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        table.push_row(record.iter().map(Cell::from_text).collect());
    }

    Ok(table)
}

/// Read a CSV file with auto-detection of encoding and delimiter.
pub fn read_csv_file(path: &Path) -> LoadResult<RawTable> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let encoding = detect_encoding(&bytes);
    let content = decode_content(&bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    tracing::debug!(path = %path.display(), %encoding, ?delimiter, "parsing csv");
    parse_csv_str(&content, delimiter, Provenance::new(path, None))
}

/// Load every table a source file contains: one per sheet for workbooks,
/// exactly one for CSV files.
pub fn load_source(path: &Path) -> LoadResult<Vec<RawTable>> {
    match SourceKind::from_path(path) {
        Some(SourceKind::Csv) => Ok(vec![read_csv_file(path)?]),
        Some(SourceKind::Workbook) => read_workbook(path),
        None => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}
