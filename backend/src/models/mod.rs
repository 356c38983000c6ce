//! Domain models for the enrolment cleaning pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Cell`] - A raw spreadsheet value (text, number, date or missing)
//! - [`Provenance`] - Source file and sheet a row came from
//! - [`RawTable`] - One source sheet with arbitrary column names
//! - [`CanonicalField`] - The seven fields of the canonical schema
//! - [`CanonicalRecord`] - One cleaned row of the canonical schema

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// Cell
// =============================================================================

/// A raw cell value as read from a spreadsheet or CSV file.
///
/// Blank cells are [`Cell::Missing`]; missingness is never encoded as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Missing,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    /// Build a cell from raw text, mapping blank strings to `Missing`.
    pub fn from_text(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Missing
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Textual form of the cell, `None` when missing.
    ///
    /// Whole numbers render without a fractional part so that a pincode
    /// stored as a float in a workbook keeps its six digits.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::from_text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Render a number the way it appears in output files: integers without `.0`.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// =============================================================================
// Provenance
// =============================================================================

/// Where a raw row came from. Kept for traceability, never part of the dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    pub file: PathBuf,
    pub sheet: Option<String>,
}

impl Provenance {
    pub fn new(file: impl AsRef<Path>, sheet: Option<String>) -> Self {
        Self { file: file.as_ref().to_path_buf(), sheet }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sheet {
            Some(sheet) => write!(f, "{}#{}", self.file.display(), sheet),
            None => write!(f, "{}", self.file.display()),
        }
    }
}

// =============================================================================
// Raw Table
// =============================================================================

/// One source table: a sheet of a workbook or a whole CSV file.
///
/// Rows are positional and always have `headers.len()` cells.
#[derive(Debug, Clone, Serialize)]
pub struct RawTable {
    pub provenance: Provenance,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(provenance: Provenance, headers: Vec<String>) -> Self {
        Self { provenance, headers, rows: Vec::new() }
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len(), Cell::Missing);
        self.rows.push(row);
    }

    /// Index of the first column with this exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Canonical Schema
// =============================================================================

/// The seven fields every cleaned record carries, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Date,
    State,
    District,
    Pincode,
    #[serde(rename = "age_0_5")]
    Age0To5,
    #[serde(rename = "age_5_17")]
    Age5To17,
    #[serde(rename = "age_18_greater")]
    Age18Plus,
}

impl CanonicalField {
    /// All canonical fields in schema order.
    pub const ALL: [CanonicalField; 7] = [
        Self::Date,
        Self::State,
        Self::District,
        Self::Pincode,
        Self::Age0To5,
        Self::Age5To17,
        Self::Age18Plus,
    ];

    /// The age-bucket count fields.
    pub const AGES: [CanonicalField; 3] = [Self::Age0To5, Self::Age5To17, Self::Age18Plus];

    /// Column name in the canonical schema.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::State => "state",
            Self::District => "district",
            Self::Pincode => "pincode",
            Self::Age0To5 => "age_0_5",
            Self::Age5To17 => "age_5_17",
            Self::Age18Plus => "age_18_greater",
        }
    }

    /// Parse a canonical column name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Canonical Record
// =============================================================================

/// One cleaned row conforming to the canonical schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub date: Option<NaiveDate>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub pincode: Option<String>,
    pub age_0_5: Option<f64>,
    pub age_5_17: Option<f64>,
    pub age_18_greater: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

/// Hashable identity of a record over the seven canonical fields.
///
/// Counts compare by bit pattern after folding `-0.0` into `0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    date: Option<NaiveDate>,
    state: Option<String>,
    district: Option<String>,
    pincode: Option<String>,
    ages: [Option<u64>; 3],
}

impl CanonicalRecord {
    /// Value of a count field.
    pub fn age(&self, field: CanonicalField) -> Option<f64> {
        match field {
            CanonicalField::Age0To5 => self.age_0_5,
            CanonicalField::Age5To17 => self.age_5_17,
            CanonicalField::Age18Plus => self.age_18_greater,
            _ => None,
        }
    }

    pub fn is_missing(&self, field: CanonicalField) -> bool {
        match field {
            CanonicalField::Date => self.date.is_none(),
            CanonicalField::State => self.state.is_none(),
            CanonicalField::District => self.district.is_none(),
            CanonicalField::Pincode => self.pincode.is_none(),
            age => self.age(age).is_none(),
        }
    }

    /// Output text for a field; missing renders as `missing`.
    pub fn render(&self, field: CanonicalField, missing: &str) -> String {
        let rendered = match field {
            CanonicalField::Date => self.date.map(|d| d.format("%Y-%m-%d").to_string()),
            CanonicalField::State => self.state.clone(),
            CanonicalField::District => self.district.clone(),
            CanonicalField::Pincode => self.pincode.clone(),
            age => self.age(age).map(format_number),
        };
        rendered.unwrap_or_else(|| missing.to_string())
    }

    /// Dedup identity, excluding provenance.
    pub fn key(&self) -> RecordKey {
        let bits = |v: Option<f64>| v.map(|n| (n + 0.0).to_bits());
        RecordKey {
            date: self.date,
            state: self.state.clone(),
            district: self.district.clone(),
            pincode: self.pincode.clone(),
            ages: [bits(self.age_0_5), bits(self.age_5_17), bits(self.age_18_greater)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_missing() {
        assert_eq!(Cell::from_text("   "), Cell::Missing);
        assert_eq!(Cell::from_text(""), Cell::Missing);
        assert_eq!(Cell::from_text(" x "), Cell::Text(" x ".into()));
    }

    #[test]
    fn test_whole_numbers_render_without_fraction() {
        assert_eq!(Cell::Number(110001.0).as_text().as_deref(), Some("110001"));
        assert_eq!(Cell::Number(2.5).as_text().as_deref(), Some("2.5"));
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for field in CanonicalField::ALL {
            assert_eq!(CanonicalField::from_name(field.name()), Some(field));
        }
        assert_eq!(CanonicalField::from_name("pin"), None);
    }

    #[test]
    fn test_key_ignores_provenance() {
        let a = CanonicalRecord {
            state: Some("Delhi".into()),
            age_0_5: Some(1.0),
            provenance: Some(Provenance::new("a.xlsx", Some("Sheet1".into()))),
            ..Default::default()
        };
        let mut b = a.clone();
        b.provenance = Some(Provenance::new("b.xlsx", None));
        assert_eq!(a.key(), b.key());

        b.age_0_5 = Some(2.0);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_render_missing_marker() {
        let record = CanonicalRecord::default();
        assert_eq!(record.render(CanonicalField::State, ""), "");
        assert_eq!(record.render(CanonicalField::State, "missing"), "missing");
    }

    #[test]
    fn test_provenance_display() {
        let p = Provenance::new("data/jan.xlsx", Some("North".into()));
        assert_eq!(p.to_string(), "data/jan.xlsx#North");
    }
}
