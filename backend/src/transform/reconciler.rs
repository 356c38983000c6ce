//! Assemble the canonical record set from heterogeneous source tables.
//!
//! # Architecture
//!
//! ```text
//! RawTable (normalized) ─┐
//! RawTable (normalized) ─┼─▶ unify ─▶ project ─▶ clean ─▶ dedup ─▶ records + report
//! RawTable (normalized) ─┘   (union    (7 fields  (per      (first
//!                             by name)  + source)  field)    wins)
//! ```
//!
//! Cleaning runs before dedup, so two rows whose malformed values both clean
//! to missing collapse into one.

use std::collections::HashSet;

use crate::models::{CanonicalField, CanonicalRecord, Cell, Provenance, RawTable};
use crate::report::QualityReport;

use super::cleaners::{clean_count, clean_date, clean_pincode, clean_text};

// =============================================================================
// Union
// =============================================================================

/// All source tables concatenated and aligned by column name.
///
/// Headers appear in first-seen order. Each row remembers the index of the
/// source it came from in `sources`.
#[derive(Debug, Clone, Default)]
pub struct UnifiedTable {
    pub headers: Vec<String>,
    pub sources: Vec<Provenance>,
    pub rows: Vec<UnifiedRow>,
}

#[derive(Debug, Clone)]
pub struct UnifiedRow {
    pub source: usize,
    pub cells: Vec<Cell>,
}

impl UnifiedTable {
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

/// Concatenate tables by column name (not position).
///
/// A column absent from a table is missing for that table's rows. When a
/// table repeats a name, only its first column with that name is used.
pub fn unify(tables: Vec<RawTable>) -> UnifiedTable {
    let mut unified = UnifiedTable::default();

    for table in tables {
        let source = unified.sources.len();

        // table column -> unified column, first occurrence only
        let mut mapping: Vec<Option<usize>> = Vec::with_capacity(table.headers.len());
        let mut taken = HashSet::new();
        for header in &table.headers {
            if !taken.insert(header.clone()) {
                mapping.push(None);
                continue;
            }
            let idx = match unified.column_index(header) {
                Some(idx) => idx,
                None => {
                    unified.headers.push(header.clone());
                    for row in unified.rows.iter_mut() {
                        row.cells.push(Cell::Missing);
                    }
                    unified.headers.len() - 1
                }
            };
            mapping.push(Some(idx));
        }

        let width = unified.headers.len();
        for row in table.rows {
            let mut cells = vec![Cell::Missing; width];
            for (cell, target) in row.into_iter().zip(&mapping) {
                if let Some(idx) = target {
                    cells[*idx] = cell;
                }
            }
            unified.rows.push(UnifiedRow { source, cells });
        }

        unified.sources.push(table.provenance);
    }

    unified
}

// =============================================================================
// Reconcile
// =============================================================================

/// Output of [`reconcile`].
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub records: Vec<CanonicalRecord>,
    pub report: QualityReport,
}

static MISSING_CELL: Cell = Cell::Missing;

/// Project, clean and deduplicate a unified table.
///
/// Canonical fields the input lacks are synthesized as missing; every other
/// column is dropped. Rows that agree on all seven canonical fields are
/// duplicates whatever their provenance; the first one in input order is kept.
pub fn reconcile(table: UnifiedTable, include_provenance: bool) -> Reconciled {
    let columns: Vec<Option<usize>> = CanonicalField::ALL
        .iter()
        .map(|field| table.column_index(field.name()))
        .collect();

    for (field, column) in CanonicalField::ALL.iter().zip(&columns) {
        if column.is_none() {
            tracing::debug!(field = %field, "canonical column absent from input, filled as missing");
        }
    }

    let rows_input = table.len();
    // raw value present but rejected by the cleaner, per field
    let mut invalid = [0usize; 7];
    let mut cleaned = Vec::with_capacity(rows_input);

    for row in &table.rows {
        let projected: Vec<&Cell> = columns
            .iter()
            .map(|col| col.map(|idx| &row.cells[idx]).unwrap_or(&MISSING_CELL))
            .collect();

        let mut record = clean_projected(&projected);

        for (i, field) in CanonicalField::ALL.iter().enumerate() {
            if !projected[i].is_missing() && record.is_missing(*field) {
                invalid[i] += 1;
            }
        }

        if include_provenance {
            record.provenance = table.sources.get(row.source).cloned();
        }
        cleaned.push(record);
    }

    let records = dedup(cleaned);

    let mut report = QualityReport::from_counts(rows_input, records.len())
        .with_metric("rows_input", rows_input as u64)
        .with_metric("sources_loaded", table.sources.len() as u64);

    for (i, field) in CanonicalField::ALL.iter().enumerate() {
        report = report.with_metric(format!("invalid_{}", field), invalid[i] as u64);
    }
    for field in CanonicalField::ALL {
        let missing = records.iter().filter(|r| r.is_missing(field)).count();
        report = report.with_metric(format!("missing_{}", field), missing as u64);
    }

    Reconciled { records, report }
}

/// Clean the seven projected cells, in [`CanonicalField::ALL`] order.
fn clean_projected(cells: &[&Cell]) -> CanonicalRecord {
    CanonicalRecord {
        date: clean_date(cells[0]),
        state: clean_text(cells[1]),
        district: clean_text(cells[2]),
        pincode: clean_pincode(cells[3]),
        age_0_5: clean_count(cells[4]),
        age_5_17: clean_count(cells[5]),
        age_18_greater: clean_count(cells[6]),
        provenance: None,
    }
}

/// Drop exact duplicates over the canonical fields, keeping first occurrences.
pub fn dedup(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records.into_iter().filter(|r| seen.insert(r.key())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table(file: &str, headers: &[&str], rows: &[&[&str]]) -> RawTable {
        let mut t = RawTable::new(
            Provenance::new(file, None),
            headers.iter().map(|h| h.to_string()).collect(),
        );
        for row in rows {
            t.push_row(row.iter().map(|v| Cell::from_text(v)).collect());
        }
        t
    }

    #[test]
    fn test_unify_aligns_by_name() {
        let a = table("a.csv", &["state", "pincode"], &[&["delhi", "110001"]]);
        let b = table("b.csv", &["pincode", "district"], &[&["400001", "mumbai"]]);

        let unified = unify(vec![a, b]);
        assert_eq!(unified.headers, vec!["state", "pincode", "district"]);
        assert_eq!(unified.rows[0].cells[2], Cell::Missing);
        assert_eq!(unified.rows[1].cells[0], Cell::Missing);
        assert_eq!(unified.rows[1].cells[1], Cell::Text("400001".into()));
        assert_eq!(unified.rows[1].source, 1);
        assert_eq!(unified.sources.len(), 2);
    }

    #[test]
    fn test_unify_repeated_header_first_wins() {
        let a = table("a.csv", &["pincode", "pincode"], &[&["110001", "999"]]);
        let unified = unify(vec![a]);
        assert_eq!(unified.headers, vec!["pincode"]);
        assert_eq!(unified.rows[0].cells, vec![Cell::Text("110001".into())]);
    }

    #[test]
    fn test_missing_canonical_columns_synthesized() {
        let a = table("a.csv", &["state"], &[&["delhi"]]);
        let out = reconcile(unify(vec![a]), false);

        assert_eq!(out.records.len(), 1);
        let r = &out.records[0];
        assert_eq!(r.state.as_deref(), Some("Delhi"));
        assert!(r.date.is_none() && r.pincode.is_none() && r.age_0_5.is_none());
        assert_eq!(out.report.get("missing_pincode"), Some(1));
    }

    #[test]
    fn test_untracked_column_difference_collapses() {
        let a = table(
            "a.csv",
            &["state", "age_0_5", "remarks"],
            &[&["delhi", "10", "first"], &["delhi", "10", "second"]],
        );
        let out = reconcile(unify(vec![a]), true);

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.report.rows_final(), 1);
        assert_eq!(out.report.duplicates_removed(), 1);
    }

    #[test]
    fn test_provenance_not_part_of_key() {
        let a = table("a.xlsx", &["state", "pincode"], &[&["delhi", "110001"]]);
        let b = table("b.xlsx", &["state", "pincode"], &[&["Delhi", "110-001"]]);
        let out = reconcile(unify(vec![a, b]), true);

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.report.duplicates_removed(), 1);
        let kept = out.records[0].provenance.as_ref().unwrap();
        assert_eq!(kept.file, std::path::PathBuf::from("a.xlsx"));
    }

    #[test]
    fn test_cleaning_creates_duplicates_before_dedup() {
        let a = table(
            "a.csv",
            &["state", "pincode", "age_0_5"],
            &[&["delhi", "12-34", "abc"], &["delhi", "123456789", "-1"]],
        );
        let out = reconcile(unify(vec![a]), false);

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.report.duplicates_removed(), 1);
        assert_eq!(out.report.get("invalid_pincode"), Some(2));
        assert_eq!(out.report.get("invalid_age_0_5"), Some(2));
    }

    #[test]
    fn test_both_missing_fields_match() {
        let a = table("a.csv", &["state", "date"], &[&["", "soon"], &["none", ""]]);
        let out = reconcile(unify(vec![a]), false);
        assert_eq!(out.records.len(), 1);
    }

    #[test]
    fn test_order_preserved_and_first_kept() {
        let a = table(
            "a.csv",
            &["state", "date"],
            &[&["b", "01/02/2021"], &["a", "01/02/2021"], &["b", "2021-02-01"]],
        );
        let out = reconcile(unify(vec![a]), false);

        let states: Vec<_> = out.records.iter().map(|r| r.state.clone().unwrap()).collect();
        assert_eq!(states, vec!["B", "A"]);
        assert_eq!(out.records[0].date, NaiveDate::from_ymd_opt(2021, 2, 1));
    }

    #[test]
    fn test_report_metric_order() {
        let out = reconcile(unify(vec![]), false);
        let names: Vec<&str> = out.report.iter().map(|m| m.metric.as_str()).collect();
        assert_eq!(&names[..4], &["rows_final", "duplicates_removed", "rows_input", "sources_loaded"]);
        assert!(names.contains(&"invalid_date"));
        assert!(names.contains(&"missing_age_18_greater"));
    }
}
