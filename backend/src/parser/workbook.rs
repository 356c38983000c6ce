//! Workbook reading through calamine (xlsx, xls, xlsm, xlsb, ods).
//!
//! Every non-empty sheet becomes one [`RawTable`]; the first row of the used
//! range is the header row.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{LoadError, LoadResult};
use crate::models::{Cell, Provenance, RawTable};

/// Read all sheets of a workbook.
pub fn read_workbook(path: &Path) -> LoadResult<Vec<RawTable>> {
    let workbook_err = |e: calamine::Error| LoadError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut workbook = open_workbook_auto(path).map_err(workbook_err)?;
    let sheet_names = workbook.sheet_names().to_vec();

    let mut tables = Vec::with_capacity(sheet_names.len());

    for sheet_name in sheet_names {
        let range = workbook.worksheet_range(&sheet_name).map_err(workbook_err)?;
        let mut rows = range.rows();

        let Some(header_row) = rows.next() else {
            tracing::debug!(path = %path.display(), sheet = %sheet_name, "skipping empty sheet");
            continue;
        };

        let headers: Vec<String> = header_row.iter().map(header_text).collect();
        let provenance = Provenance::new(path, Some(sheet_name.clone()));
        let mut table = RawTable::new(provenance, headers);

        for row in rows {
            let cells: Vec<Cell> = row.iter().map(data_to_cell).collect();
            if cells.iter().all(Cell::is_missing) {
                continue;
            }
            table.push_row(cells);
        }

        tables.push(table);
    }

    Ok(tables)
}

fn header_text(data: &Data) -> String {
    match data {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Map a calamine cell onto the pipeline's cell model.
///
/// Error cells (`#N/A`, `#VALUE!`) and blanks are missing. Booleans are kept
/// as text so they fail every cleaner rather than turning into counts.
pub fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Missing,
        Data::String(s) => Cell::from_text(s),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| Cell::Date(d.date()))
            .unwrap_or(Cell::Missing),
        Data::DateTimeIso(s) => Cell::from_text(s),
        Data::DurationIso(_) => Cell::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};
    use chrono::NaiveDate;
    use rust_xlsxwriter::{Format, Workbook};

    fn date_cell(serial: f64, is_1904: bool) -> Cell {
        data_to_cell(&Data::DateTime(ExcelDateTime::new(
            serial,
            ExcelDateTimeType::DateTime,
            is_1904,
        )))
    }

    fn ymd(y: i32, m: u32, d: u32) -> Cell {
        Cell::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_native_dates_both_date_systems() {
        assert_eq!(date_cell(44352.0, false), ymd(2021, 6, 5));
        // time-of-day fraction is dropped
        assert_eq!(date_cell(44352.75, false), ymd(2021, 6, 5));
        // same calendar day stored by a 1904-system workbook
        assert_eq!(date_cell(42890.0, true), ymd(2021, 6, 5));
    }

    /// Two data sheets around a blank one.
    fn write_sample_workbook(path: &Path) {
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");

        let jan = workbook.add_worksheet();
        jan.set_name("Jan").unwrap();
        for (col, header) in ["State", "Pin", "Age 0-5", "Date"].iter().enumerate() {
            jan.write_string(0, col as u16, *header).unwrap();
        }
        jan.write_string(1, 0, " delhi ").unwrap();
        jan.write_number(1, 1, 110001.0).unwrap();
        jan.write_number(1, 2, 12.0).unwrap();
        let date = rust_xlsxwriter::ExcelDateTime::from_ymd(2021, 6, 5).unwrap();
        jan.write_datetime_with_format(1, 3, &date, &date_format).unwrap();

        workbook.add_worksheet().set_name("Notes").unwrap();

        let feb = workbook.add_worksheet();
        feb.set_name("Feb").unwrap();
        feb.write_string(0, 0, "State Name").unwrap();
        feb.write_string(0, 1, "Pincode").unwrap();
        feb.write_string(1, 0, "kerala").unwrap();
        feb.write_string(1, 1, "682 001").unwrap();

        workbook.save(path).unwrap();
    }

    #[test]
    fn test_one_table_per_non_empty_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offices.xlsx");
        write_sample_workbook(&path);

        let tables = read_workbook(&path).unwrap();
        let sheets: Vec<_> = tables.iter().map(|t| t.provenance.sheet.as_deref()).collect();
        assert_eq!(sheets, vec![Some("Jan"), Some("Feb")]);
        assert!(tables.iter().all(|t| t.provenance.file == path));

        let jan = &tables[0];
        assert_eq!(jan.headers, vec!["State", "Pin", "Age 0-5", "Date"]);
        assert_eq!(jan.len(), 1);
        assert_eq!(jan.rows[0][0], Cell::Text(" delhi ".into()));
        assert_eq!(jan.rows[0][1], Cell::Number(110001.0));
        assert_eq!(jan.rows[0][3], ymd(2021, 6, 5));

        assert_eq!(tables[1].rows[0][1], Cell::Text("682 001".into()));
    }

    #[test]
    fn test_data_to_cell() {
        assert_eq!(data_to_cell(&Data::Empty), Cell::Missing);
        assert_eq!(data_to_cell(&Data::Int(12)), Cell::Number(12.0));
        assert_eq!(data_to_cell(&Data::Float(1.5)), Cell::Number(1.5));
        assert_eq!(data_to_cell(&Data::String("  ".into())), Cell::Missing);
        assert_eq!(data_to_cell(&Data::String("Delhi".into())), Cell::Text("Delhi".into()));
        assert_eq!(data_to_cell(&Data::Bool(true)), Cell::Text("true".into()));
    }

    #[test]
    fn test_unreadable_workbook_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let err = read_workbook(&path).unwrap_err();
        assert!(matches!(err, LoadError::Workbook { .. }));
    }
}
