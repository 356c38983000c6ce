//! Per-column field cleaners.
//!
//! Each cleaner maps one raw [`Cell`] to a typed optional value. They are
//! total: anything malformed becomes `None`, nothing panics or errors, and a
//! missing input stays missing. [`clean_column`] applies a cleaner to a
//! whole column without reordering it.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Cell;

/// Literal texts that mean "no value" once lowercased.
const MISSING_LITERALS: [&str; 2] = ["nan", "none"];

/// Day-first formats, two-digit years before four-digit ones so `%Y` never
/// swallows a short year.
const DAY_FIRST_FORMATS: [&str; 12] = [
    "%d/%m/%y",
    "%d-%m-%y",
    "%d.%m.%y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d-%B-%Y",
    "%d-%B-%y",
    "%d %B %y",
    "%B %d %Y",
    "%B %d, %Y",
];

/// Year-first formats, unambiguous.
const YEAR_FIRST_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

/// Splits a trailing time of day (and zone) off a date string.
static TIME_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<date>.+?)[T ]\d{1,2}:\d{2}(:\d{2}(\.\d+)?)?\s*([AaPp][Mm]|Z|[+-]\d{2}:?\d{2})?$",
    )
    .expect("valid time suffix pattern")
});

// =============================================================================
// Text
// =============================================================================

/// Clean a display-text field (`state`, `district`).
///
/// Whitespace runs collapse to one space, the ends are trimmed and the
/// result is title-cased. Empty text and the literals `nan` / `none` (any
/// case) are missing.
pub fn clean_text(cell: &Cell) -> Option<String> {
    let raw = cell.as_text()?;
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let lowered = collapsed.to_lowercase();

    if lowered.is_empty() || MISSING_LITERALS.contains(&lowered.as_str()) {
        return None;
    }

    Some(title_case(&lowered))
}

/// Uppercase every letter that does not follow another letter; lowercase the rest.
///
/// Letters whose uppercase form is more than one character (`ß`) are left
/// lowercase so the transform stays idempotent.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                let mut upper = c.to_uppercase();
                match (upper.next(), upper.next()) {
                    (Some(u), None) => out.push(u),
                    _ => out.push(c),
                }
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }

    out
}

// =============================================================================
// Date
// =============================================================================

/// Clean the `date` field.
///
/// Native date cells pass through. Text is read day-first (`03/04/2021` is
/// 3 April); if the day-first reading is impossible the value is missing,
/// there is no month-first retry. ISO year-first dates are accepted and a
/// trailing time of day is ignored. Numbers are only read as `YYYYMMDD`.
pub fn clean_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Missing => None,
        Cell::Date(d) => Some(*d),
        Cell::Number(_) | Cell::Text(_) => parse_day_first(&cell.as_text()?),
    }
}

/// Parse a date string, preferring day-before-month.
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let date_part = TIME_SUFFIX
        .captures(trimmed)
        .and_then(|caps| caps.name("date"))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed);

    DAY_FIRST_FORMATS
        .iter()
        .chain(YEAR_FIRST_FORMATS.iter())
        .filter_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .find(|d| (1000..=9999).contains(&d.year()))
}

// =============================================================================
// Pincode
// =============================================================================

/// Clean the `pincode` field: keep ASCII digits, require exactly six.
pub fn clean_pincode(cell: &Cell) -> Option<String> {
    if matches!(cell, Cell::Date(_)) {
        return None;
    }
    let digits: String = cell
        .as_text()?
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    (digits.len() == 6).then_some(digits)
}

// =============================================================================
// Counts
// =============================================================================

/// Clean an age-bucket count.
///
/// Thousands separators and surrounding whitespace are removed before
/// parsing. Unparseable, non-finite and negative values are missing.
pub fn clean_count(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Missing | Cell::Date(_) => return None,
        Cell::Number(n) => *n,
        Cell::Text(s) => s.replace(',', "").trim().parse::<f64>().ok()?,
    };

    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value + 0.0)
}

/// Apply a cleaner to every cell of a column, preserving order.
pub fn clean_column<T>(cells: &[Cell], cleaner: impl Fn(&Cell) -> Option<T>) -> Vec<Option<T>> {
    cells.iter().map(cleaner).collect()
}
