//! Group-by-sum summaries over a cleaned enrolment table.
//!
//! The input is whatever the cleaning step wrote (or any table shaped like
//! it): headers are normalized again, `date` and the pincode column are
//! optional, and any subset of the age columns may be present. Missing counts
//! add zero; they never exclude a row.
//!
//! # Output Files
//!
//! | File | Grouping | Order |
//! |------|----------|-------|
//! | `total_per_state.csv` | state | total desc |
//! | `total_per_district.csv` | state, district | total desc |
//! | `total_per_pincode.csv` | state, district, pincode | total desc |
//! | `trend_daily.csv` | date | date asc |
//! | `trend_monthly.csv` | `YYYY-MM` | month asc |
//! | `overall_totals.csv` | whole table | - |

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::config::AggregateConfig;
use crate::error::{AggregateError, AggregateResult};
use crate::logs::{log_info, log_info_indent, log_success};
use crate::models::format_number;
use crate::output::{table_csv, write_files};
use crate::transform::cleaners::parse_day_first;

/// Age columns summed, in output order.
pub const AGE_COLUMNS: [&str; 3] = ["age_0_5", "age_5_17", "age_18_greater"];

/// Recognized names for the pincode column, first match wins.
pub const PINCODE_COLUMNS: [&str; 3] = ["pincode", "pin_code", "pin"];

/// Row-wise sum of the present age columns.
pub const TOTAL_COLUMN: &str = "total_enrolments";

// =============================================================================
// Input frame
// =============================================================================

/// Group key component. Missing keys form their own group, sorted last.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyPart {
    Value(String),
    Missing,
}

impl KeyPart {
    fn from_field(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            KeyPart::Missing
        } else {
            KeyPart::Value(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            KeyPart::Value(v) => v,
            KeyPart::Missing => "",
        }
    }
}

/// The cleaned table, reduced to what the summaries need.
#[derive(Debug, Clone)]
pub struct EnrolmentFrame {
    pub age_columns: Vec<String>,
    pub pincode_column: Option<String>,
    state: Vec<KeyPart>,
    district: Vec<KeyPart>,
    pincode: Option<Vec<KeyPart>>,
    dates: Option<Vec<Option<NaiveDate>>>,
    /// Per row: one value per age column, then the row total
    values: Vec<Vec<f64>>,
}

impl EnrolmentFrame {
    /// Read a cleaned table from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> AggregateResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase().replace(' ', "_"))
            .collect();
        let find = |name: &str| headers.iter().position(|h| h == name);

        let age_idx: Vec<(String, usize)> = AGE_COLUMNS
            .iter()
            .filter_map(|name| find(name).map(|idx| (name.to_string(), idx)))
            .collect();
        if age_idx.is_empty() {
            return Err(AggregateError::NoAgeColumns { expected: AGE_COLUMNS.join(", ") });
        }

        let state_idx = find("state").ok_or_else(|| AggregateError::MissingColumn("state".into()))?;
        let district_idx =
            find("district").ok_or_else(|| AggregateError::MissingColumn("district".into()))?;
        let pincode_idx = PINCODE_COLUMNS
            .iter()
            .find_map(|name| find(name).map(|idx| (name.to_string(), idx)));
        let date_idx = find("date");

        let mut frame = Self {
            age_columns: age_idx.iter().map(|(name, _)| name.clone()).collect(),
            pincode_column: pincode_idx.as_ref().map(|(name, _)| name.clone()),
            state: Vec::new(),
            district: Vec::new(),
            pincode: pincode_idx.as_ref().map(|_| Vec::new()),
            dates: date_idx.map(|_| Vec::new()),
            values: Vec::new(),
        };

        for record in csv_reader.records() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or("");

            frame.state.push(KeyPart::from_field(field(state_idx)));
            frame.district.push(KeyPart::from_field(field(district_idx)));
            if let (Some(keys), Some((_, idx))) = (frame.pincode.as_mut(), pincode_idx.as_ref()) {
                keys.push(KeyPart::from_field(field(*idx)));
            }
            if let (Some(dates), Some(idx)) = (frame.dates.as_mut(), date_idx) {
                dates.push(parse_cleaned_date(field(idx)));
            }

            let mut row: Vec<f64> = age_idx.iter().map(|(_, idx)| parse_count(field(*idx))).collect();
            row.push(row.iter().sum());
            frame.values.push(row);
        }

        Ok(frame)
    }

    /// Read a cleaned table from disk.
    pub fn from_path(path: &Path) -> AggregateResult<Self> {
        let file = std::fs::File::open(path).map_err(|source| AggregateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn has_dates(&self) -> bool {
        self.dates.is_some()
    }

    /// Value column names: the age columns then the total.
    fn value_columns(&self) -> Vec<String> {
        let mut columns = self.age_columns.clone();
        columns.push(TOTAL_COLUMN.to_string());
        columns
    }

    fn group_by<K: Ord>(&self, key: impl Fn(usize) -> Option<K>) -> BTreeMap<K, Vec<f64>> {
        let width = self.age_columns.len() + 1;
        let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
        for (i, row) in self.values.iter().enumerate() {
            let Some(k) = key(i) else { continue };
            let sums = groups.entry(k).or_insert_with(|| vec![0.0; width]);
            for (sum, v) in sums.iter_mut().zip(row) {
                *sum += v;
            }
        }
        groups
    }
}

/// Counts parse leniently; anything that is not a finite number adds zero.
fn parse_count(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn parse_cleaned_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_day_first(trimmed))
}

// =============================================================================
// Summaries
// =============================================================================

/// One grouped row: key values, then sums in `value_columns` order.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub keys: Vec<String>,
    pub values: Vec<f64>,
}

impl SummaryRow {
    /// The row total (last value).
    pub fn total(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }
}

/// A grouped summary ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    pub key_columns: Vec<String>,
    pub value_columns: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Row whose keys equal `keys` (missing keys are `""`).
    pub fn find(&self, keys: &[&str]) -> Option<&SummaryRow> {
        self.rows
            .iter()
            .find(|r| r.keys.iter().map(String::as_str).eq(keys.iter().copied()))
    }

    /// Value of `column` in the row keyed by `keys`.
    pub fn value(&self, keys: &[&str], column: &str) -> Option<f64> {
        let idx = self.value_columns.iter().position(|c| c == column)?;
        self.find(keys).map(|r| r.values[idx])
    }

    fn header(&self) -> Vec<String> {
        self.key_columns.iter().chain(&self.value_columns).cloned().collect()
    }

    fn csv_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                r.keys
                    .iter()
                    .cloned()
                    .chain(r.values.iter().map(|v| format_number(*v)))
                    .collect()
            })
            .collect()
    }

    fn sort_by_total_desc(mut self) -> Self {
        // stable: equal totals keep key order
        self.rows.sort_by(|a, b| b.total().total_cmp(&a.total()));
        self
    }
}

/// Totals over the whole table.
#[derive(Debug, Clone, PartialEq)]
pub struct OverallTotals {
    /// One entry per known age column; `None` when the column is absent
    pub age_totals: Vec<(String, Option<f64>)>,
    pub grand_total: f64,
    pub rows_used: usize,
}

impl OverallTotals {
    fn header(&self) -> Vec<String> {
        let mut header: Vec<String> =
            self.age_totals.iter().map(|(name, _)| format!("{}_total", name)).collect();
        header.push("grand_total_enrolments".to_string());
        header.push("rows_used".to_string());
        header
    }

    fn csv_row(&self) -> Vec<String> {
        let mut row: Vec<String> = self
            .age_totals
            .iter()
            .map(|(_, total)| total.map(format_number).unwrap_or_default())
            .collect();
        row.push(format_number(self.grand_total));
        row.push(self.rows_used.to_string());
        row
    }
}

/// Every summary computed from one frame.
#[derive(Debug, Clone)]
pub struct Summaries {
    pub by_state: SummaryTable,
    pub by_district: SummaryTable,
    pub by_pincode: Option<SummaryTable>,
    pub daily: Option<SummaryTable>,
    pub monthly: Option<SummaryTable>,
    pub overall: OverallTotals,
}

impl Summaries {
    /// `(file name, header, rows)` for every summary that exists.
    pub fn files(&self) -> Vec<(&'static str, Vec<String>, Vec<Vec<String>>)> {
        let mut files = vec![
            ("total_per_state.csv", self.by_state.header(), self.by_state.csv_rows()),
            ("total_per_district.csv", self.by_district.header(), self.by_district.csv_rows()),
        ];
        if let Some(table) = &self.by_pincode {
            files.push(("total_per_pincode.csv", table.header(), table.csv_rows()));
        }
        if let Some(table) = &self.daily {
            files.push(("trend_daily.csv", table.header(), table.csv_rows()));
        }
        if let Some(table) = &self.monthly {
            files.push(("trend_monthly.csv", table.header(), table.csv_rows()));
        }
        files.push(("overall_totals.csv", self.overall.header(), vec![self.overall.csv_row()]));
        files
    }
}

fn to_table<K>(
    key_columns: &[&str],
    value_columns: Vec<String>,
    groups: BTreeMap<K, Vec<f64>>,
    render: impl Fn(K) -> Vec<String>,
) -> SummaryTable {
    SummaryTable {
        key_columns: key_columns.iter().map(|c| c.to_string()).collect(),
        value_columns,
        rows: groups
            .into_iter()
            .map(|(k, values)| SummaryRow { keys: render(k), values })
            .collect(),
    }
}

fn render_parts(parts: Vec<KeyPart>) -> Vec<String> {
    parts.iter().map(|p| p.as_str().to_string()).collect()
}

/// Compute every summary for a frame.
pub fn summarize(frame: &EnrolmentFrame) -> Summaries {
    let columns = frame.value_columns();

    let by_state = to_table(
        &["state"],
        columns.clone(),
        frame.group_by(|i| Some(vec![frame.state[i].clone()])),
        render_parts,
    )
    .sort_by_total_desc();

    let by_district = to_table(
        &["state", "district"],
        columns.clone(),
        frame.group_by(|i| Some(vec![frame.state[i].clone(), frame.district[i].clone()])),
        render_parts,
    )
    .sort_by_total_desc();

    let by_pincode = match (&frame.pincode, &frame.pincode_column) {
        (Some(pins), Some(pin_column)) => Some(
            to_table(
                &["state", "district", pin_column.as_str()],
                columns.clone(),
                frame.group_by(|i| {
                    Some(vec![frame.state[i].clone(), frame.district[i].clone(), pins[i].clone()])
                }),
                render_parts,
            )
            .sort_by_total_desc(),
        ),
        _ => None,
    };

    let daily = frame.dates.as_ref().map(|dates| {
        to_table(&["date"], columns.clone(), frame.group_by(|i| dates[i]), |d: NaiveDate| {
            vec![d.format("%Y-%m-%d").to_string()]
        })
    });

    let monthly = frame.dates.as_ref().map(|dates| {
        to_table(
            &["month"],
            columns.clone(),
            frame.group_by(|i| dates[i].map(|d| d.format("%Y-%m").to_string())),
            |m: String| vec![m],
        )
    });

    let sums = frame.group_by(|_| Some(()));
    let sums = sums.get(&()).cloned().unwrap_or_else(|| vec![0.0; columns.len()]);
    let age_totals = AGE_COLUMNS
        .iter()
        .map(|name| {
            let total = frame.age_columns.iter().position(|c| c == name).map(|idx| sums[idx]);
            (name.to_string(), total)
        })
        .collect();

    Summaries {
        by_state,
        by_district,
        by_pincode,
        daily,
        monthly,
        overall: OverallTotals {
            age_totals,
            grand_total: sums.last().copied().unwrap_or(0.0),
            rows_used: frame.len(),
        },
    }
}

/// Read the cleaned table, compute the summaries and write them.
///
/// Every summary is serialized before the first file is written.
pub fn run_aggregate(config: &AggregateConfig) -> AggregateResult<Summaries> {
    log_info(format!("Reading cleaned table: {}", config.cleaned_path.display()));
    let frame = EnrolmentFrame::from_path(&config.cleaned_path)?;
    log_success(format!(
        "{} rows, age columns: {}",
        frame.len(),
        frame.age_columns.join(", ")
    ));
    if !frame.has_dates() {
        log_info("No date column: daily and monthly trends skipped");
    }

    let summaries = summarize(&frame);

    let mut files: Vec<(PathBuf, Vec<u8>)> = Vec::new();
    for (name, header, rows) in summaries.files() {
        files.push((config.summary_dir.join(name), table_csv(&header, &rows)?));
    }
    write_files(&files)?;
    log_success(format!(
        "{} summaries saved to: {}",
        files.len(),
        config.summary_dir.display()
    ));

    log_highlights(&summaries, config.highlight_rows);
    Ok(summaries)
}

fn log_highlights(summaries: &Summaries, limit: usize) {
    log_info(format!("Top {} states by total enrolments:", limit));
    for row in summaries.by_state.rows.iter().take(limit) {
        log_info_indent(format!("{}: {}", row.keys.join(" / "), format_number(row.total())), 1);
    }

    log_info(format!("Top {} districts by total enrolments:", limit));
    for row in summaries.by_district.rows.iter().take(limit) {
        log_info_indent(format!("{}: {}", row.keys.join(" / "), format_number(row.total())), 1);
    }

    if let Some(daily) = &summaries.daily {
        log_info(format!("Latest {} days:", limit));
        let skip = daily.rows.len().saturating_sub(limit);
        for row in daily.rows.iter().skip(skip) {
            log_info_indent(format!("{}: {}", row.keys.join(" / "), format_number(row.total())), 1);
        }
    }
}
