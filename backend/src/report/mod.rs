//! Data-quality report.
//!
//! An ordered list of `metric,value` pairs. The first two entries are always
//! `rows_final` and `duplicates_removed`; anything else is appended after
//! them, so readers that only know the first two keep working.

use serde::{Deserialize, Serialize};

/// One report line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub metric: String,
    pub value: u64,
}

/// Metrics describing what a cleaning run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    metrics: Vec<Metric>,
}

impl QualityReport {
    /// Base report from the row counts before and after deduplication.
    pub fn from_counts(rows_before_dedup: usize, rows_after_dedup: usize) -> Self {
        let removed = rows_before_dedup.saturating_sub(rows_after_dedup);
        Self::default()
            .with_metric("rows_final", rows_after_dedup as u64)
            .with_metric("duplicates_removed", removed as u64)
    }

    /// Append a metric. Names are not deduplicated; the first wins in [`get`](Self::get).
    pub fn with_metric(mut self, name: impl Into<String>, value: u64) -> Self {
        self.metrics.push(Metric { metric: name.into(), value });
        self
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.metrics.iter().find(|m| m.metric == name).map(|m| m.value)
    }

    pub fn rows_final(&self) -> u64 {
        self.get("rows_final").unwrap_or(0)
    }

    pub fn duplicates_removed(&self) -> u64 {
        self.get("duplicates_removed").unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Metric> {
        self.metrics.iter()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_counts() {
        let report = QualityReport::from_counts(10, 7);
        assert_eq!(report.rows_final(), 7);
        assert_eq!(report.duplicates_removed(), 3);
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_appended_metrics_keep_base_order() {
        let report = QualityReport::from_counts(3, 3).with_metric("missing_date", 1);
        let names: Vec<_> = report.iter().map(|m| m.metric.clone()).collect();
        assert_eq!(names, vec!["rows_final", "duplicates_removed", "missing_date"]);
        assert_eq!(report.get("missing_date"), Some(1));
        assert_eq!(report.get("unknown"), None);
    }

    #[test]
    fn test_empty_run() {
        let report = QualityReport::from_counts(0, 0);
        assert_eq!(report.rows_final(), 0);
        assert_eq!(report.duplicates_removed(), 0);
    }
}
