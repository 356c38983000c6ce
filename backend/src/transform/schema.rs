//! Column-name normalization and the alias table.
//!
//! ```text
//! " Pin Code "  →  "pin_code"  →  alias  →  "pincode"
//! "Age 18+"     →  "age_18"    →  alias  →  "age_18_greater"
//! "Remarks"     →  "remarks"   →  (no alias, kept; dropped later)
//! ```
//!
//! Only names change here. Cells are untouched and no column is dropped;
//! projection onto the canonical schema is the reconciler's job.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::RawTable;

static NON_WORD_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w]+").expect("valid non-word pattern"));

/// Lookup from normalized source names to canonical names.
///
/// Resolution is a single step: a name that is not a key passes through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasTable {
    aliases: BTreeMap<String, String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::empty()
            .with_alias("pin_code", "pincode")
            .with_alias("pin", "pincode")
            .with_alias("district_name", "district")
            .with_alias("state_name", "state")
            .with_alias("age_18", "age_18_greater")
            .with_alias("age_18_plus", "age_18_greater")
    }
}

impl AliasTable {
    /// A table with no aliases at all.
    pub fn empty() -> Self {
        Self { aliases: BTreeMap::new() }
    }

    /// Add (or replace) an alias. Both sides are normalized first, so
    /// `with_alias("Pin Code", "pincode")` behaves like `("pin_code", "pincode")`.
    pub fn with_alias(mut self, from: &str, to: &str) -> Self {
        self.aliases.insert(normalize_name(from), normalize_name(to));
        self
    }

    /// Canonical name for an already-normalized name.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Lowercase, underscore-separated form of a raw column name.
///
/// Trim, lowercase, collapse each run of characters other than letters,
/// digits and `_` into one `_`, then strip `_` from both ends.
pub fn normalize_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    NON_WORD_RUN
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Normalize a name and resolve it through the alias table.
pub fn canonical_name(raw: &str, aliases: &AliasTable) -> String {
    let normalized = normalize_name(raw);
    aliases.resolve(&normalized).to_string()
}

/// Rewrite every header of a table in place.
///
/// Two headers may end up with the same name; the first keeps priority when
/// the reconciler looks fields up.
pub fn normalize_table(mut table: RawTable, aliases: &AliasTable) -> RawTable {
    for header in table.headers.iter_mut() {
        *header = canonical_name(header, aliases);
    }

    let mut seen = std::collections::HashSet::new();
    for header in &table.headers {
        if !header.is_empty() && !seen.insert(header.as_str()) {
            tracing::warn!(
                source = %table.provenance,
                column = %header,
                "several columns normalize to the same name; using the first"
            );
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  State Name "), "state_name");
        assert_eq!(normalize_name("Age 0-5"), "age_0_5");
        assert_eq!(normalize_name("Age 18+"), "age_18");
        assert_eq!(normalize_name("__source_file"), "source_file");
        assert_eq!(normalize_name("Pin--Code (PO)"), "pin_code_po");
        assert_eq!(normalize_name("***"), "");
    }

    #[test]
    fn test_aliases() {
        let aliases = AliasTable::default();
        assert_eq!(canonical_name("Pin", &aliases), "pincode");
        assert_eq!(canonical_name("PIN CODE", &aliases), "pincode");
        assert_eq!(canonical_name("District_Name", &aliases), "district");
        assert_eq!(canonical_name("State Name", &aliases), "state");
        assert_eq!(canonical_name("Age 18+", &aliases), "age_18_greater");
        assert_eq!(canonical_name("age_18_plus", &aliases), "age_18_greater");
        assert_eq!(canonical_name("Remarks", &aliases), "remarks");
    }

    #[test]
    fn test_canonical_names_are_fixed_points() {
        let aliases = AliasTable::default();
        for name in ["date", "state", "district", "pincode", "age_0_5", "age_5_17", "age_18_greater"] {
            assert_eq!(canonical_name(name, &aliases), name);
        }
    }

    #[test]
    fn test_custom_alias_is_normalized() {
        let aliases = AliasTable::default().with_alias("Postal Code", "PINCODE");
        assert_eq!(canonical_name("postal-code", &aliases), "pincode");
        assert_eq!(aliases.len(), 7);
    }

    #[test]
    fn test_normalize_table_keeps_cells_and_columns() {
        let mut table = RawTable::new(
            Provenance::new("a.csv", None),
            vec!["State".into(), "Pin".into(), "Remarks".into()],
        );
        table.push_row(vec!["delhi".into(), "110-001".into(), "ok".into()]);

        let table = normalize_table(table, &AliasTable::default());
        assert_eq!(table.headers, vec!["state", "pincode", "remarks"]);
        assert_eq!(table.rows[0][1], "110-001".into());
    }
}
