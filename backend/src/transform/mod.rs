//! Transformation module.
//!
//! This module turns raw source tables into the canonical record set:
//! - Schema: Header normalization and aliases
//! - Cleaners: Per-field value cleaning
//! - Reconciler: Union, projection and deduplication
//! - Pipeline: Main cleaning pipeline

pub mod cleaners;
pub mod pipeline;
pub mod reconciler;
pub mod schema;

pub use cleaners::{clean_count, clean_date, clean_pincode, clean_text};
pub use pipeline::*;
pub use reconciler::{dedup, reconcile, unify, Reconciled, UnifiedTable};
pub use schema::{canonical_name, normalize_name, normalize_table, AliasTable};
