//! A small canonical table covering the capital area and a few towns.

use crate::{source, table::CanonicalTable};

pub const SAMPLE_TABLE_CSV: &str = include_str!("../fixtures/sample_table.csv");

/// Parses [`SAMPLE_TABLE_CSV`].
///
/// # Panics
///
/// Panics if the embedded fixture is malformed.
#[must_use]
pub fn sample_table() -> CanonicalTable {
    source::read_table(SAMPLE_TABLE_CSV.as_bytes(), b',')
        .unwrap_or_else(|e| panic!("Failed to parse sample table fixture: {e}"))
}
