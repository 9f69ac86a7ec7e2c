//! Filter engine.
//!
//! Filters are a pure conjunction of membership predicates, so the result
//! never depends on evaluation order. Against a file the predicate is pushed
//! into the reader, which evaluates it on raw cells before any parsing; in
//! memory it is a single retaining pass.

use tracing::debug;

use geochem_ingest::{LongTable, RecordBatches};
use geochem_model::{FilterSpec, GeochemError, Record, Result};

/// Rows of `records` admitted by `spec`, in input order.
pub fn filter(records: Vec<Record>, spec: &FilterSpec) -> Vec<Record> {
    if spec.is_unrestricted() {
        return records;
    }
    let mut records = records;
    filter_batch(&mut records, spec);
    records
}

/// Drop rows of `batch` that `spec` rejects.
pub fn filter_batch(batch: &mut Vec<Record>, spec: &FilterSpec) {
    if !spec.is_unrestricted() {
        batch.retain(|record| spec.matches(record));
    }
}

/// Stream the rows of `table` admitted by `spec`.
pub fn scan(table: &LongTable, spec: &FilterSpec) -> Result<RecordBatches> {
    debug!(
        elements = spec.elements().len(),
        sample_types = spec.sample_types().len(),
        drillholes = spec.drillholes().len(),
        drillhole_only = spec.drillhole_only(),
        "applying filters"
    );
    table.batches_filtered(spec)
}

/// Fail with `NoMatchingData` when a filtered pass produced nothing.
pub fn ensure_matches(rows: usize, command: &str) -> Result<()> {
    if rows == 0 {
        return Err(GeochemError::NoMatchingData {
            command: command.to_string(),
        });
    }
    Ok(())
}
