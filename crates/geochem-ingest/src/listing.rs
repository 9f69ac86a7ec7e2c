//! Metadata listing through lazy polars scans.
//!
//! Listings touch at most one column of the file, so they go through a lazy
//! scan with every column read as text instead of the record reader.

use std::collections::BTreeSet;
use std::path::Path;

use polars::prelude::*;

use geochem_model::{ColumnMap, GeochemError, Result, SemanticField};

use crate::columns::normalize_header;

/// Header names in file order.
pub fn list_columns(path: &Path) -> Result<Vec<String>> {
    let mut lf = scan(path)?;
    let schema = lf.collect_schema().map_err(frame_error)?;
    Ok(schema
        .iter_names()
        .map(|name| normalize_header(name.as_str()))
        .collect())
}

/// Sorted distinct non-blank values of the column mapped to `field`.
pub fn list_distinct(path: &Path, map: &ColumnMap, field: SemanticField) -> Result<Vec<String>> {
    let column = map.resolve(field)?;
    let headers = list_columns(path)?;
    let Some(raw) = raw_header(path, &headers, column)? else {
        return Err(GeochemError::MissingColumn {
            field,
            column: column.to_string(),
            path: path.to_path_buf(),
        });
    };

    let df = scan(path)?
        .select([col(raw.as_str()).drop_nulls().unique_stable()])
        .collect()
        .map_err(frame_error)?;
    let values = df
        .column(raw.as_str())
        .map_err(frame_error)?
        .str()
        .map_err(frame_error)?;

    let distinct: BTreeSet<String> = values
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();
    tracing::debug!(field = %field, column, values = distinct.len(), "listed distinct values");
    Ok(distinct.into_iter().collect())
}

/// Header as polars sees it, matching `column` exactly or case-insensitively.
fn raw_header(path: &Path, headers: &[String], column: &str) -> Result<Option<String>> {
    let position = headers
        .iter()
        .position(|header| header == column)
        .or_else(|| {
            headers
                .iter()
                .position(|header| header.eq_ignore_ascii_case(column))
        });
    let Some(position) = position else {
        return Ok(None);
    };
    let mut lf = scan(path)?;
    let schema = lf.collect_schema().map_err(frame_error)?;
    Ok(schema
        .iter_names()
        .nth(position)
        .map(|name| name.to_string()))
}

fn scan(path: &Path) -> Result<LazyFrame> {
    if !path.exists() {
        return Err(GeochemError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let path_str = path.to_string_lossy();
    LazyCsvReader::new(PlPath::new(&path_str))
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()
        .map_err(frame_error)
}

fn frame_error(error: PolarsError) -> GeochemError {
    GeochemError::DataFrame {
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported_before_scanning() {
        let err = list_columns(Path::new("/nonexistent/chem.csv")).unwrap_err();
        assert!(matches!(err, GeochemError::FileNotFound { .. }));
    }
}
