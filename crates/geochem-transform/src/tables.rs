//! Table layouts for extraction and aggregation output.
//!
//! Narrow tables reuse the input's header names so an extracted file can be
//! loaded again with the same schema. Fields the schema leaves unmapped
//! fall back to their semantic name.

use geochem_model::{ColumnMap, Record, SemanticField};

use crate::aggregate::MaxRow;
use crate::normalise::{NORMALISED_COLUMN, Normaliser};
use crate::output::{TextTable, number_cell, text_cell};
use crate::process::ProcessedRecord;

pub const CONVERTED_PPM_COLUMN: &str = "CONVERTED_PPM";
pub const DETECTION_FLAG_COLUMN: &str = "DETECTION_FLAG";

const NARROW_FIELDS: [SemanticField; 10] = [
    SemanticField::SampleId,
    SemanticField::DrillholeId,
    SemanticField::DepthFrom,
    SemanticField::DepthTo,
    SemanticField::Longitude,
    SemanticField::Latitude,
    SemanticField::Element,
    SemanticField::Value,
    SemanticField::Unit,
    SemanticField::MethodCode,
];

fn header(map: &ColumnMap, field: SemanticField) -> String {
    map.get(field).unwrap_or(field.as_str()).to_string()
}

fn narrow_cells(record: &Record) -> Vec<String> {
    vec![
        record.sample_id.clone(),
        text_cell(record.drillhole_id.as_deref()),
        number_cell(record.depth_from),
        number_cell(record.depth_to),
        number_cell(record.longitude),
        number_cell(record.latitude),
        record.element.clone(),
        record.raw_value.clone(),
        text_cell(record.unit.as_deref()),
        text_cell(record.method_code.as_deref()),
    ]
}

/// Extracted readings with the value cell exactly as read.
pub fn narrow_table(records: &[Record], map: &ColumnMap) -> TextTable {
    let headers = NARROW_FIELDS.iter().map(|&field| header(map, field)).collect();
    let mut table = TextTable::new(headers);
    for record in records {
        table.push_row(narrow_cells(record));
    }
    table
}

/// Processed readings: the value cell as read plus ppm and detection flag.
///
/// Keeping the raw value makes processing a processed file idempotent.
pub fn processed_table(records: &[ProcessedRecord], map: &ColumnMap) -> TextTable {
    let mut headers: Vec<String> = NARROW_FIELDS.iter().map(|&field| header(map, field)).collect();
    headers.push(CONVERTED_PPM_COLUMN.to_string());
    headers.push(DETECTION_FLAG_COLUMN.to_string());

    let mut table = TextTable::new(headers);
    for processed in records {
        let mut cells = narrow_cells(&processed.record);
        cells.push(number_cell(processed.ppm));
        cells.push(processed.flag.code().to_string());
        table.push_row(cells);
    }
    table
}

/// Downhole maxima with their normalised values.
///
/// `by_interval` adds the `INTERVAL_FROM` and `INTERVAL_TO` columns.
pub fn max_table(
    rows: &[MaxRow],
    map: &ColumnMap,
    normaliser: &Normaliser,
    by_interval: bool,
) -> TextTable {
    let mut headers = vec![header(map, SemanticField::DrillholeId)];
    if by_interval {
        headers.push("INTERVAL_FROM".to_string());
        headers.push("INTERVAL_TO".to_string());
    }
    headers.extend([
        header(map, SemanticField::SampleId),
        header(map, SemanticField::DepthFrom),
        header(map, SemanticField::DepthTo),
        CONVERTED_PPM_COLUMN.to_string(),
        NORMALISED_COLUMN.to_string(),
        header(map, SemanticField::Longitude),
        header(map, SemanticField::Latitude),
    ]);

    let mut table = TextTable::new(headers);
    for row in rows {
        let record = &row.record;
        let mut cells = vec![row.drillhole_id.clone()];
        if by_interval {
            cells.push(row.interval_from().map(|v| v.to_string()).unwrap_or_default());
            cells.push(row.interval_to().map(|v| v.to_string()).unwrap_or_default());
        }
        cells.extend([
            record.sample_id.clone(),
            number_cell(record.depth_from),
            number_cell(record.depth_to),
            number_cell(record.value),
            number_cell(normaliser.apply(record.value)),
            number_cell(record.longitude),
            number_cell(record.latitude),
        ]);
        table.push_row(cells);
    }
    table
}
