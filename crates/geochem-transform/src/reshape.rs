//! Long-to-wide reshaping.
//!
//! Readings are folded one at a time into a [`WideAccumulator`], keyed by
//! sample and element. When several readings compete for one cell the
//! reduction is order independent:
//!
//! 1. a reading with a value beats one without,
//! 2. the larger value wins,
//! 3. equal values keep the lexicographically smaller method code (then
//!    unit, then method description).
//!
//! Values that cannot be ordered (NaN) raise `ReshapeConflict`.
//!
//! Sample metadata follows the same idea: among the readings of a sample,
//! the carried values with the fewest blanks represent it, and the
//! lexicographically smaller vector breaks ties.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use tracing::info;

use geochem_model::{GeochemError, Record, Result, SemanticField};

use crate::methods::MethodLookup;
use crate::order::IdKey;
use crate::output::{TextTable, number_cell, text_cell};

/// Suffix of unit columns in the wide table.
pub const UNIT_SUFFIX: &str = "_UNIT";

/// What the wide table carries besides element values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideOptions {
    /// Follow each element column with `<EL>_UNIT`.
    pub include_units: bool,
    /// Keep method code and description per cell for the methods table.
    pub include_methods: bool,
    /// Header written for the sample id column.
    pub sample_header: String,
    /// Headers of the sample metadata carried on each record.
    pub carried_headers: Vec<String>,
}

impl Default for WideOptions {
    fn default() -> Self {
        Self {
            include_units: false,
            include_methods: false,
            sample_header: SemanticField::SampleId.as_str().to_string(),
            carried_headers: Vec::new(),
        }
    }
}

impl WideOptions {
    pub fn new(include_units: bool, include_methods: bool) -> Self {
        Self {
            include_units,
            include_methods,
            ..Self::default()
        }
    }

    pub fn with_layout(mut self, sample_header: impl Into<String>, carried: Vec<String>) -> Self {
        self.sample_header = sample_header.into();
        self.carried_headers = carried;
        self
    }
}

/// The reading selected for one (sample, element) cell.
#[derive(Debug, Clone, PartialEq)]
pub struct WideCell {
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub method_code: Option<String>,
    pub method_description: Option<String>,
}

impl WideCell {
    fn from_record(record: Record, options: &WideOptions) -> Self {
        Self {
            value: record.value,
            unit: record.unit.filter(|_| options.include_units),
            method_code: record.method_code,
            method_description: record
                .method_description
                .filter(|_| options.include_methods),
        }
    }

    /// Missing text sorts after any present text.
    fn tie_key(&self) -> [(bool, Option<&str>); 3] {
        [
            self.method_code.as_deref(),
            self.unit.as_deref(),
            self.method_description.as_deref(),
        ]
        .map(|text| (text.is_none(), text))
    }
}

/// Whether `incoming` should replace `current` in a cell.
fn prefer(incoming: &WideCell, current: &WideCell, sample_id: &str, element: &str) -> Result<bool> {
    let by_value = match (incoming.value, current.value) {
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
        (Some(a), Some(b)) => {
            a.partial_cmp(&b)
                .ok_or_else(|| GeochemError::ReshapeConflict {
                    sample_id: sample_id.to_string(),
                    element: element.to_string(),
                })?
        }
    };
    Ok(match by_value {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => incoming.tie_key() < current.tie_key(),
    })
}

fn prefer_carried(incoming: &[String], current: &[String]) -> bool {
    let blanks = |values: &[String]| values.iter().filter(|value| value.is_empty()).count();
    (blanks(incoming), incoming) < (blanks(current), current)
}

#[derive(Debug, Clone)]
struct WideSample {
    carried: Vec<String>,
    cells: BTreeMap<String, WideCell>,
}

/// Batch-wise reducer from long readings to wide rows.
#[derive(Debug, Clone)]
pub struct WideAccumulator {
    options: WideOptions,
    samples: BTreeMap<IdKey, WideSample>,
    elements: BTreeSet<String>,
    readings: usize,
    started: Instant,
}

impl WideAccumulator {
    pub fn new(options: WideOptions) -> Self {
        Self {
            options,
            samples: BTreeMap::new(),
            elements: BTreeSet::new(),
            readings: 0,
            started: Instant::now(),
        }
    }

    /// Fold one reading into its cell.
    pub fn push(&mut self, record: Record) -> Result<()> {
        self.readings += 1;
        let element = record.element.clone();
        let sample = self
            .samples
            .entry(IdKey::new(record.sample_id.clone()))
            .or_insert_with(|| WideSample {
                carried: record.carried.clone(),
                cells: BTreeMap::new(),
            });
        if prefer_carried(&record.carried, &sample.carried) {
            sample.carried.clone_from(&record.carried);
        }
        let sample_id = record.sample_id.clone();
        let incoming = WideCell::from_record(record, &self.options);
        match sample.cells.get_mut(&element) {
            Some(current) => {
                if prefer(&incoming, current, &sample_id, &element)? {
                    *current = incoming;
                }
            }
            None => {
                self.elements.insert(element.clone());
                sample.cells.insert(element, incoming);
            }
        }
        Ok(())
    }

    pub fn push_batch(&mut self, batch: Vec<Record>) -> Result<()> {
        batch.into_iter().try_for_each(|record| self.push(record))
    }

    pub fn readings(&self) -> usize {
        self.readings
    }

    pub fn finish(self) -> WideTable {
        let elements: Vec<String> = self.elements.into_iter().collect();
        let width = self.options.carried_headers.len();
        let rows: Vec<WideRow> = self
            .samples
            .into_iter()
            .map(|(key, mut sample)| {
                sample.carried.resize(width, String::new());
                WideRow {
                    sample_id: key.into_string(),
                    carried: sample.carried,
                    cells: elements
                        .iter()
                        .map(|element| sample.cells.remove(element))
                        .collect(),
                }
            })
            .collect();

        info!(
            readings = self.readings,
            samples = rows.len(),
            elements = elements.len(),
            duration_ms = self.started.elapsed().as_millis(),
            "reshaped to wide"
        );

        WideTable {
            options: self.options,
            elements,
            rows,
        }
    }
}

/// One sample in wide form.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub sample_id: String,
    pub carried: Vec<String>,
    /// One cell per element column, `None` where the sample has no reading.
    pub cells: Vec<Option<WideCell>>,
}

/// Samples × elements, ordered by sample id and element code.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    options: WideOptions,
    elements: Vec<String>,
    rows: Vec<WideRow>,
}

impl WideTable {
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn rows(&self) -> &[WideRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell value for `sample_id` and `element`.
    pub fn value(&self, sample_id: &str, element: &str) -> Option<f64> {
        let column = self.elements.iter().position(|e| e == element)?;
        self.rows
            .iter()
            .find(|row| row.sample_id == sample_id)
            .and_then(|row| row.cells[column].as_ref())
            .and_then(|cell| cell.value)
    }

    /// The numeric wide table: sample id, carried metadata, then each
    /// element (followed by its unit column when requested).
    pub fn to_text(&self) -> TextTable {
        let mut headers = vec![self.options.sample_header.clone()];
        headers.extend(self.options.carried_headers.iter().cloned());
        for element in &self.elements {
            headers.push(element.clone());
            if self.options.include_units {
                headers.push(format!("{element}{UNIT_SUFFIX}"));
            }
        }

        let mut table = TextTable::new(headers);
        for row in &self.rows {
            let mut cells = vec![row.sample_id.clone()];
            cells.extend(row.carried.iter().cloned());
            for cell in &row.cells {
                cells.push(number_cell(cell.as_ref().and_then(|c| c.value)));
                if self.options.include_units {
                    cells.push(text_cell(cell.as_ref().and_then(|c| c.unit.as_deref())));
                }
            }
            table.push_row(cells);
        }
        table
    }

    /// Method traceability table, one row per sample.
    ///
    /// Each element contributes `<EL>_METHOD_CODE` and `<EL>_METHOD_DESC`;
    /// with a lookup also `<EL>_DETERMINATION`, `<EL>_DIGESTION` and
    /// `<EL>_FUSION`.
    pub fn methods_table(&self, lookup: Option<&MethodLookup>) -> TextTable {
        let mut headers = vec![self.options.sample_header.clone()];
        for element in &self.elements {
            headers.push(format!("{element}_METHOD_CODE"));
            headers.push(format!("{element}_METHOD_DESC"));
            if lookup.is_some() {
                headers.push(format!("{element}_DETERMINATION"));
                headers.push(format!("{element}_DIGESTION"));
                headers.push(format!("{element}_FUSION"));
            }
        }

        let mut table = TextTable::new(headers);
        for row in &self.rows {
            let mut cells = vec![row.sample_id.clone()];
            for cell in &row.cells {
                let code = cell.as_ref().and_then(|c| c.method_code.as_deref());
                cells.push(text_cell(code));
                cells.push(text_cell(
                    cell.as_ref().and_then(|c| c.method_description.as_deref()),
                ));
                if let Some(lookup) = lookup {
                    if cell.is_some() {
                        let info = lookup.describe(code);
                        cells.extend([info.determination, info.digestion, info.fusion]);
                    } else {
                        cells.extend([String::new(), String::new(), String::new()]);
                    }
                }
            }
            table.push_row(cells);
        }
        table
    }
}

/// Reshape `records` in one call.
pub fn to_wide(
    records: impl IntoIterator<Item = Record>,
    options: &WideOptions,
) -> Result<WideTable> {
    let mut accumulator = WideAccumulator::new(options.clone());
    for record in records {
        accumulator.push(record)?;
    }
    Ok(accumulator.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(sample: &str, element: &str, value: Option<f64>, method: &str) -> Record {
        Record::reading(sample, element, value)
            .with_method(method)
            .with_unit("ppm")
    }

    #[test]
    fn larger_value_wins_across_methods() {
        let wide = to_wide(
            [
                reading("1", "Cu", Some(5.0), "ICP"),
                reading("1", "Cu", Some(9.0), "XRF"),
            ],
            &WideOptions::default(),
        )
        .unwrap();
        assert_eq!(wide.value("1", "Cu"), Some(9.0));
    }

    #[test]
    fn value_beats_null() {
        for records in [
            [
                reading("1", "Cu", Some(5.0), "ICP"),
                reading("1", "Cu", None, "XRF"),
            ],
            [
                reading("1", "Cu", None, "XRF"),
                reading("1", "Cu", Some(5.0), "ICP"),
            ],
        ] {
            let wide = to_wide(records, &WideOptions::default()).unwrap();
            assert_eq!(wide.value("1", "Cu"), Some(5.0));
        }
    }

    #[test]
    fn equal_values_keep_smaller_method_code() {
        let options = WideOptions::new(false, true);
        let wide = to_wide(
            [
                reading("1", "Cu", Some(5.0), "XRF"),
                reading("1", "Cu", Some(5.0), "ICP"),
            ],
            &options,
        )
        .unwrap();
        let cell = wide.rows()[0].cells[0].as_ref().unwrap();
        assert_eq!(cell.method_code.as_deref(), Some("ICP"));
    }

    #[test]
    fn unorderable_values_conflict() {
        let err = to_wide(
            [
                reading("1", "Cu", Some(f64::NAN), "A"),
                reading("1", "Cu", Some(1.0), "B"),
            ],
            &WideOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GeochemError::ReshapeConflict { .. }));
    }

    #[test]
    fn missing_pairs_are_blank_and_units_interleave() {
        let options = WideOptions::new(true, false);
        let wide = to_wide(
            [
                reading("2", "Cu", Some(3.0), "ICP"),
                reading("1", "Au", Some(0.5), "FA"),
            ],
            &options,
        )
        .unwrap();
        let text = wide.to_text();
        assert_eq!(text.headers(), &["sample_id", "Au", "Au_UNIT", "Cu", "Cu_UNIT"]);
        assert_eq!(text.rows()[0], vec!["1", "0.5", "ppm", "", ""]);
        assert_eq!(text.rows()[1], vec!["2", "", "", "3", "ppm"]);
    }

    #[test]
    fn methods_table_uses_lookup() {
        let lookup = MethodLookup::from_reader(
            "CHEM_METHOD,DETERMINATION_CODE_RD,DIGESTION_CODE_RD,FUSION_TYPE\nICP,ICPMS,4 acid,none\n"
                .as_bytes(),
            std::path::Path::new("methods.csv"),
        )
        .unwrap();
        let mut record = reading("1", "Cu", Some(3.0), "ICP");
        record.method_description = Some("Mass spec".to_string());
        let wide = to_wide(
            [record, reading("2", "Au", Some(1.0), "FA")],
            &WideOptions::new(false, true),
        )
        .unwrap();

        let methods = wide.methods_table(Some(&lookup));
        assert_eq!(methods.headers().len(), 11);
        assert_eq!(methods.headers()[6], "Cu_METHOD_CODE");
        assert_eq!(
            methods.rows()[0],
            vec!["1", "", "", "", "", "", "ICP", "Mass spec", "ICPMS", "4 acid", "none"]
        );
        assert_eq!(&methods.rows()[1][1..6], &["FA", "", "unknown", "unknown", "unknown"]);
    }

    #[test]
    fn carried_metadata_does_not_depend_on_order() {
        let with = |element: &str, carried: &[&str]| {
            let mut record = reading("1", element, Some(1.0), "ICP");
            record.carried = carried.iter().copied().map(String::from).collect();
            record
        };
        let options = WideOptions::default().with_layout(
            "SAMPLE_NO",
            vec!["SAMPLE_SOURCE".to_string(), "DRILLHOLE_NUMBER".to_string()],
        );

        let readings = [
            with("Cu", &["Other", "6363"]),
            with("Au", &["Drill core", "6363"]),
            with("Zn", &["", "6363"]),
        ];
        let forward = to_wide(readings.clone(), &options).unwrap();
        let backward = to_wide(readings.into_iter().rev(), &options).unwrap();
        assert_eq!(forward.rows()[0].carried, vec!["Drill core", "6363"]);
        assert_eq!(backward.rows()[0].carried, forward.rows()[0].carried);
        assert_eq!(
            forward.to_text().headers()[..3],
            ["SAMPLE_NO", "SAMPLE_SOURCE", "DRILLHOLE_NUMBER"]
        );

        // A blank cell loses to any filled one.
        let sparse = to_wide(
            [with("Cu", &["", "6363"]), with("Au", &["Soil", ""]), with("Zn", &["Soil", "6363"])],
            &options,
        )
        .unwrap();
        assert_eq!(sparse.rows()[0].carried, vec!["Soil", "6363"]);
    }
}
