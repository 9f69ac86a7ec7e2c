//! Streaming batch reader for long-format survey exports.
//!
//! A [`LongTable`] resolves its columns once when opened and can then be
//! iterated any number of times: every call to [`LongTable::batches`] reopens
//! the file and yields fixed-size batches of [`Record`]s, so downstream
//! stages reduce batch by batch without holding the whole table.
//!
//! # Usage
//!
//! ```ignore
//! use geochem_ingest::{LoadOptions, LongTable};
//!
//! let table = LongTable::open(&path, &columns, LoadOptions::default())?;
//! for batch in table.batches_filtered(&filter)? {
//!     for record in batch? {
//!         // ...
//!     }
//! }
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use csv::StringRecord;
use tracing::{debug, info};

use geochem_model::{ColumnMap, FilterSpec, GeochemError, Record, Result, SemanticField};

use crate::columns::{ResolvedColumns, normalize_header};

/// Default number of rows per batch.
pub const DEFAULT_BATCH_SIZE: usize = 50_000;

/// Which fields a command needs and how the file is chunked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Fields that must be mapped and present in the header.
    pub required: Vec<SemanticField>,

    /// Fields resolved when mapped and present.
    pub optional: Vec<SemanticField>,

    /// Carry unmapped sample metadata columns on each record.
    /// Defaults to false.
    pub carry_metadata: bool,

    /// Rows per batch.
    /// Defaults to 50000.
    pub batch_size: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        let required = vec![SemanticField::SampleId, SemanticField::Element];
        let optional = SemanticField::ALL
            .into_iter()
            .filter(|field| !required.contains(field))
            .collect();
        Self {
            required,
            optional,
            carry_metadata: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl LoadOptions {
    /// Add required fields on top of sample id and element.
    pub fn with_required(mut self, fields: &[SemanticField]) -> Self {
        for &field in fields {
            if !self.required.contains(&field) {
                self.required.push(field);
            }
            self.optional.retain(|optional| *optional != field);
        }
        self
    }

    pub fn with_carry_metadata(mut self, carry: bool) -> Self {
        self.carry_metadata = carry;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }
}

/// A long-format file with its columns resolved.
#[derive(Debug, Clone)]
pub struct LongTable {
    path: PathBuf,
    headers: Vec<String>,
    map: ColumnMap,
    columns: ResolvedColumns,
    batch_size: usize,
}

impl LongTable {
    /// Open `path`, resolve the requested fields and check for data rows.
    pub fn open(path: impl AsRef<Path>, map: &ColumnMap, options: LoadOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = open_reader(&path)?;
        let headers: Vec<String> = reader
            .headers()
            .map_err(|error| csv_error(&path, error))?
            .iter()
            .map(normalize_header)
            .collect();

        let columns = ResolvedColumns::resolve(
            &path,
            &headers,
            map,
            &options.required,
            &options.optional,
            options.carry_metadata,
        )?;

        let mut probe = StringRecord::new();
        let has_rows = reader
            .read_record(&mut probe)
            .map_err(|error| csv_error(&path, error))?;
        if !has_rows {
            return Err(GeochemError::EmptyDataset { path });
        }

        info!(
            path = %path.display(),
            schema = %map.schema(),
            columns = headers.len(),
            carried = columns.carried_headers().len(),
            "opened long table"
        );

        Ok(Self {
            path,
            headers,
            map: map.clone(),
            columns,
            batch_size: options.batch_size.max(1),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn columns(&self) -> &ResolvedColumns {
        &self.columns
    }

    pub fn column_map(&self) -> &ColumnMap {
        &self.map
    }

    /// Header of a resolved field as written in the file.
    pub fn header_for(&self, field: SemanticField) -> Option<&str> {
        self.columns
            .index(field)
            .and_then(|idx| self.headers.get(idx))
            .map(String::as_str)
    }

    /// Every row, in file order.
    pub fn batches(&self) -> Result<RecordBatches> {
        self.batches_filtered(&FilterSpec::default())
    }

    /// Rows admitted by `filter`, in file order.
    ///
    /// The predicate runs on the raw cells before any numeric parsing.
    pub fn batches_filtered(&self, filter: &FilterSpec) -> Result<RecordBatches> {
        if !filter.sample_types().is_empty() {
            self.require(SemanticField::SampleType)?;
        }
        if !filter.drillholes().is_empty() || filter.drillhole_only() {
            self.require(SemanticField::DrillholeId)?;
        }

        Ok(RecordBatches {
            path: self.path.clone(),
            reader: open_reader(&self.path)?,
            columns: self.columns.clone(),
            filter: filter.clone(),
            batch_size: self.batch_size,
            row: StringRecord::new(),
            stats: LoadStats::default(),
            batches: 0,
            started: Instant::now(),
            done: false,
        })
    }

    /// Collect every admitted row into memory.
    pub fn read_filtered(&self, filter: &FilterSpec) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for batch in self.batches_filtered(filter)? {
            records.extend(batch?);
        }
        Ok(records)
    }

    fn require(&self, field: SemanticField) -> Result<()> {
        if self.columns.has(field) {
            return Ok(());
        }
        match self.map.get(field) {
            Some(column) => Err(GeochemError::MissingColumn {
                field,
                column: column.to_string(),
                path: self.path.clone(),
            }),
            None => Err(GeochemError::SchemaMapping {
                field,
                schema: self.map.schema(),
            }),
        }
    }
}

/// Row counters for one pass over a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows_read: usize,
    pub rows_kept: usize,
    /// Rows without a sample id or element code.
    pub rows_skipped: usize,
}

/// Finite iterator of record batches over one pass of a file.
pub struct RecordBatches {
    path: PathBuf,
    reader: csv::Reader<File>,
    columns: ResolvedColumns,
    filter: FilterSpec,
    batch_size: usize,
    row: StringRecord,
    stats: LoadStats,
    batches: usize,
    started: Instant,
    done: bool,
}

impl RecordBatches {
    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    fn next_batch(&mut self) -> Result<Vec<Record>> {
        let mut batch = Vec::with_capacity(self.batch_size.min(4096));
        while batch.len() < self.batch_size {
            let more = self
                .reader
                .read_record(&mut self.row)
                .map_err(|error| csv_error(&self.path, error))?;
            if !more {
                self.done = true;
                break;
            }
            self.stats.rows_read += 1;
            if let Some(record) = self.convert_row() {
                batch.push(record);
            }
        }
        self.stats.rows_kept += batch.len();
        Ok(batch)
    }

    fn convert_row(&mut self) -> Option<Record> {
        let columns = &self.columns;
        let row = &self.row;

        let (Some(sample_id), Some(element)) = (
            columns.identifier(row, SemanticField::SampleId),
            columns.text(row, SemanticField::Element),
        ) else {
            self.stats.rows_skipped += 1;
            return None;
        };
        let drillhole_id = columns.identifier(row, SemanticField::DrillholeId);
        let sample_type = columns.text(row, SemanticField::SampleType);
        if !self
            .filter
            .admits(element, sample_type, drillhole_id.as_deref())
        {
            return None;
        }

        let raw_value = columns.text(row, SemanticField::Value).unwrap_or_default();
        let owned = |field| columns.text(row, field).map(str::to_string);
        Some(Record {
            sample_id,
            drillhole_id,
            element: element.to_string(),
            value: geochem_model::parse_f64(raw_value),
            raw_value: raw_value.to_string(),
            unit: owned(SemanticField::Unit),
            method_code: owned(SemanticField::MethodCode),
            method_description: owned(SemanticField::MethodDescription),
            sample_type: sample_type.map(str::to_string),
            depth_from: columns.number(row, SemanticField::DepthFrom),
            depth_to: columns.number(row, SemanticField::DepthTo),
            longitude: columns.number(row, SemanticField::Longitude),
            latitude: columns.number(row, SemanticField::Latitude),
            carried: columns.carried_values(row),
        })
    }
}

impl Iterator for RecordBatches {
    type Item = Result<Vec<Record>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let batch = match self.next_batch() {
            Ok(batch) => batch,
            Err(error) => {
                self.done = true;
                return Some(Err(error));
            }
        };
        if !batch.is_empty() {
            self.batches += 1;
            debug!(batch = self.batches, rows = batch.len(), "read batch");
        }
        if self.done {
            info!(
                path = %self.path.display(),
                rows_read = self.stats.rows_read,
                rows_kept = self.stats.rows_kept,
                rows_skipped = self.stats.rows_skipped,
                duration_ms = self.started.elapsed().as_millis(),
                "finished pass"
            );
        }
        if batch.is_empty() { None } else { Some(Ok(batch)) }
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|error| GeochemError::from_read(path, error))?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}

fn csv_error(path: &Path, error: csv::Error) -> GeochemError {
    let message = error.to_string();
    match error.into_kind() {
        csv::ErrorKind::Io(source) => GeochemError::from_read(path, source),
        _ => GeochemError::csv(path, message),
    }
}
