//! Command pipelines: load, filter, transform and write.
//!
//! Each entry point takes the user configuration by reference and wraps
//! lower-level errors with the command, file and schema they came from.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, info_span};

use geochem_ingest::{LoadOptions, LoadStats, LongTable, list_columns, list_distinct};
use geochem_model::{ColumnMap, FilterSpec, SchemaTag, SemanticField, UserConfig};
use geochem_transform::{
    Extractor, MaxAccumulator, MethodLookup, Normaliser, ProcessOptions, WideAccumulator,
    WideOptions, ensure_matches, max_table, narrow_table, process, process_record,
    processed_table, scan,
};

pub const CONVERT_COMMAND: &str = "convert-long-to-wide";
pub const EXTRACT_COMMAND: &str = "extract-element";
pub const MAX_DOWNHOLE_COMMAND: &str = "plot-max-downhole";
pub const MAX_INTERVALS_COMMAND: &str = "plot-max-downhole-intervals";

pub const WIDE_DATA_FILE: &str = "wide_data.csv";
pub const WIDE_METHODS_FILE: &str = "wide_methods.csv";

/// Output directory for `input`: `out_dir` when given, else the input's folder.
pub fn output_dir(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
    }
}

fn prepare_output_dir(input: &Path, out_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = output_dir(input, out_dir);
    fs::create_dir_all(&dir)
        .with_context(|| format!("create output directory {}", dir.display()))?;
    Ok(dir)
}

fn open_table(
    command: &str,
    input: &Path,
    map: &ColumnMap,
    options: LoadOptions,
) -> Result<LongTable> {
    LongTable::open(input, map, options).with_context(|| {
        format!(
            "{command}: failed to load {} (schema {})",
            input.display(),
            map.schema()
        )
    })
}

// ============================================================================
// convert-long-to-wide
// ============================================================================

#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub input: PathBuf,
    pub schema: SchemaTag,
    pub filter: FilterSpec,
    pub include_units: bool,
    pub include_methods: bool,
    /// Optional method code lookup table.
    pub method_map: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    pub wide_data: PathBuf,
    pub wide_methods: Option<PathBuf>,
    pub stats: LoadStats,
    pub samples: usize,
    pub elements: usize,
}

/// Pivot the long table into one row per sample.
pub fn convert_long_to_wide(config: &UserConfig, request: &ConvertRequest) -> Result<ConvertOutcome> {
    let span = info_span!(
        "convert",
        input = %request.input.display(),
        schema = %request.schema
    );
    let _guard = span.enter();

    let map = ColumnMap::for_schema(request.schema, config);
    let mut required = vec![SemanticField::Value];
    if request.include_units {
        required.push(SemanticField::Unit);
    }
    if request.include_methods {
        required.push(SemanticField::MethodCode);
    }
    let table = open_table(
        CONVERT_COMMAND,
        &request.input,
        &map,
        LoadOptions::default()
            .with_required(&required)
            .with_carry_metadata(true),
    )?;

    // Read the lookup before the pass so a bad path fails fast.
    let lookup = request
        .method_map
        .as_deref()
        .map(MethodLookup::from_path)
        .transpose()
        .context("load method lookup")?;

    let sample_header = table
        .header_for(SemanticField::SampleId)
        .unwrap_or(SemanticField::SampleId.as_str())
        .to_string();
    let options = WideOptions::new(request.include_units, request.include_methods)
        .with_layout(sample_header, table.columns().carried_headers().to_vec());
    let mut accumulator = WideAccumulator::new(options);

    let mut batches = scan(&table, &request.filter)
        .with_context(|| format!("{CONVERT_COMMAND}: schema {}", request.schema))?;
    for batch in &mut batches {
        let batch = batch.with_context(|| format!("read {}", request.input.display()))?;
        accumulator
            .push_batch(batch)
            .with_context(|| format!("{CONVERT_COMMAND}: reshape {}", request.input.display()))?;
    }
    let stats = batches.stats();
    ensure_matches(accumulator.readings(), CONVERT_COMMAND)?;

    let wide = accumulator.finish();
    let dir = prepare_output_dir(&request.input, request.out_dir.as_deref())?;

    let wide_data = dir.join(WIDE_DATA_FILE);
    wide.to_text().write_csv(&wide_data)?;
    debug!(path = %wide_data.display(), "wrote wide table");

    let wide_methods = if request.include_methods {
        let path = dir.join(WIDE_METHODS_FILE);
        wide.methods_table(lookup.as_ref()).write_csv(&path)?;
        debug!(path = %path.display(), "wrote method table");
        Some(path)
    } else {
        None
    };

    Ok(ConvertOutcome {
        wide_data,
        wide_methods,
        stats,
        samples: wide.len(),
        elements: wide.elements().len(),
    })
}

// ============================================================================
// extract-element
// ============================================================================

#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub input: PathBuf,
    pub schema: SchemaTag,
    pub elements: Vec<String>,
    pub drillhole_only: bool,
    /// Convert values to ppm and flag detection limits.
    pub process: bool,
    pub process_options: ProcessOptions,
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub element: String,
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct ExtractOutcome {
    pub files: Vec<ExtractedFile>,
    pub stats: LoadStats,
}

/// Write one narrow file per requested element.
///
/// Elements without rows still get a header-only file.
pub fn extract_elements(config: &UserConfig, request: &ExtractRequest) -> Result<ExtractOutcome> {
    let span = info_span!(
        "extract",
        input = %request.input.display(),
        schema = %request.schema
    );
    let _guard = span.enter();

    let mut extractor = Extractor::new(request.elements.iter().cloned(), request.drillhole_only);
    let spec = extractor.filter_spec();
    if spec.elements().is_empty() {
        bail!("{EXTRACT_COMMAND}: no elements requested");
    }

    let map = ColumnMap::for_schema(request.schema, config);
    let table = open_table(
        EXTRACT_COMMAND,
        &request.input,
        &map,
        LoadOptions::default().with_required(&[SemanticField::Value]),
    )?;
    let mut batches = scan(&table, &spec)
        .with_context(|| format!("{EXTRACT_COMMAND}: schema {}", request.schema))?;
    for batch in &mut batches {
        let batch = batch.with_context(|| format!("read {}", request.input.display()))?;
        extractor.push_batch(&batch);
    }
    let stats = batches.stats();

    let dir = prepare_output_dir(&request.input, request.out_dir.as_deref())?;
    let mut files = Vec::new();
    for (element, subset) in extractor.finish() {
        let path = dir.join(format!("{element}_processed.csv"));
        let output = if request.process {
            processed_table(&process(subset, request.process_options), &map)
        } else {
            narrow_table(&subset, &map)
        };
        output.write_csv(&path)?;
        debug!(element = %element, path = %path.display(), "wrote element subset");
        files.push(ExtractedFile {
            element,
            path,
            rows: output.len(),
        });
    }

    Ok(ExtractOutcome { files, stats })
}

// ============================================================================
// plot-max-downhole / plot-max-downhole-intervals
// ============================================================================

#[derive(Debug, Clone)]
pub struct MaxDownholeRequest {
    pub input: PathBuf,
    pub schema: SchemaTag,
    pub element: String,
    /// Bucket size in metres; `None` for one maximum per hole.
    pub interval: Option<i64>,
    pub process_options: ProcessOptions,
    pub out_dir: Option<PathBuf>,
}

impl MaxDownholeRequest {
    pub fn command(&self) -> &'static str {
        if self.interval.is_some() {
            MAX_INTERVALS_COMMAND
        } else {
            MAX_DOWNHOLE_COMMAND
        }
    }

    pub fn file_name(&self) -> String {
        match self.interval {
            Some(interval) => format!("max_downhole_{}_{interval}m.csv", self.element),
            None => format!("max_downhole_{}.csv", self.element),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MaxDownholeOutcome {
    pub path: PathBuf,
    pub stats: LoadStats,
    /// Emitted (drillhole, bucket) rows.
    pub rows: usize,
    pub drillholes: usize,
    /// Crustal abundance used for normalisation, if configured.
    pub reference: Option<f64>,
}

/// Maximum processed value of one element per drillhole or downhole interval.
pub fn max_downhole(config: &UserConfig, request: &MaxDownholeRequest) -> Result<MaxDownholeOutcome> {
    let command = request.command();
    let mut accumulator = match request.interval {
        Some(interval) => MaxAccumulator::per_interval(interval)?,
        None => MaxAccumulator::per_hole(),
    };
    let element = request.element.trim();
    if element.is_empty() {
        bail!("{command}: element must not be empty");
    }

    let span = info_span!(
        "max_downhole",
        input = %request.input.display(),
        schema = %request.schema,
        element = %element
    );
    let _guard = span.enter();

    let map = ColumnMap::for_schema(request.schema, config);
    let mut required = vec![SemanticField::Value, SemanticField::DrillholeId];
    if request.interval.is_some() {
        required.push(SemanticField::DepthFrom);
    }
    let table = open_table(
        command,
        &request.input,
        &map,
        LoadOptions::default().with_required(&required),
    )?;

    let spec = FilterSpec::default()
        .with_elements([element])
        .with_drillhole_only(true);
    let mut batches =
        scan(&table, &spec).with_context(|| format!("{command}: schema {}", request.schema))?;
    for batch in &mut batches {
        let batch = batch.with_context(|| format!("read {}", request.input.display()))?;
        for record in batch {
            if let Some(processed) = process_record(record.narrow(), request.process_options) {
                accumulator.push(processed.into_ppm_record());
            }
        }
    }
    let stats = batches.stats();

    let rows = accumulator.finish();
    ensure_matches(rows.len(), command)?;

    let normaliser = Normaliser::new(element, config);
    let output = max_table(&rows, &map, &normaliser, request.interval.is_some());
    let dir = prepare_output_dir(&request.input, request.out_dir.as_deref())?;
    let path = dir.join(request.file_name());
    output.write_csv(&path)?;

    let mut drillholes: Vec<&str> = rows.iter().map(|row| row.drillhole_id.as_str()).collect();
    drillholes.dedup();
    info!(
        element = %element,
        rows = rows.len(),
        drillholes = drillholes.len(),
        path = %path.display(),
        "wrote downhole maxima"
    );

    Ok(MaxDownholeOutcome {
        path,
        stats,
        rows: rows.len(),
        drillholes: drillholes.len(),
        reference: normaliser.reference(),
    })
}

// ============================================================================
// Metadata listing
// ============================================================================

pub fn column_names(input: &Path) -> Result<Vec<String>> {
    list_columns(input).with_context(|| format!("list columns of {}", input.display()))
}

pub fn sample_types(config: &UserConfig, input: &Path, schema: SchemaTag) -> Result<Vec<String>> {
    distinct_values(config, input, schema, SemanticField::SampleType)
}

pub fn element_codes(config: &UserConfig, input: &Path, schema: SchemaTag) -> Result<Vec<String>> {
    distinct_values(config, input, schema, SemanticField::Element)
}

fn distinct_values(
    config: &UserConfig,
    input: &Path,
    schema: SchemaTag,
    field: SemanticField,
) -> Result<Vec<String>> {
    let start = Instant::now();
    let map = ColumnMap::for_schema(schema, config);
    let values = list_distinct(input, &map, field).with_context(|| {
        format!(
            "list {field} values of {} (schema {schema})",
            input.display()
        )
    })?;
    debug!(
        field = %field,
        values = values.len(),
        duration_ms = start.elapsed().as_millis(),
        "listed distinct values"
    );
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dir_defaults_to_input_folder() {
        let input = Path::new("/data/survey/sarig_rs_chem_exp.csv");
        assert_eq!(output_dir(input, None), PathBuf::from("/data/survey"));
        assert_eq!(
            output_dir(input, Some(Path::new("/tmp/out"))),
            PathBuf::from("/tmp/out")
        );
        assert_eq!(output_dir(Path::new("data.csv"), None), PathBuf::from("."));
    }

    #[test]
    fn max_file_names() {
        let mut request = MaxDownholeRequest {
            input: PathBuf::from("data.csv"),
            schema: SchemaTag::Sarig,
            element: "Fe2O3".to_string(),
            interval: None,
            process_options: ProcessOptions::default(),
            out_dir: None,
        };
        assert_eq!(request.file_name(), "max_downhole_Fe2O3.csv");
        assert_eq!(request.command(), MAX_DOWNHOLE_COMMAND);
        request.interval = Some(25);
        assert_eq!(request.file_name(), "max_downhole_Fe2O3_25m.csv");
        assert_eq!(request.command(), MAX_INTERVALS_COMMAND);
    }
}
