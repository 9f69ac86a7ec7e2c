use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use geochem_cli::config_store::{ConfigLocation, edit_config, render_config};
use geochem_cli::pipeline::{
    ConvertOutcome, ConvertRequest, ExtractOutcome, ExtractRequest, MaxDownholeOutcome,
    MaxDownholeRequest, column_names, convert_long_to_wide, element_codes, extract_elements,
    max_downhole, sample_types,
};
use geochem_model::{FilterSpec, UserConfig};
use geochem_transform::ProcessOptions;

use crate::cli::{
    ConvertArgs, ExtractArgs, MaxDownholeArgs, MaxIntervalArgs, ProcessingArgs, SchemaPathArgs,
};

pub fn run_show_config(config: &UserConfig, location: &ConfigLocation) -> Result<()> {
    println!("# {} ({})", location.path.display(), location.source);
    print!("{}", render_config(config)?);
    Ok(())
}

pub fn run_config_path(location: &ConfigLocation) {
    println!("{}", location.path.display());
}

pub fn run_edit_config(location: &ConfigLocation) -> Result<()> {
    edit_config(&location.path)
        .with_context(|| format!("edit configuration {}", location.path.display()))?;
    println!("Configuration saved: {}", location.path.display());
    Ok(())
}

pub fn run_version() {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
}

pub fn run_list_columns(path: &Path) -> Result<Vec<String>> {
    column_names(path)
}

pub fn run_list_sample_types(config: &UserConfig, args: &SchemaPathArgs) -> Result<Vec<String>> {
    sample_types(config, &args.path, args.schema.into())
}

pub fn run_list_elements(config: &UserConfig, args: &SchemaPathArgs) -> Result<Vec<String>> {
    element_codes(config, &args.path, args.schema.into())
}

pub fn run_convert(config: &UserConfig, args: &ConvertArgs) -> Result<ConvertOutcome> {
    let request = ConvertRequest {
        input: args.input.path.clone(),
        schema: args.input.schema.into(),
        filter: FilterSpec::new(
            args.elements.iter().cloned(),
            args.sample_types.iter().cloned(),
            args.drillholes.iter().cloned(),
            args.drillhole_only,
        ),
        include_units: args.add_units,
        include_methods: args.add_methods,
        method_map: args.method_map.clone(),
        out_dir: args.out_dir.clone(),
    };
    let span = info_span!("convert-long-to-wide", input = %request.input.display());
    let _guard = span.enter();
    let start = Instant::now();
    let outcome = convert_long_to_wide(config, &request)?;
    info!(
        rows_read = outcome.stats.rows_read,
        rows_kept = outcome.stats.rows_kept,
        samples = outcome.samples,
        elements = outcome.elements,
        duration_ms = start.elapsed().as_millis(),
        "convert complete"
    );
    Ok(outcome)
}

pub fn run_extract(config: &UserConfig, args: &ExtractArgs) -> Result<ExtractOutcome> {
    let request = ExtractRequest {
        input: args.input.path.clone(),
        schema: args.input.schema.into(),
        elements: args.elements.clone(),
        drillhole_only: args.drillhole_only,
        process: args.process,
        process_options: process_options(&args.processing),
        out_dir: args.out_dir.clone(),
    };
    let span = info_span!("extract-element", input = %request.input.display());
    let _guard = span.enter();
    let start = Instant::now();
    let outcome = extract_elements(config, &request)?;
    info!(
        rows_read = outcome.stats.rows_read,
        rows_kept = outcome.stats.rows_kept,
        files = outcome.files.len(),
        duration_ms = start.elapsed().as_millis(),
        "extract complete"
    );
    Ok(outcome)
}

pub fn run_max_downhole(config: &UserConfig, args: &MaxDownholeArgs) -> Result<MaxDownholeOutcome> {
    run_max(config, max_request(args, None))
}

pub fn run_max_intervals(
    config: &UserConfig,
    args: &MaxIntervalArgs,
) -> Result<MaxDownholeOutcome> {
    run_max(config, max_request(&args.downhole, Some(args.interval)))
}

fn run_max(config: &UserConfig, request: MaxDownholeRequest) -> Result<MaxDownholeOutcome> {
    let span = info_span!(
        "max-downhole",
        input = %request.input.display(),
        element = %request.element
    );
    let _guard = span.enter();
    let start = Instant::now();
    let outcome = max_downhole(config, &request)?;
    info!(
        rows_read = outcome.stats.rows_read,
        rows_kept = outcome.stats.rows_kept,
        rows = outcome.rows,
        duration_ms = start.elapsed().as_millis(),
        "downhole maxima complete"
    );
    Ok(outcome)
}

fn max_request(args: &MaxDownholeArgs, interval: Option<i64>) -> MaxDownholeRequest {
    MaxDownholeRequest {
        input: args.input.path.clone(),
        schema: args.input.schema.into(),
        element: args.element.clone(),
        interval,
        process_options: process_options(&args.processing),
        out_dir: args.out_dir.clone(),
    }
}

fn process_options(args: &ProcessingArgs) -> ProcessOptions {
    ProcessOptions {
        dash_bdl: args.dash_bdl,
    }
}
