//! Geochemical survey command-line tools.

use clap::{ColorChoice, Parser};
use geochem_cli::config_store::{ConfigLocation, load_config, resolve_config_path};
use geochem_cli::logging::{LogConfig, LogFormat, init_logging};
use geochem_model::UserConfig;
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{
    run_config_path, run_convert, run_edit_config, run_extract, run_list_columns,
    run_list_elements, run_list_sample_types, run_max_downhole, run_max_intervals,
    run_show_config, run_version,
};
use crate::summary::{
    print_convert_summary, print_extract_summary, print_max_summary, print_values,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if matches!(cli.command, Command::Version) {
        run_version();
        return Ok(());
    }
    let location = resolve_config_path(cli.config.as_deref())?;
    match &cli.command {
        Command::ConfigPath => {
            run_config_path(&location);
            return Ok(());
        }
        Command::EditConfig => return run_edit_config(&location),
        _ => {}
    }

    // Loaded once; every command borrows it.
    let config = load_config(&location.path)?;
    dispatch(cli, &config, &location)
}

fn dispatch(cli: &Cli, config: &UserConfig, location: &ConfigLocation) -> anyhow::Result<()> {
    match &cli.command {
        Command::ShowConfig => run_show_config(config, location)?,
        Command::ListColumns(args) => print_values(&run_list_columns(&args.path)?),
        Command::ListSampleTypes(args) => print_values(&run_list_sample_types(config, args)?),
        Command::ListElements(args) => print_values(&run_list_elements(config, args)?),
        Command::ConvertLongToWide(args) => print_convert_summary(&run_convert(config, args)?),
        Command::ExtractElement(args) => print_extract_summary(&run_extract(config, args)?),
        Command::PlotMaxDownhole(args) => print_max_summary(&run_max_downhole(config, args)?),
        Command::PlotMaxDownholeIntervals(args) => {
            print_max_summary(&run_max_intervals(config, args)?);
        }
        Command::ConfigPath | Command::EditConfig | Command::Version => {}
    }
    Ok(())
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
