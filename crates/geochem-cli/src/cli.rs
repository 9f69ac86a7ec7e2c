//! CLI argument definitions for the geochemistry tools.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use geochem_model::SchemaTag;

#[derive(Parser)]
#[command(
    name = "geochem-tools",
    version,
    about = "Geochemical survey tools - reshape, extract and aggregate long-format exports",
    long_about = "Wrangle long-format geochemical survey exports.\n\n\
                  Converts one-row-per-analysis tables to one row per sample,\n\
                  extracts single elements and finds downhole maxima."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (overrides GEOCHEM_TOOLS_CONFIG and the platform default).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the active configuration.
    ShowConfig,

    /// Print the configuration file location.
    #[command(alias = "get-config-path")]
    ConfigPath,

    /// Open the configuration file in $VISUAL or $EDITOR.
    EditConfig,

    /// Print the version.
    Version,

    /// List the column headers of a file.
    ListColumns(PathArgs),

    /// List the distinct sample types of a file.
    ListSampleTypes(SchemaPathArgs),

    /// List the distinct element codes of a file.
    ListElements(SchemaPathArgs),

    /// Convert a long-format table to one row per sample.
    ConvertLongToWide(ConvertArgs),

    /// Write one narrow file per element.
    ExtractElement(ExtractArgs),

    /// Maximum value of an element in each drillhole.
    PlotMaxDownhole(MaxDownholeArgs),

    /// Maximum value of an element in each downhole interval.
    PlotMaxDownholeIntervals(MaxIntervalArgs),
}

#[derive(Args)]
pub struct PathArgs {
    /// Input CSV file.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

#[derive(Args)]
pub struct SchemaPathArgs {
    /// Input CSV file.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Input schema.
    #[arg(short = 't', long = "type", value_enum, default_value = "sarig")]
    pub schema: SchemaArg,
}

#[derive(Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub input: SchemaPathArgs,

    /// Elements to keep (comma separated).
    #[arg(short = 'e', long = "elements", value_delimiter = ',', value_name = "CODES")]
    pub elements: Vec<String>,

    /// Sample types to keep (comma separated).
    #[arg(
        short = 's',
        long = "sample-types",
        value_delimiter = ',',
        value_name = "TYPES"
    )]
    pub sample_types: Vec<String>,

    /// Drillhole numbers to keep (comma separated).
    #[arg(short = 'd', long = "drillholes", value_delimiter = ',', value_name = "IDS")]
    pub drillholes: Vec<String>,

    /// Keep drillhole samples only.
    #[arg(long = "dh-only")]
    pub drillhole_only: bool,

    /// Add a unit column after each element.
    #[arg(long = "add-units")]
    pub add_units: bool,

    /// Also write a table of analysis methods per element.
    #[arg(long = "add-methods")]
    pub add_methods: bool,

    /// Method code lookup CSV used with --add-methods.
    #[arg(long = "method-map", value_name = "PATH", requires = "add_methods")]
    pub method_map: Option<PathBuf>,

    /// Output directory (default: the input file's directory).
    #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub input: SchemaPathArgs,

    /// Elements to extract (comma separated or repeated).
    #[arg(
        short = 'e',
        long = "elements",
        value_delimiter = ',',
        value_name = "CODES",
        required = true
    )]
    pub elements: Vec<String>,

    /// Keep drillhole samples only.
    #[arg(long = "dh-only")]
    pub drillhole_only: bool,

    /// Convert values to ppm and add detection flags.
    #[arg(long = "process")]
    pub process: bool,

    #[command(flatten)]
    pub processing: ProcessingArgs,

    /// Output directory (default: the input file's directory).
    #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct ProcessingArgs {
    /// Treat values containing '-' as below detection instead of discarding them.
    #[arg(long = "dash-bdl")]
    pub dash_bdl: bool,
}

#[derive(Args)]
pub struct MaxDownholeArgs {
    #[command(flatten)]
    pub input: SchemaPathArgs,

    /// Element code (oxides are normalised by their base element).
    #[arg(value_name = "ELEMENT")]
    pub element: String,

    #[command(flatten)]
    pub processing: ProcessingArgs,

    /// Output directory (default: the input file's directory).
    #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct MaxIntervalArgs {
    #[command(flatten)]
    pub downhole: MaxDownholeArgs,

    /// Interval size in metres.
    #[arg(value_name = "INTERVAL", allow_negative_numbers = true)]
    pub interval: i64,
}

/// Input schema choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum SchemaArg {
    /// Survey export with the built-in column mapping.
    Sarig,
    /// Any long table mapped through [columns.generic].
    #[value(alias = "gen", alias = "general")]
    Generic,
}

impl From<SchemaArg> for SchemaTag {
    fn from(value: SchemaArg) -> Self {
        match value {
            SchemaArg::Sarig => SchemaTag::Sarig,
            SchemaArg::Generic => SchemaTag::Generic,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn convert_splits_comma_lists() {
        let cli = Cli::try_parse_from([
            "geochem-tools",
            "convert-long-to-wide",
            "data.csv",
            "-e",
            "Cu,Au",
            "-d",
            "6363,6364",
            "--add-units",
        ])
        .unwrap();
        let Command::ConvertLongToWide(args) = cli.command else {
            panic!("expected convert command");
        };
        assert_eq!(args.elements, ["Cu", "Au"]);
        assert_eq!(args.drillholes, ["6363", "6364"]);
        assert!(args.add_units);
        assert!(!args.add_methods);
    }

    #[test]
    fn schema_aliases_parse() {
        let cli = Cli::try_parse_from(["geochem-tools", "list-elements", "data.csv", "-t", "gen"])
            .unwrap();
        let Command::ListElements(args) = cli.command else {
            panic!("expected list-elements");
        };
        assert!(matches!(args.schema, SchemaArg::Generic));
    }

    #[test]
    fn negative_interval_reaches_validation() {
        let cli = Cli::try_parse_from([
            "geochem-tools",
            "plot-max-downhole-intervals",
            "data.csv",
            "Cu",
            "-5",
        ])
        .unwrap();
        let Command::PlotMaxDownholeIntervals(args) = cli.command else {
            panic!("expected interval command");
        };
        assert_eq!(args.interval, -5);
        assert_eq!(args.downhole.element, "Cu");
    }

    #[test]
    fn extract_requires_elements() {
        assert!(Cli::try_parse_from(["geochem-tools", "extract-element", "data.csv"]).is_err());
    }

    #[test]
    fn get_config_path_alias() {
        let cli = Cli::try_parse_from(["geochem-tools", "get-config-path"]).unwrap();
        assert!(matches!(cli.command, Command::ConfigPath));
    }
}
