//! Data model for geochemical survey exports.
//!
//! Shared by the ingest, transform and command-line crates: the closed set of
//! semantic fields, schema tags and their column resolver, long-format
//! records, filter specifications, the user configuration document and the
//! common error type.

pub mod config;
pub mod error;
pub mod field;
pub mod filter;
pub mod record;
pub mod schema;

pub use config::{ColumnSettings, DEFAULT_PROJECTION, MapExtent, Place, UserConfig};
pub use error::{GeochemError, Result};
pub use field::SemanticField;
pub use filter::FilterSpec;
pub use record::{Record, format_numeric, normalize_identifier, parse_f64};
pub use schema::{ColumnMap, SchemaTag};
