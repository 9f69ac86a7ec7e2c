//! Transformations over long-format geochemical readings.
//!
//! Every stage is a batch-wise reducer so a whole export never needs to be
//! held in memory:
//!
//! - [`engine`]: membership filtering, pushed into the reader when possible
//! - [`reshape`]: long-to-wide pivot with an order-independent collision policy
//! - [`extract`]: one narrow subset per requested element
//! - [`aggregate`]: maximum per drillhole or per downhole interval
//! - [`process`] and [`normalise`]: detection limits, oxide and ppm
//!   conversion, crustal abundance normalisation
//! - [`tables`] and [`output`]: CSV layouts and writers

pub mod aggregate;
pub mod engine;
pub mod extract;
pub mod methods;
pub mod normalise;
pub mod order;
pub mod output;
pub mod process;
pub mod reshape;
pub mod tables;

pub use aggregate::{MaxAccumulator, MaxRow, bucket_index, max_per_hole, max_per_interval};
pub use engine::{ensure_matches, filter, filter_batch, scan};
pub use extract::{Extractor, extract};
pub use methods::{MethodInfo, MethodLookup};
pub use normalise::Normaliser;
pub use output::TextTable;
pub use process::{DetectionFlag, ProcessOptions, ProcessedRecord, process, process_record};
pub use reshape::{WideAccumulator, WideOptions, WideTable, to_wide};
pub use tables::{max_table, narrow_table, processed_table};
