//! Loading of long-format geochemical survey exports.
//!
//! [`LongTable`] streams records in restartable batches with the semantic
//! columns resolved once at open time; the `listing` module answers
//! metadata questions (headers, distinct elements or sample types) through
//! lazy polars scans.

pub mod columns;
pub mod listing;
pub mod reader;

pub use columns::ResolvedColumns;
pub use listing::{list_columns, list_distinct};
pub use reader::{DEFAULT_BATCH_SIZE, LoadOptions, LoadStats, LongTable, RecordBatches};
