//! Library components of the geochemistry command-line tools.

pub mod config_store;
pub mod logging;
pub mod pipeline;
