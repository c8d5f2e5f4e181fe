//! llama-chains - periodic snapshots of the DefiLlama chain ranking table.
//!
//! Each cycle drives a headless Chromium to the chains page, scrolls the
//! virtualized table until every chain has been seen once, and writes the
//! rows to a CSV file. Cycles repeat on a fixed interval.

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
pub mod logging;
pub mod output;
pub mod runner;

pub use config::Config;
pub use error::ScrapeError;
pub use extract::{ChainTable, RowRecord, TableExtractor};
pub use output::save_csv;
pub use runner::{CycleReport, CycleRunner};
