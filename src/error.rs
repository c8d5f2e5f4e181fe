//! Errors that end a scraping cycle.

use std::path::PathBuf;

use thiserror::Error;

use crate::driver::DriverError;
use crate::extract::Phase;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to acquire browser: {0}")]
    Acquire(#[source] DriverError),
    #[error("Total chain count not found: {0}")]
    TotalCountMissing(#[source] DriverError),
    #[error("Total chain count {text:?} is not an integer")]
    TotalCountInvalid { text: String },
    #[error("Browser failure while {phase}: {source}")]
    Driver {
        phase: Phase,
        #[source]
        source: DriverError,
    },
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl ScrapeError {
    pub(crate) fn driver(phase: Phase, source: DriverError) -> Self {
        ScrapeError::Driver { phase, source }
    }
}
