//! Chain table extraction from the rendered ranking page.
//!
//! The table is a virtualized list: only a window of rows exists in the DOM
//! at a time. [`TableExtractor::extract`] reads the advertised total, then
//! repeatedly collects the visible rows and scrolls further down until it
//! has seen that many distinct ranks.

mod row;
mod table;

pub use row::{
    header_column, or_default, parse_count, parse_row, FieldError, PROTOCOLS_HEADER, TVL_HEADER,
};
pub use table::{ChainTable, RowRecord};

use std::fmt;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{TableSelectors, Timing};
use crate::driver::{DriverError, PageDriver};
use crate::error::ScrapeError;

/// Consecutive passes without a new row between stall warnings.
const STALL_WARNING_PASSES: u32 = 20;

/// Progress of one extraction. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    NotStarted,
    Navigated,
    HeaderDiscovered,
    Accumulating,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::NotStarted => write!(f, "navigating"),
            Phase::Navigated => write!(f, "reading the total count"),
            Phase::HeaderDiscovered => write!(f, "discovering headers"),
            Phase::Accumulating => write!(f, "collecting rows"),
            Phase::Complete => write!(f, "complete"),
        }
    }
}

/// Script scrolling the page down by `distance` pixels.
pub fn scroll_script(distance: u64) -> String {
    format!("window.scrollBy(0, {});", distance)
}

/// Walks the chain table of one page.
#[derive(Debug, Clone, Default)]
pub struct TableExtractor {
    selectors: TableSelectors,
    timing: Timing,
}

impl TableExtractor {
    pub fn new(selectors: TableSelectors, timing: Timing) -> Self {
        Self { selectors, timing }
    }

    /// Extract the whole chain table from `url`.
    ///
    /// Fails if the total count cannot be read or the browser fails outside
    /// a per-field lookup. Loops until the advertised total is reached; a
    /// page that stops yielding new rows keeps it scrolling indefinitely.
    pub async fn extract<D: PageDriver>(
        &self,
        driver: &mut D,
        url: &str,
    ) -> Result<ChainTable, ScrapeError> {
        let mut phase = Phase::NotStarted;

        driver
            .navigate(url)
            .await
            .map_err(|e| ScrapeError::driver(phase, e))?;
        sleep(self.timing.page_settle()).await;
        phase = advance(phase, Phase::Navigated);

        let expected_total = self.read_expected_total(driver).await?;
        info!("Total chains: {}", expected_total);

        let headers = self.discover_headers(driver).await;
        phase = advance(phase, Phase::HeaderDiscovered);
        debug!("Table headers: {:?}", headers);

        phase = advance(phase, Phase::Accumulating);
        let mut table = ChainTable::new();
        let mut stalled_passes = 0u32;

        while (table.len() as u64) < expected_total {
            let rows = self.visible_rows(driver).await;

            let mut added = 0usize;
            for row in &rows {
                let record = parse_row(driver, &self.selectors, &headers, row).await;
                if table.insert(record) {
                    added += 1;
                    info!("Parsed chain #: {} successfully", table.len());
                }
            }

            if added == 0 {
                stalled_passes += 1;
                if stalled_passes % STALL_WARNING_PASSES == 0 {
                    warn!(
                        "No new chains in {} passes ({}/{} collected)",
                        stalled_passes,
                        table.len(),
                        expected_total
                    );
                }
            } else {
                stalled_passes = 0;
            }

            self.scroll_down(driver, rows.len())
                .await
                .map_err(|e| ScrapeError::driver(phase, e))?;
        }

        advance(phase, Phase::Complete);
        info!("Data extraction completed!");
        Ok(table)
    }

    /// Locate the total count, bring it into view and parse it.
    async fn read_expected_total<D: PageDriver>(&self, driver: &D) -> Result<u64, ScrapeError> {
        let element = driver
            .find_element(&self.selectors.total_count)
            .await
            .map_err(ScrapeError::TotalCountMissing)?;
        driver
            .scroll_into_view(&element)
            .await
            .map_err(|e| ScrapeError::driver(Phase::Navigated, e))?;
        sleep(self.timing.total_settle()).await;

        let text = driver
            .text(&element)
            .await
            .map_err(|e| ScrapeError::driver(Phase::Navigated, e))?;
        parse_count(&text).map_err(|_| ScrapeError::TotalCountInvalid {
            text: text.trim().to_string(),
        })
    }

    /// Header labels in display order; empty when they cannot be read.
    async fn discover_headers<D: PageDriver>(&self, driver: &D) -> Vec<String> {
        let result = async {
            let cells = driver.query(&self.selectors.header_cells).await?;
            let mut labels = Vec::with_capacity(cells.len());
            for cell in &cells {
                labels.push(driver.text(cell).await?.trim().to_string());
            }
            Ok::<_, FieldError>(labels)
        }
        .await;

        or_default("headers", result)
    }

    /// Rows currently rendered; empty when the lookup fails.
    async fn visible_rows<D: PageDriver>(&self, driver: &D) -> Vec<D::Element> {
        match driver.query(&self.selectors.rows).await {
            Ok(rows) => rows,
            Err(e) => {
                info!("There is no selector and list of elements is empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Scroll by one step per processed row, then let the list re-render.
    async fn scroll_down<D: PageDriver>(
        &self,
        driver: &mut D,
        rows_processed: usize,
    ) -> Result<(), DriverError> {
        let distance = self.timing.scroll_step * rows_processed as u64;
        driver.execute_script(&scroll_script(distance)).await?;
        sleep(self.timing.scroll_settle()).await;
        Ok(())
    }
}

fn advance(from: Phase, to: Phase) -> Phase {
    debug_assert!(to > from, "extraction phase moved backwards");
    debug!("Extraction phase: {:?} -> {:?}", from, to);
    to
}
