//! Selectors and pacing for the chain ranking table.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// CSS selectors locating the parts of the chain table.
///
/// The defaults match the class names the ranking page currently renders;
/// they change whenever the site is rebuilt, hence configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TableSelectors {
    /// Element whose text is the total number of chains.
    pub total_count: String,
    /// Header controls, one per column, in display order.
    pub header_cells: String,
    /// Currently rendered rows of the virtualized list.
    pub rows: String,
    /// Columns of a row, relative to the row.
    pub row_columns: String,
    /// Rank inside the first column.
    pub rank: String,
    /// Chain name inside the first column.
    pub name: String,
}

impl Default for TableSelectors {
    fn default() -> Self {
        Self {
            total_count: ".sc-d6729567-2.fIaosP".to_string(),
            header_cells: ":nth-child(1)>div>div>span>button".to_string(),
            rows: "div.sc-5a00cfd2-0.dHYMLV >div:nth-child(2)>div".to_string(),
            row_columns: "div".to_string(),
            rank: r#"[class="sc-f61b72e9-0 iphTVP"] span"#.to_string(),
            name: ".sc-8c920fec-3.dvOTWR".to_string(),
        }
    }
}

/// Settle delays and scroll step used while walking the table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Timing {
    /// Wait after navigation for client-side rendering.
    pub page_settle_ms: u64,
    /// Wait after scrolling the total count into view.
    pub total_settle_ms: u64,
    /// Wait after each scroll step.
    pub scroll_settle_ms: u64,
    /// Pixels scrolled per row processed in a pass.
    pub scroll_step: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            page_settle_ms: 5_000,
            total_settle_ms: 1_000,
            scroll_settle_ms: 500,
            scroll_step: 30,
        }
    }
}

impl Timing {
    /// No waiting at all, same scroll step.
    pub fn immediate() -> Self {
        Self {
            page_settle_ms: 0,
            total_settle_ms: 0,
            scroll_settle_ms: 0,
            ..Self::default()
        }
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }

    pub fn total_settle(&self) -> Duration {
        Duration::from_millis(self.total_settle_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }
}
