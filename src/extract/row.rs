//! Row parsing with per-field defaults.
//!
//! Every field of a row is read independently into a `Result<_, FieldError>`
//! and resolved by [`or_default`], so one unreadable cell never costs the
//! rest of the row.

use thiserror::Error;
use tracing::debug;

use super::table::RowRecord;
use crate::config::TableSelectors;
use crate::driver::{DriverError, PageDriver};

/// Header label of the protocol count column.
pub const PROTOCOLS_HEADER: &str = "Protocols";

/// Header label of the total value locked column.
pub const TVL_HEADER: &str = "TVL";

/// Why a single field could not be read.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("header {0:?} not present")]
    HeaderAbsent(String),
    #[error("row has no column {0}")]
    MissingColumn(usize),
    #[error("no element matches {0:?}")]
    MissingElement(String),
    #[error("lookup failed: {0}")]
    Lookup(#[from] DriverError),
    #[error("{0:?} is not an integer")]
    NotAnInteger(String),
}

/// Column holding the values for `label`.
///
/// Row columns are offset by one from the header controls, so the column is
/// the label's header position plus one.
pub fn header_column(headers: &[String], label: &str) -> Result<usize, FieldError> {
    headers
        .iter()
        .position(|h| h == label)
        .map(|i| i + 1)
        .ok_or_else(|| FieldError::HeaderAbsent(label.to_string()))
}

/// Parse a displayed non-negative integer, ignoring surrounding whitespace.
pub fn parse_count(text: &str) -> Result<u64, FieldError> {
    text.trim()
        .parse()
        .map_err(|_| FieldError::NotAnInteger(text.to_string()))
}

/// Resolve a field read to its value, or to the type's default on failure.
pub fn or_default<T: Default>(field: &str, result: Result<T, FieldError>) -> T {
    result.unwrap_or_else(|e| {
        debug!("Using default {}: {}", field, e);
        T::default()
    })
}

/// Parse one rendered row. Never fails; unreadable fields take their defaults.
pub async fn parse_row<D: PageDriver>(
    driver: &D,
    selectors: &TableSelectors,
    headers: &[String],
    row: &D::Element,
) -> RowRecord {
    let columns = match driver.query_within(row, &selectors.row_columns).await {
        Ok(columns) => columns,
        Err(e) => {
            debug!("Row columns unavailable: {}", e);
            Vec::new()
        }
    };

    let rank = nested_text(driver, &columns, &selectors.rank)
        .await
        .and_then(|text| parse_count(&text));
    let chain_name = nested_text(driver, &columns, &selectors.name).await;
    let protocol_count = column_text(driver, headers, &columns, PROTOCOLS_HEADER)
        .await
        .and_then(|text| parse_count(&text));
    let total_value_locked = column_text(driver, headers, &columns, TVL_HEADER).await;

    RowRecord {
        rank: or_default("rank", rank),
        chain_name: or_default("chain_name", chain_name),
        protocol_count: or_default("protocol_count", protocol_count),
        total_value_locked: or_default("total_value_locked", total_value_locked),
    }
}

/// Text of the first element matching `selector` inside the first column.
async fn nested_text<D: PageDriver>(
    driver: &D,
    columns: &[D::Element],
    selector: &str,
) -> Result<String, FieldError> {
    let first = columns.first().ok_or(FieldError::MissingColumn(0))?;
    let matches = driver.query_within(first, selector).await?;
    let element = matches
        .first()
        .ok_or_else(|| FieldError::MissingElement(selector.to_string()))?;
    Ok(driver.text(element).await?.trim().to_string())
}

/// Text of the column belonging to header `label`.
async fn column_text<D: PageDriver>(
    driver: &D,
    headers: &[String],
    columns: &[D::Element],
    label: &str,
) -> Result<String, FieldError> {
    let index = header_column(headers, label)?;
    let column = columns.get(index).ok_or(FieldError::MissingColumn(index))?;
    Ok(driver.text(column).await?.trim().to_string())
}
