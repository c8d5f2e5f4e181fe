//! Page driver error types.

use thiserror::Error;

/// Result type for page driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors raised by a [`PageDriver`](super::PageDriver) or its launcher.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Element not found: {0}")]
    NotFound(String),
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("Browser launch failed: {0}")]
    Launch(String),
    #[error("Script execution failed: {0}")]
    Script(String),
    #[error("Browser protocol error: {0}")]
    Protocol(String),
    #[error("Element is no longer attached to the page")]
    Stale,
    #[error("Browser support not compiled. Rebuild with: cargo build --features browser")]
    Unsupported,
}

#[cfg(feature = "browser")]
impl From<chromiumoxide::error::CdpError> for DriverError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        DriverError::Protocol(e.to_string())
    }
}
