//! Page driver capability consumed by the table extractor.
//!
//! A [`PageDriver`] is a single browser page: it navigates, answers DOM
//! queries and runs scripts. A [`DriverLauncher`] creates drivers, optionally
//! routed through a proxy, and [`acquire`] applies the proxy fallback policy.
//!
//! Lookups that simply match nothing are not errors: [`PageDriver::query`]
//! returns an empty list. Only [`PageDriver::find_element`] treats absence
//! as [`DriverError::NotFound`].

mod chrome;
mod error;
#[cfg(test)]
pub(crate) mod scripted;

pub use chrome::{ChromeDriver, ChromeLauncher};
pub use error::{DriverError, DriverResult};

use async_trait::async_trait;
use tracing::{error, info};

/// A live browser page.
#[async_trait]
pub trait PageDriver: Send {
    /// Handle to an element on the current page.
    type Element: Send + Sync;

    /// Load `url` in the page.
    async fn navigate(&mut self, url: &str) -> DriverResult<()>;

    /// Find the first element matching `selector`.
    async fn find_element(&self, selector: &str) -> DriverResult<Self::Element>;

    /// Find every element matching `selector` on the page.
    async fn query(&self, selector: &str) -> DriverResult<Vec<Self::Element>>;

    /// Find every element matching `selector` below `root`.
    async fn query_within(
        &self,
        root: &Self::Element,
        selector: &str,
    ) -> DriverResult<Vec<Self::Element>>;

    /// Rendered text of an element.
    async fn text(&self, element: &Self::Element) -> DriverResult<String>;

    async fn scroll_into_view(&self, element: &Self::Element) -> DriverResult<()>;

    /// Evaluate a script against the page, discarding its result.
    async fn execute_script(&mut self, script: &str) -> DriverResult<()>;

    /// Proxy this driver routes its traffic through, if any.
    fn proxy(&self) -> Option<&str>;

    /// Shut the browser down. Calling it twice is harmless.
    async fn close(&mut self) -> DriverResult<()>;
}

/// Creates page drivers.
#[async_trait]
pub trait DriverLauncher: Send + Sync {
    type Driver: PageDriver;

    async fn launch(&self, proxy: Option<&str>) -> DriverResult<Self::Driver>;
}

/// Acquire a driver, falling back to a direct connection when the proxy
/// cannot reach `probe_url`.
///
/// With a proxy configured the new driver performs a trial navigation to
/// `probe_url`. If that navigation fails the driver is closed and exactly
/// one more driver is launched without a proxy. Launch errors propagate.
pub async fn acquire<L: DriverLauncher>(
    launcher: &L,
    proxy: Option<&str>,
    probe_url: &str,
) -> DriverResult<L::Driver> {
    let Some(proxy) = proxy else {
        return launcher.launch(None).await;
    };

    let mut driver = launcher.launch(Some(proxy)).await?;
    match driver.navigate(probe_url).await {
        Ok(()) => {
            info!("Proxy is working");
            Ok(driver)
        }
        Err(e) => {
            error!("Proxy is not working: {}", e);
            if let Err(close_err) = driver.close().await {
                tracing::warn!("Failed to close proxied browser: {}", close_err);
            }
            info!("Initializing browser without proxy");
            launcher.launch(None).await
        }
    }
}
