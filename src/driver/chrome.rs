//! Chromium page driver over the DevTools protocol.
//!
//! Uses chromiumoxide to launch a local Chrome/Chromium with one page. When
//! the `browser` feature is disabled the launcher still exists but every
//! launch fails with [`DriverError::Unsupported`].

use async_trait::async_trait;

use super::{DriverError, DriverLauncher, DriverResult, PageDriver};
use crate::config::BrowserEngineConfig;

#[cfg(feature = "browser")]
use std::path::{Path, PathBuf};
#[cfg(feature = "browser")]
use std::time::Duration;

#[cfg(feature = "browser")]
use chromiumoxide::element::Element;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::sync::Mutex;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;
#[cfg(feature = "browser")]
use tracing::{debug, info};

/// Launches local Chrome instances.
pub struct ChromeLauncher {
    config: BrowserEngineConfig,
}

impl ChromeLauncher {
    pub fn new(config: BrowserEngineConfig) -> Self {
        Self { config }
    }
}

#[cfg(feature = "browser")]
impl ChromeLauncher {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    /// Find the Chrome executable: configured path, well-known locations, then PATH.
    fn find_chrome(&self) -> DriverResult<PathBuf> {
        if let Some(ref configured) = self.config.chrome_path {
            if configured.exists() {
                return Ok(configured.clone());
            }
            return Err(DriverError::Launch(format!(
                "configured Chrome path does not exist: {}",
                configured.display()
            )));
        }

        for path in Self::CHROME_PATHS {
            let p = Path::new(path);
            if p.exists() {
                debug!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in [
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(path) = which::which(cmd) {
                debug!("Found Chrome in PATH: {}", path.display());
                return Ok(path);
            }
        }

        Err(DriverError::Launch(
            "Chrome/Chromium not found. Please install it:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or set CHROME_PATH to the executable"
                .to_string(),
        ))
    }

    fn browser_config(&self, chrome: PathBuf, proxy: Option<&str>) -> DriverResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder().chrome_executable(chrome);

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(proxy) = proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        builder
            .build()
            .map_err(|e| DriverError::Launch(format!("Failed to build browser config: {}", e)))
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl DriverLauncher for ChromeLauncher {
    type Driver = ChromeDriver;

    async fn launch(&self, proxy: Option<&str>) -> DriverResult<ChromeDriver> {
        let chrome = self.find_chrome()?;
        info!(
            "Launching browser (headless={}, proxy={})",
            self.config.headless,
            proxy.unwrap_or("none")
        );
        let config = self.browser_config(chrome, proxy)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(DriverError::Launch(format!("Failed to open page: {}", e)));
            }
        };

        Ok(ChromeDriver {
            browser: Mutex::new(Some(browser)),
            page,
            handler: Some(handler_task),
            proxy: proxy.map(str::to_string),
            timeout: Duration::from_secs(self.config.timeout),
        })
    }
}

/// One Chrome process with a single page.
#[cfg(feature = "browser")]
pub struct ChromeDriver {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler: Option<JoinHandle<()>>,
    proxy: Option<String>,
    timeout: Duration,
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageDriver for ChromeDriver {
    type Element = Element;

    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        info!("Navigating to {}", url);
        tokio::time::timeout(self.timeout, self.page.goto(url))
            .await
            .map_err(|_| DriverError::Navigation {
                url: url.to_string(),
                reason: format!("timed out after {}s", self.timeout.as_secs()),
            })?
            .map_err(|e| DriverError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn find_element(&self, selector: &str) -> DriverResult<Element> {
        self.page
            .find_element(selector)
            .await
            .map_err(|e| DriverError::NotFound(format!("{} ({})", selector, e)))
    }

    async fn query(&self, selector: &str) -> DriverResult<Vec<Element>> {
        Ok(self.page.find_elements(selector).await?)
    }

    async fn query_within(&self, root: &Element, selector: &str) -> DriverResult<Vec<Element>> {
        Ok(root.find_elements(selector).await?)
    }

    async fn text(&self, element: &Element) -> DriverResult<String> {
        Ok(element.inner_text().await?.unwrap_or_default())
    }

    async fn scroll_into_view(&self, element: &Element) -> DriverResult<()> {
        element.scroll_into_view().await?;
        Ok(())
    }

    async fn execute_script(&mut self, script: &str) -> DriverResult<()> {
        self.page
            .evaluate(script.to_string())
            .await
            .map_err(|e| DriverError::Script(e.to_string()))?;
        Ok(())
    }

    fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    async fn close(&mut self) -> DriverResult<()> {
        let Some(mut browser) = self.browser.get_mut().take() else {
            return Ok(());
        };

        let result = browser.close().await.map(|_| ()).map_err(DriverError::from);
        if let Err(e) = browser.wait().await {
            debug!("Browser process did not exit cleanly: {}", e);
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        result
    }
}

#[cfg(feature = "browser")]
impl Drop for ChromeDriver {
    fn drop(&mut self) {
        // Dropping the Browser kills a still-running child process.
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub enum ChromeDriver {}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl DriverLauncher for ChromeLauncher {
    type Driver = ChromeDriver;

    async fn launch(&self, _proxy: Option<&str>) -> DriverResult<ChromeDriver> {
        let _ = &self.config;
        Err(DriverError::Unsupported)
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl PageDriver for ChromeDriver {
    type Element = ();

    async fn navigate(&mut self, _url: &str) -> DriverResult<()> {
        match *self {}
    }

    async fn find_element(&self, _selector: &str) -> DriverResult<()> {
        match *self {}
    }

    async fn query(&self, _selector: &str) -> DriverResult<Vec<()>> {
        match *self {}
    }

    async fn query_within(&self, _root: &(), _selector: &str) -> DriverResult<Vec<()>> {
        match *self {}
    }

    async fn text(&self, _element: &()) -> DriverResult<String> {
        match *self {}
    }

    async fn scroll_into_view(&self, _element: &()) -> DriverResult<()> {
        match *self {}
    }

    async fn execute_script(&mut self, _script: &str) -> DriverResult<()> {
        match *self {}
    }

    fn proxy(&self) -> Option<&str> {
        match *self {}
    }

    async fn close(&mut self) -> DriverResult<()> {
        match *self {}
    }
}
