//! Scraping cycles and the interval loop around them.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::driver::{self, DriverLauncher, PageDriver};
use crate::error::ScrapeError;
use crate::extract::TableExtractor;
use crate::output::save_csv;

/// Outcome of a successful cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub rows: usize,
    pub output_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Runs acquire → extract → save → release, once or on an interval.
pub struct CycleRunner<L: DriverLauncher> {
    launcher: L,
    config: Config,
    extractor: TableExtractor,
}

impl<L: DriverLauncher> CycleRunner<L> {
    pub fn new(launcher: L, config: Config) -> Self {
        let extractor = TableExtractor::new(config.selectors.clone(), config.timing.clone());
        Self {
            launcher,
            config,
            extractor,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a single cycle with a fresh browser.
    ///
    /// The browser is closed on every path once acquired; a failure to close
    /// it is logged rather than returned.
    pub async fn run_cycle(&self) -> Result<CycleReport, ScrapeError> {
        let started_at = Utc::now();
        let clock = Instant::now();

        let mut driver = driver::acquire(
            &self.launcher,
            self.config.proxy.as_deref(),
            &self.config.target_url,
        )
        .await
        .map_err(ScrapeError::Acquire)?;

        let result = self.scrape(&mut driver).await;
        if let Err(e) = driver.close().await {
            warn!("Failed to close browser: {}", e);
        }
        let rows = result?;

        Ok(CycleReport {
            rows,
            output_path: self.config.output_path.clone(),
            started_at,
            elapsed: clock.elapsed(),
        })
    }

    async fn scrape(&self, driver: &mut L::Driver) -> Result<usize, ScrapeError> {
        let table = self
            .extractor
            .extract(driver, &self.config.target_url)
            .await?;
        save_csv(&self.config.output_path, &table).map_err(|source| ScrapeError::Write {
            path: self.config.output_path.clone(),
            source,
        })?;
        Ok(table.len())
    }

    /// Run cycles separated by the download interval.
    ///
    /// Failed cycles are logged and the loop carries on. `None` runs forever;
    /// `Some(n)` stops after `n` cycles without a trailing sleep.
    pub async fn run(&self, max_cycles: Option<usize>) {
        let mut completed = 0usize;
        loop {
            match self.run_cycle().await {
                Ok(report) => info!(
                    "Cycle started {} wrote {} chains to {} in {:.1}s",
                    report.started_at.format("%Y-%m-%d %H:%M:%S"),
                    report.rows,
                    report.output_path.display(),
                    report.elapsed.as_secs_f64()
                ),
                Err(e) => error!("Error occurred during data extraction: {}", e),
            }

            completed += 1;
            if max_cycles.is_some_and(|max| completed >= max) {
                break;
            }

            info!(
                "Waiting for {} seconds before the next scraping cycle.",
                self.config.download_interval
            );
            tokio::time::sleep(self.config.download_interval()).await;
        }
    }
}
