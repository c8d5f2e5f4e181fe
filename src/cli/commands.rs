//! CLI commands implementation.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::{normalize_proxy, Config};
use crate::driver::ChromeLauncher;
use crate::logging;
use crate::runner::CycleRunner;

#[derive(Debug, Parser)]
#[command(name = "llama-chains")]
#[command(about = "Periodic snapshots of the DefiLlama chain ranking table")]
#[command(version)]
pub struct Cli {
    /// Config file (TOML)
    #[arg(short, long, global = true, env = "LLAMA_CHAINS_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Page holding the chain table
    #[arg(long, global = true)]
    url: Option<String>,

    /// CSV file to write
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Seconds between scraping cycles
    #[arg(short, long, global = true)]
    interval: Option<u64>,

    /// Proxy server for browser traffic (host:port)
    #[arg(long, global = true, conflicts_with = "no_proxy")]
    proxy: Option<String>,

    /// Ignore any proxy from the environment or config file
    #[arg(long, global = true)]
    no_proxy: bool,

    /// Log file, appended to
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Show the browser window instead of running headless
    #[arg(long, global = true)]
    headed: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Commands {
    /// Scrape on an interval until interrupted (default)
    Run {
        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<usize>,
    },

    /// Scrape once and exit; fails if the cycle fails
    Once,

    /// Print the resolved configuration
    Config,
}

impl Cli {
    /// Resolve configuration: file, then environment, then flags.
    fn resolve_config(&self) -> anyhow::Result<Config> {
        let config = match self.config {
            Some(ref path) => Config::load_from_path(path)?,
            None => Config::default(),
        };
        let config = self.apply_overrides(config.with_env_overrides()?);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(ref url) = self.url {
            config.target_url = url.clone();
        }
        if let Some(ref output) = self.output {
            config.output_path = output.clone();
        }
        if let Some(interval) = self.interval {
            config.download_interval = interval;
        }
        if let Some(ref proxy) = self.proxy {
            config.proxy = normalize_proxy(proxy);
        }
        if self.no_proxy {
            config.proxy = None;
        }
        if let Some(ref log_file) = self.log_file {
            config.log_file = log_file.clone();
        }
        if self.headed {
            config.browser.headless = false;
        }
        config
    }
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    match cli.command.unwrap_or(Commands::Run { cycles: None }) {
        Commands::Run { cycles } => {
            let (_guard, runner) = start(config, cli.verbose)?;
            tokio::select! {
                _ = runner.run(cycles) => {}
                signal = tokio::signal::ctrl_c() => {
                    signal.context("Failed to listen for Ctrl-C")?;
                    info!("Interrupted, shutting down");
                }
            }
        }
        Commands::Once => {
            let (_guard, runner) = start(config, cli.verbose)?;
            let report = runner.run_cycle().await.context("Scraping cycle failed")?;
            info!(
                "Wrote {} chains to {}",
                report.rows,
                report.output_path.display()
            );
        }
        Commands::Config => print!("{}", config.to_toml()?),
    }

    Ok(())
}

/// Install logging and build the runner for a scraping command.
fn start(
    config: Config,
    verbose: bool,
) -> anyhow::Result<(WorkerGuard, CycleRunner<ChromeLauncher>)> {
    let guard = logging::init(&config.log_file, verbose)?;
    info!(
        "Scraping {} into {} every {}s",
        config.target_url,
        config.output_path.display(),
        config.download_interval
    );
    let launcher = ChromeLauncher::new(config.browser.clone());
    Ok((guard, CycleRunner::new(launcher, config)))
}
