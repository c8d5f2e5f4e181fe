//! Tracing setup: console output plus an append-only log file.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the verbosity flag. The returned guard
/// flushes the file writer when dropped and must be held for the lifetime
/// of the process.
pub fn init(log_file: &Path, verbose: bool) -> anyhow::Result<WorkerGuard> {
    let default_filter = if verbose {
        "llama_chains=debug"
    } else {
        "llama_chains=info"
    };

    let directory = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory)?;
    let file_name = log_file
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no file name: {}", log_file.display()))?;

    // rolling::never appends to a single file
    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer())
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()?;

    Ok(guard)
}
