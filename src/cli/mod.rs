//! Command-line interface for llama-chains.

mod commands;

pub use commands::{run, Cli};
