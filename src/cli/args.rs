//! Command-line arguments and subcommands for `juris-test`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "juris-test",
    version,
    about = "Loads and checks citation test suites for jurisdiction-aware CSL styles."
)]
pub struct RunnerArgs {
    /// Runner configuration file [default: juris-test.yaml, if present].
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Override the configured style.
    #[arg(long, global = true)]
    pub style: Option<PathBuf>,

    /// Override the configured reference library.
    #[arg(long, global = true)]
    pub library: Option<PathBuf>,

    /// Replace the configured suite patterns (repeatable).
    #[arg(long = "suite", global = true)]
    pub suites: Vec<String>,

    /// Override the cache root.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Clone or update the cached locales and style modules.
    Sync {
        /// Fetch and merge copies that are already present.
        #[arg(long)]
        refresh: bool,
    },
    /// List the suite files the configured patterns expand to.
    List,
    /// Load style, library and suites, and report corpus statistics.
    Check,
    /// Print the merged, normalized corpus as YAML.
    Dump,
    /// Show which file a jurisdiction style module resolves to.
    Resolve {
        /// Jurisdiction code, e.g. `us:ca`.
        jurisdiction: String,
        /// Optional style preference suffix.
        preference: Option<String>,
    },
}
