//! The `juris-test` command-line interface.
//!
//! Loads the runner configuration, applies command-line overrides and
//! dispatches to the subcommand handlers. Errors are rendered with `miette`.

use std::env;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Command, RunnerArgs};
use crate::config::{RunnerConfig, DEFAULT_CONFIG_FILE};
use crate::corpus::{load_corpus, Corpus};
use crate::diagnostics::RunnerError;
use crate::engine::load_style;
use crate::library::ReferenceLibrary;
use crate::repo_cache::{RefSource, RepoCache};
use crate::resolver::StyleModuleResolver;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = RunnerArgs::parse();
    init_logging(args.verbose);

    if let Err(e) = dispatch(&args) {
        eprintln!("{:?}", miette::Report::new(e));
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn dispatch(args: &RunnerArgs) -> Result<(), RunnerError> {
    let config = load_config(args)?;
    match &args.command {
        Command::Sync { refresh } => handle_sync(&config, *refresh),
        Command::List => handle_list(&config),
        Command::Check => handle_check(&config),
        Command::Dump => handle_dump(&config),
        Command::Resolve {
            jurisdiction,
            preference,
        } => handle_resolve(&config, jurisdiction, preference.as_deref()),
    }
}

/// Reads the config file, then layers command-line overrides on top.
///
/// Without `--config`, `juris-test.yaml` is used when present and defaults
/// otherwise. Override paths are taken relative to the working directory.
fn load_config(args: &RunnerArgs) -> Result<RunnerConfig, RunnerError> {
    let mut config = match &args.config {
        Some(path) => RunnerConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            RunnerConfig::load(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => RunnerConfig::default(),
    };

    let cwd = env::current_dir()
        .map_err(|e| RunnerError::io("cannot determine the working directory", e))?;
    if let Some(style) = &args.style {
        config.style = Some(cwd.join(style));
    }
    if let Some(library) = &args.library {
        config.library = Some(cwd.join(library));
    }
    if let Some(cache_dir) = &args.cache_dir {
        config.cache_dir = Some(cwd.join(cache_dir));
    }
    if !args.suites.is_empty() {
        config.suites = args
            .suites
            .iter()
            .map(|pattern| cwd.join(pattern).to_string_lossy().into_owned())
            .collect();
    }
    Ok(config)
}

fn handle_sync(config: &RunnerConfig, refresh: bool) -> Result<(), RunnerError> {
    let cache = RepoCache::from_config(config)?;
    cache.ensure_all(refresh || config.refresh)?;
    output::print_synced(cache.root());
    Ok(())
}

fn handle_list(config: &RunnerConfig) -> Result<(), RunnerError> {
    output::print_paths(&config.suite_files()?);
    Ok(())
}

fn load_suites(config: &RunnerConfig) -> Result<(Vec<PathBuf>, Corpus), RunnerError> {
    let files = config.suite_files()?;
    let corpus = load_corpus(&files)?;
    Ok((files, corpus))
}

fn handle_check(config: &RunnerConfig) -> Result<(), RunnerError> {
    load_style(&config.style_path()?)?;
    let library = ReferenceLibrary::load(&config.library_path()?)?;
    let (files, corpus) = load_suites(config)?;

    for (unit, case) in corpus.tests() {
        let cited = case
            .single
            .iter()
            .chain(case.sequence.iter().flatten())
            .flatten();
        for item in cited {
            if library.get(&item.id).is_none() {
                warn!(unit = %unit.describe, test = %case.name, id = %item.id, "cited item is not in the library");
            }
        }
    }
    output::print_stats(files.len(), &corpus.stats());
    Ok(())
}

fn handle_dump(config: &RunnerConfig) -> Result<(), RunnerError> {
    let (_, corpus) = load_suites(config)?;
    print!("{}", corpus.to_yaml()?);
    Ok(())
}

fn handle_resolve(
    config: &RunnerConfig,
    jurisdiction: &str,
    preference: Option<&str>,
) -> Result<(), RunnerError> {
    let resolver = StyleModuleResolver::new(
        config.jurisdiction_dirs(),
        config.cache_root()?.join(RefSource::StyleModules.dir_name()),
    );
    let located = resolver.locate(jurisdiction, preference);
    let searched: Vec<&Path> = resolver.search_order().collect();
    output::print_resolved(
        &StyleModuleResolver::module_file_name(jurisdiction, preference),
        located.as_ref().map(|(path, _)| path.as_path()),
        &searched,
    );
    Ok(())
}
