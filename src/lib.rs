//! Test-corpus and processor-harness support for jurisdiction-aware CSL styles.
//!
//! Suite documents are discovered ([`discovery`]), merged into one ordered
//! corpus ([`corpus`]) and rendered through an external citation processor
//! driven by [`engine::TestEngine`]. Reference data (locales and jurisdiction
//! style modules) is kept in a local git cache ([`repo_cache`]).

pub use crate::diagnostics::{ErrorType, RunnerError};

pub mod abbreviations;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod diagnostics;
pub mod discovery;
pub mod engine;
pub mod library;
pub mod repo_cache;
pub mod resolver;
pub mod test_harness;
