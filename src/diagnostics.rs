//! Error types for juris-test.
//!
//! # Overview
//!
//! Every failure the runner can produce is a [`RunnerError`]. The enum derives
//! `miette::Diagnostic`, so the binary renders parse failures with the offending
//! document and a label at the location the YAML/JSON parser reported.
//!
//! # Error Construction
//!
//! - **Use `err_msg!` for message-only errors.**
//!   - `err_msg!(Configuration, "no suites provided")`
//!   - `err_msg!(Render, "unknown output format '{}'", name)`
//!
//! - **Use [`parse_error_yaml`] / [`parse_error_json`] for document errors.**
//!   They keep the document text so the report can point into it.
//!
//! # Propagation
//!
//! Configuration and parse errors are raised while loading, before any test
//! runs. Render errors belong to a single test and never abort the corpus.

use std::path::Path;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

pub type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Type-safe error classification corresponding to [`RunnerError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Missing or invalid style, library entry or suite list
    Configuration,
    /// Malformed suite or library document
    Parse,
    /// Reference-data clone failed after every fallback
    Network,
    /// Filesystem failure outside of document parsing
    Io,
    /// Rendering failed for one test
    Render,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Configuration => "Configuration",
            ErrorType::Parse => "Parse",
            ErrorType::Network => "Network",
            ErrorType::Io => "Io",
            ErrorType::Render => "Render",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unified error type for the runner.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    #[error("Configuration error: {message}")]
    #[diagnostic(code(juris_test::configuration))]
    Configuration {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(juris_test::parse))]
    Parse {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("invalid document")]
        span: Option<SourceSpan>,
    },

    #[error("Network error: {message}")]
    #[diagnostic(
        code(juris_test::network),
        help("check connectivity, or rerun without --refresh to use the cached copy")
    )]
    Network {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("IO error: {message}")]
    #[diagnostic(code(juris_test::io))]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Render error: {message}")]
    #[diagnostic(code(juris_test::render))]
    Render { message: String },
}

impl RunnerError {
    pub fn error_type(&self) -> ErrorType {
        match self {
            RunnerError::Configuration { .. } => ErrorType::Configuration,
            RunnerError::Parse { .. } => ErrorType::Parse,
            RunnerError::Network { .. } => ErrorType::Network,
            RunnerError::Io { .. } => ErrorType::Io,
            RunnerError::Render { .. } => ErrorType::Render,
        }
    }

    /// Attaches a help line to a configuration error. Other variants are returned unchanged.
    pub fn with_help(self, text: impl Into<String>) -> Self {
        match self {
            RunnerError::Configuration { message, .. } => RunnerError::Configuration {
                message,
                help: Some(text.into()),
            },
            other => other,
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        RunnerError::Io {
            message: message.into(),
            source,
        }
    }

    pub fn network(message: impl Into<String>, source: Option<BoxedSource>) -> Self {
        RunnerError::Network {
            message: message.into(),
            source,
        }
    }
}

/// Builds a [`RunnerError::Parse`] from a `serde_yaml` failure, labelling the reported location.
pub fn parse_error_yaml(path: &Path, source: &str, err: &serde_yaml::Error) -> RunnerError {
    let span = err
        .location()
        .filter(|_| !source.is_empty())
        .map(|loc| SourceSpan::from((loc.index().min(source.len() - 1), 1)));
    RunnerError::Parse {
        message: format!("{}: {}", path.display(), err),
        src: NamedSource::new(path.display().to_string(), source.to_string()),
        span,
    }
}

/// Builds a [`RunnerError::Parse`] from a `serde_json` failure.
///
/// `serde_json` reports 1-based line/column pairs; they are converted to a byte
/// offset into `source`.
pub fn parse_error_json(path: &Path, source: &str, err: &serde_json::Error) -> RunnerError {
    let span = offset_of(source, err.line(), err.column())
        .map(|offset| SourceSpan::from((offset, 1)));
    RunnerError::Parse {
        message: format!("{}: {}", path.display(), err),
        src: NamedSource::new(path.display().to_string(), source.to_string()),
        span,
    }
}

fn offset_of(source: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 || source.is_empty() {
        return None;
    }
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    Some((line_start + column.saturating_sub(1)).min(source.len() - 1))
}

/// Constructs a message-only [`RunnerError`] variant with `format!` arguments.
#[macro_export]
macro_rules! err_msg {
    (Configuration, $($arg:tt)+) => {
        $crate::RunnerError::Configuration {
            message: format!($($arg)+),
            help: None,
        }
    };
    (Render, $($arg:tt)+) => {
        $crate::RunnerError::Render {
            message: format!($($arg)+),
        }
    };
}
