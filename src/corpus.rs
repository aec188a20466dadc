//! Test corpus loading.
//!
//! Suite documents are YAML sequences of `describe` units:
//!
//! ```yaml
//! - describe: "US federal courts"
//!   tests:
//!     - name: "reporter abbreviation"
//!       single:
//!         - id: brown-v-board
//!           locator: 495
//!       abbreviations:
//!         - jurisdiction: us
//!           container-title:
//!             United States Reports: U.S.
//!       expect: "Brown v. Board of Education, 347 U.S. 483, 495 (1954)"
//! ```
//!
//! Documents are folded left to right into one [`Corpus`] (see
//! [`Corpus::merge_unit`] for the override rules) and every test case is
//! normalized after the last document is merged.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::diagnostics::{parse_error_yaml, RunnerError};
use crate::err_msg;

pub mod merge;
pub mod normalize;
pub mod types;

pub use merge::Corpus;
pub use normalize::{normalize_case, DEFAULT_LOCATOR_LABEL};
pub use types::{
    CitationItemRef, CitationItemSet, Expectation, TestCase, TestInput, TestMode, TestSuiteUnit,
};

/// Counts over a loaded corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorpusStats {
    pub units: usize,
    pub runnable: usize,
    pub placeholders: usize,
    pub only: usize,
    pub skip: usize,
}

impl Corpus {
    /// Trims expectations and backfills locator labels on every test case.
    pub fn normalize(&mut self) {
        for unit in self.units_mut() {
            unit.tests.iter_mut().for_each(normalize_case);
        }
    }

    /// True if any runnable test is marked `only`. Placeholders never count.
    pub fn has_only(&self) -> bool {
        self.tests()
            .any(|(_, case)| case.mode() == TestMode::Only && !case.is_placeholder())
    }

    pub fn stats(&self) -> CorpusStats {
        let mut stats = CorpusStats {
            units: self.units().len(),
            ..CorpusStats::default()
        };
        for (_, case) in self.tests() {
            if case.is_placeholder() {
                stats.placeholders += 1;
            } else {
                stats.runnable += 1;
            }
            match case.mode() {
                TestMode::Only => stats.only += 1,
                TestMode::Skip => stats.skip += 1,
                TestMode::Normal => {}
            }
        }
        stats
    }

    /// Serializes the merged corpus back into suite-document form.
    pub fn to_yaml(&self) -> Result<String, RunnerError> {
        serde_yaml::to_string(&self.units().collect::<Vec<_>>())
            .map_err(|e| err_msg!(Configuration, "failed to serialize corpus: {}", e))
    }
}

/// Shorthand for [`TestCorpusLoader::load`].
pub fn load_corpus(paths: &[PathBuf]) -> Result<Corpus, RunnerError> {
    TestCorpusLoader::load(paths)
}

/// Parses suite documents and merges them into one normalized corpus.
#[derive(Debug)]
pub struct TestCorpusLoader;

impl TestCorpusLoader {
    /// Loads, merges and normalizes the given documents in order.
    pub fn load(paths: &[PathBuf]) -> Result<Corpus, RunnerError> {
        if paths.is_empty() {
            return Err(err_msg!(Configuration, "no suites provided")
                .with_help("set `suites` in the config file or pass --suite"));
        }
        let mut corpus = Corpus::new();
        for path in paths {
            let document = Self::load_document(path)?;
            debug!(path = %path.display(), units = document.units().len(), "loaded suite document");
            corpus.merge(document);
        }
        corpus.normalize();
        let stats = corpus.stats();
        info!(
            documents = paths.len(),
            units = stats.units,
            runnable = stats.runnable,
            placeholders = stats.placeholders,
            "test corpus ready"
        );
        Ok(corpus)
    }

    pub fn load_document(path: &Path) -> Result<Corpus, RunnerError> {
        let source = fs::read_to_string(path)
            .map_err(|e| RunnerError::io(format!("failed to read suite '{}'", path.display()), e))?;
        Self::parse_document(path, &source)
    }

    /// Parses one document without normalizing it.
    ///
    /// An empty document contributes no units.
    pub fn parse_document(path: &Path, source: &str) -> Result<Corpus, RunnerError> {
        if source.trim().is_empty() {
            return Ok(Corpus::new());
        }
        let units: Vec<TestSuiteUnit> =
            serde_yaml::from_str(source).map_err(|e| parse_error_yaml(path, source, &e))?;
        Ok(Corpus::from_units(units))
    }
}
