//! Test-framework bridge.
//!
//! Runs every case of a [`Corpus`] against a [`TestEngine`] and reports the
//! outcome.
//!
//! # Selection
//!
//! - Placeholders (no `expect`) are reported as skipped.
//! - If any runnable case is marked `mode: only`, every other case is skipped.
//! - `mode: skip` cases are skipped.
//! - An optional substring filter (case-insensitive) skips non-matching names.
//!
//! # Comparison
//!
//! Expectations are trimmed; rendered output is compared exactly as the
//! processor returned it. A `sequence` case compares one string per cluster;
//! when its expectation is a single string, the rendered clusters are joined
//! with newlines first.
//!
//! A render error fails only the case that raised it.

use std::io::{self, Write};

use difference::{Changeset, Difference};

use crate::corpus::{Corpus, Expectation, TestCase, TestInput, TestMode};
use crate::engine::{CitationProcessor, TestEngine};

// =============================================================================
// CORE TYPES
// =============================================================================

/// Outcome of one test case.
#[derive(Debug, Clone, PartialEq)]
pub enum TestResult {
    Pass {
        unit: String,
        name: String,
    },
    Fail {
        unit: String,
        name: String,
        error: String,
        expected: Option<String>,
        actual: Option<String>,
    },
    Skipped {
        unit: String,
        name: String,
        reason: String,
    },
}

impl TestResult {
    pub fn name(&self) -> &str {
        match self {
            TestResult::Pass { name, .. }
            | TestResult::Fail { name, .. }
            | TestResult::Skipped { name, .. } => name,
        }
    }
}

/// Configuration for selection and reporting.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub filter: Option<String>,
    pub use_colors: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            filter: None,
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }
}

// Color constants for terminal output
const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";

impl HarnessConfig {
    /// Apply color formatting to text if colors are enabled.
    pub fn colorize(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }
}

// =============================================================================
// SELECTION
// =============================================================================

pub fn skip_reason(case: &TestCase, has_only: bool, filter: Option<&str>) -> Option<String> {
    if case.is_placeholder() {
        return Some("No expectation".to_string());
    }
    if has_only && case.mode() != TestMode::Only {
        return Some("Not marked 'only' in 'only' mode".to_string());
    }
    if case.mode() == TestMode::Skip {
        return Some("Marked 'skip'".to_string());
    }
    if let Some(f) = filter {
        if !case.name.to_lowercase().contains(&f.to_lowercase()) {
            return Some(format!("Filtered out by substring: {}", f));
        }
    }
    None
}

// =============================================================================
// EXECUTION
// =============================================================================

/// Renders one case and compares it with its expectation.
pub fn run_test_case<P: CitationProcessor>(
    engine: &mut TestEngine<P>,
    unit: &str,
    case: &TestCase,
) -> TestResult {
    let fail = |error: String, expected: Option<String>, actual: Option<String>| TestResult::Fail {
        unit: unit.to_string(),
        name: case.name.clone(),
        error,
        expected,
        actual,
    };
    let Some(expect) = &case.expect else {
        return fail("Test has no expectation".to_string(), None, None);
    };

    let format = case.format.as_deref();
    let abbreviations = case.abbreviations.as_deref();
    let rendered = match case.input() {
        Some(TestInput::Single(items)) => engine
            .produce_single(items, format, abbreviations)
            .map(|text| vec![text]),
        Some(TestInput::Sequence(clusters)) => {
            engine.produce_sequence(clusters, format, abbreviations)
        }
        None => return fail("Test has neither 'single' nor 'sequence' input".to_string(), None, None),
    };
    let rendered = match rendered {
        Ok(rendered) => rendered,
        Err(e) => return fail(e.to_string(), None, None),
    };

    let (expected, actual) = match expect {
        Expectation::Text(text) => (text.clone(), rendered.join("\n")),
        Expectation::Sequence(lines) => (lines.join("\n"), rendered.join("\n")),
    };
    let matches = match expect {
        Expectation::Text(text) => text.trim() == actual,
        Expectation::Sequence(lines) => {
            lines.len() == rendered.len()
                && lines.iter().zip(&rendered).all(|(e, a)| e.trim() == a.as_str())
        }
    };
    if matches {
        return TestResult::Pass {
            unit: unit.to_string(),
            name: case.name.clone(),
        };
    }
    fail(
        "Output did not match expected".to_string(),
        Some(expected),
        Some(actual),
    )
}

/// Runs the whole corpus in order against one engine.
pub fn run_corpus<P: CitationProcessor>(
    engine: &mut TestEngine<P>,
    corpus: &Corpus,
    config: &HarnessConfig,
) -> Vec<TestResult> {
    let has_only = corpus.has_only();
    corpus
        .tests()
        .map(|(unit, case)| {
            match skip_reason(case, has_only, config.filter.as_deref()) {
                Some(reason) => TestResult::Skipped {
                    unit: unit.describe.clone(),
                    name: case.name.clone(),
                    reason,
                },
                None => run_test_case(engine, &unit.describe, case),
            }
        })
        .collect()
}

// =============================================================================
// REPORTING
// =============================================================================

/// Returns `(passed, failed, skipped)`.
pub fn partition_results(results: &[TestResult]) -> (usize, usize, usize) {
    let passed = results
        .iter()
        .filter(|r| matches!(r, TestResult::Pass { .. }))
        .count();
    let failed = results
        .iter()
        .filter(|r| matches!(r, TestResult::Fail { .. }))
        .count();
    let skipped = results
        .iter()
        .filter(|r| matches!(r, TestResult::Skipped { .. }))
        .count();
    (passed, failed, skipped)
}

pub fn report_results(
    results: &[TestResult],
    config: &HarnessConfig,
    out: &mut impl Write,
) -> io::Result<()> {
    for r in results {
        match r {
            TestResult::Pass { unit, name } => {
                writeln!(out, "{}: {} [{}]", config.colorize("PASS", GREEN), name, unit)?
            }
            TestResult::Fail { .. } => print_failure(r, config, out)?,
            TestResult::Skipped { unit, name, reason } => writeln!(
                out,
                "{}: {} [{}] ({})",
                config.colorize("SKIP", YELLOW),
                name,
                unit,
                reason
            )?,
        }
    }

    let (passed, failed, skipped) = partition_results(results);
    writeln!(
        out,
        "\nTest summary: total {}, {} {}, {} {}, {} {}",
        results.len(),
        config.colorize("passed", GREEN),
        passed,
        config.colorize("failed", RED),
        failed,
        config.colorize("skipped", YELLOW),
        skipped,
    )?;

    if failed > 0 {
        writeln!(out, "\nFailed tests:")?;
        for r in results {
            if let TestResult::Fail { unit, name, .. } = r {
                writeln!(out, "  - {} [{}]", name, unit)?;
            }
        }
    }
    Ok(())
}

pub fn print_failure(r: &TestResult, config: &HarnessConfig, out: &mut impl Write) -> io::Result<()> {
    let TestResult::Fail {
        unit,
        name,
        error,
        expected,
        actual,
    } = r
    else {
        return Ok(());
    };
    writeln!(out, "{}: {} [{}]", config.colorize("FAIL", RED), name, unit)?;
    writeln!(out, "  Error: {}", error)?;
    if let (Some(expected), Some(actual)) = (expected, actual) {
        writeln!(out, "  Diff:")?;
        print_diff(expected, actual, config, out)?;
    }
    Ok(())
}

/// Line diff of expected against actual output.
pub fn print_diff(
    expected: &str,
    actual: &str,
    config: &HarnessConfig,
    out: &mut impl Write,
) -> io::Result<()> {
    let changeset = Changeset::new(expected.trim(), actual.trim(), "\n");
    for diff in &changeset.diffs {
        match diff {
            Difference::Same(text) => {
                for line in text.lines() {
                    writeln!(out, "    {}", line)?;
                }
            }
            Difference::Rem(text) => {
                for line in text.lines() {
                    writeln!(out, "  - expected: {}", config.colorize(line, GREEN))?;
                }
            }
            Difference::Add(text) => {
                for line in text.lines() {
                    writeln!(out, "  + actual:   {}", config.colorize(line, RED))?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;
    use crate::corpus::{CitationItemRef, TestSuiteUnit};
    use crate::diagnostics::RunnerError;
    use crate::engine::{Citation, EngineSystem, OutputFormat, ProcessorSystem, RenderedCitation};
    use crate::library::ReferenceLibrary;
    use crate::resolver::{LocaleResolver, StyleModuleResolver};

    /// Renders each cluster as the ids it cites.
    struct IdProcessor;

    impl CitationProcessor for IdProcessor {
        fn rebuild_processor_state(
            &mut self,
            sys: &dyn ProcessorSystem,
            citations: &[Citation],
            _format: OutputFormat,
        ) -> Result<Vec<RenderedCitation>, RunnerError> {
            citations
                .iter()
                .map(|c| {
                    for item in &c.items {
                        if sys.retrieve_item(&item.id).is_none() {
                            return Err(crate::err_msg!(Render, "unknown item {}", item.id));
                        }
                    }
                    Ok(RenderedCitation {
                        citation_id: c.citation_id.clone(),
                        note_index: c.note_index,
                        text: c.items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>().join("; "),
                    })
                })
                .collect()
        }
    }

    /// Wraps every cluster in a trailing space.
    struct PaddedProcessor;

    impl CitationProcessor for PaddedProcessor {
        fn rebuild_processor_state(
            &mut self,
            sys: &dyn ProcessorSystem,
            citations: &[Citation],
            format: OutputFormat,
        ) -> Result<Vec<RenderedCitation>, RunnerError> {
            let rendered = IdProcessor.rebuild_processor_state(sys, citations, format)?;
            Ok(rendered
                .into_iter()
                .map(|r| RenderedCitation {
                    text: format!("{} ", r.text),
                    ..r
                })
                .collect())
        }
    }

    fn engine() -> TestEngine<IdProcessor> {
        let library =
            ReferenceLibrary::from_records(vec![json!({"id": "a"}), json!({"id": "b"})]).unwrap();
        let system = EngineSystem::new(
            library,
            LocaleResolver::new(PathBuf::from("/nonexistent")),
            StyleModuleResolver::new(vec![], PathBuf::from("/nonexistent")),
            "en-US",
        );
        TestEngine::from_parts(system, "<style/>".to_string(), |_, _| Ok(IdProcessor)).unwrap()
    }

    fn single(name: &str, id: &str, expect: &str) -> TestCase {
        TestCase::new(name)
            .with_single(vec![CitationItemRef::new(id)])
            .with_expect(expect)
    }

    fn corpus(tests: Vec<TestCase>) -> Corpus {
        let mut unit = TestSuiteUnit::new("suite");
        unit.tests = tests;
        Corpus::from_units(vec![unit])
    }

    fn no_color() -> HarnessConfig {
        HarnessConfig {
            filter: None,
            use_colors: false,
        }
    }

    #[test]
    fn test_pass_fail_and_placeholder() {
        let corpus = corpus(vec![
            single("good", "a", "a"),
            single("bad", "a", "b"),
            TestCase::new("pending"),
            single("broken", "zzz", "zzz"),
        ]);
        let results = run_corpus(&mut engine(), &corpus, &no_color());

        assert!(matches!(results[0], TestResult::Pass { .. }));
        assert!(matches!(results[1], TestResult::Fail { .. }));
        assert!(matches!(&results[2], TestResult::Skipped { reason, .. } if reason == "No expectation"));
        assert!(matches!(&results[3], TestResult::Fail { error, .. } if error.contains("unknown item")));
        assert_eq!(partition_results(&results), (1, 2, 1));
    }

    #[test]
    fn test_only_mode_and_skip() {
        let corpus = corpus(vec![
            single("focused", "a", "a").with_mode(TestMode::Only),
            single("other", "a", "a"),
            single("ignored", "a", "a").with_mode(TestMode::Skip),
        ]);
        let results = run_corpus(&mut engine(), &corpus, &no_color());
        assert_eq!(partition_results(&results), (1, 0, 2));
        assert_eq!(results[0].name(), "focused");
    }

    #[test]
    fn test_only_on_placeholder_has_no_effect() {
        let corpus = corpus(vec![
            single("real", "a", "a"),
            TestCase::new("todo").with_mode(TestMode::Only),
        ]);
        let results = run_corpus(&mut engine(), &corpus, &no_color());
        assert!(matches!(results[0], TestResult::Pass { .. }));
        assert!(matches!(&results[1], TestResult::Skipped { reason, .. } if reason == "No expectation"));
        assert_eq!(partition_results(&results), (1, 0, 1));
    }

    #[test]
    fn test_rendered_whitespace_is_not_trimmed() {
        let corpus = corpus(vec![
            single("padded", "a", "  a  "),
            TestCase::new("padded cluster")
                .with_sequence(vec![vec![CitationItemRef::new("a")]])
                .with_expect(vec![" a "]),
        ]);
        let results = run_corpus(&mut engine(), &corpus, &no_color());
        assert_eq!(partition_results(&results), (2, 0, 0));

        let mut engine = TestEngine::from_parts(engine().system().clone(), "<style/>".to_string(), |_, _| {
            Ok(PaddedProcessor)
        })
        .unwrap();
        let results = run_corpus(&mut engine, &corpus, &no_color());
        assert_eq!(partition_results(&results), (0, 2, 0));
    }

    #[test]
    fn test_filter() {
        let corpus = corpus(vec![single("Court A", "a", "a"), single("Statute", "a", "a")]);
        let config = HarnessConfig {
            filter: Some("court".to_string()),
            use_colors: false,
        };
        let results = run_corpus(&mut engine(), &corpus, &config);
        assert_eq!(partition_results(&results), (1, 0, 1));
    }

    #[test]
    fn test_sequence_expectations() {
        let clusters = vec![vec![CitationItemRef::new("a")], vec![CitationItemRef::new("b")]];
        let corpus = corpus(vec![
            TestCase::new("lines")
                .with_sequence(clusters.clone())
                .with_expect(vec!["a", "b"]),
            TestCase::new("joined")
                .with_sequence(clusters.clone())
                .with_expect("a\nb"),
            TestCase::new("short")
                .with_sequence(clusters)
                .with_expect(vec!["a"]),
        ]);
        let results = run_corpus(&mut engine(), &corpus, &no_color());
        assert_eq!(partition_results(&results), (2, 1, 0));
    }

    #[test]
    fn test_report_lists_failures_with_diff() {
        let results = vec![
            TestResult::Pass {
                unit: "u".to_string(),
                name: "ok".to_string(),
            },
            TestResult::Fail {
                unit: "u".to_string(),
                name: "wrong".to_string(),
                error: "Output did not match expected".to_string(),
                expected: Some("Foo v. Bar".to_string()),
                actual: Some("Foo v Bar".to_string()),
            },
        ];
        let mut out = Vec::new();
        report_results(&results, &no_color(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("PASS: ok [u]"));
        assert!(text.contains("FAIL: wrong [u]"));
        assert!(text.contains("- expected: Foo v. Bar"));
        assert!(text.contains("+ actual:   Foo v Bar"));
        assert!(text.contains("total 2, passed 1, failed 1, skipped 0"));
    }
}
