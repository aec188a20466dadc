use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::abbreviations::AbbreviationSet;

/// Fields a document carries that the runner does not interpret.
pub type ExtraFields = BTreeMap<String, serde_yaml::Value>;

/// A `describe` block of a suite document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSuiteUnit {
    pub describe: String,
    #[serde(default)]
    pub tests: Vec<TestCase>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl TestSuiteUnit {
    pub fn new(describe: impl Into<String>) -> Self {
        Self {
            describe: describe.into(),
            tests: Vec::new(),
            extra: ExtraFields::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    #[default]
    Normal,
    Only,
    Skip,
}

/// A single rendering check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<TestMode>,
    #[serde(default, alias = "inputSingle", skip_serializing_if = "Option::is_none")]
    pub single: Option<CitationItemSet>,
    #[serde(default, alias = "inputSequence", skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Vec<CitationItemSet>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviations: Option<Vec<AbbreviationSet>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<Expectation>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// What a test case renders: one cluster, or an ordered run of clusters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TestInput<'a> {
    Single(&'a CitationItemSet),
    Sequence(&'a [CitationItemSet]),
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: None,
            single: None,
            sequence: None,
            format: None,
            abbreviations: None,
            expect: None,
            extra: ExtraFields::new(),
        }
    }

    pub fn mode(&self) -> TestMode {
        self.mode.unwrap_or_default()
    }

    /// Documented but not executed.
    pub fn is_placeholder(&self) -> bool {
        self.expect.is_none()
    }

    /// `sequence` takes precedence when both inputs are present.
    pub fn input(&self) -> Option<TestInput<'_>> {
        if let Some(sequence) = &self.sequence {
            return Some(TestInput::Sequence(sequence));
        }
        self.single.as_ref().map(TestInput::Single)
    }

    pub fn with_expect(mut self, expect: impl Into<Expectation>) -> Self {
        self.expect = Some(expect.into());
        self
    }

    pub fn with_single(mut self, items: CitationItemSet) -> Self {
        self.single = Some(items);
        self
    }

    pub fn with_sequence(mut self, clusters: Vec<CitationItemSet>) -> Self {
        self.sequence = Some(clusters);
        self
    }

    pub fn with_mode(mut self, mode: TestMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// Expected rendering: a single string, or one string per cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expectation {
    Text(String),
    Sequence(Vec<String>),
}

impl From<&str> for Expectation {
    fn from(text: &str) -> Self {
        Expectation::Text(text.to_string())
    }
}

impl From<Vec<&str>> for Expectation {
    fn from(lines: Vec<&str>) -> Self {
        Expectation::Sequence(lines.into_iter().map(str::to_string).collect())
    }
}

/// The citation items of one cluster, in order.
pub type CitationItemSet = Vec<CitationItemRef>;

/// A reference to a library item plus rendering hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationItemRef {
    pub id: String,
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub locator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl CitationItemRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            locator: None,
            label: None,
            extra: ExtraFields::new(),
        }
    }

    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
}

/// Locators are written both as `locator: "12-14"` and `locator: 12`.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value.map(|scalar| match scalar {
        Scalar::Text(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
    }))
}
