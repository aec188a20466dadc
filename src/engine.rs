//! The test engine: the seam between the corpus and the citation processor.
//!
//! The processor itself is external. It is driven through
//! [`CitationProcessor::rebuild_processor_state`] and pulls everything it needs
//! (items, locales, style modules, abbreviations) through the
//! [`ProcessorSystem`] callbacks implemented by [`EngineSystem`].
//!
//! Every render call rebuilds the processor state over the full, ordered list
//! of clusters. Output for a cluster may depend on the clusters before it
//! (disambiguation, "ibid." and friends), so cluster order is preserved from
//! the test case through to the returned strings.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::abbreviations::{AbbreviationCategory, AbbreviationSet, AbbreviationStore};
use crate::config::RunnerConfig;
use crate::corpus::CitationItemSet;
use crate::diagnostics::RunnerError;
use crate::err_msg;
use crate::library::ReferenceLibrary;
use crate::repo_cache::RefSource;
use crate::resolver::{LocaleResolver, StyleModuleResolver};

// =============================================================================
// PROCESSOR INTERFACE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Text,
    Rtf,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Text => "text",
            OutputFormat::Rtf => "rtf",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(OutputFormat::Html),
            "text" => Ok(OutputFormat::Text),
            "rtf" => Ok(OutputFormat::Rtf),
            other => Err(err_msg!(Render, "unknown output format '{}'", other)),
        }
    }
}

/// One cluster as handed to the processor.
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    pub citation_id: String,
    /// 1-based position of the footnote carrying the cluster.
    pub note_index: usize,
    pub items: CitationItemSet,
}

/// Processor output for one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCitation {
    pub citation_id: String,
    pub note_index: usize,
    pub text: String,
}

/// Read-only callbacks the processor uses while rendering.
pub trait ProcessorSystem {
    fn retrieve_locale(&self, lang: &str) -> Option<String>;
    fn retrieve_item(&self, id: &str) -> Option<&Value>;
    fn retrieve_style_module(&self, jurisdiction: &str, preference: Option<&str>) -> Option<String>;
    fn abbreviation(
        &self,
        jurisdiction: &str,
        category: AbbreviationCategory,
        key: &str,
    ) -> Option<String>;
    /// Changes whenever the abbreviation store is reset.
    fn abbreviation_generation(&self) -> u64;
}

/// The external citation renderer.
pub trait CitationProcessor {
    /// Rebuilds processor state over `citations` in order and renders each one.
    fn rebuild_processor_state(
        &mut self,
        sys: &dyn ProcessorSystem,
        citations: &[Citation],
        format: OutputFormat,
    ) -> Result<Vec<RenderedCitation>, RunnerError>;
}

// =============================================================================
// SYSTEM ADAPTER
// =============================================================================

/// Implements [`ProcessorSystem`] over the library, resolvers and abbreviation store.
#[derive(Debug, Clone)]
pub struct EngineSystem {
    library: ReferenceLibrary,
    locales: LocaleResolver,
    modules: StyleModuleResolver,
    abbreviations: AbbreviationStore,
    lang: String,
}

impl EngineSystem {
    pub fn new(
        library: ReferenceLibrary,
        locales: LocaleResolver,
        modules: StyleModuleResolver,
        lang: impl Into<String>,
    ) -> Self {
        Self {
            library,
            locales,
            modules,
            abbreviations: AbbreviationStore::new(),
            lang: lang.into(),
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Result<Self, RunnerError> {
        let library = ReferenceLibrary::load(&config.library_path()?)?;
        let cache_root = config.cache_root()?;
        let locales = LocaleResolver::new(cache_root.join(RefSource::Locales.dir_name()));
        let modules = StyleModuleResolver::new(
            config.jurisdiction_dirs(),
            cache_root.join(RefSource::StyleModules.dir_name()),
        );
        Ok(Self::new(library, locales, modules, config.lang.clone()))
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn library(&self) -> &ReferenceLibrary {
        &self.library
    }

    pub fn abbreviations(&self) -> &AbbreviationStore {
        &self.abbreviations
    }

    pub fn abbreviations_mut(&mut self) -> &mut AbbreviationStore {
        &mut self.abbreviations
    }
}

impl ProcessorSystem for EngineSystem {
    fn retrieve_locale(&self, lang: &str) -> Option<String> {
        self.locales.resolve(lang)
    }

    fn retrieve_item(&self, id: &str) -> Option<&Value> {
        self.library.get(id)
    }

    fn retrieve_style_module(&self, jurisdiction: &str, preference: Option<&str>) -> Option<String> {
        self.modules.resolve(jurisdiction, preference)
    }

    fn abbreviation(
        &self,
        jurisdiction: &str,
        category: AbbreviationCategory,
        key: &str,
    ) -> Option<String> {
        self.abbreviations
            .get(jurisdiction, category, key)
            .map(str::to_string)
    }

    fn abbreviation_generation(&self) -> u64 {
        self.abbreviations.generation()
    }
}

// =============================================================================
// TEST ENGINE
// =============================================================================

/// Drives one processor instance on behalf of the test harness.
///
/// `produce_*` take `&mut self`: a render call mutates the abbreviation store
/// and the processor state, so calls against one engine are serialized.
pub struct TestEngine<P: CitationProcessor> {
    system: EngineSystem,
    processor: P,
    style: String,
}

impl<P: CitationProcessor> TestEngine<P> {
    /// Loads style and library per `config`, then builds the processor.
    pub fn new<F>(config: &RunnerConfig, build: F) -> Result<Self, RunnerError>
    where
        F: FnOnce(&EngineSystem, &str) -> Result<P, RunnerError>,
    {
        let style = load_style(&config.style_path()?)?;
        let system = EngineSystem::from_config(config)?;
        Self::from_parts(system, style, build)
    }

    pub fn from_parts<F>(system: EngineSystem, style: String, build: F) -> Result<Self, RunnerError>
    where
        F: FnOnce(&EngineSystem, &str) -> Result<P, RunnerError>,
    {
        let processor = build(&system, &style)?;
        Ok(Self {
            system,
            processor,
            style,
        })
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn system(&self) -> &EngineSystem {
        &self.system
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Renders one cluster.
    ///
    /// Always goes through the sequence path; the processor's direct
    /// single-cluster entry point is unreliable for some item shapes.
    pub fn produce_single(
        &mut self,
        items: &CitationItemSet,
        format: Option<&str>,
        abbreviations: Option<&[AbbreviationSet]>,
    ) -> Result<String, RunnerError> {
        let mut rendered =
            self.produce_sequence(std::slice::from_ref(items), format, abbreviations)?;
        rendered
            .pop()
            .ok_or_else(|| err_msg!(Render, "processor returned no output"))
    }

    /// Renders every cluster, in input order.
    pub fn produce_sequence(
        &mut self,
        clusters: &[CitationItemSet],
        format: Option<&str>,
        abbreviations: Option<&[AbbreviationSet]>,
    ) -> Result<Vec<String>, RunnerError> {
        let format = format
            .map(OutputFormat::from_str)
            .transpose()?
            .unwrap_or_default();
        self.system.abbreviations.configure(abbreviations);

        let citations: Vec<Citation> = clusters
            .iter()
            .enumerate()
            .map(|(i, items)| Citation {
                citation_id: format!("CITATION-{}", i),
                note_index: i + 1,
                items: items.clone(),
            })
            .collect();
        debug!(clusters = citations.len(), %format, "rebuilding processor state");

        let rendered = self
            .processor
            .rebuild_processor_state(&self.system, &citations, format)?;
        let mut by_id: HashMap<String, String> = rendered
            .into_iter()
            .map(|r| (r.citation_id, r.text))
            .collect();

        citations
            .iter()
            .map(|c| {
                by_id.remove(&c.citation_id).ok_or_else(|| {
                    err_msg!(Render, "processor returned no output for {}", c.citation_id)
                })
            })
            .collect()
    }
}

/// Reads a style file, rejecting anything that is not CSL.
pub fn load_style(path: &Path) -> Result<String, RunnerError> {
    let text = fs::read_to_string(path).map_err(|e| {
        err_msg!(Configuration, "cannot read style '{}': {}", path.display(), e)
    })?;
    if !text.contains("<style") {
        return Err(err_msg!(
            Configuration,
            "'{}' is not a CSL style",
            path.display()
        ));
    }
    Ok(text)
}
