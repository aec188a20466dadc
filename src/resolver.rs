//! Best-effort lookups of style modules and locales.
//!
//! A miss is not an error: both resolvers return `None` and leave it to the
//! citation processor to decide whether the missing file matters.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Finds jurisdiction style modules across an ordered list of directories.
#[derive(Debug, Clone)]
pub struct StyleModuleResolver {
    dirs: Vec<PathBuf>,
    fallback: PathBuf,
}

impl StyleModuleResolver {
    /// `dirs` are searched in order, `fallback` (the cached module checkout) last.
    pub fn new(dirs: Vec<PathBuf>, fallback: PathBuf) -> Self {
        Self { dirs, fallback }
    }

    /// `juris-<jurisdiction>[-<preference>].csl`, with `:` in the jurisdiction written as `+`.
    pub fn module_file_name(jurisdiction: &str, preference: Option<&str>) -> String {
        let jurisdiction = jurisdiction.replace(':', "+");
        match preference {
            Some(preference) => format!("juris-{}-{}.csl", jurisdiction, preference),
            None => format!("juris-{}.csl", jurisdiction),
        }
    }

    /// Returns the text of the first readable module file.
    pub fn resolve(&self, jurisdiction: &str, preference: Option<&str>) -> Option<String> {
        self.locate(jurisdiction, preference).map(|(_, text)| text)
    }

    /// Like [`resolve`](Self::resolve), also returning the file the text came from.
    pub fn locate(&self, jurisdiction: &str, preference: Option<&str>) -> Option<(PathBuf, String)> {
        let file_name = Self::module_file_name(jurisdiction, preference);
        self.search_order().find_map(|dir| {
            let path = dir.join(&file_name);
            read_candidate(&path).map(|text| (path, text))
        })
    }

    /// Directories in the order they are searched.
    pub fn search_order(&self) -> impl Iterator<Item = &Path> {
        self.dirs
            .iter()
            .map(PathBuf::as_path)
            .chain(std::iter::once(self.fallback.as_path()))
    }
}

/// Reads `locales-<lang>.xml` from the cached locale checkout.
#[derive(Debug, Clone)]
pub struct LocaleResolver {
    dir: PathBuf,
}

impl LocaleResolver {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn resolve(&self, lang: &str) -> Option<String> {
        read_candidate(&self.dir.join(format!("locales-{}.xml", lang)))
    }
}

fn read_candidate(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => {
            debug!(path = %path.display(), "resolved");
            Some(text)
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "candidate skipped");
            None
        }
    }
}
