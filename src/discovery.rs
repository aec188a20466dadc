use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::diagnostics::RunnerError;
use crate::err_msg;

/// Expands user-supplied path patterns into a concrete, ordered file list.
///
/// A pattern may name a file, a directory (searched recursively for suite
/// documents) or a wildcard pattern using `*`, `**` and `?`.
#[derive(Debug)]
pub struct PathSetExpander;

impl PathSetExpander {
    // =====================
    // Public API
    // =====================

    /// Expands every pattern relative to `base`.
    ///
    /// Matches of a single pattern are sorted for deterministic order. Across
    /// patterns the given order is kept and repeated files are dropped.
    pub fn expand<S: AsRef<str>>(base: &Path, patterns: &[S]) -> Result<Vec<PathBuf>, RunnerError> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let matches = Self::expand_one(base, pattern)?;
            if matches.is_empty() {
                warn!(pattern, "suite pattern matched no files");
            }
            for path in matches {
                if seen.insert(path.clone()) {
                    files.push(path);
                }
            }
        }
        debug!(count = files.len(), "expanded suite patterns");
        Ok(files)
    }

    /// Returns true if the given path has a `.yaml` or `.yml` extension.
    pub fn is_suite_file(path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml")
    }

    // =====================
    // Internal - Expansion
    // =====================

    fn expand_one(base: &Path, pattern: &str) -> Result<Vec<PathBuf>, RunnerError> {
        if !Self::has_wildcard(pattern) {
            let path = base.join(pattern);
            if path.is_file() {
                return Ok(vec![path]);
            }
            if path.is_dir() {
                return Self::walk(&path, |p| Self::is_suite_file(p));
            }
            return Ok(Vec::new());
        }

        let (root, rest) = Self::split_literal_prefix(pattern);
        let root = if root.as_os_str().is_empty() {
            base.to_path_buf()
        } else {
            base.join(root)
        };
        if !root.is_dir() {
            return Ok(Vec::new());
        }
        let matcher = Self::compile(&rest)?;
        Self::walk(&root, |p| {
            p.strip_prefix(&root)
                .ok()
                .map(Self::to_slash)
                .is_some_and(|rel| matcher.is_match(&rel))
        })
    }

    fn walk(root: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>, RunnerError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|e| {
                err_msg!(Configuration, "failed to walk '{}': {}", root.display(), e)
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if keep(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }

    fn has_wildcard(segment: &str) -> bool {
        segment.contains(['*', '?'])
    }

    /// Splits `a/b/*/c.yaml` into the directory `a/b` and the pattern `*/c.yaml`.
    fn split_literal_prefix(pattern: &str) -> (PathBuf, String) {
        let path = Path::new(pattern);
        let mut root = PathBuf::new();
        let mut rest = Vec::new();
        for component in path.components() {
            let text = component.as_os_str().to_string_lossy();
            if rest.is_empty() && !Self::has_wildcard(&text) {
                root.push(component.as_os_str());
                continue;
            }
            if let Component::Normal(_) | Component::CurDir | Component::ParentDir = component {
                rest.push(text.into_owned());
            }
        }
        (root, rest.join("/"))
    }

    /// Translates a wildcard pattern into an anchored regex over `/`-separated paths.
    fn compile(pattern: &str) -> Result<Regex, RunnerError> {
        let mut out = String::from("^");
        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' if chars.peek() == Some(&'*') => {
                    chars.next();
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        out.push_str("(?:.*/)?");
                    } else {
                        out.push_str(".*");
                    }
                }
                '*' => out.push_str("[^/]*"),
                '?' => out.push_str("[^/]"),
                other => out.push_str(&regex::escape(&other.to_string())),
            }
        }
        out.push('$');
        Regex::new(&out)
            .map_err(|e| err_msg!(Configuration, "invalid suite pattern '{}': {}", pattern, e))
    }

    fn to_slash(path: &Path) -> String {
        path.components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}
