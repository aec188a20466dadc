//! Local checkouts of the reference data the processor needs.
//!
//! Two sources are kept under the cache root: CSL locales and the Juris-M
//! jurisdiction style modules. Each is cloned when absent and, on request,
//! refreshed with fetch + merge. A failed refresh is repaired by discarding
//! the checkout and cloning again; only a failed clone reaches the caller.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::RunnerConfig;
use crate::diagnostics::RunnerError;

/// The reference-data sources, in the order they are synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefSource {
    Locales,
    StyleModules,
}

impl RefSource {
    pub const ALL: [RefSource; 2] = [RefSource::Locales, RefSource::StyleModules];

    /// Directory name under the cache root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            RefSource::Locales => "locales",
            RefSource::StyleModules => "style-modules",
        }
    }
}

impl fmt::Display for RefSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug, Error)]
#[error("git {operation} failed: {detail}")]
pub struct GitError {
    pub operation: &'static str,
    pub detail: String,
}

/// The version-control operations the cache policy needs.
pub trait GitClient {
    fn clone_repo(&self, remote: &str, branch: &str, dest: &Path) -> Result<(), GitError>;
    fn fetch(&self, repo: &Path) -> Result<(), GitError>;
    fn merge(&self, repo: &Path, branch: &str) -> Result<(), GitError>;
}

/// Runs the `git` executable.
#[derive(Debug, Clone, Default)]
pub struct CommandGit;

impl CommandGit {
    fn run(operation: &'static str, args: &[&str]) -> Result<(), GitError> {
        let output = Command::new("git").args(args).output().map_err(|e| GitError {
            operation,
            detail: e.to_string(),
        })?;
        if output.status.success() {
            return Ok(());
        }
        Err(GitError {
            operation,
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

impl GitClient for CommandGit {
    fn clone_repo(&self, remote: &str, branch: &str, dest: &Path) -> Result<(), GitError> {
        let dest = dest.to_string_lossy();
        Self::run(
            "clone",
            &["clone", "--quiet", "--branch", branch, remote, dest.as_ref()],
        )
    }

    fn fetch(&self, repo: &Path) -> Result<(), GitError> {
        let repo = repo.to_string_lossy();
        Self::run("fetch", &["-C", repo.as_ref(), "fetch", "--quiet", "origin"])
    }

    fn merge(&self, repo: &Path, branch: &str) -> Result<(), GitError> {
        let repo = repo.to_string_lossy();
        let tracked = format!("origin/{}", branch);
        Self::run(
            "merge",
            &["-C", repo.as_ref(), "merge", "--quiet", "--ff-only", &tracked],
        )
    }
}

#[derive(Debug, Clone)]
pub struct RepoCache<G: GitClient = CommandGit> {
    root: PathBuf,
    locales_remote: String,
    modules_remote: String,
    branch: String,
    git: G,
}

impl RepoCache<CommandGit> {
    pub fn from_config(config: &RunnerConfig) -> Result<Self, RunnerError> {
        Self::from_config_with(config, CommandGit)
    }
}

impl<G: GitClient> RepoCache<G> {
    pub fn from_config_with(config: &RunnerConfig, git: G) -> Result<Self, RunnerError> {
        Ok(Self {
            root: config.cache_root()?,
            locales_remote: config.locales_remote.clone(),
            modules_remote: config.modules_remote.clone(),
            branch: config.branch.clone(),
            git,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, source: RefSource) -> PathBuf {
        self.root.join(source.dir_name())
    }

    pub fn remote(&self, source: RefSource) -> &str {
        match source {
            RefSource::Locales => &self.locales_remote,
            RefSource::StyleModules => &self.modules_remote,
        }
    }

    pub fn git(&self) -> &G {
        &self.git
    }

    /// Ensures every source in turn; the first failure stops the run.
    pub fn ensure_all(&self, refresh: bool) -> Result<(), RunnerError> {
        for source in RefSource::ALL {
            self.ensure(source, refresh)?;
        }
        Ok(())
    }

    /// Makes sure a usable checkout of `source` exists.
    pub fn ensure(&self, source: RefSource, refresh: bool) -> Result<(), RunnerError> {
        let dir = self.dir(source);
        if dir.is_dir() {
            if !refresh {
                return Ok(());
            }
            match self.pull(&dir) {
                Ok(()) => {
                    info!(%source, "reference data updated");
                    return Ok(());
                }
                Err(e) => warn!(%source, error = %e, "update failed, cloning afresh"),
            }
        }
        self.fresh_clone(source, &dir)
    }

    fn pull(&self, dir: &Path) -> Result<(), GitError> {
        self.git.fetch(dir)?;
        self.git.merge(dir, &self.branch)
    }

    fn fresh_clone(&self, source: RefSource, dir: &Path) -> Result<(), RunnerError> {
        let removed = if dir.is_dir() {
            fs::remove_dir_all(dir)
        } else if dir.exists() {
            fs::remove_file(dir)
        } else {
            Ok(())
        };
        removed.map_err(|e| {
            RunnerError::io(format!("cannot remove stale checkout '{}'", dir.display()), e)
        })?;
        fs::create_dir_all(&self.root).map_err(|e| {
            RunnerError::io(format!("cannot create cache '{}'", self.root.display()), e)
        })?;
        let remote = self.remote(source);
        info!(%source, remote, "cloning reference data");
        self.git
            .clone_repo(remote, &self.branch, dir)
            .map_err(|e| {
                RunnerError::network(
                    format!("cannot clone {} from {}", source, remote),
                    Some(Box::new(e)),
                )
            })
    }
}
