//! Runner configuration.
//!
//! Loaded from a YAML file (kebab-case keys). Relative paths are resolved
//! against the directory of the file; command-line flags override file values
//! after loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diagnostics::{parse_error_yaml, RunnerError};
use crate::discovery::PathSetExpander;
use crate::err_msg;

pub const DEFAULT_CONFIG_FILE: &str = "juris-test.yaml";
pub const CACHE_ENV_VAR: &str = "JURIS_TEST_CACHE";
pub const DEFAULT_LOCALES_REMOTE: &str = "https://github.com/citation-style-language/locales";
pub const DEFAULT_MODULES_REMOTE: &str = "https://github.com/Juris-M/style-modules";
pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_LANG: &str = "en-US";

const APP_DIR: &str = "juris-test";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunnerConfig {
    #[serde(default)]
    pub style: Option<PathBuf>,
    #[serde(default)]
    pub library: Option<PathBuf>,
    #[serde(default)]
    pub suites: Vec<String>,
    #[serde(default)]
    pub jurisdiction_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default)]
    pub refresh: bool,
    #[serde(default = "default_locales_remote")]
    pub locales_remote: String,
    #[serde(default = "default_modules_remote")]
    pub modules_remote: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_lang() -> String {
    DEFAULT_LANG.to_string()
}

fn default_locales_remote() -> String {
    DEFAULT_LOCALES_REMOTE.to_string()
}

fn default_modules_remote() -> String {
    DEFAULT_MODULES_REMOTE.to_string()
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            style: None,
            library: None,
            suites: Vec::new(),
            jurisdiction_dirs: Vec::new(),
            cache_dir: None,
            lang: default_lang(),
            refresh: false,
            locales_remote: default_locales_remote(),
            modules_remote: default_modules_remote(),
            branch: default_branch(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl RunnerConfig {
    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let source = fs::read_to_string(path).map_err(|e| {
            err_msg!(Configuration, "cannot read config '{}': {}", path.display(), e)
        })?;
        Self::parse(path, &source)
    }

    pub fn parse(path: &Path, source: &str) -> Result<Self, RunnerError> {
        let mut config: RunnerConfig = if source.trim().is_empty() {
            RunnerConfig::default()
        } else {
            serde_yaml::from_str(source).map_err(|e| parse_error_yaml(path, source, &e))?
        };
        config.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    pub fn style_path(&self) -> Result<PathBuf, RunnerError> {
        self.style
            .as_deref()
            .map(|p| self.resolve(p))
            .ok_or_else(|| {
                err_msg!(Configuration, "no style configured").with_help("set `style` or pass --style")
            })
    }

    pub fn library_path(&self) -> Result<PathBuf, RunnerError> {
        self.library
            .as_deref()
            .map(|p| self.resolve(p))
            .ok_or_else(|| {
                err_msg!(Configuration, "no library configured")
                    .with_help("set `library` or pass --library")
            })
    }

    /// Expands `suites` against the config directory.
    pub fn suite_files(&self) -> Result<Vec<PathBuf>, RunnerError> {
        PathSetExpander::expand(&self.base_dir, &self.suites)
    }

    pub fn jurisdiction_dirs(&self) -> Vec<PathBuf> {
        self.jurisdiction_dirs
            .iter()
            .map(|p| self.resolve(p))
            .collect()
    }

    /// Cache root: explicit setting, then `$JURIS_TEST_CACHE`, then [`default_cache_root`].
    pub fn cache_root(&self) -> Result<PathBuf, RunnerError> {
        if let Some(dir) = &self.cache_dir {
            return Ok(self.resolve(dir));
        }
        if let Some(dir) = env::var_os(CACHE_ENV_VAR).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        default_cache_root().ok_or_else(|| {
            err_msg!(Configuration, "cannot determine a cache directory")
                .with_help(format!("set `cache-dir` or ${}", CACHE_ENV_VAR))
        })
    }
}

/// `juris-test` under the platform cache directory.
pub fn default_cache_root() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorType;

    #[test]
    fn test_parse_with_defaults() {
        let config = RunnerConfig::parse(
            Path::new("project/juris-test.yaml"),
            "style: styles/jm-chicago.csl\nlibrary: lib.json\nsuites: ['suites/*.yaml']\n",
        )
        .unwrap();
        assert_eq!(config.lang, "en-US");
        assert_eq!(config.branch, "master");
        assert!(!config.refresh);
        assert_eq!(
            config.style_path().unwrap(),
            Path::new("project").join("styles/jm-chicago.csl")
        );
        assert_eq!(config.suites, vec!["suites/*.yaml"]);
    }

    #[test]
    fn test_missing_style_is_configuration_error() {
        let config = RunnerConfig::parse(Path::new("c.yaml"), "").unwrap();
        let err = config.style_path().unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Configuration);
    }

    #[test]
    fn test_unknown_key_is_parse_error() {
        let err = RunnerConfig::parse(Path::new("c.yaml"), "stlye: x.csl\n").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Parse);
    }

    #[test]
    fn test_cache_root_falls_back_to_platform_dir() {
        let config = RunnerConfig::default();
        let expected = match env::var_os(CACHE_ENV_VAR).filter(|v| !v.is_empty()) {
            Some(dir) => Some(PathBuf::from(dir)),
            None => default_cache_root(),
        };
        assert_eq!(config.cache_root().ok(), expected);
        if let Some(root) = default_cache_root() {
            assert!(root.ends_with("juris-test"));
        }
    }

    #[test]
    fn test_explicit_cache_dir_wins() {
        let config = RunnerConfig::parse(Path::new("root/c.yaml"), "cache-dir: .cache\n").unwrap();
        assert_eq!(config.cache_root().unwrap(), Path::new("root").join(".cache"));
    }
}
