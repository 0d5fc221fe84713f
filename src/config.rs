//! Settings loaded from defaults, an optional TOML/YAML file, and the command line.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::default_cache_dir;
use crate::error::{Error, Result};
use crate::tokenizer::NgramRange;

/// File names searched, in order, in the working directory and then `$HOME`.
const CONFIG_FILE_NAMES: [&str; 3] = [".internal-link.toml", ".internal-link.yaml", ".internal-link.yml"];

/// What the apply phase does when a link cannot be spliced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SplicePolicy {
    /// Log the failure and continue with the remaining suggestions.
    #[default]
    Skip,
    /// Stop at the first failure.
    Abort,
}

/// Which documents act as link sources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Corpus,
    SingleFile(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub min_score: f64,
    pub min_ngram: usize,
    pub max_ngram: usize,
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
    pub cache: bool,
    pub cache_dir: Option<PathBuf>,
    pub on_splice_error: SplicePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_score: 0.3,
            min_ngram: 2,
            max_ngram: 3,
            extensions: vec!["md".to_string()],
            exclude: Vec::new(),
            cache: true,
            cache_dir: None,
            on_splice_error: SplicePolicy::Skip,
        }
    }
}

impl Settings {
    /// Loads `explicit` if given (it must exist), otherwise the first config
    /// file found in the working directory or `$HOME`, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let mut dirs = vec![PathBuf::from(".")];
        if let Some(home) = std::env::var_os("HOME") {
            dirs.push(PathBuf::from(home));
        }
        for dir in dirs {
            for name in CONFIG_FILE_NAMES {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    return Self::from_file(&candidate);
                }
            }
        }

        Ok(Self::default())
    }

    /// Parses a TOML or YAML file, chosen by extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        debug!(path = %path.display(), "using config file");

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml(&content).map_err(|source| Error::YamlConfig {
                path: path.to_path_buf(),
                source,
            }),
            _ => Self::from_toml(&content).map_err(|source| Error::TomlConfig {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_ngram < 1 {
            return Err(Error::InvalidConfig("min_ngram must be at least 1".into()));
        }
        if self.max_ngram < self.min_ngram {
            return Err(Error::InvalidConfig(format!(
                "max_ngram ({}) must be >= min_ngram ({})",
                self.max_ngram, self.min_ngram
            )));
        }
        if !self.min_score.is_finite() || self.min_score < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "min_score must be a non-negative number, got {}",
                self.min_score
            )));
        }
        if self.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(Error::InvalidConfig("at least one file extension is required".into()));
        }
        Ok(())
    }

    pub fn ngram_range(&self) -> NgramRange {
        NgramRange::new(self.min_ngram, self.max_ngram)
    }

    /// Cache location, or `None` when caching is off or no location is known.
    pub fn resolved_cache_dir(&self) -> Option<PathBuf> {
        if !self.cache {
            return None;
        }
        self.cache_dir.clone().or_else(default_cache_dir)
    }
}
