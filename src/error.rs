use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::link::SpliceError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse TOML config {path}: {source}")]
    TomlConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse YAML config {path}: {source}")]
    YamlConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk corpus: {0}")]
    Walk(#[from] ignore::Error),

    #[error("invalid exclude pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("file {0} is not part of the analyzed corpus")]
    NotInCorpus(String),

    #[error("failed to insert link in {document}: {source}")]
    Splice {
        document: String,
        #[source]
        source: SpliceError,
    },
}

impl Error {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
