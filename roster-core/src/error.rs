//! Error types for roster-core.

use std::path::PathBuf;

use thiserror::Error;

/// A raw sheet row that cannot become a [`crate::RosterEntry`].
///
/// Never retried: the reconciler logs it and moves on to the next row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("row {row_index}: too few columns ({found} of {expected} required)")]
    TooFewColumns {
        row_index: usize,
        found: usize,
        expected: usize,
    },
}

impl ParseError {
    /// Short machine-friendly reason, stable across releases.
    pub fn reason(&self) -> &'static str {
        match self {
            ParseError::TooFewColumns { .. } => "too few columns",
        }
    }
}

/// All errors that can arise from loading or saving the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, with the path that was being touched.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("config not found at {path}; run `roster config init` first")]
    NotFound { path: PathBuf },

    #[error("config already exists at {path}; pass --force to overwrite")]
    AlreadyExists { path: PathBuf },

    /// A value that parses but makes no sense (e.g. `max_wait_ms < base_wait_ms`).
    #[error("invalid config: {0}")]
    Invalid(String),

    /// The environment variable named by a `token_env` key is unset or empty.
    #[error("environment variable {var} is not set")]
    MissingToken { var: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
