use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::snippet::EditHistory;
use crate::types::identifiers::{CodebaseId, SourceFile};
use crate::types::AssemblyRequest;

/// What to do when a retrieval source fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the whole assembly.
    Abort,
    /// Continue as if the failed source returned nothing.
    #[default]
    UseEmpty,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field} must be at least 1")]
    ZeroField { field: &'static str },
}

// Serializable, comparable, explicit defaults. Missing keys fall back to `v0()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    pub max_chars: usize,
    pub embeddings_enabled: bool,
    /// Lines per Jaccard window.
    pub jaccard_window_size: usize,
    pub max_local_matches: usize,
    /// Trailing non-blank prefix lines sent as the embeddings query.
    pub embeddings_query_lines: usize,
    pub embeddings_max_age_secs: u64,
    /// Cap on cached embeddings queries.
    pub embeddings_max_entries: usize,
    pub on_source_failure: FailurePolicy,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self::v0()
    }
}

impl AssemblerConfig {
    pub fn v0() -> Self {
        Self {
            max_chars: 4000,
            embeddings_enabled: false,
            jaccard_window_size: 50,
            max_local_matches: 20,
            embeddings_query_lines: 8,
            embeddings_max_age_secs: 300,
            embeddings_max_entries: 256,
            on_source_failure: FailurePolicy::UseEmpty,
        }
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("jaccard_window_size", self.jaccard_window_size),
            ("max_local_matches", self.max_local_matches),
            ("embeddings_query_lines", self.embeddings_query_lines),
            ("embeddings_max_entries", self.embeddings_max_entries),
        ];
        for (field, value) in sizes {
            if value == 0 {
                return Err(ConfigError::ZeroField { field });
            }
        }
        Ok(())
    }

    /// A request carrying this config's budget and embeddings switch.
    pub fn request(
        &self,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        current_file: impl Into<SourceFile>,
        history: EditHistory,
        codebase: CodebaseId,
    ) -> AssemblyRequest {
        let mut request = AssemblyRequest::new(prefix, suffix, self.max_chars)
            .with_current_file(current_file)
            .with_history(history);
        request.embeddings_enabled = self.embeddings_enabled;
        request.codebase = codebase;
        request
    }
}
