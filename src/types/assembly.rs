use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::retrieval::RetrievalError;
use crate::snippet::{EditHistory, ReferenceSnippet};
use crate::types::identifiers::{digest_parts, CodebaseId, SourceFile};

/// The retrieval source a snippet came from.
///
/// Declaration order is priority order: embeddings matches are merged first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalSource {
    Embeddings,
    Local,
}

impl RetrievalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalSource::Embeddings => "embeddings",
            RetrievalSource::Local => "local",
        }
    }
}

impl fmt::Display for RetrievalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a retrieval pass needs to know about the cursor.
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    /// Text immediately before the cursor.
    pub prefix: String,
    /// Text immediately after the cursor.
    pub suffix: String,
    /// File the cursor is in. The local source never returns matches from it.
    pub current_file: SourceFile,
    pub history: EditHistory,
    /// Total characters all accepted snippets may consume together.
    pub max_chars: usize,
    /// When false the embeddings source is never invoked.
    pub embeddings_enabled: bool,
    pub codebase: CodebaseId,
}

impl AssemblyRequest {
    /// A request with embeddings disabled and an empty edit history.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>, max_chars: usize) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            current_file: SourceFile::default(),
            history: EditHistory::new(),
            max_chars,
            embeddings_enabled: false,
            codebase: CodebaseId::default(),
        }
    }

    pub fn with_current_file(mut self, file: impl Into<SourceFile>) -> Self {
        self.current_file = file.into();
        self
    }

    pub fn with_history(mut self, history: EditHistory) -> Self {
        self.history = history;
        self
    }

    /// Enable the embeddings source against `codebase`.
    pub fn with_embeddings(mut self, codebase: CodebaseId) -> Self {
        self.embeddings_enabled = true;
        self.codebase = codebase;
        self
    }
}

/// Per-source count of accepted snippets.
///
/// A source with no accepted snippets has no entry, whether it was skipped,
/// returned nothing, or had every candidate rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InclusionSummary {
    counts: BTreeMap<RetrievalSource, usize>,
}

impl InclusionSummary {
    pub(crate) fn from_counts(embeddings: usize, local: usize) -> Self {
        let mut counts = BTreeMap::new();
        if embeddings > 0 {
            counts.insert(RetrievalSource::Embeddings, embeddings);
        }
        if local > 0 {
            counts.insert(RetrievalSource::Local, local);
        }
        Self { counts }
    }

    pub fn get(&self, source: RetrievalSource) -> Option<usize> {
        self.counts.get(&source).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RetrievalSource, usize)> + '_ {
        self.counts.iter().map(|(source, count)| (*source, *count))
    }
}

/// Accounting for one assembly pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssemblyStats {
    pub budget: usize,
    pub chars_used: usize,

    pub embeddings_considered: usize,
    pub local_considered: usize,

    pub rejected_duplicate: usize,
    pub rejected_over_budget: usize,

    /// Sources that failed and were replaced by an empty sequence.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_sources: Vec<RetrievalSource>,
}

/// The assembled context handed to the completion engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyResult {
    /// Accepted snippets in acceptance order.
    pub context: Vec<ReferenceSnippet>,
    pub inclusion_summary: InclusionSummary,
    pub stats: AssemblyStats,
}

impl AssemblyResult {
    /// Digest over the accepted context, in order. Identical contexts always
    /// produce identical fingerprints.
    pub fn fingerprint(&self) -> String {
        digest_parts(
            self.context
                .iter()
                .flat_map(|s| [s.file_name.as_str(), s.content.as_str()]),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("{origin} retrieval failed: {error}")]
    Retrieval {
        origin: RetrievalSource,
        #[source]
        error: RetrievalError,
    },
}
