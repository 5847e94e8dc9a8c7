use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Identifier of the file a snippet was taken from.
///
/// Two snippets with equal `SourceFile`s are duplicates for assembly purposes,
/// whatever their content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceFile(String);

#[derive(Debug, Error)]
pub enum SourceFileError {
    #[error("Source path is outside the workspace root")]
    OutsideRoot,
    #[error("Path involves invalid UTF-8")]
    InvalidUtf8,
}

impl SourceFile {
    pub fn new(name: impl Into<String>) -> Self {
        SourceFile(name.into())
    }

    /// Create a SourceFile from a path under a single workspace root.
    pub fn from_path(root: &Path, source: &Path) -> Result<Self, SourceFileError> {
        let rel = source
            .strip_prefix(root)
            .map_err(|_| SourceFileError::OutsideRoot)?;

        let normalized = normalize_path(rel)?;

        Ok(SourceFile(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceFile {
    fn from(name: &str) -> Self {
        SourceFile::new(name)
    }
}

// Case is preserved: editors on case-sensitive filesystems treat `A.ts` and `a.ts`
// as different files.
fn normalize_path(path: &Path) -> Result<String, SourceFileError> {
    let s = path.to_str().ok_or(SourceFileError::InvalidUtf8)?;

    let normalized = s.replace('\\', "/").trim_start_matches("./").to_string();

    Ok(normalized)
}

/// Handle naming the codebase the embeddings source should search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodebaseId(String);

impl CodebaseId {
    pub fn new(name: impl Into<String>) -> Self {
        CodebaseId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `sha256:<hex>` digest over a sequence of length-prefixed parts.
///
/// Parts are length-prefixed so that `["ab", "c"]` and `["a", "bc"]` differ.
pub(crate) fn digest_parts<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }

    let hash = hasher.finalize();
    format!("sha256:{}", hex::encode(hash))
}
