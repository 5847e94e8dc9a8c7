use serde::{Deserialize, Serialize};

use crate::types::identifiers::SourceFile;

/// One retrievable chunk of source text.
///
/// Field names match the embeddings search-result payload (`fileName`, `content`),
/// so backend responses deserialize straight into snippets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSnippet {
    pub file_name: SourceFile,
    pub content: String,
}

impl ReferenceSnippet {
    pub fn new(file_name: impl Into<SourceFile>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}
