use serde::{Deserialize, Serialize};

use crate::types::identifiers::SourceFile;

/// A document the user recently viewed or edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDocument {
    pub file_name: SourceFile,
    pub content: String,
}

/// Recently-viewed documents, most recent first, at most one entry per file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditHistory {
    documents: Vec<HistoryDocument>,
}

impl EditHistory {
    pub fn new() -> Self {
        EditHistory {
            documents: Vec::new(),
        }
    }

    /// Record a visit to `file_name`. An existing entry for the same file is
    /// replaced and moves to the front.
    pub fn record(&mut self, file_name: impl Into<SourceFile>, content: impl Into<String>) {
        let file_name = file_name.into();
        self.documents.retain(|doc| doc.file_name != file_name);
        self.documents.insert(
            0,
            HistoryDocument {
                file_name,
                content: content.into(),
            },
        );
    }

    /// Drop everything but the `max` most recent documents.
    pub fn truncate(&mut self, max: usize) {
        self.documents.truncate(max);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryDocument> {
        self.documents.iter()
    }
}
