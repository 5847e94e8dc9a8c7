pub mod history;
pub mod snippet;

pub use crate::types::identifiers::SourceFile;
pub use history::{EditHistory, HistoryDocument};
pub use snippet::ReferenceSnippet;
