//! Reference-context assembly for code completion.
//!
//! `completion-context` takes the ranked snippets produced by an embeddings
//! source and a local-editor source and merges them into one context that fits a
//! character budget, holds at most one snippet per file, and keeps embeddings
//! matches ahead of local ones. Assembly is deterministic: identical inputs
//! always produce identical contexts.

pub mod assembly;
pub mod config;
pub mod retrieval;
pub mod snippet;
pub mod types;

pub use assembly::ContextAssembler;
pub use config::{AssemblerConfig, FailurePolicy};
pub use snippet::ReferenceSnippet;
pub use types::{AssemblyRequest, AssemblyResult, InclusionSummary, RetrievalSource};
