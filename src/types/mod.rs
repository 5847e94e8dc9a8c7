pub mod assembly;
pub mod identifiers;

pub use assembly::{
    AssemblyError, AssemblyRequest, AssemblyResult, AssemblyStats, InclusionSummary,
    RetrievalSource,
};
pub use identifiers::{CodebaseId, SourceFile, SourceFileError};
