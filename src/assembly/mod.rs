pub mod measure;
pub mod merge;

use crate::config::{AssemblerConfig, FailurePolicy};
use crate::retrieval::{EmbeddingsSource, LocalSource, RetrievalError};
use crate::snippet::ReferenceSnippet;
use crate::types::assembly::{
    AssemblyError, AssemblyRequest, AssemblyResult, AssemblyStats, InclusionSummary,
    RetrievalSource,
};
pub use measure::{CharCount, LengthMeter, Utf16Len};
pub use merge::{merge_matches, Acceptance, ContextMerger, MergeOutcome, MergedContext};

/// Builds the reference context for one completion request.
///
/// Holds no per-request state: every call to [`assemble_context`] starts from
/// an empty context, so one assembler can serve concurrent requests.
///
/// [`assemble_context`]: ContextAssembler::assemble_context
pub struct ContextAssembler<E, L, M = Utf16Len> {
    embeddings: E,
    local: L,
    meter: M,
    on_source_failure: FailurePolicy,
}

impl<E, L> ContextAssembler<E, L, Utf16Len> {
    /// Snippet length is charged in UTF-16 code units, the unit editor hosts
    /// use for `max_chars`. Use [`with_meter`](Self::with_meter) to change it.
    pub fn new(embeddings: E, local: L) -> Self {
        Self {
            embeddings,
            local,
            meter: Utf16Len,
            on_source_failure: FailurePolicy::default(),
        }
    }

    pub fn from_config(embeddings: E, local: L, config: &AssemblerConfig) -> Self {
        Self {
            on_source_failure: config.on_source_failure,
            ..Self::new(embeddings, local)
        }
    }
}

impl<E, L, M> ContextAssembler<E, L, M>
where
    E: EmbeddingsSource,
    L: LocalSource,
    M: LengthMeter,
{
    pub fn with_meter<N: LengthMeter>(self, meter: N) -> ContextAssembler<E, L, N> {
        ContextAssembler {
            embeddings: self.embeddings,
            local: self.local,
            meter,
            on_source_failure: self.on_source_failure,
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_source_failure = policy;
        self
    }

    pub fn embeddings(&self) -> &E {
        &self.embeddings
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    /// Retrieve from both sources and merge under the request's budget.
    ///
    /// The two retrievals run concurrently. Dropping the returned future
    /// cancels both.
    pub async fn assemble_context(
        &self,
        request: &AssemblyRequest,
    ) -> Result<AssemblyResult, AssemblyError> {
        // 1. Retrieval Phase
        let embeddings = async {
            if request.embeddings_enabled {
                self.embeddings.fetch_embeddings_matches(request).await
            } else {
                Ok(Vec::new())
            }
        };
        let local = self.local.fetch_local_matches(request);
        let (embeddings, local) = tokio::join!(embeddings, local);

        let mut degraded_sources = Vec::new();
        let embeddings =
            self.settle(RetrievalSource::Embeddings, embeddings, &mut degraded_sources)?;
        let local = self.settle(RetrievalSource::Local, local, &mut degraded_sources)?;

        let embeddings_considered = embeddings.len();
        let local_considered = local.len();

        // 2. Merge Phase
        let MergeOutcome {
            merged,
            embeddings_accepted,
            local_accepted,
        } = merge_matches(embeddings, local, request.max_chars, &self.meter);

        // 3. Summary Phase
        let inclusion_summary = InclusionSummary::from_counts(embeddings_accepted, local_accepted);

        tracing::debug!(
            embeddings = embeddings_accepted,
            local = local_accepted,
            chars_used = merged.chars_used,
            budget = request.max_chars,
            "assembled completion context"
        );

        let stats = AssemblyStats {
            budget: request.max_chars,
            chars_used: merged.chars_used,
            embeddings_considered,
            local_considered,
            rejected_duplicate: merged.rejected_duplicate,
            rejected_over_budget: merged.rejected_over_budget,
            degraded_sources,
        };

        Ok(AssemblyResult {
            context: merged.context,
            inclusion_summary,
            stats,
        })
    }

    fn settle(
        &self,
        origin: RetrievalSource,
        result: Result<Vec<ReferenceSnippet>, RetrievalError>,
        degraded: &mut Vec<RetrievalSource>,
    ) -> Result<Vec<ReferenceSnippet>, AssemblyError> {
        match result {
            Ok(matches) => Ok(matches),
            Err(error) => match self.on_source_failure {
                FailurePolicy::Abort => Err(AssemblyError::Retrieval { origin, error }),
                FailurePolicy::UseEmpty => {
                    tracing::warn!(
                        source = %origin,
                        error = %error,
                        "retrieval failed, continuing without it"
                    );
                    degraded.push(origin);
                    Ok(Vec::new())
                }
            },
        }
    }
}
