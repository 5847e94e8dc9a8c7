use std::collections::HashSet;

use crate::assembly::measure::LengthMeter;
use crate::snippet::ReferenceSnippet;
use crate::types::identifiers::SourceFile;

/// Outcome of offering one candidate to a [`ContextMerger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    Accepted,
    /// A snippet from the same file was already offered.
    Duplicate,
    /// Accepting it would push the context past the budget.
    OverBudget,
}

/// Single-pass accumulator enforcing the character budget and per-file uniqueness.
pub struct ContextMerger<'m, M> {
    meter: &'m M,
    budget: usize,
    seen: HashSet<SourceFile>,
    context: Vec<ReferenceSnippet>,
    chars_used: usize,
    rejected_duplicate: usize,
    rejected_over_budget: usize,
}

impl<'m, M: LengthMeter> ContextMerger<'m, M> {
    pub fn new(budget: usize, meter: &'m M) -> Self {
        Self {
            meter,
            budget,
            seen: HashSet::new(),
            context: Vec::new(),
            chars_used: 0,
            rejected_duplicate: 0,
            rejected_over_budget: 0,
        }
    }

    pub fn accept(&mut self, snippet: ReferenceSnippet) -> Acceptance {
        // The file counts as used once offered, even if the budget check below
        // rejects it: a later snapshot of the same file must not get in.
        if !self.seen.insert(snippet.file_name.clone()) {
            self.rejected_duplicate += 1;
            tracing::trace!(file = %snippet.file_name, "skipping duplicate snippet");
            return Acceptance::Duplicate;
        }

        let len = self.meter.measure(&snippet.content);
        if self.chars_used.saturating_add(len) > self.budget {
            self.rejected_over_budget += 1;
            tracing::trace!(
                file = %snippet.file_name,
                len,
                chars_used = self.chars_used,
                budget = self.budget,
                "snippet exceeds remaining budget"
            );
            return Acceptance::OverBudget;
        }

        self.chars_used += len;
        self.context.push(snippet);
        Acceptance::Accepted
    }

    /// Offer every candidate in order, returning how many were accepted.
    /// An over-budget candidate never stops the scan.
    pub fn accept_all(&mut self, candidates: impl IntoIterator<Item = ReferenceSnippet>) -> usize {
        let mut accepted = 0;
        for snippet in candidates {
            if self.accept(snippet) == Acceptance::Accepted {
                accepted += 1;
            }
        }
        accepted
    }

    pub fn chars_used(&self) -> usize {
        self.chars_used
    }

    pub fn finish(self) -> MergedContext {
        MergedContext {
            context: self.context,
            chars_used: self.chars_used,
            rejected_duplicate: self.rejected_duplicate,
            rejected_over_budget: self.rejected_over_budget,
        }
    }
}

pub struct MergedContext {
    pub context: Vec<ReferenceSnippet>,
    pub chars_used: usize,
    pub rejected_duplicate: usize,
    pub rejected_over_budget: usize,
}

pub struct MergeOutcome {
    pub merged: MergedContext,
    pub embeddings_accepted: usize,
    pub local_accepted: usize,
}

/// Merge both ranked sequences under `budget`: embeddings first, then local,
/// each in the order given.
pub fn merge_matches<M: LengthMeter>(
    embeddings: Vec<ReferenceSnippet>,
    local: Vec<ReferenceSnippet>,
    budget: usize,
    meter: &M,
) -> MergeOutcome {
    let mut merger = ContextMerger::new(budget, meter);

    let embeddings_accepted = merger.accept_all(embeddings);
    let local_accepted = merger.accept_all(local);

    debug_assert!(merger.chars_used() <= budget);

    MergeOutcome {
        merged: merger.finish(),
        embeddings_accepted,
        local_accepted,
    }
}
