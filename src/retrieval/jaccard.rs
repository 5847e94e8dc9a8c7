use std::cmp::Ordering;
use std::collections::HashSet;

use async_trait::async_trait;

use crate::config::AssemblerConfig;
use crate::retrieval::{LocalSource, RetrievalError};
use crate::snippet::{HistoryDocument, ReferenceSnippet};
use crate::types::AssemblyRequest;

/// Local-editor heuristic: the window of each recently viewed file whose words
/// overlap most with the lines just above the cursor.
#[derive(Debug, Clone)]
pub struct JaccardWindowSource {
    window_size: usize,
    max_matches: usize,
}

/// The best window found in one document.
#[derive(Debug, Clone)]
struct WindowMatch<'a> {
    document: &'a HistoryDocument,
    start: usize,
    end: usize,
    score: f32,
}

impl JaccardWindowSource {
    /// `window_size` is in lines. Both limits are raised to at least one.
    pub fn new(window_size: usize, max_matches: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            max_matches: max_matches.max(1),
        }
    }

    pub fn from_config(config: &AssemblerConfig) -> Self {
        Self::new(config.jaccard_window_size, config.max_local_matches)
    }

    /// Ranked matches: score descending, then file name ascending.
    pub fn best_matches(&self, request: &AssemblyRequest) -> Vec<ReferenceSnippet> {
        let prefix_lines: Vec<&str> = request.prefix.lines().collect();
        let target_start = prefix_lines.len().saturating_sub(self.window_size);
        let target = word_set(prefix_lines[target_start..].iter().copied());
        if target.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<WindowMatch<'_>> = request
            .history
            .iter()
            .filter(|doc| doc.file_name != request.current_file)
            .filter_map(|doc| self.best_window(doc, &target))
            .filter(|m| m.score > 0.0)
            .collect();

        matches.sort_by(|a, b| {
            let score_cmp = b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal);
            if score_cmp != Ordering::Equal {
                score_cmp
            } else {
                a.document.file_name.cmp(&b.document.file_name)
            }
        });
        matches.truncate(self.max_matches);

        matches
            .into_iter()
            .map(|m| {
                let lines: Vec<&str> = m.document.content.lines().collect();
                ReferenceSnippet::new(
                    m.document.file_name.clone(),
                    lines[m.start..m.end].join("\n"),
                )
            })
            .collect()
    }

    fn best_window<'a>(
        &self,
        document: &'a HistoryDocument,
        target: &HashSet<String>,
    ) -> Option<WindowMatch<'a>> {
        let lines: Vec<&str> = document.content.lines().collect();
        if lines.is_empty() {
            return None;
        }

        let last_start = lines.len().saturating_sub(self.window_size);
        let mut best: Option<WindowMatch<'a>> = None;
        for start in 0..=last_start {
            let end = (start + self.window_size).min(lines.len());
            let score = jaccard(target, &word_set(lines[start..end].iter().copied()));
            // Earliest window wins ties.
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(WindowMatch {
                    document,
                    start,
                    end,
                    score,
                });
            }
        }
        best
    }
}

#[async_trait]
impl LocalSource for JaccardWindowSource {
    async fn fetch_local_matches(
        &self,
        request: &AssemblyRequest,
    ) -> Result<Vec<ReferenceSnippet>, RetrievalError> {
        Ok(self.best_matches(request))
    }
}

/// Lowercased identifier-ish words.
fn word_set<'a>(lines: impl Iterator<Item = &'a str>) -> HashSet<String> {
    lines
        .flat_map(|line| line.split(|c: char| !(c.is_alphanumeric() || c == '_')))
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let score = intersection as f32 / union as f32;
    debug_assert!((0.0..=1.0).contains(&score), "score {score} out of range [0.0, 1.0]");
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> HashSet<String> {
        word_set(text.lines())
    }

    #[test]
    fn word_set_splits_on_punctuation_and_lowercases() {
        let set = words("fn parse_config(Path) -> Config {");
        let expected: HashSet<String> = ["fn", "parse_config", "path", "config"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn jaccard_bounds() {
        assert_eq!(jaccard(&words("a b"), &words("a b")), 1.0);
        assert_eq!(jaccard(&words("a"), &words("b")), 0.0);
        assert_eq!(jaccard(&words(""), &words("")), 0.0);
        assert!((jaccard(&words("a b"), &words("b c")) - 1.0 / 3.0).abs() < f32::EPSILON);
    }
}
