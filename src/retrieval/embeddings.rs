//! Cache-first embeddings source.
//!
//! Lookups never wait on the backend: a request is answered from the in-memory
//! cache (possibly with nothing), and a missing or stale entry schedules one
//! background refresh on the current tokio runtime. The next request with the
//! same query sees the refreshed matches.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::runtime::Handle;

use crate::config::AssemblerConfig;
use crate::retrieval::{EmbeddingsSource, RetrievalError};
use crate::snippet::ReferenceSnippet;
use crate::types::identifiers::{digest_parts, CodebaseId};
use crate::types::AssemblyRequest;

/// What gets sent to the embeddings backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingsQuery {
    pub codebase: CodebaseId,
    pub text: String,
}

impl EmbeddingsQuery {
    /// The trailing `query_lines` non-blank lines of the prefix.
    pub fn from_request(request: &AssemblyRequest, query_lines: usize) -> Self {
        let lines: Vec<&str> = request
            .prefix
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        let start = lines.len().saturating_sub(query_lines);

        Self {
            codebase: request.codebase.clone(),
            text: lines[start..].join("\n"),
        }
    }

    pub fn cache_key(&self) -> String {
        digest_parts([self.codebase.as_str(), self.text.as_str()])
    }
}

/// Semantic search over a codebase, e.g. a remote embeddings service.
#[async_trait]
pub trait EmbeddingsBackend: Send + Sync + 'static {
    async fn search(&self, query: &EmbeddingsQuery)
        -> Result<Vec<ReferenceSnippet>, RetrievalError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    matches: Vec<ReferenceSnippet>,
    refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    in_flight: HashSet<String>,
}

impl CacheState {
    /// Insert `entry`, then drop expired entries and the oldest survivors until
    /// at most `max_entries` remain. The inserted entry is never evicted.
    fn insert(&mut self, key: String, entry: CacheEntry, max_entries: usize, max_age: Duration) {
        let now = entry.refreshed_at;
        self.entries.insert(key.clone(), entry);

        self.entries.retain(|k, e| {
            *k == key || (now - e.refreshed_at).to_std().map_or(true, |age| age <= max_age)
        });

        while self.entries.len() > max_entries.max(1) {
            let oldest = self
                .entries
                .iter()
                .filter(|(k, _)| **k != key)
                .min_by(|(ka, a), (kb, b)| a.refreshed_at.cmp(&b.refreshed_at).then(ka.cmp(kb)))
                .map(|(k, _)| k.clone());
            match oldest {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

/// Clears a key's in-flight mark when the refresh task ends, including by panic.
struct InFlightGuard {
    state: Arc<Mutex<CacheState>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.state).in_flight.remove(&self.key);
    }
}

pub struct CachedEmbeddingsSource<B> {
    backend: Arc<B>,
    state: Arc<Mutex<CacheState>>,
    query_lines: usize,
    max_age: Duration,
    max_entries: usize,
}

impl<B> Clone for CachedEmbeddingsSource<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            state: Arc::clone(&self.state),
            query_lines: self.query_lines,
            max_age: self.max_age,
            max_entries: self.max_entries,
        }
    }
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    // Cache contents stay consistent across a panicking refresh; keep serving.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<B: EmbeddingsBackend> CachedEmbeddingsSource<B> {
    pub fn new(backend: B) -> Self {
        let defaults = AssemblerConfig::v0();
        Self::from_config(backend, &defaults)
    }

    pub fn from_config(backend: B, config: &AssemblerConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            state: Arc::new(Mutex::new(CacheState::default())),
            query_lines: config.embeddings_query_lines,
            max_age: Duration::from_secs(config.embeddings_max_age_secs),
            max_entries: config.embeddings_max_entries,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Cap on cached queries. Raised to at least one.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Query the backend now and store the result, bypassing staleness checks.
    pub async fn refresh(
        &self,
        request: &AssemblyRequest,
    ) -> Result<Vec<ReferenceSnippet>, RetrievalError> {
        let query = EmbeddingsQuery::from_request(request, self.query_lines);
        let matches = self.backend.search(&query).await?;

        let entry = CacheEntry {
            matches: matches.clone(),
            refreshed_at: Utc::now(),
        };
        lock(&self.state).insert(query.cache_key(), entry, self.max_entries, self.max_age);
        Ok(matches)
    }

    /// When the cached matches for `request` were last refreshed.
    pub fn refreshed_at(&self, request: &AssemblyRequest) -> Option<DateTime<Utc>> {
        let key = EmbeddingsQuery::from_request(request, self.query_lines).cache_key();
        lock(&self.state).entries.get(&key).map(|e| e.refreshed_at)
    }

    pub fn cached_queries(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn clear(&self) {
        lock(&self.state).entries.clear();
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        match (now - entry.refreshed_at).to_std() {
            Ok(age) => age <= self.max_age,
            // Clock moved backwards.
            Err(_) => true,
        }
    }

    fn spawn_refresh(&self, key: String, query: EmbeddingsQuery) -> Result<(), RetrievalError> {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                lock(&self.state).in_flight.remove(&key);
                return Err(RetrievalError::NoRuntime);
            }
        };

        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.state);
        let (max_entries, max_age) = (self.max_entries, self.max_age);
        handle.spawn(async move {
            let _in_flight = InFlightGuard {
                state: Arc::clone(&shared),
                key: key.clone(),
            };
            let result = backend.search(&query).await;

            let mut state = lock(&shared);
            match result {
                Ok(matches) => {
                    tracing::debug!(
                        codebase = query.codebase.as_str(),
                        matches = matches.len(),
                        "refreshed embeddings cache"
                    );
                    let entry = CacheEntry {
                        matches,
                        refreshed_at: Utc::now(),
                    };
                    state.insert(key, entry, max_entries, max_age);
                }
                Err(err) => {
                    tracing::warn!(
                        codebase = query.codebase.as_str(),
                        error = %err,
                        "embeddings cache refresh failed"
                    );
                }
            }
        });
        Ok(())
    }
}

#[async_trait]
impl<B: EmbeddingsBackend> EmbeddingsSource for CachedEmbeddingsSource<B> {
    async fn fetch_embeddings_matches(
        &self,
        request: &AssemblyRequest,
    ) -> Result<Vec<ReferenceSnippet>, RetrievalError> {
        let query = EmbeddingsQuery::from_request(request, self.query_lines);
        if query.text.is_empty() {
            return Ok(Vec::new());
        }

        let key = query.cache_key();
        let now = Utc::now();
        let (cached, needs_refresh) = {
            let mut state = lock(&self.state);
            let (cached, fresh) = match state.entries.get(&key) {
                Some(entry) => (entry.matches.clone(), self.is_fresh(entry, now)),
                None => (Vec::new(), false),
            };
            let needs_refresh = !fresh && state.in_flight.insert(key.clone());
            (cached, needs_refresh)
        };

        if needs_refresh {
            if let Err(err) = self.spawn_refresh(key, query) {
                tracing::warn!(error = %err, "serving embeddings matches without refresh");
            }
        }

        Ok(cached)
    }
}
