//! Time- and size-bounded memo of ranked result sets.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use stockfinder_core::Coordinates;
use tokio::time::Instant;

use crate::types::SearchResult;

/// Trim and lower-case a query.
#[must_use]
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Cache and de-duplication key for a query at an optional location.
///
/// Identical text at different coordinates yields different keys because the
/// distance annotations differ.
#[must_use]
pub fn cache_key(query: &str, location: Option<Coordinates>) -> String {
    let normalized = normalize_query(query);
    match location {
        Some(at) => format!("{normalized}@{:.6},{:.6}", at.latitude, at.longitude),
        None => normalized,
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: Vec<SearchResult>,
    created_at: Instant,
    seq: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Insertion sequence -> key, oldest first.
    order: BTreeMap<u64, String>,
    next_seq: u64,
}

impl CacheState {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.seq);
        Some(entry)
    }
}

/// Results keyed by normalized query (+ location), with a fixed TTL and a cap
/// on entry count. Expired entries are dropped lazily on `get`; when the cap is
/// exceeded the oldest-created entry goes first.
#[derive(Debug)]
pub struct ResultCache {
    ttl: Duration,
    max_entries: usize,
    state: Mutex<CacheState>,
}

impl ResultCache {
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Cached results, or `None` on a miss. An expired entry is removed and
    /// reported as a miss.
    pub fn get(&self, query: &str, location: Option<Coordinates>) -> Option<Vec<SearchResult>> {
        let key = cache_key(query, location);
        let mut state = self.lock();
        let entry = state.entries.get(&key)?;
        if entry.created_at.elapsed() <= self.ttl {
            return Some(entry.value.clone());
        }
        state.remove(&key);
        tracing::debug!(cache_key = %key, "evicted expired cache entry");
        None
    }

    pub fn set(&self, query: &str, location: Option<Coordinates>, value: Vec<SearchResult>) {
        let key = cache_key(query, location);
        let mut state = self.lock();
        state.remove(&key);

        let seq = state.next_seq;
        state.next_seq += 1;
        state.order.insert(seq, key.clone());
        state.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
                seq,
            },
        );

        while state.entries.len() > self.max_entries {
            let Some((_, oldest)) = state.order.pop_first() else {
                break;
            };
            state.entries.remove(&oldest);
            tracing::debug!(cache_key = %oldest, "evicted oldest cache entry at capacity");
        }
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        let dropped = state.entries.len();
        state.entries.clear();
        state.order.clear();
        tracing::info!(dropped, "result cache cleared");
    }

    /// Number of stored entries, including expired ones not yet looked up.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
