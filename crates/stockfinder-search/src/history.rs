//! Capped, case-insensitively de-duplicated list of past queries.
//!
//! The whole list lives under one key in the persistent key-value store and
//! is read, mutated, and written back as a unit. Persistence failures are
//! logged and swallowed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockfinder_core::PersistentKeyValueStore;
use tokio::sync::Mutex;

pub const DEFAULT_HISTORY_KEY: &str = "search_history";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    pub timestamp: DateTime<Utc>,
}

pub struct SearchHistoryStore {
    store: Arc<dyn PersistentKeyValueStore>,
    key: String,
    max_entries: usize,
    /// Serializes read-modify-write cycles across interleaved tasks.
    write_lock: Mutex<()>,
}

impl SearchHistoryStore {
    #[must_use]
    pub fn new(store: Arc<dyn PersistentKeyValueStore>, max_entries: usize) -> Self {
        Self {
            store,
            key: DEFAULT_HISTORY_KEY.to_string(),
            max_entries: max_entries.max(1),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Prepend `query`, dropping any case-insensitive duplicate and truncating
    /// to the cap. Blank queries are ignored.
    pub async fn record(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        let _guard = self.write_lock.lock().await;
        let Some(entries) = self.load().await else {
            tracing::warn!(query, "skipping history update; stored history unreadable");
            return;
        };
        let updated = push_entry(entries, query, Utc::now(), self.max_entries);
        self.save(&updated).await;
    }

    /// Queries, most recent first.
    pub async fn list(&self) -> Vec<String> {
        self.entries()
            .await
            .into_iter()
            .map(|entry| entry.query)
            .collect()
    }

    /// At most `limit` queries, most recent first.
    pub async fn recent(&self, limit: usize) -> Vec<String> {
        let mut queries = self.list().await;
        queries.truncate(limit);
        queries
    }

    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.load().await.unwrap_or_default()
    }

    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.store.remove(&self.key).await {
            tracing::warn!(error = %e, "failed to clear search history");
        }
    }

    /// `None` when the backing store failed; corrupt payloads read as empty.
    async fn load(&self) -> Option<Vec<HistoryEntry>> {
        match self.store.read(&self.key).await {
            Ok(None) => Some(Vec::new()),
            Ok(Some(raw)) => match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding corrupt search history");
                    Some(Vec::new())
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to read search history");
                None
            }
        }
    }

    async fn save(&self, entries: &[HistoryEntry]) {
        let payload = match serde_json::to_string(entries) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize search history");
                return;
            }
        };
        if let Err(e) = self.store.write(&self.key, &payload).await {
            tracing::warn!(error = %e, "failed to persist search history");
        }
    }
}

fn push_entry(
    mut entries: Vec<HistoryEntry>,
    query: &str,
    timestamp: DateTime<Utc>,
    max_entries: usize,
) -> Vec<HistoryEntry> {
    let folded = query.to_lowercase();
    entries.retain(|entry| entry.query.to_lowercase() != folded);
    entries.insert(
        0,
        HistoryEntry {
            query: query.to_string(),
            timestamp,
        },
    );
    entries.truncate(max_entries);
    entries
}
