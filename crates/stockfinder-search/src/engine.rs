//! The public search entry point.
//!
//! A query runs in two stages. The primary stage goes through request
//! de-duplication and the result cache before touching the collaborators.
//! Only if it fails with [`SearchError::Upstream`] does the fallback stage
//! re-issue both collaborator queries directly, bypassing cache and
//! de-duplication. A fallback failure surfaces as [`SearchError::Unavailable`].

use std::sync::Arc;

use stockfinder_core::{
    Coordinates, ItemIndexQuery, PersistentKeyValueStore, QueryError, StoreDirectoryQuery,
    StoreStatus,
};

use crate::approved::ApprovedStoreIndex;
use crate::cache::{cache_key, ResultCache};
use crate::config::SearchConfig;
use crate::dedup::RequestDeduplicator;
use crate::error::SearchError;
use crate::history::SearchHistoryStore;
use crate::join::join_items;
use crate::rank::rank_results;
use crate::types::SearchResult;

struct Pipeline {
    items: Arc<dyn ItemIndexQuery>,
    stores: Arc<dyn StoreDirectoryQuery>,
    cache: ResultCache,
}

impl Pipeline {
    /// Query both collaborators, join against a freshly built approved index,
    /// and rank.
    async fn fetch_and_rank(
        &self,
        query: &str,
        user_location: Option<Coordinates>,
    ) -> Result<Vec<SearchResult>, QueryError> {
        let (items, stores) = tokio::try_join!(
            self.items.search_by_text(query),
            self.stores.list_by_status(StoreStatus::Approved),
        )?;
        let approved = ApprovedStoreIndex::build(stores);
        let joined = join_items(items, &approved, user_location);
        Ok(rank_results(&joined, query))
    }

    async fn cached_search(
        self: Arc<Self>,
        query: String,
        user_location: Option<Coordinates>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        if let Some(hit) = self.cache.get(&query, user_location) {
            tracing::debug!(query, results = hit.len(), "result cache hit");
            return Ok(hit);
        }
        let ranked = self.fetch_and_rank(&query, user_location).await?;
        self.cache.set(&query, user_location, ranked.clone());
        Ok(ranked)
    }
}

/// Location-aware item search with caching, de-duplication, and history.
///
/// Every instance owns its own cache, in-flight table, and history handle;
/// nothing is shared between engines except what the injected collaborators
/// share.
pub struct SearchEngine {
    pipeline: Arc<Pipeline>,
    dedup: RequestDeduplicator<Vec<SearchResult>, SearchError>,
    history: SearchHistoryStore,
    recent_limit: usize,
}

impl SearchEngine {
    #[must_use]
    pub fn new(
        items: Arc<dyn ItemIndexQuery>,
        stores: Arc<dyn StoreDirectoryQuery>,
        key_value: Arc<dyn PersistentKeyValueStore>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            pipeline: Arc::new(Pipeline {
                items,
                stores,
                cache: ResultCache::new(config.cache_ttl, config.cache_max_entries),
            }),
            dedup: RequestDeduplicator::new(),
            history: SearchHistoryStore::new(key_value, config.history_max)
                .with_key(config.history_key.clone()),
            recent_limit: config.recent_limit,
        }
    }

    /// Search for `query`, optionally measuring distance from `user_location`.
    ///
    /// A blank query returns an empty list without touching any collaborator.
    /// The query is recorded in history on success, even when no results match.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Unavailable`] when both the primary and the
    /// fallback stage fail.
    pub async fn search_items(
        &self,
        query: &str,
        user_location: Option<Coordinates>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let user_location = user_location.filter(|at| {
            let valid = at.is_valid();
            if !valid {
                tracing::warn!(location = ?at, "ignoring out-of-range user location");
            }
            valid
        });

        let results = match self.primary_stage(query, user_location).await {
            Ok(results) => results,
            Err(SearchError::Upstream(cause)) => {
                tracing::warn!(query, error = %cause, "primary search failed, trying fallback");
                self.fallback_stage(query, user_location).await?
            }
            Err(other) => return Err(other),
        };

        tracing::info!(query, results = results.len(), "search completed");
        self.history.record(query).await;
        Ok(results)
    }

    async fn primary_stage(
        &self,
        query: &str,
        user_location: Option<Coordinates>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let key = cache_key(query, user_location);
        let pipeline = Arc::clone(&self.pipeline);
        let owned_query = query.to_string();
        self.dedup
            .dedupe(&key, move || pipeline.cached_search(owned_query, user_location))
            .await
    }

    async fn fallback_stage(
        &self,
        query: &str,
        user_location: Option<Coordinates>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.pipeline
            .fetch_and_rank(query, user_location)
            .await
            .map_err(|e| {
                tracing::error!(query, error = %e, "fallback search failed");
                SearchError::Unavailable
            })
    }

    /// Recent queries, most recent first. `None` uses the configured default count.
    pub async fn recent_queries(&self, limit: Option<usize>) -> Vec<String> {
        self.history
            .recent(limit.unwrap_or(self.recent_limit))
            .await
    }

    pub async fn clear_history(&self) {
        self.history.clear().await;
    }

    pub fn clear_result_cache(&self) {
        self.pipeline.cache.clear();
    }

    /// Number of result sets currently held in the cache.
    #[must_use]
    pub fn cached_result_sets(&self) -> usize {
        self.pipeline.cache.len()
    }
}
