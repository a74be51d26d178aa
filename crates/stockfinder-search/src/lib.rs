//! Location-aware item search.
//!
//! Joins text-matched items against the approved store set, annotates each
//! result with its geodesic distance from the user, ranks by trust and
//! proximity, and fronts the whole pipeline with a TTL cache and in-flight
//! request de-duplication.

pub mod approved;
pub mod cache;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod geodesic;
pub mod history;
pub mod join;
pub mod memory;
pub mod rank;
pub mod types;

pub use approved::ApprovedStoreIndex;
pub use cache::{cache_key, normalize_query, ResultCache};
pub use config::SearchConfig;
pub use dedup::RequestDeduplicator;
pub use engine::SearchEngine;
pub use error::SearchError;
pub use geodesic::{distance_km, haversine_km, vincenty_km};
pub use history::{HistoryEntry, SearchHistoryStore};
pub use join::join_items;
pub use memory::MemoryKeyValueStore;
pub use rank::{compare_results, rank_results};
pub use types::SearchResult;
