//! Contracts for the external collaborators the search engine depends on.
//!
//! Methods return boxed futures so implementations can be held as trait
//! objects and shared across tasks.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::{Item, StoreRecord, StoreStatus};

/// An upstream item or store query failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("item index query failed: {0}")]
    ItemIndex(String),
    #[error("store directory query failed: {0}")]
    StoreDirectory(String),
}

/// A key-value read or write against local persistence failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("key-value {operation} failed for '{key}': {reason}")]
pub struct PersistenceError {
    pub operation: &'static str,
    pub key: String,
    pub reason: String,
}

impl PersistenceError {
    pub fn new(operation: &'static str, key: &str, reason: impl Into<String>) -> Self {
        Self {
            operation,
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Free-text match against item names and categories.
///
/// Matching semantics (substring, fuzzy, ...) belong to the implementation.
pub trait ItemIndexQuery: Send + Sync {
    fn search_by_text<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Vec<Item>, QueryError>>;
}

/// Store records filtered by approval status.
pub trait StoreDirectoryQuery: Send + Sync {
    fn list_by_status(
        &self,
        status: StoreStatus,
    ) -> BoxFuture<'_, Result<Vec<StoreRecord>, QueryError>>;
}

/// Whole-value string storage that survives process restarts.
pub trait PersistentKeyValueStore: Send + Sync {
    fn read<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, PersistenceError>>;

    fn write<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, Result<(), PersistenceError>>;

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), PersistenceError>>;
}
