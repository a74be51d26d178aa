use stockfinder_core::QueryError;
use thiserror::Error;

/// Errors surfaced by [`crate::SearchEngine`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    /// An upstream collaborator failed on the primary path. Triggers the
    /// fallback path and is never returned from `search_items` itself.
    #[error("upstream query failed: {0}")]
    Upstream(#[from] QueryError),

    /// Both the primary and fallback paths failed.
    #[error("search temporarily unavailable")]
    Unavailable,
}

impl From<tokio::task::JoinError> for SearchError {
    fn from(e: tokio::task::JoinError) -> Self {
        tracing::error!(error = %e, "search task did not complete");
        Self::Unavailable
    }
}
