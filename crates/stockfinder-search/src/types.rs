//! Result type produced by the search pipeline.

use serde::{Deserialize, Serialize};
use stockfinder_core::{Coordinates, Item, StoreId};

/// An item merged with the approved store that stocks it.
///
/// Built fresh per query and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub item: Item,
    /// Canonical id of the store the item resolved to.
    pub resolved_store_id: StoreId,
    pub store_name: String,
    pub store_address: String,
    pub store_coordinates: Option<Coordinates>,
    /// `None` when either side has no usable location. Distinct from `Some(0.0)`.
    pub distance_km: Option<f64>,
}
