//! Joins text-matched items with the approved store index.

use stockfinder_core::{Coordinates, Item};

use crate::approved::ApprovedStoreIndex;
use crate::geodesic::distance_km;
use crate::types::SearchResult;

/// Attach store metadata to every item whose store is approved.
///
/// Items whose canonical store id is not in `approved` are dropped, however
/// well their text matched. `distance_km` is set only when `user_location`
/// is given and the store has a usable coordinate pair.
#[must_use]
pub fn join_items(
    items: Vec<Item>,
    approved: &ApprovedStoreIndex,
    user_location: Option<Coordinates>,
) -> Vec<SearchResult> {
    let matched = items.len();
    let results: Vec<SearchResult> = items
        .into_iter()
        .filter_map(|item| {
            let Some(store) = approved.get(item.store_id.id()) else {
                tracing::trace!(item_id = %item.id, store_id = %item.store_id, "dropping item from unapproved store");
                return None;
            };
            let store_coordinates = store.coordinates();
            if store_coordinates.is_none() && (store.latitude.is_some() || store.longitude.is_some()) {
                tracing::warn!(
                    store_id = %store.id,
                    latitude = ?store.latitude,
                    longitude = ?store.longitude,
                    "store has malformed coordinates; distance left unset"
                );
            }
            let distance_km = user_location
                .zip(store_coordinates)
                .map(|(user, at)| distance_km(user, at));

            Some(SearchResult {
                resolved_store_id: store.id.clone(),
                store_name: store.name.clone(),
                store_address: store.address.clone(),
                store_coordinates,
                distance_km,
                item,
            })
        })
        .collect();

    tracing::debug!(matched, joined = results.len(), "joined items with approved stores");
    results
}
