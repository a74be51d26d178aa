//! Search command handlers for the CLI.

use std::fmt::Write as _;
use std::sync::Arc;

use stockfinder_core::{AppConfig, Coordinates};
use stockfinder_db::{PgItemIndex, PgKeyValueStore, PgStoreDirectory};
use stockfinder_search::{SearchConfig, SearchEngine, SearchResult};

pub(crate) fn build_engine(pool: &sqlx::PgPool, config: &AppConfig) -> SearchEngine {
    SearchEngine::new(
        Arc::new(PgItemIndex::new(pool.clone())),
        Arc::new(PgStoreDirectory::new(pool.clone())),
        Arc::new(PgKeyValueStore::new(pool.clone())),
        &SearchConfig::from_app_config(config),
    )
}

/// Run one search and print the ranked results.
///
/// # Errors
///
/// Returns an error if the coordinates are out of range or the search is
/// unavailable.
pub(crate) async fn run_search(
    engine: &SearchEngine,
    query: &str,
    lat: Option<f64>,
    lng: Option<f64>,
    json: bool,
) -> anyhow::Result<()> {
    let location = match (lat, lng) {
        (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)?),
        _ => None,
    };

    let results = engine.search_items(query, location).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("no items found for '{}'", query.trim());
        return Ok(());
    }

    for (rank, result) in results.iter().enumerate() {
        println!("{:>3}. {}", rank + 1, format_result_line(result));
    }
    Ok(())
}

pub(crate) async fn run_recent(engine: &SearchEngine, limit: Option<usize>) {
    let queries = engine.recent_queries(limit).await;
    if queries.is_empty() {
        println!("no recent searches");
        return;
    }
    for query in queries {
        println!("{query}");
    }
}

/// One-line summary: name, store, shelf, distance, trust markers.
pub(crate) fn format_result_line(result: &SearchResult) -> String {
    let mut line = format!("{} @ {}", result.item.name, result.store_name);
    if !result.store_address.is_empty() {
        let _ = write!(line, " ({})", result.store_address);
    }
    if let Some(shelf) = &result.item.shelf_position {
        let _ = write!(line, ", {shelf}");
    }
    if let Some(price) = result.item.price {
        let _ = write!(line, ", ${price}");
    }
    let _ = write!(line, " | {}", fmt_distance(result.distance_km));
    if result.item.verified {
        line.push_str(" | verified");
    }
    if result.item.report_count > 0 {
        let _ = write!(line, " | {} report(s)", result.item.report_count);
    }
    line
}

/// Format a distance for display, returning `"\u{2014}"` when unknown.
pub(crate) fn fmt_distance(distance_km: Option<f64>) -> String {
    match distance_km {
        Some(km) if km < 1.0 => format!("{:.0} m", km * 1000.0),
        Some(km) => format!("{km:.1} km"),
        None => "\u{2014}".to_string(),
    }
}
