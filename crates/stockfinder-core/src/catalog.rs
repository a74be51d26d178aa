//! Seed catalog of stores and items, loaded from YAML.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, StoreId, StoreRef, StoreStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStore {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub owner_id: String,
    #[serde(default = "default_status")]
    pub status: StoreStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub store_id: StoreRef,
    pub image_url: Option<String>,
    pub shelf_position: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default)]
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub report_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub stores: Vec<CatalogStore>,
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

fn default_status() -> StoreStatus {
    StoreStatus::Pending
}

/// Load and validate a store/item catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<CatalogFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: CatalogFile =
        serde_yaml::from_str(&content).map_err(ConfigError::CatalogFileParse)?;

    validate_catalog(&catalog)?;

    Ok(catalog)
}

fn validate_catalog(catalog: &CatalogFile) -> Result<(), ConfigError> {
    let mut seen_stores = HashSet::new();
    for store in &catalog.stores {
        if store.id.as_str().trim().is_empty() {
            return Err(ConfigError::Validation(
                "store id must be non-empty".to_string(),
            ));
        }
        if store.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "store '{}' must have a non-empty name",
                store.id
            )));
        }
        if !seen_stores.insert(store.id.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate store id: '{}'",
                store.id
            )));
        }
    }

    let mut seen_items = HashSet::new();
    for item in &catalog.items {
        if item.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "item id must be non-empty".to_string(),
            ));
        }
        if item.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "item '{}' must have a non-empty name",
                item.id
            )));
        }
        if !seen_items.insert(item.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate item id: '{}'",
                item.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
