use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::StoreRef;

/// An item listing as held by the item index. Read-only to the search engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Owning store; may carry the provisional marker.
    pub store_id: StoreRef,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Free-form shelf location, e.g. `"Aisle 4, top shelf"`.
    #[serde(default)]
    pub shelf_position: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
    /// Outstanding user reports against this listing.
    #[serde(default)]
    pub report_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
