//! Database operations for the `items` table.

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use rust_decimal::Decimal;
use sqlx::PgPool;
use stockfinder_core::{Item, ItemIndexQuery, QueryError, StoreRef};

/// A row from the `items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    /// Store reference as submitted; may carry the provisional marker.
    pub store_ref: String,
    pub image_url: Option<String>,
    pub shelf_position: Option<String>,
    pub price: Option<Decimal>,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub report_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            name: row.name,
            category: row.category,
            store_id: StoreRef::parse(&row.store_ref),
            image_url: row.image_url,
            shelf_position: row.shelf_position,
            price: row.price,
            verified: row.verified,
            verified_at: row.verified_at,
            // CHECK (report_count >= 0) keeps this in range.
            report_count: u32::try_from(row.report_count).unwrap_or(0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Escape `ILIKE` wildcards so user input only ever matches literally.
#[must_use]
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Items whose name or category contains `query`, case-insensitively.
///
/// Ordered by name, then id.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn search_items_by_text(pool: &PgPool, query: &str) -> Result<Vec<ItemRow>, sqlx::Error> {
    let pattern = format!("%{}%", escape_like(query.trim()));
    sqlx::query_as::<_, ItemRow>(
        "SELECT id, name, category, store_ref, image_url, shelf_position, price, \
                verified, verified_at, report_count, created_at, updated_at \
         FROM items \
         WHERE name ILIKE $1 OR category ILIKE $1 \
         ORDER BY name, id",
    )
    .bind(pattern)
    .fetch_all(pool)
    .await
}

/// [`ItemIndexQuery`] backed by the `items` table.
#[derive(Debug, Clone)]
pub struct PgItemIndex {
    pool: PgPool,
}

impl PgItemIndex {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ItemIndexQuery for PgItemIndex {
    fn search_by_text<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Vec<Item>, QueryError>> {
        async move {
            let rows = search_items_by_text(&self.pool, query)
                .await
                .map_err(|e| QueryError::ItemIndex(e.to_string()))?;
            Ok(rows.into_iter().map(Item::from).collect())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_escapes_wildcards_and_backslash() {
        assert_eq!(escape_like("milk"), "milk");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\"), "c:\\\\");
    }

    #[test]
    fn row_keeps_provisional_store_reference() {
        let row = ItemRow {
            id: "i-1".to_string(),
            name: "Milk".to_string(),
            category: None,
            store_ref: "virtual_S1".to_string(),
            image_url: None,
            shelf_position: None,
            price: Some(Decimal::new(249, 2)),
            verified: true,
            verified_at: None,
            report_count: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let item = Item::from(row);
        assert!(item.store_id.is_provisional());
        assert_eq!(item.store_id.id().as_str(), "S1");
        assert_eq!(item.report_count, 3);
    }
}
