use sqlx::PgPool;
use stockfinder_core::CatalogFile;

use crate::DbError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub stores: usize,
    pub items: usize,
}

/// Upsert stores and items from a catalog into the database.
///
/// Stores are written before items. All upserts run inside a single
/// transaction; if any operation fails the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_catalog(pool: &PgPool, catalog: &CatalogFile) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for store in &catalog.stores {
        sqlx::query(
            "INSERT INTO stores (id, name, address, latitude, longitude, owner_id, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 address = EXCLUDED.address, \
                 latitude = EXCLUDED.latitude, \
                 longitude = EXCLUDED.longitude, \
                 owner_id = EXCLUDED.owner_id, \
                 status = EXCLUDED.status, \
                 updated_at = NOW()",
        )
        .bind(store.id.as_str())
        .bind(&store.name)
        .bind(&store.address)
        .bind(store.latitude)
        .bind(store.longitude)
        .bind(&store.owner_id)
        .bind(store.status.as_str())
        .execute(&mut *tx)
        .await?;
        summary.stores += 1;
    }

    for item in &catalog.items {
        let report_count = i32::try_from(item.report_count).map_err(|_| DbError::InvalidRow {
            table: "items",
            reason: format!("report_count {} out of range for '{}'", item.report_count, item.id),
        })?;

        sqlx::query(
            "INSERT INTO items (id, name, category, store_ref, image_url, shelf_position, \
                                price, verified, verified_at, report_count) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 category = EXCLUDED.category, \
                 store_ref = EXCLUDED.store_ref, \
                 image_url = EXCLUDED.image_url, \
                 shelf_position = EXCLUDED.shelf_position, \
                 price = EXCLUDED.price, \
                 verified = EXCLUDED.verified, \
                 verified_at = EXCLUDED.verified_at, \
                 report_count = EXCLUDED.report_count, \
                 updated_at = NOW()",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.store_id.to_string())
        .bind(&item.image_url)
        .bind(&item.shelf_position)
        .bind(item.price)
        .bind(item.verified)
        .bind(item.verified_at)
        .bind(report_count)
        .execute(&mut *tx)
        .await?;
        summary.items += 1;
    }

    tx.commit().await?;
    Ok(summary)
}
