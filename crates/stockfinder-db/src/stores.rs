//! Database operations for the `stores` table.

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use sqlx::PgPool;
use stockfinder_core::{QueryError, StoreDirectoryQuery, StoreId, StoreRecord, StoreStatus};

use crate::DbError;

/// A row from the `stores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreRow {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub owner_id: String,
    /// One of `pending`, `approved`, `rejected` (enforced by a CHECK constraint).
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for StoreRecord {
    type Error = DbError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<StoreStatus>()
            .map_err(|e| DbError::InvalidRow {
                table: "stores",
                reason: e.to_string(),
            })?;
        Ok(StoreRecord {
            id: StoreId::new(&row.id),
            name: row.name,
            address: row.address,
            latitude: row.latitude,
            longitude: row.longitude,
            owner_id: row.owner_id,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// List stores with the given approval status, ordered by name.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_stores_by_status(
    pool: &PgPool,
    status: StoreStatus,
) -> Result<Vec<StoreRow>, sqlx::Error> {
    sqlx::query_as::<_, StoreRow>(
        "SELECT id, name, address, latitude, longitude, owner_id, status, \
                created_at, updated_at \
         FROM stores \
         WHERE status = $1 \
         ORDER BY name, id",
    )
    .bind(status.as_str())
    .fetch_all(pool)
    .await
}

/// [`StoreDirectoryQuery`] backed by the `stores` table.
#[derive(Debug, Clone)]
pub struct PgStoreDirectory {
    pool: PgPool,
}

impl PgStoreDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl StoreDirectoryQuery for PgStoreDirectory {
    fn list_by_status(
        &self,
        status: StoreStatus,
    ) -> BoxFuture<'_, Result<Vec<StoreRecord>, QueryError>> {
        async move {
            let rows = list_stores_by_status(&self.pool, status)
                .await
                .map_err(|e| QueryError::StoreDirectory(e.to_string()))?;
            rows.into_iter()
                .map(StoreRecord::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| QueryError::StoreDirectory(e.to_string()))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> StoreRow {
        StoreRow {
            id: "virtual_S1".to_string(),
            name: "Corner Grocer".to_string(),
            address: "1 Main St".to_string(),
            latitude: Some(40.7),
            longitude: Some(-74.0),
            owner_id: "owner-1".to_string(),
            status: status.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn row_converts_to_record_with_canonical_id() {
        let record = StoreRecord::try_from(row("approved")).unwrap();
        assert_eq!(record.id.as_str(), "S1");
        assert!(record.is_approved());
        assert!(record.coordinates().is_some());
    }

    #[test]
    fn unknown_status_is_an_invalid_row() {
        let err = StoreRecord::try_from(row("archived")).unwrap_err();
        assert!(matches!(err, DbError::InvalidRow { table: "stores", .. }));
    }
}
