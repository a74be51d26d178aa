//! Database maintenance command handlers.

use std::path::{Path, PathBuf};

use clap::Subcommand;

/// Sub-commands available under `db`.
#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert stores and items from a catalog file
    Seed {
        /// Catalog YAML (defaults to STOCKFINDER_CATALOG_PATH)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

pub(crate) async fn run_db_ping(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    stockfinder_db::health_check(pool).await?;
    println!("database ok");
    Ok(())
}

pub(crate) async fn run_db_migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let applied = stockfinder_db::run_migrations(pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Load, validate, and upsert the catalog at `path`.
///
/// Migrations are applied first so seeding works against a fresh database.
///
/// # Errors
///
/// Returns an error if the catalog is invalid or any upsert fails; nothing is
/// written in that case.
pub(crate) async fn run_db_seed(pool: &sqlx::PgPool, path: &Path) -> anyhow::Result<()> {
    let catalog = stockfinder_core::load_catalog(path)?;
    stockfinder_db::run_migrations(pool).await?;
    let summary = stockfinder_db::seed_catalog(pool, &catalog).await?;
    tracing::info!(
        path = %path.display(),
        stores = summary.stores,
        items = summary.items,
        "catalog seeded"
    );
    println!(
        "seeded {} store(s) and {} item(s) from {}",
        summary.stores,
        summary.items,
        path.display()
    );
    Ok(())
}
