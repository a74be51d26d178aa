mod db;
mod search;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::db::DbCommands;

#[derive(Debug, Parser)]
#[command(name = "stockfinder-cli")]
#[command(about = "Stockfinder command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Search for items, optionally ranked by distance from a point
    Search {
        /// Free-text item query
        query: String,
        /// Latitude of the searcher (requires --lng)
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude of the searcher (requires --lat)
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,
        /// Print results as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show recent search queries, most recent first
    Recent {
        /// Maximum number of queries to show
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Forget all recorded search queries
    ClearHistory,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("stockfinder-cli: no command given; see --help");
        return Ok(());
    };

    let config = stockfinder_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = stockfinder_db::PoolConfig::from_app_config(&config);
    let pool = stockfinder_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => db::run_db_ping(&pool).await?,
            DbCommands::Migrate => db::run_db_migrate(&pool).await?,
            DbCommands::Seed { path } => {
                let path: PathBuf = path.unwrap_or_else(|| config.catalog_path.clone());
                db::run_db_seed(&pool, &path).await?;
            }
        },
        Commands::Search {
            query,
            lat,
            lng,
            json,
        } => {
            let engine = search::build_engine(&pool, &config);
            search::run_search(&engine, &query, lat, lng, json).await?;
        }
        Commands::Recent { limit } => {
            let engine = search::build_engine(&pool, &config);
            search::run_recent(&engine, limit).await;
        }
        Commands::ClearHistory => {
            let engine = search::build_engine(&pool, &config);
            engine.clear_history().await;
            println!("search history cleared");
        }
    }

    Ok(())
}
