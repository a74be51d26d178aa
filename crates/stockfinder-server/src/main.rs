mod api;
mod middleware;

use std::sync::Arc;

use stockfinder_db::{PgItemIndex, PgKeyValueStore, PgStoreDirectory};
use stockfinder_search::{SearchConfig, SearchEngine};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = stockfinder_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = stockfinder_db::PoolConfig::from_app_config(&config);
    let pool = stockfinder_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = stockfinder_db::run_migrations(&pool).await?;
    tracing::info!(applied, env = %config.env, "database ready");

    let search_config = SearchConfig::from_app_config(&config);
    let engine = SearchEngine::new(
        Arc::new(PgItemIndex::new(pool.clone())),
        Arc::new(PgStoreDirectory::new(pool.clone())),
        Arc::new(PgKeyValueStore::new(pool.clone())),
        &search_config,
    );
    let state = AppState {
        pool,
        engine: Arc::new(engine),
        history_max: search_config.history_max,
    };
    let app = build_app(state, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
