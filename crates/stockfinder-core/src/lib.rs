//! Domain types, collaborator contracts, and configuration shared by the
//! stockfinder crates.

pub mod app_config;
pub mod catalog;
pub mod config;
pub mod geo;
pub mod items;
pub mod ports;
pub mod stores;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use catalog::{load_catalog, CatalogFile, CatalogItem, CatalogStore};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::Coordinates;
pub use items::Item;
pub use ports::{
    ItemIndexQuery, PersistenceError, PersistentKeyValueStore, QueryError, StoreDirectoryQuery,
};
pub use stores::{StoreId, StoreRecord, StoreRef, StoreStatus, PROVISIONAL_PREFIX};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("coordinates out of range: latitude={latitude}, longitude={longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
    #[error("unknown store status: {0}")]
    UnknownStoreStatus(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[source] serde_yaml::Error),

    #[error("catalog validation failed: {0}")]
    Validation(String),
}
