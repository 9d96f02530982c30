pub mod app_config;
pub mod config;
pub mod geo;
pub mod normalize;
pub mod store;
pub mod stores_file;

pub use app_config::{AppConfig, DirectorySource, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{haversine_distance_km, Bounds, GeoLocation, LatLng};
pub use normalize::{format_address, format_phone, normalize_store, store_coordinates, NormalizedStore};
pub use store::{PageInfo, StorePage, StoreQuery, StoreRecord};
pub use stores_file::{load_stores_file, parse_stores_file, StoresFile};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read stores file {path}: {source}")]
    StoresFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse stores file: {0}")]
    StoresFileParse(#[from] serde_yaml::Error),

    #[error("stores file validation failed: {0}")]
    Validation(String),
}
