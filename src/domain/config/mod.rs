//! Configuration domain module

mod app_config;

pub use app_config::{
    AppConfig, BackgroundConfig, LocationConfig, LocationGrant, LocationSourceKind,
    PermissionsConfig, APP_DIR_NAME, DEFAULT_LOCATION_ENDPOINT,
};
