//! Permission adapters

mod config_permissions;

pub use config_permissions::ConfigPermissions;
