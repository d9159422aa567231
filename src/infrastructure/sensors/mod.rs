//! Battery and location adapters

mod fixed_location;
mod ip_location;
mod sysfs_battery;

use std::sync::Arc;

pub use fixed_location::FixedLocationSource;
pub use ip_location::IpLocationSource;
pub use sysfs_battery::SysfsBattery;

use crate::application::ports::LocationSource;
use crate::domain::config::LocationSourceKind;

/// Build the location source selected in config
pub fn create_location_source(kind: &LocationSourceKind) -> Arc<dyn LocationSource> {
    match kind {
        LocationSourceKind::Ip { endpoint } => Arc::new(IpLocationSource::new(endpoint.clone())),
        LocationSourceKind::Fixed {
            latitude,
            longitude,
        } => Arc::new(FixedLocationSource::new(*latitude, *longitude)),
    }
}
