//! Sensor port interfaces

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::status::{BatteryReading, LocationAccuracy, LocationFix};

/// Sensor errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("Sensor unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read sensor: {0}")]
    ReadFailed(String),
}

/// Port for the battery
#[async_trait]
pub trait BatterySensor: Send + Sync {
    async fn read(&self) -> Result<BatteryReading, SensorError>;
}

/// Port for location fixes
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Obtain a fresh fix at roughly the requested accuracy
    async fn current(&self, accuracy: LocationAccuracy) -> Result<LocationFix, SensorError>;
}
