use async_trait::async_trait;
use chrono::Utc;

use crate::application::ports::{LocationSource, SensorError};
use crate::domain::status::{LocationAccuracy, LocationFix};

/// A location source pinned to configured coordinates
pub struct FixedLocationSource {
    latitude: f64,
    longitude: f64,
}

impl FixedLocationSource {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[async_trait]
impl LocationSource for FixedLocationSource {
    async fn current(&self, _accuracy: LocationAccuracy) -> Result<LocationFix, SensorError> {
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(SensorError::Unavailable(format!(
                "coordinates out of range: {}, {}",
                self.latitude, self.longitude
            )));
        }

        Ok(LocationFix {
            latitude: self.latitude,
            longitude: self.longitude,
            timestamp_ms: Utc::now().timestamp_millis(),
        })
    }
}
