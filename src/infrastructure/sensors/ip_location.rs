//! IP geolocation over HTTP
//!
//! Queries a JSON endpoint such as ip-api.com that answers with `lat`/`lon`
//! fields. Accuracy is whatever the provider gives; the requested level is
//! only logged.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::{LocationSource, SensorError};
use crate::domain::config::DEFAULT_LOCATION_ENDPOINT;
use crate::domain::status::{LocationAccuracy, LocationFix};

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: Option<String>,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Location from the public IP address
pub struct IpLocationSource {
    endpoint: String,
    client: reqwest::Client,
}

impl IpLocationSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    fn parse_fix(response: IpLookupResponse) -> Result<LocationFix, SensorError> {
        if response.status.as_deref() == Some("fail") {
            return Err(SensorError::ReadFailed(
                response
                    .message
                    .unwrap_or_else(|| "lookup failed".to_string()),
            ));
        }

        match (response.lat, response.lon) {
            (Some(latitude), Some(longitude)) => Ok(LocationFix {
                latitude,
                longitude,
                timestamp_ms: Utc::now().timestamp_millis(),
            }),
            _ => Err(SensorError::ReadFailed(
                "response has no coordinates".to_string(),
            )),
        }
    }
}

impl Default for IpLocationSource {
    fn default() -> Self {
        Self::new(DEFAULT_LOCATION_ENDPOINT)
    }
}

#[async_trait]
impl LocationSource for IpLocationSource {
    async fn current(&self, accuracy: LocationAccuracy) -> Result<LocationFix, SensorError> {
        debug!(endpoint = %self.endpoint, %accuracy, "ip location lookup");

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| SensorError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SensorError::ReadFailed(format!("HTTP {}", status)));
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| SensorError::ReadFailed(e.to_string()))?;

        Self::parse_fix(body)
    }
}
