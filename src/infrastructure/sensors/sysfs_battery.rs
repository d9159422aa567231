//! Battery readings from the Linux power-supply class
//!
//! Each supply under the root has a `type` file; the first `Battery` supply
//! with a readable `capacity` wins.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::trace;

use crate::application::ports::{BatterySensor, SensorError};
use crate::domain::status::{BatteryReading, ChargingState};

const POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";

pub struct SysfsBattery {
    root: PathBuf,
}

impl SysfsBattery {
    pub fn new() -> Self {
        Self::with_root(POWER_SUPPLY_ROOT)
    }

    /// Read supplies from a different root (used by tests)
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn parse_status(status: &str) -> ChargingState {
        match status.trim() {
            "Charging" => ChargingState::Charging,
            "Discharging" | "Not charging" => ChargingState::Unplugged,
            "Full" => ChargingState::Full,
            _ => ChargingState::Unknown,
        }
    }

    async fn read_supply(dir: &Path) -> Option<BatteryReading> {
        let kind = fs::read_to_string(dir.join("type")).await.ok()?;
        if kind.trim() != "Battery" {
            return None;
        }

        let capacity: f32 = fs::read_to_string(dir.join("capacity"))
            .await
            .ok()?
            .trim()
            .parse()
            .ok()?;
        let charging = fs::read_to_string(dir.join("status"))
            .await
            .map(|s| Self::parse_status(&s))
            .unwrap_or_default();

        Some(BatteryReading::new(capacity / 100.0, charging))
    }
}

impl Default for SysfsBattery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BatterySensor for SysfsBattery {
    async fn read(&self) -> Result<BatteryReading, SensorError> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| SensorError::Unavailable(format!("{}: {}", self.root.display(), e)))?;

        let mut supplies = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            supplies.push(entry.path());
        }
        supplies.sort();

        for supply in supplies {
            if let Some(reading) = Self::read_supply(&supply).await {
                trace!(supply = %supply.display(), %reading, "battery read");
                return Ok(reading);
            }
        }

        Err(SensorError::Unavailable("no battery found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supply(root: &Path, name: &str, files: &[(&str, &str)]) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        for (file, contents) in files {
            std::fs::write(dir.join(file), contents).unwrap();
        }
    }

    #[tokio::test]
    async fn reads_first_battery() {
        let root = tempfile::tempdir().unwrap();
        supply(root.path(), "AC", &[("type", "Mains\n"), ("online", "1\n")]);
        supply(
            root.path(),
            "BAT0",
            &[("type", "Battery\n"), ("capacity", "76\n"), ("status", "Charging\n")],
        );

        let reading = SysfsBattery::with_root(root.path()).read().await.unwrap();
        assert_eq!(reading.percent(), 76);
        assert_eq!(reading.charging, ChargingState::Charging);
    }

    #[tokio::test]
    async fn missing_status_is_unknown() {
        let root = tempfile::tempdir().unwrap();
        supply(root.path(), "BAT1", &[("type", "Battery"), ("capacity", "40")]);

        let reading = SysfsBattery::with_root(root.path()).read().await.unwrap();
        assert_eq!(reading.charging, ChargingState::Unknown);
    }

    #[tokio::test]
    async fn no_battery_is_unavailable() {
        let root = tempfile::tempdir().unwrap();
        supply(root.path(), "AC", &[("type", "Mains")]);

        let err = SysfsBattery::with_root(root.path()).read().await.unwrap_err();
        assert!(matches!(err, SensorError::Unavailable(_)));
    }

    #[test]
    fn status_strings() {
        assert_eq!(SysfsBattery::parse_status("Discharging\n"), ChargingState::Unplugged);
        assert_eq!(SysfsBattery::parse_status("Full"), ChargingState::Full);
        assert_eq!(SysfsBattery::parse_status("???"), ChargingState::Unknown);
    }
}
