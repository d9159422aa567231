//! Device status observers shared by the `status` and `daemon` commands

use std::path::Path;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::sync::watch;
use tracing::warn;

use crate::application::ports::{Notifier, Permissions, RecordingFiles};
use crate::application::{
    observe_battery, observe_location, observe_storage, LocationOptions, Observer, ObserverError,
    Reading,
};
use crate::domain::config::AppConfig;
use crate::domain::status::{BatteryReading, LocationFix, StorageReading};
use crate::infrastructure::{create_location_source, LocalFiles, SysfsBattery};

use super::presenter::Presenter;

/// Location state as shown to the user
enum LocationStatus {
    Off,
    Denied(ObserverError),
    Tracking(Observer<LocationFix>, watch::Receiver<Reading<LocationFix>>),
}

/// The running battery, storage and location observers
pub struct StatusObservers {
    battery: Observer<BatteryReading>,
    battery_rx: watch::Receiver<Reading<BatteryReading>>,
    storage: Observer<StorageReading>,
    storage_rx: watch::Receiver<Reading<StorageReading>>,
    location: LocationStatus,
}

impl StatusObservers {
    /// Start every observer the config enables
    pub async fn start<P, N>(
        config: &AppConfig,
        files: Arc<LocalFiles>,
        dir: &Path,
        permissions: &P,
        notifier: &N,
    ) -> Self
    where
        P: Permissions + ?Sized,
        N: Notifier + ?Sized,
    {
        if let Err(e) = files.ensure_dir(dir).await {
            warn!(error = %e, "could not create recordings directory");
        }

        let battery = observe_battery(
            Arc::new(SysfsBattery::new()),
            config.battery_poll_interval_or_default(),
        );
        let storage = observe_storage(
            files,
            dir.to_path_buf(),
            config.storage_poll_interval_or_default(),
        );

        let location = if config.location_enabled_or_default() {
            let options = LocationOptions {
                mode: config.location_mode_or_default(),
                accuracy: config.location_accuracy_or_default(),
                time_interval: config.location_time_interval_or_default(),
                distance_interval: config.location_distance_interval_or_default(),
            };
            let source = create_location_source(&config.location_source_or_default());
            match observe_location(source, permissions, notifier, options).await {
                Ok(tracking) => {
                    let rx = tracking.observer.subscribe();
                    LocationStatus::Tracking(tracking.observer, rx)
                }
                Err(e) => LocationStatus::Denied(e),
            }
        } else {
            LocationStatus::Off
        };

        Self {
            battery_rx: battery.subscribe(),
            battery,
            storage_rx: storage.subscribe(),
            storage,
            location,
        }
    }

    fn location_reading(&self) -> Option<Reading<LocationFix>> {
        match &self.location {
            LocationStatus::Off => None,
            LocationStatus::Denied(e) => Some(Reading::Unavailable(e.clone())),
            LocationStatus::Tracking(observer, _) => Some(observer.latest()),
        }
    }

    /// True once every observer has published something
    pub fn is_settled(&self) -> bool {
        !matches!(self.battery.latest(), Reading::Waiting)
            && !matches!(self.storage.latest(), Reading::Waiting)
            && !matches!(self.location_reading(), Some(Reading::Waiting))
    }

    /// Wait until every observer has published or `limit` passes
    pub async fn settle(&mut self, limit: StdDuration) {
        let _ = tokio::time::timeout(limit, async {
            while !self.is_settled() {
                self.changed().await;
            }
        })
        .await;
    }

    /// Resolve when any observer publishes a new reading
    pub async fn changed(&mut self) {
        let location = &mut self.location;
        let location = async move {
            match location {
                LocationStatus::Tracking(_, rx) => changed(rx).await,
                _ => std::future::pending().await,
            }
        };
        tokio::select! {
            _ = changed(&mut self.battery_rx) => {}
            _ = changed(&mut self.storage_rx) => {}
            _ = location => {}
        }
    }

    /// Print the current readings
    pub fn print(&self, presenter: &Presenter) {
        presenter.status(
            &self.battery.latest(),
            &self.storage.latest(),
            self.location_reading().as_ref(),
        );
    }

    /// Stop every observer
    pub fn stop(&mut self) {
        self.battery.stop();
        self.storage.stop();
        if let LocationStatus::Tracking(observer, _) = &mut self.location {
            observer.stop();
        }
    }
}

/// Wait for a change, or forever once the observer is gone
async fn changed<T>(rx: &mut watch::Receiver<T>) {
    if rx.changed().await.is_err() {
        std::future::pending::<()>().await;
    }
}
