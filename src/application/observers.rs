//! Status observers: battery, free storage and location
//!
//! Each observer owns a polling task that publishes into a `watch`
//! channel. Stopping or dropping the observer ends the task.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::permission::PermissionKind;
use crate::domain::recording::Duration;
use crate::domain::status::{
    BatteryReading, LocationAccuracy, LocationFix, LocationMode, StorageReading,
};

use super::ports::{
    BatterySensor, LocationSource, NotificationIcon, Notifier, Permissions, RecordingFiles,
    SensorError,
};

/// Errors from status observers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObserverError {
    #[error("Permission denied: {0}")]
    PermissionDenied(PermissionKind),

    #[error("{0}")]
    Sensor(#[from] SensorError),
}

/// Latest state of an observed value
#[derive(Debug, Clone, PartialEq)]
pub enum Reading<T> {
    /// Nothing sampled yet
    Waiting,
    Value(T),
    /// The sensor failed before producing any value
    Unavailable(ObserverError),
}

impl<T> Reading<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Handle to a running observer task
pub struct Observer<T> {
    name: &'static str,
    rx: watch::Receiver<Reading<T>>,
    task: Option<JoinHandle<()>>,
}

impl<T: Clone> Observer<T> {
    fn new(name: &'static str, rx: watch::Receiver<Reading<T>>, task: JoinHandle<()>) -> Self {
        Self {
            name,
            rx,
            task: Some(task),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The most recently published reading
    pub fn latest(&self) -> Reading<T> {
        self.rx.borrow().clone()
    }

    /// A receiver that wakes on every published change
    pub fn subscribe(&self) -> watch::Receiver<Reading<T>> {
        self.rx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// End the polling task and release the sensor
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(observer = self.name, "observer stopped");
        }
    }
}

impl<T> Drop for Observer<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Poll the battery and publish whenever level or charging state changes
pub fn observe_battery<B>(sensor: Arc<B>, period: Duration) -> Observer<BatteryReading>
where
    B: BatterySensor + ?Sized + 'static,
{
    let (tx, rx) = watch::channel(Reading::Waiting);
    let task = tokio::spawn(async move {
        let mut ticker = ticker(period);
        loop {
            ticker.tick().await;
            publish(&tx, sensor.read().await.map_err(ObserverError::from));
        }
    });
    Observer::new("battery", rx, task)
}

/// Poll free space on the volume holding `dir`
pub fn observe_storage<F>(files: Arc<F>, dir: PathBuf, period: Duration) -> Observer<StorageReading>
where
    F: RecordingFiles + ?Sized + 'static,
{
    let (tx, rx) = watch::channel(Reading::Waiting);
    let task = tokio::spawn(async move {
        let mut ticker = ticker(period);
        loop {
            ticker.tick().await;
            let sample = files
                .free_space(&dir)
                .await
                .map(|free_bytes| StorageReading { free_bytes })
                .map_err(|e| ObserverError::Sensor(SensorError::ReadFailed(e.to_string())));
            publish(&tx, sample);
        }
    });
    Observer::new("storage", rx, task)
}

/// Location tracking settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationOptions {
    pub mode: LocationMode,
    pub accuracy: LocationAccuracy,
    /// Minimum time between published fixes
    pub time_interval: Duration,
    /// Minimum movement in meters between published fixes
    pub distance_interval: f64,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            mode: LocationMode::Foreground,
            accuracy: LocationAccuracy::default(),
            time_interval: Duration::from_secs(10),
            distance_interval: 10.0,
        }
    }
}

/// Decides which fixes are worth publishing.
///
/// Only distance is checked here. The polling ticker already spaces reads
/// `time_interval` apart, and source timestamps jitter with request latency.
#[derive(Debug, Clone)]
pub struct FixFilter {
    distance_interval: f64,
    last: Option<LocationFix>,
}

impl FixFilter {
    pub fn new(options: &LocationOptions) -> Self {
        Self {
            distance_interval: options.distance_interval,
            last: None,
        }
    }

    /// Accept the first fix, then only fixes far enough from the last
    /// accepted one
    pub fn accept(&mut self, fix: &LocationFix) -> bool {
        let accepted = match &self.last {
            None => true,
            Some(last) => last.distance_to(fix) >= self.distance_interval,
        };
        if accepted {
            self.last = Some(*fix);
        }
        accepted
    }
}

/// A started location observer and the mode it actually runs in
pub struct LocationTracking {
    pub observer: Observer<LocationFix>,
    pub mode: LocationMode,
}

/// Start location updates.
///
/// Foreground permission is required. When background mode is asked for
/// but refused, tracking continues in foreground mode and the user is told
/// once through the notifier.
pub async fn observe_location<L, P, N>(
    source: Arc<L>,
    permissions: &P,
    notifier: &N,
    options: LocationOptions,
) -> Result<LocationTracking, ObserverError>
where
    L: LocationSource + ?Sized + 'static,
    P: Permissions + ?Sized,
    N: Notifier + ?Sized,
{
    if !permissions
        .request(PermissionKind::LocationForeground)
        .await
        .is_granted()
    {
        warn!("location permission refused");
        return Err(ObserverError::PermissionDenied(
            PermissionKind::LocationForeground,
        ));
    }

    let mut mode = options.mode;
    if mode == LocationMode::Background
        && !permissions
            .request(PermissionKind::LocationBackground)
            .await
            .is_granted()
    {
        info!("background location refused, tracking in foreground only");
        mode = LocationMode::Foreground;
        if let Err(e) = notifier
            .notify(
                "Limited Functionality",
                "Background location was not granted. Location updates continue only while pocket-recorder is running.",
                NotificationIcon::Location,
            )
            .await
        {
            warn!(error = %e, "could not show location advisory");
        }
    }

    let (tx, rx) = watch::channel(Reading::Waiting);
    let mut filter = FixFilter::new(&options);
    let task = tokio::spawn(async move {
        let mut ticker = ticker(options.time_interval);
        loop {
            ticker.tick().await;
            match source.current(options.accuracy).await {
                Ok(fix) => {
                    if filter.accept(&fix) {
                        publish(&tx, Ok(fix));
                    }
                }
                Err(e) => publish(&tx, Err(e.into())),
            }
        }
    });

    info!(mode = %mode, accuracy = %options.accuracy, "location tracking started");
    Ok(LocationTracking {
        observer: Observer::new("location", rx, task),
        mode,
    })
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = time::interval(period.as_std().max(std::time::Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Publish a sample. Errors only replace a reading that never had a value.
fn publish<T: PartialEq>(tx: &watch::Sender<Reading<T>>, sample: Result<T, ObserverError>) {
    tx.send_if_modified(move |current| {
        let next = match sample {
            Ok(value) => Reading::Value(value),
            Err(e) => {
                if matches!(current, Reading::Value(_)) {
                    debug!(error = %e, "sensor read failed, keeping last value");
                    return false;
                }
                Reading::Unavailable(e)
            }
        };
        if *current == next {
            return false;
        }
        *current = next;
        true
    });
}
