//! Consent taken from the `[permissions]` config section
//!
//! Desktop platforms have no runtime prompt for these capabilities, so a
//! request answers with whatever the user configured.

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::Permissions;
use crate::domain::config::{AppConfig, LocationGrant};
use crate::domain::permission::{PermissionKind, PermissionStatus};

#[derive(Debug, Clone, Copy)]
pub struct ConfigPermissions {
    microphone: PermissionStatus,
    location: LocationGrant,
}

impl ConfigPermissions {
    pub fn new(microphone: PermissionStatus, location: LocationGrant) -> Self {
        Self {
            microphone,
            location,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.microphone_permission(), config.location_grant())
    }
}

#[async_trait]
impl Permissions for ConfigPermissions {
    async fn status(&self, kind: PermissionKind) -> PermissionStatus {
        match (kind, self.location) {
            (PermissionKind::Microphone, _) => self.microphone,
            (_, LocationGrant::Denied) => PermissionStatus::Denied,
            (PermissionKind::LocationForeground, _) => PermissionStatus::Granted,
            (PermissionKind::LocationBackground, LocationGrant::Background) => {
                PermissionStatus::Granted
            }
            (PermissionKind::LocationBackground, LocationGrant::Foreground) => {
                PermissionStatus::Denied
            }
        }
    }

    async fn request(&self, kind: PermissionKind) -> PermissionStatus {
        let status = self.status(kind).await;
        debug!(%kind, ?status, "permission requested");
        status
    }
}
