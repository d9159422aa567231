//! Permission port interface

use async_trait::async_trait;

use crate::domain::permission::{PermissionKind, PermissionStatus};

/// Port for querying and requesting user consent
#[async_trait]
pub trait Permissions: Send + Sync {
    /// Current status without prompting
    async fn status(&self, kind: PermissionKind) -> PermissionStatus;

    /// Ask for the permission if it is still undetermined
    async fn request(&self, kind: PermissionKind) -> PermissionStatus;
}
