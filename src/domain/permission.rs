//! Permission kinds and grant states

use std::fmt;

/// Capabilities that need the user's consent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionKind {
    Microphone,
    LocationForeground,
    LocationBackground,
}

impl PermissionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Microphone => "microphone",
            Self::LocationForeground => "location (foreground)",
            Self::LocationBackground => "location (background)",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a permission query or request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}
