//! Notification infrastructure module
//!
//! Desktop notifications go through notify-rust. When notifications are
//! turned off in the config a silent notifier is used instead.

mod noop;
mod notify_rust;

pub use noop::NoOpNotifier;
pub use notify_rust::NotifyRustNotifier;

use crate::application::ports::Notifier;

/// Create the notifier selected by the `notify` setting
pub fn create_notifier(enabled: bool) -> Box<dyn Notifier> {
    if enabled {
        Box::new(NotifyRustNotifier::new())
    } else {
        Box::new(NoOpNotifier::new())
    }
}
