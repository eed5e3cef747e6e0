//! The notification surface seam.
//!
//! The OS notification tray is an external collaborator; the worker talks to
//! it only through [`NotificationSurface`]. The tray's own coalescing rule
//! (same tag replaces, `renotify` re-alerts) is what the presenter leans on.

use crate::platform::PlatformError;

/// A notification as handed to the platform tray.
#[derive(Debug, Clone, PartialEq)]
pub struct OsNotification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Tray coalescing key. Showing a second notification with the same tag
    /// replaces the first.
    pub tag: String,
    /// When replacing, alert (sound/vibration) again instead of updating
    /// silently.
    pub renotify: bool,
    pub room_id: Option<String>,
}

/// A notification currently visible in the tray.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveNotification {
    pub tag: String,
    pub title: String,
    pub room_id: Option<String>,
}

/// Platform notification tray.
pub trait NotificationSurface: Send + Sync {
    fn show(&self, notification: OsNotification) -> Result<(), PlatformError>;

    /// Notifications currently visible.
    fn active(&self) -> Vec<ActiveNotification>;

    /// Close every visible notification with this tag. Closing a tag that is
    /// not visible is a no-op.
    fn close(&self, tag: &str);
}
