//! Notification presenting.
//!
//! The single write path to the notification surface. The descriptor's group
//! key becomes the tray tag, so pushes for one room collapse into one
//! notification slot, and `renotify` keeps every replacement audible.

use std::sync::Arc;
use tracing::{info, warn};
use wakebridge_core::push::NotificationDescriptor;
use wakebridge_core::surface::{NotificationSurface, OsNotification};

pub struct NotificationPresenter {
    surface: Arc<dyn NotificationSurface>,
}

impl NotificationPresenter {
    pub fn new(surface: Arc<dyn NotificationSurface>) -> Self {
        Self { surface }
    }

    /// Show the descriptor. Surface failures are logged, not propagated; the
    /// push event has done everything else it needed to by now.
    pub fn present(&self, descriptor: NotificationDescriptor) {
        let tag = descriptor.group_key.clone();
        let notification = OsNotification {
            title: descriptor.title,
            body: descriptor.body,
            icon: descriptor.icon,
            badge: descriptor.badge,
            tag: tag.clone(),
            renotify: true,
            room_id: descriptor.data.room_id,
        };
        match self.surface.show(notification) {
            Ok(()) => info!(tag = %tag, "notification presented"),
            Err(err) => warn!(tag = %tag, error = %err, "notification surface rejected show"),
        }
    }
}
