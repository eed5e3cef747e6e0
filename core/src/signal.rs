//! The routed click event and the channel it travels on.
//!
//! A notification click produces one [`RoutedClickEvent`], delivered both
//! directly to every live page and over the broadcast channel. Pages must
//! treat delivery as at-least-once and deduplicate.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Well-known broadcast channel name for click routing.
pub const CLICK_CHANNEL: &str = "wakebridge:notification-click";

/// Discriminant carried in the `type` field of every click event.
pub const CLICK_KIND: &str = "NOTIFICATION_CLICKED";

/// Milliseconds since the Unix epoch.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// The message a clicked notification fans out to pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedClickEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "roomId", default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    /// App-relative path the click wants open, e.g. `/chat/r1`.
    #[serde(rename = "urlToOpen")]
    pub url_to_open: String,
    /// Same destination as an absolute URL, for contexts that need one.
    #[serde(rename = "absoluteUrl", skip_serializing_if = "Option::is_none")]
    pub absolute_url: Option<String>,
    pub timestamp: u64,
}

impl RoutedClickEvent {
    pub fn new(room_id: Option<String>, url_to_open: String, absolute_url: Option<String>) -> Self {
        Self {
            kind: CLICK_KIND.to_string(),
            room_id,
            url_to_open,
            absolute_url,
            timestamp: unix_millis(),
        }
    }

    pub fn is_click(&self) -> bool {
        self.kind == CLICK_KIND
    }

    /// Key under which duplicate deliveries of the same click collapse.
    pub fn dedupe_key(&self) -> String {
        format!(
            "{}:{}",
            self.timestamp,
            self.room_id.as_deref().unwrap_or("-")
        )
    }

    /// Parse a raw channel message. Non-JSON messages and messages with a
    /// different `type` are ignored, not errors.
    pub fn from_channel_message(raw: &str) -> Option<Self> {
        let event: Self = serde_json::from_str(raw).ok()?;
        event.is_click().then_some(event)
    }

    pub fn to_channel_message(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
