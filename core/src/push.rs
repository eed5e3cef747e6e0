//! Push wire format and the normalized notification data model.
//!
//! The push server sends loosely-shaped JSON; every field may be absent and
//! the payload may not be JSON at all. Decoding therefore happens on the
//! worker side and produces a [`NotificationDescriptor`], which is total:
//! every field is filled, either from the payload or from
//! [`NotificationDefaults`].

use serde::{Deserialize, Serialize};

/// Group key used when a payload names neither a room nor a tag.
///
/// All such notifications coalesce into a single OS notification slot.
pub const DEFAULT_GROUP_KEY: &str = "general";

/// The raw push payload as it arrives over the push channel.
///
/// Every field is optional. Unknown fields inside `data` are preserved so a
/// click handler can round-trip them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default)]
    pub data: PushData,
}

/// The `data` envelope carried inside a push payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushData {
    #[serde(rename = "roomId", skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PushData {
    pub fn with_room(room_id: impl Into<String>) -> Self {
        Self {
            room_id: Some(room_id.into()),
            extra: serde_json::Map::new(),
        }
    }
}

/// A fully-resolved notification, ready to hand to the notification surface.
///
/// Unlike [`PushPayload`] there is nothing optional here; decoding fills
/// every gap from [`NotificationDefaults`].
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDescriptor {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Coalescing key: room id when present, else the payload tag, else
    /// [`DEFAULT_GROUP_KEY`].
    pub group_key: String,
    pub data: PushData,
}

impl NotificationDescriptor {
    pub fn room_id(&self) -> Option<&str> {
        self.data.room_id.as_deref()
    }
}

/// Fallback values for fields the payload leaves out (or for payloads that
/// fail to decode entirely).
#[derive(Debug, Clone)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: "새 메시지".to_string(),
            body: "새로운 메시지가 도착했습니다.".to_string(),
            icon: "/icons/icon-192.png".to_string(),
            badge: "/icons/badge-72.png".to_string(),
        }
    }
}

impl NotificationDefaults {
    /// The descriptor shown when a push event carries no usable payload.
    pub fn descriptor(&self) -> NotificationDescriptor {
        NotificationDescriptor {
            title: self.title.clone(),
            body: self.body.clone(),
            icon: self.icon.clone(),
            badge: self.badge.clone(),
            group_key: DEFAULT_GROUP_KEY.to_string(),
            data: PushData::default(),
        }
    }
}
