//! Push payload decoding.
//!
//! Decoding is total. Whatever arrives on the push channel, the result is a
//! complete [`NotificationDescriptor`]; a push event never dies on a bad
//! payload.

use tracing::{debug, warn};
use wakebridge_core::push::{
    NotificationDefaults, NotificationDescriptor, PushPayload, DEFAULT_GROUP_KEY,
};

pub struct PushDecoder {
    defaults: NotificationDefaults,
}

impl PushDecoder {
    pub fn new(defaults: NotificationDefaults) -> Self {
        Self { defaults }
    }

    /// Decode raw push bytes. `None` means the push event carried no data
    /// at all.
    pub fn decode(&self, raw: Option<&str>) -> NotificationDescriptor {
        let Some(raw) = raw else {
            debug!("push event carried no payload, using defaults");
            return self.defaults.descriptor();
        };
        match serde_json::from_str::<PushPayload>(raw) {
            Ok(payload) => self.resolve(payload),
            Err(err) => {
                warn!(error = %err, "push payload was not valid JSON, using defaults");
                self.defaults.descriptor()
            }
        }
    }

    /// Fill gaps from the defaults and resolve the group key:
    /// room id first, then the payload tag, then the shared sentinel.
    fn resolve(&self, payload: PushPayload) -> NotificationDescriptor {
        let group_key = payload
            .data
            .room_id
            .clone()
            .or(payload.tag)
            .unwrap_or_else(|| DEFAULT_GROUP_KEY.to_string());
        NotificationDescriptor {
            title: payload.title.unwrap_or_else(|| self.defaults.title.clone()),
            body: payload.body.unwrap_or_else(|| self.defaults.body.clone()),
            icon: payload.icon.unwrap_or_else(|| self.defaults.icon.clone()),
            badge: payload.badge.unwrap_or_else(|| self.defaults.badge.clone()),
            group_key,
            data: payload.data,
        }
    }
}

impl Default for PushDecoder {
    fn default() -> Self {
        Self::new(NotificationDefaults::default())
    }
}
