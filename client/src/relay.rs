//! Cross-context signal relay.
//!
//! The page side of click routing. Listens on every channel the click can
//! arrive over, filters by the event discriminant, deduplicates the
//! redundant deliveries, and turns one logical click into at most one
//! navigation plus one synthetic foreground signal.

use crate::transport::RealtimeTransport;
use crate::visibility::{LifecycleSignal, VisibilityMachine};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use wakebridge_core::signal::RoutedClickEvent;

/// Hook the relay uses to drive the page's router.
pub trait RelayDelegate: Send + Sync {
    fn navigate_to(&self, path: &str);
}

const MAX_SEEN_KEYS: usize = 64;

/// Bounded first-seen set keyed by click event identity. Duplicate arrivals
/// across delivery channels collapse; old keys age out FIFO.
struct SeenKeys {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl SeenKeys {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    /// Returns true the first time a key is seen.
    fn insert(&mut self, key: String) -> bool {
        if !self.seen.insert(key.clone()) {
            return false;
        }
        self.order.push_back(key);
        while self.order.len() > MAX_SEEN_KEYS {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        true
    }
}

pub struct SignalRelay {
    inner: Arc<RelayInner>,
    listeners: Mutex<Vec<JoinHandle<()>>>,
}

struct RelayInner {
    transport: Arc<dyn RealtimeTransport>,
    visibility: VisibilityMachine,
    delegate: Arc<dyn RelayDelegate>,
    open_room: Mutex<Option<String>>,
    seen: Mutex<SeenKeys>,
}

impl SignalRelay {
    pub fn new(
        transport: Arc<dyn RealtimeTransport>,
        visibility: VisibilityMachine,
        delegate: Arc<dyn RelayDelegate>,
    ) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                transport,
                visibility,
                delegate,
                open_room: Mutex::new(None),
                seen: Mutex::new(SeenKeys::new()),
            }),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// The room the page currently has open, as far as routing is concerned.
    pub fn set_open_room(&self, room_id: impl Into<String>) {
        *self.inner.open_room.lock() = Some(room_id.into());
    }

    pub fn clear_open_room(&self) {
        *self.inner.open_room.lock() = None;
    }

    /// Listen for click events on one delivery channel. A channel that never
    /// materializes is simply never attached; the remaining channels carry
    /// the event.
    pub fn attach_channel(&self, mut receiver: UnboundedReceiver<String>) {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            while let Some(raw) = receiver.recv().await {
                match RoutedClickEvent::from_channel_message(&raw) {
                    Some(event) => inner.handle_event(event),
                    None => debug!("unrelated channel traffic ignored"),
                }
            }
        });
        self.listeners.lock().push(handle);
    }

    /// Feed one already-parsed event, bypassing the channels. Used by hosts
    /// that receive worker messages through their own plumbing.
    pub fn handle_event(&self, event: RoutedClickEvent) {
        self.inner.handle_event(event);
    }
}

impl Drop for SignalRelay {
    fn drop(&mut self) {
        for handle in self.listeners.lock().drain(..) {
            handle.abort();
        }
    }
}

impl RelayInner {
    fn handle_event(&self, event: RoutedClickEvent) {
        if !event.is_click() {
            return;
        }
        if !self.seen.lock().insert(event.dedupe_key()) {
            debug!(key = %event.dedupe_key(), "duplicate click delivery dropped");
            return;
        }

        let open = self.open_room.lock().clone();
        let navigate = match (event.room_id.as_deref(), open.as_deref()) {
            (Some(target), Some(current)) => target != current,
            _ => false,
        };
        if navigate {
            // Listeners off, membership intact; the destination view
            // re-attaches its own.
            self.transport.detach_room_listeners();
            info!(path = %event.url_to_open, "navigating to clicked room");
            self.delegate.navigate_to(&event.url_to_open);
        } else {
            debug!(room = ?event.room_id, "click targets the open room, navigation skipped");
        }

        // Every click is a foreground moment, routed or not.
        self.visibility.signal(LifecycleSignal::NotificationClick);
    }
}
