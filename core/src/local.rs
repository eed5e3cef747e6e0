//! In-memory collaborator implementations.
//!
//! These back the test suites and any embedding that wants the pipeline
//! without real platform bindings. [`LocalNotifications`] models the tray's
//! tag-coalescing rule so presenter behavior is observable.

use crate::platform::{
    CacheBucket, CacheStorage, ClickBroadcaster, PageContext, PageRegistry, PlatformError,
    WorkerHost,
};
use crate::surface::{ActiveNotification, NotificationSurface, OsNotification};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// In-memory cache storage keyed by bucket name.
#[derive(Default)]
pub struct LocalCacheStorage {
    buckets: Arc<RwLock<HashMap<String, Vec<String>>>>,
    fail_add_all: AtomicBool,
}

impl LocalCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed buckets that predate the current worker.
    pub fn with_existing(names: &[&str]) -> Self {
        let storage = Self::new();
        {
            let mut buckets = storage.buckets.write();
            for name in names {
                buckets.insert((*name).to_string(), Vec::new());
            }
        }
        storage
    }

    /// Make every subsequent `add_all` fail, as when one shell route 404s.
    pub fn fail_next_add_all(&self) {
        self.fail_add_all.store(true, Ordering::SeqCst);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.buckets.read().contains_key(name)
    }

    pub fn cached_routes(&self, name: &str) -> Vec<String> {
        self.buckets.read().get(name).cloned().unwrap_or_default()
    }
}

impl CacheStorage for LocalCacheStorage {
    fn open(&self, name: &str) -> Result<Arc<dyn CacheBucket>, PlatformError> {
        self.buckets.write().entry(name.to_string()).or_default();
        Ok(Arc::new(LocalCacheBucket {
            name: name.to_string(),
            buckets: Arc::clone(&self.buckets),
            fail_add_all: self.fail_add_all.load(Ordering::SeqCst),
        }))
    }

    fn names(&self) -> Result<Vec<String>, PlatformError> {
        let mut names: Vec<String> = self.buckets.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn delete(&self, name: &str) -> Result<bool, PlatformError> {
        Ok(self.buckets.write().remove(name).is_some())
    }
}

struct LocalCacheBucket {
    name: String,
    buckets: Arc<RwLock<HashMap<String, Vec<String>>>>,
    fail_add_all: bool,
}

impl CacheBucket for LocalCacheBucket {
    fn add_all(&self, routes: &[String]) -> Result<(), PlatformError> {
        if self.fail_add_all {
            return Err(PlatformError::Cache(format!(
                "failed to fetch one of {} routes",
                routes.len()
            )));
        }
        let mut buckets = self.buckets.write();
        if let Some(bucket) = buckets.get_mut(&self.name) {
            bucket.extend(routes.iter().cloned());
        }
        Ok(())
    }
}

/// In-memory notification tray with the platform's tag-coalescing rule:
/// showing a second notification with the same tag replaces the first, and
/// `renotify` counts as a fresh alert.
#[derive(Default)]
pub struct LocalNotifications {
    visible: Mutex<Vec<OsNotification>>,
    alerts: Mutex<HashMap<String, usize>>,
}

impl LocalNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible(&self) -> Vec<OsNotification> {
        self.visible.lock().clone()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.lock().len()
    }

    /// How many times this tag has alerted (shown fresh, or replaced with
    /// `renotify`).
    pub fn alert_count(&self, tag: &str) -> usize {
        self.alerts.lock().get(tag).copied().unwrap_or(0)
    }
}

impl NotificationSurface for LocalNotifications {
    fn show(&self, notification: OsNotification) -> Result<(), PlatformError> {
        let mut visible = self.visible.lock();
        let replaced = visible.iter().position(|n| n.tag == notification.tag);
        let fresh_alert = replaced.is_none() || notification.renotify;
        match replaced {
            Some(index) => visible[index] = notification.clone(),
            None => visible.push(notification.clone()),
        }
        if fresh_alert {
            *self.alerts.lock().entry(notification.tag).or_insert(0) += 1;
        }
        Ok(())
    }

    fn active(&self) -> Vec<ActiveNotification> {
        self.visible
            .lock()
            .iter()
            .map(|n| ActiveNotification {
                tag: n.tag.clone(),
                title: n.title.clone(),
                room_id: n.room_id.clone(),
            })
            .collect()
    }

    fn close(&self, tag: &str) {
        self.visible.lock().retain(|n| n.tag != tag);
    }
}

/// In-memory worker lifecycle host recording what was requested.
#[derive(Default)]
pub struct LocalWorkerHost {
    skip_waiting_calls: AtomicUsize,
    claim_calls: AtomicUsize,
}

impl LocalWorkerHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting_calls.load(Ordering::SeqCst) > 0
    }

    pub fn clients_claimed(&self) -> bool {
        self.claim_calls.load(Ordering::SeqCst) > 0
    }
}

impl WorkerHost for LocalWorkerHost {
    fn skip_waiting(&self) {
        self.skip_waiting_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn claim_clients(&self) {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// One in-memory page. Messages posted to it land in the paired receiver.
pub struct LocalPage {
    id: String,
    inbox: UnboundedSender<String>,
    focused: AtomicBool,
    focus_fails: bool,
}

impl LocalPage {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_focused(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }
}

impl PageContext for LocalPage {
    fn post_message(&self, message: &str) -> Result<(), PlatformError> {
        self.inbox
            .send(message.to_string())
            .map_err(|_| PlatformError::Delivery(format!("page {} is gone", self.id)))
    }

    fn focus(&self) -> Result<(), PlatformError> {
        if self.focus_fails {
            return Err(PlatformError::FocusDenied(self.id.clone()));
        }
        self.focused.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory page registry.
#[derive(Default)]
pub struct LocalPageRegistry {
    pages: RwLock<Vec<Arc<LocalPage>>>,
    opened: Mutex<Vec<String>>,
    open_fails: AtomicBool,
}

impl LocalPageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a live page; the receiver sees everything posted to it.
    pub fn add_page(&self, id: &str) -> (Arc<LocalPage>, UnboundedReceiver<String>) {
        self.add_page_inner(id, false)
    }

    /// Add a page whose focus requests are denied.
    pub fn add_unfocusable_page(&self, id: &str) -> (Arc<LocalPage>, UnboundedReceiver<String>) {
        self.add_page_inner(id, true)
    }

    fn add_page_inner(
        &self,
        id: &str,
        focus_fails: bool,
    ) -> (Arc<LocalPage>, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        let page = Arc::new(LocalPage {
            id: id.to_string(),
            inbox: tx,
            focused: AtomicBool::new(false),
            focus_fails,
        });
        self.pages.write().push(Arc::clone(&page));
        (page, rx)
    }

    pub fn fail_open_window(&self) {
        self.open_fails.store(true, Ordering::SeqCst);
    }

    /// URLs passed to `open_window`, in order.
    pub fn opened_windows(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl PageRegistry for LocalPageRegistry {
    fn live_pages(&self) -> Vec<Arc<dyn PageContext>> {
        self.pages
            .read()
            .iter()
            .map(|p| Arc::clone(p) as Arc<dyn PageContext>)
            .collect()
    }

    async fn open_window(&self, url: &str) -> Result<(), PlatformError> {
        if self.open_fails.load(Ordering::SeqCst) {
            return Err(PlatformError::OpenWindow(url.to_string()));
        }
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

/// In-memory broadcast channel fanning published messages to subscribers.
#[derive(Default)]
pub struct LocalBroadcast {
    subscribers: RwLock<HashMap<String, Vec<UnboundedSender<String>>>>,
}

impl LocalBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, channel: &str) -> UnboundedReceiver<String> {
        let (tx, rx) = unbounded_channel();
        self.subscribers
            .write()
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        rx
    }
}

impl ClickBroadcaster for LocalBroadcast {
    fn publish(&self, channel: &str, message: &str) -> Result<(), PlatformError> {
        if let Some(listeners) = self.subscribers.read().get(channel) {
            for listener in listeners {
                let _ = listener.send(message.to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(tag: &str, renotify: bool) -> OsNotification {
        OsNotification {
            title: "t".to_string(),
            body: "b".to_string(),
            icon: "/i".to_string(),
            badge: "/bg".to_string(),
            tag: tag.to_string(),
            renotify,
            room_id: None,
        }
    }

    #[test]
    fn same_tag_replaces_instead_of_stacking() {
        let tray = LocalNotifications::new();
        tray.show(notification("r1", true)).unwrap();
        tray.show(notification("r1", true)).unwrap();
        assert_eq!(tray.visible_count(), 1);
        assert_eq!(tray.alert_count("r1"), 2);
    }

    #[test]
    fn distinct_tags_stack() {
        let tray = LocalNotifications::new();
        tray.show(notification("r1", true)).unwrap();
        tray.show(notification("r2", true)).unwrap();
        assert_eq!(tray.visible_count(), 2);
    }

    #[test]
    fn close_removes_only_the_named_tag() {
        let tray = LocalNotifications::new();
        tray.show(notification("r1", true)).unwrap();
        tray.show(notification("r2", true)).unwrap();
        tray.close("r1");
        let tags: Vec<String> = tray.active().into_iter().map(|n| n.tag).collect();
        assert_eq!(tags, vec!["r2".to_string()]);
        tray.close("r1");
        assert_eq!(tray.visible_count(), 1);
    }

    #[test]
    fn cache_storage_tracks_buckets() {
        let storage = LocalCacheStorage::with_existing(&["old-v1"]);
        let bucket = storage.open("new-v2").unwrap();
        bucket
            .add_all(&["/".to_string(), "/chat".to_string()])
            .unwrap();
        assert!(storage.contains("old-v1"));
        assert_eq!(storage.cached_routes("new-v2").len(), 2);
        assert!(storage.delete("old-v1").unwrap());
        assert!(!storage.delete("old-v1").unwrap());
    }

    #[tokio::test]
    async fn broadcast_fans_out_to_every_subscriber() {
        let broadcast = LocalBroadcast::new();
        let mut a = broadcast.subscribe("ch");
        let mut b = broadcast.subscribe("ch");
        broadcast.publish("ch", "hello").unwrap();
        assert_eq!(a.recv().await.as_deref(), Some("hello"));
        assert_eq!(b.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn pages_receive_posted_messages() {
        let registry = LocalPageRegistry::new();
        let (_page, mut rx) = registry.add_page("p1");
        for page in registry.live_pages() {
            page.post_message("ping").unwrap();
        }
        assert_eq!(rx.recv().await.as_deref(), Some("ping"));
    }
}
