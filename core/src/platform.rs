//! Trait seams around the remaining platform surfaces.
//!
//! Cache storage, the worker lifecycle host, the page registry, the
//! broadcast channel, and the push platform are all external collaborators.
//! Production wires in platform bindings; tests wire in the [`crate::local`]
//! fakes.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("cache storage failure: {0}")]
    Cache(String),
    #[error("broadcast channel unavailable: {0}")]
    ChannelUnavailable(String),
    #[error("message delivery failed: {0}")]
    Delivery(String),
    #[error("focus request denied: {0}")]
    FocusDenied(String),
    #[error("window open failed: {0}")]
    OpenWindow(String),
    #[error("notification surface failure: {0}")]
    Notification(String),
}

/// Named cache buckets, versioned by generation name.
pub trait CacheStorage: Send + Sync {
    /// Open (creating if absent) the bucket with this name.
    fn open(&self, name: &str) -> Result<Arc<dyn CacheBucket>, PlatformError>;

    /// Names of every bucket currently present.
    fn names(&self) -> Result<Vec<String>, PlatformError>;

    /// Delete a bucket. Returns whether it existed.
    fn delete(&self, name: &str) -> Result<bool, PlatformError>;
}

/// One named cache bucket.
pub trait CacheBucket: Send + Sync {
    /// Fetch and store every route. All-or-nothing: one failure fails the
    /// whole batch and leaves no partial entries behind.
    fn add_all(&self, routes: &[String]) -> Result<(), PlatformError>;
}

/// Worker lifecycle host (activation control).
pub trait WorkerHost: Send + Sync {
    /// Ask to activate immediately instead of waiting for old-worker pages
    /// to close.
    fn skip_waiting(&self);

    /// Take control of every open page without waiting for reloads.
    fn claim_clients(&self);
}

/// One live page the worker can reach.
pub trait PageContext: Send + Sync {
    fn post_message(&self, message: &str) -> Result<(), PlatformError>;

    fn focus(&self) -> Result<(), PlatformError>;
}

/// Enumerates live pages and opens new ones.
#[async_trait]
pub trait PageRegistry: Send + Sync {
    /// Every live page, including pages not yet controlled by the current
    /// worker.
    fn live_pages(&self) -> Vec<Arc<dyn PageContext>>;

    async fn open_window(&self, url: &str) -> Result<(), PlatformError>;
}

/// Publish side of the cross-context broadcast channel.
pub trait ClickBroadcaster: Send + Sync {
    fn publish(&self, channel: &str, message: &str) -> Result<(), PlatformError>;
}

/// Outcome of a notification permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// The user dismissed the prompt without deciding.
    Prompt,
}

/// An established push subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct PushSubscription {
    pub endpoint: String,
}

/// Platform push machinery, as the setup pipeline sees it.
#[async_trait]
pub trait PushPlatform: Send + Sync {
    /// Register the worker script. Failure here is unrecoverable for push.
    async fn register_worker(&self) -> Result<(), PlatformError>;

    async fn request_permission(&self) -> Result<PermissionState, PlatformError>;

    async fn subscribe(&self) -> Result<PushSubscription, PlatformError>;
}
