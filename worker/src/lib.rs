// WakeBridge Worker — the service-worker-side push pipeline.
//
// One facade owns the four components and exposes the worker event surface:
// install, activate, push, notification click.

pub mod cache;
pub mod decode;
pub mod dispatch;
pub mod present;

pub use cache::CacheVersionManager;
pub use decode::PushDecoder;
pub use dispatch::ClickFanout;
pub use present::NotificationPresenter;

use std::sync::Arc;
use tracing::info;
use wakebridge_core::config::{CacheConfig, RouteConfig};
use wakebridge_core::platform::{CacheStorage, ClickBroadcaster, PageRegistry, WorkerHost};
use wakebridge_core::push::NotificationDefaults;
use wakebridge_core::surface::NotificationSurface;

/// Everything the worker needs from the platform, gathered for construction.
pub struct WorkerPlatform {
    pub storage: Arc<dyn CacheStorage>,
    pub host: Arc<dyn WorkerHost>,
    pub surface: Arc<dyn NotificationSurface>,
    pub pages: Arc<dyn PageRegistry>,
    pub broadcast: Arc<dyn ClickBroadcaster>,
}

/// The worker-side event surface.
pub struct PushWorker {
    cache: CacheVersionManager,
    decoder: PushDecoder,
    presenter: NotificationPresenter,
    fanout: ClickFanout,
}

impl PushWorker {
    pub fn new(
        cache_config: CacheConfig,
        routes: RouteConfig,
        defaults: NotificationDefaults,
        platform: WorkerPlatform,
    ) -> Self {
        init_tracing();
        info!(generation = %cache_config.generation_name(), "push worker constructed");
        Self {
            cache: CacheVersionManager::new(cache_config, platform.storage, platform.host),
            decoder: PushDecoder::new(defaults),
            presenter: NotificationPresenter::new(Arc::clone(&platform.surface)),
            fanout: ClickFanout::new(routes, platform.surface, platform.pages, platform.broadcast),
        }
    }

    /// Install event: precache the shell and request immediate activation.
    pub fn handle_install(&self) {
        let _ = self.cache.handle_install();
    }

    /// Activate event: purge stale cache generations and claim open pages.
    pub fn handle_activate(&self) {
        self.cache.handle_activate();
    }

    /// Push event: decode (totally) and present.
    pub fn handle_push(&self, raw_payload: Option<&str>) {
        let descriptor = self.decoder.decode(raw_payload);
        self.presenter.present(descriptor);
    }

    /// Notification click event: close, fan out, surface the app.
    pub async fn handle_notification_click(&self, tag: &str, room_id: Option<&str>) {
        self.fanout.dispatch(tag, room_id).await;
    }
}

/// Idempotent tracing setup. Embedders that already installed a subscriber
/// win; the failed `try_init` is ignored.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
