// WakeBridge Core — shared wire formats and platform seams
//
// Everything the worker-side and page-side crates agree on lives here:
// the push payload shape, the routed click event, the traits wrapping
// platform surfaces, and the tuning configuration.

pub mod config;
pub mod local;
pub mod platform;
pub mod push;
pub mod signal;
pub mod surface;

pub use config::{CacheConfig, RouteConfig, SupervisorConfig};
pub use platform::{
    CacheBucket, CacheStorage, ClickBroadcaster, PageContext, PageRegistry, PermissionState,
    PlatformError, PushPlatform, PushSubscription, WorkerHost,
};
pub use push::{NotificationDefaults, NotificationDescriptor, PushData, PushPayload, DEFAULT_GROUP_KEY};
pub use signal::{unix_millis, RoutedClickEvent, CLICK_CHANNEL, CLICK_KIND};
pub use surface::{ActiveNotification, NotificationSurface, OsNotification};
