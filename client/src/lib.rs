// WakeBridge Client — the page-side visibility and reconnection supervisor.
//
// One facade owns the supervisor, the visibility machine, and the click
// relay, with the transport and platform surfaces injected by the host.

pub mod relay;
pub mod setup;
pub mod supervisor;
pub mod transport;
pub mod visibility;

pub use relay::{RelayDelegate, SignalRelay};
pub use setup::{run_push_setup, SetupError, SetupReport, SetupStage};
pub use supervisor::{ConnectionSupervisor, LivenessGuard};
pub use transport::{RealtimeTransport, TransportError};
pub use visibility::{LifecycleSignal, VisibilityMachine, VisibilityObserver};

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use wakebridge_core::config::SupervisorConfig;
use wakebridge_core::platform::PushPlatform;
use wakebridge_core::surface::NotificationSurface;

/// The page-side runtime: owns the supervisor, visibility machine, and
/// relay, and bridges visibility transitions to connection actions.
pub struct ClientRuntime {
    supervisor: Arc<ConnectionSupervisor>,
    visibility: VisibilityMachine,
    relay: SignalRelay,
    transport: Arc<dyn RealtimeTransport>,
    liveness: Mutex<Option<LivenessGuard>>,
}

/// Folds foreground/background transitions into their side effects: clear
/// the open room's notifications and re-check the connection on foreground,
/// mark the connection background on background.
struct ForegroundBridge {
    supervisor: Arc<ConnectionSupervisor>,
    notifications: Arc<dyn NotificationSurface>,
}

impl VisibilityObserver for ForegroundBridge {
    fn entered_foreground(&self) {
        if let Some(room) = self.supervisor.active_room() {
            self.notifications.close(&room);
        }
        let supervisor = Arc::clone(&self.supervisor);
        tokio::spawn(async move {
            supervisor.ensure_connected().await;
        });
    }

    fn entered_background(&self) {
        self.supervisor.mark_background();
    }
}

impl ClientRuntime {
    pub fn new(
        config: SupervisorConfig,
        transport: Arc<dyn RealtimeTransport>,
        notifications: Arc<dyn NotificationSurface>,
        delegate: Arc<dyn RelayDelegate>,
        user_id: impl Into<String>,
    ) -> Self {
        init_tracing();
        let supervisor = Arc::new(ConnectionSupervisor::new(
            config.clone(),
            Arc::clone(&transport),
            user_id,
        ));
        let bridge = Arc::new(ForegroundBridge {
            supervisor: Arc::clone(&supervisor),
            notifications,
        });
        let visibility = VisibilityMachine::new(config.foreground_debounce(), bridge);
        let relay = SignalRelay::new(
            Arc::clone(&transport),
            visibility.clone(),
            delegate,
        );
        info!("client runtime constructed");
        Self {
            supervisor,
            visibility,
            relay,
            transport,
            liveness: Mutex::new(None),
        }
    }

    /// Listen for routed clicks on one delivery channel. Call once per
    /// channel the host has (direct worker messages, broadcast channel).
    pub fn attach_click_channel(&self, receiver: UnboundedReceiver<String>) {
        self.relay.attach_channel(receiver);
    }

    /// A conversation view came up: it is both the rejoin target and the
    /// room whose notifications clear on foreground.
    pub fn enter_room(&self, room_id: &str) {
        self.supervisor.set_active_room(room_id);
        self.relay.set_open_room(room_id);
    }

    /// The conversation view went away: drop its listeners (membership
    /// survives server-side) and stop targeting it.
    pub fn leave_room(&self) {
        self.transport.detach_room_listeners();
        self.supervisor.clear_active_room();
        self.relay.clear_open_room();
    }

    /// Feed a platform lifecycle signal into the visibility machine.
    pub fn handle_signal(&self, signal: LifecycleSignal) {
        self.visibility.signal(signal);
    }

    /// Start the foreground liveness poll; idempotent.
    pub fn start_liveness(&self) {
        let mut guard = self.liveness.lock();
        if guard.is_none() {
            *guard = Some(self.supervisor.spawn_liveness());
        }
    }

    /// Stop the liveness poll (view teardown).
    pub fn stop_liveness(&self) {
        self.liveness.lock().take();
    }

    pub async fn ensure_connected(&self) {
        self.supervisor.ensure_connected().await;
    }

    pub fn is_foreground(&self) -> bool {
        self.visibility.is_foreground()
    }

    /// Run the push setup pipeline against the host's push platform.
    pub async fn setup_push(&self, platform: &dyn PushPlatform) -> Result<SetupReport, SetupError> {
        run_push_setup(platform).await
    }
}

/// Idempotent tracing setup, shared with the worker side. Embedders that
/// already installed a subscriber win.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
