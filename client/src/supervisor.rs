//! Connection supervision.
//!
//! `ensure_connected` repairs the transport after OS-suspended background
//! time: already connected means mark-visible only; otherwise connect, wait
//! the grace delay, rejoin the active room. At most one repair runs at a
//! time, and a cancellable liveness task re-runs the check every few seconds
//! while the page is foreground.

use crate::transport::RealtimeTransport;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use wakebridge_core::config::SupervisorConfig;

pub struct ConnectionSupervisor {
    config: SupervisorConfig,
    transport: Arc<dyn RealtimeTransport>,
    user_id: String,
    active_room: Mutex<Option<String>>,
    last_check: Mutex<Option<tokio::time::Instant>>,
    visible: AtomicBool,
    repairing: AtomicBool,
}

impl ConnectionSupervisor {
    pub fn new(
        config: SupervisorConfig,
        transport: Arc<dyn RealtimeTransport>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            config,
            transport,
            user_id: user_id.into(),
            active_room: Mutex::new(None),
            last_check: Mutex::new(None),
            // A freshly loaded page is visible by definition.
            visible: AtomicBool::new(true),
            repairing: AtomicBool::new(false),
        }
    }

    pub fn set_active_room(&self, room_id: impl Into<String>) {
        *self.active_room.lock() = Some(room_id.into());
        *self.last_check.lock() = None;
    }

    pub fn clear_active_room(&self) {
        *self.active_room.lock() = None;
        *self.last_check.lock() = None;
    }

    /// When the connection was last checked, if it has been since the active
    /// view changed.
    pub fn last_checked_at(&self) -> Option<tokio::time::Instant> {
        *self.last_check.lock()
    }

    pub fn active_room(&self) -> Option<String> {
        self.active_room.lock().clone()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    /// Background transition: suppress liveness chatter, never disconnect.
    pub fn mark_background(&self) {
        self.visible.store(false, Ordering::SeqCst);
        debug!("connection marked background");
    }

    /// Check the transport and repair it if needed.
    ///
    /// Connected: mark visible, nothing else. Not connected: connect, wait
    /// the grace delay, rejoin the active room if one is set. Only one
    /// repair runs at a time; overlapping calls return immediately.
    pub async fn ensure_connected(&self) {
        *self.last_check.lock() = Some(tokio::time::Instant::now());
        if self.transport.is_connected() {
            self.visible.store(true, Ordering::SeqCst);
            return;
        }
        if self
            .repairing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("repair already in flight");
            return;
        }
        self.repair().await;
        self.repairing.store(false, Ordering::SeqCst);
    }

    async fn repair(&self) {
        info!("transport disconnected, repairing");
        if let Err(err) = self.transport.connect().await {
            warn!(error = %err, "reconnect failed, next liveness tick retries");
            return;
        }
        self.visible.store(true, Ordering::SeqCst);
        tokio::time::sleep(self.config.rejoin_grace()).await;
        let room = self.active_room();
        if let Some(room) = room {
            match self.transport.join_room(&room, &self.user_id).await {
                Ok(()) => info!(room = %room, "room rejoined after reconnect"),
                Err(err) => warn!(room = %room, error = %err, "rejoin failed, next tick retries"),
            }
        }
    }

    /// Start the foreground liveness poll. The task re-runs
    /// `ensure_connected` every interval while the page is visible and stops
    /// when the returned guard drops.
    pub fn spawn_liveness(self: &Arc<Self>) -> LivenessGuard {
        let supervisor = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(supervisor.config.liveness_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; consume it so the first
            // check lands one interval from now.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if supervisor.is_visible() {
                    supervisor.ensure_connected().await;
                }
            }
        });
        LivenessGuard { handle }
    }
}

/// Aborts the liveness task when dropped (view teardown).
pub struct LivenessGuard {
    handle: JoinHandle<()>,
}

impl Drop for LivenessGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
