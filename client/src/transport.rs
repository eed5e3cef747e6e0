//! The realtime transport seam.
//!
//! The socket layer is an external collaborator; the supervisor drives it
//! only through this trait. `detach_room_listeners` is client-local: it
//! drops this page's handlers without leaving the room server-side, and
//! `join_room` on an already-joined room is idempotent.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("join failed for room {room}: {reason}")]
    Join { room: String, reason: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;

    async fn disconnect(&self);

    async fn join_room(&self, room_id: &str, user_id: &str) -> Result<(), TransportError>;

    /// Drop this page's room listeners. Server-side membership survives.
    fn detach_room_listeners(&self);
}
