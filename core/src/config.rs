//! Tuning and route configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache generation settings for the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Bumping this retires every previously deployed cache generation.
    pub version: String,
    /// App-shell routes precached at install.
    pub shell_routes: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: "v3".to_string(),
            shell_routes: vec![
                "/".to_string(),
                "/login".to_string(),
                "/chat".to_string(),
                "/friends".to_string(),
                "/settings".to_string(),
            ],
        }
    }
}

impl CacheConfig {
    /// Name of the cache generation this version owns.
    pub fn generation_name(&self) -> String {
        format!("wakebridge-static-{}", self.version)
    }
}

/// How click destinations map onto app routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Origin used to build absolute URLs, e.g. `https://app.example`.
    pub origin: String,
    pub chat_prefix: String,
    /// Destination for clicks that name no room.
    pub landing_path: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            origin: String::new(),
            chat_prefix: "/chat".to_string(),
            landing_path: "/".to_string(),
        }
    }
}

impl RouteConfig {
    pub fn room_path(&self, room_id: &str) -> String {
        format!("{}/{}", self.chat_prefix, room_id)
    }

    pub fn absolute(&self, path: &str) -> Option<String> {
        if self.origin.is_empty() {
            return None;
        }
        Some(format!("{}{}", self.origin.trim_end_matches('/'), path))
    }
}

/// Timing knobs for the page-side supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Delay before a foreground signal is acted on. Signals arriving within
    /// the window coalesce into one transition.
    pub foreground_debounce_ms: u64,
    /// Settle time between reconnecting the transport and rejoining the
    /// active room.
    pub rejoin_grace_ms: u64,
    /// Poll period for the foreground liveness check.
    pub liveness_interval_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            foreground_debounce_ms: 100,
            rejoin_grace_ms: 300,
            liveness_interval_ms: 3000,
        }
    }
}

impl SupervisorConfig {
    pub fn foreground_debounce(&self) -> Duration {
        Duration::from_millis(self.foreground_debounce_ms)
    }

    pub fn rejoin_grace(&self) -> Duration {
        Duration::from_millis(self.rejoin_grace_ms)
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval_ms)
    }
}
