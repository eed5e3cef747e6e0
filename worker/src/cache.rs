//! Cache generation lifecycle.
//!
//! Install precaches the app shell into the current generation and requests
//! immediate activation; activate deletes every other generation and claims
//! the open pages. After activate, exactly one generation survives no matter
//! how many stale deploys preceded it.

use std::sync::Arc;
use tracing::{info, warn};
use wakebridge_core::config::CacheConfig;
use wakebridge_core::platform::{CacheStorage, PlatformError, WorkerHost};

pub struct CacheVersionManager {
    config: CacheConfig,
    storage: Arc<dyn CacheStorage>,
    host: Arc<dyn WorkerHost>,
}

impl CacheVersionManager {
    pub fn new(
        config: CacheConfig,
        storage: Arc<dyn CacheStorage>,
        host: Arc<dyn WorkerHost>,
    ) -> Self {
        Self {
            config,
            storage,
            host,
        }
    }

    pub fn generation_name(&self) -> String {
        self.config.generation_name()
    }

    /// Install: precache the shell, then request immediate activation.
    ///
    /// Precache is all-or-nothing; a failed precache leaves the old worker
    /// serving and the old generation intact. Activation is requested either
    /// way so a shell regression cannot wedge the worker on an old version.
    pub fn handle_install(&self) -> Result<(), PlatformError> {
        let generation = self.generation_name();
        let result = self
            .storage
            .open(&generation)
            .and_then(|bucket| bucket.add_all(&self.config.shell_routes));
        match &result {
            Ok(()) => info!(
                generation = %generation,
                routes = self.config.shell_routes.len(),
                "app shell precached"
            ),
            Err(err) => warn!(generation = %generation, error = %err, "precache failed"),
        }
        self.host.skip_waiting();
        result
    }

    /// Activate: purge every generation other than the current one, then
    /// claim all open pages.
    ///
    /// Purging is best-effort per bucket; one failed delete never blocks
    /// activation or the claim.
    pub fn handle_activate(&self) {
        let keep = self.generation_name();
        match self.storage.names() {
            Ok(names) => {
                for name in names.into_iter().filter(|n| *n != keep) {
                    match self.storage.delete(&name) {
                        Ok(_) => info!(cache = %name, "stale cache purged"),
                        Err(err) => warn!(cache = %name, error = %err, "stale cache purge failed"),
                    }
                }
            }
            Err(err) => warn!(error = %err, "cache enumeration failed"),
        }
        self.host.claim_clients();
    }
}
