//! Push setup pipeline.
//!
//! Three named stages run in sequence: RegisterWorker, RequestPermission,
//! Subscribe. Registration failure is unrecoverable (without a worker there
//! is no push); everything after it degrades into a report that says push is
//! not ready.

use std::fmt;
use thiserror::Error;
use tracing::{info, warn};
use wakebridge_core::platform::{PermissionState, PlatformError, PushPlatform, PushSubscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    RegisterWorker,
    RequestPermission,
    Subscribe,
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RegisterWorker => "register-worker",
            Self::RequestPermission => "request-permission",
            Self::Subscribe => "subscribe",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("worker registration failed: {0}")]
    WorkerRegistration(#[source] PlatformError),
}

/// What the pipeline achieved. Only registration failure aborts; a partial
/// report is a normal outcome.
#[derive(Debug)]
pub struct SetupReport {
    pub permission: Option<PermissionState>,
    pub subscription: Option<PushSubscription>,
}

impl SetupReport {
    /// Whether pushes can actually arrive.
    pub fn push_ready(&self) -> bool {
        self.permission == Some(PermissionState::Granted) && self.subscription.is_some()
    }
}

/// Run the pipeline against the platform.
pub async fn run_push_setup(platform: &dyn PushPlatform) -> Result<SetupReport, SetupError> {
    info!(stage = %SetupStage::RegisterWorker, "push setup");
    platform
        .register_worker()
        .await
        .map_err(SetupError::WorkerRegistration)?;

    info!(stage = %SetupStage::RequestPermission, "push setup");
    let permission = match platform.request_permission().await {
        Ok(state) => state,
        Err(err) => {
            warn!(stage = %SetupStage::RequestPermission, error = %err, "stage failed, push not ready");
            return Ok(SetupReport {
                permission: None,
                subscription: None,
            });
        }
    };
    if permission != PermissionState::Granted {
        info!(?permission, "notification permission not granted, push not ready");
        return Ok(SetupReport {
            permission: Some(permission),
            subscription: None,
        });
    }

    info!(stage = %SetupStage::Subscribe, "push setup");
    let subscription = match platform.subscribe().await {
        Ok(subscription) => Some(subscription),
        Err(err) => {
            warn!(stage = %SetupStage::Subscribe, error = %err, "stage failed, push not ready");
            None
        }
    };

    Ok(SetupReport {
        permission: Some(permission),
        subscription,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct ScriptedPlatform {
        register: Mutex<Option<Result<(), PlatformError>>>,
        permission: Mutex<Option<Result<PermissionState, PlatformError>>>,
        subscribe: Mutex<Option<Result<PushSubscription, PlatformError>>>,
    }

    impl ScriptedPlatform {
        fn new(
            register: Result<(), PlatformError>,
            permission: Result<PermissionState, PlatformError>,
            subscribe: Result<PushSubscription, PlatformError>,
        ) -> Self {
            Self {
                register: Mutex::new(Some(register)),
                permission: Mutex::new(Some(permission)),
                subscribe: Mutex::new(Some(subscribe)),
            }
        }
    }

    #[async_trait]
    impl PushPlatform for ScriptedPlatform {
        async fn register_worker(&self) -> Result<(), PlatformError> {
            self.register.lock().take().unwrap()
        }
        async fn request_permission(&self) -> Result<PermissionState, PlatformError> {
            self.permission.lock().take().unwrap()
        }
        async fn subscribe(&self) -> Result<PushSubscription, PlatformError> {
            self.subscribe.lock().take().unwrap()
        }
    }

    fn subscription() -> PushSubscription {
        PushSubscription {
            endpoint: "https://push.example/sub-1".to_string(),
        }
    }

    #[tokio::test]
    async fn happy_path_reports_push_ready() {
        let platform = ScriptedPlatform::new(
            Ok(()),
            Ok(PermissionState::Granted),
            Ok(subscription()),
        );
        let report = run_push_setup(&platform).await.unwrap();
        assert!(report.push_ready());
        assert_eq!(
            report.subscription.unwrap().endpoint,
            "https://push.example/sub-1"
        );
    }

    #[tokio::test]
    async fn registration_failure_is_unrecoverable() {
        let platform = ScriptedPlatform::new(
            Err(PlatformError::Notification("script 404".into())),
            Ok(PermissionState::Granted),
            Ok(subscription()),
        );
        let err = run_push_setup(&platform).await.unwrap_err();
        assert!(matches!(err, SetupError::WorkerRegistration(_)));
    }

    #[tokio::test]
    async fn permission_denied_degrades_without_subscribing() {
        let platform =
            ScriptedPlatform::new(Ok(()), Ok(PermissionState::Denied), Ok(subscription()));
        let report = run_push_setup(&platform).await.unwrap();
        assert!(!report.push_ready());
        assert_eq!(report.permission, Some(PermissionState::Denied));
        assert!(report.subscription.is_none());
        // Subscribe was never consumed.
        assert!(platform.subscribe.lock().is_some());
    }

    #[tokio::test]
    async fn subscribe_failure_degrades() {
        let platform = ScriptedPlatform::new(
            Ok(()),
            Ok(PermissionState::Granted),
            Err(PlatformError::Notification("push service down".into())),
        );
        let report = run_push_setup(&platform).await.unwrap();
        assert!(!report.push_ready());
        assert_eq!(report.permission, Some(PermissionState::Granted));
    }
}
