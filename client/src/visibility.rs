//! Visibility state machine.
//!
//! Nine lifecycle signal sources fold into two directions. Became-visible
//! schedules one debounced foreground transition; became-hidden transitions
//! to background immediately and cancels any pending foreground timer. The
//! foreground flag is last-write-wins.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Every lifecycle signal the page can observe, plus the synthetic one a
/// routed notification click produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    DocumentVisible,
    DocumentHidden,
    WindowFocus,
    WindowBlur,
    PageShow,
    PageHide,
    AppResume,
    AppPause,
    NotificationClick,
}

impl LifecycleSignal {
    /// Which direction this signal points.
    pub fn is_visible(self) -> bool {
        matches!(
            self,
            Self::DocumentVisible
                | Self::WindowFocus
                | Self::PageShow
                | Self::AppResume
                | Self::NotificationClick
        )
    }
}

/// Side effects of visibility transitions.
///
/// `entered_foreground` fires on every debounced foreground moment, even
/// when the page was already foreground: a notification click while visible
/// still clears notifications and re-checks the connection.
/// `entered_background` fires only on an actual transition out of
/// foreground.
pub trait VisibilityObserver: Send + Sync {
    fn entered_foreground(&self);
    fn entered_background(&self);
}

/// Debouncing visibility machine. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct VisibilityMachine {
    inner: Arc<Inner>,
}

struct Inner {
    debounce: Duration,
    foreground: AtomicBool,
    pending: Mutex<Option<JoinHandle<()>>>,
    observer: Arc<dyn VisibilityObserver>,
}

impl VisibilityMachine {
    pub fn new(debounce: Duration, observer: Arc<dyn VisibilityObserver>) -> Self {
        Self {
            inner: Arc::new(Inner {
                debounce,
                // A page that just loaded is visible by definition.
                foreground: AtomicBool::new(true),
                pending: Mutex::new(None),
                observer,
            }),
        }
    }

    pub fn is_foreground(&self) -> bool {
        self.inner.foreground.load(Ordering::SeqCst)
    }

    pub fn signal(&self, signal: LifecycleSignal) {
        debug!(?signal, "lifecycle signal");
        if signal.is_visible() {
            self.schedule_foreground();
        } else {
            self.enter_background();
        }
    }

    /// Schedule the debounced foreground transition. Signals arriving while
    /// a timer is pending coalesce into it.
    fn schedule_foreground(&self) {
        let mut pending = self.inner.pending.lock();
        if let Some(handle) = pending.as_ref() {
            if !handle.is_finished() {
                return;
            }
        }
        let inner = Arc::clone(&self.inner);
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            inner.foreground.store(true, Ordering::SeqCst);
            inner.observer.entered_foreground();
        }));
    }

    /// Immediate background transition; cancels a pending foreground timer.
    fn enter_background(&self) {
        if let Some(handle) = self.inner.pending.lock().take() {
            handle.abort();
        }
        let was_foreground = self.inner.foreground.swap(false, Ordering::SeqCst);
        if was_foreground {
            self.inner.observer.entered_background();
        }
    }
}
