//! End-to-end worker pipeline: install/activate cache lifecycle, push
//! decoding and coalescing, click fan-out.

use anyhow::Context;
use std::sync::Arc;
use wakebridge_core::config::{CacheConfig, RouteConfig};
use wakebridge_core::CacheStorage;
use wakebridge_core::local::{
    LocalBroadcast, LocalCacheStorage, LocalNotifications, LocalPageRegistry, LocalWorkerHost,
};
use wakebridge_core::push::NotificationDefaults;
use wakebridge_core::signal::{RoutedClickEvent, CLICK_CHANNEL};
use wakebridge_worker::{PushWorker, WorkerPlatform};

struct Harness {
    worker: PushWorker,
    storage: Arc<LocalCacheStorage>,
    host: Arc<LocalWorkerHost>,
    tray: Arc<LocalNotifications>,
    pages: Arc<LocalPageRegistry>,
    broadcast: Arc<LocalBroadcast>,
}

fn harness(storage: Arc<LocalCacheStorage>) -> Harness {
    let host = Arc::new(LocalWorkerHost::new());
    let tray = Arc::new(LocalNotifications::new());
    let pages = Arc::new(LocalPageRegistry::new());
    let broadcast = Arc::new(LocalBroadcast::new());
    let worker = PushWorker::new(
        CacheConfig::default(),
        RouteConfig {
            origin: "https://chat.example".to_string(),
            ..RouteConfig::default()
        },
        NotificationDefaults::default(),
        WorkerPlatform {
            storage: Arc::clone(&storage) as _,
            host: Arc::clone(&host) as _,
            surface: Arc::clone(&tray) as _,
            pages: Arc::clone(&pages) as _,
            broadcast: Arc::clone(&broadcast) as _,
        },
    );
    Harness {
        worker,
        storage,
        host,
        tray,
        pages,
        broadcast,
    }
}

#[tokio::test]
async fn push_coalesces_then_click_opens_a_window() {
    let h = harness(Arc::new(LocalCacheStorage::new()));

    h.worker
        .handle_push(Some(r#"{"title":"Alice","body":"hello","data":{"roomId":"room-42"}}"#));
    h.worker
        .handle_push(Some(r#"{"title":"Alice","body":"are you there?","data":{"roomId":"room-42"}}"#));

    let visible = h.tray.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].tag, "room-42");
    assert_eq!(visible[0].body, "are you there?");
    assert_eq!(h.tray.alert_count("room-42"), 2);

    h.worker
        .handle_notification_click("room-42", Some("room-42"))
        .await;

    assert_eq!(h.tray.visible_count(), 0);
    assert_eq!(
        h.pages.opened_windows(),
        vec!["https://chat.example/chat/room-42".to_string()]
    );
}

#[tokio::test]
async fn install_activate_leaves_one_generation_whatever_was_deployed_before() {
    for stale in [
        vec![],
        vec!["wakebridge-static-v2"],
        vec![
            "wakebridge-static-v1",
            "wakebridge-static-v2",
            "old-shell-cache",
            "old-api-cache",
            "wakebridge-static-v2.1",
        ],
    ] {
        let h = harness(Arc::new(LocalCacheStorage::with_existing(&stale)));

        h.worker.handle_install();
        h.worker.handle_activate();

        assert_eq!(
            h.storage.names().unwrap(),
            vec![CacheConfig::default().generation_name()],
            "stale set {stale:?} should reduce to one generation"
        );
        assert!(h.host.skip_waiting_requested());
        assert!(h.host.clients_claimed());
    }
}

#[tokio::test]
async fn click_delivers_on_both_channels_and_focuses_a_live_page() -> anyhow::Result<()> {
    let h = harness(Arc::new(LocalCacheStorage::new()));
    let (page, mut direct) = h.pages.add_page("p1");
    let mut channel = h.broadcast.subscribe(CLICK_CHANNEL);

    h.worker.handle_push(Some(r#"{"data":{"roomId":"room-7"}}"#));
    h.worker
        .handle_notification_click("room-7", Some("room-7"))
        .await;

    let direct_event = RoutedClickEvent::from_channel_message(
        &direct.recv().await.context("no direct delivery")?,
    )
    .context("direct delivery was not a click event")?;
    let channel_event = RoutedClickEvent::from_channel_message(
        &channel.recv().await.context("no broadcast delivery")?,
    )
    .context("broadcast delivery was not a click event")?;
    assert_eq!(direct_event, channel_event);
    assert_eq!(direct_event.url_to_open, "/chat/room-7");
    assert!(page.is_focused());
    assert!(h.pages.opened_windows().is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_push_presents_the_default_notification() {
    let h = harness(Arc::new(LocalCacheStorage::new()));

    h.worker.handle_push(Some("\u{1}\u{2}garbage"));

    let visible = h.tray.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "새 메시지");
    assert_eq!(visible[0].tag, "general");
}
