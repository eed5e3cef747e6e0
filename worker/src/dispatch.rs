//! Click fan-out.
//!
//! A notification click closes the clicked slot, routes one click event to
//! every live page over two redundant channels, and brings the app to the
//! front (focusing an existing page, or opening a window when none exist).
//! Nothing in here propagates an error out of the click handler; every step
//! degrades independently.

use std::sync::Arc;
use tracing::{debug, info, warn};
use wakebridge_core::config::RouteConfig;
use wakebridge_core::platform::{ClickBroadcaster, PageRegistry};
use wakebridge_core::signal::{RoutedClickEvent, CLICK_CHANNEL};
use wakebridge_core::surface::NotificationSurface;

pub struct ClickFanout {
    routes: RouteConfig,
    surface: Arc<dyn NotificationSurface>,
    pages: Arc<dyn PageRegistry>,
    broadcast: Arc<dyn ClickBroadcaster>,
}

impl ClickFanout {
    pub fn new(
        routes: RouteConfig,
        surface: Arc<dyn NotificationSurface>,
        pages: Arc<dyn PageRegistry>,
        broadcast: Arc<dyn ClickBroadcaster>,
    ) -> Self {
        Self {
            routes,
            surface,
            pages,
            broadcast,
        }
    }

    /// Handle a click on the notification with this tag and room.
    pub async fn dispatch(&self, tag: &str, room_id: Option<&str>) {
        self.surface.close(tag);

        let event = self.build_event(room_id);
        let message = event.to_channel_message();

        let pages = self.pages.live_pages();
        let mut delivered = 0usize;
        for page in &pages {
            match page.post_message(&message) {
                Ok(()) => delivered += 1,
                Err(err) => debug!(error = %err, "direct click delivery failed"),
            }
        }
        if let Err(err) = self.broadcast.publish(CLICK_CHANNEL, &message) {
            warn!(error = %err, "broadcast click delivery failed");
        }
        info!(
            tag = %tag,
            pages = pages.len(),
            delivered,
            "click event fanned out"
        );

        if let Some(first) = pages.first() {
            if let Err(err) = first.focus() {
                debug!(error = %err, "focus request denied");
            }
        } else {
            let url = event
                .absolute_url
                .as_deref()
                .unwrap_or(&event.url_to_open)
                .to_string();
            if let Err(err) = self.pages.open_window(&url).await {
                warn!(url = %url, error = %err, "window open failed");
            }
        }
    }

    fn build_event(&self, room_id: Option<&str>) -> RoutedClickEvent {
        let path = match room_id {
            Some(room) => self.routes.room_path(room),
            None => self.routes.landing_path.clone(),
        };
        let absolute = self.routes.absolute(&path);
        RoutedClickEvent::new(room_id.map(str::to_string), path, absolute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wakebridge_core::local::{LocalBroadcast, LocalNotifications, LocalPageRegistry};
    use wakebridge_core::surface::OsNotification;

    fn fanout(
        tray: &Arc<LocalNotifications>,
        pages: &Arc<LocalPageRegistry>,
        broadcast: &Arc<LocalBroadcast>,
    ) -> ClickFanout {
        ClickFanout::new(
            RouteConfig {
                origin: "https://app.example".to_string(),
                ..RouteConfig::default()
            },
            Arc::clone(tray) as _,
            Arc::clone(pages) as _,
            Arc::clone(broadcast) as _,
        )
    }

    fn show(tray: &LocalNotifications, tag: &str) {
        tray.show(OsNotification {
            title: "t".to_string(),
            body: "b".to_string(),
            icon: "/i".to_string(),
            badge: "/bg".to_string(),
            tag: tag.to_string(),
            renotify: true,
            room_id: Some(tag.to_string()),
        })
        .unwrap();
    }

    #[tokio::test]
    async fn click_closes_delivers_on_both_channels_and_focuses() {
        let tray = Arc::new(LocalNotifications::new());
        let pages = Arc::new(LocalPageRegistry::new());
        let broadcast = Arc::new(LocalBroadcast::new());
        let fanout = fanout(&tray, &pages, &broadcast);

        show(&tray, "r1");
        let (page, mut direct) = pages.add_page("p1");
        let mut channel = broadcast.subscribe(CLICK_CHANNEL);

        fanout.dispatch("r1", Some("r1")).await;

        assert_eq!(tray.visible_count(), 0);
        let from_direct =
            RoutedClickEvent::from_channel_message(&direct.recv().await.unwrap()).unwrap();
        let from_channel =
            RoutedClickEvent::from_channel_message(&channel.recv().await.unwrap()).unwrap();
        assert_eq!(from_direct, from_channel);
        assert_eq!(from_direct.room_id.as_deref(), Some("r1"));
        assert_eq!(from_direct.url_to_open, "/chat/r1");
        assert_eq!(
            from_direct.absolute_url.as_deref(),
            Some("https://app.example/chat/r1")
        );
        assert!(page.is_focused());
        assert!(pages.opened_windows().is_empty());
    }

    #[tokio::test]
    async fn no_pages_opens_a_window_instead() {
        let tray = Arc::new(LocalNotifications::new());
        let pages = Arc::new(LocalPageRegistry::new());
        let broadcast = Arc::new(LocalBroadcast::new());
        let fanout = fanout(&tray, &pages, &broadcast);

        fanout.dispatch("r2", Some("r2")).await;

        assert_eq!(
            pages.opened_windows(),
            vec!["https://app.example/chat/r2".to_string()]
        );
    }

    #[tokio::test]
    async fn roomless_click_routes_to_the_landing_path() {
        let tray = Arc::new(LocalNotifications::new());
        let pages = Arc::new(LocalPageRegistry::new());
        let broadcast = Arc::new(LocalBroadcast::new());
        let fanout = fanout(&tray, &pages, &broadcast);
        let (_page, mut direct) = pages.add_page("p1");

        fanout.dispatch("general", None).await;

        let event = RoutedClickEvent::from_channel_message(&direct.recv().await.unwrap()).unwrap();
        assert!(event.room_id.is_none());
        assert_eq!(event.url_to_open, "/");
    }

    #[tokio::test]
    async fn every_live_page_gets_the_direct_copy() {
        let tray = Arc::new(LocalNotifications::new());
        let pages = Arc::new(LocalPageRegistry::new());
        let broadcast = Arc::new(LocalBroadcast::new());
        let fanout = fanout(&tray, &pages, &broadcast);
        let (_a, mut rx_a) = pages.add_page("a");
        let (_b, mut rx_b) = pages.add_page("b");
        let (_c, mut rx_c) = pages.add_page("c");

        fanout.dispatch("r1", Some("r1")).await;

        for rx in [&mut rx_a, &mut rx_b, &mut rx_c] {
            assert!(RoutedClickEvent::from_channel_message(&rx.recv().await.unwrap()).is_some());
        }
    }

    #[tokio::test]
    async fn denied_focus_and_failed_open_never_panic() {
        let tray = Arc::new(LocalNotifications::new());
        let pages = Arc::new(LocalPageRegistry::new());
        let broadcast = Arc::new(LocalBroadcast::new());
        let fanout = fanout(&tray, &pages, &broadcast);
        let (_page, _rx) = pages.add_unfocusable_page("p1");

        fanout.dispatch("r1", Some("r1")).await;

        let empty_pages = Arc::new(LocalPageRegistry::new());
        empty_pages.fail_open_window();
        let failing = ClickFanout::new(
            RouteConfig::default(),
            Arc::clone(&tray) as _,
            Arc::clone(&empty_pages) as _,
            Arc::clone(&broadcast) as _,
        );
        failing.dispatch("r1", Some("r1")).await;
        assert!(empty_pages.opened_windows().is_empty());
    }
}
