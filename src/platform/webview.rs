//! Host adapter for a Tauri web view.
//!
//! The page reports its geometry through commands; the computed container
//! layout and background state go back to the page as events, where the page
//! positions the preview element behind its transparent content.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use crate::config::DisplayConfig;
use crate::platform::{HostView, SurfaceId};
use crate::preview::ContainerLayout;
use crate::types::{DisplayRotation, Size};

pub const LAYOUT_EVENT: &str = "video-overlay://layout";
pub const BACKGROUND_EVENT: &str = "video-overlay://background";

/// Sends a named JSON event to the page.
pub type EventSink = Arc<dyn Fn(&str, serde_json::Value) + Send + Sync>;

/// Geometry last reported by the page.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostGeometry {
    pub available: Size,
    pub camera_view: Size,
    pub display: Size,
    pub rotation: DisplayRotation,
    #[serde(skip)]
    pub surface: Option<u64>,
    #[serde(skip)]
    pub finishing: bool,
}

pub struct WebviewHost {
    geometry: Arc<RwLock<HostGeometry>>,
    emit: EventSink,
    display: DisplayConfig,
    transparent: bool,
}

impl WebviewHost {
    pub fn new(geometry: Arc<RwLock<HostGeometry>>, emit: EventSink, display: DisplayConfig) -> Self {
        Self {
            geometry,
            emit,
            display,
            transparent: false,
        }
    }

    fn geometry(&self) -> RwLockReadGuard<'_, HostGeometry> {
        self.geometry.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl HostView for WebviewHost {
    fn available_size(&self) -> Size {
        self.geometry().available
    }

    fn camera_view_size(&self) -> Size {
        let geometry = self.geometry();
        if geometry.camera_view.is_empty() {
            geometry.available
        } else {
            geometry.camera_view
        }
    }

    fn display_size(&self) -> Size {
        let geometry = self.geometry();
        if geometry.display.is_empty() {
            geometry.available
        } else {
            geometry.display
        }
    }

    fn display_rotation(&self) -> DisplayRotation {
        self.geometry().rotation
    }

    fn surface(&self) -> Option<SurfaceId> {
        self.geometry().surface.map(SurfaceId)
    }

    fn apply_container_layout(&mut self, layout: ContainerLayout) {
        let payload = match serde_json::to_value(layout) {
            Ok(value) => value,
            Err(e) => {
                log::error!("Failed to serialize container layout: {}", e);
                return;
            }
        };
        (self.emit)(LAYOUT_EVENT, payload);
    }

    fn set_web_view_transparent(&mut self, transparent: bool) {
        self.transparent = transparent;
        let color = if transparent {
            "transparent"
        } else {
            self.display.opaque_background.as_str()
        };
        // The screen stays on only while frames are showing.
        let keep_screen_on = transparent && self.display.keep_screen_on;
        (self.emit)(
            BACKGROUND_EVENT,
            json!({ "transparent": transparent, "color": color, "keepScreenOn": keep_screen_on }),
        );
    }

    fn apply_display_config(&mut self, display: &DisplayConfig) {
        self.display = display.clone();
        // Re-announce so the page picks up the new colour right away.
        self.set_web_view_transparent(self.transparent);
    }

    fn is_finishing(&self) -> bool {
        self.geometry().finishing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn host_with_log() -> (WebviewHost, Arc<Mutex<Vec<(String, serde_json::Value)>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink_log = log.clone();
        let sink: EventSink = Arc::new(move |name: &str, value: serde_json::Value| {
            sink_log.lock().unwrap().push((name.to_string(), value));
        });
        let geometry = Arc::new(RwLock::new(HostGeometry {
            available: Size::new(800, 600),
            ..Default::default()
        }));
        let display = crate::config::OverlayConfig::default().display;
        (WebviewHost::new(geometry, sink, display), log)
    }

    #[test]
    fn test_camera_view_defaults_to_available_size() {
        let (host, _) = host_with_log();
        assert_eq!(host.camera_view_size(), Size::new(800, 600));
        assert_eq!(host.display_size(), Size::new(800, 600));
        assert!(host.surface().is_none());
    }

    #[test]
    fn test_layout_is_emitted() {
        let (mut host, log) = host_with_log();
        host.apply_container_layout(ContainerLayout::fill(Size::new(800, 600)));
        let events = log.lock().unwrap();
        assert_eq!(events[0].0, LAYOUT_EVENT);
        assert_eq!(events[0].1["gravity"], "fill");
        assert_eq!(events[0].1["width"], 800);
    }

    #[test]
    fn test_background_event_carries_color() {
        let (mut host, log) = host_with_log();
        host.set_web_view_transparent(true);
        host.set_web_view_transparent(false);
        let events = log.lock().unwrap();
        assert_eq!(events[0].0, BACKGROUND_EVENT);
        assert_eq!(events[0].1["color"], "transparent");
        assert_eq!(events[0].1["keepScreenOn"], true);
        assert_eq!(events[1].1["color"], "#000000");
        assert_eq!(events[1].1["keepScreenOn"], false);
    }

    #[test]
    fn test_display_config_update_is_announced_and_used() {
        let (mut host, log) = host_with_log();
        host.set_web_view_transparent(true);

        let display = DisplayConfig {
            keep_screen_on: false,
            opaque_background: "#FFFFFF".to_string(),
        };
        host.apply_display_config(&display);
        host.set_web_view_transparent(false);

        let events = log.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].1["transparent"], true);
        assert_eq!(events[1].1["keepScreenOn"], false);
        assert_eq!(events[2].1["color"], "#FFFFFF");
    }
}
