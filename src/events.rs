//! Preview lifecycle notifications for cooperating components.
//!
//! Components that share the camera (a torch control, a snapshot tool)
//! register a [`PreviewListener`] under a name. Notification is best effort:
//! a failing or panicking listener is logged and skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::types::{CameraDirection, CameraId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewEventKind {
    Started,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewEvent {
    pub kind: PreviewEventKind,
    pub direction: CameraDirection,
    pub camera_id: CameraId,
    /// Identifies one start..stop span of the preview.
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl PreviewEvent {
    pub fn new(
        kind: PreviewEventKind,
        direction: CameraDirection,
        camera_id: CameraId,
        session_id: Uuid,
    ) -> Self {
        Self {
            kind,
            direction,
            camera_id,
            session_id,
            timestamp: Utc::now(),
        }
    }
}

pub trait PreviewListener: Send + Sync {
    fn on_preview_started(&self, event: &PreviewEvent) -> anyhow::Result<()>;

    fn on_preview_stopped(&self, event: &PreviewEvent) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<Vec<(String, Arc<dyn PreviewListener>)>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` under `name`, replacing any previous one.
    pub fn register(&self, name: impl Into<String>, listener: Arc<dyn PreviewListener>) {
        let name = name.into();
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        listeners.retain(|(n, _)| *n != name);
        log::debug!("Registered preview listener '{}'", name);
        listeners.push((name, listener));
    }

    pub fn unregister(&self, name: &str) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|(n, _)| n != name);
        before != listeners.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.listeners.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `event` to every listener. Never fails.
    pub fn notify(&self, event: &PreviewEvent) {
        // Snapshot so listeners may (un)register from inside a callback.
        let listeners: Vec<(String, Arc<dyn PreviewListener>)> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        for (name, listener) in listeners {
            let result = catch_unwind(AssertUnwindSafe(|| match event.kind {
                PreviewEventKind::Started => listener.on_preview_started(event),
                PreviewEventKind::Stopped => listener.on_preview_stopped(event),
            }));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::debug!("Preview listener '{}' failed: {}", name, e),
                Err(_) => log::debug!("Preview listener '{}' panicked", name),
            }
        }
    }
}

/// Forwards preview events to the page as `video-overlay://preview-started`
/// and `video-overlay://preview-stopped`.
pub struct PageEventListener {
    emit: crate::platform::webview::EventSink,
}

pub const PREVIEW_STARTED_EVENT: &str = "video-overlay://preview-started";
pub const PREVIEW_STOPPED_EVENT: &str = "video-overlay://preview-stopped";

impl PageEventListener {
    pub fn new(emit: crate::platform::webview::EventSink) -> Self {
        Self { emit }
    }

    fn forward(&self, name: &str, event: &PreviewEvent) -> anyhow::Result<()> {
        (self.emit)(name, serde_json::to_value(event)?);
        Ok(())
    }
}

impl PreviewListener for PageEventListener {
    fn on_preview_started(&self, event: &PreviewEvent) -> anyhow::Result<()> {
        self.forward(PREVIEW_STARTED_EVENT, event)
    }

    fn on_preview_stopped(&self, event: &PreviewEvent) -> anyhow::Result<()> {
        self.forward(PREVIEW_STOPPED_EVENT, event)
    }
}
