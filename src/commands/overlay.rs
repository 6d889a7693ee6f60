use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tauri::{command, State};

use crate::controller::InitInfo;
use crate::dispatch::CommandDispatcher;
use crate::errors::{BridgeError, OverlayError};
use crate::events::ListenerRegistry;
use crate::platform::HostGeometry;
use crate::types::{CameraDirection, DisplayRotation, Size, ViewBounds};

/// Plugin state managed by Tauri.
pub struct OverlayState {
    pub dispatcher: CommandDispatcher,
    /// Geometry shared with the web view host on the UI thread.
    pub geometry: Arc<RwLock<HostGeometry>>,
    pub listeners: Arc<ListenerRegistry>,
}

impl OverlayState {
    pub fn update_geometry(&self, update: impl FnOnce(&mut HostGeometry)) {
        let mut geometry = self.geometry.write().unwrap_or_else(|e| e.into_inner());
        update(&mut geometry);
    }
}

/// Geometry the page reports whenever its layout changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    pub bounds: ViewBounds,
    /// Display rotation in degrees (0, 90, 180 or 270).
    #[serde(default)]
    pub rotation: u32,
    #[serde(default)]
    pub camera_view: Option<Size>,
    #[serde(default)]
    pub display: Option<Size>,
}

impl LayoutReport {
    pub fn apply_to(&self, geometry: &mut HostGeometry) -> Result<(), OverlayError> {
        let rotation = DisplayRotation::from_degrees(self.rotation).ok_or_else(|| {
            OverlayError::InvalidArgument(format!("Invalid display rotation {}", self.rotation))
        })?;
        geometry.available = self.bounds.size();
        geometry.camera_view = self.camera_view.unwrap_or_default();
        geometry.display = self.display.unwrap_or_default();
        geometry.rotation = rotation;
        Ok(())
    }
}

/// Enumerate cameras, requesting camera permission first if needed
#[command]
pub async fn init(state: State<'_, OverlayState>) -> Result<InitInfo, BridgeError> {
    state.dispatcher.init().await.map_err(|e| {
        log::error!("init failed: {}", e);
        BridgeError::from(e)
    })
}

/// Start the preview behind the page
#[command]
pub async fn start_camera(
    state: State<'_, OverlayState>,
    direction: Option<CameraDirection>,
    zoom: Option<f64>,
) -> Result<(), BridgeError> {
    let direction = direction.unwrap_or(state.dispatcher.default_direction());
    state
        .dispatcher
        .start_camera(direction, zoom)
        .await
        .map_err(BridgeError::from)
}

#[command]
pub async fn stop_camera(state: State<'_, OverlayState>) -> Result<(), BridgeError> {
    state.dispatcher.stop_camera().await.map_err(BridgeError::from)
}

#[command]
pub async fn set_zoom(state: State<'_, OverlayState>, zoom: Option<f64>) -> Result<(), BridgeError> {
    state.dispatcher.set_zoom(zoom).await.map_err(BridgeError::from)
}

/// Generic entry point taking an action name and positional arguments
#[command]
pub async fn execute(
    state: State<'_, OverlayState>,
    action: String,
    args: Option<Vec<Value>>,
) -> Result<Value, BridgeError> {
    let args = args.unwrap_or_default();
    state
        .dispatcher
        .execute(&action, &args)
        .await
        .map_err(BridgeError::from)
}

/// Record new page geometry and re-layout a running preview
#[command]
pub async fn report_layout(
    state: State<'_, OverlayState>,
    report: LayoutReport,
) -> Result<(), BridgeError> {
    let mut result = Ok(());
    state.update_geometry(|geometry| result = report.apply_to(geometry));
    result?;
    state
        .dispatcher
        .layout_change(report.bounds)
        .await
        .map_err(BridgeError::from)
}

/// The page's preview surface is ready; resumes a suspended preview
#[command]
pub async fn surface_available(
    state: State<'_, OverlayState>,
    surface_id: Option<u64>,
) -> Result<(), BridgeError> {
    state.update_geometry(|geometry| geometry.surface = Some(surface_id.unwrap_or(0)));
    state
        .dispatcher
        .surface_available()
        .await
        .map_err(BridgeError::from)
}

/// Host went to the background
#[command]
pub async fn pause(state: State<'_, OverlayState>) -> Result<(), BridgeError> {
    state.update_geometry(|geometry| geometry.surface = None);
    state.dispatcher.pause().await.map_err(BridgeError::from)
}

#[command]
pub async fn resume(state: State<'_, OverlayState>) -> Result<(), BridgeError> {
    state.dispatcher.resume().await.map_err(BridgeError::from)
}
