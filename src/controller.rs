//! The preview controller: owns the camera handle and the session state and
//! drives the host view. Lives on the UI thread.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::OverlayConfig;
use crate::errors::OverlayError;
use crate::events::{ListenerRegistry, PreviewEvent, PreviewEventKind};
use crate::permissions::{PermissionGate, PermissionResponder, PermissionStatus, CAMERA_PERMISSION_REQUEST};
use crate::platform::{CameraBackend, CameraDevice, HostView};
use crate::preview::{
    display_orientation, normalize_zoom, reported_zoom, zoom_index, ContainerLayout, SizeSelector,
};
use crate::session::{PreviewSession, PreviewState};
use crate::types::{
    CameraDirection, CameraId, SizePair, ViewBounds, ZoomRange, FOCUS_MODE_CONTINUOUS_VIDEO,
};

/// One camera as reported by `init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraSummary {
    pub id: CameraId,
    pub position: CameraDirection,
    pub zoom: f64,
    pub max_zoom: f64,
}

/// Result of `init`: display size plus one entry per camera direction found,
/// keyed `"FRONT"` / `"BACK"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitInfo {
    pub display_width: u32,
    pub display_height: u32,
    #[serde(flatten)]
    pub cameras: BTreeMap<String, CameraSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InitOutcome {
    Ready(InitInfo),
    /// A permission request is in flight; the answer goes to the responder
    /// that was passed to [`PreviewController::init`].
    PermissionRequested,
}

pub struct PreviewController {
    backend: Box<dyn CameraBackend>,
    host: Box<dyn HostView>,
    permissions: Box<dyn PermissionGate>,
    listeners: Arc<ListenerRegistry>,
    selector: SizeSelector,
    continuous_video_focus: bool,
    zoom_steps: u32,
    camera: Option<Box<dyn CameraDevice>>,
    session: PreviewSession,
    last_bounds: Option<ViewBounds>,
}

impl PreviewController {
    pub fn new(
        backend: Box<dyn CameraBackend>,
        host: Box<dyn HostView>,
        permissions: Box<dyn PermissionGate>,
        listeners: Arc<ListenerRegistry>,
        config: &OverlayConfig,
    ) -> Self {
        Self {
            backend,
            host,
            permissions,
            listeners,
            selector: config.size_selector(),
            continuous_video_focus: config.camera.continuous_video_focus,
            zoom_steps: config.camera.zoom_steps,
            camera: None,
            session: PreviewSession::new(),
            last_bounds: None,
        }
    }

    /// Takes new sizing, focus and zoom settings; a running preview keeps
    /// its current sizes until it restarts.
    pub fn apply_config(&mut self, config: &OverlayConfig) {
        self.selector = config.size_selector();
        self.continuous_video_focus = config.camera.continuous_video_focus;
        self.zoom_steps = config.camera.zoom_steps;
        self.host.apply_display_config(&config.display);
        log::debug!("Controller configuration updated");
    }

    pub fn session(&self) -> &PreviewSession {
        &self.session
    }

    pub fn listeners(&self) -> &Arc<ListenerRegistry> {
        &self.listeners
    }

    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    /// Camera id of the running preview.
    pub fn active_camera_id(&self) -> Option<CameraId> {
        if self.session.is_live() {
            self.session.camera_id()
        } else {
            None
        }
    }

    /// Enumerates cameras, or starts a permission request when camera access
    /// has not been granted yet.
    pub fn init(&mut self, responder: PermissionResponder) -> Result<InitOutcome, OverlayError> {
        if !self.permissions.has_camera_permission() {
            log::info!("Camera permission missing, requesting it");
            self.permissions
                .request_camera_permission(CAMERA_PERMISSION_REQUEST, responder);
            return Ok(InitOutcome::PermissionRequested);
        }
        self.enumerate().map(InitOutcome::Ready)
    }

    /// Handles the answer to a permission request started by [`Self::init`].
    pub fn on_permission_result(
        &mut self,
        request_code: u32,
        results: &[PermissionStatus],
    ) -> Result<InitInfo, OverlayError> {
        // Undetermined means there is nothing to deny yet (no camera
        // device); enumeration then reports what exists.
        if results.contains(&PermissionStatus::Denied) {
            log::warn!("Camera permission denied");
            return Err(OverlayError::PermissionDenied(
                "Camera permission was not granted".to_string(),
            ));
        }
        if request_code != CAMERA_PERMISSION_REQUEST {
            return Err(OverlayError::InvalidArgument(format!(
                "Unknown permission request code {}",
                request_code
            )));
        }
        self.enumerate()
    }

    fn enumerate(&mut self) -> Result<InitInfo, OverlayError> {
        let display = self.host.display_size();
        let count = self.backend.number_of_cameras();
        log::debug!("Cameras: {}", count);

        let mut cameras = BTreeMap::new();
        for id in 0..count as CameraId {
            let info = self.backend.camera_info(id)?;
            let Some(direction) = CameraDirection::from_facing(info.facing) else {
                log::debug!("Skipping camera {} with facing {}", id, info.facing);
                continue;
            };

            // Parameters are only readable from an open camera. The running
            // preview keeps its handle; any other camera is opened briefly.
            let parameters = match self.camera.as_ref() {
                Some(camera) if self.session.camera_id() == Some(id) => camera.parameters()?,
                _ => {
                    let camera = self.backend.open(id)?;
                    let parameters = camera.parameters();
                    camera.release();
                    parameters?
                }
            };

            let zoom = reported_zoom(parameters.zoom, self.zoom_steps);
            cameras.insert(
                direction.as_str().to_string(),
                CameraSummary {
                    id,
                    position: direction,
                    zoom: zoom.zoom,
                    max_zoom: zoom.max_zoom,
                },
            );
        }

        Ok(InitInfo {
            display_width: display.width,
            display_height: display.height,
            cameras,
        })
    }

    /// Camera to open for `direction`: the first with that facing, else the
    /// last camera, else none.
    fn camera_id_for(&self, direction: CameraDirection) -> Option<CameraId> {
        let count = self.backend.number_of_cameras() as CameraId;
        (0..count)
            .find(|&id| {
                self.backend
                    .camera_info(id)
                    .map(|info| info.facing == direction.facing())
                    .unwrap_or(false)
            })
            .or_else(|| count.checked_sub(1))
    }

    pub fn start_preview(&mut self, direction: CameraDirection, zoom: Option<f64>) -> Result<(), OverlayError> {
        log::debug!(
            "startPreview called {} {:?} camera view {}",
            direction,
            zoom,
            self.host.camera_view_size()
        );

        if self.host.is_finishing() {
            return Err(OverlayError::HostUnavailable("Host is finishing".to_string()));
        }

        let camera_id = self.camera_id_for(direction);

        if self.session.is_live() {
            if self.session.camera_id() != camera_id {
                self.stop_preview()?;
            } else {
                log::debug!("Camera {:?} already previewing, applying zoom", camera_id);
                return self.set_zoom(zoom);
            }
        }

        let camera_id = camera_id.ok_or(OverlayError::NoCameraAvailable)?;
        let camera = self.backend.open(camera_id).map_err(|e| {
            log::error!("Failed to open camera {}: {}", camera_id, e);
            OverlayError::NoCameraAvailable
        })?;

        self.session.begin_open(direction, camera_id)?;
        self.camera = Some(camera);

        match self.configure_and_start(direction, camera_id, zoom) {
            Ok(()) => Ok(()),
            Err(e) => {
                log::error!("Error during preview create: {}", e);
                if let Some(camera) = self.camera.take() {
                    camera.release();
                }
                self.session.reset();
                self.host.set_web_view_transparent(false);
                self.reset_container_layout();
                let detail = match e {
                    OverlayError::Camera(message) => message,
                    other => other.to_string(),
                };
                Err(OverlayError::Camera(format!("videoOverlay: {}", detail)))
            }
        }
    }

    fn configure_and_start(
        &mut self,
        direction: CameraDirection,
        camera_id: CameraId,
        zoom: Option<f64>,
    ) -> Result<(), OverlayError> {
        let size_pair = self.configure_camera()?;
        let session_id = self.session.mark_previewing(size_pair)?;

        self.update_display_orientation()?;
        self.update_container_layout();

        self.camera_mut()?.start_preview()?;
        self.host.set_web_view_transparent(true);

        if let Err(e) = self.set_zoom(zoom) {
            log::warn!("Unable to apply zoom {:?}: {}", zoom, e);
        }

        log::info!(
            "Preview started on camera {} ({}) at {}",
            camera_id,
            direction,
            size_pair.preview
        );
        self.listeners.notify(&PreviewEvent::new(
            PreviewEventKind::Started,
            direction,
            camera_id,
            session_id,
        ));
        Ok(())
    }

    /// Applies focus mode and preview/picture sizes and attaches the surface.
    fn configure_camera(&mut self) -> Result<SizePair, OverlayError> {
        let desired = self.host.camera_view_size();
        let surface = self.host.surface();
        let selector = self.selector;
        let continuous_video_focus = self.continuous_video_focus;
        let camera = self.camera_mut()?;

        let mut parameters = camera.parameters()?;
        if continuous_video_focus && parameters.supports_focus_mode(FOCUS_MODE_CONTINUOUS_VIDEO) {
            parameters.focus_mode = Some(FOCUS_MODE_CONTINUOUS_VIDEO.to_string());
        }

        let size_pair = selector
            .select(
                parameters.preferred_preview_size_for_video,
                &parameters.supported_preview_sizes,
                &parameters.supported_picture_sizes,
                desired,
            )
            .ok_or_else(|| {
                OverlayError::Configuration("Camera reports no preview sizes".to_string())
            })?;

        log::debug!("preview size: {}", size_pair.preview);
        parameters.preview_size = Some(size_pair.preview);
        parameters.picture_size = Some(size_pair.effective_picture());
        log::debug!("picture size: {}", size_pair.effective_picture());
        camera.set_parameters(&parameters)?;

        if let Some(surface) = surface {
            if let Err(e) = camera.set_preview_surface(Some(surface)) {
                log::error!("Unable to attach preview to camera: {}", e);
            }
        }

        Ok(size_pair)
    }

    pub fn stop_preview(&mut self) -> Result<(), OverlayError> {
        log::debug!("stopPreview called");

        if !self.session.is_live() {
            // A stop while backgrounded cancels the pending resume.
            if self.session.state() == PreviewState::Suspended {
                self.session.reset();
            }
            return Ok(());
        }

        self.session.begin_stop()?;
        let direction = self.session.direction();
        let camera_id = self.session.camera_id();
        let session_id = self.session.session_id();

        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_preview() {
                log::warn!("Failed to stop preview: {}", e);
            }
            if let Err(e) = camera.set_preview_surface(None) {
                log::warn!("Failed to detach preview surface: {}", e);
            }
            if let (Some(direction), Some(camera_id), Some(session_id)) = (direction, camera_id, session_id) {
                self.listeners.notify(&PreviewEvent::new(
                    PreviewEventKind::Stopped,
                    direction,
                    camera_id,
                    session_id,
                ));
            }
            camera.release();
        }

        self.host.set_web_view_transparent(false);
        self.reset_container_layout();
        self.session.reset();
        log::info!("Preview stopped");
        Ok(())
    }

    pub fn set_zoom(&mut self, zoom: Option<f64>) -> Result<(), OverlayError> {
        let zoom = normalize_zoom(zoom);

        if self.session.state() == PreviewState::Suspended {
            self.session.set_zoom(zoom);
            return Ok(());
        }

        let steps = self.zoom_steps;
        let camera = self.camera.as_mut().ok_or(OverlayError::NoActiveCamera)?;
        let mut parameters = camera.parameters()?;
        let Some(range) = parameters.zoom else {
            log::debug!("Zoom not supported, ignoring");
            return Ok(());
        };

        let index = zoom_index(zoom, range.max, steps);
        parameters.zoom = Some(ZoomRange { current: index, ..range });
        camera.set_parameters(&parameters)?;
        self.session.set_zoom(zoom);
        log::debug!("Zoom {} -> device index {}", zoom, index);
        Ok(())
    }

    /// Host went to the background: release the camera but remember what to
    /// resume.
    pub fn on_pause(&mut self) {
        if self.session.is_live() {
            let direction = self.session.direction();
            let camera_id = self.session.camera_id();
            if let Err(e) = self.stop_preview() {
                log::warn!("Failed to stop preview on pause: {}", e);
            }
            if let (Some(direction), Some(camera_id)) = (direction, camera_id) {
                self.session.suspend(direction, camera_id);
                log::info!("Preview suspended ({})", direction);
            }
        }
        self.session.set_paused(true);
    }

    /// Host is back in the foreground. The preview itself restarts from
    /// [`Self::on_surface_available`].
    pub fn on_resume(&mut self) {
        self.session.set_paused(false);
    }

    /// The rendering surface is ready; resumes a suspended preview.
    pub fn on_surface_available(&mut self) -> Result<(), OverlayError> {
        match self.session.resume_target() {
            Some((direction, zoom)) => {
                log::info!("Surface available, resuming {} preview", direction);
                self.session.reset();
                self.start_preview(direction, Some(zoom))
            }
            None => Ok(()),
        }
    }

    /// Re-applies the container layout when the host bounds change.
    pub fn on_layout_change(&mut self, bounds: ViewBounds) {
        if self.last_bounds == Some(bounds) {
            return;
        }
        log::debug!(
            "layout change: {}:{}:{}:{}",
            bounds.left,
            bounds.top,
            bounds.right,
            bounds.bottom
        );
        self.last_bounds = Some(bounds);
        if self.session.is_live() {
            self.update_container_layout();
            if let Err(e) = self.update_display_orientation() {
                log::warn!("Failed to update display orientation: {}", e);
            }
        }
    }

    /// Stops any preview; called before the UI thread exits.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.stop_preview() {
            log::warn!("Failed to stop preview on shutdown: {}", e);
        }
        if let Some(camera) = self.camera.take() {
            camera.release();
        }
        self.session.reset();
    }

    fn camera_mut(&mut self) -> Result<&mut Box<dyn CameraDevice>, OverlayError> {
        self.camera.as_mut().ok_or(OverlayError::NoActiveCamera)
    }

    fn update_display_orientation(&mut self) -> Result<(), OverlayError> {
        let (Some(camera_id), Some(direction)) = (self.session.camera_id(), self.session.direction()) else {
            return Ok(());
        };
        let info = self.backend.camera_info(camera_id)?;
        let degrees = display_orientation(info.orientation, direction, self.host.display_rotation());
        self.camera_mut()?.set_display_orientation(degrees)?;
        log::info!("Camera display orientation: {}", degrees);
        Ok(())
    }

    fn update_container_layout(&mut self) {
        let Some(size_pair) = self.session.size_pair() else {
            return;
        };
        let layout = ContainerLayout::fit(
            size_pair.preview,
            self.host.available_size(),
            self.host.display_rotation().is_portrait(),
        );
        log::debug!(
            "Container size {}x{} (scale {:.3})",
            layout.width,
            layout.height,
            layout.scale
        );
        self.host.apply_container_layout(layout);
    }

    fn reset_container_layout(&mut self) {
        let layout = ContainerLayout::fill(self.host.available_size());
        self.host.apply_container_layout(layout);
    }
}

impl Drop for PreviewController {
    fn drop(&mut self) {
        if let Some(camera) = self.camera.take() {
            log::debug!("Releasing camera held by dropped controller");
            camera.release();
        }
    }
}
