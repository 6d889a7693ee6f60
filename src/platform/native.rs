//! Desktop camera backend on top of nokhwa.
//!
//! Desktop webcams face the user, so every device is reported as a front
//! camera with an upright sensor. Preview sizes come from the formats the
//! device accepts; still capture uses the same format list.
//!
//! Frames arrive on nokhwa's capture thread. While a preview surface is
//! attached they are decoded, turned to the display orientation, encoded and
//! passed to the backend's [`FrameSink`].

use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::OverlayError;
use crate::frames::{FrameSink, PreviewFrame, FRAME_JPEG_QUALITY};
use crate::platform::{CameraBackend, CameraDevice, SurfaceId};
use crate::types::{CameraId, CameraInfo, CameraParameters, Size, CAMERA_FACING_FRONT};
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType, Resolution},
    Buffer, CallbackCamera, Camera,
};

pub struct NativeCameraBackend {
    devices: Vec<CameraIndex>,
    frame_sink: Option<FrameSink>,
}

impl NativeCameraBackend {
    /// Backend whose frames are dropped; enough to enumerate and configure.
    pub fn new() -> Self {
        let mut backend = Self {
            devices: Vec::new(),
            frame_sink: None,
        };
        if let Err(e) = backend.refresh() {
            log::warn!("Camera enumeration failed: {}", e);
        }
        backend
    }

    /// Backend delivering preview frames to `sink`.
    pub fn with_frame_sink(sink: FrameSink) -> Self {
        Self {
            frame_sink: Some(sink),
            ..Self::new()
        }
    }

    /// Re-queries the system camera list.
    pub fn refresh(&mut self) -> Result<(), OverlayError> {
        let cameras = query(ApiBackend::Auto)
            .map_err(|e| OverlayError::Camera(format!("Failed to query cameras: {}", e)))?;
        for camera in &cameras {
            log::debug!("Found camera {}: {}", camera.index(), camera.human_name());
        }
        self.devices = cameras.into_iter().map(|c| c.index().clone()).collect();
        Ok(())
    }

    fn index_of(&self, id: CameraId) -> Result<&CameraIndex, OverlayError> {
        self.devices
            .get(id as usize)
            .ok_or_else(|| OverlayError::Camera(format!("Camera {} not found", id)))
    }
}

impl Default for NativeCameraBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the capture thread sends frames. Shared between the device on the
/// UI thread and nokhwa's callback.
struct FrameRoute {
    camera_id: CameraId,
    sink: Option<FrameSink>,
    attached: bool,
    rotation: u32,
    sequence: u64,
}

fn lock_route(route: &Mutex<FrameRoute>) -> MutexGuard<'_, FrameRoute> {
    route.lock().unwrap_or_else(|e| e.into_inner())
}

fn deliver_frame(route: &Mutex<FrameRoute>, buffer: Buffer) {
    let (sink, camera_id, rotation, sequence) = {
        let mut route = lock_route(route);
        let Some(sink) = route.sink.clone().filter(|_| route.attached) else {
            return;
        };
        route.sequence += 1;
        (sink, route.camera_id, route.rotation, route.sequence)
    };

    let resolution = buffer.resolution();
    let size = Size::new(resolution.width(), resolution.height());
    let rgb = match buffer.decode_image::<RgbFormat>() {
        Ok(image) => image.into_raw(),
        Err(e) => {
            log::debug!("Dropping undecodable frame {}: {}", sequence, e);
            return;
        }
    };

    match PreviewFrame::encode(camera_id, sequence, size, rgb, rotation, FRAME_JPEG_QUALITY) {
        Ok(frame) => sink(frame),
        Err(e) => log::debug!("Dropping frame {}: {}", sequence, e),
    }
}

impl CameraBackend for NativeCameraBackend {
    fn number_of_cameras(&self) -> usize {
        self.devices.len()
    }

    fn camera_info(&self, id: CameraId) -> Result<CameraInfo, OverlayError> {
        self.index_of(id)?;
        Ok(CameraInfo {
            facing: CAMERA_FACING_FRONT,
            orientation: 0,
        })
    }

    fn open(&mut self, id: CameraId) -> Result<Box<dyn CameraDevice>, OverlayError> {
        let index = self.index_of(id)?.clone();
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
        let route = Arc::new(Mutex::new(FrameRoute {
            camera_id: id,
            sink: self.frame_sink.clone(),
            attached: false,
            rotation: 0,
            sequence: 0,
        }));
        let callback_route = route.clone();
        let mut raw = Camera::new(index, requested)
            .map_err(|e| OverlayError::Camera(format!("Failed to open camera {}: {}", id, e)))?;

        let mut sizes: Vec<Size> = raw
            .compatible_camera_formats()
            .map_err(|e| OverlayError::Camera(format!("Failed to read camera formats: {}", e)))?
            .iter()
            .map(|f| Size::new(f.resolution().width(), f.resolution().height()))
            .collect();
        let camera = CallbackCamera::with_custom(raw, move |buffer| {
            deliver_frame(&callback_route, buffer)
        });
        // Largest first, as phones report them.
        sizes.sort_by_key(|s| std::cmp::Reverse(s.footprint()));
        sizes.dedup();

        let parameters = CameraParameters {
            preferred_preview_size_for_video: None,
            supported_preview_sizes: sizes.clone(),
            supported_picture_sizes: sizes,
            preview_size: None,
            picture_size: None,
            supported_focus_modes: Vec::new(),
            focus_mode: None,
            zoom: None,
        };

        log::info!("Opened camera {}", id);
        Ok(Box::new(NativeCameraDevice {
            id,
            camera,
            parameters,
            route,
        }))
    }
}

struct NativeCameraDevice {
    id: CameraId,
    camera: CallbackCamera,
    parameters: CameraParameters,
    route: Arc<Mutex<FrameRoute>>,
}

impl CameraDevice for NativeCameraDevice {
    fn parameters(&self) -> Result<CameraParameters, OverlayError> {
        Ok(self.parameters.clone())
    }

    fn set_parameters(&mut self, parameters: &CameraParameters) -> Result<(), OverlayError> {
        if let Some(size) = parameters.preview_size {
            if self.parameters.preview_size != Some(size) {
                self.camera
                    .set_resolution(Resolution::new(size.width, size.height))
                    .map_err(|e| {
                        OverlayError::Camera(format!("Failed to set resolution {}: {}", size, e))
                    })?;
            }
        }
        self.parameters = parameters.clone();
        Ok(())
    }

    fn set_preview_surface(&mut self, surface: Option<SurfaceId>) -> std::io::Result<()> {
        log::debug!("Camera {} preview surface: {:?}", self.id, surface);
        lock_route(&self.route).attached = surface.is_some();
        Ok(())
    }

    fn set_display_orientation(&mut self, degrees: u32) -> Result<(), OverlayError> {
        log::debug!("Camera {} display orientation {}", self.id, degrees);
        lock_route(&self.route).rotation = degrees;
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), OverlayError> {
        self.camera
            .open_stream()
            .map_err(|e| OverlayError::Camera(format!("Failed to start stream: {}", e)))
    }

    fn stop_preview(&mut self) -> Result<(), OverlayError> {
        if matches!(self.camera.is_stream_open(), Ok(false)) {
            return Ok(());
        }
        self.camera
            .stop_stream()
            .map_err(|e| OverlayError::Camera(format!("Failed to stop stream: {}", e)))
    }

    fn release(mut self: Box<Self>) {
        lock_route(&self.route).attached = false;
        if let Err(e) = self.stop_preview() {
            log::warn!("Error while releasing camera {}: {}", self.id, e);
        }
        log::info!("Released camera {}", self.id);
    }
}
