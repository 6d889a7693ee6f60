//! In-memory adapters for the controller seams.
//!
//! Each fake is a cheap handle over shared state: keep a clone to inspect
//! what the controller did after handing another clone over. All of them
//! append to one [`CallLog`] so tests can assert ordering across seams.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::DisplayConfig;
use crate::errors::OverlayError;
use crate::permissions::{PermissionGate, PermissionResponder, PermissionStatus};
use crate::platform::{CameraBackend, CameraDevice, HostView, SurfaceId};
use crate::preview::ContainerLayout;
use crate::testing::profiles::{CameraProfile, DeviceProfile};
use crate::types::{CameraId, CameraInfo, CameraParameters, DisplayRotation, Size};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Open(CameraId),
    SetParameters(CameraId),
    SetSurface(CameraId, Option<SurfaceId>),
    SetDisplayOrientation(CameraId, u32),
    StartPreview(CameraId),
    StopPreview(CameraId),
    Release(CameraId),
    Layout(ContainerLayout),
    Transparent(bool),
    DisplayConfig(DisplayConfig),
    PermissionRequest(u32),
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: Call) {
        self.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn contains(&self, call: &Call) -> bool {
        self.lock().contains(call)
    }

    pub fn count(&self, call: &Call) -> usize {
        self.lock().iter().filter(|c| *c == call).count()
    }

    /// Index of the first call equal to `call`.
    pub fn position(&self, call: &Call) -> Option<usize> {
        self.lock().iter().position(|c| c == call)
    }

    pub fn last_layout(&self) -> Option<ContainerLayout> {
        self.lock().iter().rev().find_map(|c| match c {
            Call::Layout(layout) => Some(*layout),
            _ => None,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Failures the fake camera can be told to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Faults {
    pub fail_open: bool,
    pub fail_start_preview: bool,
    pub surface_io_error: bool,
}

struct FakeCamera {
    info: CameraInfo,
    parameters: CameraParameters,
    open: bool,
}

struct BackendState {
    cameras: Vec<FakeCamera>,
    faults: Faults,
    opens: usize,
}

/// Camera backend over a [`DeviceProfile`]. Like real hardware, a camera
/// can only be opened once until it is released.
#[derive(Clone)]
pub struct FakeCameraBackend {
    state: Arc<Mutex<BackendState>>,
    log: CallLog,
}

impl FakeCameraBackend {
    pub fn new(profile: DeviceProfile, log: CallLog) -> Self {
        let cameras = profile
            .cameras
            .into_iter()
            .map(|CameraProfile { info, parameters }| FakeCamera {
                info,
                parameters,
                open: false,
            })
            .collect();
        Self {
            state: Arc::new(Mutex::new(BackendState {
                cameras,
                faults: Faults::default(),
                opens: 0,
            })),
            log,
        }
    }

    pub fn set_faults(&self, faults: Faults) {
        self.lock().faults = faults;
    }

    /// Parameters as last written by the controller.
    pub fn parameters(&self, id: CameraId) -> Option<CameraParameters> {
        self.lock()
            .cameras
            .get(id as usize)
            .map(|c| c.parameters.clone())
    }

    pub fn is_open(&self, id: CameraId) -> bool {
        self.lock()
            .cameras
            .get(id as usize)
            .map(|c| c.open)
            .unwrap_or(false)
    }

    pub fn any_open(&self) -> bool {
        self.lock().cameras.iter().any(|c| c.open)
    }

    /// Total successful opens so far.
    pub fn open_count(&self) -> usize {
        self.lock().opens
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CameraBackend for FakeCameraBackend {
    fn number_of_cameras(&self) -> usize {
        self.lock().cameras.len()
    }

    fn camera_info(&self, id: CameraId) -> Result<CameraInfo, OverlayError> {
        self.lock()
            .cameras
            .get(id as usize)
            .map(|c| c.info)
            .ok_or_else(|| OverlayError::Camera(format!("Unknown camera {}", id)))
    }

    fn open(&mut self, id: CameraId) -> Result<Box<dyn CameraDevice>, OverlayError> {
        let mut state = self.lock();
        if state.faults.fail_open {
            return Err(OverlayError::Camera(format!("Fail to connect to camera {}", id)));
        }
        let camera = state
            .cameras
            .get_mut(id as usize)
            .ok_or_else(|| OverlayError::Camera(format!("Unknown camera {}", id)))?;
        if camera.open {
            return Err(OverlayError::Camera(format!("Camera {} already in use", id)));
        }
        camera.open = true;
        state.opens += 1;
        drop(state);

        self.log.record(Call::Open(id));
        Ok(Box::new(FakeCameraDevice {
            id,
            backend: self.clone(),
            released: false,
        }))
    }
}

struct FakeCameraDevice {
    id: CameraId,
    backend: FakeCameraBackend,
    released: bool,
}

impl FakeCameraDevice {
    fn close(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(camera) = self.backend.lock().cameras.get_mut(self.id as usize) {
            camera.open = false;
        }
        self.backend.log.record(Call::Release(self.id));
    }
}

impl CameraDevice for FakeCameraDevice {
    fn parameters(&self) -> Result<CameraParameters, OverlayError> {
        self.backend
            .parameters(self.id)
            .ok_or_else(|| OverlayError::Camera(format!("Unknown camera {}", self.id)))
    }

    fn set_parameters(&mut self, parameters: &CameraParameters) -> Result<(), OverlayError> {
        if let Some(camera) = self.backend.lock().cameras.get_mut(self.id as usize) {
            camera.parameters = parameters.clone();
        }
        self.backend.log.record(Call::SetParameters(self.id));
        Ok(())
    }

    fn set_preview_surface(&mut self, surface: Option<SurfaceId>) -> std::io::Result<()> {
        if surface.is_some() && self.backend.lock().faults.surface_io_error {
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "surface abandoned",
            ));
        }
        self.backend.log.record(Call::SetSurface(self.id, surface));
        Ok(())
    }

    fn set_display_orientation(&mut self, degrees: u32) -> Result<(), OverlayError> {
        self.backend
            .log
            .record(Call::SetDisplayOrientation(self.id, degrees));
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), OverlayError> {
        if self.backend.lock().faults.fail_start_preview {
            return Err(OverlayError::Camera("startPreview failed".to_string()));
        }
        self.backend.log.record(Call::StartPreview(self.id));
        Ok(())
    }

    fn stop_preview(&mut self) -> Result<(), OverlayError> {
        self.backend.log.record(Call::StopPreview(self.id));
        Ok(())
    }

    fn release(mut self: Box<Self>) {
        self.close();
    }
}

impl Drop for FakeCameraDevice {
    fn drop(&mut self) {
        self.close();
    }
}

#[derive(Debug, Clone)]
struct HostState {
    available: Size,
    camera_view: Size,
    display: Size,
    rotation: DisplayRotation,
    surface: Option<SurfaceId>,
    finishing: bool,
    layout: Option<ContainerLayout>,
    transparent: bool,
    display_config: Option<DisplayConfig>,
}

/// Host view with settable geometry.
#[derive(Clone)]
pub struct FakeHost {
    state: Arc<Mutex<HostState>>,
    log: CallLog,
}

impl FakeHost {
    /// A host whose view, camera view and display all have size `view`,
    /// with a surface already available.
    pub fn new(view: Size, log: CallLog) -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState {
                available: view,
                camera_view: view,
                display: view,
                rotation: DisplayRotation::Rotation0,
                surface: Some(SurfaceId(1)),
                finishing: false,
                layout: None,
                transparent: false,
                display_config: None,
            })),
            log,
        }
    }

    pub fn set_available(&self, size: Size) {
        self.lock().available = size;
    }

    pub fn set_camera_view(&self, size: Size) {
        self.lock().camera_view = size;
    }

    pub fn set_rotation(&self, rotation: DisplayRotation) {
        self.lock().rotation = rotation;
    }

    pub fn set_surface(&self, surface: Option<SurfaceId>) {
        self.lock().surface = surface;
    }

    pub fn set_finishing(&self, finishing: bool) {
        self.lock().finishing = finishing;
    }

    pub fn layout(&self) -> Option<ContainerLayout> {
        self.lock().layout
    }

    pub fn is_transparent(&self) -> bool {
        self.lock().transparent
    }

    /// Display settings last pushed by the controller.
    pub fn display_config(&self) -> Option<DisplayConfig> {
        self.lock().display_config.clone()
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HostView for FakeHost {
    fn available_size(&self) -> Size {
        self.lock().available
    }

    fn camera_view_size(&self) -> Size {
        self.lock().camera_view
    }

    fn display_size(&self) -> Size {
        self.lock().display
    }

    fn display_rotation(&self) -> DisplayRotation {
        self.lock().rotation
    }

    fn surface(&self) -> Option<SurfaceId> {
        self.lock().surface
    }

    fn apply_container_layout(&mut self, layout: ContainerLayout) {
        self.lock().layout = Some(layout);
        self.log.record(Call::Layout(layout));
    }

    fn set_web_view_transparent(&mut self, transparent: bool) {
        self.lock().transparent = transparent;
        self.log.record(Call::Transparent(transparent));
    }

    fn apply_display_config(&mut self, display: &DisplayConfig) {
        self.lock().display_config = Some(display.clone());
        self.log.record(Call::DisplayConfig(display.clone()));
    }

    fn is_finishing(&self) -> bool {
        self.lock().finishing
    }
}

/// How [`FakePermissionGate`] answers a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionAnswer {
    Grant,
    Deny,
    /// Hold the request until [`FakePermissionGate::answer_pending`].
    Defer,
    /// Drop the responder without answering.
    Abandon,
}

struct GateState {
    granted: bool,
    answer: PermissionAnswer,
    pending: Option<PermissionResponder>,
}

#[derive(Clone)]
pub struct FakePermissionGate {
    state: Arc<Mutex<GateState>>,
    log: CallLog,
}

impl FakePermissionGate {
    pub fn granted(log: CallLog) -> Self {
        Self::with_answer(true, PermissionAnswer::Grant, log)
    }

    /// Not yet granted; a request is answered with `answer`.
    pub fn missing(answer: PermissionAnswer, log: CallLog) -> Self {
        Self::with_answer(false, answer, log)
    }

    fn with_answer(granted: bool, answer: PermissionAnswer, log: CallLog) -> Self {
        Self {
            state: Arc::new(Mutex::new(GateState {
                granted,
                answer,
                pending: None,
            })),
            log,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Answers a deferred request. Returns false when none is pending.
    pub fn answer_pending(&self, results: Vec<PermissionStatus>) -> bool {
        let responder = {
            let mut state = self.lock();
            if results.iter().all(|r| *r == PermissionStatus::Granted) {
                state.granted = true;
            }
            state.pending.take()
        };
        match responder {
            Some(responder) => {
                responder(results);
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PermissionGate for FakePermissionGate {
    fn has_camera_permission(&self) -> bool {
        self.lock().granted
    }

    fn request_camera_permission(&mut self, request_code: u32, responder: PermissionResponder) {
        self.log.record(Call::PermissionRequest(request_code));
        let answer = self.lock().answer;
        match answer {
            PermissionAnswer::Grant => {
                self.lock().granted = true;
                responder(vec![PermissionStatus::Granted]);
            }
            PermissionAnswer::Deny => responder(vec![PermissionStatus::Denied]),
            PermissionAnswer::Defer => self.lock().pending = Some(responder),
            PermissionAnswer::Abandon => drop(responder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_cannot_be_opened_twice() {
        let log = CallLog::new();
        let mut backend = FakeCameraBackend::new(DeviceProfile::phone(), log.clone());
        let camera = backend.open(0).unwrap();
        assert!(backend.open(0).is_err());
        camera.release();
        assert!(!backend.is_open(0));
        assert!(backend.open(0).is_ok());
        assert_eq!(log.count(&Call::Open(0)), 2);
    }

    #[test]
    fn test_dropped_device_is_closed() {
        let mut backend = FakeCameraBackend::new(DeviceProfile::phone(), CallLog::new());
        drop(backend.open(1).unwrap());
        assert!(!backend.any_open());
    }

    #[test]
    fn test_deferred_permission_answer() {
        let log = CallLog::new();
        let mut gate = FakePermissionGate::missing(PermissionAnswer::Defer, log.clone());
        let answered = Arc::new(Mutex::new(None));
        let sink = answered.clone();
        gate.request_camera_permission(
            0,
            Box::new(move |results| *sink.lock().unwrap() = Some(results)),
        );
        assert!(gate.has_pending());
        assert!(gate.answer_pending(vec![PermissionStatus::Granted]));
        assert!(gate.has_camera_permission());
        assert_eq!(
            *answered.lock().unwrap(),
            Some(vec![PermissionStatus::Granted])
        );
        assert!(log.contains(&Call::PermissionRequest(0)));
    }
}
