//! Testing utilities for the video overlay
//!
//! Fake camera, host and permission adapters plus synthetic device profiles,
//! enabling controller tests without camera hardware or a UI stack.

pub mod fakes;
pub mod profiles;

pub use fakes::{
    Call, CallLog, FakeCameraBackend, FakeHost, FakePermissionGate, Faults, PermissionAnswer,
};
pub use profiles::{CameraProfile, DeviceProfile, CAMERA_FACING_EXTERNAL};

use std::sync::Arc;

use crate::config::OverlayConfig;
use crate::controller::PreviewController;
use crate::events::ListenerRegistry;
use crate::types::Size;

/// A controller wired to fakes, with handles kept for inspection. Clones
/// share state, so one can be moved into a UI-thread factory.
#[derive(Clone)]
pub struct FakeRig {
    pub log: CallLog,
    pub backend: FakeCameraBackend,
    pub host: FakeHost,
    pub permissions: FakePermissionGate,
    pub listeners: Arc<ListenerRegistry>,
}

impl FakeRig {
    /// `profile` cameras, a 1280x960 host view, permission granted.
    pub fn new(profile: DeviceProfile) -> Self {
        let log = CallLog::new();
        Self {
            backend: FakeCameraBackend::new(profile, log.clone()),
            host: FakeHost::new(Size::new(1280, 960), log.clone()),
            permissions: FakePermissionGate::granted(log.clone()),
            listeners: Arc::new(ListenerRegistry::new()),
            log,
        }
    }

    pub fn with_permissions(mut self, permissions: FakePermissionGate) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn controller(&self, config: &OverlayConfig) -> PreviewController {
        PreviewController::new(
            Box::new(self.backend.clone()),
            Box::new(self.host.clone()),
            Box::new(self.permissions.clone()),
            self.listeners.clone(),
            config,
        )
    }
}
