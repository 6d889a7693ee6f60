//! Preview session state.
//!
//! ```text
//! Idle -> Opening -> Previewing -> Stopping -> Idle
//!                         |
//!                      suspend          (host backgrounded, camera released)
//!                         v
//!                     Suspended -> Opening   (surface available again)
//! ```

use uuid::Uuid;

use crate::errors::OverlayError;
use crate::types::{CameraDirection, CameraId, SizePair};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Idle,
    Opening,
    Previewing,
    Stopping,
    /// Camera released while backgrounded; the preview resumes once the
    /// surface is available again.
    Suspended,
}

#[derive(Debug, Clone)]
pub struct PreviewSession {
    state: PreviewState,
    camera_id: Option<CameraId>,
    direction: Option<CameraDirection>,
    size_pair: Option<SizePair>,
    zoom: f64,
    paused: bool,
    session_id: Option<Uuid>,
}

impl Default for PreviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewSession {
    pub fn new() -> Self {
        Self {
            state: PreviewState::Idle,
            camera_id: None,
            direction: None,
            size_pair: None,
            zoom: 1.0,
            paused: false,
            session_id: None,
        }
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    pub fn camera_id(&self) -> Option<CameraId> {
        self.camera_id
    }

    pub fn direction(&self) -> Option<CameraDirection> {
        self.direction
    }

    pub fn size_pair(&self) -> Option<SizePair> {
        self.size_pair
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True while frames flow, and while suspended with the intent to resume.
    pub fn is_previewing(&self) -> bool {
        matches!(self.state, PreviewState::Previewing | PreviewState::Suspended)
    }

    pub fn is_live(&self) -> bool {
        self.state == PreviewState::Previewing
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    pub fn begin_open(&mut self, direction: CameraDirection, camera_id: CameraId) -> Result<(), OverlayError> {
        match self.state {
            PreviewState::Idle | PreviewState::Suspended => {
                self.state = PreviewState::Opening;
                self.direction = Some(direction);
                self.camera_id = Some(camera_id);
                Ok(())
            }
            other => Err(invalid_transition(other, PreviewState::Opening)),
        }
    }

    pub fn mark_previewing(&mut self, size_pair: SizePair) -> Result<Uuid, OverlayError> {
        if self.state != PreviewState::Opening {
            return Err(invalid_transition(self.state, PreviewState::Previewing));
        }
        let session_id = Uuid::new_v4();
        self.state = PreviewState::Previewing;
        self.size_pair = Some(size_pair);
        self.session_id = Some(session_id);
        Ok(session_id)
    }

    pub fn begin_stop(&mut self) -> Result<(), OverlayError> {
        if self.state != PreviewState::Previewing {
            return Err(invalid_transition(self.state, PreviewState::Stopping));
        }
        self.state = PreviewState::Stopping;
        Ok(())
    }

    /// Back to idle, forgetting the camera. Valid from any state.
    pub fn reset(&mut self) {
        self.state = PreviewState::Idle;
        self.camera_id = None;
        self.size_pair = None;
        self.session_id = None;
    }

    /// Keeps direction, camera and zoom so the preview can resume later.
    pub fn suspend(&mut self, direction: CameraDirection, camera_id: CameraId) {
        self.state = PreviewState::Suspended;
        self.direction = Some(direction);
        self.camera_id = Some(camera_id);
        self.size_pair = None;
        self.session_id = None;
    }

    /// Direction and zoom to restart with, if a resume is pending.
    pub fn resume_target(&self) -> Option<(CameraDirection, f64)> {
        match (self.state, self.direction) {
            (PreviewState::Suspended, Some(direction)) => Some((direction, self.zoom)),
            _ => None,
        }
    }
}

fn invalid_transition(from: PreviewState, to: PreviewState) -> OverlayError {
    OverlayError::Configuration(format!("Invalid preview transition {:?} -> {:?}", from, to))
}
