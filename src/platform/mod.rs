//! Seams between the preview controller and the outside world.
//!
//! The controller never touches a camera API or a view hierarchy directly:
//! it talks to a [`CameraBackend`] for enumeration and opening, to the
//! [`CameraDevice`] it opened, and to a [`HostView`] for everything the host
//! UI owns. All of these live on the UI thread and need not be `Send`.

pub mod headless;
pub mod native;
pub mod webview;

use crate::config::DisplayConfig;
use crate::errors::OverlayError;
use crate::preview::ContainerLayout;
use crate::types::{CameraId, CameraInfo, CameraParameters, DisplayRotation, Size};

pub use headless::HeadlessHost;
pub use native::NativeCameraBackend;
pub use webview::{HostGeometry, WebviewHost};

/// Identifies the rendering surface the host exposes for the preview.
///
/// The surface belongs to the host; the controller only refers to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Enumerates and opens cameras.
pub trait CameraBackend {
    fn number_of_cameras(&self) -> usize;

    fn camera_info(&self, id: CameraId) -> Result<CameraInfo, OverlayError>;

    fn open(&mut self, id: CameraId) -> Result<Box<dyn CameraDevice>, OverlayError>;
}

/// An open camera. Dropping it without [`CameraDevice::release`] must still
/// free the hardware.
pub trait CameraDevice {
    fn parameters(&self) -> Result<CameraParameters, OverlayError>;

    fn set_parameters(&mut self, parameters: &CameraParameters) -> Result<(), OverlayError>;

    /// Binds the preview output to `surface`, or unbinds it with `None`.
    fn set_preview_surface(&mut self, surface: Option<SurfaceId>) -> std::io::Result<()>;

    fn set_display_orientation(&mut self, degrees: u32) -> Result<(), OverlayError>;

    fn start_preview(&mut self) -> Result<(), OverlayError>;

    fn stop_preview(&mut self) -> Result<(), OverlayError>;

    fn release(self: Box<Self>);
}

/// The host view hierarchy: the container holding camera surface and web
/// view, the display, and the activity/window lifetime.
pub trait HostView {
    /// Size of the region the container may occupy.
    fn available_size(&self) -> Size;

    /// Current size of the camera surface view.
    fn camera_view_size(&self) -> Size;

    /// Full display size in pixels.
    fn display_size(&self) -> Size;

    fn display_rotation(&self) -> DisplayRotation;

    /// Surface for the preview, once the host has made one available.
    fn surface(&self) -> Option<SurfaceId>;

    fn apply_container_layout(&mut self, layout: ContainerLayout);

    /// Transparent while previewing so the camera shows through the page.
    fn set_web_view_transparent(&mut self, transparent: bool);

    /// Takes new background and screen-on settings.
    fn apply_display_config(&mut self, _display: &DisplayConfig) {}

    /// True once the host is shutting down; no preview may start then.
    fn is_finishing(&self) -> bool {
        false
    }
}
