use crate::platform::{HostView, SurfaceId};
use crate::preview::ContainerLayout;
use crate::types::{DisplayRotation, Size};

/// Host with a fixed-size virtual view, used by the CLI.
///
/// A surface is always available; layout changes are only logged.
pub struct HeadlessHost {
    view: Size,
    rotation: DisplayRotation,
    layout: ContainerLayout,
    transparent: bool,
}

impl HeadlessHost {
    pub fn new(view: Size, rotation: DisplayRotation) -> Self {
        Self {
            view,
            rotation,
            layout: ContainerLayout::fill(view),
            transparent: false,
        }
    }

    pub fn layout(&self) -> ContainerLayout {
        self.layout
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }
}

impl HostView for HeadlessHost {
    fn available_size(&self) -> Size {
        self.view
    }

    fn camera_view_size(&self) -> Size {
        self.view
    }

    fn display_size(&self) -> Size {
        self.view
    }

    fn display_rotation(&self) -> DisplayRotation {
        self.rotation
    }

    fn surface(&self) -> Option<SurfaceId> {
        Some(SurfaceId(0))
    }

    fn apply_container_layout(&mut self, layout: ContainerLayout) {
        log::info!(
            "Container layout {}x{} ({:?}, scale {:.3})",
            layout.width,
            layout.height,
            layout.gravity,
            layout.scale
        );
        self.layout = layout;
    }

    fn set_web_view_transparent(&mut self, transparent: bool) {
        log::debug!("Web view transparent: {}", transparent);
        self.transparent = transparent;
    }
}
