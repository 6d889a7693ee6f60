//! Container layout for the camera surface.

use serde::{Deserialize, Serialize};

use crate::types::Size;

/// How the container is placed inside the available region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gravity {
    Center,
    Fill,
}

/// Bounding box applied to the container holding the camera surface and the
/// web view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerLayout {
    pub width: u32,
    pub height: u32,
    pub gravity: Gravity,
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl ContainerLayout {
    /// Layout used when no live feed constrains the container.
    pub fn fill(view: Size) -> Self {
        Self {
            width: view.width,
            height: view.height,
            gravity: Gravity::Fill,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Uniformly scales `preview` to fit inside `view`, centered.
    ///
    /// Sensors report landscape dimensions, so the preview is transposed in
    /// portrait before scaling. The aspect ratio is preserved; the leftover
    /// margin (letterbox) is split evenly between both sides.
    pub fn fit(preview: Size, view: Size, portrait: bool) -> Self {
        let preview = if portrait { preview.transposed() } else { preview };
        if preview.is_empty() {
            return Self::fill(view);
        }

        let preview_w = preview.width as f32;
        let preview_h = preview.height as f32;
        let view_w = view.width as f32;
        let view_h = view.height as f32;

        let scale = (view_w / preview_w).min(view_h / preview_h);
        let scaled_w = preview_w * scale;
        let scaled_h = preview_h * scale;

        Self {
            width: scaled_w as u32,
            height: scaled_h as u32,
            gravity: Gravity::Center,
            scale,
            offset_x: (view_w - scaled_w).abs() / 2.0,
            offset_y: (view_h - scaled_h).abs() / 2.0,
        }
    }
}
