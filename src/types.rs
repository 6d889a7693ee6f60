//! Plain data shared by the selector, the layout math and the controller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::OverlayError;

/// Index of a camera as reported by the backend.
pub type CameraId = u32;

/// Camera1 facing constant for a back camera.
pub const CAMERA_FACING_BACK: i32 = 0;
/// Camera1 facing constant for a front camera.
pub const CAMERA_FACING_FRONT: i32 = 1;

/// A width/height pair used for resolutions and for view dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Combined width + height, the footprint the size selector compares.
    pub fn footprint(&self) -> i64 {
        self.width as i64 + self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Same size rotated by 90 degrees.
    pub fn transposed(&self) -> Self {
        Self::new(self.height, self.width)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = OverlayError;

    /// Parses `WIDTHxHEIGHT`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| OverlayError::InvalidArgument(format!("Invalid size '{}'", s)))?;
        let width = w
            .parse::<u32>()
            .map_err(|e| OverlayError::InvalidArgument(format!("Invalid width '{}': {}", w, e)))?;
        let height = h
            .parse::<u32>()
            .map_err(|e| OverlayError::InvalidArgument(format!("Invalid height '{}': {}", h, e)))?;
        Ok(Self::new(width, height))
    }
}

/// A preview resolution with an optional still-picture resolution of the same
/// aspect ratio. `picture` is `None` when the device offers no compatible
/// picture size; the preview size is still usable in that case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizePair {
    pub preview: Size,
    pub picture: Option<Size>,
}

impl SizePair {
    pub fn new(preview: Size, picture: Option<Size>) -> Self {
        Self { preview, picture }
    }

    pub fn preview_aspect_ratio(&self) -> f32 {
        self.preview.aspect_ratio()
    }

    /// Picture size to configure on the device, falling back to the preview size.
    pub fn effective_picture(&self) -> Size {
        self.picture.unwrap_or(self.preview)
    }
}

/// Camera mounting direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CameraDirection {
    Back,
    Front,
}

impl CameraDirection {
    pub const ALL: [CameraDirection; 2] = [CameraDirection::Back, CameraDirection::Front];

    /// Facing constant the backend reports for this direction.
    pub fn facing(&self) -> i32 {
        match self {
            CameraDirection::Back => CAMERA_FACING_BACK,
            CameraDirection::Front => CAMERA_FACING_FRONT,
        }
    }

    pub fn from_facing(facing: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.facing() == facing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraDirection::Back => "BACK",
            CameraDirection::Front => "FRONT",
        }
    }
}

impl fmt::Display for CameraDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CameraDirection {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BACK" => Ok(CameraDirection::Back),
            "FRONT" => Ok(CameraDirection::Front),
            other => Err(OverlayError::InvalidArgument(format!(
                "Unknown camera direction '{}'",
                other
            ))),
        }
    }
}

/// Rotation of the display relative to its natural orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayRotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl DisplayRotation {
    pub const ALL: [DisplayRotation; 4] = [
        DisplayRotation::Rotation0,
        DisplayRotation::Rotation90,
        DisplayRotation::Rotation180,
        DisplayRotation::Rotation270,
    ];

    pub fn degrees(&self) -> u32 {
        match self {
            DisplayRotation::Rotation0 => 0,
            DisplayRotation::Rotation90 => 90,
            DisplayRotation::Rotation180 => 180,
            DisplayRotation::Rotation270 => 270,
        }
    }

    pub fn from_degrees(degrees: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.degrees() == degrees % 360)
    }

    /// Natural (0) and upside-down (180) rotations are portrait.
    pub fn is_portrait(&self) -> bool {
        matches!(self, DisplayRotation::Rotation0 | DisplayRotation::Rotation180)
    }
}

/// Static description of one camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInfo {
    /// Raw facing value; see [`CameraDirection::from_facing`].
    pub facing: i32,
    /// Clockwise rotation of the sensor image relative to the device, in degrees.
    pub orientation: u32,
}

/// Zoom capability of an open camera, in device zoom indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub current: u32,
    pub max: u32,
}

pub const FOCUS_MODE_CONTINUOUS_VIDEO: &str = "continuous-video";

/// Mutable parameter block of an open camera.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraParameters {
    pub preferred_preview_size_for_video: Option<Size>,
    pub supported_preview_sizes: Vec<Size>,
    pub supported_picture_sizes: Vec<Size>,
    pub preview_size: Option<Size>,
    pub picture_size: Option<Size>,
    pub supported_focus_modes: Vec<String>,
    pub focus_mode: Option<String>,
    /// `None` when the camera cannot zoom.
    pub zoom: Option<ZoomRange>,
}

impl CameraParameters {
    pub fn supports_focus_mode(&self, mode: &str) -> bool {
        self.supported_focus_modes.iter().any(|m| m == mode)
    }
}

/// Host view bounds as `left, top, right, bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewBounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ViewBounds {
    pub fn size(&self) -> Size {
        Size::new(
            (self.right - self.left).max(0) as u32,
            (self.bottom - self.top).max(0) as u32,
        )
    }
}
