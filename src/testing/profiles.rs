//! Synthetic camera profiles modelled on common handset hardware, so the
//! controller can be exercised without a device.

use crate::types::{
    CameraInfo, CameraParameters, Size, ZoomRange, CAMERA_FACING_BACK, CAMERA_FACING_FRONT,
    FOCUS_MODE_CONTINUOUS_VIDEO,
};

/// Facing value outside the two known directions (an external camera).
pub const CAMERA_FACING_EXTERNAL: i32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct CameraProfile {
    pub info: CameraInfo,
    pub parameters: CameraParameters,
}

/// The cameras of one device, indexed by camera id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceProfile {
    pub name: &'static str,
    pub cameras: Vec<CameraProfile>,
}

fn sizes(list: &[(u32, u32)]) -> Vec<Size> {
    list.iter().map(|&(w, h)| Size::new(w, h)).collect()
}

impl DeviceProfile {
    /// Back camera (sensor mounted at 90 degrees, zoom 0..=59) and a front
    /// camera (270 degrees, no zoom), listed back first.
    pub fn phone() -> Self {
        Self {
            name: "phone",
            cameras: vec![Self::phone_back(), Self::phone_front()],
        }
    }

    /// Same cameras as [`Self::phone`] with the front camera listed first.
    pub fn phone_front_first() -> Self {
        Self {
            name: "phone-front-first",
            cameras: vec![Self::phone_front(), Self::phone_back()],
        }
    }

    /// A single front camera, as on small tablets.
    pub fn front_only() -> Self {
        Self {
            name: "front-only",
            cameras: vec![Self::phone_front()],
        }
    }

    /// Two cameras whose facing matches neither direction.
    pub fn external_only() -> Self {
        let mut first = Self::phone_front();
        first.info.facing = CAMERA_FACING_EXTERNAL;
        let mut second = Self::phone_back();
        second.info.facing = CAMERA_FACING_EXTERNAL;
        Self {
            name: "external-only",
            cameras: vec![first, second],
        }
    }

    /// No cameras at all.
    pub fn empty() -> Self {
        Self {
            name: "empty",
            cameras: Vec::new(),
        }
    }

    pub fn phone_back() -> CameraProfile {
        CameraProfile {
            info: CameraInfo {
                facing: CAMERA_FACING_BACK,
                orientation: 90,
            },
            parameters: CameraParameters {
                preferred_preview_size_for_video: Some(Size::new(1920, 1080)),
                supported_preview_sizes: sizes(&[
                    (1920, 1080),
                    (1280, 720),
                    (960, 720),
                    (640, 480),
                    (320, 240),
                ]),
                supported_picture_sizes: sizes(&[
                    (4032, 3024),
                    (3264, 2448),
                    (1920, 1080),
                    (1280, 720),
                    (640, 480),
                ]),
                supported_focus_modes: vec![
                    "auto".to_string(),
                    FOCUS_MODE_CONTINUOUS_VIDEO.to_string(),
                    "continuous-picture".to_string(),
                ],
                focus_mode: Some("auto".to_string()),
                zoom: Some(ZoomRange { current: 0, max: 59 }),
                ..Default::default()
            },
        }
    }

    pub fn phone_front() -> CameraProfile {
        CameraProfile {
            info: CameraInfo {
                facing: CAMERA_FACING_FRONT,
                orientation: 270,
            },
            parameters: CameraParameters {
                preferred_preview_size_for_video: None,
                supported_preview_sizes: sizes(&[(1280, 720), (640, 480)]),
                supported_picture_sizes: sizes(&[(2560, 1440), (1280, 720), (640, 480)]),
                supported_focus_modes: vec!["fixed".to_string()],
                focus_mode: Some("fixed".to_string()),
                zoom: None,
                ..Default::default()
            },
        }
    }
}
