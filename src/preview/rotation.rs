use crate::types::{CameraDirection, DisplayRotation};

/// Clockwise angle to apply to the preview so the image appears upright.
///
/// Front sensors are mirrored relative to the screen, so their angle is
/// negated after combining sensor and display rotation.
pub fn display_orientation(
    sensor_orientation: u32,
    direction: CameraDirection,
    rotation: DisplayRotation,
) -> u32 {
    let sensor = sensor_orientation % 360;
    let degrees = rotation.degrees();
    match direction {
        CameraDirection::Front => (360 - (sensor + degrees) % 360) % 360,
        CameraDirection::Back => (sensor + 360 - degrees) % 360,
    }
}
