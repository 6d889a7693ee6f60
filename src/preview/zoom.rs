//! Mapping between the page's 1-based zoom factor and device zoom indices.

use crate::types::ZoomRange;

/// Number of page zoom steps spread across the device index range.
pub const DEFAULT_ZOOM_STEPS: u32 = 10;

/// Zoom values reported to the page by `init`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedZoom {
    pub zoom: f64,
    pub max_zoom: f64,
}

/// Reports a camera's zoom capability; both values are 0 without zoom support.
pub fn reported_zoom(range: Option<ZoomRange>, steps: u32) -> ReportedZoom {
    match range {
        Some(range) => {
            let steps = steps as f64;
            let max_zoom = (range.max as f64 + 1.0) / steps;
            let zoom = (range.current as f64 / steps + 1.0).min(max_zoom);
            ReportedZoom { zoom, max_zoom }
        }
        None => ReportedZoom {
            zoom: 0.0,
            max_zoom: 0.0,
        },
    }
}

/// Normalizes a requested zoom; missing, NaN or sub-1 values mean no zoom.
pub fn normalize_zoom(requested: Option<f64>) -> f64 {
    match requested {
        Some(z) if z.is_finite() => z.max(1.0),
        _ => 1.0,
    }
}

/// Device zoom index for a normalized zoom factor, clamped to `max_index`.
pub fn zoom_index(zoom: f64, max_index: u32, steps: u32) -> u32 {
    if max_index == 0 {
        return 0;
    }
    let scale = (steps.saturating_sub(1)) as f64 / max_index as f64;
    if scale <= 0.0 {
        return 0;
    }
    let index = ((zoom.max(1.0) - 1.0) / scale).round();
    (index as u32).min(max_index)
}
