//! Preview / picture size selection.
//!
//! Preview and picture sizes are chosen together: on some hardware a picture
//! size with a different aspect ratio than the preview size distorts the
//! preview image, so each preview size is paired with a picture size of the
//! same aspect ratio whenever the device offers one.

use crate::types::{Size, SizePair};

/// Two aspect ratios closer than this are considered equal.
pub const ASPECT_RATIO_TOLERANCE: f32 = 0.01;
/// Largest picture/preview width ratio accepted for a paired picture size.
pub const MAX_PICTURE_SCALE: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeSelector {
    pub aspect_ratio_tolerance: f32,
    pub max_picture_scale: f32,
}

impl Default for SizeSelector {
    fn default() -> Self {
        Self {
            aspect_ratio_tolerance: ASPECT_RATIO_TOLERANCE,
            max_picture_scale: MAX_PICTURE_SCALE,
        }
    }
}

impl SizeSelector {
    pub fn new(aspect_ratio_tolerance: f32, max_picture_scale: f32) -> Self {
        Self {
            aspect_ratio_tolerance,
            max_picture_scale,
        }
    }

    /// Picks the picture size to pair with `preview`, if any.
    ///
    /// Picture sizes are walked in device order. The smallest one between 1x
    /// and `max_picture_scale` times the preview width wins; until such a size
    /// shows up, the first smaller one ends the search.
    pub fn matching_picture_size(&self, preview: Size, picture_sizes: &[Size]) -> Option<Size> {
        if preview.is_empty() {
            return None;
        }

        let preview_ratio = preview.aspect_ratio();
        let mut best: Option<Size> = None;
        let mut best_scale = f32::MAX;

        for &picture in picture_sizes {
            if picture.is_empty() {
                continue;
            }
            if (preview_ratio - picture.aspect_ratio()).abs() >= self.aspect_ratio_tolerance {
                continue;
            }

            let scale = picture.width as f32 / preview.width as f32;
            if (1.0..=self.max_picture_scale).contains(&scale)
                && (best.is_none() || scale < best_scale)
            {
                best = Some(picture);
                best_scale = scale;
                if scale == 1.0 {
                    break;
                }
            } else if scale < 1.0 && best_scale > self.max_picture_scale {
                best = Some(picture);
                break;
            }
        }

        best
    }

    /// Builds the candidate list. Preview sizes without a matching picture
    /// size are dropped; if that leaves nothing, every preview size is kept
    /// with no picture size.
    pub fn valid_size_pairs(&self, preview_sizes: &[Size], picture_sizes: &[Size]) -> Vec<SizePair> {
        let mut pairs: Vec<SizePair> = preview_sizes
            .iter()
            .filter_map(|&preview| {
                self.matching_picture_size(preview, picture_sizes)
                    .map(|picture| SizePair::new(preview, Some(picture)))
            })
            .collect();

        if pairs.is_empty() {
            log::debug!("No preview sizes have a corresponding same-aspect-ratio picture size");
            pairs = preview_sizes
                .iter()
                .map(|&preview| SizePair::new(preview, None))
                .collect();
        }

        pairs
    }

    /// Selects the preview/picture pair that best fits `desired`.
    ///
    /// An exact match on `preferred` wins outright. Otherwise the largest
    /// preview whose width + height does not exceed the desired width +
    /// height is taken, first seen on ties. If every candidate is larger than
    /// the desired footprint the smallest candidate is returned. Returns
    /// `None` only when the device reports no preview sizes.
    pub fn select(
        &self,
        preferred: Option<Size>,
        preview_sizes: &[Size],
        picture_sizes: &[Size],
        desired: Size,
    ) -> Option<SizePair> {
        let candidates = self.valid_size_pairs(preview_sizes, picture_sizes);

        if let Some(preferred) = preferred {
            if let Some(pair) = candidates.iter().find(|p| p.preview == preferred) {
                log::debug!("Using preferred preview size {}", preferred);
                return Some(*pair);
            }
        }

        let require_picture = !picture_sizes.is_empty() && candidates.iter().any(|p| p.picture.is_some());
        let admissible: Vec<&SizePair> = candidates
            .iter()
            .filter(|p| !require_picture || p.picture.is_some())
            .collect();

        let mut selected: Option<&SizePair> = None;
        let mut min_diff = i64::MAX;
        for pair in &admissible {
            let diff = desired.footprint() - pair.preview.footprint();
            if diff >= 0 && diff < min_diff {
                selected = Some(pair);
                min_diff = diff;
            }
        }

        if selected.is_none() {
            selected = admissible
                .iter()
                .copied()
                .min_by_key(|p| p.preview.footprint());
            if let Some(pair) = selected {
                log::warn!(
                    "No preview size fits within {}, falling back to smallest size {}",
                    desired,
                    pair.preview
                );
            }
        }

        selected.copied()
    }
}

/// [`SizeSelector::select`] with the default tolerances.
pub fn select_size_pair(
    preferred: Option<Size>,
    preview_sizes: &[Size],
    picture_sizes: &[Size],
    desired: Size,
) -> Option<SizePair> {
    SizeSelector::default().select(preferred, preview_sizes, picture_sizes, desired)
}
