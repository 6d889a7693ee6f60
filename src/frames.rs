//! Preview frames for the page.
//!
//! The camera backend encodes each frame as JPEG, already turned to the
//! display orientation, and hands it to a [`FrameSink`]. Inside the plugin
//! the sink keeps the newest frame in a [`FrameStore`], which the page reads
//! through the `videooverlay://localhost/frame` URI scheme after each
//! `video-overlay://frame` event.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tauri::http::{header, Response, StatusCode};

use crate::errors::OverlayError;
use crate::events::{PreviewEvent, PreviewListener};
use crate::types::{CameraId, Size};

/// URI scheme serving the newest frame.
pub const FRAME_PROTOCOL: &str = "videooverlay";
/// Path of the newest frame under [`FRAME_PROTOCOL`].
pub const FRAME_PATH: &str = "/frame";
/// Event announcing a new frame; the payload is the frame metadata.
pub const FRAME_EVENT: &str = "video-overlay://frame";

pub const FRAME_JPEG_QUALITY: u8 = 85;

/// Receives frames on the capture thread.
pub type FrameSink = Arc<dyn Fn(PreviewFrame) + Send + Sync>;

/// One encoded preview frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewFrame {
    pub sequence: u64,
    pub camera_id: CameraId,
    /// Dimensions after rotation.
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
    #[serde(skip)]
    pub jpeg: Vec<u8>,
}

impl PreviewFrame {
    /// Encodes packed RGB8 pixels of `size`, rotated clockwise by
    /// `rotation` degrees (0, 90, 180 or 270).
    pub fn encode(
        camera_id: CameraId,
        sequence: u64,
        size: Size,
        rgb: Vec<u8>,
        rotation: u32,
        quality: u8,
    ) -> Result<Self, OverlayError> {
        let image = image::RgbImage::from_vec(size.width, size.height, rgb)
            .ok_or_else(|| OverlayError::Camera(format!("Frame data does not fill {}", size)))?;
        let image = image::DynamicImage::ImageRgb8(image);

        let (image, size) = match rotation % 360 {
            90 => (image.rotate90(), size.transposed()),
            180 => (image.rotate180(), size),
            270 => (image.rotate270(), size.transposed()),
            _ => (image, size),
        };

        let mut jpeg = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, quality);
        image
            .write_with_encoder(encoder)
            .map_err(|e| OverlayError::Camera(format!("Failed to encode frame: {}", e)))?;

        Ok(Self {
            sequence,
            camera_id,
            width: size.width,
            height: size.height,
            captured_at: Utc::now(),
            jpeg,
        })
    }
}

/// Newest frame of the running preview. Cleared when the preview stops so
/// the page never shows a stale picture.
#[derive(Default)]
pub struct FrameStore {
    latest: RwLock<Option<Arc<PreviewFrame>>>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: PreviewFrame) -> Arc<PreviewFrame> {
        let frame = Arc::new(frame);
        *self.latest.write().unwrap_or_else(|e| e.into_inner()) = Some(frame.clone());
        frame
    }

    pub fn latest(&self) -> Option<Arc<PreviewFrame>> {
        self.latest.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear(&self) {
        *self.latest.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Answers a request on [`FRAME_PROTOCOL`].
    pub fn respond(&self, path: &str) -> Response<Vec<u8>> {
        let frame = match self.latest() {
            Some(frame) if path == FRAME_PATH => frame,
            _ => return empty_response(StatusCode::NOT_FOUND),
        };
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "image/jpeg")
            .header(header::CACHE_CONTROL, "no-store")
            .body(frame.jpeg.clone())
            .unwrap_or_else(|e| {
                log::error!("Failed to build frame response: {}", e);
                empty_response(StatusCode::INTERNAL_SERVER_ERROR)
            })
    }
}

fn empty_response(status: StatusCode) -> Response<Vec<u8>> {
    let mut response = Response::new(Vec::new());
    *response.status_mut() = status;
    response
}

impl PreviewListener for FrameStore {
    fn on_preview_started(&self, _event: &PreviewEvent) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_preview_stopped(&self, _event: &PreviewEvent) -> anyhow::Result<()> {
        self.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ListenerRegistry, PreviewEventKind};
    use crate::types::CameraDirection;

    fn gradient(size: Size) -> Vec<u8> {
        (0..size.width * size.height)
            .flat_map(|i| [(i % 256) as u8, 128, 255 - (i % 256) as u8])
            .collect()
    }

    #[test]
    fn test_encode_produces_jpeg() {
        let size = Size::new(16, 8);
        let frame = PreviewFrame::encode(0, 1, size, gradient(size), 0, FRAME_JPEG_QUALITY).unwrap();
        assert_eq!((frame.width, frame.height), (16, 8));
        assert_eq!(&frame.jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_rotates_quarter_turns() {
        let size = Size::new(16, 8);
        let frame = PreviewFrame::encode(0, 1, size, gradient(size), 90, FRAME_JPEG_QUALITY).unwrap();
        assert_eq!((frame.width, frame.height), (8, 16));

        let frame = PreviewFrame::encode(0, 2, size, gradient(size), 180, FRAME_JPEG_QUALITY).unwrap();
        assert_eq!((frame.width, frame.height), (16, 8));
    }

    #[test]
    fn test_encode_rejects_short_buffer() {
        let err = PreviewFrame::encode(0, 1, Size::new(16, 8), vec![0; 10], 0, 80).unwrap_err();
        assert!(matches!(err, OverlayError::Camera(_)));
    }

    #[test]
    fn test_store_serves_newest_frame() {
        let store = FrameStore::new();
        assert_eq!(store.respond(FRAME_PATH).status(), StatusCode::NOT_FOUND);

        let size = Size::new(8, 8);
        for sequence in 1..=2 {
            let frame = PreviewFrame::encode(0, sequence, size, gradient(size), 0, 80).unwrap();
            store.publish(frame);
        }
        assert_eq!(store.latest().unwrap().sequence, 2);

        let response = store.respond(FRAME_PATH);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(response.body(), &store.latest().unwrap().jpeg);

        assert_eq!(store.respond("/other").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_store_clears_when_preview_stops() {
        let store = Arc::new(FrameStore::new());
        let registry = ListenerRegistry::new();
        registry.register("frames", store.clone());

        let size = Size::new(8, 8);
        store.publish(PreviewFrame::encode(1, 1, size, gradient(size), 0, 80).unwrap());
        registry.notify(&PreviewEvent::new(
            PreviewEventKind::Stopped,
            CameraDirection::Front,
            1,
            uuid::Uuid::new_v4(),
        ));
        assert!(store.latest().is_none());
    }

    #[test]
    fn test_frame_metadata_skips_pixels() {
        let size = Size::new(8, 8);
        let frame = PreviewFrame::encode(3, 7, size, gradient(size), 0, 80).unwrap();
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["sequence"], 7);
        assert_eq!(json["cameraId"], 3);
        assert!(json.get("jpeg").is_none());
    }
}
