//! Configuration management for the video overlay
//!
//! Settings are read from a TOML file; a missing file yields the defaults.

use crate::errors::OverlayError;
use crate::preview::sizes::{ASPECT_RATIO_TOLERANCE, MAX_PICTURE_SCALE};
use crate::preview::zoom::DEFAULT_ZOOM_STEPS;
use crate::preview::SizeSelector;
use crate::types::CameraDirection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    pub camera: CameraConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

/// Camera selection and preview sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Direction used when a caller does not name one ("FRONT" or "BACK")
    pub default_direction: String,
    /// Aspect ratios closer than this are treated as equal
    pub aspect_ratio_tolerance: f32,
    /// Largest picture/preview width ratio for a paired picture size
    pub max_picture_scale: f32,
    /// Switch to continuous-video focus when the camera supports it
    pub continuous_video_focus: bool,
    /// Page zoom steps spread over the device zoom range
    pub zoom_steps: u32,
}

/// Host view appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Ask the host to keep the screen on while the overlay is loaded
    pub keep_screen_on: bool,
    /// Web view background while no preview is running (#RRGGBB)
    pub opaque_background: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// env_logger filter used when RUST_LOG is unset
    pub filter: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                default_direction: "BACK".to_string(),
                aspect_ratio_tolerance: ASPECT_RATIO_TOLERANCE,
                max_picture_scale: MAX_PICTURE_SCALE,
                continuous_video_focus: true,
                zoom_steps: DEFAULT_ZOOM_STEPS,
            },
            display: DisplayConfig {
                keep_screen_on: true,
                opaque_background: "#000000".to_string(),
            },
            logging: LoggingConfig {
                filter: "video_overlay=info".to_string(),
            },
        }
    }
}

impl OverlayConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, OverlayError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| OverlayError::Config(format!("Failed to read config file: {}", e)))?;

        let config: OverlayConfig = toml::from_str(&contents)
            .map_err(|e| OverlayError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate().map_err(OverlayError::Config)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), OverlayError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    OverlayError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| OverlayError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| OverlayError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("video-overlay.toml")
    }

    /// Load from default location, falling back to defaults on any error
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        self.default_direction()?;

        let tolerance = self.camera.aspect_ratio_tolerance;
        if tolerance.is_nan() || tolerance <= 0.0 || tolerance > 0.5 {
            return Err("Aspect ratio tolerance must be in (0.0, 0.5]".to_string());
        }
        let scale = self.camera.max_picture_scale;
        if scale.is_nan() || scale < 1.0 {
            return Err("Max picture scale must be at least 1.0".to_string());
        }
        if self.camera.zoom_steps < 2 {
            return Err("Zoom steps must be at least 2".to_string());
        }

        let bg = &self.display.opaque_background;
        if bg.len() != 7 || !bg.starts_with('#') || !bg[1..].chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("Invalid background color '{}' (expected #RRGGBB)", bg));
        }

        if self.logging.filter.trim().is_empty() {
            return Err("Logging filter must not be empty".to_string());
        }

        Ok(())
    }

    pub fn default_direction(&self) -> Result<CameraDirection, String> {
        self.camera
            .default_direction
            .parse::<CameraDirection>()
            .map_err(|e| e.to_string())
    }

    pub fn size_selector(&self) -> SizeSelector {
        SizeSelector::new(self.camera.aspect_ratio_tolerance, self.camera.max_picture_scale)
    }
}
