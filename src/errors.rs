use serde::Serialize;

/// Error code reported to the page when the camera permission is denied.
pub const PERMISSION_DENIED_ERROR: i32 = 20;

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("No camera available")]
    NoCameraAvailable,
    #[error("No active camera")]
    NoActiveCamera,
    #[error("Camera error: {0}")]
    Camera(String),
    #[error("Preview configuration error: {0}")]
    Configuration(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Host unavailable: {0}")]
    HostUnavailable(String),
    #[error("UI thread error: {0}")]
    UiThread(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl OverlayError {
    /// Numeric code surfaced across the bridge, if this error has one.
    pub fn code(&self) -> Option<i32> {
        match self {
            OverlayError::PermissionDenied(_) => Some(PERMISSION_DENIED_ERROR),
            _ => None,
        }
    }
}

/// Error shape returned to the web page from every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeError {
    pub code: Option<i32>,
    pub message: String,
}

impl From<OverlayError> for BridgeError {
    fn from(error: OverlayError) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for BridgeError {}
