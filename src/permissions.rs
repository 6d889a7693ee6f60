//! Camera permission checks and the asynchronous request flow.

/// Request code used for the camera permission request.
pub const CAMERA_PERMISSION_REQUEST: u32 = 0;

/// Permission status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,
    /// Permission denied
    Denied,
    /// Permission not determined (user hasn't been asked yet)
    NotDetermined,
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
        }
    }
}

/// Detailed permission information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PermissionInfo {
    pub status: PermissionStatus,
    pub message: String,
}

/// Delivers the outcome of a permission request, once, from any thread.
pub type PermissionResponder = Box<dyn FnOnce(Vec<PermissionStatus>) + Send>;

/// Runtime permission boundary of the host.
pub trait PermissionGate {
    fn has_camera_permission(&self) -> bool;

    /// Starts a permission request. The result arrives later through
    /// `responder`; dropping it unanswered abandons the request.
    fn request_camera_permission(&mut self, request_code: u32, responder: PermissionResponder);
}

/// Permission gate backed by the operating system's camera access rules.
///
/// Desktop systems have no interactive grant, so a request re-checks the
/// current state and answers immediately.
#[derive(Debug, Default)]
pub struct SystemPermissionGate;

impl PermissionGate for SystemPermissionGate {
    /// Only an explicit denial blocks; an undetermined state (no device
    /// yet) lets enumeration report the cameras that are there.
    fn has_camera_permission(&self) -> bool {
        check_permission() != PermissionStatus::Denied
    }

    fn request_camera_permission(&mut self, request_code: u32, responder: PermissionResponder) {
        let info = check_permission_detailed();
        log::info!(
            "Camera permission request {}: {} ({})",
            request_code,
            info.status,
            info.message
        );
        responder(vec![info.status]);
    }
}

/// Check camera permission status
pub fn check_permission() -> PermissionStatus {
    check_permission_detailed().status
}

/// Check camera permission status with detailed information
pub fn check_permission_detailed() -> PermissionInfo {
    #[cfg(target_os = "linux")]
    {
        check_permission_linux()
    }

    #[cfg(target_os = "windows")]
    {
        check_permission_windows()
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        PermissionInfo {
            status: PermissionStatus::Granted,
            message: "Camera access is granted by the system on first use".to_string(),
        }
    }
}

#[cfg(target_os = "windows")]
fn check_permission_windows() -> PermissionInfo {
    // Privacy settings hide devices from enumeration when access is off.
    match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
        Ok(devices) if !devices.is_empty() => PermissionInfo {
            status: PermissionStatus::Granted,
            message: "Camera access granted via Windows Privacy settings".to_string(),
        },
        Ok(_) => PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "No cameras found - permission may not be granted".to_string(),
        },
        Err(e) => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!("Camera access denied: {}", e),
        },
    }
}

#[cfg(target_os = "linux")]
fn check_permission_linux() -> PermissionInfo {
    use std::path::Path;

    let first_device = (0..10)
        .map(|i| format!("/dev/video{}", i))
        .find(|path| Path::new(path).exists());

    let Some(device) = first_device else {
        return PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "No video devices found at /dev/video*".to_string(),
        };
    };

    // Root and users with device ACLs can read the node without the group.
    if std::fs::File::open(&device).is_ok() {
        return PermissionInfo {
            status: PermissionStatus::Granted,
            message: format!("Camera access granted ({} is readable)", device),
        };
    }

    match linux_video_group_member() {
        Some(false) => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!(
                "Camera device {} exists but user not in video group - run: sudo usermod -a -G video $USER",
                device
            ),
        },
        Some(true) => PermissionInfo {
            status: PermissionStatus::Granted,
            message: format!("Camera access granted (user in video group, {} found)", device),
        },
        None => PermissionInfo {
            status: PermissionStatus::Granted,
            message: format!("Group membership unknown, assuming access to {}", device),
        },
    }
}

/// `None` when the group list cannot be read.
#[cfg(target_os = "linux")]
fn linux_video_group_member() -> Option<bool> {
    let output = std::process::Command::new("groups").output().ok()?;
    let groups = String::from_utf8(output.stdout).ok()?;
    Some(
        groups
            .split_whitespace()
            .any(|g| g == "video" || g == "plugdev"),
    )
}
