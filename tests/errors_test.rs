#[cfg(test)]
mod error_tests {
    use std::error::Error;
    use video_overlay::errors::{BridgeError, OverlayError, PERMISSION_DENIED_ERROR};

    #[test]
    fn test_permission_denied_carries_code() {
        let error = OverlayError::PermissionDenied("Camera permission was not granted".to_string());
        assert_eq!(error.code(), Some(PERMISSION_DENIED_ERROR));
        assert_eq!(PERMISSION_DENIED_ERROR, 20);
        assert!(error.to_string().contains("Permission denied"));
    }

    #[test]
    fn test_no_camera_message() {
        assert_eq!(OverlayError::NoCameraAvailable.to_string(), "No camera available");
        assert_eq!(OverlayError::NoCameraAvailable.code(), None);
    }

    #[test]
    fn test_only_permission_errors_have_codes() {
        let errors = vec![
            OverlayError::NoCameraAvailable,
            OverlayError::NoActiveCamera,
            OverlayError::Camera("Camera error".to_string()),
            OverlayError::Configuration("Configuration error".to_string()),
            OverlayError::InvalidArgument("invalid action".to_string()),
            OverlayError::HostUnavailable("Host error".to_string()),
            OverlayError::UiThread("UI thread error".to_string()),
            OverlayError::Config("Config error".to_string()),
        ];

        for error in errors {
            assert_eq!(error.code(), None, "{:?} should have no code", error);
            assert!(!error.to_string().is_empty());
            assert!(!format!("{:?}", error).is_empty());
        }
    }

    #[test]
    fn test_overlay_error_implements_error_trait() {
        let error = OverlayError::Camera("Error trait test".to_string());
        let _error_trait: &dyn Error = &error;
        assert!(error.source().is_none());
    }

    #[test]
    fn test_bridge_error_from_overlay_error() {
        let bridge = BridgeError::from(OverlayError::PermissionDenied("denied".to_string()));
        assert_eq!(bridge.code, Some(20));
        assert_eq!(bridge.message, "Permission denied: denied");
        assert_eq!(bridge.to_string(), "[20] Permission denied: denied");

        let bridge = BridgeError::from(OverlayError::InvalidArgument("invalid action".to_string()));
        assert_eq!(bridge.code, None);
        assert_eq!(bridge.to_string(), "Invalid argument: invalid action");
    }

    #[test]
    fn test_bridge_error_serializes_for_page() {
        let bridge = BridgeError::from(OverlayError::NoCameraAvailable);
        let json = serde_json::to_value(&bridge).unwrap();
        assert_eq!(json["code"], serde_json::Value::Null);
        assert_eq!(json["message"], "No camera available");
    }
}
