#[cfg(test)]
mod permissions_tests {
    use std::sync::{Arc, Mutex};
    use video_overlay::permissions::{
        check_permission, check_permission_detailed, PermissionGate, PermissionStatus,
        SystemPermissionGate, CAMERA_PERMISSION_REQUEST,
    };

    #[test]
    fn test_check_permission_is_consistent() {
        let first = check_permission();
        for _ in 0..5 {
            assert_eq!(check_permission(), first, "Permission status should be consistent");
        }
    }

    #[test]
    fn test_detailed_status_matches_simple_check() {
        let info = check_permission_detailed();
        assert_eq!(info.status, check_permission());
        assert!(!info.message.is_empty());
    }

    #[test]
    fn test_check_permission_concurrent() {
        let handles: Vec<_> = (0..10)
            .map(|_| std::thread::spawn(check_permission))
            .collect();

        for handle in handles {
            let _result = handle.join().unwrap();
        }
    }

    #[test]
    fn test_system_gate_answers_immediately() {
        let mut gate = SystemPermissionGate;
        let answered = Arc::new(Mutex::new(None));
        let sink = answered.clone();

        gate.request_camera_permission(
            CAMERA_PERMISSION_REQUEST,
            Box::new(move |results| *sink.lock().unwrap() = Some(results)),
        );

        let results = answered.lock().unwrap().take().expect("gate should answer synchronously");
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0] != PermissionStatus::Denied,
            gate.has_camera_permission()
        );
    }

    #[test]
    fn test_only_denial_blocks_the_system_gate() {
        let gate = SystemPermissionGate;
        let denied = check_permission() == PermissionStatus::Denied;
        assert_eq!(gate.has_camera_permission(), !denied);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PermissionStatus::Granted.to_string(), "granted");
        assert_eq!(PermissionStatus::Denied.to_string(), "denied");
        assert_eq!(PermissionStatus::NotDetermined.to_string(), "not_determined");
    }
}
