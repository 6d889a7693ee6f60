//! Preview lifecycle tests against fake camera, host and permission adapters.

use std::sync::{Arc, Mutex};

use video_overlay::config::OverlayConfig;
use video_overlay::controller::{InitOutcome, PreviewController};
use video_overlay::errors::{OverlayError, PERMISSION_DENIED_ERROR};
use video_overlay::events::{PreviewEvent, PreviewEventKind, PreviewListener};
use video_overlay::permissions::{PermissionStatus, CAMERA_PERMISSION_REQUEST};
use video_overlay::platform::SurfaceId;
use video_overlay::preview::Gravity;
use video_overlay::session::PreviewState;
use video_overlay::testing::{
    Call, DeviceProfile, FakePermissionGate, FakeRig, Faults, PermissionAnswer,
};
use video_overlay::types::{CameraDirection, DisplayRotation, Size, ViewBounds};

fn rig() -> FakeRig {
    FakeRig::new(DeviceProfile::phone())
}

fn started(rig: &FakeRig, direction: CameraDirection) -> PreviewController {
    let mut controller = rig.controller(&OverlayConfig::default());
    controller.start_preview(direction, None).unwrap();
    controller
}

#[derive(Default)]
struct RecordingListener(Mutex<Vec<PreviewEvent>>);

impl PreviewListener for RecordingListener {
    fn on_preview_started(&self, event: &PreviewEvent) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn on_preview_stopped(&self, event: &PreviewEvent) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod start_tests {
    use super::*;

    #[test]
    fn test_start_back_camera_sequence() {
        let rig = rig();
        let controller = started(&rig, CameraDirection::Back);

        assert_eq!(controller.active_camera_id(), Some(0));
        assert!(controller.session().is_live());
        assert!(rig.backend.is_open(0));
        assert!(rig.host.is_transparent());

        let open = rig.log.position(&Call::Open(0)).unwrap();
        let surface = rig.log.position(&Call::SetSurface(0, Some(SurfaceId(1)))).unwrap();
        let orientation = rig.log.position(&Call::SetDisplayOrientation(0, 90)).unwrap();
        let start = rig.log.position(&Call::StartPreview(0)).unwrap();
        let transparent = rig.log.position(&Call::Transparent(true)).unwrap();
        assert!(open < surface);
        assert!(surface < orientation);
        assert!(orientation < start);
        assert!(start < transparent);
    }

    #[test]
    fn test_start_applies_selected_sizes_and_focus() {
        let rig = rig();
        let _controller = started(&rig, CameraDirection::Back);

        let parameters = rig.backend.parameters(0).unwrap();
        // The video-preferred size is offered directly.
        assert_eq!(parameters.preview_size, Some(Size::new(1920, 1080)));
        assert_eq!(parameters.picture_size, Some(Size::new(1920, 1080)));
        assert_eq!(parameters.focus_mode.as_deref(), Some("continuous-video"));
    }

    #[test]
    fn test_front_camera_without_preferred_size() {
        let rig = rig();
        let controller = started(&rig, CameraDirection::Front);

        assert_eq!(controller.active_camera_id(), Some(1));
        let parameters = rig.backend.parameters(1).unwrap();
        assert_eq!(parameters.preview_size, Some(Size::new(1280, 720)));
        assert_eq!(parameters.picture_size, Some(Size::new(1280, 720)));
        // Fixed-focus camera keeps its mode.
        assert_eq!(parameters.focus_mode.as_deref(), Some("fixed"));
        assert!(rig.log.contains(&Call::SetDisplayOrientation(1, 90)));
    }

    #[test]
    fn test_portrait_layout_is_letterboxed() {
        let rig = rig();
        let _controller = started(&rig, CameraDirection::Back);

        // 1920x1080 stands up as 1080x1920 in a 1280x960 portrait view.
        let layout = rig.host.layout().unwrap();
        assert_eq!(layout.gravity, Gravity::Center);
        assert_eq!((layout.width, layout.height), (540, 960));
        assert_eq!(layout.offset_x, 370.0);
        assert_eq!(layout.offset_y, 0.0);
    }

    #[test]
    fn test_missing_direction_falls_back_to_last_camera() {
        let rig = FakeRig::new(DeviceProfile::external_only());
        let controller = started(&rig, CameraDirection::Back);
        assert_eq!(controller.active_camera_id(), Some(1));
        assert!(rig.log.contains(&Call::Open(1)));
    }

    #[test]
    fn test_no_camera_available() {
        let rig = FakeRig::new(DeviceProfile::empty());
        let mut controller = rig.controller(&OverlayConfig::default());
        let err = controller.start_preview(CameraDirection::Back, None).unwrap_err();
        assert!(matches!(err, OverlayError::NoCameraAvailable));
        assert_eq!(err.to_string(), "No camera available");
    }

    #[test]
    fn test_open_failure_reports_no_camera() {
        let rig = rig();
        rig.backend.set_faults(Faults {
            fail_open: true,
            ..Default::default()
        });
        let mut controller = rig.controller(&OverlayConfig::default());
        let err = controller.start_preview(CameraDirection::Back, None).unwrap_err();
        assert!(matches!(err, OverlayError::NoCameraAvailable));
        assert_eq!(controller.session().state(), PreviewState::Idle);
    }

    #[test]
    fn test_start_failure_releases_camera() {
        let rig = rig();
        rig.backend.set_faults(Faults {
            fail_start_preview: true,
            ..Default::default()
        });
        let mut controller = rig.controller(&OverlayConfig::default());
        let err = controller.start_preview(CameraDirection::Back, None).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Camera error: videoOverlay: startPreview failed"
        );
        assert!(!rig.backend.any_open());
        assert!(!controller.has_camera());
        assert_eq!(controller.session().state(), PreviewState::Idle);
        assert!(!rig.log.contains(&Call::Transparent(true)));
    }

    #[test]
    fn test_start_failure_restores_fill_layout() {
        let rig = rig();
        rig.host.set_rotation(DisplayRotation::Rotation0);
        rig.backend.set_faults(Faults {
            fail_start_preview: true,
            ..Default::default()
        });
        let mut controller = rig.controller(&OverlayConfig::default());
        controller.start_preview(CameraDirection::Back, None).unwrap_err();

        let layout = rig.host.layout().unwrap();
        assert_eq!(layout.gravity, Gravity::Fill);
        assert_eq!(layout.size(), Size::new(1280, 960));
        assert!(!rig.host.is_transparent());
    }

    #[test]
    fn test_surface_attach_failure_is_swallowed() {
        let rig = rig();
        rig.backend.set_faults(Faults {
            surface_io_error: true,
            ..Default::default()
        });
        let controller = started(&rig, CameraDirection::Back);

        assert!(controller.session().is_live());
        assert!(rig.log.contains(&Call::StartPreview(0)));
        assert!(!rig.log.contains(&Call::SetSurface(0, Some(SurfaceId(1)))));
    }

    #[test]
    fn test_finishing_host_rejects_start() {
        let rig = rig();
        rig.host.set_finishing(true);
        let mut controller = rig.controller(&OverlayConfig::default());
        let err = controller.start_preview(CameraDirection::Back, None).unwrap_err();
        assert!(matches!(err, OverlayError::HostUnavailable(_)));
        assert_eq!(rig.backend.open_count(), 0);
    }
}

#[cfg(test)]
mod stop_and_switch_tests {
    use super::*;

    #[test]
    fn test_stop_when_stopped_succeeds() {
        let rig = rig();
        let mut controller = rig.controller(&OverlayConfig::default());
        assert!(controller.stop_preview().is_ok());
        assert!(controller.stop_preview().is_ok());
        assert!(rig.log.calls().is_empty());
    }

    #[test]
    fn test_stop_sequence() {
        let rig = rig();
        let mut controller = started(&rig, CameraDirection::Back);
        rig.log.clear();

        controller.stop_preview().unwrap();

        assert_eq!(
            &rig.log.calls()[..4],
            &[
                Call::StopPreview(0),
                Call::SetSurface(0, None),
                Call::Release(0),
                Call::Transparent(false),
            ]
        );
        let layout = rig.log.last_layout().unwrap();
        assert_eq!(layout.gravity, Gravity::Fill);
        assert_eq!((layout.width, layout.height), (1280, 960));
        assert_eq!(controller.session().state(), PreviewState::Idle);
        assert_eq!(controller.active_camera_id(), None);
        assert!(!rig.backend.any_open());
    }

    #[test]
    fn test_direction_switch_stops_then_starts() {
        let rig = rig();
        let mut controller = started(&rig, CameraDirection::Back);

        controller.start_preview(CameraDirection::Front, None).unwrap();

        let released = rig.log.position(&Call::Release(0)).unwrap();
        let opened = rig.log.position(&Call::Open(1)).unwrap();
        assert!(released < opened);
        assert_eq!(controller.active_camera_id(), Some(1));
        assert!(!rig.backend.is_open(0));
        assert!(rig.backend.is_open(1));
    }

    #[test]
    fn test_same_direction_reapplies_zoom() {
        let rig = rig();
        let mut controller = started(&rig, CameraDirection::Back);

        controller.start_preview(CameraDirection::Back, Some(2.0)).unwrap();

        assert_eq!(rig.backend.open_count(), 1);
        assert_eq!(rig.backend.parameters(0).unwrap().zoom.unwrap().current, 7);
        assert_eq!(controller.session().zoom(), 2.0);
    }

    #[test]
    fn test_listeners_see_start_and_stop() {
        let rig = rig();
        let listener = Arc::new(RecordingListener::default());
        rig.listeners.register("recorder", listener.clone());

        let mut controller = started(&rig, CameraDirection::Front);
        controller.stop_preview().unwrap();

        let events = listener.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, PreviewEventKind::Started);
        assert_eq!(events[1].kind, PreviewEventKind::Stopped);
        assert_eq!(events[0].direction, CameraDirection::Front);
        assert_eq!(events[0].camera_id, 1);
        assert_eq!(events[0].session_id, events[1].session_id);
    }

    #[test]
    fn test_dropping_controller_releases_camera() {
        let rig = rig();
        let controller = started(&rig, CameraDirection::Back);
        drop(controller);
        assert!(!rig.backend.any_open());
    }
}

#[cfg(test)]
mod zoom_tests {
    use super::*;

    #[test]
    fn test_zoom_maps_to_device_index() {
        let rig = rig();
        let mut controller = started(&rig, CameraDirection::Back);

        controller.set_zoom(Some(3.0)).unwrap();
        assert_eq!(rig.backend.parameters(0).unwrap().zoom.unwrap().current, 13);

        controller.set_zoom(Some(100.0)).unwrap();
        assert_eq!(rig.backend.parameters(0).unwrap().zoom.unwrap().current, 59);

        controller.set_zoom(None).unwrap();
        assert_eq!(rig.backend.parameters(0).unwrap().zoom.unwrap().current, 0);
        assert_eq!(controller.session().zoom(), 1.0);
    }

    #[test]
    fn test_zoom_unsupported_is_success() {
        let rig = rig();
        let mut controller = started(&rig, CameraDirection::Front);
        assert!(controller.set_zoom(Some(2.0)).is_ok());
        assert_eq!(rig.backend.parameters(1).unwrap().zoom, None);
    }

    #[test]
    fn test_zoom_without_camera_fails() {
        let rig = rig();
        let mut controller = rig.controller(&OverlayConfig::default());
        assert!(matches!(
            controller.set_zoom(Some(2.0)),
            Err(OverlayError::NoActiveCamera)
        ));
    }
}

#[cfg(test)]
mod pause_resume_tests {
    use super::*;

    #[test]
    fn test_pause_releases_and_surface_resumes() {
        let rig = rig();
        let mut controller = started(&rig, CameraDirection::Back);
        controller.set_zoom(Some(3.0)).unwrap();

        controller.on_pause();
        assert_eq!(controller.session().state(), PreviewState::Suspended);
        assert!(controller.session().is_paused());
        assert!(controller.session().is_previewing());
        assert!(!rig.backend.any_open());

        controller.on_resume();
        assert!(!controller.session().is_paused());
        // Nothing restarts until the surface is back.
        assert_eq!(rig.backend.open_count(), 1);

        controller.on_surface_available().unwrap();
        assert_eq!(rig.backend.open_count(), 2);
        assert_eq!(controller.active_camera_id(), Some(0));
        assert_eq!(rig.backend.parameters(0).unwrap().zoom.unwrap().current, 13);
    }

    #[test]
    fn test_zoom_while_suspended_is_kept_for_resume() {
        let rig = rig();
        let mut controller = started(&rig, CameraDirection::Back);
        controller.on_pause();

        controller.set_zoom(Some(2.0)).unwrap();
        assert!(!rig.backend.any_open());

        controller.on_surface_available().unwrap();
        assert_eq!(rig.backend.parameters(0).unwrap().zoom.unwrap().current, 7);
    }

    #[test]
    fn test_stop_while_suspended_cancels_resume() {
        let rig = rig();
        let mut controller = started(&rig, CameraDirection::Back);
        controller.on_pause();
        controller.stop_preview().unwrap();

        controller.on_surface_available().unwrap();
        assert_eq!(rig.backend.open_count(), 1);
        assert_eq!(controller.session().state(), PreviewState::Idle);
    }

    #[test]
    fn test_pause_when_idle_only_marks_paused() {
        let rig = rig();
        let mut controller = rig.controller(&OverlayConfig::default());
        controller.on_pause();
        assert!(controller.session().is_paused());
        assert_eq!(controller.session().state(), PreviewState::Idle);
        controller.on_surface_available().unwrap();
        assert_eq!(rig.backend.open_count(), 0);
    }
}

#[cfg(test)]
mod layout_change_tests {
    use super::*;

    #[test]
    fn test_layout_change_relayouts_live_preview() {
        let rig = rig();
        rig.host.set_rotation(DisplayRotation::Rotation90);
        let mut controller = started(&rig, CameraDirection::Back);
        let before = rig.log.calls().len();

        rig.host.set_available(Size::new(640, 480));
        let bounds = ViewBounds {
            left: 0,
            top: 0,
            right: 640,
            bottom: 480,
        };
        controller.on_layout_change(bounds);
        let after_first = rig.log.calls().len();
        assert!(after_first > before);

        let layout = rig.log.last_layout().unwrap();
        assert!(layout.width <= 640 && layout.height <= 480);

        // Identical bounds are ignored.
        controller.on_layout_change(bounds);
        assert_eq!(rig.log.calls().len(), after_first);
    }

    #[test]
    fn test_layout_change_when_idle_does_nothing() {
        let rig = rig();
        let mut controller = rig.controller(&OverlayConfig::default());
        controller.on_layout_change(ViewBounds {
            left: 0,
            top: 0,
            right: 100,
            bottom: 100,
        });
        assert!(rig.log.calls().is_empty());
    }
}

#[cfg(test)]
mod init_tests {
    use super::*;

    #[test]
    fn test_init_lists_both_directions() {
        let rig = rig();
        let mut controller = rig.controller(&OverlayConfig::default());
        let InitOutcome::Ready(info) = controller.init(Box::new(|_| {})).unwrap() else {
            panic!("permission should already be granted");
        };

        assert_eq!((info.display_width, info.display_height), (1280, 960));
        let back = &info.cameras["BACK"];
        assert_eq!(back.id, 0);
        assert_eq!(back.zoom, 1.0);
        assert_eq!(back.max_zoom, 6.0);
        let front = &info.cameras["FRONT"];
        assert_eq!(front.id, 1);
        assert_eq!(front.max_zoom, 0.0);

        // Enumeration leaves no camera open.
        assert!(!rig.backend.any_open());

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["displayWidth"], 1280);
        assert_eq!(json["BACK"]["position"], "BACK");
        assert_eq!(json["BACK"]["maxZoom"], 6.0);
    }

    #[test]
    fn test_init_while_previewing_reuses_open_camera() {
        let rig = rig();
        let mut controller = started(&rig, CameraDirection::Back);
        let InitOutcome::Ready(info) = controller.init(Box::new(|_| {})).unwrap() else {
            panic!("permission should already be granted");
        };
        assert_eq!(info.cameras.len(), 2);
        assert!(rig.backend.is_open(0));
        assert!(!rig.backend.is_open(1));
    }

    #[test]
    fn test_permission_denied_reports_code_20() {
        let rig = rig().with_permissions(FakePermissionGate::missing(
            PermissionAnswer::Deny,
            video_overlay::testing::CallLog::new(),
        ));
        let mut controller = rig.controller(&OverlayConfig::default());

        let answer = Arc::new(Mutex::new(None));
        let sink = answer.clone();
        let outcome = controller
            .init(Box::new(move |results| *sink.lock().unwrap() = Some(results)))
            .unwrap();
        assert_eq!(outcome, InitOutcome::PermissionRequested);

        let results = answer.lock().unwrap().take().unwrap();
        let err = controller
            .on_permission_result(CAMERA_PERMISSION_REQUEST, &results)
            .unwrap_err();
        assert_eq!(err.code(), Some(PERMISSION_DENIED_ERROR));
    }

    #[test]
    fn test_permission_granted_runs_init() {
        let rig = rig();
        let mut controller = rig.controller(&OverlayConfig::default());
        let info = controller
            .on_permission_result(CAMERA_PERMISSION_REQUEST, &[PermissionStatus::Granted])
            .unwrap();
        assert_eq!(info.cameras.len(), 2);
    }

    #[test]
    fn test_undetermined_permission_without_cameras_lists_nothing() {
        let rig = FakeRig::new(DeviceProfile::empty());
        let mut controller = rig.controller(&OverlayConfig::default());
        let info = controller
            .on_permission_result(CAMERA_PERMISSION_REQUEST, &[PermissionStatus::NotDetermined])
            .unwrap();
        assert!(info.cameras.is_empty());
        assert_eq!(info.display_width, 1280);
    }

    #[test]
    fn test_any_denial_among_results_is_denied() {
        let rig = rig();
        let mut controller = rig.controller(&OverlayConfig::default());
        let err = controller
            .on_permission_result(
                CAMERA_PERMISSION_REQUEST,
                &[PermissionStatus::NotDetermined, PermissionStatus::Denied],
            )
            .unwrap_err();
        assert_eq!(err.code(), Some(PERMISSION_DENIED_ERROR));
    }

    #[test]
    fn test_unknown_permission_request_code() {
        let rig = rig();
        let mut controller = rig.controller(&OverlayConfig::default());
        assert!(matches!(
            controller.on_permission_result(7, &[PermissionStatus::Granted]),
            Err(OverlayError::InvalidArgument(_))
        ));
    }
}
