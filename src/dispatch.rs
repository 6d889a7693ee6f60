//! Routes named page commands to the preview controller.
//!
//! The page sends an action name plus a positional JSON argument list. Parsing
//! happens on the caller's thread; every controller call is posted to the UI
//! thread and awaited.

use serde_json::Value;
use std::sync::RwLock;
use tokio::sync::oneshot;

use crate::config::OverlayConfig;
use crate::controller::{InitInfo, InitOutcome, PreviewController};
use crate::errors::OverlayError;
use crate::permissions::{PermissionResponder, CAMERA_PERMISSION_REQUEST};
use crate::types::{CameraDirection, CameraId, ViewBounds};
use crate::ui_thread::UiThread;

pub const ACTION_INIT: &str = "init";
pub const ACTION_START_CAMERA: &str = "startCamera";
pub const ACTION_STOP_CAMERA: &str = "stopCamera";
pub const ACTION_SET_ZOOM: &str = "setZoom";

const UI_THREAD_NAME: &str = "video-overlay-ui";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Init,
    StartCamera {
        /// `None` means the configured default direction.
        direction: Option<CameraDirection>,
        zoom: Option<f64>,
    },
    StopCamera,
    SetZoom {
        zoom: Option<f64>,
    },
}

impl Command {
    pub fn parse(action: &str, args: &[Value]) -> Result<Self, OverlayError> {
        match action {
            ACTION_INIT => Ok(Command::Init),
            ACTION_START_CAMERA => Ok(Command::StartCamera {
                direction: direction_arg(args, 0)?,
                zoom: zoom_arg(args, 1)?,
            }),
            ACTION_STOP_CAMERA => Ok(Command::StopCamera),
            ACTION_SET_ZOOM => Ok(Command::SetZoom {
                zoom: zoom_arg(args, 0)?,
            }),
            other => {
                log::debug!("Rejecting unknown action '{}'", other);
                Err(OverlayError::InvalidArgument("invalid action".to_string()))
            }
        }
    }
}

fn direction_arg(args: &[Value], index: usize) -> Result<Option<CameraDirection>, OverlayError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(name)) => name.parse::<CameraDirection>().map(Some),
        Some(other) => Err(OverlayError::InvalidArgument(format!(
            "direction must be a string, got {}",
            other
        ))),
    }
}

fn zoom_arg(args: &[Value], index: usize) -> Result<Option<f64>, OverlayError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(other) => Err(OverlayError::InvalidArgument(format!(
            "zoom must be a number, got {}",
            other
        ))),
    }
}

pub struct CommandDispatcher {
    ui: UiThread<PreviewController>,
    default_direction: RwLock<CameraDirection>,
}

impl CommandDispatcher {
    /// Spawns the UI thread and builds the controller on it with `factory`.
    /// The controller is shut down on that thread when the dispatcher drops.
    pub fn spawn<F>(factory: F, config: &OverlayConfig) -> Result<Self, OverlayError>
    where
        F: FnOnce() -> PreviewController + Send + 'static,
    {
        let default_direction = config
            .default_direction()
            .map_err(OverlayError::Config)?;
        let ui = UiThread::spawn(UI_THREAD_NAME, factory, |controller: &mut PreviewController| {
            controller.shutdown()
        })?;
        Ok(Self {
            ui,
            default_direction: RwLock::new(default_direction),
        })
    }

    /// Direction used by `startCamera` when the page names none.
    pub fn default_direction(&self) -> CameraDirection {
        *self
            .default_direction
            .read()
            .unwrap_or_else(|e| e.into_inner())
    }

    pub fn ui(&self) -> &UiThread<PreviewController> {
        &self.ui
    }

    /// Parses and runs one page command. Commands without a payload
    /// answer `null`.
    pub async fn execute(&self, action: &str, args: &[Value]) -> Result<Value, OverlayError> {
        log::debug!("execute {} {:?}", action, args);
        let command = Command::parse(action, args)?;
        self.run(command).await
    }

    pub async fn run(&self, command: Command) -> Result<Value, OverlayError> {
        match command {
            Command::Init => {
                let info = self.init().await?;
                serde_json::to_value(info)
                    .map_err(|e| OverlayError::Camera(format!("Failed to encode camera list: {}", e)))
            }
            Command::StartCamera { direction, zoom } => {
                let direction = direction.unwrap_or_else(|| self.default_direction());
                self.start_camera(direction, zoom).await?;
                Ok(Value::Null)
            }
            Command::StopCamera => {
                self.stop_camera().await?;
                Ok(Value::Null)
            }
            Command::SetZoom { zoom } => {
                self.set_zoom(zoom).await?;
                Ok(Value::Null)
            }
        }
    }

    /// Lists the cameras, first asking for camera permission if needed.
    pub async fn init(&self) -> Result<InitInfo, OverlayError> {
        let (tx, rx) = oneshot::channel();
        let handle = self.ui.handle();
        let responder: PermissionResponder = Box::new(move |results| {
            let posted = handle.post(move |controller: &mut PreviewController| {
                let _ = tx.send(controller.on_permission_result(CAMERA_PERMISSION_REQUEST, &results));
            });
            if let Err(e) = posted {
                log::warn!("Dropping permission result: {}", e);
            }
        });

        match self.ui.call(move |controller| controller.init(responder)).await?? {
            InitOutcome::Ready(info) => Ok(info),
            InitOutcome::PermissionRequested => rx.await.map_err(|_| {
                OverlayError::PermissionDenied("Camera permission request was abandoned".to_string())
            })?,
        }
    }

    pub async fn start_camera(&self, direction: CameraDirection, zoom: Option<f64>) -> Result<(), OverlayError> {
        self.ui
            .call(move |controller| controller.start_preview(direction, zoom))
            .await?
    }

    pub async fn stop_camera(&self) -> Result<(), OverlayError> {
        self.ui.call(|controller| controller.stop_preview()).await?
    }

    pub async fn set_zoom(&self, zoom: Option<f64>) -> Result<(), OverlayError> {
        self.ui.call(move |controller| controller.set_zoom(zoom)).await?
    }

    pub async fn pause(&self) -> Result<(), OverlayError> {
        self.ui.call(|controller| controller.on_pause()).await
    }

    pub async fn resume(&self) -> Result<(), OverlayError> {
        self.ui.call(|controller| controller.on_resume()).await
    }

    pub async fn surface_available(&self) -> Result<(), OverlayError> {
        self.ui
            .call(|controller| controller.on_surface_available())
            .await?
    }

    pub async fn layout_change(&self, bounds: ViewBounds) -> Result<(), OverlayError> {
        self.ui
            .call(move |controller| controller.on_layout_change(bounds))
            .await
    }

    /// Pushes new settings to the controller and the command defaults.
    pub async fn apply_config(&self, config: OverlayConfig) -> Result<(), OverlayError> {
        let default_direction = config.default_direction().map_err(OverlayError::Config)?;
        self.ui
            .call(move |controller| controller.apply_config(&config))
            .await?;
        *self
            .default_direction
            .write()
            .unwrap_or_else(|e| e.into_inner()) = default_direction;
        Ok(())
    }

    /// Stops any preview without waiting; used while the host exits.
    pub fn shutdown(&self) {
        if let Err(e) = self.ui.post(|controller| controller.shutdown()) {
            log::debug!("Shutdown not delivered: {}", e);
        }
    }

    /// Id of the camera currently previewing, if any.
    pub async fn active_camera_id(&self) -> Result<Option<CameraId>, OverlayError> {
        self.ui.call(|controller| controller.active_camera_id()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_start_camera() {
        let command = Command::parse("startCamera", &[json!("FRONT"), json!(2.5)]).unwrap();
        assert_eq!(
            command,
            Command::StartCamera {
                direction: Some(CameraDirection::Front),
                zoom: Some(2.5)
            }
        );
    }

    #[test]
    fn test_parse_null_zoom() {
        let command = Command::parse("startCamera", &[json!("BACK"), Value::Null]).unwrap();
        assert_eq!(
            command,
            Command::StartCamera {
                direction: Some(CameraDirection::Back),
                zoom: None
            }
        );
        assert_eq!(
            Command::parse("setZoom", &[]).unwrap(),
            Command::SetZoom { zoom: None }
        );
    }

    #[test]
    fn test_parse_unknown_action() {
        let err = Command::parse("takePicture", &[]).unwrap_err();
        assert!(matches!(err, OverlayError::InvalidArgument(ref m) if m == "invalid action"));
    }

    #[test]
    fn test_parse_malformed_arguments() {
        assert!(matches!(
            Command::parse("startCamera", &[json!(1)]),
            Err(OverlayError::InvalidArgument(_))
        ));
        assert!(matches!(
            Command::parse("startCamera", &[json!("back")]),
            Err(OverlayError::InvalidArgument(_))
        ));
        assert!(matches!(
            Command::parse("setZoom", &[json!("2x")]),
            Err(OverlayError::InvalidArgument(_))
        ));
    }
}
