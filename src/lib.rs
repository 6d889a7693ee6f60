//! video-overlay: live camera preview behind a transparent Tauri web view
//!
//! The plugin opens a camera, sizes its preview to the page, and renders it
//! underneath a transparent web view so page content floats over live video
//! (video see-through AR).
//!
//! # Features
//! - Preview/picture size selection with aspect-ratio matching
//! - Letterboxed container layout and display-orientation handling
//! - Pause/resume with automatic preview restart
//! - Zoom mapped from the page's 1-based scale to the device's range
//! - Preview start/stop notifications for cooperating components
//!
//! # Usage
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(video_overlay::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! From the page:
//! ```js
//! const info = await invoke('plugin:video-overlay|init');
//! await invoke('plugin:video-overlay|surface_available', { surfaceId: 1 });
//! await listen('video-overlay://frame', (e) => {
//!   preview.src = `videooverlay://localhost/frame?seq=${e.payload.sequence}`;
//! });
//! await invoke('plugin:video-overlay|start_camera', { direction: 'BACK', zoom: 1.0 });
//! ```
pub mod commands;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod errors;
pub mod events;
pub mod frames;
pub mod permissions;
pub mod platform;
pub mod preview;
pub mod session;
pub mod types;
pub mod ui_thread;

// Testing utilities - fake adapters and synthetic device profiles
pub mod testing;

// Re-exports for convenience
pub use config::OverlayConfig;
pub use controller::{CameraSummary, InitInfo, InitOutcome, PreviewController};
pub use dispatch::{Command, CommandDispatcher};
pub use errors::{BridgeError, OverlayError, PERMISSION_DENIED_ERROR};
pub use events::{ListenerRegistry, PreviewEvent, PreviewEventKind, PreviewListener};
pub use types::{CameraDirection, DisplayRotation, Size, SizePair};

use std::sync::{Arc, RwLock};
use tauri::{
    plugin::{Builder, TauriPlugin},
    Emitter, Manager, RunEvent, Runtime,
};

use commands::OverlayState;
use events::PageEventListener;
use frames::{FrameSink, FrameStore, PreviewFrame, FRAME_EVENT, FRAME_PROTOCOL};
use permissions::SystemPermissionGate;
use platform::webview::EventSink;
use platform::{HostGeometry, NativeCameraBackend, WebviewHost};

/// Name under which the page-event forwarder is registered.
pub const PAGE_LISTENER: &str = "page";
/// Name under which the frame store is registered.
pub const FRAME_LISTENER: &str = "frames";

/// Initialize the video overlay plugin with all commands
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    let frames = Arc::new(FrameStore::new());
    let served_frames = frames.clone();

    Builder::new("video-overlay")
        .register_uri_scheme_protocol(FRAME_PROTOCOL, move |_ctx, request| {
            served_frames.respond(request.uri().path())
        })
        .invoke_handler(tauri::generate_handler![
            // Overlay commands
            commands::overlay::init,
            commands::overlay::start_camera,
            commands::overlay::stop_camera,
            commands::overlay::set_zoom,
            commands::overlay::execute,
            // Host lifecycle
            commands::overlay::report_layout,
            commands::overlay::surface_available,
            commands::overlay::pause,
            commands::overlay::resume,
            // Configuration commands
            commands::config::get_config,
            commands::config::update_config,
            commands::config::reset_config,
        ])
        .setup(|app, _api| {
            let config = commands::config::current_config();
            let geometry = Arc::new(RwLock::new(HostGeometry::default()));
            let listeners = Arc::new(ListenerRegistry::new());

            let handle = app.clone();
            let emit: EventSink = Arc::new(move |event: &str, payload: serde_json::Value| {
                if let Err(e) = handle.emit(event, payload) {
                    log::warn!("Failed to emit {}: {}", event, e);
                }
            });
            listeners.register(PAGE_LISTENER, Arc::new(PageEventListener::new(emit.clone())));
            listeners.register(FRAME_LISTENER, frames.clone());

            let frame_emit = emit.clone();
            let frame_sink: FrameSink = Arc::new(move |frame: PreviewFrame| {
                let frame = frames.publish(frame);
                match serde_json::to_value(&*frame) {
                    Ok(payload) => frame_emit(FRAME_EVENT, payload),
                    Err(e) => log::debug!("Failed to serialize frame {}: {}", frame.sequence, e),
                }
            });

            let host_geometry = geometry.clone();
            let controller_listeners = listeners.clone();
            let controller_config = config.clone();
            let dispatcher = CommandDispatcher::spawn(
                move || {
                    PreviewController::new(
                        Box::new(NativeCameraBackend::with_frame_sink(frame_sink)),
                        Box::new(WebviewHost::new(
                            host_geometry,
                            emit,
                            controller_config.display.clone(),
                        )),
                        Box::new(SystemPermissionGate),
                        controller_listeners,
                        &controller_config,
                    )
                },
                &config,
            )?;

            log::info!("{} {} initialized", NAME, VERSION);
            app.manage(OverlayState {
                dispatcher,
                geometry,
                listeners,
            });
            Ok(())
        })
        .on_event(|app, event| {
            if let RunEvent::Exit = event {
                if let Some(state) = app.try_state::<OverlayState>() {
                    state.update_geometry(|geometry| geometry.finishing = true);
                    state.dispatcher.shutdown();
                }
            }
        })
        .build()
}

/// Initialize logging, defaulting `RUST_LOG` to the configured filter
pub fn init_logging() {
    init_logging_with(&commands::config::current_config());
}

pub fn init_logging_with(config: &OverlayConfig) {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &config.logging.filter);
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
