const COMMANDS: &[&str] = &[
    "init",
    "start_camera",
    "stop_camera",
    "set_zoom",
    "execute",
    "report_layout",
    "surface_available",
    "pause",
    "resume",
    "get_config",
    "update_config",
    "reset_config",
];

fn main() {
    tauri_plugin::Builder::new(COMMANDS).build();
}
