use anyhow::{anyhow, bail, Context};
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use video_overlay::config::OverlayConfig;
use video_overlay::controller::PreviewController;
use video_overlay::dispatch::CommandDispatcher;
use video_overlay::events::ListenerRegistry;
use video_overlay::frames::{FrameSink, PreviewFrame};
use video_overlay::permissions::SystemPermissionGate;
use video_overlay::platform::{HeadlessHost, NativeCameraBackend};
use video_overlay::preview::{display_orientation, ContainerLayout};
use video_overlay::types::{CameraDirection, DisplayRotation, Size};

const USAGE: &str = "Usage: video-overlay-cli <command> [args]

Commands:
  list-cameras [--json]
  select-size <WxH> --preview <WxH,...> [--picture <WxH,...>] [--preferred <WxH>] [--json]
  layout <preview WxH> <view WxH> [--portrait] [--json]
  rotation <sensor degrees> <display degrees> <front|back>
  preview <FRONT|BACK> [--zoom <z>] [--view <WxH>]";

const DEFAULT_VIEW: Size = Size::new(1280, 720);

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = OverlayConfig::load_or_default();
    video_overlay::init_logging_with(&config);

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "list-cameras" => cmd_list_cameras(&args, &config).await,
        "select-size" => cmd_select_size(&args, &config),
        "layout" => cmd_layout(&args),
        "rotation" => cmd_rotation(&args),
        "preview" => cmd_preview(&args, &config).await,
        _ => {
            eprintln!("Unknown command: {}\n\n{}", command, USAGE);
            std::process::exit(1);
        }
    }
}

/// Positional arguments after the command name, with `--flag value` pairs
/// pulled out.
struct ParsedArgs {
    positional: Vec<String>,
    options: Vec<(String, String)>,
    json: bool,
    portrait: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut parsed = ParsedArgs {
            positional: Vec::new(),
            options: Vec::new(),
            json: false,
            portrait: false,
        };

        let mut i = 2;
        while i < args.len() {
            match args[i].as_str() {
                "--json" => parsed.json = true,
                "--portrait" => parsed.portrait = true,
                flag if flag.starts_with("--") => {
                    i += 1;
                    let value = args
                        .get(i)
                        .ok_or_else(|| anyhow!("{} requires a value", flag))?;
                    parsed.options.push((flag.to_string(), value.clone()));
                }
                value => parsed.positional.push(value.to_string()),
            }
            i += 1;
        }
        Ok(parsed)
    }

    fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(flag, _)| flag == name)
            .map(|(_, value)| value.as_str())
    }

    fn positional(&self, index: usize, what: &str) -> anyhow::Result<&str> {
        self.positional
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("missing {}\n\n{}", what, USAGE))
    }
}

fn parse_size(s: &str) -> anyhow::Result<Size> {
    s.parse::<Size>()
        .with_context(|| format!("'{}' is not a WIDTHxHEIGHT size", s))
}

fn parse_size_list(s: &str) -> anyhow::Result<Vec<Size>> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_size)
        .collect()
}

fn parse_direction(s: &str) -> anyhow::Result<CameraDirection> {
    Ok(s.to_ascii_uppercase().parse::<CameraDirection>()?)
}

fn spawn_dispatcher(
    config: &OverlayConfig,
    view: Size,
    frames: Option<FrameSink>,
) -> anyhow::Result<CommandDispatcher> {
    let controller_config = config.clone();
    let dispatcher = CommandDispatcher::spawn(
        move || {
            let backend = match frames {
                Some(sink) => NativeCameraBackend::with_frame_sink(sink),
                None => NativeCameraBackend::new(),
            };
            PreviewController::new(
                Box::new(backend),
                Box::new(HeadlessHost::new(view, DisplayRotation::Rotation0)),
                Box::new(SystemPermissionGate),
                Arc::new(ListenerRegistry::new()),
                &controller_config,
            )
        },
        config,
    )?;
    Ok(dispatcher)
}

async fn cmd_list_cameras(args: &[String], config: &OverlayConfig) -> anyhow::Result<()> {
    let parsed = ParsedArgs::parse(args)?;
    let dispatcher = spawn_dispatcher(config, DEFAULT_VIEW, None)?;
    let info = dispatcher.init().await?;

    if parsed.json {
        println!("{}", serde_json::to_string(&info)?);
    } else {
        println!("Display: {}x{}", info.display_width, info.display_height);
        for (name, camera) in &info.cameras {
            println!(
                "{}: camera {} (zoom {:.1}, max zoom {:.1})",
                name, camera.id, camera.zoom, camera.max_zoom
            );
        }
        if info.cameras.is_empty() {
            println!("No front or back camera found");
        }
    }
    Ok(())
}

fn cmd_select_size(args: &[String], config: &OverlayConfig) -> anyhow::Result<()> {
    let parsed = ParsedArgs::parse(args)?;
    let desired = parse_size(parsed.positional(0, "desired size")?)?;
    let previews = parse_size_list(
        parsed
            .option("--preview")
            .ok_or_else(|| anyhow!("--preview is required"))?,
    )?;
    let pictures = match parsed.option("--picture") {
        Some(list) => parse_size_list(list)?,
        None => Vec::new(),
    };
    let preferred = parsed.option("--preferred").map(parse_size).transpose()?;

    let pair = config
        .size_selector()
        .select(preferred, &previews, &pictures, desired)
        .ok_or_else(|| anyhow!("no preview sizes given"))?;

    if parsed.json {
        println!("{}", serde_json::to_string(&pair)?);
    } else {
        match pair.picture {
            Some(picture) => println!("preview {} picture {}", pair.preview, picture),
            None => println!("preview {} (no matching picture size)", pair.preview),
        }
    }
    Ok(())
}

fn cmd_layout(args: &[String]) -> anyhow::Result<()> {
    let parsed = ParsedArgs::parse(args)?;
    let preview = parse_size(parsed.positional(0, "preview size")?)?;
    let view = parse_size(parsed.positional(1, "view size")?)?;
    let layout = ContainerLayout::fit(preview, view, parsed.portrait);

    if parsed.json {
        println!("{}", serde_json::to_string(&layout)?);
    } else {
        println!(
            "container {}x{} scale {:.4} offset ({}, {})",
            layout.width, layout.height, layout.scale, layout.offset_x, layout.offset_y
        );
    }
    Ok(())
}

fn cmd_rotation(args: &[String]) -> anyhow::Result<()> {
    let parsed = ParsedArgs::parse(args)?;
    let sensor: u32 = parsed
        .positional(0, "sensor orientation")?
        .parse()
        .context("sensor orientation must be a number of degrees")?;
    let display_degrees: u32 = parsed
        .positional(1, "display rotation")?
        .parse()
        .context("display rotation must be a number of degrees")?;
    let display = DisplayRotation::from_degrees(display_degrees)
        .ok_or_else(|| anyhow!("display rotation must be 0, 90, 180 or 270"))?;
    let direction = parse_direction(parsed.positional(2, "camera direction")?)?;

    println!("{}", display_orientation(sensor, direction, display));
    Ok(())
}

async fn cmd_preview(args: &[String], config: &OverlayConfig) -> anyhow::Result<()> {
    let parsed = ParsedArgs::parse(args)?;
    let direction = match parsed.positional.first() {
        Some(direction) => parse_direction(direction)?,
        None => config.default_direction().map_err(|e| anyhow!(e))?,
    };
    let zoom = parsed
        .option("--zoom")
        .map(|z| z.parse::<f64>())
        .transpose()
        .context("--zoom must be a number")?;
    let view = match parsed.option("--view") {
        Some(view) => parse_size(view)?,
        None => DEFAULT_VIEW,
    };

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        log::info!("Ctrl+C received, stopping preview");
        let _ = tx.send(());
    })?;

    let frame_count = Arc::new(AtomicU64::new(0));
    let counter = frame_count.clone();
    let sink: FrameSink = Arc::new(move |frame: PreviewFrame| {
        let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
        if n % 30 == 1 {
            log::info!(
                "Frame {}: {}x{}, {} bytes",
                frame.sequence,
                frame.width,
                frame.height,
                frame.jpeg.len()
            );
        }
    });

    let dispatcher = spawn_dispatcher(config, view, Some(sink))?;
    let info = dispatcher.init().await?;
    if info.cameras.is_empty() {
        bail!("no camera found");
    }

    dispatcher.start_camera(direction, zoom).await?;
    println!("Previewing {} camera; press Ctrl+C to stop", direction);

    rx.recv().await;
    dispatcher.stop_camera().await?;
    println!("Stopped after {} frames", frame_count.load(Ordering::Relaxed));
    Ok(())
}
