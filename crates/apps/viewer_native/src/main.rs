use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use foundation::math::project;
use layers::info_panel::RenderInstruction;
use runtime::{AssetKind, HostEvent};
use scene::camera::Viewport;
use scene::graph::SceneGraph;
use viewer::{Effect, Viewer, ViewerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless rainforest globe: picking, panels and rotation without a GPU")]
struct Args {
    /// Viewer configuration as JSON; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 800.0)]
    width: f64,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the embedded regions with their marker positions
    Regions,

    /// Project a latitude/longitude onto the sphere
    Project {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, default_value_t = 1.0)]
        radius: f64,
    },

    /// Hover a pixel and print the info panel that would show
    Pick {
        /// Pointer position as x,y in pixels; defaults to the viewport center
        #[arg(long, value_parser = parse_point)]
        at: Option<(f64, f64)>,

        /// Turn the camera toward this region first
        #[arg(long)]
        focus: Option<String>,
    },

    /// Step the frame loop and report the effects it produced
    Run {
        #[arg(long, default_value_t = 120)]
        frames: u64,

        #[arg(long, default_value_t = 60.0)]
        fps: f64,

        /// Frame indices at which the rotation button is pressed
        #[arg(long, value_delimiter = ',')]
        toggle_at: Vec<u64>,

        /// Hover this pixel (x,y) on every frame
        #[arg(long, value_parser = parse_point)]
        pointer: Option<(f64, f64)>,

        /// Click this pixel (x,y) after the last frame
        #[arg(long, value_parser = parse_point)]
        click: Option<(f64, f64)>,
    },
}

fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {s:?}"))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("bad x in {s:?}: {e}"))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("bad y in {s:?}: {e}"))?;
    Ok((x, y))
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(ViewerConfig::from_json_str(&text)?)
        }
        None => Ok(ViewerConfig::default()),
    }
}

fn describe(effect: &Effect) -> String {
    match effect {
        Effect::Panel(RenderInstruction::Show(content)) => format!("panel:\n{}", content.to_plain_text()),
        Effect::Panel(RenderInstruction::Hide) => "panel hidden".to_string(),
        Effect::ToggleLabel(label) => format!("button: {label}"),
        Effect::OpenUrl(url) => format!("open: {url}"),
    }
}

fn start(config: ViewerConfig, viewport: Viewport) -> Result<Viewer<SceneGraph>, Box<dyn std::error::Error>> {
    let mut viewer = Viewer::new(SceneGraph::new(), config, viewport)?;
    // Nothing is fetched headlessly; report the assets as present.
    viewer.handle(&HostEvent::AssetLoaded(AssetKind::GlobeTexture));
    viewer.handle(&HostEvent::AssetLoaded(AssetKind::Font));
    Ok(viewer)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let viewport = Viewport::new(args.width, args.height);

    match args.command {
        Command::Regions => {
            let registry = catalog::MarkerRegistry::load()?;
            for placement in registry.placements(config.markers.altitude_radius)? {
                let Some(region) = registry.region(placement.region) else {
                    continue;
                };
                let p = placement.position;
                println!(
                    "{:<32} lat {:>7.2} lon {:>8.2} -> ({:.4}, {:.4}, {:.4})",
                    region.name, region.latitude, region.longitude, p.x, p.y, p.z
                );
            }
        }
        Command::Project { lat, lon, radius } => {
            let p = project(lat, lon, radius)?;
            println!("{}", serde_json::json!({ "x": p.x, "y": p.y, "z": p.z }));
        }
        Command::Pick { at, focus } => {
            let mut viewer = start(config, viewport)?;
            if let Some(name) = focus {
                let id = viewer
                    .app()
                    .registry()
                    .find_by_name(&name)
                    .ok_or_else(|| format!("unknown region {name:?}"))?;
                viewer.app_mut().focus_region(id)?;
            }
            let (x_px, y_px) = at.unwrap_or((viewport.width * 0.5, viewport.height * 0.5));
            viewer.handle(&HostEvent::PointerMove { x_px, y_px });
            match viewer.app().panel() {
                RenderInstruction::Show(content) => print!("{}", content.to_plain_text()),
                RenderInstruction::Hide => println!("nothing under ({x_px}, {y_px})"),
            }
        }
        Command::Run {
            frames,
            fps,
            toggle_at,
            pointer,
            click,
        } => {
            let mut viewer = start(config, viewport)?;
            let step = 1.0 / fps.max(1.0);
            for index in 0..frames {
                if toggle_at.contains(&index) {
                    viewer.handle(&HostEvent::ToggleRotation);
                }
                if let Some((x_px, y_px)) = pointer {
                    viewer.handle(&HostEvent::PointerMove { x_px, y_px });
                }
                viewer.frame(index as f64 * step);
                for effect in viewer.drain_effects() {
                    println!("[frame {index}] {}", describe(&effect));
                }
            }
            if let Some((x_px, y_px)) = click {
                viewer.handle(&HostEvent::Click { x_px, y_px });
                for effect in viewer.drain_effects() {
                    println!("[click] {}", describe(&effect));
                }
            }
            let app = viewer.app();
            info!(
                frames = app.host().frames_rendered(),
                nodes = app.host().node_count(),
                "run finished"
            );
            println!(
                "rotation {:?}, angle {:.4} rad, {} frames rendered",
                viewer.rotation_state(),
                app.rotation().angle_rad(),
                app.host().frames_rendered()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{describe, parse_point, start};
    use layers::info_panel::RenderInstruction;
    use pretty_assertions::assert_eq;
    use scene::camera::Viewport;
    use viewer::{Effect, ViewerConfig};

    #[test]
    fn points_parse_with_spaces_and_signs() {
        assert_eq!(parse_point("400,300"), Ok((400.0, 300.0)));
        assert_eq!(parse_point(" -1.5 , 2 "), Ok((-1.5, 2.0)));
        assert!(parse_point("400").is_err());
        assert!(parse_point("a,1").is_err());
    }

    #[test]
    fn effects_render_as_lines() {
        assert_eq!(describe(&Effect::ToggleLabel("Start Rotation")), "button: Start Rotation");
        assert_eq!(describe(&Effect::Panel(RenderInstruction::Hide)), "panel hidden");
        assert_eq!(describe(&Effect::OpenUrl("https://earth.org".to_string())), "open: https://earth.org");
    }

    #[test]
    fn headless_start_spawns_labels() {
        let viewer = start(ViewerConfig::default(), Viewport::new(800.0, 600.0)).unwrap();
        assert!(viewer.app().labels().is_some());
        assert_eq!(viewer.app().host().texts().len(), 3);
    }
}
