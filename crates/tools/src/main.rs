use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Parser, Subcommand};
use clustering::ClusterFeature;
use explorer::{ExplorerConfig, MapExplorer, locations_from_json_str};
use foundation::camera::CameraState;
use foundation::math::mercator::bounds_for;
use foundation::time::Time;
use runtime::FrameClock;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use viewport::{CameraSnapshot, ViewportAnimator};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect viewport bounds, clusters and camera transitions")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct View {
    /// Viewport width in pixels
    #[arg(long, default_value_t = 800.0)]
    width: f64,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Camera center longitude
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    lng: f64,

    /// Camera center latitude
    #[arg(long, default_value_t = 20.0, allow_hyphen_values = true)]
    lat: f64,

    /// Camera zoom
    #[arg(long, default_value_t = 1.2)]
    zoom: f64,
}

impl View {
    fn camera(&self) -> CameraState {
        CameraState::at(self.lng, self.lat, self.zoom)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the geographic bounding box of a viewport
    Bounds {
        #[command(flatten)]
        view: View,

        /// Projection scale at zoom 1
        #[arg(long, default_value_t = 140.0)]
        scale: f64,
    },

    /// Print the features visible in a viewport, in reading order
    Clusters {
        /// JSON array of location records
        #[arg(long)]
        locations: PathBuf,

        /// Explorer config (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        view: View,

        /// Only keep this category
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive search over names and categories
        #[arg(long)]
        search: Option<String>,
    },

    /// Simulate a camera transition and print every published snapshot
    Animate {
        /// Start camera: lng,lat,zoom
        #[arg(long, value_parser = parse_camera, allow_hyphen_values = true)]
        from: CameraState,

        /// Target camera: lng,lat,zoom
        #[arg(long, value_parser = parse_camera, allow_hyphen_values = true)]
        to: CameraState,

        /// Host frame rate
        #[arg(long, default_value_t = 60.0)]
        fps: f64,

        /// Explorer config (JSON); only zoom limits and motion are used
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct FeatureLine<'a> {
    rank: usize,
    #[serde(flatten)]
    feature: &'a ClusterFeature,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    match args.command {
        Command::Bounds { view, scale } => cmd_bounds(&view, scale),
        Command::Clusters {
            locations,
            config,
            view,
            category,
            search,
        } => cmd_clusters(&locations, config.as_deref(), &view, category, search),
        Command::Animate {
            from,
            to,
            fps,
            config,
        } => cmd_animate(from, to, fps, config.as_deref()),
    }
}

fn cmd_bounds(view: &View, scale: f64) -> Result<(), String> {
    let bounds = bounds_for(view.width, view.height, &view.camera(), scale);
    let line = serde_json::to_string(&bounds).map_err(|e| e.to_string())?;
    println!("{line}");
    Ok(())
}

fn cmd_clusters(
    locations: &Path,
    config: Option<&Path>,
    view: &View,
    category: Option<String>,
    search: Option<String>,
) -> Result<(), String> {
    let config = load_config(config)?;
    let text = fs::read_to_string(locations)
        .map_err(|e| format!("read {}: {e}", locations.display()))?;
    let points = locations_from_json_str(&text).map_err(|e| e.to_string())?;
    info!(count = points.len(), "loaded locations");

    let mut explorer = MapExplorer::new(config).map_err(|e| e.to_string())?;
    explorer.resize(view.width, view.height);
    explorer.set_locations(points).map_err(|e| e.to_string())?;
    if category.is_some() {
        explorer.set_category(category).map_err(|e| e.to_string())?;
    }
    if let Some(search) = search {
        explorer.set_search(search).map_err(|e| e.to_string())?;
    }
    explorer.jump_to(view.camera());
    debug!(bounds = ?explorer.bounds(), "querying");

    let features = explorer.visible_features().map_err(|e| e.to_string())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (rank, feature) in features.iter().enumerate() {
        let line = serde_json::to_string(&FeatureLine { rank, feature }).map_err(|e| e.to_string())?;
        writeln!(out, "{line}").map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn cmd_animate(
    from: CameraState,
    to: CameraState,
    fps: f64,
    config: Option<&Path>,
) -> Result<(), String> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err(format!("--fps must be positive, got {fps}"));
    }
    let config = load_config(config)?;
    let mut animator = ViewportAnimator::new(from, config.constraints(), config.motion);

    let log: Rc<RefCell<Vec<CameraSnapshot>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    animator.subscribe(move |s| sink.borrow_mut().push(*s));

    let mut clock = FrameClock::new();
    let dt = 1.0 / fps;
    let duration = config.motion.durations.zoom.max(0.0);
    let max_frames = (duration * fps).ceil() as u64 + 2;

    animator.animate_to(to);
    let mut frame = 0u64;
    while animator.is_animating() && frame <= max_frames {
        animator.tick(clock.advance(Time(frame as f64 * dt)));
        frame += 1;
    }
    info!(frames = frame, published = log.borrow().len(), "transition simulated");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for snapshot in log.borrow().iter() {
        let line = serde_json::to_string(snapshot).map_err(|e| e.to_string())?;
        writeln!(out, "{line}").map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ExplorerConfig, String> {
    let Some(path) = path else {
        return Ok(ExplorerConfig::default());
    };
    let text = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
    ExplorerConfig::from_json_str(&text).map_err(|e| format!("{}: {e}", path.display()))
}

fn parse_camera(s: &str) -> Result<CameraState, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [lng, lat, zoom] = parts.as_slice() else {
        return Err(format!("expected lng,lat,zoom, got {s:?}"));
    };
    let num = |v: &str| v.parse::<f64>().map_err(|e| format!("{v:?}: {e}"));
    Ok(CameraState::at(num(*lng)?, num(*lat)?, num(*zoom)?))
}

#[cfg(test)]
mod tests {
    use super::parse_camera;
    use foundation::camera::CameraState;

    #[test]
    fn parses_camera_triples() {
        assert_eq!(parse_camera("10, -5.5,3"), Ok(CameraState::at(10.0, -5.5, 3.0)));
        assert!(parse_camera("1,2").is_err());
        assert!(parse_camera("a,b,c").is_err());
    }
}
