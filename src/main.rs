use std::path::PathBuf;
use std::process;

use clap::Parser;
use isotile::engine::{EngineBuilder, Scene, render_snapshot};
use isotile::{RenderConfig, Result};

/// Isometric tile-grid renderer.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON config file; omitted keys keep their defaults
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Map generation seed, overriding the config
    #[arg(long)]
    seed: Option<u64>,

    /// Render one frame to this PNG instead of opening a window
    #[arg(long, value_name = "PNG")]
    headless: Option<PathBuf>,

    /// Device pixel ratio for the headless frame
    #[arg(long, value_name = "DPR", default_value_t = 1.0, requires = "headless")]
    scale_factor: f32,
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    if let Some(out) = args.headless {
        let mut scene = Scene::from_config(&config)?;
        let image = render_snapshot(
            &mut scene,
            config.window_width,
            config.window_height,
            args.scale_factor,
        )?;
        image.save(&out)?;
        log::info!("wrote {}", out.display());
        return Ok(());
    }

    EngineBuilder::from_config(config).run()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Args::parse()) {
        log::error!("{err}");
        process::exit(1);
    }
}
