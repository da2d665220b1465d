use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use glint_core::SceneDescription;
use glint_render::bucket::DEFAULT_BUCKET_SIZE;
use glint_render::{render, RenderConfig, RenderJob};

#[derive(Parser, Debug)]
#[command(name = "glint", version, about = "Render a glint scene description")]
struct Args {
    /// Scene description (JSON)
    scene: PathBuf,

    #[arg(short, long)]
    /// Write the image here instead of the scene's output path
    output: Option<PathBuf>,

    #[arg(long)]
    /// Samples per pixel, overriding the scene's sampler
    spp: Option<u32>,

    #[arg(short, long)]
    /// Worker threads (defaults to one per core)
    threads: Option<usize>,

    #[arg(long, default_value_t = DEFAULT_BUCKET_SIZE)]
    /// Edge length of the square blocks handed to workers
    block_size: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let pool = {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = args.threads {
            builder = builder.num_threads(threads);
        }
        builder.build().context("Failed to start worker threads")?
    };
    log::info!("Rendering with {} threads", pool.current_num_threads());

    pool.install(|| run(&args))
}

fn run(args: &Args) -> Result<()> {
    let mut description = SceneDescription::load(&args.scene)
        .with_context(|| format!("Failed to load {}", args.scene.display()))?;
    if let Some(spp) = args.spp {
        description.sampler = description.sampler.with_count(spp);
    }

    let base_dir = args.scene.parent().unwrap_or_else(|| Path::new("."));
    let mut job = RenderJob::from_description(&description, base_dir)
        .with_context(|| format!("Failed to build scene {}", args.scene.display()))?;
    if let Some(output) = &args.output {
        job.output = output.clone();
    }

    let config = RenderConfig {
        bucket_size: args.block_size.max(1),
    };
    let image = render(&job.scene, job.integrator.as_ref(), job.sampler.as_ref(), &config);

    image
        .save(&job.output)
        .with_context(|| format!("Failed to save {}", job.output.display()))?;
    Ok(())
}
