//! Batch renderer: load a JSON scene, render it, write a PNG.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};

use lumen_render::{color_to_rgba, render, RenderOptions};

struct Args {
    scene: PathBuf,
    output: PathBuf,
    threads: Option<usize>,
}

fn usage() -> ! {
    eprintln!("Usage: lumen <scene.json> [-o out.png] [-t|--threads N]");
    std::process::exit(1);
}

fn parse_args() -> Result<Args> {
    let mut scene: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut threads: Option<usize> = None;

    let mut args = std::env::args().skip(1);
    while let Some(token) = args.next() {
        match token.as_str() {
            "-o" | "--output" => {
                let value = args.next().unwrap_or_else(|| usage());
                output = Some(PathBuf::from(value));
            }
            "-t" | "--threads" => {
                let value = args.next().unwrap_or_else(|| usage());
                let n: usize = value
                    .parse()
                    .ok()
                    .filter(|&n| n > 0)
                    .with_context(|| format!("--threads expects a positive integer, got {value}"))?;
                threads = Some(n);
            }
            "-h" | "--help" => usage(),
            _ if token.starts_with('-') => {
                bail!("unknown option {token}");
            }
            _ => {
                if scene.is_some() {
                    bail!("multiple scene files given");
                }
                scene = Some(PathBuf::from(token));
            }
        }
    }

    let scene = scene.unwrap_or_else(|| usage());
    let output = output.unwrap_or_else(|| scene.with_extension("png"));
    Ok(Args {
        scene,
        output,
        threads,
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = parse_args()?;

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure the worker pool")?;
    }

    let scene = lumen_scene::load_scene(&args.scene)
        .with_context(|| format!("failed to load {}", args.scene.display()))?;

    log::info!("rendering {}", args.scene.display());
    let start = Instant::now();
    let rendered = render(&scene, &RenderOptions::default());
    log::info!("render finished in {:.2?}", start.elapsed());

    let mut out = image::RgbaImage::new(rendered.width, rendered.height);
    for (pixel, color) in out.pixels_mut().zip(&rendered.pixels) {
        pixel.0 = color_to_rgba(*color);
    }
    out.save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    log::info!("wrote {}", args.output.display());

    Ok(())
}
