//! Developer tasks: `cargo run -p texstream-xtask -- <task>`.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(about = "texstream developer tasks")]
struct Cli {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Write `image0.png` .. `image{count-1}.png` test inputs.
    SampleImages {
        /// Output directory (created if missing).
        #[arg(long, default_value = "assets/images")]
        out: PathBuf,
        /// Number of images.
        #[arg(long, default_value_t = 10)]
        count: u32,
        /// Edge length in pixels.
        #[arg(long, default_value_t = 512)]
        size: u32,
    },
}

fn main() -> Result<()> {
    match Cli::parse().task {
        Task::SampleImages { out, count, size } => sample_images(&out, count, size),
    }
}

fn sample_images(out: &Path, count: u32, size: u32) -> Result<()> {
    if size == 0 {
        bail!("--size must be at least 1");
    }
    std::fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;

    for index in 0..count {
        let path = out.join(format!("image{index}.png"));
        write_png(&path, size, &pattern(index, count.max(1), size))
            .with_context(|| format!("writing {}", path.display()))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

/// Diagonal gradient tinted by the image index, with a checkerboard so
/// filtering and orientation are easy to judge on screen.
fn pattern(index: u32, count: u32, size: u32) -> Vec<u8> {
    let hue = index as f32 / count as f32 * std::f32::consts::TAU;
    let tint = [
        0.5 + 0.5 * hue.sin(),
        0.5 + 0.5 * (hue + 2.094_395).sin(),
        0.5 + 0.5 * (hue + 4.188_790).sin(),
    ];
    let cell = (size / 8).max(1);

    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let ramp = (x + y) as f32 / (2 * size) as f32;
            let check = if (x / cell + y / cell) % 2 == 0 { 1.0 } else { 0.75 };
            for channel in tint {
                pixels.push((channel * ramp.mul_add(0.5, 0.5) * check * 255.0) as u8);
            }
            pixels.push(255);
        }
    }
    pixels
}

fn write_png(path: &Path, size: u32, rgba: &[u8]) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(file, size, size);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgba)?;
    writer.finish()?;
    Ok(())
}
