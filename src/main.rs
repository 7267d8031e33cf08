//! `texstream` command-line entry point.
//!
//! Opens the streaming window, or with `--headless` runs the upload loop on
//! the software backend and prints the statistics report.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use texstream::engine::headless::run_headless;
use texstream::image_store::ImageStore;
use texstream::options::Options;
use texstream::upload::UploadMode;
use texstream::Viewer;

/// Upload path selected on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Write-mapped transfer slots.
    Staged,
    /// Synchronous whole-image texture writes.
    Direct,
}

impl From<ModeArg> for UploadMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Staged => Self::Staged,
            ModeArg::Direct => Self::Direct,
        }
    }
}

#[derive(Parser)]
#[command(version, about = "Benchmark streaming decoded images into GPU textures")]
struct Cli {
    /// Directory holding image0.png, image1.png, ...
    #[arg(long, default_value = ".")]
    dir: PathBuf,
    /// TOML options file.
    #[arg(long)]
    options: Option<PathBuf>,
    /// Upload path (overrides the options file).
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Transfer/texture slot pairs (overrides the options file).
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    slots: Option<u16>,
    /// Run this many image switches without a window and exit.
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u64>,
}

fn options(cli: &Cli) -> Result<Options, texstream::StreamError> {
    let mut options = match &cli.options {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };
    if let Some(mode) = cli.mode {
        options.stream.mode = mode.into();
    }
    if let Some(slots) = cli.slots {
        options.stream.slot_count = usize::from(slots);
    }
    Ok(options)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let options = match options(&cli) {
        Ok(options) => options,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(switches) = cli.headless {
        let images = ImageStore::discover(&cli.dir, &options.images, options.stream.max_texture_dim);
        let report = run_headless(&images, &options, switches);
        log::info!(
            "{} switch(es), {} verification failure(s)\n{}",
            report.switches,
            report.mismatches,
            report.stats
        );
        return if report.mismatches == 0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    match Viewer::builder()
        .with_dir(cli.dir)
        .with_options(options)
        .build()
        .run()
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
