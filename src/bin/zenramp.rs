use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::error;
use zenramp::{
    ContainerFormat, DEFAULT_WORKERS, GradientKind, HdrError, PixelFormat, Pipeline,
    PipelineConfig,
};

#[derive(Parser)]
#[command(name = "zenramp", version, about = "Write a procedurally generated HDR test image")]
struct Cli {
    /// Image width in pixels
    width: u32,
    /// Image height in pixels
    height: u32,
    /// Output file (.pfm or .hdr)
    output: PathBuf,
    /// Fill worker threads
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: NonZeroUsize,
    /// HDR peak channel value
    #[arg(long, default_value_t = 5.0)]
    peak: f32,
    /// Test pattern
    #[arg(long, value_enum, default_value_t = Pattern::Diagonal)]
    gradient: Pattern,
    /// Container; inferred from the output extension when omitted
    #[arg(long, value_enum)]
    format: Option<Container>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Pattern {
    /// Red ramp along the diagonal
    Diagonal,
    /// One channel peaking in each of three corners
    Corners,
}

#[derive(Clone, Copy, ValueEnum)]
enum Container {
    Pfm,
    Hdr,
}

fn run(cli: Cli) -> Result<(), HdrError> {
    let mut config = PipelineConfig::new(cli.width, cli.height, cli.output)
        .with_format(PixelFormat::rgbx_f32(cli.peak)?)
        .with_workers(cli.workers)
        .with_gradient(match cli.gradient {
            Pattern::Diagonal => GradientKind::Diagonal,
            Pattern::Corners => GradientKind::Corners,
        });
    if let Some(format) = cli.format {
        config = config.with_container(match format {
            Container::Pfm => ContainerFormat::Pfm,
            Container::Hdr => ContainerFormat::Radiance,
        });
    }
    Pipeline::new(config).run().map(|_| ())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    if let Err(e) = run(Cli::parse()) {
        error!("{e}");
        eprintln!("Error code: {}", e.code());
        std::process::exit(e.code());
    }
}
