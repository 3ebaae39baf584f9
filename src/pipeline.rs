//! End-to-end generation: allocate, lock, fill, unlock, encode, commit.

use core::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use enough::{Stop, Unstoppable};

use crate::encode::{ContainerFormat, FrameEncoder};
use crate::error::HdrError;
use crate::fill::{DEFAULT_WORKERS, FillEngine, FillStats};
use crate::generate::{ChannelMap, Gradient, GradientKind, PixelGenerator};
use crate::limits::Limits;
use crate::pixel::PixelFormat;
use crate::surface::{LockState, Surface};

/// Pipeline states, in the order a successful run passes through them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Created,
    Locked,
    Filled,
    Unlocked,
    Encoded,
    Committed,
    /// Terminal; a step failed and the remaining steps were skipped.
    Failed,
}

/// Ordered record of the stages a run reached.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    stages: Vec<Stage>,
}

impl Trace {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn last(&self) -> Option<Stage> {
        self.stages.last().copied()
    }

    /// Index of the first occurrence of `stage`.
    pub fn position(&self, stage: Stage) -> Option<usize> {
        self.stages.iter().position(|&s| s == stage)
    }

    fn push(&mut self, stage: Stage) {
        log::trace!("pipeline stage {stage:?}");
        self.stages.push(stage);
    }
}

/// What to generate and where to write it.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    width: u32,
    height: u32,
    destination: PathBuf,
    container: Option<ContainerFormat>,
    format: PixelFormat,
    workers: NonZeroUsize,
    channels: ChannelMap,
    limits: Limits,
}

impl PipelineConfig {
    /// Diagonal ramp, peak 5.0, 10 workers; container chosen from the
    /// destination's extension.
    ///
    /// An unrecognized extension leaves the container unset and the run
    /// fails with [`HdrError::InvalidArgument`] unless
    /// [`with_container`](Self::with_container) picks one.
    pub fn new(width: u32, height: u32, destination: impl Into<PathBuf>) -> Self {
        let destination = destination.into();
        let container = ContainerFormat::from_path(&destination);
        Self {
            width,
            height,
            destination,
            container,
            format: PixelFormat::default(),
            workers: DEFAULT_WORKERS,
            channels: GradientKind::default().channel_map(),
            limits: Limits::none(),
        }
    }

    pub fn with_container(mut self, container: ContainerFormat) -> Self {
        self.container = Some(container);
        self
    }

    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_gradient(self, kind: GradientKind) -> Self {
        self.with_channel_map(kind.channel_map())
    }

    pub fn with_channel_map(mut self, channels: ChannelMap) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn container(&self) -> Option<ContainerFormat> {
        self.container
    }

    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    pub fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    /// The configured gradient at the pixel format's peak.
    pub fn gradient(&self) -> Gradient {
        Gradient::new(self.channels, self.format.peak())
    }
}

/// Result of a committed run.
#[derive(Clone, Debug)]
pub struct PipelineReport {
    pub trace: Trace,
    pub fill: FillStats,
    pub bytes_written: u64,
}

/// Runs the generate-and-write sequence, failing fast on the first error.
///
/// ```no_run
/// use zenramp::{GradientKind, Pipeline, PipelineConfig};
///
/// let config = PipelineConfig::new(1920, 1080, "ramp.pfm").with_gradient(GradientKind::Corners);
/// let report = Pipeline::new(config).run()?;
/// println!("{} bytes", report.bytes_written);
/// # Ok::<(), zenramp::HdrError>(())
/// ```
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    trace: Trace,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            trace: Trace::default(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stages reached by the most recent run.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Generate the configured gradient and write it.
    pub fn run(&mut self) -> Result<PipelineReport, HdrError> {
        let gradient = self.config.gradient();
        self.run_with(&gradient, Unstoppable)
    }

    /// Generate with `generator`; `stop` is honored while encoding.
    pub fn run_with<G>(&mut self, generator: &G, stop: impl Stop) -> Result<PipelineReport, HdrError>
    where
        G: PixelGenerator + ?Sized,
    {
        self.trace = Trace::default();
        let result = self.execute(generator, stop);
        match &result {
            Ok(report) => log::info!(
                "wrote {} ({} bytes)",
                self.config.destination.display(),
                report.bytes_written
            ),
            Err(e) => {
                log::warn!("pipeline failed after {:?}: {e}", self.trace.last());
                self.trace.push(Stage::Failed);
            }
        }
        result
    }

    fn execute<G, S>(&mut self, generator: &G, stop: S) -> Result<PipelineReport, HdrError>
    where
        G: PixelGenerator + ?Sized,
        S: Stop,
    {
        let cfg = &self.config;
        let container = cfg.container.ok_or_else(|| {
            HdrError::InvalidArgument(format!(
                "no container for {}; use a .pfm or .hdr extension or set one",
                cfg.destination.display()
            ))
        })?;
        let mut surface = Surface::new(cfg.width, cfg.height, cfg.format, &cfg.limits)?;
        self.trace.push(Stage::Created);
        log::info!(
            "generating {}x{} with {} workers",
            cfg.width,
            cfg.height,
            cfg.workers
        );

        let bounds = surface.bounds();
        let fill = {
            // Dropping the guard on an early return releases the lock.
            let mut lock = surface.lock_for_write(bounds)?;
            self.trace.push(Stage::Locked);
            let stats = FillEngine::new(cfg.workers).fill(&mut lock, generator)?;
            self.trace.push(Stage::Filled);
            lock.unlock()?;
            self.trace.push(Stage::Unlocked);
            stats
        };

        if surface.lock_state() != LockState::Unlocked {
            return Err(HdrError::LockProtocolViolation(
                "encode attempted before unlock",
            ));
        }
        let mut encoder = FrameEncoder::create(&cfg.destination, container)?;
        encoder.write_source(&surface, stop)?;
        self.trace.push(Stage::Encoded);
        let bytes_written = encoder.commit()?;
        self.trace.push(Stage::Committed);

        Ok(PipelineReport {
            trace: self.trace.clone(),
            fill,
            bytes_written,
        })
    }
}
