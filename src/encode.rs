use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use enough::Stop;

use crate::error::HdrError;
use crate::surface::Surface;

/// Single-frame float container written by the encoders.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    /// Portable Float Map, 3×f32 little-endian, lossless.
    #[default]
    Pfm,
    /// Radiance RGBE (`.hdr`), shared-exponent 8-bit mantissas.
    Radiance,
}

impl ContainerFormat {
    /// Canonical file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pfm => "pfm",
            Self::Radiance => "hdr",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pfm" => Some(Self::Pfm),
            "hdr" | "pic" | "rgbe" => Some(Self::Radiance),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Detect the container from leading magic bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        match data {
            [b'P', b'F' | b'f', ..] => Some(Self::Pfm),
            [b'#', b'?', ..] => Some(Self::Radiance),
            _ => None,
        }
    }
}

/// In-memory encode of an unlocked surface.
///
/// ```no_run
/// use zenramp::{EncodeRequest, Limits, PixelFormat, Surface, Unstoppable};
///
/// let surface = Surface::new(64, 32, PixelFormat::default(), &Limits::none())?;
/// let bytes = EncodeRequest::pfm().encode(&surface, Unstoppable)?;
/// # Ok::<(), zenramp::HdrError>(())
/// ```
#[derive(Clone, Debug)]
pub struct EncodeRequest {
    container: ContainerFormat,
}

impl EncodeRequest {
    pub fn new(container: ContainerFormat) -> Self {
        Self { container }
    }

    pub fn pfm() -> Self {
        Self::new(ContainerFormat::Pfm)
    }

    pub fn radiance() -> Self {
        Self::new(ContainerFormat::Radiance)
    }

    pub fn container(&self) -> ContainerFormat {
        self.container
    }

    /// Serialize the surface's red, green and blue channels.
    ///
    /// A surface that is still locked for write is rejected with
    /// [`HdrError::LockProtocolViolation`].
    pub fn encode(&self, surface: &Surface, stop: impl Stop) -> Result<Vec<u8>, HdrError> {
        surface.ensure_readable()?;
        stop.check()?;
        match self.container {
            ContainerFormat::Pfm => crate::pfm::encode(surface, &stop),
            ContainerFormat::Radiance => crate::hdr::encode(surface, &stop),
        }
    }
}

/// Writes one frame to a destination file, visible only after [`commit`].
///
/// Bytes go to a hidden sibling file first; `commit` flushes, syncs and
/// renames it over the destination. Dropping an uncommitted encoder removes
/// the sibling, so a failed run never leaves a partial image behind.
///
/// [`commit`]: FrameEncoder::commit
#[derive(Debug)]
pub struct FrameEncoder {
    request: EncodeRequest,
    destination: PathBuf,
    staging: PathBuf,
    out: Option<BufWriter<File>>,
    written: u64,
    frame_written: bool,
}

impl FrameEncoder {
    /// Open the staging stream next to `destination`.
    pub fn create(destination: impl AsRef<Path>, container: ContainerFormat) -> Result<Self, HdrError> {
        let destination = destination.as_ref().to_path_buf();
        let name = destination
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                HdrError::InvalidArgument(format!(
                    "destination {} has no file name",
                    destination.display()
                ))
            })?;
        let staging = destination.with_file_name(format!(".{name}.partial"));
        let file = File::create(&staging).map_err(|e| {
            HdrError::SubsystemInit(format!("open {}: {e}", staging.display()))
        })?;
        log::debug!(
            "staging {:?} output for {} in {}",
            container,
            destination.display(),
            staging.display()
        );
        Ok(Self {
            request: EncodeRequest::new(container),
            destination,
            staging,
            out: Some(BufWriter::new(file)),
            written: 0,
            frame_written: false,
        })
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Encode `surface` into the staging stream. Only one frame per file.
    pub fn write_source(&mut self, surface: &Surface, stop: impl Stop) -> Result<(), HdrError> {
        if self.frame_written {
            return Err(HdrError::EncodeFailure(
                "container holds a single frame".into(),
            ));
        }
        let bytes = self.request.encode(surface, stop)?;
        let out = self
            .out
            .as_mut()
            .ok_or_else(|| HdrError::EncodeFailure("stream already closed".into()))?;
        out.write_all(&bytes)
            .map_err(|e| HdrError::EncodeFailure(format!("write {}: {e}", self.staging.display())))?;
        self.written = bytes.len() as u64;
        self.frame_written = true;
        Ok(())
    }

    /// Flush the frame and move it to the destination. Returns bytes written.
    pub fn commit(mut self) -> Result<u64, HdrError> {
        if !self.frame_written {
            return Err(HdrError::CommitFailure("no frame was written".into()));
        }
        let out = self
            .out
            .take()
            .ok_or_else(|| HdrError::CommitFailure("stream already closed".into()))?;
        let file = out
            .into_inner()
            .map_err(|e| HdrError::CommitFailure(format!("flush: {}", e.error())))?;
        file.sync_all()
            .map_err(|e| HdrError::CommitFailure(format!("sync: {e}")))?;
        drop(file);
        std::fs::rename(&self.staging, &self.destination).map_err(|e| {
            HdrError::CommitFailure(format!(
                "rename {} to {}: {e}",
                self.staging.display(),
                self.destination.display()
            ))
        })?;
        // Renamed away; nothing left for Drop to clean up.
        self.frame_written = false;
        self.staging.clear();
        Ok(self.written)
    }
}

impl Drop for FrameEncoder {
    fn drop(&mut self) {
        if self.staging.as_os_str().is_empty() {
            return;
        }
        self.out.take();
        if std::fs::remove_file(&self.staging).is_ok() {
            log::warn!(
                "discarded uncommitted output for {}",
                self.destination.display()
            );
        }
    }
}
