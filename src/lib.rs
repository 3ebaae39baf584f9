//! # zenramp
//!
//! Procedural HDR test-image synthesis with PFM and Radiance HDR output.
//!
//! A [`Surface`] holds a fixed RGBX 4×`f32` raster whose values may exceed
//! 1.0 up to the [`PixelFormat`]'s peak. The [`FillEngine`] splits the rows
//! of a write-locked surface into disjoint bands and fills them on scoped
//! threads with a [`PixelGenerator`]; once the lock is released the surface
//! can be handed to a [`FrameEncoder`], which only makes the file visible on
//! commit.
//!
//! ## Lock protocol
//!
//! Pixel memory is written only through a [`WriteLock`]. While a lock is
//! held every read accessor and every encoder rejects the surface with
//! [`HdrError::LockProtocolViolation`]. The guard releases the lock on drop,
//! so a failed fill never leaves the surface stuck.
//!
//! ## Containers
//!
//! - **PFM** (`PF`): 3×f32 little-endian, lossless for generated values
//! - **Radiance HDR** (`#?RADIANCE`): RGBE, run-length scanlines
//!
//! ## Non-Goals
//!
//! - Other in-memory pixel formats
//! - Color management
//! - Streamed generation; the whole raster exists before encoding
//!
//! ## Usage
//!
//! ```no_run
//! use core::num::NonZeroUsize;
//! use zenramp::{
//!     EncodeRequest, FillEngine, Gradient, Limits, PixelFormat, Surface, Unstoppable,
//! };
//!
//! let format = PixelFormat::rgbx_f32(5.0)?;
//! let mut surface = Surface::new(640, 480, format, &Limits::none())?;
//!
//! let bounds = surface.bounds();
//! let mut lock = surface.lock_for_write(bounds)?;
//! FillEngine::new(NonZeroUsize::new(8).unwrap())
//!     .fill(&mut lock, &Gradient::corner_gradients(format.peak()))?;
//! lock.unlock()?;
//!
//! let pfm = EncodeRequest::pfm().encode(&surface, Unstoppable)?;
//! # Ok::<(), zenramp::HdrError>(())
//! ```

#![forbid(unsafe_code)]

mod error;
mod limits;
mod pixel;

pub mod fill;
pub mod generate;
pub mod partition;
pub mod pipeline;
pub mod surface;

mod hdr;
mod pfm;

mod decode;
mod encode;

// Re-exports
pub use decode::{DecodeOutput, DecodeRequest, ImageInfo};
pub use encode::{ContainerFormat, EncodeRequest, FrameEncoder};
pub use enough::{Stop, StopReason, Unstoppable};
pub use error::HdrError;
pub use fill::{DEFAULT_WORKERS, FillEngine, FillStats};
pub use generate::{ChannelFn, ChannelMap, Corner, Gradient, GradientKind, PixelGenerator};
pub use limits::Limits;
pub use partition::{RowBand, row_bands};
pub use pipeline::{Pipeline, PipelineConfig, PipelineReport, Stage, Trace};
pub use pixel::{BYTES_PER_PIXEL, PixelFormat};
pub use surface::{LockState, Rect, Surface, WriteLock};
