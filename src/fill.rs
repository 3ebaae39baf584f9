//! Parallel fill of a write-locked surface.
//!
//! The locked rows are split into disjoint `&mut [u8]` bands with
//! `split_at_mut`, one per worker, so the workers share nothing and need no
//! synchronization beyond the final join.

use core::num::NonZeroUsize;
use std::thread;

use crate::error::HdrError;
use crate::generate::PixelGenerator;
use crate::partition::{RowBand, row_bands};
use crate::pixel::{BYTES_PER_PIXEL, write_rgb};
use crate::surface::WriteLock;

/// Worker count used when none is configured.
pub const DEFAULT_WORKERS: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(n) => n,
    None => unreachable!(),
};

/// What a completed fill did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillStats {
    /// Threads spawned (one per non-empty band).
    pub workers: usize,
    pub rows: usize,
    pub pixels: u64,
}

/// Spawns a fixed number of scoped threads per fill and joins them all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillEngine {
    workers: NonZeroUsize,
}

impl Default for FillEngine {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl FillEngine {
    pub fn new(workers: NonZeroUsize) -> Self {
        Self { workers }
    }

    pub fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    /// Write every pixel of the locked rectangle exactly once.
    ///
    /// Returns only after every worker has been joined. A panicking worker is
    /// reported as [`HdrError::WorkerPanicked`]; the lock itself stays with
    /// the caller, whose guard releases it on the error path.
    pub fn fill<G>(&self, lock: &mut WriteLock<'_>, generator: &G) -> Result<FillStats, HdrError>
    where
        G: PixelGenerator + ?Sized,
    {
        let rect = lock.rect();
        if rect.is_empty() {
            log::debug!("fill of empty rect {rect:?}, no workers dispatched");
            return Ok(FillStats::default());
        }

        let (width, height) = lock.surface_size();
        let ctx = BandContext {
            width: width as f32,
            height: height as f32,
            first_row: rect.y as usize,
            col_start: rect.x as usize,
            col_end: rect.x as usize + rect.width as usize,
            stride: lock.stride(),
        };

        let mut remaining = lock.rows_mut();
        let mut jobs = Vec::with_capacity(self.workers.get());
        for band in row_bands(rect.height as usize, self.workers) {
            let (chunk, rest) = core::mem::take(&mut remaining).split_at_mut(band.len() * ctx.stride);
            remaining = rest;
            if !band.is_empty() {
                jobs.push((band, chunk));
            }
        }

        let mut stats = FillStats::default();
        let ctx = &ctx;
        thread::scope(|s| {
            let mut failure = None;
            let mut handles = Vec::with_capacity(jobs.len());
            for (band, chunk) in jobs {
                let worker = band.worker;
                log::debug!("fill worker {worker}: rows {:?}", band.rows);
                let spawned = thread::Builder::new()
                    .name(format!("zenramp-fill-{worker}"))
                    .spawn_scoped(s, move || ctx.fill_band(&band, chunk, generator));
                match spawned {
                    Ok(handle) => handles.push((worker, handle)),
                    Err(e) => {
                        failure = Some(HdrError::AllocationFailure(format!(
                            "spawn fill worker {worker}: {e}"
                        )));
                        break;
                    }
                }
            }

            for (worker, handle) in handles {
                match handle.join() {
                    Ok((rows, pixels)) => {
                        stats.workers += 1;
                        stats.rows += rows;
                        stats.pixels += pixels;
                    }
                    Err(_) => {
                        failure.get_or_insert(HdrError::WorkerPanicked { worker });
                    }
                }
            }
            failure.map_or(Ok(()), Err)
        })?;

        log::debug!(
            "filled {} rows ({} pixels) with {} workers",
            stats.rows,
            stats.pixels,
            stats.workers
        );
        Ok(stats)
    }
}

/// Geometry shared read-only by every worker.
struct BandContext {
    width: f32,
    height: f32,
    first_row: usize,
    col_start: usize,
    col_end: usize,
    stride: usize,
}

impl BandContext {
    /// Fill one band. `chunk` holds exactly the band's rows, `stride` bytes each.
    fn fill_band<G>(&self, band: &RowBand, chunk: &mut [u8], generator: &G) -> (usize, u64)
    where
        G: PixelGenerator + ?Sized,
    {
        let start = self.col_start * BYTES_PER_PIXEL;
        let end = self.col_end * BYTES_PER_PIXEL;
        let mut pixels = 0u64;
        for (i, row) in chunk.chunks_exact_mut(self.stride).enumerate() {
            let y = self.first_row + band.rows.start + i;
            let v = y as f32 / self.height;
            for (x, px) in (self.col_start..).zip(row[start..end].chunks_exact_mut(BYTES_PER_PIXEL)) {
                let u = x as f32 / self.width;
                write_rgb(px, generator.rgb(u, v));
            }
            pixels += (self.col_end - self.col_start) as u64;
        }
        (band.len(), pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Limits, PixelFormat, Rect, Surface};

    fn workers(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn one_worker_per_non_empty_band() {
        let mut s = Surface::new(3, 4, PixelFormat::default(), &Limits::none()).unwrap();
        let mut lock = s.lock_for_write(Rect::new(0, 0, 3, 4)).unwrap();
        let stats = FillEngine::new(workers(10))
            .fill(&mut lock, &|_u: f32, _v: f32| -> [f32; 3] { [1.0; 3] })
            .unwrap();
        assert_eq!(stats, FillStats { workers: 4, rows: 4, pixels: 12 });
    }

    #[test]
    fn sub_rect_leaves_other_pixels_alone() {
        let mut s = Surface::new(4, 4, PixelFormat::default(), &Limits::none()).unwrap();
        let mut lock = s.lock_for_write(Rect::new(1, 1, 2, 2)).unwrap();
        FillEngine::new(workers(3))
            .fill(&mut lock, &|_u: f32, _v: f32| -> [f32; 3] { [7.0; 3] })
            .unwrap();
        lock.unlock().unwrap();
        for y in 0..4 {
            for x in 0..4 {
                let inside = (1..3).contains(&x) && (1..3).contains(&y);
                let expected = if inside { [7.0; 3] } else { [0.0; 3] };
                assert_eq!(s.pixel(x, y).unwrap(), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn uses_full_surface_for_normalization() {
        let mut s = Surface::new(4, 2, PixelFormat::default(), &Limits::none()).unwrap();
        let mut lock = s.lock_for_write(Rect::new(2, 1, 2, 1)).unwrap();
        FillEngine::new(workers(1))
            .fill(&mut lock, &|u: f32, v: f32| -> [f32; 3] { [u, v, 0.0] })
            .unwrap();
        drop(lock);
        assert_eq!(s.pixel(3, 1).unwrap(), [0.75, 0.5, 0.0]);
    }
}
