//! Raster surface with an exclusive, scoped write lock.
//!
//! A [`Surface`] owns a zero-initialized, row-major byte buffer of
//! `height * stride` bytes. Mutation only happens through a [`WriteLock`];
//! while one exists (or was leaked) every read accessor reports
//! [`HdrError::LockProtocolViolation`].

use core::fmt;

use crate::error::HdrError;
use crate::limits::Limits;
use crate::pixel::{self, BYTES_PER_PIXEL, PixelFormat};

/// Lock state of a [`Surface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    LockedForWrite,
}

/// Axis-aligned pixel rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn fits_within(&self, width: u32, height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }
}

/// Fixed-format HDR raster: `width`×`height` RGBX f32 pixels.
pub struct Surface {
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    data: Vec<u8>,
    state: LockState,
}

impl Surface {
    /// Allocate a zeroed surface. Dimensions are immutable afterwards.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        limits: &Limits,
    ) -> Result<Self, HdrError> {
        if width == 0 || height == 0 {
            return Err(HdrError::InvalidArgument(format!(
                "surface dimensions must be positive, got {width}x{height}"
            )));
        }
        let stride = format
            .stride_for(width)
            .ok_or_else(|| HdrError::AllocationFailure(format!("row of {width} pixels overflows")))?;
        let len = stride
            .checked_mul(height as usize)
            .ok_or_else(|| HdrError::AllocationFailure(format!("{width}x{height} overflows")))?;
        limits.check_raster(width, height, len as u64)?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| HdrError::AllocationFailure(format!("{len} bytes: {e}")))?;
        data.resize(len, 0);

        log::debug!("allocated {width}x{height} surface, stride {stride}, {len} bytes");
        Ok(Self {
            width,
            height,
            stride,
            format,
            data,
            state: LockState::Unlocked,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    pub fn lock_state(&self) -> LockState {
        self.state
    }

    /// The full-surface rectangle.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Acquire the exclusive write lock over `rect`.
    ///
    /// The lock is released when the returned guard is dropped or
    /// [`WriteLock::unlock`]ed.
    pub fn lock_for_write(&mut self, rect: Rect) -> Result<WriteLock<'_>, HdrError> {
        if self.state == LockState::LockedForWrite {
            return Err(HdrError::LockProtocolViolation(
                "surface is already locked for write",
            ));
        }
        if !rect.fits_within(self.width, self.height) {
            return Err(HdrError::InvalidArgument(format!(
                "lock rect {rect:?} exceeds {}x{} surface",
                self.width, self.height
            )));
        }
        self.state = LockState::LockedForWrite;
        Ok(WriteLock {
            surface: self,
            rect,
            released: false,
        })
    }

    pub(crate) fn ensure_readable(&self) -> Result<(), HdrError> {
        match self.state {
            LockState::Unlocked => Ok(()),
            LockState::LockedForWrite => Err(HdrError::LockProtocolViolation(
                "pixel memory read while locked for write",
            )),
        }
    }

    /// Whole buffer, `height * stride` bytes, row padding included.
    pub fn pixels(&self) -> Result<&[u8], HdrError> {
        self.ensure_readable()?;
        Ok(&self.data)
    }

    /// The `width * 16` pixel bytes of row `y`, without padding.
    pub fn row(&self, y: u32) -> Result<&[u8], HdrError> {
        self.ensure_readable()?;
        if y >= self.height {
            return Err(HdrError::InvalidArgument(format!(
                "row {y} out of range for height {}",
                self.height
            )));
        }
        let start = y as usize * self.stride;
        Ok(&self.data[start..start + self.width as usize * BYTES_PER_PIXEL])
    }

    /// `(red, green, blue)` of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Result<[f32; 3], HdrError> {
        if x >= self.width {
            return Err(HdrError::InvalidArgument(format!(
                "column {x} out of range for width {}",
                self.width
            )));
        }
        let row = self.row(y)?;
        Ok(pixel::read_rgb(&row[x as usize * BYTES_PER_PIXEL..]))
    }

    /// Pixel `(x, y)` as a typed value. The padding slot is not read.
    #[cfg(feature = "rgb")]
    pub fn rgb(&self, x: u32, y: u32) -> Result<rgb::RGB<f32>, HdrError> {
        let [r, g, b] = self.pixel(x, y)?;
        Ok(rgb::RGB::new(r, g, b))
    }
}

// Pixel data is left out; it can be hundreds of megabytes.
impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("format", &self.format)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Exclusive write access to a rectangle of a [`Surface`].
///
/// Dropping the guard releases the lock, so a fill that fails or panics
/// still leaves the surface unlocked.
pub struct WriteLock<'a> {
    surface: &'a mut Surface,
    rect: Rect,
    released: bool,
}

impl fmt::Debug for WriteLock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteLock")
            .field("surface", &self.surface)
            .field("rect", &self.rect)
            .field("released", &self.released)
            .finish()
    }
}

impl WriteLock<'_> {
    /// The locked rectangle.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn stride(&self) -> usize {
        self.surface.stride
    }

    /// Full surface `(width, height)`, used to normalize coordinates.
    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface.width, self.surface.height)
    }

    /// Whole rows `rect.y .. rect.y + rect.height`, stride bytes each.
    ///
    /// Row `i` of the slice is surface row `rect.y + i`. Writers must stay
    /// within the locked columns.
    pub fn rows_mut(&mut self) -> &mut [u8] {
        let stride = self.surface.stride;
        let start = self.rect.y as usize * stride;
        let end = start + self.rect.height as usize * stride;
        &mut self.surface.data[start..end]
    }

    /// Release the lock explicitly.
    pub fn unlock(mut self) -> Result<(), HdrError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), HdrError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        if self.surface.state != LockState::LockedForWrite {
            return Err(HdrError::LockProtocolViolation(
                "unlock of a surface that is not locked",
            ));
        }
        self.surface.state = LockState::Unlocked;
        Ok(())
    }
}

impl Drop for WriteLock<'_> {
    fn drop(&mut self) {
        if !self.released {
            log::debug!("write lock on {:?} released by drop", self.rect);
            let _ = self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(w: u32, h: u32) -> Surface {
        Surface::new(w, h, PixelFormat::default(), &Limits::none()).unwrap()
    }

    #[test]
    fn zero_dimensions_rejected() {
        let err = Surface::new(0, 4, PixelFormat::default(), &Limits::none()).unwrap_err();
        assert!(matches!(err, HdrError::InvalidArgument(_)));
    }

    #[test]
    fn limits_apply_to_padded_size() {
        let format = PixelFormat::default().with_row_alignment(256).unwrap();
        let limits = Limits::none().with_max_memory_bytes(255);
        let err = Surface::new(1, 1, format, &limits).unwrap_err();
        assert!(matches!(err, HdrError::LimitExceeded(_)));
    }

    #[test]
    fn reads_rejected_while_locked() {
        let mut s = surface(2, 2);
        let lock = s.lock_for_write(Rect::new(0, 0, 2, 2)).unwrap();
        // Leaking the guard leaves the surface locked.
        core::mem::forget(lock);
        assert_eq!(s.lock_state(), LockState::LockedForWrite);
        assert!(matches!(s.pixels(), Err(HdrError::LockProtocolViolation(_))));
        assert!(matches!(s.pixel(0, 0), Err(HdrError::LockProtocolViolation(_))));
        assert!(matches!(
            s.lock_for_write(Rect::new(0, 0, 1, 1)),
            Err(HdrError::LockProtocolViolation(_))
        ));
    }

    #[test]
    fn drop_and_unlock_both_release() {
        let mut s = surface(3, 1);
        let bounds = s.bounds();
        {
            let _lock = s.lock_for_write(bounds).unwrap();
        }
        assert_eq!(s.lock_state(), LockState::Unlocked);
        let lock = s.lock_for_write(bounds).unwrap();
        lock.unlock().unwrap();
        assert_eq!(s.lock_state(), LockState::Unlocked);
        assert!(s.pixels().is_ok());
    }

    #[test]
    fn lock_rect_must_fit() {
        let mut s = surface(4, 4);
        assert!(matches!(
            s.lock_for_write(Rect::new(2, 0, 3, 1)),
            Err(HdrError::InvalidArgument(_))
        ));
        assert_eq!(s.lock_state(), LockState::Unlocked);
    }

    #[test]
    fn rows_mut_covers_locked_rows() {
        let mut s = surface(2, 5);
        let stride = s.stride();
        let mut lock = s.lock_for_write(Rect::new(0, 1, 2, 3)).unwrap();
        assert_eq!(lock.rows_mut().len(), 3 * stride);
        drop(lock);
        let mut lock = s.lock_for_write(Rect::new(1, 4, 1, 0)).unwrap();
        assert!(lock.rows_mut().is_empty());
    }

    #[test]
    fn debug_omits_pixel_data() {
        let mut s = surface(64, 64);
        let text = format!("{s:?}");
        assert!(text.contains("width: 64"), "{text}");
        assert!(text.contains("Unlocked"), "{text}");
        assert!(text.len() < 256, "{} bytes of debug output", text.len());

        let bounds = s.bounds();
        let lock = s.lock_for_write(bounds).unwrap();
        let text = format!("{lock:?}");
        assert!(text.contains("LockedForWrite"), "{text}");
        assert!(text.len() < 512, "{} bytes of debug output", text.len());
    }
}
