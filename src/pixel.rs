use crate::error::HdrError;

/// Channels per pixel: red, green, blue, padding.
pub const CHANNELS: usize = 4;

/// Bytes per channel (IEEE-754 single precision).
pub const BYTES_PER_CHANNEL: usize = 4;

/// Bytes per pixel of the in-memory layout.
pub const BYTES_PER_PIXEL: usize = CHANNELS * BYTES_PER_CHANNEL;

/// In-memory pixel format of a [`Surface`](crate::Surface).
///
/// The layout is fixed: four native-endian `f32` channels `(R, G, B, X)`,
/// where `X` is padding that is never read as color. Values are linear light
/// and may exceed 1.0 up to [`peak`](Self::peak).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelFormat {
    peak: f32,
    row_alignment: usize,
}

impl Default for PixelFormat {
    fn default() -> Self {
        Self {
            peak: 5.0,
            row_alignment: 16,
        }
    }
}

impl PixelFormat {
    /// RGBX 4×f32 with the given HDR peak and 16-byte row alignment.
    pub fn rgbx_f32(peak: f32) -> Result<Self, HdrError> {
        if !peak.is_finite() || peak <= 0.0 {
            return Err(HdrError::InvalidArgument(format!(
                "peak must be finite and positive, got {peak}"
            )));
        }
        Ok(Self {
            peak,
            row_alignment: 16,
        })
    }

    /// Round every row up to a multiple of `alignment` bytes.
    pub fn with_row_alignment(mut self, alignment: usize) -> Result<Self, HdrError> {
        if !alignment.is_power_of_two() {
            return Err(HdrError::InvalidArgument(format!(
                "row alignment must be a power of two, got {alignment}"
            )));
        }
        self.row_alignment = alignment;
        Ok(self)
    }

    /// Reference HDR ceiling for generated values.
    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn row_alignment(&self) -> usize {
        self.row_alignment
    }

    pub fn channels(&self) -> usize {
        CHANNELS
    }

    pub fn bytes_per_pixel(&self) -> usize {
        BYTES_PER_PIXEL
    }

    /// Row stride in bytes for `width` pixels, or `None` on overflow.
    pub fn stride_for(&self, width: u32) -> Option<usize> {
        let packed = (width as usize).checked_mul(BYTES_PER_PIXEL)?;
        let mask = self.row_alignment - 1;
        Some(packed.checked_add(mask)? & !mask)
    }
}

/// Read one `(r, g, b)` triple from the start of `pixel`.
pub(crate) fn read_rgb(pixel: &[u8]) -> [f32; 3] {
    let channel = |i: usize| {
        let off = i * BYTES_PER_CHANNEL;
        f32::from_ne_bytes([pixel[off], pixel[off + 1], pixel[off + 2], pixel[off + 3]])
    };
    [channel(0), channel(1), channel(2)]
}

/// Write `(r, g, b)` to the start of `pixel`, leaving the padding slot alone.
pub(crate) fn write_rgb(pixel: &mut [u8], rgb: [f32; 3]) {
    for (slot, value) in pixel.chunks_exact_mut(BYTES_PER_CHANNEL).zip(rgb) {
        slot.copy_from_slice(&value.to_ne_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_per_pixel_is_channels_times_channel_size() {
        let format = PixelFormat::default();
        assert_eq!(format.bytes_per_pixel(), format.channels() * 4);
        assert_eq!(format.bytes_per_pixel(), 16);
    }

    #[test]
    fn stride_rounds_up_to_alignment() {
        let format = PixelFormat::default().with_row_alignment(64).unwrap();
        assert_eq!(format.stride_for(1), Some(64));
        assert_eq!(format.stride_for(4), Some(64));
        assert_eq!(format.stride_for(5), Some(128));
        assert_eq!(PixelFormat::default().stride_for(3), Some(48));
    }

    #[test]
    fn rejects_bad_peak_and_alignment() {
        assert!(PixelFormat::rgbx_f32(0.0).is_err());
        assert!(PixelFormat::rgbx_f32(f32::NAN).is_err());
        assert!(PixelFormat::default().with_row_alignment(24).is_err());
        assert!(PixelFormat::default().with_row_alignment(0).is_err());
    }

    #[test]
    fn write_rgb_leaves_padding() {
        let mut px = [0xAAu8; BYTES_PER_PIXEL];
        write_rgb(&mut px, [1.0, 2.0, 3.0]);
        assert_eq!(read_rgb(&px), [1.0, 2.0, 3.0]);
        assert_eq!(&px[12..], &[0xAA; 4]);
    }
}
