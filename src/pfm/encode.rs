use enough::Stop;

use crate::error::HdrError;
use crate::pixel::{BYTES_PER_PIXEL, read_rgb};
use crate::surface::Surface;

/// Encode the RGB channels of `surface` as little-endian `PF`.
pub(crate) fn encode(surface: &Surface, stop: &dyn Stop) -> Result<Vec<u8>, HdrError> {
    let width = surface.width();
    let height = surface.height();
    let header = format!("PF\n{width} {height}\n-1.0\n");
    let row_bytes = (width as usize)
        .checked_mul(12)
        .ok_or_else(|| HdrError::EncodeFailure(format!("{width}-pixel row overflows")))?;
    let total = row_bytes
        .checked_mul(height as usize)
        .and_then(|n| n.checked_add(header.len()))
        .ok_or_else(|| HdrError::EncodeFailure(format!("{width}x{height} overflows")))?;

    let mut out = Vec::new();
    out.try_reserve_exact(total)
        .map_err(|e| HdrError::AllocationFailure(format!("{total} bytes: {e}")))?;
    out.extend_from_slice(header.as_bytes());

    // PFM stores bottom-to-top
    for y in (0..height).rev() {
        if y % 16 == 0 {
            stop.check()?;
        }
        for px in surface.row(y)?.chunks_exact(BYTES_PER_PIXEL) {
            for c in read_rgb(px) {
                out.extend_from_slice(&c.to_le_bytes());
            }
        }
    }

    Ok(out)
}
