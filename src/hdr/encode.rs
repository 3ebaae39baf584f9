use enough::Stop;

use super::{FORMAT_RGBE, rle_width, to_rgbe};
use crate::error::HdrError;
use crate::pixel::{BYTES_PER_PIXEL, read_rgb};
use crate::surface::Surface;

/// Encode the RGB channels of `surface` as a top-down Radiance image.
pub(crate) fn encode(surface: &Surface, stop: &dyn Stop) -> Result<Vec<u8>, HdrError> {
    let width = surface.width();
    let height = surface.height();
    let w = width as usize;
    let header = format!(
        "#?RADIANCE\nFORMAT={FORMAT_RGBE}\nSOFTWARE=zenramp {}\n\n-Y {height} +X {width}\n",
        env!("CARGO_PKG_VERSION")
    );

    // Worst case: every run-length scanline is all literals.
    let max_scanline = if rle_width(w) {
        4 + w * 4 + 4 * w.div_ceil(MAX_LITERAL)
    } else {
        w * 4
    };
    let total = max_scanline
        .checked_mul(height as usize)
        .and_then(|n| n.checked_add(header.len()))
        .ok_or_else(|| HdrError::EncodeFailure(format!("{width}x{height} overflows")))?;

    let mut out = Vec::new();
    out.try_reserve_exact(total)
        .map_err(|e| HdrError::AllocationFailure(format!("{total} bytes: {e}")))?;
    out.extend_from_slice(header.as_bytes());

    let mut scanline = vec![0u8; w * 4];
    let mut component = vec![0u8; w];
    for y in 0..height {
        if y % 16 == 0 {
            stop.check()?;
        }
        for (x, (px, rgbe)) in surface
            .row(y)?
            .chunks_exact(BYTES_PER_PIXEL)
            .zip(scanline.chunks_exact_mut(4))
            .enumerate()
        {
            let rgb = read_rgb(px);
            if rgb.iter().any(|c| !c.is_finite()) {
                return Err(HdrError::EncodeFailure(format!(
                    "non-finite value {rgb:?} at ({x}, {y})"
                )));
            }
            rgbe.copy_from_slice(&to_rgbe(rgb));
        }

        if rle_width(w) {
            out.extend_from_slice(&[2, 2, (w >> 8) as u8, (w & 0xff) as u8]);
            for c in 0..4 {
                for (dst, src) in component.iter_mut().zip(scanline.chunks_exact(4)) {
                    *dst = src[c];
                }
                encode_runs(&component, &mut out);
            }
        } else {
            out.extend_from_slice(&scanline);
        }
    }

    Ok(out)
}

const MIN_RUN: usize = 4;
const MAX_RUN: usize = 127;
const MAX_LITERAL: usize = 128;

/// Adaptive RLE of one component: `128 + n, value` for runs, `n, bytes...`
/// for literals.
fn encode_runs(data: &[u8], out: &mut Vec<u8>) {
    let run_at = |i: usize| {
        data[i..]
            .iter()
            .take(MAX_RUN)
            .take_while(|&&b| b == data[i])
            .count()
    };

    let mut i = 0;
    while i < data.len() {
        let run = run_at(i);
        if run >= MIN_RUN {
            out.push((128 + run) as u8);
            out.push(data[i]);
            i += run;
            continue;
        }

        let start = i;
        while i < data.len() && i - start < MAX_LITERAL && run_at(i) < MIN_RUN {
            i += 1;
        }
        out.push((i - start) as u8);
        out.extend_from_slice(&data[start..i]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_and_literals() {
        let mut out = Vec::new();
        encode_runs(&[7, 7, 7, 7, 7, 1, 2, 3, 9, 9, 9, 9], &mut out);
        assert_eq!(out, vec![133, 7, 3, 1, 2, 3, 132, 9]);
    }

    #[test]
    fn long_runs_split_at_127() {
        let mut out = Vec::new();
        encode_runs(&[4; 200], &mut out);
        assert_eq!(out, vec![255, 4, 128 + 73, 4]);
    }

    #[test]
    fn literals_split_at_128() {
        let data: Vec<u8> = (0..=255u8).collect();
        let mut out = Vec::new();
        encode_runs(&data, &mut out);
        assert_eq!(out[0], 128);
        assert_eq!(out[129], 128);
        assert_eq!(out.len(), 256 + 2);
    }
}
