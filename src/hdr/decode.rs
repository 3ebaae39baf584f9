use enough::Stop;

use super::{FORMAT_RGBE, MAGIC, RadianceHeader, from_rgbe, rle_width};
use crate::error::HdrError;

/// Parse header lines up to and including the resolution line.
///
/// Only the standard `-Y <height> +X <width>` orientation is accepted.
pub(crate) fn parse_header(data: &[u8]) -> Result<RadianceHeader, HdrError> {
    if data.len() < MAGIC.len() {
        return Err(HdrError::UnexpectedEof);
    }
    if !data.starts_with(MAGIC) {
        return Err(HdrError::UnrecognizedFormat);
    }

    let mut pos = 0;
    next_line(data, &mut pos)?; // #?RADIANCE or #?RGBE
    loop {
        let line = next_line(data, &mut pos)?;
        if line.is_empty() {
            break;
        }
        if let Some(format) = line.strip_prefix("FORMAT=") {
            if format.trim() != FORMAT_RGBE {
                return Err(HdrError::InvalidHeader(format!(
                    "unsupported pixel format {format:?}"
                )));
            }
        }
    }

    let resolution = next_line(data, &mut pos)?;
    let parts: Vec<&str> = resolution.split_whitespace().collect();
    let (height, width) = match parts.as_slice() {
        ["-Y", h, "+X", w] => (h.parse::<u32>().ok(), w.parse::<u32>().ok()),
        _ => (None, None),
    };
    match (width, height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => Ok(RadianceHeader {
            width,
            height,
            data_offset: pos,
        }),
        _ => Err(HdrError::InvalidHeader(format!(
            "unsupported resolution line {resolution:?}"
        ))),
    }
}

fn next_line<'a>(data: &'a [u8], pos: &mut usize) -> Result<&'a str, HdrError> {
    let rest = &data[*pos..];
    let end = rest
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(HdrError::UnexpectedEof)?;
    *pos += end + 1;
    core::str::from_utf8(&rest[..end])
        .map(|s| s.trim_end_matches('\r'))
        .map_err(|_| HdrError::InvalidHeader("non-UTF-8 header line".into()))
}

/// Decode RGBE scanlines to top-down RGB f32.
pub(crate) fn decode(
    data: &[u8],
    header: &RadianceHeader,
    stop: &dyn Stop,
) -> Result<Vec<f32>, HdrError> {
    let w = header.width as usize;
    let h = header.height as usize;
    let mut input = data.get(header.data_offset..).ok_or(HdrError::UnexpectedEof)?;

    // Smallest possible encoding of one scanline; rejects absurd headers
    // before anything is allocated.
    let min_scanline = if rle_width(w) {
        4 + 4 * 2 * w.div_ceil(127)
    } else {
        w * 4
    };
    if h.checked_mul(min_scanline).is_none_or(|n| n > input.len()) {
        return Err(HdrError::UnexpectedEof);
    }

    let mut scanline = vec![0u8; w * 4];
    let mut out = Vec::new();

    for y in 0..h {
        if y % 16 == 0 {
            stop.check()?;
        }
        let rle = rle_width(w)
            && matches!(input, [2, 2, hi, _, ..] if hi & 0x80 == 0);
        if rle {
            let encoded = usize::from(input[2]) << 8 | usize::from(input[3]);
            if encoded != w {
                return Err(HdrError::InvalidHeader(format!(
                    "scanline {y} width {encoded} != {w}"
                )));
            }
            input = &input[4..];
            for c in 0..4 {
                input = decode_runs(input, &mut scanline, c)?;
            }
        } else {
            let (flat, rest) = input
                .split_at_checked(w * 4)
                .ok_or(HdrError::UnexpectedEof)?;
            scanline.copy_from_slice(flat);
            input = rest;
        }
        for px in scanline.chunks_exact(4) {
            out.extend_from_slice(&from_rgbe([px[0], px[1], px[2], px[3]]));
        }
    }
    Ok(out)
}

/// Expand one component's runs into every fourth byte of `scanline`.
fn decode_runs<'a>(mut input: &'a [u8], scanline: &mut [u8], component: usize) -> Result<&'a [u8], HdrError> {
    let width = scanline.len() / 4;
    let mut x = 0;
    while x < width {
        let (&count, rest) = input.split_first().ok_or(HdrError::UnexpectedEof)?;
        input = rest;
        let (n, run) = if count > 128 {
            (usize::from(count) - 128, true)
        } else {
            (usize::from(count), false)
        };
        if n == 0 || x + n > width {
            return Err(HdrError::InvalidHeader(format!(
                "run of {n} overflows scanline at {x}"
            )));
        }
        if run {
            let (&value, rest) = input.split_first().ok_or(HdrError::UnexpectedEof)?;
            input = rest;
            for i in x..x + n {
                scanline[i * 4 + component] = value;
            }
        } else {
            let (bytes, rest) = input.split_at_checked(n).ok_or(HdrError::UnexpectedEof)?;
            input = rest;
            for (i, &b) in (x..x + n).zip(bytes) {
                scanline[i * 4 + component] = b;
            }
        }
        x += n;
    }
    Ok(input)
}
