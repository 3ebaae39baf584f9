//! Radiance HDR (`#?RADIANCE`, `32-bit_rle_rgbe`).
//!
//! Each pixel is stored as three 8-bit mantissas sharing one exponent byte.
//! Scanlines between 8 and 32767 pixels wide use the adaptive run-length
//! encoding (one run-length stream per component); other widths are written
//! flat.

mod decode;
mod encode;

pub(crate) use decode::{decode, parse_header};
pub(crate) use encode::encode;

const MAGIC: &[u8] = b"#?";
const FORMAT_RGBE: &str = "32-bit_rle_rgbe";

/// Widths that may (and, when writing, do) use run-length scanlines.
fn rle_width(width: usize) -> bool {
    (8..=0x7fff).contains(&width)
}

/// Parsed Radiance header (internal).
pub(crate) struct RadianceHeader {
    pub width: u32,
    pub height: u32,
    pub data_offset: usize,
}

/// Linear RGB to RGBE. Negative components clamp to zero.
pub(crate) fn to_rgbe([r, g, b]: [f32; 3]) -> [u8; 4] {
    let (r, g, b) = (r.max(0.0), g.max(0.0), b.max(0.0));
    let max = r.max(g).max(b);
    if max < 1.0e-32 {
        return [0; 4];
    }
    let (mantissa, exp) = frexp(max);
    if exp > 127 {
        return [255; 4];
    }
    let scale = mantissa * 256.0 / max;
    let quantize = |c: f32| (c * scale).min(255.0) as u8;
    [quantize(r), quantize(g), quantize(b), (exp + 128) as u8]
}

/// RGBE to linear RGB, reconstructing at the center of each mantissa step.
pub(crate) fn from_rgbe([r, g, b, e]: [u8; 4]) -> [f32; 3] {
    if e == 0 {
        return [0.0; 3];
    }
    let f = 2.0f32.powi(i32::from(e) - 136);
    [
        (f32::from(r) + 0.5) * f,
        (f32::from(g) + 0.5) * f,
        (f32::from(b) + 0.5) * f,
    ]
}

/// Split a positive normal `x` into `m * 2^e` with `m` in `[0.5, 1)`.
fn frexp(x: f32) -> (f32, i32) {
    let bits = x.to_bits();
    let biased = ((bits >> 23) & 0xff) as i32;
    let mantissa = f32::from_bits((bits & 0x807f_ffff) | (126 << 23));
    (mantissa, biased - 126)
}
