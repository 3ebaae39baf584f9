use enough::Stop;

use super::PfmHeader;
use crate::error::HdrError;

/// Parse the PFM header.
pub(crate) fn parse_header(data: &[u8]) -> Result<PfmHeader, HdrError> {
    let channels = match data {
        [b'P', b'F', ..] => 3,
        [b'P', b'f', ..] => 1,
        [_, _, ..] => return Err(HdrError::UnrecognizedFormat),
        _ => return Err(HdrError::UnexpectedEof),
    };

    let mut pos = 2;
    let width = next_token(data, &mut pos)?;
    let height = next_token(data, &mut pos)?;
    let scale = next_token(data, &mut pos)?;

    let width: u32 = width
        .parse()
        .map_err(|_| HdrError::InvalidHeader(format!("bad width {width:?}")))?;
    let height: u32 = height
        .parse()
        .map_err(|_| HdrError::InvalidHeader(format!("bad height {height:?}")))?;
    let scale: f32 = scale
        .parse()
        .map_err(|_| HdrError::InvalidHeader(format!("bad scale {scale:?}")))?;
    if width == 0 || height == 0 {
        return Err(HdrError::InvalidHeader(format!(
            "zero dimension {width}x{height}"
        )));
    }
    if scale == 0.0 || !scale.is_finite() {
        return Err(HdrError::InvalidHeader(format!("bad scale {scale}")));
    }

    // Exactly one whitespace byte separates the scale from the samples.
    match data.get(pos) {
        Some(b) if b.is_ascii_whitespace() => pos += 1,
        Some(_) => return Err(HdrError::InvalidHeader("missing separator after scale".into())),
        None => return Err(HdrError::UnexpectedEof),
    }

    Ok(PfmHeader {
        width,
        height,
        channels,
        little_endian: scale < 0.0,
        data_offset: pos,
    })
}

fn next_token<'a>(data: &'a [u8], pos: &mut usize) -> Result<&'a str, HdrError> {
    while data.get(*pos).is_some_and(u8::is_ascii_whitespace) {
        *pos += 1;
    }
    let start = *pos;
    while data.get(*pos).is_some_and(|b| !b.is_ascii_whitespace()) {
        *pos += 1;
    }
    if start == *pos {
        return Err(HdrError::UnexpectedEof);
    }
    core::str::from_utf8(&data[start..*pos])
        .map_err(|_| HdrError::InvalidHeader("non-ASCII header token".into()))
}

/// Decode samples to top-down RGB f32; grayscale is replicated to RGB.
pub(crate) fn decode(data: &[u8], header: &PfmHeader, stop: &dyn Stop) -> Result<Vec<f32>, HdrError> {
    let w = header.width as usize;
    let h = header.height as usize;
    let row_bytes = w * header.channels * 4;
    let needed = row_bytes
        .checked_mul(h)
        .ok_or_else(|| HdrError::InvalidHeader(format!("{w}x{h} overflows")))?;
    let samples = data
        .get(header.data_offset..)
        .and_then(|d| d.get(..needed))
        .ok_or(HdrError::UnexpectedEof)?;

    let sample = |b: &[u8]| {
        let raw = [b[0], b[1], b[2], b[3]];
        if header.little_endian {
            f32::from_le_bytes(raw)
        } else {
            f32::from_be_bytes(raw)
        }
    };

    let mut out = Vec::with_capacity(w * h * 3);
    // Stored bottom-to-top
    for (i, row) in samples.chunks_exact(row_bytes).rev().enumerate() {
        if i % 16 == 0 {
            stop.check()?;
        }
        for px in row.chunks_exact(header.channels * 4) {
            if header.channels == 1 {
                let g = sample(px);
                out.extend_from_slice(&[g, g, g]);
            } else {
                out.extend(px.chunks_exact(4).map(sample));
            }
        }
    }
    Ok(out)
}
