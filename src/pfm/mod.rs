//! PFM (Portable Float Map): `PF` for RGB, `Pf` for grayscale.
//!
//! Header is three whitespace-separated tokens after the magic: width,
//! height and scale. A negative scale means little-endian samples. Rows are
//! stored bottom to top.

mod decode;
mod encode;

pub(crate) use decode::{decode, parse_header};
pub(crate) use encode::encode;

/// Parsed PFM header (internal).
pub(crate) struct PfmHeader {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    pub little_endian: bool,
    pub data_offset: usize,
}
