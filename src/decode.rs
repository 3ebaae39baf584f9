use enough::Stop;

use crate::encode::ContainerFormat;
use crate::error::HdrError;
use crate::limits::Limits;

/// Dimensions and container of an encoded image, read from its header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ContainerFormat,
}

impl ImageInfo {
    /// Probe the header without decoding samples.
    pub fn from_bytes(data: &[u8]) -> Result<Self, HdrError> {
        let format = ContainerFormat::detect(data).ok_or(HdrError::UnrecognizedFormat)?;
        let (width, height) = match format {
            ContainerFormat::Pfm => {
                let h = crate::pfm::parse_header(data)?;
                (h.width, h.height)
            }
            ContainerFormat::Radiance => {
                let h = crate::hdr::parse_header(data)?;
                (h.width, h.height)
            }
        };
        Ok(Self {
            width,
            height,
            format,
        })
    }
}

/// Decoded image: packed, top-down RGB `f32` triples.
#[derive(Clone, Debug)]
pub struct DecodeOutput {
    pixels: Vec<f32>,
    pub width: u32,
    pub height: u32,
    pub format: ContainerFormat,
}

impl DecodeOutput {
    /// All samples, `width * height * 3` values.
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    /// `(red, green, blue)` at `(x, y)`, or `None` when out of range.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let off = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.pixels[off], self.pixels[off + 1], self.pixels[off + 2]])
    }

    /// Copy into typed pixels.
    #[cfg(feature = "rgb")]
    pub fn to_rgb(&self) -> Vec<rgb::RGB<f32>> {
        self.pixels
            .chunks_exact(3)
            .map(|c| rgb::RGB::new(c[0], c[1], c[2]))
            .collect()
    }

    /// Convert to an [`imgref::ImgVec`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec(&self) -> imgref::ImgVec<rgb::RGB<f32>> {
        imgref::ImgVec::new(self.to_rgb(), self.width as usize, self.height as usize)
    }
}

/// Decode a PFM or Radiance image, detected from its magic bytes.
///
/// ```no_run
/// use zenramp::{DecodeRequest, Unstoppable};
///
/// let data = std::fs::read("ramp.pfm")?;
/// let decoded = DecodeRequest::new(&data).decode(Unstoppable)?;
/// println!("{}x{} {:?}", decoded.width, decoded.height, decoded.pixel(0, 0));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    limits: Option<&'a Limits>,
}

impl<'a> DecodeRequest<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, limits: None }
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn decode(self, stop: impl Stop) -> Result<DecodeOutput, HdrError> {
        let info = ImageInfo::from_bytes(self.data)?;
        if let Some(limits) = self.limits {
            let out_bytes = u64::from(info.width) * u64::from(info.height) * 12;
            limits.check_raster(info.width, info.height, out_bytes)?;
        }
        stop.check()?;

        let pixels = match info.format {
            ContainerFormat::Pfm => {
                let header = crate::pfm::parse_header(self.data)?;
                crate::pfm::decode(self.data, &header, &stop)?
            }
            ContainerFormat::Radiance => {
                let header = crate::hdr::parse_header(self.data)?;
                crate::hdr::decode(self.data, &header, &stop)?
            }
        };
        Ok(DecodeOutput {
            pixels,
            width: info.width,
            height: info.height,
            format: info.format,
        })
    }
}
