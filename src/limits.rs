use crate::error::HdrError;

/// Resource limits applied when a surface or decode buffer is allocated.
///
/// All fields default to `None` (no limit).
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum bytes for a single buffer, row padding included.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// No limits at all.
    pub const fn none() -> Self {
        Self {
            max_width: None,
            max_height: None,
            max_pixels: None,
            max_memory_bytes: None,
        }
    }

    pub fn with_max_pixels(mut self, max: u64) -> Self {
        self.max_pixels = Some(max);
        self
    }

    pub fn with_max_memory_bytes(mut self, max: u64) -> Self {
        self.max_memory_bytes = Some(max);
        self
    }

    /// Validate a `width`×`height` raster that needs `bytes` of storage.
    pub(crate) fn check_raster(&self, width: u32, height: u32, bytes: u64) -> Result<(), HdrError> {
        let exceeds = |what: &str, value: u64, limit: Option<u64>| match limit {
            Some(max) if value > max => Err(HdrError::LimitExceeded(format!(
                "{what} {value} exceeds limit {max}"
            ))),
            _ => Ok(()),
        };
        exceeds("width", u64::from(width), self.max_width)?;
        exceeds("height", u64::from(height), self.max_height)?;
        exceeds(
            "pixel count",
            u64::from(width) * u64::from(height),
            self.max_pixels,
        )?;
        exceeds("allocation bytes", bytes, self.max_memory_bytes)
    }
}
