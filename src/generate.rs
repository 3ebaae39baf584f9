//! Procedural pixel generators.
//!
//! A generator maps normalized coordinates `(u, v)` in `[0, 1)` to linear
//! `(red, green, blue)` values. Generators are pure: the same `(u, v)` always
//! yields the same triple, whichever worker computes it.

/// Computes the color of one pixel from its normalized coordinates.
pub trait PixelGenerator: Sync {
    fn rgb(&self, u: f32, v: f32) -> [f32; 3];
}

impl<F> PixelGenerator for F
where
    F: Fn(f32, f32) -> [f32; 3] + Sync,
{
    fn rgb(&self, u: f32, v: f32) -> [f32; 3] {
        self(u, v)
    }
}

/// Image corner that a [`ChannelFn::Corner`] gradient peaks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    /// `(1-u)(1-v)`
    TopLeft,
    /// `u(1-v)`
    TopRight,
    /// `(1-u)v`
    BottomLeft,
    /// `uv`
    BottomRight,
}

/// Shape of a single channel, in units of the peak value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelFn {
    Zero,
    /// `(u + v) / 2`, rising from the top-left to the bottom-right.
    Diagonal,
    Corner(Corner),
}

impl ChannelFn {
    /// Unit-range value at `(u, v)`, in `[0, 1)` for `u, v` in `[0, 1)`.
    pub fn eval(self, u: f32, v: f32) -> f32 {
        match self {
            Self::Zero => 0.0,
            Self::Diagonal => (u + v) * 0.5,
            Self::Corner(Corner::TopLeft) => (1.0 - u) * (1.0 - v),
            Self::Corner(Corner::TopRight) => u * (1.0 - v),
            Self::Corner(Corner::BottomLeft) => (1.0 - u) * v,
            Self::Corner(Corner::BottomRight) => u * v,
        }
    }
}

/// Which function drives each output channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelMap {
    pub red: ChannelFn,
    pub green: ChannelFn,
    pub blue: ChannelFn,
}

impl ChannelMap {
    pub const DIAGONAL_RAMP: Self = Self {
        red: ChannelFn::Diagonal,
        green: ChannelFn::Zero,
        blue: ChannelFn::Zero,
    };

    pub const CORNER_GRADIENTS: Self = Self {
        red: ChannelFn::Corner(Corner::BottomRight),
        green: ChannelFn::Corner(Corner::TopLeft),
        blue: ChannelFn::Corner(Corner::TopRight),
    };

    /// Same functions with the green and blue channels exchanged.
    pub fn swap_green_blue(self) -> Self {
        Self {
            green: self.blue,
            blue: self.green,
            ..self
        }
    }
}

/// Named generator presets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GradientKind {
    #[default]
    Diagonal,
    Corners,
}

impl GradientKind {
    pub fn channel_map(self) -> ChannelMap {
        match self {
            Self::Diagonal => ChannelMap::DIAGONAL_RAMP,
            Self::Corners => ChannelMap::CORNER_GRADIENTS,
        }
    }
}

/// A [`ChannelMap`] scaled to an HDR peak.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gradient {
    map: ChannelMap,
    peak: f32,
}

impl Gradient {
    pub fn new(map: ChannelMap, peak: f32) -> Self {
        Self { map, peak }
    }

    /// Red rises along the diagonal from 0 to `peak`; green and blue are 0.
    pub fn diagonal_ramp(peak: f32) -> Self {
        Self::new(ChannelMap::DIAGONAL_RAMP, peak)
    }

    /// Red peaks bottom-right, green top-left, blue top-right.
    pub fn corner_gradients(peak: f32) -> Self {
        Self::new(ChannelMap::CORNER_GRADIENTS, peak)
    }

    pub fn from_kind(kind: GradientKind, peak: f32) -> Self {
        Self::new(kind.channel_map(), peak)
    }

    pub fn map(&self) -> ChannelMap {
        self.map
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }
}

impl PixelGenerator for Gradient {
    #[inline]
    fn rgb(&self, u: f32, v: f32) -> [f32; 3] {
        [
            self.peak * self.map.red.eval(u, v),
            self.peak * self.map.green.eval(u, v),
            self.peak * self.map.blue.eval(u, v),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_functions_peak_at_their_corner() {
        let at = |f: ChannelFn, u, v| f.eval(u, v);
        assert_eq!(at(ChannelFn::Corner(Corner::TopLeft), 0.0, 0.0), 1.0);
        assert_eq!(at(ChannelFn::Corner(Corner::TopRight), 1.0, 0.0), 1.0);
        assert_eq!(at(ChannelFn::Corner(Corner::BottomLeft), 0.0, 1.0), 1.0);
        assert_eq!(at(ChannelFn::Corner(Corner::BottomRight), 1.0, 1.0), 1.0);
    }

    #[test]
    fn diagonal_ramp_values() {
        let g = Gradient::diagonal_ramp(5.0);
        assert_eq!(g.rgb(0.0, 0.0), [0.0, 0.0, 0.0]);
        assert_eq!(g.rgb(0.75, 0.5), [3.125, 0.0, 0.0]);
    }

    #[test]
    fn swapped_map_exchanges_channels() {
        let g = Gradient::new(ChannelMap::CORNER_GRADIENTS.swap_green_blue(), 2.0);
        let [_, green, blue] = g.rgb(0.75, 0.0);
        assert_eq!(green, 1.5);
        assert_eq!(blue, 0.5);
    }

    #[test]
    fn closures_are_generators() {
        let flat = |_u: f32, _v: f32| -> [f32; 3] { [1.0, 2.0, 3.0] };
        assert_eq!(flat.rgb(0.3, 0.9), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn reference_generators_stay_within_peak() {
        let peak = 5.0;
        for g in [Gradient::diagonal_ramp(peak), Gradient::corner_gradients(peak)] {
            for yi in 0..64 {
                for xi in 0..64 {
                    let (u, v) = (xi as f32 / 64.0, yi as f32 / 64.0);
                    for c in g.rgb(u, v) {
                        assert!((0.0..=peak).contains(&c), "{c} out of range at ({u}, {v})");
                    }
                }
            }
        }
    }
}
