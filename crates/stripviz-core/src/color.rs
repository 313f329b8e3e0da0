//! Color primitives and the amplitude color wheel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper end of the wheel
pub const WHEEL_MAX: i32 = 1020;

const SEGMENT: i32 = 255;

/// A color in canonical red, green, blue order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale each component by `numerator / denominator`, flooring and
    /// saturating to `[0, 255]`. Negative ratios give black.
    pub fn scaled(self, numerator: i32, denominator: i32) -> Self {
        if denominator <= 0 {
            return Self::BLACK;
        }
        let scale = |c: u8| {
            (i64::from(c) * i64::from(numerator))
                .div_euclid(i64::from(denominator))
                .clamp(0, 255) as u8
        };
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Byte order a device expects on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorOrder {
    Rgb,
    /// WS2812 / NeoPixel strips
    #[default]
    Grb,
    Brg,
    Rbg,
    Gbr,
    Bgr,
}

impl ColorOrder {
    /// Reorder a canonical color into device byte order.
    pub fn apply(self, color: Rgb) -> [u8; 3] {
        let Rgb { r, g, b } = color;
        match self {
            ColorOrder::Rgb => [r, g, b],
            ColorOrder::Grb => [g, r, b],
            ColorOrder::Brg => [b, r, g],
            ColorOrder::Rbg => [r, b, g],
            ColorOrder::Gbr => [g, b, r],
            ColorOrder::Bgr => [b, g, r],
        }
    }
}

/// Map a position in `[0, 1020]` to a color along
/// blue -> magenta -> red -> yellow -> green.
///
/// Positions below zero give the blue end, positions above 1020 pure green.
pub fn wheel(position: i32) -> Rgb {
    let pos = position.max(0);
    // every ramp value below is within 0..=255
    let ramp = |offset: i32| (pos - offset) as u8;
    if pos < SEGMENT {
        Rgb::new(ramp(0), 0, 255)
    } else if pos < 2 * SEGMENT {
        Rgb::new(255, 0, 255 - ramp(SEGMENT))
    } else if pos < 3 * SEGMENT {
        Rgb::new(255, ramp(2 * SEGMENT), 0)
    } else if pos <= WHEEL_MAX {
        Rgb::new(255 - ramp(3 * SEGMENT), 255, 0)
    } else {
        Rgb::new(0, 255, 0)
    }
}
