//! Visualization strategies.
//!
//! Every strategy turns the current envelope into one color per channel. They
//! write into a caller-owned buffer of the same length, so switching modes
//! never reallocates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::color::{wheel, Rgb};
use crate::error::VizError;

/// Default hue rotation speed, one full turn every eight seconds
pub const DEFAULT_DEGREES_PER_SECOND: f64 = 45.0;

/// The closed set of selectable strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum VisualizationMode {
    /// Envelope picks a hue on the color wheel
    FrequencyColor = 0,
    /// Envelope dims a fixed base color
    SingleColorAmplitude = 1,
    /// Envelope dims a base color that rotates through hues over time
    #[default]
    TimeRotatingAmplitude = 2,
}

impl VisualizationMode {
    /// All modes in presentation order
    pub const ALL: [VisualizationMode; 3] = [
        VisualizationMode::FrequencyColor,
        VisualizationMode::SingleColorAmplitude,
        VisualizationMode::TimeRotatingAmplitude,
    ];

    /// Stable identifier used by the control surface and config files
    pub fn id(self) -> &'static str {
        match self {
            Self::FrequencyColor => "frequency_color",
            Self::SingleColorAmplitude => "single_color_amplitude",
            Self::TimeRotatingAmplitude => "time_rotating_amplitude",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::FrequencyColor => "Frequency Color",
            Self::SingleColorAmplitude => "Single Color Amplitude",
            Self::TimeRotatingAmplitude => "Time Rotating Amplitude",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.id() == id)
    }

    pub(crate) fn from_repr(value: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| *mode as u8 == value)
    }

    /// Fill `out` with one color per channel.
    pub fn render(self, envelope: &[i32], ctx: &RenderContext, out: &mut [Rgb]) {
        match self {
            Self::FrequencyColor => frequency_color(envelope, out),
            Self::SingleColorAmplitude => {
                scaled_color(ctx.base_color, envelope, ctx.max_db, out)
            }
            Self::TimeRotatingAmplitude => {
                let base = rotating_base_color(ctx.elapsed, ctx.degrees_per_second);
                scaled_color(base, envelope, ctx.max_db, out)
            }
        }
    }
}

impl fmt::Display for VisualizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for VisualizationMode {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| VizError::UnknownMode(s.to_string()))
    }
}

/// Inputs shared by all strategies for one frame
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    /// Time since the engine started
    pub elapsed: Duration,
    /// Envelope value that maps to full brightness
    pub max_db: i32,
    /// Base color for the single color mode
    pub base_color: Rgb,
    /// Hue rotation speed for the time rotating mode
    pub degrees_per_second: f64,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            elapsed: Duration::ZERO,
            max_db: crate::color::WHEEL_MAX,
            base_color: Rgb::WHITE,
            degrees_per_second: DEFAULT_DEGREES_PER_SECOND,
        }
    }
}

fn frequency_color(envelope: &[i32], out: &mut [Rgb]) {
    for (slot, &value) in out.iter_mut().zip(envelope) {
        *slot = wheel(value);
    }
}

fn scaled_color(base: Rgb, envelope: &[i32], max_db: i32, out: &mut [Rgb]) {
    for (slot, &value) in out.iter_mut().zip(envelope) {
        *slot = base.scaled(value, max_db);
    }
}

/// Map a sine value in `[-1, 1]` to `[0, 255]` via `floor((s + 1) * 127.5)`.
fn oscillator(degrees: f64) -> u8 {
    let s = degrees.to_radians().sin();
    ((s + 1.0) * 127.5).floor().clamp(0.0, 255.0) as u8
}

/// Base color of the rotating mode: three sines 90 degrees apart.
pub fn rotating_base_color(elapsed: Duration, degrees_per_second: f64) -> Rgb {
    let theta = elapsed.as_secs_f64() * degrees_per_second;
    Rgb::new(
        oscillator(theta),
        oscillator(theta + 90.0),
        oscillator(theta + 180.0),
    )
}
