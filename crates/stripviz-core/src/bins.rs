//! Spectrum bin to channel mapping.
//!
//! Each channel reads one FFT bin. The lowest `offset` bins are skipped and
//! `window` bins are spread across the strip. Magnitudes are divided by a
//! per-channel divisor that shrinks along the strip to make up for the energy
//! rolloff towards higher frequencies.
//!
//! The division is a linear stand-in for decibel compression. It is not a
//! logarithm and is not meant to be one.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VizError};

/// Bin mapping constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinMapConfig {
    /// Lowest bins to skip
    pub offset: usize,
    /// Number of bins spread across all channels
    pub window: usize,
    /// Divisor at channel 0
    pub divisor_base: f32,
    /// Channels per whole step of divisor decrease
    pub divisor_scale: f32,
    /// Divisor never drops below this
    pub min_divisor: f32,
}

impl Default for BinMapConfig {
    fn default() -> Self {
        Self {
            offset: 15,
            window: 300,
            divisor_base: 20.0,
            divisor_scale: 15.0,
            min_divisor: 1.0,
        }
    }
}

impl BinMapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(VizError::InvalidConfig(
                "bins.window must be at least 1".to_string(),
            ));
        }
        if !self.divisor_scale.is_finite() || self.divisor_scale <= 0.0 {
            return Err(VizError::InvalidConfig(
                "bins.divisor_scale must be positive".to_string(),
            ));
        }
        if !self.min_divisor.is_finite() || self.min_divisor <= 0.0 {
            return Err(VizError::InvalidConfig(
                "bins.min_divisor must be positive".to_string(),
            ));
        }
        if !self.divisor_base.is_finite() {
            return Err(VizError::InvalidConfig(
                "bins.divisor_base must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Maps channels onto spectrum bins and scales their magnitudes.
#[derive(Debug, Clone, Copy)]
pub struct BinMapper {
    config: BinMapConfig,
}

impl BinMapper {
    pub fn new(config: BinMapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BinMapConfig {
        &self.config
    }

    /// Spectrum bin feeding `channel`. Channels past the end of the spectrum
    /// read the last bin.
    pub fn bin_for_channel(
        &self,
        channel: usize,
        channel_count: usize,
        spectrum_len: usize,
    ) -> usize {
        let count = channel_count.max(1);
        let bin = self.config.offset + channel * self.config.window / count;
        bin.min(spectrum_len.saturating_sub(1))
    }

    /// Tilt-compensation divisor for `channel`.
    ///
    /// Drops by one whole step every `divisor_scale` channels.
    pub fn divisor_for_channel(&self, channel: usize, _channel_count: usize) -> f32 {
        let step = (channel as f32 / self.config.divisor_scale).floor();
        (self.config.divisor_base - step).max(self.config.min_divisor)
    }

    /// Raw channel value before smoothing: `floor(magnitude / divisor)`.
    pub fn raw_value(&self, magnitude: f32, channel: usize, channel_count: usize) -> i32 {
        let scaled = magnitude / self.divisor_for_channel(channel, channel_count);
        // `as` saturates and maps NaN to 0
        scaled.floor() as i32
    }

    /// Map a whole spectrum into `out`, one raw value per channel.
    pub fn map_spectrum(&self, magnitudes: &[f32], out: &mut [i32]) {
        let count = out.len();
        for (channel, value) in out.iter_mut().enumerate() {
            let bin = self.bin_for_channel(channel, count, magnitudes.len());
            let magnitude = magnitudes.get(bin).copied().unwrap_or(0.0);
            *value = self.raw_value(magnitude, channel, count);
        }
    }
}
