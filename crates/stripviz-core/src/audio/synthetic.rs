//! Generated spectra for running without an input device.
//!
//! Two peaks sweep back and forth across the mapped band while a slow pulse
//! modulates their height, which is enough to exercise every mode on a strip.

use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::time::{Duration, Instant};

use super::{AudioSource, SpectralFrame};
use crate::error::{Result, VizError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Number of bins per frame
    pub bins: usize,
    /// Height of a peak at full pulse
    pub peak_magnitude: f32,
    /// Peak width in bins
    pub peak_width: f32,
    /// Pulses per second
    pub pulse_hz: f32,
    /// Sweeps per second
    pub sweep_hz: f32,
    /// Simulated sample rate used for bin frequencies
    pub sample_rate: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            bins: 2048,
            peak_magnitude: 20_000.0,
            peak_width: 12.0,
            pulse_hz: 2.0,
            sweep_hz: 0.1,
            sample_rate: 48_000,
        }
    }
}

pub struct SyntheticSource {
    config: SyntheticConfig,
    started: Option<Instant>,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            started: None,
        }
    }

    /// Deterministic frame for a point in time
    pub fn frame_at(&self, elapsed: Duration, trim: bool) -> SpectralFrame {
        let t = elapsed.as_secs_f32();
        let bins = if trim {
            (self.config.bins / 10).max(1)
        } else {
            self.config.bins
        };
        let span = (self.config.bins as f32 * 0.15).max(1.0);

        let sweep = 0.5 + 0.5 * (TAU * self.config.sweep_hz * t).sin();
        let pulse = 0.5 + 0.5 * (TAU * self.config.pulse_hz * t).sin();
        let low_peak = 15.0 + sweep * span;
        let high_peak = 15.0 + (1.0 - sweep) * span;
        let width = self.config.peak_width.max(1.0);

        let bin_hz = self.config.sample_rate as f32 / (2 * self.config.bins) as f32;
        let frequencies = (0..bins).map(|k| k as f32 * bin_hz).collect();
        let magnitudes = (0..bins)
            .map(|k| {
                let k = k as f32;
                let bump = |center: f32| (-((k - center) / width).powi(2)).exp();
                let peaks = bump(low_peak) * pulse + 0.6 * bump(high_peak) * (1.0 - pulse);
                self.config.peak_magnitude * peaks
            })
            .collect();

        SpectralFrame::new(frequencies, magnitudes)
    }
}

impl AudioSource for SyntheticSource {
    fn setup(&mut self) -> Result<()> {
        if self.config.bins == 0 {
            return Err(VizError::AudioUnavailable(
                "Synthetic source needs at least one bin".to_string(),
            ));
        }
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.started.get_or_insert_with(Instant::now);
        Ok(())
    }

    fn next_frame(&mut self, trim: bool) -> Result<SpectralFrame> {
        let started = self
            .started
            .ok_or_else(|| VizError::AudioRead("Synthetic source not started".to_string()))?;
        Ok(self.frame_at(started.elapsed(), trim))
    }

    fn close(&mut self) -> Result<()> {
        self.started = None;
        Ok(())
    }
}
