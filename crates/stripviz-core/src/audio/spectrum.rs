//! Magnitude spectrum of a sample window, computed with rustfft.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use super::SpectralFrame;
use crate::error::{Result, VizError};

/// Float samples are scaled to the 16-bit integer range before the FFT so the
/// magnitudes land where the bin divisors expect them.
pub const SAMPLE_SCALE: f32 = 32768.0;

/// Fraction of the spectrum kept when trimming
const TRIM_DIVISOR: usize = 10;

/// Reusable FFT state for one window size
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    sample_rate: u32,
    magnitude_divisor: f32,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    pub fn new(fft_size: usize, sample_rate: u32, magnitude_divisor: f32) -> Result<Self> {
        if fft_size < 2 || fft_size % 2 != 0 {
            return Err(VizError::InvalidConfig(format!(
                "fft_size must be an even number >= 2, got {}",
                fft_size
            )));
        }
        if !magnitude_divisor.is_finite() || magnitude_divisor <= 0.0 {
            return Err(VizError::InvalidConfig(
                "magnitude_divisor must be positive".to_string(),
            ));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Ok(Self {
            fft,
            fft_size,
            sample_rate,
            magnitude_divisor,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch,
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Spectrum of the most recent `fft_size` samples.
    ///
    /// Shorter input is zero-padded at the front. Magnitudes are one-sided
    /// (positive and negative frequency halves folded together) and divided by
    /// the configured divisor.
    pub fn analyze(&mut self, samples: &[f32], trim: bool) -> SpectralFrame {
        let n = self.fft_size;
        let recent = &samples[samples.len().saturating_sub(n)..];
        let pad = n - recent.len();

        for slot in &mut self.buffer[..pad] {
            *slot = Complex::new(0.0, 0.0);
        }
        for (slot, &s) in self.buffer[pad..].iter_mut().zip(recent) {
            *slot = Complex::new(s * SAMPLE_SCALE, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let half = n / 2;
        let keep = if trim { (half / TRIM_DIVISOR).max(1) } else { half };
        let bin_hz = self.sample_rate as f32 / n as f32;

        let frequencies = (0..keep).map(|k| k as f32 * bin_hz).collect();
        let magnitudes = self.buffer[..keep]
            .iter()
            .map(|c| 2.0 * c.norm() / self.magnitude_divisor)
            .collect();

        SpectralFrame::new(frequencies, magnitudes)
    }
}
