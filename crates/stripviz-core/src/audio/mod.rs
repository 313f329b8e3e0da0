//! Audio sources feeding the visualization engine.
//!
//! A source owns the capture device and hands out the most recent magnitude
//! spectrum on request. The engine polls it once per frame.

#[cfg(feature = "audio")]
pub mod capture;
pub mod spectrum;
pub mod synthetic;

#[cfg(feature = "audio")]
pub use capture::{CaptureConfig, CaptureSource};
pub use spectrum::SpectrumAnalyzer;
pub use synthetic::{SyntheticConfig, SyntheticSource};

use crate::error::Result;

/// One magnitude spectrum
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralFrame {
    /// Center frequency of each bin in Hz
    pub frequencies: Vec<f32>,
    /// Non-negative magnitude of each bin
    pub magnitudes: Vec<f32>,
}

impl SpectralFrame {
    pub fn new(frequencies: Vec<f32>, magnitudes: Vec<f32>) -> Self {
        Self {
            frequencies,
            magnitudes,
        }
    }

    /// Frame holding only magnitudes, with bin indices as frequencies
    pub fn from_magnitudes(magnitudes: Vec<f32>) -> Self {
        let frequencies = (0..magnitudes.len()).map(|i| i as f32).collect();
        Self {
            frequencies,
            magnitudes,
        }
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }
}

/// Spectrum producer driven by the render loop
pub trait AudioSource: Send {
    /// Resolve and validate the capture device.
    fn setup(&mut self) -> Result<()>;

    /// Begin continuous background capture.
    fn start(&mut self) -> Result<()>;

    /// Most recent spectrum. Returns the previous frame again when nothing
    /// new has arrived. `trim` keeps only the low end of the spectrum.
    fn next_frame(&mut self, trim: bool) -> Result<SpectralFrame>;

    /// Release the device. Calling it more than once is harmless.
    fn close(&mut self) -> Result<()>;
}
