//! Attack/decay smoothing of per-channel magnitudes.
//!
//! A channel jumps to any louder sample immediately and falls back towards
//! quieter samples as a weighted average, so transients flash and then fade.

use crate::error::{Result, VizError};

/// Per-channel envelope filter with instant attack and weighted decay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeTracker {
    decay_weight: i32,
}

impl EnvelopeTracker {
    /// Create a tracker. Larger `decay_weight` means a slower fade.
    pub fn new(decay_weight: u32) -> Result<Self> {
        if decay_weight == 0 {
            return Err(VizError::InvalidConfig(
                "decay_weight must be at least 1".to_string(),
            ));
        }
        let decay_weight = i32::try_from(decay_weight).map_err(|_| {
            VizError::InvalidConfig(format!("decay_weight {} is too large", decay_weight))
        })?;
        Ok(Self { decay_weight })
    }

    pub fn decay_weight(&self) -> u32 {
        self.decay_weight as u32
    }

    /// Next envelope value for a channel.
    ///
    /// Rising input is taken as-is. Falling input yields
    /// `floor((previous * w + raw) / (w + 1))`. Nothing is clamped here; a
    /// negative `raw` produces a negative envelope and the color stage
    /// saturates it.
    #[inline]
    pub fn update(&self, previous: i32, raw: i32) -> i32 {
        if raw >= previous {
            return raw;
        }
        let w = i64::from(self.decay_weight);
        let blended = (i64::from(previous) * w + i64::from(raw)).div_euclid(w + 1);
        blended as i32
    }

    /// Update a whole envelope in place from freshly mapped raw values.
    pub fn update_all(&self, envelope: &mut [i32], raw: &[i32]) {
        for (state, &sample) in envelope.iter_mut().zip(raw) {
            *state = self.update(*state, sample);
        }
    }
}
