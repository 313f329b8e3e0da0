//! Pixel sinks
//!
//! The output device is picked from configuration; nothing here probes for
//! hardware.

pub mod artnet;
pub mod terminal;

pub use artnet::{ArtNetConfig, ArtNetSink, ARTNET_PORT, PIXELS_PER_UNIVERSE};
pub use terminal::{TerminalConfig, TerminalSink};

use serde::{Deserialize, Serialize};
use stripviz_core::PixelSink;

use crate::Result;

/// Output selection, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputConfig {
    Artnet(ArtNetConfig),
    Terminal(TerminalConfig),
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::Terminal(TerminalConfig::default())
    }
}

impl OutputConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Artnet(_) => "artnet",
            Self::Terminal(_) => "terminal",
        }
    }
}

/// Create the configured sink for a strip of `pixel_count` pixels
pub fn build_sink(config: &OutputConfig, pixel_count: usize) -> Result<Box<dyn PixelSink>> {
    tracing::debug!("Building {} output for {} pixels", config.kind(), pixel_count);
    let sink: Box<dyn PixelSink> = match config {
        OutputConfig::Artnet(artnet) => Box::new(ArtNetSink::new(artnet.clone(), pixel_count)?),
        OutputConfig::Terminal(terminal) => {
            Box::new(TerminalSink::stdout(terminal.clone(), pixel_count)?)
        }
    };
    Ok(sink)
}
