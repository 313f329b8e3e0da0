//! StripViz Core - audio spectrum to LED strip pipeline
//!
//! This crate holds everything between an audio spectrum and a row of colors:
//! - **Audio**: live capture through cpal, or a synthetic generator
//! - **Bins**: mapping spectrum bins onto strip channels
//! - **Envelope**: attack-instant, decay-smooth per-channel levels
//! - **Strategies**: the color modes and the shared mode cell
//! - **Engine**: the render loop that ties sources and sinks together
//!
//! ## Feature Flags
//!
//! - `audio`: live input capture (requires `cpal`, enabled by default)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stripviz_core::{
//!     EngineConfig, PixelSink, Result, Rgb, ShutdownSignal, SyntheticConfig, SyntheticSource,
//!     VisualizationEngine,
//! };
//!
//! struct NullSink;
//!
//! impl PixelSink for NullSink {
//!     fn begin(&mut self) -> Result<()> { Ok(()) }
//!     fn set_channel(&mut self, _index: usize, _color: Rgb) -> Result<()> { Ok(()) }
//!     fn commit(&mut self) -> Result<()> { Ok(()) }
//!     fn shutdown(&mut self) -> Result<()> { Ok(()) }
//! }
//!
//! let mut engine = VisualizationEngine::new(
//!     EngineConfig::default(),
//!     Box::new(SyntheticSource::new(SyntheticConfig::default())),
//!     Box::new(NullSink),
//! )?;
//! engine.mode_control().set_mode("frequency_color");
//! let summary = engine.run(&ShutdownSignal::new())?;
//! # Ok::<(), stripviz_core::VizError>(())
//! ```

pub mod audio;
pub mod bins;
pub mod color;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod mode;
pub mod sink;
pub mod strategy;

#[cfg(feature = "audio")]
pub use audio::{CaptureConfig, CaptureSource};
pub use audio::{AudioSource, SpectralFrame, SpectrumAnalyzer, SyntheticConfig, SyntheticSource};
pub use bins::{BinMapConfig, BinMapper};
pub use color::{wheel, ColorOrder, Rgb, WHEEL_MAX};
pub use engine::{EngineConfig, FrameOutcome, RunSummary, ShutdownSignal, VisualizationEngine};
pub use envelope::EnvelopeTracker;
pub use error::{Result, VizError};
pub use logging::LogConfig;
pub use mode::{ModeCell, ModeControl, ModeInfo};
pub use sink::PixelSink;
pub use strategy::{rotating_base_color, RenderContext, VisualizationMode};
