//! The render loop.
//!
//! One frame: pull a spectrum, map bins to channels, smooth, read the active
//! mode once, color every channel and commit to the sink. The engine owns all
//! per-frame buffers; they are allocated once at construction.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::audio::AudioSource;
use crate::bins::{BinMapConfig, BinMapper};
use crate::color::{Rgb, WHEEL_MAX};
use crate::envelope::EnvelopeTracker;
use crate::error::{Result, VizError};
use crate::mode::{ModeCell, ModeControl};
use crate::sink::PixelSink;
use crate::strategy::{RenderContext, VisualizationMode, DEFAULT_DEGREES_PER_SECOND};

/// Audio read failures are logged on the first occurrence and then every
/// this many failures.
const AUDIO_WARN_EVERY: u64 = 100;

/// Engine configuration, fixed for the lifetime of the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of channels (pixels) on the strip
    pub channel_count: usize,
    /// Envelope decay weight, higher fades slower
    pub decay_weight: u32,
    /// Envelope value mapped to full brightness
    pub max_db: i32,
    /// Mode active at startup
    pub default_mode: VisualizationMode,
    /// Base color of the single color mode
    pub base_color: Rgb,
    /// Ask the audio source for the trimmed low end only
    pub trim_spectrum: bool,
    /// Hue rotation speed of the time rotating mode
    pub rotation_degrees_per_second: f64,
    /// Consecutive failed frames before the engine gives up
    pub max_consecutive_sink_failures: u32,
    pub bins: BinMapConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channel_count: 300,
            decay_weight: 4,
            max_db: WHEEL_MAX,
            default_mode: VisualizationMode::default(),
            base_color: Rgb::WHITE,
            trim_spectrum: false,
            rotation_degrees_per_second: DEFAULT_DEGREES_PER_SECOND,
            max_consecutive_sink_failures: 30,
            bins: BinMapConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.channel_count == 0 {
            return Err(VizError::InvalidConfig(
                "channel_count must be at least 1".to_string(),
            ));
        }
        if self.decay_weight == 0 {
            return Err(VizError::InvalidConfig(
                "decay_weight must be at least 1".to_string(),
            ));
        }
        if self.max_db <= 0 {
            return Err(VizError::InvalidConfig(
                "max_db must be positive".to_string(),
            ));
        }
        if !self.rotation_degrees_per_second.is_finite() {
            return Err(VizError::InvalidConfig(
                "rotation_degrees_per_second must be finite".to_string(),
            ));
        }
        if self.max_consecutive_sink_failures == 0 {
            return Err(VizError::InvalidConfig(
                "max_consecutive_sink_failures must be at least 1".to_string(),
            ));
        }
        self.bins.validate()
    }
}

/// Cooperative stop flag checked by the render loop once per frame
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// What happened to a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Frame committed using the given mode
    Rendered(VisualizationMode),
    /// No spectrum has been received yet
    NoAudio,
    /// The sink rejected the frame
    Dropped,
}

/// Counters reported when the loop exits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    pub frames_rendered: u64,
    pub frames_dropped: u64,
    pub audio_failures: u64,
    pub final_mode: VisualizationMode,
}

/// Owns the pipeline state and both collaborators
pub struct VisualizationEngine {
    config: EngineConfig,
    tracker: EnvelopeTracker,
    bins: BinMapper,
    mode: Arc<ModeCell>,
    audio: Box<dyn AudioSource>,
    sink: Box<dyn PixelSink>,
    envelope: Vec<i32>,
    raw: Vec<i32>,
    colors: Vec<Rgb>,
    spectrum: Vec<f32>,
    start_time: Instant,
    frames_rendered: u64,
    frames_dropped: u64,
    audio_failures: u64,
    consecutive_sink_failures: u32,
    acquired: bool,
}

impl VisualizationEngine {
    pub fn new(
        config: EngineConfig,
        audio: Box<dyn AudioSource>,
        sink: Box<dyn PixelSink>,
    ) -> Result<Self> {
        config.validate()?;
        let tracker = EnvelopeTracker::new(config.decay_weight)?;
        let bins = BinMapper::new(config.bins)?;
        let n = config.channel_count;

        debug!(
            "Engine created: channels={}, decay_weight={}, max_db={}, mode={}",
            n,
            config.decay_weight,
            config.max_db,
            config.default_mode.id()
        );

        Ok(Self {
            mode: Arc::new(ModeCell::new(config.default_mode)),
            tracker,
            bins,
            audio,
            sink,
            envelope: vec![0; n],
            raw: vec![0; n],
            colors: vec![Rgb::BLACK; n],
            spectrum: Vec::new(),
            start_time: Instant::now(),
            frames_rendered: 0,
            frames_dropped: 0,
            audio_failures: 0,
            consecutive_sink_failures: 0,
            acquired: false,
            config,
        })
    }

    /// Handle for control transports; writes the cell this engine reads.
    pub fn mode_control(&self) -> ModeControl {
        ModeControl::new(self.mode.clone())
    }

    pub fn channel_count(&self) -> usize {
        self.config.channel_count
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current smoothed value of every channel
    pub fn envelope(&self) -> &[i32] {
        &self.envelope
    }

    /// Colors produced by the last frame
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames_rendered: self.frames_rendered,
            frames_dropped: self.frames_dropped,
            audio_failures: self.audio_failures,
            final_mode: self.mode.get(),
        }
    }

    /// Acquire the audio source and the sink. Any failure here is fatal.
    pub fn start(&mut self) -> Result<()> {
        self.acquired = true;
        self.audio.setup()?;
        self.audio.start()?;
        self.sink.begin()?;
        self.start_time = Instant::now();
        info!(
            "Visualization engine started with {} channels in mode '{}'",
            self.config.channel_count,
            self.mode.get().id()
        );
        Ok(())
    }

    /// Render one frame using the wall clock.
    pub fn render_frame(&mut self) -> Result<FrameOutcome> {
        let elapsed = self.start_time.elapsed();
        self.render_frame_at(elapsed)
    }

    /// Render one frame as if `elapsed` had passed since start.
    pub fn render_frame_at(&mut self, elapsed: Duration) -> Result<FrameOutcome> {
        self.pull_spectrum();
        if self.spectrum.is_empty() {
            return Ok(FrameOutcome::NoAudio);
        }

        self.bins.map_spectrum(&self.spectrum, &mut self.raw);
        self.tracker.update_all(&mut self.envelope, &self.raw);

        // Read once so every channel in this frame uses the same strategy
        let mode = self.mode.get();
        let ctx = RenderContext {
            elapsed,
            max_db: self.config.max_db,
            base_color: self.config.base_color,
            degrees_per_second: self.config.rotation_degrees_per_second,
        };
        mode.render(&self.envelope, &ctx, &mut self.colors);

        match self.push_colors() {
            Ok(()) => {
                self.consecutive_sink_failures = 0;
                self.frames_rendered += 1;
                Ok(FrameOutcome::Rendered(mode))
            }
            Err(e) => {
                self.consecutive_sink_failures += 1;
                self.frames_dropped += 1;
                error!(
                    "Dropping frame ({} consecutive failures): {}",
                    self.consecutive_sink_failures, e
                );
                if self.consecutive_sink_failures >= self.config.max_consecutive_sink_failures {
                    return Err(VizError::Sink(format!(
                        "giving up after {} consecutive failures, last: {}",
                        self.consecutive_sink_failures, e
                    )));
                }
                Ok(FrameOutcome::Dropped)
            }
        }
    }

    /// Run until `shutdown` is triggered or a fatal error occurs.
    ///
    /// The audio source and sink are released on every exit path.
    pub fn run(&mut self, shutdown: &ShutdownSignal) -> Result<RunSummary> {
        let outcome = self.start().and_then(|()| self.render_until(shutdown));
        self.release();

        let summary = self.summary();
        info!(
            "Render loop finished: {} frames rendered, {} dropped, {} audio failures",
            summary.frames_rendered, summary.frames_dropped, summary.audio_failures
        );
        outcome.map(|()| summary)
    }

    /// Close the audio source and shut down the sink. Failures are logged and
    /// swallowed so both are always attempted.
    pub fn release(&mut self) {
        if !self.acquired {
            return;
        }
        self.acquired = false;

        if let Err(e) = self.audio.close() {
            warn!("Failed to close audio source: {}", e);
        }
        if let Err(e) = self.sink.shutdown() {
            warn!("Failed to shut down pixel sink: {}", e);
        }
        info!("Audio source and pixel sink released");
    }

    fn render_until(&mut self, shutdown: &ShutdownSignal) -> Result<()> {
        while !shutdown.is_triggered() {
            self.render_frame()?;
            // Give the control threads a chance between frames
            thread::yield_now();
        }
        info!("Shutdown requested, leaving render loop");
        Ok(())
    }

    fn pull_spectrum(&mut self) {
        match self.audio.next_frame(self.config.trim_spectrum) {
            Ok(frame) if !frame.is_empty() => {
                self.spectrum = frame.magnitudes;
            }
            Ok(_) => self.note_audio_failure("empty spectrum"),
            Err(e) => self.note_audio_failure(&e.to_string()),
        }
    }

    fn note_audio_failure(&mut self, reason: &str) {
        self.audio_failures += 1;
        if self.audio_failures == 1 || self.audio_failures % AUDIO_WARN_EVERY == 0 {
            warn!(
                "Audio read failed ({} so far), reusing previous spectrum: {}",
                self.audio_failures, reason
            );
        }
    }

    fn push_colors(&mut self) -> Result<()> {
        for (index, color) in self.colors.iter().enumerate() {
            self.sink.set_channel(index, *color)?;
        }
        self.sink.commit()
    }
}

impl Drop for VisualizationEngine {
    fn drop(&mut self) {
        self.release();
    }
}
