//! Live input capture through cpal.
//!
//! cpal streams are not `Send`, so the stream is built and kept alive on a
//! dedicated `audio-capture` thread. Mono sample chunks cross over a bounded
//! channel; the render thread keeps a rolling window and runs the FFT when it
//! asks for a frame.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::spectrum::SpectrumAnalyzer;
use super::{AudioSource, SpectralFrame};
use crate::error::{Result, VizError};

/// Chunks buffered between the capture callback and the render loop
const CHUNK_QUEUE_DEPTH: usize = 64;

/// Capture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Input device name, `None` for the host default
    pub device: Option<String>,
    /// FFT window length in samples
    pub fft_size: usize,
    /// Magnitudes are divided by this after the FFT
    pub magnitude_divisor: f32,
    /// Longest wait for fresh samples before reusing the last frame
    pub poll_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: None,
            fft_size: 4096,
            magnitude_divisor: 100.0,
            poll_timeout_ms: 20,
        }
    }
}

/// Names of all input devices on the default host
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| VizError::AudioUnavailable(e.to_string()))?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

fn find_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device> {
    match name {
        None => host
            .default_input_device()
            .ok_or_else(|| VizError::AudioUnavailable("No default input device".to_string())),
        Some(wanted) => {
            let devices = host
                .input_devices()
                .map_err(|e| VizError::AudioUnavailable(e.to_string()))?;
            for device in devices {
                if device.name().map(|n| n == wanted).unwrap_or(false) {
                    return Ok(device);
                }
            }
            Err(VizError::AudioUnavailable(format!(
                "Input device '{}' not found",
                wanted
            )))
        }
    }
}

/// Microphone / line-in spectrum source
pub struct CaptureSource {
    config: CaptureConfig,
    stream_config: Option<cpal::StreamConfig>,
    sample_format: Option<cpal::SampleFormat>,
    analyzer: Option<SpectrumAnalyzer>,
    window: Vec<f32>,
    chunk_rx: Option<Receiver<Vec<f32>>>,
    stop_tx: Option<Sender<()>>,
    capture_thread: Option<JoinHandle<()>>,
    last_frame: SpectralFrame,
    last_trim: bool,
}

impl CaptureSource {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            window: Vec::with_capacity(config.fft_size * 2),
            config,
            stream_config: None,
            sample_format: None,
            analyzer: None,
            chunk_rx: None,
            stop_tx: None,
            capture_thread: None,
            last_frame: SpectralFrame::default(),
            last_trim: false,
        }
    }

    fn push_samples(&mut self, chunk: &[f32]) {
        self.window.extend_from_slice(chunk);
        let excess = self.window.len().saturating_sub(self.config.fft_size);
        if excess > 0 {
            self.window.drain(..excess);
        }
    }
}

impl AudioSource for CaptureSource {
    fn setup(&mut self) -> Result<()> {
        let host = cpal::default_host();
        let device = find_device(&host, self.config.device.as_deref())?;
        let supported = device
            .default_input_config()
            .map_err(|e| VizError::AudioUnavailable(e.to_string()))?;

        info!(
            "Using input device '{}' ({} Hz, {} channels, {:?})",
            device.name().unwrap_or_else(|_| "<unnamed>".to_string()),
            supported.sample_rate().0,
            supported.channels(),
            supported.sample_format()
        );

        let stream_config = supported.config();
        self.analyzer = Some(SpectrumAnalyzer::new(
            self.config.fft_size,
            stream_config.sample_rate.0,
            self.config.magnitude_divisor,
        )?);
        self.sample_format = Some(supported.sample_format());
        self.stream_config = Some(stream_config);
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if self.capture_thread.is_some() {
            return Ok(());
        }
        let (stream_config, sample_format) = match (&self.stream_config, self.sample_format) {
            (Some(config), Some(format)) => (config.clone(), format),
            _ => {
                return Err(VizError::AudioUnavailable(
                    "Capture started before setup".to_string(),
                ))
            }
        };

        let (chunk_tx, chunk_rx) = bounded(CHUNK_QUEUE_DEPTH);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);
        let device_name = self.config.device.clone();

        let handle = thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || {
                let stream = match open_stream(
                    device_name.as_deref(),
                    &stream_config,
                    sample_format,
                    chunk_tx,
                ) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(VizError::AudioUnavailable(e.to_string())));
                    return;
                }
                let _ = ready_tx.send(Ok(()));
                info!("Audio capture thread started");

                // Parks until close() sends or drops the stop handle
                let _ = stop_rx.recv();
                drop(stream);
                info!("Audio capture thread stopped");
            })?;

        let started = ready_rx.recv().unwrap_or_else(|_| {
            Err(VizError::AudioUnavailable(
                "Capture thread exited during startup".to_string(),
            ))
        });
        if let Err(e) = started {
            let _ = handle.join();
            return Err(e);
        }

        self.chunk_rx = Some(chunk_rx);
        self.stop_tx = Some(stop_tx);
        self.capture_thread = Some(handle);
        Ok(())
    }

    fn next_frame(&mut self, trim: bool) -> Result<SpectralFrame> {
        let rx = self
            .chunk_rx
            .clone()
            .ok_or_else(|| VizError::AudioRead("Capture not started".to_string()))?;

        let mut fresh = false;
        match rx.recv_timeout(Duration::from_millis(self.config.poll_timeout_ms)) {
            Ok(chunk) => {
                self.push_samples(&chunk);
                fresh = true;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                return Err(VizError::AudioRead(
                    "Capture stream disconnected".to_string(),
                ))
            }
        }
        for chunk in rx.try_iter() {
            self.push_samples(&chunk);
            fresh = true;
        }

        if fresh || trim != self.last_trim {
            if let Some(analyzer) = self.analyzer.as_mut() {
                self.last_frame = analyzer.analyze(&self.window, trim);
                self.last_trim = trim;
            }
        }
        Ok(self.last_frame.clone())
    }

    fn close(&mut self) -> Result<()> {
        self.chunk_rx = None;
        if let Some(stop) = self.stop_tx.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.capture_thread.take() {
            handle
                .join()
                .map_err(|_| VizError::AudioRead("Capture thread panicked".to_string()))?;
            debug!("Audio capture released");
        }
        Ok(())
    }
}

impl Drop for CaptureSource {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to release audio capture: {}", e);
        }
    }
}

fn open_stream(
    device_name: Option<&str>,
    config: &cpal::StreamConfig,
    format: cpal::SampleFormat,
    tx: Sender<Vec<f32>>,
) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = find_device(&host, device_name)?;
    let channels = usize::from(config.channels.max(1));
    let on_error = |e: cpal::StreamError| warn!("Audio stream error: {}", e);

    let stream = match format {
        cpal::SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                forward_mono(data, channels, |s| s, &tx)
            },
            on_error,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                forward_mono(data, channels, |s| f32::from(s) / 32768.0, &tx)
            },
            on_error,
            None,
        ),
        cpal::SampleFormat::U16 => device.build_input_stream(
            config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                forward_mono(data, channels, |s| (f32::from(s) - 32768.0) / 32768.0, &tx)
            },
            on_error,
            None,
        ),
        other => {
            return Err(VizError::AudioUnavailable(format!(
                "Unsupported sample format {:?}",
                other
            )))
        }
    };

    stream.map_err(|e| VizError::AudioUnavailable(e.to_string()))
}

/// Average interleaved channels into mono and hand the chunk to the render
/// side. Chunks are dropped while the queue is full.
fn forward_mono<T: Copy>(
    data: &[T],
    channels: usize,
    convert: impl Fn(T) -> f32,
    tx: &Sender<Vec<f32>>,
) {
    let mono: Vec<f32> = data
        .chunks(channels)
        .map(|frame| frame.iter().map(|&s| convert(s)).sum::<f32>() / frame.len() as f32)
        .collect();
    let _ = tx.try_send(mono);
}
