use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use stripviz_core::{
    wheel, AudioSource, BinMapConfig, EngineConfig, FrameOutcome, PixelSink, Result, Rgb,
    ShutdownSignal, SpectralFrame, VisualizationEngine, VisualizationMode, VizError,
};

/// Calls seen by the test doubles, in order
type CallLog = Arc<Mutex<Vec<&'static str>>>;

/// Plays back a fixed list of reads, then repeats the last good frame forever
struct ScriptedSource {
    script: VecDeque<Result<SpectralFrame>>,
    last: Option<SpectralFrame>,
    fail_setup: bool,
    log: CallLog,
}

impl ScriptedSource {
    fn new(log: &CallLog, script: Vec<Result<SpectralFrame>>) -> Self {
        Self {
            script: script.into(),
            last: None,
            fail_setup: false,
            log: log.clone(),
        }
    }
}

impl AudioSource for ScriptedSource {
    fn setup(&mut self) -> Result<()> {
        self.log.lock().push("audio.setup");
        if self.fail_setup {
            return Err(VizError::AudioUnavailable("no device".to_string()));
        }
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.log.lock().push("audio.start");
        Ok(())
    }

    fn next_frame(&mut self, _trim: bool) -> Result<SpectralFrame> {
        match self.script.pop_front() {
            Some(Ok(frame)) => {
                self.last = Some(frame.clone());
                Ok(frame)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last
                .clone()
                .ok_or_else(|| VizError::AudioRead("script empty".to_string())),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.log.lock().push("audio.close");
        Ok(())
    }
}

#[derive(Default)]
struct SinkState {
    staged: Vec<Rgb>,
    frames: Vec<Vec<Rgb>>,
    failing_commits: usize,
    failing_writes: usize,
    fail_begin: bool,
}

struct RecordingSink {
    state: Arc<Mutex<SinkState>>,
    log: CallLog,
}

impl PixelSink for RecordingSink {
    fn begin(&mut self) -> Result<()> {
        self.log.lock().push("sink.begin");
        if self.state.lock().fail_begin {
            return Err(VizError::Sink("device busy".to_string()));
        }
        Ok(())
    }

    fn set_channel(&mut self, index: usize, color: Rgb) -> Result<()> {
        let mut state = self.state.lock();
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(VizError::Sink("pixel write failed".to_string()));
        }
        if state.staged.len() <= index {
            state.staged.resize(index + 1, Rgb::BLACK);
        }
        state.staged[index] = color;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if state.failing_commits > 0 {
            state.failing_commits -= 1;
            return Err(VizError::Sink("write failed".to_string()));
        }
        let frame = state.staged.clone();
        state.frames.push(frame);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.log.lock().push("sink.shutdown");
        Ok(())
    }
}

/// Four channels reading bins 0..4 with a divisor of one
fn identity_config(mode: VisualizationMode) -> EngineConfig {
    strip_config(mode, 4)
}

/// `channels` channels, each reading its own bin with a divisor of one
fn strip_config(mode: VisualizationMode, channels: usize) -> EngineConfig {
    EngineConfig {
        channel_count: channels,
        decay_weight: 4,
        default_mode: mode,
        max_consecutive_sink_failures: 3,
        bins: BinMapConfig {
            offset: 0,
            window: channels,
            divisor_base: 1.0,
            divisor_scale: 1000.0,
            min_divisor: 1.0,
        },
        ..Default::default()
    }
}

fn frame(magnitudes: &[f32]) -> Result<SpectralFrame> {
    Ok(SpectralFrame::from_magnitudes(magnitudes.to_vec()))
}

struct Harness {
    engine: VisualizationEngine,
    sink: Arc<Mutex<SinkState>>,
    log: CallLog,
}

fn harness(config: EngineConfig, script: Vec<Result<SpectralFrame>>) -> Harness {
    let log = CallLog::default();
    let sink = Arc::new(Mutex::new(SinkState::default()));
    let engine = VisualizationEngine::new(
        config,
        Box::new(ScriptedSource::new(&log, script)),
        Box::new(RecordingSink {
            state: sink.clone(),
            log: log.clone(),
        }),
    )
    .unwrap();
    Harness { engine, sink, log }
}

#[test]
fn test_zero_envelope_is_black_in_amplitude_modes() {
    for mode in [
        VisualizationMode::SingleColorAmplitude,
        VisualizationMode::TimeRotatingAmplitude,
    ] {
        let config = strip_config(mode, 10);
        assert_eq!(config.base_color, Rgb::WHITE);
        let mut h = harness(config, vec![frame(&[0.0; 10])]);
        h.engine.start().unwrap();
        let outcome = h.engine.render_frame_at(Duration::from_secs(3)).unwrap();
        assert_eq!(outcome, FrameOutcome::Rendered(mode));
        assert_eq!(h.sink.lock().frames[0], vec![Rgb::BLACK; 10]);
    }
}

#[test]
fn test_attack_then_decay() {
    let mut h = harness(
        identity_config(VisualizationMode::SingleColorAmplitude),
        vec![frame(&[0.0, 100.0, 510.0, 1020.0]), frame(&[0.0; 4])],
    );
    h.engine.start().unwrap();

    h.engine.render_frame_at(Duration::ZERO).unwrap();
    assert_eq!(h.engine.envelope(), &[0, 100, 510, 1020]);
    assert_eq!(
        h.sink.lock().frames[0],
        vec![
            Rgb::BLACK,
            Rgb::new(25, 25, 25),
            Rgb::new(127, 127, 127),
            Rgb::WHITE
        ]
    );

    h.engine.render_frame_at(Duration::ZERO).unwrap();
    // floor(previous * 4 / 5)
    assert_eq!(h.engine.envelope(), &[0, 80, 408, 816]);
}

#[test]
fn test_frequency_mode_uses_wheel() {
    let mut h = harness(
        identity_config(VisualizationMode::FrequencyColor),
        vec![frame(&[0.0, 255.0, 600.0, 2000.0])],
    );
    h.engine.start().unwrap();
    h.engine.render_frame_at(Duration::ZERO).unwrap();
    assert_eq!(
        h.engine.colors(),
        &[wheel(0), wheel(255), wheel(600), Rgb::new(0, 255, 0)]
    );
}

#[test]
fn test_mode_switch_applies_to_next_frame() {
    let mut h = harness(
        identity_config(VisualizationMode::SingleColorAmplitude),
        vec![frame(&[510.0; 4])],
    );
    let control = h.engine.mode_control();
    h.engine.start().unwrap();

    assert_eq!(
        h.engine.render_frame_at(Duration::ZERO).unwrap(),
        FrameOutcome::Rendered(VisualizationMode::SingleColorAmplitude)
    );
    assert!(control.set_mode("frequency_color"));
    assert_eq!(
        h.engine.render_frame_at(Duration::ZERO).unwrap(),
        FrameOutcome::Rendered(VisualizationMode::FrequencyColor)
    );

    let frames = &h.sink.lock().frames;
    assert!(frames[0].iter().all(|c| *c == Rgb::new(127, 127, 127)));
    assert!(frames[1].iter().all(|c| *c == wheel(510)));
}

#[test]
fn test_unknown_mode_leaves_engine_untouched() {
    let h = harness(identity_config(VisualizationMode::FrequencyColor), vec![]);
    let control = h.engine.mode_control();
    assert!(!control.set_mode("disco"));
    assert_eq!(control.current(), VisualizationMode::FrequencyColor);
}

#[test]
fn test_audio_failure_reuses_previous_spectrum() {
    let mut h = harness(
        identity_config(VisualizationMode::SingleColorAmplitude),
        vec![
            frame(&[1020.0; 4]),
            Err(VizError::AudioRead("overrun".to_string())),
        ],
    );
    h.engine.start().unwrap();
    h.engine.render_frame_at(Duration::ZERO).unwrap();
    let outcome = h.engine.render_frame_at(Duration::ZERO).unwrap();

    assert_eq!(
        outcome,
        FrameOutcome::Rendered(VisualizationMode::SingleColorAmplitude)
    );
    assert_eq!(h.engine.envelope(), &[1020; 4]);
    assert_eq!(h.engine.summary().audio_failures, 1);
    assert_eq!(h.sink.lock().frames.len(), 2);
}

#[test]
fn test_no_frame_before_first_spectrum() {
    let mut h = harness(
        identity_config(VisualizationMode::FrequencyColor),
        vec![Err(VizError::AudioRead("warming up".to_string()))],
    );
    h.engine.start().unwrap();
    assert_eq!(
        h.engine.render_frame_at(Duration::ZERO).unwrap(),
        FrameOutcome::NoAudio
    );
    assert!(h.sink.lock().frames.is_empty());
}

#[test]
fn test_short_spectrum_clamps_to_last_bin() {
    let mut h = harness(
        identity_config(VisualizationMode::SingleColorAmplitude),
        vec![frame(&[0.0, 1020.0])],
    );
    h.engine.start().unwrap();
    h.engine.render_frame_at(Duration::ZERO).unwrap();
    assert_eq!(h.engine.envelope(), &[0, 1020, 1020, 1020]);
}

#[test]
fn test_transient_sink_failure_drops_frame() {
    let mut h = harness(
        identity_config(VisualizationMode::FrequencyColor),
        vec![frame(&[10.0; 4])],
    );
    h.sink.lock().failing_commits = 2;
    h.engine.start().unwrap();

    assert_eq!(
        h.engine.render_frame_at(Duration::ZERO).unwrap(),
        FrameOutcome::Dropped
    );
    assert_eq!(
        h.engine.render_frame_at(Duration::ZERO).unwrap(),
        FrameOutcome::Dropped
    );
    assert_eq!(
        h.engine.render_frame_at(Duration::ZERO).unwrap(),
        FrameOutcome::Rendered(VisualizationMode::FrequencyColor)
    );

    let summary = h.engine.summary();
    assert_eq!(summary.frames_dropped, 2);
    assert_eq!(summary.frames_rendered, 1);
}

#[test]
fn test_pixel_write_failure_drops_frame() {
    let mut h = harness(
        identity_config(VisualizationMode::FrequencyColor),
        vec![frame(&[10.0; 4])],
    );
    h.sink.lock().failing_writes = 1;
    h.engine.start().unwrap();

    assert_eq!(
        h.engine.render_frame_at(Duration::ZERO).unwrap(),
        FrameOutcome::Dropped
    );
    assert!(h.sink.lock().frames.is_empty());

    assert_eq!(
        h.engine.render_frame_at(Duration::ZERO).unwrap(),
        FrameOutcome::Rendered(VisualizationMode::FrequencyColor)
    );
    assert_eq!(h.sink.lock().frames.len(), 1);
    assert_eq!(h.engine.summary().frames_dropped, 1);
}

#[test]
fn test_run_gives_up_after_consecutive_sink_failures() {
    let mut h = harness(
        identity_config(VisualizationMode::FrequencyColor),
        vec![frame(&[10.0; 4])],
    );
    h.sink.lock().failing_commits = usize::MAX;

    let err = h.engine.run(&ShutdownSignal::new()).unwrap_err();
    assert!(matches!(err, VizError::Sink(_)));
    assert_eq!(h.engine.summary().frames_dropped, 3);

    let log = h.log.lock();
    assert!(log.contains(&"audio.close"));
    assert!(log.contains(&"sink.shutdown"));
}

#[test]
fn test_startup_failure_releases_everything() {
    let mut h = harness(identity_config(VisualizationMode::FrequencyColor), vec![]);
    h.sink.lock().fail_begin = true;

    let err = h.engine.run(&ShutdownSignal::new()).unwrap_err();
    assert!(matches!(err, VizError::Sink(_)));
    assert_eq!(
        *h.log.lock(),
        vec![
            "audio.setup",
            "audio.start",
            "sink.begin",
            "audio.close",
            "sink.shutdown"
        ]
    );
}

#[test]
fn test_audio_setup_failure_is_fatal() {
    let log = CallLog::default();
    let mut source = ScriptedSource::new(&log, vec![]);
    source.fail_setup = true;
    let mut engine = VisualizationEngine::new(
        identity_config(VisualizationMode::FrequencyColor),
        Box::new(source),
        Box::new(RecordingSink {
            state: Arc::default(),
            log: log.clone(),
        }),
    )
    .unwrap();

    assert!(matches!(
        engine.run(&ShutdownSignal::new()),
        Err(VizError::AudioUnavailable(_))
    ));
    assert!(!log.lock().contains(&"sink.begin"));
    assert!(log.lock().contains(&"sink.shutdown"));
}

#[test]
fn test_shutdown_stops_loop_and_releases() {
    let h = harness(
        identity_config(VisualizationMode::TimeRotatingAmplitude),
        vec![frame(&[300.0; 4])],
    );
    let Harness {
        mut engine,
        sink,
        log,
    } = h;
    let shutdown = ShutdownSignal::new();
    let control = engine.mode_control();

    let signal = shutdown.clone();
    let handle = thread::spawn(move || engine.run(&signal));

    while sink.lock().frames.len() < 5 {
        thread::sleep(Duration::from_millis(1));
    }
    control.set_mode("single_color_amplitude");
    shutdown.trigger();

    let summary = handle.join().unwrap().unwrap();
    assert!(summary.frames_rendered >= 5);
    assert_eq!(summary.frames_dropped, 0);
    assert_eq!(summary.final_mode, VisualizationMode::SingleColorAmplitude);

    let log = log.lock();
    assert_eq!(log.iter().filter(|c| **c == "sink.shutdown").count(), 1);
    assert_eq!(log.iter().filter(|c| **c == "audio.close").count(), 1);
}

#[test]
fn test_drop_without_start_does_not_touch_devices() {
    let h = harness(identity_config(VisualizationMode::FrequencyColor), vec![]);
    let log = h.log.clone();
    drop(h);
    assert!(log.lock().is_empty());
}

#[test]
fn test_invalid_config_rejected() {
    let log = CallLog::default();
    let result = VisualizationEngine::new(
        EngineConfig {
            channel_count: 0,
            ..Default::default()
        },
        Box::new(ScriptedSource::new(&log, vec![])),
        Box::new(RecordingSink {
            state: Arc::default(),
            log: log.clone(),
        }),
    );
    assert!(matches!(result, Err(VizError::InvalidConfig(_))));
}
