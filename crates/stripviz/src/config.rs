//! Application configuration
//!
//! Loaded from TOML. Every section is optional; command-line flags are
//! applied on top.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use stripviz_control::{ArtNetConfig, OutputConfig, TerminalConfig, WebServerConfig};
use stripviz_core::{EngineConfig, LogConfig, SyntheticConfig};

use crate::cli::{Args, OutputKind};

/// Where spectra come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AudioBackend {
    /// Live input device
    #[default]
    Capture,
    /// Generated test signal
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub backend: AudioBackend,
    /// Input device name, host default when unset
    pub device: Option<String>,
    pub fft_size: usize,
    pub magnitude_divisor: f32,
    pub poll_timeout_ms: u64,
    pub synthetic: SyntheticConfig,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            backend: AudioBackend::default(),
            device: None,
            fft_size: 4096,
            magnitude_divisor: 100.0,
            poll_timeout_ms: 20,
            synthetic: SyntheticConfig::default(),
        }
    }
}

#[cfg(feature = "audio")]
impl AudioConfig {
    pub fn capture_config(&self) -> stripviz_core::CaptureConfig {
        stripviz_core::CaptureConfig {
            device: self.device.clone(),
            fft_size: self.fft_size,
            magnitude_divisor: self.magnitude_divisor,
            poll_timeout_ms: self.poll_timeout_ms,
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub audio: AudioConfig,
    pub output: OutputConfig,
    pub web: WebServerConfig,
    pub logging: LogConfig,
}

impl AppConfig {
    /// Default location, `<config dir>/stripviz/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("stripviz");
            p.push("config.toml");
            p
        })
    }

    /// Load from `path`, or from the default location when it exists, or
    /// fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Apply command-line overrides
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(channels) = args.channels {
            self.engine.channel_count = channels;
        }
        if let Some(mode) = args.mode {
            self.engine.default_mode = mode;
        }

        match args.output {
            Some(OutputKind::Artnet) => self.ensure_artnet(),
            Some(OutputKind::Terminal) => {
                if !matches!(self.output, OutputConfig::Terminal(_)) {
                    self.output = OutputConfig::Terminal(TerminalConfig::default());
                }
            }
            None => {}
        }
        if let Some(target) = &args.artnet_target {
            self.ensure_artnet();
            if let OutputConfig::Artnet(artnet) = &mut self.output {
                artnet.target = target.clone();
            }
        }

        if let Some(backend) = args.audio {
            self.audio.backend = backend;
        }
        if let Some(device) = &args.device {
            self.audio.device = Some(device.clone());
        }

        if let Some(host) = &args.host {
            self.web.host = host.clone();
        }
        if let Some(port) = args.port {
            self.web.port = port;
        }
        if args.no_web {
            self.web.enabled = false;
        }

        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Resolve settings that depend on each other.
    ///
    /// The terminal preview owns the screen, so console logging moves to the
    /// log file.
    pub fn finalize(&mut self) {
        if matches!(self.output, OutputConfig::Terminal(_)) && self.logging.console_output {
            self.logging.console_output = false;
            self.logging.file_output = true;
        }
    }

    fn ensure_artnet(&mut self) {
        if !matches!(self.output, OutputConfig::Artnet(_)) {
            self.output = OutputConfig::Artnet(ArtNetConfig::default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use stripviz_core::{ColorOrder, VisualizationMode};
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.engine.channel_count, 300);
        assert_eq!(config.engine.decay_weight, 4);
        assert_eq!(config.engine.max_db, 1020);
        assert_eq!(
            config.engine.default_mode,
            VisualizationMode::TimeRotatingAmplitude
        );
        assert_eq!(config.audio.backend, AudioBackend::Capture);
        assert_eq!(config.audio.fft_size, 4096);
        assert_eq!(config.web.port, 8080);
        assert_eq!(config.web.host, "127.0.0.1");
        assert!(config.web.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_full_file() {
        let config: AppConfig = toml::from_str(
            r#"
            [engine]
            channel_count = 60
            default_mode = "single_color_amplitude"
            base_color = { r = 0, g = 128, b = 255 }

            [engine.bins]
            window = 120

            [audio]
            backend = "synthetic"

            [output]
            kind = "artnet"
            target = "192.168.1.40:6454"
            universe = 2
            color_order = "brg"

            [web]
            enabled = false

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.channel_count, 60);
        assert_eq!(config.engine.bins.window, 120);
        assert_eq!(config.engine.bins.offset, 15);
        assert_eq!(config.audio.backend, AudioBackend::Synthetic);
        match &config.output {
            OutputConfig::Artnet(artnet) => {
                assert_eq!(artnet.target, "192.168.1.40:6454");
                assert_eq!(artnet.universe, 2);
                assert_eq!(artnet.color_order, ColorOrder::Brg);
                assert_eq!(artnet.brightness, 25);
            }
            other => panic!("expected artnet output, got {:?}", other),
        }
        assert!(!config.web.enabled);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stripviz.toml");
        fs::write(&path, "[engine]\nchannel_count = 12\n").unwrap();

        let config = AppConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.engine.channel_count, 12);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::load(Some(dir.path().join("absent.toml").as_path())).is_err());
    }

    #[test]
    fn test_invalid_mode_in_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[engine]\ndefault_mode = \"disco\"\n").unwrap();
        assert!(AppConfig::load(Some(path.as_path())).is_err());
    }

    #[test]
    fn test_args_override_file() {
        let mut config = AppConfig::default();
        let args = Args::try_parse_from([
            "stripviz",
            "--channels",
            "30",
            "--artnet-target",
            "10.0.0.2:6454",
            "--audio",
            "synthetic",
            "--no-web",
            "--log-level",
            "warn",
        ])
        .unwrap();
        config.apply_args(&args);

        assert_eq!(config.engine.channel_count, 30);
        assert_eq!(config.audio.backend, AudioBackend::Synthetic);
        assert!(!config.web.enabled);
        assert_eq!(config.logging.level, "warn");
        match &config.output {
            OutputConfig::Artnet(artnet) => assert_eq!(artnet.target, "10.0.0.2:6454"),
            other => panic!("expected artnet output, got {:?}", other),
        }
    }

    #[test]
    fn test_output_override_keeps_existing_section() {
        let mut config = AppConfig {
            output: OutputConfig::Artnet(ArtNetConfig {
                universe: 7,
                ..Default::default()
            }),
            ..Default::default()
        };
        let args = Args::try_parse_from(["stripviz", "--output", "artnet"]).unwrap();
        config.apply_args(&args);
        match &config.output {
            OutputConfig::Artnet(artnet) => assert_eq!(artnet.universe, 7),
            other => panic!("expected artnet output, got {:?}", other),
        }
    }

    #[test]
    fn test_terminal_output_moves_logs_to_file() {
        let mut config = AppConfig::default();
        config.finalize();
        assert!(!config.logging.console_output);
        assert!(config.logging.file_output);

        let mut config = AppConfig {
            output: OutputConfig::Artnet(ArtNetConfig::default()),
            ..Default::default()
        };
        config.finalize();
        assert!(config.logging.console_output);
    }

    #[test]
    fn test_printed_config_parses_back() {
        let mut config = AppConfig::default();
        config.engine.channel_count = 99;
        config.output = OutputConfig::Artnet(ArtNetConfig::default());

        let text = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.engine, config.engine);
        assert_eq!(parsed.output, config.output);
        assert_eq!(parsed.web, config.web);
    }
}
