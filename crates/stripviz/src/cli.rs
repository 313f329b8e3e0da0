//! Command-line argument parsing.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use stripviz_core::VisualizationMode;

use crate::config::AudioBackend;

/// Output selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputKind {
    Artnet,
    Terminal,
}

/// Command line arguments
#[derive(Parser, Debug, Default)]
#[command(name = "stripviz")]
#[command(about = "Audio spectrum visualizer for addressable LED strips", long_about = None)]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of pixels on the strip
    #[arg(long, value_name = "COUNT")]
    pub channels: Option<usize>,

    /// Mode at startup: frequency_color, single_color_amplitude, time_rotating_amplitude
    #[arg(long, value_name = "MODE")]
    pub mode: Option<VisualizationMode>,

    /// Pixel output
    #[arg(long, value_enum, value_name = "KIND")]
    pub output: Option<OutputKind>,

    /// Art-Net node address, implies `--output artnet`
    #[arg(long, value_name = "HOST:PORT")]
    pub artnet_target: Option<String>,

    /// Audio backend
    #[arg(long, value_enum, value_name = "BACKEND")]
    pub audio: Option<AudioBackend>,

    /// Input device name (see --list-devices)
    #[arg(long, value_name = "NAME")]
    pub device: Option<String>,

    /// Control API bind address
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Control API port
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Disable the control API
    #[arg(long)]
    pub no_web: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Print the available modes and exit
    #[arg(long)]
    pub list_modes: bool,

    /// Print the available input devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        let args = Args::try_parse_from([
            "stripviz",
            "--channels",
            "144",
            "--mode",
            "frequency_color",
            "--output",
            "artnet",
            "--audio",
            "synthetic",
            "--port",
            "9000",
            "--no-web",
        ])
        .unwrap();

        assert_eq!(args.channels, Some(144));
        assert_eq!(args.mode, Some(VisualizationMode::FrequencyColor));
        assert_eq!(args.output, Some(OutputKind::Artnet));
        assert_eq!(args.audio, Some(AudioBackend::Synthetic));
        assert_eq!(args.port, Some(9000));
        assert!(args.no_web);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Args::try_parse_from(["stripviz", "--mode", "strobe"]).is_err());
    }

    #[test]
    fn test_no_arguments() {
        let args = Args::try_parse_from(["stripviz"]).unwrap();
        assert!(args.config.is_none());
        assert!(!args.list_modes);
    }
}
