//! StripViz Control - outputs and remote control
//!
//! This crate connects the visualization core to the outside world:
//! - **Art-Net**: pixel output to Art-Net nodes driving LED strips
//! - **Terminal**: true-color preview of the strip in a terminal
//! - **Web API**: REST API for status and mode switching
//!
//! ## Feature Flags
//!
//! - `http-api`: Enable web API (requires `axum`, `tower-http`, enabled by default)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stripviz_control::{build_sink, ArtNetConfig, OutputConfig};
//!
//! let output = OutputConfig::Artnet(ArtNetConfig {
//!     target: "192.168.1.50:6454".to_string(),
//!     ..Default::default()
//! });
//! let sink = build_sink(&output, 300)?;
//! # Ok::<(), stripviz_control::ControlError>(())
//! ```
//!
//! ## Modules
//!
//! - [`output`] - Art-Net and terminal pixel sinks
//! - `web` - Web API (requires `http-api` feature)
//! - [`error`] - Error types

pub mod error;
pub mod output;

#[cfg(feature = "http-api")]
pub mod web;

pub use error::{ControlError, Result};
pub use output::{
    build_sink, ArtNetConfig, ArtNetSink, OutputConfig, TerminalConfig, TerminalSink,
};

#[cfg(feature = "http-api")]
pub use web::{AppState, WebServer, WebServerConfig};
