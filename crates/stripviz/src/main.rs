//! StripViz - audio spectrum visualizer for addressable LED strips
//!
//! Wires the audio source, the render loop and the pixel sink together and
//! serves the mode control API next to them.

mod cli;
mod config;
mod logging_setup;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::thread;
use std::time::Duration;
use stripviz_control::{build_sink, AppState, WebServer};
use stripviz_core::{
    AudioSource, ShutdownSignal, SyntheticSource, VisualizationEngine, VisualizationMode,
};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::cli::Args;
use crate::config::{AppConfig, AudioBackend, AudioConfig};

fn build_audio_source(config: &AudioConfig) -> Result<Box<dyn AudioSource>> {
    match config.backend {
        AudioBackend::Synthetic => Ok(Box::new(SyntheticSource::new(config.synthetic.clone()))),
        #[cfg(feature = "audio")]
        AudioBackend::Capture => Ok(Box::new(stripviz_core::CaptureSource::new(
            config.capture_config(),
        ))),
        #[cfg(not(feature = "audio"))]
        AudioBackend::Capture => Err(anyhow!(
            "Built without the `audio` feature, use `--audio synthetic`"
        )),
    }
}

fn print_modes() {
    for mode in VisualizationMode::ALL {
        println!("{:<26} {}", mode.id(), mode.display_name());
    }
}

#[cfg(feature = "audio")]
fn print_devices() -> Result<()> {
    let devices = stripviz_core::audio::capture::list_input_devices()
        .context("Failed to enumerate input devices")?;
    if devices.is_empty() {
        println!("No input devices found");
    }
    for name in devices {
        println!("{}", name);
    }
    Ok(())
}

#[cfg(not(feature = "audio"))]
fn print_devices() -> Result<()> {
    Err(anyhow!("Built without the `audio` feature"))
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_modes {
        print_modes();
        return Ok(());
    }
    if args.list_devices {
        return print_devices();
    }

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_args(&args);
    config.finalize();

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let log_guard = logging_setup::init(&config.logging)?;

    info!("==========================================");
    info!("===      StripViz Session Started      ===");
    info!("==========================================");
    if let Some(guard) = &log_guard {
        info!("Log file: {:?}", guard.path);
    }

    let channel_count = config.engine.channel_count;
    let audio = build_audio_source(&config.audio)?;
    let sink = build_sink(&config.output, channel_count).context("Failed to create output")?;
    let mut engine = VisualizationEngine::new(config.engine.clone(), audio, sink)
        .context("Invalid engine configuration")?;
    info!(
        "Audio: {:?}, output: {}, {} channels",
        config.audio.backend,
        config.output.kind(),
        channel_count
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("stripviz-rt")
        .build()
        .context("Failed to start async runtime")?;

    let shutdown = ShutdownSignal::new();
    {
        let shutdown = shutdown.clone();
        runtime.spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl+C received, shutting down");
                    shutdown.trigger();
                }
                Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
            }
        });
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    let web_handle = if config.web.enabled {
        let state = AppState::new(engine.mode_control(), channel_count);
        let server = WebServer::new(config.web.clone(), state);
        let mut stop_rx = stop_rx.clone();
        Some(runtime.spawn(async move {
            let result = server
                .run(async move {
                    let _ = stop_rx.wait_for(|stop| *stop).await;
                })
                .await;
            if let Err(e) = &result {
                error!("Web server failed: {}", e);
            }
            result
        }))
    } else {
        info!("Control API disabled");
        None
    };

    let render_shutdown = shutdown.clone();
    let render = thread::Builder::new()
        .name("render-loop".to_string())
        .spawn(move || engine.run(&render_shutdown))
        .context("Failed to spawn render thread")?;

    let outcome = render
        .join()
        .map_err(|_| anyhow!("Render thread panicked"))?;

    // The engine may have stopped on its own; stop everything else too
    shutdown.trigger();
    let _ = stop_tx.send(true);
    if let Some(handle) = web_handle {
        if let Err(e) = runtime.block_on(handle) {
            error!("Web server task failed: {}", e);
        }
    }
    runtime.shutdown_timeout(Duration::from_secs(1));

    let summary = outcome.context("Visualization engine stopped")?;
    info!(
        "Session finished in mode '{}': {} frames rendered, {} dropped, {} audio read failures",
        summary.final_mode.id(),
        summary.frames_rendered,
        summary.frames_dropped,
        summary.audio_failures
    );
    Ok(())
}
