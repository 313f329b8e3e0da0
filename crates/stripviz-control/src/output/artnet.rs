//! Art-Net pixel output (Art-Net 4, OpDmx)
//!
//! The strip is split into consecutive universes of 170 RGB pixels starting
//! at the configured universe. One commit sends one OpDmx packet per universe,
//! all carrying the same sequence number.

use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};
use stripviz_core::{ColorOrder, PixelSink, Rgb, VizError};

use crate::{error::ControlError, Result};

/// Standard Art-Net UDP port
pub const ARTNET_PORT: u16 = 6454;

/// RGB pixels carried by one 512-channel universe
pub const PIXELS_PER_UNIVERSE: usize = 170;

const DMX_CHANNELS: usize = 512;
const HEADER_LEN: usize = 18;
const OP_DMX: u16 = 0x5000;
const PROTOCOL_VERSION: u16 = 14;

/// Art-Net output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtNetConfig {
    /// Node address, `host:port`
    pub target: String,
    /// Universe of the first pixel
    pub universe: u16,
    /// Global brightness applied to every pixel (0-255)
    pub brightness: u8,
    /// Byte order expected by the strip
    pub color_order: ColorOrder,
    /// Maximum frames per second sent to the node
    pub refresh_hz: u32,
}

impl Default for ArtNetConfig {
    fn default() -> Self {
        Self {
            target: format!("255.255.255.255:{}", ARTNET_PORT),
            universe: 0,
            brightness: 25,
            color_order: ColorOrder::Grb,
            refresh_hz: 44,
        }
    }
}

/// Number of universes needed for `pixels` pixels
pub fn universe_count(pixels: usize) -> usize {
    pixels.div_ceil(PIXELS_PER_UNIVERSE).max(1)
}

/// Build an Art-Net DMX packet (OpDmx)
pub fn build_artnet_packet(universe: u16, sequence: u8, channels: &[u8; DMX_CHANNELS]) -> Vec<u8> {
    let mut packet = vec![0u8; HEADER_LEN + DMX_CHANNELS];

    // Header: "Art-Net\0"
    packet[0..8].copy_from_slice(b"Art-Net\0");

    // OpCode, little-endian
    packet[8..10].copy_from_slice(&OP_DMX.to_le_bytes());

    // Protocol version, big-endian
    packet[10..12].copy_from_slice(&PROTOCOL_VERSION.to_be_bytes());

    packet[12] = sequence;

    // Physical
    packet[13] = 0;

    // Port-Address, little-endian
    packet[14..16].copy_from_slice(&universe.to_le_bytes());

    // Length, big-endian
    packet[16..18].copy_from_slice(&(DMX_CHANNELS as u16).to_be_bytes());

    packet[HEADER_LEN..].copy_from_slice(channels);

    packet
}

/// Pixel sink sending the strip to an Art-Net node
pub struct ArtNetSink {
    config: ArtNetConfig,
    target: SocketAddr,
    socket: Option<UdpSocket>,
    pixels: Vec<Rgb>,
    sequence: u8,
    last_send: Option<Instant>,
    min_interval: Duration,
}

impl ArtNetSink {
    pub fn new(config: ArtNetConfig, pixel_count: usize) -> Result<Self> {
        let target: SocketAddr = config.target.parse().map_err(|e| {
            ControlError::ArtNetError(format!("Invalid Art-Net target address: {}", e))
        })?;
        if config.refresh_hz == 0 {
            return Err(ControlError::InvalidParameter(
                "refresh_hz must be at least 1".to_string(),
            ));
        }
        let last_universe = usize::from(config.universe) + universe_count(pixel_count) - 1;
        if last_universe > 0x7FFF {
            return Err(ControlError::InvalidParameter(format!(
                "{} pixels starting at universe {} exceed the Art-Net address space",
                pixel_count, config.universe
            )));
        }

        let min_interval = Duration::from_secs_f64(1.0 / f64::from(config.refresh_hz));
        Ok(Self {
            target,
            socket: None,
            pixels: vec![Rgb::BLACK; pixel_count],
            sequence: 0,
            last_send: None,
            min_interval,
            config,
        })
    }

    pub fn universes(&self) -> usize {
        universe_count(self.pixels.len())
    }

    /// DMX payload of the `index`-th universe of this strip
    fn universe_payload(&self, index: usize, blackout: bool) -> [u8; DMX_CHANNELS] {
        let mut channels = [0u8; DMX_CHANNELS];
        if blackout {
            return channels;
        }
        let start = index * PIXELS_PER_UNIVERSE;
        let end = (start + PIXELS_PER_UNIVERSE).min(self.pixels.len());
        for (slot, pixel) in channels
            .chunks_exact_mut(3)
            .zip(&self.pixels[start.min(end)..end])
        {
            let dimmed = pixel.scaled(i32::from(self.config.brightness), 255);
            slot.copy_from_slice(&self.config.color_order.apply(dimmed));
        }
        channels
    }

    fn send_frame(&mut self, blackout: bool) -> Result<()> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| ControlError::ArtNetError("Art-Net output not started".to_string()))?;

        for index in 0..self.universes() {
            let universe = self.config.universe + index as u16;
            let packet =
                build_artnet_packet(universe, self.sequence, &self.universe_payload(index, blackout));
            socket.send_to(&packet, self.target)?;
        }
        tracing::trace!(
            "Sent Art-Net frame {} ({} universes from {})",
            self.sequence,
            self.universes(),
            self.config.universe
        );
        self.sequence = self.sequence.wrapping_add(1);
        Ok(())
    }
}

impl PixelSink for ArtNetSink {
    fn begin(&mut self) -> stripviz_core::Result<()> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_broadcast(true)?;
        self.socket = Some(socket);
        tracing::info!(
            "Art-Net output started: {} pixels in {} universes from {} -> {}",
            self.pixels.len(),
            self.universes(),
            self.config.universe,
            self.target
        );
        Ok(())
    }

    fn set_channel(&mut self, index: usize, color: Rgb) -> stripviz_core::Result<()> {
        let count = self.pixels.len();
        let slot = self
            .pixels
            .get_mut(index)
            .ok_or(VizError::ChannelOutOfRange { index, count })?;
        *slot = color;
        Ok(())
    }

    fn commit(&mut self) -> stripviz_core::Result<()> {
        // Frames inside the refresh interval are skipped, not failed
        let now = Instant::now();
        if let Some(last) = self.last_send {
            if now.duration_since(last) < self.min_interval {
                return Ok(());
            }
        }
        self.send_frame(false)?;
        self.last_send = Some(now);
        Ok(())
    }

    fn shutdown(&mut self) -> stripviz_core::Result<()> {
        if self.socket.is_none() {
            return Ok(());
        }
        let result = self.send_frame(true);
        self.socket = None;
        tracing::info!("Art-Net output stopped");
        result.map_err(Into::into)
    }
}
