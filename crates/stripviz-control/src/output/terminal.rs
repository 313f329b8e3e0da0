//! Terminal preview of the strip.
//!
//! Each pixel is drawn as a true-color block, wrapped into rows of
//! `columns` pixels. The frame is redrawn in place from the cursor home
//! position on every commit.

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use stripviz_core::{PixelSink, Rgb, VizError};

use crate::{error::ControlError, Result};

const BLOCK: char = '█';

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Pixels per row
    pub columns: usize,
    /// Draw on the alternate screen and restore the shell on shutdown
    pub alternate_screen: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            columns: 60,
            alternate_screen: true,
        }
    }
}

pub struct TerminalSink<W: Write + Send> {
    writer: W,
    config: TerminalConfig,
    pixels: Vec<Rgb>,
    active: bool,
}

impl TerminalSink<io::Stdout> {
    /// Sink drawing to standard output
    pub fn stdout(config: TerminalConfig, pixel_count: usize) -> Result<Self> {
        Self::new(io::stdout(), config, pixel_count)
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(writer: W, config: TerminalConfig, pixel_count: usize) -> Result<Self> {
        if config.columns == 0 {
            return Err(ControlError::InvalidParameter(
                "terminal columns must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            writer,
            pixels: vec![Rgb::BLACK; pixel_count],
            active: false,
            config,
        })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn draw(&mut self) -> io::Result<()> {
        queue!(self.writer, MoveTo(0, 0))?;
        for row in self.pixels.chunks(self.config.columns) {
            for pixel in row {
                queue!(
                    self.writer,
                    SetForegroundColor(Color::Rgb {
                        r: pixel.r,
                        g: pixel.g,
                        b: pixel.b,
                    }),
                    Print(BLOCK)
                )?;
            }
            queue!(self.writer, ResetColor, Print('\n'))?;
        }
        self.writer.flush()
    }
}

impl<W: Write + Send> PixelSink for TerminalSink<W> {
    fn begin(&mut self) -> stripviz_core::Result<()> {
        if self.config.alternate_screen {
            queue!(self.writer, EnterAlternateScreen)?;
        }
        queue!(self.writer, Hide, Clear(ClearType::All))?;
        self.writer.flush()?;
        self.active = true;
        tracing::debug!(
            "Terminal output started: {} pixels, {} per row",
            self.pixels.len(),
            self.config.columns
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
        if !self.active {
            return Err(ControlError::TerminalError("Terminal output not started".to_string()).into());
        }
        self.draw().map_err(VizError::from)
    }

    fn shutdown(&mut self) -> stripviz_core::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        queue!(self.writer, ResetColor, Show)?;
        if self.config.alternate_screen {
            queue!(self.writer, LeaveAlternateScreen)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink(pixels: usize, columns: usize) -> TerminalSink<Vec<u8>> {
        TerminalSink::new(
            Vec::new(),
            TerminalConfig {
                columns,
                alternate_screen: false,
            },
            pixels,
        )
        .unwrap()
    }

    #[test]
    fn test_zero_columns_rejected() {
        let result = TerminalSink::new(
            Vec::new(),
            TerminalConfig {
                columns: 0,
                ..Default::default()
            },
            4,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_frame_layout() {
        let mut sink = sink(5, 2);
        sink.begin().unwrap();
        sink.set_channel(0, Rgb::new(255, 0, 0)).unwrap();
        sink.set_channel(4, Rgb::new(1, 2, 3)).unwrap();
        sink.commit().unwrap();
        sink.shutdown().unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.starts_with("\x1b[?25l\x1b[2J\x1b[1;1H"));
        assert!(out.contains("\x1b[38;2;255;0;0m█"));
        assert!(out.contains("\x1b[38;2;1;2;3m█"));
        // three rows for five pixels at two per row
        assert_eq!(out.matches("\x1b[0m\n").count(), 3);
        assert!(out.ends_with("\x1b[0m\x1b[?25h"));
    }

    #[test]
    fn test_alternate_screen_restored() {
        let mut sink = TerminalSink::new(Vec::new(), TerminalConfig::default(), 1).unwrap();
        sink.begin().unwrap();
        sink.commit().unwrap();
        sink.shutdown().unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.starts_with("\x1b[?1049h"));
        assert!(out.ends_with("\x1b[?1049l"));
    }

    #[test]
    fn test_commit_requires_begin() {
        let mut sink = sink(2, 2);
        assert!(matches!(sink.commit(), Err(VizError::Sink(_))));
    }

    #[test]
    fn test_shutdown_idempotent() {
        let mut sink = sink(2, 2);
        sink.begin().unwrap();
        sink.shutdown().unwrap();
        let len = sink.writer.len();
        sink.shutdown().unwrap();
        assert_eq!(sink.writer.len(), len);
    }

    #[test]
    fn test_out_of_range() {
        let mut sink = sink(2, 2);
        assert!(matches!(
            sink.set_channel(2, Rgb::WHITE),
            Err(VizError::ChannelOutOfRange { index: 2, count: 2 })
        ));
    }
}
