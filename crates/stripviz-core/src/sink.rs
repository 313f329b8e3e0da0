//! Pixel output abstraction.

use crate::color::Rgb;
use crate::error::Result;

/// Destination for one color per channel.
///
/// Colors arrive in canonical RGB order; any device-specific byte order is the
/// implementation's business. Nothing becomes visible until `commit`.
pub trait PixelSink: Send {
    /// One-time device initialization.
    fn begin(&mut self) -> Result<()>;

    /// Stage the color of a single channel.
    fn set_channel(&mut self, index: usize, color: Rgb) -> Result<()>;

    /// Push all staged colors to the device.
    fn commit(&mut self) -> Result<()>;

    /// Blank and release the device. Calling it more than once is harmless.
    fn shutdown(&mut self) -> Result<()>;
}
