//! OLED display for the macro-pad
//!
//! [`Ssd1306`] is a buffered 128×64 monochrome driver over blocking
//! `embedded-hal` I2C. [`StatusRenderer`] draws the engine's
//! [`DisplayFrame`](platform::DisplayFrame)s onto any [`BufferedDisplay`].

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::DrawTarget;

pub mod ssd1306;
pub mod status;

pub use ssd1306::{DisplayError, Ssd1306};
pub use status::{Justify, Layout, StatusRenderer, LAYOUTS, SCREENSAVER_TEXT};

/// Display width in pixels
pub const DISPLAY_WIDTH: u32 = 128;

/// Display height in pixels
pub const DISPLAY_HEIGHT: u32 = 64;

/// Height of one SSD1306 page (row unit used by layouts).
pub const PAGE_HEIGHT: u32 = 8;

/// A monochrome draw target whose drawing only reaches the panel on
/// [`flush`](BufferedDisplay::flush).
pub trait BufferedDisplay: DrawTarget<Color = BinaryColor> {
    /// Push the buffer to the panel.
    fn flush(&mut self) -> Result<(), Self::Error>;
}
