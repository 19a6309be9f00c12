//! SSD1306 128×64 OLED driver (I2C, buffered)
//!
//! Drawing goes to an internal 1bpp buffer in the controller's page layout;
//! [`Ssd1306::flush`] streams the whole buffer in horizontal addressing mode.
//!
//! # Buffer layout
//!
//! ```text
//! byte index = page * 128 + x        (page = y / 8)
//! bit        = y % 8                 (LSB = top row of the page)
//! ```
//!
//! # I2C framing
//!
//! Every transfer starts with a control byte: `0x00` for a command stream,
//! `0x40` for display data.

// Pixel coordinates from embedded-graphics are i32; after bounds checks they
// are always non-negative and below 128/64, so the casts and the index
// arithmetic cannot overflow. Transfer frames are sliced by lengths bounded
// by their own capacity.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_hal::i2c::I2c;

use super::{BufferedDisplay, DISPLAY_HEIGHT, DISPLAY_WIDTH, PAGE_HEIGHT};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of 8-pixel pages.
pub const PAGES: usize = (DISPLAY_HEIGHT / PAGE_HEIGHT) as usize;

/// Buffer size: one byte per column per page.
pub const BUFFER_SIZE: usize = DISPLAY_WIDTH as usize * PAGES;

/// Data bytes sent per I2C transfer during [`Ssd1306::flush`].
pub const DATA_CHUNK: usize = 16;

/// Control byte introducing a command stream.
pub const CONTROL_COMMAND: u8 = 0x00;

/// Control byte introducing display data.
pub const CONTROL_DATA: u8 = 0x40;

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

/// SSD1306 command codes used by this driver.
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Command {
    /// Memory addressing mode, 1 argument (0x00 = horizontal).
    MemoryMode = 0x20,
    /// Column range, 2 arguments.
    ColumnAddress = 0x21,
    /// Page range, 2 arguments.
    PageAddress = 0x22,
    /// Display start line 0.
    StartLine = 0x40,
    /// Contrast, 1 argument.
    Contrast = 0x81,
    /// Charge pump, 1 argument (0x14 = enable).
    ChargePump = 0x8D,
    /// Column 127 mapped to SEG0.
    SegmentRemap = 0xA1,
    /// Follow RAM content.
    ResumeFromRam = 0xA4,
    /// Non-inverted display.
    NormalDisplay = 0xA6,
    /// Multiplex ratio, 1 argument.
    Multiplex = 0xA8,
    /// Panel off (sleep).
    DisplayOff = 0xAE,
    /// Panel on.
    DisplayOn = 0xAF,
    /// Scan COM[N-1] to COM0.
    ComScanDecrement = 0xC8,
    /// Display offset, 1 argument.
    DisplayOffset = 0xD3,
    /// Clock divide ratio, 1 argument.
    ClockDivide = 0xD5,
    /// Pre-charge period, 1 argument.
    Precharge = 0xD9,
    /// COM pins configuration, 1 argument.
    ComPins = 0xDA,
    /// VCOMH deselect level, 1 argument.
    VcomDetect = 0xDB,
}

/// Power-up sequence for a 128×64 panel with the internal charge pump.
const INIT_SEQUENCE: [u8; 25] = [
    Command::DisplayOff as u8,
    Command::ClockDivide as u8,
    0x80,
    Command::Multiplex as u8,
    0x3F,
    Command::DisplayOffset as u8,
    0x00,
    Command::StartLine as u8,
    Command::ChargePump as u8,
    0x14,
    Command::MemoryMode as u8,
    0x00,
    Command::SegmentRemap as u8,
    Command::ComScanDecrement as u8,
    Command::ComPins as u8,
    0x12,
    Command::Contrast as u8,
    0xCF,
    Command::Precharge as u8,
    0xF1,
    Command::VcomDetect as u8,
    0x40,
    Command::ResumeFromRam as u8,
    Command::NormalDisplay as u8,
    Command::DisplayOn as u8,
];

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Buffered SSD1306 driver.
///
/// Use `embassy_stm32::i2c::I2c` on the target, or
/// `embedded_hal_mock::eh1::i2c::Mock` in host tests.
pub struct Ssd1306<I2C> {
    i2c: I2C,
    address: u8,
    buffer: [u8; BUFFER_SIZE],
}

impl<I2C: I2c> Ssd1306<I2C> {
    /// Driver for the panel at 7-bit `address`. The buffer starts blank.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            buffer: [0; BUFFER_SIZE],
        }
    }

    /// Run the power-up sequence and blank the panel.
    pub fn init(&mut self) -> Result<(), DisplayError> {
        self.commands(&INIT_SEQUENCE)?;
        self.buffer.fill(0);
        self.flush_buffer()
    }

    /// Turn the panel off or back on without touching its RAM.
    pub fn set_power(&mut self, on: bool) -> Result<(), DisplayError> {
        let cmd = if on {
            Command::DisplayOn
        } else {
            Command::DisplayOff
        };
        self.commands(&[cmd as u8])
    }

    /// The raw page-layout buffer.
    pub fn buffer(&self) -> &[u8; BUFFER_SIZE] {
        &self.buffer
    }

    /// Release the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn commands(&mut self, cmds: &[u8]) -> Result<(), DisplayError> {
        let mut frame = [0u8; INIT_SEQUENCE.len() + 1];
        let len = cmds.len().min(INIT_SEQUENCE.len());
        frame[0] = CONTROL_COMMAND;
        frame[1..=len].copy_from_slice(&cmds[..len]);
        self.i2c
            .write(self.address, &frame[..=len])
            .map_err(|_| DisplayError::Communication)
    }

    fn flush_buffer(&mut self) -> Result<(), DisplayError> {
        self.commands(&[
            Command::ColumnAddress as u8,
            0,
            (DISPLAY_WIDTH - 1) as u8,
            Command::PageAddress as u8,
            0,
            (PAGES - 1) as u8,
        ])?;
        let mut frame = [0u8; DATA_CHUNK + 1];
        frame[0] = CONTROL_DATA;
        for chunk in self.buffer.chunks(DATA_CHUNK) {
            frame[1..=chunk.len()].copy_from_slice(chunk);
            self.i2c
                .write(self.address, &frame[..=chunk.len()])
                .map_err(|_| DisplayError::Communication)?;
        }
        Ok(())
    }
}

impl<I2C: I2c> BufferedDisplay for Ssd1306<I2C> {
    fn flush(&mut self) -> Result<(), DisplayError> {
        self.flush_buffer()
    }
}

impl<I2C: I2c> DrawTarget for Ssd1306<I2C> {
    type Color = BinaryColor;
    type Error = DisplayError;

    /// `BinaryColor::On` lights the pixel.
    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0
                || point.y < 0
                || point.x >= DISPLAY_WIDTH as i32
                || point.y >= DISPLAY_HEIGHT as i32
            {
                continue;
            }
            let x = point.x as usize;
            let y = point.y as usize;
            let index = (y / PAGE_HEIGHT as usize) * DISPLAY_WIDTH as usize + x;
            let mask = 1u8 << (y % PAGE_HEIGHT as usize);
            if let Some(byte) = self.buffer.get_mut(index) {
                match color {
                    BinaryColor::On => *byte |= mask,
                    BinaryColor::Off => *byte &= !mask,
                }
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buffer.fill(match color {
            BinaryColor::On => 0xFF,
            BinaryColor::Off => 0x00,
        });
        Ok(())
    }
}

impl<I2C> OriginDimensions for Ssd1306<I2C> {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors returned by the SSD1306 driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// I2C transfer failed (NACK, arbitration loss, bus error).
    Communication,
}

impl core::fmt::Display for DisplayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Communication => write!(f, "I2C communication error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DisplayError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    const ADDR: u8 = 0x3C;

    fn window_txn() -> I2cTransaction {
        I2cTransaction::write(ADDR, vec![CONTROL_COMMAND, 0x21, 0, 127, 0x22, 0, 7])
    }

    fn data_txns(fill: u8) -> Vec<I2cTransaction> {
        (0..BUFFER_SIZE / DATA_CHUNK)
            .map(|_| {
                let mut bytes = vec![CONTROL_DATA];
                bytes.extend(core::iter::repeat(fill).take(DATA_CHUNK));
                I2cTransaction::write(ADDR, bytes)
            })
            .collect()
    }

    #[test]
    fn test_init_sends_sequence_then_blank_frame() {
        let mut expectations = vec![I2cTransaction::write(ADDR, {
            let mut v = vec![CONTROL_COMMAND];
            v.extend_from_slice(&INIT_SEQUENCE);
            v
        })];
        expectations.push(window_txn());
        expectations.extend(data_txns(0x00));

        let mut i2c = I2cMock::new(&expectations);
        let mut drv = Ssd1306::new(i2c.clone(), ADDR);
        drv.init().unwrap();
        i2c.done();
    }

    #[test]
    fn test_pixel_lands_in_page_layout() {
        let mut i2c = I2cMock::new(&[]);
        let mut drv = Ssd1306::new(i2c.clone(), ADDR);
        drv.draw_iter([
            Pixel(Point::new(0, 0), BinaryColor::On),
            Pixel(Point::new(5, 9), BinaryColor::On),
            Pixel(Point::new(127, 63), BinaryColor::On),
        ])
        .unwrap();
        assert_eq!(drv.buffer()[0], 0b0000_0001);
        // y = 9 → page 1, bit 1
        assert_eq!(drv.buffer()[128 + 5], 0b0000_0010);
        assert_eq!(drv.buffer()[BUFFER_SIZE - 1], 0b1000_0000);

        drv.draw_iter([Pixel(Point::new(0, 0), BinaryColor::Off)]).unwrap();
        assert_eq!(drv.buffer()[0], 0);
        i2c.done();
    }

    #[test]
    fn test_out_of_bounds_pixels_are_ignored() {
        let mut i2c = I2cMock::new(&[]);
        let mut drv = Ssd1306::new(i2c.clone(), ADDR);
        drv.draw_iter([
            Pixel(Point::new(-1, 0), BinaryColor::On),
            Pixel(Point::new(128, 0), BinaryColor::On),
            Pixel(Point::new(0, 64), BinaryColor::On),
        ])
        .unwrap();
        assert!(drv.buffer().iter().all(|&b| b == 0));
        i2c.done();
    }

    #[test]
    fn test_flush_streams_whole_buffer() {
        let mut expectations = vec![window_txn()];
        expectations.extend(data_txns(0xFF));
        let mut i2c = I2cMock::new(&expectations);
        let mut drv = Ssd1306::new(i2c.clone(), ADDR);
        drv.clear(BinaryColor::On).unwrap();
        drv.flush().unwrap();
        i2c.done();
    }

    #[test]
    fn test_bus_error_maps_to_communication() {
        let expectations = [I2cTransaction::write(ADDR, vec![CONTROL_COMMAND, 0xAE])
            .with_error(ErrorKind::Other)];
        let mut i2c = I2cMock::new(&expectations);
        let mut drv = Ssd1306::new(i2c.clone(), ADDR);
        assert_eq!(drv.set_power(false), Err(DisplayError::Communication));
        i2c.done();
    }
}
