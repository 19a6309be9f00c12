//! Board wiring and build profile.
//!
//! # Pin assignments (WeAct STM32F411CE "Black Pill")
//!
//! | Signal            | MCU pin | Notes                               |
//! |-------------------|---------|-------------------------------------|
//! | Left button       | PB12    | Active-low, internal pull-up        |
//! | Right button      | PB13    | Active-low, internal pull-up        |
//! | Encoder click     | PB14    | Active-low, internal pull-up        |
//! | Up button         | PB15    | Active-low, internal pull-up        |
//! | Down button       | PA8     | Active-low, internal pull-up        |
//! | Encoder A         | PB4     | EXTI4, both edges, internal pull-up |
//! | Encoder B         | PB5     | EXTI5, both edges, internal pull-up |
//! | OLED SCL          | PB6     | I2C1 @ 400 kHz                      |
//! | OLED SDA          | PB7     | I2C1                                |
//! | HID bridge TX     | PA9     | USART1 @ 115 200 baud               |
//!
//! Buttons are polled by the scheduler pass; only the encoder uses
//! interrupts. Its task runs on an interrupt executor pended through the
//! otherwise unused SPI3 vector, so it preempts the thread-mode main loop.

use embassy_time::Duration;
use platform::Profile;

/// Timing profile baked into this build.
#[cfg(not(feature = "bench-profile"))]
pub const PROFILE: Profile = Profile::Release;

/// Timing profile baked into this build.
#[cfg(feature = "bench-profile")]
pub const PROFILE: Profile = Profile::Bench;

/// 7-bit I2C address of the SSD1306 (SA0 low).
pub const OLED_I2C_ADDRESS: u8 = 0x3C;

/// OLED bus clock.
pub const OLED_I2C_HZ: u32 = 400_000;

/// Baud rate of the HID bridge link.
pub const BRIDGE_BAUD: u32 = 115_200;

/// How often the screensaver text moves while idle.
pub const SCREENSAVER_DRIFT: Duration = Duration::from_millis(5_000);

/// Watchdog timeout. The main loop pets it every pass.
pub const WATCHDOG_TIMEOUT_US: u32 = 2_000_000;

/// Raw NVIC priority of the encoder executor. The F411 implements the top
/// four bits, so only multiples of 16 are distinct levels.
pub const ENCODER_EXECUTOR_PRIORITY: u8 = 0x60;

/// Longest blocking section of the main loop: one full OLED flush.
///
/// Window command (address + control + 6 bytes) and 64 data writes of
/// address + control + 16 bytes, 9 bit times per byte at [`OLED_I2C_HZ`].
pub const OLED_FLUSH_STALL_US: u32 = 26_100;

/// Shortest spacing between two encoder edges on a fast hand spin.
pub const ENCODER_MIN_EDGE_US: u32 = 500;

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::display::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

    #[test]
    fn test_profile_matches_feature() {
        #[cfg(not(feature = "bench-profile"))]
        assert_eq!(PROFILE.timing().screensaver_ms, 300_000);
        #[cfg(feature = "bench-profile")]
        assert_eq!(PROFILE.timing().screensaver_ms, 3_000);
    }

    #[test]
    fn test_watchdog_outlasts_scheduler_period() {
        let period_us = u64::from(PROFILE.timing().scheduler_period_ms) * 1_000;
        assert!(u64::from(WATCHDOG_TIMEOUT_US) > period_us * 100);
    }

    #[test]
    fn test_flush_stall_matches_bus_arithmetic() {
        let framebuffer = DISPLAY_WIDTH * DISPLAY_HEIGHT / 8;
        let chunks = framebuffer / 16;
        let bytes = (2 + 6) + chunks * (2 + 16);
        let stall_us = u64::from(bytes) * 9 * 1_000_000 / u64::from(OLED_I2C_HZ);
        assert_eq!(stall_us, u64::from(OLED_FLUSH_STALL_US));
    }

    #[test]
    fn test_flush_stall_spans_many_encoder_edges() {
        // A thread-mode decoder would miss edges during a flush; the
        // interrupt executor is what keeps every transition.
        assert!(OLED_FLUSH_STALL_US / ENCODER_MIN_EDGE_US > 10);
        // The drain still happens well before the watchdog fires.
        assert!(OLED_FLUSH_STALL_US * 10 < WATCHDOG_TIMEOUT_US);
    }

    #[test]
    fn test_encoder_priority_is_a_real_nvic_level() {
        assert_eq!(ENCODER_EXECUTOR_PRIORITY % 16, 0);
        // 0xF0 is the lowest level; stay above it so later interrupts can
        // still be placed underneath.
        assert!(ENCODER_EXECUTOR_PRIORITY < 0xF0);
    }
}
