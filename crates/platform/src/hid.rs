//! HID output abstraction
//!
//! The engine talks to the USB (or bridge) HID stack only through
//! [`HidTransport`], in batches: every key of an action is asserted in one
//! [`HidTransport::press`] call and released in one [`HidTransport::release`]
//! call. Key codes are opaque per category; [`Keypress`] keeps the three code
//! spaces apart so a keyboard code can never be mistaken for a consumer code.

use serde::{Deserialize, Serialize};

/// HID output transport.
///
/// Transport calls cannot fail from the engine's point of view; a transport
/// that loses its link simply drops reports.
pub trait HidTransport {
    /// Assert every key in `keys` (key-down).
    fn press(&mut self, keys: &[Keypress]);

    /// Release every key in `keys` (key-up).
    fn release(&mut self, keys: &[Keypress]);
}

/// One key of an action, tagged with its HID category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Keypress {
    /// Keyboard page usage ID (8-bit).
    Keyboard(u8),
    /// Consumer page usage ID (16-bit).
    Consumer(u16),
    /// Mouse button / scroll bitfield, see [`mouse`].
    Mouse(u8),
}

impl Keypress {
    /// Category name for logs.
    pub const fn category(self) -> &'static str {
        match self {
            Keypress::Keyboard(_) => "keyboard",
            Keypress::Consumer(_) => "consumer",
            Keypress::Mouse(_) => "mouse",
        }
    }
}

/// Keyboard page (0x07) usage IDs used by the shipped mode tables.
pub mod keyboard {
    /// `J`
    pub const J: u8 = 0x0D;
    /// `L`
    pub const L: u8 = 0x0F;
    /// Enter
    pub const ENTER: u8 = 0x28;
    /// Space bar
    pub const SPACE: u8 = 0x2C;
    /// `[`
    pub const LEFT_BRACE: u8 = 0x2F;
    /// `]`
    pub const RIGHT_BRACE: u8 = 0x30;
    /// Scroll Lock
    pub const SCROLL_LOCK: u8 = 0x47;
    /// Pause
    pub const PAUSE: u8 = 0x48;
    /// Page Up
    pub const PAGE_UP: u8 = 0x4B;
    /// Page Down
    pub const PAGE_DOWN: u8 = 0x4E;
    /// Right arrow
    pub const RIGHT_ARROW: u8 = 0x4F;
    /// Left arrow
    pub const LEFT_ARROW: u8 = 0x50;
    /// Left Control
    pub const LEFT_CTRL: u8 = 0xE0;
    /// Left GUI (Command / Windows)
    pub const LEFT_GUI: u8 = 0xE3;
}

/// Consumer page (0x0C) usage IDs used by the shipped mode tables.
pub mod consumer {
    /// Display brightness up
    pub const BRIGHTNESS_UP: u16 = 0x006F;
    /// Display brightness down
    pub const BRIGHTNESS_DOWN: u16 = 0x0070;
    /// Scan next track
    pub const SCAN_NEXT_TRACK: u16 = 0x00B5;
    /// Scan previous track
    pub const SCAN_PREVIOUS_TRACK: u16 = 0x00B6;
    /// Play / Pause
    pub const PLAY_PAUSE: u16 = 0x00CD;
    /// Mute
    pub const MUTE: u16 = 0x00E2;
    /// Volume increment
    pub const VOLUME_UP: u16 = 0x00E9;
    /// Volume decrement
    pub const VOLUME_DOWN: u16 = 0x00EA;
}

/// Mouse codes.
///
/// Bit 7 marks a mouse event; the remaining bits select one button or one
/// scroll direction.
pub mod mouse {
    /// Set on every mouse code.
    pub const EVENT: u8 = 0b1000_0000;
    /// Scroll down / towards the user.
    pub const SCROLL_POSITIVE: u8 = EVENT | 0b0100_0000;
    /// Scroll up / away from the user.
    pub const SCROLL_NEGATIVE: u8 = EVENT | 0b0010_0000;
    /// Left button
    pub const LEFT_CLICK: u8 = EVENT | 0b0001_0000;
    /// Right button
    pub const RIGHT_CLICK: u8 = EVENT | 0b0000_1000;
    /// Middle button
    pub const MIDDLE_CLICK: u8 = EVENT | 0b0000_0100;

    /// `true` for the two scroll codes.
    pub const fn is_scroll(code: u8) -> bool {
        code == SCROLL_POSITIVE || code == SCROLL_NEGATIVE
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;

    #[test]
    fn categories_do_not_compare_equal_across_code_spaces() {
        assert_ne!(Keypress::Keyboard(0x4F), Keypress::Mouse(0x4F));
        assert_ne!(Keypress::Consumer(0x4F), Keypress::Keyboard(0x4F));
    }

    #[test]
    fn mouse_codes_carry_event_bit() {
        for code in [
            mouse::SCROLL_POSITIVE,
            mouse::SCROLL_NEGATIVE,
            mouse::LEFT_CLICK,
            mouse::RIGHT_CLICK,
            mouse::MIDDLE_CLICK,
        ] {
            assert_eq!(code & mouse::EVENT, mouse::EVENT);
        }
    }

    #[test]
    fn only_scroll_codes_are_scroll() {
        assert!(mouse::is_scroll(mouse::SCROLL_POSITIVE));
        assert!(mouse::is_scroll(mouse::SCROLL_NEGATIVE));
        assert!(!mouse::is_scroll(mouse::LEFT_CLICK));
    }
}
