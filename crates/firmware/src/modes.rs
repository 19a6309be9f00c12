//! The mode table shipped with the device.
//!
//! Startup mode is `TimingConfig::default_mode` (1, "Media").

use dispatch::{Binding, ConfigError, ControlMode, ModeTable};
use platform::hid::Keypress::{Consumer, Keyboard, Mouse};
use platform::hid::{consumer, keyboard, mouse};

/// All modes, in navigation order.
pub static MODES: [ControlMode; 6] = [
    ControlMode {
        middle: Binding::keys("Mute", &[Consumer(consumer::MUTE)]),
        wheel_ccw: Binding::keys("-", &[Consumer(consumer::VOLUME_DOWN)]),
        wheel_cw: Binding::keys("+", &[Consumer(consumer::VOLUME_UP)]),
        ..ControlMode::named("Volume", "Volume")
    },
    ControlMode {
        left: Binding::keys("Prev\n<<", &[Consumer(consumer::SCAN_PREVIOUS_TRACK)]),
        right: Binding::keys("Next\n>>", &[Consumer(consumer::SCAN_NEXT_TRACK)]),
        middle: Binding::keys("Play\nPause", &[Consumer(consumer::PLAY_PAUSE)]),
        wheel_ccw: Binding::keys("-", &[Consumer(consumer::VOLUME_DOWN)]),
        wheel_cw: Binding::keys("+", &[Consumer(consumer::VOLUME_UP)]),
        ..ControlMode::named("Media", "Volume")
    },
    ControlMode {
        left: Binding::keys("Prev\n<<", &[Keyboard(keyboard::LEFT_GUI), Keyboard(keyboard::LEFT_ARROW)]),
        right: Binding::keys("Next\n>>", &[Keyboard(keyboard::LEFT_GUI), Keyboard(keyboard::RIGHT_ARROW)]),
        middle: Binding::keys("Play\nPause", &[Keyboard(keyboard::SPACE)]),
        wheel_ccw: Binding::keys(
            "<",
            &[Keyboard(keyboard::LEFT_CTRL), Keyboard(keyboard::LEFT_GUI), Keyboard(keyboard::LEFT_ARROW)],
        ),
        wheel_cw: Binding::keys(
            ">",
            &[Keyboard(keyboard::LEFT_CTRL), Keyboard(keyboard::LEFT_GUI), Keyboard(keyboard::RIGHT_ARROW)],
        ),
        wheel_ccw_fast: Binding::keys("<<", &[Keyboard(keyboard::LEFT_ARROW)]),
        wheel_cw_fast: Binding::keys(">>", &[Keyboard(keyboard::RIGHT_ARROW)]),
        ..ControlMode::named("VLC", "Scrub")
    },
    ControlMode {
        left: Binding::keys("Seek\n<<", &[Keyboard(keyboard::J)]),
        right: Binding::keys("Seek\n>>", &[Keyboard(keyboard::L)]),
        middle: Binding::keys("Play\nPause", &[Keyboard(keyboard::SPACE)]),
        wheel_ccw: Binding::keys("<", &[Keyboard(keyboard::LEFT_ARROW)]),
        wheel_cw: Binding::keys(">", &[Keyboard(keyboard::RIGHT_ARROW)]),
        ..ControlMode::named("YouTube", "Scrub")
    },
    ControlMode {
        left: Binding::keys("Left\nBtn", &[Mouse(mouse::LEFT_CLICK)]),
        right: Binding::keys("Right\nBtn", &[Mouse(mouse::RIGHT_CLICK)]),
        middle: Binding::keys("Mid\nBtn", &[Mouse(mouse::MIDDLE_CLICK)]),
        wheel_ccw: Binding::keys("^", &[Mouse(mouse::SCROLL_NEGATIVE)]),
        wheel_cw: Binding::keys("_", &[Mouse(mouse::SCROLL_POSITIVE)]),
        ..ControlMode::named("Mouse", "Scroll")
    },
    ControlMode {
        // External display brightness via the host's key bindings.
        left: Binding::keys("Ext\n-", &[Keyboard(keyboard::SCROLL_LOCK)]),
        right: Binding::keys("Ext\n+", &[Keyboard(keyboard::PAUSE)]),
        wheel_ccw: Binding::keys("-", &[Consumer(consumer::BRIGHTNESS_DOWN)]),
        wheel_cw: Binding::keys("+", &[Consumer(consumer::BRIGHTNESS_UP)]),
        ..ControlMode::named("System", "Bright")
    },
];

/// Validate [`MODES`].
pub fn table() -> Result<ModeTable, ConfigError> {
    ModeTable::new(&MODES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch::Target;
    use platform::{Control, Direction, TimingConfig};

    #[test]
    fn test_shipped_table_validates() {
        let table = table().unwrap();
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn test_default_mode_is_media() {
        let table = table().unwrap();
        assert_eq!(table.mode(TimingConfig::RELEASE.default_mode).name, "Media");
    }

    #[test]
    fn test_only_vlc_has_fast_wheel() {
        let table = table().unwrap();
        for index in 0..table.len() {
            let fast = table.has_fast_wheel(index, Direction::Clockwise);
            assert_eq!(fast, MODES[index].name == "VLC", "mode {index}");
        }
    }

    #[test]
    fn test_system_middle_is_unbound() {
        let table = table().unwrap();
        assert!(table.resolve(5, Target::Button(Control::Middle)).is_noop());
    }
}
