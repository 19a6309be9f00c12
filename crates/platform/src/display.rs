//! Display collaborator abstraction
//!
//! The engine never computes pixel positions. It hands the display a
//! [`DisplayFrame`] snapshot whenever something visible changed; the
//! collaborator owns fonts, line layout and justification.
//!
//! Labels may contain [`LINE_BREAK`] to request a multi-line rendering.

/// Line-break marker inside labels.
pub const LINE_BREAK: char = '\n';

/// Display collaborator
pub trait StatusDisplay {
    /// Replace what is on screen with `frame`.
    fn show(&mut self, frame: &DisplayFrame);
}

/// Everything the status screen shows, as plain borrowed labels.
///
/// All labels come from the static mode table, so the frame is `Copy` and
/// carries no allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayFrame {
    /// Active mode name
    pub mode_name: &'static str,
    /// What the wheel does in this mode
    pub wheel_name: &'static str,
    /// Left button label
    pub left: &'static str,
    /// Right button label
    pub right: &'static str,
    /// Middle (encoder click) label
    pub middle: &'static str,
    /// Counter-clockwise wheel label
    pub wheel_ccw: &'static str,
    /// Clockwise wheel label
    pub wheel_cw: &'static str,
    /// Transient feedback for the action just emitted
    pub last_action: Option<&'static str>,
    /// Screensaver active
    pub idle: bool,
    /// A temporary toggle-mode override is active
    pub toggled: bool,
}

impl DisplayFrame {
    /// Frame shown before the engine publishes its first real one.
    pub const BLANK: DisplayFrame = DisplayFrame {
        mode_name: "",
        wheel_name: "",
        left: "",
        right: "",
        middle: "",
        wheel_ccw: "",
        wheel_cw: "",
        last_action: None,
        idle: false,
        toggled: false,
    };

    /// Iterate the lines of `label`, split on [`LINE_BREAK`].
    pub fn lines(label: &str) -> core::str::Split<'_, char> {
        label.split(LINE_BREAK)
    }
}

impl Default for DisplayFrame {
    fn default() -> Self {
        Self::BLANK
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
    fn lines_split_on_marker() {
        let lines: Vec<&str> = DisplayFrame::lines("Play\nPause").collect();
        assert_eq!(lines, ["Play", "Pause"]);
    }

    #[test]
    fn single_line_label_is_one_line() {
        assert_eq!(DisplayFrame::lines("Mute").count(), 1);
    }
}
