//! Input abstraction: physical controls, debounced edges, raw line access

use embassy_time::Instant;

/// Number of polled push buttons (including the encoder center click).
pub const BUTTON_COUNT: usize = 5;

/// Polled button lines.
///
/// Implementors report the *logical* level: `true` while the button is held.
/// Active-low inversion of pulled-up pins is the implementor's job.
pub trait ButtonLines {
    /// Raw (not debounced) state of `control`.
    fn is_pressed(&self, control: Control) -> bool;
}

/// Physical push buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Control {
    /// Left arrow button
    Left,
    /// Right arrow button
    Right,
    /// Encoder center click
    Middle,
    /// Up button (previous mode)
    Up,
    /// Down button (next mode)
    Down,
}

impl Control {
    /// All buttons in slot order.
    pub const ALL: [Control; BUTTON_COUNT] = [
        Control::Left,
        Control::Right,
        Control::Middle,
        Control::Up,
        Control::Down,
    ];

    /// Stable slot index in `0..BUTTON_COUNT`, used for per-button state arrays.
    pub const fn index(self) -> usize {
        match self {
            Control::Left => 0,
            Control::Right => 1,
            Control::Middle => 2,
            Control::Up => 3,
            Control::Down => 4,
        }
    }

    /// Short name for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Control::Left => "left",
            Control::Right => "right",
            Control::Middle => "middle",
            Control::Up => "up",
            Control::Down => "down",
        }
    }
}

/// Debounced button transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Button went down
    Pressed,
    /// Button went up
    Released,
}

/// A debounced edge as produced by the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEdge {
    /// Which button
    pub control: Control,
    /// Which transition
    pub edge: Edge,
    /// When the sampler accepted the transition
    pub at: Instant,
}

/// Encoder rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Clockwise (+1)
    Clockwise,
    /// Counter-clockwise (−1)
    CounterClockwise,
}

impl Direction {
    /// Signed unit step: +1 for clockwise, −1 for counter-clockwise.
    pub const fn step(self) -> i16 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
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
    fn control_indices_are_unique_and_dense() {
        let mut seen = [false; BUTTON_COUNT];
        for control in Control::ALL {
            let slot = seen.get_mut(control.index()).unwrap();
            assert!(!*slot, "duplicate index for {control:?}");
            *slot = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn direction_steps() {
        assert_eq!(Direction::Clockwise.step(), 1);
        assert_eq!(Direction::CounterClockwise.step(), -1);
    }
}
