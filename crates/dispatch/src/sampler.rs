//! Debounced button sampler.
//!
//! Polled once per scheduler pass. Each button tracks a *candidate* level and
//! the instant it was first seen; the candidate replaces the stable level
//! only after it has held for the whole debounce window. Contact bounce
//! shorter than the window therefore never produces an edge, and a stuck
//! line simply never transitions.

use embassy_time::{Duration, Instant};
use heapless::Vec;
use platform::{ButtonEdge, ButtonLines, Control, Edge, BUTTON_COUNT};

/// Per-button debounce state.
#[derive(Debug, Clone, Copy)]
struct Debounce {
    stable: bool,
    candidate: bool,
    since: Instant,
}

impl Debounce {
    const RELEASED: Debounce = Debounce {
        stable: false,
        candidate: false,
        since: Instant::from_ticks(0),
    };
}

/// Stable-window debouncer for the five buttons.
pub struct Sampler {
    window: Duration,
    slots: [Debounce; BUTTON_COUNT],
}

impl Sampler {
    /// All buttons assumed released at startup.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            slots: [Debounce::RELEASED; BUTTON_COUNT],
        }
    }

    /// Read every line and return the edges accepted at `now`, in
    /// [`Control::ALL`] order.
    pub fn sample<L: ButtonLines>(&mut self, lines: &L, now: Instant) -> Vec<ButtonEdge, BUTTON_COUNT> {
        let mut edges = Vec::new();
        for (control, slot) in Control::ALL.into_iter().zip(self.slots.iter_mut()) {
            let raw = lines.is_pressed(control);
            if raw != slot.candidate {
                slot.candidate = raw;
                slot.since = now;
            }
            if slot.candidate != slot.stable
                && now.saturating_duration_since(slot.since) >= self.window
            {
                slot.stable = slot.candidate;
                let edge = if slot.stable {
                    Edge::Pressed
                } else {
                    Edge::Released
                };
                #[cfg(feature = "defmt")]
                defmt::trace!("edge {} {}", control, edge);
                // Cannot overflow: one edge per button per pass.
                let _ = edges.push(ButtonEdge {
                    control,
                    edge,
                    at: now,
                });
            }
        }
        edges
    }

    /// Debounced level of `control`.
    pub fn is_pressed(&self, control: Control) -> bool {
        self.slots
            .get(control.index())
            .is_some_and(|slot| slot.stable)
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
    use platform::mocks::MockLines;

    fn ms(n: u64) -> Instant {
        Instant::from_millis(n)
    }

    #[test]
    fn stable_press_is_reported_once_after_window() {
        let mut sampler = Sampler::new(Duration::from_millis(25));
        let mut lines = MockLines::new();
        lines.set(Control::Left, true);

        assert!(sampler.sample(&lines, ms(0)).is_empty());
        assert!(sampler.sample(&lines, ms(24)).is_empty());
        let edges = sampler.sample(&lines, ms(25));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].control, Control::Left);
        assert_eq!(edges[0].edge, Edge::Pressed);
        assert_eq!(edges[0].at, ms(25));
        assert!(sampler.sample(&lines, ms(100)).is_empty());
        assert!(sampler.is_pressed(Control::Left));
    }

    #[test]
    fn bounce_restarts_the_window() {
        let mut sampler = Sampler::new(Duration::from_millis(25));
        let mut lines = MockLines::new();

        lines.set(Control::Middle, true);
        assert!(sampler.sample(&lines, ms(0)).is_empty());
        lines.set(Control::Middle, false);
        assert!(sampler.sample(&lines, ms(10)).is_empty());
        lines.set(Control::Middle, true);
        assert!(sampler.sample(&lines, ms(20)).is_empty());
        // 30 ms after the first contact but only 10 ms after the last bounce.
        assert!(sampler.sample(&lines, ms(30)).is_empty());
        assert_eq!(sampler.sample(&lines, ms(45)).len(), 1);
    }

    #[test]
    fn release_edge_follows_press() {
        let mut sampler = Sampler::new(Duration::from_millis(5));
        let mut lines = MockLines::new();
        lines.set(Control::Down, true);
        sampler.sample(&lines, ms(0));
        assert_eq!(sampler.sample(&lines, ms(5))[0].edge, Edge::Pressed);
        lines.set(Control::Down, false);
        sampler.sample(&lines, ms(50));
        let edges = sampler.sample(&lines, ms(55));
        assert_eq!(edges[0].edge, Edge::Released);
        assert!(!sampler.is_pressed(Control::Down));
    }

    #[test]
    fn simultaneous_buttons_report_in_slot_order() {
        let mut sampler = Sampler::new(Duration::from_millis(0));
        let mut lines = MockLines::new();
        lines.set(Control::Down, true);
        lines.set(Control::Left, true);
        let edges = sampler.sample(&lines, ms(1));
        let order: Vec<Control, BUTTON_COUNT> = edges.iter().map(|e| e.control).collect();
        assert_eq!(order.as_slice(), &[Control::Left, Control::Down]);
    }
}
