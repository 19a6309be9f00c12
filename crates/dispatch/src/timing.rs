//! Press timing, idle timeout and toggle-mode expiry.
//!
//! The controller only measures. A release yields the raw press duration;
//! which threshold applies is decided later against the action bound to the
//! button, so this stage never needs the mode table.
//!
//! # Mode activity
//!
//! ```text
//!            toggle gesture                  expiry / re-toggle
//!   Normal ─────────────────► Toggled{from} ───────────────────► Normal
//! ```
//!
//! Every edge or encoder tick pushes the expiry back by the full window and
//! restarts the idle timer.

use embassy_time::{Duration, Instant};
use platform::{ButtonEdge, Control, Edge, TimingConfig};

use crate::state::{ModeActivity, RuntimeState};

/// A completed press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Press {
    /// Which button
    pub control: Control,
    /// How long it was held
    pub duration: Duration,
    /// Release instant
    pub at: Instant,
}

/// Transitions fired by [`TimingController::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerEvents {
    /// The screensaver just started.
    pub idle_entered: bool,
    /// The toggle override just expired; the restored mode index.
    pub toggle_expired: Option<usize>,
}

/// Idle and toggle timers.
#[derive(Debug, Clone, Copy)]
pub struct TimingController {
    screensaver: Duration,
    toggle_expiry: Duration,
}

impl TimingController {
    /// Controller using the configured windows.
    pub fn new(config: &TimingConfig) -> Self {
        Self {
            screensaver: config.screensaver(),
            toggle_expiry: config.toggle_expiry(),
        }
    }

    /// Account for a debounced edge. Returns the completed press on release.
    ///
    /// A release without a recorded press (button held through boot) yields
    /// nothing.
    pub fn on_edge(&self, state: &mut RuntimeState, edge: &ButtonEdge) -> Option<Press> {
        self.note_activity(state, edge.at);
        let slot = state.press_start.get_mut(edge.control.index())?;
        match edge.edge {
            Edge::Pressed => {
                *slot = Some(edge.at);
                None
            }
            Edge::Released => slot.take().map(|start| Press {
                control: edge.control,
                duration: edge.at.saturating_duration_since(start),
                at: edge.at,
            }),
        }
    }

    /// Restart the idle timer and push back a pending toggle expiry.
    ///
    /// Returns `true` if this woke the device from the screensaver.
    pub fn note_activity(&self, state: &mut RuntimeState, now: Instant) -> bool {
        state.last_activity = now;
        if let ModeActivity::Toggled { from, .. } = state.activity {
            state.activity = ModeActivity::Toggled {
                from,
                expires_at: self.expiry_from(now),
            };
        }
        let woke = state.idle;
        state.idle = false;
        woke
    }

    /// Enter toggle mode: remember `state.active_mode` and switch to `to`.
    pub fn enter_toggle(&self, state: &mut RuntimeState, to: usize, now: Instant) {
        state.activity = ModeActivity::Toggled {
            from: state.active_mode,
            expires_at: self.expiry_from(now),
        };
        state.active_mode = to;
    }

    /// Leave toggle mode explicitly. Returns the restored index, if toggled.
    pub fn leave_toggle(&self, state: &mut RuntimeState) -> Option<usize> {
        match state.activity {
            ModeActivity::Toggled { from, .. } => {
                state.activity = ModeActivity::Normal;
                state.active_mode = from;
                Some(from)
            }
            ModeActivity::Normal => None,
        }
    }

    /// Compare the timers against `now`. Each transition fires once.
    pub fn tick(&self, state: &mut RuntimeState, now: Instant) -> TimerEvents {
        let mut events = TimerEvents::default();

        if let ModeActivity::Toggled { expires_at, .. } = state.activity {
            if now > expires_at {
                events.toggle_expired = self.leave_toggle(state);
            }
        }

        if !state.idle && now.saturating_duration_since(state.last_activity) > self.screensaver {
            state.idle = true;
            events.idle_entered = true;
        }

        events
    }

    fn expiry_from(&self, now: Instant) -> Instant {
        now.checked_add(self.toggle_expiry).unwrap_or(Instant::MAX)
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

    fn ms(n: u64) -> Instant {
        Instant::from_millis(n)
    }

    fn edge(control: Control, edge: Edge, at: u64) -> ButtonEdge {
        ButtonEdge {
            control,
            edge,
            at: ms(at),
        }
    }

    fn controller() -> TimingController {
        TimingController::new(&TimingConfig::RELEASE)
    }

    #[test]
    fn release_reports_duration() {
        let timing = controller();
        let mut state = RuntimeState::new(0, ms(0));
        assert_eq!(timing.on_edge(&mut state, &edge(Control::Left, Edge::Pressed, 100)), None);
        assert_eq!(state.press_start(Control::Left), Some(ms(100)));
        let press = timing
            .on_edge(&mut state, &edge(Control::Left, Edge::Released, 350))
            .unwrap();
        assert_eq!(press.control, Control::Left);
        assert_eq!(press.duration, Duration::from_millis(250));
        assert_eq!(state.press_start(Control::Left), None);
    }

    #[test]
    fn orphan_release_is_ignored() {
        let timing = controller();
        let mut state = RuntimeState::new(0, ms(0));
        assert_eq!(timing.on_edge(&mut state, &edge(Control::Up, Edge::Released, 10)), None);
        // Still counts as activity.
        assert_eq!(state.last_activity(), ms(10));
    }

    #[test]
    fn toggle_expires_exactly_once() {
        let timing = controller();
        let mut state = RuntimeState::new(2, ms(0));
        timing.enter_toggle(&mut state, 3, ms(0));
        assert_eq!(state.active_mode(), 3);

        assert_eq!(timing.tick(&mut state, ms(10_000)).toggle_expired, None);
        assert_eq!(timing.tick(&mut state, ms(10_001)).toggle_expired, Some(2));
        assert_eq!(state.active_mode(), 2);
        assert_eq!(timing.tick(&mut state, ms(10_002)).toggle_expired, None);
        assert_eq!(timing.tick(&mut state, ms(30_000)).toggle_expired, None);
    }

    #[test]
    fn activity_postpones_toggle_expiry() {
        let timing = controller();
        let mut state = RuntimeState::new(0, ms(0));
        timing.enter_toggle(&mut state, 1, ms(0));
        timing.note_activity(&mut state, ms(9_000));
        assert_eq!(timing.tick(&mut state, ms(10_001)).toggle_expired, None);
        assert_eq!(timing.tick(&mut state, ms(19_001)).toggle_expired, Some(0));
    }

    #[test]
    fn explicit_leave_restores_mode() {
        let timing = controller();
        let mut state = RuntimeState::new(4, ms(0));
        timing.enter_toggle(&mut state, 0, ms(0));
        assert_eq!(timing.leave_toggle(&mut state), Some(4));
        assert!(!state.is_toggled());
        assert_eq!(timing.leave_toggle(&mut state), None);
    }

    #[test]
    fn idle_fires_once_and_activity_wakes() {
        let timing = controller();
        let mut state = RuntimeState::new(0, ms(0));
        assert!(!timing.tick(&mut state, ms(300_000)).idle_entered);
        assert!(timing.tick(&mut state, ms(300_001)).idle_entered);
        assert!(!timing.tick(&mut state, ms(400_000)).idle_entered);
        assert!(state.is_idle());
        assert!(timing.note_activity(&mut state, ms(400_001)));
        assert!(!state.is_idle());
    }

    #[test]
    fn late_activity_prevents_idle() {
        let timing = controller();
        let mut state = RuntimeState::new(0, ms(0));
        timing.on_edge(&mut state, &edge(Control::Right, Edge::Pressed, 299_999));
        assert!(!timing.tick(&mut state, ms(300_000)).idle_entered);
        assert!(!state.is_idle());
    }
}
