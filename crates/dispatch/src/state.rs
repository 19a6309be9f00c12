//! Mutable runtime state of the engine.
//!
//! Owned by [`Engine`](crate::Engine) and passed by reference to the stage
//! that needs it. None of it is touched from interrupt context; the encoder
//! count lives in [`TickAccumulator`](crate::TickAccumulator).

use embassy_time::Instant;
use platform::{Control, BUTTON_COUNT};

use crate::accel::WheelHistory;

/// Whether a temporary mode override is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeActivity {
    /// No override
    Normal,
    /// Override active; reverts to `from` once `expires_at` has passed
    /// without activity.
    Toggled {
        /// Mode to restore
        from: usize,
        /// Revert deadline, pushed back by every input
        expires_at: Instant,
    },
}

/// Engine runtime state.
#[derive(Debug, Clone)]
pub struct RuntimeState {
    pub(crate) active_mode: usize,
    pub(crate) activity: ModeActivity,
    pub(crate) press_start: [Option<Instant>; BUTTON_COUNT],
    pub(crate) last_activity: Instant,
    pub(crate) idle: bool,
    pub(crate) wheel_history: WheelHistory,
}

impl RuntimeState {
    /// Fresh state on `active_mode`, with the idle timer starting at `now`.
    pub fn new(active_mode: usize, now: Instant) -> Self {
        Self {
            active_mode,
            activity: ModeActivity::Normal,
            press_start: [None; BUTTON_COUNT],
            last_activity: now,
            idle: false,
            wheel_history: WheelHistory::new(),
        }
    }

    /// Index of the active mode.
    pub fn active_mode(&self) -> usize {
        self.active_mode
    }

    /// Toggle-mode state.
    pub fn activity(&self) -> ModeActivity {
        self.activity
    }

    /// `true` while a temporary override is active.
    pub fn is_toggled(&self) -> bool {
        matches!(self.activity, ModeActivity::Toggled { .. })
    }

    /// `true` while the screensaver is on.
    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// Instant of the last button edge or encoder tick.
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// When `control` went down, if it is held.
    pub fn press_start(&self, control: Control) -> Option<Instant> {
        self.press_start.get(control.index()).copied().flatten()
    }
}
