//! Timing configuration and build profiles
//!
//! Every tunable time constant of the engine lives in [`TimingConfig`]. The
//! firmware picks one [`Profile`] at build time and never mutates the
//! configuration afterwards.
//!
//! | Field | Release | Bench |
//! |---|---|---|
//! | `debounce_ms` | 25 | 25 |
//! | `key_down_regular_ms` | 10 | 10 |
//! | `key_down_long_ms` | 700 | 700 |
//! | `long_press_ms` | 700 | 700 |
//! | `toggle_expiry_ms` | 10 000 | 10 000 |
//! | `screensaver_ms` | 300 000 | 3 000 |
//! | `accel_window_ms` / `accel_trigger` | 250 / 5 | 250 / 5 |

use embassy_time::Duration;

/// Upper bound for [`TimingConfig::accel_trigger`]; sizes the tick history.
pub const MAX_ACCEL_TRIGGER: usize = 16;

/// Deployment profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Profile {
    /// Shipping timings.
    Release,
    /// Bench bring-up: screensaver after a few seconds.
    Bench,
}

impl Profile {
    /// Timing set for this profile.
    pub const fn timing(self) -> TimingConfig {
        match self {
            Profile::Release => TimingConfig::RELEASE,
            Profile::Bench => TimingConfig::BENCH,
        }
    }
}

/// Engine timing constants, all in milliseconds unless noted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    /// A raw button level must stay stable this long before it counts.
    pub debounce_ms: u32,
    /// Key-down time of a regular action.
    pub key_down_regular_ms: u32,
    /// Key-down time of a long-hold action pressed for `long_press_ms`.
    pub key_down_long_ms: u32,
    /// Press duration at or above which a press is "long".
    pub long_press_ms: u32,
    /// Inactivity after which a toggled mode reverts.
    pub toggle_expiry_ms: u32,
    /// Inactivity after which the screensaver starts.
    pub screensaver_ms: u32,
    /// Rolling window for wheel acceleration.
    pub accel_window_ms: u32,
    /// Ticks inside the window that make a tick accelerated (1..=16).
    pub accel_trigger: u8,
    /// Total number of times the plain wheel action is sent for one
    /// accelerated tick when the mode has no dedicated fast action. `1`
    /// sends it once, like an ordinary tick.
    pub accel_repeat: u8,
    /// How long the last action label stays on screen.
    pub feedback_ms: u32,
    /// Main loop period.
    pub scheduler_period_ms: u32,
    /// Mode index at startup (wrapped into range).
    pub default_mode: usize,
    /// Lines scrolled per mouse wheel code.
    pub mouse_scroll_amount: i8,
}

impl TimingConfig {
    /// Shipping timings.
    pub const RELEASE: TimingConfig = TimingConfig {
        debounce_ms: 25,
        key_down_regular_ms: 10,
        key_down_long_ms: 700,
        long_press_ms: 700,
        toggle_expiry_ms: 10_000,
        screensaver_ms: 300_000,
        accel_window_ms: 250,
        accel_trigger: 5,
        accel_repeat: 1,
        feedback_ms: 1_000,
        scheduler_period_ms: 1,
        default_mode: 1,
        mouse_scroll_amount: 5,
    };

    /// Release timings with a three-second screensaver.
    pub const BENCH: TimingConfig = TimingConfig {
        screensaver_ms: 3_000,
        ..Self::RELEASE
    };

    /// Debounce window.
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms as u64)
    }

    /// Regular key-down time.
    pub const fn key_down_regular(&self) -> Duration {
        Duration::from_millis(self.key_down_regular_ms as u64)
    }

    /// Long key-down time.
    pub const fn key_down_long(&self) -> Duration {
        Duration::from_millis(self.key_down_long_ms as u64)
    }

    /// Long-press threshold.
    pub const fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms as u64)
    }

    /// Toggle-mode expiry window.
    pub const fn toggle_expiry(&self) -> Duration {
        Duration::from_millis(self.toggle_expiry_ms as u64)
    }

    /// Screensaver timeout.
    pub const fn screensaver(&self) -> Duration {
        Duration::from_millis(self.screensaver_ms as u64)
    }

    /// Acceleration window.
    pub const fn accel_window(&self) -> Duration {
        Duration::from_millis(self.accel_window_ms as u64)
    }

    /// Feedback label lifetime.
    pub const fn feedback(&self) -> Duration {
        Duration::from_millis(self.feedback_ms as u64)
    }

    /// Main loop period.
    pub const fn scheduler_period(&self) -> Duration {
        Duration::from_millis(self.scheduler_period_ms as u64)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::RELEASE
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
    fn bench_only_shortens_screensaver() {
        let bench = Profile::Bench.timing();
        assert_eq!(bench.screensaver_ms, 3_000);
        assert_eq!(
            TimingConfig {
                screensaver_ms: TimingConfig::RELEASE.screensaver_ms,
                ..bench
            },
            TimingConfig::RELEASE
        );
    }

    #[test]
    fn release_trigger_fits_history() {
        assert!(usize::from(TimingConfig::RELEASE.accel_trigger) <= MAX_ACCEL_TRIGGER);
    }

    #[test]
    fn durations_match_millis() {
        let cfg = TimingConfig::RELEASE;
        assert_eq!(cfg.key_down_long().as_millis(), 700);
        assert_eq!(cfg.toggle_expiry().as_millis(), 10_000);
    }
}
