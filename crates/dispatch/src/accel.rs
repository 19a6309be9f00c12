//! Wheel acceleration detection.
//!
//! Every drained encoder tick is stamped with the drain instant and pushed
//! into a small ring of recent tick times. A tick is *accelerated* when,
//! counting itself, at least `trigger` ticks fall inside the rolling window.
//!
//! Ticks are classified one by one in arrival order, so a burst that crosses
//! the trigger in the middle of a batch flags only the ticks at and after the
//! crossing. Ticks already classified are never revisited.

use embassy_time::{Duration, Instant};
use platform::config::MAX_ACCEL_TRIGGER;
use platform::{Direction, TimingConfig};

/// Fixed-capacity ring of recent tick instants.
///
/// When full, the oldest entry is overwritten.
#[derive(Debug, Clone)]
pub struct TickHistory<const N: usize> {
    buf: [Instant; N],
    /// Index of the next slot to write.
    write: usize,
    /// Number of valid entries.
    count: usize,
}

impl<const N: usize> TickHistory<N> {
    /// Empty history.
    pub const fn new() -> Self {
        Self {
            buf: [Instant::from_ticks(0); N],
            write: 0,
            count: 0,
        }
    }

    /// Record a tick at `at`.
    pub fn push(&mut self, at: Instant) {
        if let Some(slot) = self.buf.get_mut(self.write) {
            *slot = at;
        }
        self.write = self.write.wrapping_add(1).checked_rem(N).unwrap_or(0);
        self.count = self.count.saturating_add(1).min(N);
    }

    /// Ticks recorded no more than `window` before `now`.
    pub fn count_within(&self, now: Instant, window: Duration) -> usize {
        self.buf
            .iter()
            .take(self.count)
            .filter(|at| now.saturating_duration_since(**at) < window)
            .count()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.count
    }

    /// `true` when nothing was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.write = 0;
        self.count = 0;
    }
}

impl<const N: usize> Default for TickHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// History sized for the largest supported trigger.
pub type WheelHistory = TickHistory<MAX_ACCEL_TRIGGER>;

/// One classified encoder tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WheelTick {
    /// Rotation direction
    pub direction: Direction,
    /// Part of a burst
    pub accelerated: bool,
}

/// Burst-rate detector configuration.
#[derive(Debug, Clone, Copy)]
pub struct AccelDetector {
    window: Duration,
    trigger: usize,
}

impl AccelDetector {
    /// Detector using the configured window and trigger count.
    pub fn new(config: &TimingConfig) -> Self {
        Self {
            window: config.accel_window(),
            trigger: usize::from(config.accel_trigger).clamp(1, MAX_ACCEL_TRIGGER),
        }
    }

    /// Record one tick at `now` and classify it.
    pub fn classify(&self, history: &mut WheelHistory, now: Instant) -> bool {
        history.push(now);
        history.count_within(now, self.window) >= self.trigger
    }

    /// Expand a drained net count into individually classified ticks.
    pub fn ticks<'h>(
        &self,
        net: i16,
        history: &'h mut WheelHistory,
        now: Instant,
    ) -> WheelTicks<'h> {
        let direction = if net < 0 {
            Direction::CounterClockwise
        } else {
            Direction::Clockwise
        };
        WheelTicks {
            detector: *self,
            history,
            now,
            direction,
            remaining: net.unsigned_abs(),
        }
    }
}

/// Iterator returned by [`AccelDetector::ticks`].
pub struct WheelTicks<'h> {
    detector: AccelDetector,
    history: &'h mut WheelHistory,
    now: Instant,
    direction: Direction,
    remaining: u16,
}

impl Iterator for WheelTicks<'_> {
    type Item = WheelTick;

    fn next(&mut self) -> Option<WheelTick> {
        self.remaining = self.remaining.checked_sub(1)?;
        let accelerated = self.detector.classify(self.history, self.now);
        Some(WheelTick {
            direction: self.direction,
            accelerated,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::from(self.remaining);
        (n, Some(n))
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

    fn detector() -> AccelDetector {
        AccelDetector::new(&TimingConfig::RELEASE)
    }

    #[test]
    fn history_overwrites_oldest() {
        let mut history = TickHistory::<3>::new();
        for t in [0, 10, 20, 30] {
            history.push(ms(t));
        }
        assert_eq!(history.len(), 3);
        // 0 ms was overwritten; 10, 20, 30 remain and all fall in the window.
        assert_eq!(history.count_within(ms(30), Duration::from_millis(35)), 3);
    }

    #[test]
    fn fifth_tick_within_window_is_accelerated() {
        let detector = detector();
        let mut history = WheelHistory::new();
        let flags: Vec<bool> = [0, 50, 100, 150, 200]
            .into_iter()
            .map(|t| detector.classify(&mut history, ms(t)))
            .collect();
        assert_eq!(flags, [false, false, false, false, true]);
    }

    #[test]
    fn slow_ticks_never_accelerate() {
        let detector = detector();
        let mut history = WheelHistory::new();
        for i in 0..20 {
            assert!(!detector.classify(&mut history, ms(i * 100)));
        }
    }

    #[test]
    fn batch_crossing_flags_only_from_crossing() {
        let detector = detector();
        let mut history = WheelHistory::new();
        assert!(!detector.classify(&mut history, ms(0)));
        assert!(!detector.classify(&mut history, ms(10)));
        let flags: Vec<bool> = detector
            .ticks(4, &mut history, ms(20))
            .map(|t| t.accelerated)
            .collect();
        // Ticks 3 and 4 of the burst stay plain, 5 and 6 are accelerated.
        assert_eq!(flags, [false, false, true, true]);
    }

    #[test]
    fn negative_net_is_counter_clockwise() {
        let detector = detector();
        let mut history = WheelHistory::new();
        let ticks: Vec<WheelTick> = detector.ticks(-2, &mut history, ms(0)).collect();
        assert_eq!(ticks.len(), 2);
        assert!(ticks
            .iter()
            .all(|t| t.direction == Direction::CounterClockwise));
    }

    #[test]
    fn zero_net_yields_nothing() {
        let detector = detector();
        let mut history = WheelHistory::new();
        assert_eq!(detector.ticks(0, &mut history, ms(0)).count(), 0);
        assert!(history.is_empty());
    }
}
