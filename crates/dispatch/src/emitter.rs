//! Timed press/release of resolved actions.
//!
//! The emitter never blocks. [`ActionEmitter::emit`] asserts the keys at
//! once when nothing is held, otherwise queues the action; every
//! [`ActionEmitter::poll`] releases the held batch whose deadline has passed
//! and starts the next queued one. At most one batch is ever held, so
//! release always precedes the next press.
//!
//! An action identical to the last queued one (same keys, same hold) bumps
//! that entry's repeat count instead of taking a new slot, so a long wheel
//! burst drained in one pass occupies a single queue entry and every tick
//! still becomes its own press/release pair.
//!
//! # State machine
//!
//! ```text
//!          emit                       poll(now >= release_at)
//!   Idle ────────► Holding{keys} ───────────────────────────► Idle
//!                       │                                        │
//!                       └──── queue non-empty: start next ◄──────┘
//! ```

use embassy_time::{Duration, Instant};
use heapless::Deque;
use platform::{HidTransport, Keypress, TimingConfig};

use crate::mode::{ControlAction, HoldClass};

/// Actions waiting behind the held one.
pub const EMIT_QUEUE_LEN: usize = 16;

#[derive(Debug, Clone, Copy)]
struct Holding {
    keys: &'static [Keypress],
    release_at: Instant,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    keys: &'static [Keypress],
    hold: Duration,
    /// Press/release pairs still to issue, at least 1.
    repeats: u16,
}

impl Pending {
    fn absorb(&mut self, other: &Pending) -> bool {
        if self.hold != other.hold || self.keys != other.keys {
            return false;
        }
        match self.repeats.checked_add(other.repeats) {
            Some(repeats) => {
                self.repeats = repeats;
                true
            }
            None => false,
        }
    }
}

/// Deadline-driven key emitter over a [`HidTransport`].
pub struct ActionEmitter<T: HidTransport> {
    transport: T,
    regular: Duration,
    long: Duration,
    holding: Option<Holding>,
    queue: Deque<Pending, EMIT_QUEUE_LEN>,
}

impl<T: HidTransport> ActionEmitter<T> {
    /// Emitter using the configured key-down times.
    pub fn new(transport: T, config: &TimingConfig) -> Self {
        Self {
            transport,
            regular: config.key_down_regular(),
            long: config.key_down_long(),
            holding: None,
            queue: Deque::new(),
        }
    }

    /// Press `action`'s keys now, or queue them behind the held batch.
    ///
    /// No-op actions produce no transport calls. Returns `false` when
    /// nothing was scheduled: a no-op, or a full queue whose last entry is a
    /// different action.
    pub fn emit(&mut self, action: &'static ControlAction, hold: HoldClass, now: Instant) -> bool {
        if action.is_noop() {
            return false;
        }
        let pending = Pending {
            keys: action.keys,
            hold: match hold {
                HoldClass::Regular => self.regular,
                HoldClass::Long => self.long,
            },
            repeats: 1,
        };
        if self.holding.is_none() && self.queue.is_empty() {
            self.start(pending, now);
            return true;
        }
        if let Some(last) = self.queue.back_mut() {
            if last.absorb(&pending) {
                return true;
            }
        }
        if self.queue.push_back(pending).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("emit queue full, dropping {}", action.label);
            return false;
        }
        true
    }

    /// Release the held batch once its deadline is reached and start the
    /// next queued one.
    pub fn poll(&mut self, now: Instant) {
        if let Some(holding) = self.holding {
            if now < holding.release_at {
                return;
            }
            self.transport.release(holding.keys);
            self.holding = None;
        }
        let repeat = self.queue.front_mut().and_then(|front| {
            if front.repeats > 1 {
                front.repeats = front.repeats.saturating_sub(1);
                Some(*front)
            } else {
                None
            }
        });
        if let Some(next) = repeat.or_else(|| self.queue.pop_front()) {
            self.start(next, now);
        }
    }

    /// Release whatever is held right now and drop the queue.
    pub fn cancel(&mut self) {
        if let Some(holding) = self.holding.take() {
            self.transport.release(holding.keys);
        }
        self.queue.clear();
    }

    /// `true` while keys are held or actions are queued.
    pub fn is_busy(&self) -> bool {
        self.holding.is_some() || !self.queue.is_empty()
    }

    /// Release deadline of the held batch.
    pub fn release_at(&self) -> Option<Instant> {
        self.holding.map(|h| h.release_at)
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The underlying transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn start(&mut self, pending: Pending, now: Instant) {
        self.transport.press(pending.keys);
        self.holding = Some(Holding {
            keys: pending.keys,
            release_at: now.checked_add(pending.hold).unwrap_or(Instant::MAX),
        });
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
    use platform::hid::{consumer, keyboard};
    use platform::mocks::{HidCall, MockTransport};

    static VOL_UP: ControlAction =
        ControlAction::new("+", &[Keypress::Consumer(consumer::VOLUME_UP)]);
    static SEEK: ControlAction = ControlAction::new(
        "Seek",
        &[
            Keypress::Keyboard(keyboard::LEFT_CTRL),
            Keypress::Keyboard(keyboard::RIGHT_ARROW),
        ],
    );

    fn ms(n: u64) -> Instant {
        Instant::from_millis(n)
    }

    fn emitter() -> ActionEmitter<MockTransport> {
        ActionEmitter::new(MockTransport::new(), &TimingConfig::RELEASE)
    }

    #[test]
    fn press_then_release_after_hold() {
        let mut emitter = emitter();
        assert!(emitter.emit(&SEEK, HoldClass::Regular, ms(0)));
        assert_eq!(emitter.transport().press_count(), 1);

        emitter.poll(ms(9));
        assert_eq!(emitter.transport().release_count(), 0);
        emitter.poll(ms(10));
        assert_eq!(emitter.transport().release_count(), 1);
        assert!(emitter.transport().held().is_empty());
        assert!(!emitter.is_busy());
    }

    #[test]
    fn long_hold_uses_long_time() {
        let mut emitter = emitter();
        emitter.emit(&SEEK, HoldClass::Long, ms(100));
        assert_eq!(emitter.release_at(), Some(ms(800)));
        emitter.poll(ms(799));
        assert_eq!(emitter.transport().release_count(), 0);
        emitter.poll(ms(800));
        assert_eq!(emitter.transport().release_count(), 1);
    }

    #[test]
    fn queued_actions_never_overlap() {
        let mut emitter = emitter();
        for _ in 0..5 {
            assert!(emitter.emit(&VOL_UP, HoldClass::Regular, ms(0)));
        }
        assert_eq!(emitter.transport().press_count(), 1);
        for t in 1..=60 {
            emitter.poll(ms(t));
        }
        let hid = emitter.transport();
        assert_eq!(hid.press_count(), 5);
        assert_eq!(hid.release_count(), 5);
        assert!(!hid.overlap_detected());
        // Strict alternation.
        for pair in hid.calls().chunks(2) {
            assert!(matches!(pair, [HidCall::Press(_), HidCall::Release(_)]));
        }
    }

    #[test]
    fn noop_produces_no_calls() {
        let mut emitter = emitter();
        assert!(!emitter.emit(&ControlAction::NOOP, HoldClass::Long, ms(0)));
        emitter.poll(ms(1_000));
        assert!(emitter.transport().calls().is_empty());
    }

    #[test]
    fn full_queue_drops_extra_actions() {
        let mut emitter = emitter();
        emitter.emit(&VOL_UP, HoldClass::Regular, ms(0));
        // Alternate so no two neighbours merge.
        for i in 0..EMIT_QUEUE_LEN {
            let action = if i % 2 == 0 { &SEEK } else { &VOL_UP };
            assert!(emitter.emit(action, HoldClass::Regular, ms(0)));
        }
        assert!(!emitter.emit(&SEEK, HoldClass::Regular, ms(0)));
        // The same action as the last entry still fits.
        assert!(emitter.emit(&VOL_UP, HoldClass::Regular, ms(0)));
    }

    #[test]
    fn identical_burst_keeps_every_repeat() {
        let mut emitter = emitter();
        for _ in 0..40 {
            assert!(emitter.emit(&VOL_UP, HoldClass::Regular, ms(0)));
        }
        for t in 1..=500 {
            emitter.poll(ms(t));
        }
        let hid = emitter.transport();
        assert_eq!(hid.press_count(), 40);
        assert_eq!(hid.release_count(), 40);
        assert!(!hid.overlap_detected());
        assert!(!hid.calls_overflowed());
        assert!(!emitter.is_busy());
    }

    #[test]
    fn merging_preserves_order() {
        let mut emitter = emitter();
        emitter.emit(&VOL_UP, HoldClass::Regular, ms(0));
        emitter.emit(&SEEK, HoldClass::Regular, ms(0));
        emitter.emit(&VOL_UP, HoldClass::Regular, ms(0));
        emitter.emit(&VOL_UP, HoldClass::Regular, ms(0));
        // A different hold class is a different entry.
        emitter.emit(&VOL_UP, HoldClass::Long, ms(0));
        for t in 1..=2_000 {
            emitter.poll(ms(t));
        }
        let pressed: Vec<&[Keypress]> = emitter
            .transport()
            .calls()
            .iter()
            .filter_map(|call| match call {
                HidCall::Press(keys) => Some(keys.as_slice()),
                HidCall::Release(_) => None,
            })
            .collect();
        assert_eq!(
            pressed,
            [VOL_UP.keys, SEEK.keys, VOL_UP.keys, VOL_UP.keys, VOL_UP.keys]
        );
    }

    #[test]
    fn cancel_releases_held_keys() {
        let mut emitter = emitter();
        emitter.emit(&SEEK, HoldClass::Long, ms(0));
        emitter.emit(&VOL_UP, HoldClass::Regular, ms(0));
        emitter.cancel();
        assert!(emitter.transport().held().is_empty());
        assert!(!emitter.is_busy());
        emitter.poll(ms(1_000));
        assert_eq!(emitter.transport().press_count(), 1);
    }
}
