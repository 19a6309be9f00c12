//! Property-based tests for the input stages.
//! Each property must hold for every generated input, not just the fixed
//! sequences in the unit tests.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use dispatch::{
    AccelDetector, ActionEmitter, ControlAction, ControlMode, HoldClass, ModeTable,
    QuadratureDecoder, Sampler, Target, TickAccumulator, TickHistory,
};
use embassy_time::{Duration, Instant};
use platform::hid::consumer;
use platform::mocks::{MockLines, MockTransport};
use platform::{Control, Direction, Keypress, TimingConfig};
use proptest::prelude::*;

static ACTION: ControlAction =
    ControlAction::new("+", &[Keypress::Consumer(consumer::VOLUME_UP)]);

static MODES: [ControlMode; 3] = [
    ControlMode::named("A", ""),
    ControlMode::named("B", ""),
    ControlMode::named("C", ""),
];

/// Pin levels for one half-detent starting from a rest position.
fn half_detent(high_rest: bool, clockwise: bool) -> [(bool, bool); 2] {
    match (high_rest, clockwise) {
        (true, true) => [(true, false), (false, false)],
        (true, false) => [(false, true), (false, false)],
        (false, true) => [(false, true), (true, true)],
        (false, false) => [(true, false), (true, true)],
    }
}

/// Step off rest and straight back, as a bouncing contact does.
fn wobble(high_rest: bool, clockwise: bool) -> [(bool, bool); 2] {
    let [off, _] = half_detent(high_rest, clockwise);
    [off, (high_rest, high_rest)]
}

proptest! {
    /// The net accumulated count equals clockwise minus counter-clockwise
    /// half-detents, whatever wobble happens between them.
    #[test]
    fn quadrature_net_equals_detents(
        moves in proptest::collection::vec((any::<bool>(), any::<Option<bool>>()), 0..200)
    ) {
        let mut decoder = QuadratureDecoder::new(true, true);
        let acc = TickAccumulator::new();
        let mut high = true;
        let mut expected: i16 = 0;

        for (clockwise, jitter) in moves {
            if let Some(dir) = jitter {
                for (a, b) in wobble(high, dir) {
                    if let Some(d) = decoder.process(a, b) {
                        acc.record(d);
                    }
                }
            }
            for (a, b) in half_detent(high, clockwise) {
                if let Some(d) = decoder.process(a, b) {
                    acc.record(d);
                }
            }
            high = !high;
            expected += if clockwise { 1 } else { -1 };
        }

        prop_assert_eq!(acc.drain(), expected);
        prop_assert!(decoder.at_rest());
    }

    /// Level changes that never hold for the debounce window produce no edge;
    /// once the line settles, at most one edge is reported.
    #[test]
    fn debounce_rejects_short_noise(
        gaps in proptest::collection::vec(1u64..25, 1..60),
        control_idx in 0usize..5,
    ) {
        let control = Control::ALL[control_idx];
        let mut sampler = Sampler::new(Duration::from_millis(25));
        let mut lines = MockLines::new();
        let mut level = false;
        let mut now = 0u64;

        for gap in gaps {
            level = !level;
            lines.set(control, level);
            for _ in 0..gap {
                prop_assert!(sampler.sample(&lines, Instant::from_millis(now)).is_empty());
                now += 1;
            }
        }

        let mut edges = 0usize;
        for _ in 0..100 {
            edges += sampler.sample(&lines, Instant::from_millis(now)).len();
            now += 1;
        }
        prop_assert_eq!(edges, usize::from(level));
        prop_assert_eq!(sampler.is_pressed(control), level);
    }

    /// Ticks spaced wide enough never accelerate; tight bursts accelerate
    /// from the trigger-th tick on.
    #[test]
    fn acceleration_depends_only_on_spacing(spacing in 1u64..200, count in 1usize..30) {
        let config = TimingConfig::RELEASE;
        let detector = AccelDetector::new(&config);
        let mut history = TickHistory::new();
        let trigger = usize::from(config.accel_trigger);
        let span_limit = u64::from(config.accel_window_ms);

        for i in 0..count {
            let at = Instant::from_millis(spacing * i as u64);
            let accelerated = detector.classify(&mut history, at);
            let burst = i + 1 >= trigger && spacing * (trigger as u64 - 1) < span_limit;
            prop_assert_eq!(accelerated, burst, "tick {} spacing {}", i, spacing);
        }
    }

    /// Any mode index resolves exactly like its wrapped counterpart.
    #[test]
    fn resolve_wraps_indices(index in 0usize..1000, control_idx in 0usize..5) {
        let table = ModeTable::new(&MODES).unwrap();
        let target = Target::Button(Control::ALL[control_idx]);
        let wrapped = index % MODES.len();
        prop_assert!(core::ptr::eq(table.resolve(index, target), table.resolve(wrapped, target)));
        prop_assert_eq!(table.mode(index).name, MODES[wrapped].name);
    }

    /// Whatever the emit pattern, keys are never asserted twice, every
    /// press is eventually released and every accepted action is pressed.
    #[test]
    fn emitter_never_overlaps(
        emits in proptest::collection::vec((0u64..50, any::<bool>()), 0..40)
    ) {
        let mut emitter = ActionEmitter::new(MockTransport::new(), &TimingConfig::RELEASE);
        let mut now = 0u64;
        let mut accepted = 0usize;
        for (gap, long) in emits {
            for _ in 0..gap {
                now += 1;
                emitter.poll(Instant::from_millis(now));
            }
            let hold = if long { HoldClass::Long } else { HoldClass::Regular };
            if emitter.emit(&ACTION, hold, Instant::from_millis(now)) {
                accepted += 1;
            }
        }
        while emitter.is_busy() {
            now += 1;
            emitter.poll(Instant::from_millis(now));
        }
        let hid = emitter.transport();
        prop_assert!(!hid.calls_overflowed());
        prop_assert!(!hid.overlap_detected());
        prop_assert_eq!(hid.press_count(), accepted);
        prop_assert_eq!(hid.press_count(), hid.release_count());
        prop_assert!(hid.held().is_empty());
    }
}

#[test]
fn wheel_direction_steps_are_signed() {
    assert_eq!(Direction::Clockwise.step(), 1);
    assert_eq!(Direction::CounterClockwise.step(), -1);
}
