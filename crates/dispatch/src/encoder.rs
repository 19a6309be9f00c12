//! Quadrature encoder decoding and the interrupt-shared tick accumulator.
//!
//! # Decoder
//!
//! [`QuadratureDecoder`] is a half-step lookup table over six states and the
//! four possible pin levels. It emits one tick every time the channels reach
//! a rest position (`A = B`) coming from the correct side, so one detent of
//! a half-step encoder is two raw transitions:
//!
//! ```text
//!  (A,B):  11 ─► 10 ─► 00 ─► 01 ─► 11      clockwise, tick at 00 and at 11
//!  (A,B):  11 ─► 01 ─► 00 ─► 10 ─► 11      counter-clockwise
//!  (A,B):  11 ─► 10 ─► 11                  reversal mid-detent, no tick
//! ```
//!
//! Invalid jumps (both channels changing at once) fall back to a rest state
//! without emitting. Every call is O(1) with no branches on history length.
//!
//! # Accumulator
//!
//! [`TickAccumulator`] is the only object written from interrupt context. It
//! holds an `i16` net count inside an `embassy_sync` blocking mutex backed by
//! [`CriticalSectionRawMutex`], so both [`record`](TickAccumulator::record)
//! and the read-and-clear [`drain`](TickAccumulator::drain) run with
//! interrupts masked for a handful of instructions.
//!
//! Width: ±32 767 ticks between two drains. At the default 1 ms scheduler
//! period that is ~32 M ticks/s, far above the ~1 k transitions/s a
//! mechanical encoder produces. The count saturates instead of wrapping.
//!
//! # Stalls
//!
//! The decoder has to see every transition: skipping the intermediate state
//! of a detent loses it. It therefore runs at interrupt priority, and only
//! the drain lives in the main loop. The longest gap between two drains is
//! one blocking OLED flush, about 26 ms at 400 kHz I2C, during which a fast
//! spin records a few dozen ticks; they are all handed over by the next
//! drain.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use platform::Direction;

// Decoder states. Rest positions: START (A=B=1), START_M (A=B=0).
const R_START: u8 = 0x0;
const R_CW_BEGIN: u8 = 0x1;
const R_CCW_BEGIN: u8 = 0x2;
const R_START_M: u8 = 0x3;
const R_CW_BEGIN_M: u8 = 0x4;
const R_CCW_BEGIN_M: u8 = 0x5;

// Emission flags or'ed into the next state.
const DIR_CW: u8 = 0x10;
const DIR_CCW: u8 = 0x20;
const STATE_MASK: u8 = 0x0F;
const DIR_MASK: u8 = 0x30;

/// `TRANSITIONS[state][pins]` where `pins = B << 1 | A`.
const TRANSITIONS: [[u8; 4]; 6] = [
    // R_START
    [R_START_M, R_CW_BEGIN, R_CCW_BEGIN, R_START],
    // R_CW_BEGIN
    [R_START_M | DIR_CW, R_CW_BEGIN, R_START, R_START],
    // R_CCW_BEGIN
    [R_START_M | DIR_CCW, R_START, R_CCW_BEGIN, R_START],
    // R_START_M
    [R_START_M, R_CCW_BEGIN_M, R_CW_BEGIN_M, R_START],
    // R_CW_BEGIN_M
    [R_START_M, R_START_M, R_CW_BEGIN_M, R_START | DIR_CW],
    // R_CCW_BEGIN_M
    [R_START_M, R_CCW_BEGIN_M, R_START_M, R_START | DIR_CCW],
];

/// Half-step quadrature state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadratureDecoder {
    state: u8,
}

impl QuadratureDecoder {
    /// Decoder seeded from the current channel levels, so the first
    /// transition after power-up is read from the right rest position.
    pub const fn new(a: bool, b: bool) -> Self {
        let state = if !a && !b { R_START_M } else { R_START };
        Self { state }
    }

    /// Feed the channel levels after an edge on either channel.
    pub fn process(&mut self, a: bool, b: bool) -> Option<Direction> {
        let pins = usize::from(u8::from(b) << 1 | u8::from(a));
        let next = TRANSITIONS
            .get(usize::from(self.state & STATE_MASK))
            .and_then(|row| row.get(pins))
            .copied()
            .unwrap_or(R_START);
        self.state = next & STATE_MASK;
        match next & DIR_MASK {
            DIR_CW => Some(Direction::Clockwise),
            DIR_CCW => Some(Direction::CounterClockwise),
            _ => None,
        }
    }

    /// `true` while the channels sit at a rest position.
    pub fn at_rest(&self) -> bool {
        self.state == R_START || self.state == R_START_M
    }
}

/// Net encoder ticks between two drains, shared with interrupt context.
///
/// Declare it as a `static` and hand `&'static` references to the encoder
/// task and to the engine:
///
/// ```
/// use dispatch::TickAccumulator;
///
/// static ENCODER_TICKS: TickAccumulator = TickAccumulator::new();
/// ```
pub struct TickAccumulator {
    net: Mutex<CriticalSectionRawMutex, Cell<i16>>,
}

impl TickAccumulator {
    /// Zeroed accumulator, usable in a `static` initialiser.
    pub const fn new() -> Self {
        Self {
            net: Mutex::new(Cell::new(0)),
        }
    }

    /// Add one tick (interrupt side). Saturates at the `i16` range.
    pub fn record(&self, direction: Direction) {
        self.net
            .lock(|net| net.set(net.get().saturating_add(direction.step())));
    }

    /// Take the net count and reset it to zero in one critical section
    /// (polling side).
    pub fn drain(&self) -> i16 {
        self.net.lock(|net| net.replace(0))
    }
}

impl Default for TickAccumulator {
    fn default() -> Self {
        Self::new()
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

    const CW_CYCLE: [(bool, bool); 4] = [(true, false), (false, false), (false, true), (true, true)];
    const CCW_CYCLE: [(bool, bool); 4] = [(false, true), (false, false), (true, false), (true, true)];

    fn feed(decoder: &mut QuadratureDecoder, steps: &[(bool, bool)]) -> i16 {
        steps
            .iter()
            .filter_map(|&(a, b)| decoder.process(a, b))
            .map(Direction::step)
            .sum()
    }

    #[test]
    fn clockwise_cycle_is_two_ticks() {
        let mut decoder = QuadratureDecoder::new(true, true);
        assert_eq!(feed(&mut decoder, &CW_CYCLE), 2);
        assert!(decoder.at_rest());
    }

    #[test]
    fn counter_clockwise_cycle_is_two_negative_ticks() {
        let mut decoder = QuadratureDecoder::new(true, true);
        assert_eq!(feed(&mut decoder, &CCW_CYCLE), -2);
    }

    #[test]
    fn reversal_mid_detent_cancels() {
        let mut decoder = QuadratureDecoder::new(true, true);
        assert_eq!(feed(&mut decoder, &[(true, false), (true, true)]), 0);
        assert_eq!(feed(&mut decoder, &[(false, true), (true, true)]), 0);
        assert!(decoder.at_rest());
    }

    #[test]
    fn invalid_double_jump_emits_nothing() {
        let mut decoder = QuadratureDecoder::new(true, true);
        assert_eq!(decoder.process(false, false), None);
        assert!(decoder.at_rest());
    }

    #[test]
    fn decoder_seeded_at_low_rest() {
        // Resting at 00: a clockwise half-detent 00 → 01 → 11 yields one tick.
        let mut decoder = QuadratureDecoder::new(false, false);
        assert_eq!(feed(&mut decoder, &[(false, true), (true, true)]), 1);
    }

    #[test]
    fn skipped_intermediate_states_lose_the_detent() {
        // A decoder starved of CPU sees only every other level.
        let mut decoder = QuadratureDecoder::new(true, true);
        let sparse: Vec<(bool, bool)> = CW_CYCLE.iter().copied().skip(1).step_by(2).collect();
        assert_eq!(sparse, [(false, false), (true, true)]);
        assert_eq!(feed(&mut decoder, &sparse), 0);
    }

    #[test]
    fn every_transition_during_a_flush_stall_reaches_the_drain() {
        // 26 ms without a drain, edges 500 µs apart: 52 transitions.
        let acc = TickAccumulator::new();
        let mut decoder = QuadratureDecoder::new(true, true);
        for &(a, b) in CW_CYCLE.iter().cycle().take(52) {
            if let Some(direction) = decoder.process(a, b) {
                acc.record(direction);
            }
        }
        assert_eq!(acc.drain(), 26);
    }

    #[test]
    fn drain_reads_and_clears() {
        let acc = TickAccumulator::new();
        acc.record(Direction::Clockwise);
        acc.record(Direction::Clockwise);
        acc.record(Direction::CounterClockwise);
        assert_eq!(acc.drain(), 1);
        assert_eq!(acc.drain(), 0);
    }

    #[test]
    fn accumulator_saturates() {
        let acc = TickAccumulator::new();
        for _ in 0..40_000 {
            acc.record(Direction::Clockwise);
        }
        assert_eq!(acc.drain(), i16::MAX);
    }
}
