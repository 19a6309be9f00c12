//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform traits
//! for use in unit and integration tests.

#![cfg(any(test, feature = "std"))]

use crate::*;

/// Mock button lines: levels are set directly by the test.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockLines {
    pressed: [bool; BUTTON_COUNT],
}

impl MockLines {
    /// All buttons released.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw level of `control`.
    pub fn set(&mut self, control: Control, pressed: bool) {
        if let Some(slot) = self.pressed.get_mut(control.index()) {
            *slot = pressed;
        }
    }
}

impl ButtonLines for MockLines {
    fn is_pressed(&self, control: Control) -> bool {
        self.pressed.get(control.index()).copied().unwrap_or(false)
    }
}

/// Maximum keys recorded per batch (matches the action key limit).
pub const MOCK_BATCH: usize = 4;

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HidCall {
    /// `press` batch
    Press(heapless::Vec<Keypress, MOCK_BATCH>),
    /// `release` batch
    Release(heapless::Vec<Keypress, MOCK_BATCH>),
}

/// Calls a [`MockTransport`] can record.
pub const MOCK_CALLS: usize = 128;

/// Mock HID transport recording every batch.
#[derive(Debug, Default)]
pub struct MockTransport {
    calls: heapless::Vec<HidCall, MOCK_CALLS>,
    held: heapless::Vec<Keypress, 16>,
    overlap_detected: bool,
    calls_overflowed: bool,
}

impl MockTransport {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> &[HidCall] {
        &self.calls
    }

    /// Number of `press` batches so far.
    pub fn press_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HidCall::Press(_)))
            .count()
    }

    /// Number of `release` batches so far.
    pub fn release_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HidCall::Release(_)))
            .count()
    }

    /// Keys currently asserted and not yet released.
    pub fn held(&self) -> &[Keypress] {
        &self.held
    }

    /// `true` if a key was pressed while it was already held, or released
    /// while not held.
    pub fn overlap_detected(&self) -> bool {
        self.overlap_detected
    }

    /// `true` once a call arrived after the recorder was full. Counts and
    /// [`MockTransport::calls`] are then short of what was sent.
    pub fn calls_overflowed(&self) -> bool {
        self.calls_overflowed
    }

    /// Forget all recorded calls (held state is kept).
    pub fn clear(&mut self) {
        self.calls.clear();
        self.calls_overflowed = false;
    }

    fn record(&mut self, call: HidCall) {
        if self.calls.push(call).is_err() {
            self.calls_overflowed = true;
        }
    }

    fn batch(keys: &[Keypress]) -> heapless::Vec<Keypress, MOCK_BATCH> {
        keys.iter().take(MOCK_BATCH).copied().collect()
    }
}

impl HidTransport for MockTransport {
    fn press(&mut self, keys: &[Keypress]) {
        for key in keys {
            if self.held.contains(key) {
                self.overlap_detected = true;
            } else {
                let _ = self.held.push(*key);
            }
        }
        self.record(HidCall::Press(Self::batch(keys)));
    }

    fn release(&mut self, keys: &[Keypress]) {
        for key in keys {
            match self.held.iter().position(|k| k == key) {
                Some(pos) => {
                    self.held.swap_remove(pos);
                }
                None => self.overlap_detected = true,
            }
        }
        self.record(HidCall::Release(Self::batch(keys)));
    }
}

/// Mock display keeping the last frame and a frame counter.
#[derive(Debug, Default)]
pub struct MockDisplay {
    last: Option<DisplayFrame>,
    frames: usize,
}

impl MockDisplay {
    /// Nothing shown yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last frame shown.
    pub fn last(&self) -> Option<&DisplayFrame> {
        self.last.as_ref()
    }

    /// Number of frames shown.
    pub fn frame_count(&self) -> usize {
        self.frames
    }
}

impl StatusDisplay for MockDisplay {
    fn show(&mut self, frame: &DisplayFrame) {
        self.last = Some(*frame);
        self.frames = self.frames.saturating_add(1);
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
    fn mock_lines_reports_set_levels() {
        let mut lines = MockLines::new();
        lines.set(Control::Middle, true);
        assert!(lines.is_pressed(Control::Middle));
        assert!(!lines.is_pressed(Control::Left));
    }

    #[test]
    fn mock_transport_tracks_held_keys() {
        let mut hid = MockTransport::new();
        let keys = [Keypress::Keyboard(1), Keypress::Consumer(2)];
        hid.press(&keys);
        assert_eq!(hid.held().len(), 2);
        hid.release(&keys);
        assert!(hid.held().is_empty());
        assert!(!hid.overlap_detected());
        assert_eq!(hid.press_count(), 1);
        assert_eq!(hid.release_count(), 1);
    }

    #[test]
    fn mock_transport_flags_double_press() {
        let mut hid = MockTransport::new();
        hid.press(&[Keypress::Mouse(0x90)]);
        hid.press(&[Keypress::Mouse(0x90)]);
        assert!(hid.overlap_detected());
    }

    #[test]
    fn mock_transport_flags_full_recorder() {
        let mut hid = MockTransport::new();
        let key = [Keypress::Consumer(0xE9)];
        for _ in 0..MOCK_CALLS / 2 {
            hid.press(&key);
            hid.release(&key);
        }
        assert!(!hid.calls_overflowed());
        assert_eq!(hid.calls().len(), MOCK_CALLS);

        hid.press(&key);
        assert!(hid.calls_overflowed());
        assert_eq!(hid.press_count(), MOCK_CALLS / 2);

        hid.clear();
        assert!(!hid.calls_overflowed());
    }

    #[test]
    fn mock_display_counts_frames() {
        let mut display = MockDisplay::new();
        display.show(&DisplayFrame::BLANK);
        display.show(&DisplayFrame::BLANK);
        assert_eq!(display.frame_count(), 2);
        assert_eq!(display.last(), Some(&DisplayFrame::BLANK));
    }
}
