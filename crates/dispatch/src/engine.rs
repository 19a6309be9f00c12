//! The scheduler pass.
//!
//! [`Engine::run_pass`] is called from a fixed-period loop with the current
//! time. One pass:
//!
//! 1. samples the buttons and drains the encoder accumulator,
//! 2. feeds edges to the timing controller (activity, press durations),
//! 3. fires the toggle-expiry and idle timers,
//! 4. turns completed presses into actions or mode changes,
//! 5. classifies wheel ticks and emits their actions,
//! 6. releases held keys whose deadline passed,
//! 7. publishes a new display frame if anything visible changed.
//!
//! The engine never reads a clock itself, which keeps every pass
//! reproducible in host tests.

use embassy_time::Instant;
use heapless::Vec;
use platform::{ButtonLines, DisplayFrame, HidTransport, StatusDisplay, TimingConfig, BUTTON_COUNT};

use crate::accel::AccelDetector;
use crate::emitter::ActionEmitter;
use crate::encoder::TickAccumulator;
use crate::error::ConfigError;
use crate::mode::ControlAction;
use crate::resolver::{validate_timing, Command, ModeTable, Target};
use crate::sampler::Sampler;
use crate::state::RuntimeState;
use crate::timing::{Press, TimingController};

/// Label of the last emitted action and when it stops being shown.
#[derive(Debug, Clone, Copy)]
struct Feedback {
    label: &'static str,
    until: Instant,
}

/// Owns every stage and the runtime state.
pub struct Engine<'a, T: HidTransport, D: StatusDisplay> {
    table: ModeTable,
    config: TimingConfig,
    ticks: &'a TickAccumulator,
    sampler: Sampler,
    timing: TimingController,
    accel: AccelDetector,
    emitter: ActionEmitter<T>,
    display: D,
    state: RuntimeState,
    feedback: Option<Feedback>,
    published: Option<DisplayFrame>,
}

impl<'a, T: HidTransport, D: StatusDisplay> Engine<'a, T, D> {
    /// Build the engine and show the startup mode.
    ///
    /// `config.default_mode` is wrapped into the table range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AccelTrigger`] for a trigger count outside the
    /// supported range.
    pub fn new(
        table: ModeTable,
        config: TimingConfig,
        ticks: &'a TickAccumulator,
        transport: T,
        display: D,
        now: Instant,
    ) -> Result<Self, ConfigError> {
        validate_timing(&config)?;
        let mut engine = Self {
            table,
            config,
            ticks,
            sampler: Sampler::new(config.debounce()),
            timing: TimingController::new(&config),
            accel: AccelDetector::new(&config),
            emitter: ActionEmitter::new(transport, &config),
            display,
            state: RuntimeState::new(table.wrap(config.default_mode), now),
            feedback: None,
            published: None,
        };
        // Whatever the encoder counted before the engine existed is noise.
        let _ = ticks.drain();
        engine.publish();
        Ok(engine)
    }

    /// Run one scheduler pass at `now`.
    pub fn run_pass<L: ButtonLines>(&mut self, lines: &L, now: Instant) {
        let edges = self.sampler.sample(lines, now);
        let net = self.ticks.drain();

        let mut presses: Vec<Press, BUTTON_COUNT> = Vec::new();
        for edge in &edges {
            if let Some(press) = self.timing.on_edge(&mut self.state, edge) {
                // One release per button per pass.
                let _ = presses.push(press);
            }
        }
        if net != 0 {
            self.timing.note_activity(&mut self.state, now);
        }

        let events = self.timing.tick(&mut self.state, now);
        if let Some(_restored) = events.toggle_expired {
            #[cfg(feature = "defmt")]
            defmt::info!("toggle expired, back to mode {}", _restored);
            self.emitter.cancel();
            self.feedback = None;
        }
        if events.idle_entered {
            #[cfg(feature = "defmt")]
            defmt::debug!("screensaver on");
        }

        for press in &presses {
            self.handle_press(press, now);
        }
        if net != 0 {
            self.handle_wheel(net, now);
        }

        self.emitter.poll(now);

        if self.feedback.is_some_and(|f| now >= f.until) {
            self.feedback = None;
        }
        self.publish();
    }

    fn handle_press(&mut self, press: &Press, now: Instant) {
        let long_press = self.config.long_press();
        match Command::for_press(press, long_press) {
            Command::Action(control) => {
                let action = self
                    .table
                    .resolve(self.state.active_mode, Target::Button(control));
                let hold = action.hold_for_press(press.duration, long_press);
                if self.emitter.emit(action, hold, now) {
                    self.show_feedback(action, now);
                }
            }
            Command::Switch(step) => {
                let next = self.table.step(self.state.active_mode, step);
                self.enter_mode(next);
            }
            Command::Toggle(step) => {
                if self.timing.leave_toggle(&mut self.state).is_none() {
                    let to = self.table.step(self.state.active_mode, step);
                    self.timing.enter_toggle(&mut self.state, to, now);
                }
                self.enter_mode(self.state.active_mode);
            }
        }
    }

    fn handle_wheel(&mut self, net: i16, now: Instant) {
        let mode = self.state.active_mode;
        let table = self.table;
        let repeat = self.config.accel_repeat.max(1);
        let mut shown: Option<&'static ControlAction> = None;

        for tick in self.accel.ticks(net, &mut self.state.wheel_history, now) {
            let action = table.resolve(
                mode,
                Target::Wheel {
                    direction: tick.direction,
                    accelerated: tick.accelerated,
                },
            );
            let times = if tick.accelerated && !table.has_fast_wheel(mode, tick.direction) {
                repeat
            } else {
                1
            };
            for _ in 0..times {
                if self.emitter.emit(action, action.hold_for_wheel(), now) {
                    shown = Some(action);
                }
            }
        }

        if let Some(action) = shown {
            self.show_feedback(action, now);
        }
    }

    /// Switch the visible mode to `index` (already applied to the toggle
    /// state by the caller where relevant).
    fn enter_mode(&mut self, index: usize) {
        self.state.active_mode = self.table.wrap(index);
        self.emitter.cancel();
        self.feedback = None;
        #[cfg(feature = "defmt")]
        defmt::info!(
            "mode {} ({}){}",
            self.state.active_mode,
            self.table.mode(self.state.active_mode).name,
            if self.state.is_toggled() { " toggled" } else { "" }
        );
    }

    fn show_feedback(&mut self, action: &'static ControlAction, now: Instant) {
        if action.label.is_empty() {
            return;
        }
        self.feedback = Some(Feedback {
            label: action.label,
            until: now
                .checked_add(self.config.feedback())
                .unwrap_or(Instant::MAX),
        });
    }

    /// Snapshot of what the screen should show.
    pub fn frame(&self) -> DisplayFrame {
        let mode = self.table.mode(self.state.active_mode);
        DisplayFrame {
            mode_name: mode.name,
            wheel_name: mode.wheel_name,
            left: mode.left.action().label,
            right: mode.right.action().label,
            middle: mode.middle.action().label,
            wheel_ccw: mode.wheel_ccw.action().label,
            wheel_cw: mode.wheel_cw.action().label,
            last_action: self.feedback.map(|f| f.label),
            idle: self.state.idle,
            toggled: self.state.is_toggled(),
        }
    }

    fn publish(&mut self) {
        let frame = self.frame();
        if self.published.as_ref() != Some(&frame) {
            self.display.show(&frame);
            self.published = Some(frame);
        }
    }

    /// Index of the active mode.
    pub fn active_mode(&self) -> usize {
        self.state.active_mode
    }

    /// `true` while a toggle override is active.
    pub fn is_toggled(&self) -> bool {
        self.state.is_toggled()
    }

    /// `true` while the screensaver is on.
    pub fn is_idle(&self) -> bool {
        self.state.idle
    }

    /// Runtime state, read-only.
    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    /// The mode table.
    pub fn table(&self) -> &ModeTable {
        &self.table
    }

    /// The HID transport.
    pub fn transport(&self) -> &T {
        self.emitter.transport()
    }

    /// The display collaborator.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Mutable access to the display collaborator, for work the engine does
    /// not drive (screensaver animation, layout changes). The next published
    /// frame still comes from the engine.
    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
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
    use crate::mode::{Binding, ControlMode};
    use platform::hid::{consumer, keyboard};
    use platform::mocks::{MockDisplay, MockLines, MockTransport};
    use platform::{Control, Direction, Keypress};

    static MODES: [ControlMode; 2] = [
        ControlMode {
            middle: Binding::keys("Mute", &[Keypress::Consumer(consumer::MUTE)]),
            wheel_ccw: Binding::keys("-", &[Keypress::Consumer(consumer::VOLUME_DOWN)]),
            wheel_cw: Binding::keys("+", &[Keypress::Consumer(consumer::VOLUME_UP)]),
            ..ControlMode::named("Volume", "Volume")
        },
        ControlMode {
            left: Binding::keys("Prev", &[Keypress::Keyboard(keyboard::PAGE_UP)]),
            right: Binding::keys("Next", &[Keypress::Keyboard(keyboard::PAGE_DOWN)]),
            ..ControlMode::named("Pages", "")
        },
    ];

    fn ms(n: u64) -> Instant {
        Instant::from_millis(n)
    }

    fn config() -> TimingConfig {
        TimingConfig {
            default_mode: 0,
            ..TimingConfig::RELEASE
        }
    }

    #[test]
    fn startup_publishes_default_mode() {
        let ticks = TickAccumulator::new();
        let table = ModeTable::new(&MODES).unwrap();
        let engine = Engine::new(
            table,
            TimingConfig::RELEASE,
            &ticks,
            MockTransport::new(),
            MockDisplay::new(),
            ms(0),
        )
        .unwrap();
        // default_mode 1 of a two-mode table
        assert_eq!(engine.active_mode(), 1);
        assert_eq!(engine.display().frame_count(), 1);
        assert_eq!(engine.display().last().unwrap().mode_name, "Pages");
    }

    #[test]
    fn bad_trigger_is_rejected() {
        let ticks = TickAccumulator::new();
        let table = ModeTable::new(&MODES).unwrap();
        let config = TimingConfig {
            accel_trigger: 17,
            ..TimingConfig::RELEASE
        };
        let result = Engine::new(
            table,
            config,
            &ticks,
            MockTransport::new(),
            MockDisplay::new(),
            ms(0),
        );
        assert!(matches!(result, Err(ConfigError::AccelTrigger { .. })));
    }

    #[test]
    fn unchanged_frame_is_not_republished() {
        let ticks = TickAccumulator::new();
        let table = ModeTable::new(&MODES).unwrap();
        let mut engine = Engine::new(
            table,
            config(),
            &ticks,
            MockTransport::new(),
            MockDisplay::new(),
            ms(0),
        )
        .unwrap();
        let lines = MockLines::new();
        for t in 1..100 {
            engine.run_pass(&lines, ms(t));
        }
        assert_eq!(engine.display().frame_count(), 1);
    }

    #[test]
    fn middle_click_emits_and_shows_label() {
        let ticks = TickAccumulator::new();
        let table = ModeTable::new(&MODES).unwrap();
        let mut engine = Engine::new(
            table,
            config(),
            &ticks,
            MockTransport::new(),
            MockDisplay::new(),
            ms(0),
        )
        .unwrap();
        let mut lines = MockLines::new();
        lines.set(Control::Middle, true);
        for t in 0..=100 {
            engine.run_pass(&lines, ms(t));
        }
        // Fires on release, not on press.
        assert_eq!(engine.transport().press_count(), 0);
        lines.set(Control::Middle, false);
        for t in 101..=200 {
            engine.run_pass(&lines, ms(t));
        }
        assert_eq!(engine.transport().press_count(), 1);
        assert_eq!(engine.transport().release_count(), 1);
        assert_eq!(engine.display().last().unwrap().last_action, Some("Mute"));

        for t in 201..=1_300 {
            engine.run_pass(&lines, ms(t));
        }
        assert_eq!(engine.display().last().unwrap().last_action, None);
    }

    #[test]
    fn wheel_tick_counts_as_activity() {
        let ticks = TickAccumulator::new();
        let table = ModeTable::new(&MODES).unwrap();
        let mut engine = Engine::new(
            table,
            config(),
            &ticks,
            MockTransport::new(),
            MockDisplay::new(),
            ms(0),
        )
        .unwrap();
        let lines = MockLines::new();
        ticks.record(Direction::CounterClockwise);
        engine.run_pass(&lines, ms(5_000));
        assert_eq!(engine.state().last_activity(), ms(5_000));
        assert_eq!(engine.transport().press_count(), 1);
    }
}
