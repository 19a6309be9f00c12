//! Mode table lookup and mode navigation.
//!
//! [`ModeTable`] wraps the static mode slice after a one-time validation.
//! Lookups are pure: the same `(mode, target)` always yields the same
//! `&'static` action, and any index is wrapped into range before use.
//!
//! Mode navigation is not part of the per-mode table: the `Up` and
//! `Down` buttons never resolve to actions, they become [`Command`]s.

use embassy_time::Duration;
use platform::{Control, Direction, TimingConfig};

use crate::error::ConfigError;
use crate::mode::{ControlAction, ControlMode, MAX_KEYS_PER_ACTION, MAX_LABEL_LEN, MAX_MODES};
use crate::timing::Press;

/// Fallback for an impossible out-of-range lookup.
static EMPTY_MODE: ControlMode = ControlMode::named("", "");

/// What a lookup is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A button slot (`Left`, `Right`, `Middle`; others are unbound).
    Button(Control),
    /// A wheel tick.
    Wheel {
        /// Rotation direction
        direction: Direction,
        /// Part of a burst
        accelerated: bool,
    },
}

/// Step through the mode list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeStep {
    /// Towards index 0, wrapping to the last mode
    Previous,
    /// Towards the last index, wrapping to 0
    Next,
}

/// What a completed press asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Resolve and emit the action bound to this button.
    Action(Control),
    /// Permanently move to another mode.
    Switch(ModeStep),
    /// Enter toggle mode on the neighbouring mode, or leave it.
    Toggle(ModeStep),
}

impl Command {
    /// Gesture mapping: short `Up`/`Down` switch modes, long `Up`/`Down`
    /// toggle, every other button fires its action.
    pub fn for_press(press: &Press, long_press: Duration) -> Self {
        let step = match press.control {
            Control::Up => ModeStep::Previous,
            Control::Down => ModeStep::Next,
            control => return Command::Action(control),
        };
        if press.duration >= long_press {
            Command::Toggle(step)
        } else {
            Command::Switch(step)
        }
    }
}

/// Validated, read-only mode table.
#[derive(Debug, Clone, Copy)]
pub struct ModeTable {
    modes: &'static [ControlMode],
}

impl ModeTable {
    /// Validate `modes` once at startup.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: empty or oversized table, a label
    /// longer than [`MAX_LABEL_LEN`], more than [`MAX_KEYS_PER_ACTION`] keys
    /// in one action, or unknown mask bits.
    pub fn new(modes: &'static [ControlMode]) -> Result<Self, ConfigError> {
        if modes.is_empty() {
            return Err(ConfigError::NoModes);
        }
        if modes.len() > MAX_MODES {
            return Err(ConfigError::TooManyModes {
                count: modes.len(),
                max: MAX_MODES,
            });
        }
        for (index, mode) in modes.iter().enumerate() {
            check_label(index, "name", mode.name)?;
            check_label(index, "wheel_name", mode.wheel_name)?;
            for (slot, binding) in mode.slots() {
                check_action(index, slot, binding.action())?;
            }
        }
        Ok(Self { modes })
    }

    /// Number of modes (at least one).
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    /// Always `false`; validation rejects empty tables.
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Wrap any index into `0..len`.
    pub fn wrap(&self, index: usize) -> usize {
        index.checked_rem(self.modes.len()).unwrap_or(0)
    }

    /// Mode at `index`, wrapped.
    pub fn mode(&self, index: usize) -> &'static ControlMode {
        self.modes.get(self.wrap(index)).unwrap_or(&EMPTY_MODE)
    }

    /// Neighbour of `index`, wrapping at both ends.
    pub fn step(&self, index: usize, step: ModeStep) -> usize {
        let len = self.modes.len();
        let index = self.wrap(index);
        match step {
            ModeStep::Next => self.wrap(index.saturating_add(1)),
            ModeStep::Previous => index
                .checked_sub(1)
                .unwrap_or_else(|| len.saturating_sub(1)),
        }
    }

    /// Action for `target` in mode `index`.
    ///
    /// Unbound slots and the mode-navigation buttons give
    /// [`ControlAction::NOOP`]. An accelerated wheel tick uses the fast slot
    /// when the mode binds one, the plain slot otherwise.
    pub fn resolve(&self, index: usize, target: Target) -> &'static ControlAction {
        let mode = self.mode(index);
        let binding = match target {
            Target::Button(Control::Left) => &mode.left,
            Target::Button(Control::Right) => &mode.right,
            Target::Button(Control::Middle) => &mode.middle,
            Target::Button(Control::Up | Control::Down) => return &ControlAction::NOOP,
            Target::Wheel {
                direction,
                accelerated,
            } => {
                let (plain, fast) = match direction {
                    Direction::Clockwise => (&mode.wheel_cw, &mode.wheel_cw_fast),
                    Direction::CounterClockwise => (&mode.wheel_ccw, &mode.wheel_ccw_fast),
                };
                if accelerated && fast.is_bound() {
                    fast
                } else {
                    plain
                }
            }
        };
        binding.action()
    }

    /// `true` when mode `index` binds a dedicated fast action for `direction`.
    pub fn has_fast_wheel(&self, index: usize, direction: Direction) -> bool {
        let mode = self.mode(index);
        match direction {
            Direction::Clockwise => mode.wheel_cw_fast.is_bound(),
            Direction::CounterClockwise => mode.wheel_ccw_fast.is_bound(),
        }
    }
}

/// Check the timing values the engine depends on structurally.
///
/// # Errors
///
/// Returns [`ConfigError::AccelTrigger`] when the trigger count is zero or
/// larger than the tick history.
pub fn validate_timing(config: &TimingConfig) -> Result<(), ConfigError> {
    let trigger = usize::from(config.accel_trigger);
    if trigger == 0 || trigger > platform::config::MAX_ACCEL_TRIGGER {
        return Err(ConfigError::AccelTrigger {
            trigger: config.accel_trigger,
            max: platform::config::MAX_ACCEL_TRIGGER,
        });
    }
    Ok(())
}

fn check_label(mode: usize, slot: &'static str, label: &str) -> Result<(), ConfigError> {
    if label.len() > MAX_LABEL_LEN {
        return Err(ConfigError::LabelTooLong {
            mode,
            slot,
            len: label.len(),
            max: MAX_LABEL_LEN,
        });
    }
    Ok(())
}

fn check_action(mode: usize, slot: &'static str, action: &ControlAction) -> Result<(), ConfigError> {
    check_label(mode, slot, action.label)?;
    if action.keys.len() > MAX_KEYS_PER_ACTION {
        return Err(ConfigError::TooManyKeys {
            mode,
            slot,
            count: action.keys.len(),
            max: MAX_KEYS_PER_ACTION,
        });
    }
    let unknown = action.mask.unknown_bits();
    if unknown != 0 {
        return Err(ConfigError::UnknownMaskBits {
            mode,
            slot,
            bits: unknown,
        });
    }
    Ok(())
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
    use crate::mode::{Binding, ModeMask};
    use embassy_time::Instant;
    use platform::hid::{consumer, keyboard};
    use platform::Keypress;

    static VOL_UP: [Keypress; 1] = [Keypress::Consumer(consumer::VOLUME_UP)];
    static VOL_DOWN: [Keypress; 1] = [Keypress::Consumer(consumer::VOLUME_DOWN)];
    static LEFT: [Keypress; 1] = [Keypress::Keyboard(keyboard::LEFT_ARROW)];
    static RIGHT: [Keypress; 1] = [Keypress::Keyboard(keyboard::RIGHT_ARROW)];
    static TOO_MANY: [Keypress; 4] = [
        Keypress::Keyboard(keyboard::LEFT_CTRL),
        Keypress::Keyboard(keyboard::LEFT_GUI),
        Keypress::Keyboard(keyboard::LEFT_ARROW),
        Keypress::Keyboard(keyboard::SPACE),
    ];

    static MODES: [ControlMode; 3] = [
        ControlMode {
            wheel_ccw: Binding::keys("-", &VOL_DOWN),
            wheel_cw: Binding::keys("+", &VOL_UP),
            ..ControlMode::named("Volume", "Volume")
        },
        ControlMode {
            wheel_ccw: Binding::keys("<", &LEFT),
            wheel_cw: Binding::keys(">", &RIGHT),
            wheel_ccw_fast: Binding::keys("<<", &LEFT),
            wheel_cw_fast: Binding::keys(">>", &RIGHT),
            ..ControlMode::named("VLC", "Scrub")
        },
        ControlMode::named("Empty", ""),
    ];

    static LONG_LABEL: [ControlMode; 1] = [ControlMode::named("Much too long", "")];
    static FAT_ACTION: [ControlMode; 1] = [ControlMode {
        left: Binding::keys("Fat", &TOO_MANY),
        ..ControlMode::named("Fat", "")
    }];
    static BAD_MASK: [ControlMode; 1] = [ControlMode {
        left: Binding::Bound(
            ControlAction::new("Odd", &LEFT).with_mask(ModeMask::from_bits_retain(0b10)),
        ),
        ..ControlMode::named("Odd", "")
    }];
    static NO_MODES: [ControlMode; 0] = [];

    fn table() -> ModeTable {
        ModeTable::new(&MODES).unwrap()
    }

    fn press(control: Control, millis: u64) -> Press {
        Press {
            control,
            duration: Duration::from_millis(millis),
            at: Instant::from_millis(millis),
        }
    }

    #[test]
    fn validation_rejects_bad_tables() {
        assert_eq!(ModeTable::new(&NO_MODES).unwrap_err(), ConfigError::NoModes);
        assert!(matches!(
            ModeTable::new(&LONG_LABEL).unwrap_err(),
            ConfigError::LabelTooLong { slot: "name", .. }
        ));
        assert!(matches!(
            ModeTable::new(&FAT_ACTION).unwrap_err(),
            ConfigError::TooManyKeys { count: 4, .. }
        ));
        assert!(matches!(
            ModeTable::new(&BAD_MASK).unwrap_err(),
            ConfigError::UnknownMaskBits { bits: 0b10, .. }
        ));
    }

    #[test]
    fn step_wraps_both_ends() {
        let table = table();
        assert_eq!(table.step(2, ModeStep::Next), 0);
        assert_eq!(table.step(0, ModeStep::Previous), 2);
        assert_eq!(table.step(1, ModeStep::Next), 2);
    }

    #[test]
    fn out_of_range_index_wraps() {
        let table = table();
        assert_eq!(table.mode(4).name, "VLC");
        assert_eq!(table.step(7, ModeStep::Previous), 0);
    }

    #[test]
    fn unbound_slots_resolve_to_noop() {
        let table = table();
        for control in [Control::Left, Control::Right, Control::Middle, Control::Up] {
            assert!(table.resolve(0, Target::Button(control)).is_noop());
        }
    }

    #[test]
    fn fast_wheel_falls_back_to_plain() {
        let table = table();
        let fast = Target::Wheel {
            direction: Direction::Clockwise,
            accelerated: true,
        };
        assert_eq!(table.resolve(0, fast).label, "+");
        assert!(!table.has_fast_wheel(0, Direction::Clockwise));
        assert_eq!(table.resolve(1, fast).label, ">>");
        assert!(table.has_fast_wheel(1, Direction::Clockwise));
    }

    #[test]
    fn resolve_is_idempotent() {
        let table = table();
        let target = Target::Wheel {
            direction: Direction::CounterClockwise,
            accelerated: false,
        };
        let first = table.resolve(1, target);
        let second = table.resolve(1, target);
        assert!(core::ptr::eq(first, second));
    }

    #[test]
    fn gestures_map_to_commands() {
        let long = Duration::from_millis(700);
        assert_eq!(
            Command::for_press(&press(Control::Down, 50), long),
            Command::Switch(ModeStep::Next)
        );
        assert_eq!(
            Command::for_press(&press(Control::Up, 700), long),
            Command::Toggle(ModeStep::Previous)
        );
        assert_eq!(
            Command::for_press(&press(Control::Middle, 900), long),
            Command::Action(Control::Middle)
        );
    }

    #[test]
    fn timing_validation_checks_trigger() {
        assert!(validate_timing(&TimingConfig::RELEASE).is_ok());
        let zero = TimingConfig {
            accel_trigger: 0,
            ..TimingConfig::RELEASE
        };
        assert!(validate_timing(&zero).is_err());
    }
}
