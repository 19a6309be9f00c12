//! Static mode/action data model.
//!
//! A mode table is a `&'static [ControlMode]` written as `const` data by the
//! firmware (or by tests). Nothing here is mutated after startup; the table
//! is checked once by [`ModeTable::new`](crate::ModeTable::new).
//!
//! ```
//! use dispatch::{Binding, ControlMode};
//! use platform::hid::{consumer, Keypress};
//!
//! static MODES: [ControlMode; 1] = [ControlMode {
//!     middle: Binding::keys("Mute", &[Keypress::Consumer(consumer::MUTE)]),
//!     wheel_ccw: Binding::keys("-", &[Keypress::Consumer(consumer::VOLUME_DOWN)]),
//!     wheel_cw: Binding::keys("+", &[Keypress::Consumer(consumer::VOLUME_UP)]),
//!     ..ControlMode::named("Volume", "Volume")
//! }];
//! ```

use core::ops::BitOr;

use embassy_time::Duration;
use platform::Keypress;

/// Longest label in bytes (line-break markers included).
pub const MAX_LABEL_LEN: usize = 10;

/// Most keys one action may assert together.
pub const MAX_KEYS_PER_ACTION: usize = 3;

/// Most modes a table may hold.
pub const MAX_MODES: usize = 8;

/// Per-action behaviour flags.
///
/// | Bit | Meaning |
/// |-----|---------|
/// | 0   | [`ModeMask::LONG_HOLD`]: use the long key-down time |
///
/// All other bits are reserved and rejected by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct ModeMask(u8);

impl ModeMask {
    /// No flags.
    pub const NONE: ModeMask = ModeMask(0);
    /// Hold the keys for the long key-down time.
    pub const LONG_HOLD: ModeMask = ModeMask(0b0000_0001);
    /// Every bit this firmware understands.
    pub const KNOWN: ModeMask = ModeMask(0b0000_0001);

    /// Mask from raw bits, unknown bits kept for validation to reject.
    pub const fn from_bits_retain(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// `true` if every bit of `other` is set.
    pub const fn contains(self, other: ModeMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Bits outside [`ModeMask::KNOWN`].
    pub const fn unknown_bits(self) -> u8 {
        self.0 & !Self::KNOWN.0
    }
}

impl BitOr for ModeMask {
    type Output = ModeMask;

    fn bitor(self, rhs: ModeMask) -> ModeMask {
        ModeMask(self.0 | rhs.0)
    }
}

/// How long an emitted action keeps its keys down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HoldClass {
    /// Regular key-down time
    Regular,
    /// Long key-down time
    Long,
}

/// A labelled set of keys asserted and released together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlAction {
    /// Display label, `'\n'` splits lines.
    pub label: &'static str,
    /// Keys, asserted in order within one batch.
    pub keys: &'static [Keypress],
    /// Behaviour flags.
    pub mask: ModeMask,
}

impl ControlAction {
    /// The placeholder every unbound slot resolves to.
    pub const NOOP: ControlAction = ControlAction {
        label: "",
        keys: &[],
        mask: ModeMask::NONE,
    };

    /// Action with the regular hold time.
    pub const fn new(label: &'static str, keys: &'static [Keypress]) -> Self {
        Self {
            label,
            keys,
            mask: ModeMask::NONE,
        }
    }

    /// Same action with `mask`.
    pub const fn with_mask(self, mask: ModeMask) -> Self {
        Self { mask, ..self }
    }

    /// `true` when the action sends nothing.
    pub const fn is_noop(&self) -> bool {
        self.keys.is_empty()
    }

    /// Hold class for a button press that lasted `pressed_for`.
    ///
    /// Long only if the action asks for it *and* the press reached
    /// `long_press`.
    pub fn hold_for_press(&self, pressed_for: Duration, long_press: Duration) -> HoldClass {
        if self.mask.contains(ModeMask::LONG_HOLD) && pressed_for >= long_press {
            HoldClass::Long
        } else {
            HoldClass::Regular
        }
    }

    /// Hold class for a wheel tick, which has no press duration.
    pub fn hold_for_wheel(&self) -> HoldClass {
        if self.mask.contains(ModeMask::LONG_HOLD) {
            HoldClass::Long
        } else {
            HoldClass::Regular
        }
    }
}

/// One slot of a mode: either bound to an action or explicitly empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Nothing configured
    Unbound,
    /// Configured action
    Bound(ControlAction),
}

impl Binding {
    /// Bound slot with the regular hold time.
    pub const fn keys(label: &'static str, keys: &'static [Keypress]) -> Self {
        Binding::Bound(ControlAction::new(label, keys))
    }

    /// Bound slot with the long hold time.
    pub const fn long(label: &'static str, keys: &'static [Keypress]) -> Self {
        Binding::Bound(ControlAction::new(label, keys).with_mask(ModeMask::LONG_HOLD))
    }

    /// The action, or [`ControlAction::NOOP`] when unbound.
    pub fn action(&self) -> &ControlAction {
        match self {
            Binding::Bound(action) => action,
            Binding::Unbound => &ControlAction::NOOP,
        }
    }

    /// `true` when something is configured.
    pub const fn is_bound(&self) -> bool {
        matches!(self, Binding::Bound(_))
    }
}

/// A named set of bindings, one of which is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlMode {
    /// Shown at the top of the screen.
    pub name: &'static str,
    /// What the wheel does in this mode.
    pub wheel_name: &'static str,
    /// Left button
    pub left: Binding,
    /// Right button
    pub right: Binding,
    /// Encoder center click
    pub middle: Binding,
    /// Wheel counter-clockwise
    pub wheel_ccw: Binding,
    /// Wheel clockwise
    pub wheel_cw: Binding,
    /// Wheel counter-clockwise while accelerated
    pub wheel_ccw_fast: Binding,
    /// Wheel clockwise while accelerated
    pub wheel_cw_fast: Binding,
}

impl ControlMode {
    /// Mode with every slot unbound, meant as the base of struct-update
    /// syntax in `const` tables.
    pub const fn named(name: &'static str, wheel_name: &'static str) -> Self {
        Self {
            name,
            wheel_name,
            left: Binding::Unbound,
            right: Binding::Unbound,
            middle: Binding::Unbound,
            wheel_ccw: Binding::Unbound,
            wheel_cw: Binding::Unbound,
            wheel_ccw_fast: Binding::Unbound,
            wheel_cw_fast: Binding::Unbound,
        }
    }

    /// Every slot with its name, for validation and logs.
    pub fn slots(&self) -> [(&'static str, &Binding); 7] {
        [
            ("left", &self.left),
            ("right", &self.right),
            ("middle", &self.middle),
            ("wheel_ccw", &self.wheel_ccw),
            ("wheel_cw", &self.wheel_cw),
            ("wheel_ccw_fast", &self.wheel_ccw_fast),
            ("wheel_cw_fast", &self.wheel_cw_fast),
        ]
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
    use platform::hid::keyboard;

    static SPACE: [Keypress; 1] = [Keypress::Keyboard(keyboard::SPACE)];

    #[test]
    fn unbound_resolves_to_noop() {
        assert_eq!(Binding::Unbound.action(), &ControlAction::NOOP);
        assert!(Binding::Unbound.action().is_noop());
    }

    #[test]
    fn long_binding_sets_mask() {
        let binding = Binding::long("Seek", &SPACE);
        assert!(binding.action().mask.contains(ModeMask::LONG_HOLD));
    }

    #[test]
    fn regular_action_never_holds_long() {
        let action = ControlAction::new("Play", &SPACE);
        assert_eq!(
            action.hold_for_press(Duration::from_secs(5), Duration::from_millis(700)),
            HoldClass::Regular
        );
    }

    #[test]
    fn long_action_needs_long_press() {
        let action = ControlAction::new("Seek", &SPACE).with_mask(ModeMask::LONG_HOLD);
        let threshold = Duration::from_millis(700);
        assert_eq!(
            action.hold_for_press(Duration::from_millis(700), threshold),
            HoldClass::Long
        );
        assert_eq!(
            action.hold_for_press(Duration::from_millis(699), threshold),
            HoldClass::Regular
        );
    }

    #[test]
    fn long_wheel_action_always_holds_long() {
        let action = ControlAction::new(">", &SPACE).with_mask(ModeMask::LONG_HOLD);
        assert_eq!(action.hold_for_wheel(), HoldClass::Long);
    }

    #[test]
    fn unknown_mask_bits_are_reported() {
        let mask = ModeMask::from_bits_retain(0b1000_0001);
        assert_eq!(mask.unknown_bits(), 0b1000_0000);
        assert_eq!(ModeMask::LONG_HOLD.unknown_bits(), 0);
    }

    #[test]
    fn named_mode_is_fully_unbound() {
        let mode = ControlMode::named("Empty", "");
        assert!(mode.slots().iter().all(|(_, b)| !b.is_bound()));
    }
}
