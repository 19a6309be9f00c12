//! Startup validation errors.
//!
//! The engine cannot fail once running. Everything that could go wrong is
//! a bad static dataset, caught here before the first pass.

use thiserror_no_std::Error;

/// Why a mode table or timing configuration was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The table has no modes.
    #[error("mode table is empty")]
    NoModes,
    /// The table has more modes than the firmware supports.
    #[error("mode table has {count} modes, at most {max} supported")]
    TooManyModes {
        /// Modes supplied.
        count: usize,
        /// Supported maximum.
        max: usize,
    },
    /// A mode or action label is too long for the display.
    #[error("label in mode {mode} slot {slot} is {len} bytes, at most {max}")]
    LabelTooLong {
        /// Mode index.
        mode: usize,
        /// Slot name (`"name"`, `"wheel_name"`, `"left"`, ...).
        slot: &'static str,
        /// Label length in bytes.
        len: usize,
        /// Allowed maximum.
        max: usize,
    },
    /// An action asserts too many keys at once.
    #[error("action in mode {mode} slot {slot} has {count} keys, at most {max}")]
    TooManyKeys {
        /// Mode index.
        mode: usize,
        /// Slot name.
        slot: &'static str,
        /// Keys supplied.
        count: usize,
        /// Allowed maximum.
        max: usize,
    },
    /// An action carries mask bits this firmware does not know.
    #[error("action in mode {mode} slot {slot} has unknown mask bits {bits:#04x}")]
    UnknownMaskBits {
        /// Mode index.
        mode: usize,
        /// Slot name.
        slot: &'static str,
        /// The unknown bits.
        bits: u8,
    },
    /// The acceleration trigger count is zero or exceeds the tick history.
    #[error("acceleration trigger {trigger} outside 1..={max}")]
    AccelTrigger {
        /// Configured trigger.
        trigger: u8,
        /// Supported maximum.
        max: usize,
    },
}
