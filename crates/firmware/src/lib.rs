//! Macro-pad firmware
//!
//! Five buttons, a quadrature encoder with a center click and a 128×64 OLED,
//! driving a host computer through an external HID bridge.
//!
//! # Architecture
//!
//! This firmware follows a layered architecture:
//!
//! ```text
//! Application Layer (main.rs, modes)
//!         ↓
//! Dispatch engine (dispatch crate)
//!         ↓
//! Drivers (display, hid, input)
//!         ↓
//! Platform HAL (Embassy, STM32)
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for the STM32F411 target (embassy, defmt)
//! - `bench-profile` - Bench timings (three-second screensaver)
//! - `std` - Enable standard library (host testing)
//!
//! # Hardware Target
//!
//! ```bash
//! cargo run -p firmware --release --target thumbv7em-none-eabihf --features hardware
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// Logging discipline
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod board;
pub mod display;
pub mod hid;
pub mod modes;

#[cfg(feature = "hardware")]
pub mod input;

// Re-export key types
pub use display::{BufferedDisplay, DisplayError, Ssd1306, StatusRenderer, DISPLAY_HEIGHT, DISPLAY_WIDTH};
pub use hid::{BridgeFrame, BridgeKey, SerialHidBridge};
pub use modes::MODES;
