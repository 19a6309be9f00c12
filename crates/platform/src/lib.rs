//! Hardware Abstraction Layer (HAL) for the macro-pad firmware
//!
//! This crate provides the trait seams and plain data types shared by the
//! dispatch engine and the hardware target, so the engine can be developed
//! and tested on the host without a board attached.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate)
//!         ↓
//! Engine (dispatch crate)
//!         ↓
//! Platform HAL (this crate - traits and data types)
//!         ↓
//! Hardware Layer (Embassy HAL + PAC)
//! ```
//!
//! # Seams
//!
//! - [`ButtonLines`] - polled button levels
//! - [`HidTransport`] - batched HID key assert/release
//! - [`StatusDisplay`] - display collaborator fed with [`DisplayFrame`]s
//! - [`config`] - timing constants and build profiles
//!
//! # Features
//!
//! - `std`: Enable the host mocks for use from other crates' tests
//! - `defmt`: Enable defmt logging derives

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)] // plain accessors
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod display;
pub mod hid;
pub mod input;
pub mod mocks;

pub use config::{Profile, TimingConfig};
pub use display::{DisplayFrame, StatusDisplay};
pub use hid::{HidTransport, Keypress};
pub use input::{ButtonEdge, ButtonLines, Control, Direction, Edge, BUTTON_COUNT};
