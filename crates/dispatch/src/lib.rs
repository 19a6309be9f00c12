//! Input & mode dispatch engine.
//!
//! Turns debounced button edges and quadrature encoder ticks into timed,
//! mode-aware HID action emissions.
//!
//! # Pipeline
//!
//! One call to [`Engine::run_pass`] runs the stages in a fixed order:
//!
//! ```text
//! Sampler ──edges──┐
//!                  ├─► TimingController ─► ModeTable::resolve ─► ActionEmitter ─► HidTransport
//! TickAccumulator ─┘        │                     ▲
//!   (interrupt side)        └─ AccelDetector ─────┘        DisplayFrame ─► StatusDisplay
//! ```
//!
//! The only state shared with interrupt context is [`TickAccumulator`].
//! Everything else lives in [`RuntimeState`] and the stage structs, owned by
//! the engine.
//!
//! This crate is `no_std` and allocation-free; it only uses `core`,
//! `heapless` and the embassy time/sync primitives.

#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod accel;
pub mod emitter;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod mode;
pub mod resolver;
pub mod sampler;
pub mod state;
pub mod timing;

pub use accel::{AccelDetector, TickHistory, WheelTick};
pub use emitter::{ActionEmitter, EMIT_QUEUE_LEN};
pub use encoder::{QuadratureDecoder, TickAccumulator};
pub use engine::Engine;
pub use error::ConfigError;
pub use mode::{Binding, ControlAction, ControlMode, HoldClass, ModeMask};
pub use resolver::{Command, ModeStep, ModeTable, Target};
pub use sampler::Sampler;
pub use state::{ModeActivity, RuntimeState};
pub use timing::{Press, TimerEvents, TimingController};
