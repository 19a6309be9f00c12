//! Input wiring for the STM32 target.
//!
//! Buttons are plain GPIO inputs read by the scheduler pass through
//! [`platform::ButtonLines`]; debouncing happens in the engine's sampler.
//! The encoder is edge-driven: an EXTI task on the interrupt executor
//! decodes quadrature transitions and adds detents to [`ENCODER_TICKS`],
//! which the engine drains once per pass.
//!
//! ```text
//! EXTI4/5 ─► encoder_task ─► QuadratureDecoder ─► ENCODER_TICKS ─┐
//!                                                                ├─► Engine::run_pass
//! PB12..PB15, PA8 ─────────────── GpioButtons ───────────────────┘
//! ```

pub mod hardware;

pub use hardware::{spawn_encoder_task, GpioButtons, ENCODER_TICKS};
