//! GPIO button lines and the encoder EXTI task.
//!
//! Pin assignments live in [`crate::board`].

use dispatch::{QuadratureDecoder, TickAccumulator};
use embassy_executor::{SendSpawner, SpawnError};
use embassy_futures::select::select;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{AnyPin, Input};
use platform::{ButtonLines, Control};

// ---------------------------------------------------------------------------
// Shared tick counter
// ---------------------------------------------------------------------------

/// Net encoder detents since the last drain. Written by [`encoder_task`],
/// drained by the engine.
pub static ENCODER_TICKS: TickAccumulator = TickAccumulator::new();

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------

/// The five push buttons, active-low with internal pull-ups.
pub struct GpioButtons {
    left: Input<'static, AnyPin>,
    right: Input<'static, AnyPin>,
    middle: Input<'static, AnyPin>,
    up: Input<'static, AnyPin>,
    down: Input<'static, AnyPin>,
}

impl GpioButtons {
    /// Bundle the button inputs.
    pub fn new(
        left: Input<'static, AnyPin>,
        right: Input<'static, AnyPin>,
        middle: Input<'static, AnyPin>,
        up: Input<'static, AnyPin>,
        down: Input<'static, AnyPin>,
    ) -> Self {
        Self {
            left,
            right,
            middle,
            up,
            down,
        }
    }
}

impl ButtonLines for GpioButtons {
    fn is_pressed(&self, control: Control) -> bool {
        let pin = match control {
            Control::Left => &self.left,
            Control::Right => &self.right,
            Control::Middle => &self.middle,
            Control::Up => &self.up,
            Control::Down => &self.down,
        };
        pin.is_low()
    }
}

// ---------------------------------------------------------------------------
// Encoder task
// ---------------------------------------------------------------------------

/// Spawn the encoder task. Call once from `main` with the spawner of the
/// interrupt executor; the task owns both channel pins for the lifetime of
/// the program.
///
/// Running it in thread mode next to the main loop would let a blocking
/// OLED flush ([`crate::board::OLED_FLUSH_STALL_US`]) hide intermediate
/// quadrature states from the decoder.
pub fn spawn_encoder_task(
    spawner: SendSpawner,
    channel_a: ExtiInput<'static, AnyPin>,
    channel_b: ExtiInput<'static, AnyPin>,
) -> Result<(), SpawnError> {
    spawner.spawn(encoder_task(channel_a, channel_b))
}

/// Wait for an edge on either channel, feed both levels to the decoder and
/// record completed detents.
#[embassy_executor::task]
async fn encoder_task(
    mut channel_a: ExtiInput<'static, AnyPin>,
    mut channel_b: ExtiInput<'static, AnyPin>,
) {
    let mut decoder = QuadratureDecoder::new(channel_a.is_high(), channel_b.is_high());
    loop {
        select(channel_a.wait_for_any_edge(), channel_b.wait_for_any_edge()).await;
        if let Some(direction) = decoder.process(channel_a.is_high(), channel_b.is_high()) {
            ENCODER_TICKS.record(direction);
            defmt::trace!("encoder detent: {}", direction);
        }
    }
}
