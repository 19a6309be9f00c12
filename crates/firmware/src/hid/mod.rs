//! HID output for the macro-pad
//!
//! The pad has no USB HID stack of its own. Key batches from the engine are
//! framed by [`SerialHidBridge`] and sent over a UART to an external bridge
//! that owns the host-facing HID interface.

pub mod bridge;

pub use bridge::{BridgeFrame, BridgeKey, SerialHidBridge, MAX_FRAME_LEN};
