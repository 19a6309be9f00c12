//! Serial HID bridge transport
//!
//! Each [`HidTransport`] batch becomes one [`BridgeFrame`], serialised with
//! postcard and COBS-encoded so the receiver can resynchronise on the `0x00`
//! delimiter after a dropped byte:
//!
//! ```text
//! press   [Key(Consumer(0xE9))]          → COBS(postcard(Press { keys }))   0x00
//! release [Key(Consumer(0xE9))]          → COBS(postcard(Release { keys })) 0x00
//! press   [Key(Mouse(SCROLL_POSITIVE))]  → Press { keys: [Scroll { amount: +5 }] }
//! ```
//!
//! Scrolling is a one-shot event on the host side, so scroll codes are only
//! sent with the press; a release batch made only of scroll codes sends no
//! frame at all.

use dispatch::mode::MAX_KEYS_PER_ACTION;
use embedded_io::Write;
use heapless::Vec;
use platform::hid::mouse;
use platform::{HidTransport, Keypress};
use serde::{Deserialize, Serialize};

/// Upper bound of one encoded frame, delimiter included.
pub const MAX_FRAME_LEN: usize = 32;

/// One key inside a bridge frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeKey {
    /// Plain key or button, asserted until the matching release
    Key(Keypress),
    /// Mouse wheel movement; positive scrolls towards the user
    Scroll {
        /// Wheel detents reported to the host
        amount: i8,
    },
}

/// One message on the bridge link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeFrame {
    /// Key-down for every key
    Press {
        /// Keys of the action
        keys: Vec<BridgeKey, MAX_KEYS_PER_ACTION>,
    },
    /// Key-up for every key
    Release {
        /// Keys of the action
        keys: Vec<BridgeKey, MAX_KEYS_PER_ACTION>,
    },
}

impl BridgeFrame {
    /// Keys carried by the frame.
    pub fn keys(&self) -> &[BridgeKey] {
        match self {
            BridgeFrame::Press { keys } | BridgeFrame::Release { keys } => keys,
        }
    }
}

/// [`HidTransport`] writing [`BridgeFrame`]s to a byte link.
pub struct SerialHidBridge<W> {
    link: W,
    scroll_amount: i8,
    dropped: u32,
}

impl<W: Write> SerialHidBridge<W> {
    /// Bridge over `link`; scroll codes report `scroll_amount` detents.
    pub fn new(link: W, scroll_amount: i8) -> Self {
        Self {
            link,
            scroll_amount,
            dropped: 0,
        }
    }

    /// Frames that could not be encoded or written.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// The underlying link.
    pub fn link(&self) -> &W {
        &self.link
    }

    /// Release the link.
    pub fn into_inner(self) -> W {
        self.link
    }

    fn bridge_key(&self, key: Keypress) -> BridgeKey {
        match key {
            Keypress::Mouse(mouse::SCROLL_POSITIVE) => BridgeKey::Scroll {
                amount: self.scroll_amount,
            },
            Keypress::Mouse(mouse::SCROLL_NEGATIVE) => BridgeKey::Scroll {
                amount: self.scroll_amount.saturating_neg(),
            },
            other => BridgeKey::Key(other),
        }
    }

    fn send(&mut self, frame: &BridgeFrame) {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let written = match postcard::to_slice_cobs(frame, &mut buf) {
            Ok(encoded) => self.link.write_all(encoded).and_then(|()| self.link.flush()),
            Err(_) => {
                self.dropped = self.dropped.saturating_add(1);
                #[cfg(feature = "defmt")]
                defmt::warn!("HID bridge frame did not fit {} bytes", MAX_FRAME_LEN);
                return;
            }
        };
        if written.is_err() {
            self.dropped = self.dropped.saturating_add(1);
            #[cfg(feature = "defmt")]
            defmt::warn!("HID bridge link write failed ({} dropped)", self.dropped);
        }
    }
}

impl<W: Write> HidTransport for SerialHidBridge<W> {
    fn press(&mut self, keys: &[Keypress]) {
        let keys: Vec<BridgeKey, MAX_KEYS_PER_ACTION> = keys
            .iter()
            .take(MAX_KEYS_PER_ACTION)
            .map(|&key| self.bridge_key(key))
            .collect();
        self.send(&BridgeFrame::Press { keys });
    }

    fn release(&mut self, keys: &[Keypress]) {
        let keys: Vec<BridgeKey, MAX_KEYS_PER_ACTION> = keys
            .iter()
            .filter(|key| !matches!(key, Keypress::Mouse(code) if mouse::is_scroll(*code)))
            .take(MAX_KEYS_PER_ACTION)
            .map(|&key| BridgeKey::Key(key))
            .collect();
        if keys.is_empty() {
            return;
        }
        self.send(&BridgeFrame::Release { keys });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use platform::hid::{consumer, keyboard};

    /// Byte sink collecting everything written.
    #[derive(Default)]
    struct Sink {
        bytes: std::vec::Vec<u8>,
        broken: bool,
    }

    #[derive(Debug)]
    struct LinkDown;

    impl embedded_io::Error for LinkDown {
        fn kind(&self) -> embedded_io::ErrorKind {
            embedded_io::ErrorKind::BrokenPipe
        }
    }

    impl embedded_io::ErrorType for Sink {
        type Error = LinkDown;
    }

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            if self.broken {
                return Err(LinkDown);
            }
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    /// Split the stream on the COBS delimiter and decode every frame.
    fn frames(bytes: &[u8]) -> std::vec::Vec<BridgeFrame> {
        bytes
            .split_inclusive(|&b| b == 0)
            .map(|chunk| postcard::from_bytes_cobs(&mut chunk.to_vec()).unwrap())
            .collect()
    }

    fn keys(list: &[BridgeKey]) -> Vec<BridgeKey, MAX_KEYS_PER_ACTION> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_press_release_frames_decode() {
        let mut bridge = SerialHidBridge::new(Sink::default(), 5);
        let batch = [Keypress::Consumer(consumer::VOLUME_UP)];
        bridge.press(&batch);
        bridge.release(&batch);

        let decoded = frames(&bridge.link().bytes);
        assert_eq!(
            decoded,
            [
                BridgeFrame::Press {
                    keys: keys(&[BridgeKey::Key(batch[0])])
                },
                BridgeFrame::Release {
                    keys: keys(&[BridgeKey::Key(batch[0])])
                },
            ]
        );
    }

    #[test]
    fn test_chord_stays_in_one_frame() {
        let mut bridge = SerialHidBridge::new(Sink::default(), 5);
        let chord = [
            Keypress::Keyboard(keyboard::LEFT_CTRL),
            Keypress::Keyboard(keyboard::LEFT_GUI),
            Keypress::Keyboard(keyboard::RIGHT_ARROW),
        ];
        bridge.press(&chord);
        let decoded = frames(&bridge.link().bytes);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].keys().len(), 3);
    }

    #[test]
    fn test_scroll_codes_carry_amount_and_sign() {
        let mut bridge = SerialHidBridge::new(Sink::default(), 5);
        bridge.press(&[Keypress::Mouse(mouse::SCROLL_POSITIVE)]);
        bridge.press(&[Keypress::Mouse(mouse::SCROLL_NEGATIVE)]);
        let decoded = frames(&bridge.link().bytes);
        assert_eq!(decoded[0].keys(), [BridgeKey::Scroll { amount: 5 }]);
        assert_eq!(decoded[1].keys(), [BridgeKey::Scroll { amount: -5 }]);
    }

    #[test]
    fn test_scroll_only_release_sends_nothing() {
        let mut bridge = SerialHidBridge::new(Sink::default(), 5);
        bridge.release(&[Keypress::Mouse(mouse::SCROLL_POSITIVE)]);
        assert!(bridge.link().bytes.is_empty());
    }

    #[test]
    fn test_mouse_buttons_are_plain_keys() {
        let mut bridge = SerialHidBridge::new(Sink::default(), 5);
        bridge.press(&[Keypress::Mouse(mouse::LEFT_CLICK)]);
        let decoded = frames(&bridge.link().bytes);
        assert_eq!(
            decoded[0].keys(),
            [BridgeKey::Key(Keypress::Mouse(mouse::LEFT_CLICK))]
        );
    }

    #[test]
    fn test_frames_are_zero_delimited_and_bounded() {
        let mut bridge = SerialHidBridge::new(Sink::default(), 5);
        bridge.press(&[Keypress::Consumer(u16::MAX); 3]);
        let bytes = &bridge.link().bytes;
        assert_eq!(bytes.last(), Some(&0));
        assert_eq!(bytes.iter().filter(|&&b| b == 0).count(), 1);
        assert!(bytes.len() <= MAX_FRAME_LEN);
    }

    #[test]
    fn test_link_failure_counts_dropped_frames() {
        let sink = Sink {
            broken: true,
            ..Sink::default()
        };
        let mut bridge = SerialHidBridge::new(sink, 5);
        bridge.press(&[Keypress::Keyboard(keyboard::SPACE)]);
        bridge.release(&[Keypress::Keyboard(keyboard::SPACE)]);
        assert_eq!(bridge.dropped(), 2);
    }
}
