//! Whole-device tests: the shipped mode table, the serial HID bridge and the
//! status renderer driven by the engine, with the GPIO and UART replaced by
//! in-memory stand-ins.
#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::arithmetic_side_effects
)]

use core::convert::Infallible;

use dispatch::{Engine, TickAccumulator};
use embassy_time::Instant;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use firmware::display::SCREENSAVER_TEXT;
use firmware::{
    modes, BridgeFrame, BridgeKey, BufferedDisplay, SerialHidBridge, StatusRenderer,
    DISPLAY_HEIGHT, DISPLAY_WIDTH,
};
use platform::hid::{consumer, mouse};
use platform::mocks::MockLines;
use platform::{Control, Direction, Keypress, TimingConfig};

// ---------------------------------------------------------------------------
// Stand-ins
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Uart {
    bytes: Vec<u8>,
}

impl embedded_io::ErrorType for Uart {
    type Error = Infallible;
}

impl embedded_io::Write for Uart {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

struct Panel {
    pixels: Vec<bool>,
}

impl Panel {
    fn new() -> Self {
        Self {
            pixels: vec![false; (DISPLAY_WIDTH * DISPLAY_HEIGHT) as usize],
        }
    }

    fn lit_in(&self, x: core::ops::Range<u32>, y: core::ops::Range<u32>) -> usize {
        y.flat_map(|row| x.clone().map(move |col| (col, row)))
            .filter(|&(col, row)| self.pixels[(row * DISPLAY_WIDTH + col) as usize])
            .count()
    }

    fn lit(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }
}

impl OriginDimensions for Panel {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

impl DrawTarget for Panel {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if p.x >= 0 && p.y >= 0 && p.x < DISPLAY_WIDTH as i32 && p.y < DISPLAY_HEIGHT as i32 {
                self.pixels[(p.y as u32 * DISPLAY_WIDTH + p.x as u32) as usize] = c.is_on();
            }
        }
        Ok(())
    }
}

impl BufferedDisplay for Panel {
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Rig
// ---------------------------------------------------------------------------

struct Device<'a> {
    engine: Engine<'a, SerialHidBridge<Uart>, StatusRenderer<Panel>>,
    ticks: &'a TickAccumulator,
    lines: MockLines,
    now: u64,
}

impl<'a> Device<'a> {
    fn boot(ticks: &'a TickAccumulator, timing: TimingConfig) -> Self {
        let engine = Engine::new(
            modes::table().unwrap(),
            timing,
            ticks,
            SerialHidBridge::new(Uart::default(), timing.mouse_scroll_amount),
            StatusRenderer::new(Panel::new()),
            Instant::from_millis(0),
        )
        .unwrap();
        Self {
            engine,
            ticks,
            lines: MockLines::new(),
            now: 0,
        }
    }

    fn advance(&mut self, millis: u64) {
        for _ in 0..millis {
            self.now += 1;
            self.engine
                .run_pass(&self.lines, Instant::from_millis(self.now));
        }
    }

    fn tap(&mut self, control: Control) {
        self.lines.set(control, true);
        self.advance(100);
        self.lines.set(control, false);
        self.advance(50);
    }

    fn frames(&self) -> Vec<BridgeFrame> {
        self.engine
            .transport()
            .link()
            .bytes
            .split_inclusive(|&b| b == 0)
            .map(|chunk| postcard::from_bytes_cobs(&mut chunk.to_vec()).unwrap())
            .collect()
    }

    fn panel(&self) -> &Panel {
        self.engine.display().display()
    }
}

fn one(key: BridgeKey) -> heapless::Vec<BridgeKey, 3> {
    let mut keys = heapless::Vec::new();
    keys.push(key).unwrap();
    keys
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_boots_into_media_with_labels_on_screen() {
    let ticks = TickAccumulator::new();
    let device = Device::boot(&ticks, TimingConfig::RELEASE);
    assert_eq!(device.engine.frame().mode_name, "Media");
    // Mode name row and both button columns are drawn.
    assert!(device.panel().lit_in(0..128, 0..10) > 0);
    assert!(device.panel().lit_in(0..30, 12..32) > 0);
    assert!(device.panel().lit_in(98..128, 12..32) > 0);
    assert!(device.frames().is_empty());
}

#[test]
fn test_wheel_detent_reaches_bridge_as_press_then_release() {
    let ticks = TickAccumulator::new();
    let mut device = Device::boot(&ticks, TimingConfig::RELEASE);
    device.ticks.record(Direction::Clockwise);
    device.advance(20);

    let key = BridgeKey::Key(Keypress::Consumer(consumer::VOLUME_UP));
    assert_eq!(
        device.frames(),
        [
            BridgeFrame::Press { keys: one(key) },
            BridgeFrame::Release { keys: one(key) },
        ]
    );
}

#[test]
fn test_mouse_mode_scrolls_with_configured_amount() {
    let ticks = TickAccumulator::new();
    let mut device = Device::boot(&ticks, TimingConfig::RELEASE);
    // Media → VLC → YouTube → Mouse
    for _ in 0..3 {
        device.tap(Control::Down);
    }
    assert_eq!(device.engine.frame().mode_name, "Mouse");
    assert!(device.frames().is_empty(), "navigation sends no keys");

    device.ticks.record(Direction::CounterClockwise);
    device.advance(20);
    assert_eq!(
        device.frames(),
        [BridgeFrame::Press {
            keys: one(BridgeKey::Scroll { amount: -5 })
        }]
    );

    device.tap(Control::Left);
    let frames = device.frames();
    assert_eq!(
        frames[1..],
        [
            BridgeFrame::Press {
                keys: one(BridgeKey::Key(Keypress::Mouse(mouse::LEFT_CLICK)))
            },
            BridgeFrame::Release {
                keys: one(BridgeKey::Key(Keypress::Mouse(mouse::LEFT_CLICK)))
            },
        ]
    );
}

#[test]
fn test_idle_panel_shows_only_screensaver() {
    let ticks = TickAccumulator::new();
    let mut device = Device::boot(&ticks, TimingConfig::BENCH);
    device.advance(3_001);
    assert!(device.engine.is_idle());

    let renderer = device.engine.display();
    let origin = renderer.screensaver_origin();
    let width = renderer.layout().text_width(SCREENSAVER_TEXT);
    let (x, y) = (origin.x as u32, origin.y as u32);
    let inside = device.panel().lit_in(x..x + width, y..y + 10);
    assert!(inside > 0);
    assert_eq!(device.panel().lit(), inside);
}

#[test]
fn test_drift_and_wake_redraw_the_panel() {
    let ticks = TickAccumulator::new();
    let mut device = Device::boot(&ticks, TimingConfig::BENCH);
    device.advance(3_001);
    let before = device.panel().pixels.clone();
    device.engine.display_mut().drift();
    assert_ne!(device.panel().pixels, before);

    // The first input wakes the screen and still acts.
    device.ticks.record(Direction::Clockwise);
    device.advance(20);
    assert!(!device.engine.is_idle());
    assert_eq!(device.frames().len(), 2);
    assert!(device.panel().lit_in(0..128, 0..10) > 0);
}
