//! Status screen renderer
//!
//! Draws a [`DisplayFrame`] onto a [`BufferedDisplay`]:
//!
//! ```text
//! ┌────────────────────────────┐
//! │           Media            │  mode name, centered
//! │Prev        Play        Next│  left / middle / right labels,
//! │<<          Pause         >>│  split on '\n'
//! │-          Volume          +│  wheel labels around the wheel name
//! │           +                │  last action / toggle marker
//! └────────────────────────────┘
//! ```
//!
//! While the frame is idle only [`SCREENSAVER_TEXT`] is drawn, at a position
//! that moves on every [`StatusRenderer::drift`].

// Label widths are bounded by the mode table's 10-character limit, so the
// pixel arithmetic stays far from overflow.
#![allow(clippy::arithmetic_side_effects)]

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_7X14};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use platform::{DisplayFrame, StatusDisplay};

use super::{BufferedDisplay, DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// Shown, drifting, while the screensaver is active.
pub const SCREENSAVER_TEXT: &str = "scrnsvr";

/// Shown on the status row while a toggle override is active and no
/// feedback label is pending.
pub const TOGGLE_MARKER: &str = "~toggle~";

/// Horizontal placement of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justify {
    /// Flush with the left edge
    Left,
    /// Centered on the panel
    Center,
    /// Flush with the right edge
    Right,
}

impl Justify {
    /// Left x coordinate for text `width` pixels wide. Never negative; text
    /// wider than the panel starts at 0 and is clipped on the right.
    pub fn x(self, width: u32) -> i32 {
        let free = DISPLAY_WIDTH.saturating_sub(width);
        let x = match self {
            Justify::Left => 0,
            Justify::Center => free / 2,
            Justify::Right => free,
        };
        i32::try_from(x).unwrap_or(0)
    }
}

/// Vertical placement of each screen region, in pixels.
#[derive(Clone, Copy)]
pub struct Layout {
    /// Font for every label
    pub font: &'static MonoFont<'static>,
    /// Top of the mode name
    pub mode_y: i32,
    /// Top of the first line of the button labels
    pub buttons_y: i32,
    /// Top of the wheel row
    pub wheel_y: i32,
    /// Top of the status row (last action / toggle marker). When it equals
    /// `mode_y` the status text replaces the mode name while present.
    pub status_y: i32,
}

impl Layout {
    /// Pixel width of `text` in this layout's font.
    pub fn text_width(&self, text: &str) -> u32 {
        let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        let advance = self.font.character_size.width + self.font.character_spacing;
        chars
            .saturating_mul(advance)
            .saturating_sub(self.font.character_spacing)
    }

    /// Height of one text line.
    pub fn line_height(&self) -> i32 {
        i32::try_from(self.font.character_size.height).unwrap_or(0)
    }

    fn status_replaces_mode(&self) -> bool {
        self.status_y == self.mode_y
    }
}

/// The two built-in layouts: small font (separate status row) and large font
/// (status shares the mode row).
pub static LAYOUTS: [Layout; 2] = [
    Layout {
        font: &FONT_6X10,
        mode_y: 0,
        buttons_y: 12,
        wheel_y: 34,
        status_y: 54,
    },
    Layout {
        font: &FONT_7X14,
        mode_y: 0,
        buttons_y: 16,
        wheel_y: 48,
        status_y: 0,
    },
];

/// [`StatusDisplay`] implementation drawing with embedded-graphics.
pub struct StatusRenderer<D> {
    display: D,
    layout: &'static Layout,
    frame: DisplayFrame,
    drift_step: u16,
    failures: u32,
}

impl<D: BufferedDisplay> StatusRenderer<D> {
    /// Renderer using the small layout. Nothing is drawn until the first
    /// [`show`](StatusDisplay::show).
    pub fn new(display: D) -> Self {
        Self {
            display,
            layout: &LAYOUTS[0],
            frame: DisplayFrame::BLANK,
            drift_step: 0,
            failures: 0,
        }
    }

    /// Switch layout and redraw the current frame.
    pub fn set_layout(&mut self, layout: &'static Layout) {
        self.layout = layout;
        self.redraw();
    }

    /// Active layout.
    pub fn layout(&self) -> &'static Layout {
        self.layout
    }

    /// Move the screensaver text. Redraws only while idle.
    pub fn drift(&mut self) {
        self.drift_step = self.drift_step.wrapping_add(1);
        if self.frame.idle {
            self.redraw();
        }
    }

    /// Top-left corner of the screensaver text for the current drift step.
    pub fn screensaver_origin(&self) -> Point {
        let max_x = DISPLAY_WIDTH.saturating_sub(self.layout.text_width(SCREENSAVER_TEXT));
        let max_y = DISPLAY_HEIGHT.saturating_sub(self.layout.font.character_size.height);
        let step = u32::from(self.drift_step);
        // Two co-prime strides walk the free area without a visible pattern.
        let x = step.wrapping_mul(37).checked_rem(max_x + 1).unwrap_or(0);
        let y = step.wrapping_mul(23).checked_rem(max_y + 1).unwrap_or(0);
        Point::new(
            i32::try_from(x).unwrap_or(0),
            i32::try_from(y).unwrap_or(0),
        )
    }

    /// Number of draw or flush operations that failed.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// The wrapped display.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Mutable access to the wrapped display.
    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    fn redraw(&mut self) {
        if self.draw().is_err() {
            self.failures = self.failures.saturating_add(1);
            #[cfg(feature = "defmt")]
            defmt::warn!("status screen update failed ({} so far)", self.failures);
        }
    }

    fn draw(&mut self) -> Result<(), D::Error> {
        self.display.clear(BinaryColor::Off)?;
        let frame = self.frame;
        let layout = self.layout;

        if frame.idle {
            let origin = self.screensaver_origin();
            self.label_at(SCREENSAVER_TEXT, origin.x, origin.y)?;
            return self.display.flush();
        }

        let status = frame
            .last_action
            .or(if frame.toggled { Some(TOGGLE_MARKER) } else { None });

        match status {
            Some(text) if layout.status_replaces_mode() => {
                self.label(text, Justify::Center, layout.mode_y)?;
            }
            _ => self.label(frame.mode_name, Justify::Center, layout.mode_y)?,
        }

        self.label(frame.left, Justify::Left, layout.buttons_y)?;
        self.label(frame.middle, Justify::Center, layout.buttons_y)?;
        self.label(frame.right, Justify::Right, layout.buttons_y)?;

        self.label(frame.wheel_ccw, Justify::Left, layout.wheel_y)?;
        self.label(frame.wheel_name, Justify::Center, layout.wheel_y)?;
        self.label(frame.wheel_cw, Justify::Right, layout.wheel_y)?;

        if let Some(text) = status {
            if !layout.status_replaces_mode() {
                self.label(text, Justify::Center, layout.status_y)?;
            }
        }

        self.display.flush()
    }

    /// Draw a possibly multi-line label, each line justified on its own.
    fn label(&mut self, label: &str, justify: Justify, top: i32) -> Result<(), D::Error> {
        let mut y = top;
        for line in DisplayFrame::lines(label) {
            let x = justify.x(self.layout.text_width(line));
            self.label_at(line, x, y)?;
            y = y.saturating_add(self.layout.line_height());
        }
        Ok(())
    }

    fn label_at(&mut self, line: &str, x: i32, y: i32) -> Result<(), D::Error> {
        if line.is_empty() {
            return Ok(());
        }
        let style = MonoTextStyle::new(self.layout.font, BinaryColor::On);
        Text::with_baseline(line, Point::new(x, y), style, Baseline::Top)
            .draw(&mut self.display)?;
        Ok(())
    }
}

impl<D: BufferedDisplay> StatusDisplay for StatusRenderer<D> {
    fn show(&mut self, frame: &DisplayFrame) {
        self.frame = *frame;
        self.redraw();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::cast_sign_loss)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    /// In-memory 128×64 canvas.
    struct Canvas {
        pixels: [[bool; DISPLAY_WIDTH as usize]; DISPLAY_HEIGHT as usize],
        flushes: u32,
        fail: bool,
    }

    impl Canvas {
        fn new() -> Self {
            Self {
                pixels: [[false; DISPLAY_WIDTH as usize]; DISPLAY_HEIGHT as usize],
                flushes: 0,
                fail: false,
            }
        }

        fn lit_in(&self, x: core::ops::Range<usize>, y: core::ops::Range<usize>) -> usize {
            y.flat_map(|row| x.clone().map(move |col| (col, row)))
                .filter(|&(col, row)| self.pixels[row][col])
                .count()
        }

        fn lit(&self) -> usize {
            self.lit_in(0..DISPLAY_WIDTH as usize, 0..DISPLAY_HEIGHT as usize)
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl OriginDimensions for Canvas {
        fn size(&self) -> Size {
            Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
        }
    }

    impl DrawTarget for Canvas {
        type Color = BinaryColor;
        type Error = Broken;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            if self.fail {
                return Err(Broken);
            }
            for Pixel(p, c) in pixels {
                if p.x >= 0 && p.y >= 0 && p.x < DISPLAY_WIDTH as i32 && p.y < DISPLAY_HEIGHT as i32 {
                    self.pixels[p.y as usize][p.x as usize] = c.is_on();
                }
            }
            Ok(())
        }
    }

    impl BufferedDisplay for Canvas {
        fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushes += 1;
            Ok(())
        }
    }

    fn media() -> DisplayFrame {
        DisplayFrame {
            mode_name: "Media",
            wheel_name: "Volume",
            left: "Prev\n<<",
            right: "Next\n>>",
            middle: "Play\nPause",
            wheel_ccw: "-",
            wheel_cw: "+",
            ..DisplayFrame::BLANK
        }
    }

    #[test]
    fn test_justify_positions() {
        assert_eq!(Justify::Left.x(30), 0);
        assert_eq!(Justify::Center.x(28), 50);
        assert_eq!(Justify::Right.x(30), 98);
        assert_eq!(Justify::Right.x(500), 0);
    }

    #[test]
    fn test_text_width_small_font() {
        let layout = &LAYOUTS[0];
        assert_eq!(layout.text_width(""), 0);
        assert_eq!(layout.text_width("Media"), 30);
    }

    #[test]
    fn test_show_draws_and_flushes_once() {
        let mut r = StatusRenderer::new(Canvas::new());
        r.show(&media());
        assert_eq!(r.display().flushes, 1);
        assert!(r.display().lit() > 0);
        assert_eq!(r.failures(), 0);
    }

    #[test]
    fn test_right_label_hugs_right_edge() {
        let mut r = StatusRenderer::new(Canvas::new());
        let frame = DisplayFrame {
            right: "Next",
            ..DisplayFrame::BLANK
        };
        r.show(&frame);
        let canvas = r.display();
        // "Next" is 24 px wide in 6x10, so it occupies x 104..128.
        assert!(canvas.lit_in(104..128, 12..22) > 0);
        assert_eq!(canvas.lit_in(0..104, 0..64), 0);
    }

    #[test]
    fn test_second_line_goes_below_first() {
        let mut r = StatusRenderer::new(Canvas::new());
        let frame = DisplayFrame {
            left: "A\nB",
            ..DisplayFrame::BLANK
        };
        r.show(&frame);
        let canvas = r.display();
        assert!(canvas.lit_in(0..6, 12..22) > 0);
        assert!(canvas.lit_in(0..6, 22..32) > 0);
    }

    #[test]
    fn test_idle_shows_only_screensaver_text() {
        let mut r = StatusRenderer::new(Canvas::new());
        let frame = DisplayFrame {
            idle: true,
            ..media()
        };
        r.show(&frame);
        let origin = r.screensaver_origin();
        let width = r.layout().text_width(SCREENSAVER_TEXT) as usize;
        let (x, y) = (origin.x as usize, origin.y as usize);
        let canvas = r.display();
        let inside = canvas.lit_in(x..x + width, y..y + 10);
        assert!(inside > 0);
        assert_eq!(canvas.lit(), inside);
    }

    #[test]
    fn test_drift_moves_screensaver_only_while_idle() {
        let mut r = StatusRenderer::new(Canvas::new());
        r.show(&media());
        r.drift();
        assert_eq!(r.display().flushes, 1, "no redraw while active");

        r.show(&DisplayFrame {
            idle: true,
            ..media()
        });
        let before = r.screensaver_origin();
        r.drift();
        assert_ne!(r.screensaver_origin(), before);
        assert_eq!(r.display().flushes, 3);
    }

    #[test]
    fn test_screensaver_stays_on_panel() {
        let mut r = StatusRenderer::new(Canvas::new());
        let width = r.layout().text_width(SCREENSAVER_TEXT) as i32;
        for _ in 0..500 {
            r.drift();
            let o = r.screensaver_origin();
            assert!(o.x >= 0 && o.x + width <= DISPLAY_WIDTH as i32);
            assert!(o.y >= 0 && o.y + 10 <= DISPLAY_HEIGHT as i32);
        }
    }

    #[test]
    fn test_status_row_shows_feedback_or_toggle_marker() {
        let mut r = StatusRenderer::new(Canvas::new());
        r.show(&DisplayFrame::BLANK);
        assert_eq!(r.display().lit_in(0..128, 54..64), 0);

        r.show(&DisplayFrame {
            toggled: true,
            ..DisplayFrame::BLANK
        });
        assert!(r.display().lit_in(0..128, 54..64) > 0);

        r.show(&DisplayFrame {
            last_action: Some("+"),
            ..DisplayFrame::BLANK
        });
        assert!(r.display().lit_in(0..128, 54..64) > 0);
    }

    #[test]
    fn test_large_layout_status_replaces_mode_name() {
        let mut r = StatusRenderer::new(Canvas::new());
        r.set_layout(&LAYOUTS[1]);
        r.show(&DisplayFrame {
            mode_name: "Media",
            ..DisplayFrame::BLANK
        });
        let name_only = r.display().pixels;

        r.show(&DisplayFrame {
            mode_name: "Media",
            last_action: Some("+"),
            ..DisplayFrame::BLANK
        });
        assert_ne!(r.display().pixels, name_only);
        // A single '+' is narrower than "Media"; nothing left of its cell.
        assert_eq!(r.display().lit_in(0..60, 0..14), 0);
    }

    #[test]
    fn test_draw_failure_is_counted_not_propagated() {
        let mut canvas = Canvas::new();
        canvas.fail = true;
        let mut r = StatusRenderer::new(canvas);
        r.show(&media());
        r.show(&media());
        assert_eq!(r.failures(), 2);
        assert_eq!(r.display().flushes, 0);
    }
}
