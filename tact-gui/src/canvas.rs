//! Batched drawing.
//!
//! Widgets never talk to the display directly. They push [DrawCommand]s onto a [Canvas], which
//! collects them and hands the whole batch to the [DisplayTransport] in a single call when
//! [Canvas::execute] is called. The display sits on a slow bus, so the fewer round trips the
//! better.

use core::fmt::{Debug, Display, Formatter};
use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_8X13, FONT_8X13_BOLD};
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::Pixel;
use heapless::Vec;

#[cfg(feature = "defmt")]
use defmt::trace;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Font {
    Small,
    Regular,
    Bold,
}

impl Font {
    pub fn mono(self) -> &'static MonoFont<'static> {
        match self {
            Font::Small => &FONT_6X10,
            Font::Regular => &FONT_8X13,
            Font::Bold => &FONT_8X13_BOLD,
        }
    }

    /// Width of `text` in pixels when drawn in this font.
    pub fn text_width(self, text: &str) -> u32 {
        let font = self.mono();
        let chars = text.chars().count() as u32;
        if chars == 0 {
            return 0;
        }
        chars * font.character_size.width + (chars - 1) * font.character_spacing
    }

    pub fn line_height(self) -> u32 {
        self.mono().character_size.height
    }
}

/// A 16x16 single-colour glyph. Each row is a bitmask, most significant bit leftmost.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Icon(pub [u16; 16]);

impl Icon {
    pub fn pixels(&self, top_left: Point, color: Rgb565) -> impl Iterator<Item = Pixel<Rgb565>> + '_ {
        self.0.iter().enumerate().flat_map(move |(row, bits)| {
            (0..16).filter_map(move |col| {
                (bits & (0x8000 >> col) != 0)
                    .then(|| Pixel(top_left + Point::new(col, row as i32), color))
            })
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DrawCommand<'a> {
    /// Fill the whole screen.
    Fill(Rgb565),
    Rectangle {
        rect: Rectangle,
        color: Rgb565,
        filled: bool,
    },
    RoundedRectangle {
        rect: Rectangle,
        radius: u32,
        color: Rgb565,
        filled: bool,
    },
    Line {
        start: Point,
        end: Point,
        color: Rgb565,
    },
    CircleFilled {
        center: Point,
        radius: u32,
        color: Rgb565,
    },
    /// Raw pixels, row by row.
    Bitmap {
        top_left: Point,
        size: Size,
        pixels: &'a [Rgb565],
    },
    /// `position` is the top left corner of the first character.
    Text {
        position: Point,
        color: Rgb565,
        font: Font,
        text: &'a str,
    },
    Icon {
        top_left: Point,
        color: Rgb565,
        icon: &'a Icon,
    },
    ProgressBar {
        rect: Rectangle,
        radius: u32,
        border: Rgb565,
        background: Rgb565,
        fill: Rgb565,
        /// Clamped to 100.
        percent: u8,
    },
}

/// The display side of a [Canvas].
pub trait DisplayTransport {
    type Error;

    /// Draw every command in `batch`, in order. Must not return before the I/O is complete.
    fn submit(&mut self, batch: &[DrawCommand<'_>]) -> Result<(), Self::Error>;
}

impl<T: DisplayTransport + ?Sized> DisplayTransport for &mut T {
    type Error = T::Error;

    fn submit(&mut self, batch: &[DrawCommand<'_>]) -> Result<(), Self::Error> {
        (**self).submit(batch)
    }
}

pub enum CanvasError<E> {
    Transport(E),
    /// The canvas was created with a batch capacity of zero.
    NoCapacity,
}

impl<E> From<E> for CanvasError<E> {
    fn from(value: E) -> Self {
        Self::Transport(value)
    }
}

impl<E: Debug> Debug for CanvasError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "Transport({e:?})"),
            Self::NoCapacity => write!(f, "NoCapacity"),
        }
    }
}

impl<E: Display> Display for CanvasError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "display transport error: {e}"),
            Self::NoCapacity => write!(f, "draw batch has no capacity"),
        }
    }
}

impl<E: Debug + Display> core::error::Error for CanvasError<E> {}

/// Collects up to `N` draw commands between flushes.
pub struct Canvas<'a, T, const N: usize> {
    transport: T,
    size: Size,
    batch: Vec<DrawCommand<'a>, N>,
}

impl<'a, T: DisplayTransport, const N: usize> Canvas<'a, T, N> {
    pub fn new(transport: T, size: Size) -> Self {
        Self {
            transport,
            size,
            batch: Vec::new(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn bounding_box(&self) -> Rectangle {
        Rectangle::new(Point::zero(), self.size)
    }

    /// Commands queued since the last flush.
    pub fn pending(&self) -> &[DrawCommand<'a>] {
        &self.batch
    }

    /// Queue a command. If the batch is already full, it is flushed first.
    pub fn push(&mut self, command: DrawCommand<'a>) -> Result<(), CanvasError<T::Error>> {
        if self.batch.is_full() {
            self.execute()?;
        }
        self.batch.push(command).map_err(|_| CanvasError::NoCapacity)
    }

    /// Fill the screen. Anything still queued would be painted over, so it is dropped.
    pub fn fill(&mut self, color: Rgb565) -> Result<(), CanvasError<T::Error>> {
        self.batch.clear();
        self.push(DrawCommand::Fill(color))
    }

    pub fn draw_rectangle(&mut self, rect: Rectangle, color: Rgb565) -> Result<(), CanvasError<T::Error>> {
        self.push(DrawCommand::Rectangle { rect, color, filled: false })
    }

    pub fn draw_rectangle_filled(&mut self, rect: Rectangle, color: Rgb565) -> Result<(), CanvasError<T::Error>> {
        self.push(DrawCommand::Rectangle { rect, color, filled: true })
    }

    pub fn draw_rectangle_rounded(
        &mut self,
        rect: Rectangle,
        radius: u32,
        color: Rgb565,
    ) -> Result<(), CanvasError<T::Error>> {
        self.push(DrawCommand::RoundedRectangle { rect, radius, color, filled: false })
    }

    pub fn draw_rectangle_rounded_filled(
        &mut self,
        rect: Rectangle,
        radius: u32,
        color: Rgb565,
    ) -> Result<(), CanvasError<T::Error>> {
        self.push(DrawCommand::RoundedRectangle { rect, radius, color, filled: true })
    }

    pub fn draw_line(&mut self, start: Point, end: Point, color: Rgb565) -> Result<(), CanvasError<T::Error>> {
        self.push(DrawCommand::Line { start, end, color })
    }

    pub fn draw_circle_filled(&mut self, center: Point, radius: u32, color: Rgb565) -> Result<(), CanvasError<T::Error>> {
        self.push(DrawCommand::CircleFilled { center, radius, color })
    }

    pub fn draw_bitmap(&mut self, top_left: Point, size: Size, pixels: &'a [Rgb565]) -> Result<(), CanvasError<T::Error>> {
        self.push(DrawCommand::Bitmap { top_left, size, pixels })
    }

    pub fn draw_string(
        &mut self,
        position: Point,
        color: Rgb565,
        font: Font,
        text: &'a str,
    ) -> Result<(), CanvasError<T::Error>> {
        self.push(DrawCommand::Text { position, color, font, text })
    }

    pub fn draw_icon(&mut self, top_left: Point, color: Rgb565, icon: &'a Icon) -> Result<(), CanvasError<T::Error>> {
        self.push(DrawCommand::Icon { top_left, color, icon })
    }

    pub fn draw_progress_bar(
        &mut self,
        rect: Rectangle,
        radius: u32,
        border: Rgb565,
        background: Rgb565,
        fill: Rgb565,
        percent: u8,
    ) -> Result<(), CanvasError<T::Error>> {
        self.push(DrawCommand::ProgressBar {
            rect,
            radius,
            border,
            background,
            fill,
            percent: percent.min(100),
        })
    }

    /// Flush the queued commands to the display in one transaction, returning how many were
    /// sent. An empty batch is not submitted at all.
    ///
    /// If the transport fails, the batch is kept so the caller can retry or [Canvas::discard] it.
    pub fn execute(&mut self) -> Result<usize, CanvasError<T::Error>> {
        if self.batch.is_empty() {
            return Ok(0);
        }

        self.transport.submit(&self.batch)?;
        let sent = self.batch.len();
        self.batch.clear();

        #[cfg(feature = "defmt")]
        trace!("gui: flushed {} draw commands", sent);

        Ok(sent)
    }

    /// Drop everything queued since the last flush.
    pub fn discard(&mut self) {
        self.batch.clear();
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back. Commands that were never flushed are lost.
    pub fn release(self) -> T {
        self.transport
    }
}
