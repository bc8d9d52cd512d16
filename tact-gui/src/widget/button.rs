use embedded_graphics::geometry::Point;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::primitives::Rectangle;
use crate::canvas::{Canvas, CanvasError, DisplayTransport, Font};
use crate::theme::Theme;
use crate::widget::{Appearance, View};

/// A rounded button with a centred label.
///
/// Colours come from the [Theme] unless overridden here.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Button<'a> {
    pub label: &'a str,
    pub font: Option<Font>,
    pub fill: Option<Rgb565>,
    pub fill_clicked: Option<Rgb565>,
    pub text_clicked: Option<Rgb565>,
}

impl<'a> Button<'a> {
    pub const fn new(label: &'a str) -> Self {
        Self {
            label,
            font: None,
            fill: None,
            fill_clicked: None,
            text_clicked: None,
        }
    }

    pub const fn with_fill(mut self, fill: Rgb565) -> Self {
        self.fill = Some(fill);
        self
    }

    pub const fn with_clicked_colors(mut self, fill: Option<Rgb565>, text: Option<Rgb565>) -> Self {
        self.fill_clicked = fill;
        self.text_clicked = text;
        self
    }

    pub const fn with_font(mut self, font: Font) -> Self {
        self.font = Some(font);
        self
    }

    /// Fill, border and text colour actually used for the given state.
    pub fn colors(&self, appearance: Appearance, theme: &Theme) -> (Rgb565, Rgb565, Rgb565) {
        let (fill, border, text) = theme.button_colors(appearance);
        match appearance {
            Appearance::Idle => (self.fill.unwrap_or(fill), border, text),
            Appearance::Active => (fill, border, text),
            Appearance::Clicked => (
                self.fill_clicked.or(self.fill).unwrap_or(fill),
                border,
                self.text_clicked.unwrap_or(text),
            ),
        }
    }

    fn label_position(&self, bounds: Rectangle, font: Font) -> Point {
        let width = font.text_width(self.label) as i32;
        let height = font.line_height() as i32;
        bounds.top_left
            + Point::new(
                (bounds.size.width as i32 - width) / 2,
                (bounds.size.height as i32 - height) / 2,
            )
    }
}

impl<'a> View<'a> for Button<'a> {
    fn draw<T: DisplayTransport, const B: usize>(
        &self,
        bounds: Rectangle,
        appearance: Appearance,
        theme: &Theme,
        canvas: &mut Canvas<'a, T, B>,
    ) -> Result<(), CanvasError<T::Error>> {
        let (fill, border, text) = self.colors(appearance, theme);
        let font = self.font.unwrap_or(theme.font);

        canvas.draw_rectangle_rounded_filled(bounds, theme.corner_radius, fill)?;
        canvas.draw_rectangle_rounded(bounds, theme.corner_radius, border)?;
        canvas.draw_string(self.label_position(bounds, font), text, font, self.label)
    }
}
