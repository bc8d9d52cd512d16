use embedded_graphics::prelude::*;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, RoundedRectangle};
use embedded_graphics::text::{Baseline, Text};
use crate::canvas::{DisplayTransport, DrawCommand};

/// Rasterizes draw batches onto an embedded-graphics [DrawTarget].
pub struct DrawTargetTransport<D> {
    target: D,
}

impl<D: DrawTarget<Color = Rgb565>> DrawTargetTransport<D> {
    pub fn new(target: D) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut D {
        &mut self.target
    }

    pub fn release(self) -> D {
        self.target
    }

    fn draw(&mut self, command: &DrawCommand<'_>) -> Result<(), D::Error> {
        match *command {
            DrawCommand::Fill(color) => self.target.clear(color),
            DrawCommand::Rectangle { rect, color, filled } => {
                rect.into_styled(style(color, filled)).draw(&mut self.target)
            }
            DrawCommand::RoundedRectangle { rect, radius, color, filled } => {
                RoundedRectangle::with_equal_corners(rect, Size::new(radius, radius))
                    .into_styled(style(color, filled))
                    .draw(&mut self.target)
            }
            DrawCommand::Line { start, end, color } => Line::new(start, end)
                .into_styled(PrimitiveStyle::with_stroke(color, 1))
                .draw(&mut self.target),
            DrawCommand::CircleFilled { center, radius, color } => Circle::with_center(center, radius * 2 + 1)
                .into_styled(PrimitiveStyle::with_fill(color))
                .draw(&mut self.target),
            DrawCommand::Bitmap { top_left, size, pixels } => self
                .target
                .fill_contiguous(&Rectangle::new(top_left, size), pixels.iter().copied()),
            DrawCommand::Text { position, color, font, text } => {
                Text::with_baseline(text, position, MonoTextStyle::new(font.mono(), color), Baseline::Top)
                    .draw(&mut self.target)
                    .map(|_| ())
            }
            DrawCommand::Icon { top_left, color, icon } => self.target.draw_iter(icon.pixels(top_left, color)),
            DrawCommand::ProgressBar { rect, radius, border, background, fill, percent } => {
                let outline = PrimitiveStyleBuilder::new()
                    .fill_color(background)
                    .stroke_color(border)
                    .stroke_width(1)
                    .build();
                RoundedRectangle::with_equal_corners(rect, Size::new(radius, radius))
                    .into_styled(outline)
                    .draw(&mut self.target)?;

                let inner = Size::new(rect.size.width.saturating_sub(2), rect.size.height.saturating_sub(2));
                let filled = inner.width * percent.min(100) as u32 / 100;
                if filled == 0 || inner.height == 0 {
                    return Ok(());
                }

                let inner_radius = radius.saturating_sub(1);
                RoundedRectangle::with_equal_corners(
                    Rectangle::new(rect.top_left + Point::new(1, 1), Size::new(filled, inner.height)),
                    Size::new(inner_radius, inner_radius),
                )
                .into_styled(PrimitiveStyle::with_fill(fill))
                .draw(&mut self.target)
            }
        }
    }
}

fn style(color: Rgb565, filled: bool) -> PrimitiveStyle<Rgb565> {
    if filled {
        PrimitiveStyle::with_fill(color)
    } else {
        PrimitiveStyle::with_stroke(color, 1)
    }
}

impl<D: DrawTarget<Color = Rgb565>> DisplayTransport for DrawTargetTransport<D> {
    type Error = D::Error;

    fn submit(&mut self, batch: &[DrawCommand<'_>]) -> Result<(), Self::Error> {
        for command in batch {
            self.draw(command)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mock_display::MockDisplay;
    use crate::canvas::{Canvas, Font, Icon};

    fn display() -> MockDisplay<Rgb565> {
        let mut display = MockDisplay::new();
        display.set_allow_overdraw(true);
        display
    }

    #[test]
    fn filled_shapes() {
        let mut transport = DrawTargetTransport::new(display());
        transport
            .submit(&[
                DrawCommand::Rectangle {
                    rect: Rectangle::new(Point::new(1, 1), Size::new(2, 2)),
                    color: Rgb565::RED,
                    filled: true,
                },
                DrawCommand::CircleFilled { center: Point::new(20, 20), radius: 3, color: Rgb565::BLUE },
                DrawCommand::Line { start: Point::new(0, 10), end: Point::new(5, 10), color: Rgb565::GREEN },
            ])
            .unwrap();

        let display = transport.release();
        assert_eq!(display.get_pixel(Point::new(1, 1)), Some(Rgb565::RED));
        assert_eq!(display.get_pixel(Point::new(2, 2)), Some(Rgb565::RED));
        assert_eq!(display.get_pixel(Point::new(3, 3)), None);
        assert_eq!(display.get_pixel(Point::new(20, 20)), Some(Rgb565::BLUE));
        assert_eq!(display.get_pixel(Point::new(22, 20)), Some(Rgb565::BLUE));
        assert_eq!(display.get_pixel(Point::new(25, 20)), None);
        assert_eq!(display.get_pixel(Point::new(5, 10)), Some(Rgb565::GREEN));
    }

    #[test]
    fn bitmap_and_icon() {
        let pixels = [Rgb565::RED, Rgb565::GREEN, Rgb565::BLUE, Rgb565::WHITE];
        let mut rows = [0u16; 16];
        rows[1] = 0xc000;
        let icon = Icon(rows);

        let mut transport = DrawTargetTransport::new(display());
        transport
            .submit(&[
                DrawCommand::Bitmap { top_left: Point::new(4, 4), size: Size::new(2, 2), pixels: &pixels },
                DrawCommand::Icon { top_left: Point::new(30, 30), color: Rgb565::YELLOW, icon: &icon },
            ])
            .unwrap();

        let display = transport.target();
        assert_eq!(display.get_pixel(Point::new(4, 4)), Some(Rgb565::RED));
        assert_eq!(display.get_pixel(Point::new(5, 4)), Some(Rgb565::GREEN));
        assert_eq!(display.get_pixel(Point::new(4, 5)), Some(Rgb565::BLUE));
        assert_eq!(display.get_pixel(Point::new(5, 5)), Some(Rgb565::WHITE));
        assert_eq!(display.get_pixel(Point::new(30, 31)), Some(Rgb565::YELLOW));
        assert_eq!(display.get_pixel(Point::new(31, 31)), Some(Rgb565::YELLOW));
        assert_eq!(display.get_pixel(Point::new(32, 31)), None);
        assert_eq!(display.get_pixel(Point::new(30, 30)), None);
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        let mut transport = DrawTargetTransport::new(display());
        transport
            .submit(&[DrawCommand::ProgressBar {
                rect: Rectangle::new(Point::new(0, 0), Size::new(22, 6)),
                radius: 0,
                border: Rgb565::BLACK,
                background: Rgb565::WHITE,
                fill: Rgb565::GREEN,
                percent: 50,
            }])
            .unwrap();

        let display = transport.target();
        assert_eq!(display.get_pixel(Point::new(0, 0)), Some(Rgb565::BLACK));
        assert_eq!(display.get_pixel(Point::new(1, 1)), Some(Rgb565::GREEN));
        assert_eq!(display.get_pixel(Point::new(10, 3)), Some(Rgb565::GREEN));
        assert_eq!(display.get_pixel(Point::new(11, 3)), Some(Rgb565::WHITE));
        assert_eq!(display.get_pixel(Point::new(21, 3)), Some(Rgb565::BLACK));
    }

    #[test]
    fn canvas_batch_reaches_display() {
        let mut canvas: Canvas<_, 4> = Canvas::new(DrawTargetTransport::new(display()), Size::new(64, 64));
        canvas.fill(Rgb565::WHITE).unwrap();
        canvas.draw_string(Point::new(2, 2), Rgb565::BLACK, Font::Small, "Hi").unwrap();
        canvas.execute().unwrap();

        let display = canvas.release().release();
        assert_eq!(display.get_pixel(Point::new(63, 63)), Some(Rgb565::WHITE));
        let text_area = Rectangle::new(Point::new(2, 2), Size::new(12, 10));
        assert!(text_area.points().any(|p| display.get_pixel(p) == Some(Rgb565::BLACK)));
        assert!(!Rectangle::new(Point::new(20, 20), Size::new(10, 10))
            .points()
            .any(|p| display.get_pixel(p) == Some(Rgb565::BLACK)));
    }
}
