//! The colour picker screen used to exercise touch traces: three colour buttons that paint the
//! whole screen, and a button to finish.

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::pixelcolor::{Rgb565, RgbColor};
use embedded_graphics::primitives::Rectangle;
use tact_gui::{
    Button, Canvas, Click, DisplayTransport, InputEventLoop, LoopError, RegistryError, Render, Theme, Widget,
    WidgetId, WidgetRegistry,
};
use tact_sys::TouchInput;
use tact_touch::CalibrationMatrix;

pub const SCREEN: Size = Size::new(320, 240);

pub const RED: WidgetId = WidgetId(1);
pub const GREEN: WidgetId = WidgetId(2);
pub const BLUE: WidgetId = WidgetId(3);
pub const CONTINUE: WidgetId = WidgetId(4);

const COLORS: [(WidgetId, &str, Rgb565); 3] = [
    (RED, "Red", Rgb565::RED),
    (GREEN, "Green", Rgb565::GREEN),
    (BLUE, "Blue", Rgb565::BLUE),
];

pub type DemoRegistry = WidgetRegistry<Button<'static>, 4>;

pub fn screen() -> Result<DemoRegistry, RegistryError> {
    let mut registry = WidgetRegistry::new();

    for (n, (id, label, color)) in COLORS.into_iter().enumerate() {
        let bounds = Rectangle::new(Point::new(10 + 50 * n as i32, 204), Size::new(44, 22));
        let button = Button::new(label)
            .with_fill(color)
            .with_clicked_colors(Some(Rgb565::WHITE), Some(color));
        registry.register(Widget::new(id, bounds, button))?;
    }

    let bounds = Rectangle::new(Point::new(247, 204), Size::new(64, 22));
    registry.register(Widget::new(CONTINUE, bounds, Button::new("Continue")))?;

    registry.subscribe(select_color)?;
    Ok(registry)
}

pub fn label(id: WidgetId) -> &'static str {
    match id {
        CONTINUE => "Continue",
        _ => COLORS.iter().find(|(c, _, _)| *c == id).map_or("?", |(_, label, _)| *label),
    }
}

fn color_of(id: WidgetId) -> Option<Rgb565> {
    COLORS.iter().find(|(c, _, _)| *c == id).map(|(_, _, color)| *color)
}

/// Only the most recently clicked colour stays selected.
fn select_color(registry: &mut DemoRegistry, click: &Click) {
    if color_of(click.widget).is_none() {
        return;
    }
    for (id, _, _) in COLORS {
        if id != click.widget {
            registry.take_clicked(id);
        }
    }
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct Replay {
    pub clicks: Vec<WidgetId>,
    /// Events processed, timeouts included.
    pub passes: usize,
    /// Whether Continue was clicked before the trace ran out.
    pub finished: bool,
}

/// Run `input` through the colour picker until Continue is clicked or the input is cancelled.
/// Returns what happened along with the transport.
pub fn replay<I, T>(
    input: I,
    calibration: CalibrationMatrix,
    registry: DemoRegistry,
    transport: T,
    mut on_click: impl FnMut(&Click),
) -> Result<(Replay, T), LoopError<I::Error, T::Error>>
where
    I: TouchInput,
    T: DisplayTransport,
{
    let canvas: Canvas<'static, T, 32> = Canvas::new(transport, SCREEN);
    let mut event_loop = InputEventLoop::new(input, calibration, registry, canvas, Theme::default())?;
    let mut replay = Replay::default();

    event_loop.render(Render::All)?;

    loop {
        let pass = match event_loop.step() {
            Ok(pass) => pass,
            Err(LoopError::Cancelled) => break,
            Err(e) => return Err(e),
        };
        replay.passes += 1;

        let Some(click) = pass.click().copied() else {
            continue;
        };
        on_click(&click);
        replay.clicks.push(click.widget);

        if click.widget == CONTINUE {
            replay.finished = true;
            break;
        }

        if let Some(color) = color_of(click.widget) {
            event_loop.canvas_mut().fill(color)?;
            event_loop.registry_mut().request_full_redraw();
            event_loop.render(Render::Dirty)?;
        }
    }

    let (_, _, canvas) = event_loop.release();
    Ok((replay, canvas.release()))
}
