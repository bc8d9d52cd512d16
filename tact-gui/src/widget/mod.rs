pub mod button;

use embedded_graphics::geometry::Point;
use embedded_graphics::primitives::Rectangle;
use crate::canvas::{Canvas, CanvasError, DisplayTransport};
use crate::theme::Theme;

/// Identifies a widget within a registry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WidgetId(pub u16);

/// The state a widget is drawn in.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Appearance {
    Idle,
    /// Currently pressed.
    Active,
    /// Clicked, and the click has not been taken yet.
    Clicked,
}

/// How a widget looks. Behaviour lives in [Widget] and the registry.
pub trait View<'a> {
    fn draw<T: DisplayTransport, const B: usize>(
        &self,
        bounds: Rectangle,
        appearance: Appearance,
        theme: &Theme,
        canvas: &mut Canvas<'a, T, B>,
    ) -> Result<(), CanvasError<T::Error>>;
}

/// A view placed on screen, plus its input state.
///
/// The bounds never change once the widget exists. The state flags are only changed by the
/// registry that owns the widget.
#[derive(Debug)]
pub struct Widget<V> {
    id: WidgetId,
    bounds: Rectangle,
    view: V,
    pub(crate) active: bool,
    pub(crate) clicked: bool,
    pub(crate) dirty: bool,
}

impl<V> Widget<V> {
    /// A new widget starts out dirty so it is drawn on the next render pass.
    pub fn new(id: WidgetId, bounds: Rectangle, view: V) -> Self {
        Self {
            id,
            bounds,
            view,
            active: false,
            clicked: false,
            dirty: true,
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Mutable access to the view. The widget is marked dirty since its looks may change.
    pub fn view_mut(&mut self) -> &mut V {
        self.dirty = true;
        &mut self.view
    }

    pub fn contains(&self, point: Point) -> bool {
        self.bounds.contains(point)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_clicked(&self) -> bool {
        self.clicked
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn appearance(&self) -> Appearance {
        if self.clicked {
            Appearance::Clicked
        } else if self.active {
            Appearance::Active
        } else {
            Appearance::Idle
        }
    }
}
