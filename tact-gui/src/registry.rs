//! Registered widgets, hit testing and click dispatch.
//!
//! A click is press-then-release-inside: a valid touch over a widget makes it active, and
//! lifting the pen while it is still active latches it as clicked and notifies every
//! subscriber. Sliding off a widget before lifting cancels the press. The clicked latch stays
//! set until it is taken with [WidgetRegistry::take_clicked]; until then, pressing the widget
//! again has no effect.

use core::fmt::{Display, Formatter};
use embedded_graphics::geometry::Point;
use heapless::Vec;
use tact_sys::TouchEvent;
use crate::canvas::{Canvas, CanvasError, DisplayTransport};
use crate::theme::Theme;
use crate::widget::{View, Widget, WidgetId};

#[cfg(feature = "defmt")]
use defmt::{debug, trace};

/// Maximum number of click subscribers per registry.
pub const MAX_SUBSCRIBERS: usize = 4;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    Full,
    DuplicateId(WidgetId),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Full => write!(f, "registry is full"),
            Self::DuplicateId(id) => write!(f, "widget {} is already registered", id.0),
        }
    }
}

impl core::error::Error for RegistryError {}

/// A completed click.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Click {
    pub widget: WidgetId,
    /// The event that completed the click (the pen lifting).
    pub event: TouchEvent,
}

/// Called for every click, in subscription order.
pub type ClickHandler<V, const N: usize> = fn(&mut WidgetRegistry<V, N>, &Click);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SubscriptionId(u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Render {
    /// Only widgets marked dirty.
    Dirty,
    /// Every widget.
    All,
}

pub struct WidgetRegistry<V, const N: usize> {
    widgets: Vec<Widget<V>, N>,
    subscribers: Vec<(SubscriptionId, ClickHandler<V, N>), MAX_SUBSCRIBERS>,
    next_subscription: u32,
    active: Option<WidgetId>,
    full_redraw: bool,
}

impl<V, const N: usize> Default for WidgetRegistry<V, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, const N: usize> WidgetRegistry<V, N> {
    pub const fn new() -> Self {
        Self {
            widgets: Vec::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
            active: None,
            full_redraw: false,
        }
    }

    /// Add a widget. It is hit tested after every widget registered before it.
    pub fn register(&mut self, widget: Widget<V>) -> Result<(), RegistryError> {
        if self.widget(widget.id()).is_some() {
            return Err(RegistryError::DuplicateId(widget.id()));
        }
        self.widgets.push(widget).map_err(|_| RegistryError::Full)
    }

    pub fn unregister(&mut self, id: WidgetId) -> Option<Widget<V>> {
        let index = self.index_of(id)?;
        if self.active == Some(id) {
            self.active = None;
        }
        Some(self.widgets.remove(index))
    }

    pub fn unregister_all(&mut self) {
        self.widgets.clear();
        self.active = None;
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Widget<V>> {
        self.widgets.iter()
    }

    pub fn widget(&self, id: WidgetId) -> Option<&Widget<V>> {
        self.widgets.iter().find(|w| w.id() == id)
    }

    /// Mutable access to a widget's view. Marks the widget dirty.
    pub fn view_mut(&mut self, id: WidgetId) -> Option<&mut V> {
        self.widget_mut(id).map(Widget::view_mut)
    }

    /// The widget currently being pressed, if any.
    pub fn active(&self) -> Option<WidgetId> {
        self.active
    }

    /// The first widget, in registration order, containing `point`.
    pub fn hit_test(&self, point: Point) -> Option<WidgetId> {
        self.widgets.iter().find(|w| w.contains(point)).map(Widget::id)
    }

    /// Returns `false` if there is no such widget.
    pub fn mark_dirty(&mut self, id: WidgetId) -> bool {
        self.widget_mut(id).map(|w| w.dirty = true).is_some()
    }

    /// Make the next render pass redraw every widget.
    pub fn request_full_redraw(&mut self) {
        self.full_redraw = true;
    }

    pub fn is_clicked(&self, id: WidgetId) -> bool {
        self.widget(id).is_some_and(Widget::is_clicked)
    }

    /// Read and clear the clicked latch. The widget is redrawn if it was clicked.
    pub fn take_clicked(&mut self, id: WidgetId) -> bool {
        match self.widget_mut(id) {
            Some(w) if w.clicked => {
                w.clicked = false;
                w.dirty = true;
                true
            }
            _ => false,
        }
    }

    pub fn subscribe(&mut self, handler: ClickHandler<V, N>) -> Result<SubscriptionId, RegistryError> {
        if self.subscribers.is_full() {
            return Err(RegistryError::Full);
        }
        // skip ids still held by live subscribers once the counter wraps
        let mut id = SubscriptionId(self.next_subscription);
        while self.subscribers.iter().any(|(s, _)| *s == id) {
            id = SubscriptionId(id.0.wrapping_add(1));
        }
        self.next_subscription = id.0.wrapping_add(1);
        self.subscribers.push((id, handler)).map_err(|_| RegistryError::Full)?;
        Ok(id)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.subscribers.iter().position(|(s, _)| *s == id) {
            Some(index) => {
                self.subscribers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Feed one touch event through the widget state machine.
    ///
    /// `position` is the calibrated screen position of `event`, or `None` if the pen is up.
    /// Returns the click completed by this event, after all subscribers have seen it.
    pub fn activate(&mut self, event: &TouchEvent, position: Option<Point>) -> Option<Click> {
        let hit = position.and_then(|p| self.hit_test(p));

        match (self.active, hit) {
            (Some(active), Some(hit)) if active == hit => None,
            (_, Some(hit)) => {
                self.deactivate();

                let widget = self.widget_mut(hit)?;
                // an unconsumed click blocks new presses
                if widget.clicked {
                    return None;
                }
                widget.active = true;
                widget.dirty = true;
                self.active = Some(hit);

                #[cfg(feature = "defmt")]
                trace!("gui: widget {} pressed", hit.0);

                None
            }
            (Some(_), None) => {
                let released = self.deactivate()?;
                if position.is_some() {
                    // slid off the widget, press cancelled
                    return None;
                }

                let widget = self.widget_mut(released)?;
                widget.clicked = true;

                #[cfg(feature = "defmt")]
                debug!("gui: widget {} clicked", released.0);

                let click = Click {
                    widget: released,
                    event: *event,
                };
                self.notify(&click);
                Some(click)
            }
            (None, None) => None,
        }
    }

    /// Draw widgets onto `canvas`. Returns how many were drawn.
    ///
    /// A pending [WidgetRegistry::request_full_redraw] turns a [Render::Dirty] pass into a
    /// [Render::All] pass. Every widget drawn has its dirty flag cleared.
    pub fn render<'a, T, const B: usize>(
        &mut self,
        canvas: &mut Canvas<'a, T, B>,
        theme: &Theme,
        mode: Render,
    ) -> Result<usize, CanvasError<T::Error>>
    where
        V: View<'a>,
        T: DisplayTransport,
    {
        let all = mode == Render::All || self.full_redraw;
        let mut drawn = 0;

        for widget in self.widgets.iter_mut().filter(|w| all || w.dirty) {
            widget.view().draw(widget.bounds(), widget.appearance(), theme, canvas)?;
            widget.dirty = false;
            drawn += 1;
        }
        self.full_redraw = false;

        #[cfg(feature = "defmt")]
        trace!("gui: rendered {} widgets", drawn);

        Ok(drawn)
    }

    fn index_of(&self, id: WidgetId) -> Option<usize> {
        self.widgets.iter().position(|w| w.id() == id)
    }

    fn widget_mut(&mut self, id: WidgetId) -> Option<&mut Widget<V>> {
        self.widgets.iter_mut().find(|w| w.id() == id)
    }

    fn deactivate(&mut self) -> Option<WidgetId> {
        let id = self.active.take()?;
        if let Some(widget) = self.widget_mut(id) {
            widget.active = false;
            widget.dirty = true;
        }
        Some(id)
    }

    fn notify(&mut self, click: &Click) {
        // handlers may subscribe or unsubscribe while being called
        let handlers = self.subscribers.clone();
        for (_, handler) in handlers.iter() {
            handler(self, click);
        }
    }
}
