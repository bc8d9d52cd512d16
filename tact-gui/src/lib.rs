//! Touch-driven widgets for small displays.
//!
//! A [WidgetRegistry] holds the widgets on screen and turns calibrated touch events into
//! clicks. Drawing goes through a [Canvas], which batches [canvas::DrawCommand]s so a whole
//! screen update reaches the display in one transaction. [InputEventLoop] ties the two to a
//! [tact_sys::TouchInput] and a [tact_touch::CalibrationMatrix].

#![cfg_attr(not(test), no_std)]

pub mod canvas;
pub mod draw_target;
pub mod event_loop;
pub mod registry;
pub mod theme;
pub mod widget;

pub use canvas::{Canvas, CanvasError, DisplayTransport, Font, Icon};
pub use draw_target::DrawTargetTransport;
pub use event_loop::{InputEventLoop, LoopError, Pass};
pub use registry::{Click, ClickHandler, Render, RegistryError, SubscriptionId, WidgetRegistry};
pub use theme::Theme;
pub use widget::button::Button;
pub use widget::{Appearance, View, Widget, WidgetId};
