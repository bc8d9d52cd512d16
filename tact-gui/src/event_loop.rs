use core::fmt::{Debug, Display, Formatter};
use tact_sys::{TouchInput, Wait};
use tact_touch::{CalibrationMatrix, SolveError};
use crate::canvas::{Canvas, CanvasError, DisplayTransport};
use crate::registry::{Click, Render, WidgetRegistry};
use crate::theme::Theme;
use crate::widget::View;

#[cfg(feature = "defmt")]
use defmt::{info, trace, warn};

pub enum LoopError<IE, DE> {
    /// The touch input failed.
    Input(IE),
    /// Drawing or flushing failed.
    Display(CanvasError<DE>),
    /// The wait for the next touch event was cancelled.
    Cancelled,
    /// The calibration matrix would collapse touches onto a line or contains non-finite terms.
    Calibration(SolveError),
}

impl<IE, DE> From<CanvasError<DE>> for LoopError<IE, DE> {
    fn from(value: CanvasError<DE>) -> Self {
        Self::Display(value)
    }
}

impl<IE: Debug, DE: Debug> Debug for LoopError<IE, DE> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Input(e) => write!(f, "Input({e:?})"),
            Self::Display(e) => write!(f, "Display({e:?})"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Calibration(e) => write!(f, "Calibration({e:?})"),
        }
    }
}

impl<IE: Display, DE: Display> Display for LoopError<IE, DE> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Input(e) => write!(f, "touch input error: {e}"),
            Self::Display(e) => write!(f, "{e}"),
            Self::Cancelled => write!(f, "event loop cancelled"),
            Self::Calibration(e) => write!(f, "unusable calibration: {e}"),
        }
    }
}

impl<IE: Debug + Display, DE: Debug + Display> core::error::Error for LoopError<IE, DE> {}

fn check_calibration(calibration: &CalibrationMatrix) -> Result<(), SolveError> {
    if calibration.is_degenerate() || !calibration.is_finite() {
        #[cfg(feature = "defmt")]
        warn!("gui: rejecting degenerate calibration");
        return Err(SolveError::Degenerate);
    }
    Ok(())
}

/// What a single [InputEventLoop::step] did.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pass {
    /// The wait timed out without an event.
    Idle,
    Handled {
        /// The click completed by the event, if any.
        click: Option<Click>,
        /// Widgets redrawn in this pass.
        drawn: usize,
    },
}

impl Pass {
    pub fn click(&self) -> Option<&Click> {
        match self {
            Pass::Handled { click: Some(click), .. } => Some(click),
            _ => None,
        }
    }
}

/// The single control loop: wait for a touch event, calibrate it, update the widgets, redraw
/// what changed and flush the batch.
pub struct InputEventLoop<'a, I, T, V, const N: usize, const B: usize> {
    input: I,
    calibration: CalibrationMatrix,
    registry: WidgetRegistry<V, N>,
    canvas: Canvas<'a, T, B>,
    theme: Theme,
}

impl<'a, I, T, V, const N: usize, const B: usize> InputEventLoop<'a, I, T, V, N, B>
where
    I: TouchInput,
    T: DisplayTransport,
    V: View<'a>,
{
    pub fn new(
        input: I,
        calibration: CalibrationMatrix,
        registry: WidgetRegistry<V, N>,
        canvas: Canvas<'a, T, B>,
        theme: Theme,
    ) -> Result<Self, LoopError<I::Error, T::Error>> {
        check_calibration(&calibration).map_err(LoopError::Calibration)?;
        Ok(Self {
            input,
            calibration,
            registry,
            canvas,
            theme,
        })
    }

    /// Draw widgets and flush everything queued on the canvas, including commands the
    /// application queued itself. Returns how many widgets were drawn.
    pub fn render(&mut self, mode: Render) -> Result<usize, LoopError<I::Error, T::Error>> {
        let drawn = self.registry.render(&mut self.canvas, &self.theme, mode)?;
        self.canvas.execute()?;
        Ok(drawn)
    }

    /// Wait for one event and process it.
    pub fn step(&mut self) -> Result<Pass, LoopError<I::Error, T::Error>> {
        let event = match self.input.wait_for_event().map_err(LoopError::Input)? {
            Wait::Ready(event) => event,
            Wait::TimedOut => return Ok(Pass::Idle),
            Wait::Cancelled => return Err(LoopError::Cancelled),
        };

        #[cfg(feature = "defmt")]
        trace!("gui: {}", event);

        let position = self.calibration.map_event(&event);
        let click = self.registry.activate(&event, position);
        let drawn = self.render(Render::Dirty)?;

        Ok(Pass::Handled { click, drawn })
    }

    /// Draw every widget, then process events until `exit` returns `true` after a pass.
    pub fn run_until(
        &mut self,
        mut exit: impl FnMut(&WidgetRegistry<V, N>, &Pass) -> bool,
    ) -> Result<(), LoopError<I::Error, T::Error>> {
        self.render(Render::All)?;

        loop {
            let pass = self.step()?;
            if exit(&self.registry, &pass) {
                #[cfg(feature = "defmt")]
                info!("gui: event loop finished");
                return Ok(());
            }
        }
    }

    pub fn registry(&self) -> &WidgetRegistry<V, N> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut WidgetRegistry<V, N> {
        &mut self.registry
    }

    /// For drawing outside of widgets. Queued commands are flushed by the next pass.
    pub fn canvas_mut(&mut self) -> &mut Canvas<'a, T, B> {
        &mut self.canvas
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn calibration(&self) -> &CalibrationMatrix {
        &self.calibration
    }

    /// Swap in a new calibration. A degenerate one is refused and the current one is kept.
    pub fn set_calibration(&mut self, calibration: CalibrationMatrix) -> Result<(), SolveError> {
        check_calibration(&calibration)?;
        self.calibration = calibration;
        Ok(())
    }

    pub fn release(self) -> (I, WidgetRegistry<V, N>, Canvas<'a, T, B>) {
        (self.input, self.registry, self.canvas)
    }
}
