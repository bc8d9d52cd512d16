use core::fmt::{Debug, Display, Formatter};
use embedded_graphics::geometry::{Point, Size};
use embedded_hal::delay::DelayNs;
use tact_sys::{TouchEvent, TouchInput, Wait};
use crate::matrix::{CalibrationMatrix, SolveError};

#[cfg(feature = "defmt")]
use defmt::{debug, warn};

/// The three on-screen points a user is asked to touch.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationTargets {
    points: [Point; 3],
}

impl CalibrationTargets {
    /// Targets spread over the screen on a quarter grid, well away from the edges where
    /// resistive panels are least linear.
    pub fn for_screen(size: Size) -> Self {
        let x = size.width as i32 / 4;
        let y = size.height as i32 / 4;

        Self {
            points: [
                Point::new(x, y),
                Point::new(2 * x, 3 * y),
                Point::new(3 * x, 2 * y),
            ],
        }
    }

    /// Custom targets. Returns `None` if the points are collinear.
    pub fn new(points: [Point; 3]) -> Option<Self> {
        let [p, q, r] = points.map(|p| (p.x as i64, p.y as i64));
        let cross = (q.0 - p.0) * (r.1 - p.1) - (q.1 - p.1) * (r.0 - p.0);
        (cross != 0).then_some(Self { points })
    }

    pub fn points(&self) -> &[Point; 3] {
        &self.points
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionConfig {
    /// Consecutive valid samples averaged into one reading per target.
    pub samples_per_target: u8,
    /// Pause after each target is released, so a bouncing pen is not read as the next touch.
    pub settle_ms: u32,
    /// Timed-out waits tolerated per target before the session gives up. `None` waits forever.
    pub max_waits: Option<u16>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            samples_per_target: 4,
            settle_ms: 200,
            max_waits: Some(600),
        }
    }
}

pub enum SessionError<E> {
    /// The collected points did not yield a usable matrix.
    CalibrationFailed(SolveError),
    /// The wait was cancelled or ran out of time.
    Aborted,
    Input(E),
}

impl<E: Debug> Debug for SessionError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::CalibrationFailed(e) => write!(f, "CalibrationFailed({e:?})"),
            Self::Aborted => write!(f, "Aborted"),
            Self::Input(e) => write!(f, "Input({e:?})"),
        }
    }
}

impl<E: Display> Display for SessionError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::CalibrationFailed(e) => write!(f, "calibration failed: {e}"),
            Self::Aborted => write!(f, "calibration aborted"),
            Self::Input(e) => write!(f, "touch input error: {e}"),
        }
    }
}

impl<E: Debug + Display> core::error::Error for SessionError<E> {}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for SessionError<E> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::CalibrationFailed(e) => defmt::write!(fmt, "CalibrationFailed({})", e),
            Self::Aborted => defmt::write!(fmt, "Aborted"),
            Self::Input(e) => defmt::write!(fmt, "Input({})", e),
        }
    }
}

/// Interactive three-point calibration.
///
/// The session never draws anything itself: before each target is sampled, the `present`
/// callback passed to [TouchCalibrationSession::run] is told which target to show.
#[derive(Copy, Clone, Debug)]
pub struct TouchCalibrationSession {
    targets: CalibrationTargets,
    config: SessionConfig,
}

impl TouchCalibrationSession {
    pub fn new(targets: CalibrationTargets, config: SessionConfig) -> Self {
        Self { targets, config }
    }

    pub fn for_screen(size: Size) -> Self {
        Self::new(CalibrationTargets::for_screen(size), SessionConfig::default())
    }

    pub fn targets(&self) -> &CalibrationTargets {
        &self.targets
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Walk the user through all three targets and solve for the matrix.
    ///
    /// Raw readings only live for the duration of this call; on any error nothing is kept.
    pub fn run<I, D>(
        &self,
        input: &mut I,
        delay: &mut D,
        mut present: impl FnMut(usize, Point),
    ) -> Result<CalibrationMatrix, SessionError<I::Error>>
    where
        I: TouchInput,
        D: DelayNs,
    {
        let mut raw = [Point::zero(); 3];

        for (index, target) in self.targets.points.iter().enumerate() {
            present(index, *target);
            raw[index] = self.sample_target(input)?;

            #[cfg(feature = "defmt")]
            debug!("touch: target {} at {} read as {}", index, target, raw[index]);

            self.wait_for_release(input)?;
            delay.delay_ms(self.config.settle_ms);
        }

        CalibrationMatrix::solve(&raw, &self.targets.points).map_err(|e| {
            #[cfg(feature = "defmt")]
            warn!("touch: calibration points rejected: {}", e);
            SessionError::CalibrationFailed(e)
        })
    }

    fn sample_target<I: TouchInput>(&self, input: &mut I) -> Result<Point, SessionError<I::Error>> {
        let wanted = self.config.samples_per_target.max(1) as u32;
        let (mut sum_x, mut sum_y, mut count) = (0u32, 0u32, 0u32);
        let mut waits = 0;

        loop {
            match self.next_event(input, &mut waits)? {
                event if event.valid => {
                    sum_x += event.x as u32;
                    sum_y += event.y as u32;
                    count += 1;

                    if count == wanted {
                        return Ok(Point::new((sum_x / count) as i32, (sum_y / count) as i32));
                    }
                }
                // pen lifted early, start averaging again
                _ => (sum_x, sum_y, count) = (0, 0, 0),
            }
        }
    }

    fn wait_for_release<I: TouchInput>(&self, input: &mut I) -> Result<(), SessionError<I::Error>> {
        let mut waits = 0;
        while self.next_event(input, &mut waits)?.valid {}
        Ok(())
    }

    fn next_event<I: TouchInput>(&self, input: &mut I, waits: &mut u16) -> Result<TouchEvent, SessionError<I::Error>> {
        loop {
            match input.wait_for_event().map_err(SessionError::Input)? {
                Wait::Ready(event) => return Ok(event),
                Wait::Cancelled => return Err(SessionError::Aborted),
                Wait::TimedOut => {
                    *waits = waits.saturating_add(1);
                    if self.config.max_waits.is_some_and(|max| *waits >= max) {
                        #[cfg(feature = "defmt")]
                        warn!("touch: gave up waiting for calibration input");
                        return Err(SessionError::Aborted);
                    }
                }
            }
        }
    }
}
