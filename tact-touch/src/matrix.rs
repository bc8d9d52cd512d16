use core::fmt::{Display, Formatter};
use embedded_graphics::geometry::{Point, Size};
use tact_sys::TouchEvent;

/// Determinants with a magnitude at or below this are treated as zero.
pub const DEGENERATE_EPSILON: f64 = 1.0e-9;

/// Why a set of calibration points could not be turned into a matrix.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SolveError {
    /// The raw readings lie on a single line, so the linear system has no unique solution.
    Collinear,
    /// A solution exists but its linear part is singular (or not finite), so it cannot map the
    /// panel onto the screen.
    Degenerate,
}

impl Display for SolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Collinear => write!(f, "calibration points are collinear"),
            Self::Degenerate => write!(f, "calibration matrix is degenerate"),
        }
    }
}

impl core::error::Error for SolveError {}

/// Affine transform from raw touch panel readings to screen coordinates.
///
/// ```text
/// screen_x = a * raw_x + b * raw_y + c
/// screen_y = d * raw_x + e * raw_y + f
/// ```
///
/// A matrix whose linear part `[[a, b], [d, e]]` is singular is degenerate: it collapses the
/// panel onto a line or a point. Such a matrix is never produced by [CalibrationMatrix::solve]
/// and never accepted by the record codec.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationMatrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl CalibrationMatrix {
    /// Raw readings are used as screen coordinates unchanged.
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0);

    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// A coarse estimate that assumes the panel spans `0..=full_scale` on both axes and is
    /// exactly aligned with a display of the given size.
    ///
    /// Good enough to let a user reach a "calibrate" button, not for precise input.
    pub fn estimate(full_scale: u16, display: Size) -> Self {
        let scale = full_scale.max(1) as f32;
        Self::new(
            display.width as f32 / scale,
            0.0,
            0.0,
            0.0,
            display.height as f32 / scale,
            0.0,
        )
    }

    /// Transform a raw reading into (fractional) screen coordinates.
    pub fn apply(&self, raw_x: u16, raw_y: u16) -> (f32, f32) {
        let x = raw_x as f32;
        let y = raw_y as f32;
        (
            self.a * x + self.b * y + self.c,
            self.d * x + self.e * y + self.f,
        )
    }

    /// Transform a raw reading into the nearest screen pixel.
    pub fn map(&self, raw_x: u16, raw_y: u16) -> Point {
        let (x, y) = self.apply(raw_x, raw_y);
        Point::new(libm::roundf(x) as i32, libm::roundf(y) as i32)
    }

    /// The screen position of a touch event, or `None` if the event is not valid.
    pub fn map_event(&self, event: &TouchEvent) -> Option<Point> {
        event.valid.then(|| self.map(event.x, event.y))
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        self.a as f64 * self.e as f64 - self.b as f64 * self.d as f64
    }

    pub fn is_degenerate(&self) -> bool {
        // written so that a NaN determinant also counts as degenerate
        !(libm::fabs(self.determinant()) > DEGENERATE_EPSILON)
    }

    pub fn is_finite(&self) -> bool {
        [self.a, self.b, self.c, self.d, self.e, self.f]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Solve for the matrix that maps each raw point onto the screen point at the same index.
    ///
    /// Uses direct elimination (Cramer's rule) on the two 3x3 systems, one per screen axis.
    pub fn solve(raw: &[Point; 3], screen: &[Point; 3]) -> Result<Self, SolveError> {
        let system = raw.map(|p| [p.x as f64, p.y as f64, 1.0]);
        let det = det3(&system);

        // Raw readings are integers, so a collinear set gives exactly zero here.
        if libm::fabs(det) <= DEGENERATE_EPSILON {
            return Err(SolveError::Collinear);
        }

        let [a, b, c] = cramer(&system, screen.map(|p| p.x as f64), det);
        let [d, e, f] = cramer(&system, screen.map(|p| p.y as f64), det);
        let matrix = Self::new(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32);

        if !matrix.is_finite() || matrix.is_degenerate() {
            return Err(SolveError::Degenerate);
        }

        Ok(matrix)
    }
}

impl Default for CalibrationMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn cramer(system: &[[f64; 3]; 3], rhs: [f64; 3], det: f64) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (col, unknown) in out.iter_mut().enumerate() {
        let mut replaced = *system;
        for (row, value) in rhs.iter().enumerate() {
            replaced[row][col] = *value;
        }
        *unknown = det3(&replaced) / det;
    }
    out
}
