//! Driver for two-axis analog thumb joysticks.
//!
//! Each axis is read through its own [AnalogInput] and mapped onto a configurable logical
//! [AxisRange]. When the driver is created it assumes the stick is at rest and samples both
//! axes to find their center bands, so small drift around the rest position still reads as
//! [Direction::Center]. Do not touch the stick while this happens.

#![cfg_attr(not(test), no_std)]

pub mod axis;

pub use axis::{AxisCalibration, AxisRange, CenterSampler, Direction};

#[cfg(feature = "defmt")]
use defmt::debug;

use core::fmt::{Debug, Display, Formatter};

/// A single analog channel.
pub trait AnalogInput {
    type Error;

    /// Read the current value, in `0..=full_scale` ADC units.
    fn read(&mut self) -> Result<u16, Self::Error>;
}

impl<T: AnalogInput + ?Sized> AnalogInput for &mut T {
    type Error = T::Error;

    fn read(&mut self) -> Result<u16, Self::Error> {
        (**self).read()
    }
}

pub enum JoystickError<E> {
    /// Reading an analog channel failed.
    Read(E),
    /// An axis range has the same value at both ends.
    InvalidRange,
}

impl<E> From<E> for JoystickError<E> {
    fn from(value: E) -> Self {
        Self::Read(value)
    }
}

impl<E: Debug> Debug for JoystickError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Read(e) => write!(f, "Read({e:?})"),
            Self::InvalidRange => write!(f, "InvalidRange"),
        }
    }
}

impl<E: Display> Display for JoystickError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Read(e) => write!(f, "analog read failed: {e}"),
            Self::InvalidRange => write!(f, "axis range is empty"),
        }
    }
}

impl<E: Debug + Display> core::error::Error for JoystickError<E> {}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JoystickConfig {
    pub x_range: AxisRange,
    pub y_range: AxisRange,
    /// The highest value the ADC reports.
    pub full_scale: u16,
    pub dead_zone_radius: u16,
    /// Readings taken per axis after the seed reading when calibrating the center.
    pub calibration_samples: u16,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            x_range: AxisRange::default(),
            y_range: AxisRange::default(),
            full_scale: 1023,
            dead_zone_radius: 25,
            calibration_samples: 100,
        }
    }
}

/// Stick tilt relative to the rest position.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Polar {
    /// Radians, measured from the positive X axis towards the positive Y axis.
    pub angle: f32,
    /// Distance from the rest position in logical units.
    pub amplitude: f32,
}

impl Polar {
    pub fn from_offsets(dx: i32, dy: i32) -> Self {
        let (dx, dy) = (dx as f32, dy as f32);
        Self {
            angle: libm::atan2f(dy, dx),
            amplitude: libm::sqrtf(dx * dx + dy * dy),
        }
    }
}

pub struct AnalogJoystick<X, Y> {
    x_input: X,
    y_input: Y,
    config: JoystickConfig,
    x_calibration: AxisCalibration,
    y_calibration: AxisCalibration,
}

impl<X, Y, E> AnalogJoystick<X, Y>
where
    X: AnalogInput<Error = E>,
    Y: AnalogInput<Error = E>,
{
    /// Create the driver and calibrate both axes. The stick must be at rest.
    pub fn new(mut x_input: X, mut y_input: Y, config: JoystickConfig) -> Result<Self, JoystickError<E>> {
        if config.x_range.min == config.x_range.max || config.y_range.min == config.y_range.max {
            return Err(JoystickError::InvalidRange);
        }

        let (x_calibration, y_calibration) =
            sample_centers(&mut x_input, &mut y_input, &config, config.dead_zone_radius)?;

        Ok(Self {
            x_input,
            y_input,
            config,
            x_calibration,
            y_calibration,
        })
    }

    /// Recalibrate both axes with a new dead zone radius. The stick must be at rest.
    pub fn auto_calibrate_center(&mut self, dead_zone_radius: u16) -> Result<(), JoystickError<E>> {
        let (x, y) = sample_centers(&mut self.x_input, &mut self.y_input, &self.config, dead_zone_radius)?;
        self.config.dead_zone_radius = dead_zone_radius;
        self.x_calibration = x;
        self.y_calibration = y;
        Ok(())
    }

    /// Current X position in the logical range.
    pub fn x(&mut self) -> Result<i32, JoystickError<E>> {
        Ok(self.config.x_range.scale(self.x_input.read()?, self.config.full_scale))
    }

    /// Current Y position in the logical range.
    pub fn y(&mut self) -> Result<i32, JoystickError<E>> {
        Ok(self.config.y_range.scale(self.y_input.read()?, self.config.full_scale))
    }

    pub fn x_direction(&mut self) -> Result<Direction, JoystickError<E>> {
        let x = self.x()?;
        Ok(self.x_calibration.direction(x))
    }

    pub fn y_direction(&mut self) -> Result<Direction, JoystickError<E>> {
        let y = self.y()?;
        Ok(self.y_calibration.direction(y))
    }

    /// Read both axes and express the tilt in polar form. Recomputed on every call.
    pub fn polar(&mut self) -> Result<Polar, JoystickError<E>> {
        let dx = self.x()? - self.config.x_range.midpoint();
        let dy = self.y()? - self.config.y_range.midpoint();
        Ok(Polar::from_offsets(dx, dy))
    }

    pub fn angle(&mut self) -> Result<f32, JoystickError<E>> {
        Ok(self.polar()?.angle)
    }

    pub fn amplitude(&mut self) -> Result<f32, JoystickError<E>> {
        Ok(self.polar()?.amplitude)
    }

    pub fn x_calibration(&self) -> &AxisCalibration {
        &self.x_calibration
    }

    pub fn y_calibration(&self) -> &AxisCalibration {
        &self.y_calibration
    }

    pub fn config(&self) -> &JoystickConfig {
        &self.config
    }

    /// Give the analog channels back.
    pub fn release(self) -> (X, Y) {
        (self.x_input, self.y_input)
    }
}

fn sample_centers<X, Y, E>(
    x_input: &mut X,
    y_input: &mut Y,
    config: &JoystickConfig,
    dead_zone_radius: u16,
) -> Result<(AxisCalibration, AxisCalibration), E>
where
    X: AnalogInput<Error = E>,
    Y: AnalogInput<Error = E>,
{
    let full_scale = config.full_scale;
    let mut x = CenterSampler::new(config.x_range.scale(x_input.read()?, full_scale));
    let mut y = CenterSampler::new(config.y_range.scale(y_input.read()?, full_scale));

    for _ in 0..config.calibration_samples {
        x.observe(config.x_range.scale(x_input.read()?, full_scale));
        y.observe(config.y_range.scale(y_input.read()?, full_scale));
    }

    #[cfg(feature = "defmt")]
    debug!("joystick: rest noise x {} y {}", x.spread(), y.spread());

    Ok((
        x.finish(dead_zone_radius, config.x_range.is_flipped()),
        y.finish(dead_zone_radius, config.y_range.is_flipped()),
    ))
}
