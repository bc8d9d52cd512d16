//! Per-axis range mapping, center band calibration and direction classification.

#[cfg(feature = "defmt")]
use defmt::debug;

/// The logical range an axis reading is mapped onto.
///
/// A range whose `min` is greater than its `max` is flipped: the axis is wired (or meant to be
/// read) the other way round, and readings decrease as the stick moves towards positive.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl AxisRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub const fn is_flipped(&self) -> bool {
        self.min > self.max
    }

    /// The nominal rest position, e.g. 512 for `0..=1023`.
    pub const fn midpoint(&self) -> i32 {
        ((self.min as i64 + self.max as i64 + 1) / 2) as i32
    }

    /// Map a raw ADC reading in `0..=full_scale` onto this range.
    pub fn scale(&self, raw: u16, full_scale: u16) -> i32 {
        let full_scale = full_scale.max(1);
        let raw = raw.min(full_scale) as i64;
        let span = self.max as i64 - self.min as i64;
        (self.min as i64 + raw * span / full_scale as i64) as i32
    }
}

impl Default for AxisRange {
    fn default() -> Self {
        Self::new(0, 1023)
    }
}

/// Relative direction of an axis.
#[repr(i8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, strum::FromRepr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Negative = -1,
    Center = 0,
    Positive = 1,
}

/// Collects rest-state readings of one axis.
///
/// The first reading seeds both bounds; every further reading can only widen them.
#[derive(Copy, Clone, Debug)]
pub struct CenterSampler {
    lo: i32,
    hi: i32,
}

impl CenterSampler {
    pub fn new(seed: i32) -> Self {
        Self { lo: seed, hi: seed }
    }

    pub fn observe(&mut self, value: i32) {
        self.lo = self.lo.min(value);
        self.hi = self.hi.max(value);
    }

    /// Distance between the lowest and highest reading seen so far.
    pub fn spread(&self) -> i32 {
        self.hi - self.lo
    }

    /// Turn the observed noise band into a center band, widened by `radius`.
    ///
    /// On a flipped axis the band is stored inverted (`max_center <= min_center`). If the
    /// observed noise is wider than the requested radius allows, the radius is raised to keep
    /// that ordering.
    pub fn finish(self, radius: u16, flipped: bool) -> AxisCalibration {
        let (min_center, max_center, radius) = if flipped {
            let radius = (radius as i32).max((self.spread() + 1) / 2);
            (self.lo + radius, self.hi - radius, radius)
        } else {
            let radius = radius as i32;
            (self.lo - radius, self.hi + radius, radius)
        };

        #[cfg(feature = "defmt")]
        debug!(
            "joystick: center band {}..={} (radius {}, flipped {})",
            min_center, max_center, radius, flipped
        );

        AxisCalibration {
            min_center,
            max_center,
            dead_zone_radius: u16::try_from(radius).unwrap_or(u16::MAX),
            flipped,
        }
    }
}

/// The calibrated center band of one axis.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisCalibration {
    pub min_center: i32,
    pub max_center: i32,
    /// The radius actually applied, which may be larger than requested on a flipped axis.
    pub dead_zone_radius: u16,
    pub flipped: bool,
}

impl AxisCalibration {
    /// Classify a reading. Values on the band edges count as [Direction::Center].
    pub fn direction(&self, value: i32) -> Direction {
        if self.flipped {
            if value > self.min_center {
                Direction::Negative
            } else if value < self.max_center {
                Direction::Positive
            } else {
                Direction::Center
            }
        } else if value < self.min_center {
            Direction::Negative
        } else if value > self.max_center {
            Direction::Positive
        } else {
            Direction::Center
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibrate(readings: &[i32], radius: u16, flipped: bool) -> AxisCalibration {
        let mut sampler = CenterSampler::new(readings[0]);
        for &r in &readings[1..] {
            sampler.observe(r);
        }
        sampler.finish(radius, flipped)
    }

    #[test]
    fn constant_rest_reading() {
        let cal = calibrate(&[512; 101], 25, false);
        assert_eq!((cal.min_center, cal.max_center), (487, 537));

        assert_eq!(cal.direction(512), Direction::Center);
        assert_eq!(cal.direction(487), Direction::Center);
        assert_eq!(cal.direction(537), Direction::Center);
        assert_eq!(cal.direction(486), Direction::Negative);
        assert_eq!(cal.direction(538), Direction::Positive);
    }

    #[test]
    fn flipped_axis_swaps_outcomes() {
        let cal = calibrate(&[512; 101], 25, true);
        assert_eq!((cal.min_center, cal.max_center), (537, 487));

        assert_eq!(cal.direction(512), Direction::Center);
        assert_eq!(cal.direction(487), Direction::Center);
        assert_eq!(cal.direction(537), Direction::Center);
        assert_eq!(cal.direction(486), Direction::Positive);
        assert_eq!(cal.direction(538), Direction::Negative);
    }

    #[test]
    fn noise_widens_band() {
        let readings: [i32; 100] = core::array::from_fn(|i| 500 + (i as i32 * 5) % 21);
        let cal = calibrate(&readings, 10, false);
        assert_eq!((cal.min_center, cal.max_center), (490, 530));
        assert_eq!(cal.dead_zone_radius, 10);
    }

    #[test]
    fn flipped_band_stays_ordered_under_noise() {
        let cal = calibrate(&[490, 551, 520], 25, true);
        assert_eq!(cal.dead_zone_radius, 31);
        assert_eq!((cal.min_center, cal.max_center), (521, 520));
        assert!(cal.max_center <= cal.min_center);
        assert_eq!(cal.direction(520), Direction::Center);
        assert_eq!(cal.direction(521), Direction::Center);
        assert_eq!(cal.direction(519), Direction::Positive);
        assert_eq!(cal.direction(522), Direction::Negative);
    }

    #[test]
    fn range_scaling() {
        let range = AxisRange::default();
        assert!(!range.is_flipped());
        assert_eq!(range.midpoint(), 512);
        assert_eq!(range.scale(0, 1023), 0);
        assert_eq!(range.scale(700, 1023), 700);
        assert_eq!(range.scale(2000, 1023), 1023);

        let flipped = AxisRange::new(1023, 0);
        assert!(flipped.is_flipped());
        assert_eq!(flipped.midpoint(), 512);
        assert_eq!(flipped.scale(0, 1023), 1023);
        assert_eq!(flipped.scale(700, 1023), 323);

        assert_eq!(AxisRange::new(-100, 100).scale(4095, 4095), 100);
        assert_eq!(AxisRange::new(-100, 100).scale(0, 4095), -100);
    }

    #[test]
    fn very_wide_flipped_noise_saturates_the_reported_radius() {
        let cal = calibrate(&[0, 300_000], 25, true);
        assert_eq!((cal.min_center, cal.max_center), (150_000, 150_000));
        assert_eq!(cal.dead_zone_radius, u16::MAX);
        assert_eq!(cal.direction(150_000), Direction::Center);
        assert_eq!(cal.direction(150_001), Direction::Negative);
    }

    #[test]
    fn wide_ranges_have_a_midpoint() {
        assert_eq!(AxisRange::new(0, i32::MAX).midpoint(), 1 << 30);
        assert_eq!(AxisRange::new(i32::MAX, i32::MAX - 10).midpoint(), i32::MAX - 5);
        assert_eq!(AxisRange::new(i32::MIN, i32::MAX).midpoint(), 0);
    }

    #[test]
    fn direction_from_repr() {
        assert_eq!(Direction::from_repr(-1), Some(Direction::Negative));
        assert_eq!(Direction::from_repr(0), Some(Direction::Center));
        assert_eq!(Direction::from_repr(1), Some(Direction::Positive));
        assert_eq!(Direction::from_repr(2), None);
    }
}
