use core::fmt::{Display, Formatter};
use crate::Wait;

/// Size of a [TouchEvent] on the wire: X (u16), Y (u16), pressure (u32), valid (u8), all
/// little-endian.
pub const WIRE_BYTES: usize = 9;

/// A single raw sample from the resistive touch controller.
///
/// `x` and `y` are in ADC units, not screen pixels. `valid` is false when the pen is up or the
/// controller rejected the sample; coordinates of an invalid sample are meaningless.
#[repr(C)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TouchEvent {
    pub x: u16,
    pub y: u16,
    pub pressure: u32,
    pub valid: bool,
}

impl TouchEvent {
    pub const fn new(x: u16, y: u16, pressure: u32) -> Self {
        Self {
            x,
            y,
            pressure,
            valid: true,
        }
    }

    /// The sample reported when the pen leaves the panel.
    pub const fn released() -> Self {
        Self {
            x: u16::MAX,
            y: u16::MAX,
            pressure: 0,
            valid: false,
        }
    }

    pub fn to_wire(&self) -> [u8; WIRE_BYTES] {
        let mut buf = [0u8; WIRE_BYTES];
        buf[0..2].copy_from_slice(&self.x.to_le_bytes());
        buf[2..4].copy_from_slice(&self.y.to_le_bytes());
        buf[4..8].copy_from_slice(&self.pressure.to_le_bytes());
        buf[8] = self.valid as u8;
        buf
    }

    /// Decode a sample from the wire. Returns `None` for a short buffer or a validity byte other
    /// than 0 or 1.
    pub fn from_wire(buf: &[u8]) -> Option<Self> {
        let buf: &[u8; WIRE_BYTES] = buf.get(..WIRE_BYTES)?.try_into().ok()?;
        let valid = match buf[8] {
            0 => false,
            1 => true,
            _ => return None,
        };

        Some(Self {
            x: u16::from_le_bytes([buf[0], buf[1]]),
            y: u16::from_le_bytes([buf[2], buf[3]]),
            pressure: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            valid,
        })
    }
}

impl Display for TouchEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        if self.valid {
            write!(f, "touch @ ({}, {}) pressure {}", self.x, self.y, self.pressure)
        } else {
            write!(f, "released")
        }
    }
}

/// The touch sensor transport.
///
/// `wait_for_event` suspends the single control loop until the controller produces a sample, a
/// timeout elapses or the caller cancels the wait.
pub trait TouchInput {
    type Error;

    fn wait_for_event(&mut self) -> Result<Wait<TouchEvent>, Self::Error>;
}

impl<T: TouchInput + ?Sized> TouchInput for &mut T {
    type Error = T::Error;

    fn wait_for_event(&mut self) -> Result<Wait<TouchEvent>, Self::Error> {
        (**self).wait_for_event()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_layout_is_little_endian() {
        let ev = TouchEvent::new(0x0102, 0x0304, 0x0a0b0c0d);
        assert_eq!(ev.to_wire(), [0x02, 0x01, 0x04, 0x03, 0x0d, 0x0c, 0x0b, 0x0a, 1]);
        assert_eq!(TouchEvent::from_wire(&ev.to_wire()), Some(ev));
    }

    #[test]
    fn from_wire_rejects_bad_input() {
        assert_eq!(TouchEvent::from_wire(&[0; 8]), None);
        assert_eq!(TouchEvent::from_wire(&[0, 0, 0, 0, 0, 0, 0, 0, 2]), None);

        let released = TouchEvent::from_wire(&[0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(released, TouchEvent::released());
    }

    #[test]
    fn display() {
        assert_eq!(TouchEvent::new(1, 2, 3).to_string(), "touch @ (1, 2) pressure 3");
        assert_eq!(TouchEvent::released().to_string(), "released");
    }
}
