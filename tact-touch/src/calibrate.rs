//! Load a stored calibration, or run an interactive session and store its result.

use core::fmt::{Display, Formatter};
use embedded_graphics::geometry::Point;
use embedded_hal::delay::DelayNs;
use tact_sys::{Storage, StorageError, TouchInput};
use crate::matrix::{CalibrationMatrix, SolveError};
use crate::record::{DataCorrupt, RecordError, RECORD_BYTES};
use crate::session::{SessionError, TouchCalibrationSession};

#[cfg(feature = "defmt")]
use defmt::{info, warn};

/// Storage key of the calibration record.
pub const CALIBRATION_KEY: &[u8] = b"touchscreen.calibration";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadError {
    Storage(StorageError),
    Corrupt(DataCorrupt),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "{e}"),
            Self::Corrupt(e) => write!(f, "{e}"),
        }
    }
}

impl core::error::Error for LoadError {}

impl From<StorageError> for LoadError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<DataCorrupt> for LoadError {
    fn from(value: DataCorrupt) -> Self {
        Self::Corrupt(value)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SaveError {
    Record(RecordError),
    Storage(StorageError),
}

impl Display for SaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Record(e) => write!(f, "{e}"),
            Self::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl core::error::Error for SaveError {}

impl From<RecordError> for SaveError {
    fn from(value: RecordError) -> Self {
        Self::Record(value)
    }
}

impl From<StorageError> for SaveError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Where the matrix returned by [calibrate_touchscreen] came from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationSource {
    Stored,
    Interactive,
}

pub fn load_calibration<S: Storage>(storage: &mut S) -> Result<CalibrationMatrix, LoadError> {
    // one spare byte so an oversized record is reported as such
    let mut buf = [0u8; RECORD_BYTES + 1];
    let len = storage.get(CALIBRATION_KEY, &mut buf)?;
    Ok(CalibrationMatrix::deserialize(&buf[..len])?)
}

pub fn save_calibration<S: Storage>(storage: &mut S, matrix: &CalibrationMatrix) -> Result<(), SaveError> {
    let record = matrix.serialize()?;
    storage.put(CALIBRATION_KEY, &record)?;
    Ok(())
}

/// Obtain a calibration matrix for the touch panel.
///
/// A valid stored record is used as is. Otherwise the interactive session runs, up to
/// `attempts` times if the user's touches do not produce a usable matrix, and the result is
/// written back to storage. Failing to store the result is logged but not fatal: the matrix is
/// still returned and the next boot will simply calibrate again.
pub fn calibrate_touchscreen<S, I, D>(
    storage: &mut S,
    session: &TouchCalibrationSession,
    input: &mut I,
    delay: &mut D,
    attempts: u8,
    mut present: impl FnMut(usize, Point),
) -> Result<(CalibrationMatrix, CalibrationSource), SessionError<I::Error>>
where
    S: Storage,
    I: TouchInput,
    D: DelayNs,
{
    match load_calibration(storage) {
        Ok(matrix) => {
            #[cfg(feature = "defmt")]
            info!("touch: using stored calibration {}", matrix);
            return Ok((matrix, CalibrationSource::Stored));
        }
        Err(_e) => {
            #[cfg(feature = "defmt")]
            warn!("touch: no usable stored calibration ({}), calibrating", _e);
        }
    }

    let mut failure = SolveError::Degenerate;
    for _attempt in 0..attempts.max(1) {
        match session.run(input, delay, &mut present) {
            Ok(matrix) => {
                if let Err(_e) = save_calibration(storage, &matrix) {
                    #[cfg(feature = "defmt")]
                    warn!("touch: failed to store calibration: {}", _e);
                }
                return Ok((matrix, CalibrationSource::Interactive));
            }
            Err(SessionError::CalibrationFailed(e)) => {
                #[cfg(feature = "defmt")]
                warn!("touch: calibration attempt {} failed: {}", _attempt, e);
                failure = e;
            }
            Err(e) => return Err(e),
        }
    }

    Err(SessionError::CalibrationFailed(failure))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::vec::Vec;
    use embedded_graphics::geometry::Size;
    use tact_sys::{TouchEvent, Wait};
    use crate::session::tests::{good_script, Delay, Script, RAW};

    #[derive(Default)]
    struct MemStorage {
        values: HashMap<Vec<u8>, Vec<u8>>,
        read_only: bool,
    }

    impl Storage for MemStorage {
        fn get(&mut self, key: &[u8], buf: &mut [u8]) -> Result<usize, StorageError> {
            let value = self.values.get(key).ok_or(StorageError::NotFound)?;
            let dst = buf.get_mut(..value.len()).ok_or(StorageError::BufferTooSmall(value.len()))?;
            dst.copy_from_slice(value);
            Ok(value.len())
        }

        fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
            if self.read_only {
                return Err(StorageError::Io);
            }
            self.values.insert(key.to_vec(), value.to_vec());
            Ok(())
        }

        fn invalidate(&mut self, key: &[u8]) -> Result<(), StorageError> {
            self.values.remove(key).map(|_| ()).ok_or(StorageError::NotFound)
        }
    }

    const STORED: CalibrationMatrix = CalibrationMatrix::new(0.06, 0.0, -5.0, 0.0, 0.08, -7.0);

    fn session() -> TouchCalibrationSession {
        TouchCalibrationSession::for_screen(Size::new(240, 320))
    }

    #[test]
    fn stored_calibration_skips_session() {
        let mut storage = MemStorage::default();
        save_calibration(&mut storage, &STORED).unwrap();

        let mut presented = 0;
        let (matrix, source) = calibrate_touchscreen(
            &mut storage,
            &session(),
            &mut Script(Default::default()),
            &mut Delay::default(),
            1,
            |_, _| presented += 1,
        )
        .unwrap();

        assert_eq!(matrix, STORED);
        assert_eq!(source, CalibrationSource::Stored);
        assert_eq!(presented, 0);
    }

    #[test]
    fn missing_calibration_runs_session_and_persists() {
        let mut storage = MemStorage::default();
        let (matrix, source) = calibrate_touchscreen(
            &mut storage,
            &session(),
            &mut good_script(),
            &mut Delay::default(),
            1,
            |_, _| {},
        )
        .unwrap();

        assert_eq!(source, CalibrationSource::Interactive);
        assert_eq!(load_calibration(&mut storage), Ok(matrix));
    }

    #[test]
    fn corrupt_calibration_is_replaced() {
        let mut storage = MemStorage::default();
        let mut record = STORED.serialize().unwrap();
        record[0] ^= 0xff;
        storage.put(CALIBRATION_KEY, &record).unwrap();
        assert!(matches!(load_calibration(&mut storage), Err(LoadError::Corrupt(DataCorrupt::Checksum { .. }))));

        let (matrix, source) = calibrate_touchscreen(
            &mut storage,
            &session(),
            &mut good_script(),
            &mut Delay::default(),
            1,
            |_, _| {},
        )
        .unwrap();

        assert_eq!(source, CalibrationSource::Interactive);
        assert_eq!(matrix.map(RAW[0].0, RAW[0].1), Point::new(60, 80));
        assert_eq!(load_calibration(&mut storage), Ok(matrix));
    }

    #[test]
    fn oversized_record_is_corrupt() {
        let mut storage = MemStorage::default();
        storage.put(CALIBRATION_KEY, &[0u8; RECORD_BYTES + 1]).unwrap();
        assert_eq!(load_calibration(&mut storage), Err(LoadError::Corrupt(DataCorrupt::Oversized(RECORD_BYTES + 1))));

        storage.put(CALIBRATION_KEY, &[0u8; 64]).unwrap();
        assert_eq!(load_calibration(&mut storage), Err(LoadError::Storage(StorageError::BufferTooSmall(64))));
    }

    #[test]
    fn failed_attempt_is_retried() {
        let mut events: Vec<_> = [(100, 100), (200, 200), (300, 300)]
            .into_iter()
            .flat_map(|(x, y)| Script::tap(x, y, 4))
            .collect();
        events.extend(good_script().0);

        let mut presented = 0;
        let (_, source) = calibrate_touchscreen(
            &mut MemStorage::default(),
            &session(),
            &mut Script::new(events),
            &mut Delay::default(),
            2,
            |_, _| presented += 1,
        )
        .unwrap();

        assert_eq!(source, CalibrationSource::Interactive);
        assert_eq!(presented, 6);
    }

    #[test]
    fn exhausted_attempts_report_failure() {
        let events = [(100, 100), (200, 200), (300, 300)]
            .into_iter()
            .flat_map(|(x, y)| Script::tap(x, y, 4));

        let result = calibrate_touchscreen(
            &mut MemStorage::default(),
            &session(),
            &mut Script::new(events),
            &mut Delay::default(),
            1,
            |_, _| {},
        );
        assert!(matches!(result, Err(SessionError::CalibrationFailed(SolveError::Collinear))));
    }

    #[test]
    fn store_failure_is_not_fatal() {
        let mut storage = MemStorage { read_only: true, ..Default::default() };
        let (_, source) = calibrate_touchscreen(
            &mut storage,
            &session(),
            &mut good_script(),
            &mut Delay::default(),
            1,
            |_, _| {},
        )
        .unwrap();

        assert_eq!(source, CalibrationSource::Interactive);
        assert_eq!(load_calibration(&mut storage), Err(LoadError::Storage(StorageError::NotFound)));
    }

    #[test]
    fn cancelled_session_is_not_retried() {
        let mut presented = 0;
        let result = calibrate_touchscreen(
            &mut MemStorage::default(),
            &session(),
            &mut Script::new([Wait::<TouchEvent>::Cancelled]),
            &mut Delay::default(),
            3,
            |_, _| presented += 1,
        );

        assert!(matches!(result, Err(SessionError::Aborted)));
        assert_eq!(presented, 1);
    }
}
