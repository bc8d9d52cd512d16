use core::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// No value is stored under the key.
    NotFound,
    /// The backing medium returned data that failed its own integrity checks.
    Corrupt,
    /// The value is larger than the supplied buffer. Holds the required size.
    BufferTooSmall(usize),
    /// There is no room left to store the value.
    Full,
    /// The medium could not be reached (card removed, bus error, ...).
    Io,
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Corrupt => write!(f, "storage medium is corrupt"),
            Self::BufferTooSmall(size) => write!(f, "buffer too small ({size} bytes needed)"),
            Self::Full => write!(f, "storage is full"),
            Self::Io => write!(f, "storage I/O error"),
        }
    }
}

impl core::error::Error for StorageError {}

/// A small key-value store used for persisted records such as the touchscreen calibration.
///
/// Implemented by the removable-storage or flash transport, which is not part of these crates.
pub trait Storage {
    /// Read the value stored under `key` into `buf`, returning the number of bytes read.
    fn get(&mut self, key: &[u8], buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    /// Remove the value stored under `key`.
    fn invalidate(&mut self, key: &[u8]) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for &mut S {
    fn get(&mut self, key: &[u8], buf: &mut [u8]) -> Result<usize, StorageError> {
        (**self).get(key, buf)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        (**self).put(key, value)
    }

    fn invalidate(&mut self, key: &[u8]) -> Result<(), StorageError> {
        (**self).invalidate(key)
    }
}
