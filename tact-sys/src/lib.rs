//! Types and collaborator traits shared by the tact input crates.

#![cfg_attr(not(test), no_std)]

pub mod input;
pub mod module;
pub mod storage;

pub use input::{TouchEvent, TouchInput};
pub use storage::{Storage, StorageError};

/// Result of a call that suspends the control loop until the hardware delivers something.
///
/// Every blocking collaborator returns one of these instead of blocking forever, so callers can
/// tell a delivered value apart from a timeout or an explicit cancellation.
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wait<T> {
    Ready(T),
    TimedOut,
    Cancelled,
}

impl<T> Wait<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Wait::Ready(v) => Some(v),
            Wait::TimedOut | Wait::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Wait<U> {
        match self {
            Wait::Ready(v) => Wait::Ready(f(v)),
            Wait::TimedOut => Wait::TimedOut,
            Wait::Cancelled => Wait::Cancelled,
        }
    }
}

impl<T> From<Option<T>> for Wait<T> {
    /// `None` is read as a timeout.
    fn from(value: Option<T>) -> Self {
        match value {
            None => Wait::TimedOut,
            Some(v) => Wait::Ready(v),
        }
    }
}
