//! Calibration of resistive touch panels.
//!
//! A resistive panel reports positions as raw ADC readings. The panel and the display underneath
//! are never perfectly aligned, may be rotated or mirrored relative to each other, and do not
//! share a resolution, so raw readings have to be transformed before they can be compared with
//! anything drawn on screen. The transform used here is an affine one, described by six
//! coefficients (see [CalibrationMatrix]):
//!
//! ```text
//! screen_x = a * raw_x + b * raw_y + c
//! screen_y = d * raw_x + e * raw_y + f
//! ```
//!
//! The coefficients are found by showing three non-collinear targets on screen, recording the
//! raw reading for each and solving the resulting pair of 3x3 linear systems
//! ([TouchCalibrationSession]). Once found, the matrix can be persisted as a fixed 28-byte
//! record and loaded on the next boot ([calibrate_touchscreen]), falling back to an interactive
//! session whenever the stored record is missing or unusable.

#![cfg_attr(not(test), no_std)]

pub mod calibrate;
pub mod matrix;
pub mod record;
pub mod session;

pub use crate::calibrate::{calibrate_touchscreen, load_calibration, save_calibration, CalibrationSource};
pub use crate::matrix::{CalibrationMatrix, SolveError};
pub use crate::record::{DataCorrupt, RecordError, RECORD_BYTES};
pub use crate::session::{CalibrationTargets, SessionConfig, SessionError, TouchCalibrationSession};
