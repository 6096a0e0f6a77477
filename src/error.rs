//! Error definitions for the INA219 driver.

use crate::data_types::Gain;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq)]
pub enum Error<I2cError> {
    /// Underlying I2C transaction failed.
    I2c(I2cError),
    /// Requested maximum current is not positive or exceeds what the shunt/gain can measure.
    OutOfRange,
    /// The device flagged a math overflow, current and power readings are invalid.
    CurrentOverflow {
        gain: Gain,
        /// Already at ±320 mV, no larger range is available.
        device_limit_reached: bool,
    },
    /// The active calibration cannot tell an overflow from a valid reading.
    OverflowUndetectable,
    /// Measurement or transition needs a committed calibration.
    NotConfigured,
    /// Invalid shunt value or configuration register content.
    InvalidConfig,
}

impl<I2cError> Error<I2cError> {
    /// Range errors cover both a rejected current request and an overflow seen on read.
    pub fn is_range_error(&self) -> bool {
        matches!(self, Error::OutOfRange | Error::CurrentOverflow { .. })
    }
}

impl<I2cError: core::fmt::Debug> core::fmt::Display for Error<I2cError> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {:?}", e),
            Error::OutOfRange => write!(f, "expected current out of range, use a lower value shunt resistor"),
            Error::CurrentOverflow {
                gain,
                device_limit_reached,
            } => {
                write!(
                    f,
                    "current out of range (overflow) for gain {} mV",
                    gain.full_scale_millivolts()
                )?;
                if *device_limit_reached {
                    write!(f, ", device limit reached")?;
                }
                Ok(())
            }
            Error::OverflowUndetectable => {
                write!(f, "overflow cannot be detected with the active calibration")
            }
            Error::NotConfigured => write!(f, "device not configured"),
            Error::InvalidConfig => write!(f, "invalid configuration"),
        }
    }
}

/// Failures of the pure calibration arithmetic.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CalibrationError {
    /// Shunt resistance is not a positive, finite value.
    InvalidShunt,
    /// Expected current is not positive or no gain can measure it.
    OutOfRange,
}

impl<I2cError> From<CalibrationError> for Error<I2cError> {
    fn from(e: CalibrationError) -> Self {
        match e {
            CalibrationError::InvalidShunt => Error::InvalidConfig,
            CalibrationError::OutOfRange => Error::OutOfRange,
        }
    }
}

impl core::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CalibrationError::InvalidShunt => write!(f, "shunt resistance must be positive"),
            CalibrationError::OutOfRange => write!(f, "expected current out of range"),
        }
    }
}
