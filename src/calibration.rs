//! Calibration arithmetic and automatic gain selection.
//!
//! The INA219 computes `current = shunt_voltage * calibration / 4096` internally.
//! Picking the calibration value fixes the current LSB; the power LSB is always
//! twenty times the current LSB.

use crate::data_types::{CalibrationState, Gain};
use crate::error::CalibrationError;

/// Fixed internal scaling constant from the datasheet (0.04096 = 4096 x 10 µV).
pub const CALIBRATION_FACTOR: f32 = 0.040_96;
/// Largest usable calibration value; bit 0 of the register is void.
pub const MAX_CALIBRATION: u16 = 0xFFFE;
/// Largest positive magnitude of the signed 16-bit current register.
pub const CURRENT_LSB_DIVISOR: f32 = 32_767.0;
pub const POWER_LSB_FACTOR: f32 = 20.0;
/// Shunt ADC counts per millivolt (10 µV LSB).
pub const SHUNT_COUNTS_PER_MV: u32 = 100;
/// Divisor the device applies to `shunt_counts * calibration`.
pub const CALIBRATION_DIVISOR: u32 = 4096;
/// Relative slack when comparing a requested current against a gain ceiling,
/// so that e.g. 0.4 A on 0.1 Ω still fits ±40 mV in f32.
pub const RANGE_TOLERANCE: f32 = 1.0e-4;

/// Full-scale shunt voltage of `gain`, in volts.
pub fn max_shunt_voltage(gain: Gain) -> f32 {
    gain.full_scale_volts()
}

/// Largest current `gain` can measure through `shunt_ohms` before the ADC saturates.
pub fn max_current_before_overflow(shunt_ohms: f32, gain: Gain) -> f32 {
    max_shunt_voltage(gain) / shunt_ohms
}

/// Current LSB that corresponds to [`MAX_CALIBRATION`]; finer LSBs are not representable.
pub fn min_current_lsb(shunt_ohms: f32) -> f32 {
    CALIBRATION_FACTOR / (shunt_ohms * MAX_CALIBRATION as f32)
}

fn validate_shunt(shunt_ohms: f32) -> Result<(), CalibrationError> {
    if shunt_ohms.is_finite() && shunt_ohms > 0.0 {
        Ok(())
    } else {
        Err(CalibrationError::InvalidShunt)
    }
}

fn validate_current(amps: f32) -> Result<(), CalibrationError> {
    if amps.is_finite() && amps > 0.0 {
        Ok(())
    } else {
        Err(CalibrationError::OutOfRange)
    }
}

fn fits(shunt_ohms: f32, max_expected_amps: f32, gain: Gain) -> bool {
    max_expected_amps <= max_current_before_overflow(shunt_ohms, gain) * (1.0 + RANGE_TOLERANCE)
}

/// Compute the calibration for measuring up to `max_expected_amps` with `gain`.
pub fn compute(
    shunt_ohms: f32,
    max_expected_amps: f32,
    gain: Gain,
) -> Result<CalibrationState, CalibrationError> {
    validate_shunt(shunt_ohms)?;
    validate_current(max_expected_amps)?;
    if !fits(shunt_ohms, max_expected_amps, gain) {
        return Err(CalibrationError::OutOfRange);
    }

    let min_lsb = min_current_lsb(shunt_ohms);
    let mut current_lsb = max_expected_amps / CURRENT_LSB_DIVISOR;
    let calibration = if current_lsb < min_lsb {
        current_lsb = min_lsb;
        MAX_CALIBRATION
    } else {
        let raw = CALIBRATION_FACTOR / (current_lsb * shunt_ohms);
        if raw >= MAX_CALIBRATION as f32 {
            MAX_CALIBRATION
        } else {
            // Truncation toward zero; raw is positive.
            raw as u16
        }
    };

    Ok(CalibrationState {
        current_lsb,
        power_lsb: current_lsb * POWER_LSB_FACTOR,
        calibration,
    })
}

/// Pick the smallest gain whose ceiling covers `max_expected_amps` and calibrate for it.
///
/// Without an expected current the highest gain is used and calibrated for its
/// whole ceiling, trading resolution for headroom.
pub fn select(
    shunt_ohms: f32,
    max_expected_amps: Option<f32>,
) -> Result<(Gain, CalibrationState), CalibrationError> {
    validate_shunt(shunt_ohms)?;
    let Some(amps) = max_expected_amps else {
        let gain = Gain::highest();
        let state = compute(shunt_ohms, max_current_before_overflow(shunt_ohms, gain), gain)?;
        return Ok((gain, state));
    };
    validate_current(amps)?;

    let gain = Gain::ALL
        .into_iter()
        .find(|gain| fits(shunt_ohms, amps, *gain))
        .ok_or(CalibrationError::OutOfRange)?;
    Ok((gain, compute(shunt_ohms, amps, gain)?))
}

/// Current register value the device produces when the shunt ADC sits at the
/// full scale of `gain`.
pub fn current_register_at_clip(gain: Gain, calibration: u16) -> u32 {
    let clip_counts = gain.full_scale_millivolts() as u32 * SHUNT_COUNTS_PER_MV;
    clip_counts * calibration as u32 / CALIBRATION_DIVISOR
}

/// Whether the overflow flag can be trusted for this calibration and gain.
///
/// OVF only sets when the current register passes `i16::MAX` before the shunt
/// ADC clips. A calibration for the whole gain ceiling stops just short of that,
/// so readings saturate silently.
pub fn overflow_detectable(gain: Gain, state: &CalibrationState) -> bool {
    current_register_at_clip(gain, state.calibration) > i16::MAX as u32
}
