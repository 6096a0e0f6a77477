//! INA219 Rust Driver
//!
//! `no_std` driver for the TI INA219 current/voltage/power monitor over I2C.
//! It derives the calibration register from the shunt resistance and expected
//! current, picks the PGA gain automatically, and converts raw registers to
//! volts, milliamps and milliwatts while reporting math overflow as an error.
//! Optional async (`async` feature) and defmt (`defmt` feature) support.

#![no_std]

pub mod calibration;
pub mod data_types;
pub mod driver;
pub mod error;
pub mod registers;

pub use data_types::{AdcResolution, DeviceConfig, Gain, GainSelection, Settings, VoltageRange};
pub use driver::Ina219;
pub use error::Error;
pub use registers::DEFAULT_I2C_ADDRESS;
