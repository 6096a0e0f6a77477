//! Register map, bitfields and raw-value conversions for the INA219.
//! All registers are 16 bits wide and transferred MSB first.

use crate::data_types::{AdcResolution, DeviceConfig, Gain, OperatingMode, VoltageRange};

/// Default 7-bit I2C address (A0 = A1 = GND).
pub const DEFAULT_I2C_ADDRESS: u8 = 0x40;

/// Register addresses.
pub mod addr {
    /// Configuration (reset, ranges, ADC settings, mode).
    pub const CONFIG: u8 = 0x00;
    /// Shunt voltage, signed, 10 µV LSB.
    pub const SHUNT_VOLTAGE: u8 = 0x01;
    /// Bus voltage in bits 15-3 plus CNVR/OVF flags.
    pub const BUS_VOLTAGE: u8 = 0x02;
    pub const POWER: u8 = 0x03;
    pub const CURRENT: u8 = 0x04;
    pub const CALIBRATION: u8 = 0x05;
}

/// Bus voltage LSB.
pub const BUS_VOLTAGE_LSB_MV: i32 = 4;
/// Shunt voltage LSB (10 µV).
pub const SHUNT_VOLTAGE_LSB_MV: f32 = 0.01;
/// Recovery time after leaving power-down before a conversion is valid.
pub const WAKE_UP_TIME_US: u32 = 40;

/// Field positions inside CONFIG.
pub const BRNG_SHIFT: u16 = 13;
pub const PG_SHIFT: u16 = 11;
pub const BADC_SHIFT: u16 = 7;
pub const SADC_SHIFT: u16 = 3;
pub const MODE_SHIFT: u16 = 0;

bitflags::bitflags! {
    /// CONFIG register bits (0x00). Bit 14 is reserved.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct ConfigBits: u16 {
        /// Bit 15: Reset, self-clearing.
        const RST   = 1 << 15;
        /// Bit 13: Bus voltage range (0 = 16 V, 1 = 32 V).
        const BRNG  = 1 << 13;
        /// Bits 12-11: PGA gain.
        const PG1   = 1 << 12;
        const PG0   = 1 << 11;
        /// Bits 10-7: Bus ADC resolution/averaging.
        const BADC4 = 1 << 10;
        const BADC3 = 1 << 9;
        const BADC2 = 1 << 8;
        const BADC1 = 1 << 7;
        /// Bits 6-3: Shunt ADC resolution/averaging.
        const SADC4 = 1 << 6;
        const SADC3 = 1 << 5;
        const SADC2 = 1 << 4;
        const SADC1 = 1 << 3;
        /// Bits 2-0: Operating mode.
        const MODE3 = 1 << 2;
        const MODE2 = 1 << 1;
        const MODE1 = 1 << 0;
    }

    /// Flag bits of the BUS_VOLTAGE register (0x02). Bit 2 is reserved.
    ///
    /// OVF is bit 0 and CNVR bit 1, matching the datasheet register layout.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct BusVoltageBits: u16 {
        /// Bit 1: Conversion ready.
        const CNVR = 1 << 1;
        /// Bit 0: Math overflow, current/power are meaningless.
        const OVF  = 1 << 0;
    }
}

impl ConfigBits {
    pub const PG: ConfigBits = ConfigBits::PG1.union(ConfigBits::PG0);
    pub const BADC: ConfigBits = ConfigBits::BADC4
        .union(ConfigBits::BADC3)
        .union(ConfigBits::BADC2)
        .union(ConfigBits::BADC1);
    pub const SADC: ConfigBits = ConfigBits::SADC4
        .union(ConfigBits::SADC3)
        .union(ConfigBits::SADC2)
        .union(ConfigBits::SADC1);
    pub const MODE: ConfigBits = ConfigBits::MODE3
        .union(ConfigBits::MODE2)
        .union(ConfigBits::MODE1);
}

/// Pack a configuration into the CONFIG register value. Reserved bits stay zero.
pub fn encode_config(config: &DeviceConfig) -> u16 {
    (config.voltage_range.code() << BRNG_SHIFT)
        | (config.gain.code() << PG_SHIFT)
        | (config.bus_adc.code() << BADC_SHIFT)
        | (config.shunt_adc.code() << SADC_SHIFT)
        | (config.mode.code() << MODE_SHIFT)
}

/// Unpack a CONFIG register value. `None` for triggered or ADC-off modes.
pub fn decode_config(value: u16) -> Option<DeviceConfig> {
    let bits = ConfigBits::from_bits_truncate(value);
    let mode = OperatingMode::from_code((bits & ConfigBits::MODE).bits() >> MODE_SHIFT)?;
    Some(DeviceConfig {
        voltage_range: VoltageRange::from_code((bits & ConfigBits::BRNG).bits() >> BRNG_SHIFT),
        gain: Gain::from_code((bits & ConfigBits::PG).bits() >> PG_SHIFT),
        bus_adc: AdcResolution::from_code((bits & ConfigBits::BADC).bits() >> BADC_SHIFT),
        shunt_adc: AdcResolution::from_code((bits & ConfigBits::SADC).bits() >> SADC_SHIFT),
        mode,
    })
}

/// Decoded BUS_VOLTAGE register.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BusVoltageReading {
    raw: u16,
}

impl BusVoltageReading {
    pub const fn from_bits(raw: u16) -> Self {
        Self { raw }
    }

    pub const fn raw(self) -> u16 {
        self.raw
    }

    /// Bits 15-3 as a 13-bit two's complement count (sign bit is register bit 15).
    pub const fn counts(self) -> i16 {
        (self.raw as i16) >> 3
    }

    pub const fn millivolts(self) -> i32 {
        self.counts() as i32 * BUS_VOLTAGE_LSB_MV
    }

    pub fn volts(self) -> f32 {
        self.millivolts() as f32 / 1000.0
    }

    pub const fn overflow(self) -> bool {
        self.raw & BusVoltageBits::OVF.bits() != 0
    }

    pub const fn conversion_ready(self) -> bool {
        self.raw & BusVoltageBits::CNVR.bits() != 0
    }
}

/// Shunt voltage register to millivolts.
pub fn shunt_voltage_mv(raw: i16) -> f32 {
    raw as f32 * SHUNT_VOLTAGE_LSB_MV
}

/// Current register to milliamps.
pub fn current_ma(raw: i16, current_lsb: f32) -> f32 {
    raw as f32 * current_lsb * 1000.0
}

/// Power register to milliwatts.
pub fn power_mw(raw: u16, power_lsb: f32) -> f32 {
    raw as f32 * power_lsb * 1000.0
}

/// Supply side voltage: bus voltage plus the drop across the shunt.
pub fn supply_voltage_v(bus_volts: f32, shunt_mv: f32) -> f32 {
    bus_volts + shunt_mv / 1000.0
}
