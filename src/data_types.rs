//! Data types for the INA219 driver.
//! Every enum carries its register code and the physical constant it stands for.

/// Shunt voltage full-scale selection (PGA gain).
///
/// Variants are ordered from the smallest to the largest full-scale range, so a
/// higher gain means more headroom and a coarser current LSB.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Gain {
    /// /1, ±40 mV.
    Div1_40mV,
    /// /2, ±80 mV.
    Div2_80mV,
    /// /4, ±160 mV.
    Div4_160mV,
    /// /8, ±320 mV (power-on default).
    Div8_320mV,
}

impl Gain {
    /// All gains in ascending full-scale order.
    pub const ALL: [Gain; 4] = [
        Gain::Div1_40mV,
        Gain::Div2_80mV,
        Gain::Div4_160mV,
        Gain::Div8_320mV,
    ];

    /// PG[1:0] field value.
    pub const fn code(self) -> u16 {
        match self {
            Gain::Div1_40mV => 0b00,
            Gain::Div2_80mV => 0b01,
            Gain::Div4_160mV => 0b10,
            Gain::Div8_320mV => 0b11,
        }
    }

    pub const fn from_code(code: u16) -> Gain {
        match code & 0b11 {
            0b00 => Gain::Div1_40mV,
            0b01 => Gain::Div2_80mV,
            0b10 => Gain::Div4_160mV,
            _ => Gain::Div8_320mV,
        }
    }

    /// Full-scale shunt voltage in volts.
    pub const fn full_scale_volts(self) -> f32 {
        match self {
            Gain::Div1_40mV => 0.04,
            Gain::Div2_80mV => 0.08,
            Gain::Div4_160mV => 0.16,
            Gain::Div8_320mV => 0.32,
        }
    }

    pub const fn full_scale_millivolts(self) -> u16 {
        match self {
            Gain::Div1_40mV => 40,
            Gain::Div2_80mV => 80,
            Gain::Div4_160mV => 160,
            Gain::Div8_320mV => 320,
        }
    }

    /// Next larger range, `None` at ±320 mV.
    pub const fn next(self) -> Option<Gain> {
        match self {
            Gain::Div1_40mV => Some(Gain::Div2_80mV),
            Gain::Div2_80mV => Some(Gain::Div4_160mV),
            Gain::Div4_160mV => Some(Gain::Div8_320mV),
            Gain::Div8_320mV => None,
        }
    }

    pub const fn highest() -> Gain {
        Gain::Div8_320mV
    }
}

/// Bus voltage full-scale range (BRNG).
///
/// The device clips the bus input at about 26 V even with the 32 V setting.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VoltageRange {
    V16,
    V32,
}

impl VoltageRange {
    pub const fn code(self) -> u16 {
        match self {
            VoltageRange::V16 => 0,
            VoltageRange::V32 => 1,
        }
    }

    pub const fn from_code(code: u16) -> VoltageRange {
        if code & 1 == 0 {
            VoltageRange::V16
        } else {
            VoltageRange::V32
        }
    }

    /// Nominal bus full scale in volts.
    pub const fn full_scale_bus_volts(self) -> u8 {
        match self {
            VoltageRange::V16 => 16,
            VoltageRange::V32 => 32,
        }
    }
}

/// ADC resolution or averaging for the bus (BADC) and shunt (SADC) fields.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AdcResolution {
    Bits9,
    Bits10,
    Bits11,
    Bits12,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
    Samples32,
    Samples64,
    Samples128,
}

impl AdcResolution {
    pub const ALL: [AdcResolution; 11] = [
        AdcResolution::Bits9,
        AdcResolution::Bits10,
        AdcResolution::Bits11,
        AdcResolution::Bits12,
        AdcResolution::Samples2,
        AdcResolution::Samples4,
        AdcResolution::Samples8,
        AdcResolution::Samples16,
        AdcResolution::Samples32,
        AdcResolution::Samples64,
        AdcResolution::Samples128,
    ];

    /// 4-bit ADC field value.
    pub const fn code(self) -> u16 {
        match self {
            AdcResolution::Bits9 => 0b0000,
            AdcResolution::Bits10 => 0b0001,
            AdcResolution::Bits11 => 0b0010,
            AdcResolution::Bits12 => 0b0011,
            AdcResolution::Samples2 => 0b1001,
            AdcResolution::Samples4 => 0b1010,
            AdcResolution::Samples8 => 0b1011,
            AdcResolution::Samples16 => 0b1100,
            AdcResolution::Samples32 => 0b1101,
            AdcResolution::Samples64 => 0b1110,
            AdcResolution::Samples128 => 0b1111,
        }
    }

    /// Decode a 4-bit ADC field. With bit 3 clear, bit 2 is don't-care;
    /// `0b1000` is plain 12-bit.
    pub const fn from_code(code: u16) -> AdcResolution {
        let code = code & 0b1111;
        if code & 0b1000 == 0 {
            match code & 0b11 {
                0b00 => AdcResolution::Bits9,
                0b01 => AdcResolution::Bits10,
                0b10 => AdcResolution::Bits11,
                _ => AdcResolution::Bits12,
            }
        } else {
            match code {
                0b1001 => AdcResolution::Samples2,
                0b1010 => AdcResolution::Samples4,
                0b1011 => AdcResolution::Samples8,
                0b1100 => AdcResolution::Samples16,
                0b1101 => AdcResolution::Samples32,
                0b1110 => AdcResolution::Samples64,
                0b1111 => AdcResolution::Samples128,
                _ => AdcResolution::Bits12,
            }
        }
    }

    /// Typical conversion time in microseconds (datasheet table 5). Informational.
    pub const fn conversion_time_us(self) -> u32 {
        match self {
            AdcResolution::Bits9 => 84,
            AdcResolution::Bits10 => 148,
            AdcResolution::Bits11 => 276,
            AdcResolution::Bits12 => 532,
            AdcResolution::Samples2 => 1_060,
            AdcResolution::Samples4 => 2_130,
            AdcResolution::Samples8 => 4_260,
            AdcResolution::Samples16 => 8_510,
            AdcResolution::Samples32 => 17_020,
            AdcResolution::Samples64 => 34_050,
            AdcResolution::Samples128 => 68_100,
        }
    }
}

/// Operating mode (MODE[2:0]). Triggered and ADC-off modes are not supported.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperatingMode {
    PowerDown,
    ShuntContinuous,
    BusContinuous,
    ShuntAndBusContinuous,
}

impl OperatingMode {
    pub const fn code(self) -> u16 {
        match self {
            OperatingMode::PowerDown => 0b000,
            OperatingMode::ShuntContinuous => 0b101,
            OperatingMode::BusContinuous => 0b110,
            OperatingMode::ShuntAndBusContinuous => 0b111,
        }
    }

    pub const fn from_code(code: u16) -> Option<OperatingMode> {
        match code & 0b111 {
            0b000 => Some(OperatingMode::PowerDown),
            0b101 => Some(OperatingMode::ShuntContinuous),
            0b110 => Some(OperatingMode::BusContinuous),
            0b111 => Some(OperatingMode::ShuntAndBusContinuous),
            _ => None,
        }
    }
}

/// Everything the configuration register holds.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DeviceConfig {
    pub voltage_range: VoltageRange,
    pub gain: Gain,
    pub bus_adc: AdcResolution,
    pub shunt_adc: AdcResolution,
    pub mode: OperatingMode,
}

impl Default for DeviceConfig {
    /// Power-on reset value (0x399F).
    fn default() -> Self {
        Self {
            voltage_range: VoltageRange::V32,
            gain: Gain::Div8_320mV,
            bus_adc: AdcResolution::Bits12,
            shunt_adc: AdcResolution::Bits12,
            mode: OperatingMode::ShuntAndBusContinuous,
        }
    }
}

/// Calibration derived from shunt resistance, expected current and gain.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationState {
    /// Amps per bit of the current register.
    pub current_lsb: f32,
    /// Watts per bit of the power register (20 x `current_lsb`).
    pub power_lsb: f32,
    /// Value written to the calibration register.
    pub calibration: u16,
}

/// How `configure` picks the gain.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GainSelection {
    /// Smallest gain that fits the expected current, or the highest gain
    /// when no expected current is given.
    Auto,
    Fixed(Gain),
}

/// Measurement intent passed to `configure`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    pub voltage_range: VoltageRange,
    pub gain: GainSelection,
    pub bus_adc: AdcResolution,
    pub shunt_adc: AdcResolution,
    /// Maximum current expected through the shunt, in amps.
    pub max_expected_amps: Option<f32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            voltage_range: VoltageRange::V32,
            gain: GainSelection::Auto,
            bus_adc: AdcResolution::Bits12,
            shunt_adc: AdcResolution::Bits12,
            max_expected_amps: None,
        }
    }
}

impl Settings {
    pub fn with_voltage_range(mut self, range: VoltageRange) -> Self {
        self.voltage_range = range;
        self
    }

    pub fn with_gain(mut self, gain: GainSelection) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_bus_adc(mut self, adc: AdcResolution) -> Self {
        self.bus_adc = adc;
        self
    }

    pub fn with_shunt_adc(mut self, adc: AdcResolution) -> Self {
        self.shunt_adc = adc;
        self
    }

    pub fn with_max_expected_amps(mut self, amps: f32) -> Self {
        self.max_expected_amps = Some(amps);
        self
    }
}

/// Session lifecycle.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    /// No calibration committed (fresh session or after reset).
    Unconfigured,
    Configured,
    /// MODE bits cleared; registers hold the last latched conversion.
    PoweredDown,
}
