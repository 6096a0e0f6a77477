//! Device session for the INA219.
//! Blocking I2C by default; the `async` feature turns the same API into `async fn`s.

#[cfg(not(feature = "async"))]
use embedded_hal::i2c::I2c;
#[cfg(feature = "async")]
use embedded_hal_async::i2c::I2c;

use crate::calibration::{self, max_current_before_overflow, overflow_detectable};
use crate::data_types::{
    CalibrationState, DeviceConfig, Gain, GainSelection, OperatingMode, SessionState, Settings,
};
use crate::error::Error;
use crate::registers::{
    addr, current_ma, decode_config, encode_config, power_mw, shunt_voltage_mv, supply_voltage_v,
    BusVoltageReading, ConfigBits, DEFAULT_I2C_ADDRESS,
};

/// INA219 session: owns the bus handle and the calibration needed to interpret reads.
pub struct Ina219<I2C> {
    i2c: I2C,
    address: u8,
    shunt_ohms: f32,
    state: SessionState,
    config: DeviceConfig,
    calibration: Option<CalibrationState>,
}

impl<I2C> Ina219<I2C> {
    /// Create a session at the default I2C address (0x40).
    pub fn new(i2c: I2C, shunt_ohms: f32) -> Self {
        Self::with_address(i2c, DEFAULT_I2C_ADDRESS, shunt_ohms)
    }

    /// Create a session with a custom I2C address (A0/A1 strapping).
    pub fn with_address(i2c: I2C, address: u8, shunt_ohms: f32) -> Self {
        Self {
            i2c,
            address,
            shunt_ohms,
            state: SessionState::Unconfigured,
            config: DeviceConfig::default(),
            calibration: None,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Shunt resistance in ohms, fixed for the session.
    pub fn shunt_ohms(&self) -> f32 {
        self.shunt_ohms
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Last committed configuration (device defaults before the first `configure`).
    pub fn config(&self) -> DeviceConfig {
        self.config
    }

    pub fn calibration(&self) -> Option<CalibrationState> {
        self.calibration
    }

    /// Release the bus handle.
    pub fn free(self) -> I2C {
        self.i2c
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "Ina219",),
    async(feature = "async", keep_self)
)]
impl<I2C> Ina219<I2C>
where
    I2C: I2c,
{
    fn ensure_measuring(&self) -> Result<(), Error<I2C::Error>> {
        match self.state {
            SessionState::Unconfigured => Err(Error::NotConfigured),
            SessionState::Configured | SessionState::PoweredDown => Ok(()),
        }
    }

    fn active_calibration(&self) -> Result<CalibrationState, Error<I2C::Error>> {
        self.ensure_measuring()?;
        self.calibration.ok_or(Error::NotConfigured)
    }

    fn invalidate(&mut self) {
        self.calibration = None;
        self.state = SessionState::Unconfigured;
    }

    fn overflow_error(&self) -> Error<I2C::Error> {
        let gain = self.config.gain;
        Error::CurrentOverflow {
            gain,
            device_limit_reached: gain.next().is_none(),
        }
    }

    /// Write a 16-bit register (MSB first).
    pub async fn write_reg(&mut self, reg: u8, value: u16) -> Result<(), Error<I2C::Error>> {
        #[cfg(feature = "defmt")]
        defmt::trace!("write register {=u8:#x}: {=u16:#x}", reg, value);
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[reg, hi, lo])
            .await
            .map_err(Error::I2c)
    }

    /// Read a 16-bit register (MSB first).
    pub async fn read_reg(&mut self, reg: u8) -> Result<u16, Error<I2C::Error>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .await
            .map_err(Error::I2c)?;
        let value = u16::from_be_bytes(buf);
        #[cfg(feature = "defmt")]
        defmt::trace!("read register {=u8:#x}: {=u16:#x}", reg, value);
        Ok(value)
    }

    /// Update masked bits in a register (read-modify-write).
    pub async fn update_reg(&mut self, reg: u8, mask: u16, value: u16) -> Result<(), Error<I2C::Error>> {
        let cur = self.read_reg(reg).await?;
        let new = (cur & !mask) | (value & mask);
        self.write_reg(reg, new).await
    }

    /// Resolve the gain, compute the calibration and commit both registers.
    ///
    /// Session state changes only when both writes succeed.
    pub async fn configure(&mut self, settings: &Settings) -> Result<DeviceConfig, Error<I2C::Error>> {
        let (gain, calibration) = match settings.gain {
            GainSelection::Auto => calibration::select(self.shunt_ohms, settings.max_expected_amps)?,
            GainSelection::Fixed(gain) => {
                let amps = settings
                    .max_expected_amps
                    .unwrap_or_else(|| max_current_before_overflow(self.shunt_ohms, gain));
                (gain, calibration::compute(self.shunt_ohms, amps, gain)?)
            }
        };

        #[cfg(feature = "defmt")]
        defmt::info!(
            "bus range {=u8} V, gain set to {=f32} V",
            settings.voltage_range.full_scale_bus_volts(),
            gain.full_scale_volts()
        );

        let config = DeviceConfig {
            voltage_range: settings.voltage_range,
            gain,
            bus_adc: settings.bus_adc,
            shunt_adc: settings.shunt_adc,
            mode: OperatingMode::ShuntAndBusContinuous,
        };
        self.commit(config, calibration).await?;
        Ok(config)
    }

    /// Calibration register first, then configuration.
    async fn commit(
        &mut self,
        config: DeviceConfig,
        calibration: CalibrationState,
    ) -> Result<(), Error<I2C::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "current LSB {=f32} A/bit, power LSB {=f32} W/bit, calibration {=u16:#x}, max current {=f32} A",
            calibration.current_lsb,
            calibration.power_lsb,
            calibration.calibration,
            calibration.current_lsb * calibration::CURRENT_LSB_DIVISOR
        );

        self.write_reg(addr::CALIBRATION, calibration.calibration).await?;
        if let Err(e) = self.write_reg(addr::CONFIG, encode_config(&config)).await {
            // The device now holds a calibration the session never committed.
            self.invalidate();
            return Err(e);
        }
        self.config = config;
        self.calibration = Some(calibration);
        self.state = SessionState::Configured;
        Ok(())
    }

    /// Read and decode the configuration register.
    pub async fn read_config(&mut self) -> Result<DeviceConfig, Error<I2C::Error>> {
        let value = self.read_reg(addr::CONFIG).await?;
        decode_config(value).ok_or(Error::InvalidConfig)
    }

    /// Raw BUS_VOLTAGE register with its flags.
    pub async fn read_bus_voltage_raw(&mut self) -> Result<BusVoltageReading, Error<I2C::Error>> {
        let value = self.read_reg(addr::BUS_VOLTAGE).await?;
        Ok(BusVoltageReading::from_bits(value))
    }

    /// Read the bus voltage register and fail if the overflow flag is set.
    async fn checked_bus_voltage(&mut self) -> Result<BusVoltageReading, Error<I2C::Error>> {
        let bus = self.read_bus_voltage_raw().await?;
        if bus.overflow() {
            #[cfg(feature = "defmt")]
            defmt::warn!("current overflow detected");
            return Err(self.overflow_error());
        }
        Ok(bus)
    }

    /// Bus voltage in volts. Does not look at the overflow flag.
    pub async fn voltage(&mut self) -> Result<f32, Error<I2C::Error>> {
        self.ensure_measuring()?;
        Ok(self.read_bus_voltage_raw().await?.volts())
    }

    /// Shunt voltage in millivolts.
    pub async fn shunt_voltage(&mut self) -> Result<f32, Error<I2C::Error>> {
        self.ensure_measuring()?;
        self.checked_bus_voltage().await?;
        let raw = self.read_reg(addr::SHUNT_VOLTAGE).await? as i16;
        Ok(shunt_voltage_mv(raw))
    }

    /// Supply side voltage in volts (bus plus shunt).
    pub async fn supply_voltage(&mut self) -> Result<f32, Error<I2C::Error>> {
        self.ensure_measuring()?;
        let bus = self.checked_bus_voltage().await?;
        let raw = self.read_reg(addr::SHUNT_VOLTAGE).await? as i16;
        Ok(supply_voltage_v(bus.volts(), shunt_voltage_mv(raw)))
    }

    /// Current in milliamps.
    pub async fn current(&mut self) -> Result<f32, Error<I2C::Error>> {
        let calibration = self.active_calibration()?;
        self.checked_bus_voltage().await?;
        let raw = self.read_reg(addr::CURRENT).await? as i16;
        Ok(current_ma(raw, calibration.current_lsb))
    }

    /// Power in milliwatts.
    pub async fn power(&mut self) -> Result<f32, Error<I2C::Error>> {
        let calibration = self.active_calibration()?;
        self.checked_bus_voltage().await?;
        let raw = self.read_reg(addr::POWER).await?;
        Ok(power_mw(raw, calibration.power_lsb))
    }

    /// State of the overflow flag the measurement reads check.
    pub async fn current_overflow(&mut self) -> Result<bool, Error<I2C::Error>> {
        let calibration = self.active_calibration()?;
        if !overflow_detectable(self.config.gain, &calibration) {
            #[cfg(feature = "defmt")]
            defmt::warn!("overflow flag cannot fire with calibration {=u16:#x}", calibration.calibration);
            return Err(Error::OverflowUndetectable);
        }
        Ok(self.read_bus_voltage_raw().await?.overflow())
    }

    /// Step to the next larger gain and recalibrate for its full range.
    ///
    /// Returns the new gain, or `CurrentOverflow` with `device_limit_reached` at ±320 mV.
    pub async fn increase_gain(&mut self) -> Result<Gain, Error<I2C::Error>> {
        if self.state != SessionState::Configured {
            return Err(Error::NotConfigured);
        }
        let Some(gain) = self.config.gain.next() else {
            #[cfg(feature = "defmt")]
            defmt::warn!("device limit reached, gain cannot be increased");
            return Err(self.overflow_error());
        };
        let amps = max_current_before_overflow(self.shunt_ohms, gain);
        let calibration = calibration::compute(self.shunt_ohms, amps, gain)?;
        let config = DeviceConfig { gain, ..self.config };
        self.commit(config, calibration).await?;

        #[cfg(feature = "defmt")]
        defmt::info!("gain increased to {=f32} V", gain.full_scale_volts());
        Ok(gain)
    }

    /// Enter power-down. Registers keep the last conversion.
    pub async fn sleep(&mut self) -> Result<(), Error<I2C::Error>> {
        match self.state {
            SessionState::Unconfigured => Err(Error::NotConfigured),
            SessionState::PoweredDown => Ok(()),
            SessionState::Configured => {
                self.update_reg(addr::CONFIG, ConfigBits::MODE.bits(), OperatingMode::PowerDown.code())
                    .await?;
                self.state = SessionState::PoweredDown;
                Ok(())
            }
        }
    }

    /// Restore the committed operating mode. Allow `WAKE_UP_TIME_US` before reading.
    pub async fn wake(&mut self) -> Result<(), Error<I2C::Error>> {
        match self.state {
            SessionState::Unconfigured => Err(Error::NotConfigured),
            SessionState::Configured => Ok(()),
            SessionState::PoweredDown => {
                self.update_reg(addr::CONFIG, ConfigBits::MODE.bits(), self.config.mode.code())
                    .await?;
                self.state = SessionState::Configured;
                Ok(())
            }
        }
    }

    /// Reset all registers to power-on defaults and drop the calibration.
    pub async fn reset(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_reg(addr::CONFIG, ConfigBits::RST.bits()).await?;
        self.config = DeviceConfig::default();
        self.invalidate();
        Ok(())
    }
}
