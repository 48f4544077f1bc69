use crate::checksum;
use crate::hw_def::*;
use crate::types::*;

use embedded_hal::{
    delay::DelayNs,
    i2c::{ErrorKind, I2c},
};

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        use defmt::{debug, trace, warn};
    } else if #[cfg(feature = "log")] {
        use log::{debug, trace, warn};
    } else {
        macro_rules! debug {
            ($($arg:tt)*) => {};
        }
        macro_rules! trace {
            ($($arg:tt)*) => {};
        }
        macro_rules! warn {
            ($($arg:tt)*) => {};
        }
    }
}

impl<I2C, Delay, E> Htu21d<I2C, Delay>
where
    I2C: I2c<Error = E>,
    E: embedded_hal::i2c::Error,
    Delay: DelayNs,
{
    /// Create a new HTU21D driver instance in poll mode at the highest resolution
    pub fn new(i2c: I2C, delay: Delay) -> Self {
        Self { i2c, delay, session: Session::default() }
    }

    /// Destroy the driver and return the bus and delay
    pub fn release(self) -> (I2C, Delay) {
        (self.i2c, self.delay)
    }

    /// Current mode and conversion timing
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current acquisition mode
    pub fn mode(&self) -> AcquisitionMode {
        self.session.mode
    }

    /// Select hold (clock stretching) or poll (fixed delay) acquisition.  Hold mode reads can
    /// block indefinitely if the device never releases the clock; use poll mode when the wait
    /// must be bounded.
    pub fn set_mode(&mut self, mode: AcquisitionMode) {
        debug!("htu21d::set_mode(): {:?}", mode);
        self.session.mode = mode;
    }

    fn map_err(err: E) -> Error<E> {
        match err.kind() {
            ErrorKind::NoAcknowledge(_) => Error::NoAcknowledge,
            _ => Error::Transfer(err),
        }
    }

    fn write_command(&mut self, cmd: Command) -> Result<(), Error<E>> {
        trace!("htu21d::write_command(): {}", cmd.opcode());
        let mut cmd_bytes = [0u8; 2];
        self.i2c.write(I2C_ADDR, cmd.encode(&mut cmd_bytes)).map_err(Self::map_err)
    }

    /// Send `cmd` without releasing the bus, then read the response with a repeated start
    fn write_command_no_stop_and_read(&mut self, cmd: Command, read_buf: &mut [u8]) -> Result<(), Error<E>> {
        trace!("htu21d::write_command_no_stop_and_read(): {}, {} bytes", cmd.opcode(), read_buf.len());
        let mut cmd_bytes = [0u8; 2];
        self.i2c.write_read(I2C_ADDR, cmd.encode(&mut cmd_bytes), read_buf).map_err(Self::map_err)
    }

    fn read(&mut self, read_buf: &mut [u8]) -> Result<(), Error<E>> {
        self.i2c.read(I2C_ADDR, read_buf).map_err(Self::map_err)
    }

    /// Check whether the device acknowledges its address
    pub fn is_connected(&mut self) -> bool {
        self.i2c.write(I2C_ADDR, &[]).is_ok()
    }

    /// Software reset.  Restores the default conversion timing; the acquisition mode is kept.
    pub fn reset(&mut self) -> Result<(), Error<E>> {
        self.write_command(Command::Reset)?;
        self.session.conversion_time = Resolution::default().conversion_time();
        self.delay.delay_ms(RESET_TIME_MS);
        Ok(())
    }

    /// Read the user register
    pub fn read_user_register(&mut self) -> Result<UserRegister, Error<E>> {
        self.write_command(Command::ReadUserRegister)?;
        let mut read_buf = [0u8; 1];
        self.read(&mut read_buf)?;
        trace!("htu21d::read_user_register(): {}", read_buf[0]);
        Ok(UserRegister(read_buf[0]))
    }

    /// Write the resolution, heater and OTP reload bits of `bits` to the user register.  The
    /// register is read first so the reserved and end-of-battery bits are written back as they
    /// were.
    pub fn write_user_register(&mut self, bits: u8) -> Result<(), Error<E>> {
        let reg = self.read_user_register()?.merge(bits);
        trace!("htu21d::write_user_register(): {}", reg.raw());
        let cmd_bytes = [Command::WriteUserRegister.to_be_bytes()[1], reg.raw()];
        self.i2c.write(I2C_ADDR, &cmd_bytes).map_err(Self::map_err)
    }

    /// Set the measurement resolution and the conversion times used in poll mode.  The write is
    /// not read back.
    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<(), Error<E>> {
        let reg = self.read_user_register()?.raw();
        let reg = (reg & !USER_REG_RESOLUTION_MASK) | resolution.register_bits();

        self.session.conversion_time = resolution.conversion_time();
        debug!("htu21d::set_resolution(): {:?}", resolution);

        self.write_user_register(reg)
    }

    /// Supply voltage state
    pub fn battery_status(&mut self) -> Result<BatteryStatus, Error<E>> {
        Ok(self.read_user_register()?.battery_status())
    }

    /// Enable the on-chip heater
    pub fn enable_heater(&mut self) -> Result<(), Error<E>> {
        let reg = self.read_user_register()?.raw();
        self.write_user_register(reg | USER_REG_ENABLE_ONCHIP_HEATER_MASK)
    }

    /// Disable the on-chip heater
    pub fn disable_heater(&mut self) -> Result<(), Error<E>> {
        let reg = self.read_user_register()?.raw();
        self.write_user_register(reg & !USER_REG_ENABLE_ONCHIP_HEATER_MASK)
    }

    /// On-chip heater state
    pub fn heater_status(&mut self) -> Result<HeaterStatus, Error<E>> {
        Ok(self.read_user_register()?.heater_status())
    }

    /// Enable or disable reloading of the default settings from OTP before each measurement
    pub fn set_otp_reload(&mut self, enabled: bool) -> Result<(), Error<E>> {
        let reg = self.read_user_register()?.raw();
        let reg = if enabled {
            reg & !USER_REG_DISABLE_OTP_RELOAD_MASK
        } else {
            reg | USER_REG_DISABLE_OTP_RELOAD_MASK
        };
        self.write_user_register(reg)
    }

    /// One conversion: trigger it, wait for it the way the session's mode dictates, then read
    /// and validate the result word.
    fn conversion_and_read_adc(&mut self, quantity: Quantity) -> Result<u16, Error<E>> {
        let cmd = quantity.command(self.session.mode);
        let mut read_buf = [0u8; 3];

        match self.session.mode {
            AcquisitionMode::Hold => {
                self.write_command_no_stop_and_read(cmd, &mut read_buf)?;
            }
            AcquisitionMode::Poll => {
                self.write_command(cmd)?;
                self.delay.delay_ms(quantity.delay_ms(&self.session.conversion_time));
                self.read(&mut read_buf)?;
            }
        }

        let sample = RawSample::from_bytes(read_buf);
        sample.validate().map_err(|mismatch| {
            warn!(
                "htu21d::conversion_and_read_adc(): crc mismatch: read_buf={:?}, crc_expect={}",
                read_buf, mismatch.expected
            );
            Error::from(mismatch)
        })
    }

    /// Measure temperature and return the validated raw word
    pub fn read_raw_temperature(&mut self) -> Result<u16, Error<E>> {
        self.conversion_and_read_adc(Quantity::Temperature)
    }

    /// Measure relative humidity and return the validated raw word
    pub fn read_raw_humidity(&mut self) -> Result<u16, Error<E>> {
        self.conversion_and_read_adc(Quantity::Humidity)
    }

    /// Measure temperature in degrees centigrade
    pub fn read_temperature(&mut self) -> Result<f32, Error<E>> {
        Ok(raw_temp_to_centigrade(self.read_raw_temperature()?))
    }

    /// Measure relative humidity in percent
    pub fn read_humidity(&mut self) -> Result<f32, Error<E>> {
        Ok(raw_rel_humid_to_percent(self.read_raw_humidity()?))
    }

    /// Measure temperature, then relative humidity
    pub fn read_temperature_and_relative_humidity(&mut self) -> Result<Measurement, Error<E>> {
        let raw = RawMeasurement {
            temperature: self.read_raw_temperature()?,
            humidity: self.read_raw_humidity()?,
        };
        Ok(Measurement::from(&raw))
    }

    /// Read the 64-bit serial number
    pub fn read_serial_number(&mut self) -> Result<SerialNumber, Error<E>> {
        // SNB_3, CRC, SNB_2, CRC, SNB_1, CRC, SNB_0, CRC
        let mut first = [0u8; 8];
        self.write_command_no_stop_and_read(Command::ReadSerialFirst8Bytes, &mut first)?;
        for pair in first.chunks_exact(2) {
            checksum::check(pair[0] as u16, pair[1]).inspect_err(|_| {
                warn!("htu21d::read_serial_number(): crc mismatch in first bytes: {:?}", first);
            })?;
        }

        // SNC_1, SNC_0, CRC, SNA_1, SNA_0, CRC
        let mut last = [0u8; 6];
        self.write_command_no_stop_and_read(Command::ReadSerialLast6Bytes, &mut last)?;
        for triple in last.chunks_exact(3) {
            checksum::check(u16::from_be_bytes([triple[0], triple[1]]), triple[2]).inspect_err(|_| {
                warn!("htu21d::read_serial_number(): crc mismatch in last bytes: {:?}", last);
            })?;
        }

        Ok(SerialNumber(u64::from_be_bytes([
            first[0], first[2], first[4], first[6], last[0], last[1], last[3], last[4],
        ])))
    }
}
