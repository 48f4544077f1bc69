use crate::checksum::{self, CrcMismatch};
use crate::hw_def::*;

use core::fmt;

#[cfg(feature="defmt")]
use defmt::Format;

/// HTU21D device driver
#[derive(Debug)]
pub struct Htu21d<I2C, Delay> {
    pub(crate) i2c: I2C,
    pub(crate) delay: Delay,
    pub(crate) session: Session,
}

/// All possible errors in this crate
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Debug)]
pub enum Error<E> {
    /// The device did not acknowledge its address
    NoAcknowledge,
    /// Any other I²C transfer failure
    Transfer(E),
    /// Failure of a checksum from the device was detected
    CrcMismatch,
}
impl<E> From<CrcMismatch> for Error<E> {
    fn from(_: CrcMismatch) -> Self {
        Error::CrcMismatch
    }
}

/// How the host waits for a measurement to complete
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AcquisitionMode {
    /// The device stretches the clock until the result is ready.  The read blocks for as long
    /// as the device holds the bus; there is no timeout.
    Hold,
    /// The host releases the bus and waits for the conversion time before reading
    #[default]
    Poll,
}

/// Per-device state consulted by every measurement
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Session {
    pub(crate) mode: AcquisitionMode,
    pub(crate) conversion_time: ConversionTime,
}
impl Session {
    /// Current acquisition mode
    pub fn mode(&self) -> AcquisitionMode {
        self.mode
    }
    /// Conversion times matching the last resolution that was set
    pub fn conversion_time(&self) -> ConversionTime {
        self.conversion_time
    }
}

/// Quantity measured by one acquisition cycle
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Quantity {
    Temperature,
    Humidity,
}
impl Quantity {
    pub(crate) fn command(self, mode: AcquisitionMode) -> Command {
        match (self, mode) {
            (Quantity::Temperature, AcquisitionMode::Hold) => Command::ReadTemperatureHold,
            (Quantity::Temperature, AcquisitionMode::Poll) => Command::ReadTemperatureNoHold,
            (Quantity::Humidity, AcquisitionMode::Hold) => Command::ReadHumidityHold,
            (Quantity::Humidity, AcquisitionMode::Poll) => Command::ReadHumidityNoHold,
        }
    }

    pub(crate) fn delay_ms(self, time: &ConversionTime) -> u32 {
        match self {
            Quantity::Temperature => time.temperature_delay_ms(),
            Quantity::Humidity => time.humidity_delay_ms(),
        }
    }
}

/// A 16-bit word and the checksum the device sent with it
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RawSample {
    /// data word, status bits included
    pub value: u16,
    /// CRC-8 of `value`
    pub checksum: u8,
}
impl RawSample {
    /// Split a 3-byte measurement response into its big-endian word and checksum
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Self {
            value: u16::from_be_bytes([bytes[0], bytes[1]]),
            checksum: bytes[2],
        }
    }

    /// Return the word if its checksum is correct
    pub fn validate(self) -> Result<u16, CrcMismatch> {
        checksum::check(self.value, self.checksum)?;
        Ok(self.value)
    }
}

/// Raw (still in u16 format) temperature and relative humidity from the device
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RawMeasurement {
    /// unprocessed temperature
    pub temperature: u16,
    /// unprocessed relative humidity
    pub humidity: u16,
}
impl RawMeasurement {
    /// Get temperature in Fahrenheit
    pub fn fahrenheit(&self) -> f32 {
        raw_temp_to_fahrenheit(self.temperature)
    }
    /// Get temperature in Centigrade
    pub fn centigrade(&self) -> f32 {
        raw_temp_to_centigrade(self.temperature)
    }
    /// Get relative humidity in percent
    pub fn humidity_percent(&self) -> f32 {
        raw_rel_humid_to_percent(self.humidity)
    }
}

/// Temperature and relative humidity after conversion
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    /// degrees centigrade
    pub centigrade: f32,
    /// degrees fahrenheit
    pub fahrenheit: f32,
    /// relative humidity in percent
    pub humidity_percent: f32,
}
impl From<&RawMeasurement> for Measurement {
    fn from(raw: &RawMeasurement) -> Self {
        Self {
            centigrade: raw.centigrade(),
            fahrenheit: raw.fahrenheit(),
            humidity_percent: raw.humidity_percent(),
        }
    }
}
impl Measurement {
    /// Dew point in degrees centigrade
    pub fn dew_point(&self) -> f32 {
        dew_point(self.centigrade, self.humidity_percent)
    }
    /// Relative humidity in percent, compensated for the deviation from 25 °C
    pub fn compensated_humidity(&self) -> f32 {
        compensated_humidity(self.centigrade, self.humidity_percent)
    }
}

/// Supply voltage state reported by the end-of-battery bit
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BatteryStatus {
    /// VDD above 2.25 V
    Ok,
    /// VDD below 2.25 V
    Low,
}

/// State of the on-chip heater
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HeaterStatus {
    /// heater disabled
    Off,
    /// heater enabled
    On,
}

/// Contents of the user register
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UserRegister(pub u8);
impl UserRegister {
    /// Get the raw register value
    pub fn raw(&self) -> u8 {
        self.0
    }
    /// Measurement resolution
    pub fn resolution(&self) -> Resolution {
        Resolution::from_register(self.0)
    }
    /// End-of-battery state
    pub fn battery_status(&self) -> BatteryStatus {
        if self.0 & USER_REG_END_OF_BATTERY_MASK != 0 {
            BatteryStatus::Low
        } else {
            BatteryStatus::Ok
        }
    }
    /// On-chip heater state
    pub fn heater_status(&self) -> HeaterStatus {
        if self.0 & USER_REG_ENABLE_ONCHIP_HEATER_MASK != 0 {
            HeaterStatus::On
        } else {
            HeaterStatus::Off
        }
    }
    /// Whether reloading of the default settings from OTP before each measurement is disabled
    pub fn otp_reload_disabled(&self) -> bool {
        self.0 & USER_REG_DISABLE_OTP_RELOAD_MASK != 0
    }
    /// Reserved bits, kept as read
    pub fn reserved(&self) -> u8 {
        self.0 & USER_REG_RESERVED_MASK
    }

    /// Value to write back when `bits` is requested: only the resolution, heater and OTP bits
    /// are taken from `bits`, everything else keeps its current value.
    pub fn merge(&self, bits: u8) -> Self {
        Self((self.0 & !USER_REG_WRITABLE_MASK) | (bits & USER_REG_WRITABLE_MASK))
    }
}
impl fmt::Display for UserRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserRegister {{ 0x{:02x}; {:?} ", self.0, self.resolution())?;
        if self.battery_status() == BatteryStatus::Low {
            write!(f, "end_of_battery ")?;
        }
        if self.heater_status() == HeaterStatus::On {
            write!(f, "heater_enabled ")?;
        }
        if self.otp_reload_disabled() {
            write!(f, "otp_reload_disabled ")?;
        }
        write!(f, "}}")
    }
}

/// Serial number of the device
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SerialNumber(pub u64);
impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_sample_is_big_endian() {
        let sample = RawSample::from_bytes([0x68, 0x3A, 0x7C]);
        assert_eq!(sample, RawSample { value: 0x683A, checksum: 0x7C });
        assert_eq!(sample.validate(), Ok(0x683A));
    }

    #[test]
    fn raw_sample_keeps_status_bits() {
        // the two low status bits take part in the checksum and are returned as-is
        let value = 0x4E87;
        let sample = RawSample::from_bytes([0x4E, 0x87, checksum::compute(value)]);
        assert_eq!(sample.validate(), Ok(value));
    }

    #[test]
    fn raw_sample_bad_checksum() {
        let sample = RawSample::from_bytes([0x68, 0x3A, 0x7D]);
        assert!(sample.validate().is_err());
    }

    #[test]
    fn user_register_fields() {
        let reg = UserRegister(0x47);
        assert_eq!(reg.resolution(), Resolution::T12Rh8);
        assert_eq!(reg.battery_status(), BatteryStatus::Low);
        assert_eq!(reg.heater_status(), HeaterStatus::On);
        assert!(reg.otp_reload_disabled());
        assert_eq!(reg.reserved(), 0x00);

        let reg = UserRegister(0x3A);
        assert_eq!(reg.resolution(), Resolution::T14Rh12);
        assert_eq!(reg.battery_status(), BatteryStatus::Ok);
        assert_eq!(reg.heater_status(), HeaterStatus::Off);
        assert_eq!(reg.reserved(), 0x38);
    }

    #[test]
    fn merge_preserves_reserved_and_battery_bits() {
        for current in 0..=u8::MAX {
            for bits in 0..=u8::MAX {
                let merged = UserRegister(current).merge(bits).raw();
                assert_eq!(merged & USER_REG_WRITABLE_MASK, bits & USER_REG_WRITABLE_MASK);
                assert_eq!(merged & USER_REG_RESERVED_MASK, current & USER_REG_RESERVED_MASK);
                assert_eq!(merged & USER_REG_END_OF_BATTERY_MASK, current & USER_REG_END_OF_BATTERY_MASK);
            }
        }
    }

    #[test]
    fn measurement_from_raw() {
        let m = Measurement::from(&RawMeasurement { temperature: 0, humidity: 0 });
        assert_eq!(m.centigrade, -46.85);
        assert_eq!(m.humidity_percent, -6.0);
        assert!((m.fahrenheit - (-52.33)).abs() < 0.01);
    }

    #[test]
    fn derived_quantities() {
        let m = Measurement { centigrade: 25.0, fahrenheit: 77.0, humidity_percent: 50.0 };
        assert_eq!(m.compensated_humidity(), 50.0);
        assert!((m.dew_point() - 13.8894).abs() <= 0.01);
    }
}
