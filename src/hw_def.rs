//! Device constants, command set, user register layout, conversion timings and the
//! raw-to-physical conversion formulas of the HTU21D.

#[cfg(feature = "defmt")]
use defmt::Format;

/// Fixed 7-bit I²C address of the HTU21D
pub const I2C_ADDR: u8 = 0x40;

/// Time the device needs after a soft reset before it accepts commands again
pub const RESET_TIME_MS: u32 = 15;

/// Resolution bits of the user register (bits 7 and 0)
pub const USER_REG_RESOLUTION_MASK: u8 = 0x81;
/// End-of-battery bit of the user register, set when VDD drops below 2.25 V
pub const USER_REG_END_OF_BATTERY_MASK: u8 = 0x40;
/// On-chip heater enable bit of the user register
pub const USER_REG_ENABLE_ONCHIP_HEATER_MASK: u8 = 0x04;
/// OTP reload disable bit of the user register
pub const USER_REG_DISABLE_OTP_RELOAD_MASK: u8 = 0x02;
/// Bits the driver is allowed to change with a register write
pub const USER_REG_WRITABLE_MASK: u8 =
    USER_REG_RESOLUTION_MASK | USER_REG_ENABLE_ONCHIP_HEATER_MASK | USER_REG_DISABLE_OTP_RELOAD_MASK;
/// Bits with no driver-controlled meaning; always written back as read
pub const USER_REG_RESERVED_MASK: u8 = !(USER_REG_RESOLUTION_MASK
    | USER_REG_END_OF_BATTERY_MASK
    | USER_REG_ENABLE_ONCHIP_HEATER_MASK
    | USER_REG_DISABLE_OTP_RELOAD_MASK);

const TEMPERATURE_COEFF_MUL: f32 = 175.72;
const TEMPERATURE_COEFF_ADD: f32 = -46.85;
const HUMIDITY_COEFF_MUL: f32 = 125.0;
const HUMIDITY_COEFF_ADD: f32 = -6.0;
const ADC_FULL_SCALE: f32 = 65536.0;

/// Temperature coefficient of the relative humidity reading, in %RH/°C
const TEMPERATURE_COEFFICIENT: f32 = -0.15;
// Magnus-type constants for the partial pressure of water vapour
const CONSTANT_A: f64 = 8.1332;
const CONSTANT_B: f64 = 1762.39;
const CONSTANT_C: f64 = 235.66;

/// Commands understood by the device, with their opcodes
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u16)]
pub enum Command {
    /// Soft reset
    Reset = 0xFE,
    /// Measure temperature, stretching the clock until done
    ReadTemperatureHold = 0xE3,
    /// Measure temperature, result fetched later by a plain read
    ReadTemperatureNoHold = 0xF3,
    /// Measure relative humidity, stretching the clock until done
    ReadHumidityHold = 0xE5,
    /// Measure relative humidity, result fetched later by a plain read
    ReadHumidityNoHold = 0xF5,
    /// Read the first 8 bytes of the serial number (with CRCs)
    ReadSerialFirst8Bytes = 0xFA0F,
    /// Read the last 6 bytes of the serial number (with CRCs)
    ReadSerialLast6Bytes = 0xFCC9,
    /// Write the user register
    WriteUserRegister = 0xE6,
    /// Read the user register
    ReadUserRegister = 0xE7,
}
impl Command {
    /// Opcode of the command; the serial number reads are the only 16-bit ones
    pub const fn opcode(self) -> u16 {
        self as u16
    }

    /// Opcode as big-endian bytes
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.opcode().to_be_bytes()
    }

    /// Bytes put on the wire for this command, high byte first.  8-bit opcodes occupy only the
    /// last byte of `buf`.
    pub fn encode(self, buf: &mut [u8; 2]) -> &[u8] {
        *buf = self.to_be_bytes();
        if self.opcode() > 0xFF { &buf[..] } else { &buf[1..] }
    }
}

/// Measurement resolution of temperature and relative humidity
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Resolution {
    /// 14-bit temperature, 12-bit relative humidity (power-on default)
    #[default]
    T14Rh12,
    /// 13-bit temperature, 10-bit relative humidity
    T13Rh10,
    /// 12-bit temperature, 8-bit relative humidity
    T12Rh8,
    /// 11-bit temperature, 11-bit relative humidity
    T11Rh11,
}
impl Resolution {
    /// Value of the resolution bits in the user register
    pub const fn register_bits(self) -> u8 {
        match self {
            Resolution::T14Rh12 => 0x00,
            Resolution::T13Rh10 => 0x80,
            Resolution::T12Rh8 => 0x01,
            Resolution::T11Rh11 => 0x81,
        }
    }

    /// Decode the resolution bits of a user register value; other bits are ignored
    pub const fn from_register(reg: u8) -> Self {
        match reg & USER_REG_RESOLUTION_MASK {
            0x00 => Resolution::T14Rh12,
            0x80 => Resolution::T13Rh10,
            0x01 => Resolution::T12Rh8,
            _ => Resolution::T11Rh11,
        }
    }

    /// Worst-case conversion times at this resolution.
    ///
    /// Humidity only takes longer than temperature at the 11/11-bit setting.
    pub const fn conversion_time(self) -> ConversionTime {
        match self {
            Resolution::T14Rh12 => ConversionTime { temperature_us: 50_000, humidity_us: 16_000 },
            Resolution::T13Rh10 => ConversionTime { temperature_us: 25_000, humidity_us: 5_000 },
            Resolution::T12Rh8 => ConversionTime { temperature_us: 13_000, humidity_us: 3_000 },
            Resolution::T11Rh11 => ConversionTime { temperature_us: 7_000, humidity_us: 8_000 },
        }
    }
}

/// Conversion times used to pace no-hold measurements
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConversionTime {
    /// temperature conversion time in microseconds
    pub temperature_us: u32,
    /// relative humidity conversion time in microseconds
    pub humidity_us: u32,
}
impl ConversionTime {
    /// Delay before reading a temperature result, truncated to whole milliseconds
    pub const fn temperature_delay_ms(&self) -> u32 {
        self.temperature_us / 1000
    }
    /// Delay before reading a humidity result, truncated to whole milliseconds
    pub const fn humidity_delay_ms(&self) -> u32 {
        self.humidity_us / 1000
    }
}
impl Default for ConversionTime {
    fn default() -> Self {
        Resolution::default().conversion_time()
    }
}

/// Convert a raw temperature word to degrees centigrade
pub fn raw_temp_to_centigrade(raw: u16) -> f32 {
    raw as f32 * TEMPERATURE_COEFF_MUL / ADC_FULL_SCALE + TEMPERATURE_COEFF_ADD
}

/// Convert a raw temperature word to degrees Fahrenheit
pub fn raw_temp_to_fahrenheit(raw: u16) -> f32 {
    raw_temp_to_centigrade(raw) * 9.0 / 5.0 + 32.0
}

/// Convert a raw relative humidity word to percent.  The result is not clamped, so values
/// slightly outside 0..=100 are possible.
pub fn raw_rel_humid_to_percent(raw: u16) -> f32 {
    raw as f32 * HUMIDITY_COEFF_MUL / ADC_FULL_SCALE + HUMIDITY_COEFF_ADD
}

/// Dew point in degrees centigrade from a temperature (°C) and relative humidity (%RH).
/// Evaluated in double precision.
pub fn dew_point(centigrade: f32, humidity_percent: f32) -> f32 {
    let partial_pressure = libm::pow(10.0, CONSTANT_A - CONSTANT_B / (centigrade as f64 + CONSTANT_C));
    let dew_point =
        -CONSTANT_B / (libm::log10(humidity_percent as f64 * partial_pressure / 100.0) - CONSTANT_A) - CONSTANT_C;
    dew_point as f32
}

/// Relative humidity (%RH) compensated for a temperature other than 25 °C
pub fn compensated_humidity(centigrade: f32, humidity_percent: f32) -> f32 {
    humidity_percent + (25.0 - centigrade) * TEMPERATURE_COEFFICIENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_match_datasheet() {
        assert_eq!(Command::Reset.opcode(), 0xFE);
        assert_eq!(Command::ReadTemperatureHold.opcode(), 0xE3);
        assert_eq!(Command::ReadTemperatureNoHold.opcode(), 0xF3);
        assert_eq!(Command::ReadHumidityHold.opcode(), 0xE5);
        assert_eq!(Command::ReadHumidityNoHold.opcode(), 0xF5);
        assert_eq!(Command::ReadSerialFirst8Bytes.opcode(), 0xFA0F);
        assert_eq!(Command::ReadSerialLast6Bytes.opcode(), 0xFCC9);
        assert_eq!(Command::WriteUserRegister.opcode(), 0xE6);
        assert_eq!(Command::ReadUserRegister.opcode(), 0xE7);
    }

    #[test]
    fn encoded_bytes_agree_with_opcode() {
        let all = [
            Command::Reset,
            Command::ReadTemperatureHold,
            Command::ReadTemperatureNoHold,
            Command::ReadHumidityHold,
            Command::ReadHumidityNoHold,
            Command::ReadSerialFirst8Bytes,
            Command::ReadSerialLast6Bytes,
            Command::WriteUserRegister,
            Command::ReadUserRegister,
        ];
        for cmd in all {
            let mut buf = [0u8; 2];
            let opcode = cmd
                .encode(&mut buf)
                .iter()
                .fold(0u16, |acc, byte| acc << 8 | *byte as u16);
            assert_eq!(opcode, cmd.opcode());
        }
    }

    #[test]
    fn encoded_length() {
        let mut buf = [0u8; 2];
        assert_eq!(Command::ReadUserRegister.encode(&mut buf), &[0xE7]);
        assert_eq!(Command::ReadSerialFirst8Bytes.encode(&mut buf), &[0xFA, 0x0F]);
        assert_eq!(Command::ReadSerialLast6Bytes.encode(&mut buf), &[0xFC, 0xC9]);
        assert_eq!(Command::WriteUserRegister.to_be_bytes(), [0x00, 0xE6]);
    }

    #[test]
    fn register_masks() {
        assert_eq!(USER_REG_WRITABLE_MASK, 0x87);
        assert_eq!(USER_REG_RESERVED_MASK, 0x38);
    }

    #[test]
    fn timing_table() {
        let expected = [
            (Resolution::T14Rh12, 50_000, 16_000),
            (Resolution::T13Rh10, 25_000, 5_000),
            (Resolution::T12Rh8, 13_000, 3_000),
            (Resolution::T11Rh11, 7_000, 8_000),
        ];
        for (res, temperature_us, humidity_us) in expected {
            assert_eq!(res.conversion_time(), ConversionTime { temperature_us, humidity_us });
        }
        assert_eq!(ConversionTime::default(), Resolution::T14Rh12.conversion_time());
    }

    #[test]
    fn delay_truncates() {
        let time = ConversionTime { temperature_us: 12_999, humidity_us: 999 };
        assert_eq!(time.temperature_delay_ms(), 12);
        assert_eq!(time.humidity_delay_ms(), 0);
    }

    #[test]
    fn resolution_bits_round_trip() {
        for res in [Resolution::T14Rh12, Resolution::T13Rh10, Resolution::T12Rh8, Resolution::T11Rh11] {
            assert_eq!(Resolution::from_register(res.register_bits() | 0x7E), res);
        }
    }

    #[test]
    fn conversion_at_zero() {
        assert_eq!(raw_temp_to_centigrade(0), -46.85);
        assert_eq!(raw_rel_humid_to_percent(0), -6.0);
    }

    #[test]
    fn conversion_at_full_scale() {
        // 65536 itself is not representable; the last code sits one LSB below the limit
        assert!((raw_temp_to_centigrade(u16::MAX) - 128.87).abs() < 0.01);
        assert!(raw_temp_to_centigrade(u16::MAX) < 128.87);
        assert!((raw_rel_humid_to_percent(u16::MAX) - 119.0).abs() < 0.01);
        assert!(raw_rel_humid_to_percent(u16::MAX) < 119.0);
    }

    #[test]
    fn conversion_is_monotonic() {
        let mut last_t = f32::MIN;
        let mut last_rh = f32::MIN;
        for raw in 0..=u16::MAX {
            let t = raw_temp_to_centigrade(raw);
            let rh = raw_rel_humid_to_percent(raw);
            assert!(t >= last_t, "temperature decreased at {raw}");
            assert!(rh >= last_rh, "humidity decreased at {raw}");
            last_t = t;
            last_rh = rh;
        }
    }

    #[test]
    fn datasheet_examples() {
        // 0x683A => 24.7 °C, 0x7C80 => 54.8 %RH
        assert!((raw_temp_to_centigrade(0x683A) - 24.7).abs() < 0.05);
        assert!((raw_rel_humid_to_percent(0x7C80) - 54.8).abs() < 0.05);
    }

    #[test]
    fn fahrenheit() {
        assert!((raw_temp_to_fahrenheit(0) - (-52.33)).abs() < 0.01);
    }

    #[test]
    fn dew_point_values() {
        // (°C, %RH, dew point °C)
        let expected = [
            (25.0, 50.0, 13.8894),
            (20.0, 100.0, 20.0),
            (0.0, 80.0, -3.0147),
            (60.0, 10.0, 17.5254),
            (-11.0, 39.0, -22.131),
            (-30.0, 50.0, -36.9793),
            (-40.0, 1.0, -75.5506),
            (125.0, 100.0, 125.0),
        ];
        for (centigrade, humidity_percent, dew) in expected {
            let computed = dew_point(centigrade, humidity_percent);
            assert!((computed - dew).abs() <= 0.01, "dew_point({centigrade}, {humidity_percent}) = {computed}, expected {dew}");
        }
        assert!(dew_point(20.0, 30.0) < dew_point(20.0, 60.0));
    }

    #[test]
    fn compensation() {
        assert_eq!(compensated_humidity(25.0, 40.0), 40.0);
        assert!((compensated_humidity(35.0, 40.0) - 41.5).abs() < 1e-4);
        assert!((compensated_humidity(15.0, 40.0) - 38.5).abs() < 1e-4);
    }
}
