//! This is a platform-agnostic Rust driver for the HTU21D(F) digital relative humidity and
//! temperature sensor using the [`embedded-hal`] traits.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal/tree/master/embedded-hal
//!
//! This driver allows you to:
//! - Measure temperature and relative humidity in hold (clock stretching) or poll (no hold) mode.
//! - Set the measurement resolution.
//! - Enable/disable the on-chip heater and read its state.
//! - Enable/disable the OTP reload.
//! - Read the end-of-battery status.
//! - Trigger a software reset.
//! - Read the device serial number.
//! - Compute the dew point and the temperature-compensated relative humidity.
//!
//! Every data word from the device is checked against its CRC-8 before it is returned.
//!
//! ## Features
//!
//! - `defmt`: Enables logging using the `defmt` framework.
//! - `log`: Enables logging using the `log` framework.
//!
//! ## The device
//!
//! The HTU21D(F) is a digital humidity sensor with temperature output.  It sits at the fixed I²C
//! address 0x40 and converts on request, with a resolution selectable from 8 to 12 bits for
//! relative humidity and 11 to 14 bits for temperature.  A conversion can be read back either by
//! letting the sensor stretch the clock until it is done (hold master) or by releasing the bus
//! and reading after the conversion time has elapsed (no hold master).
//!
//! Datasheet: [HTU21D(F)](https://www.te.com/commerce/DocumentDelivery/DDEController?Action=showdoc&DocId=Data+Sheet%7FHPC199_6%7FA6%7Fpdf%7FEnglish%7FENG_DS_HPC199_6_A6.pdf)
//!
//! To use this driver, import this crate and an `embedded_hal` implementation, then instantiate
//! the device.
//!
//! ## Example:
//!
//! ```ignore
//! use htu21d::{AcquisitionMode, Htu21d, Resolution};
//!
//! // Platform-specific
//! let i2c = /* embedded_hal::i2c::I2c instance */;
//! let delay = /* embedded_hal::delay::DelayNs instance */;
//!
//! let mut htu21d = Htu21d::new(i2c, delay);
//! htu21d.reset().unwrap();
//! htu21d.set_resolution(Resolution::T12Rh8).unwrap();
//! println!("serial number: {}", htu21d.read_serial_number().unwrap());
//!
//! loop {
//!     let measurement = htu21d.read_temperature_and_relative_humidity().unwrap();
//!     println!("{:0.1} %RH, {:0.1} °C, dew point {:0.1} °C",
//!         measurement.compensated_humidity(),
//!         measurement.centigrade,
//!         measurement.dew_point());
//!
//!     // Platform-specific: sleep a while
//!     sleep_secs(60);
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![no_std]

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("Features \"defmt\" and \"log\" are mutually exclusive and cannot be enabled together");

pub mod checksum;
mod device_impl;
mod hw_def;
mod types;

pub use crate::{checksum::CrcMismatch, hw_def::*, types::*};
