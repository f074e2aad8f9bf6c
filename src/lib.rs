//! This is a platform-agnostic Rust driver for the SHT20, SHT21 and SHT25 humidity and
//! temperature sensors (and the pin-compatible HTU21D) using the [`embedded-hal`] or
//! [`embedded-hal-async`] traits.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal/tree/master/embedded-hal
//! [`embedded-hal-async`]: https://github.com/rust-embedded/embedded-hal/tree/master/embedded-hal-async
//!
//! This driver allows you to:
//! - Measure temperature and relative humidity in hold-master and no-hold-master mode.
//! - Validate every response: frame length, echoed quantity bit and CRC-8.
//! - Bound every async measurement by a timeout.
//! - Read the user register and set resolution and heater.
//! - Trigger a software reset.
//! - Share one sensor between tasks ([`SharedSht2x`]) or threads ([`Worker`]) with requests
//!   executed one at a time, in arrival order.
//!
//! ## Features
//!
//! - `async`: Enables the async API ([`Sht2x`], [`SharedSht2x`]).
//! - `blocking`: Enables the blocking API ([`blocking::Sht2x`]).
//! - `std`: Enables [`Worker`], a dedicated bus thread for the blocking API.
//! - `defmt`: Enables logging using the `defmt` framework.
//! - `log`: Enables logging using the `log` framework.
//!
//! ## Supported devices: SHT20, SHT21, SHT25, HTU21D
//!
//! All of them answer on the fixed address 0x40. A measurement is triggered by a one-byte
//! command and answered with `[MSB, LSB + status, CRC]`. In hold-master mode the device
//! stretches the clock until the conversion is done; in no-hold-master mode it releases the bus
//! and the driver waits a fixed interval before reading.
//!
//! Datasheet:
//!   [SHT21](https://sensirion.com/media/documents/120BBE4C/63500094/Sensirion_Datasheet_Humidity_Sensor_SHT21.pdf)
//!
//! ## Async Example:
//!
//! ```ignore
//! use sht2x::Sht2x;
//!
//! // Platform-specific
//! let i2c = /* embedded_hal_async::i2c::I2c instance */;
//! let delay = /* embedded_hal_async::delay::DelayNs + Clone instance */;
//!
//! let mut sht2x = Sht2x::new(i2c, delay);
//!
//! let t = sht2x.read_temperature_hold().await.unwrap();
//! let rh = sht2x.read_humidity_no_hold().await.unwrap();
//! println!("{:0.1} °C, {:0.1} %RH", t.value(), rh.value());
//! ```
//!
//! ## Worker Example:
//!
//! ```ignore
//! use sht2x::{Config, Worker, StdDelay};
//!
//! let sensor = Worker::spawn(|| linux_embedded_hal::I2cdev::new("/dev/i2c-1"), StdDelay, Config::default());
//!
//! match sensor.read_humidity_hold() {
//!     Ok(rh) => println!("{:0.1} %RH", rh.value()),
//!     Err(sht2x::Error::Timeout) => println!("sensor did not answer in time"),
//!     Err(e) => println!("rejected: {e}"),
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(not(any(feature = "async", feature = "blocking")))]
compile_error!("At least one of \"async\" and \"blocking\" features must be enabled");

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("Features \"defmt\" and \"log\" are mutually exclusive and cannot be enabled together");

mod fmt;
pub mod frame;
mod hw_def;
mod types;

#[cfg(feature = "async")]
mod device_impl;
#[cfg(feature = "async")]
mod shared;
#[cfg(feature = "blocking")]
pub mod blocking;
#[cfg(feature = "std")]
mod worker;

#[cfg(test)]
mod test_support;

pub use crate::{hw_def::*, types::*};

#[cfg(feature = "async")]
pub use crate::shared::SharedSht2x;
#[cfg(feature = "std")]
pub use crate::worker::{StdDelay, Worker};

use core::fmt as core_fmt;

#[cfg(feature = "defmt")]
use defmt::Format;

/// SHT2x device driver (async)
#[cfg(feature = "async")]
#[derive(Debug)]
pub struct Sht2x<I2C, Delay> {
    pub(crate) i2c: I2C,
    pub(crate) delay: Delay,
    pub(crate) register: UserRegister,
    pub(crate) config: Config,
}

/// All possible errors in this crate
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Debug, Eq, PartialEq)]
pub enum Error<E> {
    /// I²C communication error
    I2c(E),
    /// The bus could not be opened, or the worker owning it is gone
    DeviceUnavailable,
    /// The request did not complete within the configured timeout
    Timeout,
    /// The device answered, but the response was rejected
    Rejected(Rejection),
}

/// Why a measurement response was rejected
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rejection {
    /// No bytes at all
    EmptyFrame,
    /// Byte count other than [`FRAME_LEN`]
    WrongFrameSize(usize),
    /// The echoed quantity bit does not match the issued command
    EchoMismatch,
    /// The CRC byte does not match the data bytes
    ChecksumMismatch,
}

impl<E> From<Rejection> for Error<E> {
    fn from(rejection: Rejection) -> Self {
        Error::Rejected(rejection)
    }
}

impl core_fmt::Display for Rejection {
    fn fmt(&self, f: &mut core_fmt::Formatter<'_>) -> core_fmt::Result {
        match self {
            Rejection::EmptyFrame => write!(f, "empty response"),
            Rejection::WrongFrameSize(len) => write!(f, "response has {len} bytes, expected {FRAME_LEN}"),
            Rejection::EchoMismatch => write!(f, "response is for a different quantity than requested"),
            Rejection::ChecksumMismatch => write!(f, "crc mismatch"),
        }
    }
}

impl<E: core_fmt::Debug> core_fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core_fmt::Formatter<'_>) -> core_fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {e:?}"),
            Error::DeviceUnavailable => write!(f, "device unavailable"),
            Error::Timeout => write!(f, "timed out"),
            Error::Rejected(rejection) => write!(f, "response rejected: {rejection}"),
        }
    }
}

impl<E: core_fmt::Debug> core::error::Error for Error<E> {}
