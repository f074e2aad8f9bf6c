//! One sensor, many tasks.

use crate::types::*;
use crate::{Error, Sht2x};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::{delay::DelayNs, i2c::I2c};

/// Async driver behind a mutex, so several tasks can share it.
///
/// Each call holds the lock for its whole request, timeout included, so the write/read pairs of
/// different callers never interleave on the bus.
pub struct SharedSht2x<M: RawMutex, I2C, Delay> {
    inner: Mutex<M, Sht2x<I2C, Delay>>,
}

impl<M, I2C, Delay, E> SharedSht2x<M, I2C, Delay>
where
    M: RawMutex,
    I2C: I2c<Error = E>,
    Delay: DelayNs + Clone,
{
    /// Wrap a driver
    pub fn new(sht2x: Sht2x<I2C, Delay>) -> Self {
        Self { inner: Mutex::new(sht2x) }
    }

    /// Unwrap the driver
    pub fn into_inner(self) -> Sht2x<I2C, Delay> {
        self.inner.into_inner()
    }

    /// See [`Sht2x::read_temperature_hold`]
    pub async fn read_temperature_hold(&self) -> Result<Measurement, Error<E>> {
        self.inner.lock().await.read_temperature_hold().await
    }

    /// See [`Sht2x::read_temperature_no_hold`]
    pub async fn read_temperature_no_hold(&self) -> Result<Measurement, Error<E>> {
        self.inner.lock().await.read_temperature_no_hold().await
    }

    /// See [`Sht2x::read_humidity_hold`]
    pub async fn read_humidity_hold(&self) -> Result<Measurement, Error<E>> {
        self.inner.lock().await.read_humidity_hold().await
    }

    /// See [`Sht2x::read_humidity_no_hold`]
    pub async fn read_humidity_no_hold(&self) -> Result<Measurement, Error<E>> {
        self.inner.lock().await.read_humidity_no_hold().await
    }

    /// See [`Sht2x::read_user_register`]
    pub async fn read_user_register(&self) -> Result<UserRegister, Error<E>> {
        self.inner.lock().await.read_user_register().await
    }

    /// See [`Sht2x::set_resolution`]
    pub async fn set_resolution(&self, resolution: Resolution) -> Result<(), Error<E>> {
        self.inner.lock().await.set_resolution(resolution).await
    }

    /// See [`Sht2x::set_heater`]
    pub async fn set_heater(&self, enabled: bool) -> Result<(), Error<E>> {
        self.inner.lock().await.set_heater(enabled).await
    }

    /// See [`Sht2x::soft_reset`]
    pub async fn soft_reset(&self) -> Result<(), Error<E>> {
        self.inner.lock().await.soft_reset().await
    }
}
