use crate::fmt::{debug, trace, warn};
use crate::frame;
use crate::hw_def::*;
use crate::types::*;
use crate::{Error, Sht2x};

use embassy_futures::select::{Either, select};
use embedded_hal_async::{delay::DelayNs, i2c::I2c};

impl<I2C, Delay, E> Sht2x<I2C, Delay>
where
    I2C: I2c<Error = E>,
    Delay: DelayNs + Clone,
{
    /// Create a new SHT2x driver instance with the default timing
    pub fn new(i2c: I2C, delay: Delay) -> Self {
        Self::with_config(i2c, delay, Config::default())
    }

    /// Create a new SHT2x driver instance
    pub fn with_config(i2c: I2C, delay: Delay, config: Config) -> Self {
        Self { i2c, delay, register: UserRegister::default(), config }
    }

    /// Give back the bus and the delay
    pub fn release(self) -> (I2C, Delay) {
        (self.i2c, self.delay)
    }

    /// Last known user register content
    pub fn user_register(&self) -> UserRegister {
        self.register
    }

    /// Trigger a temperature measurement, hold master
    pub async fn read_temperature_hold(&mut self) -> Result<Measurement, Error<E>> {
        self.measure(Quantity::Temperature, Mode::Hold).await
    }

    /// Trigger a temperature measurement, no hold master
    pub async fn read_temperature_no_hold(&mut self) -> Result<Measurement, Error<E>> {
        self.measure(Quantity::Temperature, Mode::NoHold).await
    }

    /// Trigger a relative humidity measurement, hold master
    pub async fn read_humidity_hold(&mut self) -> Result<Measurement, Error<E>> {
        self.measure(Quantity::RelHumidity, Mode::Hold).await
    }

    /// Trigger a relative humidity measurement, no hold master
    pub async fn read_humidity_no_hold(&mut self) -> Result<Measurement, Error<E>> {
        self.measure(Quantity::RelHumidity, Mode::NoHold).await
    }

    /// Run one trigger command to completion, or give up after `config.timeout_ms`.
    ///
    /// On timeout the exchange future is dropped between bus calls; the device may still finish
    /// the conversion on its own.
    pub(crate) async fn measure(&mut self, quantity: Quantity, mode: Mode) -> Result<Measurement, Error<E>> {
        let command = Command::measurement(quantity, mode);
        let mut timer = self.delay.clone();
        let timeout_ms = self.config.timeout_ms;
        match select(self.exchange(command, quantity, mode), timer.delay_ms(timeout_ms)).await {
            Either::First(result) => result,
            Either::Second(()) => {
                warn!("sht2x::measure(): {:?} timed out after {} ms", command, timeout_ms);
                Err(Error::Timeout)
            }
        }
    }

    async fn exchange(&mut self, command: Command, quantity: Quantity, mode: Mode) -> Result<Measurement, Error<E>> {
        self.i2c.write(I2C_ADDRESS, &[command.code()]).await.map_err(Error::I2c)?;
        if mode == Mode::NoHold {
            self.delay.delay_ms(self.config.conversion_wait_ms).await;
        }
        let mut read_buf = [0u8; FRAME_LEN];
        self.i2c.read(I2C_ADDRESS, &mut read_buf).await.map_err(Error::I2c)?;
        trace!("sht2x::exchange(): {:?} -> {:?}", command, read_buf);
        Ok(frame::accept(&read_buf, quantity)?)
    }

    /// Read the user register from the device and keep a copy
    pub async fn read_user_register(&mut self) -> Result<UserRegister, Error<E>> {
        let mut read_buf = [0u8; 1];
        self.i2c
            .write_read(I2C_ADDRESS, &[Command::ReadUserRegister.code()], &mut read_buf)
            .await
            .map_err(Error::I2c)?;
        self.register = UserRegister::from(read_buf[0]);
        debug!("sht2x::read_user_register(): {:?}", self.register);
        Ok(self.register)
    }

    async fn write_user_register(&mut self, register: UserRegister) -> Result<(), Error<E>> {
        let word = user_register_write_word(register.raw());
        self.i2c.write(I2C_ADDRESS, &word.to_be_bytes()).await.map_err(Error::I2c)?;
        self.register = register;
        Ok(())
    }

    /// Set the measurement resolution
    pub async fn set_resolution(&mut self, resolution: Resolution) -> Result<(), Error<E>> {
        let mut register = self.register;
        register.set_resolution(resolution);
        self.write_user_register(register).await
    }

    /// Use RH12/T14 (`true`) or RH8/T12 (`false`)
    pub async fn set_sensor_resolution(&mut self, high: bool) -> Result<(), Error<E>> {
        self.set_resolution(if high { Resolution::HIGH } else { Resolution::LOW }).await
    }

    /// Condensation heater
    pub async fn set_heater(&mut self, enabled: bool) -> Result<(), Error<E>> {
        let mut register = self.register;
        register.set_heater(enabled);
        self.write_user_register(register).await
    }

    /// Reboot the sensor without switching the power off and on again
    pub async fn soft_reset(&mut self) -> Result<(), Error<E>> {
        self.i2c.write(I2C_ADDRESS, &[Command::SoftReset.code()]).await.map_err(Error::I2c)?;
        self.delay.delay_ms(SOFT_RESET_DELAY_MS).await;
        self.register = UserRegister::default();
        Ok(())
    }
}
