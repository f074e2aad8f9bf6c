//! Blocking driver on top of the `embedded-hal` 1.0 traits.
//!
//! Nothing here can cut a stalled bus call short: a hold-mode read lasts as long as the device
//! stretches the clock. Use [`crate::Worker`] (feature `std`) to put a timeout on each request.

use crate::fmt::{debug, trace};
use crate::frame;
use crate::hw_def::*;
use crate::types::*;
use crate::Error;

use embedded_hal::{delay::DelayNs, i2c::I2c};

/// SHT2x device driver (blocking)
#[derive(Debug)]
pub struct Sht2x<I2C, Delay> {
    i2c: I2C,
    delay: Delay,
    register: UserRegister,
    config: Config,
}

impl<I2C, Delay, E> Sht2x<I2C, Delay>
where
    I2C: I2c<Error = E>,
    Delay: DelayNs,
{
    /// Create a new SHT2x driver instance with the default timing
    pub fn new(i2c: I2C, delay: Delay) -> Self {
        Self::with_config(i2c, delay, Config::default())
    }

    /// Create a new SHT2x driver instance. `config.timeout_ms` is not used here.
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
    pub fn read_temperature_hold(&mut self) -> Result<Measurement, Error<E>> {
        self.measure(Quantity::Temperature, Mode::Hold)
    }

    /// Trigger a temperature measurement, no hold master
    pub fn read_temperature_no_hold(&mut self) -> Result<Measurement, Error<E>> {
        self.measure(Quantity::Temperature, Mode::NoHold)
    }

    /// Trigger a relative humidity measurement, hold master
    pub fn read_humidity_hold(&mut self) -> Result<Measurement, Error<E>> {
        self.measure(Quantity::RelHumidity, Mode::Hold)
    }

    /// Trigger a relative humidity measurement, no hold master
    pub fn read_humidity_no_hold(&mut self) -> Result<Measurement, Error<E>> {
        self.measure(Quantity::RelHumidity, Mode::NoHold)
    }

    pub(crate) fn measure(&mut self, quantity: Quantity, mode: Mode) -> Result<Measurement, Error<E>> {
        let command = Command::measurement(quantity, mode);
        self.i2c.write(I2C_ADDRESS, &[command.code()]).map_err(Error::I2c)?;
        if mode == Mode::NoHold {
            self.delay.delay_ms(self.config.conversion_wait_ms);
        }
        let mut read_buf = [0u8; FRAME_LEN];
        self.i2c.read(I2C_ADDRESS, &mut read_buf).map_err(Error::I2c)?;
        trace!("sht2x::blocking::measure(): {:?} -> {:?}", command, read_buf);
        Ok(frame::accept(&read_buf, quantity)?)
    }

    /// Read the user register from the device and keep a copy
    pub fn read_user_register(&mut self) -> Result<UserRegister, Error<E>> {
        let mut read_buf = [0u8; 1];
        self.i2c
            .write_read(I2C_ADDRESS, &[Command::ReadUserRegister.code()], &mut read_buf)
            .map_err(Error::I2c)?;
        self.register = UserRegister::from(read_buf[0]);
        debug!("sht2x::blocking::read_user_register(): {:?}", self.register);
        Ok(self.register)
    }

    fn write_user_register(&mut self, register: UserRegister) -> Result<(), Error<E>> {
        let word = user_register_write_word(register.raw());
        self.i2c.write(I2C_ADDRESS, &word.to_be_bytes()).map_err(Error::I2c)?;
        self.register = register;
        Ok(())
    }

    /// Set the measurement resolution
    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<(), Error<E>> {
        let mut register = self.register;
        register.set_resolution(resolution);
        self.write_user_register(register)
    }

    /// Use RH12/T14 (`true`) or RH8/T12 (`false`)
    pub fn set_sensor_resolution(&mut self, high: bool) -> Result<(), Error<E>> {
        self.set_resolution(if high { Resolution::HIGH } else { Resolution::LOW })
    }

    /// Condensation heater
    pub fn set_heater(&mut self, enabled: bool) -> Result<(), Error<E>> {
        let mut register = self.register;
        register.set_heater(enabled);
        self.write_user_register(register)
    }

    /// Reboot the sensor without switching the power off and on again
    pub fn soft_reset(&mut self) -> Result<(), Error<E>> {
        self.i2c.write(I2C_ADDRESS, &[Command::SoftReset.code()]).map_err(Error::I2c)?;
        self.delay.delay_ms(SOFT_RESET_DELAY_MS);
        self.register = UserRegister::default();
        Ok(())
    }
}
