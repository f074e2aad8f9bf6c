//! Dedicated bus thread for the blocking driver.
//!
//! The thread opens the bus, owns it, and runs one request at a time in arrival order. Callers
//! wait for the reply with a timeout. A request that times out while on the bus is still finished
//! and its reply dropped; one that times out while still queued is skipped.

use crate::blocking::Sht2x;
use crate::fmt::{debug, trace, warn};
use crate::hw_def::*;
use crate::types::*;
use crate::Error;

use std::thread::JoinHandle;
use std::time::Duration;

use embedded_hal::{delay::DelayNs, i2c::I2c};

/// `DelayNs` backed by `std::thread::sleep`
#[derive(Clone, Copy, Debug, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }
}

type Reply<T, E> = flume::Sender<Result<T, Error<E>>>;

enum Job<E> {
    Measure(Quantity, Mode, Reply<Measurement, E>),
    ReadUserRegister(Reply<UserRegister, E>),
    SetResolution(Resolution, Reply<(), E>),
    SetHeater(bool, Reply<(), E>),
    SoftReset(Reply<(), E>),
}

/// Answer `reply` with `op` run on the sensor. A job whose caller stopped waiting is dropped
/// before it reaches the bus.
fn serve<T, S, E>(reply: Reply<T, E>, sensor: Option<S>, op: impl FnOnce(S) -> Result<T, Error<E>>) {
    if reply.is_disconnected() {
        debug!("sht2x worker: caller timed out, job skipped");
        return;
    }
    // A send error means the caller timed out while the job was running.
    let _ = reply.send(sensor.ok_or(Error::DeviceUnavailable).and_then(op));
}

impl<E> Job<E> {
    fn run<I2C, Delay>(self, sensor: Option<&mut Sht2x<I2C, Delay>>)
    where
        I2C: I2c<Error = E>,
        Delay: DelayNs,
    {
        match self {
            Job::Measure(quantity, mode, reply) => serve(reply, sensor, |s| s.measure(quantity, mode)),
            Job::ReadUserRegister(reply) => serve(reply, sensor, |s| s.read_user_register()),
            Job::SetResolution(resolution, reply) => serve(reply, sensor, |s| s.set_resolution(resolution)),
            Job::SetHeater(enabled, reply) => serve(reply, sensor, |s| s.set_heater(enabled)),
            Job::SoftReset(reply) => serve(reply, sensor, |s| s.soft_reset()),
        }
    }
}

/// Handle to a sensor driven by its own thread.
///
/// Dropping the handle stops the thread once the request in flight (if any) is done; the bus is
/// closed when the thread drops it.
pub struct Worker<E> {
    jobs: Option<flume::Sender<Job<E>>>,
    thread: Option<JoinHandle<()>>,
    timeout: Duration,
}

impl<E: Send + 'static> Worker<E> {
    /// Start the bus thread. `open` runs on that thread; if it fails, the error is logged and
    /// every request answers [`Error::DeviceUnavailable`].
    pub fn spawn<I2C, Delay, F, OpenError>(open: F, delay: Delay, config: Config) -> Self
    where
        I2C: I2c<Error = E> + 'static,
        Delay: DelayNs + Send + 'static,
        F: FnOnce() -> Result<I2C, OpenError> + Send + 'static,
        OpenError: core::fmt::Debug + 'static,
    {
        let (jobs, job_rx) = flume::unbounded::<Job<E>>();
        let thread = std::thread::spawn(move || {
            let mut sensor = match open() {
                Ok(i2c) => {
                    debug!("sht2x worker: bus open, address {}", I2C_ADDRESS);
                    Some(Sht2x::with_config(i2c, delay, config))
                }
                Err(e) => {
                    let reason = format!("{e:?}");
                    warn!("sht2x worker: failed to open bus, sensor unavailable: {}", reason.as_str());
                    None
                }
            };
            while let Ok(job) = job_rx.recv() {
                job.run(sensor.as_mut());
            }
            trace!("sht2x worker: all handles dropped, closing bus");
        });
        Self {
            jobs: Some(jobs),
            thread: Some(thread),
            timeout: Duration::from_millis(config.timeout_ms as u64),
        }
    }

    fn request<T>(&self, job: impl FnOnce(Reply<T, E>) -> Job<E>) -> Result<T, Error<E>> {
        let jobs = self.jobs.as_ref().ok_or(Error::DeviceUnavailable)?;
        let (reply, reply_rx) = flume::bounded(1);
        jobs.send(job(reply)).map_err(|_| Error::DeviceUnavailable)?;
        match reply_rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(flume::RecvTimeoutError::Timeout) => {
                warn!("sht2x worker: no reply within {} ms", self.timeout.as_millis() as u64);
                Err(Error::Timeout)
            }
            Err(flume::RecvTimeoutError::Disconnected) => Err(Error::DeviceUnavailable),
        }
    }

    /// Trigger a temperature measurement, hold master
    pub fn read_temperature_hold(&self) -> Result<Measurement, Error<E>> {
        self.request(|reply| Job::Measure(Quantity::Temperature, Mode::Hold, reply))
    }

    /// Trigger a temperature measurement, no hold master
    pub fn read_temperature_no_hold(&self) -> Result<Measurement, Error<E>> {
        self.request(|reply| Job::Measure(Quantity::Temperature, Mode::NoHold, reply))
    }

    /// Trigger a relative humidity measurement, hold master
    pub fn read_humidity_hold(&self) -> Result<Measurement, Error<E>> {
        self.request(|reply| Job::Measure(Quantity::RelHumidity, Mode::Hold, reply))
    }

    /// Trigger a relative humidity measurement, no hold master
    pub fn read_humidity_no_hold(&self) -> Result<Measurement, Error<E>> {
        self.request(|reply| Job::Measure(Quantity::RelHumidity, Mode::NoHold, reply))
    }

    /// Read the user register from the device
    pub fn read_user_register(&self) -> Result<UserRegister, Error<E>> {
        self.request(Job::ReadUserRegister)
    }

    /// Set the measurement resolution
    pub fn set_resolution(&self, resolution: Resolution) -> Result<(), Error<E>> {
        self.request(|reply| Job::SetResolution(resolution, reply))
    }

    /// Condensation heater
    pub fn set_heater(&self, enabled: bool) -> Result<(), Error<E>> {
        self.request(|reply| Job::SetHeater(enabled, reply))
    }

    /// Reboot the sensor without switching the power off and on again
    pub fn soft_reset(&self) -> Result<(), Error<E>> {
        self.request(Job::SoftReset)
    }

    /// Stop the thread and wait for it to close the bus. Blocks while a request is in flight.
    pub fn close(mut self) -> std::thread::Result<()> {
        self.jobs.take();
        match self.thread.take() {
            Some(thread) => thread.join(),
            None => Ok(()),
        }
    }
}

impl<E> Drop for Worker<E> {
    fn drop(&mut self) {
        // The thread exits once the channel is disconnected. Not joined: a stalled bus would hang
        // the caller.
        self.jobs.take();
    }
}
