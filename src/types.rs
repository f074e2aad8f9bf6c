use crate::hw_def::*;

use core::fmt;

#[cfg(feature = "defmt")]
use defmt::Format;

/// Physical quantity measured by the device
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Quantity {
    /// temperature
    Temperature,
    /// relative humidity
    RelHumidity,
}

impl Quantity {
    /// State of [`ECHO_BIT`] in a valid response: set for humidity, clear for temperature
    pub const fn echo_bit_set(self) -> bool {
        match self {
            Quantity::Temperature => false,
            Quantity::RelHumidity => true,
        }
    }
}

/// How the driver waits for a conversion to finish
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    /// The device holds SCL low until the conversion is done; the read blocks on the bus.
    Hold,
    /// The device releases the bus; the driver waits a fixed interval before reading.
    NoHold,
}

/// Measurement resolution, packed into bits 7 and 0 of the user register
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// 12-bit RH, 14-bit T (power-on default)
    Rh12T14,
    /// 8-bit RH, 12-bit T
    Rh8T12,
    /// 10-bit RH, 13-bit T
    Rh10T13,
    /// 11-bit RH, 11-bit T
    Rh11T11,
}

impl Resolution {
    /// Highest resolution the device offers
    pub const HIGH: Resolution = Resolution::Rh12T14;
    /// Lowest resolution the device offers
    pub const LOW: Resolution = Resolution::Rh8T12;

    /// Decode the resolution field of a user register value
    pub const fn from_register(register: u8) -> Self {
        let msb = register & USER_REGISTER_RESOLUTION_MSB != 0;
        let lsb = register & USER_REGISTER_RESOLUTION_LSB != 0;
        match (msb, lsb) {
            (false, false) => Resolution::Rh12T14,
            (false, true) => Resolution::Rh8T12,
            (true, false) => Resolution::Rh10T13,
            (true, true) => Resolution::Rh11T11,
        }
    }

    /// Encode as user register bits (only bits 7 and 0 may be set)
    pub const fn register_bits(self) -> u8 {
        match self {
            Resolution::Rh12T14 => 0,
            Resolution::Rh8T12 => USER_REGISTER_RESOLUTION_LSB,
            Resolution::Rh10T13 => USER_REGISTER_RESOLUTION_MSB,
            Resolution::Rh11T11 => USER_REGISTER_RESOLUTION_MSB | USER_REGISTER_RESOLUTION_LSB,
        }
    }
}

/// Copy of the device's user (configuration) register
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UserRegister(u8);

impl Default for UserRegister {
    fn default() -> Self {
        Self(DEFAULT_USER_REGISTER)
    }
}

impl From<u8> for UserRegister {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl UserRegister {
    /// Get the raw register byte
    pub fn raw(&self) -> u8 {
        self.0
    }

    /// On-chip heater is enabled
    pub fn heater_enabled(&self) -> bool {
        self.0 & USER_REGISTER_HEATER != 0
    }

    /// End-of-battery flag: the supply dropped below 2.25 V
    pub fn vdd_below_2v25(&self) -> bool {
        self.0 & USER_REGISTER_END_OF_BATTERY != 0
    }

    /// The supply is above 2.25 V
    pub fn vdd_over_2v25(&self) -> bool {
        !self.vdd_below_2v25()
    }

    /// Current resolution setting
    pub fn resolution(&self) -> Resolution {
        Resolution::from_register(self.0)
    }

    /// Resolution field reads RH12/T14
    pub fn high_resolution(&self) -> bool {
        self.resolution() == Resolution::HIGH
    }

    /// Resolution field reads RH8/T12
    pub fn low_resolution(&self) -> bool {
        self.resolution() == Resolution::LOW
    }

    /// Replace the resolution field, leaving every other bit alone
    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.0 = (self.0 & !USER_REGISTER_RESOLUTION_MASK) | resolution.register_bits();
    }

    /// Select RH12/T14
    pub fn set_resolution_high(&mut self) {
        self.set_resolution(Resolution::HIGH);
    }

    /// Select RH8/T12
    pub fn set_resolution_low(&mut self) {
        self.set_resolution(Resolution::LOW);
    }

    /// Enable or disable the on-chip heater
    pub fn set_heater(&mut self, enabled: bool) {
        if enabled {
            self.0 |= USER_REGISTER_HEATER;
        } else {
            self.0 &= !USER_REGISTER_HEATER;
        }
    }
}

impl fmt::Display for UserRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserRegister {{ 0x{:02x}; {:?} ", self.0, self.resolution())?;
        if self.heater_enabled() {
            write!(f, "heater_enabled ")?;
        }
        if self.vdd_below_2v25() {
            write!(f, "end_of_battery ")?;
        }
        write!(f, "}}")
    }
}

/// Timing knobs of the measurement engine
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// Wait between trigger and read in no-hold mode (ms)
    pub conversion_wait_ms: u32,
    /// Bound on a whole measurement request (ms)
    pub timeout_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            conversion_wait_ms: NO_HOLD_CONVERSION_WAIT_MS,
            timeout_ms: MEASUREMENT_TIMEOUT_MS,
        }
    }
}

/// Validated reading with the status bits cleared: `[MSB, LSB & 0b1111_1100]`
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Measurement {
    /// quantity echoed by the device
    pub quantity: Quantity,
    /// adjusted data bytes, big-endian
    pub bytes: [u8; 2],
}

impl Measurement {
    /// Raw 16-bit value fed to the conversion formulas
    pub fn raw(&self) -> u16 {
        u16::from_be_bytes(self.bytes)
    }

    /// Value in °C for a temperature, %RH for a humidity
    pub fn value(&self) -> f32 {
        match self.quantity {
            Quantity::Temperature => raw_temp_to_centigrade(self.raw()),
            Quantity::RelHumidity => raw_rel_humid_to_percent(self.raw()),
        }
    }

    /// Get temperature in Centigrade, `None` for a humidity reading
    pub fn centigrade(&self) -> Option<f32> {
        match self.quantity {
            Quantity::Temperature => Some(raw_temp_to_centigrade(self.raw())),
            Quantity::RelHumidity => None,
        }
    }

    /// Get relative humidity in percent, `None` for a temperature reading
    pub fn humidity_percent(&self) -> Option<f32> {
        match self.quantity {
            Quantity::Temperature => None,
            Quantity::RelHumidity => Some(raw_rel_humid_to_percent(self.raw())),
        }
    }
}

/// RH = -6 + 125 * S / 2^16. Not clamped to 0..100.
pub fn raw_rel_humid_to_percent(raw: u16) -> f32 {
    raw as f32 * 125.0 / 65536.0 - 6.0
}

/// T = -46.85 + 175.72 * S / 2^16
pub fn raw_temp_to_centigrade(raw: u16) -> f32 {
    raw as f32 * 175.72 / 65536.0 - 46.85
}

/// Convert adjusted data bytes to %RH; `None` unless exactly two bytes are given
pub fn convert_to_humidity(bytes: &[u8]) -> Option<f32> {
    let bytes: [u8; 2] = bytes.try_into().ok()?;
    Some(raw_rel_humid_to_percent(u16::from_be_bytes(bytes)))
}

/// Convert adjusted data bytes to °C; `None` unless exactly two bytes are given
pub fn convert_to_temperature(bytes: &[u8]) -> Option<f32> {
    let bytes: [u8; 2] = bytes.try_into().ok()?;
    Some(raw_temp_to_centigrade(u16::from_be_bytes(bytes)))
}
