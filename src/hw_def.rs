//! Register map, opcodes and timing constants from the SHT2x datasheet.

use crate::types::{Mode, Quantity};

#[cfg(feature = "defmt")]
use defmt::Format;

/// Fixed 7-bit I²C address of every SHT2x device
pub const I2C_ADDRESS: u8 = 0x40;

/// Number of bytes in a measurement response: MSB, LSB + status, CRC
pub const FRAME_LEN: usize = 3;

/// Bit 1 of the LSB tells which quantity was measured: set for humidity, clear for temperature
pub const ECHO_BIT: u8 = 0b0000_0010;

/// Clears the two status bits carried in the LSB of a measurement
pub const STATUS_MASK: u8 = 0b1111_1100;

/// User register value after power-on or soft reset
pub const DEFAULT_USER_REGISTER: u8 = 0x02;

/// User register: resolution MSB
pub const USER_REGISTER_RESOLUTION_MSB: u8 = 1 << 7;
/// User register: end of battery, set when VDD < 2.25 V
pub const USER_REGISTER_END_OF_BATTERY: u8 = 1 << 6;
/// User register: on-chip heater enabled
pub const USER_REGISTER_HEATER: u8 = 1 << 2;
/// User register: disable OTP reload
pub const USER_REGISTER_DISABLE_OTP_RELOAD: u8 = 1 << 1;
/// User register: resolution LSB
pub const USER_REGISTER_RESOLUTION_LSB: u8 = 1 << 0;
/// Both bits of the split resolution field
pub const USER_REGISTER_RESOLUTION_MASK: u8 = USER_REGISTER_RESOLUTION_MSB | USER_REGISTER_RESOLUTION_LSB;

/// Time the device needs to reboot after a soft reset (ms)
pub const SOFT_RESET_DELAY_MS: u32 = 15;

/// Wait between trigger and read in no-hold mode (ms). Covers the slowest conversion (T14, 85 ms).
pub const NO_HOLD_CONVERSION_WAIT_MS: u32 = 100;

/// Upper bound on one whole measurement request (ms)
pub const MEASUREMENT_TIMEOUT_MS: u32 = 2000;

/// CRC-8 used by the SHT2x: x^8 + x^5 + x^4 + 1, initial value 0, no reflection, no final XOR
pub const CRC_8_SHT2X: crc::Algorithm<u8> = crc::Algorithm {
    width: 8,
    poly: 0x31,
    init: 0x00,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0xa2,
    residue: 0x00,
};

/// Device commands
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Command {
    /// Trigger temperature measurement, hold master
    TriggerTempHold = 0xE3,
    /// Trigger relative humidity measurement, hold master
    TriggerRelHumidHold = 0xE5,
    /// Trigger temperature measurement, no hold master
    TriggerTempNoHold = 0xF3,
    /// Trigger relative humidity measurement, no hold master
    TriggerRelHumidNoHold = 0xF5,
    /// Write user register
    WriteUserRegister = 0xE6,
    /// Read user register
    ReadUserRegister = 0xE7,
    /// Soft reset
    SoftReset = 0xFE,
}

impl Command {
    /// The opcode sent on the bus
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The trigger command for a quantity and timing mode
    pub const fn measurement(quantity: Quantity, mode: Mode) -> Self {
        match (quantity, mode) {
            (Quantity::Temperature, Mode::Hold) => Command::TriggerTempHold,
            (Quantity::Temperature, Mode::NoHold) => Command::TriggerTempNoHold,
            (Quantity::RelHumidity, Mode::Hold) => Command::TriggerRelHumidHold,
            (Quantity::RelHumidity, Mode::NoHold) => Command::TriggerRelHumidNoHold,
        }
    }
}

/// 16-bit register-write word: command in the high byte, register value in the low byte
pub const fn user_register_write_word(register: u8) -> u16 {
    (Command::WriteUserRegister.code() as u16) << 8 | register as u16
}
