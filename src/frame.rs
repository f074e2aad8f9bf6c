//! Validation of the 3-byte measurement response.

use crate::fmt::warn;
use crate::hw_def::*;
use crate::types::{Measurement, Quantity};
use crate::Rejection;

use crc::Crc;

const CRC: Crc<u8> = Crc::<u8>::new(&CRC_8_SHT2X);

/// CRC-8 over `data` as computed by the device
pub fn crc8(data: &[u8]) -> u8 {
    CRC.checksum(data)
}

/// A response must be exactly [`FRAME_LEN`] bytes
pub fn check_completeness(frame: &[u8]) -> Result<&[u8; FRAME_LEN], Rejection> {
    if frame.is_empty() {
        warn!("sht2x: response is empty");
        return Err(Rejection::EmptyFrame);
    }
    frame.try_into().map_err(|_| {
        warn!("sht2x: response has {} bytes, expected {}", frame.len(), FRAME_LEN);
        Rejection::WrongFrameSize(frame.len())
    })
}

/// The echo bit must match the measured quantity and the CRC must match the data bytes
pub fn check_correctness(frame: &[u8; FRAME_LEN], quantity: Quantity) -> Result<(), Rejection> {
    let echoed = frame[1] & ECHO_BIT != 0;
    if echoed != quantity.echo_bit_set() {
        warn!("sht2x: echo bit does not match {:?}: frame={:?}", quantity, frame);
        return Err(Rejection::EchoMismatch);
    }
    let crc_expect = crc8(&frame[..2]);
    if frame[2] != crc_expect {
        warn!("sht2x: crc mismatch: frame={:?}, crc_expect={}", frame, crc_expect);
        return Err(Rejection::ChecksumMismatch);
    }
    Ok(())
}

/// Drop the status bits from the LSB
pub fn adjust(frame: &[u8; FRAME_LEN]) -> [u8; 2] {
    [frame[0], frame[1] & STATUS_MASK]
}

/// Run every check on a response to a `quantity` measurement and return the adjusted reading
pub fn accept(frame: &[u8], quantity: Quantity) -> Result<Measurement, Rejection> {
    let frame = check_completeness(frame)?;
    check_correctness(frame, quantity)?;
    Ok(Measurement { quantity, bytes: adjust(frame) })
}
