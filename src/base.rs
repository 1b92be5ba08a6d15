//! Base communication implementation for interacting with Scd4x device
//!
//! Copyright 2019 Ryan Kurte

use core::fmt::Debug;

use embedded_hal::blocking::i2c;

use crate::device::*;

/// Base API for exchanging bytes with the device
/// This should not be required by consumers, but is exposed to support alternate transports
pub trait Base<Err> {
    /// Write `data` to the device then, if `read` is not empty, read the response
    /// using a repeated start.
    /// Bus errors are returned unchanged.
    fn tx(&mut self, data: &[u8], read: &mut [u8]) -> Result<(), Err>;
}

/// Helper for device CRC-8 calculation
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC_INIT;

    // For each byte
    for v in data {
        // XOR with current byte
        crc ^= v;

        // For each bit, MSB first
        for _bit in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ CRC_POLY;
            } else {
                crc = crc << 1;
            }
        }
    }

    // Apply final xor
    crc ^ CRC_XOR
}

/// Base implementation for I2C devices
impl <Conn, Err> Base<Err> for Conn where
    Conn: i2c::Write<Error=Err> + i2c::WriteRead<Error=Err>,
    Err: Debug,
{
    fn tx(&mut self, data: &[u8], read: &mut [u8]) -> Result<(), Err> {
        trace!("Writing: {:x?}", data);

        if read.is_empty() {
            return self.write(DEFAULT_ADDRESS, data);
        }

        // Combined write / read, the datasheet requires no stop between phases
        self.write_read(DEFAULT_ADDRESS, data, read)?;

        trace!("Read: {:x?}", read);

        Ok(())
    }
}
