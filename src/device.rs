//! Scd4x device definitions
//!
//! Copyright 2019 Ryan Kurte

use core::time::Duration;

/// Scd4x I2C address (7-bit)
pub const DEFAULT_ADDRESS: u8 = 0x62;

pub const CRC_POLY: u8 = 0x31;
pub const CRC_INIT: u8 = 0xff;
pub const CRC_XOR: u8 = 0x00;

/// Response words are two data bytes followed by a CRC-8 byte
pub const WORD_LEN: usize = 3;

/// Largest response in the command set (read measurement)
pub const MAX_RESPONSE_LEN: usize = 3 * WORD_LEN;

/// Scd4x I2C Command
/// Commands are big endian 16-bit unsigned integers, responses are sequences of
/// (MSB, LSB, CRC) words
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum Command {
    /// Start periodic measurement mode, a fresh sample is produced roughly every 5s
    StartPeriodicMeasurement = 0x21b1,

    /// Stop periodic measurement mode
    /// This is required before most configuration commands
    StopPeriodicMeasurement = 0x3f86,

    /// Read a measurement from the buffer
    /// Responds with three words: CO2, temperature, humidity
    ReadMeasurement = 0xec05,

    /// Fetch data ready status
    /// The 11 least significant bits are non-zero when a measurement is available
    GetDataReadyStatus = 0xe4b8,

    /// Fetch the configured temperature offset
    GetTemperatureOffset = 0x2318,

    /// Fetch the configured sensor altitude in meters above sea level
    GetSensorAltitude = 0x2322,

    /// Fetch the configured ambient pressure in hPa
    GetAmbientPressure = 0xe000,

    /// Reload user settings from EEPROM
    Reinit = 0x3646,
}

impl Command {
    /// 16-bit opcode sent on the wire
    pub const fn opcode(self) -> u16 {
        self as u16
    }

    /// Number of response bytes expected, always a multiple of [`WORD_LEN`]
    pub const fn response_len(self) -> usize {
        match self {
            Command::ReadMeasurement => 3 * WORD_LEN,
            Command::GetDataReadyStatus
            | Command::GetTemperatureOffset
            | Command::GetSensorAltitude
            | Command::GetAmbientPressure => WORD_LEN,
            Command::StartPeriodicMeasurement
            | Command::StopPeriodicMeasurement
            | Command::Reinit => 0,
        }
    }

    /// Time the device needs after this command before accepting another
    pub const fn delay(self) -> Duration {
        match self {
            // First sample arrives ~5s later, callers poll data ready
            Command::StartPeriodicMeasurement => Duration::from_millis(0),
            Command::StopPeriodicMeasurement => Duration::from_millis(500),
            Command::ReadMeasurement => Duration::from_millis(0),
            Command::GetDataReadyStatus
            | Command::GetTemperatureOffset
            | Command::GetSensorAltitude
            | Command::GetAmbientPressure => Duration::from_millis(1),
            Command::Reinit => Duration::from_millis(30),
        }
    }

    /// Human description, used in error messages
    pub const fn description(self) -> &'static str {
        match self {
            Command::StartPeriodicMeasurement => "start periodic measurements",
            Command::StopPeriodicMeasurement => "stop periodic measurements",
            Command::ReadMeasurement => "read sensor metrics",
            Command::GetDataReadyStatus => "get data ready status",
            Command::GetTemperatureOffset => "get temperature offset",
            Command::GetSensorAltitude => "get sensor altitude",
            Command::GetAmbientPressure => "get ambient pressure",
            Command::Reinit => "reinitialize",
        }
    }
}
