//! Scd4x CO2 / temperature / humidity sensor driver
//!
//! Copyright 2019 Ryan Kurte

use core::fmt::{self, Debug};
use core::marker::PhantomData;
use std::sync::{Mutex, MutexGuard};

extern crate embedded_hal;
use embedded_hal::blocking::i2c;

#[macro_use]
extern crate log;

pub mod device;
use device::*;

pub mod base;
use base::*;

/// Scd4x sensor object
/// This is generic over an I2C connector and associated error type.
///
/// The connector is held behind a lock so at most one command is in flight on the
/// device, operations take `&self` and the sensor may be shared between threads.
pub struct Scd4x<Conn, Err> {
    conn: Mutex<Conn>,
    fahrenheit: bool,
    _err: PhantomData<Err>,
}

/// Scd4x error object
#[derive(Debug)]
pub enum Error<ConnErr> {
    /// Bus transaction failed while issuing the named command
    Conn(&'static str, ConnErr),
    /// Response word failed CRC check for the named command (computed, received)
    Crc(&'static str, u8, u8),
}

impl <ConnErr: Debug> fmt::Display for Error<ConnErr> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Conn(desc, e) => write!(f, "error while {}: {:?}", desc, e),
            Error::Crc(desc, computed, received) => write!(f, "error while {}: CRC mismatch (computed 0x{:02x}, received 0x{:02x})", desc, computed, received),
        }
    }
}

impl <ConnErr: Debug> std::error::Error for Error<ConnErr> {}

/// Scd4x measurement object
#[derive(PartialEq, Clone, Debug)]
pub struct Measurement {
    /// CO2 concentration in parts-per-million (PPM)
    /// Range: 0 - 40,000
    pub co2: u16,
    /// Temperature in degrees celsius (or fahrenheit if configured)
    /// Range: -10 - 60 C
    pub temp: f32,
    /// Relative Humidity (%)
    /// Range: 0 - 100
    pub rh: f32,
}

/// Convert a raw temperature word to degrees celsius
pub fn convert_temperature(raw: u16) -> f32 {
    -45.0 + 175.0 * (raw as f32) / 65536.0
}

/// Convert a raw humidity word to relative humidity (%)
pub fn convert_humidity(raw: u16) -> f32 {
    100.0 * (raw as f32) / 65536.0
}

pub fn celsius_to_fahrenheit(degrees: f32) -> f32 {
    1.8 * degrees + 32.0
}

/// Mask for the data ready bits, the upper 5 bits are reserved
const DATA_READY_MASK: u16 = 0x07ff;

impl <Conn, Err> Scd4x <Conn, Err> where
    Conn: i2c::Write<Error=Err> + i2c::WriteRead<Error=Err>,
    Err: Debug,
{
    /// Create a new Scd4x sensor instance
    /// This performs no I/O, use [`Scd4x::init`] to place the device in a known state
    pub fn new(conn: Conn, fahrenheit: bool) -> Self {
        Scd4x{ conn: Mutex::new(conn), fahrenheit, _err: PhantomData }
    }

    /// Whether temperatures are reported in fahrenheit
    pub fn fahrenheit(&self) -> bool {
        self.fahrenheit
    }

    /// Select fahrenheit (true) or celsius (false) for reported temperatures
    pub fn set_fahrenheit(&mut self, fahrenheit: bool) {
        self.fahrenheit = fahrenheit;
    }

    /// Release the underlying connector
    pub fn release(self) -> Conn {
        self.conn.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    /// Stop periodic measurement and reinitialise, leaving the device idle
    pub fn init(&self) -> Result<(), Error<Err>> {
        let mut conn = self.lock();

        Self::execute(&mut *conn, Command::StopPeriodicMeasurement, &mut [])?;
        Self::execute(&mut *conn, Command::Reinit, &mut [])
    }

    /// Start periodic measurement mode
    /// The first sample is available after ~5s, poll [`Scd4x::data_ready`] before reading
    pub fn start_measurements(&self) -> Result<(), Error<Err>> {
        self.command(Command::StartPeriodicMeasurement, &mut [])
    }

    /// Stop periodic measurement mode
    pub fn stop_measurements(&self) -> Result<(), Error<Err>> {
        self.command(Command::StopPeriodicMeasurement, &mut [])
    }

    /// Check whether measurement data is available in the buffer
    pub fn data_ready(&self) -> Result<bool, Error<Err>> {
        let mut words = [0u16; 1];

        self.command(Command::GetDataReadyStatus, &mut words)?;

        Ok(words[0] & DATA_READY_MASK != 0)
    }

    /// Read measurement data from the buffer
    /// Values may be stale if [`Scd4x::data_ready`] has not been checked
    pub fn read_measurement(&self) -> Result<Measurement, Error<Err>> {
        let mut words = [0u16; 3];

        self.command(Command::ReadMeasurement, &mut words)?;

        let mut temp = convert_temperature(words[1]);
        if self.fahrenheit {
            temp = celsius_to_fahrenheit(temp);
        }

        Ok(Measurement{ co2: words[0], temp, rh: convert_humidity(words[2]) })
    }

    /// Fetch the temperature offset in degrees celsius
    /// This ignores the fahrenheit setting as the offset is a delta
    pub fn get_temperature_offset(&self) -> Result<f32, Error<Err>> {
        let mut words = [0u16; 1];

        self.command(Command::GetTemperatureOffset, &mut words)?;

        Ok(convert_temperature(words[0]))
    }

    /// Fetch the altitude compensation in meters above sea level
    pub fn get_sensor_altitude(&self) -> Result<u16, Error<Err>> {
        let mut words = [0u16; 1];

        self.command(Command::GetSensorAltitude, &mut words)?;

        Ok(words[0])
    }

    /// Fetch the ambient pressure compensation in hPa
    pub fn get_ambient_pressure(&self) -> Result<u16, Error<Err>> {
        let mut words = [0u16; 1];

        self.command(Command::GetAmbientPressure, &mut words)?;

        Ok(words[0])
    }

    fn lock(&self) -> MutexGuard<'_, Conn> {
        // A panic mid-transaction leaves nothing in the connector to repair
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Issue a single command holding the device lock
    fn command(&self, command: Command, words: &mut [u16]) -> Result<(), Error<Err>> {
        let mut conn = self.lock();
        Self::execute(&mut *conn, command, words)
    }

    /// Issue a command, validate and decode the response, then wait out the settling delay.
    /// The caller must hold the device lock.
    fn execute(conn: &mut Conn, command: Command, words: &mut [u16]) -> Result<(), Error<Err>> {
        let len = command.response_len();
        debug_assert_eq!(len % WORD_LEN, 0);
        debug_assert_eq!(words.len(), len / WORD_LEN);

        let mut buff = [0u8; MAX_RESPONSE_LEN];

        debug!("Issuing command: {} (0x{:04x})", command.description(), command.opcode());

        conn.tx(&command.opcode().to_be_bytes(), &mut buff[..len])
            .map_err(|e| Error::Conn(command.description(), e) )?;

        let res = decode(command, &buff[..len], words);

        // The device is busy regardless of what we made of the response
        let delay = command.delay();
        if !delay.is_zero() {
            debug!("Waiting {:?} after {}", delay, command.description());
            std::thread::sleep(delay);
        }

        res
    }
}

/// Validate every (MSB, LSB, CRC) word in a response and decode into `words`.
/// Any CRC failure invalidates the whole response.
fn decode<Err>(command: Command, data: &[u8], words: &mut [u16]) -> Result<(), Error<Err>> {
    for (line, w) in data.chunks_exact(WORD_LEN).zip(words.iter_mut()) {
        let crc = crc8(&line[..2]);
        if crc != line[2] {
            warn!("CRC mismatch for {}: computed 0x{:02x}, received 0x{:02x}", command.description(), crc, line[2]);
            return Err(Error::Crc(command.description(), crc, line[2]));
        }

        // Note the returned data is _big endian_
        *w = u16::from_be_bytes([line[0], line[1]]);
    }

    Ok(())
}
