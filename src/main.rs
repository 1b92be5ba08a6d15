//! Scd4x command-line utility
//!
//! Copyright 2019 Ryan Kurte

use std::time::{Duration, Instant, SystemTime};

extern crate embedded_hal;
extern crate linux_embedded_hal;
use linux_embedded_hal::I2cdev;

extern crate structopt;
use structopt::StructOpt;

extern crate humantime;
use humantime::{Duration as HumanDuration};

#[macro_use] extern crate log;
extern crate simplelog;
use simplelog::{TermLogger, LevelFilter};

extern crate sensor_scd4x;
use sensor_scd4x::Scd4x;

/// Minimum period between samples, the sensor produces one roughly every 5s
const MIN_SAMPLE_PERIOD: Duration = Duration::from_secs(5);

#[derive(StructOpt)]
#[structopt(name = "scd4x-util")]
/// A Command Line Interface (CLI) for interacting with a local Scd4x environmental sensor over I2C
pub struct Options {

    #[structopt(subcommand)]
    pub operation: Operation,

    /// Specify the i2c interface to use to connect to the scd4x device
    #[structopt(short="d", long = "i2c", default_value = "/dev/i2c-1", env = "SCD4X_I2C")]
    i2c: String,

    /// Report temperatures in degrees fahrenheit
    #[structopt(short = "f", long = "fahrenheit")]
    pub fahrenheit: bool,

    /// Enable verbose logging
    #[structopt(long = "log-level", default_value = "info")]
    level: LevelFilter,
}

#[derive(StructOpt)]
pub enum Operation {
    #[structopt(name = "monitor")]
    /// Print measurements from the sensor
    Monitor {
        /// Stop and reinitialise the sensor, then start periodic measurement
        #[structopt(long = "init")]
        init: bool,

        /// Period between samples, zero takes a single sample
        #[structopt(short = "p", long = "delay", default_value="0s")]
        period: HumanDuration,

        /// Number of samples to take, zero for unlimited
        #[structopt(short = "c", long = "count", default_value="0")]
        count: usize,

        /// Delay between data ready poll operations
        #[structopt(long = "poll-delay", default_value="100ms")]
        poll_delay: HumanDuration,

        /// Time to wait for data to become ready before exiting
        #[structopt(long = "poll-timeout", default_value="10s")]
        poll_timeout: HumanDuration,

        /// Timestamped output with units
        #[structopt(short = "v", long = "verbose")]
        verbose: bool,
    },

    #[structopt(name = "compensation")]
    /// Print the temperature offset, altitude and ambient pressure compensation values
    Compensation,
}

fn main() {
    // Load options
    let opts = Options::from_args();

    // Setup logging
    TermLogger::init(opts.level, simplelog::Config::default()).unwrap();

    debug!("Connecting to I2C device");
    let i2c = match I2cdev::new(&opts.i2c) {
        Ok(v) => v,
        Err(e) => {
            error!("Error opening I2C device '{}': {:?}", &opts.i2c, e);
            std::process::exit(-1);
        }
    };

    let sensor = Scd4x::new(i2c, opts.fahrenheit);

    match opts.operation {
        Operation::Monitor{ init, period, count, poll_delay, poll_timeout, verbose } => {
            if *period != Duration::from_secs(0) && *period < MIN_SAMPLE_PERIOD {
                error!("Sample period must be at least {:?}", MIN_SAMPLE_PERIOD);
                std::process::exit(-2);
            }

            if init {
                debug!("Initialising sensor");
                if let Err(e) = sensor.init() {
                    error!("Error initialising sensor: {}", e);
                    std::process::exit(-3);
                }

                debug!("Starting periodic measurement");
                if let Err(e) = sensor.start_measurements() {
                    error!("Error starting periodic measurement: {}", e);
                    std::process::exit(-3);
                }
            }

            let unit = match sensor.fahrenheit() {
                true => "F",
                false => "C",
            };

            if verbose {
                println!("Time                  CO2      Temp     RH");
            }

            let mut samples = 0;

            loop {
                debug!("Starting sensor read cycle");

                // Poll for sensor ready
                let start = Instant::now();
                loop {
                    match sensor.data_ready() {
                        Ok(true) => break,
                        Ok(false) => (),
                        Err(e) => {
                            error!("Error polling for sensor ready: {}", e);
                            std::process::exit(-4);
                        },
                    }

                    if start.elapsed() > *poll_timeout {
                        error!("Sensor data ready timed-out");
                        std::process::exit(-4);
                    }

                    std::thread::sleep(*poll_delay);
                }

                let m = match sensor.read_measurement() {
                    Ok(m) => m,
                    Err(e) => {
                        error!("Error reading sensor data: {}", e);
                        std::process::exit(-5);
                    }
                };

                if verbose {
                    let now = humantime::format_rfc3339_seconds(SystemTime::now());
                    println!("[{}] {:4}ppm {:5.1}*{} {:5.1}%", now, m.co2, m.temp, unit, m.rh);
                } else {
                    println!("{} {:.1} {:.1}", m.co2, m.temp, m.rh);
                }

                samples += 1;
                if *period == Duration::from_secs(0) || (count > 0 && samples >= count) {
                    break;
                }

                // Wait for enough time for another sensor reading
                std::thread::sleep(*period);
            }
        },
        Operation::Compensation => {
            let offset = sensor.get_temperature_offset().unwrap_or_else(|e| {
                error!("Failed to get temperature offset: {}", e);
                std::process::exit(-6);
            });

            let altitude = sensor.get_sensor_altitude().unwrap_or_else(|e| {
                error!("Failed to get sensor altitude compensation: {}", e);
                std::process::exit(-6);
            });

            let pressure = sensor.get_ambient_pressure().unwrap_or_else(|e| {
                error!("Failed to get ambient pressure compensation: {}", e);
                std::process::exit(-6);
            });

            info!("Temperature offset (degrees C): {:.2}", offset);
            info!("Sensor altitude (meters): {}", altitude);
            info!("Ambient pressure (hPa): {}", pressure);
        },
    }
}
