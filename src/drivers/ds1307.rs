//! DS1307 real-time clock over I²C.
//!
//! The clock keeps seven BCD registers starting at 0x00:
//!
//! | Reg | Field        | Range | Control bits            |
//! |-----|--------------|-------|-------------------------|
//! | 0   | seconds      | 0-59  | bit 7 = clock halt (CH) |
//! | 1   | minutes      | 0-59  |                         |
//! | 2   | hours        | 0-23  | bit 6 = 12-hour mode    |
//! | 3   | day of week  | 1-7   |                         |
//! | 4   | day of month | 1-31  |                         |
//! | 5   | month        | 1-12  |                         |
//! | 6   | year         | 0-99  |                         |
//!
//! Writing seconds with CH clear starts the oscillator; hours are always
//! written in 24-hour mode.  Fields are range-checked only; whether
//! 31 February exists is the caller's problem.

use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::error::RtcError;

/// Fixed 7-bit bus address.
pub const DS1307_ADDRESS: u8 = 0x68;

const REG_SECONDS: u8 = 0x00;
const CLOCK_HALT: u8 = 0x80;
const SECONDS_MASK: u8 = 0x7F;
const HOURS_24_MASK: u8 = 0x3F;

/// Packed BCD conversions.
pub mod bcd {
    /// `47` → `0x47`.  Input must be below 100.
    pub const fn encode(dec: u8) -> u8 {
        (dec / 10) * 16 + dec % 10
    }

    /// `0x47` → `47`.
    pub const fn decode(bcd: u8) -> u8 {
        (bcd / 16) * 10 + bcd % 16
    }
}

/// Wall-clock reading in the DS1307's own terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub second: u8,
    pub minute: u8,
    pub hour: u8,
    pub day_of_week: u8,
    pub day_of_month: u8,
    pub month: u8,
    /// Two-digit year.
    pub year: u8,
}

impl DateTime {
    pub fn validate(&self) -> Result<(), RtcError> {
        let fields: [(&'static str, u8, u8, u8); 7] = [
            ("second", self.second, 0, 59),
            ("minute", self.minute, 0, 59),
            ("hour", self.hour, 0, 23),
            ("day_of_week", self.day_of_week, 1, 7),
            ("day_of_month", self.day_of_month, 1, 31),
            ("month", self.month, 1, 12),
            ("year", self.year, 0, 99),
        ];
        for (name, value, lo, hi) in fields {
            if !(lo..=hi).contains(&value) {
                return Err(RtcError::InvalidField(name));
            }
        }
        Ok(())
    }

    fn to_registers(self) -> [u8; 7] {
        [
            bcd::encode(self.second),
            bcd::encode(self.minute),
            bcd::encode(self.hour),
            bcd::encode(self.day_of_week),
            bcd::encode(self.day_of_month),
            bcd::encode(self.month),
            bcd::encode(self.year),
        ]
    }

    fn from_registers(regs: [u8; 7]) -> Self {
        Self {
            second: bcd::decode(regs[0] & SECONDS_MASK),
            minute: bcd::decode(regs[1]),
            hour: bcd::decode(regs[2] & HOURS_24_MASK),
            day_of_week: bcd::decode(regs[3]),
            day_of_month: bcd::decode(regs[4]),
            month: bcd::decode(regs[5]),
            year: bcd::decode(regs[6]),
        }
    }
}

pub struct Ds1307<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Ds1307<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Set all seven registers, start the clock and select 24-hour mode.
    pub fn set_datetime(&mut self, dt: &DateTime) -> Result<(), RtcError> {
        dt.validate()?;

        let regs = dt.to_registers();
        let mut frame = [0u8; 8];
        frame[0] = REG_SECONDS;
        frame[1..].copy_from_slice(&regs);

        self.i2c
            .write(DS1307_ADDRESS, &frame)
            .map_err(|e| bus_error("set_datetime", &e))?;
        info!(
            "ds1307: clock set to 20{:02}-{:02}-{:02} {:02}:{:02}:{:02}",
            dt.year, dt.month, dt.day_of_month, dt.hour, dt.minute, dt.second
        );
        Ok(())
    }

    /// Read all seven registers from 0x00.
    pub fn datetime(&mut self) -> Result<DateTime, RtcError> {
        let mut regs = [0u8; 7];
        self.i2c
            .write_read(DS1307_ADDRESS, &[REG_SECONDS], &mut regs)
            .map_err(|e| bus_error("datetime", &e))?;
        Ok(DateTime::from_registers(regs))
    }

    /// Whether the oscillator is stopped (CH bit set).
    pub fn is_halted(&mut self) -> Result<bool, RtcError> {
        let mut sec = [0u8; 1];
        self.i2c
            .write_read(DS1307_ADDRESS, &[REG_SECONDS], &mut sec)
            .map_err(|e| bus_error("is_halted", &e))?;
        Ok(sec[0] & CLOCK_HALT != 0)
    }

    /// Stop the oscillator.  Also zeroes the seconds register.
    pub fn halt(&mut self) -> Result<(), RtcError> {
        self.i2c
            .write(DS1307_ADDRESS, &[REG_SECONDS, CLOCK_HALT])
            .map_err(|e| bus_error("halt", &e))?;
        warn!("ds1307: oscillator halted");
        Ok(())
    }
}

fn bus_error<E: embedded_hal::i2c::Error>(op: &str, e: &E) -> RtcError {
    warn!("ds1307: {} failed: {:?}", op, e);
    RtcError::Bus(e.kind())
}
