//! Unified error types for the reader peripherals.
//!
//! One `Error` enum that every subsystem converts into, so board bring-up
//! code handles failures uniformly.  All variants are `Copy`; bus and pin
//! errors keep only the embedded-hal `ErrorKind`, never the HAL's own type.

use core::fmt;

use embedded_hal::{digital, i2c};

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A Wiegand data line could not be driven or sampled.
    Line(LineError),
    /// The RTC rejected a transfer or a field was out of range.
    Rtc(RtcError),
    /// Pin-change table operation failed.
    PinChange(PinChangeError),
    /// A completed frame could not be decoded into a credential.
    Frame(FrameError),
    /// Reader index outside the decoder's reader array.
    UnknownReader(u8),
    /// Configuration is invalid or could not be decoded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(e) => write!(f, "line: {e}"),
            Self::Rtc(e) => write!(f, "rtc: {e}"),
            Self::PinChange(e) => write!(f, "pin change: {e}"),
            Self::Frame(e) => write!(f, "frame: {e}"),
            Self::UnknownReader(id) => write!(f, "unknown reader {id}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Line errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineError {
    /// Switching the line to a driven output failed.
    Drive(digital::ErrorKind),
    /// Returning the line to pulled-up input failed.
    Release(digital::ErrorKind),
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drive(kind) => write!(f, "drive failed ({kind:?})"),
            Self::Release(kind) => write!(f, "release failed ({kind:?})"),
        }
    }
}

impl From<LineError> for Error {
    fn from(e: LineError) -> Self {
        Self::Line(e)
    }
}

// ---------------------------------------------------------------------------
// RTC errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtcError {
    /// The I²C transfer failed.
    Bus(i2c::ErrorKind),
    /// A date/time field is outside its register range.
    InvalidField(&'static str),
}

impl fmt::Display for RtcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(kind) => write!(f, "bus error ({kind:?})"),
            Self::InvalidField(field) => write!(f, "{field} out of range"),
        }
    }
}

impl From<RtcError> for Error {
    fn from(e: RtcError) -> Self {
        Self::Rtc(e)
    }
}

// ---------------------------------------------------------------------------
// Pin-change multiplexer errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinChangeError {
    /// Pin number does not fit in the port bitmap.
    PinOutOfRange(u8),
    /// Every handler slot is taken.
    TableFull,
    /// No handler is attached to this pin.
    NotAttached(u8),
}

impl fmt::Display for PinChangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinOutOfRange(pin) => write!(f, "pin {pin} out of range"),
            Self::TableFull => write!(f, "handler table full"),
            Self::NotAttached(pin) => write!(f, "pin {pin} not attached"),
        }
    }
}

impl From<PinChangeError> for Error {
    fn from(e: PinChangeError) -> Self {
        Self::PinChange(e)
    }
}

// ---------------------------------------------------------------------------
// Frame errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Bit count does not match any supported credential format.
    UnsupportedLength(u32),
    /// Leading or trailing parity bit disagrees with the data bits.
    Parity,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedLength(bits) => write!(f, "unsupported {bits}-bit format"),
            Self::Parity => write!(f, "parity check failed"),
        }
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
