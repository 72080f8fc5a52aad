//! GPIO / peripheral pin assignments for the access-controller board.
//!
//! Single source of truth: the default [`DecoderConfig`](crate::config::DecoderConfig)
//! and the simulator take their pin numbers from here.

use crate::config::ReaderPins;

// ---------------------------------------------------------------------------
// Wiegand readers (open-collector DATA0 / DATA1, active LOW)
// ---------------------------------------------------------------------------

/// Reader 1, door A.
pub const READER_1: ReaderPins = ReaderPins { zero: 4, one: 5 };
/// Reader 2, door B.
pub const READER_2: ReaderPins = ReaderPins { zero: 6, one: 7 };
/// Reader 3, optional expansion header.
pub const READER_3: ReaderPins = ReaderPins { zero: 8, one: 9 };

// ---------------------------------------------------------------------------
// I²C bus (DS1307 RTC)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: u8 = 18;
pub const I2C_SCL_GPIO: u8 = 19;

/// Width of one pin-change port; pin numbers above this cannot be multiplexed.
pub const PORT_WIDTH: u8 = 32;
