//! Decoder configuration parameters
//!
//! Reader pin assignments and the timing constants used by reader arming
//! and frame assembly.  Persisted as a postcard blob by the board layer.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pins;

/// Reader slots available on the board.
pub const MAX_READERS: usize = 3;

/// The two data lines of one Wiegand reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderPins {
    /// DATA0: a LOW pulse here is a `0` bit.
    pub zero: u8,
    /// DATA1: a LOW pulse here is a `1` bit.
    pub one: u8,
}

/// Core decoder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    // --- Readers ---
    /// Pin pair for each populated reader slot, in reader-id order.
    pub readers: Vec<ReaderPins, MAX_READERS>,

    // --- Arming ---
    /// Wait after the arming glitch before the accumulator is cleared (ms).
    /// Hardware-calibrated; 10 ms suits the stock pull-ups.
    pub settle_delay_ms: u32,

    // --- Framing ---
    /// Bit count the frame consumer expects from the readers.
    pub frame_bits: u8,
    /// Line silence that ends a frame (ms).
    pub frame_timeout_ms: u32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        let mut readers = Vec::new();
        // Capacity equals the slice length, the pushes cannot fail.
        for pins in [pins::READER_1, pins::READER_2, pins::READER_3] {
            let _ = readers.push(pins);
        }

        Self {
            readers,
            settle_delay_ms: 10,
            frame_bits: 26,
            frame_timeout_ms: 25,
        }
    }
}

impl DecoderConfig {
    /// Reject configurations the decoder cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.readers.is_empty() {
            return Err(Error::Config("no readers configured"));
        }
        if self.settle_delay_ms == 0 {
            return Err(Error::Config("settle_delay_ms must be non-zero"));
        }
        if self.frame_bits == 0 || self.frame_bits > 64 {
            return Err(Error::Config("frame_bits must be within 1..=64"));
        }
        if self.frame_timeout_ms == 0 {
            return Err(Error::Config("frame_timeout_ms must be non-zero"));
        }

        let mut seen: u32 = 0;
        for r in &self.readers {
            if r.zero == r.one {
                return Err(Error::Config("reader uses the same pin for both lines"));
            }
            for pin in [r.zero, r.one] {
                if pin >= pins::PORT_WIDTH {
                    return Err(Error::Config("reader pin outside the pin-change port"));
                }
                let bit = 1u32 << pin;
                if seen & bit != 0 {
                    return Err(Error::Config("pin assigned to more than one line"));
                }
                seen |= bit;
            }
        }
        Ok(())
    }

    /// Serialise into `buf`, returning the number of bytes used.
    pub fn to_bytes(&self, buf: &mut [u8]) -> Result<usize> {
        postcard::to_slice(self, buf)
            .map(|used| used.len())
            .map_err(|_| Error::Config("config does not fit the buffer"))
    }

    /// Decode and validate a stored blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let config: Self =
            postcard::from_bytes(bytes).map_err(|_| Error::Config("stored config is corrupted"))?;
        config.validate()?;
        Ok(config)
    }
}
