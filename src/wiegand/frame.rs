//! Frame consumer: turns a quiet accumulator into a credential.
//!
//! The decoder never decides when a frame is over.  [`FrameAssembler`]
//! does that from the outside by watching each reader's bit count: once it
//! has not moved for the inter-bit timeout, the bits are taken as one frame
//! and the reader is cleared for the next card.
//!
//! ## Formats
//!
//! | Bits | Layout                                   | Facility | Card   |
//! |------|------------------------------------------|----------|--------|
//! | 26   | `E` + 24 data + `O` (H10301)             | 8 bits   | 16 bits|
//! | 34   | `E` + 32 data + `O`                      | 16 bits  | 16 bits|
//!
//! `E` is even parity over the first half of the data bits, `O` odd parity
//! over the second half.

use heapless::Vec;
use log::warn;

use super::reader::{Accumulator, Bit, FrameProgress};
use super::{Decoder, ReaderId};
use crate::config::DecoderConfig;
use crate::error::FrameError;
use crate::ports::WiegandLine;

/// Bits exactly as received, MSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    code: u64,
    bits: u32,
}

impl RawFrame {
    pub const fn new(code: u64, bits: u32) -> Self {
        Self { code, bits }
    }

    pub fn code(&self) -> u64 {
        self.code
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Bits in transmission order.  Frames longer than 64 bits only
    /// replay their last 64.
    pub fn bits_msb_first(&self) -> impl Iterator<Item = Bit> + '_ {
        (0..self.bits.min(64)).rev().map(move |pos| {
            if (self.code >> pos) & 1 == 1 {
                Bit::One
            } else {
                Bit::Zero
            }
        })
    }

    /// Encode an H10301 26-bit frame with correct parity.
    pub fn h10301(facility: u8, card: u16) -> Self {
        let data = (u32::from(facility) << 16) | u32::from(card);
        Self::with_parity(data, 24)
    }

    /// Encode a 34-bit frame with correct parity.
    pub fn wiegand34(facility: u16, card: u16) -> Self {
        let data = (u32::from(facility) << 16) | u32::from(card);
        Self::with_parity(data, 32)
    }

    fn with_parity(data: u32, data_bits: u32) -> Self {
        let half = data_bits / 2;
        let upper = u64::from(data) >> half;
        let lower = u64::from(data) & ((1 << half) - 1);
        let even = u64::from(upper.count_ones() % 2);
        let odd = u64::from(lower.count_ones() % 2 == 0);
        let code = (even << (data_bits + 1)) | (u64::from(data) << 1) | odd;
        Self::new(code, data_bits + 2)
    }
}

impl From<Accumulator> for RawFrame {
    fn from(acc: Accumulator) -> Self {
        Self::new(acc.code(), acc.bit_count())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFormat {
    H10301,
    Wiegand34,
}

/// Decoded card credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credential {
    pub format: CredentialFormat,
    pub facility: u32,
    pub card: u32,
    /// Data bits without the parity bits.
    pub data: u32,
}

impl Credential {
    pub fn parse(frame: &RawFrame) -> Result<Self, FrameError> {
        let (format, data_bits): (_, u32) = match frame.bits() {
            26 => (CredentialFormat::H10301, 24),
            34 => (CredentialFormat::Wiegand34, 32),
            other => return Err(FrameError::UnsupportedLength(other)),
        };

        let raw = frame.code() & ((1u64 << (data_bits + 2)) - 1);
        let leading = (raw >> (data_bits + 1)) & 1;
        let trailing = raw & 1;
        let data = ((raw >> 1) & ((1u64 << data_bits) - 1)) as u32;

        let half = data_bits / 2;
        let upper = data >> half;
        let lower = data & ((1 << half) - 1);
        let even_ok = u64::from(upper.count_ones() % 2) == leading;
        let odd_ok = u64::from(lower.count_ones() % 2) != trailing;
        if !even_ok || !odd_ok {
            warn!("wiegand: {}-bit parity failed", frame.bits());
            return Err(FrameError::Parity);
        }

        let (facility, card) = match format {
            CredentialFormat::H10301 => ((data >> 16) & 0xFF, data & 0xFFFF),
            CredentialFormat::Wiegand34 => (data >> 16, data & 0xFFFF),
        };

        Ok(Self {
            format,
            facility,
            card,
            data,
        })
    }

    /// Printed fob number: facility code followed by a 5-digit card id.
    pub fn fob_number(&self) -> u64 {
        u64::from(self.facility) * 100_000 + u64::from(self.card)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Track {
    seen: FrameProgress,
    since_ms: u32,
}

/// Per-reader frame end detection by line silence.
///
/// The quiet period restarts whenever the bit count moves or the reader
/// was cleared behind the assembler's back (re-arm, `reset`, a manual
/// `take_frame`), so a new card that happens to reach the same count is
/// never taken half-way.
pub struct FrameAssembler<const N: usize> {
    timeout_ms: u32,
    tracks: [Track; N],
}

impl<const N: usize> FrameAssembler<N> {
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout_ms,
            tracks: [Track::default(); N],
        }
    }

    pub fn from_config(config: &DecoderConfig) -> Self {
        Self::new(config.frame_timeout_ms)
    }

    /// Check one reader.  Call from the main loop at a period well below
    /// the timeout; `now_ms` is monotonic milliseconds.
    pub fn poll<L: WiegandLine>(
        &mut self,
        decoder: &Decoder<L, N>,
        id: ReaderId,
        now_ms: u32,
    ) -> Option<RawFrame> {
        let track = self.tracks.get_mut(id.index())?;
        let seen = decoder.progress(id)?;

        if seen.bits == 0 {
            *track = Track::default();
            return None;
        }
        if seen != track.seen {
            *track = Track {
                seen,
                since_ms: now_ms,
            };
            return None;
        }
        if now_ms.wrapping_sub(track.since_ms) < self.timeout_ms {
            return None;
        }

        *track = Track::default();
        decoder.take_frame_at(id, seen)
    }

    /// Check every reader, in id order.
    pub fn poll_all<L: WiegandLine>(
        &mut self,
        decoder: &Decoder<L, N>,
        now_ms: u32,
    ) -> Vec<(ReaderId, RawFrame), N> {
        let mut frames = Vec::new();
        for id in decoder.ids() {
            if let Some(frame) = self.poll(decoder, id, now_ms) {
                // At most one frame per reader.
                let _ = frames.push((id, frame));
            }
        }
        frames
    }
}
