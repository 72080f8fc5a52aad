//! A single Wiegand reader: two data lines and the bit accumulator.
//!
//! ## Line discipline
//!
//! Both lines idle HIGH under the pull-up.  The reader pulls DATA0 LOW for
//! ~50 µs to send a `0` and DATA1 LOW to send a `1`, MSB first, ~2 ms
//! apart.  Each falling edge lands in [`Reader::on_edge`], which re-samples
//! the line that supposedly fired before appending the bit: on ports that
//! share one change vector, the other line's edge can invoke this handler
//! too, and the re-sample is what filters it out.
//!
//! The reader has no idea of frame length or inter-bit timeout.  It goes
//! `Idle → Accumulating` on the first accepted bit and back to `Idle` only
//! when somebody clears it.  Every clear bumps the reader's generation,
//! so a consumer can tell "same bit count" from "same frame".

use embedded_hal::digital::{Error as _, PinState};

use crate::config::ReaderPins;
use crate::error::LineError;
use crate::ports::WiegandLine;

/// One received Wiegand bit, named after the line that carried it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bit {
    Zero = 0,
    One = 1,
}

/// Result of one edge handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// Own line read LOW; the bit was appended.
    Accepted,
    /// Own line read HIGH; nothing changed.
    Spurious,
    /// Own line could not be sampled; nothing changed.
    LineFault,
    /// The reader id does not exist; nothing changed.
    UnknownReader,
}

/// Conceptual reader state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderPhase {
    Idle,
    Accumulating,
}

/// MSB-first bit accumulator.
///
/// Bits past 64 shift out of the top; the counter saturates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accumulator {
    code: u64,
    bit_count: u32,
}

impl Accumulator {
    pub const fn new() -> Self {
        Self {
            code: 0,
            bit_count: 0,
        }
    }

    pub fn push(&mut self, bit: Bit) {
        self.code = (self.code << 1) | bit as u64;
        self.bit_count = self.bit_count.saturating_add(1);
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn code(&self) -> u64 {
        self.code
    }

    pub fn bit_count(&self) -> u32 {
        self.bit_count
    }

    pub fn is_empty(&self) -> bool {
        self.bit_count == 0
    }

    pub fn phase(&self) -> ReaderPhase {
        if self.is_empty() {
            ReaderPhase::Idle
        } else {
            ReaderPhase::Accumulating
        }
    }
}

/// Bit count and clear generation of a reader, read together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameProgress {
    pub bits: u32,
    /// Wraps; only ever compared for equality.
    pub generation: u32,
}

/// Lines and accumulator of one physical reader.
pub struct Reader<L> {
    pins: ReaderPins,
    zero: L,
    one: L,
    acc: Accumulator,
    generation: u32,
    line_faults: u32,
}

impl<L: WiegandLine> Reader<L> {
    pub fn new(pins: ReaderPins, zero: L, one: L) -> Self {
        Self {
            pins,
            zero,
            one,
            acc: Accumulator::new(),
            generation: 0,
            line_faults: 0,
        }
    }

    pub fn pins(&self) -> ReaderPins {
        self.pins
    }

    pub fn accumulator(&self) -> Accumulator {
        self.acc
    }

    pub fn progress(&self) -> FrameProgress {
        FrameProgress {
            bits: self.acc.bit_count(),
            generation: self.generation,
        }
    }

    /// Edges whose line could not be sampled.  Saturates; survives clears.
    pub fn line_faults(&self) -> u32 {
        self.line_faults
    }

    /// Edge handler body.  Bounded time: one pin read, one shift.
    pub fn on_edge(&mut self, bit: Bit) -> EdgeOutcome {
        let line = match bit {
            Bit::Zero => &mut self.zero,
            Bit::One => &mut self.one,
        };

        match line.is_low() {
            Ok(true) => {
                self.acc.push(bit);
                EdgeOutcome::Accepted
            }
            Ok(false) => EdgeOutcome::Spurious,
            Err(_) => {
                self.line_faults = self.line_faults.saturating_add(1);
                EdgeOutcome::LineFault
            }
        }
    }

    /// Drive each line HIGH then LOW, then hand it back to the pull-up.
    ///
    /// The forced LOW leaves the edge detector in a known state, so the
    /// first real pulse produces a clean falling edge.  Does not touch the
    /// accumulator; the caller clears it after the settle delay.
    pub fn glitch_lines(&mut self) -> Result<(), LineError> {
        for line in [&mut self.zero, &mut self.one] {
            line.drive(PinState::High)
                .map_err(|e| LineError::Drive(e.kind()))?;
            line.drive(PinState::Low)
                .map_err(|e| LineError::Drive(e.kind()))?;
            line.release().map_err(|e| LineError::Release(e.kind()))?;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.acc.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Return the accumulated bits and clear, or `None` if empty.
    pub fn take(&mut self) -> Option<Accumulator> {
        if self.acc.is_empty() {
            return None;
        }
        let acc = self.acc;
        self.clear();
        Some(acc)
    }
}
