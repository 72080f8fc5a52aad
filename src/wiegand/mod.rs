//! Multi-reader Wiegand decoder.
//!
//! ```text
//!  DATA0 ──falling edge──▶ on_edge(id, Zero) ─┐
//!                                             ├─▶ Reader[id] (code, bit_count)
//!  DATA1 ──falling edge──▶ on_edge(id, One)  ─┘          │
//!                                                        ▼
//!                                       frame consumer: take_frame(id)
//! ```
//!
//! Each reader lives in its own `critical_section::Mutex<RefCell<_>>`, so
//! a handler preempting the main loop, or another reader's handler, never
//! sees a torn `(code, bit_count)` pair.  Handlers hold the critical
//! section for one pin read and one shift.
//!
//! Interrupt vectors take no arguments, so [`Decoder::edge_handler`] hands
//! out a closure that captures the reader id and the line it serves.

pub mod frame;
pub mod reader;

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::{DecoderConfig, ReaderPins};
use crate::error::{Error, Result};
use crate::ports::{EdgeMask, MaskGuard, WiegandLine};

pub use frame::{Credential, CredentialFormat, FrameAssembler, RawFrame};
pub use reader::{Accumulator, Bit, EdgeOutcome, FrameProgress, Reader, ReaderPhase};

/// Index of a reader within a [`Decoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReaderId(u8);

impl ReaderId {
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for ReaderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", u16::from(self.0) + 1)
    }
}

/// `N` independent readers sharing one decoding discipline.
pub struct Decoder<L, const N: usize> {
    readers: [Mutex<RefCell<Reader<L>>>; N],
    settle_delay_ms: u32,
}

impl<L: WiegandLine, const N: usize> Decoder<L, N> {
    pub fn new(readers: [Reader<L>; N], settle_delay_ms: u32) -> Self {
        const { assert!(N <= 256, "ReaderId is a u8: at most 256 readers") };
        Self {
            readers: readers.map(|r| Mutex::new(RefCell::new(r))),
            settle_delay_ms,
        }
    }

    /// Build from a validated config.  `lines` yields the (DATA0, DATA1)
    /// pins for each configured reader, in reader-id order.
    pub fn from_config(config: &DecoderConfig, lines: [(L, L); N]) -> Result<Self> {
        config.validate()?;
        if config.readers.len() != N {
            return Err(Error::Config("reader count does not match the decoder"));
        }

        let mut pins = config.readers.iter().copied();
        let readers = lines.map(|(zero, one)| {
            // Length checked above.
            let p = pins.next().unwrap_or(ReaderPins { zero: 0, one: 0 });
            Reader::new(p, zero, one)
        });
        Ok(Self::new(readers, config.settle_delay_ms))
    }

    pub const fn reader_count(&self) -> usize {
        N
    }

    pub fn ids(&self) -> impl Iterator<Item = ReaderId> {
        (0..N).map(|i| ReaderId(i as u8))
    }

    pub fn settle_delay_ms(&self) -> u32 {
        self.settle_delay_ms
    }

    fn slot(&self, id: ReaderId) -> Option<&Mutex<RefCell<Reader<L>>>> {
        self.readers.get(id.index())
    }

    fn with_reader<R>(&self, id: ReaderId, f: impl FnOnce(&mut Reader<L>) -> R) -> Option<R> {
        let slot = self.slot(id)?;
        Some(critical_section::with(|cs| f(&mut slot.borrow_ref_mut(cs))))
    }

    // ── Edge handlers (interrupt context) ─────────────────────

    /// Falling edge on `id`'s line for `bit`.  Never blocks or logs.
    pub fn on_edge(&self, id: ReaderId, bit: Bit) -> EdgeOutcome {
        self.with_reader(id, |r| r.on_edge(bit))
            .unwrap_or(EdgeOutcome::UnknownReader)
    }

    pub fn on_zero_edge(&self, id: ReaderId) -> EdgeOutcome {
        self.on_edge(id, Bit::Zero)
    }

    pub fn on_one_edge(&self, id: ReaderId) -> EdgeOutcome {
        self.on_edge(id, Bit::One)
    }

    /// Argument-less callback for one line, for binding to an edge vector.
    /// Outcomes are dropped; line faults stay visible through
    /// [`line_faults`](Self::line_faults).
    pub fn edge_handler(&self, id: ReaderId, bit: Bit) -> impl Fn() + '_ {
        move || {
            let _ = self.on_edge(id, bit);
        }
    }

    // ── Arming ────────────────────────────────────────────────

    /// Re-arm a reader: glitch both lines, wait the settle delay, clear.
    ///
    /// Both lines stay masked in `mask` until this returns, so the glitch
    /// edges and any pulse during the settle window never reach the
    /// accumulator after it is cleared.
    pub fn initialize<D, M>(&self, id: ReaderId, delay: &mut D, mask: &mut M) -> Result<()>
    where
        D: DelayNs,
        M: EdgeMask,
    {
        let Some(slot) = self.slot(id) else {
            warn!("wiegand: initialize on unknown reader {}", id);
            return Err(Error::UnknownReader(id.0));
        };

        let pins = critical_section::with(|cs| slot.borrow_ref(cs).pins());
        let _masked = MaskGuard::new(mask, [pins.zero, pins.one]);

        critical_section::with(|cs| slot.borrow_ref_mut(cs).glitch_lines())?;
        delay.delay_ms(self.settle_delay_ms);
        critical_section::with(|cs| slot.borrow_ref_mut(cs).clear());

        info!(
            "wiegand: reader {} armed (DATA0=GPIO{}, DATA1=GPIO{})",
            id, pins.zero, pins.one
        );
        Ok(())
    }

    /// Arm every reader in id order.
    pub fn initialize_all<D, M>(&self, delay: &mut D, mask: &mut M) -> Result<()>
    where
        D: DelayNs,
        M: EdgeMask,
    {
        for id in self.ids() {
            self.initialize(id, delay, mask)?;
        }
        Ok(())
    }

    /// Clear the accumulator without touching the lines.
    pub fn reset(&self, id: ReaderId) -> Result<()> {
        self.with_reader(id, Reader::clear)
            .ok_or(Error::UnknownReader(id.0))
    }

    // ── Consumer access ───────────────────────────────────────

    pub fn accumulator(&self, id: ReaderId) -> Option<Accumulator> {
        self.with_reader(id, |r| r.accumulator())
    }

    pub fn code(&self, id: ReaderId) -> Option<u64> {
        self.accumulator(id).map(|a| a.code())
    }

    pub fn bit_count(&self, id: ReaderId) -> Option<u32> {
        self.accumulator(id).map(|a| a.bit_count())
    }

    pub fn pins(&self, id: ReaderId) -> Option<ReaderPins> {
        self.with_reader(id, |r| r.pins())
    }

    /// Bit count and clear generation in one critical section.
    pub fn progress(&self, id: ReaderId) -> Option<FrameProgress> {
        self.with_reader(id, |r| r.progress())
    }

    /// Edges dropped because the line could not be sampled.
    pub fn line_faults(&self, id: ReaderId) -> Option<u32> {
        self.with_reader(id, |r| r.line_faults())
    }

    /// Take whatever has accumulated and clear the reader in one step.
    pub fn take_frame(&self, id: ReaderId) -> Option<RawFrame> {
        let frame = self.with_reader(id, Reader::take)?.map(RawFrame::from)?;
        debug!("wiegand: reader {} frame taken ({} bits)", id, frame.bits());
        Some(frame)
    }

    /// Like [`take_frame`](Self::take_frame), but only if the bit count is
    /// still `bits`.  A bit landing between the caller's last look and this
    /// call leaves the reader untouched.
    pub fn take_frame_if(&self, id: ReaderId, bits: u32) -> Option<RawFrame> {
        let frame = self
            .with_reader(id, |r| {
                if r.accumulator().bit_count() == bits {
                    r.take()
                } else {
                    None
                }
            })?
            .map(RawFrame::from)?;
        debug!("wiegand: reader {} frame taken ({} bits)", id, frame.bits());
        Some(frame)
    }

    /// Take the frame only if the reader is exactly where `seen` left it:
    /// same bit count and not cleared since.
    pub fn take_frame_at(&self, id: ReaderId, seen: FrameProgress) -> Option<RawFrame> {
        let frame = self
            .with_reader(id, |r| if r.progress() == seen { r.take() } else { None })?
            .map(RawFrame::from)?;
        debug!("wiegand: reader {} frame taken ({} bits)", id, frame.bits());
        Some(frame)
    }
}
