//! Mock hardware for integration tests.
//!
//! Lines, delay, edge mask and I²C bus all write into one shared
//! [`Journal`], so tests can assert on the order of every hardware touch
//! across devices (mask before glitch, glitch before settle, and so on).

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, InputPin, PinState};
use embedded_hal::i2c::{self, I2c, NoAcknowledgeSource, Operation};
use wiegand_periph::config::ReaderPins;
use wiegand_periph::ports::{EdgeMask, WiegandLine};
use wiegand_periph::wiegand::{Bit, Decoder, RawFrame, Reader, ReaderId};

// ── Journal ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HwEvent {
    Drive { pin: u8, high: bool },
    Release { pin: u8 },
    DelayMs(u32),
    Mask(u8),
    Unmask(u8),
    I2cWrite { addr: u8, bytes: Vec<u8> },
    I2cRead { addr: u8, len: usize },
}

#[derive(Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<HwEvent>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: HwEvent) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<HwEvent> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn position(&self, event: &HwEvent) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == event)
    }
}

// ── Wiegand line ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// Shared state of one open-drain line.  `low` is the electrical level;
/// the test side pulls it through [`LineProbe`].
#[derive(Default)]
struct LineState {
    low: Cell<bool>,
    fail_drive: Cell<bool>,
    fail_read: Cell<bool>,
}

pub struct MockLine {
    pin: u8,
    state: Rc<LineState>,
    journal: Journal,
}

/// Test-side handle onto a [`MockLine`].
#[derive(Clone)]
pub struct LineProbe {
    pub pin: u8,
    state: Rc<LineState>,
}

impl LineProbe {
    pub fn pull_low(&self) {
        self.state.low.set(true);
    }

    pub fn let_go(&self) {
        self.state.low.set(false);
    }

    pub fn is_low(&self) -> bool {
        self.state.low.get()
    }

    pub fn fail_drive(&self, fail: bool) {
        self.state.fail_drive.set(fail);
    }

    pub fn fail_read(&self, fail: bool) {
        self.state.fail_read.set(fail);
    }
}

impl MockLine {
    pub fn new(pin: u8, journal: &Journal) -> (Self, LineProbe) {
        let state = Rc::new(LineState::default());
        (
            Self {
                pin,
                state: Rc::clone(&state),
                journal: journal.clone(),
            },
            LineProbe { pin, state },
        )
    }
}

impl ErrorType for MockLine {
    type Error = MockPinError;
}

impl InputPin for MockLine {
    fn is_high(&mut self) -> Result<bool, MockPinError> {
        self.is_low().map(|low| !low)
    }

    fn is_low(&mut self) -> Result<bool, MockPinError> {
        if self.state.fail_read.get() {
            return Err(MockPinError);
        }
        Ok(self.state.low.get())
    }
}

impl WiegandLine for MockLine {
    fn drive(&mut self, state: PinState) -> Result<(), MockPinError> {
        if self.state.fail_drive.get() {
            return Err(MockPinError);
        }
        let high = state == PinState::High;
        self.state.low.set(!high);
        self.journal.push(HwEvent::Drive {
            pin: self.pin,
            high,
        });
        Ok(())
    }

    fn release(&mut self) -> Result<(), MockPinError> {
        self.state.low.set(false);
        self.journal.push(HwEvent::Release { pin: self.pin });
        Ok(())
    }
}

/// Both lines of one reader, test side.
#[derive(Clone)]
pub struct ReaderProbe {
    pub zero: LineProbe,
    pub one: LineProbe,
}

impl ReaderProbe {
    pub fn line(&self, bit: Bit) -> &LineProbe {
        match bit {
            Bit::Zero => &self.zero,
            Bit::One => &self.one,
        }
    }
}

/// A board of `N` readers on the given pins, plus the probes that drive
/// them from the card side.
pub struct MockBoard<const N: usize> {
    pub decoder: Decoder<MockLine, N>,
    pub probes: [ReaderProbe; N],
    pub journal: Journal,
}

impl<const N: usize> MockBoard<N> {
    pub fn new(pins: [ReaderPins; N], settle_delay_ms: u32) -> Self {
        let journal = Journal::new();
        let (readers, probes) = build_readers(pins, &journal);
        Self {
            decoder: Decoder::new(readers, settle_delay_ms),
            probes,
            journal,
        }
    }

    /// One physical pulse: pull the line low, fire its edge handler, let go.
    pub fn pulse(&self, id: ReaderId, bit: Bit) {
        let probe = self.probes[id.index()].line(bit);
        probe.pull_low();
        let _ = self.decoder.on_edge(id, bit);
        probe.let_go();
    }

    pub fn play_bits(&self, id: ReaderId, bits: impl IntoIterator<Item = Bit>) {
        for bit in bits {
            self.pulse(id, bit);
        }
    }

    pub fn play_frame(&self, id: ReaderId, frame: &RawFrame) {
        self.play_bits(id, frame.bits_msb_first());
    }

    /// Port input register as the MCU would see it: every pin HIGH except
    /// the lines currently pulled low.
    pub fn port_levels(&self) -> u32 {
        self.probes
            .iter()
            .flat_map(|p| [&p.zero, &p.one])
            .filter(|l| l.is_low())
            .fold(u32::MAX, |acc, l| acc & !(1 << l.pin))
    }
}

pub fn build_readers<const N: usize>(
    pins: [ReaderPins; N],
    journal: &Journal,
) -> ([Reader<MockLine>; N], [ReaderProbe; N]) {
    let pairs = pins.map(|p| {
        let (zero, zero_probe) = MockLine::new(p.zero, journal);
        let (one, one_probe) = MockLine::new(p.one, journal);
        (
            Reader::new(p, zero, one),
            ReaderProbe {
                zero: zero_probe,
                one: one_probe,
            },
        )
    });
    let probes = pairs.each_ref().map(|(_, probe)| probe.clone());
    (pairs.map(|(reader, _)| reader), probes)
}

pub fn bits_of(pattern: &str) -> Vec<Bit> {
    pattern
        .chars()
        .filter_map(|c| match c {
            '0' => Some(Bit::Zero),
            '1' => Some(Bit::One),
            _ => None,
        })
        .collect()
}

// ── Delay and mask ────────────────────────────────────────────

pub struct MockDelay {
    journal: Journal,
}

impl MockDelay {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
        }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.journal.push(HwEvent::DelayMs(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.journal.push(HwEvent::DelayMs(ms));
    }
}

pub struct MockMask {
    journal: Journal,
    pub masked: u32,
}

impl MockMask {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            masked: 0,
        }
    }
}

impl EdgeMask for MockMask {
    fn mask(&mut self, pin: u8) {
        self.masked |= 1 << pin;
        self.journal.push(HwEvent::Mask(pin));
    }

    fn unmask(&mut self, pin: u8) {
        self.masked &= !(1 << pin);
        self.journal.push(HwEvent::Unmask(pin));
    }
}

// ── I²C register file ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockI2cError(pub i2c::ErrorKind);

impl i2c::Error for MockI2cError {
    fn kind(&self) -> i2c::ErrorKind {
        self.0
    }
}

/// Single-device bus with an auto-incrementing register pointer, the way
/// the DS1307 behaves.
pub struct MockI2c {
    pub address: u8,
    pub regs: [u8; 64],
    pointer: usize,
    pub fail: bool,
    journal: Journal,
}

impl MockI2c {
    pub fn new(address: u8, journal: &Journal) -> Self {
        Self {
            address,
            regs: [0; 64],
            pointer: 0,
            fail: false,
            journal: journal.clone(),
        }
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.journal
            .events()
            .into_iter()
            .filter_map(|e| match e {
                HwEvent::I2cWrite { bytes, .. } => Some(bytes),
                _ => None,
            })
            .collect()
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = MockI2cError;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), MockI2cError> {
        if self.fail || address != self.address {
            return Err(MockI2cError(i2c::ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Address,
            )));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    self.journal.push(HwEvent::I2cWrite {
                        addr: address,
                        bytes: bytes.to_vec(),
                    });
                    if let Some((&reg, data)) = bytes.split_first() {
                        self.pointer = usize::from(reg);
                        for &b in data {
                            self.regs[self.pointer % self.regs.len()] = b;
                            self.pointer += 1;
                        }
                    }
                }
                Operation::Read(buf) => {
                    self.journal.push(HwEvent::I2cRead {
                        addr: address,
                        len: buf.len(),
                    });
                    for b in buf.iter_mut() {
                        *b = self.regs[self.pointer % self.regs.len()];
                        self.pointer += 1;
                    }
                }
            }
        }
        Ok(())
    }
}
