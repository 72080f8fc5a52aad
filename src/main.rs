//! Host simulator for the reader board.
//!
//! ```text
//!  simulated card ──pulses──▶ SimPort ──dispatch──▶ PinChangeMux
//!                                                       │ edge handlers
//!                                                       ▼
//!  FrameAssembler ◀──take_frame── Decoder<SimLine, 3> ◀─┘
//!        │
//!        ▼
//!  Credential::parse ──▶ log
//! ```
//!
//! Plays one card per reader through the same wiring the firmware uses,
//! including a deliberately corrupted frame on reader 3.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::Result;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, PinState};
use log::{info, warn};

use wiegand_periph::config::{DecoderConfig, MAX_READERS, ReaderPins};
use wiegand_periph::drivers::pin_change::{EdgeMode, PinChangeMux};
use wiegand_periph::ports::WiegandLine;
use wiegand_periph::wiegand::{Bit, Credential, Decoder, FrameAssembler, RawFrame, ReaderId};
use wiegand_periph::Error;

/// Wiegand bit period (pulse plus gap), ms.
const BIT_PERIOD_MS: u32 = 2;

// ── Simulated GPIO port ───────────────────────────────────────

/// One 32-pin port; a set bit is a HIGH pin.  Everything idles HIGH.
struct SimPort {
    levels: AtomicU32,
}

impl SimPort {
    const fn new() -> Self {
        Self {
            levels: AtomicU32::new(u32::MAX),
        }
    }

    fn levels(&self) -> u32 {
        self.levels.load(Ordering::Acquire)
    }

    fn set(&self, pin: u8, high: bool) {
        if high {
            self.levels.fetch_or(1 << pin, Ordering::AcqRel);
        } else {
            self.levels.fetch_and(!(1 << pin), Ordering::AcqRel);
        }
    }
}

static PORT: SimPort = SimPort::new();

struct SimLine {
    pin: u8,
}

impl ErrorType for SimLine {
    type Error = core::convert::Infallible;
}

impl InputPin for SimLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(PORT.levels() & (1 << self.pin) != 0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(PORT.levels() & (1 << self.pin) == 0)
    }
}

impl WiegandLine for SimLine {
    fn drive(&mut self, state: PinState) -> Result<(), Self::Error> {
        PORT.set(self.pin, state == PinState::High);
        Ok(())
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        PORT.set(self.pin, true);
        Ok(())
    }
}

struct SimDelay;

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

// ── Card playback ─────────────────────────────────────────────

/// Pulse every bit of `frame` onto a reader's lines, running the port ISR
/// on each transition.
fn play(mux: &mut PinChangeMux<'_, 8>, pins: ReaderPins, frame: &RawFrame, now_ms: &mut u32) {
    for bit in frame.bits_msb_first() {
        let pin = match bit {
            Bit::Zero => pins.zero,
            Bit::One => pins.one,
        };
        PORT.set(pin, false);
        mux.dispatch(PORT.levels());
        PORT.set(pin, true);
        mux.dispatch(PORT.levels());
        *now_ms = now_ms.wrapping_add(BIT_PERIOD_MS);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("wiegand-sim v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Config and decoder ─────────────────────────────────
    let config = DecoderConfig::default();
    config.validate()?;

    let lines: [(SimLine, SimLine); MAX_READERS] = core::array::from_fn(|i| {
        let pins = config.readers[i];
        (SimLine { pin: pins.zero }, SimLine { pin: pins.one })
    });
    let decoder: Decoder<SimLine, MAX_READERS> = Decoder::from_config(&config, lines)?;

    // ── 2. Bind every line to the port multiplexer ───────────
    let handlers: Vec<_> = decoder
        .ids()
        .flat_map(|id| {
            [
                decoder.edge_handler(id, Bit::Zero),
                decoder.edge_handler(id, Bit::One),
            ]
        })
        .collect();

    let mut mux: PinChangeMux<'_, 8> = PinChangeMux::new();
    mux.seed(PORT.levels());
    for (pins, pair) in config.readers.iter().zip(handlers.chunks(2)) {
        mux.attach(pins.zero, &pair[0], EdgeMode::Falling)
            .map_err(Error::from)?;
        mux.attach(pins.one, &pair[1], EdgeMode::Falling)
            .map_err(Error::from)?;
    }

    // ── 3. Arm readers (lines masked during the glitch) ──────
    decoder.initialize_all(&mut SimDelay, &mut mux)?;
    mux.seed(PORT.levels());

    // ── 4. Present one card per reader ───────────────────────
    let good = RawFrame::h10301(12, 34_567);
    let cards = [
        good,
        RawFrame::wiegand34(0x0102, 4242),
        RawFrame::new(good.code() ^ (1 << 3), good.bits()),
    ];

    let mut assembler = FrameAssembler::<MAX_READERS>::from_config(&config);
    let mut frames = Vec::new();
    let mut now_ms: u32 = 0;

    for (idx, frame) in cards.iter().enumerate() {
        let id = ReaderId::new(idx as u8);
        info!("card presented at reader {} ({} bits)", id, frame.bits());
        play(&mut mux, config.readers[idx], frame, &mut now_ms);
        frames.extend(assembler.poll_all(&decoder, now_ms));
    }

    // ── 5. Let the lines go quiet and collect the rest ───────
    for _ in 0..2 {
        now_ms = now_ms.wrapping_add(config.frame_timeout_ms);
        frames.extend(assembler.poll_all(&decoder, now_ms));
    }

    for (id, frame) in frames {
        if frame.bits() != u32::from(config.frame_bits) {
            info!(
                "reader {}: {}-bit frame, board expects {}",
                id,
                frame.bits(),
                config.frame_bits
            );
        }
        match Credential::parse(&frame) {
            Ok(cred) => info!(
                "reader {}: {:?} facility={} card={} fob={}",
                id,
                cred.format,
                cred.facility,
                cred.card,
                cred.fob_number()
            ),
            Err(e) => warn!(
                "reader {}: rejected {}-bit frame 0x{:X}: {}",
                id,
                frame.bits(),
                frame.code(),
                e
            ),
        }
    }

    for id in decoder.ids() {
        info!(
            "reader {} idle: bits={} line_faults={}",
            id,
            decoder.bit_count(id).unwrap_or_default(),
            decoder.line_faults(id).unwrap_or_default()
        );
    }
    Ok(())
}
