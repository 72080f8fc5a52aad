//! Port traits: the boundary between the decoder and the board HAL.
//!
//! ```text
//!   HAL pin / IRQ controller ──▶ Port trait ──▶ Decoder (domain)
//! ```
//!
//! Sampling comes straight from [`embedded_hal::digital::InputPin`]; the
//! traits here add the two things embedded-hal leaves to the HAL: switching
//! a pin between driven output and pulled-up input at runtime, and masking
//! a single pin's edge interrupt.

use embedded_hal::digital::{InputPin, PinState};

// ───────────────────────────────────────────────────────────────
// Data line
// ───────────────────────────────────────────────────────────────

/// One Wiegand data line.  Idles HIGH under the pull-up; a pulse is LOW.
pub trait WiegandLine: InputPin {
    /// Switch to push-pull output at `state`.
    fn drive(&mut self, state: PinState) -> Result<(), Self::Error>;

    /// Switch back to input with the passive pull-up enabled.
    fn release(&mut self) -> Result<(), Self::Error>;
}

// ───────────────────────────────────────────────────────────────
// Edge interrupt masking
// ───────────────────────────────────────────────────────────────

/// Per-pin edge interrupt masking.
///
/// Reader arming masks both of its lines for the glitch and the settle
/// delay so no handler observes a half-cleared accumulator.
pub trait EdgeMask {
    fn mask(&mut self, pin: u8);
    fn unmask(&mut self, pin: u8);
}

/// For hosts that arm reader interrupts only after the first
/// [`Decoder::initialize`](crate::wiegand::Decoder::initialize).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMask;

impl EdgeMask for NoMask {
    fn mask(&mut self, _pin: u8) {}
    fn unmask(&mut self, _pin: u8) {}
}

/// Masks a set of pins for its lifetime.
pub(crate) struct MaskGuard<'m, M: EdgeMask, const K: usize> {
    mask: &'m mut M,
    pins: [u8; K],
}

impl<'m, M: EdgeMask, const K: usize> MaskGuard<'m, M, K> {
    pub(crate) fn new(mask: &'m mut M, pins: [u8; K]) -> Self {
        for &pin in &pins {
            mask.mask(pin);
        }
        Self { mask, pins }
    }
}

impl<M: EdgeMask, const K: usize> Drop for MaskGuard<'_, M, K> {
    fn drop(&mut self) {
        for &pin in &self.pins {
            self.mask.unmask(pin);
        }
    }
}
