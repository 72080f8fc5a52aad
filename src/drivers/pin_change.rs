//! Pin-change interrupt multiplexer.
//!
//! Many MCUs raise one interrupt for "some pin on this port changed" rather
//! than one vector per pin.  The port ISR calls [`PinChangeMux::dispatch`]
//! with the port's input register; the mux diffs it against the previous
//! sample and runs the handler bound to every changed, enabled pin whose
//! edge mode matches.
//!
//! ```text
//!   port IRQ ──▶ dispatch(levels)
//!                  changed = levels ^ last
//!                  fired   = changed & enabled
//!                  for pin in fired (ascending):
//!                      Change  → call
//!                      Rising  → call if now HIGH
//!                      Falling → call if now LOW
//! ```
//!
//! Handlers are argument-less `Fn()`s.  The Wiegand decoder binds one per
//! line through [`Decoder::edge_handler`](crate::wiegand::Decoder::edge_handler).

use heapless::Vec;
use log::{debug, info};

use crate::error::PinChangeError;
use crate::pins::PORT_WIDTH;
use crate::ports::EdgeMask;

/// Which transitions fire a pin's handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMode {
    Rising,
    Falling,
    Change,
}

impl EdgeMode {
    fn matches(self, now_high: bool) -> bool {
        match self {
            Self::Change => true,
            Self::Rising => now_high,
            Self::Falling => !now_high,
        }
    }
}

struct Binding<'a> {
    pin: u8,
    mode: EdgeMode,
    handler: &'a dyn Fn(),
}

/// Fixed-capacity pin → handler table for one port.
pub struct PinChangeMux<'a, const CAP: usize> {
    bindings: Vec<Binding<'a>, CAP>,
    /// Bit `n` set = pin `n` is attached and not masked.
    enabled: u32,
    /// Port levels seen by the last dispatch.
    last: u32,
}

impl<'a, const CAP: usize> PinChangeMux<'a, CAP> {
    pub const fn new() -> Self {
        Self {
            bindings: Vec::new(),
            enabled: 0,
            last: 0,
        }
    }

    /// Set the level baseline, normally from one port read at boot.
    pub fn seed(&mut self, levels: u32) {
        self.last = levels;
    }

    /// Bind `handler` to `pin`, replacing any earlier binding, and enable it.
    pub fn attach(
        &mut self,
        pin: u8,
        handler: &'a dyn Fn(),
        mode: EdgeMode,
    ) -> Result<(), PinChangeError> {
        let bit = pin_bit(pin)?;

        if let Some(existing) = self.bindings.iter_mut().find(|b| b.pin == pin) {
            existing.mode = mode;
            existing.handler = handler;
        } else {
            self.bindings
                .push(Binding { pin, mode, handler })
                .map_err(|_| PinChangeError::TableFull)?;
        }

        self.enabled |= bit;
        info!("pcint: GPIO{} attached ({:?})", pin, mode);
        Ok(())
    }

    /// Remove `pin`'s handler.  The pin stops firing immediately.
    pub fn detach(&mut self, pin: u8) -> Result<(), PinChangeError> {
        let bit = pin_bit(pin)?;
        let idx = self
            .bindings
            .iter()
            .position(|b| b.pin == pin)
            .ok_or(PinChangeError::NotAttached(pin))?;

        self.bindings.swap_remove(idx);
        self.enabled &= !bit;
        info!("pcint: GPIO{} detached", pin);
        Ok(())
    }

    pub fn is_attached(&self, pin: u8) -> bool {
        self.bindings.iter().any(|b| b.pin == pin)
    }

    pub fn is_enabled(&self, pin: u8) -> bool {
        pin_bit(pin).is_ok_and(|bit| self.enabled & bit != 0)
    }

    /// Port ISR body.  Returns how many handlers ran.
    ///
    /// The baseline is refreshed for every pin, masked or not, so a pin
    /// that toggles while masked does not fire once unmasked.
    pub fn dispatch(&mut self, levels: u32) -> usize {
        let fired = (levels ^ self.last) & self.enabled;
        self.last = levels;
        if fired == 0 {
            return 0;
        }

        let mut calls = 0;
        for pin in 0..PORT_WIDTH {
            let bit = 1u32 << pin;
            if fired & bit == 0 {
                continue;
            }
            let Some(binding) = self.bindings.iter().find(|b| b.pin == pin) else {
                continue;
            };
            if binding.mode.matches(levels & bit != 0) {
                (binding.handler)();
                calls += 1;
            }
        }
        calls
    }
}

impl<const CAP: usize> Default for PinChangeMux<'_, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize> EdgeMask for PinChangeMux<'_, CAP> {
    fn mask(&mut self, pin: u8) {
        if let Ok(bit) = pin_bit(pin) {
            self.enabled &= !bit;
            debug!("pcint: GPIO{} masked", pin);
        }
    }

    fn unmask(&mut self, pin: u8) {
        if self.is_attached(pin) {
            if let Ok(bit) = pin_bit(pin) {
                self.enabled |= bit;
                debug!("pcint: GPIO{} unmasked", pin);
            }
        }
    }
}

fn pin_bit(pin: u8) -> Result<u32, PinChangeError> {
    if pin >= PORT_WIDTH {
        return Err(PinChangeError::PinOutOfRange(pin));
    }
    Ok(1u32 << pin)
}
