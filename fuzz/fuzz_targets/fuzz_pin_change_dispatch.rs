//! Fuzz target: `PinChangeMux::dispatch` driving a live decoder
//!
//! Each 4-byte chunk is one port sample.  Whatever the sequence, the mux
//! never runs more handlers than it has bindings, and a reader only ever
//! counts bits it actually saw on its own lines.
//!
//! cargo fuzz run fuzz_pin_change_dispatch

#![no_main]

use core::cell::Cell;
use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, PinState};
use libfuzzer_sys::fuzz_target;
use wiegand_periph::config::ReaderPins;
use wiegand_periph::drivers::pin_change::{EdgeMode, PinChangeMux};
use wiegand_periph::ports::WiegandLine;
use wiegand_periph::wiegand::{Bit, Decoder, Reader, ReaderId};

struct PortLine<'p> {
    port: &'p Cell<u32>,
    pin: u8,
}

impl ErrorType for PortLine<'_> {
    type Error = Infallible;
}

impl InputPin for PortLine<'_> {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.port.get() & (1 << self.pin) != 0)
    }
    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.port.get() & (1 << self.pin) == 0)
    }
}

impl WiegandLine for PortLine<'_> {
    fn drive(&mut self, _state: PinState) -> Result<(), Infallible> {
        Ok(())
    }
    fn release(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let port = Cell::new(u32::MAX);
    let pins = ReaderPins { zero: 4, one: 5 };
    let decoder = Decoder::new(
        [Reader::new(
            pins,
            PortLine { port: &port, pin: pins.zero },
            PortLine { port: &port, pin: pins.one },
        )],
        10,
    );
    let id = ReaderId::new(0);
    let zero = decoder.edge_handler(id, Bit::Zero);
    let one = decoder.edge_handler(id, Bit::One);

    let mut mux: PinChangeMux<'_, 2> = PinChangeMux::new();
    mux.seed(port.get());
    mux.attach(pins.zero, &zero, EdgeMode::Falling).expect("pin in range");
    mux.attach(pins.one, &one, EdgeMode::Falling).expect("pin in range");

    let mut falls = 0u32;
    for chunk in data.chunks_exact(4) {
        let levels = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let prev = port.get();
        port.set(levels);
        for pin in [pins.zero, pins.one] {
            let bit = 1u32 << pin;
            if prev & bit != 0 && levels & bit == 0 {
                falls += 1;
            }
        }
        assert!(mux.dispatch(levels) <= 2);
    }

    assert_eq!(decoder.bit_count(id), Some(falls));
});
