//! Peripheral drivers that sit next to the decoder on the board.

pub mod ds1307;
pub mod pin_change;
