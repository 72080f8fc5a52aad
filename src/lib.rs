//! Access-controller peripheral library.
//!
//! Exposes the Wiegand decoder and its neighbouring drivers for board
//! firmware and host-side tests.  Everything is `no_std` and heap-free;
//! board specifics come in through the embedded-hal traits and the port
//! traits in [`ports`].

#![cfg_attr(not(test), no_std)]
#![deny(unused_must_use)]

pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod ports;
pub mod wiegand;

pub use error::{Error, Result};
