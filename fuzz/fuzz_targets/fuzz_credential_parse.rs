//! Fuzz target: `Credential::parse`
//!
//! Any (code, length) pair must parse or be rejected without panicking,
//! and an accepted credential must re-encode to the same frame.
//!
//! cargo fuzz run fuzz_credential_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use wiegand_periph::wiegand::{Credential, CredentialFormat, RawFrame};

fuzz_target!(|data: &[u8]| {
    if data.len() < 12 {
        return;
    }
    let mut code = [0u8; 8];
    code.copy_from_slice(&data[..8]);
    let mut bits = [0u8; 4];
    bits.copy_from_slice(&data[8..12]);
    let frame = RawFrame::new(u64::from_le_bytes(code), u32::from_le_bytes(bits));

    let Ok(cred) = Credential::parse(&frame) else {
        return;
    };
    let rebuilt = match cred.format {
        CredentialFormat::H10301 => RawFrame::h10301(cred.facility as u8, cred.card as u16),
        CredentialFormat::Wiegand34 => RawFrame::wiegand34(cred.facility as u16, cred.card as u16),
    };
    let width = frame.bits();
    let mask = (1u64 << width) - 1;
    assert_eq!(rebuilt.bits(), width);
    assert_eq!(rebuilt.code(), frame.code() & mask);
});
