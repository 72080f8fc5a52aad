//! Fuzz target: `DecoderConfig::from_bytes`
//!
//! Arbitrary bytes must either be rejected or decode to a config that
//! passes validation and survives a re-encode.
//!
//! cargo fuzz run fuzz_config_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use wiegand_periph::config::DecoderConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = DecoderConfig::from_bytes(data) else {
        return;
    };
    assert!(config.validate().is_ok(), "from_bytes returned an invalid config");

    let mut buf = [0u8; 64];
    let len = config.to_bytes(&mut buf).expect("valid config must encode");
    let again = DecoderConfig::from_bytes(&buf[..len]).expect("re-decode");
    assert_eq!(again, config);
});
