#![no_main]

use inventura_core::numeric::{format_quantity, parse_quantity};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let value = parse_quantity(text);
    assert!(value.is_finite(), "parse_quantity({text:?}) = {value}");

    // Display form must parse back to the same quantity.
    let shown = format_quantity(value);
    assert_eq!(parse_quantity(&shown).to_bits(), value.to_bits(), "{shown}");
});
