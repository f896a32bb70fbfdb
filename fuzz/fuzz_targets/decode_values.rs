#![no_main]

use inventura_core::cache::decode_values;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    // Corrupt cache contents degrade to an empty or partial map, never a panic.
    let values = decode_values(raw);
    let encoded = serde_json::to_string(&values).expect("value map serializes");
    assert_eq!(decode_values(&encoded), values);
});
