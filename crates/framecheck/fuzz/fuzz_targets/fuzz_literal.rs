//! Fuzz target for the value_range set literal reader.
//!
//! Whatever parses must render and parse back to the same values.

#![no_main]

use framecheck::schema::{parse_set, render_set};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(values) = parse_set(text) {
        // NaN floats never compare equal, so only check the length.
        let reparsed = parse_set(&render_set(&values)).expect("rendered set must parse");
        assert_eq!(reparsed.len(), values.len());
    }
});
