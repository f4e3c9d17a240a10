//! Fuzz target for the data parser and discovery.
//!
//! Parsing, type optimization and discovery must never panic on malformed
//! delimited text.

#![no_main]

use framecheck::{Discoverer, Parser, ReadOptions, TypeOptimizer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for delimiter in [b',', b'\t', b';'] {
        if let Ok(table) = Parser::new().parse_str(text, delimiter, &ReadOptions::new()) {
            let table = TypeOptimizer::new().optimize(&table);
            let _ = Discoverer::new().discover(&table);
        }
    }
});
