//! Fuzz target for custom rule queries.
//!
//! Compiling and evaluating arbitrary queries against a small table must
//! return errors, never panic.

#![no_main]

use framecheck::custom::RowPredicate;
use framecheck::{DataTable, Value};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 4_096 {
        return;
    }

    let Ok(query) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(table) = DataTable::from_rows(
        &["age", "status", "balance"],
        vec![
            vec![Value::Int(85), Value::from("A"), Value::Float(-1.5)],
            vec![Value::Int(i64::MAX), Value::Null, Value::Float(f64::NAN)],
            vec![Value::Null, Value::from("Z"), Value::Float(0.0)],
        ],
    ) else {
        return;
    };

    if let Ok(predicate) = RowPredicate::compile("fuzz", query, &table) {
        let _ = predicate.matching_rows(&table);
    }
});
