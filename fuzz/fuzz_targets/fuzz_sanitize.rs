//! Fuzz testing for JSON body sanitization.
//!
//! After sanitizing, no object key anywhere in the document may start with
//! `$` or contain `.`, and no string may contain a raw `<`.
//!
//! ```bash
//! cargo +nightly fuzz run fuzz_sanitize -- -max_total_time=60
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use portfolio_api::middleware::sanitize::sanitize_value;
use serde_json::Value;

fn assert_clean(value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                assert!(!key.starts_with('$') && !key.contains('.'), "key {key:?} kept");
                assert_clean(child);
            }
        }
        Value::Array(items) => items.iter().for_each(assert_clean),
        Value::String(s) => assert!(!s.contains('<'), "string {s:?} not escaped"),
        _ => {}
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(mut value) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    sanitize_value(&mut value);
    assert_clean(&value);
});
