//! Fuzz testing for field validators and CSRF token verification.
//!
//! Every validator must return a `Result` for any input string and never
//! panic, including on multi-byte characters at length boundaries.
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! # Install cargo-fuzz (requires nightly)
//! cargo +nightly install cargo-fuzz
//!
//! # Run the validation fuzz target
//! cargo +nightly fuzz run fuzz_validation
//!
//! # Run with a time limit (e.g., 60 seconds)
//! cargo +nightly fuzz run fuzz_validation -- -max_total_time=60
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use portfolio_api::middleware::CsrfProtection;
use portfolio_api::validation::{
    MAX_NAME_LENGTH, validate_email, validate_http_url, validate_technologies, validate_text,
};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    let _ = validate_text("name", "Name", s, MAX_NAME_LENGTH);

    if let Ok(email) = validate_email(s) {
        assert!(email.contains('@'));
    }

    if let Ok(Some(url)) = validate_http_url("projectUrl", Some(s)) {
        assert!(url.to_ascii_lowercase().starts_with("http"));
    }

    let tags: Vec<String> = s.split(',').map(str::to_string).collect();
    let _ = validate_technologies(&tags);

    // Arbitrary tokens must not verify against a fresh secret
    let secret = CsrfProtection::generate_secret();
    assert!(!CsrfProtection::verify(&secret, s));
});
