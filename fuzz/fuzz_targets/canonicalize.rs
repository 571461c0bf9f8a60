#![no_main]

use libfuzzer_sys::fuzz_target;
use skele_core::readable::canonicalize;

fuzz_target!(|data: &[u8]| {
    // Arbitrary hand-typed input must give Ok or Err, never panic, and an
    // accepted key must already be canonical.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(canonical) = canonicalize(s) {
            assert_eq!(canonicalize(&canonical).ok(), Some(canonical));
        }
    }
});
