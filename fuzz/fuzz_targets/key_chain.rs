#![no_main]

use libfuzzer_sys::fuzz_target;
use skele_core::{derive_utf8, readable, SkeletonKey, DERIVED_KEY_LEN};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    // First byte picks the split between service and user
    let split = 1 + data[0] as usize % (data.len() - 1);
    let (service, user) = data[1..].split_at(split - 1);

    let secret = SkeletonKey::from_passphrase("fuzz");
    if let Ok(keys) = derive_utf8(&secret, service, user, 3) {
        for key in &keys {
            assert_eq!(key.as_bytes().len(), DERIVED_KEY_LEN);
            let shown = readable::encode(key.as_bytes()).expect("10-byte key encodes");
            assert_eq!(readable::canonicalize(&shown).ok(), Some(shown));
        }
    }

    // Raw 10-byte slices encode too
    if data.len() >= DERIVED_KEY_LEN {
        let _ = readable::encode(&data[..DERIVED_KEY_LEN]).expect("10-byte input encodes");
    }
});
