//! Cross-implementation compatibility vectors.
//!
//! These strings are what earlier releases printed. If any of them changes,
//! every password users derived with those releases changes too.

use skele_core::{derive, readable, KeySource, SkeleError, SkeletonKey};

fn as_readable(keys: &[skele_core::DerivedKey]) -> Vec<String> {
    keys.iter()
        .map(|k| readable::encode(k.as_bytes()).unwrap())
        .collect()
}

#[test]
fn test_readme_transcript() {
    let secret = SkeletonKey::from_passphrase("foo bar baz");
    let keys = derive(&secret, "example.com", "john", 5).unwrap();
    assert_eq!(
        as_readable(&keys),
        vec![
            "Xr7w-Mmgv-Bzdz-Wr7q",
            "873S-Sj3y-653A-X6z1",
            "4Wzy-Kks2-Z98y-S5sn",
            "Ajkc-6Cyk-Txnb-Mrtw",
            "Dxmw-1Xmy-As0t-V2dc",
        ]
    );
}

#[test]
fn test_raw_secret_gives_same_vector() {
    let mut raw = [0u8; 32];
    hex_into(
        "dbd318c1c462aee872f41109a4dfd3048871a03dedd0fe0e757ced57dad6f2d7",
        &mut raw,
    );
    let secret = SkeletonKey::from_bytes(raw);
    let keys = derive(&secret, "example.com", "john", 1).unwrap();
    assert_eq!(as_readable(&keys), vec!["Xr7w-Mmgv-Bzdz-Wr7q"]);
}

#[test]
fn test_domain_identity_vector() {
    let source = KeySource::from_passphrase("secret skeleton passphrase", 1).unwrap();
    assert_eq!(
        source.readable_keys("domain", "identity").unwrap(),
        vec!["5Wsc-X2mz-Csnc-4Vgc"]
    );
}

#[test]
fn test_larger_count_extends_readme_vector() {
    let source = KeySource::from_passphrase("foo bar baz", 20).unwrap();
    let keys = source.readable_keys("example.com", "john").unwrap();
    assert_eq!(keys.len(), 20);
    assert_eq!(keys[0], "Xr7w-Mmgv-Bzdz-Wr7q");
    assert_eq!(keys[4], "Dxmw-1Xmy-As0t-V2dc");
}

#[test]
fn test_invalid_inputs_are_rejected() {
    let secret = SkeletonKey::from_passphrase("foo bar baz");
    assert!(matches!(
        derive(&secret, "example.com", "john", 0),
        Err(SkeleError::InvalidInput(_))
    ));
    assert!(matches!(
        readable::encode(&[0u8; 9]),
        Err(SkeleError::InvalidInput(_))
    ));
    assert!(matches!(
        readable::encode(&[0u8; 11]),
        Err(SkeleError::InvalidInput(_))
    ));
}

#[test]
fn test_error_message() {
    let err = readable::encode(&[0u8; 9]).unwrap_err();
    assert_eq!(err.to_string(), "Invalid input: key must be 10 bytes, got 9");
}

fn hex_into(s: &str, out: &mut [u8]) {
    out.copy_from_slice(&hex::decode(s).unwrap());
}
