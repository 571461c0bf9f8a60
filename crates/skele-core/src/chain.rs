//! Key chain derivation
//!
//! Produces an unbounded sequence of 80-bit keys from a skeleton key and an
//! identifier pair:
//!
//! ```text
//! H    = SHA-256 accumulator fed with  secret || service || user
//! D_i  = digest of H after i rounds (H keeps running)
//! K_i  = D_i[..10]
//! H   <- H fed with  secret || D_i
//! ```
//!
//! The secret is fed again on every round so that a leaked intermediate
//! digest cannot be used to extend the chain without it.

use sha2::digest::generic_array::GenericArray;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::secret::SkeletonKey;
use crate::{Result, SkeleError};

/// Length of a derived key in bytes (80 bits)
pub const DERIVED_KEY_LEN: usize = 10;

/// Most keys a single [`derive`] call hands out
pub const MAX_DERIVE_COUNT: usize = 1 << 16;

const DIGEST_LEN: usize = 32;

/// One derived key. Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; DERIVED_KEY_LEN]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Running hash chain for one (secret, service, user) triple.
///
/// Never ends; take as many keys as needed. The n-th item does not depend on
/// how many items are taken afterwards, so any prefix is stable.
pub struct KeyChain<'a> {
    secret: &'a SkeletonKey,
    hasher: Sha256,
}

impl<'a> KeyChain<'a> {
    pub fn new(secret: &'a SkeletonKey, service: &str, user: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hasher.update(service.as_bytes());
        hasher.update(user.as_bytes());
        Self { secret, hasher }
    }
}

impl Iterator for KeyChain<'_> {
    type Item = DerivedKey;

    fn next(&mut self) -> Option<DerivedKey> {
        // Sha256 consumes itself on finalize; peek through a clone so the
        // accumulator keeps running.
        let mut digest = Zeroizing::new([0u8; DIGEST_LEN]);
        self.hasher
            .clone()
            .finalize_into(GenericArray::from_mut_slice(&mut digest[..]));

        let mut key = [0u8; DERIVED_KEY_LEN];
        key.copy_from_slice(&digest[..DERIVED_KEY_LEN]);

        self.hasher.update(self.secret.as_bytes());
        self.hasher.update(digest.as_slice());

        Some(DerivedKey(key))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl std::iter::FusedIterator for KeyChain<'_> {}

/// Derive `count` keys for the given service and user.
///
/// # Errors
/// `InvalidInput` if `count` is zero or above [`MAX_DERIVE_COUNT`]. Use
/// [`KeyChain`] directly for longer runs.
pub fn derive(
    secret: &SkeletonKey,
    service: &str,
    user: &str,
    count: usize,
) -> Result<Vec<DerivedKey>> {
    check_count(count)?;
    Ok(KeyChain::new(secret, service, user).take(count).collect())
}

pub(crate) fn check_count(count: usize) -> Result<()> {
    if count < 1 {
        return Err(SkeleError::InvalidInput(
            "key count must be at least 1".into(),
        ));
    }
    if count > MAX_DERIVE_COUNT {
        return Err(SkeleError::InvalidInput(format!(
            "key count must be at most {}, got {}",
            MAX_DERIVE_COUNT, count
        )));
    }
    Ok(())
}

/// Like [`derive`], but for identifiers that arrive as raw bytes.
///
/// # Errors
/// `InvalidInput` if either identifier is not valid UTF-8 or `count` is out
/// of range.
pub fn derive_utf8(
    secret: &SkeletonKey,
    service: &[u8],
    user: &[u8],
    count: usize,
) -> Result<Vec<DerivedKey>> {
    let service = std::str::from_utf8(service).map_err(|e| {
        SkeleError::InvalidInput(format!("service name is not valid UTF-8: {}", e))
    })?;
    let user = std::str::from_utf8(user)
        .map_err(|e| SkeleError::InvalidInput(format!("user name is not valid UTF-8: {}", e)))?;
    derive(secret, service, user, count)
}
