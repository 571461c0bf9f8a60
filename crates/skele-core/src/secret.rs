//! Skeleton key handling
//!
//! The skeleton key is the SHA-256 of the passphrase the user remembers. It
//! lives in a heap box that is mlocked where the platform allows and zeroed
//! on drop. It is never printed; the fingerprint exists so a user can check
//! they typed the passphrase they meant to.

use sha2::digest::generic_array::GenericArray;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::chain::{self, DerivedKey, KeyChain};
use crate::{memory, readable, Result};

/// Length of the skeleton key in bytes
pub const SKELETON_KEY_LEN: usize = 32;

/// Length of the fingerprint in bytes
pub const FINGERPRINT_LEN: usize = 5;

/// The fingerprint is shown as one group of 8 symbols
const FINGERPRINT_GROUP_SIZE: usize = 8;

/// Domain separation for the fingerprint hash
const FINGERPRINT_SALT: [u8; 32] = [
    0x15, 0x01, 0x8a, 0x3e, 0x8e, 0x79, 0x28, 0x71, 0x43, 0x70, 0xf7, 0x51, 0x1c, 0x3b, 0xd5, 0xce,
    0x85, 0x2b, 0x6f, 0x91, 0x52, 0xc2, 0xb9, 0xab, 0xdb, 0x99, 0xaa, 0xd7, 0x9f, 0xc5, 0x51, 0x20,
];

/// The 32-byte secret every derived key originates from.
pub struct SkeletonKey {
    bytes: Box<[u8; SKELETON_KEY_LEN]>,
    locked: bool,
}

impl SkeletonKey {
    fn zeroed() -> Self {
        let bytes = Box::new([0u8; SKELETON_KEY_LEN]);
        // SAFETY: the box is a live allocation of exactly this length and is
        // unlocked in `Drop` before it is freed.
        let locked = unsafe { memory::mlock(bytes.as_ptr(), bytes.len()) };
        if !locked {
            log::debug!("skeleton key memory is not locked");
        }
        Self { bytes, locked }
    }

    /// Hash a passphrase (its UTF-8 bytes) into a skeleton key.
    ///
    /// # Example
    /// ```
    /// use skele_core::SkeletonKey;
    /// let key = SkeletonKey::from_passphrase("foo bar baz");
    /// assert_eq!(key.as_bytes()[0], 0xdb);
    /// ```
    pub fn from_passphrase(passphrase: &str) -> Self {
        let mut key = Self::zeroed();
        let mut hasher = Sha256::new();
        hasher.update(passphrase.as_bytes());
        hasher.finalize_into(GenericArray::from_mut_slice(&mut key.bytes[..]));
        key
    }

    /// Wrap an already hashed key. The argument is zeroed after copying.
    pub fn from_bytes(mut bytes: [u8; SKELETON_KEY_LEN]) -> Self {
        let mut key = Self::zeroed();
        key.bytes.copy_from_slice(&bytes);
        bytes.zeroize();
        key
    }

    pub fn as_bytes(&self) -> &[u8; SKELETON_KEY_LEN] {
        &self.bytes
    }

    /// Whether the key's memory is currently mlocked.
    pub fn is_locked(&self) -> bool {
        self.locked && memory::is_locked(self.bytes.as_ptr())
    }

    /// First 5 bytes of SHA-256(key || salt).
    pub fn fingerprint(&self) -> [u8; FINGERPRINT_LEN] {
        let digest = Sha256::new()
            .chain_update(self.as_bytes())
            .chain_update(FINGERPRINT_SALT)
            .finalize();
        let mut fingerprint = [0u8; FINGERPRINT_LEN];
        fingerprint.copy_from_slice(&digest[..FINGERPRINT_LEN]);
        fingerprint
    }

    /// Fingerprint as a single capitalized group, e.g. `9Ygh1tcz`.
    pub fn fingerprint_readable(&self) -> Result<String> {
        readable::format_key(&self.fingerprint(), FINGERPRINT_GROUP_SIZE)
    }
}

impl Drop for SkeletonKey {
    fn drop(&mut self) {
        (*self.bytes).zeroize();
        if self.locked {
            // SAFETY: same pointer and length that were locked in `zeroed`.
            unsafe {
                memory::munlock(self.bytes.as_ptr(), self.bytes.len());
            }
        }
    }
}

impl std::fmt::Debug for SkeletonKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SkeletonKey([REDACTED])")
    }
}

/// A skeleton key together with how many keys to hand out per request.
///
/// This is the whole state of an interactive session; pass it to whatever
/// drives the prompts instead of keeping the key anywhere global.
#[derive(Debug)]
pub struct KeySource {
    key: SkeletonKey,
    count: usize,
}

impl KeySource {
    /// # Errors
    /// `InvalidInput` if `count` is zero or above
    /// [`MAX_DERIVE_COUNT`](crate::chain::MAX_DERIVE_COUNT).
    pub fn new(key: SkeletonKey, count: usize) -> Result<Self> {
        chain::check_count(count)?;
        Ok(Self { key, count })
    }

    pub fn from_passphrase(passphrase: &str, count: usize) -> Result<Self> {
        Self::new(SkeletonKey::from_passphrase(passphrase), count)
    }

    pub fn skeleton_key(&self) -> &SkeletonKey {
        &self.key
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// The unbounded chain for this service and user.
    pub fn keys(&self, service: &str, user: &str) -> KeyChain<'_> {
        KeyChain::new(&self.key, service, user)
    }

    pub fn derive(&self, service: &str, user: &str) -> Result<Vec<DerivedKey>> {
        chain::derive(&self.key, service, user, self.count)
    }

    /// `count` keys in their readable form.
    pub fn readable_keys(&self, service: &str, user: &str) -> Result<Vec<String>> {
        self.derive(service, user)?
            .iter()
            .map(|key| readable::encode(key.as_bytes()))
            .collect()
    }
}
