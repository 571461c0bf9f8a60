//! Skele Core
//!
//! Deterministic per-service passwords from a single skeleton key.
//!
//! # Pipeline
//!
//! ```text
//! passphrase ──SHA-256──▶ SkeletonKey
//! SkeletonKey + service + user ──KeyChain──▶ DerivedKey, DerivedKey, …
//! DerivedKey ──readable::encode──▶ "Xr7w-Mmgv-Bzdz-Wr7q"
//! ```
//!
//! Nothing is stored: every key is recomputed on demand from the skeleton
//! key and the identifiers.
//!
//! # Library-only API
//!
//! The `skele` binary only prints keys. [`readable::canonicalize`] and
//! [`readable::base32`] are here for callers that read keys back, such as
//! password manager imports or tools that compare a hand-typed key with a
//! freshly derived one:
//!
//! ```
//! use skele_core::readable::canonicalize;
//!
//! assert_eq!(canonicalize("xr7w mmgv bzdz wr7q").unwrap(), "Xr7w-Mmgv-Bzdz-Wr7q");
//! ```
//!
//! # Example
//!
//! ```
//! use skele_core::{derive, readable, SkeletonKey};
//!
//! let secret = SkeletonKey::from_passphrase("foo bar baz");
//! let keys = derive(&secret, "example.com", "john", 2).unwrap();
//! assert_eq!(readable::encode(keys[0].as_bytes()).unwrap(), "Xr7w-Mmgv-Bzdz-Wr7q");
//! assert_eq!(readable::encode(keys[1].as_bytes()).unwrap(), "873S-Sj3y-653A-X6z1");
//! ```

pub mod chain;
pub mod memory;
pub mod readable;
pub mod secret;
pub mod strength;

pub use chain::{derive, derive_utf8, DerivedKey, KeyChain, DERIVED_KEY_LEN, MAX_DERIVE_COUNT};
pub use secret::{KeySource, SkeletonKey, SKELETON_KEY_LEN};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkeleError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, SkeleError>;
