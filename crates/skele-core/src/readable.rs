//! Readable key encoding
//!
//! Turns raw key bytes into something a person can type without squinting:
//!
//! ```text
//! ee0fca521b5fdbfe60f7 ──base32──▶ xr7wmmgvbzdzwr7q ──group──▶ Xr7w-Mmgv-Bzdz-Wr7q
//! ```
//!
//! The alphabet is Crockford's base-32 in lowercase: digits and letters with
//! `i`, `l`, `o` and `u` left out. Within each group the first letter is
//! uppercased so that the result satisfies the usual "needs a capital letter"
//! password rules.
//!
//! The symbol table and bit order are part of the output format. Changing
//! either changes every password.

use crate::chain::DERIVED_KEY_LEN;
use crate::{Result, SkeleError};

/// Symbols per group in the readable form
pub const GROUP_SIZE: usize = 4;

/// Length of a readable key: 16 symbols plus 3 dashes
pub const READABLE_LEN: usize = 19;

/// Raw base-32 encoding with the lowercase Crockford alphabet.
pub mod base32 {
    use crate::{Result, SkeleError};

    /// 5-bit value → symbol
    pub const ALPHABET: [u8; 32] = *b"0123456789abcdefghjkmnpqrstvwxyz";

    const BLOCK_BYTES: usize = 5;
    const BLOCK_SYMBOLS: usize = 8;

    /// Number of symbols produced for `input_len` bytes.
    pub fn encoded_len(input_len: usize) -> usize {
        input_len / BLOCK_BYTES * BLOCK_SYMBOLS
    }

    /// Whether `c` is a symbol of the alphabet (lowercase only).
    pub fn is_symbol(c: char) -> bool {
        c.is_ascii() && ALPHABET.contains(&(c as u8))
    }

    #[rustfmt::skip]
    fn split_block(q: &[u8]) -> [u8; BLOCK_SYMBOLS] {
        [
             q[0] >> 3,
            ((q[0] & 0b0000_0111) << 2) | (q[1] >> 6),
             (q[1] & 0b0011_1110) >> 1,
            ((q[1] & 0b0000_0001) << 4) | (q[2] >> 4),
            ((q[2] & 0b0000_1111) << 1) | (q[3] >> 7),
             (q[3] & 0b0111_1100) >> 2,
            ((q[3] & 0b0000_0011) << 3) | (q[4] >> 5),
              q[4] & 0b0001_1111,
        ]
    }

    /// Encode `input`, most significant bit first, 5 bytes to 8 symbols.
    ///
    /// # Errors
    /// `InvalidInput` if the length is not a multiple of 5. No padding is
    /// ever produced.
    pub fn encode(input: &[u8]) -> Result<String> {
        if input.len() % BLOCK_BYTES != 0 {
            return Err(SkeleError::InvalidInput(format!(
                "base-32 input must be a multiple of {} bytes, got {}",
                BLOCK_BYTES,
                input.len()
            )));
        }

        let mut out = String::with_capacity(encoded_len(input.len()));
        for block in input.chunks_exact(BLOCK_BYTES) {
            for value in split_block(block) {
                out.push(ALPHABET[value as usize] as char);
            }
        }
        Ok(out)
    }
}

/// Encode a derived key into its readable form, e.g. `Xr7w-Mmgv-Bzdz-Wr7q`.
///
/// # Errors
/// `InvalidInput` unless `key` is exactly 10 bytes.
pub fn encode(key: &[u8]) -> Result<String> {
    if key.len() != DERIVED_KEY_LEN {
        return Err(SkeleError::InvalidInput(format!(
            "key must be {} bytes, got {}",
            DERIVED_KEY_LEN,
            key.len()
        )));
    }
    format_key(key, GROUP_SIZE)
}

/// Base-32 encode `key` and split it into capitalized groups of
/// `group_size` symbols. A trailing short group is kept as is.
///
/// # Errors
/// `InvalidInput` if `group_size` is zero or the key length is not a
/// multiple of 5.
pub fn format_key(key: &[u8], group_size: usize) -> Result<String> {
    if group_size == 0 {
        return Err(SkeleError::InvalidInput("group size must be positive".into()));
    }
    let symbols = base32::encode(key)?;
    Ok(group(&symbols, group_size))
}

/// Normalize a hand-typed key to its canonical readable form.
///
/// Dashes and whitespace are dropped, case is ignored and the look-alikes
/// Crockford excludes are read as the digits they resemble (`o` as `0`, `i`
/// and `l` as `1`). The result is regrouped and capitalized exactly as
/// [`encode`] does, so `canonicalize(encode(k)) == encode(k)`.
///
/// # Errors
/// `InvalidInput` on any other character (including `u`), or when the
/// symbol count is not a positive multiple of 8.
pub fn canonicalize(input: &str) -> Result<String> {
    let mut symbols = String::with_capacity(input.len());
    for c in input.chars() {
        if c == '-' || c.is_whitespace() {
            continue;
        }
        let c = match c.to_ascii_lowercase() {
            'o' => '0',
            'i' | 'l' => '1',
            other => other,
        };
        if !base32::is_symbol(c) {
            return Err(SkeleError::InvalidInput(format!(
                "'{}' is not a key symbol",
                c
            )));
        }
        symbols.push(c);
    }

    if symbols.is_empty() || symbols.len() % 8 != 0 {
        return Err(SkeleError::InvalidInput(format!(
            "key must have a multiple of 8 symbols, got {}",
            symbols.len()
        )));
    }
    Ok(group(&symbols, GROUP_SIZE))
}

/// Uppercase the first alphabetic character of `group`, if any.
pub fn capitalize_first(group: &str) -> String {
    let mut out = String::with_capacity(group.len());
    let mut done = false;
    for c in group.chars() {
        if !done && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            done = true;
        } else {
            out.push(c);
        }
    }
    out
}

// `symbols` is ASCII, so byte chunks are char chunks.
fn group(symbols: &str, group_size: usize) -> String {
    symbols
        .as_bytes()
        .chunks(group_size)
        .map(|chunk| capitalize_first(&String::from_utf8_lossy(chunk)))
        .collect::<Vec<_>>()
        .join("-")
}
