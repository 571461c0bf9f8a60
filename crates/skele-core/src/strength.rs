//! Skeleton key strength estimation
//!
//! Every password Skele hands out is only as strong as the skeleton key
//! behind it, so the CLI warns when the passphrase looks guessable. This is
//! a warning system, not a gate: a weak key still works.
//!
//! | Strength  | Bits     |
//! |-----------|----------|
//! | Dangerous | < 28     |
//! | Weak      | 28 – 35  |
//! | Fair      | 36 – 59  |
//! | Strong    | 60 – 127 |
//! | Excellent | ≥ 128    |
//!
//! The estimate is deliberately crude: character classes times length,
//! minus penalties for repetition and runs, plus a bonus for multi-word
//! passphrases of the diceware kind.

use std::collections::HashSet;

/// Bits below which the CLI prints a warning
pub const RECOMMENDED_BITS: f64 = 60.0;

/// Keys shorter than this lose bits in proportion
const SHORT_LEN: usize = 12;

/// Fewer words than this and the word bonus does not apply
const PASSPHRASE_MIN_WORDS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    Dangerous,
    Weak,
    Fair,
    Strong,
    Excellent,
}

impl Strength {
    fn from_bits(bits: f64) -> Self {
        match bits {
            b if b < 28.0 => Self::Dangerous,
            b if b < 36.0 => Self::Weak,
            b if b < RECOMMENDED_BITS => Self::Fair,
            b if b < 128.0 => Self::Strong,
            _ => Self::Excellent,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Dangerous => "dangerous",
            Self::Weak => "weak",
            Self::Fair => "fair",
            Self::Strong => "strong",
            Self::Excellent => "excellent",
        }
    }

    pub fn is_recommended(&self) -> bool {
        *self >= Self::Strong
    }
}

/// Things that lowered the estimate, for display next to the warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weakness {
    Empty,
    Short,
    Repetitive,
    Sequential,
    SingleClass,
}

impl Weakness {
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Empty => "the skeleton key is empty",
            Self::Short => "the skeleton key is shorter than 12 characters",
            Self::Repetitive => "the skeleton key repeats the same characters",
            Self::Sequential => "the skeleton key contains runs like abc or 321",
            Self::SingleClass => "the skeleton key uses a single character class",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Estimate {
    pub bits: f64,
    pub strength: Strength,
    pub weaknesses: Vec<Weakness>,
}

/// Estimate the entropy of a skeleton key passphrase.
///
/// ```
/// use skele_core::strength::{estimate, Strength};
/// assert!(estimate("correct horse battery staple").strength >= Strength::Strong);
/// assert_eq!(estimate("hunter2").strength, Strength::Dangerous);
/// ```
pub fn estimate(passphrase: &str) -> Estimate {
    let chars: Vec<char> = passphrase.chars().collect();
    if chars.is_empty() {
        return Estimate {
            bits: 0.0,
            strength: Strength::Dangerous,
            weaknesses: vec![Weakness::Empty],
        };
    }

    let mut weaknesses = Vec::new();
    let len = chars.len() as f64;

    let pool = charset_size(&chars);
    let mut bits = len * pool.log2();

    let distinct = chars.iter().collect::<HashSet<_>>().len() as f64;
    if distinct / len < 0.5 {
        bits *= 0.5 + distinct / len;
        weaknesses.push(Weakness::Repetitive);
    }

    let runs = sequential_triples(&chars);
    if runs > 2 {
        bits -= 2.0 * runs as f64;
        weaknesses.push(Weakness::Sequential);
    }

    if classes(&chars) == 1 {
        bits *= 0.85;
        weaknesses.push(Weakness::SingleClass);
    }

    let words = passphrase.split_whitespace().count();
    if words >= PASSPHRASE_MIN_WORDS {
        bits += 3.0 * (words - PASSPHRASE_MIN_WORDS + 1) as f64;
    }

    if chars.len() < SHORT_LEN {
        bits *= len / SHORT_LEN as f64;
        weaknesses.push(Weakness::Short);
    }

    let bits = bits.max(0.0);
    Estimate {
        bits,
        strength: Strength::from_bits(bits),
        weaknesses,
    }
}

fn charset_size(chars: &[char]) -> f64 {
    let mut size = 0.0;
    if chars.iter().any(|c| c.is_ascii_lowercase()) {
        size += 26.0;
    }
    if chars.iter().any(|c| c.is_ascii_uppercase()) {
        size += 26.0;
    }
    if chars.iter().any(|c| c.is_ascii_digit()) {
        size += 10.0;
    }
    if chars.iter().any(|c| c.is_ascii_punctuation() || *c == ' ') {
        size += 33.0;
    }
    if chars.iter().any(|c| !c.is_ascii()) {
        size += 100.0;
    }
    f64::max(size, 2.0)
}

fn classes(chars: &[char]) -> usize {
    let tests: [fn(&char) -> bool; 4] = [
        |c| c.is_ascii_lowercase(),
        |c| c.is_ascii_uppercase(),
        |c| c.is_ascii_digit(),
        |c| !c.is_ascii_alphanumeric(),
    ];
    tests.iter().filter(|t| chars.iter().any(|c| t(c))).count()
}

fn sequential_triples(chars: &[char]) -> usize {
    chars
        .windows(3)
        .filter(|w| {
            let (a, b, c) = (w[0] as i64, w[1] as i64, w[2] as i64);
            (b - a == 1 && c - b == 1) || (a - b == 1 && b - c == 1)
        })
        .count()
}
