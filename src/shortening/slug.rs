//! Keyed, deterministic slug derivation.
//!
//! A slug is derived from the HMAC-SHA-256 of the long URL under a secret
//! shortening key. The 256-bit digest is read as an unsigned integer and
//! expanded into digits of the alphabet's base. Only digits fully determined
//! by the 256 bits are used; they are split into non-overlapping windows of
//! `length` digits and the retry index picks the window. A collision retry
//! therefore yields a fresh candidate without rehashing.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Default slug alphabet: base58 without the visually ambiguous `0`, `O`, `I`, `l`.
pub const DEFAULT_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

pub const DEFAULT_SLUG_LENGTH: usize = 7;

const HASH_BITS: f64 = 256.0;

/// Symbols that would break a slug when used as a path segment.
const FORBIDDEN_SYMBOLS: &[u8] = b"/?#%";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    #[error("shortening key must be exactly 64 hex digits")]
    InvalidKey,

    #[error(
        "alphabet must hold at least 2 distinct printable ASCII symbols without '/', '?', '#' or '%', got {0:?}"
    )]
    InvalidAlphabet(String),

    #[error("slug length must be between 1 and {max}, got {got}")]
    InvalidLength { got: usize, max: usize },

    #[error("retry index {retry_index} exceeds the {windows} digit windows of the hash")]
    HashExhausted { retry_index: u32, windows: u32 },
}

/// 256-bit secret keying the slug hash.
#[derive(Clone, PartialEq, Eq)]
pub struct ShorteningKey([u8; 32]);

impl ShorteningKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parses a key from 64 hex digits (either case).
    pub fn from_hex(hex_key: &str) -> Result<Self, SlugError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_key.trim(), &mut bytes).map_err(|_| SlugError::InvalidKey)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ShorteningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShorteningKey(<redacted>)")
    }
}

/// Number of base-`base` digits fully determined by a 256-bit value.
pub fn usable_digits(base: usize) -> usize {
    (HASH_BITS / (base as f64).log2()).floor() as usize
}

/// Derives the slug for `long_url` under `key` at the given retry index.
///
/// Pure: identical inputs always produce the identical slug.
///
/// # Errors
///
/// Returns [`SlugError::HashExhausted`] when `retry_index` points past the
/// last full window of usable digits.
pub fn derive_slug(
    long_url: &str,
    key: &ShorteningKey,
    alphabet: &[u8],
    length: usize,
    retry_index: u32,
) -> Result<String, SlugError> {
    let base = alphabet.len();
    if base < 2 {
        return Err(SlugError::InvalidAlphabet(
            String::from_utf8_lossy(alphabet).into_owned(),
        ));
    }

    let digits = usable_digits(base);
    if length == 0 || length > digits {
        return Err(SlugError::InvalidLength {
            got: length,
            max: digits,
        });
    }

    let windows = (digits / length) as u32;
    if retry_index >= windows {
        return Err(SlugError::HashExhausted {
            retry_index,
            windows,
        });
    }

    let mut value = keyed_digest(long_url, key)?;

    let skip = retry_index as usize * length;
    for _ in 0..skip {
        div_rem(&mut value, base as u64);
    }

    let mut slug = String::with_capacity(length);
    for _ in 0..length {
        let digit = div_rem(&mut value, base as u64);
        slug.push(char::from(alphabet[digit as usize]));
    }

    Ok(slug)
}

/// HMAC-SHA-256 of the URL as four little-endian 64-bit limbs,
/// least significant limb first.
fn keyed_digest(long_url: &str, key: &ShorteningKey) -> Result<[u64; 4], SlugError> {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key.as_bytes()).map_err(|_| SlugError::InvalidKey)?;
    mac.update(long_url.as_bytes());
    let digest = mac.finalize().into_bytes();

    let mut limbs = [0u64; 4];
    for (limb, chunk) in limbs.iter_mut().zip(digest.chunks_exact(8)) {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        *limb = u64::from_le_bytes(word);
    }
    Ok(limbs)
}

/// Divides the 256-bit value in place and returns the remainder.
fn div_rem(value: &mut [u64; 4], divisor: u64) -> u64 {
    let divisor = u128::from(divisor);
    let mut rem: u128 = 0;
    for limb in value.iter_mut().rev() {
        let current = (rem << 64) | u128::from(*limb);
        *limb = (current / divisor) as u64;
        rem = current % divisor;
    }
    rem as u64
}

/// Validated bundle of key, alphabet and slug length.
#[derive(Debug, Clone)]
pub struct SlugCodec {
    key: ShorteningKey,
    alphabet: Vec<u8>,
    /// Membership table for path filtering.
    accepts: [bool; 128],
    length: usize,
    windows: u32,
}

impl SlugCodec {
    /// # Errors
    ///
    /// - [`SlugError::InvalidAlphabet`] if the alphabet has fewer than two
    ///   symbols, repeats a symbol, or holds a non-printable or path-breaking one.
    /// - [`SlugError::InvalidLength`] if `length` is zero or leaves no full window.
    pub fn new(key: ShorteningKey, alphabet: &str, length: usize) -> Result<Self, SlugError> {
        let symbols = alphabet.as_bytes();
        let mut accepts = [false; 128];

        for &symbol in symbols {
            let printable = symbol.is_ascii_graphic();
            if !printable || FORBIDDEN_SYMBOLS.contains(&symbol) || accepts[symbol as usize] {
                return Err(SlugError::InvalidAlphabet(alphabet.to_string()));
            }
            accepts[symbol as usize] = true;
        }

        if symbols.len() < 2 {
            return Err(SlugError::InvalidAlphabet(alphabet.to_string()));
        }

        let digits = usable_digits(symbols.len());
        if length == 0 || length > digits {
            return Err(SlugError::InvalidLength {
                got: length,
                max: digits,
            });
        }

        Ok(Self {
            key,
            alphabet: symbols.to_vec(),
            accepts,
            length,
            windows: (digits / length) as u32,
        })
    }

    /// Candidate slug for `long_url` at `retry_index`.
    pub fn derive(&self, long_url: &str, retry_index: u32) -> Result<String, SlugError> {
        derive_slug(long_url, &self.key, &self.alphabet, self.length, retry_index)
    }

    /// Returns the candidate if it is a well-formed slug for this codec.
    pub fn parse_slug<'a>(&self, candidate: &'a str) -> Option<&'a str> {
        let well_formed = candidate.len() == self.length
            && candidate
                .bytes()
                .all(|b| b.is_ascii() && self.accepts[b as usize]);

        well_formed.then_some(candidate)
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// How many distinct retry indices the hash can serve.
    pub fn windows(&self) -> u32 {
        self.windows
    }

    pub fn alphabet(&self) -> &str {
        // Validated as ASCII in `new`.
        std::str::from_utf8(&self.alphabet).unwrap_or_default()
    }
}
