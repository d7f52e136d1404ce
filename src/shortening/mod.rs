//! Slug derivation.
//!
//! See [`slug`] for the keyed hash and windowing scheme.

pub mod slug;

pub use slug::{DEFAULT_ALPHABET, DEFAULT_SLUG_LENGTH, ShorteningKey, SlugCodec, SlugError};
