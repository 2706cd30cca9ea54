//! # Varint — base-128 integer codec
//!
//! Unsigned 64-bit integers serialized as little-endian base-128 with a
//! continuation bit. Every byte carries seven payload bits, least-significant
//! group first; the high bit is set iff more bytes follow. An encoding
//! occupies 1 to 10 bytes, and the 10-byte form's final byte may only be `1`
//! (one remaining payload bit).
//!
//! ## Wire Examples
//!
//! ```text
//! 0                  -> 00
//! 127                -> 7F
//! 128                -> 80 01
//! u64::MAX           -> FF FF FF FF FF FF FF FF FF 01
//! ```
//!
//! ## Canonical Form
//!
//! Only the shortest encoding of a value is accepted. A terminator byte whose
//! seven payload bits are all zero, and which is not the first byte of the
//! sequence, would encode the same value in fewer bytes and is rejected as
//! [`VarintError::Overlong`].
//!
//! ## Incremental Decoding
//!
//! [`Decoder`] consumes one byte per [`Decoder::step`] call, so callers that
//! read from a buffered file never need look-ahead or refill special cases:
//!
//! ```rust
//! use varint::{Decoder, Step};
//!
//! let mut dec = Decoder::new();
//! assert!(matches!(dec.step(0x80), Ok(Step::NeedMore)));
//! assert!(matches!(dec.step(0x01), Ok(Step::Done(128))));
//! ```

use thiserror::Error;

/// The largest number of bytes a single encoded integer can occupy. A
/// destination buffer of this size always suffices for [`encode`].
pub const MAX_ENCODED_LEN: usize = 10;

/// Errors produced while decoding a varint.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VarintError {
    /// The encoding carries more than 64 bits of payload.
    #[error("varint overflows 64 bits")]
    Overflow,

    /// A longer-than-necessary encoding of a smaller value.
    #[error("overlong varint encoding")]
    Overlong,
}

/// Encodes `n` into `dest`, returning the number of bytes written.
pub fn encode(n: u64, dest: &mut [u8; MAX_ENCODED_LEN]) -> usize {
    let mut n = n;
    let mut len = 0;
    while n >= 0x80 {
        dest[len] = 0x80 | (n & 0x7f) as u8;
        n >>= 7;
        len += 1;
    }
    dest[len] = n as u8;
    len + 1
}

/// Outcome of feeding one byte to a [`Decoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The byte was consumed; the varint is not yet complete.
    NeedMore,
    /// The byte terminated the varint; this is the decoded value.
    Done(u64),
}

/// Incremental byte-at-a-time varint decoder.
///
/// Feed bytes through [`step`](Decoder::step) until it returns
/// [`Step::Done`]. A finished decoder must not be fed further bytes; build a
/// fresh one per integer.
#[derive(Debug, Default)]
pub struct Decoder {
    value: u64,
    count: u32,
}

impl Decoder {
    /// Creates a decoder ready for the first byte of a varint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the next byte of the encoding.
    ///
    /// # Errors
    ///
    /// [`VarintError::Overflow`] when the value would exceed 64 bits (an
    /// eleventh byte, or a tenth byte greater than `1`), and
    /// [`VarintError::Overlong`] when a non-initial terminator byte is zero.
    pub fn step(&mut self, byte: u8) -> Result<Step, VarintError> {
        if self.count == 0 {
            self.value = u64::from(byte & 0x7f);
            self.count = 1;
            if byte & 0x80 == 0 {
                return Ok(Step::Done(self.value));
            }
            return Ok(Step::NeedMore);
        }
        if self.count >= 10 || (self.count == 9 && byte > 1) {
            return Err(VarintError::Overflow);
        }
        if byte & 0x80 != 0 {
            self.value |= u64::from(byte & 0x7f) << (7 * self.count);
            self.count += 1;
            return Ok(Step::NeedMore);
        }
        if byte == 0 {
            return Err(VarintError::Overlong);
        }
        self.value |= u64::from(byte) << (7 * self.count);
        Ok(Step::Done(self.value))
    }
}
