//! Immutable, bit-precise byte sequence.
//!
//! A [`BitBuffer`] is the central value of the codec: a finite, MSB-first
//! sequence of bits whose length need not be a multiple of 8. Bit 0 of byte
//! 0 is the MSB of byte 0; bit `i` is `(byte[i/8] >> (7 - i % 8)) & 1`. This
//! indexing convention is invariant across the entire crate.

use crate::error::{CodecError, CodecResult, ErrorKind};

/// An immutable sequence of bits with bit-precise length.
///
/// Physically stored as `ceil(len / 8)` bytes plus the bit length; unused
/// low bits in the final byte are reserved and carry no meaning. Equality
/// compares `(len, first len bits)`, so a trailing padding bit never affects
/// `==`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BitBuffer {
    #[cfg_attr(feature = "serde", serde(with = "serde_bytes"))]
    bytes: Vec<u8>,
    len_bits: usize,
}

impl BitBuffer {
    /// An empty, zero-length buffer.
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            len_bits: 0,
        }
    }

    /// Build a byte-aligned buffer directly from a byte slice.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let len_bits = bytes.len() * 8;
        Self { bytes, len_bits }
    }

    /// Build a buffer from raw bytes plus an explicit bit length.
    ///
    /// # Errors
    /// Returns [`ErrorKind::InvalidBitstringData`] if `bit_length` would
    /// require more bytes than `bytes` provides.
    pub fn from_bytes_with_len(bytes: impl Into<Vec<u8>>, bit_length: usize) -> CodecResult<Self> {
        let bytes = bytes.into();
        if bit_length > bytes.len() * 8 {
            return Err(CodecError::new(
                ErrorKind::InvalidBitstringData,
                format!(
                    "{} bits requested but only {} bytes supplied ({} bits)",
                    bit_length,
                    bytes.len(),
                    bytes.len() * 8
                ),
            ));
        }
        Ok(Self {
            bytes,
            len_bits: bit_length,
        })
    }

    /// Number of bits in the buffer.
    pub fn len(&self) -> usize {
        self.len_bits
    }

    pub fn is_empty(&self) -> bool {
        self.len_bits == 0
    }

    /// Whether the length is a whole number of bytes.
    pub fn is_byte_aligned(&self) -> bool {
        self.len_bits % 8 == 0
    }

    /// Number of whole bytes needed to hold the buffer's bits.
    fn byte_len(&self) -> usize {
        (self.len_bits + 7) / 8
    }

    /// Copy out the buffer's bytes, zero-padded in the unused low bits of
    /// the final byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes[..self.byte_len()].to_vec()
    }

    /// Read the bit at `pos` (0-indexed, MSB-first).
    ///
    /// # Errors
    /// Returns [`ErrorKind::InsufficientBits`] if `pos >= len()`.
    pub fn get_bit(&self, pos: usize) -> CodecResult<bool> {
        if pos >= self.len_bits {
            return Err(CodecError::new(
                ErrorKind::InsufficientBits,
                format!("bit index {} out of bounds (len {})", pos, self.len_bits),
            ));
        }
        Ok(Self::bit_at(&self.bytes, pos))
    }

    fn bit_at(bytes: &[u8], pos: usize) -> bool {
        let byte = bytes[pos / 8];
        (byte >> (7 - pos % 8)) & 1 == 1
    }

    /// Extract an MSB-first sub-range as a new, owned [`BitBuffer`].
    ///
    /// # Errors
    /// Returns [`ErrorKind::InsufficientBits`] if `start + bit_count` would
    /// read past the end of the buffer.
    pub fn slice_bits(&self, start: usize, bit_count: usize) -> CodecResult<BitBuffer> {
        if start
            .checked_add(bit_count)
            .is_none_or(|end| end > self.len_bits)
        {
            return Err(CodecError::new(
                ErrorKind::InsufficientBits,
                format!(
                    "cannot slice {} bits at {} from a {}-bit buffer",
                    bit_count, start, self.len_bits
                ),
            ));
        }
        if bit_count == 0 {
            return Ok(BitBuffer::new());
        }

        let mut staging = BitStaging::with_capacity(bit_count);
        for i in 0..bit_count {
            staging.push_bit(Self::bit_at(&self.bytes, start + i));
        }
        Ok(staging.finish())
    }

    /// Append exactly `bit_count` MSB-first bits copied from `src`,
    /// starting at bit 0 of `src`. Internal: used by the builder driver.
    pub(crate) fn append_bits(&mut self, src: &[u8], bit_count: usize) {
        if bit_count == 0 {
            return;
        }
        self.reserve_bits(bit_count);
        for i in 0..bit_count {
            let bit = Self::bit_at(src, i);
            self.push_bit(bit);
        }
    }

    /// Append another buffer's bits in full.
    pub(crate) fn append_buffer(&mut self, other: &BitBuffer) {
        let len = other.len();
        self.reserve_bits(len);
        for i in 0..len {
            self.push_bit(Self::bit_at(&other.bytes, i));
        }
    }

    fn reserve_bits(&mut self, additional_bits: usize) {
        let needed_bytes = (self.len_bits + additional_bits + 7) / 8;
        if needed_bytes > self.bytes.len() {
            // Doubling growth, the way a Builder's output buffer is
            // expected to grow (§5 Memory).
            let target = needed_bytes.max(self.bytes.len() * 2).max(needed_bytes);
            self.bytes.resize(target, 0);
        }
    }

    fn push_bit(&mut self, bit: bool) {
        let byte_index = self.len_bits / 8;
        if byte_index >= self.bytes.len() {
            self.bytes.push(0);
        }
        if bit {
            self.bytes[byte_index] |= 1 << (7 - self.len_bits % 8);
        }
        self.len_bits += 1;
    }
}

impl Default for BitBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for BitBuffer {
    fn eq(&self, other: &Self) -> bool {
        if self.len_bits != other.len_bits {
            return false;
        }
        for i in 0..self.len_bits {
            if Self::bit_at(&self.bytes, i) != Self::bit_at(&other.bytes, i) {
                return false;
            }
        }
        true
    }
}

impl Eq for BitBuffer {}

/// Private mutable staging buffer used while bits are being assembled; it
/// never escapes as a public mutable view onto a published `BitBuffer`.
struct BitStaging {
    buf: BitBuffer,
}

impl BitStaging {
    fn with_capacity(bit_count: usize) -> Self {
        let mut buf = BitBuffer::new();
        buf.bytes.reserve((bit_count + 7) / 8);
        Self { buf }
    }

    fn push_bit(&mut self, bit: bool) {
        self.buf.push_bit(bit);
    }

    fn finish(self) -> BitBuffer {
        self.buf
    }
}
