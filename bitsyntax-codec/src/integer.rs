//! Arbitrary bit-width integer codec (§4.4).
//!
//! Construction silently truncates any value (signed or not) to its
//! two's-complement representation modulo `2^size_bits`; nothing here ever
//! raises an overflow error on encode. Decoding sign-extends when `signed`
//! is set. Non-byte-aligned sizes are always packed big-endian: the
//! requested [`Endianness`] only has an observable effect when
//! `size_bits % 8 == 0`.

use num_bigint::{BigInt, Sign};
use num_integer::Integer;

use bitsyntax_core::error::CodecResult;
use bitsyntax_core::{BitBuffer, Endianness, ResolvedEndianness};

/// Encode `value` into exactly `size_bits` bits, silently truncating to
/// two's complement modulo `2^size_bits`.
///
/// A `size_bits` of 0 is valid per §9's "size 0 segments" edge case: it
/// contributes zero bits regardless of `value`.
pub fn encode_int(value: &BigInt, size_bits: u32, endianness: Endianness) -> CodecResult<BitBuffer> {
    if size_bits == 0 {
        return Ok(BitBuffer::new());
    }

    let modulus = BigInt::from(1) << size_bits;
    let residue = value.mod_floor(&modulus);
    let total_bytes = size_bits.div_ceil(8) as usize;

    let (_, magnitude) = residue.to_bytes_be();
    let mut padded = vec![0u8; total_bytes.saturating_sub(magnitude.len())];
    padded.extend_from_slice(&magnitude);
    // `residue < modulus <= 256^total_bytes`, so `magnitude` never exceeds
    // `total_bytes` and `padded` is always exactly that long.
    debug_assert_eq!(padded.len(), total_bytes);

    let full = BitBuffer::from_bytes(padded);
    let leading = (total_bytes as u32 * 8) - size_bits;
    let mut bits = full.slice_bits(leading as usize, size_bits as usize)?;

    if size_bits % 8 == 0 && endianness.resolve() == ResolvedEndianness::Little {
        let mut bytes = bits.to_bytes();
        bytes.reverse();
        bits = BitBuffer::from_bytes(bytes);
    }

    Ok(bits)
}

/// Decode a `size_bits`-wide integer from `bits`, which must be exactly
/// that long.
///
/// A zero-length `bits` decodes to the zero-valued default from §9's
/// "size 0 segments" edge case.
pub fn decode_int(bits: &BitBuffer, signed: bool, endianness: Endianness) -> CodecResult<BigInt> {
    let size_bits = bits.len() as u32;
    if size_bits == 0 {
        return Ok(BigInt::from(0));
    }

    let ordered = if size_bits % 8 == 0 && endianness.resolve() == ResolvedEndianness::Little {
        let mut bytes = bits.to_bytes();
        bytes.reverse();
        BitBuffer::from_bytes(bytes)
    } else {
        bits.clone()
    };

    let total_bytes = size_bits.div_ceil(8) as usize;
    let padded_bits = (total_bytes as u32) * 8;
    let leading = padded_bits - size_bits;

    let mut byte_buf = vec![0u8; total_bytes];
    for i in 0..size_bits as usize {
        if ordered.get_bit(i)? {
            let dst = leading as usize + i;
            byte_buf[dst / 8] |= 1 << (7 - dst % 8);
        }
    }

    let mut value = BigInt::from_bytes_be(Sign::Plus, &byte_buf);
    if signed && ordered.get_bit(0)? {
        value -= BigInt::from(1) << size_bits;
    }
    Ok(value)
}
