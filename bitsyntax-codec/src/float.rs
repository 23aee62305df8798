//! IEEE-754 float codec for 16/32/64-bit segments (§4.5).

use half::f16;

use bitsyntax_core::error::{CodecError, CodecResult, ErrorKind};
use bitsyntax_core::{BitBuffer, Endianness, ResolvedEndianness};

/// Controls how decoding treats non-finite results (NaN, +/-inf).
///
/// `FiniteOnly` is useful for protocols that define floats as always
/// representing a measured quantity, where a NaN on the wire is itself a
/// framing error rather than a valid payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FloatMatchMode {
    #[default]
    AcceptAll,
    FiniteOnly,
}

/// Encode `value` as `size_bits` bits (16, 32 or 64).
pub fn encode_float(value: f64, size_bits: u32, endianness: Endianness) -> CodecResult<BitBuffer> {
    let bytes: Vec<u8> = match size_bits {
        16 => order_bytes(f16::from_f64(value).to_be_bytes(), endianness),
        32 => order_bytes((value as f32).to_be_bytes(), endianness),
        64 => order_bytes(value.to_be_bytes(), endianness),
        other => {
            return Err(CodecError::new(
                ErrorKind::InvalidFloatSize,
                format!("float size {} must be 16, 32 or 64", other),
            ))
        }
    };
    Ok(BitBuffer::from_bytes(bytes))
}

/// Decode a `size_bits`-wide float, honoring `mode` for non-finite results.
pub fn decode_float(bits: &BitBuffer, endianness: Endianness, mode: FloatMatchMode) -> CodecResult<f64> {
    if !bits.is_byte_aligned() {
        return Err(CodecError::new(
            ErrorKind::AlignmentMismatch,
            "float segments must be byte-aligned",
        ));
    }
    let raw = bits.to_bytes();
    let value = match bits.len() {
        16 => {
            let be = reorder_to_be::<2>(&raw, endianness)?;
            f16::from_be_bytes(be).to_f64()
        }
        32 => {
            let be = reorder_to_be::<4>(&raw, endianness)?;
            f32::from_be_bytes(be) as f64
        }
        64 => {
            let be = reorder_to_be::<8>(&raw, endianness)?;
            f64::from_be_bytes(be)
        }
        other => {
            return Err(CodecError::new(
                ErrorKind::InvalidFloatSize,
                format!("float size {} must be 16, 32 or 64 bits", other),
            ))
        }
    };

    if mode == FloatMatchMode::FiniteOnly && !value.is_finite() {
        return Err(CodecError::new(
            ErrorKind::InvalidType,
            "decoded float is not finite",
        ));
    }
    Ok(value)
}

fn order_bytes<const N: usize>(be: [u8; N], endianness: Endianness) -> Vec<u8> {
    let mut v = be.to_vec();
    if endianness.resolve() == ResolvedEndianness::Little {
        v.reverse();
    }
    v
}

fn reorder_to_be<const N: usize>(raw: &[u8], endianness: Endianness) -> CodecResult<[u8; N]> {
    if raw.len() != N {
        return Err(CodecError::new(
            ErrorKind::InvalidFloatSize,
            format!("expected {} bytes, got {}", N, raw.len()),
        ));
    }
    let mut arr = [0u8; N];
    arr.copy_from_slice(raw);
    if endianness.resolve() == ResolvedEndianness::Little {
        arr.reverse();
    }
    Ok(arr)
}
