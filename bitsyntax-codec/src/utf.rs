//! UTF-8/16/32 scalar codec (§4.3).
//!
//! Each function encodes or decodes exactly one Unicode scalar. Byte counts
//! consumed are returned so the matcher driver can advance its cursor.

use bitsyntax_core::error::{CodecError, CodecResult, ErrorKind};
use bitsyntax_core::segment::validate_scalar;
use bitsyntax_core::{Endianness, ResolvedEndianness};

/// Encode `c` as UTF-8 (1-4 bytes).
pub fn encode_utf8(c: u32) -> CodecResult<Vec<u8>> {
    validate_scalar(c)?;
    let ch = char::from_u32(c).expect("validated scalar is a valid char");
    let mut buf = [0u8; 4];
    let s = ch.encode_utf8(&mut buf);
    Ok(s.as_bytes().to_vec())
}

/// Decode one UTF-8 scalar from the front of `bytes`.
///
/// Returns the scalar and the number of bytes consumed.
pub fn decode_utf8(bytes: &[u8]) -> CodecResult<(u32, usize)> {
    if bytes.is_empty() {
        return Err(CodecError::new(ErrorKind::InsufficientBits, "empty UTF-8 input"));
    }
    let first = bytes[0];
    let len = if first & 0x80 == 0 {
        1
    } else if first & 0xE0 == 0xC0 {
        2
    } else if first & 0xF0 == 0xE0 {
        3
    } else if first & 0xF8 == 0xF0 {
        4
    } else {
        return Err(CodecError::new(
            ErrorKind::InvalidType,
            "invalid UTF-8 lead byte",
        ));
    };
    if bytes.len() < len {
        return Err(CodecError::new(
            ErrorKind::InsufficientBits,
            format!("need {} bytes for UTF-8 sequence, have {}", len, bytes.len()),
        ));
    }
    let s = std::str::from_utf8(&bytes[..len])
        .map_err(|e| CodecError::new(ErrorKind::InvalidType, format!("invalid UTF-8: {}", e)))?;
    let c = s
        .chars()
        .next()
        .ok_or_else(|| CodecError::new(ErrorKind::InvalidType, "empty UTF-8 decode"))?;
    Ok((c as u32, len))
}

/// Encode `c` as one or two UTF-16 code units (surrogate pair for
/// supplementary scalars), honoring `endianness`.
pub fn encode_utf16(c: u32, endianness: Endianness) -> CodecResult<Vec<u8>> {
    validate_scalar(c)?;
    let mut out = Vec::new();
    if c <= 0xFFFF {
        push_u16(&mut out, c as u16, endianness);
    } else {
        let v = c - 0x10000;
        let high = 0xD800 + (v >> 10);
        let low = 0xDC00 + (v & 0x3FF);
        push_u16(&mut out, high as u16, endianness);
        push_u16(&mut out, low as u16, endianness);
    }
    Ok(out)
}

/// Decode one UTF-16 scalar (possibly a surrogate pair) from the front of
/// `bytes`. Returns the scalar and the number of bytes consumed (2 or 4).
pub fn decode_utf16(bytes: &[u8], endianness: Endianness) -> CodecResult<(u32, usize)> {
    if bytes.len() < 2 {
        return Err(CodecError::new(
            ErrorKind::InsufficientBits,
            "need 2 bytes for a UTF-16 code unit",
        ));
    }
    let unit = read_u16(&bytes[..2], endianness);
    if (0xD800..=0xDBFF).contains(&unit) {
        if bytes.len() < 4 {
            return Err(CodecError::new(
                ErrorKind::InsufficientBits,
                "need 4 bytes for a UTF-16 surrogate pair",
            ));
        }
        let low = read_u16(&bytes[2..4], endianness);
        if !(0xDC00..=0xDFFF).contains(&low) {
            return Err(CodecError::new(
                ErrorKind::InvalidType,
                "high surrogate not followed by a low surrogate",
            ));
        }
        let c = 0x10000 + ((unit as u32 - 0xD800) << 10) + (low as u32 - 0xDC00);
        Ok((c, 4))
    } else if (0xDC00..=0xDFFF).contains(&unit) {
        Err(CodecError::new(
            ErrorKind::InvalidType,
            "standalone low surrogate",
        ))
    } else {
        Ok((unit as u32, 2))
    }
}

/// Encode `c` as a single 32-bit UTF-32 unit.
pub fn encode_utf32(c: u32, endianness: Endianness) -> CodecResult<Vec<u8>> {
    validate_scalar(c)?;
    Ok(match endianness.resolve() {
        ResolvedEndianness::Big => c.to_be_bytes().to_vec(),
        ResolvedEndianness::Little => c.to_le_bytes().to_vec(),
    })
}

/// Decode one UTF-32 scalar. Always consumes 4 bytes.
pub fn decode_utf32(bytes: &[u8], endianness: Endianness) -> CodecResult<(u32, usize)> {
    if bytes.len() < 4 {
        return Err(CodecError::new(
            ErrorKind::InsufficientBits,
            "need 4 bytes for UTF-32",
        ));
    }
    let mut arr = [0u8; 4];
    arr.copy_from_slice(&bytes[..4]);
    let c = match endianness.resolve() {
        ResolvedEndianness::Big => u32::from_be_bytes(arr),
        ResolvedEndianness::Little => u32::from_le_bytes(arr),
    };
    validate_scalar(c)?;
    Ok((c, 4))
}

fn push_u16(out: &mut Vec<u8>, unit: u16, endianness: Endianness) {
    match endianness.resolve() {
        ResolvedEndianness::Big => out.extend_from_slice(&unit.to_be_bytes()),
        ResolvedEndianness::Little => out.extend_from_slice(&unit.to_le_bytes()),
    }
}

fn read_u16(bytes: &[u8], endianness: Endianness) -> u16 {
    let mut arr = [0u8; 2];
    arr.copy_from_slice(bytes);
    match endianness.resolve() {
        ResolvedEndianness::Big => u16::from_be_bytes(arr),
        ResolvedEndianness::Little => u16::from_le_bytes(arr),
    }
}
