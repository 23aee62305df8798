//! Builder driver: sequential segment encoding with deferred errors (§4.8).
//!
//! A `Builder` holds either a growing buffer plus segment count, or a sticky
//! first error. Once failed, every `add_*` call becomes a no-op, modeled
//! here as a tagged `BuilderState` rather than a flag checked ad hoc on
//! every method.

use bitsyntax_core::error::{CodecError, CodecResult, ErrorKind};
use bitsyntax_core::segment::validate_scalar;
use bitsyntax_core::{BitBuffer, Endianness};
use num_bigint::BigInt;

use crate::bitops::concat;
use crate::float::encode_float;
use crate::integer::encode_int;
use crate::utf::{encode_utf16, encode_utf32, encode_utf8};

enum BuilderState {
    Building { buffer: BitBuffer, count: usize },
    Failed { first_error: CodecError },
}

/// Sequentially encodes heterogeneous bit segments into one [`BitBuffer`].
pub struct Builder {
    state: BuilderState,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            state: BuilderState::Building {
                buffer: BitBuffer::new(),
                count: 0,
            },
        }
    }

    /// Append an integer segment. `size` is in bits (pre-unit); defaults to
    /// 8. `unit` defaults to 1.
    pub fn add_integer(
        &mut self,
        value: impl Into<BigInt>,
        size: Option<u32>,
        unit: Option<u16>,
        signed: bool,
        endianness: Endianness,
    ) -> &mut Self {
        let value = value.into();
        self.push(move |log_prefix| {
            let _ = signed; // encoding truncation is signedness-agnostic; kept for API symmetry with decode.
            let unit = validate_unit(unit)?;
            let size = size.unwrap_or(8);
            let n = checked_bits(size, unit)?;
            log::trace!("{log_prefix} integer n={n} endianness={endianness:?}");
            encode_int(&value, n, endianness)
        })
    }

    /// Append a float segment. `size` must be 16, 32 or 64 if given;
    /// defaults to 64.
    pub fn add_float(&mut self, value: f64, size: Option<u32>, endianness: Endianness) -> &mut Self {
        self.push(move |log_prefix| {
            let size = size.unwrap_or(64);
            if !matches!(size, 16 | 32 | 64) {
                return Err(CodecError::new(
                    ErrorKind::InvalidFloatSize,
                    format!("float size {} must be 16, 32 or 64", size),
                ));
            }
            log::trace!("{log_prefix} float size={size} endianness={endianness:?}");
            encode_float(value, size, endianness)
        })
    }

    /// Append a binary segment. `size`, if given, is a count of `unit`
    /// (default 8) bits; the source is truncated to that many bits, or
    /// rejected if shorter. If omitted, the whole value is used.
    pub fn add_binary(&mut self, bytes: Vec<u8>, size: Option<u32>, unit: Option<u16>) -> &mut Self {
        self.push(move |log_prefix| {
            let unit = validate_unit(unit.or(Some(8)))?;
            let available_bits = bytes.len() as u64 * 8;
            let n = match size {
                Some(s) => checked_bits(s, unit)?,
                None => {
                    if available_bits % unit as u64 != 0 {
                        return Err(CodecError::new(
                            ErrorKind::InvalidSize,
                            "binary length is not a multiple of unit",
                        ));
                    }
                    available_bits as u32
                }
            };
            if n % 8 != 0 {
                return Err(CodecError::new(
                    ErrorKind::AlignmentMismatch,
                    "binary segments must resolve to a whole number of bytes",
                ));
            }
            if (n as u64) > available_bits {
                return Err(CodecError::new(
                    ErrorKind::BinarySizeMismatch,
                    format!("binary source has {} bits, need {}", available_bits, n),
                ));
            }
            log::trace!("{log_prefix} binary n={n}");
            let full = BitBuffer::from_bytes(bytes);
            full.slice_bits(0, n as usize)
        })
    }

    /// Append a bitstring segment. `size`, if given, is a bit count
    /// (unit default 1); if omitted, the whole value is used.
    pub fn add_bitstring(&mut self, bits: BitBuffer, size: Option<u32>, unit: Option<u16>) -> &mut Self {
        self.push(move |log_prefix| {
            let unit = validate_unit(unit)?;
            let n = match size {
                Some(s) => checked_bits(s, unit)?,
                None => bits.len() as u32,
            };
            if (n as usize) > bits.len() {
                return Err(CodecError::new(
                    ErrorKind::BinarySizeMismatch,
                    format!("bitstring source has {} bits, need {}", bits.len(), n),
                ));
            }
            log::trace!("{log_prefix} bitstring n={n}");
            bits.slice_bits(0, n as usize)
        })
    }

    pub fn add_utf8_codepoint(&mut self, codepoint: u32) -> &mut Self {
        self.push(move |log_prefix| {
            log::trace!("{log_prefix} utf8 codepoint={codepoint:#x}");
            Ok(BitBuffer::from_bytes(encode_utf8(codepoint)?))
        })
    }

    pub fn add_utf16_codepoint(&mut self, codepoint: u32, endianness: Endianness) -> &mut Self {
        self.push(move |log_prefix| {
            log::trace!("{log_prefix} utf16 codepoint={codepoint:#x}");
            Ok(BitBuffer::from_bytes(encode_utf16(codepoint, endianness)?))
        })
    }

    pub fn add_utf32_codepoint(&mut self, codepoint: u32, endianness: Endianness) -> &mut Self {
        self.push(move |log_prefix| {
            log::trace!("{log_prefix} utf32 codepoint={codepoint:#x}");
            Ok(BitBuffer::from_bytes(encode_utf32(codepoint, endianness)?))
        })
    }

    pub fn add_utf8(&mut self, value: &str) -> &mut Self {
        let value = value.to_owned();
        self.push(move |log_prefix| {
            log::trace!("{log_prefix} utf8 string len={}", value.chars().count());
            let mut parts = Vec::new();
            for c in value.chars() {
                validate_scalar(c as u32)?;
                parts.push(BitBuffer::from_bytes(encode_utf8(c as u32)?));
            }
            Ok(concat(&parts))
        })
    }

    pub fn add_utf16(&mut self, value: &str, endianness: Endianness) -> &mut Self {
        let value = value.to_owned();
        self.push(move |log_prefix| {
            log::trace!("{log_prefix} utf16 string len={}", value.chars().count());
            let mut parts = Vec::new();
            for c in value.chars() {
                parts.push(BitBuffer::from_bytes(encode_utf16(c as u32, endianness)?));
            }
            Ok(concat(&parts))
        })
    }

    pub fn add_utf32(&mut self, value: &str, endianness: Endianness) -> &mut Self {
        let value = value.to_owned();
        self.push(move |log_prefix| {
            log::trace!("{log_prefix} utf32 string len={}", value.chars().count());
            let mut parts = Vec::new();
            for c in value.chars() {
                parts.push(BitBuffer::from_bytes(encode_utf32(c as u32, endianness)?));
            }
            Ok(concat(&parts))
        })
    }

    /// Consume the builder, returning the encoded buffer and, if any
    /// `add_*` call failed, the first error encountered.
    pub fn build(self) -> (BitBuffer, Option<CodecError>) {
        match self.state {
            BuilderState::Building { buffer, .. } => (buffer, None),
            BuilderState::Failed { first_error } => (BitBuffer::new(), Some(first_error)),
        }
    }

    fn push<F>(&mut self, encode: F) -> &mut Self
    where
        F: FnOnce(&str) -> CodecResult<BitBuffer>,
    {
        if let BuilderState::Building { buffer, count } = &mut self.state {
            let index = *count;
            match encode(&format!("segment[{index}]")) {
                Ok(bits) => {
                    *buffer = concat(&[std::mem::take(buffer), bits]);
                    *count += 1;
                }
                Err(err) => {
                    log::debug!("segment[{index}] failed: {err}");
                    self.state = BuilderState::Failed {
                        first_error: err.at_segment(index),
                    };
                }
            }
        }
        self
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_unit(unit: Option<u16>) -> CodecResult<u16> {
    match unit {
        Some(u) if !(1..=256).contains(&u) => Err(CodecError::new(
            ErrorKind::InvalidUnit,
            format!("unit {} out of range [1, 256]", u),
        )),
        Some(u) => Ok(u),
        None => Ok(1),
    }
}

fn checked_bits(size: u32, unit: u16) -> CodecResult<u32> {
    size.checked_mul(unit as u32)
        .ok_or_else(|| CodecError::new(ErrorKind::InvalidSize, "size * unit overflows"))
}
