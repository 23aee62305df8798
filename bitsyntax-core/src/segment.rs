//! Segment descriptors: one construction or match element.
//!
//! A [`SegmentSpec`] is the single polymorphic shape used by both the
//! builder (where `value` carries the datum to encode) and the matcher
//! (where `value` is absent and a decoded [`MatchedValue`] is produced
//! instead). Validation (§4.6) runs before any encode/decode work.

use num_bigint::BigInt;

use crate::bitbuffer::BitBuffer;
use crate::endian::Endianness;
use crate::error::{CodecError, CodecResult, ErrorKind};

/// The kind of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SegmentKind {
    Integer,
    Float,
    Binary,
    Bitstring,
    Utf8,
    Utf16,
    Utf32,
    RestBinary,
    RestBitstring,
}

impl SegmentKind {
    pub fn is_utf(self) -> bool {
        matches!(self, SegmentKind::Utf8 | SegmentKind::Utf16 | SegmentKind::Utf32)
    }

    pub fn is_rest(self) -> bool {
        matches!(self, SegmentKind::RestBinary | SegmentKind::RestBitstring)
    }

    /// Default `size` (pre-unit, in bits) when unspecified, or `None` when
    /// the kind has no static default (Binary/Bitstring/UTF/rest kinds).
    pub fn default_size(self) -> Option<u32> {
        match self {
            SegmentKind::Integer => Some(8),
            SegmentKind::Float => Some(64),
            _ => None,
        }
    }

    /// Default `unit` when unspecified.
    pub fn default_unit(self) -> u16 {
        match self {
            SegmentKind::Binary => 8,
            _ => 1,
        }
    }
}

/// The runtime datum carried by a construction segment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SegmentValue {
    Int(i128),
    BigInt(BigInt),
    Float(f64),
    Bytes(#[cfg_attr(feature = "serde", serde(with = "serde_bytes"))] Vec<u8>),
    Bits(BitBuffer),
    Codepoint(u32),
    Str(String),
}

impl From<i128> for SegmentValue {
    fn from(v: i128) -> Self {
        SegmentValue::Int(v)
    }
}

impl From<BigInt> for SegmentValue {
    fn from(v: BigInt) -> Self {
        SegmentValue::BigInt(v)
    }
}

impl From<f64> for SegmentValue {
    fn from(v: f64) -> Self {
        SegmentValue::Float(v)
    }
}

impl From<Vec<u8>> for SegmentValue {
    fn from(v: Vec<u8>) -> Self {
        SegmentValue::Bytes(v)
    }
}

impl From<BitBuffer> for SegmentValue {
    fn from(v: BitBuffer) -> Self {
        SegmentValue::Bits(v)
    }
}

impl From<String> for SegmentValue {
    fn from(v: String) -> Self {
        SegmentValue::Str(v)
    }
}

/// A decoded value produced by the matcher.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MatchedValue {
    Int(i128),
    BigInt(BigInt),
    Float(f64),
    Bytes(#[cfg_attr(feature = "serde", serde(with = "serde_bytes"))] Vec<u8>),
    Bits(BitBuffer),
    Codepoint(u32),
}

impl MatchedValue {
    /// Coerce to `i64` for use as a dynamic-size variable binding.
    /// Non-integer kinds have no meaningful bit-size interpretation and
    /// return `None`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MatchedValue::Int(v) => i64::try_from(*v).ok(),
            MatchedValue::BigInt(v) => {
                use num_traits::ToPrimitive;
                v.to_i64()
            }
            MatchedValue::Codepoint(c) => Some(*c as i64),
            _ => None,
        }
    }
}

/// The source of a dynamically resolved segment size.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DynamicSize {
    /// Reuse a previously bound variable's value directly as the raw size.
    VarRef(String),
    /// Evaluate a small arithmetic expression over the binding table.
    Expr(String),
}

/// One construction or match element.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentSpec {
    pub kind: SegmentKind,
    pub value: Option<SegmentValue>,
    pub size: Option<u32>,
    pub unit: Option<u16>,
    pub endianness: Endianness,
    pub signed: bool,
    pub dynamic: Option<DynamicSize>,
    /// Registers this segment's matched value under `name` for later
    /// dynamic-size expressions (matching only).
    pub name: Option<String>,
}

impl SegmentSpec {
    pub fn new(kind: SegmentKind) -> Self {
        Self {
            kind,
            value: None,
            size: None,
            unit: None,
            endianness: Endianness::Big,
            signed: false,
            dynamic: None,
            name: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<SegmentValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_unit(mut self, unit: u16) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    pub fn with_dynamic(mut self, dynamic: DynamicSize) -> Self {
        self.dynamic = Some(dynamic);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn size_specified(&self) -> bool {
        self.size.is_some()
    }

    pub fn unit_specified(&self) -> bool {
        self.unit.is_some()
    }

    /// The effective unit multiplier: explicit value if specified,
    /// otherwise the kind's default.
    pub fn effective_unit(&self) -> u16 {
        self.unit.unwrap_or(self.kind.default_unit())
    }

    /// Validate this segment in isolation (§4.6). Does not know whether it
    /// is the final "rest" segment in a sequence — callers that enforce
    /// "trailing rest only" pass `is_last`.
    pub fn validate(&self, is_last: bool) -> CodecResult<()> {
        if self.kind.is_rest() && !is_last {
            return Err(CodecError::new(
                ErrorKind::InvalidSegment,
                "a rest segment must be the final segment",
            ));
        }

        if let Some(unit) = self.unit {
            if !(1..=256).contains(&unit) {
                return Err(CodecError::new(
                    ErrorKind::InvalidUnit,
                    format!("unit {} out of range [1, 256]", unit),
                ));
            }
        }

        if self.kind.is_utf() {
            if self.size.is_some() {
                return Err(CodecError::new(
                    ErrorKind::UTFSizeSpecified,
                    "UTF segments forbid an explicit size",
                ));
            }
            if let Some(unit) = self.unit {
                if unit != 1 {
                    return Err(CodecError::new(
                        ErrorKind::UTFUnitModified,
                        "UTF segments require unit = 1",
                    ));
                }
            }
        }

        if matches!(self.kind, SegmentKind::Float) {
            if let Some(size) = self.size {
                if !matches!(size, 16 | 32 | 64) {
                    return Err(CodecError::new(
                        ErrorKind::InvalidFloatSize,
                        format!("float size {} must be 16, 32 or 64", size),
                    ));
                }
            }
        }

        if matches!(self.kind, SegmentKind::Binary | SegmentKind::Bitstring)
            && self.size.is_none()
            && self.dynamic.is_none()
        {
            // Binary/Bitstring require an explicit size unless dynamic; an
            // unsized trailing blob is expressed with RestBinary/
            // RestBitstring instead, which carry no `size` field at all.
            return Err(CodecError::new(
                ErrorKind::BinarySizeRequired,
                "Binary/Bitstring segments require a size unless dynamic",
            ));
        }

        if let Some(value) = &self.value {
            match (self.kind, value) {
                (SegmentKind::Binary, SegmentValue::Bytes(_)) => {}
                (SegmentKind::Binary, _) => {
                    return Err(CodecError::new(
                        ErrorKind::InvalidBinaryData,
                        "Binary segment value must be a byte sequence",
                    ))
                }
                (SegmentKind::Bitstring, SegmentValue::Bits(_)) => {}
                (SegmentKind::Bitstring, _) => {
                    return Err(CodecError::new(
                        ErrorKind::InvalidBitstringData,
                        "Bitstring segment value must be a BitBuffer",
                    ))
                }
                (k, SegmentValue::Codepoint(cp)) if k.is_utf() => {
                    validate_scalar(*cp)?;
                }
                (k, SegmentValue::Str(_)) if k.is_utf() => {}
                (k, _) if k.is_utf() => {
                    return Err(CodecError::new(
                        ErrorKind::InvalidType,
                        "UTF segment value must be a codepoint or a string",
                    ))
                }
                (SegmentKind::Float, SegmentValue::Float(_)) => {}
                (SegmentKind::Float, _) => {
                    return Err(CodecError::new(
                        ErrorKind::InvalidType,
                        "Float segment value must be a float",
                    ))
                }
                (SegmentKind::Integer, SegmentValue::Int(_) | SegmentValue::BigInt(_)) => {}
                (SegmentKind::Integer, _) => {
                    return Err(CodecError::new(
                        ErrorKind::InvalidType,
                        "Integer segment value must be an integer",
                    ))
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Validate a Unicode scalar per §4.3: `0 <= c <= 0x10FFFF`, surrogates
/// forbidden.
pub fn validate_scalar(c: u32) -> CodecResult<()> {
    if c > 0x10FFFF || (0xD800..=0xDFFF).contains(&c) {
        return Err(CodecError::new(
            ErrorKind::InvalidUnicodeCodepoint,
            format!("{:#X} is not a valid Unicode scalar", c),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_defaults_are_valid() {
        let seg = SegmentSpec::new(SegmentKind::Integer).with_value(42i128);
        assert!(seg.validate(true).is_ok());
        assert_eq!(seg.effective_unit(), 1);
    }

    #[test]
    fn float_rejects_bad_size() {
        let seg = SegmentSpec::new(SegmentKind::Float)
            .with_value(1.0f64)
            .with_size(48);
        assert_eq!(
            seg.validate(true).unwrap_err().kind(),
            ErrorKind::InvalidFloatSize
        );
    }

    #[test]
    fn utf_rejects_explicit_size() {
        let seg = SegmentSpec::new(SegmentKind::Utf8)
            .with_value(SegmentValue::Codepoint(0x41))
            .with_size(8);
        assert_eq!(
            seg.validate(true).unwrap_err().kind(),
            ErrorKind::UTFSizeSpecified
        );
    }

    #[test]
    fn utf_rejects_nonunit_unit() {
        let seg = SegmentSpec::new(SegmentKind::Utf16)
            .with_value(SegmentValue::Codepoint(0x41))
            .with_unit(2);
        assert_eq!(
            seg.validate(true).unwrap_err().kind(),
            ErrorKind::UTFUnitModified
        );
    }

    #[test]
    fn binary_requires_size_unless_dynamic_or_rest() {
        let seg = SegmentSpec::new(SegmentKind::Binary).with_value(vec![1, 2, 3]);
        assert_eq!(
            seg.validate(true).unwrap_err().kind(),
            ErrorKind::BinarySizeRequired
        );

        let dynamic = SegmentSpec::new(SegmentKind::Binary)
            .with_value(vec![1, 2, 3])
            .with_dynamic(DynamicSize::Expr("n*8".into()));
        assert!(dynamic.validate(true).is_ok());
    }

    #[test]
    fn rest_segment_must_be_last() {
        let seg = SegmentSpec::new(SegmentKind::RestBinary);
        assert_eq!(
            seg.validate(false).unwrap_err().kind(),
            ErrorKind::InvalidSegment
        );
        assert!(seg.validate(true).is_ok());
    }

    #[test]
    fn unit_out_of_range_rejected() {
        let seg = SegmentSpec::new(SegmentKind::Integer)
            .with_value(1i128)
            .with_unit(0);
        assert_eq!(
            seg.validate(true).unwrap_err().kind(),
            ErrorKind::InvalidUnit
        );
    }

    #[test]
    fn scalar_validation_rejects_surrogates() {
        assert!(validate_scalar(0xD800).is_err());
        assert!(validate_scalar(0x10FFFF).is_ok());
        assert!(validate_scalar(0x110000).is_err());
    }
}
