//! Matcher driver: sequential segment decoding with alignment enforcement
//! and variable binding (§4.9).
//!
//! A [`Matcher`] accumulates a segment pattern, then [`Matcher::match_against`]
//! consumes it once against an input [`BitBuffer`], threading a bit cursor
//! and a [`VariableTable`] through each segment in declaration order.

use std::collections::HashMap;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use bitsyntax_core::error::{CodecError, CodecResult, ErrorKind};
use bitsyntax_core::segment::{DynamicSize, MatchedValue, SegmentKind, SegmentSpec};
use bitsyntax_core::{BitBuffer, Endianness, VariableTable};

use crate::expr;
use crate::float::{decode_float, FloatMatchMode};
use crate::integer::decode_int;
use crate::utf::{decode_utf16, decode_utf32, decode_utf8};

struct MatchSegment {
    spec: SegmentSpec,
    float_mode: FloatMatchMode,
}

/// One segment's outcome within a [`MatchOutcome`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentResult {
    pub matched: bool,
    pub value: Option<MatchedValue>,
}

/// The result of running a [`Matcher`] against an input buffer.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchOutcome {
    pub results: Vec<SegmentResult>,
    pub bindings: HashMap<String, MatchedValue>,
    pub error: Option<CodecError>,
}

impl MatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Sequentially decodes heterogeneous bit segments out of one [`BitBuffer`].
pub struct Matcher {
    segments: Vec<MatchSegment>,
}

impl Matcher {
    pub fn new() -> Self {
        Self { segments: Vec::new() }
    }

    pub fn integer(
        &mut self,
        size: Option<u32>,
        unit: Option<u16>,
        signed: bool,
        endianness: Endianness,
        dynamic: Option<DynamicSize>,
        name: Option<&str>,
    ) -> &mut Self {
        let mut spec = SegmentSpec::new(SegmentKind::Integer)
            .with_endianness(endianness)
            .with_signed(signed);
        if let Some(s) = size {
            spec = spec.with_size(s);
        }
        if let Some(u) = unit {
            spec = spec.with_unit(u);
        }
        if let Some(d) = dynamic {
            spec = spec.with_dynamic(d);
        }
        if let Some(n) = name {
            spec = spec.with_name(n);
        }
        self.push(spec, FloatMatchMode::AcceptAll)
    }

    pub fn float(
        &mut self,
        size: Option<u32>,
        endianness: Endianness,
        mode: FloatMatchMode,
        name: Option<&str>,
    ) -> &mut Self {
        let mut spec = SegmentSpec::new(SegmentKind::Float).with_endianness(endianness);
        if let Some(s) = size {
            spec = spec.with_size(s);
        }
        if let Some(n) = name {
            spec = spec.with_name(n);
        }
        self.push(spec, mode)
    }

    pub fn binary(
        &mut self,
        size: Option<u32>,
        unit: Option<u16>,
        dynamic: Option<DynamicSize>,
        name: Option<&str>,
    ) -> &mut Self {
        let mut spec = SegmentSpec::new(SegmentKind::Binary);
        if let Some(s) = size {
            spec = spec.with_size(s);
        }
        if let Some(u) = unit {
            spec = spec.with_unit(u);
        }
        if let Some(d) = dynamic {
            spec = spec.with_dynamic(d);
        }
        if let Some(n) = name {
            spec = spec.with_name(n);
        }
        self.push(spec, FloatMatchMode::AcceptAll)
    }

    pub fn bitstring(
        &mut self,
        size: Option<u32>,
        unit: Option<u16>,
        dynamic: Option<DynamicSize>,
        name: Option<&str>,
    ) -> &mut Self {
        let mut spec = SegmentSpec::new(SegmentKind::Bitstring);
        if let Some(s) = size {
            spec = spec.with_size(s);
        }
        if let Some(u) = unit {
            spec = spec.with_unit(u);
        }
        if let Some(d) = dynamic {
            spec = spec.with_dynamic(d);
        }
        if let Some(n) = name {
            spec = spec.with_name(n);
        }
        self.push(spec, FloatMatchMode::AcceptAll)
    }

    pub fn utf8(&mut self, name: Option<&str>) -> &mut Self {
        self.push_named(SegmentKind::Utf8, Endianness::Big, name)
    }

    pub fn utf16(&mut self, endianness: Endianness, name: Option<&str>) -> &mut Self {
        self.push_named(SegmentKind::Utf16, endianness, name)
    }

    pub fn utf32(&mut self, endianness: Endianness, name: Option<&str>) -> &mut Self {
        self.push_named(SegmentKind::Utf32, endianness, name)
    }

    pub fn rest_binary(&mut self, name: Option<&str>) -> &mut Self {
        self.push_named(SegmentKind::RestBinary, Endianness::Big, name)
    }

    pub fn rest_bitstring(&mut self, name: Option<&str>) -> &mut Self {
        self.push_named(SegmentKind::RestBitstring, Endianness::Big, name)
    }

    fn push_named(&mut self, kind: SegmentKind, endianness: Endianness, name: Option<&str>) -> &mut Self {
        let mut spec = SegmentSpec::new(kind).with_endianness(endianness);
        if let Some(n) = name {
            spec = spec.with_name(n);
        }
        self.push(spec, FloatMatchMode::AcceptAll)
    }

    fn push(&mut self, spec: SegmentSpec, float_mode: FloatMatchMode) -> &mut Self {
        self.segments.push(MatchSegment { spec, float_mode });
        self
    }

    /// Consume `self`, matching every registered segment against `input`
    /// in order.
    pub fn match_against(self, input: &BitBuffer) -> MatchOutcome {
        let total = self.segments.len();
        for (index, seg) in self.segments.iter().enumerate() {
            let is_last = index + 1 == total;
            if let Err(err) = seg.spec.validate(is_last) {
                return MatchOutcome {
                    results: Vec::new(),
                    bindings: HashMap::new(),
                    error: Some(err.at_segment(index)),
                };
            }
        }

        let mut cursor = 0usize;
        let len = input.len();
        let mut results = Vec::with_capacity(total);
        let mut bindings = HashMap::new();
        let mut vars = VariableTable::new();

        for (index, seg) in self.segments.iter().enumerate() {
            match decode_one(seg, input, cursor, len, &vars) {
                Ok((value, consumed)) => {
                    log::trace!(
                        "segment[{index}] kind={:?} cursor={cursor} consumed={consumed}",
                        seg.spec.kind
                    );
                    if let Some(name) = &seg.spec.name {
                        if let Some(i) = value.as_i64() {
                            vars.bind(name.clone(), i);
                        }
                        bindings.insert(name.clone(), value.clone());
                    }
                    results.push(SegmentResult {
                        matched: true,
                        value: Some(value),
                    });
                    cursor += consumed;
                }
                Err(err) => {
                    log::debug!("segment[{index}] failed at cursor={cursor}: {err}");
                    results.push(SegmentResult {
                        matched: false,
                        value: None,
                    });
                    return MatchOutcome {
                        results,
                        bindings,
                        error: Some(err.at_segment(index)),
                    };
                }
            }
        }

        MatchOutcome {
            results,
            bindings,
            error: None,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_one(
    seg: &MatchSegment,
    input: &BitBuffer,
    cursor: usize,
    len: usize,
    vars: &VariableTable,
) -> CodecResult<(MatchedValue, usize)> {
    let spec = &seg.spec;
    match spec.kind {
        SegmentKind::RestBinary => {
            let n = len - cursor;
            if n % 8 != 0 {
                return Err(CodecError::new(
                    ErrorKind::AlignmentMismatch,
                    format!("{} trailing bits do not form whole bytes", n),
                ));
            }
            let bits = input.slice_bits(cursor, n)?;
            Ok((MatchedValue::Bytes(bits.to_bytes()), n))
        }
        SegmentKind::RestBitstring => {
            let n = len - cursor;
            let bits = input.slice_bits(cursor, n)?;
            Ok((MatchedValue::Bits(bits), n))
        }
        SegmentKind::Utf8 => {
            let window = utf_window_bits(cursor, len)?;
            let bytes = input.slice_bits(cursor, window)?.to_bytes();
            let (scalar, consumed) = decode_utf8(&bytes)?;
            Ok((MatchedValue::Codepoint(scalar), consumed * 8))
        }
        SegmentKind::Utf16 => {
            let window = utf_window_bits(cursor, len)?;
            let bytes = input.slice_bits(cursor, window)?.to_bytes();
            let (scalar, consumed) = decode_utf16(&bytes, spec.endianness)?;
            Ok((MatchedValue::Codepoint(scalar), consumed * 8))
        }
        SegmentKind::Utf32 => {
            let window = utf_window_bits(cursor, len)?;
            let bytes = input.slice_bits(cursor, window)?.to_bytes();
            let (scalar, consumed) = decode_utf32(&bytes, spec.endianness)?;
            Ok((MatchedValue::Codepoint(scalar), consumed * 8))
        }
        SegmentKind::Integer => {
            let n = resolve_static_or_dynamic(spec, vars)?;
            check_bounds(cursor, n, len)?;
            let bits = input.slice_bits(cursor, n as usize)?;
            let value = decode_int(&bits, spec.signed, spec.endianness)?;
            Ok((big_to_matched(value), n as usize))
        }
        SegmentKind::Float => {
            let n = resolve_static_or_dynamic(spec, vars)?;
            check_bounds(cursor, n, len)?;
            let bits = input.slice_bits(cursor, n as usize)?;
            let value = decode_float(&bits, spec.endianness, seg.float_mode)?;
            Ok((MatchedValue::Float(value), n as usize))
        }
        SegmentKind::Binary => {
            let n = resolve_static_or_dynamic(spec, vars)?;
            if n % 8 != 0 {
                return Err(CodecError::new(
                    ErrorKind::AlignmentMismatch,
                    "binary segments must resolve to a whole number of bytes",
                ));
            }
            check_bounds(cursor, n, len)?;
            let bits = input.slice_bits(cursor, n as usize)?;
            Ok((MatchedValue::Bytes(bits.to_bytes()), n as usize))
        }
        SegmentKind::Bitstring => {
            let n = resolve_static_or_dynamic(spec, vars)?;
            check_bounds(cursor, n, len)?;
            let bits = input.slice_bits(cursor, n as usize)?;
            Ok((MatchedValue::Bits(bits), n as usize))
        }
    }
}

/// UTF segments decode byte-at-a-time; the cursor must sit on a byte
/// boundary and the peek window is capped at 4 bytes (the longest any of
/// UTF-8/16/32 ever need) and floored to a whole number of bytes.
fn utf_window_bits(cursor: usize, len: usize) -> CodecResult<usize> {
    if cursor % 8 != 0 {
        return Err(CodecError::new(
            ErrorKind::AlignmentMismatch,
            "UTF segments must start on a byte boundary",
        ));
    }
    let available_bytes = (len - cursor) / 8;
    Ok(available_bytes.min(4) * 8)
}

fn check_bounds(cursor: usize, n: u32, len: usize) -> CodecResult<()> {
    if cursor + n as usize > len {
        return Err(CodecError::new(
            ErrorKind::InsufficientBits,
            format!("need {} bits at cursor {}, only {} remain", n, cursor, len - cursor),
        ));
    }
    Ok(())
}

fn resolve_static_or_dynamic(spec: &SegmentSpec, vars: &VariableTable) -> CodecResult<u32> {
    let unit = spec.effective_unit() as u32;
    let raw: i64 = match &spec.dynamic {
        Some(DynamicSize::VarRef(name)) => vars
            .get(name)
            .ok_or_else(|| CodecError::new(ErrorKind::UnboundVariable, name.clone()))?,
        Some(DynamicSize::Expr(source)) => expr::evaluate(source, vars)?,
        None => spec.size.unwrap_or_else(|| spec.kind.default_size().unwrap_or(0)) as i64,
    };
    if raw < 0 {
        return Err(CodecError::new(ErrorKind::InvalidSize, format!("negative resolved size {}", raw)));
    }
    let raw = u32::try_from(raw)
        .map_err(|_| CodecError::new(ErrorKind::InvalidSize, format!("resolved size {} out of range", raw)))?;
    raw.checked_mul(unit)
        .ok_or_else(|| CodecError::new(ErrorKind::InvalidSize, "size * unit overflows"))
}

fn big_to_matched(value: BigInt) -> MatchedValue {
    match value.to_i128() {
        Some(v) => MatchedValue::Int(v),
        None => MatchedValue::BigInt(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    #[test]
    fn scenario_s1_round_trip() {
        let mut b = Builder::new();
        b.add_integer(42, Some(8), None, false, Endianness::Big);
        b.add_integer(17, Some(8), None, false, Endianness::Big);
        b.add_binary(b"hello".to_vec(), None, None);
        let (buf, _) = b.build();

        let mut m = Matcher::new();
        m.integer(Some(8), None, false, Endianness::Big, None, None);
        m.integer(Some(8), None, false, Endianness::Big, None, None);
        m.binary(Some(40), Some(1), None, None);
        let outcome = m.match_against(&buf);

        assert!(outcome.succeeded());
        assert_eq!(outcome.results[0].value, Some(MatchedValue::Int(42)));
        assert_eq!(outcome.results[1].value, Some(MatchedValue::Int(17)));
        assert_eq!(
            outcome.results[2].value,
            Some(MatchedValue::Bytes(b"hello".to_vec()))
        );
    }

    #[test]
    fn scenario_s2_little_endian_decoded_as_big() {
        let mut b = Builder::new();
        b.add_integer(0x1234, Some(16), None, false, Endianness::Little);
        let (buf, _) = b.build();

        let mut m = Matcher::new();
        m.integer(Some(16), None, false, Endianness::Big, None, None);
        let outcome = m.match_against(&buf);

        assert_eq!(outcome.results[0].value, Some(MatchedValue::Int(0x3412)));
    }

    #[test]
    fn scenario_s3_dynamic_size_and_rest() {
        let mut b = Builder::new();
        b.add_integer(5, Some(8), None, false, Endianness::Big);
        b.add_binary(b"Hello".to_vec(), None, None);
        b.add_binary(b" World".to_vec(), None, None);
        let (buf, _) = b.build();

        let mut m = Matcher::new();
        m.integer(Some(8), None, false, Endianness::Big, None, Some("size"));
        m.binary(None, Some(1), Some(DynamicSize::Expr("size*8".into())), Some("payload"));
        m.rest_binary(Some("rest"));
        let outcome = m.match_against(&buf);

        assert!(outcome.succeeded());
        assert_eq!(outcome.bindings["size"], MatchedValue::Int(5));
        assert_eq!(
            outcome.bindings["payload"],
            MatchedValue::Bytes(b"Hello".to_vec())
        );
        assert_eq!(
            outcome.bindings["rest"],
            MatchedValue::Bytes(b" World".to_vec())
        );
    }

    #[test]
    fn insufficient_bits_reports_failure_and_partial_results() {
        let buf = BitBuffer::from_bytes(vec![1]);
        let mut m = Matcher::new();
        m.integer(Some(8), None, false, Endianness::Big, None, None);
        m.integer(Some(16), None, false, Endianness::Big, None, None);
        let outcome = m.match_against(&buf);

        assert!(!outcome.succeeded());
        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.results[0].matched);
        assert!(!outcome.results[1].matched);
        assert_eq!(outcome.error.unwrap().kind(), ErrorKind::InsufficientBits);
    }

    #[test]
    fn rest_binary_requires_byte_alignment() {
        let buf = BitBuffer::from_bytes_with_len(vec![0xFF], 5).unwrap();
        let mut m = Matcher::new();
        m.integer(Some(3), None, false, Endianness::Big, None, None);
        m.rest_binary(None);
        let outcome = m.match_against(&buf);
        assert_eq!(outcome.error.unwrap().kind(), ErrorKind::AlignmentMismatch);
    }

    #[test]
    fn unbound_variable_fails_match() {
        let buf = BitBuffer::from_bytes(vec![1, 2]);
        let mut m = Matcher::new();
        m.binary(None, Some(1), Some(DynamicSize::VarRef("missing".into())), None);
        let outcome = m.match_against(&buf);
        assert_eq!(outcome.error.unwrap().kind(), ErrorKind::UnboundVariable);
    }

    #[test]
    fn dynamic_size_above_u32_max_is_invalid_size_not_truncated() {
        // A bound variable of 0x1_0000_0001 must not silently truncate to 1
        // when cast to u32; it has to fail with InvalidSize instead.
        let mut vars = VariableTable::new();
        vars.bind("huge", 0x1_0000_0001);
        let spec = SegmentSpec::new(SegmentKind::Binary)
            .with_unit(1)
            .with_dynamic(DynamicSize::VarRef("huge".into()));
        assert_eq!(
            resolve_static_or_dynamic(&spec, &vars).unwrap_err().kind(),
            ErrorKind::InvalidSize
        );
    }

    #[test]
    fn rest_segment_not_last_is_a_validation_error() {
        let buf = BitBuffer::from_bytes(vec![1, 2]);
        let mut m = Matcher::new();
        m.rest_binary(None);
        m.integer(Some(8), None, false, Endianness::Big, None, None);
        let outcome = m.match_against(&buf);
        assert_eq!(outcome.error.unwrap().kind(), ErrorKind::InvalidSegment);
        assert!(outcome.results.is_empty());
    }
}
