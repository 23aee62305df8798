use bitsyntax_codec::builder::Builder;
use bitsyntax_codec::matcher::Matcher;
use bitsyntax_core::segment::{DynamicSize, MatchedValue};
use bitsyntax_core::Endianness;

#[test]
fn s1_mixed_segments_round_trip_through_builder_and_matcher() {
    let mut builder = Builder::new();
    builder.add_integer(42, Some(8), None, false, Endianness::Big);
    builder.add_integer(17, Some(8), None, false, Endianness::Big);
    builder.add_binary(b"hello".to_vec(), None, None);
    let (buffer, err) = builder.build();
    assert!(err.is_none());
    assert_eq!(buffer.to_bytes(), vec![42, 17, 104, 101, 108, 108, 111]);

    let mut matcher = Matcher::new();
    matcher.integer(Some(8), None, false, Endianness::Big, None, None);
    matcher.integer(Some(8), None, false, Endianness::Big, None, None);
    matcher.binary(Some(40), Some(1), None, None);
    let outcome = matcher.match_against(&buffer);

    assert!(outcome.succeeded());
    assert_eq!(outcome.results[0].value, Some(MatchedValue::Int(42)));
    assert_eq!(outcome.results[1].value, Some(MatchedValue::Int(17)));
    assert_eq!(
        outcome.results[2].value,
        Some(MatchedValue::Bytes(b"hello".to_vec()))
    );
}

#[test]
fn s2_little_endian_build_big_endian_match_byteswaps() {
    let mut builder = Builder::new();
    builder.add_integer(0x1234, Some(16), None, false, Endianness::Little);
    let (buffer, _) = builder.build();
    assert_eq!(buffer.to_bytes(), vec![0x34, 0x12]);

    let mut matcher = Matcher::new();
    matcher.integer(Some(16), None, false, Endianness::Big, None, None);
    let outcome = matcher.match_against(&buffer);
    assert_eq!(outcome.results[0].value, Some(MatchedValue::Int(0x3412)));
}

#[test]
fn s3_dynamic_size_expression_and_trailing_rest() {
    let mut builder = Builder::new();
    builder.add_integer(5, Some(8), None, false, Endianness::Big);
    builder.add_binary(b"Hello".to_vec(), None, None);
    builder.add_binary(b" World".to_vec(), None, None);
    let (buffer, _) = builder.build();

    let mut matcher = Matcher::new();
    matcher.integer(Some(8), None, false, Endianness::Big, None, Some("size"));
    matcher.binary(
        None,
        Some(1),
        Some(DynamicSize::Expr("size*8".into())),
        Some("payload"),
    );
    matcher.rest_binary(Some("rest"));
    let outcome = matcher.match_against(&buffer);

    assert!(outcome.succeeded());
    assert_eq!(outcome.bindings["size"], MatchedValue::Int(5));
    assert_eq!(outcome.bindings["payload"], MatchedValue::Bytes(b"Hello".to_vec()));
    assert_eq!(outcome.bindings["rest"], MatchedValue::Bytes(b" World".to_vec()));
}

#[test]
fn s4_seven_single_bit_integers_pack_msb_first() {
    let mut builder = Builder::new();
    for bit in [1, 0, 1, 0, 1, 1, 1] {
        builder.add_integer(bit, Some(1), None, false, Endianness::Big);
    }
    let (buffer, err) = builder.build();
    assert!(err.is_none());
    assert_eq!(buffer.len(), 7);
    assert_eq!(buffer.to_bytes()[0] >> 1, 0b1010111);
}

#[test]
fn s5_utf8_supplementary_codepoint_round_trips() {
    let mut builder = Builder::new();
    builder.add_utf8_codepoint(0x1F680);
    let (buffer, err) = builder.build();
    assert!(err.is_none());
    assert_eq!(buffer.to_bytes(), vec![0xF0, 0x9F, 0x9A, 0x80]);

    let mut matcher = Matcher::new();
    matcher.utf8(None);
    let outcome = matcher.match_against(&buffer);
    assert_eq!(outcome.results[0].value, Some(MatchedValue::Codepoint(0x1F680)));
}

#[test]
fn s6_invalid_codepoint_is_a_sticky_builder_error() {
    let mut builder = Builder::new();
    builder.add_utf8_codepoint(0xD800);
    let (buffer, err) = builder.build();
    assert!(buffer.is_empty());
    assert!(err.is_some());
}

#[test]
fn round_trip_property_survives_through_builder_and_matcher() {
    // Property 3: re-encoding a matcher's extracted values with the same
    // segment spec reproduces the original buffer bit-for-bit.
    let mut builder = Builder::new();
    builder.add_integer(-5, Some(8), None, true, Endianness::Big);
    builder.add_float(2.5, Some(32), Endianness::Big);
    let (buffer, _) = builder.build();

    let mut matcher = Matcher::new();
    matcher.integer(Some(8), None, true, Endianness::Big, None, None);
    matcher.float(Some(32), Endianness::Big, Default::default(), None);
    let outcome = matcher.match_against(&buffer);
    assert!(outcome.succeeded());

    let MatchedValue::Int(decoded_int) = outcome.results[0].value.clone().unwrap() else {
        panic!("expected an integer");
    };
    let MatchedValue::Float(decoded_float) = outcome.results[1].value.clone().unwrap() else {
        panic!("expected a float");
    };
    assert_eq!(decoded_int, -5);
    assert_eq!(decoded_float, 2.5);

    let mut rebuilt = Builder::new();
    rebuilt.add_integer(decoded_int, Some(8), None, true, Endianness::Big);
    rebuilt.add_float(decoded_float, Some(32), Endianness::Big);
    let (rebuilt_buffer, _) = rebuilt.build();
    assert_eq!(rebuilt_buffer.to_bytes(), buffer.to_bytes());
}
