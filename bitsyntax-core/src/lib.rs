//! Core data model for the bitsyntax codec.
//!
//! This crate provides the types shared by the builder and matcher
//! drivers in `bitsyntax-codec`: the bit-precise [`BitBuffer`], byte-order
//! handling, segment descriptors, the variable binding table, and the
//! stable [`CodecError`] taxonomy. It performs no encoding or decoding
//! itself.

pub mod binding;
pub mod bitbuffer;
pub mod endian;
pub mod error;
pub mod segment;

pub use binding::VariableTable;
pub use bitbuffer::BitBuffer;
pub use endian::{Endianness, ResolvedEndianness};
pub use error::{CodecError, CodecResult, ErrorKind};
pub use segment::{DynamicSize, MatchedValue, SegmentKind, SegmentSpec, SegmentValue};
