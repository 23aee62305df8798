//! Bit syntax codec engine.
//!
//! This crate provides the encode/decode machinery for Erlang-style bit
//! syntax: per-kind codecs for integers, IEEE-754 floats and Unicode
//! scalars, a tiny arithmetic expression evaluator for dynamically sized
//! segments, and the [`Builder`]/[`Matcher`] drivers that sequence a
//! segment pattern against a [`bitsyntax_core::BitBuffer`].

mod bitops;
pub mod builder;
pub mod expr;
pub mod float;
pub mod integer;
pub mod matcher;
pub mod utf;

pub use builder::Builder;
pub use float::FloatMatchMode;
pub use matcher::{MatchOutcome, Matcher, SegmentResult};
