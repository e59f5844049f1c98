//! Skytag token language
//!
//! This crate defines the plain-text tokens accepted by `skytag` and parses
//! them into a typed [`Token`]:
//! - selections by name glob, tag existence, or tag comparison (with optional
//!   angular unit suffix), and
//! - mutations that assign a typed value, set/clear a boolean, or remove a tag.
//!
//! It also owns the tag value model ([`TagValue`]) and literal coercion, so the
//! catalog and engine crates share one notion of "a typed tag".

pub mod predicate;
pub mod token;
pub mod value;

pub use predicate::{AngleUnit, CompareOp, Comparison, ARCMIN, ARCSEC, DEG};
pub use token::{classify, Assignment, BoolOp, Token, TokenError};
pub use value::{auto_detect, coerce, CoerceError, Complex, TagValue, ValueType};
