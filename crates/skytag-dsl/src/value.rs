//! Typed tag values and literal coercion.
//!
//! A tag literal is either coerced to an explicitly requested [`ValueType`]
//! (`TAG=int:5`) or auto-detected (`TAG=5`). Auto-detection tries, in order:
//! integer, floating-point, complex, text. Text always succeeds, so
//! auto-detection never fails.

use nom::{
    branch::alt,
    character::complete::one_of,
    combinator::{all_consuming, map, map_res, opt, peek},
    number::complete::recognize_float,
    sequence::{pair, preceded, terminated},
    IResult,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Types
// ============================================================================

/// The closed set of tag value types that can be requested explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Complex,
    Text,
}

impl ValueType {
    /// Auto-detection order. `Text` last: it always succeeds.
    pub const AUTO_DETECT_ORDER: [ValueType; 4] = [
        ValueType::Int,
        ValueType::Float,
        ValueType::Complex,
        ValueType::Text,
    ];

    /// The keyword used in `TAG=<keyword>:VALUE`.
    pub fn keyword(self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Complex => "complex",
            ValueType::Text => "str",
        }
    }

    /// Exact, case-sensitive keyword lookup.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "bool" => Some(ValueType::Bool),
            "int" => Some(ValueType::Int),
            "float" => Some(ValueType::Float),
            "complex" => Some(ValueType::Complex),
            "str" => Some(ValueType::Text),
            _ => None,
        }
    }

    /// Coerce `text` to this type.
    pub fn coerce(self, text: &str) -> Result<TagValue, CoerceError> {
        let parsed = match self {
            ValueType::Bool => parse_bool(text).map(TagValue::Bool),
            ValueType::Int => parse_int(text).map(TagValue::Int),
            ValueType::Float => parse_float(text).map(TagValue::Float),
            ValueType::Complex => parse_complex(text).map(TagValue::Complex),
            ValueType::Text => Some(TagValue::Text(text.to_string())),
        };
        parsed.ok_or_else(|| CoerceError::Unparseable {
            value: text.to_string(),
            ty: self,
        })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A complex number as stored on a tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    #[serde(with = "json_f64")]
    pub re: f64,
    #[serde(with = "json_f64")]
    pub im: f64,
}

impl Complex {
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub fn is_zero(&self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `2j` for pure imaginary, `(1+2j)` otherwise; both parse back.
        if self.re == 0.0 && self.re.is_sign_positive() {
            return write!(f, "{}j", component(self.im));
        }
        let sign = if self.im.is_sign_negative() { '-' } else { '+' };
        write!(
            f,
            "({}{}{}j)",
            component(self.re),
            sign,
            component(self.im.abs())
        )
    }
}

fn component(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

/// `f64` fields in model files. JSON has no NaN or infinity, so those are
/// written as the strings `"nan"`, `"inf"` and `"-inf"` and read back from
/// them.
mod json_f64 {
    use super::*;
    use serde::de::Error as _;

    const NAN: &str = "nan";
    const INF: &str = "inf";
    const NEG_INF: &str = "-inf";

    pub fn serialize<S: Serializer>(v: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if v.is_finite() {
            serializer.serialize_f64(*v)
        } else if v.is_nan() {
            serializer.serialize_str(NAN)
        } else if v.is_sign_positive() {
            serializer.serialize_str(INF)
        } else {
            serializer.serialize_str(NEG_INF)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Word(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Word(w) => match w.as_str() {
                NAN => Ok(f64::NAN),
                INF => Ok(f64::INFINITY),
                NEG_INF => Ok(f64::NEG_INFINITY),
                _ => Err(D::Error::custom(format!("expected a number, got \"{w}\""))),
            },
        }
    }
}

/// A typed tag value.
///
/// Serialized untagged so sky model files stay readable: JSON booleans,
/// integers, floats and strings map directly; complex values are `{re, im}`.
/// Non-finite floats are stored as `"nan"`, `"inf"` or `"-inf"` and load
/// back as floats, the same type `auto_detect` gives those words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Float(#[serde(with = "json_f64")] f64),
    Complex(Complex),
    Text(String),
}

impl TagValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            TagValue::Bool(_) => ValueType::Bool,
            TagValue::Int(_) => ValueType::Int,
            TagValue::Float(_) => ValueType::Float,
            TagValue::Complex(_) => ValueType::Complex,
            TagValue::Text(_) => ValueType::Text,
        }
    }

    /// Truthiness used by `=TAG` existence selection: non-zero numbers,
    /// `true`, and non-empty text.
    pub fn is_truthy(&self) -> bool {
        match self {
            TagValue::Bool(b) => *b,
            TagValue::Int(i) => *i != 0,
            TagValue::Float(f) => *f != 0.0,
            TagValue::Complex(c) => !c.is_zero(),
            TagValue::Text(s) => !s.is_empty(),
        }
    }

    /// Real value for ordering comparisons. `None` for complex and text.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            TagValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            TagValue::Int(i) => Some(*i as f64),
            TagValue::Float(f) => Some(*f),
            TagValue::Complex(_) | TagValue::Text(_) => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Bool(true) => f.write_str("True"),
            TagValue::Bool(false) => f.write_str("False"),
            TagValue::Int(i) => write!(f, "{i}"),
            // Debug keeps a `.0` / exponent so the text re-detects as float.
            TagValue::Float(v) => write!(f, "{v:?}"),
            TagValue::Complex(c) => write!(f, "{c}"),
            TagValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        TagValue::Bool(v)
    }
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        TagValue::Int(v)
    }
}

impl From<f64> for TagValue {
    fn from(v: f64) -> Self {
        TagValue::Float(v)
    }
}

impl From<Complex> for TagValue {
    fn from(v: Complex) -> Self {
        TagValue::Complex(v)
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        TagValue::Text(v.to_string())
    }
}

// ============================================================================
// Coercion
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoerceError {
    #[error("Can't parse \"{value}\" as a value of type {ty}")]
    Unparseable { value: String, ty: ValueType },
}

/// Coerce a literal, explicitly typed or auto-detected.
pub fn coerce(text: &str, ty: Option<ValueType>) -> Result<TagValue, CoerceError> {
    match ty {
        Some(ty) => ty.coerce(text),
        None => Ok(auto_detect(text)),
    }
}

/// First successful parse in [`ValueType::AUTO_DETECT_ORDER`].
pub fn auto_detect(text: &str) -> TagValue {
    ValueType::AUTO_DETECT_ORDER
        .iter()
        .find_map(|ty| ty.coerce(text).ok())
        .unwrap_or_else(|| TagValue::Text(text.to_string()))
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_lowercase().as_str() {
        "true" | "t" => Some(true),
        "false" | "f" => Some(false),
        _ => parse_int(text).map(|i| i != 0),
    }
}

fn parse_int(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}

fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

/// Complex literals: `1`, `2j`, `-j`, `1+2j`, `1.5e3-0.5J`, optionally in
/// parentheses.
fn parse_complex(text: &str) -> Option<Complex> {
    let text = text.trim();
    let text = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .map(str::trim)
        .unwrap_or(text);

    alt((
        all_consuming(map(imaginary, |im| Complex::new(0.0, im))),
        all_consuming(map(
            pair(real, preceded(peek(one_of("+-")), imaginary)),
            |(re, im)| Complex::new(re, im),
        )),
        all_consuming(map(real, |re| Complex::new(re, 0.0))),
    ))(text)
    .ok()
    .map(|(_, c)| c)
}

fn real(input: &str) -> IResult<&str, f64> {
    map_res(recognize_float, |s: &str| s.parse::<f64>())(input)
}

fn imaginary_unit(input: &str) -> IResult<&str, char> {
    one_of("jJ")(input)
}

fn imaginary(input: &str) -> IResult<&str, f64> {
    alt((
        terminated(real, imaginary_unit),
        map(terminated(opt(one_of("+-")), imaginary_unit), |sign| {
            if sign == Some('-') {
                -1.0
            } else {
                1.0
            }
        }),
    ))(input)
}
