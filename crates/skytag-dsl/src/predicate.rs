//! Comparison operators and angular units for `TAG<op>VALUE[unit]` selections.

use crate::value::TagValue;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// One degree in radians.
pub const DEG: f64 = PI / 180.0;
/// One arc-minute in radians.
pub const ARCMIN: f64 = DEG / 60.0;
/// One arc-second in radians.
pub const ARCSEC: f64 = DEG / 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Every accepted spelling, longest-match first among overlapping ones.
    ///
    /// The FORTRAN-style spellings are matched case-insensitively.
    pub const SPELLINGS: [(&'static str, CompareOp); 12] = [
        ("==", CompareOp::Eq),
        ("!=", CompareOp::Ne),
        (">=", CompareOp::Ge),
        ("<=", CompareOp::Le),
        (">", CompareOp::Gt),
        ("<", CompareOp::Lt),
        (".eq.", CompareOp::Eq),
        (".ne.", CompareOp::Ne),
        (".ge.", CompareOp::Ge),
        (".le.", CompareOp::Le),
        (".gt.", CompareOp::Gt),
        (".lt.", CompareOp::Lt),
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    pub fn fortran(self) -> &'static str {
        match self {
            CompareOp::Eq => ".eq.",
            CompareOp::Ne => ".ne.",
            CompareOp::Lt => ".lt.",
            CompareOp::Le => ".le.",
            CompareOp::Gt => ".gt.",
            CompareOp::Ge => ".ge.",
        }
    }

    /// Case-insensitive lookup of a complete operator spelling.
    pub fn from_spelling(spelling: &str) -> Option<Self> {
        Self::SPELLINGS
            .iter()
            .find(|(s, _)| s.eq_ignore_ascii_case(spelling))
            .map(|(_, op)| *op)
    }

    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
        }
    }

    /// Compare a tag value against a real threshold.
    ///
    /// Real-valued tags (bool, int, float) compare numerically. Complex tags
    /// support only `==`/`!=` against `rhs + 0j`. Text never equals a number
    /// and has no ordering.
    pub fn test(self, value: &TagValue, rhs: f64) -> bool {
        if let Some(lhs) = value.as_real() {
            return self.apply(lhs, rhs);
        }
        let equal = match value {
            TagValue::Complex(c) => c.re == rhs && c.im == 0.0,
            _ => false,
        };
        match self {
            CompareOp::Eq => equal,
            CompareOp::Ne => !equal,
            _ => false,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Optional unit suffix on a comparison literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    Degrees,
    ArcMinutes,
    ArcSeconds,
}

impl AngleUnit {
    pub fn from_suffix(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'd' => Some(AngleUnit::Degrees),
            'm' => Some(AngleUnit::ArcMinutes),
            's' => Some(AngleUnit::ArcSeconds),
            _ => None,
        }
    }

    pub fn suffix(self) -> char {
        match self {
            AngleUnit::Degrees => 'd',
            AngleUnit::ArcMinutes => 'm',
            AngleUnit::ArcSeconds => 's',
        }
    }

    /// Radians per unit.
    pub fn radians(self) -> f64 {
        match self {
            AngleUnit::Degrees => DEG,
            AngleUnit::ArcMinutes => ARCMIN,
            AngleUnit::ArcSeconds => ARCSEC,
        }
    }
}

/// A parsed `TAG<op>VALUE[unit]` selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub tag: String,
    pub op: CompareOp,
    pub literal: f64,
    pub unit: Option<AngleUnit>,
}

impl Comparison {
    /// The right-hand side after unit scaling.
    pub fn threshold(&self) -> f64 {
        match self.unit {
            Some(unit) => self.literal * unit.radians(),
            None => self.literal,
        }
    }

    pub fn matches(&self, value: &TagValue) -> bool {
        self.op.test(value, self.threshold())
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.tag, self.op, self.literal)?;
        if let Some(unit) = self.unit {
            write!(f, "{}", unit.suffix())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Complex;
    use approx::assert_relative_eq;

    #[test]
    fn units_scale_to_radians() {
        assert_relative_eq!(AngleUnit::Degrees.radians() * 180.0, PI);
        assert_relative_eq!(AngleUnit::ArcMinutes.radians() * 60.0, DEG);
        assert_relative_eq!(AngleUnit::ArcSeconds.radians() * 3600.0, DEG);
    }

    #[test]
    fn fortran_spellings_are_case_insensitive() {
        assert_eq!(CompareOp::from_spelling(".GT."), Some(CompareOp::Gt));
        assert_eq!(CompareOp::from_spelling(".Le."), Some(CompareOp::Le));
        assert_eq!(CompareOp::from_spelling("="), None);
    }

    #[test]
    fn every_op_has_symbolic_and_fortran_spelling() {
        for op in [
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::Lt,
            CompareOp::Le,
            CompareOp::Gt,
            CompareOp::Ge,
        ] {
            assert_eq!(CompareOp::from_spelling(op.symbol()), Some(op));
            assert_eq!(CompareOp::from_spelling(op.fortran()), Some(op));
        }
    }

    #[test]
    fn threshold_applies_unit() {
        let c = Comparison {
            tag: "r".into(),
            op: CompareOp::Lt,
            literal: 2.0,
            unit: Some(AngleUnit::Degrees),
        };
        assert_relative_eq!(c.threshold(), 2.0 * DEG);
        assert!(c.matches(&TagValue::Float(DEG)));
        assert!(!c.matches(&TagValue::Float(3.0 * DEG)));
    }

    #[test]
    fn non_real_values() {
        let z = TagValue::Complex(Complex::new(2.0, 0.0));
        assert!(CompareOp::Eq.test(&z, 2.0));
        assert!(!CompareOp::Ge.test(&z, 1.0));

        let text = TagValue::Text("x".into());
        assert!(!CompareOp::Eq.test(&text, 0.0));
        assert!(CompareOp::Ne.test(&text, 0.0));
        assert!(!CompareOp::Lt.test(&text, 10.0));
    }

    #[test]
    fn bools_compare_as_zero_and_one() {
        assert!(CompareOp::Eq.test(&TagValue::Bool(true), 1.0));
        assert!(CompareOp::Lt.test(&TagValue::Bool(false), 0.5));
    }
}
