//! Token classification.
//!
//! Each command-line token is matched against the grammars below, in this
//! fixed priority order; the first that matches wins:
//!
//! 1. comparison selection  `TAG<op>VALUE[d|m|s]`
//! 2. existence selection   `=TAG`
//! 3. assignment            `PATH=[TYPE:]VALUE`
//! 4. boolean / removal     `+PATH`, `!PATH`, `/PATH`
//! 5. name glob selection   anything else
//!
//! Every grammar is a standalone function returning `None` when it does not
//! apply, so each can be exercised on its own.

use crate::predicate::{AngleUnit, CompareOp, Comparison};
use crate::value::{coerce, CoerceError, TagValue, ValueType};
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while1},
    character::complete::{char as pchar, one_of},
    combinator::{map, map_opt, opt},
    sequence::terminated,
    IResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// AST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Token {
    ComparisonSelect(Comparison),
    ExistenceSelect { tag: String },
    NameGlobSelect { pattern: String },
    Assignment(Assignment),
    BooleanOp { op: BoolOp, path: String },
}

impl Token {
    pub fn is_selection(&self) -> bool {
        matches!(
            self,
            Token::ComparisonSelect(_) | Token::ExistenceSelect { .. } | Token::NameGlobSelect { .. }
        )
    }

    pub fn is_mutation(&self) -> bool {
        !self.is_selection()
    }
}

/// `PATH=[TYPE:]VALUE`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub path: String,
    pub ty: Option<ValueType>,
    pub literal: String,
}

impl Assignment {
    pub fn value(&self) -> Result<TagValue, CoerceError> {
        coerce(&self.literal, self.ty)
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            Some(ty) => write!(f, "{}={}:{}", self.path, ty, self.literal),
            None => write!(f, "{}={}", self.path, self.literal),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOp {
    /// `+PATH`
    SetTrue,
    /// `!PATH`
    SetFalse,
    /// `/PATH`
    Remove,
}

impl BoolOp {
    pub fn from_prefix(c: char) -> Option<Self> {
        match c {
            '+' => Some(BoolOp::SetTrue),
            '!' => Some(BoolOp::SetFalse),
            '/' => Some(BoolOp::Remove),
            _ => None,
        }
    }

    pub fn prefix(self) -> char {
        match self {
            BoolOp::SetTrue => '+',
            BoolOp::SetFalse => '!',
            BoolOp::Remove => '/',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Malformed selection string '{token}': right-hand side is not a number.")]
    MalformedSelection { token: String },
}

// ============================================================================
// Classifier
// ============================================================================

type Grammar = fn(&str) -> Option<Result<Token, TokenError>>;

/// Grammars in priority order. The name-glob fallback is not listed: it
/// accepts whatever is left.
const GRAMMARS: [(&str, Grammar); 4] = [
    ("comparison", comparison_token),
    ("existence", existence_token),
    ("assignment", assignment_token),
    ("boolean", boolean_token),
];

fn comparison_token(token: &str) -> Option<Result<Token, TokenError>> {
    parse_comparison(token).map(|r| r.map(Token::ComparisonSelect))
}

fn existence_token(token: &str) -> Option<Result<Token, TokenError>> {
    parse_existence(token).map(|tag| Ok(Token::ExistenceSelect { tag }))
}

fn assignment_token(token: &str) -> Option<Result<Token, TokenError>> {
    parse_assignment(token).map(|a| Ok(Token::Assignment(a)))
}

fn boolean_token(token: &str) -> Option<Result<Token, TokenError>> {
    parse_boolean_op(token).map(|(op, path)| Ok(Token::BooleanOp { op, path }))
}

/// Classify a single token.
///
/// The only failure is a comparison whose right-hand side is not a number.
pub fn classify(token: &str) -> Result<Token, TokenError> {
    for (_name, grammar) in GRAMMARS {
        if let Some(result) = grammar(token) {
            return result;
        }
    }
    Ok(Token::NameGlobSelect {
        pattern: token.to_string(),
    })
}

/// `TAG<op>VALUE[unit]`.
///
/// `TAG` is a non-empty run free of `=<>!.`; `VALUE` is a non-empty run free
/// of the unit letters; the unit is an optional single `d`, `m` or `s`.
/// Matching is anchored at the start of the token only, so text after the
/// unit is ignored. Returns `Some(Err(..))` when the shape matches but
/// `VALUE` is not numeric.
pub fn parse_comparison(token: &str) -> Option<Result<Comparison, TokenError>> {
    let (_rest, (tag_name, op, literal, unit)) = comparison_parts(token).ok()?;
    let literal = match literal.trim().parse::<f64>() {
        Ok(v) => v,
        Err(_) => {
            return Some(Err(TokenError::MalformedSelection {
                token: token.to_string(),
            }))
        }
    };
    Some(Ok(Comparison {
        tag: tag_name.to_string(),
        op,
        literal,
        unit,
    }))
}

fn comparison_parts(input: &str) -> IResult<&str, (&str, CompareOp, &str, Option<AngleUnit>)> {
    let (input, tag_name) = take_while1(|c: char| !"=<>!.".contains(c))(input)?;
    let (input, op) = compare_op(input)?;
    let (input, literal) = take_while1(|c: char| !is_unit_char(c))(input)?;
    let (input, unit) = opt(map_opt(one_of("dmsDMS"), AngleUnit::from_suffix))(input)?;
    Ok((input, (tag_name, op, literal, unit)))
}

fn is_unit_char(c: char) -> bool {
    AngleUnit::from_suffix(c).is_some()
}

fn compare_op(input: &str) -> IResult<&str, CompareOp> {
    alt((
        map(tag("=="), |_| CompareOp::Eq),
        map(tag("!="), |_| CompareOp::Ne),
        map(tag(">="), |_| CompareOp::Ge),
        map(tag("<="), |_| CompareOp::Le),
        map(tag(">"), |_| CompareOp::Gt),
        map(tag("<"), |_| CompareOp::Lt),
        map(tag_no_case(".eq."), |_| CompareOp::Eq),
        map(tag_no_case(".ne."), |_| CompareOp::Ne),
        map(tag_no_case(".ge."), |_| CompareOp::Ge),
        map(tag_no_case(".le."), |_| CompareOp::Le),
        map(tag_no_case(".gt."), |_| CompareOp::Gt),
        map(tag_no_case(".lt."), |_| CompareOp::Lt),
    ))(input)
}

/// `=TAG`
pub fn parse_existence(token: &str) -> Option<String> {
    token
        .strip_prefix('=')
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
}

/// `PATH=[TYPE:]VALUE`.
///
/// The split happens at the last `=` that leaves both sides non-empty, so
/// `a=b=c` assigns `c` to the path `a=b`.
pub fn parse_assignment(token: &str) -> Option<Assignment> {
    let (path, rhs) = token
        .char_indices()
        .rev()
        .filter(|&(idx, c)| c == '=' && idx > 0 && idx + 1 < token.len())
        .map(|(idx, _)| (&token[..idx], &token[idx + 1..]))
        .next()?;

    let (ty, literal) = match type_prefix(rhs) {
        Ok((literal, ty)) if !literal.is_empty() => (Some(ty), literal),
        _ => (None, rhs),
    };
    Some(Assignment {
        path: path.to_string(),
        ty,
        literal: literal.to_string(),
    })
}

fn type_prefix(input: &str) -> IResult<&str, ValueType> {
    terminated(
        alt((
            map(tag("bool"), |_| ValueType::Bool),
            map(tag("int"), |_| ValueType::Int),
            map(tag("str"), |_| ValueType::Text),
            map(tag("float"), |_| ValueType::Float),
            map(tag("complex"), |_| ValueType::Complex),
        )),
        pchar(':'),
    )(input)
}

/// `+PATH`, `!PATH` or `/PATH`.
pub fn parse_boolean_op(token: &str) -> Option<(BoolOp, String)> {
    let mut chars = token.chars();
    let op = BoolOp::from_prefix(chars.next()?)?;
    let path = chars.as_str();
    (!path.is_empty()).then(|| (op, path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparison(token: &str) -> Comparison {
        match classify(token).expect("classify") {
            Token::ComparisonSelect(c) => c,
            other => panic!("expected comparison for {token}, got {other:?}"),
        }
    }

    #[test]
    fn comparison_with_unit() {
        let c = comparison("ra<10d");
        assert_eq!(c.tag, "ra");
        assert_eq!(c.op, CompareOp::Lt);
        assert_eq!(c.literal, 10.0);
        assert_eq!(c.unit, Some(AngleUnit::Degrees));
    }

    #[test]
    fn comparison_prefers_two_char_operators() {
        assert_eq!(comparison("I<=1.5").op, CompareOp::Le);
        assert_eq!(comparison("I>=1.5").op, CompareOp::Ge);
        assert_eq!(comparison("I==1.5").op, CompareOp::Eq);
        assert_eq!(comparison("I!=1.5").op, CompareOp::Ne);
    }

    #[test]
    fn comparison_fortran_operators() {
        assert_eq!(comparison("ra.gt.10d").op, CompareOp::Gt);
        assert_eq!(comparison("ra.LE.3m").op, CompareOp::Le);
        assert_eq!(comparison("I.ne.0").unit, None);
    }

    #[test]
    fn comparison_unit_is_case_insensitive() {
        assert_eq!(comparison("r<5S").unit, Some(AngleUnit::ArcSeconds));
    }

    #[test]
    fn comparison_ignores_text_after_unit() {
        let c = comparison("r<5dxyz");
        assert_eq!(c.literal, 5.0);
        assert_eq!(c.unit, Some(AngleUnit::Degrees));
    }

    #[test]
    fn comparison_with_non_numeric_rhs_is_malformed() {
        let err = classify("flux>abc").unwrap_err();
        assert_eq!(
            err,
            TokenError::MalformedSelection {
                token: "flux>abc".into()
            }
        );
    }

    #[test]
    fn single_equals_is_assignment_not_comparison() {
        assert!(matches!(classify("ra=5").unwrap(), Token::Assignment(_)));
    }

    #[test]
    fn dotted_tag_cannot_be_compared() {
        // `.` is not allowed in a comparison tag; with no `=` the token is a glob.
        assert_eq!(
            classify("pos.ra<1d").unwrap(),
            Token::NameGlobSelect {
                pattern: "pos.ra<1d".into()
            }
        );
    }

    #[test]
    fn existence() {
        assert_eq!(
            classify("=dE").unwrap(),
            Token::ExistenceSelect { tag: "dE".into() }
        );
    }

    #[test]
    fn assignment_with_type() {
        assert_eq!(
            classify("name=complex:1+2j").unwrap(),
            Token::Assignment(Assignment {
                path: "name".into(),
                ty: Some(ValueType::Complex),
                literal: "1+2j".into(),
            })
        );
    }

    #[test]
    fn assignment_with_empty_typed_value_falls_back_to_text() {
        let Token::Assignment(a) = classify("x=int:").unwrap() else {
            panic!("expected assignment");
        };
        assert_eq!(a.ty, None);
        assert_eq!(a.literal, "int:");
    }

    #[test]
    fn assignment_splits_at_last_equals() {
        let a = parse_assignment("a=b=c").unwrap();
        assert_eq!(a.path, "a=b");
        assert_eq!(a.literal, "c");

        let a = parse_assignment("a=b=").unwrap();
        assert_eq!(a.path, "a");
        assert_eq!(a.literal, "b=");
    }

    #[test]
    fn assignment_outranks_boolean_prefix() {
        let Token::Assignment(a) = classify("+dE=1").unwrap() else {
            panic!("expected assignment");
        };
        assert_eq!(a.path, "+dE");
    }

    #[test]
    fn boolean_ops() {
        for (token, op) in [
            ("+dE", BoolOp::SetTrue),
            ("!dE", BoolOp::SetFalse),
            ("/dE", BoolOp::Remove),
        ] {
            assert_eq!(
                classify(token).unwrap(),
                Token::BooleanOp {
                    op,
                    path: "dE".into()
                }
            );
        }
    }

    #[test]
    fn lone_prefix_is_a_glob() {
        assert_eq!(
            classify("+").unwrap(),
            Token::NameGlobSelect {
                pattern: "+".into()
            }
        );
    }

    #[test]
    fn glob_fallback() {
        assert_eq!(
            classify("3C*").unwrap(),
            Token::NameGlobSelect {
                pattern: "3C*".into()
            }
        );
    }

    #[test]
    fn unit_letters_cannot_start_the_value() {
        // `VALUE` needs at least one non-unit character.
        assert!(parse_comparison("name<dms").is_none());
    }
}
