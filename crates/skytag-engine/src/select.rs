//! Per-token selection: which sources a single selection token matches.

use globset::{GlobBuilder, GlobMatcher};
use roaring::RoaringBitmap;
use skytag_dsl::{Comparison, Token};
use skytag_model::{SkyModel, Source};
use tracing::warn;

/// Evaluate a selection token. `None` for mutation tokens.
pub fn select(model: &SkyModel, token: &Token) -> Option<RoaringBitmap> {
    match token {
        Token::ComparisonSelect(cmp) => Some(select_comparison(model, cmp)),
        Token::ExistenceSelect { tag } => Some(select_existence(model, tag)),
        Token::NameGlobSelect { pattern } => Some(select_glob(model, pattern)),
        Token::Assignment(_) | Token::BooleanOp { .. } => None,
    }
}

/// Sources whose first definition of the tag (along the lookup chain)
/// satisfies the comparison. Sources lacking the tag never match.
pub fn select_comparison(model: &SkyModel, cmp: &Comparison) -> RoaringBitmap {
    collect(model, |src| {
        src.lookup_tag(&cmp.tag)
            .map(|value| cmp.matches(value))
            .unwrap_or(false)
    })
}

/// Sources where the tag is present and truthy. Member names such as
/// `shape` select the sources that have that member.
pub fn select_existence(model: &SkyModel, tag: &str) -> RoaringBitmap {
    collect(model, |src| src.lookup_truthy(tag))
}

/// Sources whose name matches a shell-style pattern (case-sensitive).
pub fn select_glob(model: &SkyModel, pattern: &str) -> RoaringBitmap {
    let matcher = NameMatcher::new(pattern);
    collect(model, |src| matcher.is_match(&src.name))
}

fn collect(model: &SkyModel, mut pred: impl FnMut(&Source) -> bool) -> RoaringBitmap {
    let mut out = RoaringBitmap::new();
    for src in model.sources() {
        if pred(src) {
            out.insert(src.id().raw());
        }
    }
    out
}

/// `*`, `?` and `[seq]` wildcards over display names.
///
/// Patterns follow shell `fnmatch` rules: braces are plain characters and a
/// `[` with no closing `]` matches itself. A pattern globset still rejects
/// matches its own text literally.
pub enum NameMatcher {
    Glob(GlobMatcher),
    Literal(String),
}

impl NameMatcher {
    pub fn new(pattern: &str) -> Self {
        let translated = fnmatch_to_glob(pattern);
        let glob = GlobBuilder::new(&translated)
            .literal_separator(false)
            .backslash_escape(false)
            .build();
        match glob {
            Ok(glob) => NameMatcher::Glob(glob.compile_matcher()),
            Err(err) => {
                warn!(pattern, error = %err, "invalid name pattern, matching literally");
                NameMatcher::Literal(pattern.to_string())
            }
        }
    }

    pub fn is_match(&self, name: &str) -> bool {
        match self {
            NameMatcher::Glob(m) => m.is_match(name),
            NameMatcher::Literal(s) => s == name,
        }
    }
}

/// Rewrite an `fnmatch` pattern in globset syntax. Runs of `*` collapse to
/// one, `{`, `}` and unclosed `[` become single-character classes, and
/// closed `[...]` classes pass through untouched.
fn fnmatch_to_glob(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '*' => {
                while chars.get(i) == Some(&'*') {
                    i += 1;
                }
                out.push('*');
            }
            '{' | '}' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            '[' => {
                // A `]` right after `[` or `[!` is a member, not the end.
                let mut j = i;
                if chars.get(j) == Some(&'!') {
                    j += 1;
                }
                if chars.get(j) == Some(&']') {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j < chars.len() {
                    out.extend(&chars[i - 1..=j]);
                    i = j + 1;
                } else {
                    out.push_str("[[]");
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use skytag_dsl::{classify, TagValue, DEG};
    use skytag_model::{Component, Tagged};

    fn model() -> SkyModel {
        let mut a = Source::point("A", 5.0 * DEG, 0.0, 1.0);
        a.set_tag("dE", TagValue::Bool(true));
        let mut b = Source::point("B", 15.0 * DEG, 0.0, 2.0);
        b.set_tag("dE", TagValue::Int(0));
        b.shape = Some(Component::new().with("ex", 0.01));
        let c = Source::point("C1", 25.0 * DEG, 0.0, 3.0);
        SkyModel::new(vec![a, b, c])
    }

    fn sel(model: &SkyModel, token: &str) -> Vec<u32> {
        let token = classify(token).unwrap();
        select(model, &token).unwrap().iter().collect()
    }

    #[test]
    fn comparison_uses_lookup_chain() {
        let m = model();
        assert_eq!(sel(&m, "ra<10d"), vec![0]);
        assert_eq!(sel(&m, "I>=2"), vec![1, 2]);
        assert_eq!(sel(&m, "ex>0"), vec![1]);
        assert!(sel(&m, "nosuch<1").is_empty());
    }

    #[test]
    fn existence_requires_truthy_value() {
        let m = model();
        assert_eq!(sel(&m, "=dE"), vec![0]);
        assert_eq!(sel(&m, "=ex"), vec![1]);
        assert_eq!(sel(&m, "=shape"), vec![1]);
        assert_eq!(sel(&m, "=spectrum"), Vec::<u32>::new());
        assert_eq!(sel(&m, "=name"), vec![0, 1, 2]);
    }

    #[test]
    fn glob_patterns() {
        let m = model();
        assert_eq!(sel(&m, "*"), vec![0, 1, 2]);
        assert_eq!(sel(&m, "C?"), vec![2]);
        assert_eq!(sel(&m, "[AB]"), vec![0, 1]);
        assert_eq!(sel(&m, "[!AB]*"), vec![2]);
        assert!(sel(&m, "a").is_empty());
    }

    #[test]
    fn unclosed_bracket_keeps_other_wildcards() {
        let m = SkyModel::new(vec![
            Source::point("[xyz", 0.0, 0.0, 1.0),
            Source::point("xyz", 0.0, 0.0, 1.0),
            Source::point("{A,B}", 0.0, 0.0, 1.0),
            Source::point("A", 0.0, 0.0, 1.0),
        ]);
        assert_eq!(sel(&m, "[x*"), vec![0]);
        assert_eq!(sel(&m, "[x??"), vec![0]);
        assert_eq!(sel(&m, "{A,B}"), vec![2]);
        assert_eq!(sel(&m, "**z"), vec![0, 1]);
    }

    #[test]
    fn fnmatch_translation() {
        assert_eq!(fnmatch_to_glob("[x*"), "[[]x*");
        assert_eq!(fnmatch_to_glob("[]x]*"), "[]x]*");
        assert_eq!(fnmatch_to_glob("[!]]"), "[!]]");
        assert_eq!(fnmatch_to_glob("a**b{c}"), "a*b[{]c[}]");
        assert_eq!(fnmatch_to_glob("[{]"), "[{]");
    }

    #[test]
    fn unclosed_bracket_matches_literally() {
        let m = SkyModel::new(vec![Source::point("[x", 0.0, 0.0, 1.0)]);
        assert_eq!(sel(&m, "[x"), vec![0]);
    }

    #[test]
    fn mutation_tokens_select_nothing() {
        let m = model();
        assert!(select(&m, &classify("+dE").unwrap()).is_none());
    }
}
