//! Applying a tag mutation to a frozen selection.

use roaring::RoaringBitmap;
use skytag_dsl::{Assignment, BoolOp, CoerceError, TagValue, Token};
use skytag_model::{resolve_mut, ResolveError, SkyModel, SourceId};
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Set { path: String, value: TagValue },
    Remove { path: String },
}

impl Mutation {
    pub fn path(&self) -> &str {
        match self {
            Mutation::Set { path, .. } | Mutation::Remove { path } => path,
        }
    }

    pub fn from_assignment(assignment: &Assignment) -> Result<Self, CoerceError> {
        Ok(Mutation::Set {
            path: assignment.path.clone(),
            value: assignment.value()?,
        })
    }

    pub fn from_bool_op(op: BoolOp, path: &str) -> Self {
        let path = path.to_string();
        match op {
            BoolOp::SetTrue => Mutation::Set {
                path,
                value: TagValue::Bool(true),
            },
            BoolOp::SetFalse => Mutation::Set {
                path,
                value: TagValue::Bool(false),
            },
            BoolOp::Remove => Mutation::Remove { path },
        }
    }

    /// The mutation a token asks for. `Ok(None)` for selection tokens.
    pub fn from_token(token: &Token) -> Result<Option<Self>, CoerceError> {
        match token {
            Token::Assignment(a) => Self::from_assignment(a).map(Some),
            Token::BooleanOp { op, path } => Ok(Some(Self::from_bool_op(*op, path))),
            _ => Ok(None),
        }
    }
}

/// Apply `mutation` to every source in `ids`, in model order.
///
/// Stops at the first source whose path doesn't resolve; sources already
/// visited keep their change. Returns the number of sources whose stored
/// state actually changed.
pub fn apply(
    model: &mut SkyModel,
    ids: &RoaringBitmap,
    mutation: &Mutation,
) -> Result<usize, ResolveError> {
    let mut changed = 0;
    for raw in ids {
        let Some(src) = model.source_mut(SourceId::new(raw)) else {
            continue;
        };
        let name = src.name.clone();
        let (host, attr) = resolve_mut(src, mutation.path())?;
        let did_change = match mutation {
            Mutation::Set { value, .. } => {
                let same = host.tag(attr) == Some(value);
                host.set_tag(attr, value.clone());
                !same
            }
            Mutation::Remove { .. } => host.remove_tag(attr).is_some(),
        };
        trace!(source = %name, path = mutation.path(), did_change, "mutated");
        if did_change {
            changed += 1;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skytag_dsl::{classify, Complex};
    use skytag_model::{Source, Tagged};

    fn all(model: &SkyModel) -> RoaringBitmap {
        model.ids().map(SourceId::raw).collect()
    }

    fn mutation(token: &str) -> Mutation {
        Mutation::from_token(&classify(token).unwrap())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn set_and_remove_boolean_tags() {
        let mut m = SkyModel::new(vec![
            Source::point("A", 0.0, 0.0, 1.0),
            Source::point("B", 0.0, 0.0, 1.0),
        ]);
        let ids = all(&m);
        assert_eq!(apply(&mut m, &ids, &mutation("+dE")).unwrap(), 2);
        assert!(m.sources().iter().all(|s| s.tag("dE") == Some(&TagValue::Bool(true))));

        assert_eq!(apply(&mut m, &ids, &mutation("/dE")).unwrap(), 2);
        // Second removal finds nothing and is not an error.
        assert_eq!(apply(&mut m, &ids, &mutation("/dE")).unwrap(), 0);
    }

    #[test]
    fn typed_assignment_on_sub_object() {
        let mut m = SkyModel::new(vec![Source::point("A", 0.0, 0.0, 1.0)]);
        let ids = all(&m);
        apply(&mut m, &ids, &mutation("flux.Q=float:0.5")).unwrap();
        apply(&mut m, &ids, &mutation("name=complex:1+2j")).unwrap();
        let a = &m.sources()[0];
        assert_eq!(a.flux.tag("Q"), Some(&TagValue::Float(0.5)));
        assert_eq!(a.tag("name"), Some(&TagValue::Complex(Complex::new(1.0, 2.0))));
    }

    #[test]
    fn only_selected_sources_change() {
        let mut m = SkyModel::new(vec![
            Source::point("A", 0.0, 0.0, 1.0),
            Source::point("B", 0.0, 0.0, 1.0),
        ]);
        let ids: RoaringBitmap = [1u32].into_iter().collect();
        apply(&mut m, &ids, &mutation("!bright")).unwrap();
        assert!(!m.sources()[0].has_tag("bright"));
        assert_eq!(m.sources()[1].tag("bright"), Some(&TagValue::Bool(false)));
    }

    #[test]
    fn unresolved_path_aborts() {
        let mut m = SkyModel::new(vec![Source::point("A", 0.0, 0.0, 1.0)]);
        let ids = all(&m);
        let err = apply(&mut m, &ids, &mutation("+shape.ex")).unwrap_err();
        assert_eq!(err.to_string(), "Can't resolve attribute shape.ex for source A");
    }

    #[test]
    fn bad_typed_literal_fails_before_touching_sources() {
        let token = classify("x=bool:xyz").unwrap();
        let err = Mutation::from_token(&token).unwrap_err();
        assert_eq!(err.to_string(), "Can't parse \"xyz\" as a value of type bool");
    }
}
