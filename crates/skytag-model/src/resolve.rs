//! Dotted tag paths (`a.b.c`) against a source's sub-object hierarchy.

use crate::source::{Source, TagHost};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Can't resolve attribute {path} for source {source_name}")]
    UnresolvedPath {
        path: String,
        /// The intermediate segment that has no sub-object behind it.
        segment: String,
        source_name: String,
    },
}

/// Split `path` into its intermediate segments and final attribute name.
pub fn split_path(path: &str) -> (Vec<&str>, &str) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let attr = segments.pop().unwrap_or(path);
    (segments, attr)
}

/// Walk every segment but the last as a sub-object lookup, returning the
/// owning object and the attribute name on it.
pub fn resolve<'a, 'p>(
    source: &'a Source,
    path: &'p str,
) -> Result<(&'a dyn TagHost, &'p str), ResolveError> {
    let (segments, attr) = split_path(path);
    let mut host: &dyn TagHost = source;
    for segment in segments {
        host = host
            .child(segment)
            .ok_or_else(|| unresolved(path, segment, &source.name))?;
    }
    Ok((host, attr))
}

/// Mutable counterpart of [`resolve`].
pub fn resolve_mut<'a, 'p>(
    source: &'a mut Source,
    path: &'p str,
) -> Result<(&'a mut dyn TagHost, &'p str), ResolveError> {
    let (segments, attr) = split_path(path);
    let source_name = source.name.clone();
    let mut host: &mut dyn TagHost = source;
    for segment in segments {
        host = host
            .child_mut(segment)
            .ok_or_else(|| unresolved(path, segment, &source_name))?;
    }
    Ok((host, attr))
}

fn unresolved(path: &str, segment: &str, source_name: &str) -> ResolveError {
    ResolveError::UnresolvedPath {
        path: path.to_string(),
        segment: segment.to_string(),
        source_name: source_name.to_string(),
    }
}
