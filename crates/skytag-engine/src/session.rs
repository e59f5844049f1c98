//! Token-by-token tagging over a sky model.

use crate::error::Result;
use crate::mutate::{self, Mutation};
use crate::report;
use crate::select::select;
use crate::selection::{Origin, SelectionSession};
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use skytag_dsl::{classify, Token};
use skytag_model::{SkyModel, SourceId};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// List the selection at every mutation point and skip the mutations.
    #[serde(default)]
    pub list_only: bool,
}

/// Result of running a whole token list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub modified: bool,
    pub report: Vec<String>,
}

/// Applies tokens in order, keeping the selection state between them.
///
/// Each call to [`TagSession::apply`] returns the report lines for that
/// token so callers can print as they go.
pub struct TagSession<'m> {
    model: &'m mut SkyModel,
    options: SessionOptions,
    selection: SelectionSession,
    /// The current selection has been printed since the last selection token.
    listed: bool,
}

impl<'m> TagSession<'m> {
    pub fn new(model: &'m mut SkyModel, options: SessionOptions) -> Self {
        Self {
            model,
            options,
            selection: SelectionSession::new(),
            listed: false,
        }
    }

    pub fn model(&self) -> &SkyModel {
        &*self.model
    }

    pub fn selection(&self) -> &SelectionSession {
        &self.selection
    }

    pub fn modified(&self) -> bool {
        self.selection.modified()
    }

    /// Classify and apply one token.
    pub fn apply(&mut self, raw: &str) -> Result<Vec<String>> {
        let token = classify(raw)?;
        debug!(token = raw, parsed = ?token, "classified token");
        self.apply_token(raw, &token)
    }

    /// Apply an already classified token; `raw` labels its report line.
    pub fn apply_token(&mut self, raw: &str, token: &Token) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        match select(&*self.model, token) {
            Some(matched) => self.record_selection(raw, &matched, &mut lines),
            None => self.mutate(token, &mut lines)?,
        }
        Ok(lines)
    }

    /// Closing lines: the pending listing in list mode, and a note when
    /// nothing changed.
    pub fn finish(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.options.list_only && !self.listed {
            self.materialize(&mut lines);
        }
        if !self.modified() {
            lines.push(report::NOT_MODIFIED.to_string());
        }
        lines
    }

    fn record_selection(&mut self, raw: &str, matched: &RoaringBitmap, lines: &mut Vec<String>) {
        self.listed = false;
        if self.selection.select(matched) {
            lines.push(report::SELECTING.to_string());
        }
        let names = self.names(matched);
        debug!(token = raw, matched = names.len(), "selection");
        lines.push(report::selection_line(raw, &names));
    }

    fn mutate(&mut self, token: &Token, lines: &mut Vec<String>) -> Result<()> {
        let ids = self.materialize(lines);
        if self.options.list_only {
            lines.push(report::LIST_IN_EFFECT.to_string());
            return Ok(());
        }
        let (mutation, line) = match token {
            Token::Assignment(a) => {
                let value = a.value()?;
                let line = report::assignment_line(&a.path, &a.literal, value.value_type());
                let mutation = Mutation::Set {
                    path: a.path.clone(),
                    value,
                };
                (mutation, line)
            }
            Token::BooleanOp { op, path } => (
                Mutation::from_bool_op(*op, path),
                report::bool_op_line(*op, path),
            ),
            _ => return Ok(()),
        };
        if ids.is_empty() {
            warn!(path = mutation.path(), "empty selection, mutation skipped");
            lines.push(report::NOTHING_SELECTED.to_string());
            return Ok(());
        }
        lines.push(line);

        let changed = mutate::apply(&mut *self.model, &ids, &mutation)?;
        debug!(
            path = mutation.path(),
            selected = ids.len(),
            changed,
            "applied mutation"
        );
        self.selection.mark_modified();
        Ok(())
    }

    fn materialize(&mut self, lines: &mut Vec<String>) -> RoaringBitmap {
        let model = &*self.model;
        let (ids, origin) = self
            .selection
            .materialize(|| model.ids().map(SourceId::raw).collect());
        let ids = ids.clone();
        match origin {
            Origin::AllSources => lines.push(report::ALL_SOURCES.to_string()),
            Origin::Explicit => lines.push(report::using_selected(ids.len())),
            Origin::Frozen => {}
        }
        if self.options.list_only {
            lines.push(report::source_list(&self.names(&ids)));
            self.listed = true;
        }
        ids
    }

    fn names(&self, ids: &RoaringBitmap) -> Vec<&str> {
        ids.iter()
            .filter_map(|raw| self.model.source(SourceId::new(raw)))
            .map(|src| src.name.as_str())
            .collect()
    }
}

/// Run every token against `model`, collecting the full report.
pub fn process<S: AsRef<str>>(
    tokens: &[S],
    model: &mut SkyModel,
    options: SessionOptions,
) -> Result<Outcome> {
    let mut session = TagSession::new(model, options);
    let mut report = Vec::new();
    for token in tokens {
        report.extend(session.apply(token.as_ref())?);
    }
    report.extend(session.finish());
    Ok(Outcome {
        modified: session.modified(),
        report,
    })
}
