//! Console report lines. Downstream scripts parse these, so the wording is
//! fixed.

use skytag_dsl::{BoolOp, ValueType};

pub const SELECTING: &str = "Selecting sources:";
pub const ALL_SOURCES: &str = "No explicit selection, using all sources.";
pub const NOTHING_SELECTED: &str = "No sources selected, ignoring tagging commands";
pub const LIST_IN_EFFECT: &str = "--list in effect, ignoring tagging commands";
pub const NOT_MODIFIED: &str = "Model was not modified";

/// Above this many matches a selection line gives the count only.
pub const MAX_NAMES_LISTED: usize = 5;

/// One line per selection token, labelled with the token itself.
pub fn selection_line(label: &str, names: &[&str]) -> String {
    match names {
        [] => format!("  {label:<16}: no sources selected"),
        [name] => format!("  {label:<16}: one source selected ({name})"),
        _ if names.len() <= MAX_NAMES_LISTED => format!(
            "  {label:<16}: {} sources selected ({})",
            names.len(),
            names.join(" ")
        ),
        _ => format!("  {label:<16}: {} sources selected", names.len()),
    }
}

pub fn using_selected(count: u64) -> String {
    format!("Using {count} selected sources:")
}

pub fn source_list(names: &[&str]) -> String {
    format!("Sources: {}", names.join(" "))
}

/// `literal` is shown as typed; text values get double quotes.
pub fn assignment_line(path: &str, literal: &str, ty: ValueType) -> String {
    match ty {
        ValueType::Text => format!("  setting tag {path}=\"{literal}\" (type '{ty}')"),
        _ => format!("  setting tag {path}={literal} (type '{ty}')"),
    }
}

pub fn bool_op_line(op: BoolOp, path: &str) -> String {
    match op {
        BoolOp::SetTrue => format!("  setting tag {path}=True"),
        BoolOp::SetFalse => format!("  setting tag {path}=False"),
        BoolOp::Remove => format!("  removing tag {path}"),
    }
}

pub fn transfer_line(tag: &str, value: &str, source: &str, reference: &str) -> String {
    format!("setting tag {tag}={value} on source {source} (from reference source {reference})")
}
