//! Sources and their tag-bearing sub-objects.

use serde::{Deserialize, Serialize};
use skytag_dsl::TagValue;
use std::collections::BTreeMap;
use std::fmt;

/// Stable per-load identity of a source.
///
/// Display names may repeat; selections are keyed on this id instead.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct SourceId(u32);

impl SourceId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Attribute access contract
// ============================================================================

/// Anything that carries named tags.
pub trait Tagged {
    fn tag(&self, name: &str) -> Option<&TagValue>;
    fn set_tag(&mut self, name: &str, value: TagValue);
    /// Remove a tag, returning the old value. Absent tags are a no-op.
    fn remove_tag(&mut self, name: &str) -> Option<TagValue>;

    fn has_tag(&self, name: &str) -> bool {
        self.tag(name).is_some()
    }
}

/// A tagged object that may own named tagged children (`a` in `a.b`).
pub trait TagHost: Tagged {
    fn child(&self, name: &str) -> Option<&dyn TagHost>;
    fn child_mut(&mut self, name: &str) -> Option<&mut dyn TagHost>;
}

// ============================================================================
// Component
// ============================================================================

/// A sub-object of a source (position, flux, shape, spectrum): a flat
/// attribute map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Component {
    attrs: BTreeMap<String, TagValue>,
}

impl Component {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<TagValue>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Tagged for Component {
    fn tag(&self, name: &str) -> Option<&TagValue> {
        self.attrs.get(name)
    }

    fn set_tag(&mut self, name: &str, value: TagValue) {
        self.attrs.insert(name.to_string(), value);
    }

    fn remove_tag(&mut self, name: &str) -> Option<TagValue> {
        self.attrs.remove(name)
    }
}

impl TagHost for Component {
    fn child(&self, _name: &str) -> Option<&dyn TagHost> {
        None
    }

    fn child_mut(&mut self, _name: &str) -> Option<&mut dyn TagHost> {
        None
    }
}

// ============================================================================
// Source
// ============================================================================

/// Names under which each sub-object can be addressed in a dotted path.
pub const POSITION_NAMES: [&str; 2] = ["pos", "position"];
pub const FLUX_NAME: &str = "flux";
pub const SHAPE_NAME: &str = "shape";
pub const SPECTRUM_NAME: &str = "spectrum";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(skip)]
    pub(crate) id: SourceId,
    pub name: String,
    #[serde(default)]
    pub pos: Component,
    #[serde(default)]
    pub flux: Component,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spectrum: Option<Component>,
    /// Tags attached directly to the source.
    #[serde(default, skip_serializing_if = "Component::is_empty")]
    pub tags: Component,
}

impl Source {
    /// A point source at `(ra, dec)` radians with Stokes I flux.
    pub fn point(name: &str, ra: f64, dec: f64, flux_i: f64) -> Self {
        Self {
            id: SourceId::default(),
            name: name.to_string(),
            pos: Component::new().with("ra", ra).with("dec", dec),
            flux: Component::new().with("I", flux_i),
            shape: None,
            spectrum: None,
            tags: Component::new(),
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    /// `(ra, dec)` in radians, when the position carries both.
    pub fn radec(&self) -> Option<(f64, f64)> {
        let ra = self.pos.tag("ra")?.as_real()?;
        let dec = self.pos.tag("dec")?.as_real()?;
        Some((ra, dec))
    }

    /// The objects consulted, in order, when a tag is looked up by bare name.
    pub fn lookup_chain(&self) -> impl Iterator<Item = &dyn Tagged> {
        [
            Some(&self.tags as &dyn Tagged),
            Some(&self.pos as &dyn Tagged),
            Some(&self.flux as &dyn Tagged),
            self.shape.as_ref().map(|c| c as &dyn Tagged),
            self.spectrum.as_ref().map(|c| c as &dyn Tagged),
        ]
        .into_iter()
        .flatten()
    }

    /// First value for `name` along [`Self::lookup_chain`].
    pub fn lookup_tag(&self, name: &str) -> Option<&TagValue> {
        self.lookup_chain().find_map(|obj| obj.tag(name))
    }

    /// Truthiness of a bare name, as `=TAG` sees it.
    ///
    /// The source's own tags come first, then its members: `name`, `pos`
    /// and `flux` always count as present, `shape` and `spectrum` when set.
    /// Anything else falls through to the rest of the lookup chain.
    pub fn lookup_truthy(&self, name: &str) -> bool {
        if let Some(value) = self.tags.tag(name) {
            return value.is_truthy();
        }
        if let Some(present) = self.member_present(name) {
            return present;
        }
        self.lookup_tag(name).is_some_and(TagValue::is_truthy)
    }

    fn member_present(&self, name: &str) -> Option<bool> {
        match name {
            "name" => Some(!self.name.is_empty()),
            n if POSITION_NAMES.contains(&n) => Some(true),
            FLUX_NAME => Some(true),
            SHAPE_NAME => Some(self.shape.is_some()),
            SPECTRUM_NAME => Some(self.spectrum.is_some()),
            _ => None,
        }
    }
}

impl Tagged for Source {
    fn tag(&self, name: &str) -> Option<&TagValue> {
        self.tags.tag(name)
    }

    fn set_tag(&mut self, name: &str, value: TagValue) {
        self.tags.set_tag(name, value)
    }

    fn remove_tag(&mut self, name: &str) -> Option<TagValue> {
        self.tags.remove_tag(name)
    }
}

impl TagHost for Source {
    fn child(&self, name: &str) -> Option<&dyn TagHost> {
        match name {
            n if POSITION_NAMES.contains(&n) => Some(&self.pos as &dyn TagHost),
            FLUX_NAME => Some(&self.flux as &dyn TagHost),
            SHAPE_NAME => self.shape.as_ref().map(|c| c as &dyn TagHost),
            SPECTRUM_NAME => self.spectrum.as_ref().map(|c| c as &dyn TagHost),
            _ => None,
        }
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut dyn TagHost> {
        match name {
            n if POSITION_NAMES.contains(&n) => Some(&mut self.pos as &mut dyn TagHost),
            FLUX_NAME => Some(&mut self.flux as &mut dyn TagHost),
            SHAPE_NAME => self.shape.as_mut().map(|c| c as &mut dyn TagHost),
            SPECTRUM_NAME => self.spectrum.as_mut().map(|c| c as &mut dyn TagHost),
            _ => None,
        }
    }
}
