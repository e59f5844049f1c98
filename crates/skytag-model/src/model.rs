//! The sky model: an ordered list of sources with load-time identities.

use crate::source::{Source, SourceId};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkyModel {
    sources: Vec<Source>,
    /// Top-level keys of the model file we don't interpret, kept for save.
    pub extra: BTreeMap<String, JsonValue>,
}

impl SkyModel {
    /// Build a model, assigning ids `0..n` in the given order.
    pub fn new(sources: Vec<Source>) -> Self {
        let mut model = Self::default();
        for source in sources {
            model.push(source);
        }
        model
    }

    /// Append a source, giving it the next id. Returns that id.
    pub fn push(&mut self, mut source: Source) -> SourceId {
        let id = SourceId::new(self.sources.len() as u32);
        source.id = id;
        self.sources.push(source);
        id
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.sources.iter().map(Source::id)
    }

    pub fn source(&self, id: SourceId) -> Option<&Source> {
        self.sources.get(id.raw() as usize)
    }

    pub fn source_mut(&mut self, id: SourceId) -> Option<&mut Source> {
        self.sources.get_mut(id.raw() as usize)
    }

    /// Sources whose position lies within `tolerance` radians of `(ra, dec)`,
    /// boundary included. Sources without a usable position are skipped.
    pub fn sources_near(&self, ra: f64, dec: f64, tolerance: f64) -> Vec<SourceId> {
        self.sources
            .iter()
            .filter(|src| {
                src.radec()
                    .map(|(ra2, dec2)| angular_separation(ra, dec, ra2, dec2) <= tolerance)
                    .unwrap_or(false)
            })
            .map(Source::id)
            .collect()
    }
}

/// Great-circle separation in radians (Vincenty formula, stable at all
/// distances).
pub fn angular_separation(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
    let (sin_d1, cos_d1) = dec1.sin_cos();
    let (sin_d2, cos_d2) = dec2.sin_cos();
    let (sin_dra, cos_dra) = (ra2 - ra1).sin_cos();

    let num = ((cos_d2 * sin_dra).powi(2) + (cos_d1 * sin_d2 - sin_d1 * cos_d2 * cos_dra).powi(2))
        .sqrt();
    let den = sin_d1 * sin_d2 + cos_d1 * cos_d2 * cos_dra;
    num.atan2(den)
}
