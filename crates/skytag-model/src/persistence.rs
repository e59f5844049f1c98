//! JSON sky model files.
//!
//! ```text
//! {
//!   "sources": [
//!     { "name": "3C147", "pos": {"ra": 1.49, "dec": 0.87}, "flux": {"I": 22.5},
//!       "shape": {..}, "spectrum": {..}, "tags": {"dE": true} }
//!   ],
//!   ...any other top-level keys, carried through untouched
//! }
//! ```

use crate::model::SkyModel;
use crate::source::Source;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Deserialize)]
struct ModelFile {
    #[serde(default)]
    sources: Vec<Source>,
    #[serde(flatten)]
    extra: BTreeMap<String, JsonValue>,
}

#[derive(Serialize)]
struct ModelFileRef<'a> {
    sources: &'a [Source],
    #[serde(flatten)]
    extra: &'a BTreeMap<String, JsonValue>,
}

impl SkyModel {
    pub fn from_json(text: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(text).context("invalid sky model JSON")?;
        let mut model = SkyModel::new(file.sources);
        model.extra = file.extra;
        Ok(model)
    }

    pub fn to_json(&self) -> Result<String> {
        let file = ModelFileRef {
            sources: self.sources(),
            extra: &self.extra,
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let model = Self::from_json(&text)
            .with_context(|| format!("failed to load sky model {}", path.display()))?;
        info!(path = %path.display(), sources = model.len(), "loaded sky model");
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut text = self.to_json()?;
        text.push('\n');
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), sources = self.len(), "saved sky model");
        debug!(extra_keys = self.extra.len(), "preserved top-level keys");
        Ok(())
    }
}
