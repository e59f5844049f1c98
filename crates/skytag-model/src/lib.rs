//! Skytag sky model
//!
//! The catalog side of tagging: sources with a stable per-load
//! [`SourceId`], their sub-objects (`pos`/`position`, `flux`, `shape`,
//! `spectrum`), and the attribute access contract the engine is written
//! against:
//!
//! - [`Tagged`]: get, set and remove a tag by exact name
//! - [`TagHost`]: look up a named child object, for dotted paths
//!
//! [`resolve`] / [`resolve_mut`] walk dotted paths; [`SkyModel`] owns the
//! sources and loads/saves them as JSON.

pub mod model;
pub mod persistence;
pub mod resolve;
pub mod source;

#[cfg(test)]
mod tests;

pub use model::{angular_separation, SkyModel};
pub use resolve::{resolve, resolve_mut, split_path, ResolveError};
pub use source::{
    Component, Source, SourceId, TagHost, Tagged, FLUX_NAME, POSITION_NAMES, SHAPE_NAME,
    SPECTRUM_NAME,
};
