//! Copying tags from a reference model onto nearby sources of another.

use crate::report;
use crate::select::select_existence;
use roaring::RoaringBitmap;
use skytag_dsl::ARCSEC;
use skytag_model::{SkyModel, SourceId, Tagged};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    pub lines: Vec<String>,
    /// Number of (source, tag) pairs written.
    pub changed: usize,
}

impl TransferReport {
    pub fn modified(&self) -> bool {
        self.changed > 0
    }
}

/// For every reference source carrying one of `tags`, set those tags on each
/// target source within `tolerance_arcsec`. Tags already equal are left
/// alone.
pub fn transfer_tags(
    reference: &SkyModel,
    target: &mut SkyModel,
    tags: &[String],
    tolerance_arcsec: f64,
) -> TransferReport {
    let mut tagset: Vec<&str> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !tagset.contains(&tag.as_str()) {
            tagset.push(tag);
        }
    }
    let tolerance = tolerance_arcsec * ARCSEC;

    let mut carriers = RoaringBitmap::new();
    for tag in &tagset {
        carriers |= select_existence(reference, tag);
    }
    info!(
        tags = tagset.len(),
        reference_sources = carriers.len(),
        tolerance_arcsec,
        "transferring tags"
    );

    let mut out = TransferReport::default();
    for raw in &carriers {
        let Some(src0) = reference.source(SourceId::new(raw)) else {
            continue;
        };
        let Some((ra, dec)) = src0.radec() else {
            debug!(source = %src0.name, "reference source has no position");
            continue;
        };
        for id in target.sources_near(ra, dec, tolerance) {
            let Some(src) = target.source_mut(id) else {
                continue;
            };
            for tag in &tagset {
                let Some(value) = src0.tag(tag) else {
                    continue;
                };
                if src.tag(tag) == Some(value) {
                    continue;
                }
                src.set_tag(tag, value.clone());
                out.changed += 1;
                out.lines.push(report::transfer_line(
                    tag,
                    &value.to_string(),
                    &src.name,
                    &src0.name,
                ));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use skytag_dsl::TagValue;
    use skytag_model::Source;

    fn tagged(name: &str, ra: f64, tags: &[(&str, TagValue)]) -> Source {
        let mut src = Source::point(name, ra, 0.0, 1.0);
        for (k, v) in tags {
            src.set_tag(k, v.clone());
        }
        src
    }

    #[test]
    fn copies_tags_within_tolerance_only() {
        let reference = SkyModel::new(vec![
            tagged("R1", 0.0, &[("dE", TagValue::Bool(true))]),
            tagged("R2", 1.0, &[]),
        ]);
        let mut target = SkyModel::new(vec![
            Source::point("T1", 2.0 * ARCSEC, 0.0, 1.0),
            Source::point("T2", 30.0 * ARCSEC, 0.0, 1.0),
            Source::point("T3", 1.0, 0.0, 1.0),
        ]);

        let report = transfer_tags(&reference, &mut target, &["dE".to_string()], 5.0);
        assert_eq!(report.changed, 1);
        assert_eq!(
            report.lines,
            vec!["setting tag dE=True on source T1 (from reference source R1)"]
        );
        assert_eq!(target.sources()[0].tag("dE"), Some(&TagValue::Bool(true)));
        assert!(!target.sources()[1].has_tag("dE"));
        // R2 carries no tag, so T3 next to it is untouched.
        assert!(!target.sources()[2].has_tag("dE"));
    }

    #[test]
    fn equal_values_are_not_rewritten() {
        let reference = SkyModel::new(vec![tagged(
            "R",
            0.0,
            &[("dE", TagValue::Bool(true)), ("cluster", TagValue::Int(3))],
        )]);
        let mut target = SkyModel::new(vec![tagged("T", 0.0, &[("dE", TagValue::Bool(true))])]);

        let tags = vec!["dE".to_string(), "cluster".to_string(), "dE".to_string()];
        let report = transfer_tags(&reference, &mut target, &tags, 1.0);
        assert_eq!(report.changed, 1);
        assert!(report.lines[0].starts_with("setting tag cluster=3 on source T"));
        assert!(report.modified());
    }

    #[test]
    fn nothing_to_transfer() {
        let reference = SkyModel::new(vec![tagged("R", 0.0, &[])]);
        let mut target = SkyModel::new(vec![Source::point("T", 0.0, 0.0, 1.0)]);
        let report = transfer_tags(&reference, &mut target, &["dE".to_string()], 10.0);
        assert!(!report.modified());
        assert!(report.lines.is_empty());
    }
}
