//! End-to-end tests for sky model persistence

use super::*;
use skytag_dsl::{Complex, TagValue};
use tempfile::tempdir;

const SAMPLE: &str = r#"{
  "sources": [
    {"name": "A", "pos": {"ra": 0.1, "dec": -0.2}, "flux": {"I": 2.5},
     "tags": {"dE": true, "cluster": "north"}},
    {"name": "B", "pos": {"ra": 0.3, "dec": 0.0}, "flux": {"I": 1},
     "shape": {"ex": 0.001, "ey": 0.0005, "pa": 0.3},
     "spectrum": {"freq0": 1.4e9, "spi": -0.7}}
  ],
  "freq0": 1.4e9,
  "comment": "made by hand"
}"#;

#[test]
fn test_load_assigns_ids_and_reads_sub_objects() {
    let model = SkyModel::from_json(SAMPLE).unwrap();
    assert_eq!(model.len(), 2);

    let a = &model.sources()[0];
    assert_eq!(a.id(), SourceId::new(0));
    assert_eq!(a.tag("dE"), Some(&TagValue::Bool(true)));
    assert_eq!(a.tag("cluster"), Some(&TagValue::Text("north".into())));
    assert!(a.shape.is_none());

    let b = &model.sources()[1];
    assert_eq!(b.flux.tag("I"), Some(&TagValue::Int(1)));
    assert_eq!(b.lookup_tag("spi"), Some(&TagValue::Float(-0.7)));
    assert_eq!(b.radec(), Some((0.3, 0.0)));
}

#[test]
fn test_save_then_load_preserves_tags_and_unknown_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");

    let mut model = SkyModel::from_json(SAMPLE).unwrap();
    let id = SourceId::new(1);
    {
        let src = model.source_mut(id).unwrap();
        let (host, attr) = resolve_mut(src, "spectrum.rm").unwrap();
        host.set_tag(attr, TagValue::Complex(Complex::new(1.0, 2.0)));
        src.set_tag("faint", TagValue::Bool(false));
    }
    model.save(&path).unwrap();

    let reloaded = SkyModel::load(&path).unwrap();
    assert_eq!(reloaded.sources(), model.sources());
    assert_eq!(reloaded.extra.get("comment"), Some(&"made by hand".into()));

    let b = reloaded.source(id).unwrap();
    assert_eq!(
        b.spectrum.as_ref().and_then(|s| s.tag("rm")),
        Some(&TagValue::Complex(Complex::new(1.0, 2.0)))
    );
}

#[test]
fn test_non_finite_tags_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");

    let mut model = SkyModel::from_json(SAMPLE).unwrap();
    {
        let src = model.source_mut(SourceId::new(0)).unwrap();
        src.set_tag("x", TagValue::Float(f64::NAN));
        src.set_tag("hi", TagValue::Float(f64::INFINITY));
        src.set_tag("lo", TagValue::Float(f64::NEG_INFINITY));
    }
    model.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains("null"));
    assert!(text.contains(r#""lo": "-inf""#));

    let reloaded = SkyModel::load(&path).unwrap();
    let a = &reloaded.sources()[0];
    match a.tag("x") {
        Some(TagValue::Float(v)) => assert!(v.is_nan()),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(a.tag("hi"), Some(&TagValue::Float(f64::INFINITY)));
    assert_eq!(a.tag("lo"), Some(&TagValue::Float(f64::NEG_INFINITY)));
    assert_eq!(reloaded.sources()[1], model.sources()[1]);
}

#[test]
fn test_untagged_source_omits_empty_tags() {
    let model = SkyModel::new(vec![Source::point("X", 0.0, 0.0, 1.0)]);
    let json = model.to_json().unwrap();
    assert!(!json.contains("\"tags\""));
    assert!(!json.contains("\"shape\""));
}

#[test]
fn test_empty_model_is_valid() {
    let model = SkyModel::from_json(r#"{"sources": []}"#).unwrap();
    assert!(model.is_empty());
    let model = SkyModel::from_json("{}").unwrap();
    assert!(model.is_empty());
}

#[test]
fn test_load_missing_file_names_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.json");
    let err = SkyModel::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("nope.json"));
}

#[test]
fn test_malformed_json_is_an_error() {
    assert!(SkyModel::from_json("{\"sources\": [{}]}").is_err());
    assert!(SkyModel::from_json("not json").is_err());
}
