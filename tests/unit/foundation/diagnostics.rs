use super::*;

#[test]
fn warnings_keep_raise_order() {
    let mut d = Diagnostics::new();
    assert!(d.is_empty());
    d.warn(Warning::LayerLimitExceeded { limit: 2 });
    d.warn(Warning::OrphanChunk {
        role: ChunkRole::Text,
        offset: 40,
    });
    assert_eq!(d.warnings().len(), 2);
    assert!(matches!(d.warnings()[0], Warning::LayerLimitExceeded { limit: 2 }));
    assert!(matches!(d.into_warnings()[1], Warning::OrphanChunk { offset: 40, .. }));
}

#[test]
fn seeded_sink_appends_after_existing() {
    let mut d = Diagnostics::from_warnings(vec![Warning::CompositionLimitExceeded { limit: 1 }]);
    d.warn(Warning::MergeFieldUnresolved {
        name: "title".to_string(),
        clip: "layer-0".to_string(),
    });
    let w = d.into_warnings();
    assert!(matches!(w[0], Warning::CompositionLimitExceeded { .. }));
    assert!(matches!(w[1], Warning::MergeFieldUnresolved { .. }));
}

#[test]
fn warning_json_is_tagged_by_kind() {
    let w = Warning::TimeRangeExceeded {
        clip: "layer-3".to_string(),
        end: 12.0,
        duration: 10.0,
    };
    let v = serde_json::to_value(&w).unwrap();
    assert_eq!(v["kind"], "timeRangeExceeded");
    assert_eq!(v["clip"], "layer-3");
    let back: Warning = serde_json::from_value(v).unwrap();
    assert_eq!(back, w);
}

#[test]
fn display_names_the_entity() {
    let w = Warning::DuplicateComposition {
        id: "7".to_string(),
        offset: 120,
    };
    assert_eq!(w.to_string(), "duplicate composition '7' at offset 120 ignored");
}
