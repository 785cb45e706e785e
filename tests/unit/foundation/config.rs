use super::*;
use crate::mapping::types::{AssetType, LayerType};

#[test]
fn defaults_match_documented_values() {
    let cfg = ConvertConfig::default();
    assert_eq!(cfg.limits.max_file_bytes, 100 * 1024 * 1024);
    assert_eq!(cfg.limits.max_analysis_bytes, 10 * 1024 * 1024);
    assert_eq!(cfg.composition_defaults.width, 1920);
    assert_eq!(cfg.composition_defaults.height, 1080);
    assert_eq!(cfg.composition_defaults.fps, 24.0);
    assert_eq!(cfg.composition_defaults.duration, 10.0);
    assert_eq!(cfg.layer_defaults.duration, 5.0);
    assert_eq!(cfg.resolver, ResolverMode::Lenient);
    assert_eq!(cfg.time_range, TimeRangePolicy::Warn);
    assert_eq!(cfg.limit_policy, LimitPolicy::Warn);
    assert_eq!(cfg.strategy, AnalysisStrategy::BinaryHeuristic);
    cfg.validate().unwrap();
}

#[test]
fn partial_json_overrides_only_named_fields() {
    let cfg = ConvertConfig::from_json_str(
        r#"{ "limits": { "max_layers": 3 }, "resolver": "strict", "track_layout": "flattened" }"#,
    )
    .unwrap();
    assert_eq!(cfg.limits.max_layers, 3);
    assert_eq!(cfg.limits.max_compositions, 50);
    assert_eq!(cfg.resolver, ResolverMode::Strict);
    assert_eq!(cfg.track_layout, TrackLayout::Flattened);
}

#[test]
fn rejects_inconsistent_ceilings() {
    let err = ConvertConfig::from_json_str(
        r#"{ "limits": { "max_file_bytes": 10, "max_analysis_bytes": 20 } }"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("max_analysis_bytes"));
}

#[test]
fn rejects_unknown_enum_values() {
    assert!(ConvertConfig::from_json_str(r#"{ "resolver": "sloppy" }"#).is_err());
}

#[test]
fn only_binary_strategy_is_supported() {
    AnalysisStrategy::BinaryHeuristic.ensure_supported().unwrap();
    for s in [AnalysisStrategy::Script, AnalysisStrategy::NativeModule] {
        match s.ensure_supported() {
            Err(AeplanError::UnsupportedStrategy { strategy }) => assert_eq!(strategy, s.name()),
            other => panic!("expected UnsupportedStrategy, got {other:?}"),
        }
    }
}

#[test]
fn config_roundtrips_through_json() {
    let cfg = ConvertConfig::default();
    let s = serde_json::to_string(&cfg).unwrap();
    let back = ConvertConfig::from_json_str(&s).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn json_type_keys_are_normalized_on_load() {
    let cfg = ConvertConfig::from_json_str(
        r#"{ "types": {
            "layer_types": { "Caption": "text" },
            "asset_types": { ".M2TS": "video" }
        } }"#,
    )
    .unwrap();
    assert_eq!(cfg.types.layer("caption"), LayerType::Text);
    assert!(!cfg.types.map_layer("caption").fallback);
    assert_eq!(cfg.types.map_asset_path("a.m2ts").value, AssetType::Video);
    assert!(cfg.types.layer_types.contains_key("caption"));
    assert!(!cfg.types.layer_types.contains_key("Caption"));
}

#[test]
fn unreachable_type_keys_fail_validation() {
    let mut cfg = ConvertConfig::default();
    cfg.types.layer_types.insert("Caption".to_string(), LayerType::Text);
    assert!(matches!(cfg.validate(), Err(AeplanError::Validation(_))));
}

#[test]
fn default_fps_must_be_a_representable_rate() {
    let tiny = r#"{ "composition_defaults": { "fps": 0.0001 } }"#;
    assert!(ConvertConfig::from_json_str(tiny).is_err());
    let ntsc = r#"{ "composition_defaults": { "fps": 29.97 } }"#;
    let cfg = ConvertConfig::from_json_str(ntsc).unwrap();
    assert_eq!(cfg.composition_defaults.fps, 29.97);
}
