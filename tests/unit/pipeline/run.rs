use super::*;
use crate::container::classify::{CompositionRecord, LayerRecord};
use crate::container::writer::ContainerWriter;
use crate::foundation::config::{AnalysisStrategy, ResolverMode};
use crate::foundation::core::Rgb8;
use crate::foundation::diagnostics::Warning;
use crate::foundation::error::AeplanError;
use crate::template::model::ClipContent;

fn sample() -> Vec<u8> {
    ContainerWriter::new()
        .composition(&CompositionRecord {
            id: Some(1),
            width: Some(1920),
            height: Some(1080),
            fps: Some(24.0),
            duration: Some(10.0),
            background: Some(Rgb8::BLACK),
            name: None,
        })
        .unwrap()
        .layer(&LayerRecord {
            type_token: Some("text".to_string()),
            start: Some(1.0),
            duration: Some(8.0),
            ..Default::default()
        })
        .unwrap()
        .text("Hello {{name}}")
        .unwrap()
        .finish()
        .unwrap()
}

#[test]
fn template_run_ends_in_building() {
    let cfg = ConvertConfig::default();
    let mut p = Pipeline::new(&cfg);
    assert_eq!(p.state(), PipelineState::Idle);
    let t = p.template(&sample()).unwrap();
    assert_eq!(p.state(), PipelineState::Completed(Stage::Building));
    assert_eq!(t.timeline.tracks.len(), 1);
    assert_eq!(t.metadata.variables, vec!["name".to_string()]);
}

#[test]
fn compile_run_reaches_compiled() {
    let cfg = ConvertConfig::default();
    let mut p = Pipeline::new(&cfg);
    let mut runtime = MergeFieldMap::new();
    runtime.insert("name".to_string(), "World".to_string());
    let plan = p.compile(&sample(), &runtime).unwrap();
    assert_eq!(p.state(), PipelineState::Compiled);
    assert_eq!(plan.total_frames, 240);
    let clip = plan.clips().next().unwrap();
    assert_eq!(
        clip.content,
        ClipContent::Text {
            text: "Hello World".to_string()
        }
    );
    assert!(plan.warnings.is_empty());
}

#[test]
fn lenient_unresolved_reference_is_reported_in_plan() {
    let cfg = ConvertConfig::default();
    let plan = compile(&sample(), &MergeFieldMap::new(), &cfg).unwrap();
    assert!(matches!(
        plan.warnings.as_slice(),
        [Warning::MergeFieldUnresolved { name, .. }] if name == "name"
    ));
}

#[test]
fn strict_failure_is_tagged_with_resolving() {
    let cfg = ConvertConfig {
        resolver: ResolverMode::Strict,
        ..Default::default()
    };
    let mut p = Pipeline::new(&cfg);
    let err = p.compile(&sample(), &MergeFieldMap::new()).unwrap_err();
    assert_eq!(err.stage, Stage::Resolving);
    assert!(matches!(err.error, AeplanError::MergeFieldUnresolved { .. }));
    assert_eq!(p.state(), PipelineState::Failed(Stage::Resolving));
}

#[test]
fn unsupported_strategy_fails_before_scanning() {
    let cfg = ConvertConfig {
        strategy: AnalysisStrategy::Script,
        ..Default::default()
    };
    let err = convert(&sample(), &cfg).unwrap_err();
    assert_eq!(err.stage, Stage::Scanning);
    assert!(matches!(err.error, AeplanError::UnsupportedStrategy { .. }));
}

#[test]
fn garbage_input_fails_in_scanning() {
    let cfg = ConvertConfig::default();
    let err = convert(b"definitely not a container", &cfg).unwrap_err();
    assert_eq!(err.stage, Stage::Scanning);
    assert!(matches!(err.error, AeplanError::UnsupportedFormat { .. }));
    assert!(err.to_string().starts_with("scanning failed"));
}

#[test]
fn cancelled_token_times_out() {
    let cfg = ConvertConfig::default();
    let token = CancelToken::new();
    token.cancel();
    let mut p = Pipeline::new(&cfg).with_cancel(token);
    let err = p.template(&sample()).unwrap_err();
    assert!(matches!(err.error, AeplanError::Timeout { .. }));
    assert_eq!(p.state(), PipelineState::Failed(Stage::Scanning));
}

#[test]
fn inspect_lists_chunks() {
    let cfg = ConvertConfig::default();
    let mut p = Pipeline::new(&cfg);
    let inspection = p.inspect(&sample()).unwrap();
    assert_eq!(inspection.chunks.len(), 3);
    assert_eq!(p.state(), PipelineState::Completed(Stage::Scanning));
}

#[test]
fn compile_template_keeps_template_warnings_first() {
    let cfg = ConvertConfig::default();
    let mut template = convert(&sample(), &cfg).unwrap();
    template.metadata.warnings.push(Warning::OrphanChunk {
        role: crate::container::signature::ChunkRole::Effect,
        offset: 99,
    });
    let plan = Pipeline::new(&cfg)
        .compile_template(&template, &MergeFieldMap::new())
        .unwrap();
    assert!(matches!(plan.warnings[0], Warning::OrphanChunk { offset: 99, .. }));
    assert!(matches!(plan.warnings[1], Warning::MergeFieldUnresolved { .. }));
}

#[test]
fn batch_keeps_input_order() {
    let cfg = ConvertConfig::default();
    let inputs = vec![sample(), b"nope".to_vec(), sample()];
    let out = convert_batch(&inputs, &cfg);
    assert_eq!(out.len(), 3);
    assert!(out[0].is_ok());
    assert!(out[1].is_err());
    assert_eq!(out[0].as_ref().unwrap(), out[2].as_ref().unwrap());
}
