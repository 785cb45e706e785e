use super::*;
use crate::container::classify::{CompositionRecord, Interpolation, LayerRecord, classify};
use crate::container::scanner::ChunkScanner;
use crate::container::writer::ContainerWriter;
use crate::extract::project::extract_project;
use crate::foundation::core::Rgb8;
use crate::foundation::diagnostics::Diagnostics;

fn comp(id: u32, duration: f32) -> CompositionRecord {
    CompositionRecord {
        id: Some(id),
        width: Some(1920),
        height: Some(1080),
        fps: Some(24.0),
        duration: Some(duration),
        background: Some(Rgb8::new(1, 2, 3)),
        name: Some(format!("Comp {id}")),
    }
}

fn layer(token: &str, start: f32) -> LayerRecord {
    LayerRecord {
        type_token: Some(token.to_string()),
        start: Some(start),
        duration: Some(2.0),
        ..Default::default()
    }
}

fn mixed_container() -> Vec<u8> {
    ContainerWriter::new()
        .composition(&comp(1, 10.0))
        .unwrap()
        .layer(&layer("text", 3.0))
        .unwrap()
        .text("Hi {{name}}")
        .unwrap()
        .layer(&layer("shap", 1.0))
        .unwrap()
        .shape(Rgb8::WHITE)
        .unwrap()
        .layer(&layer("text", 1.0))
        .unwrap()
        .text("[subtitle]")
        .unwrap()
        .layer(&layer("av", 0.0))
        .unwrap()
        .footage("media/clip.mp4")
        .unwrap()
        .animation("Opacity")
        .unwrap()
        .keyframe(0.0, Interpolation::Linear, &[0.0])
        .unwrap()
        .layer(&layer("shap", 0.0))
        .unwrap()
        .composition(&comp(2, 4.0))
        .unwrap()
        .layer(&layer("audi", 0.0))
        .unwrap()
        .finish()
        .unwrap()
}

fn build(buf: &[u8], cfg: &ConvertConfig) -> Template {
    let scanner = ChunkScanner::new(buf, cfg).unwrap();
    let classified: Vec<_> = scanner.chunks().map(|c| classify(&c.unwrap())).collect();
    let mut diag = Diagnostics::new();
    let project = extract_project(classified, scanner.form_type(), cfg, &mut diag).unwrap();
    TemplateBuilder::new(cfg)
        .build(&project, diag.warnings())
        .unwrap()
}

fn ids(track: &Track) -> Vec<&str> {
    track.clips.iter().map(|c| c.id.as_str()).collect()
}

#[test]
fn per_type_tracks_follow_priority_then_start_then_ordinal() {
    let cfg = ConvertConfig::default();
    let t = build(&mixed_container(), &cfg);

    let track_ids: Vec<&str> = t.timeline.tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(
        track_ids,
        vec![
            "comp-1-shape",
            "comp-1-video",
            "comp-1-text",
            "comp-2-audio"
        ]
    );
    assert_eq!(ids(&t.timeline.tracks[0]), vec!["layer-4", "layer-1"]);
    assert_eq!(ids(&t.timeline.tracks[2]), vec!["layer-2", "layer-0"]);
    assert_eq!(t.timeline.tracks[3].composition, "2");
    assert_eq!(t.timeline.tracks[3].duration, 4.0);
}

#[test]
fn first_composition_defines_header() {
    let cfg = ConvertConfig::default();
    let t = build(&mixed_container(), &cfg);
    assert_eq!(t.timeline.duration, 10.0);
    assert_eq!(t.timeline.fps, 24.0);
    assert_eq!(
        t.timeline.resolution,
        Resolution {
            width: 1920,
            height: 1080
        }
    );
    assert_eq!(t.timeline.background.color, Rgb8::new(1, 2, 3));
}

#[test]
fn flattened_layout_keeps_global_order_with_background_first() {
    let mut cfg = ConvertConfig::default();
    cfg.track_layout = TrackLayout::Flattened;
    cfg.include_background_clip = true;
    let t = build(&mixed_container(), &cfg);
    assert_eq!(t.timeline.tracks.len(), 2);
    let main = &t.timeline.tracks[0];
    assert_eq!(main.id, "comp-1");
    assert_eq!(
        ids(main),
        vec![
            "comp-1-background",
            "layer-4",
            "layer-1",
            "layer-3",
            "layer-2",
            "layer-0"
        ]
    );
    assert_eq!(main.clips[0].kind(), ClipKind::Background);
}

#[test]
fn metadata_lists_catalog_and_variables() {
    let cfg = ConvertConfig::default();
    let t = build(&mixed_container(), &cfg);
    let m = &t.metadata;
    assert_eq!(m.generator, GENERATOR);
    assert_eq!(m.source_format.as_deref(), Some("Egg!"));
    assert_eq!(m.compositions.len(), 2);
    assert_eq!(m.compositions[0].layers, 5);
    assert_eq!(m.assets.len(), 1);
    assert_eq!(m.assets[0].src, "media/clip.mp4");
    assert_eq!(m.variables, vec!["name", "subtitle"]);
    assert!(t.merge_fields.is_empty());

    let video = t.clips().find(|c| c.id == "layer-3").unwrap();
    assert_eq!(
        video.content,
        ClipContent::Video(Media {
            src: Some("media/clip.mp4".to_string()),
            asset: Some("asset-0".to_string()),
        })
    );
    assert_eq!(video.animations.len(), 1);
}

#[test]
fn output_is_byte_identical_across_runs() {
    let cfg = ConvertConfig::default();
    let buf = mixed_container();
    let a = build(&buf, &cfg).to_json_string().unwrap();
    let b = build(&buf, &cfg).to_json_string().unwrap();
    assert_eq!(a, b);
}

#[test]
fn empty_project_uses_composition_defaults() {
    let cfg = ConvertConfig::default();
    let buf = ContainerWriter::new().finish().unwrap();
    let t = build(&buf, &cfg);
    assert!(t.timeline.tracks.is_empty());
    assert_eq!(t.timeline.duration, 10.0);
    assert_eq!(t.timeline.resolution.width, 1920);
    t.validate().unwrap();
}
