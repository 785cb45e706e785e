use super::*;
use crate::foundation::core::Vec2;

fn plan() -> RenderPlan {
    let clip = |id: &str, order: u32, start: u64, end: u64| RenderClip {
        id: id.to_string(),
        order,
        content: ClipContent::Shape { fill: None },
        start: 0.0,
        duration: 1.0,
        frames: FrameRange {
            start: FrameIndex(start),
            end: FrameIndex(end),
        },
        opacity: 1.0,
        transform: Affine::translate(Vec2::new(1.0, 2.0)),
        effects: Vec::new(),
        expressions: Vec::new(),
        animations: Vec::new(),
        clamped: false,
    };
    RenderPlan {
        duration: 2.0,
        total_frames: 48,
        fps: Fps::new(24, 1).unwrap(),
        resolution: Canvas {
            width: 320,
            height: 240,
        },
        background: Rgb8::BLACK,
        tracks: vec![RenderTrack {
            id: "t".to_string(),
            composition: "1".to_string(),
            duration: 2.0,
            clips: vec![clip("a", 0, 0, 24), clip("b", 1, 12, 48)],
        }],
        warnings: Vec::new(),
        template_fingerprint: "00".repeat(16),
    }
}

#[test]
fn clips_at_respects_half_open_ranges() {
    let p = plan();
    let at = |f| p.clips_at(f).map(|c| c.id.as_str()).collect::<Vec<_>>();
    assert_eq!(at(0), vec!["a"]);
    assert_eq!(at(12), vec!["a", "b"]);
    assert_eq!(at(24), vec!["b"]);
    assert!(at(48).is_empty());
}

#[test]
fn json_is_camel_case_with_flattened_type() {
    let p = plan();
    let v: serde_json::Value = serde_json::from_str(&p.to_json_string().unwrap()).unwrap();
    assert_eq!(v["totalFrames"], 48);
    assert!(v.get("templateFingerprint").is_some());
    let c = &v["tracks"][0]["clips"][0];
    assert_eq!(c["type"], "shape");
    assert_eq!(c["frames"]["end"], 24);
    assert_eq!(c["transform"].as_array().map(Vec::len), Some(6));
}

#[test]
fn dump_lists_every_clip() {
    let d = plan().dump();
    assert!(d.starts_with("plan 320x240 @ 24/1 fps, 48 frames"));
    assert_eq!(d.lines().count(), 4);
    assert!(d.contains("frames 12..48"));
}
