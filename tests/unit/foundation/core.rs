use super::*;

#[test]
fn frame_range_contains_boundaries() {
    let r = FrameRange::new(FrameIndex(2), FrameIndex(5)).unwrap();
    assert!(!r.contains(FrameIndex(1)));
    assert!(r.contains(FrameIndex(2)));
    assert!(r.contains(FrameIndex(4)));
    assert!(!r.contains(FrameIndex(5)));
    assert_eq!(r.len_frames(), 3);
}

#[test]
fn frame_range_rejects_inverted_bounds() {
    assert!(FrameRange::new(FrameIndex(5), FrameIndex(2)).is_err());
}

#[test]
fn fps_from_f64_reduces_and_detects_ntsc() {
    assert_eq!(Fps::from_f64(24.0).unwrap(), Fps { num: 24, den: 1 });
    assert_eq!(Fps::from_f64(12.5).unwrap(), Fps { num: 25, den: 2 });
    assert_eq!(Fps::from_f64(29.97).unwrap(), Fps { num: 30000, den: 1001 });
    assert_eq!(Fps::from_f64(23.976).unwrap(), Fps { num: 24000, den: 1001 });
    assert!(Fps::from_f64(0.0).is_err());
    assert!(Fps::from_f64(f64::NAN).is_err());
}

#[test]
fn fps_from_f64_rejects_unrepresentable_rates() {
    // NTSC numerator 4294968 * 1000 does not fit in u32.
    assert!(Fps::from_f64(4_294_968.0 / 1.001).is_err());
    assert!(Fps::from_f64(0.0001).is_err());
    assert!(Fps::from_f64(1e12).is_err());
}

#[test]
fn fps_frames_secs_roundtrip_floor() {
    let fps = Fps::new(30000, 1001).unwrap();
    let secs = fps.frames_to_secs(123);
    assert_eq!(fps.secs_to_frames_floor(secs), 123);
    assert_eq!(fps.secs_to_frames_round(secs), 123);
}

#[test]
fn rgb8_hex_parses_short_and_long_forms() {
    assert_eq!(Rgb8::parse_hex("#ff3366").unwrap(), Rgb8::new(255, 51, 102));
    assert_eq!(Rgb8::parse_hex("fff").unwrap(), Rgb8::WHITE);
    assert!(Rgb8::parse_hex("#12345").is_err());
    assert!(Rgb8::parse_hex("#gg0000").is_err());
    assert_eq!(Rgb8::new(1, 2, 255).to_string(), "#0102ff");
}

#[test]
fn rgb8_serializes_as_hex_string() {
    let s = serde_json::to_string(&Rgb8::new(0, 128, 255)).unwrap();
    assert_eq!(s, "\"#0080ff\"");
    let back: Rgb8 = serde_json::from_str(&s).unwrap();
    assert_eq!(back, Rgb8::new(0, 128, 255));
}

#[test]
fn transform_to_affine_identity_and_translation() {
    let t = Transform2D {
        position: Vec2::ZERO,
        scale: Vec2::new(100.0, 100.0),
        rotation: 0.0,
    };
    assert_eq!(t.to_affine(), Affine::IDENTITY);

    let t = Transform2D {
        position: Vec2::new(10.0, -2.5),
        ..t
    };
    assert_eq!(t.to_affine(), Affine::translate(Vec2::new(10.0, -2.5)));
}

#[test]
fn transform_scale_is_percent() {
    let t = Transform2D {
        position: Vec2::ZERO,
        scale: Vec2::new(50.0, 200.0),
        rotation: 0.0,
    };
    assert_eq!(t.to_affine(), Affine::scale_non_uniform(0.5, 2.0));
}
