use super::*;
use crate::container::signature::FourCc;

fn chunk(role: ChunkRole, payload: &[u8]) -> Chunk<'_> {
    Chunk {
        tag: FourCc::new(b"test"),
        role,
        offset: 40,
        length: payload.len() as u32,
        payload,
    }
}

#[test]
fn full_composition_payload_decodes_every_field() {
    let mut p = Vec::new();
    p.extend_from_slice(&7u32.to_be_bytes());
    p.extend_from_slice(&1280u16.to_be_bytes());
    p.extend_from_slice(&720u16.to_be_bytes());
    p.extend_from_slice(&30.0f32.to_be_bytes());
    p.extend_from_slice(&12.5f32.to_be_bytes());
    p.extend_from_slice(&[10, 20, 30]);
    p.extend_from_slice(b"Main\0\0");

    let c = classify(&chunk(ChunkRole::Composition, &p));
    assert_eq!(c.offset, 40);
    assert_eq!(
        c.record,
        ChunkRecord::Composition(CompositionRecord {
            id: Some(7),
            width: Some(1280),
            height: Some(720),
            fps: Some(30.0),
            duration: Some(12.5),
            background: Some(Rgb8::new(10, 20, 30)),
            name: Some("Main".to_string()),
        })
    );
}

#[test]
fn short_payload_leaves_trailing_fields_absent() {
    let mut p = Vec::new();
    p.extend_from_slice(&7u32.to_be_bytes());
    p.extend_from_slice(&1280u16.to_be_bytes());
    p.push(0x02); // half of the height field

    let ChunkRecord::Composition(rec) = classify(&chunk(ChunkRole::Composition, &p)).record else {
        panic!("expected composition record");
    };
    assert_eq!(rec.id, Some(7));
    assert_eq!(rec.width, Some(1280));
    assert_eq!(rec.height, None);
    assert_eq!(rec.fps, None);
    assert_eq!(rec.name, None);
}

#[test]
fn layer_type_token_is_trimmed() {
    let mut p = Vec::new();
    p.extend_from_slice(&3u32.to_be_bytes());
    p.extend_from_slice(b"av\0 ");
    let ChunkRecord::Layer(rec) = classify(&chunk(ChunkRole::Layer, &p)).record else {
        panic!("expected layer record");
    };
    assert_eq!(rec.id, Some(3));
    assert_eq!(rec.type_token.as_deref(), Some("av"));
    assert_eq!(rec.start, None);
}

#[test]
fn keyframe_reads_up_to_four_components() {
    let mut p = Vec::new();
    p.extend_from_slice(&1.5f32.to_be_bytes());
    p.push(1);
    for v in [1.0f32, 2.0, 3.0, 4.0, 5.0] {
        p.extend_from_slice(&v.to_be_bytes());
    }
    let ChunkRecord::Keyframe(rec) = classify(&chunk(ChunkRole::Keyframe, &p)).record else {
        panic!("expected keyframe record");
    };
    assert_eq!(rec.time, Some(1.5));
    assert_eq!(rec.interpolation, Some(Interpolation::Hold));
    assert_eq!(rec.value, vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn unknown_interpolation_code_reads_as_linear() {
    assert_eq!(Interpolation::from_code(9), Interpolation::Linear);
    assert_eq!(Interpolation::from_code(2), Interpolation::Bezier);
}

#[test]
fn text_roles_decode_lossy_utf8() {
    let c = classify(&chunk(ChunkRole::Text, b"caf\xc3\xa9 \xff\0"));
    assert_eq!(c.record, ChunkRecord::Text("café \u{fffd}".to_string()));

    let c = classify(&chunk(ChunkRole::Footage, b"media/clip.mp4"));
    assert_eq!(c.record, ChunkRecord::Footage("media/clip.mp4".to_string()));
}

#[test]
fn shape_without_full_color_has_no_fill() {
    let c = classify(&chunk(ChunkRole::Shape, &[1, 2]));
    assert_eq!(c.record, ChunkRecord::Shape { fill: None });
    let c = classify(&chunk(ChunkRole::Shape, &[1, 2, 3]));
    assert_eq!(
        c.record,
        ChunkRecord::Shape {
            fill: Some(Rgb8::new(1, 2, 3))
        }
    );
}

#[test]
fn nested_root_is_its_own_variant() {
    let c = classify(&chunk(ChunkRole::Root, b"Egg!"));
    assert_eq!(c.record, ChunkRecord::NestedRoot);
}
