use super::*;
use crate::template::model::Template;

const RAW: &str = r#"{
  "timeline": {
    "duration": 4, "fps": 30, "resolution": { "width": 640, "height": 360 },
    "tracks": [ { "id": "t", "duration": 4, "clips": [
      { "id": "a", "type": "text", "text": "hi", "start": 0, "duration": 1 }
    ] } ]
  }
}"#;

#[test]
fn equal_templates_share_a_fingerprint() {
    let a = Template::from_json_str(RAW).unwrap();
    let b = Template::from_json_str(RAW).unwrap();
    assert_eq!(fingerprint_template(&a), fingerprint_template(&b));
    assert_eq!(fingerprint_template(&a).to_string().len(), 32);
}

#[test]
fn metadata_is_not_hashed() {
    let a = Template::from_json_str(RAW).unwrap();
    let mut b = a.clone();
    b.metadata.generator = "something else".to_string();
    b.metadata.variables.push("x".to_string());
    assert_eq!(fingerprint_template(&a), fingerprint_template(&b));
}

#[test]
fn content_changes_change_the_fingerprint() {
    let a = Template::from_json_str(RAW).unwrap();
    let base = fingerprint_template(&a);

    let mut b = a.clone();
    b.merge_fields.insert("k".to_string(), "v".to_string());
    assert_ne!(base, fingerprint_template(&b));

    let mut c = a.clone();
    c.timeline.tracks[0].clips[0].start = 0.5;
    assert_ne!(base, fingerprint_template(&c));

    let mut d = a.clone();
    if let ClipContent::Text { text } = &mut d.timeline.tracks[0].clips[0].content {
        text.push('!');
    }
    assert_ne!(base, fingerprint_template(&d));
}
