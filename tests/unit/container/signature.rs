use super::*;

#[test]
fn default_table_covers_every_role() {
    let reg = SignatureRegistry::default();
    for role in ChunkRole::ALL {
        assert!(reg.tag_for(role).is_some(), "no tag for {role:?}");
    }
    assert_eq!(reg.version, SIGNATURE_TABLE_VERSION);
    assert_eq!(reg.role(FourCc::new(b"RIFX")), Some(ChunkRole::Root));
    assert_eq!(reg.role(FourCc::new(b"Layr")), Some(ChunkRole::Layer));
    assert_eq!(reg.role(FourCc::new(b"LIST")), None);
}

#[test]
fn override_replaces_role_tag() {
    let reg = SignatureRegistry::default().with_tag(ChunkRole::Layer, FourCc::new(b"LAYR"));
    assert_eq!(reg.role(FourCc::new(b"LAYR")), Some(ChunkRole::Layer));
    assert_eq!(reg.role(FourCc::new(b"Layr")), None);
}

#[test]
fn registry_without_root_is_invalid() {
    let mut reg = SignatureRegistry::default();
    reg.tags.retain(|_, r| *r != ChunkRole::Root);
    assert!(reg.validate().is_err());
}

#[test]
fn fourcc_json_is_a_plain_string() {
    let s = serde_json::to_string(&FourCc::new(b"cdta")).unwrap();
    assert_eq!(s, "\"cdta\"");
    assert!(serde_json::from_str::<FourCc>("\"toolong\"").is_err());

    let reg: SignatureRegistry =
        serde_json::from_str(r#"{ "tags": { "ROOT": "root", "comp": "composition" } }"#).unwrap();
    assert_eq!(reg.role(FourCc::new(b"ROOT")), Some(ChunkRole::Root));
    assert_eq!(reg.version, SIGNATURE_TABLE_VERSION);
}

#[test]
fn display_masks_non_printable_bytes() {
    assert_eq!(FourCc([b'a', 0, b'c', 0xff]).to_string(), "a?c?");
}
