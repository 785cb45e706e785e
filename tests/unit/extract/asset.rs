use super::*;
use crate::mapping::types::AssetType;

#[test]
fn identical_paths_share_one_entry() {
    let types = TypeMapper::default();
    let mut catalog = AssetCatalog::new();
    let a = catalog.intern("media/intro.mp4", &types);
    let b = catalog.intern("media/logo.png", &types);
    let c = catalog.intern("media/intro.mp4", &types);
    assert_eq!(a, c);
    assert_ne!(a, b);
    assert_eq!(catalog.len(), 2);

    let assets = catalog.finish();
    assert_eq!(assets[0].id, "asset-0");
    assert_eq!(assets[0].asset_type, AssetType::Video);
    assert_eq!(assets[1].id, "asset-1");
    assert_eq!(assets[1].asset_type, AssetType::Image);
}

#[test]
fn dedup_is_exact_not_normalized() {
    let types = TypeMapper::default();
    let mut catalog = AssetCatalog::new();
    catalog.intern("a/Intro.MP4", &types);
    catalog.intern("a/intro.mp4", &types);
    assert_eq!(catalog.len(), 2);
}

#[test]
fn empty_paths_are_ignored_and_unknown_extensions_are_images() {
    let types = TypeMapper::default();
    let mut catalog = AssetCatalog::new();
    assert_eq!(catalog.intern("", &types), None);
    assert!(catalog.is_empty());
    catalog.intern("sidecar.xyz", &types);
    assert_eq!(catalog.finish()[0].asset_type, AssetType::Image);
}
