use std::collections::HashMap;

use crate::extract::model::{Asset, AssetIdx};
use crate::mapping::types::TypeMapper;

/// Footage sources deduplicated by exact path.
#[derive(Debug, Default)]
pub struct AssetCatalog {
    assets: Vec<Asset>,
    by_path: HashMap<String, AssetIdx>,
}

impl AssetCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `path`, adding an entry on first sight. Empty paths are not catalogued.
    pub fn intern(&mut self, path: &str, types: &TypeMapper) -> Option<AssetIdx> {
        if path.is_empty() {
            return None;
        }
        if let Some(&idx) = self.by_path.get(path) {
            return Some(idx);
        }

        let mapped = types.map_asset_path(path);
        if mapped.fallback {
            tracing::info!(path, fallback = ?mapped.value, "unmapped asset extension");
        }
        let idx = AssetIdx::from_usize(self.assets.len());
        self.assets.push(Asset {
            id: format!("asset-{}", idx.index()),
            asset_type: mapped.value,
            source_path: path.to_string(),
        });
        self.by_path.insert(path.to_string(), idx);
        Some(idx)
    }

    /// Number of unique sources.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Return `true` when nothing was catalogued.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Entries in first-occurrence order.
    pub fn finish(self) -> Vec<Asset> {
        self.assets
    }
}

#[cfg(test)]
#[path = "../../tests/unit/extract/asset.rs"]
mod tests;
