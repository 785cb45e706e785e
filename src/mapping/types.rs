//! Raw-token to canonical-type tables.
//!
//! Lookups are pure: they only read the tables, and every token maps to something through an
//! explicit fallback arm.

use std::collections::BTreeMap;
use std::fmt;

use crate::foundation::error::{AeplanError, AeplanResult};

/// Canonical layer type.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    /// Text layer.
    Text,
    /// Vector shape or solid.
    Shape,
    /// Moving footage.
    Video,
    /// Still image.
    Image,
    /// Audio-only layer.
    Audio,
}

/// Canonical asset type.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    /// Video file.
    Video,
    /// Audio file.
    Audio,
    /// Image file.
    Image,
}

/// Kind of a template clip: a layer type or the synthetic background.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ClipKind {
    /// Composition background fill.
    Background,
    /// See [`LayerType::Shape`].
    Shape,
    /// See [`LayerType::Image`].
    Image,
    /// See [`LayerType::Video`].
    Video,
    /// See [`LayerType::Audio`].
    Audio,
    /// See [`LayerType::Text`].
    Text,
}

impl ClipKind {
    /// Lowercase name used in ids and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Shape => "shape",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for ClipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<LayerType> for ClipKind {
    fn from(t: LayerType) -> Self {
        match t {
            LayerType::Text => Self::Text,
            LayerType::Shape => Self::Shape,
            LayerType::Video => Self::Video,
            LayerType::Image => Self::Image,
            LayerType::Audio => Self::Audio,
        }
    }
}

/// Track priority per clip kind. Lower renders first (bottom of the stack).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrackPriorities {
    /// Background priority.
    pub background: u8,
    /// Shape priority.
    pub shape: u8,
    /// Image priority.
    pub image: u8,
    /// Video priority.
    pub video: u8,
    /// Audio priority.
    pub audio: u8,
    /// Text priority.
    pub text: u8,
}

impl Default for TrackPriorities {
    fn default() -> Self {
        Self {
            background: 0,
            shape: 1,
            image: 2,
            video: 3,
            audio: 4,
            text: 5,
        }
    }
}

impl TrackPriorities {
    /// Priority of `kind`.
    pub fn get(&self, kind: ClipKind) -> u8 {
        match kind {
            ClipKind::Background => self.background,
            ClipKind::Shape => self.shape,
            ClipKind::Image => self.image,
            ClipKind::Video => self.video,
            ClipKind::Audio => self.audio,
            ClipKind::Text => self.text,
        }
    }
}

/// Result of a table lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mapped<T> {
    /// Canonical value.
    pub value: T,
    /// `true` when the fallback arm was taken.
    pub fallback: bool,
}

/// Lookup tables for layer types, asset types and track priorities.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TypeMapper {
    /// Normalized raw layer token to canonical type.
    pub layer_types: BTreeMap<String, LayerType>,
    /// Type used for unmapped layer tokens.
    pub layer_fallback: LayerType,
    /// Normalized file extension to canonical asset type.
    pub asset_types: BTreeMap<String, AssetType>,
    /// Type used for unmapped extensions.
    pub asset_fallback: AssetType,
    /// Track priority table.
    pub priorities: TrackPriorities,
}

impl Default for TypeMapper {
    fn default() -> Self {
        use AssetType as A;
        use LayerType as L;

        let layer_types = [
            ("text", L::Text),
            ("txt", L::Text),
            ("shap", L::Shape),
            ("shape", L::Shape),
            ("soli", L::Shape),
            ("solid", L::Shape),
            ("null", L::Shape),
            ("adj", L::Shape),
            ("av", L::Video),
            ("vide", L::Video),
            ("video", L::Video),
            ("foot", L::Video),
            ("footage", L::Video),
            ("imag", L::Image),
            ("image", L::Image),
            ("img", L::Image),
            ("stil", L::Image),
            ("still", L::Image),
            ("audi", L::Audio),
            ("audio", L::Audio),
            ("snd", L::Audio),
        ];
        let asset_types = [
            ("mp4", A::Video),
            ("mov", A::Video),
            ("m4v", A::Video),
            ("avi", A::Video),
            ("mkv", A::Video),
            ("webm", A::Video),
            ("mxf", A::Video),
            ("mpg", A::Video),
            ("mpeg", A::Video),
            ("wav", A::Audio),
            ("mp3", A::Audio),
            ("aac", A::Audio),
            ("m4a", A::Audio),
            ("aif", A::Audio),
            ("aiff", A::Audio),
            ("ogg", A::Audio),
            ("flac", A::Audio),
            ("png", A::Image),
            ("jpg", A::Image),
            ("jpeg", A::Image),
            ("gif", A::Image),
            ("tif", A::Image),
            ("tiff", A::Image),
            ("psd", A::Image),
            ("bmp", A::Image),
            ("webp", A::Image),
            ("svg", A::Image),
            ("exr", A::Image),
            ("tga", A::Image),
        ];

        Self {
            layer_types: layer_types
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            layer_fallback: L::Shape,
            asset_types: asset_types
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            asset_fallback: A::Image,
            priorities: TrackPriorities::default(),
        }
    }
}

/// Trim whitespace and NULs, lowercase ASCII.
pub fn normalize_token(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_ascii_lowercase()
}

impl TypeMapper {
    /// Canonical layer type for `token`; unmapped tokens take `layer_fallback`.
    pub fn layer(&self, token: &str) -> LayerType {
        self.map_layer(token).value
    }

    /// Layer lookup that also reports whether the fallback arm was used.
    pub fn map_layer(&self, token: &str) -> Mapped<LayerType> {
        match self.layer_types.get(&normalize_token(token)) {
            Some(&value) => Mapped {
                value,
                fallback: false,
            },
            None => Mapped {
                value: self.layer_fallback,
                fallback: true,
            },
        }
    }

    /// Canonical asset type for an extension token; unmapped tokens take `asset_fallback`.
    pub fn asset(&self, token: &str) -> AssetType {
        self.map_asset(token).value
    }

    /// Asset lookup that also reports whether the fallback arm was used.
    pub fn map_asset(&self, token: &str) -> Mapped<AssetType> {
        let norm = normalize_token(token);
        match self.asset_types.get(norm.trim_start_matches('.')) {
            Some(&value) => Mapped {
                value,
                fallback: false,
            },
            None => Mapped {
                value: self.asset_fallback,
                fallback: true,
            },
        }
    }

    /// Asset lookup keyed by the extension of the last path segment.
    pub fn map_asset_path(&self, path: &str) -> Mapped<AssetType> {
        self.map_asset(extension_token(path))
    }

    /// Track priority of `kind`.
    pub fn priority(&self, kind: ClipKind) -> u8 {
        self.priorities.get(kind)
    }

    /// Rewrite table keys into the form lookups use. Later duplicates win.
    pub fn normalize_keys(&mut self) {
        self.layer_types = std::mem::take(&mut self.layer_types)
            .into_iter()
            .map(|(k, v)| (normalize_token(&k), v))
            .collect();
        self.asset_types = std::mem::take(&mut self.asset_types)
            .into_iter()
            .map(|(k, v)| (asset_key(&k), v))
            .collect();
    }

    /// Reject keys that no lookup could ever reach.
    pub fn validate(&self) -> AeplanResult<()> {
        for k in self.layer_types.keys() {
            if k.is_empty() || normalize_token(k) != *k {
                return Err(AeplanError::validation(format!(
                    "layer type key '{k}' must be trimmed, lowercase and non-empty"
                )));
            }
        }
        for k in self.asset_types.keys() {
            if k.is_empty() || asset_key(k) != *k {
                return Err(AeplanError::validation(format!(
                    "asset type key '{k}' must be trimmed, lowercase and have no leading '.'"
                )));
            }
        }
        Ok(())
    }

    /// Replace one layer-token mapping.
    pub fn with_layer_token(mut self, token: &str, ty: LayerType) -> Self {
        self.layer_types.insert(normalize_token(token), ty);
        self
    }

    /// Replace one asset-extension mapping.
    pub fn with_asset_token(mut self, token: &str, ty: AssetType) -> Self {
        self.asset_types.insert(asset_key(token), ty);
        self
    }
}

fn asset_key(raw: &str) -> String {
    normalize_token(raw).trim_start_matches('.').to_string()
}

/// Extension of the last `/` or `\` separated segment, without the dot.
pub fn extension_token(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => "",
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mapping/types.rs"]
mod tests;
