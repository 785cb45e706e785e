use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::container::classify::Interpolation;
use crate::foundation::core::{Rgb8, Vec2};
use crate::foundation::diagnostics::Warning;
use crate::foundation::error::{AeplanError, AeplanResult};
use crate::mapping::types::{AssetType, ClipKind};

/// Canonical render-ready template.
///
/// Produced by [`crate::TemplateBuilder`] from a container, or parsed from JSON forwarded by an
/// outer service. Serialized with camelCase keys; `metadata` and `mergeFields` may be omitted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Provenance and catalog information.
    #[serde(default)]
    pub metadata: TemplateMetadata,
    /// Header plus ordered tracks.
    pub timeline: Timeline,
    /// Default values for merge fields.
    #[serde(default)]
    pub merge_fields: BTreeMap<String, String>,
}

/// Provenance and catalog information carried next to the timeline.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateMetadata {
    /// Producer name and version.
    pub generator: String,
    /// Root form type of the source container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_format: Option<String>,
    /// One entry per extracted composition, in output order.
    pub compositions: Vec<CompositionSummary>,
    /// Footage catalog.
    pub assets: Vec<AssetEntry>,
    /// Merge-field names referenced anywhere in the template, sorted.
    pub variables: Vec<String>,
    /// Recoverable conditions raised while producing the template.
    pub warnings: Vec<Warning>,
}

/// Short description of one composition.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionSummary {
    /// Composition id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Canvas width.
    pub width: u32,
    /// Canvas height.
    pub height: u32,
    /// Frames per second.
    pub fps: f64,
    /// Duration in seconds.
    pub duration: f64,
    /// Number of layers kept.
    pub layers: usize,
    /// Created for layers with no enclosing composition.
    #[serde(default)]
    pub synthetic: bool,
}

/// Catalog entry for one footage source.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AssetEntry {
    /// `asset-N`.
    pub id: String,
    /// Canonical type.
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    /// Source path.
    pub src: String,
}

/// Timeline header and tracks.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Timeline {
    /// Duration in seconds.
    pub duration: f64,
    /// Frames per second.
    pub fps: f64,
    /// Output size.
    pub resolution: Resolution,
    /// Background fill.
    #[serde(default)]
    pub background: Background,
    /// Tracks in draw order, bottom first.
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Output size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Timeline background.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Background {
    /// Fill color.
    pub color: Rgb8,
}

/// Ordered clips belonging to one composition.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    /// Track id.
    pub id: String,
    /// Owning composition id.
    #[serde(default)]
    pub composition: String,
    /// Duration in seconds; every clip window must fit inside it.
    pub duration: f64,
    /// Clips in draw order.
    #[serde(default)]
    pub clips: Vec<Clip>,
}

/// A timed, positioned piece of content.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Clip {
    /// Clip id, unique in the template.
    pub id: String,
    /// Kind-specific payload; carries the `type` field.
    #[serde(flatten)]
    pub content: ClipContent,
    /// Start in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
    /// Opacity, 0 to 100.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Position in pixels; the canvas center when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec2>,
    /// Scale in percent.
    #[serde(default = "default_scale")]
    pub scale: Vec2,
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Effect match names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<String>,
    /// Expression sources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expressions: Vec<String>,
    /// Animated properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<Animation>,
}

fn default_opacity() -> f64 {
    100.0
}

fn default_scale() -> Vec2 {
    Vec2::new(100.0, 100.0)
}

impl Clip {
    /// Kind of this clip.
    pub fn kind(&self) -> ClipKind {
        self.content.kind()
    }

    /// End of the clip window in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Kind-specific clip payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClipContent {
    /// Solid fill behind everything else.
    Background {
        /// Fill color.
        color: Rgb8,
    },
    /// Vector shape.
    Shape {
        /// Fill color, if known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<Rgb8>,
    },
    /// Still image.
    Image(Media),
    /// Moving footage.
    Video(Media),
    /// Audio-only footage.
    Audio(Media),
    /// Text.
    Text {
        /// Text content; may hold merge-field references.
        text: String,
    },
}

impl ClipContent {
    /// Kind tag of this payload.
    pub fn kind(&self) -> ClipKind {
        match self {
            Self::Background { .. } => ClipKind::Background,
            Self::Shape { .. } => ClipKind::Shape,
            Self::Image(_) => ClipKind::Image,
            Self::Video(_) => ClipKind::Video,
            Self::Audio(_) => ClipKind::Audio,
            Self::Text { .. } => ClipKind::Text,
        }
    }

    /// The field merge fields may appear in, if this kind has one.
    pub fn text_field(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image(m) | Self::Video(m) | Self::Audio(m) => m.src.as_deref(),
            Self::Background { .. } | Self::Shape { .. } => None,
        }
    }

    /// Mutable access to [`ClipContent::text_field`].
    pub fn text_field_mut(&mut self) -> Option<&mut String> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image(m) | Self::Video(m) | Self::Audio(m) => m.src.as_mut(),
            Self::Background { .. } | Self::Shape { .. } => None,
        }
    }
}

/// Source reference shared by image, video and audio clips.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Media {
    /// Source path or URL; may hold merge-field references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Catalog id in [`TemplateMetadata::assets`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
}

/// Keyframes for one property.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Animation {
    /// Property name.
    pub property: String,
    /// Keyframes in ascending time order.
    pub keyframes: Vec<KeyframeEntry>,
}

/// One keyframe.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeyframeEntry {
    /// Time in seconds.
    pub time: f64,
    /// One to four components.
    pub value: Vec<f64>,
    /// Interpolation toward the next keyframe.
    #[serde(default)]
    pub interpolation: Interpolation,
}

impl Template {
    /// Parse and validate a template from JSON text.
    pub fn from_json_str(s: &str) -> AeplanResult<Self> {
        let t: Self = serde_json::from_str(s)
            .map_err(|e| AeplanError::serde(format!("parse template JSON: {e}")))?;
        t.validate()?;
        Ok(t)
    }

    /// Parse and validate a template from a JSON reader.
    pub fn from_reader(reader: impl Read) -> AeplanResult<Self> {
        let t: Self = serde_json::from_reader(reader)
            .map_err(|e| AeplanError::serde(format!("parse template JSON: {e}")))?;
        t.validate()?;
        Ok(t)
    }

    /// Parse and validate a template from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> AeplanResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            AeplanError::validation(format!("open template '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Pretty-printed JSON.
    pub fn to_json_string(&self) -> AeplanResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AeplanError::serde(format!("serialize template: {e}")))
    }

    /// All clips, track by track.
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.timeline.tracks.iter().flat_map(|t| t.clips.iter())
    }

    /// Check structural constraints.
    ///
    /// Clip windows overrunning their track are not rejected here; the compiler applies the
    /// configured time-range policy to them.
    pub fn validate(&self) -> AeplanResult<()> {
        let tl = &self.timeline;
        if !(tl.fps.is_finite() && tl.fps > 0.0) {
            return Err(AeplanError::validation("timeline fps must be > 0"));
        }
        if !(tl.duration.is_finite() && tl.duration >= 0.0) {
            return Err(AeplanError::validation(
                "timeline duration must be finite and >= 0",
            ));
        }
        if tl.resolution.width == 0 || tl.resolution.height == 0 {
            return Err(AeplanError::validation(
                "timeline resolution width/height must be > 0",
            ));
        }

        let mut ids = BTreeSet::new();
        for track in &tl.tracks {
            if !(track.duration.is_finite() && track.duration >= 0.0) {
                return Err(AeplanError::validation(format!(
                    "track '{}' duration must be finite and >= 0",
                    track.id
                )));
            }
            for clip in &track.clips {
                if !ids.insert(clip.id.as_str()) {
                    return Err(AeplanError::validation(format!(
                        "duplicate clip id '{}'",
                        clip.id
                    )));
                }
                validate_clip(clip)?;
            }
        }
        Ok(())
    }
}

fn validate_clip(clip: &Clip) -> AeplanResult<()> {
    let bad = |what: &str| {
        AeplanError::validation(format!("clip '{}' {what}", clip.id))
    };
    if !clip.start.is_finite() {
        return Err(bad("start must be finite"));
    }
    if !(clip.duration.is_finite() && clip.duration >= 0.0) {
        return Err(bad("duration must be finite and >= 0"));
    }
    if !clip.opacity.is_finite() {
        return Err(bad("opacity must be finite"));
    }
    let finite_vec = |v: Vec2| v.x.is_finite() && v.y.is_finite();
    if !finite_vec(clip.scale) || clip.position.is_some_and(|p| !finite_vec(p)) {
        return Err(bad("position/scale must be finite"));
    }
    if !clip.rotation.is_finite() {
        return Err(bad("rotation must be finite"));
    }
    for anim in &clip.animations {
        for kf in &anim.keyframes {
            if !kf.time.is_finite() || kf.value.is_empty() || kf.value.len() > 4 {
                return Err(bad(&format!(
                    "animation '{}' has an invalid keyframe",
                    anim.property
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/template/model.rs"]
mod tests;
