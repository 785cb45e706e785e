use crate::container::classify::Interpolation;
use crate::container::signature::FourCc;
use crate::foundation::core::{Canvas, Rgb8, Transform2D};
use crate::mapping::types::{AssetType, LayerType};

/// Arena index into [`ExtractedProject::compositions`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositionIdx(pub(crate) u32);

/// Arena index into [`ExtractedProject::layers`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerIdx(pub(crate) u32);

/// Arena index into [`ExtractedProject::assets`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetIdx(pub(crate) u32);

macro_rules! arena_index {
    ($($ty:ident),*) => {$(
        impl $ty {
            pub(crate) fn from_usize(i: usize) -> Self {
                Self(u32::try_from(i).unwrap_or(u32::MAX))
            }

            /// Position in the owning arena.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    )*};
}

arena_index!(CompositionIdx, LayerIdx, AssetIdx);

/// Composition with defaults applied.
#[derive(Clone, Debug, PartialEq)]
pub struct Composition {
    /// Source id in decimal, or `default` for the synthetic composition.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Canvas size in pixels.
    pub canvas: Canvas,
    /// Frames per second.
    pub fps: f64,
    /// Duration in seconds.
    pub duration: f64,
    /// Background fill.
    pub background: Rgb8,
    /// `true` when created on demand for layers with no enclosing composition.
    pub synthetic: bool,
}

/// One keyframe on an animated property.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    /// Time in seconds, composition-relative.
    pub time: f64,
    /// One to four value components.
    pub value: Vec<f64>,
    /// Interpolation toward the next keyframe.
    pub interpolation: Interpolation,
}

/// A named property and its keyframes, sorted by time.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimatedProperty {
    /// Property name as stored in the container.
    pub name: String,
    /// Keyframes in ascending time order; equal times keep stream order.
    pub keyframes: Vec<Keyframe>,
}

/// Layer with defaults applied and its type resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    /// Position among accepted layers in the parse, starting at 0.
    pub ordinal: usize,
    /// Source identifier, if present.
    pub source_id: Option<u32>,
    /// Owning composition.
    pub composition: CompositionIdx,
    /// Display name.
    pub name: String,
    /// Type token as read from the container.
    pub raw_type: String,
    /// Canonical type.
    pub layer_type: LayerType,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
    /// Opacity, 0 to 100.
    pub opacity: f64,
    /// Position, scale and rotation.
    pub transform: Transform2D,
    /// Text document, for text layers.
    pub text: Option<String>,
    /// Shape fill.
    pub fill: Option<Rgb8>,
    /// Footage source.
    pub asset: Option<AssetIdx>,
    /// Effect match names in stream order.
    pub effects: Vec<String>,
    /// Expression sources in stream order.
    pub expressions: Vec<String>,
    /// Animated properties in stream order.
    pub animations: Vec<AnimatedProperty>,
}

impl Layer {
    /// Stable clip identifier derived from the ordinal.
    pub fn clip_id(&self) -> String {
        format!("layer-{}", self.ordinal)
    }

    /// Keyframes held across every animated property.
    pub fn keyframe_count(&self) -> usize {
        self.animations.iter().map(|a| a.keyframes.len()).sum()
    }
}

/// A unique footage source.
#[derive(Clone, Debug, PartialEq)]
pub struct Asset {
    /// `asset-N`, N being the catalog position.
    pub id: String,
    /// Canonical type from the path's extension.
    pub asset_type: AssetType,
    /// Source path exactly as stored.
    pub source_path: String,
}

/// Everything extracted from one container, in arena form.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedProject {
    /// Root form type.
    pub form_type: FourCc,
    /// Compositions in first-occurrence order.
    pub compositions: Vec<Composition>,
    /// Layers in stream order.
    pub layers: Vec<Layer>,
    /// Asset catalog in first-occurrence order.
    pub assets: Vec<Asset>,
}

impl ExtractedProject {
    /// Look up a composition.
    pub fn composition(&self, idx: CompositionIdx) -> &Composition {
        &self.compositions[idx.index()]
    }

    /// Look up a layer.
    pub fn layer(&self, idx: LayerIdx) -> &Layer {
        &self.layers[idx.index()]
    }

    /// Look up an asset.
    pub fn asset(&self, idx: AssetIdx) -> &Asset {
        &self.assets[idx.index()]
    }

    /// Layers owned by `idx`, in stream order.
    pub fn layers_of(&self, idx: CompositionIdx) -> impl Iterator<Item = &Layer> + '_ {
        self.layers.iter().filter(move |l| l.composition == idx)
    }

    /// Composition indices in output order.
    pub fn composition_indices(&self) -> impl Iterator<Item = CompositionIdx> + '_ {
        (0..self.compositions.len()).map(CompositionIdx::from_usize)
    }
}
