//! aeplan turns binary motion-graphics project containers into render-ready JSON templates and
//! deterministic render plans.
//!
//! The pipeline is a chain of pure stages over an immutable [`ConvertConfig`]:
//!
//! - Scan the RIFX-style container with [`ChunkScanner`] and decode chunks with [`classify`]
//! - Extract compositions, layers, keyframes and assets with [`extract_project`]
//! - Assemble a canonical [`Template`] with [`TemplateBuilder`]
//! - Substitute merge fields with [`resolve_template`]
//! - Compile an ordered [`RenderPlan`] with [`TimelineCompiler`]
//!
//! [`Pipeline`] drives the stages and tags failures with the [`Stage`] they occurred in.
//! Recoverable conditions never abort a run; they are collected as [`Warning`]s and carried into
//! the template metadata and the plan.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod compile;
mod container;
mod extract;
mod foundation;
mod mapping;
mod pipeline;
mod resolve;
mod template;

pub use crate::foundation::config::{
    AnalysisStrategy, CompositionDefaults, ConvertConfig, LayerDefaults, LimitPolicy, Limits,
    ResolverMode, TimeRangePolicy, TrackLayout,
};
pub use crate::foundation::core::{
    Affine, Canvas, Fps, FrameIndex, FrameRange, Rgb8, Transform2D, Vec2,
};
pub use crate::foundation::diagnostics::{Diagnostics, Warning};
pub use crate::foundation::error::{AeplanError, AeplanResult};

pub use crate::container::classify::{
    ChunkRecord, ClassifiedChunk, CompositionRecord, Interpolation, KeyframeRecord, LayerRecord,
    classify, decode_text,
};
pub use crate::container::inspect::{ChunkEntry, Inspection};
pub use crate::container::scanner::{
    CHUNK_HEADER_LEN, CancelToken, Chunk, ChunkIter, ChunkScanner, FORM_TYPE_LEN,
};
pub use crate::container::signature::{
    ChunkRole, FourCc, SIGNATURE_TABLE_VERSION, SignatureRegistry,
};
pub use crate::container::writer::{ContainerWriter, DEFAULT_FORM_TYPE};

pub use crate::extract::composition::DEFAULT_COMPOSITION_ID;
pub use crate::extract::model::{
    AnimatedProperty, Asset, AssetIdx, Composition, CompositionIdx, ExtractedProject, Keyframe,
    Layer, LayerIdx,
};
pub use crate::extract::project::extract_project;

pub use crate::mapping::types::{
    AssetType, ClipKind, LayerType, Mapped, TrackPriorities, TypeMapper, extension_token,
    normalize_token,
};

pub use crate::template::builder::{GENERATOR, TemplateBuilder};
pub use crate::template::model::{
    Animation, AssetEntry, Background, Clip, ClipContent, CompositionSummary, KeyframeEntry,
    Media, Resolution, Template, TemplateMetadata, Timeline, Track,
};

pub use crate::resolve::merge::{
    FieldRef, MergeFieldMap, MergeFieldResolver, Syntax, collect_variables, effective_values,
    find_references, resolve_template,
};

pub use crate::compile::compiler::{TimelineCompiler, shadow_duplicates};
pub use crate::compile::fingerprint::{TemplateFingerprint, fingerprint_template};
pub use crate::compile::plan::{RenderClip, RenderPlan, RenderTrack};

pub use crate::pipeline::run::{Extraction, Pipeline, compile, convert, convert_batch};
pub use crate::pipeline::stage::{PipelineFailure, PipelineState, Stage};
