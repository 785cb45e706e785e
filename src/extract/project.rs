//! Stream-context driver feeding classified chunks to the entity extractors.
//!
//! The container is a flat chunk run, so ownership follows stream order: a layer belongs to the
//! latest composition, and text, shape, footage, effect, expression, animation and keyframe
//! chunks belong to the latest layer. Keyframes attach to the latest animation chunk of that
//! layer.

use crate::container::classify::{ChunkRecord, ClassifiedChunk};
use crate::container::signature::FourCc;
use crate::extract::asset::AssetCatalog;
use crate::extract::composition::{CompositionExtractor, CompositionOutcome};
use crate::extract::keyframe::{KeyframeExtractor, KeyframeOutcome, sort_keyframes};
use crate::extract::layer::LayerExtractor;
use crate::extract::model::{CompositionIdx, ExtractedProject, LayerIdx};
use crate::foundation::config::ConvertConfig;
use crate::foundation::diagnostics::{Diagnostics, Warning};
use crate::foundation::error::AeplanResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Context<I> {
    None,
    Active(I),
    Dropped,
}

/// Build an [`ExtractedProject`] from classified chunks in stream order.
///
/// Recoverable conditions go to `diag`; a limit only aborts under `LimitPolicy::Fail`.
#[tracing::instrument(level = "debug", skip_all, fields(form = %form_type))]
pub fn extract_project<I>(
    chunks: I,
    form_type: FourCc,
    config: &ConvertConfig,
    diag: &mut Diagnostics,
) -> AeplanResult<ExtractedProject>
where
    I: IntoIterator<Item = ClassifiedChunk>,
{
    let mut compositions = CompositionExtractor::new(config);
    let mut layers = LayerExtractor::new(config);
    let mut keyframes = KeyframeExtractor::new(config);
    let mut catalog = AssetCatalog::new();

    let mut comp_ctx: Context<CompositionIdx> = Context::None;
    let mut layer_ctx: Context<LayerIdx> = Context::None;

    for chunk in chunks {
        let ClassifiedChunk {
            offset,
            role,
            record,
        } = chunk;

        match record {
            ChunkRecord::NestedRoot => {
                tracing::debug!(offset, "ignoring nested root chunk");
            }
            ChunkRecord::Composition(rec) => {
                comp_ctx = match compositions.accept(&rec, offset, diag)? {
                    CompositionOutcome::Accepted(idx) | CompositionOutcome::Duplicate(idx) => {
                        Context::Active(idx)
                    }
                    CompositionOutcome::Dropped => Context::Dropped,
                };
                layer_ctx = Context::None;
            }
            ChunkRecord::Layer(rec) => {
                let comp_idx = match comp_ctx {
                    Context::Dropped => {
                        layer_ctx = Context::Dropped;
                        continue;
                    }
                    Context::Active(idx) => idx,
                    Context::None => {
                        let idx = compositions.default_composition();
                        comp_ctx = Context::Active(idx);
                        idx
                    }
                };
                let comp = compositions.get(comp_idx);
                layer_ctx = match layers.accept(&rec, comp_idx, comp, diag)? {
                    Some(idx) => Context::Active(idx),
                    None => Context::Dropped,
                };
            }
            ChunkRecord::Footage(path) => match layer_ctx {
                Context::Active(idx) => {
                    layers.get_mut(idx).asset = catalog.intern(&path, &config.types);
                }
                Context::Dropped => {}
                Context::None if comp_ctx == Context::Dropped => {}
                Context::None => {
                    catalog.intern(&path, &config.types);
                    tracing::debug!(offset, path = %path, "footage outside any layer");
                }
            },
            other => {
                let idx = match layer_ctx {
                    Context::Active(idx) => idx,
                    Context::Dropped => continue,
                    Context::None => {
                        if comp_ctx != Context::Dropped {
                            diag.warn(Warning::OrphanChunk { role, offset });
                        }
                        continue;
                    }
                };
                let layer = layers.get_mut(idx);
                match other {
                    ChunkRecord::Text(text) => layer.text = Some(text),
                    ChunkRecord::Shape { fill } => {
                        if fill.is_some() {
                            layer.fill = fill;
                        }
                    }
                    ChunkRecord::Effect(name) => {
                        if !name.is_empty() {
                            layer.effects.push(name);
                        }
                    }
                    ChunkRecord::Expression(src) => {
                        if !src.is_empty() {
                            layer.expressions.push(src);
                        }
                    }
                    ChunkRecord::Animation(name) => keyframes.begin_property(layer, name),
                    ChunkRecord::Keyframe(rec) => {
                        if keyframes.accept(idx, layer, &rec, diag)? == KeyframeOutcome::NoProperty
                        {
                            diag.warn(Warning::OrphanChunk { role, offset });
                        }
                    }
                    ChunkRecord::NestedRoot
                    | ChunkRecord::Composition(_)
                    | ChunkRecord::Layer(_)
                    | ChunkRecord::Footage(_) => {}
                }
            }
        }
    }

    let compositions = compositions.finish();
    let mut layers = layers.finish();
    sort_keyframes(&mut layers);
    let assets = catalog.finish();
    tracing::debug!(
        compositions = compositions.len(),
        layers = layers.len(),
        assets = assets.len(),
        "extraction finished"
    );

    Ok(ExtractedProject {
        form_type,
        compositions,
        layers,
        assets,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/extract/project.rs"]
mod tests;
