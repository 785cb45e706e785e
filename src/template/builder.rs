use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::extract::model::{Composition, CompositionIdx, ExtractedProject, Layer};
use crate::foundation::config::{ConvertConfig, TrackLayout};
use crate::foundation::core::Vec2;
use crate::foundation::diagnostics::Warning;
use crate::foundation::error::AeplanResult;
use crate::mapping::types::{ClipKind, LayerType};
use crate::resolve::merge::collect_variables;
use crate::template::model::{
    Animation, AssetEntry, Background, Clip, ClipContent, CompositionSummary, KeyframeEntry,
    Media, Resolution, Template, TemplateMetadata, Timeline, Track,
};

/// Name and version recorded in [`TemplateMetadata::generator`].
pub const GENERATOR: &str = concat!("aeplan ", env!("CARGO_PKG_VERSION"));

/// Assembles an [`ExtractedProject`] into a [`Template`].
///
/// The output depends only on the project, the warnings and the configuration; identical inputs
/// serialize to identical bytes.
#[derive(Clone, Copy, Debug)]
pub struct TemplateBuilder<'c> {
    config: &'c ConvertConfig,
}

/// Sort key for clips inside one composition: priority, start, extraction order.
#[derive(Clone, Copy, Debug)]
struct ClipKey {
    priority: u8,
    start: f64,
    seq: usize,
}

impl ClipKey {
    fn order(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then(self.start.total_cmp(&other.start))
            .then(self.seq.cmp(&other.seq))
    }
}

impl<'c> TemplateBuilder<'c> {
    /// Builder reading layout and priority settings from `config`.
    pub fn new(config: &'c ConvertConfig) -> Self {
        Self { config }
    }

    /// Build the template. The first composition defines the timeline header; a project with
    /// no composition gets the composition defaults and no tracks.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(compositions = project.compositions.len())
    )]
    pub fn build(
        &self,
        project: &ExtractedProject,
        warnings: &[Warning],
    ) -> AeplanResult<Template> {
        let d = &self.config.composition_defaults;
        let timeline_header = match project.compositions.first() {
            Some(c) => (c.duration, c.fps, c.canvas.width, c.canvas.height, c.background),
            None => (d.duration, d.fps, d.width, d.height, d.background),
        };
        let (duration, fps, width, height, background) = timeline_header;

        let mut tracks = Vec::new();
        let mut summaries = Vec::with_capacity(project.compositions.len());
        for idx in project.composition_indices() {
            let comp = project.composition(idx);
            let layers: Vec<&Layer> = project.layers_of(idx).collect();
            summaries.push(CompositionSummary {
                id: comp.id.clone(),
                name: comp.name.clone(),
                width: comp.canvas.width,
                height: comp.canvas.height,
                fps: comp.fps,
                duration: comp.duration,
                layers: layers.len(),
                synthetic: comp.synthetic,
            });
            tracks.extend(self.composition_tracks(project, idx, &layers));
        }

        let assets = project
            .assets
            .iter()
            .map(|a| AssetEntry {
                id: a.id.clone(),
                asset_type: a.asset_type,
                src: a.source_path.clone(),
            })
            .collect();

        let mut template = Template {
            metadata: TemplateMetadata {
                generator: GENERATOR.to_string(),
                source_format: Some(project.form_type.to_string()),
                compositions: summaries,
                assets,
                variables: Vec::new(),
                warnings: warnings.to_vec(),
            },
            timeline: Timeline {
                duration,
                fps,
                resolution: Resolution { width, height },
                background: Background { color: background },
                tracks,
            },
            merge_fields: BTreeMap::new(),
        };
        template.metadata.variables = collect_variables(&template);
        tracing::debug!(
            tracks = template.timeline.tracks.len(),
            variables = template.metadata.variables.len(),
            "template built"
        );
        Ok(template)
    }

    fn composition_tracks(
        &self,
        project: &ExtractedProject,
        idx: CompositionIdx,
        layers: &[&Layer],
    ) -> Vec<Track> {
        let comp = project.composition(idx);
        let types = &self.config.types;

        let mut keyed: Vec<(ClipKey, Clip)> = Vec::with_capacity(layers.len() + 1);
        if self.config.include_background_clip {
            keyed.push((
                ClipKey {
                    priority: types.priority(ClipKind::Background),
                    start: 0.0,
                    seq: 0,
                },
                background_clip(comp),
            ));
        }
        for layer in layers {
            let clip = layer_clip(project, layer);
            let key = ClipKey {
                priority: types.priority(clip.kind()),
                start: clip.start,
                seq: layer.ordinal + 1,
            };
            keyed.push((key, clip));
        }
        keyed.sort_by(|a, b| a.0.order(&b.0));

        match self.config.track_layout {
            TrackLayout::Flattened => {
                if keyed.is_empty() {
                    return Vec::new();
                }
                vec![Track {
                    id: format!("comp-{}", comp.id),
                    composition: comp.id.clone(),
                    duration: comp.duration,
                    clips: keyed.into_iter().map(|(_, c)| c).collect(),
                }]
            }
            TrackLayout::PerType => {
                let mut buckets: BTreeMap<(u8, ClipKind), Vec<Clip>> = BTreeMap::new();
                for (key, clip) in keyed {
                    buckets.entry((key.priority, clip.kind())).or_default().push(clip);
                }
                buckets
                    .into_iter()
                    .map(|((_, kind), clips)| Track {
                        id: format!("comp-{}-{kind}", comp.id),
                        composition: comp.id.clone(),
                        duration: comp.duration,
                        clips,
                    })
                    .collect()
            }
        }
    }
}

fn background_clip(comp: &Composition) -> Clip {
    Clip {
        id: format!("comp-{}-background", comp.id),
        content: ClipContent::Background {
            color: comp.background,
        },
        start: 0.0,
        duration: comp.duration,
        opacity: 100.0,
        position: Some(comp.canvas.center()),
        scale: Vec2::new(100.0, 100.0),
        rotation: 0.0,
        effects: Vec::new(),
        expressions: Vec::new(),
        animations: Vec::new(),
    }
}

fn layer_clip(project: &ExtractedProject, layer: &Layer) -> Clip {
    let media = || {
        let asset = layer.asset.map(|i| project.asset(i));
        Media {
            src: asset.map(|a| a.source_path.clone()),
            asset: asset.map(|a| a.id.clone()),
        }
    };
    let content = match layer.layer_type {
        LayerType::Text => ClipContent::Text {
            text: layer.text.clone().unwrap_or_default(),
        },
        LayerType::Shape => ClipContent::Shape { fill: layer.fill },
        LayerType::Image => ClipContent::Image(media()),
        LayerType::Video => ClipContent::Video(media()),
        LayerType::Audio => ClipContent::Audio(media()),
    };

    Clip {
        id: layer.clip_id(),
        content,
        start: layer.start,
        duration: layer.duration,
        opacity: layer.opacity,
        position: Some(layer.transform.position),
        scale: layer.transform.scale,
        rotation: layer.transform.rotation,
        effects: layer.effects.clone(),
        expressions: layer.expressions.clone(),
        animations: layer
            .animations
            .iter()
            .filter(|a| !a.keyframes.is_empty())
            .map(|a| Animation {
                property: a.name.clone(),
                keyframes: a
                    .keyframes
                    .iter()
                    .map(|k| KeyframeEntry {
                        time: k.time,
                        value: k.value.clone(),
                        interpolation: k.interpolation,
                    })
                    .collect(),
            })
            .collect(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/builder.rs"]
mod tests;
