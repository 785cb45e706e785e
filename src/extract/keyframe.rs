use std::collections::BTreeSet;

use crate::container::classify::KeyframeRecord;
use crate::extract::model::{AnimatedProperty, Keyframe, Layer, LayerIdx};
use crate::foundation::config::{ConvertConfig, LimitPolicy};
use crate::foundation::diagnostics::{Diagnostics, Warning};
use crate::foundation::error::{AeplanError, AeplanResult};

/// Attaches keyframes to the current animated property of a layer, bounded per layer.
#[derive(Debug)]
pub struct KeyframeExtractor<'c> {
    config: &'c ConvertConfig,
    truncated: BTreeSet<LayerIdx>,
}

/// Where a keyframe chunk ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyframeOutcome {
    /// Appended to the layer's current property.
    Stored,
    /// The layer has no animated property yet.
    NoProperty,
    /// Missing time or value; ignored.
    Incomplete,
    /// Over the per-layer limit.
    Truncated,
}

impl<'c> KeyframeExtractor<'c> {
    /// Empty extractor.
    pub fn new(config: &'c ConvertConfig) -> Self {
        Self {
            config,
            truncated: BTreeSet::new(),
        }
    }

    /// Open a new animated property on `layer`; following keyframes attach to it.
    pub fn begin_property(&self, layer: &mut Layer, name: String) {
        layer.animations.push(AnimatedProperty {
            name,
            keyframes: Vec::new(),
        });
    }

    /// Append one keyframe to the latest property of `layer`.
    pub fn accept(
        &mut self,
        idx: LayerIdx,
        layer: &mut Layer,
        record: &KeyframeRecord,
        diag: &mut Diagnostics,
    ) -> AeplanResult<KeyframeOutcome> {
        if layer.animations.is_empty() {
            return Ok(KeyframeOutcome::NoProperty);
        }
        let limit = self.config.limits.max_keyframes_per_layer;
        if layer.keyframe_count() >= limit {
            if self.config.limit_policy == LimitPolicy::Fail {
                return Err(AeplanError::KeyframeLimitExceeded {
                    layer: layer.clip_id(),
                    limit,
                });
            }
            if self.truncated.insert(idx) {
                diag.warn(Warning::KeyframeLimitExceeded {
                    layer: layer.clip_id(),
                    limit,
                });
            }
            return Ok(KeyframeOutcome::Truncated);
        }

        let time = record.time.map(f64::from).filter(|t| t.is_finite());
        let (Some(time), false) = (time, record.value.is_empty()) else {
            tracing::debug!(layer = %layer.clip_id(), "skipping incomplete keyframe");
            return Ok(KeyframeOutcome::Incomplete);
        };
        let keyframe = Keyframe {
            time,
            value: record.value.iter().copied().map(f64::from).collect(),
            interpolation: record.interpolation.unwrap_or_default(),
        };
        if let Some(property) = layer.animations.last_mut() {
            property.keyframes.push(keyframe);
        }
        Ok(KeyframeOutcome::Stored)
    }
}

/// Sort every property's keyframes by time. The sort is stable, so equal times keep stream
/// order and duplicates survive.
pub fn sort_keyframes(layers: &mut [Layer]) {
    for property in layers.iter_mut().flat_map(|l| l.animations.iter_mut()) {
        property.keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/extract/keyframe.rs"]
mod tests;
