use crate::container::classify::LayerRecord;
use crate::extract::composition::positive_or;
use crate::extract::model::{Composition, CompositionIdx, Layer, LayerIdx};
use crate::foundation::config::{ConvertConfig, LimitPolicy};
use crate::foundation::core::{Transform2D, Vec2};
use crate::foundation::diagnostics::{Diagnostics, Warning};
use crate::foundation::error::{AeplanError, AeplanResult};

/// Collects layers up to `max_layers` per parse.
#[derive(Debug)]
pub struct LayerExtractor<'c> {
    config: &'c ConvertConfig,
    layers: Vec<Layer>,
    exhausted: bool,
}

impl<'c> LayerExtractor<'c> {
    /// Empty extractor.
    pub fn new(config: &'c ConvertConfig) -> Self {
        Self {
            config,
            layers: Vec::new(),
            exhausted: false,
        }
    }

    /// Store one decoded layer chunk owned by `composition`.
    ///
    /// Returns `None` once the limit has been reached. The first refused layer records
    /// `LayerLimitExceeded` (or fails under [`LimitPolicy::Fail`]); later ones are dropped
    /// without further reports.
    pub fn accept(
        &mut self,
        record: &LayerRecord,
        idx: CompositionIdx,
        composition: &Composition,
        diag: &mut Diagnostics,
    ) -> AeplanResult<Option<LayerIdx>> {
        if self.exhausted {
            return Ok(None);
        }
        let limit = self.config.limits.max_layers;
        if self.layers.len() >= limit {
            if self.config.limit_policy == LimitPolicy::Fail {
                return Err(AeplanError::LayerLimitExceeded { limit });
            }
            self.exhausted = true;
            diag.warn(Warning::LayerLimitExceeded { limit });
            return Ok(None);
        }

        let layer = self.resolve(record, idx, composition);
        let layer_idx = LayerIdx::from_usize(self.layers.len());
        self.layers.push(layer);
        Ok(Some(layer_idx))
    }

    /// Mutable access for attaching child chunks.
    pub fn get_mut(&mut self, idx: LayerIdx) -> &mut Layer {
        &mut self.layers[idx.index()]
    }

    /// Stored layers in stream order.
    pub fn finish(self) -> Vec<Layer> {
        self.layers
    }

    fn resolve(&self, record: &LayerRecord, idx: CompositionIdx, comp: &Composition) -> Layer {
        let d = &self.config.layer_defaults;
        let ordinal = self.layers.len();
        let raw_type = record.type_token.clone().unwrap_or_default();
        let mapped = self.config.types.map_layer(&raw_type);
        if mapped.fallback {
            tracing::info!(
                token = %raw_type,
                fallback = ?mapped.value,
                ordinal,
                "unmapped layer type token"
            );
        }

        let finite = |v: Option<f32>, fallback: f64| match v.map(f64::from) {
            Some(v) if v.is_finite() => v,
            _ => fallback,
        };
        let center = comp.canvas.center();
        let transform = Transform2D {
            position: Vec2::new(
                finite(record.position_x, center.x),
                finite(record.position_y, center.y),
            ),
            scale: Vec2::new(finite(record.scale_x, d.scale), finite(record.scale_y, d.scale)),
            rotation: finite(record.rotation, d.rotation),
        };

        Layer {
            ordinal,
            source_id: record.id,
            composition: idx,
            name: record
                .name
                .clone()
                .unwrap_or_else(|| format!("Layer {}", ordinal + 1)),
            raw_type,
            layer_type: mapped.value,
            start: finite(record.start, d.start).max(0.0),
            duration: positive_or(record.duration, d.duration),
            opacity: finite(record.opacity, d.opacity).clamp(0.0, 100.0),
            transform,
            text: None,
            fill: None,
            asset: None,
            effects: Vec::new(),
            expressions: Vec::new(),
            animations: Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/extract/layer.rs"]
mod tests;
