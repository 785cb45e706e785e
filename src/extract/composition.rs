use std::collections::HashMap;

use crate::container::classify::CompositionRecord;
use crate::extract::model::{Composition, CompositionIdx};
use crate::foundation::config::{ConvertConfig, LimitPolicy};
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::diagnostics::{Diagnostics, Warning};
use crate::foundation::error::{AeplanError, AeplanResult};

/// Id given to the composition created for layers with no enclosing composition.
pub const DEFAULT_COMPOSITION_ID: &str = "default";

/// What happened to one composition chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositionOutcome {
    /// Stored under a new index.
    Accepted(CompositionIdx),
    /// Same source id as an earlier composition, which is kept instead.
    Duplicate(CompositionIdx),
    /// Over `max_compositions`; the composition and its layers are discarded.
    Dropped,
}

/// Collects compositions up to `max_compositions`, in first-occurrence order.
#[derive(Debug)]
pub struct CompositionExtractor<'c> {
    config: &'c ConvertConfig,
    compositions: Vec<Composition>,
    by_id: HashMap<String, CompositionIdx>,
    limit_reported: bool,
}

impl<'c> CompositionExtractor<'c> {
    /// Empty extractor.
    pub fn new(config: &'c ConvertConfig) -> Self {
        Self {
            config,
            compositions: Vec::new(),
            by_id: HashMap::new(),
            limit_reported: false,
        }
    }

    /// Store one decoded composition chunk.
    ///
    /// Under [`LimitPolicy::Fail`] the first composition over the limit is an error; otherwise
    /// it is dropped and a single warning is recorded.
    pub fn accept(
        &mut self,
        record: &CompositionRecord,
        offset: usize,
        diag: &mut Diagnostics,
    ) -> AeplanResult<CompositionOutcome> {
        let id = match record.id {
            Some(id) => id.to_string(),
            None => format!("comp-{}", self.compositions.len()),
        };
        if let Some(&existing) = self.by_id.get(&id) {
            diag.warn(Warning::DuplicateComposition { id, offset });
            return Ok(CompositionOutcome::Duplicate(existing));
        }

        let limit = self.config.limits.max_compositions;
        if self.compositions.len() >= limit {
            if self.config.limit_policy == LimitPolicy::Fail {
                return Err(AeplanError::CompositionLimitExceeded { limit });
            }
            if !self.limit_reported {
                self.limit_reported = true;
                diag.warn(Warning::CompositionLimitExceeded { limit });
            }
            return Ok(CompositionOutcome::Dropped);
        }

        let composition = self.resolve(record, id);
        Ok(CompositionOutcome::Accepted(self.push(composition)))
    }

    /// Index of the synthetic default composition, creating it on first use.
    pub fn default_composition(&mut self) -> CompositionIdx {
        if let Some(&idx) = self.by_id.get(DEFAULT_COMPOSITION_ID) {
            return idx;
        }
        let d = &self.config.composition_defaults;
        tracing::debug!("creating synthetic default composition");
        let composition = Composition {
            id: DEFAULT_COMPOSITION_ID.to_string(),
            name: "Default".to_string(),
            canvas: Canvas {
                width: d.width,
                height: d.height,
            },
            fps: d.fps,
            duration: d.duration,
            background: d.background,
            synthetic: true,
        };
        self.push(composition)
    }

    /// Look up a stored composition.
    pub fn get(&self, idx: CompositionIdx) -> &Composition {
        &self.compositions[idx.index()]
    }

    /// Stored compositions in first-occurrence order.
    pub fn finish(self) -> Vec<Composition> {
        self.compositions
    }

    fn push(&mut self, composition: Composition) -> CompositionIdx {
        let idx = CompositionIdx::from_usize(self.compositions.len());
        self.by_id.insert(composition.id.clone(), idx);
        self.compositions.push(composition);
        idx
    }

    fn resolve(&self, record: &CompositionRecord, id: String) -> Composition {
        let d = &self.config.composition_defaults;
        let dim = |v: Option<u16>, fallback: u32| match v {
            Some(v) if v > 0 => u32::from(v),
            _ => fallback,
        };
        Composition {
            name: record
                .name
                .clone()
                .unwrap_or_else(|| format!("Composition {id}")),
            canvas: Canvas {
                width: dim(record.width, d.width),
                height: dim(record.height, d.height),
            },
            fps: frame_rate_or(record.fps, d.fps),
            duration: positive_or(record.duration, d.duration),
            background: record.background.unwrap_or(d.background),
            synthetic: false,
            id,
        }
    }
}

/// `v` when it converts to a rational [`Fps`], else `fallback`.
fn frame_rate_or(v: Option<f32>, fallback: f64) -> f64 {
    match v.map(f64::from) {
        Some(v) if Fps::from_f64(v).is_ok() => v,
        _ => fallback,
    }
}

/// `v` as `f64` when finite and strictly positive, else `fallback`.
pub(crate) fn positive_or(v: Option<f32>, fallback: f64) -> f64 {
    match v.map(f64::from) {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => fallback,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/extract/composition.rs"]
mod tests;
