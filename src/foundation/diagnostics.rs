use std::fmt;

use crate::container::signature::ChunkRole;

/// Recoverable condition reported alongside a partial result.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    /// Compositions beyond `max_compositions` were dropped.
    CompositionLimitExceeded {
        /// Configured limit.
        limit: usize,
    },
    /// Layers beyond `max_layers` were dropped.
    LayerLimitExceeded {
        /// Configured limit.
        limit: usize,
    },
    /// Keyframes beyond `max_keyframes_per_layer` were dropped for one layer.
    KeyframeLimitExceeded {
        /// Layer identifier.
        layer: String,
        /// Configured limit.
        limit: usize,
    },
    /// A second composition chunk reused an id; the first occurrence is kept.
    DuplicateComposition {
        /// Repeated composition id.
        id: String,
        /// Offset of the ignored chunk.
        offset: usize,
    },
    /// A chunk that needs a layer context appeared without one.
    OrphanChunk {
        /// Role of the ignored chunk.
        role: ChunkRole,
        /// Offset of the ignored chunk.
        offset: usize,
    },
    /// A merge-field reference was left verbatim.
    MergeFieldUnresolved {
        /// Variable name.
        name: String,
        /// Clip holding the reference.
        clip: String,
    },
    /// A clip window exceeded its track duration and was clamped.
    TimeRangeExceeded {
        /// Clip identifier.
        clip: String,
        /// Original end time in seconds.
        end: f64,
        /// Track duration in seconds.
        duration: f64,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CompositionLimitExceeded { limit } => {
                write!(f, "composition limit {limit} reached; remaining compositions dropped")
            }
            Self::LayerLimitExceeded { limit } => {
                write!(f, "layer limit {limit} reached; remaining layers dropped")
            }
            Self::KeyframeLimitExceeded { layer, limit } => {
                write!(f, "layer '{layer}' keyframe limit {limit} reached; truncated")
            }
            Self::DuplicateComposition { id, offset } => {
                write!(f, "duplicate composition '{id}' at offset {offset} ignored")
            }
            Self::OrphanChunk { role, offset } => {
                write!(f, "{role:?} chunk at offset {offset} has no owning layer")
            }
            Self::MergeFieldUnresolved { name, clip } => {
                write!(f, "merge field '{name}' in clip '{clip}' left unresolved")
            }
            Self::TimeRangeExceeded {
                clip,
                end,
                duration,
            } => write!(
                f,
                "clip '{clip}' ends at {end}s beyond track duration {duration}s; clamped"
            ),
        }
    }
}

/// Ordered warning sink threaded through the pipeline stages.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a sink with warnings raised by an earlier run. They are not logged again.
    pub fn from_warnings(warnings: Vec<Warning>) -> Self {
        Self { warnings }
    }

    /// Record a warning and emit it as a `tracing` event.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(%warning, "recoverable condition");
        self.warnings.push(warning);
    }

    /// Warnings in the order they were raised.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Return `true` when nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Consume the sink.
    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/diagnostics.rs"]
mod tests;
