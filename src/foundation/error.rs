/// Convenience result type used across aeplan.
pub type AeplanResult<T> = Result<T, AeplanError>;

/// Top-level error taxonomy used by the extraction and compilation APIs.
///
/// Every variant carries enough context (byte offset, entity id, limit name) to reproduce the
/// failure from the same input.
#[derive(thiserror::Error, Debug)]
pub enum AeplanError {
    /// No root signature was found where a container must start.
    #[error("unsupported format: no root signature within the first {searched} bytes")]
    UnsupportedFormat {
        /// Number of leading bytes that were searched.
        searched: usize,
    },

    /// A byte-size ceiling was exceeded.
    #[error("size limit exceeded: {limit} is {actual} bytes, max {max}")]
    SizeLimitExceeded {
        /// Name of the configured limit.
        limit: &'static str,
        /// Observed byte count.
        actual: u64,
        /// Configured ceiling.
        max: u64,
    },

    /// The scan ran past its deadline or was cancelled.
    #[error("timeout at offset {offset} after {elapsed_ms} ms")]
    Timeout {
        /// Offset of the chunk boundary where the deadline was observed.
        offset: usize,
        /// Elapsed wall-clock time.
        elapsed_ms: u64,
    },

    /// A chunk declares more bytes than its parent holds.
    #[error("truncated chunk '{tag}' at offset {offset}: needs {declared} bytes, has {available}")]
    TruncatedChunk {
        /// Chunk tag (lossy ASCII), or `????` when the header itself is cut.
        tag: String,
        /// Offset of the chunk header.
        offset: usize,
        /// Declared payload length.
        declared: u64,
        /// Bytes actually available inside the parent.
        available: u64,
    },

    /// More compositions than `max_compositions` (fatal only under `LimitPolicy::Fail`).
    #[error("composition limit exceeded: max_compositions = {limit}")]
    CompositionLimitExceeded {
        /// Configured limit.
        limit: usize,
    },

    /// More layers than `max_layers` (fatal only under `LimitPolicy::Fail`).
    #[error("layer limit exceeded: max_layers = {limit}")]
    LayerLimitExceeded {
        /// Configured limit.
        limit: usize,
    },

    /// More keyframes on one layer than `max_keyframes_per_layer`.
    #[error("keyframe limit exceeded on layer '{layer}': max_keyframes_per_layer = {limit}")]
    KeyframeLimitExceeded {
        /// Layer identifier.
        layer: String,
        /// Configured limit.
        limit: usize,
    },

    /// A merge-field reference had no value (strict resolution only).
    #[error("unresolved merge field '{name}' in clip '{clip}'")]
    MergeFieldUnresolved {
        /// Variable name as written.
        name: String,
        /// Clip that references it.
        clip: String,
    },

    /// A clip window does not fit its track (under `TimeRangePolicy::Fail`).
    #[error("clip '{clip}' ends at {end}s, beyond track duration {duration}s")]
    TimeRangeExceeded {
        /// Clip identifier.
        clip: String,
        /// Clip end time in seconds.
        end: f64,
        /// Track duration in seconds.
        duration: f64,
    },

    /// The requested analysis strategy has no implementation.
    #[error("analysis strategy '{strategy}' is not supported")]
    UnsupportedStrategy {
        /// Strategy name.
        strategy: &'static str,
    },

    /// Invalid user-provided configuration or template data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AeplanError {
    /// Build a [`AeplanError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`AeplanError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors that abort a parse without any partial result.
    pub fn is_fatal_format_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. }
                | Self::SizeLimitExceeded { .. }
                | Self::Timeout { .. }
                | Self::TruncatedChunk { .. }
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
