use std::fmt;

use crate::foundation::error::AeplanError;

/// Conversion stage, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Locating the root and walking chunks.
    Scanning,
    /// Decoding chunk payloads.
    Classifying,
    /// Building compositions, layers, keyframes and assets.
    Extracting,
    /// Assembling the template.
    Building,
    /// Substituting merge fields.
    Resolving,
    /// Producing the render plan.
    Compiling,
}

impl Stage {
    /// Lowercase stage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scanning => "scanning",
            Self::Classifying => "classifying",
            Self::Extracting => "extracting",
            Self::Building => "building",
            Self::Resolving => "resolving",
            Self::Compiling => "compiling",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable state of a [`crate::Pipeline`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing has run.
    #[default]
    Idle,
    /// A partial run finished after this stage.
    Completed(Stage),
    /// A full run produced a render plan. The only terminal success state.
    Compiled,
    /// The run stopped in this stage.
    Failed(Stage),
}

/// A fatal error tagged with the stage it occurred in.
#[derive(thiserror::Error, Debug)]
#[error("{stage} failed: {error}")]
pub struct PipelineFailure {
    /// Stage that failed.
    pub stage: Stage,
    /// Underlying error.
    #[source]
    pub error: AeplanError,
}

impl PipelineFailure {
    /// Tag `error` with `stage`.
    pub fn new(stage: Stage, error: AeplanError) -> Self {
        Self { stage, error }
    }
}
