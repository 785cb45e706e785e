use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::container::signature::SignatureRegistry;
use crate::foundation::core::{Fps, Rgb8};
use crate::foundation::error::{AeplanError, AeplanResult};
use crate::mapping::types::TypeMapper;

/// Immutable conversion configuration.
///
/// Constructed once and passed by reference into every stage, so several configurations can
/// run side by side in one process. Every field has a default; a JSON file only needs to name
/// the values it overrides.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Container analysis strategy.
    pub strategy: AnalysisStrategy,
    /// Size, count and time ceilings.
    pub limits: Limits,
    /// Whether recoverable limits warn or fail.
    pub limit_policy: LimitPolicy,
    /// Values used for absent composition fields.
    pub composition_defaults: CompositionDefaults,
    /// Values used for absent layer fields.
    pub layer_defaults: LayerDefaults,
    /// Tag table used by the scanner.
    pub signatures: SignatureRegistry,
    /// Raw-token and priority tables.
    pub types: TypeMapper,
    /// Merge-field resolution mode.
    pub resolver: ResolverMode,
    /// Handling of clips that overrun their track.
    pub time_range: TimeRangePolicy,
    /// Track bucketing used by the template builder.
    pub track_layout: TrackLayout,
    /// Emit a `background` clip per composition.
    pub include_background_clip: bool,
}

impl ConvertConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(s: &str) -> AeplanResult<Self> {
        let mut cfg: Self = serde_json::from_str(s)
            .map_err(|e| AeplanError::serde(format!("parse config JSON: {e}")))?;
        cfg.types.normalize_keys();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> AeplanResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            AeplanError::validation(format!("open config '{}': {e}", path.display()))
        })?;
        let mut cfg: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| AeplanError::serde(format!("parse config '{}': {e}", path.display())))?;
        cfg.types.normalize_keys();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> AeplanResult<()> {
        let l = &self.limits;
        if l.max_file_bytes == 0 || l.max_analysis_bytes == 0 {
            return Err(AeplanError::validation("byte ceilings must be > 0"));
        }
        if l.max_analysis_bytes > l.max_file_bytes {
            return Err(AeplanError::validation(
                "max_analysis_bytes must not exceed max_file_bytes",
            ));
        }
        if l.root_search_window < 4 {
            return Err(AeplanError::validation("root_search_window must be >= 4"));
        }
        if l.timeout_ms == 0 {
            return Err(AeplanError::validation("timeout_ms must be > 0"));
        }
        self.composition_defaults.validate()?;
        self.layer_defaults.validate()?;
        self.signatures.validate()?;
        self.types.validate()?;
        Ok(())
    }
}

/// Parsing backend selection.
///
/// Only the binary heuristic parser exists; the script-driven and native-module analyzers are
/// recognized names that are rejected at pipeline start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStrategy {
    /// Walk the container bytes directly.
    #[default]
    BinaryHeuristic,
    /// External script analysis.
    Script,
    /// Native module hook.
    NativeModule,
}

impl AnalysisStrategy {
    /// Stable configuration name.
    pub fn name(self) -> &'static str {
        match self {
            Self::BinaryHeuristic => "binary_heuristic",
            Self::Script => "script",
            Self::NativeModule => "native_module",
        }
    }

    /// Fail unless this strategy has an implementation.
    pub fn ensure_supported(self) -> AeplanResult<()> {
        match self {
            Self::BinaryHeuristic => Ok(()),
            Self::Script | Self::NativeModule => Err(AeplanError::UnsupportedStrategy {
                strategy: self.name(),
            }),
        }
    }
}

/// Size, count and time ceilings applied while scanning and extracting.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Hard cap on input size, checked before scanning.
    pub max_file_bytes: u64,
    /// Cap on cumulative inspected chunk bytes.
    pub max_analysis_bytes: u64,
    /// Leading bytes searched for the root signature.
    pub root_search_window: usize,
    /// Maximum compositions per project.
    pub max_compositions: usize,
    /// Maximum layers per parse.
    pub max_layers: usize,
    /// Maximum keyframes kept per layer.
    pub max_keyframes_per_layer: usize,
    /// Wall-clock scan budget.
    pub timeout_ms: u64,
}

impl Limits {
    /// Scan budget as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_bytes: 100 * 1024 * 1024,
            max_analysis_bytes: 10 * 1024 * 1024,
            root_search_window: 64,
            max_compositions: 50,
            max_layers: 500,
            max_keyframes_per_layer: 1000,
            timeout_ms: 30_000,
        }
    }
}

/// Whether a recoverable count limit produces a warning or a hard failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitPolicy {
    /// Truncate, keep the partial result and record a warning.
    #[default]
    Warn,
    /// Abort with the matching limit error.
    Fail,
}

/// Merge-field resolution mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverMode {
    /// Leave unresolved references verbatim.
    #[default]
    Lenient,
    /// Fail on the first unresolved reference.
    Strict,
}

/// Handling of clips whose window exceeds the track duration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRangePolicy {
    /// Clamp and record a `TimeRangeExceeded` warning.
    #[default]
    Warn,
    /// Clamp without reporting.
    Clamp,
    /// Abort with `TimeRangeExceeded`.
    Fail,
}

/// Track bucketing used when building a template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackLayout {
    /// One track per clip kind present in a composition.
    #[default]
    PerType,
    /// One track per composition.
    Flattened,
}

/// Values substituted for absent composition fields.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompositionDefaults {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Frames per second.
    pub fps: f64,
    /// Duration in seconds.
    pub duration: f64,
    /// Background color.
    pub background: Rgb8,
}

impl CompositionDefaults {
    fn validate(&self) -> AeplanResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AeplanError::validation(
                "composition default width/height must be > 0",
            ));
        }
        let fps = self.fps;
        Fps::from_f64(fps).map_err(|_| {
            AeplanError::validation(format!("composition default fps {fps} is out of range"))
        })?;
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(AeplanError::validation(
                "composition default duration must be > 0",
            ));
        }
        Ok(())
    }
}

impl Default for CompositionDefaults {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 24.0,
            duration: 10.0,
            background: Rgb8::BLACK,
        }
    }
}

/// Values substituted for absent layer fields. Position defaults to the composition center.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayerDefaults {
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
    /// Opacity, 0 to 100.
    pub opacity: f64,
    /// Uniform scale in percent.
    pub scale: f64,
    /// Rotation in degrees.
    pub rotation: f64,
}

impl LayerDefaults {
    fn validate(&self) -> AeplanResult<()> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(AeplanError::validation("layer default duration must be > 0"));
        }
        if !(0.0..=100.0).contains(&self.opacity) {
            return Err(AeplanError::validation(
                "layer default opacity must be within 0..=100",
            ));
        }
        Ok(())
    }
}

impl Default for LayerDefaults {
    fn default() -> Self {
        Self {
            start: 0.0,
            duration: 5.0,
            opacity: 100.0,
            scale: 100.0,
            rotation: 0.0,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
