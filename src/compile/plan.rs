use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, FrameRange, Rgb8};
use crate::foundation::diagnostics::Warning;
use crate::foundation::error::{AeplanError, AeplanResult};
use crate::template::model::{Animation, ClipContent};

/// Fully resolved, ordered instructions for an external encoder.
///
/// Every clip carries a global draw order, its frame range in timeline frames, an affine
/// transform in canvas space and keyframes with same-time duplicates removed.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPlan {
    /// Timeline duration in seconds.
    pub duration: f64,
    /// Total frames in the timeline.
    pub total_frames: u64,
    /// Timeline frame rate.
    pub fps: Fps,
    /// Output canvas.
    pub resolution: Canvas,
    /// Background fill.
    pub background: Rgb8,
    /// Tracks in draw order.
    pub tracks: Vec<RenderTrack>,
    /// Every warning raised from extraction through compilation.
    pub warnings: Vec<Warning>,
    /// xxh3-128 fingerprint of the resolved template, lowercase hex.
    pub template_fingerprint: String,
}

/// A track of the plan.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTrack {
    /// Track id.
    pub id: String,
    /// Owning composition id.
    pub composition: String,
    /// Track duration in seconds.
    pub duration: f64,
    /// Clips in draw order.
    pub clips: Vec<RenderClip>,
}

/// One clip instruction.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderClip {
    /// Clip id.
    pub id: String,
    /// Position in the global draw order, 0 drawn first.
    pub order: u32,
    /// Kind payload, with merge fields resolved.
    #[serde(flatten)]
    pub content: ClipContent,
    /// Start in seconds, after clamping.
    pub start: f64,
    /// Duration in seconds, after clamping.
    pub duration: f64,
    /// Timeline frames covered, `[start, end)`.
    pub frames: FrameRange,
    /// Opacity, 0 to 1.
    pub opacity: f64,
    /// Canvas-space transform.
    pub transform: Affine,
    /// Effect match names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<String>,
    /// Expression sources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expressions: Vec<String>,
    /// Animated properties with duplicate timestamps shadowed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<Animation>,
    /// `true` when the window was clamped to the track.
    #[serde(default)]
    pub clamped: bool,
}

impl RenderPlan {
    /// All clips in draw order.
    pub fn clips(&self) -> impl Iterator<Item = &RenderClip> {
        self.tracks.iter().flat_map(|t| t.clips.iter())
    }

    /// Clips visible at `frame`, in draw order.
    pub fn clips_at(&self, frame: u64) -> impl Iterator<Item = &RenderClip> {
        self.clips()
            .filter(move |c| c.frames.contains(FrameIndex(frame)))
    }

    /// Pretty-printed JSON.
    pub fn to_json_string(&self) -> AeplanResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AeplanError::serde(format!("serialize render plan: {e}")))
    }

    /// Compact line-per-clip listing, stable across runs.
    pub fn dump(&self) -> String {
        let mut out = format!(
            "plan {}x{} @ {}/{} fps, {} frames, fingerprint {}\n",
            self.resolution.width,
            self.resolution.height,
            self.fps.num,
            self.fps.den,
            self.total_frames,
            self.template_fingerprint
        );
        for track in &self.tracks {
            out.push_str(&format!("track {} ({}s)\n", track.id, track.duration));
            for c in &track.clips {
                out.push_str(&format!(
                    "  #{:<3} {:<12} {:<10} frames {}..{} opacity {:.3}{}\n",
                    c.order,
                    c.id,
                    c.content.kind(),
                    c.frames.start.0,
                    c.frames.end.0,
                    c.opacity,
                    if c.clamped { " clamped" } else { "" }
                ));
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/plan.rs"]
mod tests;
