use crate::compile::fingerprint::fingerprint_template;
use crate::compile::plan::{RenderClip, RenderPlan, RenderTrack};
use crate::foundation::config::{ConvertConfig, TimeRangePolicy};
use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange, Transform2D};
use crate::foundation::diagnostics::{Diagnostics, Warning};
use crate::foundation::error::{AeplanError, AeplanResult};
use crate::template::model::{Animation, Clip, KeyframeEntry, Template, Track};

/// Slack for floating-point clip ends that land on the track end.
const TIME_EPSILON: f64 = 1e-9;

/// Turns a resolved [`Template`] into a [`RenderPlan`].
#[derive(Clone, Copy, Debug)]
pub struct TimelineCompiler<'c> {
    config: &'c ConvertConfig,
}

/// A clip window after the time-range policy ran.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Window {
    start: f64,
    duration: f64,
    clamped: bool,
}

impl<'c> TimelineCompiler<'c> {
    /// Compiler applying `config.time_range`.
    pub fn new(config: &'c ConvertConfig) -> Self {
        Self { config }
    }

    /// Compile `template`. Warnings raised here are appended to `diag`; the plan's own warning
    /// list is left for the caller to fill.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(tracks = template.timeline.tracks.len())
    )]
    pub fn compile(
        &self,
        template: &Template,
        diag: &mut Diagnostics,
    ) -> AeplanResult<RenderPlan> {
        template.validate()?;
        let tl = &template.timeline;
        let fps = Fps::from_f64(tl.fps)?;
        let canvas = Canvas {
            width: tl.resolution.width,
            height: tl.resolution.height,
        };

        let mut order: u32 = 0;
        let mut tracks = Vec::with_capacity(tl.tracks.len());
        for track in &tl.tracks {
            let mut clips = Vec::with_capacity(track.clips.len());
            for clip in &track.clips {
                let window = self.window(track, clip, diag)?;
                clips.push(render_clip(clip, window, order, fps, canvas));
                order = order.saturating_add(1);
            }
            tracks.push(RenderTrack {
                id: track.id.clone(),
                composition: track.composition.clone(),
                duration: track.duration,
                clips,
            });
        }

        let plan = RenderPlan {
            duration: tl.duration,
            total_frames: fps.secs_to_frames_round(tl.duration),
            fps,
            resolution: canvas,
            background: tl.background.color,
            tracks,
            warnings: Vec::new(),
            template_fingerprint: fingerprint_template(template).to_string(),
        };
        tracing::debug!(clips = order, frames = plan.total_frames, "render plan compiled");
        Ok(plan)
    }

    fn window(&self, track: &Track, clip: &Clip, diag: &mut Diagnostics) -> AeplanResult<Window> {
        let end = clip.end();
        let limit = track.duration;
        let fits = clip.start >= 0.0 && end <= limit + TIME_EPSILON;
        if fits {
            return Ok(Window {
                start: clip.start,
                duration: clip.duration,
                clamped: false,
            });
        }

        match self.config.time_range {
            TimeRangePolicy::Fail => {
                return Err(AeplanError::TimeRangeExceeded {
                    clip: clip.id.clone(),
                    end,
                    duration: limit,
                });
            }
            TimeRangePolicy::Warn => diag.warn(Warning::TimeRangeExceeded {
                clip: clip.id.clone(),
                end,
                duration: limit,
            }),
            TimeRangePolicy::Clamp => {
                tracing::debug!(clip = %clip.id, end, duration = limit, "clamping clip window");
            }
        }
        let start = clip.start.clamp(0.0, limit);
        let end = end.clamp(start, limit);
        Ok(Window {
            start,
            duration: end - start,
            clamped: true,
        })
    }
}

fn render_clip(clip: &Clip, w: Window, order: u32, fps: Fps, canvas: Canvas) -> RenderClip {
    let first = fps.secs_to_frames_round(w.start);
    let last = fps.secs_to_frames_round(w.start + w.duration).max(first);
    let transform = Transform2D {
        position: clip.position.unwrap_or_else(|| canvas.center()),
        scale: clip.scale,
        rotation: clip.rotation,
    };

    RenderClip {
        id: clip.id.clone(),
        order,
        content: clip.content.clone(),
        start: w.start,
        duration: w.duration,
        frames: FrameRange {
            start: FrameIndex(first),
            end: FrameIndex(last),
        },
        opacity: clip.opacity.clamp(0.0, 100.0) / 100.0,
        transform: transform.to_affine(),
        effects: clip.effects.clone(),
        expressions: clip.expressions.clone(),
        animations: clip.animations.iter().map(shadow_duplicates).collect(),
        clamped: w.clamped,
    }
}

/// Keyframes sorted by time where a later keyframe at an identical time replaces the earlier
/// one.
pub fn shadow_duplicates(anim: &Animation) -> Animation {
    let mut sorted: Vec<&KeyframeEntry> = anim.keyframes.iter().collect();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut keyframes: Vec<KeyframeEntry> = Vec::with_capacity(sorted.len());
    for kf in sorted {
        match keyframes.last_mut() {
            Some(prev) if prev.time == kf.time => *prev = kf.clone(),
            _ => keyframes.push(kf.clone()),
        }
    }
    Animation {
        property: anim.property.clone(),
        keyframes,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/compiler.rs"]
mod tests;
