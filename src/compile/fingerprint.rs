use std::fmt;

use xxhash_rust::xxh3::Xxh3;

use crate::foundation::core::{Rgb8, Vec2};
use crate::template::model::{Clip, ClipContent, Media, Template};

const XXH3_SEED: u64 = 0x8b5ad4a0c7d8e9f1;

/// Stable 128-bit identity of a template's renderable content.
///
/// Covers the timeline and merge fields. Metadata (generator, catalog, warnings) is not hashed,
/// so re-extracting with a different tool version keeps the same fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TemplateFingerprint {
    /// High 64 bits.
    pub hi: u64,
    /// Low 64 bits.
    pub lo: u64,
}

impl fmt::Display for TemplateFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

/// Fingerprint `template`.
pub fn fingerprint_template(template: &Template) -> TemplateFingerprint {
    let mut h = StableHasher::new();
    let tl = &template.timeline;
    h.write_f64(tl.duration);
    h.write_f64(tl.fps);
    h.write_u32(tl.resolution.width);
    h.write_u32(tl.resolution.height);
    h.write_rgb(tl.background.color);

    h.write_len(tl.tracks.len());
    for track in &tl.tracks {
        h.write_str(&track.id);
        h.write_str(&track.composition);
        h.write_f64(track.duration);
        h.write_len(track.clips.len());
        for clip in &track.clips {
            write_clip(&mut h, clip);
        }
    }

    h.write_len(template.merge_fields.len());
    for (k, v) in &template.merge_fields {
        h.write_str(k);
        h.write_str(v);
    }
    h.finish()
}

fn write_clip(h: &mut StableHasher, clip: &Clip) {
    h.write_str(&clip.id);
    match &clip.content {
        ClipContent::Background { color } => {
            h.write_u8(0);
            h.write_rgb(*color);
        }
        ClipContent::Shape { fill } => {
            h.write_u8(1);
            match fill {
                Some(c) => {
                    h.write_bool(true);
                    h.write_rgb(*c);
                }
                None => h.write_bool(false),
            }
        }
        ClipContent::Image(m) => write_media(h, 2, m),
        ClipContent::Video(m) => write_media(h, 3, m),
        ClipContent::Audio(m) => write_media(h, 4, m),
        ClipContent::Text { text } => {
            h.write_u8(5);
            h.write_str(text);
        }
    }
    h.write_f64(clip.start);
    h.write_f64(clip.duration);
    h.write_f64(clip.opacity);
    match clip.position {
        Some(p) => {
            h.write_bool(true);
            h.write_vec2(p);
        }
        None => h.write_bool(false),
    }
    h.write_vec2(clip.scale);
    h.write_f64(clip.rotation);

    h.write_len(clip.effects.len());
    for e in &clip.effects {
        h.write_str(e);
    }
    h.write_len(clip.expressions.len());
    for e in &clip.expressions {
        h.write_str(e);
    }
    h.write_len(clip.animations.len());
    for anim in &clip.animations {
        h.write_str(&anim.property);
        h.write_len(anim.keyframes.len());
        for kf in &anim.keyframes {
            h.write_f64(kf.time);
            h.write_u8(kf.interpolation.code());
            h.write_len(kf.value.len());
            for v in &kf.value {
                h.write_f64(*v);
            }
        }
    }
}

fn write_media(h: &mut StableHasher, tag: u8, m: &Media) {
    h.write_u8(tag);
    h.write_opt_str(m.src.as_deref());
    h.write_opt_str(m.asset.as_deref());
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_len(&mut self, n: usize) {
        self.write_u64(n as u64);
    }

    fn write_f64(&mut self, v: f64) {
        // -0.0 and 0.0 hash alike
        let v = if v == 0.0 { 0.0 } else { v };
        self.write_u64(v.to_bits());
    }

    fn write_vec2(&mut self, v: Vec2) {
        self.write_f64(v.x);
        self.write_f64(v.y);
    }

    fn write_rgb(&mut self, c: Rgb8) {
        self.write_bytes(&[c.r, c.g, c.b]);
    }

    fn write_str(&mut self, s: &str) {
        self.write_len(s.len());
        self.write_bytes(s.as_bytes());
    }

    fn write_opt_str(&mut self, s: Option<&str>) {
        match s {
            Some(s) => {
                self.write_bool(true);
                self.write_str(s);
            }
            None => self.write_bool(false),
        }
    }

    fn finish(self) -> TemplateFingerprint {
        let v = self.inner.digest128();
        TemplateFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/fingerprint.rs"]
mod tests;
