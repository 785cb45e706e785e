use std::fmt;

use crate::foundation::error::{AeplanError, AeplanResult};

pub use kurbo::{Affine, Vec2};

/// Absolute 0-based frame index in timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Half-open frame range `[start, end)` in timeline space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// Inclusive range start.
    pub start: FrameIndex,
    /// Exclusive range end.
    pub end: FrameIndex,
}

impl FrameRange {
    /// Create a validated range with `start <= end`.
    pub fn new(start: FrameIndex, end: FrameIndex) -> AeplanResult<Self> {
        if start.0 > end.0 {
            return Err(AeplanError::validation("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Number of frames contained in the range.
    pub fn len_frames(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// Return `true` when the range has no frames.
    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    /// Return `true` when `f` is inside `[start, end)`.
    pub fn contains(self, f: FrameIndex) -> bool {
        self.start.0 <= f.0 && f.0 < self.end.0
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> AeplanResult<Self> {
        if den == 0 {
            return Err(AeplanError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(AeplanError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert a floating-point frame rate into a reduced rational.
    ///
    /// NTSC rates (23.976, 29.97, 59.94) map to their exact `N*1000/1001` form.
    pub fn from_f64(fps: f64) -> AeplanResult<Self> {
        let out_of_range = || AeplanError::validation(format!("frame rate {fps} is out of range"));
        if !fps.is_finite() || fps <= 0.0 || fps > f64::from(u32::MAX / 1000) {
            return Err(out_of_range());
        }
        let ntsc = (fps * 1.001).round();
        if (fps - ntsc / 1.001).abs() < 1e-3 && (fps - fps.round()).abs() > 1e-3 {
            let num = (ntsc as u32).checked_mul(1000).ok_or_else(out_of_range)?;
            return Self::new(num, 1001);
        }
        let num = (fps * 1000.0).round() as u32;
        if num == 0 {
            return Err(out_of_range());
        }
        let den = 1000u32;
        let g = gcd(num, den);
        Self::new(num / g, den / g)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Convert seconds to frame count using floor semantics.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        (secs * self.as_f64()).floor().max(0.0) as u64
    }

    /// Convert seconds to the nearest frame boundary.
    pub fn secs_to_frames_round(self, secs: f64) -> u64 {
        (secs * self.as_f64()).round().max(0.0) as u64
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Geometric center of the canvas.
    pub fn center(self) -> Vec2 {
        Vec2::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// Opaque 8-bit RGB color, serialized as `#rrggbb`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Construct from channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb` (leading `#` optional).
    pub fn parse_hex(s: &str) -> AeplanResult<Self> {
        let hex = s.trim().trim_start_matches('#');
        let bad = || AeplanError::validation(format!("invalid hex color '{s}'"));
        let nibble = |c: u8| -> AeplanResult<u8> {
            (c as char)
                .to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(bad)
        };
        let b = hex.as_bytes();
        match b.len() {
            3 => {
                let r = nibble(b[0])?;
                let g = nibble(b[1])?;
                let bl = nibble(b[2])?;
                Ok(Self::new(r * 17, g * 17, bl * 17))
            }
            6 => {
                let byte =
                    |i: usize| -> AeplanResult<u8> { Ok(nibble(b[i])? * 16 + nibble(b[i + 1])?) };
                Ok(Self::new(byte(0)?, byte(2)?, byte(4)?))
            }
            _ => Err(bad()),
        }
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl serde::Serialize for Rgb8 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Rgb8 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Layer placement in canvas space: position in pixels, scale in percent, rotation in degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform2D {
    /// Anchor position in pixels.
    pub position: Vec2,
    /// Scale in percent (100 = identity).
    pub scale: Vec2,
    /// Clockwise rotation in degrees.
    pub rotation: f64,
}

impl Transform2D {
    /// Build the canvas-space affine.
    ///
    /// Canonical order: `T(position) * R(rotation) * S(scale / 100)`.
    pub fn to_affine(self) -> Affine {
        let t_translate = Affine::translate(self.position);
        let t_rotate = Affine::rotate(self.rotation.to_radians());
        let t_scale = Affine::scale_non_uniform(self.scale.x / 100.0, self.scale.y / 100.0);
        t_translate * t_rotate * t_scale
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
